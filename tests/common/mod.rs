//! Shared fixtures for the integration tests

#![allow(dead_code)]

use mixed_beam_column::elements::{SectionForceDeformation, SectionResponse};
use mixed_beam_column::math::{Mat2, Vec2};
use mixed_beam_column::prelude::*;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Horizontal element from (0, 0) to (length, 0), attached
pub fn horizontal(
    section: &dyn SectionForceDeformation,
    num_sections: usize,
    integration: Box<dyn BeamIntegration>,
    transf: Box<dyn CrdTransf2d>,
    options: SolverOptions,
    length: f64,
) -> MixedBeamColumn2d {
    init_logger();
    let mut element =
        MixedBeamColumn2d::uniform(1, [1, 2], section, num_sections, integration, transf)
            .unwrap()
            .with_options(options)
            .unwrap();
    element
        .attach(&Node::new(1, 0.0, 0.0), &Node::new(2, length, 0.0))
        .unwrap();
    element
}

/// Steel rectangle 0.3 x 0.5 with 20 layers
pub fn steel_rectangle() -> FiberSection {
    let steel = Material::bilinear(200e9, 250e6, 0.02).unwrap();
    FiberSection::rectangular(steel, 0.3, 0.5, 20).unwrap()
}

/// Section whose reported force carries an offset that flips sign on every
/// call while its tangent stays constant
#[derive(Debug, Clone)]
pub struct ContradictorySection {
    pub stiffness: Mat2,
    pub offset: f64,
    calls: usize,
}

impl ContradictorySection {
    pub fn new(ea: f64, ei: f64, offset: f64) -> Self {
        Self {
            stiffness: Mat2::new(ea, 0.0, 0.0, ei),
            offset,
            calls: 0,
        }
    }
}

impl SectionForceDeformation for ContradictorySection {
    fn set_trial_deformation(&mut self, deformation: &Vec2) -> Result<SectionResponse, String> {
        self.calls += 1;
        let sign = if self.calls % 2 == 0 { 1.0 } else { -1.0 };
        Ok(SectionResponse {
            force: self.stiffness * deformation + Vec2::new(sign * self.offset, 0.0),
            stiffness: self.stiffness,
        })
    }

    fn initial_stiffness(&self) -> Mat2 {
        self.stiffness
    }

    fn commit_state(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn revert_to_last_commit(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn revert_to_start(&mut self) -> Result<(), String> {
        self.calls = 0;
        Ok(())
    }

    fn box_clone(&self) -> Box<dyn SectionForceDeformation> {
        Box::new(self.clone())
    }
}

/// Elastic section that loses all stiffness past a curvature limit
#[derive(Debug, Clone, Copy)]
pub struct CollapsingSection {
    pub ea: f64,
    pub ei: f64,
    pub curvature_limit: f64,
}

impl SectionForceDeformation for CollapsingSection {
    fn set_trial_deformation(&mut self, deformation: &Vec2) -> Result<SectionResponse, String> {
        let k = self.initial_stiffness();
        let stiffness = if deformation[1].abs() > self.curvature_limit {
            Mat2::zeros()
        } else {
            k
        };
        Ok(SectionResponse {
            force: k * deformation,
            stiffness,
        })
    }

    fn initial_stiffness(&self) -> Mat2 {
        Mat2::new(self.ea, 0.0, 0.0, self.ei)
    }

    fn commit_state(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn revert_to_last_commit(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn revert_to_start(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn box_clone(&self) -> Box<dyn SectionForceDeformation> {
        Box::new(*self)
    }
}

/// Elastic section that reports a failure past a curvature limit
#[derive(Debug, Clone, Copy)]
pub struct BrittleSection {
    pub ea: f64,
    pub ei: f64,
    pub curvature_limit: f64,
}

impl SectionForceDeformation for BrittleSection {
    fn set_trial_deformation(&mut self, deformation: &Vec2) -> Result<SectionResponse, String> {
        if deformation[1].abs() > self.curvature_limit {
            return Err(format!("curvature {} past limit", deformation[1]));
        }
        let stiffness = self.initial_stiffness();
        Ok(SectionResponse {
            force: stiffness * deformation,
            stiffness,
        })
    }

    fn initial_stiffness(&self) -> Mat2 {
        Mat2::new(self.ea, 0.0, 0.0, self.ei)
    }

    fn commit_state(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn revert_to_last_commit(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn revert_to_start(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn box_clone(&self) -> Box<dyn SectionForceDeformation> {
        Box::new(*self)
    }
}

/// Brittle section whose history cannot be rolled back either
#[derive(Debug, Clone, Copy)]
pub struct UnrecoverableSection {
    pub ea: f64,
    pub ei: f64,
    pub curvature_limit: f64,
}

impl SectionForceDeformation for UnrecoverableSection {
    fn set_trial_deformation(&mut self, deformation: &Vec2) -> Result<SectionResponse, String> {
        if deformation[1].abs() > self.curvature_limit {
            return Err(format!("curvature {} past limit", deformation[1]));
        }
        let stiffness = self.initial_stiffness();
        Ok(SectionResponse {
            force: stiffness * deformation,
            stiffness,
        })
    }

    fn initial_stiffness(&self) -> Mat2 {
        Mat2::new(self.ea, 0.0, 0.0, self.ei)
    }

    fn commit_state(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn revert_to_last_commit(&mut self) -> Result<(), String> {
        Err("history lost".to_string())
    }

    fn revert_to_start(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn box_clone(&self) -> Box<dyn SectionForceDeformation> {
        Box::new(*self)
    }
}

/// Elastic section that keeps its committed curvature as a permanent set
/// and refuses to commit past a curvature limit
#[derive(Debug, Clone, Copy)]
pub struct SettlingSection {
    pub ea: f64,
    pub ei: f64,
    pub commit_limit: f64,
    trial: Vec2,
    set: f64,
}

impl SettlingSection {
    pub fn new(ea: f64, ei: f64, commit_limit: f64) -> Self {
        Self {
            ea,
            ei,
            commit_limit,
            trial: Vec2::zeros(),
            set: 0.0,
        }
    }
}

impl SectionForceDeformation for SettlingSection {
    fn set_trial_deformation(&mut self, deformation: &Vec2) -> Result<SectionResponse, String> {
        self.trial = *deformation;
        Ok(SectionResponse {
            force: Vec2::new(self.ea * deformation[0], self.ei * (deformation[1] - self.set)),
            stiffness: self.initial_stiffness(),
        })
    }

    fn initial_stiffness(&self) -> Mat2 {
        Mat2::new(self.ea, 0.0, 0.0, self.ei)
    }

    fn commit_state(&mut self) -> Result<(), String> {
        if self.trial[1].abs() > self.commit_limit {
            return Err(format!("curvature {} cannot be committed", self.trial[1]));
        }
        self.set = self.trial[1];
        Ok(())
    }

    fn revert_to_last_commit(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn revert_to_start(&mut self) -> Result<(), String> {
        self.trial = Vec2::zeros();
        self.set = 0.0;
        Ok(())
    }

    fn box_clone(&self) -> Box<dyn SectionForceDeformation> {
        Box::new(*self)
    }
}

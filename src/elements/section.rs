//! Section force-deformation models for frame elements
//!
//! A section maps the trial deformation e = [axial strain, curvature] to the
//! stress resultants s = [N, M] and the tangent ∂s/∂e. The element never
//! branches on the section type.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::elements::material::{Material, MaterialState};
use crate::error::{ElementError, ElementResult};
use crate::math::{Mat2, Vec2};

/// Section force and tangent for a trial deformation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionResponse {
    /// Stress resultants [N, M]
    pub force: Vec2,
    /// Tangent stiffness ∂s/∂e
    pub stiffness: Mat2,
}

/// Section behaviour consumed by the element
pub trait SectionForceDeformation: Debug + Send {
    /// Set the trial deformation and return the resulting force and tangent
    fn set_trial_deformation(&mut self, deformation: &Vec2) -> Result<SectionResponse, String>;

    /// Tangent at zero deformation and virgin history
    fn initial_stiffness(&self) -> Mat2;

    fn commit_state(&mut self) -> Result<(), String>;

    fn revert_to_last_commit(&mut self) -> Result<(), String>;

    fn revert_to_start(&mut self) -> Result<(), String>;

    /// Fresh copy for use at another integration point
    fn box_clone(&self) -> Box<dyn SectionForceDeformation>;
}

impl Clone for Box<dyn SectionForceDeformation> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Linear elastic section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElasticSection {
    /// Axial rigidity EA
    pub ea: f64,
    /// Flexural rigidity EI
    pub ei: f64,
}

impl ElasticSection {
    /// Create a section from its rigidities
    pub fn new(ea: f64, ei: f64) -> ElementResult<Self> {
        if !(ea > 0.0) || !(ei > 0.0) {
            return Err(ElementError::InvalidSection(format!(
                "elastic section needs EA > 0 and EI > 0, got EA = {ea}, EI = {ei}"
            )));
        }
        Ok(Self { ea, ei })
    }

    /// Create an elastic rectangular section
    pub fn rectangular(e: f64, width: f64, depth: f64) -> ElementResult<Self> {
        let a = width * depth;
        let i = width * depth.powi(3) / 12.0;
        Self::new(e * a, e * i)
    }

    fn stiffness(&self) -> Mat2 {
        Mat2::new(self.ea, 0.0, 0.0, self.ei)
    }
}

impl SectionForceDeformation for ElasticSection {
    fn set_trial_deformation(&mut self, deformation: &Vec2) -> Result<SectionResponse, String> {
        let stiffness = self.stiffness();
        Ok(SectionResponse {
            force: stiffness * deformation,
            stiffness,
        })
    }

    fn initial_stiffness(&self) -> Mat2 {
        self.stiffness()
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

/// A fiber of a section: position, area and material history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fiber {
    /// Distance from the reference axis (positive towards local y)
    pub y: f64,
    /// Fiber area
    pub area: f64,
    pub material: Material,
    trial: MaterialState,
    committed: MaterialState,
}

impl Fiber {
    pub fn new(y: f64, area: f64, material: Material) -> Self {
        let state = material.initial_state();
        Self {
            y,
            area,
            material,
            trial: state,
            committed: state,
        }
    }

    /// Trial material state
    pub fn state(&self) -> &MaterialState {
        &self.trial
    }
}

/// Fiber-discretized section integrating uniaxial laws over its area
///
/// Fiber strain is ε = ε0 - y·κ, so positive curvature compresses fibers
/// with positive y.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiberSection {
    fibers: Vec<Fiber>,
}

impl FiberSection {
    /// Create a section from explicit fibers
    pub fn new(fibers: Vec<Fiber>) -> ElementResult<Self> {
        if fibers.is_empty() {
            return Err(ElementError::InvalidSection(
                "fiber section needs at least one fiber".to_string(),
            ));
        }
        for fiber in &fibers {
            if !(fiber.area > 0.0) || !fiber.y.is_finite() {
                return Err(ElementError::InvalidSection(format!(
                    "fiber at y = {} has invalid area {}",
                    fiber.y, fiber.area
                )));
            }
            fiber.material.validate()?;
        }

        let section = Self { fibers };
        if section.initial_stiffness().determinant() <= 0.0 {
            return Err(ElementError::InvalidSection(
                "fiber layout has no flexural stiffness (needs two distinct y)".to_string(),
            ));
        }
        Ok(section)
    }

    /// Create a rectangular section discretized into layers through the depth
    pub fn rectangular(
        material: Material,
        width: f64,
        depth: f64,
        num_layers: usize,
    ) -> ElementResult<Self> {
        if !(width > 0.0) || !(depth > 0.0) || num_layers < 2 {
            return Err(ElementError::InvalidSection(format!(
                "rectangle {width} x {depth} with {num_layers} layers"
            )));
        }
        let mut fibers = Vec::with_capacity(num_layers);
        Self::add_layers(&mut fibers, material, width, -depth / 2.0, depth / 2.0, num_layers);
        Self::new(fibers)
    }

    /// Create a wide flange (I-beam) section bending about its strong axis
    ///
    /// # Arguments
    /// * `depth` - Total depth of section
    /// * `flange_width` - Width of flange
    /// * `flange_thickness` - Thickness of flange
    /// * `web_thickness` - Thickness of web
    /// * `flange_layers` / `web_layers` - Fiber layers per flange and in the web
    pub fn wide_flange(
        material: Material,
        depth: f64,
        flange_width: f64,
        flange_thickness: f64,
        web_thickness: f64,
        flange_layers: usize,
        web_layers: usize,
    ) -> ElementResult<Self> {
        let d = depth;
        let bf = flange_width;
        let tf = flange_thickness;
        let tw = web_thickness;
        if !(d > 2.0 * tf) || !(bf > 0.0) || !(tf > 0.0) || !(tw > 0.0) {
            return Err(ElementError::InvalidSection(format!(
                "wide flange d = {d}, bf = {bf}, tf = {tf}, tw = {tw}"
            )));
        }
        if flange_layers == 0 || web_layers == 0 {
            return Err(ElementError::InvalidSection(
                "wide flange needs at least one layer per plate".to_string(),
            ));
        }

        let hw = d / 2.0 - tf;
        let mut fibers = Vec::with_capacity(2 * flange_layers + web_layers);
        Self::add_layers(&mut fibers, material, bf, -d / 2.0, -hw, flange_layers);
        Self::add_layers(&mut fibers, material, tw, -hw, hw, web_layers);
        Self::add_layers(&mut fibers, material, bf, hw, d / 2.0, flange_layers);
        Self::new(fibers)
    }

    fn add_layers(
        fibers: &mut Vec<Fiber>,
        material: Material,
        width: f64,
        y_bottom: f64,
        y_top: f64,
        num_layers: usize,
    ) {
        let h = (y_top - y_bottom) / num_layers as f64;
        for k in 0..num_layers {
            let y = y_bottom + (k as f64 + 0.5) * h;
            fibers.push(Fiber::new(y, width * h, material));
        }
    }

    pub fn fibers(&self) -> &[Fiber] {
        &self.fibers
    }

    fn resultants<'a>(states: impl Iterator<Item = (&'a Fiber, &'a MaterialState)>) -> SectionResponse {
        let mut force = Vec2::zeros();
        let mut stiffness = Mat2::zeros();

        for (fiber, state) in states {
            let y = fiber.y;
            let fa = state.stress * fiber.area;
            let ea = state.tangent * fiber.area;

            force[0] += fa;
            force[1] -= fa * y;

            stiffness[(0, 0)] += ea;
            stiffness[(0, 1)] -= ea * y;
            stiffness[(1, 1)] += ea * y * y;
        }
        stiffness[(1, 0)] = stiffness[(0, 1)];

        SectionResponse { force, stiffness }
    }
}

impl SectionForceDeformation for FiberSection {
    fn set_trial_deformation(&mut self, deformation: &Vec2) -> Result<SectionResponse, String> {
        if deformation.iter().any(|d| !d.is_finite()) {
            return Err(format!("non-finite section deformation {deformation:?}"));
        }
        let (eps0, kappa) = (deformation[0], deformation[1]);

        for fiber in &mut self.fibers {
            let strain = eps0 - fiber.y * kappa;
            fiber.trial = fiber.material.trial_state(&fiber.committed, strain);
        }

        Ok(Self::resultants(self.fibers.iter().map(|f| (f, &f.trial))))
    }

    fn initial_stiffness(&self) -> Mat2 {
        let initial: Vec<MaterialState> = self
            .fibers
            .iter()
            .map(|f| f.material.initial_state())
            .collect();
        Self::resultants(self.fibers.iter().zip(initial.iter())).stiffness
    }

    fn commit_state(&mut self) -> Result<(), String> {
        for fiber in &mut self.fibers {
            fiber.committed = fiber.trial;
        }
        Ok(())
    }

    fn revert_to_last_commit(&mut self) -> Result<(), String> {
        for fiber in &mut self.fibers {
            fiber.trial = fiber.committed;
        }
        Ok(())
    }

    fn revert_to_start(&mut self) -> Result<(), String> {
        for fiber in &mut self.fibers {
            let state = fiber.material.initial_state();
            fiber.trial = state;
            fiber.committed = state;
        }
        Ok(())
    }

    fn box_clone(&self) -> Box<dyn SectionForceDeformation> {
        Box::new(self.clone())
    }
}

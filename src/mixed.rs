//! Mixed (Hellinger-Reissner) state determination
//!
//! The natural forces q are an independent field. Each local iteration
//! corrects q from the integrated flexibility, drives every section with the
//! deformation predicted by its flexibility, and re-integrates the element
//! matrices (weights w = wᵢ·L):
//!
//! - G   = Σ w Nd1ᵀ Nld        G2  = Σ w Nd2ᵀ Nld
//! - H   = Σ w Nd1ᵀ fs Nd1     H12 = Σ w Nd1ᵀ fs Nd2    H22 = Σ w Nd2ᵀ fs Nd2
//! - Kg  = Σ w Kg(sᵢ,N)        Md  = Σ w ∂(Nd1ᵀ)/∂v · r
//! - c   = Σ w Nd1ᵀ r          c2  = Σ w Nd2ᵀ r
//!
//! with r = d_hat - e - fs·(Nd1·q - s). The compatibility residual c drives
//! the next correction q ← q + H⁻¹·(GMH·Δv + c), GMH = G + Md - H12.

use log::{debug, warn};

use crate::analysis::{ConvergenceStatus, LocalSolveReport, SolverOptions};
use crate::elements::SectionForceDeformation;
use crate::error::{ElementError, ElementResult};
use crate::kinematics::{KinematicBuilder, SectionKinematics};
use crate::math::{self, Mat2, Mat3, Vec3};
use crate::state::ElementState;

/// Integrated element matrices of one local iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementMatrices {
    pub g: Mat3,
    pub g2: Mat3,
    pub h: Mat3,
    pub h12: Mat3,
    pub h22: Mat3,
    pub md: Mat3,
    pub kg: Mat3,
    /// Compatibility residual c
    pub residual: Vec3,
    /// Geometric residual c2
    pub residual2: Vec3,
}

impl ElementMatrices {
    pub fn zeros() -> Self {
        Self {
            g: Mat3::zeros(),
            g2: Mat3::zeros(),
            h: Mat3::zeros(),
            h12: Mat3::zeros(),
            h22: Mat3::zeros(),
            md: Mat3::zeros(),
            kg: Mat3::zeros(),
            residual: Vec3::zeros(),
            residual2: Vec3::zeros(),
        }
    }

    /// GMH = G + Md - H12
    pub fn gmh(&self) -> Mat3 {
        self.g + self.md - self.h12
    }
}

/// Per-element scratch space, sized when the element is attached
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    kinematics: Vec<SectionKinematics>,
}

impl Workspace {
    pub fn new(num_sections: usize) -> Self {
        Self {
            kinematics: vec![SectionKinematics::zeros(); num_sections],
        }
    }

    fn fill(&mut self, kin: &KinematicBuilder, v: &Vec3, p: f64, length: f64) {
        for (sec, slot) in self.kinematics.iter_mut().enumerate() {
            *slot = kin.section(sec, v, p, length);
        }
    }

    /// Kinematic matrices of the last iteration
    pub fn section(&self, sec: usize) -> &SectionKinematics {
        &self.kinematics[sec]
    }
}

/// Quantities fixed once from the sections' initial stiffness
#[derive(Debug, Clone, PartialEq)]
pub struct InitialState {
    /// Basic initial stiffness Gᵀ H⁻¹ G
    pub stiffness: Mat3,
    pub h_inv: Mat3,
    pub g: Mat3,
    /// Initial section flexibilities
    pub flexibilities: Vec<Mat2>,
}

/// Initial stiffness at zero natural displacement and zero force
pub fn initial_state(
    kin: &KinematicBuilder,
    sections: &[Box<dyn SectionForceDeformation>],
    length: f64,
) -> ElementResult<InitialState> {
    let v = Vec3::zeros();
    let mut g = Mat3::zeros();
    let mut h = Mat3::zeros();
    let mut flexibilities = Vec::with_capacity(sections.len());

    for (sec, section) in sections.iter().enumerate() {
        let ks = section.initial_stiffness();
        let fs = math::invert2(&ks).ok_or_else(|| {
            ElementError::InvalidSection(format!("section {sec} has a singular initial stiffness"))
        })?;

        let wt = kin.weight(sec, length);
        let nld = kin.nld_hat(sec, &v, length);
        let nd1 = kin.nd1(sec, &v, length);
        g += nd1.transpose() * nld * wt;
        h += nd1.transpose() * fs * nd1 * wt;
        flexibilities.push(fs);
    }

    let h_inv = math::invert3(&h).ok_or_else(|| {
        ElementError::InvalidSection("integrated initial flexibility is singular".to_string())
    })?;

    Ok(InitialState {
        stiffness: g.transpose() * h_inv * g,
        h_inv,
        g,
        flexibilities,
    })
}

/// Integrate the element matrices from the current section states
pub fn integrate(
    kin: &KinematicBuilder,
    work: &Workspace,
    state: &ElementState,
    length: f64,
) -> ElementMatrices {
    let q = state.natural.force;
    let mut m = ElementMatrices::zeros();

    for (sec, ss) in state.sections.iter().enumerate() {
        let sk = work.section(sec);
        let wt = kin.weight(sec, length);
        let fs = ss.flexibility;

        let nd1_t = sk.nd1.transpose();
        let nd2_t = sk.nd2.transpose();
        let r = sk.d_hat - ss.deformation - fs * (sk.nd1 * q - ss.force);

        m.g += nd1_t * sk.nld_hat * wt;
        m.g2 += nd2_t * sk.nld_hat * wt;
        m.h += nd1_t * fs * sk.nd1 * wt;
        m.h12 += nd1_t * fs * sk.nd2 * wt;
        m.h22 += nd2_t * fs * sk.nd2 * wt;
        m.kg += kin.kg(sec, ss.force[0], length) * wt;
        m.md += kin.md(sec, &r, length) * wt;
        m.residual += nd1_t * r * wt;
        m.residual2 += nd2_t * r * wt;
    }

    m
}

/// Basic tangent stiffness and basic resisting force from the integrated matrices
///
/// kv = Kg + G2 + G2ᵀ - H22 + GMHᵀ H⁻¹ GMH and Q = Gᵀq + c2 + GMHᵀ H⁻¹ c.
pub fn assemble(m: &ElementMatrices, h_inv: &Mat3, q: &Vec3) -> (Mat3, Vec3) {
    let gmh = m.gmh();
    let gmh_t = gmh.transpose();

    let kv = m.kg + m.g2 + m.g2.transpose() - m.h22 + gmh_t * h_inv * gmh;
    let force = m.g.transpose() * q + m.residual2 + gmh_t * h_inv * m.residual;

    (kv, force)
}

/// Local mixed-formulation solve for one trial natural displacement
///
/// `v` is the natural displacement estimate and `dv` its change since the
/// previous update. On return the trial `state` holds the converged state, or
/// the best estimate reached when the status is not `Converged`. Only errors
/// reported by a section collaborator are returned as `Err`.
#[allow(clippy::too_many_arguments)]
pub fn solve(
    kin: &KinematicBuilder,
    options: &SolverOptions,
    sections: &mut [Box<dyn SectionForceDeformation>],
    work: &mut Workspace,
    state: &mut ElementState,
    v: &Vec3,
    dv: &Vec3,
    length: f64,
) -> ElementResult<LocalSolveReport> {
    let mut increment = *dv;
    let mut matrices = ElementMatrices::zeros();
    let mut report = LocalSolveReport {
        iterations: 0,
        residual_norm: f64::INFINITY,
        status: ConvergenceStatus::NotConverged,
    };

    for iter in 1..=options.max_iterations {
        report.iterations = iter;

        // Natural force correction from the previous linearization
        let natural = &mut state.natural;
        natural.force += natural.h_inv * (natural.gmh * increment + natural.residual);
        let q = natural.force;
        increment = Vec3::zeros();

        work.fill(kin, v, q[0], length);

        // Drive each section with its flexibility-predicted deformation
        let mut singular = false;
        for (sec, section) in sections.iter_mut().enumerate() {
            let ss = &mut state.sections[sec];
            let target = work.section(sec).nd1 * q;
            let deformation = ss.deformation + ss.flexibility * (target - ss.force);

            let response = section
                .set_trial_deformation(&deformation)
                .map_err(|reason| ElementError::SectionFailed { index: sec, reason })?;

            ss.deformation = deformation;
            ss.force = response.force;
            match math::invert2(&response.stiffness) {
                Some(fs) => ss.flexibility = fs,
                None => {
                    warn!("section {sec} tangent is singular at deformation {deformation:?}");
                    singular = true;
                }
            }
        }

        matrices = integrate(kin, work, state, length);

        match math::invert3(&matrices.h) {
            Some(h_inv) => state.natural.h_inv = h_inv,
            None => {
                warn!("integrated element flexibility is singular at local iteration {iter}");
                singular = true;
            }
        }
        state.natural.gmh = matrices.gmh();
        state.natural.residual = matrices.residual;

        report.residual_norm = matrices.residual.norm();
        let reference = (matrices.g * v).norm() + (matrices.h * q).norm();
        debug!(
            "local iteration {iter}: |c| = {:.3e} (reference {:.3e})",
            report.residual_norm, reference
        );

        if singular {
            report.status = ConvergenceStatus::SingularFlexibility;
            break;
        }
        if options.is_converged(report.residual_norm, reference) {
            report.status = ConvergenceStatus::Converged;
            break;
        }
    }

    if report.status == ConvergenceStatus::NotConverged {
        warn!(
            "mixed local iteration hit the cap of {} iterations (|c| = {:.3e})",
            options.max_iterations, report.residual_norm
        );
    }

    let (kv, force) = assemble(&matrices, &state.natural.h_inv, &state.natural.force);
    state.stiffness = kv;
    state.natural.resisting_force = force;
    state.natural.disp = *v;
    state.length = length;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ElasticSection;
    use crate::math::Vec2;
    use crate::state::SectionState;
    use approx::assert_relative_eq;

    fn setup(
        geom_linear: bool,
    ) -> (KinematicBuilder, Vec<Box<dyn SectionForceDeformation>>, ElementState, f64) {
        let s = 0.5 / 3.0_f64.sqrt();
        let kin = KinematicBuilder::new(vec![0.5 - s, 0.5 + s], vec![0.5, 0.5], geom_linear);
        let sections: Vec<Box<dyn SectionForceDeformation>> = (0..2)
            .map(|_| {
                Box::new(ElasticSection::new(100.0, 10.0).unwrap())
                    as Box<dyn SectionForceDeformation>
            })
            .collect();
        let length = 1.0;

        let init = initial_state(&kin, &sections, length).unwrap();
        let mut state = ElementState::zeros(2, length);
        for (ss, fs) in state.sections.iter_mut().zip(&init.flexibilities) {
            *ss = SectionState::virgin(*fs);
        }
        state.natural.h_inv = init.h_inv;
        state.natural.gmh = init.g;
        state.stiffness = init.stiffness;
        (kin, sections, state, length)
    }

    #[test]
    fn test_initial_stiffness_is_exact_for_two_gauss_points() {
        let (_, _, state, _) = setup(true);
        let k = state.stiffness;
        assert_relative_eq!(k[(0, 0)], 100.0, max_relative = 1e-12);
        assert_relative_eq!(k[(1, 1)], 40.0, max_relative = 1e-12);
        assert_relative_eq!(k[(1, 2)], 20.0, max_relative = 1e-12);
        assert_relative_eq!(k[(0, 1)], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_linear_solve_converges_in_one_iteration() {
        let (kin, mut sections, mut state, length) = setup(true);
        let mut work = Workspace::new(2);
        let v = Vec3::new(0.01, 0.3, -0.1);

        let report = solve(
            &kin,
            &SolverOptions::linear(),
            &mut sections,
            &mut work,
            &mut state,
            &v,
            &v,
            length,
        )
        .unwrap();

        assert_eq!(report.status, ConvergenceStatus::Converged);
        assert_eq!(report.iterations, 1);
        assert_relative_eq!(state.natural.force[0], 1.0, max_relative = 1e-12);
        assert_relative_eq!(state.natural.force[1], 40.0 * 0.3 - 20.0 * 0.1, max_relative = 1e-12);
    }

    #[test]
    fn test_zero_axial_force_drops_geometric_terms() {
        let (kin, _, mut state, length) = setup(false);
        let mut work = Workspace::new(2);
        let v = Vec3::new(0.0, 0.02, -0.03);
        work.fill(&kin, &v, 0.0, length);

        // Sections sit on the compatible deformation with no force
        for (sec, ss) in state.sections.iter_mut().enumerate() {
            ss.deformation = work.section(sec).d_hat;
            ss.force = Vec2::zeros();
        }
        state.natural.force = Vec3::zeros();

        let m = integrate(&kin, &work, &state, length);
        assert_eq!(m.kg, Mat3::zeros());
        assert_eq!(m.g2, Mat3::zeros());
        assert_eq!(m.h12, Mat3::zeros());
        assert_eq!(m.h22, Mat3::zeros());
        assert_eq!(m.md, Mat3::zeros());
        assert_eq!(m.residual, Vec3::zeros());
        // G still carries the rotation-dependent strain terms
        assert!(m.g[(0, 1)].abs() > 1e-6);

        let h_inv = math::invert3(&m.h).unwrap();
        let (kv, force) = assemble(&m, &h_inv, &state.natural.force);
        assert_eq!(kv, m.g.transpose() * h_inv * m.g);
        assert_eq!(force, Vec3::zeros());
    }

    #[test]
    fn test_assemble_without_geometry_is_condensed_flexibility() {
        let mut m = ElementMatrices::zeros();
        m.g = Mat3::identity() * 2.0;
        let h_inv = Mat3::identity() * 3.0;
        let (kv, force) = assemble(&m, &h_inv, &Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(kv, Mat3::identity() * 12.0);
        assert_relative_eq!(force, Vec3::new(2.0, 4.0, 6.0));
    }
}

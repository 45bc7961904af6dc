//! Trial and committed state of a mixed beam-column element

use serde::{Deserialize, Serialize};

use crate::math::{Mat2, Mat3, Vec2, Vec3};

/// State of one section along the element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionState {
    /// Section deformation [axial strain, curvature]
    pub deformation: Vec2,
    /// Section stress resultants [N, M] from the constitutive law
    pub force: Vec2,
    /// Section flexibility (inverse tangent)
    pub flexibility: Mat2,
}

impl SectionState {
    /// Zero deformation and force with the given flexibility
    pub fn virgin(flexibility: Mat2) -> Self {
        Self {
            deformation: Vec2::zeros(),
            force: Vec2::zeros(),
            flexibility,
        }
    }
}

/// Element-level quantities in the natural system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NaturalState {
    /// Natural displacements [u, θi, θj] at the last update
    pub disp: Vec3,
    /// Natural forces [N, Mi, Mj]
    pub force: Vec3,
    /// Compatibility residual ∫Nd1ᵀ r dx carried to the next update
    pub residual: Vec3,
    /// Inverse of the integrated flexibility H
    pub h_inv: Mat3,
    /// Coupling matrix G + Md - H12
    pub gmh: Mat3,
    /// Basic resisting force
    pub resisting_force: Vec3,
}

impl NaturalState {
    pub fn zeros() -> Self {
        Self {
            disp: Vec3::zeros(),
            force: Vec3::zeros(),
            residual: Vec3::zeros(),
            h_inv: Mat3::zeros(),
            gmh: Mat3::zeros(),
            resisting_force: Vec3::zeros(),
        }
    }
}

/// Complete element state; the element keeps one trial and one committed copy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementState {
    pub sections: Vec<SectionState>,
    pub natural: NaturalState,
    /// Basic tangent stiffness
    pub stiffness: Mat3,
    /// Element length used by the last local solve
    pub length: f64,
}

impl ElementState {
    /// Zero state sized for `num_sections` sections
    pub fn zeros(num_sections: usize, length: f64) -> Self {
        Self {
            sections: vec![SectionState::virgin(Mat2::zeros()); num_sections],
            natural: NaturalState::zeros(),
            stiffness: Mat3::zeros(),
            length,
        }
    }

    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    /// Section forces stacked as a 2·n vector [N1, M1, N2, M2, ...]
    pub fn stacked_section_forces(&self) -> Vec<f64> {
        self.sections
            .iter()
            .flat_map(|s| s.force.iter().copied())
            .collect()
    }

    /// Section deformations stacked as a 2·n vector
    pub fn stacked_section_deformations(&self) -> Vec<f64> {
        self.sections
            .iter()
            .flat_map(|s| s.deformation.iter().copied())
            .collect()
    }
}

/// Where an element is in its commit/revert cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Constructed, never attached to its nodes
    Pristine,
    /// Sized and synchronized: trial equals committed
    Attached,
    /// An update produced a trial state that is not committed yet
    Trial,
}

//! Response queries for post-processing
//!
//! Selectors follow the token form used by recorders, e.g. `"basicForce"`
//! or `"section 2 deformation"`. Section numbers are 1-based.

use std::str::FromStr;

use nalgebra::SMatrix;
use serde::{Deserialize, Serialize};

use crate::analysis::LocalSolveReport;
use crate::error::{ElementError, ElementResult};

/// Per-section quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionQuantity {
    Force,
    Deformation,
    Flexibility,
}

/// A named element response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    /// Resisting force in global coordinates
    GlobalForce,
    /// Resisting force in local coordinates
    LocalForce,
    /// Basic force [N, Mi, Mj]
    BasicForce,
    /// Basic tangent stiffness
    BasicStiffness,
    IntegrationPoints,
    IntegrationWeights,
    /// All section forces, stacked
    SectionForces,
    /// All section deformations, stacked
    SectionDeformations,
    /// One quantity of one section (1-based)
    Section {
        number: usize,
        quantity: SectionQuantity,
    },
    /// Diagnostics of the last local solve
    Convergence,
}

impl Response {
    /// Parse a selector from its tokens
    pub fn parse(tokens: &[&str]) -> ElementResult<Self> {
        let unknown = || ElementError::UnknownResponse(tokens.join(" "));

        let response = match tokens {
            ["force"] | ["globalForce"] | ["globalforce"] => Self::GlobalForce,
            ["localForce"] | ["localforce"] => Self::LocalForce,
            ["basicForce"] | ["basicforce"] => Self::BasicForce,
            ["basicStiffness"] | ["basicstiffness"] => Self::BasicStiffness,
            ["integrationPoints"] => Self::IntegrationPoints,
            ["integrationWeights"] => Self::IntegrationWeights,
            ["sectionForces"] => Self::SectionForces,
            ["sectionDeformations"] => Self::SectionDeformations,
            ["convergence"] => Self::Convergence,
            ["section", number, quantity] => {
                let number: usize = number.parse().map_err(|_| unknown())?;
                let quantity = match *quantity {
                    "force" => SectionQuantity::Force,
                    "deformation" | "deformations" => SectionQuantity::Deformation,
                    "flexibility" => SectionQuantity::Flexibility,
                    _ => return Err(unknown()),
                };
                Self::Section { number, quantity }
            }
            _ => return Err(unknown()),
        };
        Ok(response)
    }
}

impl FromStr for Response {
    type Err = ElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        Self::parse(&tokens)
    }
}

/// Value returned by a response query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponseValue {
    Vector(Vec<f64>),
    /// Row-major matrix
    Matrix {
        rows: usize,
        cols: usize,
        data: Vec<f64>,
    },
    Convergence(LocalSolveReport),
}

impl ResponseValue {
    pub fn from_vector<const N: usize>(v: &SMatrix<f64, N, 1>) -> Self {
        Self::Vector(v.iter().copied().collect())
    }

    pub fn from_matrix<const R: usize, const C: usize>(m: &SMatrix<f64, R, C>) -> Self {
        let data = (0..R)
            .flat_map(|i| (0..C).map(move |j| m[(i, j)]))
            .collect();
        Self::Matrix {
            rows: R,
            cols: C,
            data,
        }
    }

    /// Values as a flat slice (row-major for matrices, empty for diagnostics)
    pub fn as_slice(&self) -> &[f64] {
        match self {
            Self::Vector(v) => v,
            Self::Matrix { data, .. } => data,
            Self::Convergence(_) => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Mat2;

    #[test]
    fn test_parse_selectors() {
        assert_eq!("force".parse::<Response>().unwrap(), Response::GlobalForce);
        assert_eq!(
            "basicStiffness".parse::<Response>().unwrap(),
            Response::BasicStiffness
        );
        assert_eq!(
            "section 2 deformation".parse::<Response>().unwrap(),
            Response::Section {
                number: 2,
                quantity: SectionQuantity::Deformation
            }
        );
    }

    #[test]
    fn test_unknown_selectors() {
        for bad in ["", "stresses", "section two force", "section 1 strain"] {
            let err = bad.parse::<Response>().unwrap_err();
            assert!(matches!(err, ElementError::UnknownResponse(_)), "{bad}");
        }
    }

    #[test]
    fn test_matrix_is_row_major() {
        let value = ResponseValue::from_matrix(&Mat2::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(value.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
    }
}

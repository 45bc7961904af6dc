//! Local solver options and convergence reporting

use serde::{Deserialize, Serialize};

use crate::error::{ElementError, ElementResult};

/// Options for the element-level mixed-formulation iteration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Hard cap on local iterations per `update`
    pub max_iterations: usize,
    /// Relative tolerance on the compatibility residual
    pub tolerance: f64,
    /// Absolute floor on the compatibility residual norm
    pub abs_tolerance: f64,
    /// Drop the P-Delta and quadratic strain terms
    pub geom_linear: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-12,
            abs_tolerance: 1e-15,
            geom_linear: false,
        }
    }
}

impl SolverOptions {
    /// Options for a geometrically linear element
    pub fn linear() -> Self {
        Self::default().geometrically_linear()
    }

    /// Parse options from a JSON document; missing fields take defaults
    pub fn from_json(text: &str) -> ElementResult<Self> {
        let options: Self = serde_json::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    /// Set maximum local iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set relative convergence tolerance
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Set absolute convergence tolerance
    pub fn with_abs_tolerance(mut self, tol: f64) -> Self {
        self.abs_tolerance = tol;
        self
    }

    /// Drop the geometric (P-Delta) terms
    pub fn geometrically_linear(mut self) -> Self {
        self.geom_linear = true;
        self
    }

    /// Check the options are usable
    pub fn validate(&self) -> ElementResult<()> {
        if self.max_iterations == 0 {
            return Err(ElementError::InvalidOptions(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.tolerance > 0.0) || !(self.abs_tolerance > 0.0) {
            return Err(ElementError::InvalidOptions(format!(
                "tolerances must be positive (relative {}, absolute {})",
                self.tolerance, self.abs_tolerance
            )));
        }
        Ok(())
    }

    /// Whether a residual norm passes against its reference magnitude
    pub fn is_converged(&self, residual: f64, reference: f64) -> bool {
        residual <= self.abs_tolerance || residual <= self.tolerance * reference
    }
}

/// Outcome of one local solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    /// Compatibility residual under tolerance
    Converged,
    /// Iteration cap reached; trial state holds the best estimate
    NotConverged,
    /// A section or the element flexibility could not be inverted
    SingularFlexibility,
}

impl ConvergenceStatus {
    /// Integer flag in the host convention (0 = converged)
    pub fn code(&self) -> i32 {
        match self {
            Self::Converged => 0,
            Self::NotConverged => -1,
            Self::SingularFlexibility => -2,
        }
    }
}

/// Diagnostics returned by `update`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalSolveReport {
    /// Local iterations performed
    pub iterations: usize,
    /// Final compatibility residual norm
    pub residual_norm: f64,
    /// Convergence status
    pub status: ConvergenceStatus,
}

impl LocalSolveReport {
    /// Report for an element that has not been updated yet
    pub fn idle() -> Self {
        Self {
            iterations: 0,
            residual_norm: 0.0,
            status: ConvergenceStatus::Converged,
        }
    }

    pub fn is_converged(&self) -> bool {
        self.status == ConvergenceStatus::Converged
    }
}

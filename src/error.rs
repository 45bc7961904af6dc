//! Error types for element state determination

use thiserror::Error;

/// Main error type for element operations
///
/// Local non-convergence and singular flexibilities are not errors; they are
/// reported through [`crate::analysis::ConvergenceStatus`] so the outer solver
/// can cut its step instead of aborting.
#[derive(Error, Debug)]
pub enum ElementError {
    #[error("Element has no sections")]
    NoSections,

    #[error("Integration rule returned {got} {what} for {expected} sections")]
    IntegrationMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Invalid element length: {0}")]
    InvalidLength(f64),

    #[error("Nodes {0} and {1} are coincident")]
    CoincidentNodes(usize, usize),

    #[error("Invalid section: {0}")]
    InvalidSection(String),

    #[error("Invalid material: {0}")]
    InvalidMaterial(String),

    #[error("Invalid solver options: {0}")]
    InvalidOptions(String),

    #[error("Element {0} is not attached to its nodes - call attach() first")]
    NotAttached(usize),

    #[error("Element {0} has no trial state to commit - call update() first")]
    CommitWithoutUpdate(usize),

    #[error("Section {index} failed: {reason}")]
    SectionFailed { index: usize, reason: String },

    #[error("Coordinate transformation failed: {0}")]
    TransformFailed(String),

    #[error("Unknown response selector '{0}'")]
    UnknownResponse(String),

    #[error("Section {0} out of range")]
    SectionOutOfRange(usize),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl ElementError {
    /// Negative status code for hosts that report integer codes
    pub fn status_code(&self) -> i32 {
        match self {
            Self::NoSections => -1,
            Self::IntegrationMismatch { .. } => -2,
            Self::InvalidLength(_) => -3,
            Self::CoincidentNodes(..) => -4,
            Self::InvalidSection(_) => -5,
            Self::InvalidMaterial(_) => -6,
            Self::InvalidOptions(_) => -7,
            Self::NotAttached(_) => -8,
            Self::CommitWithoutUpdate(_) => -9,
            Self::SectionFailed { .. } => -10,
            Self::TransformFailed(_) => -11,
            Self::UnknownResponse(_) => -12,
            Self::SectionOutOfRange(_) => -13,
            Self::SerializationError(_) => -14,
        }
    }

    /// Whether the error is a configuration problem detected at attach time
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NoSections
                | Self::IntegrationMismatch { .. }
                | Self::InvalidLength(_)
                | Self::CoincidentNodes(..)
                | Self::InvalidSection(_)
                | Self::InvalidMaterial(_)
                | Self::InvalidOptions(_)
        )
    }
}

/// Result type for element operations
pub type ElementResult<T> = Result<T, ElementError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_are_negative() {
        let errors = [
            ElementError::NoSections,
            ElementError::InvalidLength(0.0),
            ElementError::CommitWithoutUpdate(3),
            ElementError::UnknownResponse("stress".to_string()),
        ];
        for err in &errors {
            assert!(err.status_code() < 0, "{err}");
        }
    }

    #[test]
    fn test_configuration_classification() {
        assert!(ElementError::NoSections.is_configuration());
        assert!(!ElementError::CommitWithoutUpdate(1).is_configuration());
        assert!(!ElementError::SectionFailed {
            index: 0,
            reason: "negative stiffness".to_string()
        }
        .is_configuration());
    }
}

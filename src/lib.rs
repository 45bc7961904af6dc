//! Mixed beam-column - state determination for nonlinear 2D frame elements
//!
//! This library implements a two-node beam-column element in the mixed
//! (Hellinger-Reissner) formulation:
//! - Section deformations and natural forces iterated together inside the element
//! - Fiber and elastic sections behind one section trait
//! - Gauss-Lobatto and Gauss-Legendre section placement
//! - P-Delta effects along the member and through the chord transformation
//! - Commit/revert history for the outer nonlinear solver
//!
//! ## Example
//! ```rust
//! use mixed_beam_column::prelude::*;
//!
//! let section = ElasticSection::rectangular(200e9, 0.3, 0.5).unwrap();
//! let mut element = MixedBeamColumn2d::uniform(
//!     1,
//!     [1, 2],
//!     &section,
//!     5,
//!     Box::new(Lobatto),
//!     Box::new(PDeltaCrdTransf2d::new()),
//! )
//! .unwrap();
//!
//! element
//!     .attach(&Node::new(1, 0.0, 0.0), &Node::new(2, 0.0, 3.0))
//!     .unwrap();
//!
//! let report = element
//!     .update(&Vec6::new(0.0, 0.0, 0.0, 0.001, 0.0, 0.0))
//!     .unwrap();
//! assert!(report.is_converged());
//! element.commit_state().unwrap();
//!
//! let forces = element.resisting_force().unwrap();
//! assert!(forces[3] > 0.0);
//! ```

pub mod analysis;
pub mod elements;
pub mod error;
pub mod integration;
pub mod kinematics;
pub mod math;
pub mod mixed;
pub mod results;
pub mod state;
pub mod transform;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{ConvergenceStatus, LocalSolveReport, SolverOptions};
    pub use crate::elements::{
        ElasticSection, FiberSection, Material, MixedBeamColumn2d, Node,
        SectionForceDeformation,
    };
    pub use crate::error::{ElementError, ElementResult};
    pub use crate::integration::{BeamIntegration, Legendre, Lobatto};
    pub use crate::math::{Mat3, Mat6, Vec3, Vec6};
    pub use crate::results::{Response, ResponseValue, SectionQuantity};
    pub use crate::state::{ElementState, Lifecycle};
    pub use crate::transform::{CrdTransf2d, LinearCrdTransf2d, PDeltaCrdTransf2d};
}

//! Nodes, materials, sections and the mixed beam-column element

mod material;
mod mixed_beam;
mod node;
mod section;

pub use material::{Material, MaterialState};
pub use mixed_beam::MixedBeamColumn2d;
pub use node::{Node, NODE_DOFS};
pub use section::{ElasticSection, Fiber, FiberSection, SectionForceDeformation, SectionResponse};

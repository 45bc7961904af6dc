//! Node element - a point in the 2D plane of the frame

use serde::{Deserialize, Serialize};

/// Number of degrees of freedom per node [DX, DY, RZ]
pub const NODE_DOFS: usize = 3;

/// A 2D frame node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Host tag of the node
    pub tag: usize,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Node {
    /// Create a new node at the given coordinates
    pub fn new(tag: usize, x: f64, y: f64) -> Self {
        Self { tag, x, y }
    }

    /// Get the coordinates as an array
    pub fn coords(&self) -> [f64; 2] {
        [self.x, self.y]
    }

    /// Calculate distance to another node
    pub fn distance_to(&self, other: &Node) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

//! Coordinate transformations between the natural (basic) system and global coordinates
//!
//! Global end displacements are ordered [u1x, u1y, θ1, u2x, u2y, θ2]. The
//! natural system removes the three rigid-body modes:
//! v = [chord elongation, θi - chord rotation, θj - chord rotation].

use crate::elements::Node;
use crate::error::{ElementError, ElementResult};
use crate::math::{self, Mat3, Mat36, Mat6, Vec3, Vec6};

/// Coordinate transformation consumed by the element
pub trait CrdTransf2d: Send {
    /// Set up the chord from the end nodes
    fn initialize(&mut self, node_i: &Node, node_j: &Node) -> ElementResult<()>;

    /// Push a new trial global end displacement
    fn update(&mut self, global_disp: &Vec6) -> ElementResult<()>;

    /// Natural displacements for the current trial state
    fn basic_trial_disp(&self) -> Vec3;

    /// Natural displacement change since the previous `update`
    fn basic_incr_delta_disp(&self) -> Vec3;

    fn initial_length(&self) -> f64;

    fn deformed_length(&self) -> f64;

    /// Natural forces to local end forces
    fn basic_force_to_local(&self, q: &Vec3) -> Vec6;

    /// Natural forces to global end forces
    fn basic_force_to_global(&self, q: &Vec3) -> Vec6;

    /// Natural tangent to global tangent, including any chord-rotation term from `q`
    fn basic_stiff_to_global(&self, kb: &Mat3, q: &Vec3) -> Mat6;

    /// Natural initial stiffness to global coordinates (no force-dependent terms)
    fn initial_basic_stiff_to_global(&self, kb: &Mat3) -> Mat6;

    fn commit_state(&mut self);

    fn revert_to_last_commit(&mut self);

    fn revert_to_start(&mut self);

    fn name(&self) -> &'static str;
}

/// Chord geometry and displacement history shared by the small-displacement transformations
#[derive(Debug, Clone)]
struct Chord {
    length: f64,
    cos_x: f64,
    sin_x: f64,
    t: Mat6,
    a: Mat36,
    trial_disp: Vec6,
    last_update_disp: Vec6,
    committed_disp: Vec6,
}

impl Chord {
    fn new() -> Self {
        Self {
            length: 0.0,
            cos_x: 1.0,
            sin_x: 0.0,
            t: Mat6::identity(),
            a: Mat36::zeros(),
            trial_disp: Vec6::zeros(),
            last_update_disp: Vec6::zeros(),
            committed_disp: Vec6::zeros(),
        }
    }

    fn initialize(&mut self, node_i: &Node, node_j: &Node) -> ElementResult<()> {
        let length = node_i.distance_to(node_j);
        if length < 1e-12 {
            return Err(ElementError::CoincidentNodes(node_i.tag, node_j.tag));
        }
        let [xi, yi] = node_i.coords();
        let [xj, yj] = node_j.coords();
        self.length = length;
        self.cos_x = (xj - xi) / length;
        self.sin_x = (yj - yi) / length;
        self.t = math::rotation_matrix(self.cos_x, self.sin_x);
        self.a = math::basic_compatibility_matrix(length);
        Ok(())
    }

    fn check_initialized(&self) -> ElementResult<()> {
        if self.length > 0.0 {
            Ok(())
        } else {
            Err(ElementError::TransformFailed(
                "transformation used before initialize()".to_string(),
            ))
        }
    }

    fn update(&mut self, global_disp: &Vec6) -> ElementResult<()> {
        self.check_initialized()?;
        if global_disp.iter().any(|u| !u.is_finite()) {
            return Err(ElementError::TransformFailed(
                "non-finite trial displacement".to_string(),
            ));
        }
        self.last_update_disp = self.trial_disp;
        self.trial_disp = *global_disp;
        Ok(())
    }

    fn local(&self, global: &Vec6) -> Vec6 {
        self.t * global
    }

    fn basic(&self, global: &Vec6) -> Vec3 {
        self.a * self.local(global)
    }

    fn commit(&mut self) {
        self.committed_disp = self.trial_disp;
        self.last_update_disp = self.trial_disp;
    }

    fn revert(&mut self) {
        self.trial_disp = self.committed_disp;
        self.last_update_disp = self.committed_disp;
    }

    fn reset(&mut self) {
        self.trial_disp = Vec6::zeros();
        self.last_update_disp = Vec6::zeros();
        self.committed_disp = Vec6::zeros();
    }
}

/// Small-displacement transformation
#[derive(Debug, Clone)]
pub struct LinearCrdTransf2d {
    chord: Chord,
}

impl LinearCrdTransf2d {
    pub fn new() -> Self {
        Self { chord: Chord::new() }
    }
}

impl Default for LinearCrdTransf2d {
    fn default() -> Self {
        Self::new()
    }
}

impl CrdTransf2d for LinearCrdTransf2d {
    fn initialize(&mut self, node_i: &Node, node_j: &Node) -> ElementResult<()> {
        self.chord.initialize(node_i, node_j)
    }

    fn update(&mut self, global_disp: &Vec6) -> ElementResult<()> {
        self.chord.update(global_disp)
    }

    fn basic_trial_disp(&self) -> Vec3 {
        self.chord.basic(&self.chord.trial_disp)
    }

    fn basic_incr_delta_disp(&self) -> Vec3 {
        self.chord
            .basic(&(self.chord.trial_disp - self.chord.last_update_disp))
    }

    fn initial_length(&self) -> f64 {
        self.chord.length
    }

    fn deformed_length(&self) -> f64 {
        self.chord.length
    }

    fn basic_force_to_local(&self, q: &Vec3) -> Vec6 {
        self.chord.a.transpose() * q
    }

    fn basic_force_to_global(&self, q: &Vec3) -> Vec6 {
        self.chord.t.transpose() * self.basic_force_to_local(q)
    }

    fn basic_stiff_to_global(&self, kb: &Mat3, _q: &Vec3) -> Mat6 {
        self.initial_basic_stiff_to_global(kb)
    }

    fn initial_basic_stiff_to_global(&self, kb: &Mat3) -> Mat6 {
        let at = self.chord.a * self.chord.t;
        at.transpose() * kb * at
    }

    fn commit_state(&mut self) {
        self.chord.commit();
    }

    fn revert_to_last_commit(&mut self) {
        self.chord.revert();
    }

    fn revert_to_start(&mut self) {
        self.chord.reset();
    }

    fn name(&self) -> &'static str {
        "Linear"
    }
}

/// Small-displacement transformation with the P-Delta chord-rotation term
#[derive(Debug, Clone)]
pub struct PDeltaCrdTransf2d {
    chord: Chord,
}

impl PDeltaCrdTransf2d {
    pub fn new() -> Self {
        Self { chord: Chord::new() }
    }

    /// Relative transverse end displacement in local coordinates
    fn chord_offset(&self) -> f64 {
        let ul = self.chord.local(&self.chord.trial_disp);
        ul[4] - ul[1]
    }
}

impl Default for PDeltaCrdTransf2d {
    fn default() -> Self {
        Self::new()
    }
}

impl CrdTransf2d for PDeltaCrdTransf2d {
    fn initialize(&mut self, node_i: &Node, node_j: &Node) -> ElementResult<()> {
        self.chord.initialize(node_i, node_j)
    }

    fn update(&mut self, global_disp: &Vec6) -> ElementResult<()> {
        self.chord.update(global_disp)
    }

    fn basic_trial_disp(&self) -> Vec3 {
        self.chord.basic(&self.chord.trial_disp)
    }

    fn basic_incr_delta_disp(&self) -> Vec3 {
        self.chord
            .basic(&(self.chord.trial_disp - self.chord.last_update_disp))
    }

    fn initial_length(&self) -> f64 {
        self.chord.length
    }

    fn deformed_length(&self) -> f64 {
        self.chord.length
    }

    fn basic_force_to_local(&self, q: &Vec3) -> Vec6 {
        let mut pl = self.chord.a.transpose() * q;

        // Axial force acting through the rotated chord
        let n_delta_l = q[0] * self.chord_offset() / self.chord.length;
        pl[1] -= n_delta_l;
        pl[4] += n_delta_l;

        pl
    }

    fn basic_force_to_global(&self, q: &Vec3) -> Vec6 {
        self.chord.t.transpose() * self.basic_force_to_local(q)
    }

    fn basic_stiff_to_global(&self, kb: &Mat3, q: &Vec3) -> Mat6 {
        let mut kl = self.chord.a.transpose() * kb * self.chord.a;

        let n_l = q[0] / self.chord.length;
        kl[(1, 1)] += n_l;
        kl[(4, 4)] += n_l;
        kl[(1, 4)] -= n_l;
        kl[(4, 1)] -= n_l;

        self.chord.t.transpose() * kl * self.chord.t
    }

    fn initial_basic_stiff_to_global(&self, kb: &Mat3) -> Mat6 {
        let at = self.chord.a * self.chord.t;
        at.transpose() * kb * at
    }

    fn commit_state(&mut self) {
        self.chord.commit();
    }

    fn revert_to_last_commit(&mut self) {
        self.chord.revert();
    }

    fn revert_to_start(&mut self) {
        self.chord.reset();
    }

    fn name(&self) -> &'static str {
        "PDelta"
    }
}

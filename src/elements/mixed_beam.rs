//! Two-node mixed-formulation beam-column element
//!
//! The element owns its sections, its quadrature rule and its coordinate
//! transformation. A host drives it through `attach`, `update`,
//! `commit_state` and the two revert operations, and reads back the tangent
//! stiffness and resisting force in global coordinates.

use std::fmt;

use log::{info, trace, warn};

use crate::analysis::{LocalSolveReport, SolverOptions};
use crate::elements::node::{Node, NODE_DOFS};
use crate::elements::section::SectionForceDeformation;
use crate::error::{ElementError, ElementResult};
use crate::integration::BeamIntegration;
use crate::kinematics::KinematicBuilder;
use crate::math::{Mat3, Mat6, Vec3, Vec6};
use crate::mixed::{self, InitialState, Workspace};
use crate::results::{Response, ResponseValue, SectionQuantity};
use crate::state::{ElementState, Lifecycle, SectionState};
use crate::transform::CrdTransf2d;

/// Mixed (Hellinger-Reissner) beam-column element in 2D
pub struct MixedBeamColumn2d {
    tag: usize,
    nodes: [usize; 2],
    sections: Vec<Box<dyn SectionForceDeformation>>,
    integration: Box<dyn BeamIntegration>,
    transf: Box<dyn CrdTransf2d>,
    /// Mass per unit length
    rho: f64,
    options: SolverOptions,

    kinematics: Option<KinematicBuilder>,
    workspace: Workspace,
    initial: Option<InitialState>,

    lifecycle: Lifecycle,
    trial: ElementState,
    committed: ElementState,
    last_report: LocalSolveReport,
}

impl MixedBeamColumn2d {
    /// Create an element with default solver options
    ///
    /// # Arguments
    /// * `tag` - Element tag
    /// * `nodes` - Tags of the i and j nodes
    /// * `sections` - One section per integration point, ordered from node i
    /// * `integration` - Rule placing the sections along the element
    /// * `transf` - Coordinate transformation
    pub fn new(
        tag: usize,
        nodes: [usize; 2],
        sections: Vec<Box<dyn SectionForceDeformation>>,
        integration: Box<dyn BeamIntegration>,
        transf: Box<dyn CrdTransf2d>,
    ) -> ElementResult<Self> {
        if sections.is_empty() {
            return Err(ElementError::NoSections);
        }
        let num_sections = sections.len();

        Ok(Self {
            tag,
            nodes,
            sections,
            integration,
            transf,
            rho: 0.0,
            options: SolverOptions::default(),
            kinematics: None,
            workspace: Workspace::new(num_sections),
            initial: None,
            lifecycle: Lifecycle::Pristine,
            trial: ElementState::zeros(num_sections, 0.0),
            committed: ElementState::zeros(num_sections, 0.0),
            last_report: LocalSolveReport::idle(),
        })
    }

    /// Create an element with `num_sections` copies of one section
    pub fn uniform(
        tag: usize,
        nodes: [usize; 2],
        section: &dyn SectionForceDeformation,
        num_sections: usize,
        integration: Box<dyn BeamIntegration>,
        transf: Box<dyn CrdTransf2d>,
    ) -> ElementResult<Self> {
        let sections = (0..num_sections).map(|_| section.box_clone()).collect();
        Self::new(tag, nodes, sections, integration, transf)
    }

    /// Set the local solver options
    ///
    /// Tolerances and the iteration cap may change at any time; the
    /// geometric switch is fixed once the element is attached.
    pub fn with_options(mut self, options: SolverOptions) -> ElementResult<Self> {
        options.validate()?;
        if let Some(kin) = &self.kinematics {
            if kin.is_geom_linear() != options.geom_linear {
                return Err(ElementError::InvalidOptions(format!(
                    "element {} is attached; geom_linear cannot change",
                    self.tag
                )));
            }
        }
        self.options = options;
        Ok(self)
    }

    /// Set mass per unit length
    pub fn with_density(mut self, rho: f64) -> Self {
        self.rho = rho;
        self
    }

    // ========================
    // Host accessors
    // ========================

    pub fn tag(&self) -> usize {
        self.tag
    }

    pub fn external_nodes(&self) -> [usize; 2] {
        self.nodes
    }

    pub fn num_external_nodes(&self) -> usize {
        2
    }

    pub fn num_dof(&self) -> usize {
        2 * NODE_DOFS
    }

    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn trial_state(&self) -> &ElementState {
        &self.trial
    }

    pub fn committed_state(&self) -> &ElementState {
        &self.committed
    }

    /// Diagnostics of the most recent `update`
    pub fn last_report(&self) -> LocalSolveReport {
        self.last_report
    }

    /// Element length at the last local iteration
    pub fn length(&self) -> f64 {
        self.trial.length
    }

    /// Element length at the last converged step
    pub fn committed_length(&self) -> f64 {
        self.committed.length
    }

    fn check_attached(&self) -> ElementResult<&KinematicBuilder> {
        self.kinematics
            .as_ref()
            .ok_or(ElementError::NotAttached(self.tag))
    }

    // ========================
    // Lifecycle
    // ========================

    /// Size the element state from its end nodes
    pub fn attach(&mut self, node_i: &Node, node_j: &Node) -> ElementResult<()> {
        self.transf.initialize(node_i, node_j)?;
        let length = self.transf.initial_length();
        if !(length > 0.0) || !length.is_finite() {
            return Err(ElementError::InvalidLength(length));
        }

        let n = self.sections.len();
        let locations = self.integration.section_locations(n, length);
        if locations.len() != n {
            return Err(ElementError::IntegrationMismatch {
                what: "locations",
                expected: n,
                got: locations.len(),
            });
        }
        let weights = self.integration.section_weights(n, length);
        if weights.len() != n {
            return Err(ElementError::IntegrationMismatch {
                what: "weights",
                expected: n,
                got: weights.len(),
            });
        }

        self.kinematics = Some(KinematicBuilder::new(
            locations,
            weights,
            self.options.geom_linear,
        ));
        self.workspace = Workspace::new(n);
        self.initial = None;
        self.reset_state(length)?;

        let k0 = self.trial.stiffness;
        info!(
            "element {} attached: L = {:.4}, {} sections ({}), initial stiffness diag [{:.4e}, {:.4e}, {:.4e}]",
            self.tag,
            length,
            n,
            self.integration.name(),
            k0[(0, 0)],
            k0[(1, 1)],
            k0[(2, 2)]
        );
        Ok(())
    }

    /// Recompute the initial stiffness and seed trial and committed state from it
    fn reset_state(&mut self, length: f64) -> ElementResult<()> {
        let kin = self.check_attached()?;
        let init = mixed::initial_state(kin, &self.sections, length)?;

        let mut state = ElementState::zeros(self.sections.len(), length);
        for (ss, fs) in state.sections.iter_mut().zip(&init.flexibilities) {
            *ss = SectionState::virgin(*fs);
        }
        state.natural.h_inv = init.h_inv;
        state.natural.gmh = init.g;
        state.stiffness = init.stiffness;

        self.trial.clone_from(&state);
        self.committed = state;
        self.initial = Some(init);
        self.last_report = LocalSolveReport::idle();
        self.lifecycle = Lifecycle::Attached;
        Ok(())
    }

    /// Run the local state determination for a trial global end displacement
    ///
    /// Local non-convergence is reported through the returned status; only
    /// collaborator failures and usage errors are `Err`. A failed update
    /// restores the last committed state.
    pub fn update(&mut self, global_disp: &Vec6) -> ElementResult<LocalSolveReport> {
        self.check_attached()?;

        match self.run_update(global_disp) {
            Ok(report) => {
                self.last_report = report;
                self.lifecycle = Lifecycle::Trial;
                Ok(report)
            }
            Err(err) => {
                warn!("element {} update failed: {err}", self.tag);
                if let Err(revert_err) = self.restore_committed() {
                    warn!("element {} sections not restored: {revert_err}", self.tag);
                }
                Err(err)
            }
        }
    }

    fn run_update(&mut self, global_disp: &Vec6) -> ElementResult<LocalSolveReport> {
        self.transf.update(global_disp)?;
        let v = self.transf.basic_trial_disp();
        let dv = self.transf.basic_incr_delta_disp();
        let length = self.transf.deformed_length();

        let kin = self
            .kinematics
            .as_ref()
            .ok_or(ElementError::NotAttached(self.tag))?;
        mixed::solve(
            kin,
            &self.options,
            &mut self.sections,
            &mut self.workspace,
            &mut self.trial,
            &v,
            &dv,
            length,
        )
    }

    /// Accept the trial state of the last `update`
    pub fn commit_state(&mut self) -> ElementResult<()> {
        match self.lifecycle {
            Lifecycle::Pristine => return Err(ElementError::NotAttached(self.tag)),
            Lifecycle::Attached => return Err(ElementError::CommitWithoutUpdate(self.tag)),
            Lifecycle::Trial => {}
        }

        // All sections commit or none does
        let snapshot: Vec<Box<dyn SectionForceDeformation>> =
            self.sections.iter().map(|section| section.box_clone()).collect();
        let refused = self
            .sections
            .iter_mut()
            .enumerate()
            .find_map(|(index, section)| section.commit_state().err().map(|reason| (index, reason)));
        if let Some((index, reason)) = refused {
            self.sections = snapshot;
            warn!("element {} commit refused by section {index}: {reason}", self.tag);
            return Err(ElementError::SectionFailed { index, reason });
        }
        self.transf.commit_state();
        self.committed.clone_from(&self.trial);
        self.lifecycle = Lifecycle::Attached;

        trace!(
            "element {} committed: q = {:?}",
            self.tag,
            self.committed.natural.force
        );
        Ok(())
    }

    /// Discard the trial state and return to the last committed state
    pub fn revert_to_last_commit(&mut self) -> ElementResult<()> {
        self.check_attached()?;
        self.restore_committed()?;
        trace!("element {} reverted to last commit", self.tag);
        Ok(())
    }

    fn restore_committed(&mut self) -> ElementResult<()> {
        self.transf.revert_to_last_commit();
        self.trial.clone_from(&self.committed);
        self.lifecycle = Lifecycle::Attached;

        for (index, section) in self.sections.iter_mut().enumerate() {
            section
                .revert_to_last_commit()
                .map_err(|reason| ElementError::SectionFailed { index, reason })?;
        }
        Ok(())
    }

    /// Return to the virgin state; the initial stiffness is recomputed
    pub fn revert_to_start(&mut self) -> ElementResult<()> {
        for (index, section) in self.sections.iter_mut().enumerate() {
            section
                .revert_to_start()
                .map_err(|reason| ElementError::SectionFailed { index, reason })?;
        }
        self.transf.revert_to_start();
        self.initial = None;
        self.last_report = LocalSolveReport::idle();

        if self.kinematics.is_some() {
            let length = self.transf.initial_length();
            self.reset_state(length)?;
        } else {
            let n = self.sections.len();
            self.trial = ElementState::zeros(n, 0.0);
            self.committed = ElementState::zeros(n, 0.0);
            self.lifecycle = Lifecycle::Pristine;
        }
        trace!("element {} reverted to start", self.tag);
        Ok(())
    }

    // ========================
    // Stiffness, mass and forces
    // ========================

    /// Basic (natural) resisting force [N, Mi, Mj]
    pub fn basic_force(&self) -> Vec3 {
        self.trial.natural.resisting_force
    }

    /// Basic (natural) tangent stiffness
    pub fn basic_stiffness(&self) -> Mat3 {
        self.trial.stiffness
    }

    /// Cached basic initial stiffness, `None` until attached
    pub fn initial_basic_stiffness(&self) -> Option<Mat3> {
        self.initial.as_ref().map(|init| init.stiffness)
    }

    /// Tangent stiffness in global coordinates
    pub fn tangent_stiff(&self) -> ElementResult<Mat6> {
        self.check_attached()?;
        Ok(self
            .transf
            .basic_stiff_to_global(&self.trial.stiffness, &self.trial.natural.resisting_force))
    }

    /// Initial stiffness in global coordinates
    pub fn initial_stiff(&self) -> ElementResult<Mat6> {
        let init = self
            .initial
            .as_ref()
            .ok_or(ElementError::NotAttached(self.tag))?;
        Ok(self.transf.initial_basic_stiff_to_global(&init.stiffness))
    }

    /// Lumped mass matrix, ρL/2 on the translational DOFs
    pub fn mass(&self) -> ElementResult<Mat6> {
        self.check_attached()?;
        let m = 0.5 * self.rho * self.transf.initial_length();

        let mut mass = Mat6::zeros();
        for dof in [0, 1, 3, 4] {
            mass[(dof, dof)] = m;
        }
        Ok(mass)
    }

    /// Resisting force in global coordinates
    pub fn resisting_force(&self) -> ElementResult<Vec6> {
        self.check_attached()?;
        Ok(self
            .transf
            .basic_force_to_global(&self.trial.natural.resisting_force))
    }

    /// Resisting force in local coordinates
    pub fn local_force(&self) -> ElementResult<Vec6> {
        self.check_attached()?;
        Ok(self
            .transf
            .basic_force_to_local(&self.trial.natural.resisting_force))
    }

    /// Resisting force plus the inertia force M·a for global nodal accelerations
    pub fn resisting_force_inc_inertia(&self, accel: &Vec6) -> ElementResult<Vec6> {
        Ok(self.resisting_force()? + self.mass()? * accel)
    }

    // ========================
    // Response queries
    // ========================

    /// Integration point positions along the element
    pub fn integration_points(&self) -> ElementResult<Vec<f64>> {
        let kin = self.check_attached()?;
        let length = self.length();
        Ok(kin.locations().iter().map(|xi| xi * length).collect())
    }

    /// Integration weights scaled by the element length
    pub fn integration_weights(&self) -> ElementResult<Vec<f64>> {
        let kin = self.check_attached()?;
        let length = self.length();
        Ok(kin.weights().iter().map(|w| w * length).collect())
    }

    /// Look up a named response quantity
    pub fn response(&self, response: &Response) -> ElementResult<ResponseValue> {
        self.check_attached()?;

        let value = match response {
            Response::GlobalForce => ResponseValue::from_vector(&self.resisting_force()?),
            Response::LocalForce => ResponseValue::from_vector(&self.local_force()?),
            Response::BasicForce => ResponseValue::from_vector(&self.basic_force()),
            Response::BasicStiffness => ResponseValue::from_matrix(&self.basic_stiffness()),
            Response::IntegrationPoints => ResponseValue::Vector(self.integration_points()?),
            Response::IntegrationWeights => ResponseValue::Vector(self.integration_weights()?),
            Response::SectionForces => {
                ResponseValue::Vector(self.trial.stacked_section_forces())
            }
            Response::SectionDeformations => {
                ResponseValue::Vector(self.trial.stacked_section_deformations())
            }
            Response::Section { number, quantity } => {
                let section = number
                    .checked_sub(1)
                    .and_then(|index| self.trial.sections.get(index))
                    .ok_or(ElementError::SectionOutOfRange(*number))?;
                match quantity {
                    SectionQuantity::Force => ResponseValue::from_vector(&section.force),
                    SectionQuantity::Deformation => {
                        ResponseValue::from_vector(&section.deformation)
                    }
                    SectionQuantity::Flexibility => {
                        ResponseValue::from_matrix(&section.flexibility)
                    }
                }
            }
            Response::Convergence => ResponseValue::Convergence(self.last_report),
        };
        Ok(value)
    }
}

impl fmt::Display for MixedBeamColumn2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let q = self.trial.natural.resisting_force;
        writeln!(f, "MixedBeamColumn2d {}", self.tag)?;
        writeln!(f, "  nodes: {} {}", self.nodes[0], self.nodes[1])?;
        writeln!(
            f,
            "  sections: {} ({} integration), transformation: {}",
            self.sections.len(),
            self.integration.name(),
            self.transf.name()
        )?;
        writeln!(f, "  rho: {}, length: {:.6}", self.rho, self.length())?;
        write!(f, "  basic force: N = {:.6e}, Mi = {:.6e}, Mj = {:.6e}", q[0], q[1], q[2])
    }
}

impl fmt::Debug for MixedBeamColumn2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixedBeamColumn2d")
            .field("tag", &self.tag)
            .field("nodes", &self.nodes)
            .field("sections", &self.sections)
            .field("integration", &self.integration.name())
            .field("transf", &self.transf.name())
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}

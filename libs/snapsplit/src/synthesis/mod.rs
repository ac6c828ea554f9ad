//! # Connector Synthesis
//!
//! Fuses the pins of a placement plan into the male part and cuts the
//! matching sockets from the female part.
//!
//! Both parts are edited as working copies. A boolean that fails rolls
//! back only its own instance; cancellation discards the whole call and
//! leaves both parts as they were.

pub mod solids;


use glam::DVec3;
use snapsplit_mesh::{GeometryKernel, Mesh, MeshResult};
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::error::{GeometryError, InputError, SelectionError, SnapSplitResult};
use crate::part::{Part, PartId};
use crate::placement::{ConnectorInstance, PlacementPlan};
use crate::tolerance::ResolvedTolerance;

pub use solids::ConnectorSolids;

/// A connector that could not be synthesized.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceFailure {
    /// Index into the plan.
    pub index: usize,
    pub error: GeometryError,
}

/// Outcome of connecting one seam.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectResult {
    pub male: PartId,
    pub female: PartId,
    /// Index of the seam's split plane.
    pub plane: usize,
    pub tolerance: ResolvedTolerance,
    /// Plan indices of the connectors now present in both parts.
    pub succeeded: Vec<usize>,
    pub failed: Vec<InstanceFailure>,
    /// Requested positions dropped during placement.
    pub rejected_points: Vec<DVec3>,
}

impl ConnectResult {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy)]
enum BooleanOp {
    Union,
    Difference,
}

/// Applies placement plans through a geometry kernel.
pub struct ConnectorSynthesizer<'a> {
    kernel: &'a dyn GeometryKernel,
}

impl<'a> ConnectorSynthesizer<'a> {
    pub fn new(kernel: &'a dyn GeometryKernel) -> Self {
        Self { kernel }
    }

    /// Synthesizes every instance of `plan` into `male` and `female`.
    ///
    /// # Errors
    ///
    /// Role and open-seam problems are reported before any boolean runs.
    /// [`SnapSplitError::Cancelled`](crate::error::SnapSplitError::Cancelled)
    /// when `cancel` fires; neither part is modified then. Boolean failures
    /// are not errors: they are listed in [`ConnectResult::failed`].
    pub fn synthesize(
        &self,
        male: &mut Part,
        female: &mut Part,
        plan: &PlacementPlan,
        tolerance: &ResolvedTolerance,
        cancel: &CancelToken,
    ) -> SnapSplitResult<ConnectResult> {
        for part in [&*male, &*female] {
            if part.is_open() {
                return Err(InputError::OpenSeams(part.id()).into());
            }
        }
        let roles_match = plan
            .instances
            .iter()
            .all(|i| i.male == male.id() && i.female == female.id());
        if !roles_match {
            return Err(SelectionError::NotAdjacent {
                a: male.id(),
                b: female.id(),
            }
            .into());
        }

        let mut work_male = male.mesh().clone();
        let mut work_female = female.mesh().clone();
        let mut succeeded = Vec::with_capacity(plan.len());
        let mut failed = Vec::new();

        for (index, instance) in plan.instances.iter().enumerate() {
            cancel.check()?;
            match self.apply_instance(instance, &work_male, &work_female, cancel)? {
                Ok((next_male, next_female)) => {
                    work_male = next_male;
                    work_female = next_female;
                    succeeded.push(index);
                    debug!(index, "connector synthesized");
                }
                Err(source) => {
                    warn!(index, %source, "connector rolled back");
                    failed.push(InstanceFailure {
                        index,
                        error: GeometryError::Instance { index, source },
                    });
                }
            }
        }
        cancel.check()?;

        if !succeeded.is_empty() {
            male.replace_mesh(work_male);
            female.replace_mesh(work_female);
        }
        info!(
            male = %male.id(),
            female = %female.id(),
            succeeded = succeeded.len(),
            failed = failed.len(),
            "connectors synthesized"
        );
        Ok(ConnectResult {
            male: male.id(),
            female: female.id(),
            plane: plan.plane,
            tolerance: *tolerance,
            succeeded,
            failed,
            rejected_points: plan.rejected.clone(),
        })
    }

    /// Runs the booleans of one instance on copies of the working meshes.
    ///
    /// The outer result carries cancellation, the inner one the kernel
    /// failure that rolls this instance back.
    fn apply_instance(
        &self,
        instance: &ConnectorInstance,
        male: &Mesh,
        female: &Mesh,
        cancel: &CancelToken,
    ) -> SnapSplitResult<MeshResult<(Mesh, Mesh)>> {
        let solids = match ConnectorSolids::for_instance(instance) {
            Ok(solids) => solids,
            Err(error) => return Ok(Err(error)),
        };
        let mut steps: Vec<(Role, BooleanOp, &Mesh)> = vec![(Role::Male, BooleanOp::Union, &solids.pin)];
        if let Some(ring) = &solids.ring {
            steps.push((Role::Male, BooleanOp::Union, ring));
        }
        steps.push((Role::Female, BooleanOp::Difference, &solids.socket));
        if let Some(groove) = &solids.groove {
            steps.push((Role::Female, BooleanOp::Difference, groove));
        }

        let mut next_male = male.clone();
        let mut next_female = female.clone();
        for (role, op, solid) in steps {
            cancel.check()?;
            let target = match role {
                Role::Male => &mut next_male,
                Role::Female => &mut next_female,
            };
            let result = match op {
                BooleanOp::Union => self.kernel.union(target, solid),
                BooleanOp::Difference => self.kernel.difference(target, solid),
            };
            match result {
                Ok(mesh) => *target = mesh,
                Err(error) => return Ok(Err(error)),
            }
        }
        Ok(Ok((next_male, next_female)))
    }
}

//! Optimistic mutation of the active workflow state.
//!
//! Every structural change follows the same sequence: capture the active
//! snapshot, apply the plan to a copy and make the copy active right away,
//! hand the persistence collaborator a `MutationRequest`, and on failure put
//! the captured snapshot back verbatim. Retries are the collaborator's concern.

use crate::error::{PersistenceError, SessionError};
use crate::graph::{BlockId, PathId, WorkflowSnapshot};
use crate::planner::{
    DeletionPlan, DetachLink, Retype, apply_plan, plan_block_deletion, plan_branch_removal,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Mutation ids are unique across every session in the process.
static NEXT_MUTATION: AtomicU64 = AtomicU64::new(1);

/// The remote write a plan translates into.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MutationRequest {
    /// Every block deleted, including the blocks of removed paths.
    pub delete_block_ids: Vec<BlockId>,
    pub delete_path_ids: Vec<PathId>,
    pub retype: Vec<Retype>,
    pub detach: Vec<DetachLink>,
}

impl MutationRequest {
    /// Builds the request from a plan and the snapshot the plan was computed on.
    pub fn from_plan(plan: &DeletionPlan, before: &WorkflowSnapshot) -> Self {
        Self {
            delete_block_ids: plan.deleted_block_ids(before),
            delete_path_ids: plan.paths_to_remove.iter().copied().collect(),
            retype: plan.blocks_to_retype.clone(),
            detach: plan.links_to_detach.clone(),
        }
    }
}

/// The seam to the external persistence layer.
///
/// Implementations issue the remote write and report whether it stuck. A
/// rejected or failed write is final for that mutation; it is never retried here.
pub trait PersistenceGateway {
    fn commit(&mut self, request: &MutationRequest) -> Result<(), PersistenceError>;
}

impl<F> PersistenceGateway for F
where
    F: FnMut(&MutationRequest) -> Result<(), PersistenceError>,
{
    fn commit(&mut self, request: &MutationRequest) -> Result<(), PersistenceError> {
        self(request)
    }
}

/// A mutation that has been applied locally but not yet confirmed remotely.
#[derive(Debug)]
pub struct PendingMutation {
    id: u64,
    before: WorkflowSnapshot,
    plan: DeletionPlan,
    request: MutationRequest,
}

impl PendingMutation {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The snapshot that was active before the plan was applied.
    pub fn before(&self) -> &WorkflowSnapshot {
        &self.before
    }

    pub fn plan(&self) -> &DeletionPlan {
        &self.plan
    }

    pub fn request(&self) -> &MutationRequest {
        &self.request
    }
}

/// Owns the active snapshot of one workflow and serializes mutations on it.
#[derive(Debug, Default)]
pub struct WorkflowSession {
    active: WorkflowSnapshot,
    in_flight: Option<u64>,
}

impl WorkflowSession {
    pub fn new(snapshot: WorkflowSnapshot) -> Self {
        Self {
            active: snapshot,
            in_flight: None,
        }
    }

    pub fn snapshot(&self) -> &WorkflowSnapshot {
        &self.active
    }

    /// The id of the mutation awaiting confirmation, if any.
    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    /// Replaces the active state with a snapshot refreshed from persistence.
    pub fn replace_snapshot(&mut self, snapshot: WorkflowSnapshot) -> Result<(), SessionError> {
        if let Some(id) = self.in_flight {
            return Err(SessionError::MutationInFlight(id));
        }
        self.active = snapshot;
        Ok(())
    }

    /// Applies `plan` optimistically and returns the mutation to confirm or roll back.
    pub fn begin(&mut self, plan: DeletionPlan) -> Result<PendingMutation, SessionError> {
        if let Some(id) = self.in_flight {
            return Err(SessionError::MutationInFlight(id));
        }
        let id = NEXT_MUTATION.fetch_add(1, Ordering::Relaxed);

        let before = self.active.clone();
        let request = MutationRequest::from_plan(&plan, &before);
        self.active = apply_plan(&before, &plan);
        self.in_flight = Some(id);
        debug!(
            mutation = id,
            blocks = request.delete_block_ids.len(),
            paths = request.delete_path_ids.len(),
            "applied mutation optimistically"
        );

        Ok(PendingMutation {
            id,
            before,
            plan,
            request,
        })
    }

    /// Settles a pending mutation with the persistence outcome.
    ///
    /// On success the optimistic state stays active. On failure the snapshot
    /// captured by `begin` is restored and the error is returned. A pending
    /// mutation begun by another session is rejected and leaves this
    /// session's own in-flight mutation untouched.
    pub fn resolve(
        &mut self,
        pending: PendingMutation,
        outcome: Result<(), PersistenceError>,
    ) -> Result<(), SessionError> {
        if self.in_flight != Some(pending.id) {
            return Err(SessionError::UnknownMutation(pending.id));
        }
        self.in_flight = None;

        match outcome {
            Ok(()) => {
                info!(mutation = pending.id, "mutation confirmed");
                Ok(())
            }
            Err(source) => {
                warn!(mutation = pending.id, error = %source, "mutation failed, rolling back");
                self.active = pending.before;
                Err(SessionError::Persistence {
                    id: pending.id,
                    source,
                })
            }
        }
    }

    /// Runs a plan through begin, the gateway, and resolve in one go.
    ///
    /// Empty plans are not sent to the gateway.
    pub fn execute<G>(&mut self, plan: DeletionPlan, gateway: &mut G) -> Result<(), SessionError>
    where
        G: PersistenceGateway + ?Sized,
    {
        if plan.is_empty() {
            debug!(block = plan.target_block, "empty plan, nothing to persist");
            return Ok(());
        }
        let pending = self.begin(plan)?;
        let outcome = gateway.commit(pending.request());
        self.resolve(pending, outcome)
    }

    /// Plans and executes the deletion of a block against the active snapshot.
    pub fn delete_block<G>(
        &mut self,
        path_id: PathId,
        block_id: BlockId,
        gateway: &mut G,
    ) -> Result<DeletionPlan, SessionError>
    where
        G: PersistenceGateway + ?Sized,
    {
        let plan = match self.active.path(path_id) {
            Some(path) => plan_block_deletion(path, block_id, &self.active),
            None => {
                debug!(path = path_id, "path not found, nothing to delete");
                DeletionPlan::empty(path_id, block_id)
            }
        };
        self.execute(plan.clone(), gateway)?;
        Ok(plan)
    }

    /// Plans and executes the removal of one sibling branch of a fan-out block.
    pub fn remove_branch<G>(
        &mut self,
        fan_out: BlockId,
        target: PathId,
        gateway: &mut G,
    ) -> Result<DeletionPlan, SessionError>
    where
        G: PersistenceGateway + ?Sized,
    {
        let plan = plan_branch_removal(fan_out, target, &self.active);
        self.execute(plan.clone(), gateway)?;
        Ok(plan)
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared assign+provision sequence.
//!
//! The request handler (create, post-release drain) and the lifecycle
//! manager's queue processor both turn a claimed slot into a running
//! workspace through [`Dispatcher`], so status reporting and the
//! compensating store release behave identically on every path.

use crate::error::EngineError;
use berth_adapters::{Provisioner, StatusPublisher, TokenProvider};
use berth_core::{Clock, QueuedRequest, SlotAssignment, SlotId, WorkspaceStatus};
use berth_storage::SlotStore;
use std::sync::Arc;

/// Collaborators the engine is wired with.
pub struct EngineDeps<C: Clock> {
    pub store: Arc<SlotStore<C>>,
    pub provisioner: Provisioner,
    pub publisher: Arc<dyn StatusPublisher>,
    pub tokens: Arc<dyn TokenProvider>,
    /// Broker address handed to workspaces so they can report their own status
    pub broker_url: String,
}

impl<C: Clock> Clone for EngineDeps<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            provisioner: self.provisioner.clone(),
            publisher: Arc::clone(&self.publisher),
            tokens: Arc::clone(&self.tokens),
            broker_url: self.broker_url.clone(),
        }
    }
}

/// Outcome of one queue drain attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drained {
    /// Queue empty or no free slot
    Idle,
    Provisioned { slot_id: SlotId, project_id: String },
    /// Provisioning failed; the slot was released and the request dropped
    Failed { slot_id: SlotId, project_id: String },
}

#[derive(Clone)]
pub struct Dispatcher<C: Clock> {
    deps: EngineDeps<C>,
}

impl<C: Clock> Dispatcher<C> {
    pub fn new(deps: EngineDeps<C>) -> Self {
        Self { deps }
    }

    pub fn store(&self) -> &SlotStore<C> {
        &self.deps.store
    }

    pub fn provisioner(&self) -> &Provisioner {
        &self.deps.provisioner
    }

    pub fn tokens(&self) -> &dyn TokenProvider {
        self.deps.tokens.as_ref()
    }

    /// Publish a status event. Failures are logged; they never fail the
    /// request that produced them.
    pub async fn notify(
        &self,
        session_id: &str,
        project_id: &str,
        status: WorkspaceStatus,
        message: &str,
    ) {
        tracing::debug!(%project_id, %session_id, %status, detail = %message, "status update");
        if let Err(e) = self.deps.publisher.publish(session_id, project_id, status, message).await
        {
            tracing::warn!(%project_id, %status, error = %e, "failed to publish status");
        }
    }

    /// Provision a workspace on a slot already claimed for `request`.
    ///
    /// On provisioner failure the claim is undone and the error returned;
    /// RUNNING is only emitted once the provisioner reports success.
    pub async fn provision(
        &self,
        slot_id: SlotId,
        request: &QueuedRequest,
    ) -> Result<(), EngineError> {
        let project_id = request.project_id.as_str();
        let session_id = request.session_id.as_str();
        self.notify(
            session_id,
            project_id,
            WorkspaceStatus::Provisioning,
            &format!("provisioning workspace on slot {}", slot_id),
        )
        .await;

        let assignment = SlotAssignment::for_request(request, &self.deps.broker_url);
        if let Err(e) = self.deps.provisioner.assign(slot_id, &assignment).await {
            match self.deps.store.release_slot(project_id) {
                Ok(_) => {
                    tracing::info!(%slot_id, %project_id, "released slot after failed provision")
                }
                Err(re) => tracing::warn!(
                    %slot_id,
                    %project_id,
                    error = %re,
                    "slot already released after failed provision"
                ),
            }
            return Err(e.into());
        }

        self.notify(
            session_id,
            project_id,
            WorkspaceStatus::Running,
            &format!("workspace running on slot {}", slot_id),
        )
        .await;
        Ok(())
    }

    /// Claim the head of the queue onto a free slot and provision it.
    ///
    /// The claim is atomic in the store, so concurrent drains never hand the
    /// same request or slot out twice. A failed request is dropped with a
    /// FAILED status rather than requeued.
    pub async fn drain_next(&self) -> Drained {
        let Some((slot_id, request)) = self.deps.store.claim_next_queued() else {
            return Drained::Idle;
        };
        tracing::info!(
            %slot_id,
            project_id = %request.project_id,
            remaining = self.deps.store.queue_len(),
            "assigning queued request"
        );

        match self.provision(slot_id, &request).await {
            Ok(()) => Drained::Provisioned { slot_id, project_id: request.project_id },
            Err(e) => {
                tracing::error!(
                    %slot_id,
                    project_id = %request.project_id,
                    error = %e,
                    "queued request failed to provision, dropping"
                );
                self.notify(
                    &request.session_id,
                    &request.project_id,
                    WorkspaceStatus::Failed,
                    &format!("failed to provision workspace: {}", e),
                )
                .await;
                Drained::Failed { slot_id, project_id: request.project_id }
            }
        }
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;

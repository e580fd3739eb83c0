// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle request handling (create, release, pause)
//!
//! Every path is safe under at-least-once delivery: a redelivered create for
//! a project that already runs re-reports RUNNING, a release for a project
//! without a slot reports RELEASED, and a queued project keeps its place.

use crate::dispatch::{Dispatcher, Drained};
use crate::error::EngineError;
use berth_core::{
    Clock, EventType, QueuedRequest, SlotId, SlotStatus, WorkspaceEvent, WorkspacePayload,
    WorkspaceStatus,
};
use berth_storage::StoreError;

/// Attempts at find-then-assign before treating the pool as full.
const CLAIM_ATTEMPTS: usize = 3;

/// What handling a request did, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    Running { slot_id: SlotId },
    /// Project already held a slot
    AlreadyRunning { slot_id: SlotId },
    Queued { position: usize },
    /// Queue at capacity; FAILED was reported
    Rejected,
    Released { slot_id: Option<SlotId>, drained: Drained },
    Paused { slot_id: Option<SlotId>, drained: Drained },
    Ignored,
}

enum Claim {
    Claimed(SlotId),
    Held(SlotId),
}

/// Handles inbound lifecycle requests against the store and provisioner.
#[derive(Clone)]
pub struct WorkspaceHandler<C: Clock> {
    dispatcher: Dispatcher<C>,
}

impl<C: Clock> WorkspaceHandler<C> {
    pub fn new(dispatcher: Dispatcher<C>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher<C> {
        &self.dispatcher
    }

    /// Handle one decoded event.
    ///
    /// An `Err` means the triggering message should be redelivered, see
    /// [`EngineError::should_requeue`].
    pub async fn handle_event(&self, event: &WorkspaceEvent) -> Result<Handled, EngineError> {
        let payload = &event.payload;
        tracing::info!(
            event_type = %event.event_type,
            project_id = %payload.project_id,
            session_id = %payload.session_id,
            "handling workspace event"
        );
        match event.event_type {
            EventType::CreateRequested => self.create(payload).await,
            EventType::ReleaseRequested => Ok(self.release(payload).await),
            EventType::PauseRequested => Ok(self.pause(payload).await),
            EventType::Unknown => {
                tracing::warn!(project_id = %payload.project_id, "ignoring unknown event type");
                Ok(Handled::Ignored)
            }
        }
    }

    async fn create(&self, payload: &WorkspacePayload) -> Result<Handled, EngineError> {
        let store = self.dispatcher.store();
        let project_id = payload.project_id.as_str();
        let session_id = payload.session_id.as_str();
        if project_id.is_empty() {
            tracing::warn!(%session_id, "create request without project id, ignoring");
            return Ok(Handled::Ignored);
        }

        if let Some(slot) = store.find_slot_by_project(project_id) {
            return Ok(self.already_running(slot.id, payload).await);
        }

        let mut request = QueuedRequest::from_payload(payload, store.clock().epoch_ms());
        if request.github_token.is_empty() && !request.user_id.is_empty() {
            match self.dispatcher.tokens().github_token(&request.user_id).await {
                Ok(token) => request.github_token = token,
                Err(e) => tracing::warn!(
                    %project_id,
                    user_id = %request.user_id,
                    error = %e,
                    "github token lookup failed, continuing without token"
                ),
            }
        }

        let slot_id = match self.claim_slot(project_id, session_id) {
            Ok(Claim::Claimed(slot_id)) => slot_id,
            Ok(Claim::Held(slot_id)) => return Ok(self.already_running(slot_id, payload).await),
            Err(StoreError::NoSlotsAvailable) => return self.enqueue(request).await,
            Err(e) => return Err(e.into()),
        };

        // A redelivered create may still be waiting from an earlier attempt.
        store.remove_from_queue(project_id);

        self.dispatcher.provision(slot_id, &request).await?;
        Ok(Handled::Running { slot_id })
    }

    /// Find a free slot and claim it, retrying when another caller wins the
    /// slot between the two steps.
    fn claim_slot(&self, project_id: &str, session_id: &str) -> Result<Claim, StoreError> {
        let store = self.dispatcher.store();
        for attempt in 1..=CLAIM_ATTEMPTS {
            let slot_id = store.find_free_slot()?;
            match store.assign_slot(slot_id, project_id, session_id) {
                Ok(()) => return Ok(Claim::Claimed(slot_id)),
                Err(StoreError::AlreadyAssigned { slot_id, .. }) => {
                    return Ok(Claim::Held(slot_id));
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!(%slot_id, project_id, attempt, "lost slot claim, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Err(StoreError::NoSlotsAvailable)
    }

    async fn already_running(&self, slot_id: SlotId, payload: &WorkspacePayload) -> Handled {
        let store = self.dispatcher.store();
        if let Err(e) = store.update_slot_activity(slot_id) {
            tracing::debug!(%slot_id, error = %e, "could not refresh slot activity");
        }
        tracing::info!(%slot_id, project_id = %payload.project_id, "project already holds a slot");
        self.dispatcher
            .notify(
                &payload.session_id,
                &payload.project_id,
                WorkspaceStatus::Running,
                &format!("workspace running on slot {}", slot_id),
            )
            .await;
        Handled::AlreadyRunning { slot_id }
    }

    async fn enqueue(&self, request: QueuedRequest) -> Result<Handled, EngineError> {
        let project_id = request.project_id.clone();
        let session_id = request.session_id.clone();
        match self.dispatcher.store().add_to_queue(request) {
            Ok(position) => {
                tracing::info!(%project_id, position, "no free slot, request queued");
                self.dispatcher
                    .notify(
                        &session_id,
                        &project_id,
                        WorkspaceStatus::Queued,
                        &format!("queued at position {}", position),
                    )
                    .await;
                Ok(Handled::Queued { position })
            }
            Err(StoreError::QueueFull { capacity }) => {
                tracing::warn!(%project_id, capacity, "queue full, rejecting request");
                self.dispatcher
                    .notify(
                        &session_id,
                        &project_id,
                        WorkspaceStatus::Failed,
                        "server busy: queue full, try again later",
                    )
                    .await;
                Ok(Handled::Rejected)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn release(&self, payload: &WorkspacePayload) -> Handled {
        let project_id = payload.project_id.as_str();
        let slot_id = self.free_slot(project_id).await;
        if slot_id.is_none() && self.dispatcher.store().remove_from_queue(project_id).is_some() {
            tracing::info!(%project_id, "removed queued request");
        }

        let drained = match slot_id {
            Some(_) => self.dispatcher.drain_next().await,
            None => Drained::Idle,
        };

        self.dispatcher
            .notify(&payload.session_id, project_id, WorkspaceStatus::Released, "workspace released")
            .await;
        Handled::Released { slot_id, drained }
    }

    /// pause ⇒ release ⇒ drain.
    async fn pause(&self, payload: &WorkspacePayload) -> Handled {
        let project_id = payload.project_id.as_str();
        let session_id = payload.session_id.as_str();
        let store = self.dispatcher.store();

        let Some(slot) = store.find_slot_by_project(project_id) else {
            tracing::info!(%project_id, "pause requested for project without a slot");
            self.dispatcher
                .notify(session_id, project_id, WorkspaceStatus::Paused, "workspace paused")
                .await;
            return Handled::Paused { slot_id: None, drained: Drained::Idle };
        };

        self.dispatcher
            .notify(session_id, project_id, WorkspaceStatus::Pausing, "pausing workspace")
            .await;
        if let Err(e) = store.update_slot_status(slot.id, SlotStatus::Paused) {
            tracing::debug!(slot_id = %slot.id, error = %e, "could not mark slot paused");
        }
        let slot_id = self.free_slot(project_id).await;
        let drained = match slot_id {
            Some(_) => self.dispatcher.drain_next().await,
            None => Drained::Idle,
        };

        self.dispatcher
            .notify(session_id, project_id, WorkspaceStatus::Paused, "workspace paused")
            .await;
        Handled::Paused { slot_id, drained }
    }

    /// Tear down the project's workspace and free its slot.
    ///
    /// Provisioner errors are logged; capacity is reclaimed regardless.
    async fn free_slot(&self, project_id: &str) -> Option<SlotId> {
        let store = self.dispatcher.store();
        let slot = store.find_slot_by_project(project_id)?;

        if let Err(e) = self.dispatcher.provisioner().release(slot.id, project_id).await {
            tracing::error!(
                slot_id = %slot.id,
                %project_id,
                error = %e,
                "provisioner release failed, freeing slot anyway"
            );
        }

        match store.release_slot(project_id) {
            Ok(slot_id) => {
                tracing::info!(%slot_id, %project_id, "slot freed");
                Some(slot_id)
            }
            Err(e) => {
                tracing::info!(%project_id, error = %e, "slot already released");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;

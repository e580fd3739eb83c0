// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provisioners turn slot assignments into running workspaces.
//!
//! Two families exist and exactly one is wired per deployment:
//!
//! ```text
//! SlotPool   : N long-lived pods, re-purposed by recreation (Kubernetes)
//!                assign_slot_to_project(slot, assignment) / release_slot(slot)
//! PerProject : one container per project, no slot reuse (Docker, local only)
//!                provision_workspace(project, repo) / deprovision_workspace(project)
//! ```
//!
//! [`Provisioner`] is the tagged variant the engine talks to; it dispatches
//! to whichever family was chosen at startup.

mod docker;
mod k8s;

pub use docker::{DockerConfig, DockerProvisioner};
pub use k8s::{KubernetesConfig, KubernetesProvisioner};

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProvisioner, ProvisionCall};

use async_trait::async_trait;
use berth_core::{SlotAssignment, SlotId};
use std::sync::Arc;
use thiserror::Error;

/// Errors from provisioner operations
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("orchestrator API error: {0}")]
    Api(String),
    #[error("docker error: {0}")]
    Docker(String),
    #[error("{what} not ready after {secs}s")]
    Timeout { what: String, secs: u64 },
    #[error("not found: {0}")]
    NotFound(String),
}

/// Slot-pool backend: a fixed set of pods re-purposed per project.
#[async_trait]
pub trait SlotProvisioner: Send + Sync + 'static {
    /// Make sure one pod exists per slot id `1..=count`.
    async fn ensure_slots(&self, count: u32) -> Result<(), ProvisionError>;

    /// Reconfigure a slot for a project and wait until it is ready.
    async fn assign_slot_to_project(
        &self,
        slot_id: SlotId,
        assignment: &SlotAssignment,
    ) -> Result<(), ProvisionError>;

    /// Return a slot to its blank configuration.
    async fn release_slot(&self, slot_id: SlotId) -> Result<(), ProvisionError>;
}

/// Per-project backend: one container per project.
#[async_trait]
pub trait WorkspaceProvisioner: Send + Sync + 'static {
    async fn provision_workspace(
        &self,
        project_id: &str,
        git_repo_url: &str,
    ) -> Result<(), ProvisionError>;

    async fn deprovision_workspace(&self, project_id: &str) -> Result<(), ProvisionError>;
}

/// The provisioning family wired for this process.
#[derive(Clone)]
pub enum Provisioner {
    SlotPool(Arc<dyn SlotProvisioner>),
    PerProject(Arc<dyn WorkspaceProvisioner>),
}

impl Provisioner {
    pub fn kind(&self) -> &'static str {
        match self {
            Provisioner::SlotPool(_) => "slot-pool",
            Provisioner::PerProject(_) => "per-project",
        }
    }

    /// Startup preparation: creates the slot pods for the pool family.
    pub async fn prepare(&self, slot_count: u32) -> Result<(), ProvisionError> {
        match self {
            Provisioner::SlotPool(p) => p.ensure_slots(slot_count).await,
            Provisioner::PerProject(_) => Ok(()),
        }
    }

    /// Materialize an assignment on `slot_id`.
    pub async fn assign(
        &self,
        slot_id: SlotId,
        assignment: &SlotAssignment,
    ) -> Result<(), ProvisionError> {
        let start = std::time::Instant::now();
        let result = match self {
            Provisioner::SlotPool(p) => p.assign_slot_to_project(slot_id, assignment).await,
            Provisioner::PerProject(p) => {
                p.provision_workspace(&assignment.project_id, &assignment.git_repo_url).await
            }
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(()) => tracing::info!(
                %slot_id,
                project_id = %assignment.project_id,
                backend = self.kind(),
                elapsed_ms,
                "workspace provisioned"
            ),
            Err(e) => tracing::error!(
                %slot_id,
                project_id = %assignment.project_id,
                backend = self.kind(),
                elapsed_ms,
                error = %e,
                "provisioning failed"
            ),
        }
        result
    }

    /// Tear down whatever `slot_id` (or `project_id`) is running.
    pub async fn release(&self, slot_id: SlotId, project_id: &str) -> Result<(), ProvisionError> {
        match self {
            Provisioner::SlotPool(p) => p.release_slot(slot_id).await,
            Provisioner::PerProject(p) => p.deprovision_workspace(project_id).await,
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

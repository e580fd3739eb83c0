// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake provisioner for testing

use super::{ProvisionError, SlotProvisioner, WorkspaceProvisioner};
use async_trait::async_trait;
use berth_core::{SlotAssignment, SlotId};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Recorded provisioner call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionCall {
    EnsureSlots(u32),
    Assign { slot_id: SlotId, assignment: SlotAssignment },
    Release { slot_id: SlotId },
    Provision { project_id: String, git_repo_url: String },
    Deprovision { project_id: String },
}

#[derive(Default)]
struct FakeState {
    calls: Vec<ProvisionCall>,
    fail_all_assigns: bool,
    fail_projects: HashSet<String>,
    fail_releases: bool,
}

/// Fake implementing both provisioner families.
///
/// Failures are injected per project or globally; every call is recorded,
/// including the ones that fail.
#[derive(Clone, Default)]
pub struct FakeProvisioner {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every assign/provision call fail.
    pub fn fail_assigns(&self, fail: bool) {
        self.inner.lock().fail_all_assigns = fail;
    }

    /// Make assign/provision calls for one project fail.
    pub fn fail_project(&self, project_id: &str) {
        self.inner.lock().fail_projects.insert(project_id.to_string());
    }

    pub fn fail_releases(&self, fail: bool) {
        self.inner.lock().fail_releases = fail;
    }

    pub fn calls(&self) -> Vec<ProvisionCall> {
        self.inner.lock().calls.clone()
    }

    /// Projects passed to assign/provision, in call order.
    pub fn assigned_projects(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ProvisionCall::Assign { assignment, .. } => Some(assignment.project_id),
                ProvisionCall::Provision { project_id, .. } => Some(project_id),
                _ => None,
            })
            .collect()
    }

    /// Slot ids passed to release, in call order.
    pub fn released_slots(&self) -> Vec<SlotId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ProvisionCall::Release { slot_id } => Some(slot_id),
                _ => None,
            })
            .collect()
    }

    fn record_assign(&self, call: ProvisionCall, project_id: &str) -> Result<(), ProvisionError> {
        let mut state = self.inner.lock();
        state.calls.push(call);
        if state.fail_all_assigns || state.fail_projects.contains(project_id) {
            return Err(ProvisionError::Timeout { what: format!("workspace {}", project_id), secs: 0 });
        }
        Ok(())
    }

    fn record_release(&self, call: ProvisionCall) -> Result<(), ProvisionError> {
        let mut state = self.inner.lock();
        state.calls.push(call);
        if state.fail_releases {
            return Err(ProvisionError::Api("injected release failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SlotProvisioner for FakeProvisioner {
    async fn ensure_slots(&self, count: u32) -> Result<(), ProvisionError> {
        self.inner.lock().calls.push(ProvisionCall::EnsureSlots(count));
        Ok(())
    }

    async fn assign_slot_to_project(
        &self,
        slot_id: SlotId,
        assignment: &SlotAssignment,
    ) -> Result<(), ProvisionError> {
        self.record_assign(
            ProvisionCall::Assign { slot_id, assignment: assignment.clone() },
            &assignment.project_id,
        )
    }

    async fn release_slot(&self, slot_id: SlotId) -> Result<(), ProvisionError> {
        self.record_release(ProvisionCall::Release { slot_id })
    }
}

#[async_trait]
impl WorkspaceProvisioner for FakeProvisioner {
    async fn provision_workspace(
        &self,
        project_id: &str,
        git_repo_url: &str,
    ) -> Result<(), ProvisionError> {
        self.record_assign(
            ProvisionCall::Provision {
                project_id: project_id.to_string(),
                git_repo_url: git_repo_url.to_string(),
            },
            project_id,
        )
    }

    async fn deprovision_workspace(&self, project_id: &str) -> Result<(), ProvisionError> {
        self.record_release(ProvisionCall::Deprovision { project_id: project_id.to_string() })
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{Clock, EventType, FakeClock, WorkspaceEvent, WorkspacePayload};

// ── Proptest strategies ─────────────────────────────────────────────────

pub mod strategies {
    use proptest::prelude::*;

    /// Small project-id alphabet so generated sequences collide often.
    pub fn arb_project_id() -> impl Strategy<Value = String> {
        (0u8..6).prop_map(|n| format!("proj-{}", n))
    }
}

// ── Event factory functions ─────────────────────────────────────────────

pub fn payload(project_id: &str, session_id: &str) -> WorkspacePayload {
    WorkspacePayload {
        project_id: project_id.to_string(),
        user_id: format!("user-{}", project_id),
        git_repo_url: format!("https://github.com/acme/{}.git", project_id),
        session_id: session_id.to_string(),
        github_token: String::new(),
        target_branch: String::new(),
    }
}

fn event(event_type: EventType, project_id: &str, session_id: &str) -> WorkspaceEvent {
    WorkspaceEvent::new(event_type, FakeClock::new().now_utc(), payload(project_id, session_id))
}

pub fn create_event(project_id: &str, session_id: &str) -> WorkspaceEvent {
    event(EventType::CreateRequested, project_id, session_id)
}

pub fn release_event(project_id: &str, session_id: &str) -> WorkspaceEvent {
    event(EventType::ReleaseRequested, project_id, session_id)
}

pub fn pause_event(project_id: &str, session_id: &str) -> WorkspaceEvent {
    event(EventType::PauseRequested, project_id, session_id)
}

pub fn unknown_event(project_id: &str) -> WorkspaceEvent {
    event(EventType::Unknown, project_id, "")
}

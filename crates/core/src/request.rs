// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queued create requests and the provisioning directive built from them.

use crate::event::WorkspacePayload;
use serde::{Deserialize, Serialize};

/// Branch checked out when a request does not name one.
pub const DEFAULT_BRANCH: &str = "main";

/// A create request waiting for a free slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedRequest {
    pub project_id: String,
    pub user_id: String,
    pub git_repo_url: String,
    pub session_id: String,
    pub github_token: String,
    pub target_branch: String,
    pub queued_at_ms: u64,
}

impl QueuedRequest {
    pub fn from_payload(payload: &WorkspacePayload, queued_at_ms: u64) -> Self {
        Self {
            project_id: payload.project_id.clone(),
            user_id: payload.user_id.clone(),
            git_repo_url: payload.git_repo_url.clone(),
            session_id: payload.session_id.clone(),
            github_token: payload.github_token.clone(),
            target_branch: payload.target_branch.clone(),
            queued_at_ms,
        }
    }
}

crate::builder! {
    pub struct QueuedRequestBuilder => QueuedRequest {
        into {
            project_id: String = "proj-1",
            user_id: String = "user-1",
            git_repo_url: String = "https://github.com/acme/app.git",
            session_id: String = "sess-1",
            github_token: String = "",
            target_branch: String = "",
        }
        set {
            queued_at_ms: u64 = 0,
        }
    }
}

/// Everything a provisioner needs to turn a slot into a project's workspace.
///
/// An assignment with every field blank is a release: the slot is recreated
/// without project configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAssignment {
    pub project_id: String,
    pub session_id: String,
    pub git_repo_url: String,
    pub github_token: String,
    /// Broker the workspace publishes its own status to
    pub broker_url: String,
    pub target_branch: String,
}

impl SlotAssignment {
    /// Directive for a request, defaulting the branch to [`DEFAULT_BRANCH`].
    pub fn for_request(request: &QueuedRequest, broker_url: &str) -> Self {
        let target_branch = if request.target_branch.trim().is_empty() {
            DEFAULT_BRANCH.to_string()
        } else {
            request.target_branch.clone()
        };
        Self {
            project_id: request.project_id.clone(),
            session_id: request.session_id.clone(),
            git_repo_url: request.git_repo_url.clone(),
            github_token: request.github_token.clone(),
            broker_url: broker_url.to_string(),
            target_branch,
        }
    }

    /// The release directive.
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn is_blank(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;

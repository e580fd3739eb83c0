// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broker wire types.
//!
//! Inbound [`WorkspaceEvent`]s ask for a workspace to be created, released or
//! paused. Outbound [`WorkspaceStatusEvent`]s report where a session stands.
//! Field names on the wire are snake_case and must not change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of inbound lifecycle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    CreateRequested,
    ReleaseRequested,
    PauseRequested,
    /// Any type this engine does not handle; acknowledged and ignored.
    #[serde(other)]
    Unknown,
}

crate::simple_display! {
    EventType {
        CreateRequested => "CREATE_REQUESTED",
        ReleaseRequested => "RELEASE_REQUESTED",
        PauseRequested => "PAUSE_REQUESTED",
        Unknown => "UNKNOWN",
    }
}

/// Request payload. Absent fields decode as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspacePayload {
    pub project_id: String,
    pub user_id: String,
    pub git_repo_url: String,
    pub session_id: String,
    pub github_token: String,
    pub target_branch: String,
}

/// Inbound lifecycle request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceEvent {
    pub event_type: EventType,
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub payload: WorkspacePayload,
}

impl WorkspaceEvent {
    pub fn new(event_type: EventType, timestamp: DateTime<Utc>, payload: WorkspacePayload) -> Self {
        Self { event_type, timestamp, payload }
    }

    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

/// Session status reported downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkspaceStatus {
    Queued,
    Provisioning,
    Running,
    Pausing,
    Paused,
    Released,
    Failed,
}

crate::simple_display! {
    WorkspaceStatus {
        Queued => "QUEUED",
        Provisioning => "PROVISIONING",
        Running => "RUNNING",
        Pausing => "PAUSING",
        Paused => "PAUSED",
        Released => "RELEASED",
        Failed => "FAILED",
    }
}

/// Outbound event type; there is only one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusEventType {
    #[default]
    StatusUpdated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceStatusPayload {
    pub project_id: String,
    pub session_id: String,
    pub status: WorkspaceStatus,
    pub message: String,
}

/// Outbound status update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceStatusEvent {
    pub event_type: StatusEventType,
    pub timestamp: DateTime<Utc>,
    pub payload: WorkspaceStatusPayload,
}

impl WorkspaceStatusEvent {
    /// Routing key status updates are published with.
    pub const ROUTING_KEY: &'static str = "status.updated";

    pub fn new(
        session_id: &str,
        project_id: &str,
        status: WorkspaceStatus,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_type: StatusEventType::StatusUpdated,
            timestamp,
            payload: WorkspaceStatusPayload {
                project_id: project_id.to_string(),
                session_id: session_id.to_string(),
                status,
                message: message.to_string(),
            },
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;

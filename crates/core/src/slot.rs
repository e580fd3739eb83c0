// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compute slots: the fixed pool of pods workspaces are scheduled onto.
//!
//! Slots are created once at startup with ids `1..=N` and mutated in place
//! for the process lifetime. A slot is busy exactly when it holds a project.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable slot identifier, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub u32);

impl SlotId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    /// No project assigned
    #[default]
    Empty,
    /// Serving a project
    Running,
    /// Idle project being reclaimed
    Paused,
}

crate::simple_display! {
    SlotStatus {
        Empty => "EMPTY",
        Running => "RUNNING",
        Paused => "PAUSED",
    }
}

/// One compute slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    /// Empty when free
    pub project_id: String,
    /// Session served by this slot; empty when free
    pub session_id: String,
    pub is_busy: bool,
    pub status: SlotStatus,
    /// Epoch ms of the last assignment or reported activity
    pub last_activity_ms: u64,
}

impl Slot {
    /// A free slot.
    pub fn empty(id: SlotId, now_ms: u64) -> Self {
        Self {
            id,
            project_id: String::new(),
            session_id: String::new(),
            is_busy: false,
            status: SlotStatus::Empty,
            last_activity_ms: now_ms,
        }
    }

    /// Put the slot to work for a project.
    pub fn occupy(&mut self, project_id: &str, session_id: &str, now_ms: u64) {
        self.project_id = project_id.to_string();
        self.session_id = session_id.to_string();
        self.is_busy = true;
        self.status = SlotStatus::Running;
        self.last_activity_ms = now_ms;
    }

    /// Return the slot to the free pool.
    pub fn clear(&mut self, now_ms: u64) {
        self.project_id.clear();
        self.session_id.clear();
        self.is_busy = false;
        self.status = SlotStatus::Empty;
        self.last_activity_ms = now_ms;
    }

    pub fn holds(&self, project_id: &str) -> bool {
        self.is_busy && !project_id.is_empty() && self.project_id == project_id
    }

    /// Milliseconds since the last activity, saturating at zero.
    pub fn idle_for_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_activity_ms)
    }
}

#[cfg(test)]
#[path = "slot_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use berth_core::{SlotId, SlotStatus};
use thiserror::Error;

/// Errors from slot store operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no slots available")]
    NoSlotsAvailable,
    #[error("queue full ({capacity} requests waiting)")]
    QueueFull { capacity: usize },
    /// Missing slot or project, or a slot someone else already claimed.
    #[error("not found: {0}")]
    NotFound(String),
    #[error("project {project_id} already holds slot {slot_id}")]
    AlreadyAssigned { project_id: String, slot_id: SlotId },
    #[error("project id must not be empty")]
    EmptyProject,
    #[error("slot {slot_id} cannot be marked {status}")]
    InvalidStatus { slot_id: SlotId, status: SlotStatus },
}

impl StoreError {
    /// Expected under load; surfaced to users rather than retried.
    pub fn is_capacity(&self) -> bool {
        matches!(self, StoreError::NoSlotsAvailable | StoreError::QueueFull { .. })
    }

    /// A benign race: the slot or project changed underneath the caller.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

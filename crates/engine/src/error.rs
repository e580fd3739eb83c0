// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use berth_adapters::ProvisionError;
use berth_storage::StoreError;
use thiserror::Error;

/// Errors from handling a lifecycle request
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("provision error: {0}")]
    Provision(#[from] ProvisionError),
}

impl EngineError {
    /// Whether redelivering the triggering message could succeed.
    ///
    /// Capacity errors are reported to the user instead, and a request
    /// without a project never becomes valid.
    pub fn should_requeue(&self) -> bool {
        match self {
            EngineError::Store(StoreError::EmptyProject) => false,
            EngineError::Store(e) => !e.is_capacity(),
            EngineError::Provision(_) => true,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

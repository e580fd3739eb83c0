// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status publisher capability.
//!
//! The broker-backed implementation lives in the daemon; the engine only
//! sees this trait.

use async_trait::async_trait;
use berth_core::WorkspaceStatus;
use thiserror::Error;

/// Errors from status publishing
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("encode error: {0}")]
    Encode(String),
    #[error("broker error: {0}")]
    Broker(String),
    #[error("publish not confirmed by broker")]
    NotConfirmed,
}

/// Emits workspace status events for downstream consumers.
#[async_trait]
pub trait StatusPublisher: Send + Sync + 'static {
    async fn publish(
        &self,
        session_id: &str,
        project_id: &str,
        status: WorkspaceStatus,
        message: &str,
    ) -> Result<(), PublishError>;
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeStatusPublisher, StatusCall};

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{PublishError, StatusPublisher};
    use async_trait::async_trait;
    use berth_core::WorkspaceStatus;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded status event
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct StatusCall {
        pub session_id: String,
        pub project_id: String,
        pub status: WorkspaceStatus,
        pub message: String,
    }

    #[derive(Default)]
    struct FakePublisherState {
        calls: Vec<StatusCall>,
        fail: bool,
    }

    /// Records every publish, including failed ones.
    #[derive(Clone, Default)]
    pub struct FakeStatusPublisher {
        inner: Arc<Mutex<FakePublisherState>>,
    }

    impl FakeStatusPublisher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_publishes(&self, fail: bool) {
            self.inner.lock().fail = fail;
        }

        pub fn calls(&self) -> Vec<StatusCall> {
            self.inner.lock().calls.clone()
        }

        /// Statuses emitted for one project, in order.
        pub fn statuses_for(&self, project_id: &str) -> Vec<WorkspaceStatus> {
            self.inner
                .lock()
                .calls
                .iter()
                .filter(|c| c.project_id == project_id)
                .map(|c| c.status)
                .collect()
        }

        /// Most recent event for one project.
        pub fn last_for(&self, project_id: &str) -> Option<StatusCall> {
            self.inner.lock().calls.iter().rev().find(|c| c.project_id == project_id).cloned()
        }
    }

    #[async_trait]
    impl StatusPublisher for FakeStatusPublisher {
        async fn publish(
            &self,
            session_id: &str,
            project_id: &str,
            status: WorkspaceStatus,
            message: &str,
        ) -> Result<(), PublishError> {
            let mut state = self.inner.lock();
            state.calls.push(StatusCall {
                session_id: session_id.to_string(),
                project_id: project_id.to_string(),
                status,
                message: message.to_string(),
            });
            if state.fail {
                return Err(PublishError::Broker("injected publish failure".to_string()));
            }
            Ok(())
        }
    }
}

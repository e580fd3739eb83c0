// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! berth-engine: request handling and the lifecycle control loops.

mod dispatch;
mod error;
mod handler;
mod lifecycle;

#[cfg(test)]
mod test_helpers;

pub use dispatch::{Dispatcher, Drained, EngineDeps};
pub use error::EngineError;
pub use handler::{Handled, WorkspaceHandler};
pub use lifecycle::{LifecycleConfig, LifecycleManager};

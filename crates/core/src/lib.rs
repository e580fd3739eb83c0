// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! berth-core: data model shared by the slot store, provisioners and engine

pub mod macros;

pub mod clock;
pub mod event;
pub mod request;
pub mod slot;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use event::{
    EventType, StatusEventType, WorkspaceEvent, WorkspacePayload, WorkspaceStatus,
    WorkspaceStatusEvent, WorkspaceStatusPayload,
};
pub use request::{QueuedRequest, SlotAssignment, DEFAULT_BRANCH};
pub use slot::{Slot, SlotId, SlotStatus};

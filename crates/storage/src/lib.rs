// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! berth-storage: in-memory slot inventory and bounded wait queue.
//!
//! [`SlotStore`] is the single source of truth for which project occupies
//! which slot and who is waiting. Every read and write goes through one
//! mutex, and no method performs I/O while holding it.

mod error;
mod store;

pub use error::StoreError;
pub use store::SlotStore;

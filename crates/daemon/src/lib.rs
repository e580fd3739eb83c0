// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! berthd library: configuration, broker plumbing and the request consumer.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod broker;
pub mod config;
pub mod consumer;
pub mod env;
pub mod logging;
mod signal;

pub use broker::{AmqpStatusPublisher, Broker, BrokerError};
pub use config::{Backend, Config, ConfigError, LogFormat};
pub use consumer::{process_delivery, Disposition};
pub use signal::wait_for_shutdown;

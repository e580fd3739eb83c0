// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.
//!
//! Accessors return `Ok(None)` when a variable is unset or blank and an
//! error when it is set to something unparseable.

use crate::config::ConfigError;
use std::str::FromStr;
use std::time::Duration;

pub const AMQP_URL: &str = "BERTH_AMQP_URL";
pub const WORKSPACE_BROKER_URL: &str = "BERTH_WORKSPACE_BROKER_URL";
pub const REQUEST_QUEUE: &str = "BERTH_REQUEST_QUEUE";
pub const CONNECT_TIMEOUT_MS: &str = "BERTH_CONNECT_TIMEOUT_MS";
pub const BACKEND: &str = "BERTH_BACKEND";
pub const SLOT_COUNT: &str = "BERTH_SLOT_COUNT";
pub const QUEUE_SIZE: &str = "BERTH_QUEUE_SIZE";
pub const K8S_NAMESPACE: &str = "BERTH_K8S_NAMESPACE";
pub const SLOT_IMAGE: &str = "BERTH_SLOT_IMAGE";
pub const SLOT_PREFIX: &str = "BERTH_SLOT_PREFIX";
pub const TERMINAL_PORT: &str = "BERTH_TERMINAL_PORT";
pub const PREVIEW_PORT: &str = "BERTH_PREVIEW_PORT";
pub const READY_TIMEOUT_SECS: &str = "BERTH_READY_TIMEOUT_SECS";
pub const READY_POLL_MS: &str = "BERTH_READY_POLL_MS";
pub const IDLE_TIMEOUT_SECS: &str = "BERTH_IDLE_TIMEOUT_SECS";
pub const PAUSE_INTERVAL_SECS: &str = "BERTH_PAUSE_INTERVAL_SECS";
pub const QUEUE_INTERVAL_SECS: &str = "BERTH_QUEUE_INTERVAL_SECS";
pub const TOKEN_URL: &str = "BERTH_TOKEN_URL";
pub const LOG_FORMAT: &str = "BERTH_LOG_FORMAT";

/// Every variable the daemon reads.
pub const ALL: [&str; 19] = [
    AMQP_URL,
    WORKSPACE_BROKER_URL,
    REQUEST_QUEUE,
    CONNECT_TIMEOUT_MS,
    BACKEND,
    SLOT_COUNT,
    QUEUE_SIZE,
    K8S_NAMESPACE,
    SLOT_IMAGE,
    SLOT_PREFIX,
    TERMINAL_PORT,
    PREVIEW_PORT,
    READY_TIMEOUT_SECS,
    READY_POLL_MS,
    IDLE_TIMEOUT_SECS,
    PAUSE_INTERVAL_SECS,
    QUEUE_INTERVAL_SECS,
    TOKEN_URL,
    LOG_FORMAT,
];

/// Trimmed value of `name`, if set and non-empty.
pub fn string(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Parsed value of `name`.
pub fn parsed<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match string(name) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var: name, value }),
        None => Ok(None),
    }
}

pub fn secs(name: &'static str) -> Result<Option<Duration>, ConfigError> {
    Ok(parsed::<u64>(name)?.map(Duration::from_secs))
}

pub fn millis(name: &'static str) -> Result<Option<Duration>, ConfigError> {
    Ok(parsed::<u64>(name)?.map(Duration::from_millis))
}

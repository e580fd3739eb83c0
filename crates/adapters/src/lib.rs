// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for external I/O: pod/container runtimes, the token lookup
//! service, and the status publisher capability.

pub mod provisioner;
pub mod publish;
pub mod token;

pub use provisioner::{
    DockerConfig, DockerProvisioner, KubernetesConfig, KubernetesProvisioner, ProvisionError,
    Provisioner, SlotProvisioner, WorkspaceProvisioner,
};
pub use publish::{PublishError, StatusPublisher};
pub use token::{HttpTokenProvider, NoTokenProvider, TokenError, TokenProvider};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use provisioner::{FakeProvisioner, ProvisionCall};
#[cfg(any(test, feature = "test-support"))]
pub use publish::{FakeStatusPublisher, StatusCall};
#[cfg(any(test, feature = "test-support"))]
pub use token::FakeTokenProvider;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine unit tests.

use crate::{Dispatcher, EngineDeps, LifecycleConfig, LifecycleManager, WorkspaceHandler};
use berth_adapters::{FakeProvisioner, FakeStatusPublisher, FakeTokenProvider, Provisioner};
use berth_core::{FakeClock, WorkspaceStatus};
use berth_storage::SlotStore;
use std::sync::Arc;
use std::time::Duration;

pub(crate) const BROKER_URL: &str = "amqp://rabbit:5672";
pub(crate) const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

pub(crate) struct TestContext {
    pub clock: FakeClock,
    pub store: Arc<SlotStore<FakeClock>>,
    pub provisioner: FakeProvisioner,
    pub publisher: FakeStatusPublisher,
    pub tokens: FakeTokenProvider,
    pub handler: WorkspaceHandler<FakeClock>,
    pub lifecycle: LifecycleManager<FakeClock>,
}

impl TestContext {
    pub fn statuses(&self, project_id: &str) -> Vec<WorkspaceStatus> {
        self.publisher.statuses_for(project_id)
    }

    pub fn last_message(&self, project_id: &str) -> String {
        self.publisher.last_for(project_id).map(|c| c.message).unwrap_or_default()
    }
}

/// Slot-pool wiring with `slots` slots and room for `queue` waiting requests.
pub(crate) fn setup(slots: u32, queue: usize) -> TestContext {
    build(slots, queue, |fake| Provisioner::SlotPool(Arc::new(fake)))
}

/// Per-project (container) wiring.
pub(crate) fn setup_per_project(slots: u32, queue: usize) -> TestContext {
    build(slots, queue, |fake| Provisioner::PerProject(Arc::new(fake)))
}

fn build(
    slots: u32,
    queue: usize,
    wire: impl FnOnce(FakeProvisioner) -> Provisioner,
) -> TestContext {
    let clock = FakeClock::new();
    let store = Arc::new(SlotStore::new(slots, queue, clock.clone()));
    let provisioner = FakeProvisioner::new();
    let publisher = FakeStatusPublisher::new();
    let tokens = FakeTokenProvider::new();

    let dispatcher = Dispatcher::new(EngineDeps {
        store: Arc::clone(&store),
        provisioner: wire(provisioner.clone()),
        publisher: Arc::new(publisher.clone()),
        tokens: Arc::new(tokens.clone()),
        broker_url: BROKER_URL.to_string(),
    });
    let config = LifecycleConfig {
        idle_timeout: IDLE_TIMEOUT,
        pause_interval: Duration::from_secs(60),
        queue_interval: Duration::from_secs(10),
    };

    TestContext {
        clock,
        store,
        provisioner,
        publisher,
        tokens,
        handler: WorkspaceHandler::new(dispatcher.clone()),
        lifecycle: LifecycleManager::new(dispatcher, config),
    }
}

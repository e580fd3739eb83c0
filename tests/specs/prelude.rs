// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for scenario tests.

pub use berth_adapters::{FakeProvisioner, FakeStatusPublisher, FakeTokenProvider, Provisioner};
pub use berth_core::test_support::{create_event, pause_event, release_event};
pub use berth_core::{FakeClock, SlotId, SlotStatus, WorkspaceEvent, WorkspaceStatus};
pub use berth_engine::{Drained, Handled, LifecycleConfig, LifecycleManager, WorkspaceHandler};
pub use berth_storage::SlotStore;
pub use std::time::Duration;

use berth_engine::{Dispatcher, EngineDeps};
use std::sync::Arc;

pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

pub struct World {
    pub clock: FakeClock,
    pub store: Arc<SlotStore<FakeClock>>,
    pub provisioner: FakeProvisioner,
    pub publisher: FakeStatusPublisher,
    pub handler: WorkspaceHandler<FakeClock>,
    pub lifecycle: LifecycleManager<FakeClock>,
}

impl World {
    /// Slot-pool deployment with `slots` slots and `queue_size` queue entries.
    pub fn new(slots: u32, queue_size: usize) -> Self {
        let clock = FakeClock::new();
        let store = Arc::new(SlotStore::new(slots, queue_size, clock.clone()));
        let provisioner = FakeProvisioner::new();
        let publisher = FakeStatusPublisher::new();
        let dispatcher = Dispatcher::new(EngineDeps {
            store: Arc::clone(&store),
            provisioner: Provisioner::SlotPool(Arc::new(provisioner.clone())),
            publisher: Arc::new(publisher.clone()),
            tokens: Arc::new(FakeTokenProvider::new()),
            broker_url: "amqp://rabbit:5672".to_string(),
        });
        let config = LifecycleConfig {
            idle_timeout: IDLE_TIMEOUT,
            pause_interval: Duration::from_secs(60),
            queue_interval: Duration::from_secs(10),
        };
        Self {
            clock,
            store,
            provisioner,
            publisher,
            handler: WorkspaceHandler::new(dispatcher.clone()),
            lifecycle: LifecycleManager::new(dispatcher, config),
        }
    }

    pub async fn send(&self, event: WorkspaceEvent) -> Handled {
        self.handler.handle_event(&event).await.unwrap()
    }

    pub fn statuses(&self, project_id: &str) -> Vec<WorkspaceStatus> {
        self.publisher.statuses_for(project_id)
    }

    pub fn slot_of(&self, project_id: &str) -> Option<SlotId> {
        self.store.find_slot_by_project(project_id).map(|s| s.id)
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provisioner and publisher failures.

use crate::prelude::*;
use berth_core::WorkspaceStatus::*;

#[tokio::test]
async fn failed_assign_releases_slot_without_running() {
    let world = World::new(1, 1);
    world.provisioner.fail_project("P1");

    let result = world.handler.handle_event(&create_event("P1", "s1")).await;

    let err = result.unwrap_err();
    assert!(err.should_requeue());
    assert_eq!(world.statuses("P1"), vec![Provisioning]);
    assert_eq!(world.slot_of("P1"), None);
    assert_eq!(world.store.busy_count(), 0);

    let next = world.send(create_event("P2", "s2")).await;
    assert_eq!(next, Handled::Running { slot_id: SlotId(1) });
}

#[tokio::test]
async fn failed_drain_reports_failure_and_frees_slot() {
    let world = World::new(1, 1);
    world.send(create_event("P1", "s1")).await;
    world.send(create_event("P2", "s2")).await;
    world.provisioner.fail_project("P2");

    let released = world.send(release_event("P1", "s1")).await;

    assert_eq!(
        released,
        Handled::Released {
            slot_id: Some(SlotId(1)),
            drained: Drained::Failed { slot_id: SlotId(1), project_id: "P2".to_string() },
        }
    );
    assert_eq!(world.statuses("P2"), vec![Queued, Provisioning, Failed]);
    assert!(!world.statuses("P2").contains(&Running));
    assert_eq!(world.store.busy_count(), 0);
    assert_eq!(world.store.queue_len(), 0);
}

#[tokio::test]
async fn publish_failure_does_not_block_allocation() {
    let world = World::new(1, 1);
    world.publisher.fail_publishes(true);

    let outcome = world.send(create_event("P1", "s1")).await;

    assert_eq!(outcome, Handled::Running { slot_id: SlotId(1) });
    assert_eq!(world.slot_of("P1"), Some(SlotId(1)));
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slot allocation, queueing and hand-over on release.

use crate::prelude::*;
use berth_core::WorkspaceStatus::*;

#[tokio::test]
async fn released_slot_passes_to_queued_project() {
    let world = World::new(1, 1);

    let first = world.send(create_event("P1", "s1")).await;
    assert_eq!(first, Handled::Running { slot_id: SlotId(1) });
    assert_eq!(world.statuses("P1"), vec![Provisioning, Running]);

    let second = world.send(create_event("P2", "s2")).await;
    assert_eq!(second, Handled::Queued { position: 1 });
    assert_eq!(world.statuses("P2"), vec![Queued]);

    let released = world.send(release_event("P1", "s1")).await;
    assert_eq!(
        released,
        Handled::Released {
            slot_id: Some(SlotId(1)),
            drained: Drained::Provisioned { slot_id: SlotId(1), project_id: "P2".to_string() },
        }
    );
    assert_eq!(world.statuses("P1"), vec![Provisioning, Running, Released]);
    assert_eq!(world.statuses("P2"), vec![Queued, Provisioning, Running]);
    assert_eq!(world.slot_of("P2"), Some(SlotId(1)));
    assert_eq!(world.store.queue_len(), 0);
}

#[tokio::test]
async fn full_queue_rejects_with_failed_status() {
    let world = World::new(1, 1);
    world.send(create_event("P1", "s1")).await;
    world.send(create_event("P2", "s2")).await;

    let third = world.send(create_event("P3", "s3")).await;

    assert_eq!(third, Handled::Rejected);
    assert_eq!(world.statuses("P3"), vec![Failed]);
    let failed = world.publisher.last_for("P3").unwrap();
    assert!(failed.message.contains("queue full"), "message: {}", failed.message);
    assert_eq!(world.store.queue_len(), 1);
}

#[tokio::test]
async fn duplicate_create_keeps_one_slot() {
    let world = World::new(2, 2);
    world.send(create_event("P1", "s1")).await;

    let again = world.send(create_event("P1", "s1")).await;

    assert_eq!(again, Handled::AlreadyRunning { slot_id: SlotId(1) });
    assert_eq!(world.store.busy_count(), 1);
    assert_eq!(world.provisioner.assigned_projects(), vec!["P1".to_string()]);
}

#[tokio::test]
async fn queued_requests_drain_in_arrival_order() {
    let world = World::new(1, 3);
    world.send(create_event("P1", "s1")).await;
    for project in ["P2", "P3", "P4"] {
        world.send(create_event(project, "s")).await;
    }

    world.send(release_event("P1", "s1")).await;
    world.send(release_event("P2", "s")).await;

    assert_eq!(
        world.provisioner.assigned_projects(),
        vec!["P1".to_string(), "P2".to_string(), "P3".to_string()]
    );
    assert_eq!(world.store.queue_position("P4"), Some(1));
}

#[tokio::test]
async fn pause_frees_slot_for_queued_project() {
    let world = World::new(1, 1);
    world.send(create_event("P1", "s1")).await;
    world.send(create_event("P2", "s2")).await;

    let paused = world.send(pause_event("P1", "s1")).await;

    assert_eq!(
        paused,
        Handled::Paused {
            slot_id: Some(SlotId(1)),
            drained: Drained::Provisioned { slot_id: SlotId(1), project_id: "P2".to_string() },
        }
    );
    assert_eq!(world.statuses("P1"), vec![Provisioning, Running, Pausing, Paused]);
    assert_eq!(world.slot_of("P2"), Some(SlotId(1)));
}

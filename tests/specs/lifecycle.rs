// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auto-pause of idle slots and the periodic queue processor.

use crate::prelude::*;
use berth_core::WorkspaceStatus::*;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn idle_slot_is_paused_and_handed_to_queue() {
    let world = World::new(1, 1);
    world.send(create_event("P1", "s1")).await;
    world.send(create_event("P2", "s2")).await;
    world.clock.advance(IDLE_TIMEOUT + Duration::from_secs(1));

    let paused = world.lifecycle.auto_pause_once().await;

    assert_eq!(paused, vec![SlotId(1)]);
    assert_eq!(world.statuses("P1"), vec![Provisioning, Running, Pausing, Paused]);
    assert_eq!(world.provisioner.released_slots(), vec![SlotId(1)]);
    assert_eq!(world.slot_of("P1"), None);

    let drained = world.lifecycle.process_queue_once().await;

    assert_eq!(drained, Drained::Provisioned { slot_id: SlotId(1), project_id: "P2".to_string() });
    assert_eq!(world.statuses("P2"), vec![Queued, Provisioning, Running]);
}

#[tokio::test]
async fn active_slot_is_not_paused() {
    let world = World::new(1, 1);
    world.send(create_event("P1", "s1")).await;
    world.clock.advance(IDLE_TIMEOUT - Duration::from_secs(5));
    assert!(world.lifecycle.record_activity("P1"));
    world.clock.advance(Duration::from_secs(10));

    assert!(world.lifecycle.auto_pause_once().await.is_empty());
    assert_eq!(world.slot_of("P1"), Some(SlotId(1)));
}

#[tokio::test(start_paused = true)]
async fn background_loops_reclaim_idle_slot() {
    let world = World::new(1, 1);
    world.send(create_event("P1", "s1")).await;
    world.send(create_event("P2", "s2")).await;
    world.clock.advance(IDLE_TIMEOUT + Duration::from_secs(1));

    let cancel = CancellationToken::new();
    let handles = world.lifecycle.spawn(cancel.clone());
    tokio::time::sleep(Duration::from_secs(75)).await;
    cancel.cancel();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(world.slot_of("P2"), Some(SlotId(1)));
    assert_eq!(world.statuses("P2"), vec![Queued, Provisioning, Running]);
    assert_eq!(world.store.slots()[0].status, SlotStatus::Running);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use berth_core::FakeClock;
use std::sync::{Arc, Barrier};
use yare::parameterized;

fn store(slots: u32, queue: usize) -> SlotStore<FakeClock> {
    SlotStore::new(slots, queue, FakeClock::new())
}

fn request(project_id: &str) -> QueuedRequest {
    QueuedRequest::builder().project_id(project_id).session_id(format!("sess-{}", project_id)).build()
}

// ── Slots ───────────────────────────────────────────────────────────────

#[test]
fn new_store_has_fixed_free_slots() {
    let store = store(3, 5);
    let ids: Vec<u32> = store.slots().iter().map(|s| s.id.get()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(store.slots().iter().all(|s| !s.is_busy && s.status == SlotStatus::Empty));
    assert_eq!(store.slot_count(), 3);
    assert_eq!(store.queue_capacity(), 5);
}

#[test]
fn find_then_assign_succeeds_for_single_caller() {
    let store = store(2, 1);
    let slot_id = store.find_free_slot().unwrap();
    store.assign_slot(slot_id, "proj-a", "sess-a").unwrap();

    let slot = store.find_slot_by_project("proj-a").unwrap();
    assert_eq!(slot.id, slot_id);
    assert_eq!(slot.status, SlotStatus::Running);
    assert_eq!(slot.session_id, "sess-a");
    assert_eq!(slot.last_activity_ms, FakeClock::START_MS);
}

#[test]
fn no_free_slot_when_all_busy() {
    let store = store(1, 1);
    store.assign_slot(SlotId(1), "proj-a", "").unwrap();
    assert_eq!(store.find_free_slot(), Err(StoreError::NoSlotsAvailable));
}

#[test]
fn assigning_busy_slot_is_not_found() {
    let store = store(1, 1);
    store.assign_slot(SlotId(1), "proj-a", "").unwrap();
    let err = store.assign_slot(SlotId(1), "proj-b", "").unwrap_err();
    assert!(err.is_not_found(), "{err}");
    assert!(store.find_slot_by_project("proj-b").is_none());
}

#[test]
fn assigning_missing_slot_is_not_found() {
    let store = store(2, 1);
    assert!(store.assign_slot(SlotId(9), "proj-a", "").unwrap_err().is_not_found());
}

#[test]
fn project_cannot_hold_two_slots() {
    let store = store(2, 1);
    store.assign_slot(SlotId(1), "proj-a", "").unwrap();
    assert_eq!(
        store.assign_slot(SlotId(2), "proj-a", ""),
        Err(StoreError::AlreadyAssigned { project_id: "proj-a".into(), slot_id: SlotId(1) })
    );
    assert_eq!(store.busy_count(), 1);
}

#[test]
fn empty_project_is_rejected() {
    let store = store(1, 1);
    assert_eq!(store.assign_slot(SlotId(1), "", ""), Err(StoreError::EmptyProject));
    assert_eq!(store.add_to_queue(request("")), Err(StoreError::EmptyProject));
}

#[test]
fn release_frees_slot_and_is_idempotent() {
    let store = store(2, 1);
    store.assign_slot(SlotId(2), "proj-a", "sess").unwrap();
    let before = store.slots();

    assert_eq!(store.release_slot("proj-a"), Ok(SlotId(2)));
    let freed = store.slots();
    assert_ne!(before, freed);
    assert_eq!(freed[1], Slot::empty(SlotId(2), FakeClock::START_MS));

    let err = store.release_slot("proj-a").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(store.slots(), freed, "second release must not change anything");
}

#[parameterized(
    running_on_busy = { true, SlotStatus::Running, true },
    paused_on_busy = { true, SlotStatus::Paused, true },
    empty_on_busy = { true, SlotStatus::Empty, false },
    paused_on_free = { false, SlotStatus::Paused, false },
    empty_on_free = { false, SlotStatus::Empty, true },
)]
fn update_status_respects_busy_flag(busy: bool, status: SlotStatus, ok: bool) {
    let store = store(1, 1);
    if busy {
        store.assign_slot(SlotId(1), "proj-a", "").unwrap();
    }
    assert_eq!(store.update_slot_status(SlotId(1), status).is_ok(), ok);
}

#[test]
fn update_missing_slot_is_not_found() {
    let store = store(1, 1);
    assert!(store.update_slot_status(SlotId(4), SlotStatus::Paused).unwrap_err().is_not_found());
    assert!(store.update_slot_activity(SlotId(4)).unwrap_err().is_not_found());
}

#[test]
fn pause_if_held_checks_the_holder() {
    let store = store(1, 1);
    store.assign_slot(SlotId(1), "proj-a", "").unwrap();
    store.release_slot("proj-a").unwrap();
    store.assign_slot(SlotId(1), "proj-b", "").unwrap();

    assert!(store.pause_if_held(SlotId(1), "proj-a").unwrap_err().is_not_found());
    assert_eq!(store.slots()[0].status, SlotStatus::Running);

    store.pause_if_held(SlotId(1), "proj-b").unwrap();
    assert_eq!(store.slots()[0].status, SlotStatus::Paused);
    assert_eq!(
        store.pause_if_held(SlotId(1), "proj-b"),
        Err(StoreError::InvalidStatus { slot_id: SlotId(1), status: SlotStatus::Paused })
    );
}

#[test]
fn pause_if_held_on_free_or_missing_slot_is_not_found() {
    let store = store(1, 1);
    assert!(store.pause_if_held(SlotId(1), "proj-a").unwrap_err().is_not_found());
    assert!(store.pause_if_held(SlotId(7), "proj-a").unwrap_err().is_not_found());
}

#[test]
fn activity_resets_idle_clock() {
    let store = store(2, 1);
    store.assign_slot(SlotId(1), "proj-a", "").unwrap();
    store.assign_slot(SlotId(2), "proj-b", "").unwrap();

    store.clock().advance(Duration::from_secs(20 * 60));
    store.update_slot_activity(SlotId(2)).unwrap();
    store.clock().advance(Duration::from_secs(15 * 60));

    let idle = store.idle_running_slots(Duration::from_secs(30 * 60));
    let projects: Vec<&str> = idle.iter().map(|s| s.project_id.as_str()).collect();
    assert_eq!(projects, vec!["proj-a"]);
}

#[test]
fn idle_scan_skips_paused_and_orders_oldest_first() {
    let store = store(3, 1);
    store.assign_slot(SlotId(3), "proj-c", "").unwrap();
    store.clock().advance(Duration::from_secs(60));
    store.assign_slot(SlotId(1), "proj-a", "").unwrap();
    store.clock().advance(Duration::from_secs(60));
    store.assign_slot(SlotId(2), "proj-b", "").unwrap();
    store.update_slot_status(SlotId(2), SlotStatus::Paused).unwrap();

    store.clock().advance(Duration::from_secs(3600));
    let idle: Vec<u32> =
        store.idle_running_slots(Duration::from_secs(60)).iter().map(|s| s.id.get()).collect();
    assert_eq!(idle, vec![3, 1]);
}

// ── Queue ───────────────────────────────────────────────────────────────

#[test]
fn queue_is_fifo() {
    let store = store(1, 5);
    assert_eq!(store.add_to_queue(request("a")), Ok(1));
    assert_eq!(store.add_to_queue(request("b")), Ok(2));
    assert_eq!(store.add_to_queue(request("c")), Ok(3));

    let order: Vec<String> =
        std::iter::from_fn(|| store.get_next_from_queue()).map(|r| r.project_id).collect();
    assert_eq!(order, vec!["a", "b", "c"]);
    assert_eq!(store.get_next_from_queue(), None);
}

#[test]
fn full_queue_rejects_and_keeps_first_entries() {
    let store = store(1, 2);
    store.add_to_queue(request("a")).unwrap();
    store.add_to_queue(request("b")).unwrap();
    assert_eq!(store.add_to_queue(request("c")), Err(StoreError::QueueFull { capacity: 2 }));

    let queued: Vec<String> = store.queued().into_iter().map(|r| r.project_id).collect();
    assert_eq!(queued, vec!["a", "b"]);
}

#[test]
fn requeue_of_waiting_project_keeps_position() {
    let store = store(1, 2);
    store.add_to_queue(request("a")).unwrap();
    store.add_to_queue(request("b")).unwrap();
    assert_eq!(store.add_to_queue(request("a")), Ok(1));
    assert_eq!(store.queue_len(), 2);
    assert_eq!(store.queue_position("b"), Some(2));
}

#[test]
fn remove_from_queue_by_project() {
    let store = store(1, 3);
    store.add_to_queue(request("a")).unwrap();
    store.add_to_queue(request("b")).unwrap();
    assert_eq!(store.remove_from_queue("a").map(|r| r.project_id), Some("a".to_string()));
    assert_eq!(store.remove_from_queue("a"), None);
    assert_eq!(store.queue_position("b"), Some(1));
}

#[test]
fn claim_next_queued_pops_and_assigns_together() {
    let store = store(1, 3);
    store.add_to_queue(request("a")).unwrap();
    store.add_to_queue(request("b")).unwrap();

    let (slot_id, req) = store.claim_next_queued().unwrap();
    assert_eq!((slot_id, req.project_id.as_str()), (SlotId(1), "a"));
    assert_eq!(store.find_slot_by_project("a").unwrap().session_id, "sess-a");

    // No free slot: queue untouched
    assert_eq!(store.claim_next_queued(), None);
    assert_eq!(store.queue_len(), 1);
}

#[test]
fn claim_next_queued_skips_projects_already_running() {
    let store = store(2, 3);
    store.add_to_queue(request("a")).unwrap();
    store.add_to_queue(request("b")).unwrap();
    store.assign_slot(SlotId(1), "a", "").unwrap();

    let (slot_id, req) = store.claim_next_queued().unwrap();
    assert_eq!((slot_id, req.project_id.as_str()), (SlotId(2), "b"));
    assert_eq!(store.queue_len(), 0);
}

#[test]
fn claim_next_queued_on_empty_queue() {
    let store = store(1, 1);
    assert_eq!(store.claim_next_queued(), None);
    assert_eq!(store.busy_count(), 0);
}

// ── Concurrency ─────────────────────────────────────────────────────────

#[test]
fn concurrent_find_then_assign_can_lose_the_claim() {
    // Both callers observe the same free slot before either claims it.
    let store = Arc::new(store(1, 1));
    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = ["proj-a", "proj-b"]
        .into_iter()
        .map(|project| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                let slot_id = store.find_free_slot().unwrap();
                barrier.wait();
                store.assign_slot(slot_id, project, "")
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let wins = results.iter().filter(|r| r.is_ok()).count();
    let losses = results.iter().filter(|r| matches!(r, Err(e) if e.is_not_found())).count();
    assert_eq!((wins, losses), (1, 1));
    assert_eq!(store.busy_count(), 1);
}

#[test]
fn concurrent_claims_never_double_book() {
    let store = Arc::new(store(3, 16));
    for n in 0..12 {
        store.add_to_queue(request(&format!("p{}", n))).unwrap();
    }
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || store.claim_next_queued().map(|(id, _)| id))
        })
        .collect();
    let mut claimed: Vec<SlotId> = handles.into_iter().filter_map(|h| h.join().unwrap()).collect();
    claimed.sort();
    assert_eq!(claimed, vec![SlotId(1), SlotId(2), SlotId(3)]);
    assert_eq!(store.queue_len(), 9);
}

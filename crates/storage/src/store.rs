// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slot inventory plus FIFO wait queue behind one lock.

use crate::StoreError;
use berth_core::{Clock, QueuedRequest, Slot, SlotId, SlotStatus, SystemClock};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

struct StoreInner {
    slots: Vec<Slot>,
    queue: VecDeque<QueuedRequest>,
    queue_capacity: usize,
}

impl StoreInner {
    fn slot_mut(&mut self, slot_id: SlotId) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.id == slot_id)
    }

    fn holder_of(&self, project_id: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.holds(project_id))
    }

    fn first_free(&self) -> Option<SlotId> {
        self.slots.iter().find(|s| !s.is_busy).map(|s| s.id)
    }
}

/// Fixed pool of slots and the bounded queue of requests waiting for one.
///
/// Invariants held across every operation:
/// - a slot is busy exactly when it has a project id
/// - no two slots hold the same project
/// - the slot id set never changes after construction
pub struct SlotStore<C: Clock = SystemClock> {
    inner: Mutex<StoreInner>,
    clock: C,
}

impl<C: Clock> SlotStore<C> {
    /// Create `slot_count` free slots with ids `1..=slot_count`.
    pub fn new(slot_count: u32, queue_capacity: usize, clock: C) -> Self {
        let now = clock.epoch_ms();
        let slots = (1..=slot_count).map(|n| Slot::empty(SlotId(n), now)).collect();
        Self {
            inner: Mutex::new(StoreInner { slots, queue: VecDeque::new(), queue_capacity }),
            clock,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn slot_count(&self) -> usize {
        self.inner.lock().slots.len()
    }

    pub fn queue_capacity(&self) -> usize {
        self.inner.lock().queue_capacity
    }

    /// First slot that is not busy. Free slots are interchangeable.
    pub fn find_free_slot(&self) -> Result<SlotId, StoreError> {
        self.inner.lock().first_free().ok_or(StoreError::NoSlotsAvailable)
    }

    /// Claim `slot_id` for a project.
    ///
    /// `NotFound` means the slot is missing or someone else claimed it first.
    pub fn assign_slot(
        &self,
        slot_id: SlotId,
        project_id: &str,
        session_id: &str,
    ) -> Result<(), StoreError> {
        if project_id.is_empty() {
            return Err(StoreError::EmptyProject);
        }
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock();
        if let Some(holder) = inner.holder_of(project_id) {
            if holder.id != slot_id {
                return Err(StoreError::AlreadyAssigned {
                    project_id: project_id.to_string(),
                    slot_id: holder.id,
                });
            }
        }
        match inner.slot_mut(slot_id) {
            Some(slot) if !slot.is_busy => {
                slot.occupy(project_id, session_id, now);
                tracing::debug!(%slot_id, project_id, "slot assigned");
                Ok(())
            }
            Some(_) => Err(StoreError::NotFound(format!("slot {} is already busy", slot_id))),
            None => Err(StoreError::NotFound(format!("slot {}", slot_id))),
        }
    }

    /// Free whichever slot holds `project_id`, returning its id.
    pub fn release_slot(&self, project_id: &str) -> Result<SlotId, StoreError> {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock();
        let slot = inner
            .slots
            .iter_mut()
            .find(|s| s.holds(project_id))
            .ok_or_else(|| StoreError::NotFound(format!("no slot holds project {}", project_id)))?;
        slot.clear(now);
        tracing::debug!(slot_id = %slot.id, project_id, "slot released");
        Ok(slot.id)
    }

    /// Append to the wait queue, returning the 1-based position.
    ///
    /// A project that is already waiting keeps its place.
    pub fn add_to_queue(&self, request: QueuedRequest) -> Result<usize, StoreError> {
        if request.project_id.is_empty() {
            return Err(StoreError::EmptyProject);
        }
        let mut inner = self.inner.lock();
        if let Some(idx) = inner.queue.iter().position(|r| r.project_id == request.project_id) {
            return Ok(idx + 1);
        }
        if inner.queue.len() >= inner.queue_capacity {
            return Err(StoreError::QueueFull { capacity: inner.queue_capacity });
        }
        inner.queue.push_back(request);
        Ok(inner.queue.len())
    }

    /// Pop the oldest waiting request.
    pub fn get_next_from_queue(&self) -> Option<QueuedRequest> {
        self.inner.lock().queue.pop_front()
    }

    /// Pop the oldest waiting request and claim a free slot for it, atomically.
    ///
    /// Returns `None` (queue untouched) when no slot is free or nobody waits.
    /// Requests whose project already holds a slot are discarded.
    pub fn claim_next_queued(&self) -> Option<(SlotId, QueuedRequest)> {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock();
        loop {
            let slot_id = inner.first_free()?;
            let request = inner.queue.pop_front()?;
            if let Some(holder) = inner.holder_of(&request.project_id) {
                tracing::debug!(
                    project_id = %request.project_id,
                    slot_id = %holder.id,
                    "dropping queued request for project that already holds a slot"
                );
                continue;
            }
            let slot = inner.slot_mut(slot_id)?;
            slot.occupy(&request.project_id, &request.session_id, now);
            return Some((slot_id, request));
        }
    }

    /// Remove a waiting request by project.
    pub fn remove_from_queue(&self, project_id: &str) -> Option<QueuedRequest> {
        let mut inner = self.inner.lock();
        let idx = inner.queue.iter().position(|r| r.project_id == project_id)?;
        inner.queue.remove(idx)
    }

    /// 1-based queue position of a project, if waiting.
    pub fn queue_position(&self, project_id: &str) -> Option<usize> {
        self.inner.lock().queue.iter().position(|r| r.project_id == project_id).map(|i| i + 1)
    }

    /// Mark a slot RUNNING or PAUSED. Free slots only accept EMPTY.
    pub fn update_slot_status(&self, slot_id: SlotId, status: SlotStatus) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let slot = inner
            .slot_mut(slot_id)
            .ok_or_else(|| StoreError::NotFound(format!("slot {}", slot_id)))?;
        let allowed = match status {
            SlotStatus::Empty => !slot.is_busy,
            SlotStatus::Running | SlotStatus::Paused => slot.is_busy,
        };
        if !allowed {
            return Err(StoreError::InvalidStatus { slot_id, status });
        }
        slot.status = status;
        Ok(())
    }

    /// Mark a RUNNING slot PAUSED, but only while it still holds `project_id`.
    ///
    /// `NotFound` when the slot has since been released or handed to another
    /// project; `InvalidStatus` when it is not RUNNING.
    pub fn pause_if_held(&self, slot_id: SlotId, project_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let slot = inner
            .slot_mut(slot_id)
            .ok_or_else(|| StoreError::NotFound(format!("slot {}", slot_id)))?;
        if !slot.holds(project_id) {
            return Err(StoreError::NotFound(format!(
                "slot {} no longer holds project {}",
                slot_id, project_id
            )));
        }
        if slot.status != SlotStatus::Running {
            return Err(StoreError::InvalidStatus { slot_id, status: SlotStatus::Paused });
        }
        slot.status = SlotStatus::Paused;
        Ok(())
    }

    /// Reset a slot's idle clock.
    pub fn update_slot_activity(&self, slot_id: SlotId) -> Result<(), StoreError> {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock();
        let slot = inner
            .slot_mut(slot_id)
            .ok_or_else(|| StoreError::NotFound(format!("slot {}", slot_id)))?;
        slot.last_activity_ms = now;
        Ok(())
    }

    pub fn find_slot_by_project(&self, project_id: &str) -> Option<Slot> {
        self.inner.lock().holder_of(project_id).cloned()
    }

    /// RUNNING slots idle for longer than `idle_timeout`, oldest first.
    pub fn idle_running_slots(&self, idle_timeout: Duration) -> Vec<Slot> {
        let now = self.clock.epoch_ms();
        let limit = idle_timeout.as_millis() as u64;
        let mut idle: Vec<Slot> = self
            .inner
            .lock()
            .slots
            .iter()
            .filter(|s| s.is_busy && s.status == SlotStatus::Running)
            .filter(|s| s.idle_for_ms(now) > limit)
            .cloned()
            .collect();
        idle.sort_by_key(|s| s.last_activity_ms);
        idle
    }

    /// Snapshot of every slot, ordered by id.
    pub fn slots(&self) -> Vec<Slot> {
        self.inner.lock().slots.clone()
    }

    /// Snapshot of the queue, head first.
    pub fn queued(&self) -> Vec<QueuedRequest> {
        self.inner.lock().queue.iter().cloned().collect()
    }

    pub fn queue_len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn busy_count(&self) -> usize {
        self.inner.lock().slots.iter().filter(|s| s.is_busy).count()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "store_property_tests.rs"]
mod property_tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background control loops: auto-pause of idle slots and queue draining.
//!
//! ```text
//! every pause_interval:  RUNNING slot idle > idle_timeout ─▶ PAUSING ─▶ release ─▶ PAUSED
//! every queue_interval:  free slot + waiting request      ─▶ claim ─▶ provision
//! ```
//!
//! Both loops stop at their next tick once the shared cancellation token
//! fires; a provisioning call already in flight runs to completion.

use crate::dispatch::{Dispatcher, Drained};
use berth_core::{Clock, SlotId, WorkspaceStatus};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Timer settings for the lifecycle loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// A RUNNING slot idle longer than this is paused
    pub idle_timeout: Duration,
    pub pause_interval: Duration,
    pub queue_interval: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(30 * 60),
            pause_interval: Duration::from_secs(60),
            queue_interval: Duration::from_secs(10),
        }
    }
}

#[derive(Clone)]
pub struct LifecycleManager<C: Clock> {
    dispatcher: Dispatcher<C>,
    config: LifecycleConfig,
}

impl<C: Clock> LifecycleManager<C> {
    pub fn new(dispatcher: Dispatcher<C>, config: LifecycleConfig) -> Self {
        Self { dispatcher, config }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Reset the idle clock of the slot serving `project_id`.
    ///
    /// Returns false when the project holds no slot.
    pub fn record_activity(&self, project_id: &str) -> bool {
        let store = self.dispatcher.store();
        let Some(slot) = store.find_slot_by_project(project_id) else {
            return false;
        };
        store.update_slot_activity(slot.id).is_ok()
    }

    /// Pause every RUNNING slot idle past the timeout, oldest first.
    ///
    /// Returns the slots that were freed.
    pub async fn auto_pause_once(&self) -> Vec<SlotId> {
        let store = self.dispatcher.store();
        let idle = store.idle_running_slots(self.config.idle_timeout);
        let mut freed = Vec::with_capacity(idle.len());

        for slot in idle {
            let idle_secs = slot.idle_for_ms(store.clock().epoch_ms()) / 1000;
            tracing::info!(
                slot_id = %slot.id,
                project_id = %slot.project_id,
                idle_secs,
                "auto-pausing idle workspace"
            );

            // The scan is a snapshot; earlier iterations await the provisioner,
            // so the slot may have been released or handed to another project.
            if let Err(e) = store.pause_if_held(slot.id, &slot.project_id) {
                tracing::info!(
                    slot_id = %slot.id,
                    project_id = %slot.project_id,
                    error = %e,
                    "slot changed since idle scan, skipping"
                );
                continue;
            }
            self.dispatcher
                .notify(
                    &slot.session_id,
                    &slot.project_id,
                    WorkspaceStatus::Pausing,
                    &format!("idle for {}s, pausing", idle_secs),
                )
                .await;

            if let Err(e) = self.dispatcher.provisioner().release(slot.id, &slot.project_id).await {
                tracing::error!(
                    slot_id = %slot.id,
                    project_id = %slot.project_id,
                    error = %e,
                    "provisioner release failed during auto-pause"
                );
            }

            match store.release_slot(&slot.project_id) {
                Ok(slot_id) => freed.push(slot_id),
                Err(e) => {
                    tracing::info!(slot_id = %slot.id, error = %e, "slot already released")
                }
            }
            self.dispatcher
                .notify(
                    &slot.session_id,
                    &slot.project_id,
                    WorkspaceStatus::Paused,
                    "workspace paused after inactivity",
                )
                .await;
        }
        freed
    }

    /// Drain at most one queued request into a free slot.
    pub async fn process_queue_once(&self) -> Drained {
        self.dispatcher.drain_next().await
    }

    /// Spawn both loops. They exit once `cancel` fires.
    pub fn spawn(&self, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        let pauser = self.clone();
        let pause_cancel = cancel.clone();
        let pause_task = tokio::spawn(async move {
            let mut interval = ticker(pauser.config.pause_interval);
            loop {
                tokio::select! {
                    _ = pause_cancel.cancelled() => break,
                    _ = interval.tick() => {
                        let freed = pauser.auto_pause_once().await;
                        if !freed.is_empty() {
                            tracing::info!(count = freed.len(), "auto-pause freed slots");
                        }
                    }
                }
            }
            tracing::debug!("auto-pause loop stopped");
        });

        let drainer = self.clone();
        let queue_task = tokio::spawn(async move {
            let mut interval = ticker(drainer.config.queue_interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        drainer.process_queue_once().await;
                    }
                }
            }
            tracing::debug!("queue processor stopped");
        });

        vec![pause_task, queue_task]
    }
}

/// Interval whose first tick is one period out, skipping ticks missed while
/// a slow provision was running.
fn ticker(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

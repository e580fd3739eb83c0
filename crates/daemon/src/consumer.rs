// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request consumer: decode, dispatch, settle.
//!
//! Deliveries are settled only after the handler finishes. Malformed bodies
//! and non-retryable failures are acked so they cannot loop; transient
//! failures are nacked back onto the queue.

use crate::broker::BrokerError;
use berth_core::{Clock, WorkspaceEvent};
use berth_engine::WorkspaceHandler;
use futures_util::StreamExt;
use lapin::options::{BasicAckOptions, BasicNackOptions};
use lapin::Consumer;
use tokio_util::sync::CancellationToken;

/// How a delivery is settled with the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ack,
    Requeue,
}

/// Decode and handle one delivery body.
pub async fn process_delivery<C: Clock>(handler: &WorkspaceHandler<C>, body: &[u8]) -> Disposition {
    let event = match WorkspaceEvent::from_json(body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, bytes = body.len(), "dropping malformed request");
            return Disposition::Ack;
        }
    };

    match handler.handle_event(&event).await {
        Ok(outcome) => {
            tracing::debug!(
                event_type = %event.event_type,
                project_id = %event.payload.project_id,
                ?outcome,
                "request handled"
            );
            Disposition::Ack
        }
        Err(e) if e.should_requeue() => {
            tracing::warn!(
                event_type = %event.event_type,
                project_id = %event.payload.project_id,
                error = %e,
                "request failed, requeueing"
            );
            Disposition::Requeue
        }
        Err(e) => {
            tracing::warn!(
                event_type = %event.event_type,
                project_id = %event.payload.project_id,
                error = %e,
                "request failed, dropping"
            );
            Disposition::Ack
        }
    }
}

/// Consume until cancelled or the broker closes the stream.
pub async fn run<C: Clock>(
    mut consumer: Consumer,
    handler: WorkspaceHandler<C>,
    cancel: CancellationToken,
) -> Result<(), BrokerError> {
    loop {
        let delivery = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("consumer stopping");
                return Ok(());
            }
            next = consumer.next() => match next {
                Some(delivery) => delivery?,
                None => return Err(BrokerError::Closed),
            },
        };

        match process_delivery(&handler, &delivery.data).await {
            Disposition::Ack => delivery.acker.ack(BasicAckOptions::default()).await?,
            Disposition::Requeue => {
                delivery
                    .acker
                    .nack(BasicNackOptions { requeue: true, ..Default::default() })
                    .await?
            }
        }
    }
}

#[cfg(test)]
#[path = "consumer_tests.rs"]
mod tests;

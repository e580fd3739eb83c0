// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AMQP broker wiring.
//!
//! Topology:
//!
//! ```text
//! exchange "workspace" (topic, durable)
//!   ├─ *.requested    ─▶ queue <request queue> (durable) ─▶ berthd, prefetch 1, manual ack
//!   └─ status.updated ◀─ berthd (persistent, application/json)
//! ```

use async_trait::async_trait;
use berth_adapters::{PublishError, StatusPublisher};
use berth_core::{Clock, SystemClock, WorkspaceStatus, WorkspaceStatusEvent};
use lapin::options::{
    BasicConsumeOptions, BasicPublishOptions, BasicQosOptions, ConfirmSelectOptions,
    ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, Consumer, ExchangeKind};
use std::time::Duration;
use thiserror::Error;

pub const EXCHANGE: &str = "workspace";
pub const REQUEST_BINDING: &str = "*.requested";
pub const CONSUMER_TAG: &str = "berthd";
const CONTENT_TYPE_JSON: &str = "application/json";
const PERSISTENT: u8 = 2;

/// Broker errors. Fatal to the process; the supervisor restarts it.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("connect to broker timed out after {0:?}")]
    ConnectTimeout(Duration),
    #[error("amqp error: {0}")]
    Amqp(#[from] lapin::Error),
    #[error("consumer stream closed by broker")]
    Closed,
}

/// Open connection plus the channel requests are consumed on.
pub struct Broker {
    connection: Connection,
    channel: Channel,
}

impl Broker {
    /// Connect, bounded by `timeout`.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, BrokerError> {
        let connection =
            tokio::time::timeout(timeout, Connection::connect(url, ConnectionProperties::default()))
                .await
                .map_err(|_| BrokerError::ConnectTimeout(timeout))??;
        let channel = connection.create_channel().await?;
        tracing::info!(channel_id = channel.id(), "connected to broker");
        Ok(Self { connection, channel })
    }

    /// Declare the exchange and request queue, then start consuming.
    pub async fn consume_requests(&self, queue: &str) -> Result<Consumer, BrokerError> {
        self.channel
            .exchange_declare(
                EXCHANGE,
                ExchangeKind::Topic,
                ExchangeDeclareOptions { durable: true, ..Default::default() },
                FieldTable::default(),
            )
            .await?;
        self.channel
            .queue_declare(
                queue,
                QueueDeclareOptions { durable: true, ..Default::default() },
                FieldTable::default(),
            )
            .await?;
        self.channel
            .queue_bind(
                queue,
                EXCHANGE,
                REQUEST_BINDING,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;
        self.channel.basic_qos(1, BasicQosOptions::default()).await?;

        let consumer = self
            .channel
            .basic_consume(queue, CONSUMER_TAG, BasicConsumeOptions::default(), FieldTable::default())
            .await?;
        tracing::info!(%queue, exchange = EXCHANGE, binding = REQUEST_BINDING, "consuming requests");
        Ok(consumer)
    }

    /// Status publisher on its own channel, in confirm mode.
    pub async fn status_publisher(&self) -> Result<AmqpStatusPublisher, BrokerError> {
        let channel = self.connection.create_channel().await?;
        channel.confirm_select(ConfirmSelectOptions::default()).await?;
        Ok(AmqpStatusPublisher { channel, clock: SystemClock })
    }

    pub async fn close(self) {
        if let Err(e) = self.channel.close(200, "shutdown").await {
            tracing::debug!(error = %e, "channel close failed");
        }
        if let Err(e) = self.connection.close(200, "shutdown").await {
            tracing::warn!(error = %e, "connection close failed");
        }
    }
}

/// Publishes [`WorkspaceStatusEvent`]s to the `workspace` exchange.
pub struct AmqpStatusPublisher {
    channel: Channel,
    clock: SystemClock,
}

#[async_trait]
impl StatusPublisher for AmqpStatusPublisher {
    async fn publish(
        &self,
        session_id: &str,
        project_id: &str,
        status: WorkspaceStatus,
        message: &str,
    ) -> Result<(), PublishError> {
        let event =
            WorkspaceStatusEvent::new(session_id, project_id, status, message, self.clock.now_utc());
        let body = event.to_json().map_err(|e| PublishError::Encode(e.to_string()))?;
        let properties = BasicProperties::default()
            .with_delivery_mode(PERSISTENT)
            .with_content_type(CONTENT_TYPE_JSON.into());

        let confirmation = self
            .channel
            .basic_publish(
                EXCHANGE,
                WorkspaceStatusEvent::ROUTING_KEY,
                BasicPublishOptions::default(),
                &body,
                properties,
            )
            .await
            .map_err(|e| PublishError::Broker(e.to_string()))?
            .await
            .map_err(|e| PublishError::Broker(e.to_string()))?;
        if confirmation.is_nack() {
            return Err(PublishError::NotConfirmed);
        }
        Ok(())
    }
}

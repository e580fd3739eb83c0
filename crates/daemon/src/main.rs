// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! berthd: workspace slot allocation daemon.

use anyhow::Context;
use berth_adapters::{
    DockerProvisioner, HttpTokenProvider, KubernetesProvisioner, NoTokenProvider, Provisioner,
    TokenProvider,
};
use berth_core::SystemClock;
use berth_daemon::{consumer, logging, wait_for_shutdown, Backend, Broker, Config};
use berth_engine::{Dispatcher, EngineDeps, LifecycleManager, WorkspaceHandler};
use berth_storage::SlotStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const TOKEN_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    logging::init(config.log_format);
    tracing::info!(
        backend = %config.backend,
        slots = config.slot_count,
        queue_size = config.queue_size,
        queue = %config.request_queue,
        "starting berthd"
    );

    let provisioner = match config.backend {
        Backend::Kubernetes => {
            let k8s = KubernetesProvisioner::connect(config.kubernetes.clone())
                .await
                .context("connecting to kubernetes")?;
            Provisioner::SlotPool(Arc::new(k8s))
        }
        Backend::Docker => {
            Provisioner::PerProject(Arc::new(DockerProvisioner::new(config.docker.clone())))
        }
    };
    provisioner.prepare(config.slot_count).await.context("preparing workspace slots")?;

    let tokens: Arc<dyn TokenProvider> = match &config.token_url {
        Some(url) => Arc::new(
            HttpTokenProvider::new(url.clone(), TOKEN_LOOKUP_TIMEOUT)
                .context("building token client")?,
        ),
        None => {
            tracing::info!("no token service configured, github token lookup disabled");
            Arc::new(NoTokenProvider)
        }
    };

    let broker = Broker::connect(&config.amqp_url, config.connect_timeout)
        .await
        .context("connecting to broker")?;
    let publisher = broker.status_publisher().await?;
    let requests = broker.consume_requests(&config.request_queue).await?;

    let dispatcher = Dispatcher::new(EngineDeps {
        store: Arc::new(SlotStore::new(config.slot_count, config.queue_size, SystemClock)),
        provisioner,
        publisher: Arc::new(publisher),
        tokens,
        broker_url: config.workspace_broker_url.clone(),
    });
    let handler = WorkspaceHandler::new(dispatcher.clone());
    let lifecycle = LifecycleManager::new(dispatcher, config.lifecycle);

    let cancel = CancellationToken::new();
    let loops = lifecycle.spawn(cancel.clone());

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown().await {
            tracing::error!(error = %e, "failed to install signal handlers");
        }
        tracing::info!("shutdown requested");
        shutdown.cancel();
    });

    let result = consumer::run(requests, handler, cancel.clone()).await;
    cancel.cancel();
    for handle in loops {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "lifecycle task ended abnormally");
        }
    }
    broker.close().await;
    tracing::info!("berthd stopped");

    result.context("request consumer failed")
}

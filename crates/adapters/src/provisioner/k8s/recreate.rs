// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pod recreation with bounded waits on deletion and readiness.

use super::pod::{self, SlotPodParams};
use super::KubernetesConfig;
use crate::provisioner::ProvisionError;
use async_trait::async_trait;
use berth_core::SlotAssignment;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DeleteParams, PostParams};
use tokio::time::Instant;

/// The pod operations slot recreation needs.
#[async_trait]
pub(super) trait PodClient: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<Pod>, ProvisionError>;

    async fn create(&self, pod: &Pod) -> Result<(), ProvisionError>;

    /// Returns `false` when the pod was already gone.
    async fn delete(&self, name: &str) -> Result<bool, ProvisionError>;
}

#[async_trait]
impl PodClient for Api<Pod> {
    async fn get(&self, name: &str) -> Result<Option<Pod>, ProvisionError> {
        self.get_opt(name)
            .await
            .map_err(|e| ProvisionError::Api(format!("get pod {}: {}", name, e)))
    }

    async fn create(&self, pod: &Pod) -> Result<(), ProvisionError> {
        let name = pod.metadata.name.as_deref().unwrap_or_default();
        Api::create(self, &PostParams::default(), pod)
            .await
            .map(|_| ())
            .map_err(|e| ProvisionError::Api(format!("create pod {}: {}", name, e)))
    }

    async fn delete(&self, name: &str) -> Result<bool, ProvisionError> {
        match Api::delete(self, name, &DeleteParams::default()).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(ProvisionError::Api(format!("delete pod {}: {}", name, e))),
        }
    }
}

pub(super) fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 404)
}

/// Recreate the slot pod with `assignment` baked into its env.
///
/// A missing pod is rebuilt from the template rather than failing.
pub(super) async fn recreate_pod<P: PodClient + ?Sized>(
    pods: &P,
    config: &KubernetesConfig,
    params: &SlotPodParams,
    assignment: &SlotAssignment,
) -> Result<(), ProvisionError> {
    let name = params.pod_name.as_str();
    let current = pods.get(name).await?;
    let existed = current.is_some();
    let mut desired = current.unwrap_or_else(|| pod::build_slot_pod(params));
    pod::apply_assignment(&mut desired, assignment);
    let desired = pod::prepare_for_recreate(desired);

    tracing::info!(
        slot_id = %params.slot_id,
        pod = %name,
        project_id = %assignment.project_id,
        release = assignment.is_blank(),
        "recreating slot pod"
    );

    if existed {
        if !pods.delete(name).await? {
            tracing::debug!(pod = %name, "pod already gone before delete");
        }
        wait_for_deletion(pods, config, name).await?;
    }

    pods.create(&desired).await?;
    wait_for_ready(pods, config, name).await
}

pub(super) async fn wait_for_deletion<P: PodClient + ?Sized>(
    pods: &P,
    config: &KubernetesConfig,
    name: &str,
) -> Result<(), ProvisionError> {
    let deadline = Instant::now() + config.delete_timeout;
    loop {
        match pods.get(name).await {
            Ok(None) => {
                tracing::debug!(pod = %name, "pod deletion observed");
                return Ok(());
            }
            Ok(Some(_)) => {}
            Err(e) => tracing::debug!(pod = %name, error = %e, "pod lookup failed while deleting"),
        }
        if Instant::now() >= deadline {
            return Err(ProvisionError::Timeout {
                what: format!("deletion of pod {}", name),
                secs: config.delete_timeout.as_secs(),
            });
        }
        tokio::time::sleep(config.poll_interval).await;
    }
}

pub(super) async fn wait_for_ready<P: PodClient + ?Sized>(
    pods: &P,
    config: &KubernetesConfig,
    name: &str,
) -> Result<(), ProvisionError> {
    let started = Instant::now();
    let deadline = started + config.ready_timeout;
    loop {
        match pods.get(name).await {
            Ok(Some(p)) if pod::is_pod_ready(&p) => {
                tracing::info!(
                    pod = %name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "slot pod ready"
                );
                return Ok(());
            }
            Ok(Some(p)) => {
                tracing::debug!(pod = %name, phase = pod::pod_phase(&p), "waiting for readiness")
            }
            Ok(None) => tracing::debug!(pod = %name, "pod not visible yet"),
            Err(e) => tracing::debug!(pod = %name, error = %e, "pod lookup failed while waiting"),
        }
        if Instant::now() >= deadline {
            return Err(ProvisionError::Timeout {
                what: format!("pod {}", name),
                secs: config.ready_timeout.as_secs(),
            });
        }
        tokio::time::sleep(config.poll_interval).await;
    }
}

#[cfg(test)]
#[path = "recreate_tests.rs"]
mod tests;

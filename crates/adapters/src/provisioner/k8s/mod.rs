// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubernetes slot pool: N long-lived pods re-purposed per project.
//!
//! # Module layout
//!
//! - [`pod`]: pod spec construction and mutation helpers
//! - [`recreate`]: delete/recreate sequence with bounded waits
//!
//! # Assignment
//!
//! Pod environment variables cannot be changed in place, so assigning a
//! slot recreates its pod:
//!
//! ```text
//! get pod ─▶ rewrite env ─▶ delete ─▶ wait gone ─▶ create ─▶ wait Ready
//! ```
//!
//! Release is the same sequence with a blank assignment.

mod pod;
mod recreate;

pub use adapter::{KubernetesConfig, KubernetesProvisioner};

mod adapter {
    use super::pod::{self, SlotPodParams};
    use super::recreate;
    use crate::provisioner::{ProvisionError, SlotProvisioner};
    use async_trait::async_trait;
    use berth_core::{SlotAssignment, SlotId};
    use k8s_openapi::api::core::v1::Pod;
    use kube::api::{Api, PostParams};
    use kube::Client;
    use std::time::Duration;

    /// Settings for the slot pool.
    #[derive(Debug, Clone)]
    pub struct KubernetesConfig {
        pub namespace: String,
        pub image: String,
        /// Pod names are `<prefix>-<slot id>`
        pub name_prefix: String,
        /// Value of the `app` label on slot pods
        pub app_label: String,
        pub terminal_port: i32,
        pub preview_port: i32,
        /// Upper bound on waiting for a recreated pod to become Ready
        pub ready_timeout: Duration,
        /// Upper bound on waiting for a deleted pod to disappear
        pub delete_timeout: Duration,
        pub poll_interval: Duration,
    }

    impl Default for KubernetesConfig {
        fn default() -> Self {
            Self {
                namespace: "workspaces".to_string(),
                image: "berth/workspace:latest".to_string(),
                name_prefix: "workspace-slot".to_string(),
                app_label: "berth-slot".to_string(),
                terminal_port: 7681,
                preview_port: 3000,
                ready_timeout: Duration::from_secs(120),
                delete_timeout: Duration::from_secs(60),
                poll_interval: Duration::from_secs(1),
            }
        }
    }

    /// Slot provisioner backed by the Kubernetes API.
    #[derive(Clone)]
    pub struct KubernetesProvisioner {
        client: Client,
        config: KubernetesConfig,
    }

    impl KubernetesProvisioner {
        /// Connect using in-cluster config or the local kubeconfig.
        pub async fn connect(config: KubernetesConfig) -> Result<Self, ProvisionError> {
            let client = Client::try_default().await.map_err(|e| {
                ProvisionError::Api(format!("failed to create kube client: {}", e))
            })?;
            Ok(Self { client, config })
        }

        pub fn config(&self) -> &KubernetesConfig {
            &self.config
        }

        fn pods(&self) -> Api<Pod> {
            Api::namespaced(self.client.clone(), &self.config.namespace)
        }

        fn pod_params(&self, slot_id: SlotId) -> SlotPodParams {
            SlotPodParams {
                pod_name: pod::slot_pod_name(&self.config.name_prefix, slot_id),
                namespace: self.config.namespace.clone(),
                image: self.config.image.clone(),
                app_label: self.config.app_label.clone(),
                slot_id,
                terminal_port: self.config.terminal_port,
                preview_port: self.config.preview_port,
            }
        }

        async fn recreate(
            &self,
            slot_id: SlotId,
            assignment: &SlotAssignment,
        ) -> Result<(), ProvisionError> {
            let params = self.pod_params(slot_id);
            recreate::recreate_pod(&self.pods(), &self.config, &params, assignment).await
        }
    }

    #[async_trait]
    impl SlotProvisioner for KubernetesProvisioner {
        async fn ensure_slots(&self, count: u32) -> Result<(), ProvisionError> {
            let pods = self.pods();
            for n in 1..=count {
                let params = self.pod_params(SlotId(n));
                let existing = pods.get_opt(&params.pod_name).await.map_err(|e| {
                    ProvisionError::Api(format!("get pod {}: {}", params.pod_name, e))
                })?;
                if existing.is_some() {
                    tracing::debug!(pod = %params.pod_name, "slot pod already exists");
                    continue;
                }
                tracing::info!(pod = %params.pod_name, namespace = %params.namespace, "creating slot pod");
                pods.create(&PostParams::default(), &pod::build_slot_pod(&params)).await.map_err(
                    |e| ProvisionError::Api(format!("create pod {}: {}", params.pod_name, e)),
                )?;
            }
            Ok(())
        }

        async fn assign_slot_to_project(
            &self,
            slot_id: SlotId,
            assignment: &SlotAssignment,
        ) -> Result<(), ProvisionError> {
            self.recreate(slot_id, assignment).await
        }

        async fn release_slot(&self, slot_id: SlotId) -> Result<(), ProvisionError> {
            self.recreate(slot_id, &SlotAssignment::blank()).await
        }
    }
}

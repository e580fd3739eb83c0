// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pod spec construction and mutation for slot pods.

use berth_core::{SlotAssignment, SlotId};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, HTTPGetAction, Pod, PodSpec, Probe, ResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

/// Label carrying the stable slot id.
pub(super) const SLOT_ID_LABEL: &str = "berth.dev/slot-id";

/// Name of the workspace container inside every slot pod.
pub(super) const CONTAINER_NAME: &str = "workspace";

// Environment variables rewritten on every assignment
pub(super) const ENV_PROJECT_ID: &str = "PROJECT_ID";
pub(super) const ENV_SESSION_ID: &str = "SESSION_ID";
pub(super) const ENV_GIT_REPO_URL: &str = "GIT_REPO_URL";
pub(super) const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub(super) const ENV_TARGET_BRANCH: &str = "TARGET_BRANCH";
pub(super) const ENV_BROKER_URL: &str = "BROKER_URL";
pub(super) const ENV_SLOT_ID: &str = "SLOT_ID";

const ASSIGNMENT_VARS: [&str; 6] = [
    ENV_PROJECT_ID,
    ENV_SESSION_ID,
    ENV_GIT_REPO_URL,
    ENV_GITHUB_TOKEN,
    ENV_TARGET_BRANCH,
    ENV_BROKER_URL,
];

/// Parameters for building a slot pod.
pub(super) struct SlotPodParams {
    pub pod_name: String,
    pub namespace: String,
    pub image: String,
    pub app_label: String,
    pub slot_id: SlotId,
    /// Interactive shell port; also the probe target
    pub terminal_port: i32,
    /// HTTP preview port for the user's app
    pub preview_port: i32,
}

/// `<prefix>-<id>`, e.g. `workspace-slot-3`.
pub(super) fn slot_pod_name(prefix: &str, slot_id: SlotId) -> String {
    format!("{}-{}", prefix, slot_id)
}

/// Build a blank slot pod: no project configured, all assignment vars empty.
pub(super) fn build_slot_pod(params: &SlotPodParams) -> Pod {
    let mut env = vec![env_var(ENV_SLOT_ID, &params.slot_id.to_string())];
    env.extend(ASSIGNMENT_VARS.iter().map(|name| env_var(name, "")));

    let probe = |period: i32, initial_delay: i32| Probe {
        http_get: Some(HTTPGetAction {
            path: Some("/".to_string()),
            port: IntOrString::Int(params.terminal_port),
            ..Default::default()
        }),
        initial_delay_seconds: Some(initial_delay),
        period_seconds: Some(period),
        ..Default::default()
    };

    let container = Container {
        name: CONTAINER_NAME.to_string(),
        image: Some(params.image.clone()),
        ports: Some(vec![
            ContainerPort {
                name: Some("terminal".to_string()),
                container_port: params.terminal_port,
                ..Default::default()
            },
            ContainerPort {
                name: Some("preview".to_string()),
                container_port: params.preview_port,
                ..Default::default()
            },
        ]),
        env: Some(env),
        resources: Some(slot_resources()),
        readiness_probe: Some(probe(5, 2)),
        liveness_probe: Some(probe(30, 15)),
        ..Default::default()
    };

    Pod {
        metadata: ObjectMeta {
            name: Some(params.pod_name.clone()),
            namespace: Some(params.namespace.clone()),
            labels: Some(
                [
                    ("app".to_string(), params.app_label.clone()),
                    (SLOT_ID_LABEL.to_string(), params.slot_id.to_string()),
                ]
                .into_iter()
                .collect(),
            ),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![container],
            restart_policy: Some("Always".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Fixed per-slot requests and limits.
fn slot_resources() -> ResourceRequirements {
    let quantities = |cpu: &str, memory: &str| -> BTreeMap<String, Quantity> {
        [
            ("cpu".to_string(), Quantity(cpu.to_string())),
            ("memory".to_string(), Quantity(memory.to_string())),
        ]
        .into_iter()
        .collect()
    };
    ResourceRequirements {
        requests: Some(quantities("100m", "128Mi")),
        limits: Some(quantities("500m", "256Mi")),
        ..Default::default()
    }
}

/// Rewrite the assignment variables on the workspace container.
///
/// Unrelated variables (e.g. `SLOT_ID`) are preserved.
pub(super) fn apply_assignment(pod: &mut Pod, assignment: &SlotAssignment) {
    let Some(spec) = pod.spec.as_mut() else { return };
    let Some(container) = workspace_container_mut(spec) else { return };

    let values = [
        (ENV_PROJECT_ID, &assignment.project_id),
        (ENV_SESSION_ID, &assignment.session_id),
        (ENV_GIT_REPO_URL, &assignment.git_repo_url),
        (ENV_GITHUB_TOKEN, &assignment.github_token),
        (ENV_TARGET_BRANCH, &assignment.target_branch),
        (ENV_BROKER_URL, &assignment.broker_url),
    ];

    let env = container.env.get_or_insert_with(Vec::new);
    env.retain(|var| !ASSIGNMENT_VARS.iter().any(|name| *name == var.name));
    env.extend(values.iter().map(|(name, value)| env_var(name, value)));
}

fn workspace_container_mut(spec: &mut PodSpec) -> Option<&mut Container> {
    let idx = spec.containers.iter().position(|c| c.name == CONTAINER_NAME).unwrap_or(0);
    spec.containers.get_mut(idx)
}

/// Strip server-populated fields so a fetched pod can be created again.
pub(super) fn prepare_for_recreate(mut pod: Pod) -> Pod {
    let meta = &mut pod.metadata;
    meta.resource_version = None;
    meta.uid = None;
    meta.creation_timestamp = None;
    meta.deletion_timestamp = None;
    meta.deletion_grace_period_seconds = None;
    meta.generation = None;
    meta.managed_fields = None;
    meta.self_link = None;
    if let Some(spec) = pod.spec.as_mut() {
        spec.node_name = None;
    }
    pod.status = None;
    pod
}

/// True when the pod reports condition `Ready=True`.
pub(super) fn is_pod_ready(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conds| conds.iter().any(|c| c.type_ == "Ready" && c.status == "True"))
        .unwrap_or(false)
}

/// Pod phase, for logging.
pub(super) fn pod_phase(pod: &Pod) -> &str {
    pod.status.as_ref().and_then(|s| s.phase.as_deref()).unwrap_or("Unknown")
}

/// Value of an environment variable on the workspace container.
pub(super) fn env_value<'a>(pod: &'a Pod, name: &str) -> Option<&'a str> {
    let spec = pod.spec.as_ref()?;
    let container =
        spec.containers.iter().find(|c| c.name == CONTAINER_NAME).or(spec.containers.first())?;
    container
        .env
        .as_ref()?
        .iter()
        .find(|v| v.name == name)
        .map(|v| v.value.as_deref().unwrap_or(""))
}

fn env_var(name: &str, value: &str) -> EnvVar {
    EnvVar { name: name.to_string(), value: Some(value.to_string()), ..Default::default() }
}

#[cfg(test)]
#[path = "pod_tests.rs"]
mod tests;

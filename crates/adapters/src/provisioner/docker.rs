// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker per-project backend for local development.
//!
//! One container per project, named `<prefix>-<project>`. There is no slot
//! reuse: the slot id handed in by the engine is only used for logging.

use super::{ProvisionError, WorkspaceProvisioner};
use async_trait::async_trait;

/// Settings for the Docker backend.
#[derive(Debug, Clone)]
pub struct DockerConfig {
    pub image: String,
    pub name_prefix: String,
    /// Passed to containers as `BROKER_URL`
    pub broker_url: String,
    /// Clone target inside the container
    pub workspace_dir: String,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            image: "berth/workspace:latest".to_string(),
            name_prefix: "berth-workspace".to_string(),
            broker_url: String::new(),
            workspace_dir: "/workspace".to_string(),
        }
    }
}

/// Per-project provisioner driving the `docker` CLI.
#[derive(Debug, Clone)]
pub struct DockerProvisioner {
    config: DockerConfig,
}

impl DockerProvisioner {
    pub fn new(config: DockerConfig) -> Self {
        Self { config }
    }

    /// `<prefix>-<project>` with characters Docker rejects replaced by `-`.
    pub fn container_name(&self, project_id: &str) -> String {
        let sanitized: String = project_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        format!("{}-{}", self.config.name_prefix, sanitized.to_ascii_lowercase())
    }

    /// Arguments for `docker run`: detached, every exposed port published.
    pub fn run_args(&self, project_id: &str, git_repo_url: &str) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "run".into(),
            "-d".into(),
            "--name".into(),
            self.container_name(project_id),
            "-P".into(),
        ];
        let env = [
            ("PROJECT_ID", project_id),
            ("GIT_REPO_URL", git_repo_url),
            ("BROKER_URL", self.config.broker_url.as_str()),
        ];
        for (key, value) in env {
            args.push("-e".into());
            args.push(format!("{}={}", key, value));
        }
        args.push(self.config.image.clone());
        args
    }

    /// Arguments for a shallow clone inside the running container.
    pub fn clone_args(&self, project_id: &str, git_repo_url: &str) -> Vec<String> {
        vec![
            "exec".into(),
            self.container_name(project_id),
            "git".into(),
            "clone".into(),
            "--single-branch".into(),
            "--depth".into(),
            "1".into(),
            git_repo_url.to_string(),
            self.config.workspace_dir.clone(),
        ]
    }
}

#[async_trait]
impl WorkspaceProvisioner for DockerProvisioner {
    async fn provision_workspace(
        &self,
        project_id: &str,
        git_repo_url: &str,
    ) -> Result<(), ProvisionError> {
        let name = self.container_name(project_id);

        if let Err(e) = run_docker(&["pull".to_string(), self.config.image.clone()]).await {
            tracing::warn!(image = %self.config.image, error = %e, "image pull failed, using local copy");
        }

        // Leftover container from an earlier run would block `--name`.
        let _ = run_docker(&["rm".to_string(), "-f".to_string(), name.clone()]).await;

        tracing::info!(%project_id, container = %name, "starting workspace container");
        run_docker(&self.run_args(project_id, git_repo_url))
            .await
            .map_err(|e| ProvisionError::Docker(format!("docker run failed: {}", e)))?;

        if !git_repo_url.is_empty() {
            if let Err(e) = run_docker(&self.clone_args(project_id, git_repo_url)).await {
                tracing::warn!(
                    %project_id,
                    repo = %git_repo_url,
                    error = %e,
                    "git clone failed, continuing with empty workspace"
                );
            }
        }
        Ok(())
    }

    async fn deprovision_workspace(&self, project_id: &str) -> Result<(), ProvisionError> {
        let name = self.container_name(project_id);
        tracing::info!(%project_id, container = %name, "removing workspace container");
        match run_docker(&["rm".to_string(), "-f".to_string(), name]).await {
            Ok(_) => Ok(()),
            Err(e) if e.contains("No such container") => Ok(()),
            Err(e) => Err(ProvisionError::Docker(e)),
        }
    }
}

/// Run a docker CLI command and return stdout on success.
async fn run_docker(args: &[String]) -> Result<String, String> {
    let output = tokio::process::Command::new("docker")
        .args(args)
        .output()
        .await
        .map_err(|e| format!("failed to exec docker: {}", e))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(format!(
            "docker {} failed: {}",
            args.first().map(String::as_str).unwrap_or(""),
            stderr.trim()
        ))
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;

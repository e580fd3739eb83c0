// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GitHub token lookup for workspace clones.
//!
//! Tokens live in a separate identity service; the engine only asks when a
//! create request arrives without one.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Errors from token lookup
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("no token provider configured")]
    NotConfigured,
    #[error("http error: {0}")]
    Http(String),
    #[error("token service returned {status} for user {user_id}")]
    Status { user_id: String, status: u16 },
    #[error("no token stored for user {0}")]
    Empty(String),
}

/// Resolves a user's GitHub token.
#[async_trait]
pub trait TokenProvider: Send + Sync + 'static {
    async fn github_token(&self, user_id: &str) -> Result<String, TokenError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: String,
}

/// Token provider calling `GET {base}/users/{user_id}/github-token`.
#[derive(Clone)]
pub struct HttpTokenProvider {
    client: reqwest::Client,
    base_url: reqwest::Url,
}

impl HttpTokenProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TokenError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TokenError::Http(e.to_string()))?;
        let base_url = base_url.into();
        let base_url = reqwest::Url::parse(&base_url).map_err(|e| {
            TokenError::Http(format!("invalid token service url {}: {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TokenError::Http(format!("token service url {} is not a base", base_url)));
        }
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl TokenProvider for HttpTokenProvider {
    async fn github_token(&self, user_id: &str) -> Result<String, TokenError> {
        // user_id is one segment; '/' and '%' in it are percent-encoded
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TokenError::Http(format!("token service url {} is not a base", self.base_url)))?
            .pop_if_empty()
            .extend(["users", user_id, "github-token"]);
        tracing::debug!(%user_id, "fetching github token");

        let response =
            self.client.get(url).send().await.map_err(|e| TokenError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(TokenError::Status {
                user_id: user_id.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body: TokenResponse =
            response.json().await.map_err(|e| TokenError::Http(e.to_string()))?;
        if body.token.is_empty() {
            return Err(TokenError::Empty(user_id.to_string()));
        }
        Ok(body.token)
    }
}

/// Used when no token service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTokenProvider;

#[async_trait]
impl TokenProvider for NoTokenProvider {
    async fn github_token(&self, _user_id: &str) -> Result<String, TokenError> {
        Err(TokenError::NotConfigured)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTokenProvider;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{TokenError, TokenProvider};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeTokenState {
        tokens: HashMap<String, String>,
        lookups: Vec<String>,
    }

    /// In-memory token provider; unknown users yield [`TokenError::Empty`].
    #[derive(Clone, Default)]
    pub struct FakeTokenProvider {
        inner: Arc<Mutex<FakeTokenState>>,
    }

    impl FakeTokenProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_token(self, user_id: &str, token: &str) -> Self {
            self.inner.lock().tokens.insert(user_id.to_string(), token.to_string());
            self
        }

        /// User ids looked up, in call order.
        pub fn lookups(&self) -> Vec<String> {
            self.inner.lock().lookups.clone()
        }
    }

    #[async_trait]
    impl TokenProvider for FakeTokenProvider {
        async fn github_token(&self, user_id: &str) -> Result<String, TokenError> {
            let mut state = self.inner.lock();
            state.lookups.push(user_id.to_string());
            state.tokens.get(user_id).cloned().ok_or_else(|| TokenError::Empty(user_id.to_string()))
        }
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;

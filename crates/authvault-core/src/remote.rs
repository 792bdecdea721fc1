//! Contracts for the remote authentication host.
//!
//! The cache never talks OAuth itself. It delegates the interactive login to
//! a [`LoginFlow`] owned by the host application, and confirms tokens through
//! an [`IdentityResolver`]. [`GithubIdentityResolver`] resolves tokens
//! against a GitHub-style `/user` endpoint; enterprise hosts work through
//! [`GithubIdentityResolver::with_base_url`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::error::AuthError;
use crate::session::SessionAccount;

/// API root for github.com.
const GITHUB_API_BASE_URL: &str = "https://api.github.com";

/// HTTP request timeout in seconds.
/// 30s allows for slow responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("authvault/", env!("CARGO_PKG_VERSION"));

/// Resolves a bearer token to the remote account that owns it.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Fails with [`AuthError::Unauthorized`] when the remote host rejects
    /// the token; any other failure means the token could not be checked.
    async fn resolve(&self, token: &str) -> Result<SessionAccount, AuthError>;
}

/// The interactive login flow that mints a new token.
///
/// Implemented by the host application (browser redirect, device code, ...).
/// A user-initiated abort fails with [`AuthError::Cancelled`].
#[async_trait]
pub trait LoginFlow: Send + Sync {
    /// `scope_string` is the normalized, space-joined scope set to request.
    async fn login(&self, scope_string: &str) -> Result<String, AuthError>;
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: u64,
    login: String,
}

/// Identity resolution against the GitHub user endpoint.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct GithubIdentityResolver {
    client: Client,
    base_url: String,
}

impl GithubIdentityResolver {
    pub fn new() -> Result<Self, AuthError> {
        Self::with_base_url(GITHUB_API_BASE_URL)
    }

    /// Point the resolver at an enterprise host's API root instead of
    /// github.com.
    pub fn with_base_url(base_url: &str) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl IdentityResolver for GithubIdentityResolver {
    async fn resolve(&self, token: &str) -> Result<SessionAccount, AuthError> {
        let url = format!("{}/user", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(AuthError::Unauthorized),
            status if status.is_success() => {
                let user: UserResponse = response.json().await?;
                debug!(login = %user.login, "Resolved remote identity");
                Ok(SessionAccount {
                    id: user.id.to_string(),
                    label: user.login,
                })
            }
            status => Err(AuthError::AuthFailure(format!(
                "identity endpoint returned {}",
                status
            ))),
        }
    }
}

//! OAuth token lifecycle against the vendor identity service.
//!
//! The session owns the credential: load the persisted token at startup,
//! refresh it unconditionally before every outbound operation, persist the
//! full record back to disk, and resolve which connected organisation the
//! calls should target. Refreshing on every call trades one extra round
//! trip per invoice for correctness under clock skew: a token that is "not
//! yet expired" by the local clock may already be rejected by the vendor.

use crate::config::XeroConfig;
use crate::error::AppError;
use crate::models::TokenSet;
use anyhow::Context as _;
use chrono::Utc;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Lifetime assumed when the vendor omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 1800;

/// Outbound calls are bounded; a timeout is a normal call failure.
pub(crate) const VENDOR_TIMEOUT: Duration = Duration::from_secs(10);

/// Credentials handed to vendor-facing calls once the session is ready.
#[derive(Debug, Clone)]
pub struct Ready {
    pub access_token: String,
    pub tenant_id: String,
}

/// Token endpoint response. Unknown fields ride along in `extra`.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// A connected organisation, as listed by the connections endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: Option<String>,
    pub tenant_id: String,
    #[serde(default)]
    pub tenant_type: Option<String>,
    #[serde(default)]
    pub tenant_name: Option<String>,
}

/// Session object owned by the application state and passed by reference
/// into every vendor-facing operation; there is no global token state.
#[derive(Clone)]
pub struct XeroSession {
    config: XeroConfig,
    http: Client,
    // Serializes refreshes: concurrent callers await the same in-flight
    // refresh instead of issuing duplicate vendor calls and racing the
    // token file.
    token: Arc<Mutex<Option<TokenSet>>>,
}

impl XeroSession {
    pub fn new(config: XeroConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(VENDOR_TIMEOUT)
            .build()
            .context("failed to build identity HTTP client")?;

        Ok(Self {
            config,
            http,
            token: Arc::new(Mutex::new(None)),
        })
    }

    /// Load the persisted token at process start. An absent file is not an
    /// error: the session stays uninitialized and requests fail with
    /// `NotAuthenticated` until the external consent flow has run.
    pub async fn load_from_disk(&self) {
        match self.read_token_file().await {
            Some(token) => {
                tracing::info!(path = %self.config.token_file.display(), "Loaded persisted token");
                *self.token.lock().await = Some(token);
            }
            None => {
                tracing::info!(
                    path = %self.config.token_file.display(),
                    "No persisted token; waiting for the consent flow"
                );
            }
        }
    }

    /// Make the session ready for vendor calls and return the credentials.
    ///
    /// Idempotent and safe to call before every request. The token is
    /// refreshed unconditionally, persisted wholesale, and the first
    /// connected organisation is selected.
    pub async fn ensure_ready(&self) -> Result<Ready, AppError> {
        let mut guard = self.token.lock().await;

        let mut current = guard.clone().unwrap_or_default();
        if !current.has_refresh_credential() {
            if let Some(from_disk) = self.read_token_file().await {
                current = from_disk;
            }
        }

        let refresh_credential = match current.refresh_token.as_deref() {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => {
                return Err(AppError::NotAuthenticated(
                    "no refresh credential on file; run the consent flow".to_string(),
                ))
            }
        };

        let response = self.refresh(&refresh_credential).await?;
        let merged = merge_refreshed(current, response, Utc::now().timestamp());
        self.persist(&merged).await?;

        let access_token = merged.access_token.clone().ok_or_else(|| {
            AppError::RefreshFailed("vendor response carried no access token".to_string())
        })?;
        *guard = Some(merged);

        let connections = self.connections(&access_token).await?;
        let first = connections.into_iter().next().ok_or(AppError::NoTenant)?;

        tracing::debug!(tenant_id = %first.tenant_id, tenant_name = ?first.tenant_name, "Session ready");

        Ok(Ready {
            access_token,
            tenant_id: first.tenant_id,
        })
    }

    /// Exchange the refresh credential for a new token pair.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, AppError> {
        let url = format!("{}/connect/token", self.config.identity_base_url);

        let response = self
            .http
            .post(&url)
            .basic_auth(
                &self.config.client_id,
                Some(self.config.client_secret.expose_secret()),
            )
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| AppError::RefreshFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::RefreshFailed(e.to_string()))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Token refresh rejected");
            return Err(AppError::RefreshFailed(format!("{}: {}", status, body)));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, "Unparsable token response");
            AppError::RefreshFailed(format!("unparsable token response: {}", e))
        })
    }

    /// List the organisations connected to the current credential.
    async fn connections(&self, access_token: &str) -> Result<Vec<Connection>, AppError> {
        let url = format!("{}/connections", self.config.api_base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::VendorRejected(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::VendorRejected(e.to_string()))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Connection listing failed");
            return Err(AppError::VendorRejected(format!("{}: {}", status, body)));
        }

        serde_json::from_str(&body).map_err(|e| {
            AppError::VendorRejected(format!("unparsable connections response: {}", e))
        })
    }

    async fn read_token_file(&self) -> Option<TokenSet> {
        let raw = tokio::fs::read(&self.config.token_file).await.ok()?;
        match serde_json::from_slice(&raw) {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::warn!(
                    path = %self.config.token_file.display(),
                    error = %e,
                    "Persisted token is unreadable; treating as absent"
                );
                None
            }
        }
    }

    /// Overwrite the token file with the full record. Single slot, no
    /// versioning.
    async fn persist(&self, token: &TokenSet) -> Result<(), AppError> {
        let raw = serde_json::to_vec_pretty(token)
            .context("failed to serialize token")
            .map_err(AppError::InternalError)?;
        tokio::fs::write(&self.config.token_file, raw).await?;
        tracing::debug!(path = %self.config.token_file.display(), "Persisted refreshed token");
        Ok(())
    }
}

/// Fold a refresh response into the previous record. The new credential pair
/// and expiry win; unknown vendor fields from both sides are preserved, with
/// the fresh response taking precedence per key.
fn merge_refreshed(previous: TokenSet, response: RefreshResponse, now_epoch: i64) -> TokenSet {
    let mut extra = previous.extra;
    for (key, value) in response.extra {
        extra.insert(key, value);
    }

    TokenSet {
        access_token: Some(response.access_token),
        refresh_token: Some(response.refresh_token),
        expires_at: Some(
            now_epoch + response.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS),
        ),
        extra,
    }
}

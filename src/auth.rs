//! OAuth credentials for the Google Tasks API.
//!
//! Credentials live in a small JSON file. The interactive consent flow is
//! out of scope; tokens obtained elsewhere are handed to
//! [`on_token_received`], and `gtasks-sync refresh` trades the stored
//! refresh token for a new access token.

use anyhow::{Context, Result};
use log::info;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::backend::google::truncate_error;
use crate::backend::BackendError;
use crate::constants::{GOOGLE_OAUTH_TOKEN_URL, MSG_TOKENS_RECEIVED};

/// Stored OAuth client and token data.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Tokens returned by the OAuth token endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TokenPayload {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Where credentials are persisted.
pub trait CredentialStore: Send + Sync {
    /// `None` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Credentials>>;

    fn save(&self, credentials: &Credentials) -> Result<()>;
}

/// Credentials kept as pretty-printed JSON in a file.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credentials>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read credentials: {}", self.path.display()))?;
        let credentials = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse credentials: {}", self.path.display()))?;
        Ok(Some(credentials))
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create credentials directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(credentials).context("Failed to serialize credentials")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write credentials: {}", self.path.display()))?;
        Ok(())
    }
}

/// Merge freshly received tokens into the stored credentials and persist them.
///
/// The token endpoint only sends a refresh token on first consent, so an
/// absent one keeps whatever was stored before.
pub fn on_token_received(store: &dyn CredentialStore, payload: TokenPayload) -> Result<Credentials> {
    let mut credentials = store.load()?.unwrap_or_default();
    credentials.access_token = payload.access_token;
    if let Some(refresh_token) = payload.refresh_token {
        credentials.refresh_token = Some(refresh_token);
    }
    store.save(&credentials)?;
    info!("{MSG_TOKENS_RECEIVED}");
    Ok(credentials)
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

/// Exchange the stored refresh token for a new access token.
///
/// A rejected grant (revoked or expired refresh token) is reported as
/// [`BackendError::Unauthorized`].
pub async fn refresh_access_token(credentials: &Credentials) -> Result<TokenPayload, BackendError> {
    refresh_access_token_at(GOOGLE_OAUTH_TOKEN_URL, credentials).await
}

pub async fn refresh_access_token_at(token_url: &str, credentials: &Credentials) -> Result<TokenPayload, BackendError> {
    let Some(refresh_token) = credentials.refresh_token.as_deref() else {
        return Err(BackendError::Unauthorized("no refresh token stored".to_string()));
    };

    let resp = Client::new()
        .post(token_url)
        .form(&[
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await
        .map_err(|e| BackendError::Network(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(TokenErrorResponse {
                error,
                error_description: Some(description),
            }) => format!("{description} ({error})"),
            Ok(TokenErrorResponse { error, .. }) => error,
            Err(_) => truncate_error(&body),
        };
        return Err(match status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => BackendError::Unauthorized(message),
            _ => BackendError::Http {
                status: status.as_u16(),
                message,
            },
        });
    }

    resp.json::<TokenPayload>()
        .await
        .map_err(|e| BackendError::InvalidData(format!("token response: {e}")))
}

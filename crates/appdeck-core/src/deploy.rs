use crate::config::DeployConfig;
use crate::error::{DeckError, Result};
use crate::types::AppSource;
use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DeployRequest<'a> {
    pub category: &'a str,
    pub name: &'a str,
    pub text: &'a str,
}

impl<'a> From<&'a AppSource> for DeployRequest<'a> {
    fn from(source: &'a AppSource) -> Self {
        Self {
            category: &source.identity.category,
            name: &source.identity.name,
            text: &source.text,
        }
    }
}

/// Outcome of one deploy attempt. Remote rejections and transport failures
/// land here with `success: false`; they are not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// HTTP status, when the host answered at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl DeployResponse {
    fn published(live_url: String, status: u16) -> Self {
        Self {
            success: true,
            live_url: Some(live_url),
            error_message: None,
            status: Some(status),
        }
    }

    fn failed(message: String, status: Option<u16>) -> Self {
        Self {
            success: false,
            live_url: None,
            error_message: Some(message),
            status,
        }
    }
}

/// Body the host may send back. Both fields are optional.
#[derive(Debug, Default, Deserialize)]
struct HostReply {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// DeploymentClient
// ---------------------------------------------------------------------------

pub struct DeploymentClient {
    endpoint: String,
    token: Option<String>,
    http: Client,
}

impl DeploymentClient {
    pub fn new(cfg: &DeployConfig) -> Result<Self> {
        let raw = cfg
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DeckError::InvalidEndpoint("<unset>".to_string()))?;
        let parsed = Url::parse(raw).map_err(|_| DeckError::InvalidEndpoint(raw.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(DeckError::InvalidEndpoint(raw.to_string()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .build()
            .map_err(|e| DeckError::RequestBuild(e.to_string()))?;

        Ok(Self {
            endpoint: raw.trim_end_matches('/').to_string(),
            token: cfg.token.clone(),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `{endpoint}/live/{name}`
    pub fn live_url(&self, name: &str) -> String {
        format!("{}/live/{}", self.endpoint, name)
    }

    /// Publishes `source` with a single POST. No retries.
    pub fn deploy(&self, source: &AppSource) -> Result<DeployResponse> {
        source.identity.check_segments()?;
        let url = self.live_url(&source.identity.name);

        let mut request = self.http.post(&url).json(&DeployRequest::from(source));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        tracing::debug!(app = %source.identity, %url, bytes = source.text.len(), "sending deploy request");
        let response = match request.send() {
            Ok(r) => r,
            Err(e) if e.is_builder() => return Err(DeckError::RequestBuild(e.to_string())),
            Err(e) => {
                tracing::warn!(app = %source.identity, error = %e, "deploy transport failure");
                let reason = if e.is_timeout() {
                    "timed out".to_string()
                } else {
                    e.to_string()
                };
                return Ok(DeployResponse::failed(
                    format!("request to {url} failed: {reason}"),
                    None,
                ));
            }
        };

        let status = response.status();
        let body = response.text().unwrap_or_else(|e| {
            tracing::debug!(app = %source.identity, error = %e, "failed to read deploy response body");
            String::new()
        });
        let reply: HostReply = serde_json::from_str(&body).unwrap_or_default();

        if status.is_success() {
            let live_url = reply.url.unwrap_or(url);
            tracing::info!(app = %source.identity, %live_url, "published");
            return Ok(DeployResponse::published(live_url, status.as_u16()));
        }

        let detail = reply
            .error
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_default();
        tracing::warn!(app = %source.identity, status = status.as_u16(), "deploy rejected");
        Ok(DeployResponse::failed(
            format!("host rejected deploy (HTTP {}): {detail}", status.as_u16()),
            Some(status.as_u16()),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

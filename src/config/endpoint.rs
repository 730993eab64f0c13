use crate::utils::error::{ReviewError, Result};
use crate::utils::validation::validate_url;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;

pub const DEFAULT_BASE_URL_ENV: &str = "APP_SERVICE_URL";

/// Validated service root, stored without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(String);

impl BaseUrl {
    pub fn parse(raw: &str) -> Result<Self> {
        let url = validate_url("base_url", raw)?;
        let normalized = url.as_str();
        let trimmed = normalized.strip_suffix('/').unwrap_or(normalized);
        Ok(Self(trimmed.to_string()))
    }

    /// `path` must start with `/`.
    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self.0, path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the service base URL comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseUrlSource {
    Explicit(String),
    /// Name of an environment variable holding the URL.
    Env(String),
    /// Endpoint answering `{"appServiceUrl": "..."}`, fetched once.
    ConfigEndpoint(String),
}

impl Default for BaseUrlSource {
    fn default() -> Self {
        Self::Env(DEFAULT_BASE_URL_ENV.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeConfig {
    app_service_url: Option<String>,
}

impl BaseUrlSource {
    /// Resolves the base URL. Every failure is a configuration error; callers
    /// resolve once and inject the result into the client.
    pub async fn resolve(&self, client: &Client) -> Result<BaseUrl> {
        let resolved = match self {
            Self::Explicit(raw) => BaseUrl::parse(raw),
            Self::Env(var) => match std::env::var(var) {
                Ok(raw) if !raw.trim().is_empty() => BaseUrl::parse(&raw),
                _ => Err(ReviewError::configuration(format!(
                    "{} is not defined",
                    var
                ))),
            },
            Self::ConfigEndpoint(endpoint) => fetch_runtime_config(client, endpoint).await,
        };

        match &resolved {
            Ok(base) => tracing::info!("Review service base URL: {}", base),
            Err(e) => tracing::error!("Could not resolve review service base URL: {}", e),
        }
        resolved
    }
}

async fn fetch_runtime_config(client: &Client, endpoint: &str) -> Result<BaseUrl> {
    let url = validate_url("config_endpoint", endpoint)?;
    tracing::debug!("Fetching runtime configuration from: {}", url);

    let as_config_error =
        |e: reqwest::Error| ReviewError::configuration(format!("config endpoint: {}", e));

    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(as_config_error)?;

    if !response.status().is_success() {
        return Err(ReviewError::configuration(format!(
            "config endpoint returned HTTP {}",
            response.status()
        )));
    }

    let config: RuntimeConfig = response.json().await.map_err(as_config_error)?;
    match config.app_service_url {
        Some(raw) if !raw.trim().is_empty() => BaseUrl::parse(&raw),
        _ => Err(ReviewError::configuration(
            "config endpoint did not provide appServiceUrl",
        )),
    }
}

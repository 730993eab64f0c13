use crate::config::endpoint::{BaseUrlSource, DEFAULT_BASE_URL_ENV};
use crate::config::toml_config::DEFAULT_TIMEOUT_SECONDS;
use crate::domain::model::ClassifierMode;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ReviewError, Result};
use crate::utils::validation::{validate_range, validate_url, Validate};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "review-sentiment")]
#[command(about = "Submit a review, see its sentiment, confirm or correct it")]
pub struct CliConfig {
    #[arg(long, help = "Review service base URL")]
    pub base_url: Option<String>,

    #[arg(
        long,
        default_value = DEFAULT_BASE_URL_ENV,
        help = "Environment variable holding the base URL"
    )]
    pub base_url_env: String,

    #[arg(long, help = "Endpoint returning {\"appServiceUrl\": ...}")]
    pub config_endpoint: Option<String>,

    #[arg(long, value_enum, default_value_t = ClassifierMode::Remote)]
    pub mode: ClassifierMode,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    pub timeout_seconds: u64,

    #[arg(long, help = "TOML config file; replaces the service flags above")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON")]
    pub log_json: bool,
}

impl ConfigProvider for CliConfig {
    fn base_url_source(&self) -> BaseUrlSource {
        if let Some(url) = &self.base_url {
            BaseUrlSource::Explicit(url.clone())
        } else if let Some(endpoint) = &self.config_endpoint {
            BaseUrlSource::ConfigEndpoint(endpoint.clone())
        } else {
            BaseUrlSource::Env(self.base_url_env.clone())
        }
    }

    fn classifier_mode(&self) -> ClassifierMode {
        self.mode
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.base_url.is_some() && self.config_endpoint.is_some() {
            return Err(ReviewError::configuration(
                "--base-url and --config-endpoint cannot be combined",
            ));
        }
        if let Some(endpoint) = &self.config_endpoint {
            validate_url("config_endpoint", endpoint)?;
        }
        validate_range("timeout_seconds", self.timeout_seconds, 1, 300)
    }
}

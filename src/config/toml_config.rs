use crate::config::endpoint::{BaseUrlSource, DEFAULT_BASE_URL_ENV};
use crate::domain::model::ClassifierMode;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ReviewError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_url: Option<String>,
    pub base_url_env: Option<String>,
    pub config_endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub mode: ClassifierMode,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 先替換環境變數再解析
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| ReviewError::configuration(format!("TOML parsing error: {}", e)))
    }

    /// Replaces `${VAR}` with the variable's value. Unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ReviewError::configuration(format!("env pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.service
            .timeout_seconds
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }
}

impl ConfigProvider for TomlConfig {
    fn base_url_source(&self) -> BaseUrlSource {
        let service = &self.service;
        // 優先順序：明確網址 > 設定端點 > 環境變數
        if let Some(url) = &service.base_url {
            BaseUrlSource::Explicit(url.clone())
        } else if let Some(endpoint) = &service.config_endpoint {
            BaseUrlSource::ConfigEndpoint(endpoint.clone())
        } else {
            BaseUrlSource::Env(
                service
                    .base_url_env
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BASE_URL_ENV.to_string()),
            )
        }
    }

    fn classifier_mode(&self) -> ClassifierMode {
        self.classifier.mode
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        let service = &self.service;
        let sources = [
            service.base_url.is_some(),
            service.base_url_env.is_some(),
            service.config_endpoint.is_some(),
        ];
        if sources.iter().filter(|set| **set).count() > 1 {
            return Err(ReviewError::configuration(
                "service: set only one of base_url, base_url_env, config_endpoint",
            ));
        }

        // An unusable base_url is reported when it is resolved, not here:
        // the form still works without a service.
        if let Some(endpoint) = &service.config_endpoint {
            validate_url("service.config_endpoint", endpoint)?;
        }
        if let Some(var) = &service.base_url_env {
            validate_non_empty_string("service.base_url_env", var)?;
        }
        validate_range("service.timeout_seconds", self.timeout_seconds(), 1, 300)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[service]
base_url = "https://reviews.example.com"
timeout_seconds = 10

[classifier]
mode = "remote"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(
            config.base_url_source(),
            BaseUrlSource::Explicit("https://reviews.example.com".to_string())
        );
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.classifier_mode(), ClassifierMode::Remote);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(
            config.base_url_source(),
            BaseUrlSource::Env(DEFAULT_BASE_URL_ENV.to_string())
        );
        assert_eq!(config.classifier_mode(), ClassifierMode::Remote);
        assert_eq!(config.timeout_seconds(), DEFAULT_TIMEOUT_SECONDS);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_REVIEW_SERVICE_URL", "https://test.reviews.com");

        let toml_content = r#"
[service]
base_url = "${TEST_REVIEW_SERVICE_URL}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.service.base_url.as_deref(),
            Some("https://test.reviews.com")
        );

        std::env::remove_var("TEST_REVIEW_SERVICE_URL");
    }

    #[test]
    fn test_config_validation() {
        let conflicting = TomlConfig::from_toml_str(
            r#"
[service]
base_url = "https://a.example.com"
config_endpoint = "https://b.example.com/api/config"
"#,
        )
        .unwrap();
        assert!(conflicting.validate().is_err());

        let bad_timeout = TomlConfig::from_toml_str(
            r#"
[service]
timeout_seconds = 0
"#,
        )
        .unwrap();
        assert!(bad_timeout.validate().is_err());
    }

    #[test]
    fn test_keyword_mode_and_bad_mode() {
        let config = TomlConfig::from_toml_str("[classifier]\nmode = \"keyword\"\n").unwrap();
        assert_eq!(config.classifier_mode(), ClassifierMode::Keyword);

        assert!(TomlConfig::from_toml_str("[classifier]\nmode = \"psychic\"\n").is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[service]
config_endpoint = "http://localhost:3000/api/config"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(
            config.base_url_source(),
            BaseUrlSource::ConfigEndpoint("http://localhost:3000/api/config".to_string())
        );
    }
}

pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::{BaseUrl, BaseUrlSource, TomlConfig};
pub use crate::core::{
    client::PredictionClient,
    controller::{Notice, ReviewController, ServiceStatus, Submission},
    keyword::KeywordClassifier,
    session::{Phase, ReviewSession, Verdict},
};
pub use crate::domain::model::{ClassifierMode, ConfirmationReport, Sentiment, ServiceVersionInfo};
pub use crate::utils::error::{ReviewError, Result};

use std::sync::Arc;

use crate::core::SentimentClassifier;
use crate::domain::ports::ConfigProvider;

/// Builds the classifier for the configured mode. In remote mode the base URL
/// is resolved here, once; a failed resolution is kept inside the client so the
/// form still works and every service call reports the configuration error.
pub async fn build_classifier<C: ConfigProvider>(
    config: &C,
) -> Result<(Arc<dyn SentimentClassifier>, Option<PredictionClient>)> {
    match config.classifier_mode() {
        ClassifierMode::Keyword => {
            tracing::info!("Using local keyword classifier");
            let classifier: Arc<dyn SentimentClassifier> = Arc::new(KeywordClassifier::new());
            Ok((classifier, None))
        }
        ClassifierMode::Remote => {
            let http = reqwest::Client::builder()
                .timeout(config.request_timeout())
                .build()
                .map_err(|e| {
                    ReviewError::configuration(format!("HTTP client setup failed: {}", e))
                })?;
            let base_url = config.base_url_source().resolve(&http).await;
            let client = PredictionClient::with_client(base_url, http);
            let classifier: Arc<dyn SentimentClassifier> = Arc::new(client.clone());
            Ok((classifier, Some(client)))
        }
    }
}

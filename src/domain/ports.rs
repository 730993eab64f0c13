use crate::config::endpoint::BaseUrlSource;
use crate::domain::model::{ClassifierMode, ConfirmationReport, Review, Sentiment};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait ConfigProvider: Send + Sync {
    fn base_url_source(&self) -> BaseUrlSource;
    fn classifier_mode(&self) -> ClassifierMode;
    fn request_timeout(&self) -> Duration;
}

/// Whatever labels a review and hears back about the user's verdict.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    fn mode(&self) -> ClassifierMode;

    async fn classify(&self, review: &Review) -> Result<Sentiment>;

    async fn report(&self, report: &ConfirmationReport) -> Result<()>;
}

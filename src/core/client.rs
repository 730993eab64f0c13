use crate::config::endpoint::BaseUrl;
use crate::domain::model::{
    ClassifierMode, ConfirmationReport, Review, Sentiment, ServiceVersionInfo,
};
use crate::domain::ports::SentimentClassifier;
use crate::utils::error::{ReviewError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    review: &'a str,
}

/// HTTP adapter for the review service.
///
/// The base URL is resolved once, up front, and injected here. If resolution
/// failed, the stored error is returned by every operation.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    base_url: std::result::Result<BaseUrl, ReviewError>,
    client: Client,
}

impl PredictionClient {
    pub fn new(base_url: Result<BaseUrl>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReviewError::configuration(format!("HTTP client setup failed: {}", e)))?;
        Ok(Self { base_url, client })
    }

    pub fn with_client(base_url: Result<BaseUrl>, client: Client) -> Self {
        Self { base_url, client }
    }

    pub fn base_url(&self) -> Result<&BaseUrl> {
        self.base_url.as_ref().map_err(|e| e.clone())
    }

    fn endpoint(&self, path: &str) -> Result<String> {
        Ok(self.base_url()?.join(path))
    }

    pub async fn fetch_version_info(&self) -> Result<ServiceVersionInfo> {
        let url = self.endpoint("/version")?;
        tracing::debug!("Fetching service versions from: {}", url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let body = successful_body(response).await?;

        let info: ServiceVersionInfo = serde_json::from_slice(&body)?;
        tracing::info!(
            "✅ Connected to app service {} (model service {})",
            info.app_service_version,
            info.model_service_version
        );
        Ok(info)
    }

    pub async fn predict_sentiment(&self, review: &str) -> Result<Sentiment> {
        let url = self.endpoint("/predict-sentiment-review")?;
        tracing::debug!("Requesting prediction from: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&PredictRequest { review })
            .send()
            .await?;
        let body = successful_body(response).await?;

        let json: serde_json::Value = serde_json::from_slice(&body)?;
        let prediction = match json.get("prediction") {
            Some(value) => value.as_f64().ok_or_else(|| {
                ReviewError::protocol(format!("'prediction' is not a number: {}", value))
            })?,
            None => {
                return Err(ReviewError::protocol(
                    "response has no 'prediction' field",
                ))
            }
        };

        let label = Sentiment::from_prediction(prediction);
        tracing::debug!("Prediction {} mapped to {}", prediction, label);
        Ok(label)
    }

    pub async fn submit_confirmation(&self, report: &ConfirmationReport) -> Result<()> {
        let url = self.endpoint("/reviews/confirm")?;
        tracing::debug!("Reporting {:?} to: {}", report.action, url);

        let response = self.client.post(&url).json(report).send().await?;
        let body = successful_body(response).await?;

        if !body.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_slice::<serde_json::Value>(&body)?;
        }
        Ok(())
    }
}

async fn successful_body(response: Response) -> Result<Vec<u8>> {
    let status = response.status();
    tracing::debug!("Service response status: {}", status);
    if !status.is_success() {
        return Err(ReviewError::transport(format!(
            "{} returned HTTP {}",
            response.url().path(),
            status
        )));
    }
    Ok(response.bytes().await?.to_vec())
}

#[async_trait]
impl SentimentClassifier for PredictionClient {
    fn mode(&self) -> ClassifierMode {
        ClassifierMode::Remote
    }

    async fn classify(&self, review: &Review) -> Result<Sentiment> {
        self.predict_sentiment(review.as_str()).await
    }

    async fn report(&self, report: &ConfirmationReport) -> Result<()> {
        self.submit_confirmation(report).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> PredictionClient {
        let base = BaseUrl::parse(&server.base_url()).unwrap();
        PredictionClient::new(Ok(base), DEFAULT_TIMEOUT).unwrap()
    }

    #[tokio::test]
    async fn test_predict_maps_one_to_positive() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/predict-sentiment-review")
                .json_body(serde_json::json!({"review": "Lovely evening"}));
            then.status(200).json_body(serde_json::json!({"prediction": 1}));
        });

        let label = client_for(&server)
            .predict_sentiment("Lovely evening")
            .await
            .unwrap();
        assert_eq!(label, Sentiment::Positive);
        mock.assert();
    }

    #[tokio::test]
    async fn test_predict_maps_zero_to_negative() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/predict-sentiment-review");
            then.status(200).json_body(serde_json::json!({"prediction": 0}));
        });

        let label = client_for(&server).predict_sentiment("Meh").await.unwrap();
        assert_eq!(label, Sentiment::Negative);
    }

    #[tokio::test]
    async fn test_predict_rejects_non_numeric_prediction() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/predict-sentiment-review");
            then.status(200)
                .json_body(serde_json::json!({"prediction": "positive"}));
        });

        let err = client_for(&server)
            .predict_sentiment("Meh")
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::Protocol { .. }));
    }

    #[tokio::test]
    async fn test_predict_rejects_missing_prediction() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/predict-sentiment-review");
            then.status(200).json_body(serde_json::json!({"label": 1}));
        });

        let err = client_for(&server)
            .predict_sentiment("Meh")
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::Protocol { .. }));
    }

    #[tokio::test]
    async fn test_http_error_status_is_transport_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/predict-sentiment-review");
            then.status(503);
        });

        let err = client_for(&server)
            .predict_sentiment("Meh")
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        // Nothing listens on port 1.
        let base = BaseUrl::parse("http://127.0.0.1:1").unwrap();
        let client = PredictionClient::new(Ok(base), Duration::from_secs(5)).unwrap();

        let err = client.predict_sentiment("Nice view").await.unwrap_err();
        assert!(matches!(err, ReviewError::Transport { .. }));
        let err = client.fetch_version_info().await.unwrap_err();
        assert!(matches!(err, ReviewError::Transport { .. }));
        assert!(!err.is_configuration());
    }

    #[tokio::test]
    async fn test_unresolved_base_url_is_configuration_error() {
        let client = PredictionClient::new(
            Err(ReviewError::configuration("APP_SERVICE_URL is not defined")),
            DEFAULT_TIMEOUT,
        )
        .unwrap();

        assert!(client.fetch_version_info().await.unwrap_err().is_configuration());
        assert!(client.predict_sentiment("x").await.unwrap_err().is_configuration());
        let report = ConfirmationReport::new(Sentiment::Positive, Sentiment::Positive);
        assert!(client
            .submit_confirmation(&report)
            .await
            .unwrap_err()
            .is_configuration());
    }

    #[tokio::test]
    async fn test_confirmation_accepts_empty_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/reviews/confirm").json_body(serde_json::json!({
                "action": "correct",
                "originalLabel": "negative",
                "correctedLabel": "positive"
            }));
            then.status(204);
        });

        let report = ConfirmationReport::new(Sentiment::Negative, Sentiment::Positive);
        client_for(&server).submit_confirmation(&report).await.unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_confirmation_rejects_garbage_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/reviews/confirm");
            then.status(200).body("<html>oops</html>");
        });

        let report = ConfirmationReport::new(Sentiment::Negative, Sentiment::Negative);
        let err = client_for(&server)
            .submit_confirmation(&report)
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::Protocol { .. }));
    }
}

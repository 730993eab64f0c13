use crate::domain::model::{ClassifierMode, ConfirmationReport, Review, Sentiment};
use crate::domain::ports::SentimentClassifier;
use crate::utils::error::Result;
use async_trait::async_trait;

const POSITIVE_KEYWORDS: &[&str] = &["great", "excellent", "love", "amazing"];
const NEGATIVE_KEYWORDS: &[&str] = &["bad", "terrible", "disappointing", "poor"];

/// Local three-way classifier. Positive keywords win over negative ones.
pub fn classify_by_keywords(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    if POSITIVE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Sentiment::Positive
    } else if NEGATIVE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SentimentClassifier for KeywordClassifier {
    fn mode(&self) -> ClassifierMode {
        ClassifierMode::Keyword
    }

    async fn classify(&self, review: &Review) -> Result<Sentiment> {
        let label = classify_by_keywords(review.as_str());
        tracing::debug!("🔍 Keyword classifier labelled review as {}", label);
        Ok(label)
    }

    async fn report(&self, report: &ConfirmationReport) -> Result<()> {
        // Nothing to send to in keyword mode.
        tracing::debug!(
            "Keeping confirmation locally: {:?} {} -> {:?}",
            report.action,
            report.original_label,
            report.corrected_label
        );
        Ok(())
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::{ReviewError, Result};

/// Sentiment label attached to a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }

    /// Maps the model service's raw prediction value to a label.
    /// Only `1` is positive; every other number is negative.
    pub fn from_prediction(value: f64) -> Self {
        if value == 1.0 {
            Self::Positive
        } else {
            Self::Negative
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            "neutral" => Ok(Self::Neutral),
            other => Err(ReviewError::validation(
                "sentiment",
                format!("Unknown sentiment: {}", other),
            )),
        }
    }
}

/// Which classifier backs a session. The two are never active together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ClassifierMode {
    /// Binary labels from the remote model service.
    #[default]
    Remote,
    /// Three-way labels from local keyword matching.
    Keyword,
}

impl ClassifierMode {
    /// Labels a user may pick from when correcting the AI.
    pub fn labels(&self) -> &'static [Sentiment] {
        match self {
            Self::Remote => &[Sentiment::Positive, Sentiment::Negative],
            Self::Keyword => &[Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral],
        }
    }

    pub fn offers(&self, label: Sentiment) -> bool {
        self.labels().contains(&label)
    }
}

/// Submitted review text. Never empty or whitespace-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review(String);

impl Review {
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(ReviewError::validation("review", "Review must not be empty."));
        }
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Review {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceVersionInfo {
    #[serde(rename = "app-service-version")]
    pub app_service_version: String,
    #[serde(rename = "model-service-version")]
    pub model_service_version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmAction {
    Confirm,
    Correct,
}

/// Body of `POST /reviews/confirm`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationReport {
    pub action: ConfirmAction,
    pub original_label: Sentiment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_label: Option<Sentiment>,
}

impl ConfirmationReport {
    /// `corrected_label` is only carried when it differs from the AI label.
    pub fn new(original: Sentiment, chosen: Sentiment) -> Self {
        if original == chosen {
            Self {
                action: ConfirmAction::Confirm,
                original_label: original,
                corrected_label: None,
            }
        } else {
            Self {
                action: ConfirmAction::Correct,
                original_label: original,
                corrected_label: Some(chosen),
            }
        }
    }
}

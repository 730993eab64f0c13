use crate::core::session::Phase;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("Validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Protocol error: {message}")]
    Protocol { message: String },

    #[error("Cannot {action} while {phase}")]
    InvalidTransition { phase: Phase, action: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad user input, recovered locally.
    Input,
    /// Service base URL missing or unusable. Shown as a persistent indicator.
    Configuration,
    /// Network, HTTP status or response shape. Shown as a transient toast.
    Service,
    /// Action not available in the current phase.
    State,
}

impl ReviewError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Input,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Transport { .. } | Self::Protocol { .. } => ErrorCategory::Service,
            Self::InvalidTransition { .. } => ErrorCategory::State,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Text suitable for a toast or a field message.
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::Configuration { .. } => {
                "Disconnected: the review service is not configured.".to_string()
            }
            // Transport and protocol failures look the same to the user.
            Self::Transport { .. } | Self::Protocol { .. } => {
                "Something went wrong while contacting the review service. Please try again."
                    .to_string()
            }
            Self::InvalidTransition { action, .. } => {
                format!("You can't {} right now.", action)
            }
        }
    }
}

impl From<reqwest::Error> for ReviewError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::protocol(err.to_string())
        } else {
            Self::transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ReviewError {
    fn from(err: serde_json::Error) -> Self {
        Self::protocol(err.to_string())
    }
}

impl From<url::ParseError> for ReviewError {
    fn from(err: url::ParseError) -> Self {
        Self::configuration(format!("Invalid service URL: {}", err))
    }
}

impl From<std::io::Error> for ReviewError {
    fn from(err: std::io::Error) -> Self {
        Self::configuration(format!("IO error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, ReviewError>;

//! Side effects requested by session transitions, as plain data.
//!
//! The controller executes them; the transition function never does I/O.

use crate::domain::model::{ConfirmationReport, Review, ServiceVersionInfo};
use crate::utils::error::ReviewError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Classify `review` and feed the answer back tagged with `epoch`.
    RequestPrediction { epoch: u64, review: Review },

    /// Tell the service what the user decided. Failure is not fatal.
    ReportConfirmation { report: ConfirmationReport },

    Notify(Notification),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

/// Something a front end should show to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Inline message attached to a form field.
    FieldError { field: String, message: String },

    /// Transient message.
    Toast { level: ToastLevel, message: String },

    /// Persistent indicator that the service cannot be reached.
    Disconnected { reason: String },

    Connected { versions: ServiceVersionInfo },
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self::Toast {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::Toast {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Toast {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }
}

/// Validation errors become field errors, configuration errors mark the
/// service disconnected, everything else is a toast.
impl From<&ReviewError> for Notification {
    fn from(err: &ReviewError) -> Self {
        match err {
            ReviewError::Validation { field, message } => Notification::FieldError {
                field: field.clone(),
                message: message.clone(),
            },
            ReviewError::Configuration { .. } => Notification::Disconnected {
                reason: err.to_string(),
            },
            _ => Notification::error(err.user_friendly_message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_to_notification() {
        let field = Notification::from(&ReviewError::validation("review", "Review must not be empty."));
        assert!(matches!(field, Notification::FieldError { .. }));

        let disconnected = Notification::from(&ReviewError::configuration("unset"));
        assert!(matches!(disconnected, Notification::Disconnected { .. }));
    }
}

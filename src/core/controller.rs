//! Runs the session state machine against a classifier.
//!
//! The controller owns the live [`ReviewSession`], feeds user actions and
//! classifier answers through [`transition`], executes the resulting effects,
//! and publishes snapshots and notifications to subscribers. Methods take
//! `&self` and never hold the session across an `.await`, so a reset can land
//! while a prediction is in flight; the late answer is then dropped by the
//! epoch check.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};

use super::client::PredictionClient;
use super::effect::{Effect, Notification};
use super::session::{transition, Event, Outcome, ReviewSession, TransitionResult};
use crate::domain::model::{Sentiment, ServiceVersionInfo};
use crate::domain::ports::SentimentClassifier;
use crate::utils::error::Result;

const NOTICE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceStatus {
    Unknown,
    Connected(ServiceVersionInfo),
    Disconnected(String),
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub issued_at: DateTime<Utc>,
    pub notification: Notification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Classified(Sentiment),
    /// The session was reset before the classifier answered.
    Superseded,
}

pub struct ReviewController {
    classifier: Arc<dyn SentimentClassifier>,
    session: watch::Sender<ReviewSession>,
    status: watch::Sender<ServiceStatus>,
    notices: broadcast::Sender<Notice>,
}

impl ReviewController {
    pub fn new(classifier: Arc<dyn SentimentClassifier>) -> Self {
        let (session, _) = watch::channel(ReviewSession::new(classifier.mode()));
        let (status, _) = watch::channel(ServiceStatus::Unknown);
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            classifier,
            session,
            status,
            notices,
        }
    }

    pub fn session(&self) -> ReviewSession {
        self.session.borrow().clone()
    }

    pub fn watch_session(&self) -> watch::Receiver<ReviewSession> {
        self.session.subscribe()
    }

    pub fn status(&self) -> ServiceStatus {
        self.status.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<ServiceStatus> {
        self.status.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Fetches service versions and updates the connection status.
    /// Independent of any submission, so it may run alongside one.
    pub async fn refresh_service_status(
        &self,
        client: &PredictionClient,
    ) -> Result<ServiceVersionInfo> {
        match client.fetch_version_info().await {
            Ok(versions) => {
                self.publish(Notification::Connected {
                    versions: versions.clone(),
                });
                Ok(versions)
            }
            Err(err) => {
                tracing::warn!("Version check failed: {}", err);
                self.publish(Notification::from(&err));
                Err(err)
            }
        }
    }

    pub async fn submit(&self, text: &str) -> Result<Submission> {
        let result = self.dispatch(Event::Submit {
            text: text.to_string(),
        });

        let mut request = None;
        for effect in result.effects {
            match effect {
                Effect::RequestPrediction { epoch, review } => request = Some((epoch, review)),
                other => self.execute(other).await,
            }
        }
        if let Outcome::Rejected(err) = result.outcome {
            return Err(err);
        }
        let Some((epoch, review)) = request else {
            return Ok(Submission::Superseded);
        };

        tracing::info!("Classifying review (attempt {})", epoch);
        let prediction = self.classifier.classify(&review).await;
        let event = match &prediction {
            Ok(label) => Event::PredictionSucceeded {
                epoch,
                review,
                label: *label,
            },
            Err(error) => Event::PredictionFailed {
                epoch,
                error: error.clone(),
            },
        };

        let applied = self.dispatch(event);
        if applied.outcome == Outcome::Ignored {
            tracing::debug!("Dropping answer for superseded attempt {}", epoch);
            return Ok(Submission::Superseded);
        }
        self.run(applied.effects).await;

        match prediction {
            Ok(label) => {
                tracing::info!("Review classified as {}", label);
                Ok(Submission::Classified(label))
            }
            Err(err) => {
                tracing::warn!("❌ Classification failed: {}", err);
                Err(err)
            }
        }
    }

    pub async fn confirm(&self) -> Result<()> {
        self.apply(Event::Confirm).await
    }

    pub async fn begin_edit(&self) -> Result<()> {
        self.apply(Event::BeginEdit).await
    }

    pub async fn select_pending(&self, label: Sentiment) -> Result<()> {
        self.apply(Event::SelectPending(label)).await
    }

    pub async fn commit(&self) -> Result<()> {
        self.apply(Event::Commit).await
    }

    pub fn reset(&self) {
        let result = self.dispatch(Event::Reset);
        debug_assert!(result.effects.is_empty());
    }

    async fn apply(&self, event: Event) -> Result<()> {
        let result = self.dispatch(event);
        self.run(result.effects).await;
        match result.outcome {
            Outcome::Rejected(err) => Err(err),
            Outcome::Applied | Outcome::Ignored => Ok(()),
        }
    }

    fn dispatch(&self, event: Event) -> TransitionResult {
        let mut effects = Vec::new();
        let mut outcome = Outcome::Ignored;
        // Transition under the channel lock so concurrent actions serialize.
        self.session.send_if_modified(|session| {
            let next = transition(session.clone(), event);
            let changed = next.session != *session;
            *session = next.session;
            effects = next.effects;
            outcome = next.outcome;
            changed
        });
        let result = TransitionResult {
            session: self.session.borrow().clone(),
            effects,
            outcome,
        };

        match &result.outcome {
            Outcome::Applied => tracing::debug!(
                "Session now {} (attempt {})",
                result.session.phase(),
                result.session.epoch()
            ),
            Outcome::Ignored => tracing::debug!("Event had no effect"),
            Outcome::Rejected(err) => tracing::debug!("Event rejected: {}", err),
        }
        result
    }

    async fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            self.execute(effect).await;
        }
    }

    async fn execute(&self, effect: Effect) {
        match effect {
            Effect::Notify(notification) => self.publish(notification),
            Effect::ReportConfirmation { report } => {
                // The session is already committed; a failed report only warns.
                if let Err(err) = self.classifier.report(&report).await {
                    tracing::warn!("⚠️ Could not report confirmation: {}", err);
                    self.publish(Notification::error(format!(
                        "Your sentiment was saved here but could not be sent: {}",
                        err.user_friendly_message()
                    )));
                    if err.is_configuration() {
                        self.publish(Notification::Disconnected {
                            reason: err.to_string(),
                        });
                    }
                }
            }
            Effect::RequestPrediction { epoch, .. } => {
                tracing::warn!("Prediction request {} outside of submit was dropped", epoch);
            }
        }
    }

    fn publish(&self, notification: Notification) {
        match &notification {
            Notification::Connected { versions } => {
                self.status
                    .send_replace(ServiceStatus::Connected(versions.clone()));
            }
            Notification::Disconnected { reason } => {
                self.status
                    .send_replace(ServiceStatus::Disconnected(reason.clone()));
            }
            _ => {}
        }
        // No subscribers is fine.
        let _ = self.notices.send(Notice {
            issued_at: Utc::now(),
            notification,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::effect::ToastLevel;
    use crate::core::session::Phase;
    use crate::domain::model::{ClassifierMode, ConfirmationReport, Review};
    use crate::utils::error::ReviewError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Classifier that waits for a go signal and records reports.
    struct GatedClassifier {
        label: Sentiment,
        gate: Notify,
        fail_reports: bool,
        reports: Mutex<Vec<ConfirmationReport>>,
    }

    impl GatedClassifier {
        fn new(label: Sentiment) -> Self {
            Self {
                label,
                gate: Notify::new(),
                fail_reports: false,
                reports: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SentimentClassifier for GatedClassifier {
        fn mode(&self) -> ClassifierMode {
            ClassifierMode::Remote
        }

        async fn classify(&self, _review: &Review) -> Result<Sentiment> {
            self.gate.notified().await;
            Ok(self.label)
        }

        async fn report(&self, report: &ConfirmationReport) -> Result<()> {
            self.reports.lock().unwrap().push(report.clone());
            if self.fail_reports {
                Err(ReviewError::transport("connection reset"))
            } else {
                Ok(())
            }
        }
    }

    fn open_gate(classifier: &GatedClassifier) {
        classifier.gate.notify_one();
    }

    #[tokio::test]
    async fn test_reset_during_prediction_drops_late_answer() {
        let classifier = Arc::new(GatedClassifier::new(Sentiment::Positive));
        let controller = ReviewController::new(classifier.clone());

        let (submission, _) = tokio::join!(controller.submit("Slow kitchen"), async {
            assert_eq!(controller.session().phase(), Phase::Submitting);
            controller.reset();
            open_gate(&classifier);
        });

        assert_eq!(submission.unwrap(), Submission::Superseded);
        let session = controller.session();
        assert_eq!(session.phase(), Phase::Composing);
        assert!(session.ai_sentiment().is_none());
    }

    #[tokio::test]
    async fn test_second_submit_rejected_while_in_flight() {
        let classifier = Arc::new(GatedClassifier::new(Sentiment::Negative));
        let controller = ReviewController::new(classifier.clone());

        let (first, second) = tokio::join!(controller.submit("first"), async {
            let second = controller.submit("second").await;
            open_gate(&classifier);
            second
        });

        assert_eq!(first.unwrap(), Submission::Classified(Sentiment::Negative));
        assert!(matches!(
            second,
            Err(ReviewError::InvalidTransition {
                phase: Phase::Submitting,
                ..
            })
        ));
        assert_eq!(
            controller.session().review().unwrap().as_str(),
            "first"
        );
    }

    #[tokio::test]
    async fn test_failed_report_keeps_confirmation() {
        let classifier = Arc::new(GatedClassifier {
            fail_reports: true,
            ..GatedClassifier::new(Sentiment::Negative)
        });
        let controller = ReviewController::new(classifier.clone());
        let mut notices = controller.notices();

        open_gate(&classifier);
        controller.submit("Cold fries").await.unwrap();
        controller.confirm().await.unwrap();

        let session = controller.session();
        assert!(session.is_confirmed());
        assert_eq!(session.user_sentiment(), Some(Sentiment::Negative));
        assert_eq!(classifier.reports.lock().unwrap().len(), 1);

        let mut saw_error = false;
        while let Ok(notice) = notices.try_recv() {
            if let Notification::Toast {
                level: ToastLevel::Error,
                ..
            } = notice.notification
            {
                saw_error = true;
            }
        }
        assert!(saw_error);
    }

    #[tokio::test]
    async fn test_session_snapshots_are_published() {
        let classifier = Arc::new(GatedClassifier::new(Sentiment::Positive));
        let controller = ReviewController::new(classifier.clone());
        let mut snapshots = controller.watch_session();

        open_gate(&classifier);
        controller.submit("Great view").await.unwrap();

        assert!(snapshots.has_changed().unwrap());
        let latest = snapshots.borrow_and_update().clone();
        assert_eq!(latest.phase(), Phase::Classified);
        assert_eq!(latest.ai_sentiment(), Some(Sentiment::Positive));
    }

    #[tokio::test]
    async fn test_rejected_action_leaves_snapshot_untouched() {
        let classifier = Arc::new(GatedClassifier::new(Sentiment::Positive));
        let controller = ReviewController::new(classifier.clone());
        let mut snapshots = controller.watch_session();

        let err = controller.confirm().await.unwrap_err();

        assert!(matches!(
            err,
            ReviewError::InvalidTransition {
                phase: Phase::Composing,
                ..
            }
        ));
        assert!(!snapshots.has_changed().unwrap());
        assert_eq!(snapshots.borrow_and_update().phase(), Phase::Composing);
        assert_eq!(controller.session().epoch(), 0);
    }
}

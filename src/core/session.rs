//! Review session state machine.
//!
//! A session walks `Composing -> Submitting -> Classified -> (confirmed | Editing)`
//! and `Reset` drops it back to `Composing` from anywhere. [`transition`] is pure:
//! it returns the next session together with the effects the caller must run.

use std::fmt;

use super::effect::{Effect, Notification};
use crate::domain::model::{ClassifierMode, ConfirmationReport, Review, Sentiment};
use crate::utils::error::ReviewError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Composing,
    Submitting,
    Classified,
    Editing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Composing => "composing",
            Self::Submitting => "submitting",
            Self::Classified => "classified",
            Self::Editing => "editing",
        };
        f.write_str(name)
    }
}

/// One review's lifecycle.
///
/// Fields are private so that every change goes through [`transition`], which
/// keeps these invariants:
/// - `user_sentiment` is only set once `ai_sentiment` is set
/// - `confirmed` implies `user_sentiment` is set
/// - editing implies not confirmed
/// - `pending_sentiment` is only set while editing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSession {
    phase: Phase,
    epoch: u64,
    mode: ClassifierMode,
    review: Option<Review>,
    ai_sentiment: Option<Sentiment>,
    user_sentiment: Option<Sentiment>,
    confirmed: bool,
    pending_sentiment: Option<Sentiment>,
}

impl ReviewSession {
    pub fn new(mode: ClassifierMode) -> Self {
        Self {
            phase: Phase::Composing,
            epoch: 0,
            mode,
            review: None,
            ai_sentiment: None,
            user_sentiment: None,
            confirmed: false,
            pending_sentiment: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Identifies the current submission attempt. Bumped by submit and reset.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn mode(&self) -> ClassifierMode {
        self.mode
    }

    pub fn review(&self) -> Option<&Review> {
        self.review.as_ref()
    }

    pub fn ai_sentiment(&self) -> Option<Sentiment> {
        self.ai_sentiment
    }

    pub fn user_sentiment(&self) -> Option<Sentiment> {
        self.user_sentiment
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn is_editing(&self) -> bool {
        self.phase == Phase::Editing
    }

    pub fn pending_sentiment(&self) -> Option<Sentiment> {
        self.pending_sentiment
    }

    pub fn verdict(&self) -> Option<Verdict> {
        let ai = self.ai_sentiment?;
        let user = self.user_sentiment?;
        Some(match (self.confirmed, ai == user) {
            (false, _) => Verdict::Pending(ai),
            (true, true) => Verdict::Confirmed(ai),
            (true, false) => Verdict::Corrected { from: ai, to: user },
        })
    }

    fn cleared(&self) -> Self {
        Self {
            epoch: self.epoch + 1,
            ..Self::new(self.mode)
        }
    }
}

/// What the user currently sees for a classified review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pending(Sentiment),
    Confirmed(Sentiment),
    Corrected { from: Sentiment, to: Sentiment },
}

impl Verdict {
    pub fn headline(&self) -> &'static str {
        match self {
            Self::Pending(_) => "AI detected sentiment:",
            Self::Confirmed(_) => "AI detected sentiment was confirmed:",
            Self::Corrected { .. } => "AI detected sentiment was corrected to:",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending(label) => write!(f, "{} {}", self.headline(), label),
            Self::Confirmed(label) => write!(f, "{} [ok] {}", self.headline(), label),
            Self::Corrected { from, to } => {
                write!(f, "{} [x] {} -> {}", self.headline(), from, to)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Submit { text: String },
    PredictionSucceeded {
        epoch: u64,
        review: Review,
        label: Sentiment,
    },
    PredictionFailed { epoch: u64, error: ReviewError },
    Confirm,
    BeginEdit,
    SelectPending(Sentiment),
    Commit,
    Reset,
}

impl Event {
    fn action(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "submit a review",
            Self::PredictionSucceeded { .. } | Self::PredictionFailed { .. } => {
                "apply a prediction"
            }
            Self::Confirm => "confirm the sentiment",
            Self::BeginEdit => "change the sentiment",
            Self::SelectPending(_) => "select a sentiment",
            Self::Commit => "commit the sentiment",
            Self::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Valid but nothing to do, e.g. a stale prediction.
    Ignored,
    Rejected(ReviewError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub session: ReviewSession,
    pub effects: Vec<Effect>,
    pub outcome: Outcome,
}

impl TransitionResult {
    fn applied(session: ReviewSession, effects: Vec<Effect>) -> Self {
        Self {
            session,
            effects,
            outcome: Outcome::Applied,
        }
    }

    fn ignored(session: ReviewSession) -> Self {
        Self {
            session,
            effects: vec![],
            outcome: Outcome::Ignored,
        }
    }

    fn rejected(session: ReviewSession, error: ReviewError, effects: Vec<Effect>) -> Self {
        Self {
            session,
            effects,
            outcome: Outcome::Rejected(error),
        }
    }

    pub fn is_applied(&self) -> bool {
        self.outcome == Outcome::Applied
    }
}

fn sentiment_set(label: Sentiment) -> Effect {
    Effect::Notify(Notification::success(format!(
        "Review sentiment set to: {}",
        label
    )))
}

pub fn transition(session: ReviewSession, event: Event) -> TransitionResult {
    match (session.phase, event) {
        (_, Event::Reset) => TransitionResult::applied(session.cleared(), vec![]),

        (Phase::Composing, Event::Submit { text }) => match Review::parse(&text) {
            Ok(review) => {
                let epoch = session.epoch + 1;
                let next = ReviewSession {
                    phase: Phase::Submitting,
                    epoch,
                    ..ReviewSession::new(session.mode)
                };
                TransitionResult::applied(next, vec![Effect::RequestPrediction { epoch, review }])
            }
            Err(err) => {
                let effect = Effect::Notify(Notification::from(&err));
                TransitionResult::rejected(session, err, vec![effect])
            }
        },

        (
            Phase::Submitting,
            Event::PredictionSucceeded {
                epoch,
                review,
                label,
            },
        ) if epoch == session.epoch => {
            let next = ReviewSession {
                phase: Phase::Classified,
                review: Some(review),
                ai_sentiment: Some(label),
                user_sentiment: Some(label),
                confirmed: false,
                pending_sentiment: None,
                ..session
            };
            TransitionResult::applied(
                next,
                vec![Effect::Notify(Notification::info(
                    "Thank you for submitting your review!",
                ))],
            )
        }

        (Phase::Submitting, Event::PredictionFailed { epoch, error }) if epoch == session.epoch => {
            let mut effects = vec![Effect::Notify(Notification::error(
                error.user_friendly_message(),
            ))];
            if error.is_configuration() {
                effects.push(Effect::Notify(Notification::Disconnected {
                    reason: error.to_string(),
                }));
            }
            let next = ReviewSession {
                epoch: session.epoch,
                ..ReviewSession::new(session.mode)
            };
            TransitionResult::applied(next, effects)
        }

        // Late answer for an attempt that was reset or superseded.
        (_, Event::PredictionSucceeded { .. } | Event::PredictionFailed { .. }) => {
            TransitionResult::ignored(session)
        }

        (Phase::Classified, Event::Confirm) if !session.confirmed => {
            let Some((ai, user)) = session.ai_sentiment.zip(session.user_sentiment) else {
                return TransitionResult::ignored(session);
            };
            let next = ReviewSession {
                confirmed: true,
                ..session
            };
            TransitionResult::applied(
                next,
                vec![
                    Effect::ReportConfirmation {
                        report: ConfirmationReport::new(ai, user),
                    },
                    sentiment_set(user),
                ],
            )
        }

        (Phase::Classified, Event::BeginEdit) if !session.confirmed => {
            let next = ReviewSession {
                phase: Phase::Editing,
                pending_sentiment: session.user_sentiment,
                ..session
            };
            TransitionResult::applied(next, vec![])
        }

        (Phase::Editing, Event::SelectPending(label)) => {
            if !session.mode.offers(label) {
                let err = ReviewError::validation(
                    "sentiment",
                    format!("'{}' is not an available sentiment", label),
                );
                let effect = Effect::Notify(Notification::from(&err));
                return TransitionResult::rejected(session, err, vec![effect]);
            }
            let next = ReviewSession {
                pending_sentiment: Some(label),
                ..session
            };
            TransitionResult::applied(next, vec![])
        }

        (Phase::Editing, Event::Commit) => {
            let (Some(pending), Some(ai)) = (session.pending_sentiment, session.ai_sentiment)
            else {
                return TransitionResult::ignored(session);
            };
            let next = ReviewSession {
                phase: Phase::Classified,
                user_sentiment: Some(pending),
                confirmed: true,
                pending_sentiment: None,
                ..session
            };
            TransitionResult::applied(
                next,
                vec![
                    Effect::ReportConfirmation {
                        report: ConfirmationReport::new(ai, pending),
                    },
                    sentiment_set(pending),
                ],
            )
        }

        (phase, event) => {
            let err = ReviewError::InvalidTransition {
                phase,
                action: event.action(),
            };
            TransitionResult::rejected(session, err, vec![])
        }
    }
}

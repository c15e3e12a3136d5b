//! Client-side session controller for a remote multiple-choice quiz service.

pub mod controller;
pub mod error;
pub mod transport;
pub mod types;
pub mod view;

pub use controller::SessionController;
pub use error::{ApiError, QuizError};
pub use transport::{HttpQuizApi, QuestionFetch, QuizApi};
pub use types::{
    AccessToken, AuthMode, Feedback, FeedbackKind, FeedbackMode, IgnoreReason, IntentOutcome,
    Question, QuizPhase, Score, SessionEvent, SessionState, DEFAULT_AUTO_ADVANCE_DELAY,
};
pub use view::{AuthView, Intent, OptionButton, View};

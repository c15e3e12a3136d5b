use std::{collections::HashSet, fmt, time::Duration};

use shared::{
    domain::{OptionLabel, QuestionId},
    protocol::{QuestionPayload, SessionSummary},
};

pub type Question = QuestionPayload;
pub type Score = SessionSummary;

pub const DEFAULT_AUTO_ADVANCE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

impl AuthMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Login => Self::Register,
            Self::Register => Self::Login,
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Login => "Login failed. Invalid credentials.",
            Self::Register => "Registration failed. Try again.",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Register => "Sign Up",
        }
    }
}

/// Bearer credential issued by the quiz service. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub correct_option: Option<OptionLabel>,
    pub correct_option_text: Option<String>,
}

impl Feedback {
    pub fn correct() -> Self {
        Self {
            kind: FeedbackKind::Success,
            correct_option: None,
            correct_option_text: None,
        }
    }

    /// Builds the verdict for a wrong answer, quoting the option text of the
    /// question that was active when the answer went out.
    pub fn incorrect(question: &Question, correct_option: OptionLabel) -> Self {
        Self {
            kind: FeedbackKind::Danger,
            correct_option: Some(correct_option),
            correct_option_text: Some(question.option_text(correct_option).to_string()),
        }
    }

    pub fn is_correct(&self) -> bool {
        self.kind == FeedbackKind::Success
    }

    pub fn message(&self) -> String {
        match (&self.kind, self.correct_option, &self.correct_option_text) {
            (FeedbackKind::Success, _, _) => "Correct!".to_string(),
            (FeedbackKind::Danger, Some(label), Some(text)) => {
                format!("Incorrect! Option {label}: {text} was the correct answer.")
            }
            (FeedbackKind::Danger, _, _) => "Incorrect!".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QuizPhase {
    #[default]
    Unauthenticated,
    Idle,
    QuestionPending(Question),
    AwaitingFeedbackAck {
        question: Question,
        feedback: Feedback,
    },
    Completed,
}

impl QuizPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Idle => "idle",
            Self::QuestionPending(_) => "question_pending",
            Self::AwaitingFeedbackAck { .. } => "awaiting_feedback_ack",
            Self::Completed => "completed",
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::Unauthenticated)
    }

    pub fn accepts_question_request(&self) -> bool {
        matches!(self, Self::Idle | Self::AwaitingFeedbackAck { .. })
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        match self {
            Self::AwaitingFeedbackAck { feedback, .. } => Some(feedback),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Default)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for AuthForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthForm")
            .field("mode", &self.mode)
            .field("username", &self.username)
            .field("password_len", &self.password.len())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub token: Option<AccessToken>,
    pub phase: QuizPhase,
    pub score: Option<Score>,
    pub notice: Option<crate::QuizError>,
    pub auth_form: AuthForm,
    /// Questions answered this session. Recorded but not used to gate anything.
    pub answered: HashSet<QuestionId>,
}

impl SessionState {
    /// The question on screen or awaiting acknowledgement, if any.
    pub fn question(&self) -> Option<&Question> {
        match &self.phase {
            QuizPhase::QuestionPending(question) => Some(question),
            QuizPhase::AwaitingFeedbackAck { question, .. } => Some(question),
            _ => None,
        }
    }

    pub fn quiz_completed(&self) -> bool {
        self.phase == QuizPhase::Completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedbackMode {
    /// Feedback stays up until the user asks for the next question.
    #[default]
    Manual,
    /// The next question is requested automatically after the delay.
    AutoAdvance(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    RequestInFlight,
    InvalidPhase,
    NoActiveQuestion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentOutcome {
    Applied,
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    StateChanged,
}

//! Read-only projection of the session state into the panel the shell shows,
//! and the intents the shell may send back.

use shared::domain::OptionLabel;

use crate::types::{AuthMode, FeedbackKind, QuizPhase, Score, SessionState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    EditUsername(String),
    EditPassword(String),
    SubmitCredentials,
    ToggleAuthMode,
    RequestQuestion,
    PickOption(OptionLabel),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthView {
    pub mode: AuthMode,
    pub title: &'static str,
    pub username: String,
    /// Whether a password has been entered. The password itself is never projected.
    pub has_password: bool,
    pub submit_label: &'static str,
    pub toggle_label: &'static str,
    pub error: Option<String>,
    pub controls_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionButton {
    pub label: OptionLabel,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Auth(AuthView),
    Prompt {
        button_label: &'static str,
        score: Option<Score>,
        notice: Option<String>,
        controls_enabled: bool,
    },
    Feedback {
        kind: FeedbackKind,
        message: String,
        score: Option<Score>,
        notice: Option<String>,
        controls_enabled: bool,
    },
    Question {
        text: String,
        options: Vec<OptionButton>,
        score: Option<Score>,
        notice: Option<String>,
        controls_enabled: bool,
    },
    Completed {
        final_score: Score,
    },
}

impl View {
    pub fn project(state: &SessionState, busy: bool) -> Self {
        let controls_enabled = !busy;
        let notice = state.notice.map(|err| err.to_string());

        if state.token.is_none() || !state.phase.is_authenticated() {
            let mode = state.auth_form.mode;
            return Self::Auth(AuthView {
                mode,
                title: mode.title(),
                username: state.auth_form.username.clone(),
                has_password: !state.auth_form.password.is_empty(),
                submit_label: if busy { "Loading..." } else { mode.title() },
                toggle_label: match mode {
                    AuthMode::Login => "Need an account? Sign Up",
                    AuthMode::Register => "Already have an account? Login",
                },
                error: notice,
                controls_enabled,
            });
        }

        match &state.phase {
            QuizPhase::Unauthenticated | QuizPhase::Idle => Self::Prompt {
                button_label: if busy { "Loading..." } else { "Get Question" },
                score: state.score,
                notice,
                controls_enabled,
            },
            QuizPhase::QuestionPending(question) => Self::Question {
                text: question.question_text.clone(),
                options: OptionLabel::ALL
                    .into_iter()
                    .map(|label| OptionButton {
                        label,
                        text: question.option_text(label).to_string(),
                    })
                    .collect(),
                score: state.score,
                notice,
                controls_enabled,
            },
            QuizPhase::AwaitingFeedbackAck { feedback, .. } => Self::Feedback {
                kind: feedback.kind,
                message: feedback.message(),
                score: state.score,
                notice,
                controls_enabled,
            },
            QuizPhase::Completed => Self::Completed {
                final_score: state.score.unwrap_or_default(),
            },
        }
    }

    pub fn controls_enabled(&self) -> bool {
        match self {
            Self::Auth(auth) => auth.controls_enabled,
            Self::Prompt {
                controls_enabled, ..
            }
            | Self::Feedback {
                controls_enabled, ..
            }
            | Self::Question {
                controls_enabled, ..
            } => *controls_enabled,
            Self::Completed { .. } => false,
        }
    }
}

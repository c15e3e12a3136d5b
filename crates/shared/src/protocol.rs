use serde::{Deserialize, Serialize};

use crate::domain::{OptionLabel, QuestionId};

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionPayload {
    pub id: QuestionId,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
}

impl QuestionPayload {
    pub fn option_text(&self, label: OptionLabel) -> &str {
        match label {
            OptionLabel::A => &self.option_a,
            OptionLabel::B => &self.option_b,
            OptionLabel::C => &self.option_c,
            OptionLabel::D => &self.option_d,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitAnswerRequest {
    pub question_id: QuestionId,
    pub selected_option: OptionLabel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitAnswerResponse {
    pub is_correct: bool,
    #[serde(default)]
    pub correct_option: Option<OptionLabel>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SessionSummary {
    pub correct_answers: u32,
    pub total_questions: u32,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.correct_answers, self.total_questions)
    }
}

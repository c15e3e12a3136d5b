use serde::{Deserialize, Serialize};

/// Body the quiz service returns on the question endpoint once the pool is exhausted.
pub const QUIZ_COMPLETED_MESSAGE: &str = "You have completed all available questions!";

/// Error payload shape used by the quiz service: `{"message": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn signals_completion(&self) -> bool {
        self.message == QUIZ_COMPLETED_MESSAGE
    }
}

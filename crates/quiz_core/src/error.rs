use thiserror::Error;

use crate::types::AuthMode;

/// Failure of a single call against the quiz service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded with status {status}")]
    Status { status: u16, message: Option<String> },
    #[error("undecodable response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// User-visible failures. Every remote failure collapses into one of these;
/// the display string is the inline notice the shell shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("{}", .0.failure_message())]
    AuthenticationFailure(AuthMode),
    #[error("Failed to fetch question.")]
    QuestionFetchFailure,
    #[error("Failed to submit answer.")]
    SubmissionFailure,
    #[error("Failed to fetch session details.")]
    ScoreFetchFailure,
    #[error("Session expired. Please log in again.")]
    MissingToken,
}

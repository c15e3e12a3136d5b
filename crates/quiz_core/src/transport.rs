use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    error::{ApiMessage, QUIZ_COMPLETED_MESSAGE},
    protocol::{
        Credentials, QuestionPayload, SessionSummary, SubmitAnswerRequest, SubmitAnswerResponse,
        TokenResponse,
    },
};
use tracing::debug;
use url::Url;

use crate::{
    error::ApiError,
    types::{AccessToken, AuthMode},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionFetch {
    Question(QuestionPayload),
    Completed,
}

#[async_trait]
pub trait QuizApi: Send + Sync {
    async fn authenticate(
        &self,
        mode: AuthMode,
        credentials: &Credentials,
    ) -> Result<AccessToken, ApiError>;
    async fn next_question(&self, token: &AccessToken) -> Result<QuestionFetch, ApiError>;
    async fn submit_answer(
        &self,
        token: &AccessToken,
        request: &SubmitAnswerRequest,
    ) -> Result<SubmitAnswerResponse, ApiError>;
    async fn session_summary(&self, token: &AccessToken) -> Result<SessionSummary, ApiError>;
}

pub struct HttpQuizApi {
    http: Client,
    base_url: Url,
}

impl HttpQuizApi {
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            http: Client::new(),
            base_url,
        }
    }

    pub fn parse(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self::new(Url::parse(base_url)?))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }
}

fn auth_path(mode: AuthMode) -> &'static str {
    match mode {
        AuthMode::Login => "api/login/",
        AuthMode::Register => "api/register/",
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        let message = serde_json::from_slice::<ApiMessage>(&body)
            .ok()
            .map(|payload| payload.message);
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }
    Ok(serde_json::from_slice(&body)?)
}

fn is_completion_signal(err: &ApiError) -> bool {
    matches!(
        err,
        ApiError::Status { status: 404, message: Some(message) } if message == QUIZ_COMPLETED_MESSAGE
    )
}

#[async_trait]
impl QuizApi for HttpQuizApi {
    async fn authenticate(
        &self,
        mode: AuthMode,
        credentials: &Credentials,
    ) -> Result<AccessToken, ApiError> {
        let url = self.endpoint(auth_path(mode))?;
        debug!(%url, ?mode, "sending credentials");
        let response = self.http.post(url).json(credentials).send().await?;
        let body: TokenResponse = read_json(response).await?;
        Ok(AccessToken::new(body.access))
    }

    async fn next_question(&self, token: &AccessToken) -> Result<QuestionFetch, ApiError> {
        let response = self
            .http
            .get(self.endpoint("api/question/")?)
            .bearer_auth(token.as_str())
            .send()
            .await?;
        match read_json::<QuestionPayload>(response).await {
            Ok(question) => Ok(QuestionFetch::Question(question)),
            Err(err) if is_completion_signal(&err) => Ok(QuestionFetch::Completed),
            Err(err) => Err(err),
        }
    }

    async fn submit_answer(
        &self,
        token: &AccessToken,
        request: &SubmitAnswerRequest,
    ) -> Result<SubmitAnswerResponse, ApiError> {
        let response = self
            .http
            .post(self.endpoint("api/submit/")?)
            .bearer_auth(token.as_str())
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }

    async fn session_summary(&self, token: &AccessToken) -> Result<SessionSummary, ApiError> {
        let response = self
            .http
            .get(self.endpoint("api/session/")?)
            .bearer_auth(token.as_str())
            .send()
            .await?;
        read_json(response).await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex as StdMutex, PoisonError,
};

use shared::{
    domain::OptionLabel,
    protocol::{Credentials, SubmitAnswerRequest},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    error::QuizError,
    transport::{QuestionFetch, QuizApi},
    types::{
        AccessToken, AuthMode, Feedback, FeedbackMode, IgnoreReason, IntentOutcome, QuizPhase,
        Score, SessionEvent, SessionState,
    },
    view::{Intent, View},
};

/// Releases the single in-flight slot when a guarded request finishes.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SessionController {
    api: Arc<dyn QuizApi>,
    feedback_mode: FeedbackMode,
    in_flight: AtomicBool,
    inner: Mutex<SessionState>,
    pending_advance: StdMutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(api: Arc<dyn QuizApi>, feedback_mode: FeedbackMode) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            api,
            feedback_mode,
            in_flight: AtomicBool::new(false),
            inner: Mutex::new(SessionState::default()),
            pending_advance: StdMutex::new(None),
            events,
        })
    }

    pub fn feedback_mode(&self) -> FeedbackMode {
        self.feedback_mode
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionState {
        self.inner.lock().await.clone()
    }

    pub async fn view(&self) -> View {
        let state = self.snapshot().await;
        View::project(&state, self.is_busy())
    }

    /// Routes a shell intent to the matching operation.
    pub async fn dispatch(self: &Arc<Self>, intent: Intent) -> Result<IntentOutcome, QuizError> {
        match intent {
            Intent::EditUsername(username) => Ok(self.set_username(username).await),
            Intent::EditPassword(password) => Ok(self.set_password(password).await),
            Intent::SubmitCredentials => self.submit_auth_form().await,
            Intent::ToggleAuthMode => Ok(self.reset_to_login().await),
            Intent::RequestQuestion => self.request_next_question().await,
            Intent::PickOption(label) => self.submit_answer(label).await,
        }
    }

    pub async fn set_username(&self, username: String) -> IntentOutcome {
        if self.is_busy() {
            return IntentOutcome::Ignored(IgnoreReason::RequestInFlight);
        }
        self.inner.lock().await.auth_form.username = username;
        self.notify();
        IntentOutcome::Applied
    }

    pub async fn set_password(&self, password: String) -> IntentOutcome {
        if self.is_busy() {
            return IntentOutcome::Ignored(IgnoreReason::RequestInFlight);
        }
        self.inner.lock().await.auth_form.password = password;
        self.notify();
        IntentOutcome::Applied
    }

    /// Switches the auth form between login and registration, clearing the
    /// typed credentials and any notice. Token and quiz progress are untouched.
    pub async fn reset_to_login(&self) -> IntentOutcome {
        if self.is_busy() {
            debug!("auth form toggle ignored while a request is in flight");
            return IntentOutcome::Ignored(IgnoreReason::RequestInFlight);
        }
        {
            let mut state = self.inner.lock().await;
            let form = &mut state.auth_form;
            form.mode = form.mode.toggled();
            form.username.clear();
            form.password.clear();
            state.notice = None;
        }
        self.notify();
        IntentOutcome::Applied
    }

    pub async fn submit_auth_form(&self) -> Result<IntentOutcome, QuizError> {
        let (mode, credentials) = {
            let state = self.inner.lock().await;
            let form = &state.auth_form;
            (
                form.mode,
                Credentials::new(form.username.clone(), form.password.clone()),
            )
        };
        self.authenticate(mode, credentials).await
    }

    pub async fn authenticate(
        &self,
        mode: AuthMode,
        credentials: Credentials,
    ) -> Result<IntentOutcome, QuizError> {
        let Some(guard) = self.try_begin_request() else {
            debug!(?mode, "authentication ignored while a request is in flight");
            return Ok(IntentOutcome::Ignored(IgnoreReason::RequestInFlight));
        };
        if self.inner.lock().await.phase.is_authenticated() {
            debug!(?mode, "authentication ignored for an authenticated session");
            return Ok(IntentOutcome::Ignored(IgnoreReason::InvalidPhase));
        }
        self.cancel_auto_advance();
        self.notify();

        let token = match self.api.authenticate(mode, &credentials).await {
            Ok(token) if !token.is_empty() => token,
            Ok(_) => {
                warn!(?mode, "quiz service returned an empty access token");
                drop(guard);
                return self.fail(QuizError::AuthenticationFailure(mode)).await;
            }
            Err(err) => {
                warn!(?mode, error = %err, "authentication failed");
                drop(guard);
                return self.fail(QuizError::AuthenticationFailure(mode)).await;
            }
        };

        {
            let mut state = self.inner.lock().await;
            state.token = Some(token);
            state.phase = QuizPhase::Idle;
            state.notice = None;
        }
        info!(?mode, username = %credentials.username, "authenticated");
        drop(guard);
        self.notify();

        self.refresh_score_quietly().await;
        Ok(IntentOutcome::Applied)
    }

    pub async fn request_next_question(&self) -> Result<IntentOutcome, QuizError> {
        self.fetch_next_question(true).await
    }

    async fn fetch_next_question(
        &self,
        cancel_scheduled: bool,
    ) -> Result<IntentOutcome, QuizError> {
        let Some(guard) = self.try_begin_request() else {
            debug!("question request ignored while a request is in flight");
            return Ok(IntentOutcome::Ignored(IgnoreReason::RequestInFlight));
        };
        let token = self.require_token().await?;
        {
            let state = self.inner.lock().await;
            if !state.phase.accepts_question_request() {
                debug!(phase = state.phase.name(), "question request ignored");
                return Ok(IntentOutcome::Ignored(IgnoreReason::InvalidPhase));
            }
        }
        if cancel_scheduled {
            self.cancel_auto_advance();
        }
        self.notify();

        let fetched = match self.api.next_question(&token).await {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!(error = %err, "question fetch failed");
                drop(guard);
                return self.fail(QuizError::QuestionFetchFailure).await;
            }
        };

        {
            let mut state = self.inner.lock().await;
            state.notice = None;
            match fetched {
                QuestionFetch::Question(question) => {
                    info!(question_id = question.id.0, "question received");
                    state.phase = QuizPhase::QuestionPending(question);
                }
                QuestionFetch::Completed => {
                    info!(score = ?state.score, "quiz completed");
                    state.phase = QuizPhase::Completed;
                }
            }
        }
        drop(guard);
        self.notify();
        Ok(IntentOutcome::Applied)
    }

    pub async fn submit_answer(
        self: &Arc<Self>,
        option: OptionLabel,
    ) -> Result<IntentOutcome, QuizError> {
        let Some(guard) = self.try_begin_request() else {
            debug!(%option, "answer ignored while a request is in flight");
            return Ok(IntentOutcome::Ignored(IgnoreReason::RequestInFlight));
        };
        let token = self.require_token().await?;
        let question = match &self.inner.lock().await.phase {
            QuizPhase::QuestionPending(question) => question.clone(),
            phase => {
                debug!(phase = phase.name(), %option, "answer ignored without an active question");
                return Ok(IntentOutcome::Ignored(IgnoreReason::NoActiveQuestion));
            }
        };
        self.notify();

        let request = SubmitAnswerRequest {
            question_id: question.id,
            selected_option: option,
        };
        let verdict = match self.api.submit_answer(&token, &request).await {
            Ok(verdict) => verdict,
            Err(err) => {
                warn!(question_id = question.id.0, error = %err, "answer submission failed");
                drop(guard);
                return self.fail(QuizError::SubmissionFailure).await;
            }
        };
        self.inner.lock().await.answered.insert(question.id);

        let feedback = match (verdict.is_correct, verdict.correct_option) {
            (true, _) => Feedback::correct(),
            (false, Some(correct_option)) => Feedback::incorrect(&question, correct_option),
            (false, None) => {
                warn!(
                    question_id = question.id.0,
                    "incorrect verdict did not name the correct option"
                );
                drop(guard);
                return self.fail(QuizError::SubmissionFailure).await;
            }
        };
        info!(
            question_id = question.id.0,
            %option,
            correct = feedback.is_correct(),
            "answer recorded"
        );

        {
            let mut state = self.inner.lock().await;
            state.notice = None;
            state.phase = QuizPhase::AwaitingFeedbackAck { question, feedback };
        }
        drop(guard);
        self.notify();
        self.schedule_auto_advance();

        self.refresh_score_quietly().await;
        Ok(IntentOutcome::Applied)
    }

    /// Replaces the score snapshot with the server's value. Not gated by the
    /// in-flight slot and never changes the phase.
    pub async fn refresh_score(&self) -> Result<Score, QuizError> {
        let token = self.require_token().await?;
        match self.api.session_summary(&token).await {
            Ok(score) => {
                self.inner.lock().await.score = Some(score);
                self.notify();
                Ok(score)
            }
            Err(err) => {
                warn!(error = %err, "score refresh failed");
                self.record_notice(QuizError::ScoreFetchFailure).await;
                Err(QuizError::ScoreFetchFailure)
            }
        }
    }

    async fn refresh_score_quietly(&self) {
        if let Err(err) = self.refresh_score().await {
            debug!(error = %err, "continuing without a fresh score");
        }
    }

    fn try_begin_request(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(&self.in_flight))
    }

    async fn require_token(&self) -> Result<AccessToken, QuizError> {
        {
            let mut state = self.inner.lock().await;
            if let Some(token) = state.token.clone() {
                return Ok(token);
            }
            state.phase = QuizPhase::Unauthenticated;
            state.notice = Some(QuizError::MissingToken);
        }
        warn!("protected call attempted without an access token");
        self.notify();
        Err(QuizError::MissingToken)
    }

    async fn record_notice(&self, error: QuizError) {
        self.inner.lock().await.notice = Some(error);
        self.notify();
    }

    async fn fail(&self, error: QuizError) -> Result<IntentOutcome, QuizError> {
        self.record_notice(error).await;
        Err(error)
    }

    fn notify(&self) {
        let _ = self.events.send(SessionEvent::StateChanged);
    }

    fn schedule_auto_advance(self: &Arc<Self>) {
        let FeedbackMode::AutoAdvance(delay) = self.feedback_mode else {
            return;
        };
        let controller = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(controller) = controller.upgrade() else {
                return;
            };
            controller.take_scheduled_advance();
            if let Err(err) = controller.fetch_next_question(false).await {
                debug!(error = %err, "auto-advance fetch failed");
            }
        });
        if let Some(previous) = self.pending_advance_slot().replace(task) {
            previous.abort();
        }
        debug!(delay_ms = delay.as_millis() as u64, "auto-advance scheduled");
    }

    fn take_scheduled_advance(&self) -> Option<JoinHandle<()>> {
        self.pending_advance_slot().take()
    }

    fn cancel_auto_advance(&self) {
        if let Some(task) = self.take_scheduled_advance() {
            task.abort();
            debug!("scheduled auto-advance cancelled");
        }
    }

    fn pending_advance_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending_advance
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        let slot = self
            .pending_advance
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = slot.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;

//! QuizController: owns the flow state and turns user intents and network
//! outcomes into transitions.
//!
//! Intents are processed one at a time through `&mut self`. The only
//! suspension points are the two network calls, made while the state is
//! `Loading` or `Submitting`.

use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use super::answers::Answer;
use super::model::{QuestionKind, QuestionSet, QuizResult};
use super::state::{ActiveQuiz, FlowEvent, FlowPhase, FlowState, RecoveryAction};
use crate::api::types::RecommendRequest;
use crate::api::RecommendationApi;
use crate::error::{ApiError, FlowError};

/// Capacity of the flow event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Drives one quiz: loading, answering, submitting, showing the result.
pub struct QuizController {
    api: Arc<dyn RecommendationApi>,
    state: FlowState,
    events: broadcast::Sender<FlowEvent>,
}

impl QuizController {
    /// Create a controller in the `Loading` state. Call [`load`](Self::load)
    /// to fetch the questions.
    pub fn new(api: Arc<dyn RecommendationApi>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            api,
            state: FlowState::Loading,
            events,
        }
    }

    /// Read-only snapshot of the current state.
    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn phase(&self) -> FlowPhase {
        self.state.phase()
    }

    /// Receive a [`FlowEvent`] for every phase change from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<FlowEvent> {
        self.events.subscribe()
    }

    /// The loaded questions and quiz metadata, if any are held.
    pub fn questions(&self) -> Option<&Arc<QuestionSet>> {
        match &self.state {
            FlowState::Active(quiz) => Some(&quiz.questions),
            FlowState::Submitting { attempt } => Some(&attempt.questions),
            FlowState::Result { questions, .. } => Some(questions),
            FlowState::Failed {
                recovery: RecoveryAction::ResumeQuiz { attempt },
                ..
            } => Some(&attempt.questions),
            FlowState::Loading
            | FlowState::Failed {
                recovery: RecoveryAction::ReloadQuestions,
                ..
            } => None,
        }
    }

    // ── Loading ─────────────────────────────────────────────────────

    /// Fetch the questions. Valid only while `Loading`.
    pub async fn load(&mut self) -> Result<(), FlowError> {
        if !matches!(self.state, FlowState::Loading) {
            return Err(self.invalid("load questions"));
        }

        match self.api.fetch_questions().await {
            Ok(questions) => {
                tracing::info!(
                    questions = questions.len(),
                    title = %questions.title,
                    "Quiz questions loaded"
                );
                if questions.is_empty() {
                    tracing::warn!("Quiz has no questions; it can be submitted right away");
                }
                self.transition(FlowState::Active(ActiveQuiz::new(Arc::new(questions))));
            }
            Err(e) => {
                tracing::warn!("Loading quiz questions failed: {}", e);
                self.fail(&e, RecoveryAction::ReloadQuestions);
            }
        }
        Ok(())
    }

    /// Re-enter `Loading` and fetch again. Valid only after a load failure.
    pub async fn retry_load(&mut self) -> Result<(), FlowError> {
        match &self.state {
            FlowState::Failed {
                recovery: RecoveryAction::ReloadQuestions,
                ..
            } => {}
            _ => return Err(self.invalid("retry loading")),
        }
        self.transition(FlowState::Loading);
        self.load().await
    }

    // ── Answering and navigation ────────────────────────────────────

    /// Store or overwrite the answer for a question of the current quiz.
    ///
    /// The answer's shape must match the question kind; callers are expected
    /// to build it from the question they are rendering.
    pub fn record_answer(
        &mut self,
        question_id: &str,
        answer: Answer,
    ) -> Result<(), FlowError> {
        let quiz = self.active_mut("record an answer")?;
        let question = quiz
            .questions
            .find(question_id)
            .ok_or_else(|| FlowError::UnknownQuestion(question_id.to_string()))?;
        debug_assert!(
            answer.matches_kind(question.kind),
            "answer shape {} does not fit {} question {}",
            answer.shape(),
            question.kind,
            question_id
        );
        quiz.answers.record(question_id, answer);
        Ok(())
    }

    /// Select an option of the current question.
    ///
    /// Single choice replaces the answer; multi choice toggles the value.
    pub fn select_option(&mut self, value: &str) -> Result<(), FlowError> {
        let quiz = self.active_mut("select an option")?;
        let Some(question) = quiz.current_question() else {
            return Err(FlowError::UnknownQuestion(format!("#{}", quiz.index)));
        };
        if question.option(value).is_none() {
            return Err(FlowError::UnknownOption {
                question_id: question.id.clone(),
                value: value.to_string(),
            });
        }

        let id = question.id.clone();
        let kind = question.kind;
        match kind {
            QuestionKind::SingleChoice => {
                quiz.answers.record(id, Answer::Choice(value.to_string()));
            }
            QuestionKind::MultiChoice => {
                quiz.answers.toggle_choice(&id, value);
            }
            QuestionKind::FreeText => {
                return Err(FlowError::KindMismatch {
                    question_id: id,
                    attempted: "an option",
                });
            }
        }
        Ok(())
    }

    /// Record free text for the current question.
    pub fn enter_text(&mut self, text: &str) -> Result<(), FlowError> {
        let quiz = self.active_mut("enter text")?;
        let Some(question) = quiz.current_question() else {
            return Err(FlowError::UnknownQuestion(format!("#{}", quiz.index)));
        };
        if question.kind != QuestionKind::FreeText {
            return Err(FlowError::KindMismatch {
                question_id: question.id.clone(),
                attempted: "free text",
            });
        }
        let id = question.id.clone();
        quiz.answers.record(id, Answer::Text(text.to_string()));
        Ok(())
    }

    /// Whether the current question allows moving on. False outside `Active`.
    pub fn can_advance(&self) -> bool {
        self.state.as_active().is_some_and(ActiveQuiz::can_advance)
    }

    /// Go to the next question. Returns whether the index moved; staying on
    /// the last question is not an error, answered or not.
    pub fn advance(&mut self) -> Result<bool, FlowError> {
        let quiz = self.active_mut("go to the next question")?;
        if quiz.is_last_question() {
            return Ok(false);
        }
        if !quiz.can_advance() {
            return Err(required(quiz));
        }
        Ok(quiz.advance())
    }

    /// Go to the previous question. Returns whether the index moved.
    pub fn retreat(&mut self) -> Result<bool, FlowError> {
        let quiz = self.active_mut("go to the previous question")?;
        Ok(quiz.retreat())
    }

    // ── Submission ──────────────────────────────────────────────────

    /// Submit the answers and wait for the recommendations.
    ///
    /// Rejected without a state change or network call unless the quiz is
    /// on its last question and that question can be advanced past. Service
    /// failures are not errors of this call: they move the flow to `Failed`.
    pub async fn submit(&mut self) -> Result<(), FlowError> {
        let request = self.begin_submit()?;
        let outcome = self.api.submit_answers(&request).await;
        self.finish_submit(outcome)
    }

    /// Validate, assemble the payload and enter `Submitting`.
    pub fn begin_submit(&mut self) -> Result<RecommendRequest, FlowError> {
        let quiz = match &self.state {
            FlowState::Active(quiz) => quiz,
            _ => return Err(self.invalid("submit")),
        };
        if !quiz.is_last_question() {
            return Err(FlowError::NotOnLastQuestion);
        }
        if !quiz.can_advance() {
            return Err(required(quiz));
        }

        let attempt = quiz.clone();
        let request = attempt.answers.to_request();
        tracing::info!(
            attempt_id = %attempt.attempt_id,
            answers = attempt.answers.len(),
            "Submitting quiz answers"
        );
        self.transition(FlowState::Submitting { attempt });
        Ok(request)
    }

    /// Apply the outcome of a submission started with
    /// [`begin_submit`](Self::begin_submit).
    pub fn finish_submit(
        &mut self,
        outcome: Result<QuizResult, ApiError>,
    ) -> Result<(), FlowError> {
        let attempt = match &self.state {
            FlowState::Submitting { attempt } => attempt.clone(),
            _ => return Err(self.invalid("finish submitting")),
        };

        match outcome {
            Ok(result) => {
                tracing::info!(
                    attempt_id = %attempt.attempt_id,
                    recommendations = result.recommendations.len(),
                    "Recommendations received"
                );
                self.transition(FlowState::Result {
                    questions: Arc::clone(&attempt.questions),
                    result,
                });
            }
            Err(e) => {
                tracing::warn!(
                    attempt_id = %attempt.attempt_id,
                    status = ?e.status(),
                    "Submission failed: {}",
                    e
                );
                self.fail(&e, RecoveryAction::ResumeQuiz { attempt });
            }
        }
        Ok(())
    }

    // ── Recovery ────────────────────────────────────────────────────

    /// Start a new attempt on the already loaded questions. Valid only from
    /// `Result`; does not fetch again.
    pub fn restart(&mut self) -> Result<(), FlowError> {
        let questions = match &self.state {
            FlowState::Result { questions, .. } => Arc::clone(questions),
            _ => return Err(self.invalid("restart")),
        };
        self.transition(FlowState::Active(ActiveQuiz::new(questions)));
        Ok(())
    }

    /// Return to the quiz after a failed submission, answers intact.
    pub fn resume(&mut self) -> Result<(), FlowError> {
        let attempt = match &self.state {
            FlowState::Failed {
                recovery: RecoveryAction::ResumeQuiz { attempt },
                ..
            } => attempt.clone(),
            _ => return Err(self.invalid("resume the quiz")),
        };
        self.transition(FlowState::Active(attempt));
        Ok(())
    }

    /// Run whichever recovery action the current failure offers.
    pub async fn recover(&mut self) -> Result<(), FlowError> {
        let resume = match &self.state {
            FlowState::Failed {
                recovery: RecoveryAction::ReloadQuestions,
                ..
            } => false,
            FlowState::Failed {
                recovery: RecoveryAction::ResumeQuiz { .. },
                ..
            } => true,
            _ => return Err(self.invalid("recover")),
        };
        if resume {
            self.resume()
        } else {
            self.retry_load().await
        }
    }

    // ── Internals ───────────────────────────────────────────────────

    fn active_mut(&mut self, intent: &'static str) -> Result<&mut ActiveQuiz, FlowError> {
        let phase = self.phase();
        match &mut self.state {
            FlowState::Active(quiz) => Ok(quiz),
            _ => Err(FlowError::InvalidIntent {
                intent,
                phase: phase.to_string(),
            }),
        }
    }

    fn invalid(&self, intent: &'static str) -> FlowError {
        FlowError::InvalidIntent {
            intent,
            phase: self.phase().to_string(),
        }
    }

    fn fail(&mut self, error: &ApiError, recovery: RecoveryAction) {
        let message = error.user_message();
        // No receivers is fine.
        let _ = self.events.send(FlowEvent::Failed {
            message: message.clone(),
        });
        self.transition(FlowState::Failed { message, recovery });
    }

    fn transition(&mut self, next: FlowState) {
        let from = self.state.phase();
        let to = next.phase();
        debug_assert!(
            from.can_transition_to(to),
            "invalid quiz flow transition {from} -> {to}"
        );

        let attempt_id: Option<Uuid> = match &next {
            FlowState::Active(quiz) => Some(quiz.attempt_id),
            FlowState::Submitting { attempt } => Some(attempt.attempt_id),
            _ => None,
        };

        self.state = next;
        tracing::debug!(%from, %to, "Quiz flow transition");
        let _ = self.events.send(FlowEvent::Transition {
            from,
            to,
            attempt_id,
        });
    }
}

fn required(quiz: &ActiveQuiz) -> FlowError {
    FlowError::AnswerRequired {
        question_id: quiz
            .current_question()
            .map(|q| q.id.clone())
            .unwrap_or_default(),
    }
}

//! Quiz flow state machine: the five phases and the data each one holds.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::answers::AnswerSet;
use super::model::{Question, QuestionSet, QuizResult};

/// The phase of the flow, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPhase {
    Loading,
    Active,
    Submitting,
    Result,
    Failed,
}

impl FlowPhase {
    /// Check if a transition from `self` to `target` is valid.
    ///
    /// `Active → Active` covers answering and navigation.
    pub fn can_transition_to(&self, target: FlowPhase) -> bool {
        use FlowPhase::*;
        matches!(
            (self, target),
            (Loading, Active)
                | (Loading, Failed)
                | (Active, Active)
                | (Active, Submitting)
                | (Submitting, Result)
                | (Submitting, Failed)
                | (Result, Active)
                | (Failed, Loading)
                | (Failed, Active)
        )
    }
}

impl std::fmt::Display for FlowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Loading => "loading",
            Self::Active => "active",
            Self::Submitting => "submitting",
            Self::Result => "result",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// What the user can do to get out of a `Failed` state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RecoveryAction {
    /// Loading the questions failed: fetch them again.
    ReloadQuestions,
    /// Submitting failed: go back to the quiz with the answers kept.
    ResumeQuiz { attempt: ActiveQuiz },
}

/// An attempt in progress: the loaded questions, the position and the answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveQuiz {
    pub attempt_id: Uuid,
    pub questions: Arc<QuestionSet>,
    pub index: usize,
    pub answers: AnswerSet,
}

/// Position within the quiz, for a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// 1-based step (0 when there are no questions).
    pub step: usize,
    pub total: usize,
    /// Rounded percentage of steps reached.
    pub percent: u8,
}

impl ActiveQuiz {
    /// Start a fresh attempt at the first question with no answers.
    pub fn new(questions: Arc<QuestionSet>) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            questions,
            index: 0,
            answers: AnswerSet::new(),
        }
    }

    /// The question at the current index, `None` for an empty quiz.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    pub fn is_first_question(&self) -> bool {
        self.index == 0
    }

    /// An empty quiz counts as sitting on its last question.
    pub fn is_last_question(&self) -> bool {
        self.index + 1 >= self.questions.len()
    }

    /// Whether the current question allows moving forward.
    ///
    /// Vacuously true when there is no current question.
    pub fn can_advance(&self) -> bool {
        match self.current_question() {
            None => true,
            Some(q) if !q.required => true,
            Some(q) => self.answers.is_filled(&q.id),
        }
    }

    /// Move forward one question; no-op on the last one.
    pub fn advance(&mut self) -> bool {
        if self.is_last_question() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Move back one question; no-op on the first one.
    pub fn retreat(&mut self) -> bool {
        if self.is_first_question() {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn progress(&self) -> Progress {
        let total = self.questions.len();
        if total == 0 {
            return Progress {
                step: 0,
                total: 0,
                percent: 100,
            };
        }
        let step = self.index + 1;
        let percent = ((step as f64 / total as f64) * 100.0).round() as u8;
        Progress {
            step,
            total,
            percent,
        }
    }
}

/// The controller's current phase with its payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState {
    #[default]
    Loading,
    Active(ActiveQuiz),
    Submitting {
        attempt: ActiveQuiz,
    },
    Result {
        questions: Arc<QuestionSet>,
        result: QuizResult,
    },
    Failed {
        message: String,
        recovery: RecoveryAction,
    },
}

impl FlowState {
    pub fn phase(&self) -> FlowPhase {
        match self {
            Self::Loading => FlowPhase::Loading,
            Self::Active(_) => FlowPhase::Active,
            Self::Submitting { .. } => FlowPhase::Submitting,
            Self::Result { .. } => FlowPhase::Result,
            Self::Failed { .. } => FlowPhase::Failed,
        }
    }

    pub fn as_active(&self) -> Option<&ActiveQuiz> {
        match self {
            Self::Active(quiz) => Some(quiz),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&QuizResult> {
        match self {
            Self::Result { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Broadcast to subscribers on every phase change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowEvent {
    Transition {
        from: FlowPhase,
        to: FlowPhase,
        #[serde(skip_serializing_if = "Option::is_none")]
        attempt_id: Option<Uuid>,
    },
    Failed {
        message: String,
    },
}

//! Quiz flow: question model, answers, the flow state machine and the
//! controller that drives it.
//!
//! The controller owns a single [`FlowState`]; the presentation layer reads
//! snapshots of it and sends intents back (answer, next, prev, submit,
//! restart, retry).

pub mod answers;
pub mod controller;
pub mod model;
pub mod state;

pub use answers::{Answer, AnswerSet};
pub use controller::QuizController;
pub use model::{Question, QuestionKind, QuestionSet, QuizOption, QuizResult};
pub use state::{ActiveQuiz, FlowEvent, FlowPhase, FlowState, Progress, RecoveryAction};

//! Quiz domain model: questions as loaded and results as received.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::types::{QuestionsResponse, Recommendation, RecommendResponse, WireOption, WireQuestion};
use crate::error::ApiError;

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    MultiChoice,
    FreeText,
}

impl QuestionKind {
    /// Parse the service's `tipo` field.
    pub fn from_wire(tipo: &str) -> Option<Self> {
        match tipo {
            "select" => Some(Self::SingleChoice),
            "multiselect" => Some(Self::MultiChoice),
            "text" => Some(Self::FreeText),
            _ => None,
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultiChoice)
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::SingleChoice => "single_choice",
            Self::MultiChoice => "multi_choice",
            Self::FreeText => "free_text",
        };
        write!(f, "{s}")
    }
}

/// One selectable option of a choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<WireOption> for QuizOption {
    fn from(opt: WireOption) -> Self {
        Self {
            value: opt.valor,
            label: opt.label,
            icon: opt.emoji,
            description: opt.descricao,
        }
    }
}

/// A loaded question. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub kind: QuestionKind,
    pub options: Vec<QuizOption>,
    pub required: bool,
}

impl Question {
    pub fn option(&self, value: &str) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.value == value)
    }
}

impl TryFrom<WireQuestion> for Question {
    type Error = ApiError;

    fn try_from(wire: WireQuestion) -> Result<Self, Self::Error> {
        let kind = QuestionKind::from_wire(&wire.tipo).ok_or_else(|| {
            ApiError::InvalidBody(format!(
                "question '{}' has unknown type '{}'",
                wire.id, wire.tipo
            ))
        })?;

        let options: Vec<QuizOption> = wire
            .opcoes
            .unwrap_or_default()
            .into_iter()
            .map(QuizOption::from)
            .collect();

        if kind.is_choice() && options.is_empty() {
            return Err(ApiError::InvalidBody(format!(
                "choice question '{}' has no options",
                wire.id
            )));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = options.iter().find(|o| !seen.insert(o.value.as_str())) {
            return Err(ApiError::InvalidBody(format!(
                "question '{}' repeats option '{}'",
                wire.id, dup.value
            )));
        }

        Ok(Self {
            id: wire.id,
            prompt: wire.pergunta,
            description: wire.descricao,
            kind,
            options,
            required: wire.obrigatoria,
        })
    }
}

/// The ordered question list plus quiz metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
}

impl QuestionSet {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn find(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

impl TryFrom<QuestionsResponse> for QuestionSet {
    type Error = ApiError;

    fn try_from(resp: QuestionsResponse) -> Result<Self, Self::Error> {
        let questions = resp
            .perguntas
            .into_iter()
            .map(Question::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = HashSet::new();
        if let Some(dup) = questions.iter().find(|q| !seen.insert(q.id.as_str())) {
            return Err(ApiError::InvalidBody(format!(
                "question id '{}' appears more than once",
                dup.id
            )));
        }

        Ok(Self {
            title: resp.titulo,
            description: resp.descricao,
            questions,
        })
    }
}

/// Recommendations received for one submission. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub success: bool,
    pub message: String,
    /// Olfactory profile summary written by the service.
    pub profile: String,
    /// Ranked as returned; index 0 is rank 1.
    pub recommendations: Vec<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_tip: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl QuizResult {
    /// Recommendations paired with their 1-based rank.
    pub fn ranked(&self) -> impl Iterator<Item = (usize, &Recommendation)> {
        self.recommendations.iter().enumerate().map(|(i, r)| (i + 1, r))
    }
}

impl From<RecommendResponse> for QuizResult {
    fn from(resp: RecommendResponse) -> Self {
        Self {
            success: resp.sucesso,
            message: resp.mensagem,
            profile: resp.perfil_usuario,
            recommendations: resp.recomendacoes,
            extra_tip: resp.dica_extra,
            received_at: Utc::now(),
        }
    }
}

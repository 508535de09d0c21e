//! Answers collected during one quiz attempt.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::model::QuestionKind;
use crate::api::types::{ANY_PRICE_RANGE, RecommendRequest};

/// Question ids the recommendation endpoint understands.
pub mod fields {
    pub const GENDER: &str = "genero";
    pub const OCCASION: &str = "ocasiao";
    pub const SEASON: &str = "estacao";
    pub const INTENSITY: &str = "intensidade";
    pub const OLFACTORY_FAMILY: &str = "familia_olfativa";
    pub const PERSONALITY: &str = "personalidade";
    pub const PRICE_RANGE: &str = "faixa_preco";
    pub const PREFERRED_NOTES: &str = "notas_preferidas";
    pub const AVOIDED_NOTES: &str = "notas_evitar";
    pub const NOTES: &str = "observacoes";

    /// Fields the service requires in every submission.
    pub const REQUIRED: [&str; 6] = [
        GENDER,
        OCCASION,
        SEASON,
        INTENSITY,
        OLFACTORY_FAMILY,
        PERSONALITY,
    ];
}

/// One answer, shaped by the kind of question it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    /// Selected option of a single-choice question.
    Choice(String),
    /// Selected options of a multi-choice question, in selection order,
    /// without duplicates.
    Choices(Vec<String>),
    /// Free text.
    Text(String),
}

impl Answer {
    /// Build a multi-choice answer, dropping repeated values.
    pub fn choices<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for v in values {
            let v = v.into();
            if !out.contains(&v) {
                out.push(v);
            }
        }
        Self::Choices(out)
    }

    /// Whether this answer counts as given for a required question.
    pub fn is_filled(&self) -> bool {
        match self {
            Self::Choice(s) | Self::Text(s) => !s.is_empty(),
            Self::Choices(values) => !values.is_empty(),
        }
    }

    /// Whether this answer has the shape `kind` expects.
    pub fn matches_kind(&self, kind: QuestionKind) -> bool {
        matches!(
            (self, kind),
            (Self::Choice(_), QuestionKind::SingleChoice)
                | (Self::Choices(_), QuestionKind::MultiChoice)
                | (Self::Text(_), QuestionKind::FreeText)
        )
    }

    /// Short name of the shape, for diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Choice(_) => "a single choice",
            Self::Choices(_) => "multiple choices",
            Self::Text(_) => "free text",
        }
    }

    /// The string value of a single-choice or free-text answer.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Choice(s) | Self::Text(s) => Some(s),
            Self::Choices(_) => None,
        }
    }

    /// The values of a multi-choice answer.
    pub fn as_values(&self) -> Option<&[String]> {
        match self {
            Self::Choices(values) => Some(values),
            _ => None,
        }
    }

    /// Whether `value` is selected (single or multi choice).
    pub fn is_selected(&self, value: &str) -> bool {
        match self {
            Self::Choice(s) => s == value,
            Self::Choices(values) => values.iter().any(|v| v == value),
            Self::Text(_) => false,
        }
    }
}

/// Mapping from question id to its latest answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet {
    answers: HashMap<String, Answer>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an answer, replacing any earlier one. Returns the replaced answer.
    pub fn record(&mut self, question_id: impl Into<String>, answer: Answer) -> Option<Answer> {
        self.answers.insert(question_id.into(), answer)
    }

    /// Toggle `value` in a multi-choice answer.
    ///
    /// Selecting a value already present removes it; otherwise it is
    /// appended. Any non multi-choice answer for the question is replaced.
    pub fn toggle_choice(&mut self, question_id: &str, value: &str) -> &Answer {
        let entry = self
            .answers
            .entry(question_id.to_string())
            .or_insert_with(|| Answer::Choices(Vec::new()));

        match &mut *entry {
            Answer::Choices(values) => {
                if let Some(pos) = values.iter().position(|v| v == value) {
                    values.remove(pos);
                } else {
                    values.push(value.to_string());
                }
            }
            other => *other = Answer::Choices(vec![value.to_string()]),
        }
        &*entry
    }

    pub fn get(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    /// Whether `question_id` has a non-empty answer.
    pub fn is_filled(&self, question_id: &str) -> bool {
        self.get(question_id).is_some_and(Answer::is_filled)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Answer)> {
        self.answers.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Assemble the submission payload.
    ///
    /// Unanswered or empty fields are left out, except the price range,
    /// which defaults to [`ANY_PRICE_RANGE`]. Answers to ids the endpoint
    /// does not know are dropped.
    pub fn to_request(&self) -> RecommendRequest {
        let text = |id: &str| {
            self.get(id)
                .and_then(Answer::as_str)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        let values = |id: &str| {
            self.get(id)
                .and_then(Answer::as_values)
                .filter(|v| !v.is_empty())
                .map(<[String]>::to_vec)
        };

        for (id, _) in self.iter() {
            if !is_known_field(id) {
                tracing::debug!(question_id = id, "Dropping answer unknown to the endpoint");
            }
        }

        RecommendRequest {
            genero: text(fields::GENDER),
            ocasiao: text(fields::OCCASION),
            estacao: text(fields::SEASON),
            intensidade: text(fields::INTENSITY),
            familia_olfativa: text(fields::OLFACTORY_FAMILY),
            personalidade: text(fields::PERSONALITY),
            faixa_preco: text(fields::PRICE_RANGE).unwrap_or_else(|| ANY_PRICE_RANGE.to_string()),
            notas_preferidas: values(fields::PREFERRED_NOTES),
            notas_evitar: values(fields::AVOIDED_NOTES),
            observacoes: text(fields::NOTES),
        }
    }
}

fn is_known_field(id: &str) -> bool {
    fields::REQUIRED.contains(&id)
        || [
            fields::PRICE_RANGE,
            fields::PREFERRED_NOTES,
            fields::AVOIDED_NOTES,
            fields::NOTES,
        ]
        .contains(&id)
}

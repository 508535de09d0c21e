//! Wire shapes exchanged with the recommendation service.
//!
//! Field names follow the service's JSON exactly.

use serde::{Deserialize, Serialize};

/// Price range sent when the user did not pick one.
pub const ANY_PRICE_RANGE: &str = "qualquer";

/// `GET /quiz/questions` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionsResponse {
    #[serde(default)]
    pub titulo: String,
    #[serde(default)]
    pub descricao: String,
    #[serde(default)]
    pub perguntas: Vec<WireQuestion>,
}

/// A question as sent by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireQuestion {
    pub id: String,
    pub pergunta: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descricao: Option<String>,
    pub tipo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opcoes: Option<Vec<WireOption>>,
    #[serde(default = "default_required")]
    pub obrigatoria: bool,
}

fn default_required() -> bool {
    true
}

/// An option of a choice question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireOption {
    pub valor: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descricao: Option<String>,
}

/// `POST /quiz/recommend` request body.
///
/// Absent answers are omitted from the JSON so the service applies its own
/// validation; only `faixa_preco` has a client-side default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genero: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocasiao: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estacao: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensidade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub familia_olfativa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personalidade: Option<String>,
    pub faixa_preco: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notas_preferidas: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notas_evitar: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacoes: Option<String>,
}

impl Default for RecommendRequest {
    fn default() -> Self {
        Self {
            genero: None,
            ocasiao: None,
            estacao: None,
            intensidade: None,
            familia_olfativa: None,
            personalidade: None,
            faixa_preco: ANY_PRICE_RANGE.to_string(),
            notas_preferidas: None,
            notas_evitar: None,
            observacoes: None,
        }
    }
}

/// A recommended perfume. Opaque to the flow beyond ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub nome: String,
    #[serde(default)]
    pub categoria: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preco: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preco_pix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preco_original: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parcelamento: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descricao: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspiracao: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notas_topo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notas_coracao: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notas_fundo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imagem_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_produto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desconto: Option<String>,
    pub match_score: f64,
    pub motivo_recomendacao: String,
}

impl Recommendation {
    /// Whether the regular price should be shown next to the pix price.
    pub fn shows_regular_price(&self) -> bool {
        match (&self.preco, &self.preco_pix) {
            (Some(preco), Some(pix)) => preco != pix,
            (Some(_), None) => true,
            _ => false,
        }
    }

    /// Whether any layer of the olfactory pyramid is known.
    pub fn has_notes(&self) -> bool {
        self.notas_topo.is_some() || self.notas_coracao.is_some() || self.notas_fundo.is_some()
    }
}

/// Medal shown next to a 1-based rank.
pub fn medal_for_rank(rank: usize) -> &'static str {
    match rank {
        1 => "🥇",
        2 => "🥈",
        3 => "🥉",
        _ => "🎖️",
    }
}

/// `POST /quiz/recommend` success body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendResponse {
    #[serde(default = "default_success")]
    pub sucesso: bool,
    #[serde(default)]
    pub mensagem: String,
    pub perfil_usuario: String,
    pub recomendacoes: Vec<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dica_extra: Option<String>,
}

fn default_success() -> bool {
    true
}

/// `GET /health` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub gemini_configured: bool,
    #[serde(default)]
    pub perfumes_loaded: u64,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

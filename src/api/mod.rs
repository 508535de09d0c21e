//! HTTP client for the remote recommendation service.
//!
//! Every call is a single best-effort round trip: no retries, no timeout,
//! no caching. Non-2xx responses are normalized into an [`ApiError`] that
//! carries one human-readable message.

pub mod types;

pub use types::{
    ANY_PRICE_RANGE, HealthStatus, QuestionsResponse, Recommendation, RecommendRequest,
    RecommendResponse, WireOption, WireQuestion, medal_for_rank,
};

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::config::QuizConfig;
use crate::error::{ApiError, ConfigError};
use crate::quiz::model::{QuestionSet, QuizResult};

/// Operations the quiz flow needs from the recommendation service.
#[async_trait]
pub trait RecommendationApi: Send + Sync {
    /// Fetch the ordered question list and quiz metadata.
    async fn fetch_questions(&self) -> Result<QuestionSet, ApiError>;

    /// Post a completed answer set and receive ranked recommendations.
    async fn submit_answers(&self, answers: &RecommendRequest) -> Result<QuizResult, ApiError>;

    /// Liveness/readiness probe.
    async fn health_check(&self) -> Result<HealthStatus, ApiError>;
}

/// reqwest-backed implementation of [`RecommendationApi`].
pub struct HttpApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &QuizConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("perfume-quiz/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            base_url: config.api_base_url.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    /// Send a request and decode a JSON body, normalizing failures.
    async fn request<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        endpoint: &str,
    ) -> Result<T, ApiError> {
        let resp = request
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(endpoint, "Request could not be sent: {}", e);
                ApiError::Network(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = error_from_response(status.as_u16(), &body);
            tracing::warn!(endpoint, status = status.as_u16(), "Request failed: {}", err);
            return Err(err);
        }

        resp.json::<T>()
            .await
            .map_err(|e| ApiError::InvalidBody(e.to_string()))
    }
}

#[async_trait]
impl RecommendationApi for HttpApiClient {
    async fn fetch_questions(&self) -> Result<QuestionSet, ApiError> {
        let endpoint = "/quiz/questions";
        let response: QuestionsResponse = self
            .request(self.client.get(self.url(endpoint)), endpoint)
            .await?;
        tracing::debug!(questions = response.perguntas.len(), "Fetched quiz questions");
        QuestionSet::try_from(response)
    }

    async fn submit_answers(&self, answers: &RecommendRequest) -> Result<QuizResult, ApiError> {
        let endpoint = "/quiz/recommend";
        let response: RecommendResponse = self
            .request(self.client.post(self.url(endpoint)).json(answers), endpoint)
            .await?;
        tracing::debug!(
            recommendations = response.recomendacoes.len(),
            "Received recommendations"
        );
        Ok(QuizResult::from(response))
    }

    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        let endpoint = "/health";
        self.request(self.client.get(self.url(endpoint)), endpoint)
            .await
    }
}

/// Build the error for a non-2xx response.
///
/// 400 and 422 are validation failures; everything else is a server error.
pub fn error_from_response(status: u16, body: &str) -> ApiError {
    let message = error_message(status, body);
    match status {
        400 | 422 => ApiError::Validation { status, message },
        _ => ApiError::Server { status, message },
    }
}

/// Extract the human-readable message from an error body.
///
/// Looks at `detail` (string), then `erro` (string), then `detail` as a list
/// of validation items with `msg` fields. Falls back to `"Erro <status>"`.
pub fn error_message(status: u16, body: &str) -> String {
    let fallback = || format!("Erro {status}");

    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return fallback();
    };

    if let Some(detail) = non_empty_str(value.get("detail")) {
        return detail;
    }
    if let Some(erro) = non_empty_str(value.get("erro")) {
        return erro;
    }
    if let Some(items) = value.get("detail").and_then(|v| v.as_array()) {
        let messages: Vec<&str> = items
            .iter()
            .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
            .filter(|m| !m.trim().is_empty())
            .collect();
        if !messages.is_empty() {
            return messages.join("; ");
        }
    }

    fallback()
}

fn non_empty_str(value: Option<&serde_json::Value>) -> Option<String> {
    value
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(String::from)
}

//! Error types for the perfume quiz client.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Shown for any request that never got a response.
pub const NETWORK_MESSAGE: &str =
    "Erro de conexão com o servidor. Verifique se a API está em execução.";

/// Errors from a round trip with the recommendation service.
///
/// Every variant carries a message that is safe to show to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response. Holds the transport detail
    /// for logs only.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx status other than a validation failure.
    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    /// The service rejected the submitted answers (400/422).
    #[error("Validation failed ({status}): {message}")]
    Validation { status: u16, message: String },

    /// 2xx response whose body did not match the expected shape.
    #[error("Invalid response body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    /// The human-readable message attached to a `Failed` flow state.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => NETWORK_MESSAGE.to_string(),
            Self::Server { message, .. } | Self::Validation { message, .. } => message.clone(),
            Self::InvalidBody(reason) => format!("Resposta inválida do servidor: {reason}"),
        }
    }

    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } | Self::Validation { status, .. } => Some(*status),
            Self::Network(_) | Self::InvalidBody(_) => None,
        }
    }
}

/// Intents the controller refuses in its current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("Cannot {intent} while {phase}")]
    InvalidIntent {
        intent: &'static str,
        phase: String,
    },

    #[error("Question {question_id} requires an answer")]
    AnswerRequired { question_id: String },

    #[error("Submit is only allowed on the last question")]
    NotOnLastQuestion,

    #[error("Unknown question: {0}")]
    UnknownQuestion(String),

    #[error("Option {value} does not belong to question {question_id}")]
    UnknownOption { question_id: String, value: String },

    #[error("Question {question_id} does not accept {attempted}")]
    KindMismatch {
        question_id: String,
        attempted: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_and_validation_messages_are_verbatim() {
        let err = ApiError::Validation {
            status: 422,
            message: "campo obrigatório".to_string(),
        };
        assert_eq!(err.user_message(), "campo obrigatório");
        assert_eq!(err.status(), Some(422));

        let err = ApiError::Server {
            status: 500,
            message: "Erro 500".to_string(),
        };
        assert_eq!(err.user_message(), "Erro 500");
    }

    #[test]
    fn network_error_has_no_status() {
        let err = ApiError::Network("connection refused".to_string());
        assert_eq!(err.status(), None);
        assert_eq!(err.user_message(), NETWORK_MESSAGE);
        assert!(!err.user_message().contains("connection refused"));
    }
}

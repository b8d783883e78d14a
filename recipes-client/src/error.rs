use recipes_core::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
/// Ошибки клиентской библиотеки `recipes-client`.
pub enum ClientError {
    /// Ошибка HTTP-транспорта (`reqwest`).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Требуется вход (нет токена или сервер его отверг).
    #[error("unauthorized")]
    Unauthorized,

    /// Запрошенный ресурс не найден.
    #[error("not found")]
    NotFound,

    /// Некорректный запрос или ошибка, которую вернул сервер.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Ответ сервера не удалось разобрать.
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Результат операций `recipes-client`.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    pub(crate) fn from_http_status(status: reqwest::StatusCode, message: Option<String>) -> Self {
        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Self::Unauthorized
            }
            reqwest::StatusCode::NOT_FOUND => Self::NotFound,
            _ => {
                let message = message.unwrap_or_else(|| format!("http status {status}"));
                Self::InvalidRequest(message)
            }
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_http_status(status, None);
        }
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        Self::Http(err)
    }
}

impl From<ClientError> for DomainError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Unauthorized => DomainError::Unauthenticated,
            ClientError::NotFound => DomainError::NotFound("remote resource".to_string()),
            other => DomainError::Repository(other.to_string()),
        }
    }
}

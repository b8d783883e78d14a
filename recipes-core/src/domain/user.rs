use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Стабильный идентификатор пользователя, выданный провайдером сессий.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Создаёт идентификатор, отбрасывая пробелы по краям.
    pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        let value = raw.trim();
        if value.is_empty() {
            return Err(DomainError::Validation {
                field: "user_id",
                message: "must not be empty",
            });
        }
        Ok(Self(value.to_string()))
    }

    /// Строковое представление идентификатора.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = DomainError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Требует наличие зрителя для операций, изменяющих данные.
pub(crate) fn require_viewer(viewer: Option<&UserId>) -> Result<&UserId, DomainError> {
    viewer.ok_or(DomainError::Unauthenticated)
}

use thiserror::Error;

/// Ошибки доменного уровня, которые видит вызывающая сторона.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Операция требует авторизованного пользователя.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Запрошенный ресурс отсутствует.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Поле формы не прошло проверку до отправки.
    #[error("validation failed for '{field}': {message}")]
    Validation {
        /// Имя поля.
        field: &'static str,
        /// Описание нарушения.
        message: &'static str,
    },

    /// Пользователь не является владельцем рецепта.
    #[error("forbidden")]
    Forbidden,

    /// Любая ошибка внешнего хранилища.
    #[error("repository error: {0}")]
    Repository(String),
}

impl DomainError {
    pub(crate) fn recipe_not_found(id: i64) -> Self {
        Self::NotFound(format!("recipe id: {id}"))
    }
}

use std::fmt;

use crate::domain::user::UserId;

/// Обработчик смены пользователя. Получает нового пользователя или `None`
/// после выхода.
pub type SessionCallback = Box<dyn Fn(Option<&UserId>) + Send + Sync>;

/// Внешний источник текущего пользователя.
pub trait SessionProvider: Send + Sync {
    /// Текущий пользователь или `None` для анонимного зрителя.
    fn current_user(&self) -> Option<UserId>;

    /// Регистрирует обработчик смены пользователя.
    ///
    /// Обработчик остаётся активным до явного вызова
    /// [`SessionSubscription::cancel`].
    fn on_change(&self, callback: SessionCallback) -> SessionSubscription;
}

/// Подписка на смену пользователя с явной отменой.
pub struct SessionSubscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl SessionSubscription {
    /// Подписка, отмена которой выполняет `cancel`.
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Отписывается от уведомлений.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for SessionSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSubscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

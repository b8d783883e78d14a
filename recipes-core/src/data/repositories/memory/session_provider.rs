use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::data::session_provider::{SessionCallback, SessionProvider, SessionSubscription};
use crate::domain::user::UserId;

type Listener = Arc<dyn Fn(Option<&UserId>) + Send + Sync>;

#[derive(Default)]
struct SessionState {
    current: Option<UserId>,
    next_listener_id: u64,
    listeners: BTreeMap<u64, Listener>,
}

/// Сессия, которая живёт в памяти процесса.
///
/// Подходит для CLI, где пользователь восстанавливается из файла, и для тестов.
#[derive(Clone, Default)]
pub struct InMemorySessionProvider {
    state: Arc<Mutex<SessionState>>,
}

impl InMemorySessionProvider {
    pub fn new(current: Option<UserId>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                current,
                ..SessionState::default()
            })),
        }
    }

    /// Устанавливает пользователя и уведомляет подписчиков.
    pub fn sign_in(&self, user_id: UserId) {
        self.replace(Some(user_id));
    }

    /// Сбрасывает пользователя и уведомляет подписчиков.
    pub fn sign_out(&self) {
        self.replace(None);
    }

    /// Количество активных подписок.
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    fn replace(&self, user_id: Option<UserId>) {
        let listeners: Vec<Listener> = {
            let mut state = self.lock();
            if state.current == user_id {
                return;
            }
            state.current = user_id.clone();
            state.listeners.values().cloned().collect()
        };

        debug!(
            user_id = user_id.as_ref().map(UserId::as_str),
            listeners = listeners.len(),
            "session changed"
        );
        for listener in listeners {
            listener(user_id.as_ref());
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for InMemorySessionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("InMemorySessionProvider")
            .field("current", &state.current)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl SessionProvider for InMemorySessionProvider {
    fn current_user(&self) -> Option<UserId> {
        self.lock().current.clone()
    }

    fn on_change(&self, callback: SessionCallback) -> SessionSubscription {
        let id = {
            let mut state = self.lock();
            let id = state.next_listener_id;
            state.next_listener_id += 1;
            state.listeners.insert(id, Arc::from(callback));
            id
        };

        let state = Arc::downgrade(&self.state);
        SessionSubscription::new(move || {
            if let Some(state) = state.upgrade() {
                state
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .listeners
                    .remove(&id);
            }
        })
    }
}

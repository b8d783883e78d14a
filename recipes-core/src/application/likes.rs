use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::application::scope::ViewScope;
use crate::data::recipe_repository::RecipeRepository;
use crate::domain::error::DomainError;
use crate::domain::user::{UserId, require_viewer};

/// Состояние лайка рецепта глазами конкретного зрителя.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LikeState {
    /// Зритель уже поставил лайк.
    pub liked: bool,
    /// Число лайков рецепта.
    pub count: u64,
}

#[derive(Debug, Clone)]
struct Observed {
    viewer: Option<UserId>,
    epoch: u64,
    state: LikeState,
}

/// Сверяет локальное состояние лайков с хранилищем.
///
/// Хранилище остаётся источником истины. Локально хранится последнее
/// известное состояние для пары (рецепт, зритель), пока открыт экран и не
/// началась новая эпоха [`ViewScope`] (перезагрузка каталога).
/// После переключения счётчик меняется ровно на единицу без повторного
/// запроса; точное значение даёт [`LikeReconciler::refresh`].
pub struct LikeReconciler<R: RecipeRepository> {
    repo: R,
    scope: ViewScope,
    observed: Mutex<HashMap<i64, Observed>>,
}

impl<R: RecipeRepository> LikeReconciler<R> {
    pub fn new(repo: R, scope: ViewScope) -> Self {
        Self {
            repo,
            scope,
            observed: Mutex::new(HashMap::new()),
        }
    }

    /// Точное число лайков рецепта.
    pub async fn get_like_count(&self, recipe_id: i64) -> Result<u64, DomainError> {
        self.repo.count_likes(recipe_id).await
    }

    /// Поставил ли зритель лайк. Для анонимного зрителя запрос не выполняется.
    pub async fn is_liked_by(
        &self,
        recipe_id: i64,
        viewer: Option<&UserId>,
    ) -> Result<bool, DomainError> {
        match viewer {
            Some(viewer) => self.repo.has_like(recipe_id, viewer).await,
            None => Ok(false),
        }
    }

    /// Перечитывает число лайков и отметку зрителя из хранилища.
    pub async fn refresh(
        &self,
        recipe_id: i64,
        viewer: Option<&UserId>,
    ) -> Result<LikeState, DomainError> {
        let epoch = self.scope.epoch();
        let count = self.get_like_count(recipe_id).await?;
        let liked = self.is_liked_by(recipe_id, viewer).await?;
        let state = LikeState { liked, count };
        self.remember(recipe_id, viewer, epoch, state);
        Ok(state)
    }

    /// Переключает лайк зрителя.
    ///
    /// Без зрителя возвращает [`DomainError::Unauthenticated`] и ничего не
    /// меняет. При ошибке записи локальное состояние остаётся прежним.
    pub async fn toggle_like(
        &self,
        recipe_id: i64,
        viewer: Option<&UserId>,
    ) -> Result<LikeState, DomainError> {
        let viewer = require_viewer(viewer).inspect_err(|_| {
            debug!(recipe_id, "like toggle rejected for anonymous viewer");
        })?;

        let epoch = self.scope.epoch();
        let prior = match self.local_state(recipe_id, Some(viewer)) {
            Some(state) => state,
            None => self.refresh(recipe_id, Some(viewer)).await?,
        };

        let write = if prior.liked {
            self.repo.remove_like(recipe_id, viewer).await
        } else {
            self.repo.add_like(recipe_id, viewer).await
        };
        if let Err(err) = write {
            warn!(recipe_id, user_id = %viewer, error = %err, "like toggle failed");
            return Err(err);
        }

        let next = if prior.liked {
            LikeState {
                liked: false,
                count: prior.count.saturating_sub(1),
            }
        } else {
            LikeState {
                liked: true,
                count: prior.count + 1,
            }
        };
        debug!(recipe_id, user_id = %viewer, liked = next.liked, count = next.count, "like toggled");
        self.remember(recipe_id, Some(viewer), epoch, next);
        Ok(next)
    }

    /// Последнее известное состояние для пары (рецепт, зритель) в текущей
    /// эпохе.
    pub fn local_state(&self, recipe_id: i64, viewer: Option<&UserId>) -> Option<LikeState> {
        let epoch = self.scope.epoch();
        self.lock()
            .get(&recipe_id)
            .filter(|observed| observed.epoch == epoch && observed.viewer.as_ref() == viewer)
            .map(|observed| observed.state)
    }

    fn remember(&self, recipe_id: i64, viewer: Option<&UserId>, epoch: u64, state: LikeState) {
        if !self.scope.is_active() {
            debug!(recipe_id, "view closed, like state discarded");
            return;
        }
        if self.scope.epoch() != epoch {
            debug!(recipe_id, epoch, "view reloaded, like state discarded");
            return;
        }
        self.lock().insert(
            recipe_id,
            Observed {
                viewer: viewer.cloned(),
                epoch,
                state,
            },
        );
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i64, Observed>> {
        self.observed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

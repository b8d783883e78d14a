use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, info, warn};

use crate::application::filter::filter_recipes;
use crate::application::scope::ViewScope;
use crate::data::recipe_repository::RecipeRepository;
use crate::data::session_provider::{SessionProvider, SessionSubscription};
use crate::domain::criteria::{CriteriaUpdate, FilterCriteria};
use crate::domain::error::DomainError;
use crate::domain::recipe::Recipe;
use crate::domain::user::UserId;

/// Этап загрузки каталога.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    LoadFailed,
}

#[derive(Debug, Default)]
struct CatalogState {
    recipes: Vec<Recipe>,
    visible: Vec<Recipe>,
    criteria: FilterCriteria,
    viewer: Option<UserId>,
    load_state: LoadState,
    last_error: Option<DomainError>,
    generation: u64,
}

impl CatalogState {
    fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.load_state = LoadState::Loading;
        self.last_error = None;
        self.generation
    }

    fn recompute(&mut self) {
        self.visible = filter_recipes(&self.recipes, &self.criteria);
    }
}

/// Состояние главной страницы каталога: загруженные рецепты, условия
/// фильтрации и текущий зритель.
///
/// Ошибки хранилища не пробрасываются наружу, а сохраняются в
/// [`CatalogViewModel::last_error`].
pub struct CatalogViewModel<R: RecipeRepository> {
    repo: R,
    state: Arc<Mutex<CatalogState>>,
    scope: ViewScope,
    subscription: Mutex<Option<SessionSubscription>>,
}

impl<R: RecipeRepository> CatalogViewModel<R> {
    /// Создаёт модель и подписывается на смену пользователя.
    pub fn new(repo: R, session: &dyn SessionProvider) -> Self {
        let state = Arc::new(Mutex::new(CatalogState {
            viewer: session.current_user(),
            ..CatalogState::default()
        }));
        let scope = ViewScope::new();

        let subscription = session.on_change(Box::new({
            let state: Weak<Mutex<CatalogState>> = Arc::downgrade(&state);
            let scope = scope.clone();
            move |viewer: Option<&UserId>| {
                if !scope.is_active() {
                    return;
                }
                if let Some(state) = state.upgrade() {
                    debug!(user_id = viewer.map(UserId::as_str), "catalog viewer changed");
                    state.lock().unwrap_or_else(PoisonError::into_inner).viewer = viewer.cloned();
                }
            }
        }));

        Self {
            repo,
            state,
            scope,
            subscription: Mutex::new(Some(subscription)),
        }
    }

    /// Загружает каталог, если он ещё не загружен и не загружается.
    pub async fn load(&self) {
        let generation = {
            let mut state = self.lock();
            if matches!(state.load_state, LoadState::Loading | LoadState::Loaded) {
                return;
            }
            state.begin_load()
        };
        self.fetch(generation).await;
    }

    /// Загружает каталог заново. Результат незавершённой загрузки
    /// будет отброшен, а локальные состояния лайков пересчитаются из
    /// хранилища.
    pub async fn reload(&self) {
        let generation = self.lock().begin_load();
        self.fetch(generation).await;
    }

    async fn fetch(&self, generation: u64) {
        self.scope.advance();
        if !self.scope.is_active() {
            self.abandon(generation);
            return;
        }
        let result = self.repo.list_recipes().await;

        if !self.scope.is_active() {
            debug!(generation, "catalog torn down, load result discarded");
            self.abandon(generation);
            return;
        }
        let mut state = self.lock();
        if state.generation != generation {
            debug!(generation, current = state.generation, "stale catalog load discarded");
            return;
        }

        match result {
            Ok(recipes) => {
                info!(count = recipes.len(), "catalog loaded");
                state.recipes = recipes;
                state.load_state = LoadState::Loaded;
            }
            Err(err) => {
                warn!(error = %err, "catalog load failed");
                state.recipes.clear();
                state.load_state = LoadState::LoadFailed;
                state.last_error = Some(err);
            }
        }
        state.recompute();
    }

    /// Отброшенная загрузка возвращает закрытый экран в `Idle`.
    fn abandon(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation == generation && state.load_state == LoadState::Loading {
            state.load_state = LoadState::Idle;
        }
    }

    /// Вливает изменение условий и пересчитывает видимые рецепты.
    pub fn set_criteria(&self, update: CriteriaUpdate) {
        let mut state = self.lock();
        state.criteria.merge(update);
        state.recompute();
    }

    /// Рецепты, прошедшие фильтр, в порядке загрузки.
    pub fn visible_recipes(&self) -> Vec<Recipe> {
        self.lock().visible.clone()
    }

    pub fn result_count(&self) -> usize {
        self.lock().visible.len()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().load_state == LoadState::Loading
    }

    pub fn last_error(&self) -> Option<DomainError> {
        self.lock().last_error.clone()
    }

    pub fn load_state(&self) -> LoadState {
        self.lock().load_state
    }

    pub fn viewer(&self) -> Option<UserId> {
        self.lock().viewer.clone()
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.lock().criteria.clone()
    }

    /// Область жизни экрана, общая с [`crate::application::likes::LikeReconciler`].
    pub fn scope(&self) -> ViewScope {
        self.scope.clone()
    }

    /// Закрывает экран: отменяет подписку на сессию и отбрасывает
    /// незавершённые результаты.
    pub fn tear_down(&self) {
        self.scope.close();
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = subscription {
            subscription.cancel();
        }
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{CatalogViewModel, LoadState};
    use crate::application::likes::{LikeReconciler, LikeState};
    use crate::application::testing::{FlakyRepository, sample_recipe, user};
    use crate::data::recipe_repository::RecipeRepository;
    use crate::data::repositories::memory::InMemorySessionProvider;
    use crate::domain::criteria::CriteriaUpdate;
    use crate::domain::error::DomainError;
    use crate::domain::facet::{Cuisine, Facet};

    fn ids(view: &CatalogViewModel<FlakyRepository>) -> Vec<i64> {
        view.visible_recipes().iter().map(|recipe| recipe.id).collect()
    }

    fn seeded() -> FlakyRepository {
        let mut ratatouille = sample_recipe(2, "Ratatouille", "u2");
        ratatouille.cuisine = Some(Cuisine::French);
        FlakyRepository::with_recipes(vec![sample_recipe(1, "Pasta Carbonara", "u1"), ratatouille])
    }

    #[tokio::test]
    async fn load_shows_newest_first() {
        let session = InMemorySessionProvider::default();
        let view = CatalogViewModel::new(seeded(), &session);
        assert_eq!(view.load_state(), LoadState::Idle);

        view.load().await;

        assert_eq!(view.load_state(), LoadState::Loaded);
        assert!(!view.is_loading());
        assert_eq!(ids(&view), vec![2, 1]);
        assert_eq!(view.result_count(), 2);
        assert_eq!(view.last_error(), None);
    }

    #[tokio::test]
    async fn failed_load_empties_list_and_can_be_retried() {
        let repo = seeded();
        let session = InMemorySessionProvider::default();
        let view = CatalogViewModel::new(repo.clone(), &session);

        view.load().await;
        repo.fail_reads(true);
        view.reload().await;

        assert_eq!(view.load_state(), LoadState::LoadFailed);
        assert!(view.visible_recipes().is_empty());
        assert!(matches!(view.last_error(), Some(DomainError::Repository(_))));

        repo.fail_reads(false);
        view.load().await;
        assert_eq!(view.load_state(), LoadState::Loaded);
        assert_eq!(view.result_count(), 2);
        assert_eq!(view.last_error(), None);
    }

    #[tokio::test]
    async fn load_does_not_refetch_loaded_catalog() {
        let repo = seeded();
        let session = InMemorySessionProvider::default();
        let view = CatalogViewModel::new(repo.clone(), &session);

        view.load().await;
        repo.inner.insert(sample_recipe(3, "Tiramisu", "u1"));
        view.load().await;
        assert_eq!(view.result_count(), 2);

        view.reload().await;
        assert_eq!(ids(&view), vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn criteria_changes_recompute_without_reload() {
        let session = InMemorySessionProvider::default();
        let view = CatalogViewModel::new(seeded(), &session);
        view.load().await;

        view.set_criteria(CriteriaUpdate {
            cuisine: Some(Facet::Only(Cuisine::French)),
            ..CriteriaUpdate::default()
        });
        assert_eq!(ids(&view), vec![2]);
        assert_eq!(view.load_state(), LoadState::Loaded);

        view.set_criteria(CriteriaUpdate {
            query: Some("pasta".to_string()),
            ..CriteriaUpdate::default()
        });
        assert!(view.visible_recipes().is_empty());

        view.set_criteria(CriteriaUpdate {
            cuisine: Some(Facet::All),
            ..CriteriaUpdate::default()
        });
        assert_eq!(ids(&view), vec![1]);
        assert_eq!(view.criteria().query, "pasta");
    }

    #[tokio::test]
    async fn viewer_follows_session_until_tear_down() {
        let session = InMemorySessionProvider::default();
        let view = CatalogViewModel::new(seeded(), &session);
        assert_eq!(view.viewer(), None);

        session.sign_in(user("u1"));
        assert_eq!(view.viewer(), Some(user("u1")));

        view.tear_down();
        assert_eq!(session.listener_count(), 0);
        session.sign_out();
        assert_eq!(view.viewer(), Some(user("u1")));
    }

    #[tokio::test]
    async fn torn_down_view_discards_in_flight_load() {
        let repo = seeded();
        let gate = repo.pause_next_list();
        let session = InMemorySessionProvider::default();
        let view = Arc::new(CatalogViewModel::new(repo, &session));

        let task = tokio::spawn({
            let view = view.clone();
            async move { view.load().await }
        });
        gate.wait_entered().await;
        view.tear_down();
        gate.release();
        task.await.expect("load task must finish");

        assert_eq!(view.load_state(), LoadState::Idle);
        assert!(!view.is_loading());
        assert!(view.visible_recipes().is_empty());
        assert!(!view.scope().is_active());
    }

    #[tokio::test]
    async fn like_counts_are_rederived_after_reload() {
        let repo = seeded();
        let session = InMemorySessionProvider::new(Some(user("u1")));
        let view = CatalogViewModel::new(repo.clone(), &session);
        view.load().await;

        let likes = LikeReconciler::new(repo.clone(), view.scope());
        let viewer = view.viewer();
        let before = likes.refresh(1, viewer.as_ref()).await.expect("refresh");
        assert_eq!(before.count, 0);

        repo.add_like(1, &user("u2")).await.expect("like from another viewer");
        view.reload().await;
        assert_eq!(likes.local_state(1, viewer.as_ref()), None);

        let state = likes
            .toggle_like(1, viewer.as_ref())
            .await
            .expect("toggle must succeed");
        assert_eq!(state, LikeState { liked: true, count: 2 });
        assert_eq!(repo.count_likes(1).await.expect("count"), 2);
    }

    #[tokio::test]
    async fn reload_supersedes_in_flight_load() {
        let repo = FlakyRepository::with_recipes(vec![sample_recipe(1, "Pasta", "u1")]);
        let gate = repo.pause_next_list();
        let session = InMemorySessionProvider::default();
        let view = Arc::new(CatalogViewModel::new(repo.clone(), &session));

        let first = tokio::spawn({
            let view = view.clone();
            async move { view.load().await }
        });
        gate.wait_entered().await;

        repo.inner.insert(sample_recipe(2, "Ratatouille", "u2"));
        view.reload().await;
        assert_eq!(ids(&view), vec![2, 1]);

        gate.release();
        first.await.expect("first load must finish");
        assert_eq!(ids(&view), vec![2, 1]);
        assert_eq!(view.load_state(), LoadState::Loaded);
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use tokio::sync::Notify;

use crate::data::recipe_repository::{NewRecipe, RecipeRepository};
use crate::data::repositories::memory::InMemoryRecipeRepository;
use crate::domain::error::DomainError;
use crate::domain::recipe::{Recipe, RecipeDraft, RecipeFields};
use crate::domain::user::UserId;

pub(crate) fn user(raw: &str) -> UserId {
    UserId::new(raw).expect("valid user id")
}

/// Рецепт с настройками формы по умолчанию; чем больше id, тем он новее.
pub(crate) fn sample_recipe(id: i64, title: &str, owner: &str) -> Recipe {
    let fields = sample_fields(title);
    let created_at = Utc
        .with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
        + Duration::minutes(id);
    Recipe::from_fields(id, user(owner), created_at, fields)
}

pub(crate) fn sample_fields(title: &str) -> RecipeFields {
    RecipeDraft {
        title: title.to_string(),
        ..RecipeDraft::default()
    }
    .validate()
    .expect("sample draft must be valid")
}

/// Однократная пауза внутри `list_recipes`, чтобы тест успел закрыть экран
/// или запустить повторную загрузку.
#[derive(Default)]
pub(crate) struct ListGate {
    entered: Notify,
    release: Notify,
}

impl ListGate {
    pub(crate) async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub(crate) fn release(&self) {
        self.release.notify_one();
    }
}

/// Хранилище в памяти, в котором можно включать отказы и считать вызовы.
#[derive(Clone, Default)]
pub(crate) struct FlakyRepository {
    pub(crate) inner: InMemoryRecipeRepository,
    fail_reads: Arc<Mutex<bool>>,
    fail_writes: Arc<Mutex<bool>>,
    gate: Arc<Mutex<Option<Arc<ListGate>>>>,
    like_queries: Arc<AtomicUsize>,
}

impl FlakyRepository {
    pub(crate) fn with_recipes(recipes: Vec<Recipe>) -> Self {
        let repo = Self::default();
        for recipe in recipes {
            repo.inner.insert(recipe);
        }
        repo
    }

    pub(crate) fn fail_reads(&self, fail: bool) {
        *self.fail_reads.lock().expect("fail_reads mutex poisoned") = fail;
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().expect("fail_writes mutex poisoned") = fail;
    }

    pub(crate) fn pause_next_list(&self) -> Arc<ListGate> {
        let gate = Arc::new(ListGate::default());
        *self.gate.lock().expect("gate mutex poisoned") = Some(gate.clone());
        gate
    }

    /// Количество запросов `count_likes` и `has_like`.
    pub(crate) fn like_queries(&self) -> usize {
        self.like_queries.load(Ordering::SeqCst)
    }

    fn check_read(&self) -> Result<(), DomainError> {
        if *self.fail_reads.lock().expect("fail_reads mutex poisoned") {
            return Err(DomainError::Repository("read failed".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), DomainError> {
        if *self.fail_writes.lock().expect("fail_writes mutex poisoned") {
            return Err(DomainError::Repository("write failed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecipeRepository for FlakyRepository {
    async fn list_recipes(&self) -> Result<Vec<Recipe>, DomainError> {
        let result = match self.check_read() {
            Ok(()) => self.inner.list_recipes().await,
            Err(err) => Err(err),
        };
        let gate = self.gate.lock().expect("gate mutex poisoned").take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        result
    }

    async fn list_recipes_by_owner(&self, owner_id: &UserId) -> Result<Vec<Recipe>, DomainError> {
        self.check_read()?;
        self.inner.list_recipes_by_owner(owner_id).await
    }

    async fn list_liked_recipes(&self, user_id: &UserId) -> Result<Vec<Recipe>, DomainError> {
        self.check_read()?;
        self.inner.list_liked_recipes(user_id).await
    }

    async fn get_recipe(&self, id: i64) -> Result<Option<Recipe>, DomainError> {
        self.check_read()?;
        self.inner.get_recipe(id).await
    }

    async fn create_recipe(&self, input: NewRecipe) -> Result<i64, DomainError> {
        self.check_write()?;
        self.inner.create_recipe(input).await
    }

    async fn update_recipe(&self, id: i64, fields: RecipeFields) -> Result<bool, DomainError> {
        self.check_write()?;
        self.inner.update_recipe(id, fields).await
    }

    async fn delete_recipe(&self, id: i64) -> Result<bool, DomainError> {
        self.check_write()?;
        self.inner.delete_recipe(id).await
    }

    async fn count_likes(&self, recipe_id: i64) -> Result<u64, DomainError> {
        self.like_queries.fetch_add(1, Ordering::SeqCst);
        self.check_read()?;
        self.inner.count_likes(recipe_id).await
    }

    async fn has_like(&self, recipe_id: i64, user_id: &UserId) -> Result<bool, DomainError> {
        self.like_queries.fetch_add(1, Ordering::SeqCst);
        self.check_read()?;
        self.inner.has_like(recipe_id, user_id).await
    }

    async fn add_like(&self, recipe_id: i64, user_id: &UserId) -> Result<(), DomainError> {
        self.check_write()?;
        self.inner.add_like(recipe_id, user_id).await
    }

    async fn remove_like(&self, recipe_id: i64, user_id: &UserId) -> Result<(), DomainError> {
        self.check_write()?;
        self.inner.remove_like(recipe_id, user_id).await
    }
}

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::data::recipe_repository::{NewRecipe, RecipeRepository};
use crate::domain::error::DomainError;
use crate::domain::recipe::{Recipe, RecipeFields};
use crate::domain::user::UserId;

#[derive(Debug, Default)]
struct Store {
    recipes: Vec<Recipe>,
    likes: BTreeSet<(i64, UserId)>,
    next_id: i64,
}

impl Store {
    fn sorted(&self, mut keep: impl FnMut(&Recipe) -> bool) -> Vec<Recipe> {
        let mut recipes: Vec<Recipe> = self
            .recipes
            .iter()
            .filter(|recipe| keep(recipe))
            .cloned()
            .collect();
        recipes.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        recipes
    }
}

/// Хранилище рецептов в памяти процесса.
///
/// Повторяет контракт внешнего хранилища: порядок выдачи, уникальность лайка
/// для пары (рецепт, пользователь), удаление лайков вместе с рецептом.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecipeRepository {
    store: Arc<Mutex<Store>>,
}

impl InMemoryRecipeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Кладёт готовый рецепт как есть, сохраняя его идентификатор и дату.
    pub fn insert(&self, recipe: Recipe) {
        let mut store = self.lock();
        store.next_id = store.next_id.max(recipe.id);
        store.recipes.retain(|existing| existing.id != recipe.id);
        store.recipes.push(recipe);
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RecipeRepository for InMemoryRecipeRepository {
    async fn list_recipes(&self) -> Result<Vec<Recipe>, DomainError> {
        Ok(self.lock().sorted(|_| true))
    }

    async fn list_recipes_by_owner(&self, owner_id: &UserId) -> Result<Vec<Recipe>, DomainError> {
        Ok(self.lock().sorted(|recipe| recipe.owner_id == *owner_id))
    }

    async fn list_liked_recipes(&self, user_id: &UserId) -> Result<Vec<Recipe>, DomainError> {
        let store = self.lock();
        let liked: BTreeSet<i64> = store
            .likes
            .iter()
            .filter(|(_, liker)| liker == user_id)
            .map(|(recipe_id, _)| *recipe_id)
            .collect();
        Ok(store.sorted(|recipe| liked.contains(&recipe.id)))
    }

    async fn get_recipe(&self, id: i64) -> Result<Option<Recipe>, DomainError> {
        Ok(self
            .lock()
            .recipes
            .iter()
            .find(|recipe| recipe.id == id)
            .cloned())
    }

    async fn create_recipe(&self, input: NewRecipe) -> Result<i64, DomainError> {
        let mut store = self.lock();
        store.next_id += 1;
        let id = store.next_id;
        store
            .recipes
            .push(Recipe::from_fields(id, input.owner_id, Utc::now(), input.fields));
        Ok(id)
    }

    async fn update_recipe(&self, id: i64, fields: RecipeFields) -> Result<bool, DomainError> {
        let mut store = self.lock();
        match store.recipes.iter_mut().find(|recipe| recipe.id == id) {
            Some(recipe) => {
                recipe.apply(fields);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_recipe(&self, id: i64) -> Result<bool, DomainError> {
        let mut store = self.lock();
        let before = store.recipes.len();
        store.recipes.retain(|recipe| recipe.id != id);
        if store.recipes.len() == before {
            return Ok(false);
        }
        store.likes.retain(|(recipe_id, _)| *recipe_id != id);
        Ok(true)
    }

    async fn count_likes(&self, recipe_id: i64) -> Result<u64, DomainError> {
        let count = self
            .lock()
            .likes
            .iter()
            .filter(|(liked_id, _)| *liked_id == recipe_id)
            .count();
        Ok(count as u64)
    }

    async fn has_like(&self, recipe_id: i64, user_id: &UserId) -> Result<bool, DomainError> {
        Ok(self.lock().likes.contains(&(recipe_id, user_id.clone())))
    }

    async fn add_like(&self, recipe_id: i64, user_id: &UserId) -> Result<(), DomainError> {
        let mut store = self.lock();
        if !store.recipes.iter().any(|recipe| recipe.id == recipe_id) {
            return Err(DomainError::recipe_not_found(recipe_id));
        }
        if !store.likes.insert((recipe_id, user_id.clone())) {
            return Err(DomainError::Repository(format!(
                "like already exists for recipe {recipe_id}"
            )));
        }
        Ok(())
    }

    async fn remove_like(&self, recipe_id: i64, user_id: &UserId) -> Result<(), DomainError> {
        self.lock().likes.remove(&(recipe_id, user_id.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::InMemoryRecipeRepository;
    use crate::data::recipe_repository::{NewRecipe, RecipeRepository};
    use crate::domain::recipe::{Recipe, RecipeDraft};
    use crate::domain::user::UserId;

    fn user(raw: &str) -> UserId {
        UserId::new(raw).expect("valid user id")
    }

    fn recipe(id: i64, title: &str, owner: &str, age_minutes: i64) -> Recipe {
        let fields = RecipeDraft {
            title: title.to_string(),
            ..RecipeDraft::default()
        }
        .validate()
        .expect("valid draft");
        Recipe::from_fields(
            id,
            user(owner),
            Utc::now() - Duration::minutes(age_minutes),
            fields,
        )
    }

    #[tokio::test]
    async fn list_recipes_returns_newest_first() {
        let repo = InMemoryRecipeRepository::new();
        repo.insert(recipe(1, "old", "u1", 30));
        repo.insert(recipe(2, "new", "u2", 1));
        repo.insert(recipe(3, "middle", "u1", 10));

        let ids: Vec<i64> = repo
            .list_recipes()
            .await
            .expect("list must succeed")
            .iter()
            .map(|recipe| recipe.id)
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);

        let owned = repo
            .list_recipes_by_owner(&user("u1"))
            .await
            .expect("list must succeed");
        assert_eq!(owned.len(), 2);
    }

    #[tokio::test]
    async fn create_recipe_assigns_fresh_ids_after_seeded_rows() {
        let repo = InMemoryRecipeRepository::new();
        repo.insert(recipe(10, "seeded", "u1", 5));

        let fields = RecipeDraft {
            title: "new".to_string(),
            ..RecipeDraft::default()
        }
        .validate()
        .expect("valid draft");
        let id = repo
            .create_recipe(NewRecipe {
                owner_id: user("u2"),
                fields,
            })
            .await
            .expect("create must succeed");

        assert_eq!(id, 11);
        let created = repo
            .get_recipe(id)
            .await
            .expect("get must succeed")
            .expect("recipe must exist");
        assert_eq!(created.owner_id, user("u2"));
    }

    #[tokio::test]
    async fn like_pair_is_unique_and_removed_with_recipe() {
        let repo = InMemoryRecipeRepository::new();
        repo.insert(recipe(1, "pasta", "u1", 1));

        repo.add_like(1, &user("u2")).await.expect("like must succeed");
        assert!(repo.add_like(1, &user("u2")).await.is_err());
        assert_eq!(repo.count_likes(1).await.expect("count"), 1);

        let liked = repo
            .list_liked_recipes(&user("u2"))
            .await
            .expect("list must succeed");
        assert_eq!(liked.len(), 1);

        assert!(repo.delete_recipe(1).await.expect("delete must succeed"));
        assert_eq!(repo.count_likes(1).await.expect("count"), 0);
        assert!(!repo.delete_recipe(1).await.expect("delete must succeed"));
    }
}

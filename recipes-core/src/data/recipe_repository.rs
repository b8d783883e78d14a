use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::recipe::{Recipe, RecipeFields};
use crate::domain::user::UserId;

/// Новый рецепт для записи в хранилище.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    /// Создатель, фиксируется один раз.
    pub owner_id: UserId,
    /// Проверенное содержимое.
    pub fields: RecipeFields,
}

/// Внешнее хранилище рецептов и лайков.
///
/// Хранилище является источником истины: ядро не кэширует записи дольше
/// одного экрана.
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// Все рецепты, новые первыми.
    async fn list_recipes(&self) -> Result<Vec<Recipe>, DomainError>;
    /// Рецепты владельца, новые первыми.
    async fn list_recipes_by_owner(&self, owner_id: &UserId) -> Result<Vec<Recipe>, DomainError>;
    /// Рецепты, которые понравились пользователю.
    async fn list_liked_recipes(&self, user_id: &UserId) -> Result<Vec<Recipe>, DomainError>;
    async fn get_recipe(&self, id: i64) -> Result<Option<Recipe>, DomainError>;
    /// Возвращает идентификатор, назначенный хранилищем.
    async fn create_recipe(&self, input: NewRecipe) -> Result<i64, DomainError>;
    /// `false`, если рецепт не найден.
    async fn update_recipe(&self, id: i64, fields: RecipeFields) -> Result<bool, DomainError>;
    /// `false`, если рецепт не найден.
    async fn delete_recipe(&self, id: i64) -> Result<bool, DomainError>;
    async fn count_likes(&self, recipe_id: i64) -> Result<u64, DomainError>;
    async fn has_like(&self, recipe_id: i64, user_id: &UserId) -> Result<bool, DomainError>;
    async fn add_like(&self, recipe_id: i64, user_id: &UserId) -> Result<(), DomainError>;
    async fn remove_like(&self, recipe_id: i64, user_id: &UserId) -> Result<(), DomainError>;
}

use crate::data::recipe_repository::RecipeRepository;
use crate::domain::error::DomainError;
use crate::domain::recipe::Recipe;
use crate::domain::user::{UserId, require_viewer};

/// Счётчики для шапки профиля.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileSummary {
    pub own_recipes: usize,
    pub liked_recipes: usize,
}

/// Данные страницы профиля текущего пользователя.
pub struct ProfileService<R: RecipeRepository> {
    repo: R,
}

impl<R: RecipeRepository> ProfileService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Рецепты зрителя, новые первыми.
    pub async fn my_recipes(&self, viewer: Option<&UserId>) -> Result<Vec<Recipe>, DomainError> {
        let viewer = require_viewer(viewer)?;
        self.repo.list_recipes_by_owner(viewer).await
    }

    pub async fn liked_recipes(&self, viewer: Option<&UserId>) -> Result<Vec<Recipe>, DomainError> {
        let viewer = require_viewer(viewer)?;
        self.repo.list_liked_recipes(viewer).await
    }

    pub async fn summary(&self, viewer: Option<&UserId>) -> Result<ProfileSummary, DomainError> {
        let own_recipes = self.my_recipes(viewer).await?.len();
        let liked_recipes = self.liked_recipes(viewer).await?.len();
        Ok(ProfileSummary {
            own_recipes,
            liked_recipes,
        })
    }
}

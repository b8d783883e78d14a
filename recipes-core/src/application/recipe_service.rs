use tracing::info;

use crate::data::recipe_repository::{NewRecipe, RecipeRepository};
use crate::domain::error::DomainError;
use crate::domain::recipe::{Recipe, RecipeDraft};
use crate::domain::user::{UserId, require_viewer};

/// Операции над отдельным рецептом: создание, просмотр, правка, удаление.
pub struct RecipeService<R: RecipeRepository> {
    repo: R,
}

impl<R: RecipeRepository> RecipeService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn create_recipe(
        &self,
        viewer: Option<&UserId>,
        draft: RecipeDraft,
    ) -> Result<i64, DomainError> {
        let owner_id = require_viewer(viewer)?.clone();
        let fields = draft.validate()?;

        let id = self.repo.create_recipe(NewRecipe { owner_id, fields }).await?;
        info!(recipe_id = id, "recipe created");
        Ok(id)
    }

    pub async fn get_recipe(&self, id: i64) -> Result<Recipe, DomainError> {
        self.repo
            .get_recipe(id)
            .await?
            .ok_or_else(|| DomainError::recipe_not_found(id))
    }

    /// Сохраняет правку. Владелец и дата создания остаются прежними.
    pub async fn update_recipe(
        &self,
        viewer: Option<&UserId>,
        id: i64,
        draft: RecipeDraft,
    ) -> Result<Recipe, DomainError> {
        let original = self.owned_recipe(viewer, id).await?;
        let fields = draft.validate()?;

        if !self.repo.update_recipe(id, fields.clone()).await? {
            return Err(DomainError::recipe_not_found(id));
        }
        info!(recipe_id = id, "recipe updated");

        let mut updated = original;
        updated.apply(fields);
        Ok(updated)
    }

    pub async fn delete_recipe(&self, viewer: Option<&UserId>, id: i64) -> Result<(), DomainError> {
        self.owned_recipe(viewer, id).await?;

        if !self.repo.delete_recipe(id).await? {
            return Err(DomainError::recipe_not_found(id));
        }
        info!(recipe_id = id, "recipe deleted");
        Ok(())
    }

    /// Можно ли показывать зрителю действия правки и удаления.
    pub fn is_owner(recipe: &Recipe, viewer: Option<&UserId>) -> bool {
        recipe.is_owned_by(viewer)
    }

    async fn owned_recipe(&self, viewer: Option<&UserId>, id: i64) -> Result<Recipe, DomainError> {
        let viewer = require_viewer(viewer)?;
        let recipe = self.get_recipe(id).await?;
        if !recipe.is_owned_by(Some(viewer)) {
            return Err(DomainError::Forbidden);
        }
        Ok(recipe)
    }
}

//! Ядро каталога рецептов: фильтрация, лайки и состояние главной страницы.
//!
//! Хранилище и сессия подключаются через [`data::recipe_repository::RecipeRepository`]
//! и [`data::session_provider::SessionProvider`].

pub mod application;
pub mod data;
pub mod domain;

pub use application::catalog::{CatalogViewModel, LoadState};
pub use application::filter::filter_recipes;
pub use application::likes::{LikeReconciler, LikeState};
pub use application::profile_service::{ProfileService, ProfileSummary};
pub use application::recipe_service::RecipeService;
pub use application::scope::ViewScope;
pub use data::recipe_repository::{NewRecipe, RecipeRepository};
pub use data::session_provider::{SessionCallback, SessionProvider, SessionSubscription};
pub use domain::criteria::{CriteriaUpdate, FilterCriteria};
pub use domain::error::DomainError;
pub use domain::facet::{Complexity, Cuisine, DishType, Facet, FacetValue};
pub use domain::recipe::{Ingredient, Recipe, RecipeDraft, RecipeFields, Step};
pub use domain::user::UserId;

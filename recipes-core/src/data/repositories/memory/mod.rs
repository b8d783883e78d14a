pub mod recipe_repository;
pub mod session_provider;

pub use recipe_repository::InMemoryRecipeRepository;
pub use session_provider::InMemorySessionProvider;

pub mod recipe_repository;
pub mod repositories;
pub mod session_provider;

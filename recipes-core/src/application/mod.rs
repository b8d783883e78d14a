pub mod catalog;
pub mod filter;
pub mod likes;
pub mod profile_service;
pub mod recipe_service;
pub mod scope;

#[cfg(test)]
pub(crate) mod testing;

pub mod criteria;
pub mod error;
pub mod facet;
pub mod recipe;
pub mod user;

use crate::domain::criteria::FilterCriteria;
use crate::domain::recipe::Recipe;

/// Отбирает рецепты, подходящие под условия, сохраняя исходный порядок.
pub fn filter_recipes(recipes: &[Recipe], criteria: &FilterCriteria) -> Vec<Recipe> {
    if criteria.is_unrestricted() {
        return recipes.to_vec();
    }

    let query = criteria.query.to_lowercase();
    recipes
        .iter()
        .filter(|recipe| matches_prepared(recipe, criteria, &query))
        .cloned()
        .collect()
}

/// Проверяет один рецепт по всем измерениям сразу.
pub fn matches(recipe: &Recipe, criteria: &FilterCriteria) -> bool {
    matches_prepared(recipe, criteria, &criteria.query.to_lowercase())
}

fn matches_prepared(recipe: &Recipe, criteria: &FilterCriteria, query: &str) -> bool {
    matches_text(recipe, query)
        && criteria.cuisine.matches(recipe.cuisine)
        && criteria.dish_type.matches(recipe.dish_type)
        && criteria.complexity.matches(recipe.complexity)
}

// query уже приведён к нижнему регистру
fn matches_text(recipe: &Recipe, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    recipe.title.to_lowercase().contains(query)
        || recipe
            .description
            .as_deref()
            .unwrap_or_default()
            .to_lowercase()
            .contains(query)
}

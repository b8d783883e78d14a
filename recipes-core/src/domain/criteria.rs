use super::facet::{Complexity, Cuisine, DishType, Facet};

/// Текущие условия поиска и фильтрации каталога.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Строка поиска; пустая строка не ограничивает выборку.
    pub query: String,
    /// Выбранная кухня.
    pub cuisine: Facet<Cuisine>,
    /// Выбранный тип блюда.
    pub dish_type: Facet<DishType>,
    /// Выбранная сложность.
    pub complexity: Facet<Complexity>,
}

impl FilterCriteria {
    /// Условия только со строкой поиска.
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Все измерения сброшены и строка поиска пуста.
    pub fn is_unrestricted(&self) -> bool {
        self.query.is_empty()
            && self.cuisine == Facet::All
            && self.dish_type == Facet::All
            && self.complexity == Facet::All
    }

    /// Вливает частичное изменение; незаданные поля остаются прежними.
    pub fn merge(&mut self, update: CriteriaUpdate) {
        if let Some(query) = update.query {
            self.query = query;
        }
        if let Some(cuisine) = update.cuisine {
            self.cuisine = cuisine;
        }
        if let Some(dish_type) = update.dish_type {
            self.dish_type = dish_type;
        }
        if let Some(complexity) = update.complexity {
            self.complexity = complexity;
        }
    }
}

/// Частичное изменение условий фильтрации.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriteriaUpdate {
    pub query: Option<String>,
    pub cuisine: Option<Facet<Cuisine>>,
    pub dish_type: Option<Facet<DishType>>,
    pub complexity: Option<Facet<Complexity>>,
}

//! Категориальные измерения фильтра: кухня, тип блюда, сложность.
//!
//! У каждого значения есть код (как он хранится в рецепте) и подпись
//! (как его показывает форма фильтра). Для сложности подпись совпадает с кодом.

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Значение одного измерения фильтра.
pub trait FacetValue: Copy + Eq + Sized + 'static {
    /// Подпись пункта «все значения».
    const ALL_LABEL: &'static str;
    /// Имя поля для ошибок валидации.
    const FIELD: &'static str;
    /// Все допустимые значения в порядке отображения.
    const VALUES: &'static [Self];

    /// Код значения в хранилище.
    fn code(self) -> &'static str;
    /// Подпись значения в интерфейсе.
    fn label(self) -> &'static str;

    /// Ищет значение по коду.
    fn from_code(code: &str) -> Option<Self> {
        Self::VALUES.iter().copied().find(|value| value.code() == code)
    }

    /// Ищет значение по подписи.
    fn from_label(label: &str) -> Option<Self> {
        Self::VALUES.iter().copied().find(|value| value.label() == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Кухня.
pub enum Cuisine {
    /// Итальянская.
    Italian,
    /// Французская.
    French,
    /// Азиатская.
    Asian,
    /// Другая.
    Other,
}

impl FacetValue for Cuisine {
    const ALL_LABEL: &'static str = "Все кухни";
    const FIELD: &'static str = "cuisine";
    const VALUES: &'static [Self] = &[Self::Italian, Self::French, Self::Asian, Self::Other];

    fn code(self) -> &'static str {
        match self {
            Self::Italian => "italian",
            Self::French => "french",
            Self::Asian => "asian",
            Self::Other => "other",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Italian => "Итальянская",
            Self::French => "Французская",
            Self::Asian => "Азиатская",
            Self::Other => "Другая",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Тип блюда.
pub enum DishType {
    /// Основное блюдо.
    Main,
    /// Закуска.
    Starter,
    /// Десерт.
    Dessert,
}

impl FacetValue for DishType {
    const ALL_LABEL: &'static str = "Все типы";
    const FIELD: &'static str = "type";
    const VALUES: &'static [Self] = &[Self::Main, Self::Starter, Self::Dessert];

    fn code(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Starter => "starter",
            Self::Dessert => "dessert",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Main => "Основное блюдо",
            Self::Starter => "Закуска",
            Self::Dessert => "Десерт",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// Сложность приготовления, упорядочена от простой к сложной.
pub enum Complexity {
    /// Легко.
    #[serde(rename = "Легко")]
    Easy,
    /// Средне.
    #[serde(rename = "Средне")]
    Medium,
    /// Сложно.
    #[serde(rename = "Сложно")]
    Hard,
}

impl FacetValue for Complexity {
    const ALL_LABEL: &'static str = "Все сложности";
    const FIELD: &'static str = "complexity";
    const VALUES: &'static [Self] = &[Self::Easy, Self::Medium, Self::Hard];

    fn code(self) -> &'static str {
        match self {
            Self::Easy => "Легко",
            Self::Medium => "Средне",
            Self::Hard => "Сложно",
        }
    }

    fn label(self) -> &'static str {
        self.code()
    }
}

/// Выбор в одном измерении фильтра.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facet<T> {
    /// Пункт «все значения», измерение не ограничивает выборку.
    #[default]
    All,
    /// Только рецепты с указанным значением.
    Only(T),
}

impl<T: FacetValue> Facet<T> {
    /// Разбирает выбор из подписи или кода.
    ///
    /// Пустая строка, `all` и подпись «все значения» означают отсутствие
    /// ограничения.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") || raw == T::ALL_LABEL {
            return Ok(Self::All);
        }

        T::from_label(raw)
            .or_else(|| T::from_code(raw))
            .or_else(|| T::from_code(&raw.to_lowercase()))
            .map(Self::Only)
            .ok_or(DomainError::Validation {
                field: T::FIELD,
                message: "unknown facet value",
            })
    }

    /// Проверяет значение рецепта. Отсутствующее значение проходит только
    /// через `All`.
    pub fn matches(&self, value: Option<T>) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => value == Some(*expected),
        }
    }

    /// Подпись текущего выбора.
    pub fn label(&self) -> &'static str {
        match self {
            Self::All => T::ALL_LABEL,
            Self::Only(value) => value.label(),
        }
    }
}

/// Разбирает хранимый код, неизвестные значения дают `None`.
pub fn parse_stored<T: FacetValue>(code: Option<&str>) -> Option<T> {
    code.map(str::trim).and_then(T::from_code)
}

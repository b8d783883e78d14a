use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidateUrl;

use super::error::DomainError;
use super::facet::{Complexity, Cuisine, DishType, FacetValue};
use super::user::UserId;

/// Ингредиент в нормализованной форме.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Название, всегда непустое.
    pub name: String,
    /// Количество в свободной форме, может быть пустым.
    pub amount: String,
}

/// Шаг приготовления в нормализованной форме.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Текст шага, всегда непустой.
    pub text: String,
    /// Иллюстрация шага.
    pub image: Option<String>,
}

/// Ингредиент в том виде, в каком он лежит в хранилище.
///
/// Старые записи хранят голую строку или `{text}`, новые хранят `{name, amount}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredIngredient {
    /// Голая строка.
    Text(String),
    /// Структурированная запись.
    Structured {
        /// Название.
        name: String,
        /// Количество.
        #[serde(default)]
        amount: Option<String>,
    },
    /// Устаревшая запись с одним текстовым полем.
    Legacy {
        /// Текст.
        text: String,
    },
}

impl StoredIngredient {
    fn normalize(self) -> Option<Ingredient> {
        let (name, amount) = match self {
            Self::Text(text) | Self::Legacy { text } => (text, String::new()),
            Self::Structured { name, amount } => (name, amount.unwrap_or_default()),
        };
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Ingredient {
            name: name.to_string(),
            amount: amount.trim().to_string(),
        })
    }
}

/// Шаг в том виде, в каком он лежит в хранилище.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredStep {
    /// Голая строка.
    Text(String),
    /// Структурированная запись.
    Structured {
        /// Текст.
        #[serde(default)]
        text: String,
        /// Иллюстрация.
        #[serde(default)]
        image: Option<String>,
    },
}

impl StoredStep {
    fn normalize(self) -> Option<Step> {
        let (text, image) = match self {
            Self::Text(text) => (text, None),
            Self::Structured { text, image } => (text, image),
        };
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Step {
            text: text.to_string(),
            image: non_blank(image.as_deref()),
        })
    }
}

/// Приводит сохранённые ингредиенты к структурированной форме, пустые записи
/// отбрасываются.
pub fn normalize_ingredients(raw: Vec<StoredIngredient>) -> Vec<Ingredient> {
    raw.into_iter().filter_map(StoredIngredient::normalize).collect()
}

/// Приводит сохранённые шаги к структурированной форме, шаги без текста
/// отбрасываются.
pub fn normalize_steps(raw: Vec<StoredStep>) -> Vec<Step> {
    raw.into_iter().filter_map(StoredStep::normalize).collect()
}

/// Рецепт, как его возвращает хранилище.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Идентификатор, назначенный хранилищем.
    pub id: i64,
    /// Название.
    pub title: String,
    /// Описание.
    pub description: Option<String>,
    /// Кухня; `None` для отсутствующих или неизвестных значений.
    pub cuisine: Option<Cuisine>,
    /// Тип блюда.
    pub dish_type: Option<DishType>,
    /// Сложность.
    pub complexity: Option<Complexity>,
    /// Время приготовления в минутах.
    pub cook_time: Option<u32>,
    /// Количество порций.
    pub servings: Option<u32>,
    /// Главное изображение.
    pub image_url: Option<String>,
    /// Ингредиенты в порядке добавления.
    pub ingredients: Vec<Ingredient>,
    /// Шаги в порядке выполнения.
    pub steps: Vec<Step>,
    /// Автор в свободной форме.
    pub author: Option<String>,
    /// Создатель рецепта.
    pub owner_id: UserId,
    /// Момент создания.
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    /// Собирает рецепт из проверенных полей формы.
    pub fn from_fields(
        id: i64,
        owner_id: UserId,
        created_at: DateTime<Utc>,
        fields: RecipeFields,
    ) -> Self {
        Self {
            id,
            title: fields.title,
            description: fields.description,
            cuisine: Some(fields.cuisine),
            dish_type: Some(fields.dish_type),
            complexity: Some(fields.complexity),
            cook_time: fields.cook_time,
            servings: fields.servings,
            image_url: fields.image_url,
            ingredients: fields.ingredients,
            steps: fields.steps,
            author: fields.author,
            owner_id,
            created_at,
        }
    }

    /// Заменяет редактируемые поля, владелец и дата создания не меняются.
    pub fn apply(&mut self, fields: RecipeFields) {
        let owner_id = self.owner_id.clone();
        *self = Self::from_fields(self.id, owner_id, self.created_at, fields);
    }

    /// Является ли зритель владельцем рецепта.
    pub fn is_owned_by(&self, viewer: Option<&UserId>) -> bool {
        viewer.is_some_and(|viewer| *viewer == self.owner_id)
    }
}

/// Проверенное содержимое рецепта, готовое к записи.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeFields {
    /// Название.
    pub title: String,
    /// Описание.
    pub description: Option<String>,
    /// Кухня.
    pub cuisine: Cuisine,
    /// Тип блюда.
    pub dish_type: DishType,
    /// Сложность.
    pub complexity: Complexity,
    /// Время приготовления в минутах.
    pub cook_time: Option<u32>,
    /// Количество порций.
    pub servings: Option<u32>,
    /// Главное изображение.
    pub image_url: Option<String>,
    /// Ингредиенты без пустых строк.
    pub ingredients: Vec<Ingredient>,
    /// Шаги без пустых строк.
    pub steps: Vec<Step>,
    /// Автор.
    pub author: Option<String>,
}

/// Строка ингредиента в форме.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngredientInput {
    /// Название.
    pub name: String,
    /// Количество.
    pub amount: String,
}

impl IngredientInput {
    /// Разбирает строку вида `название: количество`.
    pub fn parse_line(line: &str) -> Self {
        match line.split_once(':') {
            Some((name, amount)) => Self {
                name: name.trim().to_string(),
                amount: amount.trim().to_string(),
            },
            None => Self {
                name: line.trim().to_string(),
                amount: String::new(),
            },
        }
    }
}

/// Строка шага в форме.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepInput {
    /// Текст шага.
    pub text: String,
    /// URL иллюстрации.
    pub image: String,
}

/// Содержимое форм создания и редактирования рецепта до проверки.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub title: String,
    pub description: String,
    /// `None` у старых записей с неизвестным значением; запись без выбора
    /// отклоняется.
    pub cuisine: Option<Cuisine>,
    pub dish_type: Option<DishType>,
    pub complexity: Option<Complexity>,
    pub cook_time: Option<i64>,
    pub servings: Option<i64>,
    pub image_url: String,
    pub ingredients: Vec<IngredientInput>,
    pub steps: Vec<StepInput>,
    pub author: String,
}

impl Default for RecipeDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            cuisine: Some(Cuisine::Italian),
            dish_type: Some(DishType::Main),
            complexity: Some(Complexity::Medium),
            cook_time: None,
            servings: None,
            image_url: String::new(),
            ingredients: Vec::new(),
            steps: Vec::new(),
            author: String::new(),
        }
    }
}

impl RecipeDraft {
    /// Заполняет форму редактирования из существующего рецепта.
    pub fn from_recipe(recipe: &Recipe) -> Self {
        Self {
            title: recipe.title.clone(),
            description: recipe.description.clone().unwrap_or_default(),
            cuisine: recipe.cuisine,
            dish_type: recipe.dish_type,
            complexity: recipe.complexity,
            cook_time: recipe.cook_time.map(i64::from),
            servings: recipe.servings.map(i64::from),
            image_url: recipe.image_url.clone().unwrap_or_default(),
            ingredients: recipe
                .ingredients
                .iter()
                .map(|ingredient| IngredientInput {
                    name: ingredient.name.clone(),
                    amount: ingredient.amount.clone(),
                })
                .collect(),
            steps: recipe
                .steps
                .iter()
                .map(|step| StepInput {
                    text: step.text.clone(),
                    image: step.image.clone().unwrap_or_default(),
                })
                .collect(),
            author: recipe.author.clone().unwrap_or_default(),
        }
    }

    /// Проверяет и нормализует форму перед записью.
    pub fn validate(self) -> Result<RecipeFields, DomainError> {
        Ok(RecipeFields {
            title: normalize_title(&self.title)?,
            description: non_blank(Some(&self.description)),
            cuisine: require_facet(self.cuisine)?,
            dish_type: require_facet(self.dish_type)?,
            complexity: require_facet(self.complexity)?,
            cook_time: validate_cook_time(self.cook_time)?,
            servings: validate_servings(self.servings)?,
            image_url: validate_optional_url("image_url", &self.image_url)?,
            ingredients: validate_ingredients(self.ingredients)?,
            steps: validate_steps(self.steps)?,
            author: non_blank(Some(&self.author)),
        })
    }
}

fn require_facet<T: FacetValue>(value: Option<T>) -> Result<T, DomainError> {
    value.ok_or(DomainError::Validation {
        field: T::FIELD,
        message: "must be chosen",
    })
}

fn normalize_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    let len = title.chars().count();
    if len == 0 || len > 255 {
        return Err(DomainError::Validation {
            field: "title",
            message: "must be 1..255 chars",
        });
    }
    Ok(title.to_string())
}

fn validate_cook_time(value: Option<i64>) -> Result<Option<u32>, DomainError> {
    value
        .map(|minutes| {
            u32::try_from(minutes).map_err(|_| DomainError::Validation {
                field: "cook_time",
                message: "must be >= 0",
            })
        })
        .transpose()
}

fn validate_servings(value: Option<i64>) -> Result<Option<u32>, DomainError> {
    value
        .map(|servings| match u32::try_from(servings) {
            Ok(servings) if servings > 0 => Ok(servings),
            _ => Err(DomainError::Validation {
                field: "servings",
                message: "must be > 0",
            }),
        })
        .transpose()
}

fn validate_optional_url(field: &'static str, raw: &str) -> Result<Option<String>, DomainError> {
    let Some(url) = non_blank(Some(raw)) else {
        return Ok(None);
    };
    if !url.validate_url() {
        return Err(DomainError::Validation {
            field,
            message: "must be a valid URL",
        });
    }
    Ok(Some(url))
}

fn validate_ingredients(rows: Vec<IngredientInput>) -> Result<Vec<Ingredient>, DomainError> {
    let mut ingredients = Vec::with_capacity(rows.len());
    for row in rows {
        let name = row.name.trim();
        let amount = row.amount.trim();
        if name.is_empty() {
            if amount.is_empty() {
                continue;
            }
            return Err(DomainError::Validation {
                field: "ingredients",
                message: "ingredient name is required",
            });
        }
        ingredients.push(Ingredient {
            name: name.to_string(),
            amount: amount.to_string(),
        });
    }
    Ok(ingredients)
}

fn validate_steps(rows: Vec<StepInput>) -> Result<Vec<Step>, DomainError> {
    let mut steps = Vec::with_capacity(rows.len());
    for row in rows {
        let text = row.text.trim();
        let image = validate_optional_url("steps", &row.image)?;
        if text.is_empty() {
            if image.is_none() {
                continue;
            }
            return Err(DomainError::Validation {
                field: "steps",
                message: "step text is required",
            });
        }
        steps.push(Step {
            text: text.to_string(),
            image,
        });
    }
    Ok(steps)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn sample_draft() -> RecipeDraft {
        RecipeDraft {
            title: "  Паста Карбонара  ".to_string(),
            description: "  классика  ".to_string(),
            cook_time: Some(25),
            servings: Some(2),
            ingredients: vec![
                IngredientInput {
                    name: " Спагетти ".to_string(),
                    amount: " 200 г ".to_string(),
                },
                IngredientInput::default(),
            ],
            steps: vec![
                StepInput {
                    text: "Отварить пасту".to_string(),
                    image: String::new(),
                },
                StepInput::default(),
            ],
            ..RecipeDraft::default()
        }
    }

    fn assert_validation_field(err: DomainError, expected_field: &'static str) {
        match err {
            DomainError::Validation { field, .. } => assert_eq!(field, expected_field),
            other => panic!("expected DomainError::Validation, got {other:?}"),
        }
    }

    #[test]
    fn validate_trims_and_drops_blank_rows() {
        let fields = sample_draft().validate().expect("draft must validate");

        assert_eq!(fields.title, "Паста Карбонара");
        assert_eq!(fields.description.as_deref(), Some("классика"));
        assert_eq!(fields.author, None);
        assert_eq!(
            fields.ingredients,
            vec![Ingredient {
                name: "Спагетти".to_string(),
                amount: "200 г".to_string(),
            }]
        );
        assert_eq!(fields.steps.len(), 1);
        assert_eq!(fields.cook_time, Some(25));
        assert_eq!(fields.servings, Some(2));
    }

    #[test]
    fn validate_rejects_blank_title() {
        let draft = RecipeDraft {
            title: "   ".to_string(),
            ..sample_draft()
        };
        assert_validation_field(draft.validate().expect_err("must fail"), "title");
    }

    #[test]
    fn validate_rejects_ingredient_without_name() {
        let mut draft = sample_draft();
        draft.ingredients.push(IngredientInput {
            name: "  ".to_string(),
            amount: "1 шт".to_string(),
        });
        assert_validation_field(draft.validate().expect_err("must fail"), "ingredients");
    }

    #[test]
    fn validate_rejects_step_with_image_but_no_text() {
        let mut draft = sample_draft();
        draft.steps.push(StepInput {
            text: " ".to_string(),
            image: "https://example.com/step.jpg".to_string(),
        });
        assert_validation_field(draft.validate().expect_err("must fail"), "steps");
    }

    #[test]
    fn validate_checks_numeric_ranges() {
        let draft = RecipeDraft {
            cook_time: Some(-1),
            ..sample_draft()
        };
        assert_validation_field(draft.validate().expect_err("must fail"), "cook_time");

        let draft = RecipeDraft {
            servings: Some(0),
            ..sample_draft()
        };
        assert_validation_field(draft.validate().expect_err("must fail"), "servings");
    }

    #[test]
    fn validate_checks_image_url() {
        let draft = RecipeDraft {
            image_url: "not a url".to_string(),
            ..sample_draft()
        };
        assert_validation_field(draft.validate().expect_err("must fail"), "image_url");

        let draft = RecipeDraft {
            image_url: " https://example.com/pasta.jpg ".to_string(),
            ..sample_draft()
        };
        let fields = draft.validate().expect("must validate");
        assert_eq!(
            fields.image_url.as_deref(),
            Some("https://example.com/pasta.jpg")
        );
    }

    #[test]
    fn stored_entries_are_normalized_once() {
        let raw = r#"["Соль", {"name": " Сыр ", "amount": "50 г"}, {"text": "Перец"}, {"name": "  "}]"#;
        let stored: Vec<StoredIngredient> = serde_json::from_str(raw).expect("must parse");
        let ingredients = normalize_ingredients(stored);

        assert_eq!(
            ingredients,
            vec![
                Ingredient {
                    name: "Соль".to_string(),
                    amount: String::new(),
                },
                Ingredient {
                    name: "Сыр".to_string(),
                    amount: "50 г".to_string(),
                },
                Ingredient {
                    name: "Перец".to_string(),
                    amount: String::new(),
                },
            ]
        );

        let raw = r#"["Смешать", {"text": "Запечь", "image": ""}, {"text": "", "image": "https://x"}]"#;
        let stored: Vec<StoredStep> = serde_json::from_str(raw).expect("must parse");
        let steps = normalize_steps(stored);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].text, "Запечь");
        assert_eq!(steps[1].image, None);
    }

    #[test]
    fn parse_line_splits_name_and_amount() {
        let input = IngredientInput::parse_line("Спагетти: 200 г");
        assert_eq!(input.name, "Спагетти");
        assert_eq!(input.amount, "200 г");

        let input = IngredientInput::parse_line(" Соль ");
        assert_eq!(input.name, "Соль");
        assert!(input.amount.is_empty());
    }

    #[test]
    fn apply_keeps_owner_and_created_at() {
        let owner = UserId::new("owner").expect("valid id");
        let created_at = Utc::now();
        let fields = sample_draft().validate().expect("must validate");
        let mut recipe = Recipe::from_fields(7, owner.clone(), created_at, fields);

        let update = RecipeDraft {
            title: "Новая паста".to_string(),
            ..RecipeDraft::from_recipe(&recipe)
        };
        recipe.apply(update.validate().expect("must validate"));

        assert_eq!(recipe.id, 7);
        assert_eq!(recipe.title, "Новая паста");
        assert_eq!(recipe.owner_id, owner);
        assert_eq!(recipe.created_at, created_at);
        assert!(recipe.is_owned_by(Some(&owner)));
        assert!(!recipe.is_owned_by(None));
    }

    #[test]
    fn legacy_row_without_facet_is_not_silently_rewritten() {
        let owner = UserId::new("owner").expect("valid id");
        let fields = sample_draft().validate().expect("must validate");
        let mut recipe = Recipe::from_fields(3, owner, Utc::now(), fields);
        recipe.cuisine = None;

        let draft = RecipeDraft::from_recipe(&recipe);
        assert_eq!(draft.cuisine, None);
        assert_eq!(draft.dish_type, recipe.dish_type);

        let err = RecipeDraft {
            title: "Новое название".to_string(),
            ..draft.clone()
        }
        .validate()
        .expect_err("missing cuisine must be reported");
        assert_validation_field(err, "cuisine");

        let fields = RecipeDraft {
            cuisine: Some(Cuisine::French),
            ..draft
        }
        .validate()
        .expect("explicit cuisine must validate");
        assert_eq!(fields.cuisine, Cuisine::French);
    }
}

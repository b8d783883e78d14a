use chrono::{DateTime, Utc};
use recipes_core::domain::facet::{FacetValue, parse_stored};
use recipes_core::domain::recipe::{
    StoredIngredient, StoredStep, normalize_ingredients, normalize_steps,
};
use recipes_core::{Ingredient, Recipe, RecipeFields, Step, UserId};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Сессия пользователя после входа.
pub struct AuthSession {
    /// Токен доступа для заголовка `Authorization`.
    pub access_token: String,
    /// Идентификатор пользователя.
    pub user_id: UserId,
    /// Email, если сервер его вернул.
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PasswordCredentialsDto<'a> {
    pub(crate) email: &'a str,
    pub(crate) password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignUpRequestDto<'a> {
    pub(crate) email: &'a str,
    pub(crate) password: &'a str,
    pub(crate) data: SignUpMetadataDto<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignUpMetadataDto<'a> {
    pub(crate) login: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthUserDto {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthSessionDto {
    pub(crate) access_token: String,
    pub(crate) user: AuthUserDto,
}

/// Регистрация возвращает сессию или только пользователя, если нужно
/// подтверждение почты.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SignUpResponseDto {
    Session(AuthSessionDto),
    User(AuthUserDto),
}

impl TryFrom<AuthSessionDto> for AuthSession {
    type Error = ClientError;

    fn try_from(value: AuthSessionDto) -> Result<Self, Self::Error> {
        let user_id = UserId::new(value.user.id)
            .map_err(|_| ClientError::Decode("auth response without user id".to_string()))?;
        Ok(Self {
            access_token: value.access_token,
            user_id,
            email: value.user.email,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponseDto {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorResponseDto {
    pub(crate) fn into_message(self) -> Option<String> {
        self.message
            .or(self.error_description)
            .or(self.msg)
            .or(self.error)
    }
}

/// Строка таблицы `recipes`.
#[derive(Debug, Deserialize)]
pub(crate) struct RecipeRowDto {
    pub(crate) id: i64,
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) cuisine: Option<String>,
    #[serde(default, rename = "type")]
    pub(crate) dish_type: Option<String>,
    #[serde(default)]
    pub(crate) complexity: Option<String>,
    #[serde(default)]
    pub(crate) cook_time: Option<i64>,
    #[serde(default)]
    pub(crate) servings: Option<i64>,
    #[serde(default)]
    pub(crate) image_url: Option<String>,
    #[serde(default)]
    pub(crate) ingredients: Option<Vec<StoredIngredient>>,
    #[serde(default)]
    pub(crate) steps: Option<Vec<StoredStep>>,
    #[serde(default)]
    pub(crate) author: Option<String>,
    pub(crate) user_id: String,
    pub(crate) created_at: DateTime<Utc>,
}

/// Строка выборки `recipe_likes` со встроенным рецептом.
#[derive(Debug, Deserialize)]
pub(crate) struct LikedRecipeRowDto {
    #[serde(default)]
    pub(crate) recipes: Option<RecipeRowDto>,
}

impl TryFrom<RecipeRowDto> for Recipe {
    type Error = ClientError;

    fn try_from(value: RecipeRowDto) -> Result<Self, Self::Error> {
        let owner_id = UserId::new(value.user_id).map_err(|_| {
            ClientError::Decode(format!("recipe {} has no owner", value.id))
        })?;

        Ok(Self {
            id: value.id,
            title: value.title,
            description: value.description,
            cuisine: parse_stored(value.cuisine.as_deref()),
            dish_type: parse_stored(value.dish_type.as_deref()),
            complexity: parse_stored(value.complexity.as_deref()),
            cook_time: value.cook_time.and_then(|minutes| u32::try_from(minutes).ok()),
            servings: value
                .servings
                .and_then(|servings| u32::try_from(servings).ok())
                .filter(|servings| *servings > 0),
            image_url: value.image_url.filter(|url| !url.trim().is_empty()),
            ingredients: normalize_ingredients(value.ingredients.unwrap_or_default()),
            steps: normalize_steps(value.steps.unwrap_or_default()),
            author: value.author,
            owner_id,
            created_at: value.created_at,
        })
    }
}

/// Тело `POST`/`PATCH` для таблицы `recipes`.
#[derive(Debug, Serialize)]
pub(crate) struct RecipeWriteDto<'a> {
    title: &'a str,
    description: Option<&'a str>,
    cuisine: &'static str,
    #[serde(rename = "type")]
    dish_type: &'static str,
    complexity: &'static str,
    cook_time: Option<u32>,
    servings: Option<u32>,
    image_url: Option<&'a str>,
    ingredients: &'a [Ingredient],
    steps: &'a [Step],
    author: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

impl<'a> RecipeWriteDto<'a> {
    pub(crate) fn new(fields: &'a RecipeFields, owner_id: Option<&'a UserId>) -> Self {
        Self {
            title: &fields.title,
            description: fields.description.as_deref(),
            cuisine: fields.cuisine.code(),
            dish_type: fields.dish_type.code(),
            complexity: fields.complexity.code(),
            cook_time: fields.cook_time,
            servings: fields.servings,
            image_url: fields.image_url.as_deref(),
            ingredients: &fields.ingredients,
            steps: &fields.steps,
            author: fields.author.as_deref(),
            user_id: owner_id.map(UserId::as_str),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedRowDto {
    pub(crate) id: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LikeRowDto {
    pub(crate) recipe_id: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct LikeWriteDto<'a> {
    pub(crate) recipe_id: i64,
    pub(crate) user_id: &'a str,
}

//! Клиентская библиотека для работы с сервером рецептов по HTTP.
//!
//! `RecipesClient` реализует [`RecipeRepository`] и [`SessionProvider`] из
//! `recipes-core`, поэтому его можно напрямую передать в сервисы ядра.
//! После `sign_in` клиент хранит токен доступа и использует его в операциях
//! записи.
#![warn(missing_docs)]

mod error;
mod http_client;
mod models;

pub use error::{ClientError, ClientResult};
pub use http_client::ClientConfig;
pub use models::AuthSession;

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use recipes_core::data::repositories::memory::InMemorySessionProvider;
use recipes_core::{
    DomainError, NewRecipe, Recipe, RecipeFields, RecipeRepository, SessionCallback,
    SessionProvider, SessionSubscription, UserId,
};
use reqwest::Method;
use tracing::{debug, info};

use http_client::HttpClient;
use models::{
    AuthSessionDto, CreatedRowDto, LikeRowDto, LikeWriteDto, LikedRecipeRowDto,
    PasswordCredentialsDto, RecipeRowDto, RecipeWriteDto, SignUpMetadataDto, SignUpRequestDto,
    SignUpResponseDto,
};

const RECIPES: &str = "/rest/v1/recipes";
const LIKES: &str = "/rest/v1/recipe_likes";

#[derive(Debug, Clone)]
/// Клиент сервера рецептов.
///
/// Копии клиента разделяют одну сессию.
pub struct RecipesClient {
    http: HttpClient,
    auth: Arc<RwLock<Option<AuthSession>>>,
    viewer: InMemorySessionProvider,
}

impl RecipesClient {
    /// Создаёт клиент по параметрам подключения.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
            auth: Arc::new(RwLock::new(None)),
            viewer: InMemorySessionProvider::default(),
        })
    }

    /// Восстанавливает сохранённую сессию.
    pub fn set_session(&self, session: AuthSession) {
        let user_id = session.user_id.clone();
        *self.auth.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
        self.viewer.sign_in(user_id);
    }

    /// Возвращает текущую сессию, если вход выполнен.
    pub fn session(&self) -> Option<AuthSession> {
        self.auth
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Забывает сессию.
    pub fn clear_session(&self) {
        *self.auth.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.viewer.sign_out();
    }

    /// Выполняет вход по email и паролю и сохраняет сессию в клиенте.
    pub async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        let payload = PasswordCredentialsDto { email, password };
        let request = self
            .http
            .request(Method::POST, "/auth/v1/token", None)
            .query(&[("grant_type", "password")])
            .json(&payload);
        let dto: AuthSessionDto = HttpClient::fetch(request).await?;

        let session = AuthSession::try_from(dto)?;
        info!(user_id = %session.user_id, "signed in");
        self.set_session(session.clone());
        Ok(session)
    }

    /// Регистрирует пользователя.
    ///
    /// Возвращает `None`, если сервер требует подтвердить почту до входа.
    pub async fn sign_up(
        &self,
        login: &str,
        email: &str,
        password: &str,
    ) -> ClientResult<Option<AuthSession>> {
        let payload = SignUpRequestDto {
            email,
            password,
            data: SignUpMetadataDto { login },
        };
        let request = self
            .http
            .request(Method::POST, "/auth/v1/signup", None)
            .json(&payload);

        match HttpClient::fetch::<SignUpResponseDto>(request).await? {
            SignUpResponseDto::Session(dto) => {
                let session = AuthSession::try_from(dto)?;
                info!(user_id = %session.user_id, "signed up");
                self.set_session(session.clone());
                Ok(Some(session))
            }
            SignUpResponseDto::User(user) => {
                info!(user_id = %user.id, "signed up, confirmation pending");
                Ok(None)
            }
        }
    }

    fn token(&self) -> Option<String> {
        self.session().map(|session| session.access_token)
    }

    fn require_token(&self) -> ClientResult<String> {
        self.token().ok_or(ClientError::Unauthorized)
    }

    async fn fetch_recipes(&self, query: &[(&str, String)]) -> ClientResult<Vec<Recipe>> {
        let token = self.token();
        let request = self
            .http
            .request(Method::GET, RECIPES, token.as_deref())
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .query(query);
        let rows: Vec<RecipeRowDto> = HttpClient::fetch(request).await?;
        rows.into_iter().map(Recipe::try_from).collect()
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

#[async_trait]
impl RecipeRepository for RecipesClient {
    async fn list_recipes(&self) -> Result<Vec<Recipe>, DomainError> {
        Ok(self.fetch_recipes(&[]).await?)
    }

    async fn list_recipes_by_owner(&self, owner_id: &UserId) -> Result<Vec<Recipe>, DomainError> {
        Ok(self.fetch_recipes(&[("user_id", eq(owner_id))]).await?)
    }

    async fn list_liked_recipes(&self, user_id: &UserId) -> Result<Vec<Recipe>, DomainError> {
        let token = self.token();
        let request = self
            .http
            .request(Method::GET, LIKES, token.as_deref())
            .query(&[("select", "recipes(*)".to_string()), ("user_id", eq(user_id))]);
        let rows: Vec<LikedRecipeRowDto> = HttpClient::fetch(request)
            .await
            .map_err(DomainError::from)?;

        let mut recipes = rows
            .into_iter()
            .filter_map(|row| row.recipes)
            .map(Recipe::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(recipes)
    }

    async fn get_recipe(&self, id: i64) -> Result<Option<Recipe>, DomainError> {
        let mut recipes = self.fetch_recipes(&[("id", eq(id))]).await?;
        Ok(recipes.pop())
    }

    async fn create_recipe(&self, input: NewRecipe) -> Result<i64, DomainError> {
        let token = self.require_token()?;
        let body = RecipeWriteDto::new(&input.fields, Some(&input.owner_id));
        let rows: Vec<CreatedRowDto> = self
            .http
            .write_rows(Method::POST, RECIPES, &[("select", "id".to_string())], Some(&body), &token)
            .await?;

        let id = rows
            .first()
            .map(|row| row.id)
            .ok_or_else(|| ClientError::Decode("insert returned no rows".to_string()))?;
        debug!(recipe_id = id, "recipe inserted");
        Ok(id)
    }

    async fn update_recipe(&self, id: i64, fields: RecipeFields) -> Result<bool, DomainError> {
        let token = self.require_token()?;
        let body = RecipeWriteDto::new(&fields, None);
        let rows: Vec<CreatedRowDto> = self
            .http
            .write_rows(
                Method::PATCH,
                RECIPES,
                &[("id", eq(id)), ("select", "id".to_string())],
                Some(&body),
                &token,
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn delete_recipe(&self, id: i64) -> Result<bool, DomainError> {
        let token = self.require_token()?;
        let rows: Vec<CreatedRowDto> = self
            .http
            .write_rows::<(), _>(
                Method::DELETE,
                RECIPES,
                &[("id", eq(id)), ("select", "id".to_string())],
                None,
                &token,
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn count_likes(&self, recipe_id: i64) -> Result<u64, DomainError> {
        let token = self.token();
        Ok(self
            .http
            .count_rows(
                LIKES,
                &[("recipe_id", eq(recipe_id)), ("select", "recipe_id".to_string())],
                token.as_deref(),
            )
            .await?)
    }

    async fn has_like(&self, recipe_id: i64, user_id: &UserId) -> Result<bool, DomainError> {
        let token = self.token();
        let request = self
            .http
            .request(Method::GET, LIKES, token.as_deref())
            .query(&[
                ("select", "recipe_id".to_string()),
                ("recipe_id", eq(recipe_id)),
                ("user_id", eq(user_id)),
                ("limit", "1".to_string()),
            ]);
        let rows: Vec<LikeRowDto> = HttpClient::fetch(request)
            .await
            .map_err(DomainError::from)?;
        Ok(rows.iter().any(|row| row.recipe_id == recipe_id))
    }

    async fn add_like(&self, recipe_id: i64, user_id: &UserId) -> Result<(), DomainError> {
        let token = self.require_token()?;
        let body = LikeWriteDto {
            recipe_id,
            user_id: user_id.as_str(),
        };
        let request = self
            .http
            .request(Method::POST, LIKES, Some(&token))
            .header("Prefer", "return=minimal")
            .json(&body);
        Ok(HttpClient::execute(request).await?)
    }

    async fn remove_like(&self, recipe_id: i64, user_id: &UserId) -> Result<(), DomainError> {
        let token = self.require_token()?;
        let request = self
            .http
            .request(Method::DELETE, LIKES, Some(&token))
            .query(&[("recipe_id", eq(recipe_id)), ("user_id", eq(user_id))]);
        Ok(HttpClient::execute(request).await?)
    }
}

impl SessionProvider for RecipesClient {
    fn current_user(&self) -> Option<UserId> {
        self.viewer.current_user()
    }

    fn on_change(&self, callback: SessionCallback) -> SessionSubscription {
        self.viewer.on_change(callback)
    }
}

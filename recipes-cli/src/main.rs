use std::process;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use recipes_client::{AuthSession, ClientError, RecipesClient};
use recipes_core::domain::recipe::{IngredientInput, StepInput};
use recipes_core::{
    CatalogViewModel, Complexity, CriteriaUpdate, Cuisine, DishType, DomainError, Facet,
    FacetValue, FilterCriteria, LikeReconciler, LikeState, ProfileService, Recipe, RecipeDraft, RecipeService,
    SessionProvider, ViewScope,
};
use tracing::debug;

mod infrastructure;

use infrastructure::logging::init_logging;
use infrastructure::session_store::SessionStore;
use infrastructure::settings::Settings;

const DESCRIPTION_PREVIEW_CHARS: usize = 120;
const DEFAULT_COOK_TIME: u32 = 30;
const DEFAULT_SERVINGS: u32 = 4;

#[derive(Debug, Parser)]
#[command(name = "recipes", version, about = "CLI каталога рецептов")]
struct Cli {
    /// Адрес сервера, важнее RECIPES_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Каталог с поиском и фильтрами.
    List {
        /// Строка поиска по названию и описанию.
        #[arg(long, default_value = "")]
        query: String,
        /// Кухня: подпись («Французская») или код (french).
        #[arg(long)]
        cuisine: Option<String>,
        /// Тип блюда: подпись или код.
        #[arg(long)]
        dish_type: Option<String>,
        /// Сложность: Легко, Средне, Сложно.
        #[arg(long)]
        complexity: Option<String>,
        /// Показать число лайков у каждого рецепта.
        #[arg(long)]
        likes: bool,
    },
    /// Рецепт целиком.
    Show {
        #[arg(long)]
        id: i64,
    },
    /// Создание рецепта (требует входа).
    Create {
        #[command(flatten)]
        form: RecipeForm,
    },
    /// Правка рецепта владельцем.
    ///
    /// Незаданные поля остаются прежними; `--ingredient` и `--step` заменяют
    /// списки целиком.
    Edit {
        #[arg(long)]
        id: i64,
        #[command(flatten)]
        form: RecipeForm,
    },
    /// Удаление рецепта владельцем.
    Delete {
        #[arg(long)]
        id: i64,
    },
    /// Поставить или снять лайк.
    Like {
        #[arg(long)]
        id: i64,
    },
    /// Мои и понравившиеся рецепты.
    Profile,
    /// Вход по email и паролю.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Регистрация.
    Signup {
        #[arg(long)]
        login: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Выход: удаляет сохранённую сессию.
    Logout,
}

#[derive(Debug, Args)]
struct RecipeForm {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    cuisine: Option<String>,
    #[arg(long)]
    dish_type: Option<String>,
    #[arg(long)]
    complexity: Option<String>,
    /// Минуты.
    #[arg(long)]
    cook_time: Option<i64>,
    #[arg(long)]
    servings: Option<i64>,
    #[arg(long)]
    image_url: Option<String>,
    #[arg(long)]
    author: Option<String>,
    /// Ингредиент в виде `название: количество`, можно повторять.
    #[arg(long = "ingredient")]
    ingredients: Vec<String>,
    /// Текст шага, можно повторять.
    #[arg(long = "step")]
    steps: Vec<String>,
}

impl RecipeForm {
    fn apply_to(self, draft: &mut RecipeDraft) -> Result<()> {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(raw) = self.cuisine {
            draft.cuisine = Some(parse_value::<Cuisine>(&raw)?);
        }
        if let Some(raw) = self.dish_type {
            draft.dish_type = Some(parse_value::<DishType>(&raw)?);
        }
        if let Some(raw) = self.complexity {
            draft.complexity = Some(parse_value::<Complexity>(&raw)?);
        }
        if self.cook_time.is_some() {
            draft.cook_time = self.cook_time;
        }
        if self.servings.is_some() {
            draft.servings = self.servings;
        }
        if let Some(image_url) = self.image_url {
            draft.image_url = image_url;
        }
        if let Some(author) = self.author {
            draft.author = author;
        }
        if !self.ingredients.is_empty() {
            draft.ingredients = self
                .ingredients
                .iter()
                .map(|line| IngredientInput::parse_line(line))
                .collect();
        }
        if !self.steps.is_empty() {
            draft.steps = self
                .steps
                .into_iter()
                .map(|text| StepInput {
                    text,
                    image: String::new(),
                })
                .collect();
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let client = RecipesClient::new(&settings.client_config(cli.api_url))
        .map_err(map_client_error)?;
    let store = SessionStore::new(&settings.session_file);
    if let Some(session) = store
        .load()
        .with_context(|| format!("не удалось прочитать {}", store.path().display()))?
    {
        debug!(user_id = %session.user_id, "session restored");
        client.set_session(session);
    }
    let viewer = client.current_user();

    match cli.command {
        Command::List {
            query,
            cuisine,
            dish_type,
            complexity,
            likes,
        } => {
            let update = CriteriaUpdate {
                query: Some(query),
                cuisine: cuisine.as_deref().map(Facet::parse).transpose()?,
                dish_type: dish_type.as_deref().map(Facet::parse).transpose()?,
                complexity: complexity.as_deref().map(Facet::parse).transpose()?,
            };

            let catalog = CatalogViewModel::new(client.clone(), &client);
            catalog.load().await;
            if let Some(err) = catalog.last_error() {
                catalog.tear_down();
                return Err(map_domain_error(err));
            }
            catalog.set_criteria(update);

            let reconciler = LikeReconciler::new(client.clone(), catalog.scope());
            println!("Найдено рецептов: {}", catalog.result_count());
            if let Some(filters) = filters_line(&catalog.criteria()) {
                println!("{filters}");
            }
            for recipe in catalog.visible_recipes() {
                let like = if likes {
                    Some(
                        reconciler
                            .refresh(recipe.id, viewer.as_ref())
                            .await
                            .map_err(map_domain_error)?,
                    )
                } else {
                    None
                };
                print_card(&recipe, like);
            }
            catalog.tear_down();
        }
        Command::Show { id } => {
            let service = RecipeService::new(client.clone());
            let recipe = service.get_recipe(id).await.map_err(map_domain_error)?;
            let like = LikeReconciler::new(client.clone(), ViewScope::new())
                .refresh(id, viewer.as_ref())
                .await
                .map_err(map_domain_error)?;
            let owned = RecipeService::<RecipesClient>::is_owner(&recipe, viewer.as_ref());
            print_recipe(&recipe, like, owned);
        }
        Command::Create { form } => {
            let mut draft = RecipeDraft::default();
            form.apply_to(&mut draft)?;
            let id = RecipeService::new(client.clone())
                .create_recipe(viewer.as_ref(), draft)
                .await
                .map_err(map_domain_error)?;
            println!("Рецепт создан: id={id}");
        }
        Command::Edit { id, form } => {
            let service = RecipeService::new(client.clone());
            let current = service.get_recipe(id).await.map_err(map_domain_error)?;
            let mut draft = RecipeDraft::from_recipe(&current);
            form.apply_to(&mut draft)?;

            let recipe = service
                .update_recipe(viewer.as_ref(), id, draft)
                .await
                .map_err(map_domain_error)?;
            println!("Рецепт обновлён: id={id}");
            print_card(&recipe, None);
        }
        Command::Delete { id } => {
            RecipeService::new(client.clone())
                .delete_recipe(viewer.as_ref(), id)
                .await
                .map_err(map_domain_error)?;
            println!("Рецепт удалён: id={id}");
        }
        Command::Like { id } => {
            let state = LikeReconciler::new(client.clone(), ViewScope::new())
                .toggle_like(id, viewer.as_ref())
                .await
                .map_err(map_domain_error)?;
            let verb = if state.liked { "Лайк поставлен" } else { "Лайк снят" };
            println!("{verb}: id={id}, лайков: {}", state.count);
        }
        Command::Profile => {
            let profile = ProfileService::new(client.clone());
            let own = profile
                .my_recipes(viewer.as_ref())
                .await
                .map_err(map_domain_error)?;
            let liked = profile
                .liked_recipes(viewer.as_ref())
                .await
                .map_err(map_domain_error)?;
            print_profile(client.session().as_ref(), &own, &liked);
        }
        Command::Login { email, password } => {
            let session = client
                .sign_in(&email, &password)
                .await
                .map_err(map_client_error)?;
            store.save(&session).context("не удалось сохранить сессию")?;
            print_session("Вход выполнен", &session);
        }
        Command::Signup {
            login,
            email,
            password,
        } => {
            let session = client
                .sign_up(&login, &email, &password)
                .await
                .map_err(map_client_error)?;
            match session {
                Some(session) => {
                    store.save(&session).context("не удалось сохранить сессию")?;
                    print_session("Регистрация успешна", &session);
                }
                None => println!("Регистрация успешна, подтвердите email и выполните вход"),
            }
        }
        Command::Logout => {
            client.clear_session();
            store.clear().context("не удалось удалить сессию")?;
            println!("Выход выполнен");
        }
    }

    Ok(())
}

fn parse_value<T: FacetValue>(raw: &str) -> Result<T> {
    match Facet::<T>::parse(raw)? {
        Facet::Only(value) => Ok(value),
        Facet::All => bail!("{}: нужно конкретное значение", T::FIELD),
    }
}

fn map_domain_error(err: DomainError) -> anyhow::Error {
    let message = match err {
        DomainError::Unauthenticated => {
            "требуется вход: выполните `recipes login ...` или `recipes signup ...`".to_string()
        }
        DomainError::NotFound(what) => format!("не найдено: {what}"),
        DomainError::Validation { field, message } => {
            format!("некорректное поле {field}: {message}")
        }
        DomainError::Forbidden => "действие доступно только автору рецепта".to_string(),
        DomainError::Repository(message) => format!("ошибка сервера: {message}"),
    };
    anyhow!(message)
}

fn map_client_error(err: ClientError) -> anyhow::Error {
    let message = match err {
        ClientError::Unauthorized => "неверный email или пароль".to_string(),
        ClientError::NotFound => "ресурс не найден".to_string(),
        ClientError::InvalidRequest(message) => format!("некорректный запрос: {message}"),
        ClientError::Decode(message) => format!("неожиданный ответ сервера: {message}"),
        ClientError::Http(err) => format!("ошибка HTTP: {err}"),
    };
    anyhow!(message)
}

fn preview(description: Option<&str>) -> String {
    match description.map(str::trim).filter(|text| !text.is_empty()) {
        None => "Описание отсутствует".to_string(),
        Some(text) if text.chars().count() > DESCRIPTION_PREVIEW_CHARS => {
            let cut: String = text.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
            format!("{cut}...")
        }
        Some(text) => text.to_string(),
    }
}

fn filters_line(criteria: &FilterCriteria) -> Option<String> {
    if criteria.is_unrestricted() {
        return None;
    }
    let mut line = format!(
        "Фильтры: {} / {} / {}",
        criteria.cuisine.label(),
        criteria.dish_type.label(),
        criteria.complexity.label()
    );
    if !criteria.query.is_empty() {
        line.push_str(&format!(", поиск: «{}»", criteria.query));
    }
    Some(line)
}

fn facet_label<T: FacetValue>(value: Option<T>) -> &'static str {
    value.map(FacetValue::label).unwrap_or("-")
}

fn print_card(recipe: &Recipe, like: Option<LikeState>) {
    println!(
        "- [{}] {} ({}, {}, {})",
        recipe.id,
        recipe.title,
        facet_label(recipe.cuisine),
        facet_label(recipe.dish_type),
        facet_label(recipe.complexity),
    );
    println!("    {}", preview(recipe.description.as_deref()));
    let mut meta = format!(
        "    ⏱ {} мин  🍽 {}",
        recipe.cook_time.unwrap_or(DEFAULT_COOK_TIME),
        recipe.servings.unwrap_or(DEFAULT_SERVINGS)
    );
    if let Some(like) = like {
        let mark = if like.liked { "♥" } else { "♡" };
        meta.push_str(&format!("  {mark} {}", like.count));
    }
    println!("{meta}");
}

fn print_recipe(recipe: &Recipe, like: LikeState, owned: bool) {
    println!("{}", recipe.title);
    println!("id: {}", recipe.id);
    if let Some(author) = &recipe.author {
        println!("автор: {author}");
    }
    println!("кухня: {}", facet_label(recipe.cuisine));
    println!("тип: {}", facet_label(recipe.dish_type));
    println!("сложность: {}", facet_label(recipe.complexity));
    println!(
        "⏱ {} минут, 🍽 {} порций",
        recipe.cook_time.unwrap_or(DEFAULT_COOK_TIME),
        recipe.servings.unwrap_or(DEFAULT_SERVINGS)
    );
    if let Some(image_url) = &recipe.image_url {
        println!("фото: {image_url}");
    }
    if let Some(description) = &recipe.description {
        println!();
        println!("{description}");
    }
    if !recipe.ingredients.is_empty() {
        println!();
        println!("Ингредиенты:");
        for ingredient in &recipe.ingredients {
            if ingredient.amount.is_empty() {
                println!("  - {}", ingredient.name);
            } else {
                println!("  - {}: {}", ingredient.name, ingredient.amount);
            }
        }
    }
    if !recipe.steps.is_empty() {
        println!();
        println!("Шаги:");
        for (index, step) in recipe.steps.iter().enumerate() {
            println!("  {}. {}", index + 1, step.text);
            if let Some(image) = &step.image {
                println!("     фото: {image}");
            }
        }
    }
    println!();
    let mark = if like.liked { "♥" } else { "♡" };
    println!("{mark} {}", like.count);
    if owned {
        println!("Вы автор: доступны `recipes edit --id {0}` и `recipes delete --id {0}`", recipe.id);
    }
}

fn print_profile(session: Option<&AuthSession>, own: &[Recipe], liked: &[Recipe]) {
    if let Some(email) = session.and_then(|session| session.email.as_deref()) {
        println!("Профиль: {email}");
    }
    println!("Мои рецепты: {}", own.len());
    for recipe in own {
        println!("- [{}] {}", recipe.id, recipe.title);
    }
    println!("Понравившиеся: {}", liked.len());
    for recipe in liked {
        println!("- [{}] {}", recipe.id, recipe.title);
    }
}

fn print_session(title: &str, session: &AuthSession) {
    println!("{title}");
    println!("user_id: {}", session.user_id);
    if let Some(email) = &session.email {
        println!("email: {email}");
    }
}

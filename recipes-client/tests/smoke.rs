use std::time::{SystemTime, UNIX_EPOCH};

use recipes_client::{ClientConfig, RecipesClient};
use recipes_core::{
    CatalogViewModel, DomainError, LikeReconciler, LoadState, RecipeDraft, RecipeService,
    SessionProvider,
};

fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock must be after unix epoch")
        .as_nanos();
    format!("{nanos}")
}

fn client_from_env() -> RecipesClient {
    let base_url = std::env::var("RECIPES_API_URL").expect("RECIPES_API_URL must be set");
    let api_key = std::env::var("RECIPES_API_KEY").expect("RECIPES_API_KEY must be set");
    RecipesClient::new(&ClientConfig::new(base_url, api_key)).expect("client must build")
}

#[tokio::test]
#[ignore = "requires hosted backend and a confirmed test account"]
async fn recipe_and_like_flow() {
    let client = client_from_env();
    let email = std::env::var("RECIPES_TEST_EMAIL").expect("RECIPES_TEST_EMAIL must be set");
    let password =
        std::env::var("RECIPES_TEST_PASSWORD").expect("RECIPES_TEST_PASSWORD must be set");

    let session = client
        .sign_in(&email, &password)
        .await
        .expect("sign_in must succeed");
    assert!(!session.access_token.is_empty());
    let viewer = client.current_user();
    assert_eq!(viewer.as_ref(), Some(&session.user_id));

    let service = RecipeService::new(client.clone());
    let title = format!("smoke recipe {}", unique_suffix());
    let id = service
        .create_recipe(
            viewer.as_ref(),
            RecipeDraft {
                title: title.clone(),
                ..RecipeDraft::default()
            },
        )
        .await
        .expect("create must succeed");

    let catalog = CatalogViewModel::new(client.clone(), &client);
    catalog.load().await;
    assert_eq!(catalog.load_state(), LoadState::Loaded);
    assert!(catalog.visible_recipes().iter().any(|recipe| recipe.id == id));

    let likes = LikeReconciler::new(client.clone(), catalog.scope());
    let on = likes
        .toggle_like(id, viewer.as_ref())
        .await
        .expect("like must succeed");
    assert!(on.liked);
    let off = likes
        .toggle_like(id, viewer.as_ref())
        .await
        .expect("unlike must succeed");
    assert!(!off.liked);
    assert_eq!(off.count, on.count - 1);
    catalog.tear_down();

    service
        .delete_recipe(viewer.as_ref(), id)
        .await
        .expect("delete must succeed");
    let after_delete = service.get_recipe(id).await;
    assert!(matches!(after_delete, Err(DomainError::NotFound(_))));

    client.clear_session();
    assert_eq!(client.current_user(), None);
}

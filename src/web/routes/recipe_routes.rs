use std::collections::HashSet;
use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::db::entities::recipe;
use crate::db::services::{self, NewRecipe, RecipeChanges};
use crate::web::models::AuthenticatedUser;
use crate::web::routes::ingredient_routes::IngredientResponse;
use crate::web::routes::tag_routes::TagResponse;
use crate::web::{AppError, AppState};

// --- Request/Response Structs ---

/// List/create representation: relations as bare id arrays.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResponse {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: f64,
    pub link: Option<String>,
    pub tags: Vec<i32>,
    pub ingredients: Vec<i32>,
    pub image: Option<String>,
}

/// Detail representation: relations expanded into nested objects.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDetailResponse {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: f64,
    pub link: Option<String>,
    pub tags: Vec<TagResponse>,
    pub ingredients: Vec<IngredientResponse>,
    pub image: Option<String>,
}

/// Used for both POST (create) and PUT (full update): omitted `link`
/// clears the link, omitted relation arrays clear the relations.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeWriteRequest {
    pub title: String,
    pub time_minutes: i32,
    pub price: f64,
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Vec<i32>,
    #[serde(default)]
    pub ingredients: Vec<i32>,
}

/// PATCH payload: only provided fields are applied. A provided `tags`
/// (or `ingredients`) array replaces the full set.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipePatchRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<f64>,
    pub link: Option<String>,
    pub tags: Option<Vec<i32>>,
    pub ingredients: Option<Vec<i32>>,
}

// --- Helpers ---

/// Drops repeated ids while keeping submission order; the join tables
/// have composite primary keys, so duplicates would fail the insert.
fn dedup_ids(ids: Vec<i32>) -> Vec<i32> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

async fn ensure_owned_relations(
    db: &DatabaseConnection,
    user_id: i32,
    tag_ids: &[i32],
    ingredient_ids: &[i32],
) -> Result<(), AppError> {
    let unique_tags: HashSet<i32> = tag_ids.iter().copied().collect();
    let owned_tags = services::find_owned_tags(db, user_id, tag_ids).await?;
    if owned_tags.len() != unique_tags.len() {
        return Err(AppError::InvalidInput(
            "tags must reference existing tags you own.".to_string(),
        ));
    }

    let unique_ingredients: HashSet<i32> = ingredient_ids.iter().copied().collect();
    let owned_ingredients = services::find_owned_ingredients(db, user_id, ingredient_ids).await?;
    if owned_ingredients.len() != unique_ingredients.len() {
        return Err(AppError::InvalidInput(
            "ingredients must reference existing ingredients you own.".to_string(),
        ));
    }
    Ok(())
}

async fn detail_response(
    db: &DatabaseConnection,
    recipe_model: recipe::Model,
) -> Result<RecipeDetailResponse, AppError> {
    let (tags, ingredients) = services::load_recipe_relations(db, &recipe_model).await?;
    Ok(RecipeDetailResponse {
        id: recipe_model.id,
        title: recipe_model.title,
        time_minutes: recipe_model.time_minutes,
        price: recipe_model.price,
        link: recipe_model.link,
        tags: tags.into_iter().map(TagResponse::from).collect(),
        ingredients: ingredients.into_iter().map(IngredientResponse::from).collect(),
        image: recipe_model.image,
    })
}

/// Builds the storage-relative path for an uploaded recipe image, or
/// `None` when the payload is not an image. The stored name is a fresh
/// UUID; only the extension survives from the client's filename.
pub fn recipe_image_path(file_name: &str, content_type: Option<&str>) -> Option<String> {
    let is_image = match content_type {
        Some(ct) if ct != "application/octet-stream" => ct.starts_with("image/"),
        _ => mime_guess::from_path(file_name)
            .first()
            .map(|m| m.type_() == mime_guess::mime::IMAGE)
            .unwrap_or(false),
    };
    if !is_image {
        return None;
    }

    let ext = FsPath::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .or_else(|| {
            content_type
                .and_then(|ct| ct.strip_prefix("image/"))
                .map(|s| s.to_string())
        })?;

    Some(format!("uploads/recipe/{}.{ext}", Uuid::new_v4()))
}

// --- Route Handlers ---

async fn list_recipes_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    let recipes = services::list_recipes(&app_state.db_pool, auth_user.id).await?;
    Ok(Json(
        recipes
            .into_iter()
            .map(|r| RecipeResponse {
                id: r.recipe.id,
                title: r.recipe.title,
                time_minutes: r.recipe.time_minutes,
                price: r.recipe.price,
                link: r.recipe.link,
                tags: r.tag_ids,
                ingredients: r.ingredient_ids,
                image: r.recipe.image,
            })
            .collect(),
    ))
}

async fn create_recipe_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<RecipeWriteRequest>,
) -> Result<(StatusCode, Json<RecipeResponse>), AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::InvalidInput("Title must not be empty.".to_string()));
    }
    ensure_owned_relations(
        &app_state.db_pool,
        auth_user.id,
        &payload.tags,
        &payload.ingredients,
    )
    .await?;

    let tag_ids = dedup_ids(payload.tags);
    let ingredient_ids = dedup_ids(payload.ingredients);

    let recipe_model = services::create_recipe(
        &app_state.db_pool,
        auth_user.id,
        NewRecipe {
            title: payload.title,
            time_minutes: payload.time_minutes,
            price: payload.price,
            link: payload.link,
            tag_ids: tag_ids.clone(),
            ingredient_ids: ingredient_ids.clone(),
        },
    )
    .await?;

    // Create keeps the bare-id shape; only the detail view expands relations.
    let response = RecipeResponse {
        id: recipe_model.id,
        title: recipe_model.title,
        time_minutes: recipe_model.time_minutes,
        price: recipe_model.price,
        link: recipe_model.link,
        tags: tag_ids,
        ingredients: ingredient_ids,
        image: recipe_model.image,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_recipe_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<Json<RecipeDetailResponse>, AppError> {
    let recipe_model = services::find_recipe(&app_state.db_pool, auth_user.id, recipe_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;
    Ok(Json(detail_response(&app_state.db_pool, recipe_model).await?))
}

async fn put_recipe_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
    Json(payload): Json<RecipeWriteRequest>,
) -> Result<Json<RecipeDetailResponse>, AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::InvalidInput("Title must not be empty.".to_string()));
    }
    let recipe_model = services::find_recipe(&app_state.db_pool, auth_user.id, recipe_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;

    ensure_owned_relations(
        &app_state.db_pool,
        auth_user.id,
        &payload.tags,
        &payload.ingredients,
    )
    .await?;

    let updated = services::update_recipe(
        &app_state.db_pool,
        recipe_model,
        RecipeChanges {
            title: Some(payload.title),
            time_minutes: Some(payload.time_minutes),
            price: Some(payload.price),
            link: Some(payload.link),
            tag_ids: Some(dedup_ids(payload.tags)),
            ingredient_ids: Some(dedup_ids(payload.ingredients)),
        },
    )
    .await?;

    Ok(Json(detail_response(&app_state.db_pool, updated).await?))
}

async fn patch_recipe_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
    Json(payload): Json<RecipePatchRequest>,
) -> Result<Json<RecipeDetailResponse>, AppError> {
    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            return Err(AppError::InvalidInput("Title must not be empty.".to_string()));
        }
    }
    let recipe_model = services::find_recipe(&app_state.db_pool, auth_user.id, recipe_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;

    ensure_owned_relations(
        &app_state.db_pool,
        auth_user.id,
        payload.tags.as_deref().unwrap_or_default(),
        payload.ingredients.as_deref().unwrap_or_default(),
    )
    .await?;

    let updated = services::update_recipe(
        &app_state.db_pool,
        recipe_model,
        RecipeChanges {
            title: payload.title,
            time_minutes: payload.time_minutes,
            price: payload.price,
            link: payload.link.map(Some),
            tag_ids: payload.tags.map(dedup_ids),
            ingredient_ids: payload.ingredients.map(dedup_ids),
        },
    )
    .await?;

    Ok(Json(detail_response(&app_state.db_pool, updated).await?))
}

async fn upload_image_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<RecipeDetailResponse>, AppError> {
    let recipe_model = services::find_recipe(&app_state.db_pool, auth_user.id, recipe_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read upload: {e}")))?;

        if data.is_empty() {
            return Err(AppError::InvalidInput("Uploaded file is empty.".to_string()));
        }

        let rel_path = recipe_image_path(&file_name, content_type.as_deref())
            .ok_or_else(|| AppError::InvalidInput("Upload a valid image.".to_string()))?;

        let full_path = FsPath::new(&app_state.config.media_root).join(&rel_path);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::InternalServerError(format!("Failed to create media dir: {e}")))?;
        }
        tokio::fs::write(&full_path, &data)
            .await
            .map_err(|e| AppError::InternalServerError(format!("Failed to store image: {e}")))?;

        info!(recipe_id, path = %rel_path, "Stored recipe image");

        let updated =
            services::set_recipe_image(&app_state.db_pool, recipe_model, rel_path).await?;
        return Ok(Json(detail_response(&app_state.db_pool, updated).await?));
    }

    Err(AppError::InvalidInput(
        "Multipart field 'image' is required.".to_string(),
    ))
}

// --- Router ---

pub fn create_recipes_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_recipes_handler).post(create_recipe_handler))
        .route(
            "/{recipe_id}",
            get(get_recipe_handler)
                .put(put_recipe_handler)
                .patch(patch_recipe_handler),
        )
        .route("/{recipe_id}/upload-image", post(upload_image_handler))
}

use axum::{
    Json, Router,
    extract::{Extension, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::services;
use crate::web::models::AuthenticatedUser;
use crate::web::routes::tag_routes::ListParams;
use crate::web::{AppError, AppState};

#[derive(Serialize)]
pub struct IngredientResponse {
    pub id: i32,
    pub name: String,
}

impl From<crate::db::entities::ingredient::Model> for IngredientResponse {
    fn from(model: crate::db::entities::ingredient::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateIngredientRequest {
    pub name: String,
}

async fn list_ingredients_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<IngredientResponse>>, AppError> {
    let assigned_only = params.assigned_only == Some(1);
    let ingredients =
        services::list_ingredients(&app_state.db_pool, auth_user.id, assigned_only).await?;
    Ok(Json(
        ingredients.into_iter().map(IngredientResponse::from).collect(),
    ))
}

async fn create_ingredient_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateIngredientRequest>,
) -> Result<(StatusCode, Json<IngredientResponse>), AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput(
            "Ingredient name must not be empty.".to_string(),
        ));
    }
    let ingredient_model =
        services::create_ingredient(&app_state.db_pool, auth_user.id, name).await?;
    Ok((
        StatusCode::CREATED,
        Json(IngredientResponse::from(ingredient_model)),
    ))
}

pub fn create_ingredients_router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/",
        get(list_ingredients_handler).post(create_ingredient_handler),
    )
}

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
use crate::web::{AppError, AppState};

#[derive(Serialize)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
}

impl From<crate::db::entities::tag::Model> for TagResponse {
    fn from(model: crate::db::entities::tag::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

#[derive(Deserialize)]
pub struct ListParams {
    pub assigned_only: Option<u8>,
}

#[derive(Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
}

async fn list_tags_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<TagResponse>>, AppError> {
    let assigned_only = params.assigned_only == Some(1);
    let tags = services::list_tags(&app_state.db_pool, auth_user.id, assigned_only).await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

async fn create_tag_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<TagResponse>), AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("Tag name must not be empty.".to_string()));
    }
    let tag_model = services::create_tag(&app_state.db_pool, auth_user.id, name).await?;
    Ok((StatusCode::CREATED, Json(TagResponse::from(tag_model))))
}

pub fn create_tags_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(list_tags_handler).post(create_tag_handler))
}

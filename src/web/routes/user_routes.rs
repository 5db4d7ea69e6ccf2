use axum::{
    Json, Router,
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use bcrypt::{DEFAULT_COST, hash};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::entities::user;
use crate::services::auth_service;
use crate::web::models::{AuthenticatedUser, LoginRequest, RegisterRequest, UserResponse};
use crate::web::{AppError, AppState};

/// Routes that do not require a token: registration and token issuance.
pub fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(create_user_handler))
        .route("/token", post(token_handler))
}

/// Routes behind the auth middleware.
pub fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new().route("/me", get(me_handler).patch(update_me_handler))
}

async fn create_user_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user_response = auth_service::register_user(&app_state.db_pool, payload).await?;
    Ok((StatusCode::CREATED, Json(user_response)))
}

async fn token_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token_response =
        auth_service::login_user(&app_state.db_pool, payload, &app_state.config.jwt_secret)
            .await?;

    let auth_cookie = Cookie::build(("token", token_response.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(true)
        .build();

    let mut response = Json(token_response).into_response();
    response.headers_mut().insert(
        axum::http::header::SET_COOKIE,
        auth_cookie
            .to_string()
            .parse()
            .map_err(|_| AppError::InternalServerError("Invalid cookie header".to_string()))?,
    );
    Ok(response)
}

async fn me_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<UserResponse>, AppError> {
    let user_model = user::Entity::find_by_id(auth_user.id)
        .one(&app_state.db_pool)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    Ok(Json(UserResponse {
        email: user_model.email,
        name: user_model.name,
    }))
}

#[derive(Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

async fn update_me_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<UpdateMeRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user_model = user::Entity::find_by_id(auth_user.id)
        .one(&app_state.db_pool)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    let mut active: user::ActiveModel = user_model.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(password) = payload.password {
        if password.len() < auth_service::MIN_PASSWORD_LEN {
            return Err(AppError::InvalidInput(format!(
                "Password must be at least {} characters long.",
                auth_service::MIN_PASSWORD_LEN
            )));
        }
        let password_hash =
            hash(&password, DEFAULT_COST).map_err(|e| AppError::PasswordHashingError(e.to_string()))?;
        active.password_hash = Set(password_hash);
    }
    active.updated_at = Set(chrono::Utc::now());
    let updated = active.update(&app_state.db_pool).await?;

    Ok(Json(UserResponse {
        email: updated.email,
        name: updated.name,
    }))
}

use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};

use crate::db::entities::user;
use crate::web::error::AppError;
use crate::web::models::{Claims, LoginRequest, RegisterRequest, TokenResponse, UserResponse};

pub const MIN_PASSWORD_LEN: usize = 5;

/// Lowercases and trims an email address. All lookups and stores go
/// through this, so `Test@X.COM` and `test@x.com` are the same account.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn register_user(
    db: &DatabaseConnection,
    req: RegisterRequest,
) -> Result<UserResponse, AppError> {
    let email = normalize_email(&req.email);
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::InvalidInput(
            "A valid email address is required.".to_string(),
        ));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long."
        )));
    }

    let existing: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(AppError::UserAlreadyExists(
            "A user with this email already exists.".to_string(),
        ));
    }

    let password_hash = hash(&req.password, DEFAULT_COST)
        .map_err(|e| AppError::PasswordHashingError(e.to_string()))?;

    let now = Utc::now();
    let new_user = user::ActiveModel {
        email: Set(email),
        name: Set(req.name.unwrap_or_default()),
        password_hash: Set(password_hash),
        is_active: Set(true),
        is_staff: Set(false),
        is_superuser: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match new_user.insert(db).await {
        Ok(user_model) => Ok(UserResponse {
            email: user_model.email,
            name: user_model.name,
        }),
        // The pre-check above races with concurrent registrations; the
        // unique index on email is the real guard.
        Err(db_err) => match &db_err {
            DbErr::Query(sea_orm::RuntimeErr::SqlxError(sqlx_error)) => {
                if let sqlx::Error::Database(database_error) = sqlx_error {
                    if database_error.is_unique_violation() {
                        return Err(AppError::UserAlreadyExists(
                            "A user with this email already exists.".to_string(),
                        ));
                    }
                }
                Err(AppError::DatabaseError(sqlx_error.to_string()))
            }
            _ => Err(AppError::DatabaseError(db_err.to_string())),
        },
    }
}

pub async fn login_user(
    db: &DatabaseConnection,
    req: LoginRequest,
    jwt_secret: &str,
) -> Result<TokenResponse, AppError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidCredentials);
    }

    let email = normalize_email(&req.email);
    let user_model = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !user_model.is_active {
        return Err(AppError::InvalidCredentials);
    }

    let valid_password = verify(&req.password, &user_model.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {e}")))?;
    if !valid_password {
        return Err(AppError::InvalidCredentials);
    }

    create_jwt_for_user(&user_model, jwt_secret)
}

pub fn create_jwt_for_user(
    user_model: &user::Model,
    jwt_secret: &str,
) -> Result<TokenResponse, AppError> {
    let now = Utc::now();
    let expiration = (now + Duration::hours(24)).timestamp() as usize;

    let claims = Claims {
        sub: user_model.email.clone(),
        user_id: user_model.id,
        exp: expiration,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::TokenCreationError(e.to_string()))?;

    Ok(TokenResponse { token })
}

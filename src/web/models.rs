use serde::{Deserialize, Serialize};

/// JWT payload carried in the bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Normalized email of the account.
    pub sub: String,
    pub user_id: i32,
    pub exp: usize,
}

/// Identity resolved by the auth middleware, injected as a request extension.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

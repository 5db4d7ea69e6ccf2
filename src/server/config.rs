use std::env;

#[derive(Clone)]
pub struct ServerConfig {
    pub jwt_secret: String,
    /// Root directory for uploaded media files.
    pub media_root: String,
    pub bind_addr: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;

        let media_root = env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        Ok(ServerConfig {
            jwt_secret,
            media_root,
            bind_addr,
        })
    }
}

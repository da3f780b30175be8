//! Environment-driven runtime settings, loaded once at startup.
//!
//! Mirrors the original's lazy `Config` singleton; `dotenvy` fills the role
//! `godotenv` played there, with `std::env` reads and the same defaults.

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rest_port: u16,
    pub mongo_uri: String,
    pub database: String,
    pub base_platform_api_url: String,
    pub jwt_secret: String,
}

impl Config {
    /// Loads `.env` (if present) then layers environment variables over the
    /// defaults below. Call once, at process start.
    pub fn load() -> Self {
        if let Err(err) = dotenvy::dotenv() {
            tracing::debug!(%err, "no .env file loaded");
        }

        Self {
            port: env_or("PORT", 8080),
            rest_port: env_or("REST_PORT", 8081),
            mongo_uri: env_or_string("MONGO_URI", "mongodb://localhost:27017"),
            database: env_or_string("DATABASE", "gameserver"),
            base_platform_api_url: env_or_string("BASE_PLATFORM_API_URL", "http://localhost:4000"),
            jwt_secret: env_or_string(
                "JWT_SECRET",
                "hmXS5XasJL5VSWZ1HenWEV5HvBXSZBdhw8YgKfDNQ+8=",
            ),
        }
    }
}

fn env_or_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

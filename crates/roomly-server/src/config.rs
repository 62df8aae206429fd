use anyhow::Context;

pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Process configuration, read from the environment once at startup and
/// passed down explicitly. Nothing below re-reads the environment.
pub struct Config {
    pub jwt_secret: String,
    pub db_path: String,
    pub host: String,
    pub port: u16,
    pub admin_password: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env_or("ROOMLY_PORT", "5000")
            .parse()
            .context("ROOMLY_PORT is not a valid port number")?;

        Ok(Self {
            jwt_secret: env_or("ROOMLY_JWT_SECRET", "dev-secret-change-me"),
            db_path: env_or("ROOMLY_DB_PATH", "roomly.db"),
            host: env_or("ROOMLY_HOST", "0.0.0.0"),
            port,
            admin_password: env_or("ROOMLY_ADMIN_PASSWORD", DEFAULT_ADMIN_PASSWORD),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

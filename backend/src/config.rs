use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub max_db_connections: u32,
    pub session_ttl_days: i64,
    pub cors_origin: Option<String>,
    pub secure_cookies: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("max_db_connections", 20)?
            .set_default("session_ttl_days", 14)?
            .set_default("secure_cookies", false)?
            .add_source(config::Environment::default())
            .build()?;

        config.try_deserialize()
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_days.max(1) as u64 * 24 * 60 * 60)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

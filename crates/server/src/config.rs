use config::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub source: SourceSettings,
    pub responder: ResponderSettings,
    pub security: SecuritySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Deserialize, Clone)]
pub struct SourceSettings {
    /// Base URL of the WordPress site the reviews live on
    pub base_url: String,
    pub username: Option<String>,
    pub app_password: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct ResponderSettings {
    pub api_base: String,
    pub model: String,
}

#[derive(Deserialize, Clone)]
pub struct SecuritySettings {
    pub admin_token: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        let env_map = collect_env_vars();

        let s = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.cors_origins", "*")?
            .set_default("database.url", "sqlite://data/reviewflow.db")?
            .set_default("source.base_url", "http://localhost:8080")?
            .set_default("responder.api_base", "https://api.openai.com")?
            .set_default("responder.model", "gpt-4o-mini")?
            .set_default("security.admin_token", "admin_secret_123")?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(config::File::from_str(
                &serde_json::to_string(&env_map)
                    .expect("Environment variables should serialize to JSON"),
                config::FileFormat::Json,
            ))
            .build()?;

        s.try_deserialize()
    }
}

fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with("REVIEWFLOW_"))
        .map(|(k, v)| {
            let new_key = k
                .trim_start_matches("REVIEWFLOW_")
                .replace("__", ".")
                .to_lowercase();
            (new_key, v)
        })
        .collect()
}

use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::env;

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Platform-assigned `PORT` (Heroku and friends) when it parses, otherwise 8080.
fn fallback_port(platform_port: Option<String>) -> u16 {
    platform_port
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

impl Config {
    /// Loads `.env`, an optional `configuration` file and `APP__*` variables,
    /// in increasing precedence.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .set_default("host", default_host())?
            .set_default("port", i64::from(fallback_port(env::var("PORT").ok())))?
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
        }
    }
}

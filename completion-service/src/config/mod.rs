use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::services::prompt::DEFAULT_SYSTEM_PROMPT;

/// Embedded store used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://completions.db?mode=rwc";

const DEFAULT_COMPLETION_MAX_TOKENS: u32 = 250;
const DEFAULT_CHAT_MAX_TOKENS: u32 = 150;

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub common: core_config::Config,
    pub provider: ProviderConfig,
    pub generation: GenerationConfig,
    pub database: DatabaseConfig,
    pub assets: AssetsConfig,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    /// Root of an OpenAI-compatible API, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub system_prompt: String,
    pub completion_max_tokens: u32,
    pub chat_max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            completion_max_tokens: DEFAULT_COMPLETION_MAX_TOKENS,
            chat_max_tokens: DEFAULT_CHAT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub enabled: bool,
    pub url: String,
    pub max_connections: u32,
    /// Create the tables at startup when they do not exist yet.
    pub auto_migrate: bool,
}

#[derive(Debug, Clone)]
pub struct AssetsConfig {
    pub root_dir: PathBuf,
    pub index_file: String,
}

impl AssetsConfig {
    pub fn index_path(&self) -> PathBuf {
        self.root_dir.join(&self.index_file)
    }
}

impl CompletionConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(CompletionConfig {
            common: common_config,
            provider: ProviderConfig {
                api_key: get_env("OPENAI_API_KEY", Some(""), is_prod)?,
                base_url: get_env("OPENAI_BASE_URL", Some("https://api.openai.com/v1"), false)?,
                model: get_env("OPENAI_MODEL", Some("gpt-3.5-turbo"), false)?,
                timeout_secs: parse_env("OPENAI_TIMEOUT_SECS", 120)?,
            },
            generation: GenerationConfig {
                system_prompt: get_env(
                    "COMPLETION_SYSTEM_PROMPT",
                    Some(DEFAULT_SYSTEM_PROMPT),
                    false,
                )?,
                completion_max_tokens: parse_env(
                    "COMPLETION_MAX_TOKENS",
                    DEFAULT_COMPLETION_MAX_TOKENS,
                )?,
                chat_max_tokens: parse_env("CHAT_MAX_TOKENS", DEFAULT_CHAT_MAX_TOKENS)?,
            },
            database: DatabaseConfig {
                enabled: parse_env("PERSISTENCE_ENABLED", true)?,
                url: normalize_database_url(&get_env(
                    "DATABASE_URL",
                    Some(DEFAULT_DATABASE_URL),
                    is_prod,
                )?),
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 5)?,
                auto_migrate: parse_env("DATABASE_AUTO_MIGRATE", true)?,
            },
            assets: AssetsConfig {
                root_dir: PathBuf::from(get_env("STATIC_DIR", Some("build"), false)?),
                index_file: get_env("STATIC_INDEX", Some("index.html"), false)?,
            },
        })
    }
}

/// Rewrites the legacy `postgres://` scheme some hosting platforms still hand
/// out into `postgresql://`. Other URLs pass through untouched.
pub fn normalize_database_url(url: &str) -> String {
    match url.strip_prefix("postgres://") {
        Some(rest) => format!("postgresql://{}", rest),
        None => url.to_string(),
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.trim().parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, val, e))
        }),
        Err(_) => Ok(default),
    }
}

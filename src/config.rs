use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub supabase: SupabaseSettings,
    pub tables: TableSettings,
    pub database: DatabaseSettings,
    pub openai: OpenAiSettings,
    pub cache: CacheSettings,
    pub extraction: ExtractionSettings,
    pub auth: AuthSettings,
    pub scoring: ScoringSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseSettings {
    pub endpoint: String,
    pub service_key: String,
    #[serde(default)]
    pub anon_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableSettings {
    pub user_profiles: String,
    pub date_me_docs: String,
    pub applications: String,
    pub content_analysis: String,
    pub matchmaking_scores: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiSettings {
    pub endpoint: String,
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_openai_timeout")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gpt-4-turbo-preview".to_string()
}
fn default_openai_timeout() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub redis_url: String,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionSettings {
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

fn default_max_content_length() -> usize {
    50_000
}
fn default_fetch_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_interests_weight")]
    pub interests: f64,
    #[serde(default = "default_values_weight")]
    pub values: f64,
    #[serde(default = "default_location_weight")]
    pub location: f64,
    #[serde(default = "default_age_weight")]
    pub age: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            interests: default_interests_weight(),
            values: default_values_weight(),
            location: default_location_weight(),
            age: default_age_weight(),
        }
    }
}

fn default_interests_weight() -> f64 { 40.0 }
fn default_values_weight() -> f64 { 30.0 }
fn default_location_weight() -> f64 { 20.0 }
fn default_age_weight() -> f64 { 10.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with DMD_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with DMD_)
            // e.g., DMD_SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("DMD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        // Substitute well-known environment variables for secrets
        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("DMD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Apply direct environment overrides for secrets and connection strings.
/// Unprefixed names (SUPABASE_URL, OPENAI_API_KEY, ...) win over the DMD_
/// variables so a plain .env file works without the prefixed form.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let database_url = env::var("DATABASE_URL")
        .or_else(|_| env::var("DMD_DATABASE__URL"))
        .ok();

    let supabase_url = env::var("SUPABASE_URL").ok();
    let supabase_service_key = env::var("SUPABASE_SERVICE_KEY")
        .or_else(|_| env::var("SUPABASE_SERVICE_ROLE_KEY"))
        .ok();
    let supabase_anon_key = env::var("SUPABASE_ANON_KEY").ok();
    let supabase_jwt_secret = env::var("SUPABASE_JWT_SECRET").ok();
    let openai_api_key = env::var("OPENAI_API_KEY").ok();
    let openai_model = env::var("OPENAI_MODEL").ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(url) = database_url {
        builder = builder.set_override("database.url", url)?;
    }
    if let Some(url) = supabase_url {
        builder = builder.set_override("supabase.endpoint", url)?;
    }
    if let Some(key) = supabase_service_key {
        builder = builder.set_override("supabase.service_key", key)?;
    }
    if let Some(key) = supabase_anon_key {
        builder = builder.set_override("supabase.anon_key", key)?;
    }
    if let Some(secret) = supabase_jwt_secret {
        builder = builder.set_override("auth.jwt_secret", secret)?;
    }
    if let Some(key) = openai_api_key {
        builder = builder.set_override("openai.api_key", key)?;
    }
    if let Some(model) = openai_model {
        builder = builder.set_override("openai.model", model)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = WeightsConfig::default();
        assert_eq!(weights.interests, 40.0);
        assert_eq!(weights.values, 30.0);
        assert_eq!(weights.location, 20.0);
        assert_eq!(weights.age, 10.0);
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_default_extraction_limits() {
        assert_eq!(default_max_content_length(), 50_000);
        assert_eq!(default_fetch_timeout(), 10);
    }
}

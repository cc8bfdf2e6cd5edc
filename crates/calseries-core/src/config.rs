use std::path::PathBuf;

use config::{Config, ConfigBuilder, builder::DefaultState};
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub logging: LoggingConfig,
    #[serde(default)]
    pub timezones: TimezoneConfig,
    pub expansion: ExpansionConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimezoneConfig {
    /// JSON timezone database used to seed the registry.
    pub database: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpansionConfig {
    /// Hand out owned copies of exceptions instead of borrowing them.
    pub fork_exceptions: bool,
    /// Per-series cap on printed occurrences.
    pub max_occurrences: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryConfig {
    pub input: Option<PathBuf>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl Settings {
    fn builder() -> CoreResult<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("logging.level", "info")?
            .set_default("expansion.fork_exceptions", false)?
            .set_default("expansion.max_occurrences", 1000)?)
    }

    /// ## Summary
    /// Loads configuration from environment variables and `config.toml`.
    /// Environment variables take precedence over file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration, deserializing it, or
    /// validating it fails.
    pub fn load() -> CoreResult<Self> {
        let settings = Self::builder()?
            .add_source(config::File::with_name("config.toml").required(false))
            .add_source(
                config::Environment::with_prefix("CALSERIES")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Self>()?;
        settings.validate()?;
        Ok(settings)
    }

    /// ## Summary
    /// Loads configuration from TOML text layered over the defaults.
    ///
    /// ## Errors
    /// Returns an error if the text is not valid TOML or does not describe
    /// valid settings.
    pub fn from_toml(text: &str) -> CoreResult<Self> {
        let settings = Self::builder()?
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize::<Self>()?;
        settings.validate()?;
        Ok(settings)
    }

    /// ## Errors
    /// Returns [`CoreError::ValidationError`] when a value is out of range.
    pub fn validate(&self) -> CoreResult<()> {
        if self.expansion.max_occurrences == 0 {
            return Err(CoreError::ValidationError(
                "expansion.max_occurrences must be at least 1".to_string(),
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "logging.level must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> anyhow::Result<Settings> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    tracing::debug!(level = %settings.logging.level, "Configuration loaded");
    Ok(settings)
}

//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Config file (`gitpersona.toml` in the working directory)
//! 3. Environment variables (GITPERSONA_* prefix)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::Config;
use crate::types::{PersonaError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with the full resolution chain:
    /// defaults → config file → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        let config_path = Self::config_path();
        if config_path.exists() {
            debug!("Loading config from: {}", config_path.display());
            figment = figment.merge(Toml::file(&config_path));
        }

        // e.g. GITPERSONA_OLLAMA_MODEL -> ollama.model
        figment = figment.merge(Env::prefixed("GITPERSONA_").split('_').lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| PersonaError::Config(format!("Configuration error: {e}")))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| PersonaError::Config(format!("Configuration error: {e}")))?;

        config.validate()?;

        Ok(config)
    }

    /// Path to the project config file
    pub fn config_path() -> PathBuf {
        PathBuf::from("gitpersona.toml")
    }

    /// Print the effective merged configuration as TOML
    pub fn show_config() -> Result<()> {
        let config = Self::load()?;
        println!(
            "{}",
            toml::to_string_pretty(&config).map_err(|e| PersonaError::Config(e.to_string()))?
        );
        Ok(())
    }
}

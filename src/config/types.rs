//! Configuration Types
//!
//! All configuration structures with sensible defaults. Every section
//! can be overridden from `gitpersona.toml` or `GITPERSONA_*`
//! environment variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// GitHub API settings
    pub github: GithubConfig,

    /// Local model (Ollama) settings
    pub ollama: OllamaConfig,

    /// Analysis limits
    pub analysis: AnalysisConfig,

    /// Working-directory layout
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            github: GithubConfig::default(),
            ollama: OllamaConfig::default(),
            analysis: AnalysisConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `PersonaError::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if self.ollama.timeout_secs == 0 {
            return Err(crate::types::PersonaError::Config(
                "ollama timeout_secs must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.ollama.temperature) {
            return Err(crate::types::PersonaError::Config(format!(
                "ollama temperature must be between 0.0 and 2.0, got {}",
                self.ollama.temperature
            )));
        }

        if self.analysis.max_repos == 0 {
            return Err(crate::types::PersonaError::Config(
                "analysis max_repos must be at least 1".to_string(),
            ));
        }

        if self.github.timeout_secs == 0 {
            return Err(crate::types::PersonaError::Config(
                "github timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

// =============================================================================
// GitHub Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// REST API base
    pub api_base: String,
    /// Archive download base (codeload)
    pub download_base: String,
    /// Optional personal access token; unauthenticated requests are
    /// rate-limited hard by GitHub.
    pub token: Option<String>,
    /// Branch tried first when downloading an archive
    pub primary_branch: String,
    /// Branch retried once after a 404 on the primary
    pub fallback_branch: String,
    /// Request timeout
    pub timeout_secs: u64,
    /// Pagination cap for repository listings
    pub max_pages: u32,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            download_base: "https://codeload.github.com".to_string(),
            token: None,
            primary_branch: "main".to_string(),
            fallback_branch: "master".to_string(),
            timeout_secs: 60,
            max_pages: 10,
        }
    }
}

// =============================================================================
// Ollama Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Inference endpoint base URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Hard request timeout; expiry becomes an Unknown classification
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "mistral".to_string(),
            temperature: 0.2,
            timeout_secs: 120,
        }
    }
}

// =============================================================================
// Analysis Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Max file size considered by the complexity scanner (bytes)
    pub max_file_size: u64,
    /// Max README bytes embedded into the classification prompt
    pub max_readme_bytes: usize,
    /// Repository cap for `profile <login>`
    pub max_repos: usize,
    /// Skip forked repositories when profiling a user
    pub skip_forks: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_file_size: 1_048_576,
            max_readme_bytes: 16_384,
            max_repos: 5,
            skip_forks: true,
        }
    }
}

// =============================================================================
// Storage Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root working directory; archives land in `<work_dir>/repos`,
    /// request-scoped extractions in `<work_dir>/runs/<id>`
    pub work_dir: PathBuf,
    /// Report file name under `work_dir`
    pub report_file: String,
}

impl StorageConfig {
    pub fn archive_dir(&self) -> PathBuf {
        self.work_dir.join("repos")
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.work_dir.join("runs")
    }

    pub fn report_path(&self) -> PathBuf {
        self.work_dir.join(&self.report_file)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from(".gitpersona"),
            report_file: "report.txt".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.ollama.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_temperature_range() {
        let mut config = Config::default();
        config.ollama.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_storage_paths() {
        let storage = StorageConfig::default();
        assert_eq!(storage.archive_dir(), PathBuf::from(".gitpersona/repos"));
        assert_eq!(storage.report_path(), PathBuf::from(".gitpersona/report.txt"));
    }
}

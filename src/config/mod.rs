//! Configuration system: figment-merged defaults, TOML file, and
//! environment overrides.

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AnalysisConfig, Config, GithubConfig, OllamaConfig, ServerConfig, StorageConfig,
};

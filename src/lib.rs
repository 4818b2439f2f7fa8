//! GitPersona - GitHub developer persona analyzer
//!
//! Downloads repository snapshots, measures cyclomatic complexity with
//! tree-sitter, classifies project origin through a local Ollama model,
//! and renders a textual developer persona. Exposed both as an HTTP
//! service and as CLI subcommands.

pub mod analyzer;
pub mod archive;
pub mod classifier;
pub mod config;
pub mod github;
pub mod persona;
pub mod server;
pub mod types;

pub use config::{Config, ConfigLoader};
pub use server::{AnalysisOutcome, Pipeline};
pub use types::{PersonaError, Result};

//! Repository origin classification.
//!
//! Locates the repository's README, embeds it in a fixed prompt, and
//! asks a local model whether the project reads as Original,
//! AI-Generated, or Copied. Classification is best-effort by contract:
//! every failure path collapses to `(Unknown, reason)` and the
//! pipeline continues.

mod ollama;

pub use ollama::{OllamaGenerator, TextGenerator};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::WalkBuilder;
use tracing::{debug, warn};

use crate::types::{Classification, Origin};

/// README filenames accepted by the discovery walk, lowercase.
const README_NAMES: &[&str] = &["readme.md", "readme.rst", "readme.txt", "readme"];

const NO_README_PLACEHOLDER: &str = "No README found.";

pub struct OriginClassifier {
    generator: Arc<dyn TextGenerator>,
    max_readme_bytes: usize,
}

impl OriginClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>, max_readme_bytes: usize) -> Self {
        Self {
            generator,
            max_readme_bytes,
        }
    }

    /// Classify a repository from its README. Infallible: transport
    /// and parse failures degrade to `Origin::Unknown` with a reason.
    pub async fn classify(&self, repo_name: &str, root: &Path) -> Classification {
        let readme = match find_readme(root) {
            Some(path) => {
                debug!("Using README at {}", path.display());
                match std::fs::read_to_string(&path) {
                    Ok(text) => truncate_utf8(&text, self.max_readme_bytes),
                    Err(e) => {
                        warn!("Failed to read {}: {e}", path.display());
                        NO_README_PLACEHOLDER.to_string()
                    }
                }
            }
            None => NO_README_PLACEHOLDER.to_string(),
        };

        let prompt = build_prompt(repo_name, &readme);

        let raw = match self.generator.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Classification request for {repo_name} failed: {e}");
                return Classification::unknown("Ollama request failed");
            }
        };

        match parse_classification(&raw) {
            Some(classification) => classification,
            None => {
                warn!("Unparseable classification response for {repo_name}");
                Classification::unknown("could not parse model response")
            }
        }
    }
}

/// Find the repository README.
///
/// Canonical deterministic order regardless of filesystem enumeration:
/// shallowest path first, ties broken by lexical path order.
pub fn find_readme(root: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<(usize, PathBuf)> = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(false)
        .follow_links(false)
        .build()
        .filter_map(|e| e.ok())
        .filter(|entry| {
            entry.path().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .map(|name| README_NAMES.contains(&name.to_lowercase().as_str()))
                    .unwrap_or(false)
        })
        .map(|entry| {
            let path = entry.path().to_path_buf();
            let depth = path.components().count();
            (depth, path)
        })
        .collect();

    candidates.sort();
    candidates.into_iter().next().map(|(_, path)| path)
}

/// Fixed classification prompt. The model is instructed to answer as a
/// two-field JSON object with one of three labels.
fn build_prompt(repo_name: &str, readme: &str) -> String {
    format!(
        r#"You are an expert GitHub reviewer. Classify this project.

Project: {repo_name}
README:
{readme}

Options:
- AI-Generated
- Copied
- Original

Respond in JSON:
{{
  "origin": "Original",
  "reason": "Explanation here"
}}"#
    )
}

/// Parse the model's answer into a classification. Tolerates prose or
/// code fences around the JSON; returns None when no usable object is
/// found or the label is not one of the three expected values.
fn parse_classification(raw: &str) -> Option<Classification> {
    let json_text = extract_json(raw);
    let value: serde_json::Value = serde_json::from_str(&json_text).ok()?;

    let origin = Origin::from_label(value.get("origin")?.as_str()?)?;
    let reason = value.get("reason")?.as_str()?.to_string();

    Some(Classification { origin, reason })
}

/// Pull a JSON object out of a possibly chatty model response.
fn extract_json(text: &str) -> String {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find('{')
        && let Some(end) = trimmed.rfind('}')
        && start <= end
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}

/// Truncate on a char boundary at or below `max_bytes`.
fn truncate_utf8(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

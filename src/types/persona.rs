//! Domain model for the analysis pipeline.
//!
//! Everything here lives for exactly one request: parsed identity,
//! per-repo measurements, and the GitHub metadata that feeds the
//! rendered persona.

use serde::{Deserialize, Serialize};
use url::Url;

use super::error::{PersonaError, Result};

/// A repository identity parsed from a GitHub-style URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `https://host/<owner>/<repo>[/...]` into an identity.
    ///
    /// The path must carry at least two non-empty segments; anything
    /// less is rejected before any network call is made.
    pub fn parse(repo_url: &str) -> Result<Self> {
        let url = Url::parse(repo_url)
            .map_err(|e| PersonaError::InvalidUrl(format!("{repo_url}: {e}")))?;

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();

        if segments.len() < 2 {
            return Err(PersonaError::InvalidUrl(format!(
                "expected /<owner>/<repo>, got '{}'",
                url.path()
            )));
        }

        // Strip a trailing ".git" so clone URLs work too.
        let name = segments[1].trim_end_matches(".git");
        if name.is_empty() {
            return Err(PersonaError::InvalidUrl(
                "repository name is empty".to_string(),
            ));
        }

        Ok(Self::new(segments[0], name))
    }

    /// Cache key for the downloaded archive. Owner-qualified so two
    /// users' same-named repos cannot clobber each other.
    pub fn archive_stem(&self) -> String {
        format!("{}-{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Heuristic origin label for a repository.
///
/// `Unknown` is the designated fallback for transport and parse
/// failures; a successful classification only ever yields the other
/// three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Origin {
    Original,
    AiGenerated,
    Copied,
    #[default]
    Unknown,
}

impl Origin {
    /// Parse the label the model was instructed to emit.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Original" => Some(Self::Original),
            "AI-Generated" => Some(Self::AiGenerated),
            "Copied" => Some(Self::Copied),
            _ => None,
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Original => "Original",
            Self::AiGenerated => "AI-Generated",
            Self::Copied => "Copied",
            Self::Unknown => "Unknown",
        };
        write!(f, "{label}")
    }
}

/// Origin label paired with the model's (or fallback) justification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub origin: Origin,
    pub reason: String,
}

impl Classification {
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            origin: Origin::Unknown,
            reason: reason.into(),
        }
    }
}

/// GitHub user metadata used in the persona header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub public_repos: u64,
}

/// One entry from the user's repository listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoSummary {
    pub name: String,
    #[serde(default)]
    pub fork: bool,
}

/// Aggregated cyclomatic-complexity measurement for one repository.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ComplexityReport {
    /// Mean cyclomatic complexity across all functions, rounded to two
    /// decimal places. 0 when no functions were found.
    pub average: f64,
    /// Total functions measured.
    pub functions: usize,
    /// Source files successfully analyzed.
    pub files: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_url() {
        let repo = RepoRef::parse("https://github.com/alice/sample-repo").unwrap();
        assert_eq!(repo.owner, "alice");
        assert_eq!(repo.name, "sample-repo");
        assert_eq!(repo.archive_stem(), "alice-sample-repo");
    }

    #[test]
    fn test_parse_tolerates_extra_segments_and_git_suffix() {
        let repo = RepoRef::parse("https://github.com/alice/tool.git").unwrap();
        assert_eq!(repo.name, "tool");

        let repo = RepoRef::parse("https://github.com/alice/tool/tree/main").unwrap();
        assert_eq!(repo.name, "tool");
    }

    #[test]
    fn test_parse_rejects_short_paths() {
        assert!(RepoRef::parse("https://github.com/alice").is_err());
        assert!(RepoRef::parse("https://github.com/").is_err());
        assert!(RepoRef::parse("not a url").is_err());
    }

    #[test]
    fn test_origin_labels_round_trip() {
        assert_eq!(Origin::from_label("Original"), Some(Origin::Original));
        assert_eq!(Origin::from_label("AI-Generated"), Some(Origin::AiGenerated));
        assert_eq!(Origin::from_label("Copied"), Some(Origin::Copied));
        assert_eq!(Origin::from_label("Unknown"), None);
        assert_eq!(Origin::from_label("something else"), None);
        assert_eq!(Origin::AiGenerated.to_string(), "AI-Generated");
    }

    #[test]
    fn test_user_profile_defaults_on_sparse_json() {
        let user: UserProfile = serde_json::from_str(r#"{"login":"alice"}"#).unwrap();
        assert_eq!(user.login, "alice");
        assert_eq!(user.followers, 0);
        assert!(user.name.is_none());
    }
}

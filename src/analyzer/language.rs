//! Language Detection Module
//!
//! Single source of truth for mapping file extensions to language
//! names. This is a deliberate heuristic, not a content classifier:
//! extensions outside the table are silently ignored.

use std::collections::BTreeMap;
use std::path::Path;

use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};

/// Languages recognized by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Cpp,
    C,
    Go,
    CSharp,
    Php,
    Ruby,
    Swift,
    Kotlin,
    Rust,
}

impl Language {
    /// Map a file extension to a language, if recognized.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "py" => Some(Self::Python),
            "js" => Some(Self::JavaScript),
            "ts" => Some(Self::TypeScript),
            "java" => Some(Self::Java),
            "cpp" => Some(Self::Cpp),
            "c" => Some(Self::C),
            "go" => Some(Self::Go),
            "cs" => Some(Self::CSharp),
            "php" => Some(Self::Php),
            "rb" => Some(Self::Ruby),
            "swift" => Some(Self::Swift),
            "kt" => Some(Self::Kotlin),
            "rs" => Some(Self::Rust),
            _ => None,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Display name used in the rendered persona.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Python => "Python",
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
            Self::Java => "Java",
            Self::Cpp => "C++",
            Self::C => "C",
            Self::Go => "Go",
            Self::CSharp => "C#",
            Self::Php => "PHP",
            Self::Ruby => "Ruby",
            Self::Swift => "Swift",
            Self::Kotlin => "Kotlin",
            Self::Rust => "Rust",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Count recognized source files per language under a directory tree.
///
/// Pure extension bookkeeping; walk errors on individual entries are
/// ignored the way the walker surfaces them (the entry is skipped).
pub fn detect_languages(root: &Path) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(false)
        .follow_links(false)
        .build();

    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(lang) = Language::from_path(path) {
            *counts.entry(lang.display_name().to_string()).or_insert(0) += 1;
        }
    }

    counts
}

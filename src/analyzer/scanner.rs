//! Source file enumeration for the complexity scan.

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use crate::types::Result;

/// Default maximum file size for analysis (1MB)
const DEFAULT_MAX_FILE_SIZE: u64 = 1_048_576;

/// Extensions considered by the complexity analyzer.
const SOURCE_EXTENSIONS: &[&str] = &[
    "c", "cpp", "h", "py", "java", "js", "ts", "cs", "go", "rb", "swift", "kt", "php", "scala",
    "rs",
];

/// Default directories to skip
const DEFAULT_SKIP_DIRS: &[&str] = &[
    "node_modules",
    "target",
    ".git",
    "build",
    "dist",
    "__pycache__",
    "vendor",
    ".venv",
];

pub struct FileScanner {
    root: PathBuf,
    exclude: Vec<String>,
    max_file_size: u64,
}

impl FileScanner {
    /// Scanner over the complexity allow-list with default skip dirs.
    pub fn source_files<P: AsRef<Path>>(root: P) -> Self {
        let exclude = DEFAULT_SKIP_DIRS
            .iter()
            .map(|d| format!("**/{d}/**"))
            .collect();
        Self {
            root: root.as_ref().to_path_buf(),
            exclude,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }

    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(false)
            .follow_links(false)
            .build();

        for entry in walker.filter_map(|e| e.ok()) {
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            if self.should_exclude(path) {
                continue;
            }

            if !has_source_extension(path) {
                continue;
            }

            if let Ok(metadata) = path.metadata() {
                if metadata.len() > self.max_file_size {
                    continue;
                }
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        for pattern in &self.exclude {
            if glob::Pattern::new(pattern)
                .map(|p| p.matches(&path_str))
                .unwrap_or(false)
            {
                return true;
            }
        }

        false
    }
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| SOURCE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

//! Code analysis: language composition and cyclomatic complexity.

pub mod complexity;
pub mod language;
pub mod scanner;

pub use complexity::{FileComplexity, analyze_file, analyze_repo};
pub use language::{Language, detect_languages};
pub use scanner::FileScanner;

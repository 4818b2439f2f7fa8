//! Cyclomatic complexity measurement.
//!
//! Tree-sitter based, multi-language. Each function starts at
//! complexity 1 and gains one point per decision point in its body
//! (branches, loops, catch clauses, boolean short-circuits where the
//! grammar exposes them as nodes). Nested function definitions are
//! measured separately and excluded from their parent's count.
//!
//! Resilience contract: a file the parser cannot handle is logged and
//! skipped; it never aborts the repository scan.

use std::path::Path;

use tracing::{debug, info, warn};
use tree_sitter::Node;

use super::scanner::FileScanner;
use crate::types::{ComplexityReport, PersonaError, Result};

/// Tree-sitter node kinds for one language: which nodes open a new
/// function scope and which count as decision points.
struct GrammarProfile {
    language: tree_sitter::Language,
    function_kinds: &'static [&'static str],
    branch_kinds: &'static [&'static str],
}

/// Look up the grammar profile for a file extension. Extensions in the
/// scanner allow-list without parser support (C#, Swift, PHP, Scala)
/// return None and are skipped with a log line.
fn profile_for_extension(ext: &str) -> Option<GrammarProfile> {
    match ext {
        "py" => Some(GrammarProfile {
            language: tree_sitter_python::LANGUAGE.into(),
            function_kinds: &["function_definition"],
            branch_kinds: &[
                "if_statement",
                "elif_clause",
                "for_statement",
                "while_statement",
                "except_clause",
                "case_clause",
                "boolean_operator",
                "conditional_expression",
            ],
        }),
        "rs" => Some(GrammarProfile {
            language: tree_sitter_rust::LANGUAGE.into(),
            function_kinds: &["function_item"],
            branch_kinds: &[
                "if_expression",
                "match_arm",
                "while_expression",
                "for_expression",
            ],
        }),
        "js" | "ts" => Some(GrammarProfile {
            language: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            function_kinds: &[
                "function_declaration",
                "function_expression",
                "arrow_function",
                "method_definition",
            ],
            branch_kinds: &[
                "if_statement",
                "for_statement",
                "for_in_statement",
                "while_statement",
                "do_statement",
                "switch_case",
                "catch_clause",
                "ternary_expression",
            ],
        }),
        "c" | "h" => Some(GrammarProfile {
            language: tree_sitter_c::LANGUAGE.into(),
            function_kinds: &["function_definition"],
            branch_kinds: &[
                "if_statement",
                "for_statement",
                "while_statement",
                "do_statement",
                "case_statement",
                "conditional_expression",
            ],
        }),
        "cpp" => Some(GrammarProfile {
            language: tree_sitter_cpp::LANGUAGE.into(),
            function_kinds: &["function_definition"],
            branch_kinds: &[
                "if_statement",
                "for_statement",
                "for_range_loop",
                "while_statement",
                "do_statement",
                "case_statement",
                "catch_clause",
                "conditional_expression",
            ],
        }),
        "go" => Some(GrammarProfile {
            language: tree_sitter_go::LANGUAGE.into(),
            function_kinds: &["function_declaration", "method_declaration"],
            branch_kinds: &[
                "if_statement",
                "for_statement",
                "expression_case",
                "type_case",
                "communication_case",
            ],
        }),
        "rb" => Some(GrammarProfile {
            language: tree_sitter_ruby::LANGUAGE.into(),
            function_kinds: &["method", "singleton_method"],
            branch_kinds: &[
                "if", "elsif", "unless", "while", "until", "for", "when", "rescue",
            ],
        }),
        "java" => Some(GrammarProfile {
            language: tree_sitter_java::LANGUAGE.into(),
            function_kinds: &["method_declaration", "constructor_declaration"],
            branch_kinds: &[
                "if_statement",
                "for_statement",
                "enhanced_for_statement",
                "while_statement",
                "do_statement",
                "switch_block_statement_group",
                "catch_clause",
                "ternary_expression",
            ],
        }),
        "kt" => Some(GrammarProfile {
            language: tree_sitter_kotlin_sg::LANGUAGE.into(),
            function_kinds: &["function_declaration"],
            branch_kinds: &[
                "if_expression",
                "when_entry",
                "for_statement",
                "while_statement",
                "do_while_statement",
                "catch_block",
            ],
        }),
        "sh" | "bash" => Some(GrammarProfile {
            language: tree_sitter_bash::LANGUAGE.into(),
            function_kinds: &["function_definition"],
            branch_kinds: &[
                "if_statement",
                "elif_clause",
                "for_statement",
                "while_statement",
                "case_item",
            ],
        }),
        _ => None,
    }
}

/// Per-file measurement: summed function complexities and function count.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileComplexity {
    pub total: u64,
    pub functions: usize,
}

/// Measure one source file. Errors here are per-file and the caller
/// decides whether to skip.
pub fn analyze_file(path: &Path) -> Result<FileComplexity> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    let profile = profile_for_extension(ext).ok_or_else(|| {
        PersonaError::parse(
            path.display().to_string(),
            format!("no parser support for extension '{ext}'"),
        )
    })?;

    let content = std::fs::read_to_string(path)?;
    analyze_source(&content, &profile, path)
}

fn analyze_source(content: &str, profile: &GrammarProfile, path: &Path) -> Result<FileComplexity> {
    let mut parser = tree_sitter::Parser::new();
    parser.set_language(&profile.language).map_err(|e| {
        PersonaError::parse(path.display().to_string(), format!("grammar load failed: {e}"))
    })?;

    let tree = parser.parse(content, None).ok_or_else(|| {
        PersonaError::parse(path.display().to_string(), "parser returned no tree")
    })?;

    let mut result = FileComplexity::default();
    collect_functions(tree.root_node(), profile, &mut result);
    Ok(result)
}

/// Walk the tree looking for function scopes; each one contributes
/// `1 + decision points` to the running total.
fn collect_functions(node: Node, profile: &GrammarProfile, result: &mut FileComplexity) {
    if profile.function_kinds.contains(&node.kind()) {
        result.functions += 1;
        result.total += 1 + count_branches(node, profile, true);
        // Nested functions inside this one are still discovered below;
        // count_branches stops at their boundary so nothing is counted
        // twice.
    }

    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            collect_functions(child, profile, result);
        }
    }
}

/// Count decision-point nodes within a function scope, not descending
/// into nested function definitions.
fn count_branches(node: Node, profile: &GrammarProfile, is_root: bool) -> u64 {
    if !is_root && profile.function_kinds.contains(&node.kind()) {
        return 0;
    }

    let mut count = 0;
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if profile.branch_kinds.contains(&child.kind()) {
                count += 1;
            }
            count += count_branches(child, profile, false);
        }
    }
    count
}

/// Measure a whole repository tree.
///
/// Returns the mean cyclomatic complexity across all functions found,
/// rounded to two decimal places; 0 when no recognized source files
/// matched or no functions were found.
pub fn analyze_repo(root: &Path) -> Result<ComplexityReport> {
    let files = FileScanner::source_files(root).scan()?;

    if files.is_empty() {
        debug!("No supported source files under {}", root.display());
        return Ok(ComplexityReport::default());
    }

    let mut total: u64 = 0;
    let mut functions: usize = 0;
    let mut analyzed: usize = 0;

    for path in &files {
        match analyze_file(path) {
            Ok(file) => {
                total += file.total;
                functions += file.functions;
                analyzed += 1;
            }
            Err(e) => {
                debug!("Skipping {}: {e}", path.display());
            }
        }
    }

    if functions == 0 {
        return Ok(ComplexityReport {
            average: 0.0,
            functions: 0,
            files: analyzed,
        });
    }

    let average = round2(total as f64 / functions as f64);
    info!(
        "Complexity for {}: avg {average} over {functions} functions in {analyzed} files",
        root.display()
    );

    Ok(ComplexityReport {
        average,
        functions,
        files: analyzed,
    })
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! Persona rendering.
//!
//! Pure formatting over the aggregated measurements; no I/O and no
//! failure modes. Division is guarded so an empty analysis renders a
//! zero average instead of erroring.

use std::collections::BTreeMap;

use crate::analyzer::complexity::round2;
use crate::types::{Classification, Origin, UserProfile};

/// Render the developer profile text.
///
/// `languages` is the merged per-language file count across all
/// analyzed repositories; `complexity_scores` and `origins` are keyed
/// by repository name.
pub fn build_persona(
    user: &UserProfile,
    languages: &BTreeMap<String, usize>,
    complexity_scores: &BTreeMap<String, f64>,
    origins: &BTreeMap<String, Classification>,
) -> String {
    let total_repos = complexity_scores.len();
    let avg_complexity = format_score(if total_repos == 0 {
        0.0
    } else {
        round2(complexity_scores.values().sum::<f64>() / total_repos as f64)
    });

    let lang_usage = if languages.is_empty() {
        "none detected".to_string()
    } else {
        languages
            .iter()
            .map(|(name, count)| format!("{name} ({count})"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let repo_list = if total_repos == 0 {
        String::new()
    } else {
        format!(
            " ({})",
            complexity_scores
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        )
    };

    let count_origin = |origin: Origin| {
        origins
            .values()
            .filter(|c| c.origin == origin)
            .count()
    };

    let display_name = user.name.as_deref().unwrap_or("N/A");

    format!(
        "Developer Profile: {login}\n\
         \n\
         Name: {display_name}\n\
         Followers: {followers}\n\
         Public Repositories: {public_repos}\n\
         \n\
         Summary:\n\
         - Languages used: {lang_usage}\n\
         - Projects analyzed: {total_repos}{repo_list}\n\
         - Average Complexity Score: {avg_complexity}\n\
         - Origin Breakdown:\n\
         {indent}- Original: {original}\n\
         {indent}- AI-Generated: {ai}\n\
         {indent}- Copied: {copied}\n\
         \n\
         Final Verdict:\n\
         This developer shows consistent coding habits with a tech stack \
         primarily based on the languages above. Complexity score and origin \
         metadata reflect the developer's style and tooling.\n\
         \n\
         Generated at {generated_at} UTC\n",
        login = user.login,
        generated_at = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"),
        followers = user.followers,
        public_repos = user.public_repos,
        indent = "    ",
        original = count_origin(Origin::Original),
        ai = count_origin(Origin::AiGenerated),
        copied = count_origin(Origin::Copied),
    )
}

/// Render a complexity score with at least one decimal place, so a
/// whole-number average reads "4.0" rather than "4".
fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.1}")
    } else {
        format!("{score}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserProfile {
        UserProfile {
            login: "alice".to_string(),
            name: Some("Alice Doe".to_string()),
            followers: 12,
            public_repos: 7,
        }
    }

    #[test]
    fn test_persona_contains_core_fields() {
        let mut languages = BTreeMap::new();
        languages.insert("Python".to_string(), 3);
        languages.insert("Rust".to_string(), 1);

        let mut scores = BTreeMap::new();
        scores.insert("sample-repo".to_string(), 4.0);

        let mut origins = BTreeMap::new();
        origins.insert(
            "sample-repo".to_string(),
            Classification {
                origin: Origin::Original,
                reason: "looks handwritten".to_string(),
            },
        );

        let persona = build_persona(&user(), &languages, &scores, &origins);

        assert!(persona.contains("alice"));
        assert!(persona.contains("Alice Doe"));
        assert!(persona.contains("Followers: 12"));
        assert!(persona.contains("Python (3), Rust (1)"));
        assert!(persona.contains("Projects analyzed: 1 (sample-repo)"));
        assert!(persona.contains("Average Complexity Score: 4.0"));
        assert!(persona.contains("- Original: 1"));
        assert!(persona.contains("- AI-Generated: 0"));
        assert!(persona.contains("- Copied: 0"));
    }

    #[test]
    fn test_persona_zero_repos_average_is_zero() {
        let persona = build_persona(
            &user(),
            &BTreeMap::new(),
            &BTreeMap::new(),
            &BTreeMap::new(),
        );
        assert!(persona.contains("Average Complexity Score: 0.0"));
        assert!(persona.contains("Projects analyzed: 0"));
        assert!(persona.contains("Languages used: none detected"));
    }

    #[test]
    fn test_persona_mean_of_scores() {
        let mut scores = BTreeMap::new();
        scores.insert("a".to_string(), 2.0);
        scores.insert("b".to_string(), 5.0);

        let persona = build_persona(&user(), &BTreeMap::new(), &scores, &BTreeMap::new());
        assert!(persona.contains("Average Complexity Score: 3.5"));
    }

    #[test]
    fn test_whole_number_average_keeps_decimal() {
        let mut scores = BTreeMap::new();
        scores.insert("sample-repo".to_string(), 4.0);

        let persona = build_persona(&user(), &BTreeMap::new(), &scores, &BTreeMap::new());
        assert!(persona.contains("Average Complexity Score: 4.0"));
    }

    #[test]
    fn test_persona_missing_display_name() {
        let mut u = user();
        u.name = None;
        let persona = build_persona(&u, &BTreeMap::new(), &BTreeMap::new(), &BTreeMap::new());
        assert!(persona.contains("Name: N/A"));
    }
}

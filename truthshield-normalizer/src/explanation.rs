use crate::sections;
use regex::Regex;
use std::sync::LazyLock;

static HEADING_HASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[^\S\n]*(?:#+[^\S\n]*)+").expect("valid regex"));
static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").expect("valid regex"));
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

/// Pick the explanation prose out of a full response and clean it.
///
/// Responses that use `VERDICT` markers are expected to carry a labelled
/// `EXPLANATION` block; a block shorter than `min_chars` is treated as
/// missing. Otherwise everything ahead of the `SOURCES` marker is used.
pub fn extract_explanation(text: &str, min_chars: usize) -> String {
    let labelled = if sections::has_verdict_marker(text) {
        sections::explanation_section(text).filter(|s| s.chars().count() >= min_chars)
    } else {
        None
    };

    match labelled {
        Some(section) => clean_explanation(&section),
        None => clean_explanation(sections::before_sources(text)),
    }
}

/// Strip markdown noise while keeping `[n]` citation markers.
///
/// Applying it to its own output changes nothing.
pub fn clean_explanation(text: &str) -> String {
    let text = text.replace("**", "");
    let text = HEADING_HASHES.replace_all(&text, "");
    let text = SPACE_RUNS.replace_all(&text, " ");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    text.trim().to_string()
}

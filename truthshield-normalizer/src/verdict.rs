use crate::record::Verdict;
use crate::sections;
use regex::Regex;
use std::sync::LazyLock;

static POSITIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:true|accurate|correct|verified)\b").expect("valid regex")
});
static NEGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:false|inaccurate|incorrect|misleading)\b").expect("valid regex")
});
static PARTIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:(?:partially|partly|mostly|somewhat)\s+true|mixed)\b")
        .expect("valid regex")
});
/// Phrases that cancel a positive hit in the same section.
static QUALIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bnot\s+(?:true|accurate|correct|verified)\b|\bunclear\b|\bcannot\s+verify\b")
        .expect("valid regex")
});

// Full-text fallbacks. `[^\n]*` keeps each match on one line.
static CONCLUDES_PARTIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:overall|verdict|conclusion|claim)\b[^\n]*?\b(?:(?:partially|partly|mostly|somewhat)\s+true|mixed)\b",
    )
    .expect("valid regex")
});
static CONCLUDES_TRUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:overall|verdict|conclusion)\b[^\n]*?\btrue\b|\bclaim\b[^\n]*?\b(?:true|accurate|correct)\b",
    )
    .expect("valid regex")
});
static CONTRADICTS_TRUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\boverall\b[^\n]*?\bfalse\b|\bnot\s+true\b").expect("valid regex")
});

/// Determine the verdict of a full LLM response.
///
/// The labelled `VERDICT` section is scanned first (falling back to the first
/// paragraph), then the whole text. A negative term or qualifier inside the
/// section keeps the full-text pass from concluding `True`. Absent any signal
/// the result is [`Verdict::False`].
pub fn extract_verdict(text: &str) -> Verdict {
    let section = sections::verdict_section(text);
    let verdict_text = match section.as_deref() {
        Some(found) => found,
        None => sections::first_paragraph(text),
    };

    if let Some(verdict) = classify_section(verdict_text) {
        return verdict;
    }
    if let Some(verdict) = classify_full_text(text, has_negative_signal(verdict_text)) {
        return verdict;
    }

    tracing::debug!(
        has_section = section.is_some(),
        verdict_text_len = verdict_text.len(),
        "normalizer.verdict.defaulted"
    );
    Verdict::False
}

/// Scan of the verdict section alone. Partial signals beat positive ones.
pub fn classify_section(verdict_text: &str) -> Option<Verdict> {
    if PARTIAL.is_match(verdict_text) {
        return Some(Verdict::PartiallyTrue);
    }

    let positive = POSITIVE.is_match(verdict_text) && !QUALIFIER.is_match(verdict_text);
    if positive && !NEGATIVE.is_match(verdict_text) {
        return Some(Verdict::True);
    }
    None
}

/// Conclusion-style phrasing anywhere in the response.
pub fn classify_full_text(text: &str, section_negative: bool) -> Option<Verdict> {
    if CONCLUDES_PARTIAL.is_match(text) {
        return Some(Verdict::PartiallyTrue);
    }
    if !section_negative && CONCLUDES_TRUE.is_match(text) && !CONTRADICTS_TRUE.is_match(text) {
        return Some(Verdict::True);
    }
    None
}

fn has_negative_signal(verdict_text: &str) -> bool {
    NEGATIVE.is_match(verdict_text) || QUALIFIER.is_match(verdict_text)
}

//! Locating the labelled blocks (`VERDICT`, `EXPLANATION`, `SOURCES`) that the
//! verification prompt asks the model to emit.
//!
//! Each label may appear as `**LABEL**`, `[LABEL]` or `LABEL:`, in any case.
//! A section runs until the next upper-case labelled marker (`**WORD**`,
//! `[WORD]`, `VERDICT:`/`EXPLANATION:`/`SOURCES:`) or the end of the text.
//! Numeric citation markers like `[1]` never terminate a section, and a bold
//! word right at the start of a section (`**VERDICT** **FALSE**`) is content.
//!
//! The `SOURCES` list is the exception: its lines routinely carry tags such
//! as `1. [NASA] ...` or `1. **BBC NEWS** ...`, so only one of the three
//! known labels ends it.

use regex::Regex;
use std::sync::LazyLock;

static VERDICT_MARKER: LazyLock<Regex> = LazyLock::new(|| marker_regex("VERDICT"));
static EXPLANATION_MARKER: LazyLock<Regex> = LazyLock::new(|| marker_regex("EXPLANATION"));
static SOURCES_MARKER: LazyLock<Regex> = LazyLock::new(|| marker_regex("SOURCES"));

/// Upper-case labelled markers that close a section. Case-sensitive.
static SECTION_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\*\*[A-Z][A-Z ]{2,}\*\*|\[[A-Z][A-Z ]{3,}\]|(?:\*\*)?\b(?:VERDICT|EXPLANATION|SOURCES):",
    )
    .expect("valid section end regex")
});

/// The known labels in any of the marker forms. Bold and bracket forms are
/// case-insensitive, the bare colon form must be upper-case.
static LABEL_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i:\*\*(?:VERDICT|EXPLANATION|SOURCES):?\*\*|\[(?:VERDICT|EXPLANATION|SOURCES)\])|\b(?:VERDICT|EXPLANATION|SOURCES):",
    )
    .expect("valid label end regex")
});

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t\r]*\n").expect("valid regex"));

fn marker_regex(label: &str) -> Regex {
    Regex::new(&format!(r"(?i)(?:\*\*{label}\*\*|\[{label}\]|\b{label}:)"))
        .expect("valid marker regex")
}

/// Body following the first marker, without the dangling punctuation of
/// `**VERDICT**:` or `**VERDICT:**` and without leading whitespace.
fn body_after<'a>(marker: &Regex, text: &'a str) -> Option<&'a str> {
    let found = marker.find(text)?;
    let body = text[found.end()..].trim_start();
    let body = if found.as_str().ends_with(':') {
        body.strip_prefix("**").unwrap_or(body)
    } else {
        body.strip_prefix(':').unwrap_or(body)
    };
    Some(body.trim_start())
}

fn labelled_section(marker: &Regex, end: &Regex, text: &str) -> Option<String> {
    let body = body_after(marker, text)?;
    let end = end
        .find_iter(body)
        .find(|m| !(m.start() == 0 && m.as_str().ends_with("**")))
        .map_or(body.len(), |m| m.start());
    Some(body[..end].trim().to_string())
}

/// Text of the first `VERDICT` section, if any marker is present.
pub fn verdict_section(text: &str) -> Option<String> {
    labelled_section(&VERDICT_MARKER, &SECTION_END, text)
}

/// Text of the first `SOURCES` section, if any marker is present.
pub fn sources_section(text: &str) -> Option<String> {
    labelled_section(&SOURCES_MARKER, &LABEL_END, text)
}

/// Text of the `EXPLANATION` section. It runs up to the `SOURCES` marker
/// rather than the next generic marker so inline `[n]` citations survive.
pub fn explanation_section(text: &str) -> Option<String> {
    let body = body_after(&EXPLANATION_MARKER, text)?;
    Some(before_sources(body).trim().to_string())
}

pub fn has_verdict_marker(text: &str) -> bool {
    VERDICT_MARKER.is_match(text)
}

/// Everything before the first `SOURCES` marker, or the whole text.
pub fn before_sources(text: &str) -> &str {
    match SOURCES_MARKER.find(text) {
        Some(m) => &text[..m.start()],
        None => text,
    }
}

/// First non-blank paragraph, trimmed.
pub fn first_paragraph(text: &str) -> &str {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .find(|p| !p.is_empty())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRUCTURED: &str = "[VERDICT] False\n\n[EXPLANATION] The figure was never reported [1] and \
         the quoted source denies it [2].\n\n[SOURCES]\n[1] - Reuters fact check\n[2] - AP News";

    #[test]
    fn bracket_sections_are_split() {
        assert_eq!(verdict_section(STRUCTURED).as_deref(), Some("False"));
        let explanation = explanation_section(STRUCTURED).unwrap();
        assert!(explanation.starts_with("The figure"));
        assert!(explanation.ends_with("denies it [2]."));
        assert_eq!(
            sources_section(STRUCTURED).as_deref(),
            Some("[1] - Reuters fact check\n[2] - AP News")
        );
    }

    #[test]
    fn bold_and_colon_markers_are_recognised() {
        let text = "**Verdict**: Partially true\n**EXPLANATION** Some details.\nSOURCES: 1. Site";
        assert_eq!(verdict_section(text).as_deref(), Some("Partially true"));
        assert_eq!(sources_section(text).as_deref(), Some("1. Site"));

        let colon = "VERDICT: True. EXPLANATION: It checks out.";
        assert_eq!(verdict_section(colon).as_deref(), Some("True."));
    }

    #[test]
    fn bold_value_right_after_marker_is_content() {
        let text = "**VERDICT**\n**FALSE**\n\n**EXPLANATION**\nNo record exists.";
        assert_eq!(verdict_section(text).as_deref(), Some("**FALSE**"));

        let inline = "**VERDICT:** True\n**EXPLANATION:** Confirmed.";
        assert_eq!(verdict_section(inline).as_deref(), Some("True"));
        assert_eq!(explanation_section(inline).as_deref(), Some("Confirmed."));
    }

    #[test]
    fn citation_markers_do_not_end_a_section() {
        let text = "[VERDICT] True [1] per official data [2].";
        assert_eq!(
            verdict_section(text).as_deref(),
            Some("True [1] per official data [2].")
        );
    }

    #[test]
    fn tagged_source_lines_stay_in_the_list() {
        let bracketed = "[SOURCES]\n1. [NASA] Apollo 11 archive\n2. [REUTERS] Fact check";
        assert_eq!(
            sources_section(bracketed).as_deref(),
            Some("1. [NASA] Apollo 11 archive\n2. [REUTERS] Fact check")
        );

        let bold = "SOURCES:\n1. **BBC NEWS** report\n2. Census office";
        assert_eq!(
            sources_section(bold).as_deref(),
            Some("1. **BBC NEWS** report\n2. Census office")
        );
    }

    #[test]
    fn sources_end_at_a_known_label() {
        let text = "[SOURCES]\n1. [NASA] Archive\n**Verdict**: False";
        assert_eq!(sources_section(text).as_deref(), Some("1. [NASA] Archive"));

        let trailing = "SOURCES: 1. Site\nEXPLANATION: moved below";
        assert_eq!(sources_section(trailing).as_deref(), Some("1. Site"));
    }

    #[test]
    fn missing_markers_yield_none() {
        assert!(verdict_section("plain prose").is_none());
        assert!(sources_section("plain prose").is_none());
        assert!(explanation_section("plain prose").is_none());
        assert!(!has_verdict_marker("plain prose"));
    }

    #[test]
    fn before_sources_cuts_at_marker() {
        assert_eq!(before_sources("Body text. SOURCES: 1. x"), "Body text. ");
        assert_eq!(before_sources("no list here"), "no list here");
        assert_eq!(before_sources("Resources: many"), "Resources: many");
    }

    #[test]
    fn first_paragraph_skips_blank_lead() {
        assert_eq!(first_paragraph("\n\n  First one.\n\nSecond."), "First one.");
        assert_eq!(first_paragraph(""), "");
    }
}

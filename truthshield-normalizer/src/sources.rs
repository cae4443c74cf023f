//! Source-list extraction and reconciliation with the upstream `citations`.
//!
//! The search-augmented model returns a `citations` array whose positions are
//! *implied* to match the `[n]` markers in its prose. That correspondence is a
//! convention of the API, not a guarantee, so everything here is best-effort:
//! a line that cannot be resolved to a URL keeps an empty `url`, and a marker
//! without any source is left dangling for the renderer to tolerate.

use crate::record::{Source, SourceRef};
use crate::sections;
use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>()\[\]"']+"#).expect("valid regex"));
static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)\s]*)\)").expect("valid regex"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•]\s+)+").expect("valid regex"));

/// `[n] - description`
static BRACKETED_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(\d+)\]\s*(?:[-–—:.]\s*)?(.*)$").expect("valid regex")
});
/// `n. [anything] description`
static NUMBERED_WITH_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)[.)]\s*\[([^\]]*)\]\s*(.*)$").expect("valid regex"));
/// `n. description`
static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)[.)]\s*(.*)$").expect("valid regex"));
static INLINE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]").expect("valid regex"));
static LEADING_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\[(\d+)\]|(\d+)[.)])\s*").expect("valid regex"));

/// Output of [`extract_sources`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedSources {
    pub sources: Vec<Source>,
    pub source_refs: BTreeMap<u32, SourceRef>,
}

/// Extract the ordered, de-duplicated source list of a full response.
///
/// A non-empty `citations` slice switches to citation reconciliation; an
/// empty one is treated like no citations at all.
pub fn extract_sources(text: &str, citations: Option<&[String]>) -> ExtractedSources {
    let sources_text = sections::sources_section(text).unwrap_or_default();

    let sources = match citations {
        Some(citations) if !citations.is_empty() => {
            sources_with_citations(&sources_text, citations)
        }
        _ => sources_without_citations(&sources_text),
    };

    let mut sources = dedup_by_url(sources);
    order_by_ref(&mut sources);
    let source_refs = build_source_refs(&sources);

    ExtractedSources {
        sources,
        source_refs,
    }
}

/// A source line reduced to its reference number and free-text description.
#[derive(Debug, PartialEq, Eq)]
struct NumberedLine<'a> {
    ref_number: u32,
    description: String,
    tag: Option<&'a str>,
}

fn parse_number(caps: &Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group)?.as_str().parse().ok()
}

/// Try the three numbered-line shapes in priority order.
fn parse_numbered_line(line: &str) -> Option<NumberedLine<'_>> {
    if let Some(caps) = BRACKETED_REF.captures(line) {
        if let Some(ref_number) = parse_number(&caps, 1) {
            return Some(NumberedLine {
                ref_number,
                description: caps[2].to_string(),
                tag: None,
            });
        }
    }
    if let Some(caps) = NUMBERED_WITH_TAG.captures(line) {
        if let Some(ref_number) = parse_number(&caps, 1) {
            return Some(NumberedLine {
                ref_number,
                description: caps[3].to_string(),
                tag: caps.get(2).map(|m| m.as_str()),
            });
        }
    }
    if let Some(caps) = NUMBERED.captures(line) {
        if let Some(ref_number) = parse_number(&caps, 1) {
            return Some(NumberedLine {
                ref_number,
                description: caps[2].to_string(),
                tag: None,
            });
        }
    }
    None
}

fn source_lines(sources_text: &str) -> impl Iterator<Item = &str> {
    sources_text
        .lines()
        .map(|line| {
            let line = line.trim();
            match BULLET.find(line) {
                Some(m) => line[m.end()..].trim_start(),
                None => line,
            }
        })
        .filter(|line| !line.is_empty())
}

fn sources_with_citations(sources_text: &str, citations: &[String]) -> Vec<Source> {
    let mut by_ref: BTreeMap<u32, String> = citations
        .iter()
        .enumerate()
        .filter_map(|(idx, url)| Some((u32::try_from(idx + 1).ok()?, url.trim().to_string())))
        .collect();

    let mut sources = Vec::new();
    for line in source_lines(sources_text) {
        if let Some(parsed) = parse_numbered_line(line) {
            if let Some(found) = first_url(line) {
                by_ref.entry(parsed.ref_number).or_insert(found);
            }
            let title = numbered_title(&parsed);
            let url = by_ref.get(&parsed.ref_number).cloned().unwrap_or_default();
            sources.push(Source::new(title, url, Some(parsed.ref_number)));
            continue;
        }

        let Some(found) = first_url(line) else {
            continue;
        };
        match inline_ref(line) {
            Some(ref_number) => {
                by_ref.entry(ref_number).or_insert_with(|| found.clone());
                let title = non_empty(clean_title(&strip_refs(line)))
                    .unwrap_or_else(|| format!("Source {ref_number}"));
                let url = by_ref.get(&ref_number).cloned().unwrap_or(found);
                sources.push(Source::new(title, url, Some(ref_number)));
            }
            None => {
                let title = non_empty(clean_title(line))
                    .or_else(|| domain_of(&found))
                    .unwrap_or_else(|| found.clone());
                sources.push(Source::new(title, found, None));
            }
        }
    }

    if sources.is_empty() {
        tracing::debug!(
            citations = citations.len(),
            "normalizer.sources.citation_fallback"
        );
        return citation_fallback(citations);
    }
    sources
}

/// One source per citation, in order, when the prose listed none we could read.
fn citation_fallback(citations: &[String]) -> Vec<Source> {
    citations
        .iter()
        .enumerate()
        .map(|(idx, url)| {
            let position = idx + 1;
            let url = url.trim();
            let domain = domain_of(url).unwrap_or_else(|| url.to_string());
            Source::new(
                format!("Source {position}: {domain}"),
                url,
                u32::try_from(position).ok(),
            )
        })
        .collect()
}

fn sources_without_citations(sources_text: &str) -> Vec<Source> {
    let mut sources = Vec::new();
    for (idx, line) in source_lines(sources_text).enumerate() {
        let position = u32::try_from(idx + 1).unwrap_or(u32::MAX);

        if let Some(found) = first_url(line) {
            let ref_number = leading_ref(line).or_else(|| inline_ref(line));
            let title = non_empty(clean_title(&strip_refs(line)))
                .or_else(|| domain_of(&found))
                .unwrap_or_else(|| found.clone());
            sources.push(Source::new(title, found, ref_number.or(Some(position))));
        } else if let Some(parsed) = parse_numbered_line(line) {
            let title = numbered_title(&parsed);
            sources.push(Source::new(title, "", Some(parsed.ref_number)));
        } else if line.chars().count() > 5 {
            if let Some(title) = non_empty(clean_title(line)) {
                sources.push(Source::new(title, "", Some(position)));
            }
        }
    }
    sources
}

fn numbered_title(parsed: &NumberedLine<'_>) -> String {
    non_empty(clean_title(&parsed.description))
        .or_else(|| parsed.tag.and_then(|tag| non_empty(clean_title(tag))))
        .unwrap_or_else(|| format!("Source {}", parsed.ref_number))
}

fn first_url(line: &str) -> Option<String> {
    URL.find(line).map(|m| {
        m.as_str()
            .trim_end_matches(['.', ',', ';', ':', '!', '?', '*'])
            .to_string()
    })
}

fn inline_ref(line: &str) -> Option<u32> {
    INLINE_REF
        .captures(line)
        .and_then(|caps| parse_number(&caps, 1))
}

/// Every `[n]` marker in `text`, in order of appearance, repeats included.
pub fn citation_markers(text: &str) -> Vec<u32> {
    INLINE_REF
        .captures_iter(text)
        .filter_map(|caps| parse_number(&caps, 1))
        .collect()
}

fn leading_ref(line: &str) -> Option<u32> {
    LEADING_REF
        .captures(line)
        .and_then(|caps| parse_number(&caps, 1).or_else(|| parse_number(&caps, 2)))
}

fn strip_refs(line: &str) -> String {
    let without_leading = LEADING_REF.replace(line, "");
    INLINE_REF.replace_all(&without_leading, "").into_owned()
}

/// Human-readable title from a description: links, URLs, bold markers and
/// dangling separators removed.
fn clean_title(description: &str) -> String {
    let text = MARKDOWN_LINK.replace_all(description, "$1");
    let text = URL.replace_all(&text, "");
    let text = text.replace("**", "").replace("()", "").replace("<>", "");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    text.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '-' | '–' | '—' | ':' | '|' | ',' | ';')
    })
    .to_string()
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

pub(crate) fn domain_of(raw: &str) -> Option<String> {
    url::Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

/// Drop repeated non-empty URLs, keeping the first; link-less entries always stay.
pub fn dedup_by_url(sources: Vec<Source>) -> Vec<Source> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .filter(|s| s.url.is_empty() || seen.insert(s.url.clone()))
        .collect()
}

/// Stable ascending order by `ref_number`. Entries that carry a number are
/// sorted among the positions they occupy; entries without one never move.
pub fn order_by_ref(sources: &mut [Source]) {
    let slots: Vec<usize> = sources
        .iter()
        .enumerate()
        .filter(|(_, s)| s.ref_number.is_some())
        .map(|(idx, _)| idx)
        .collect();

    let mut numbered: Vec<Source> = slots.iter().map(|&idx| sources[idx].clone()).collect();
    numbered.sort_by_key(|s| s.ref_number);

    for (slot, source) in slots.into_iter().zip(numbered) {
        sources[slot] = source;
    }
}

/// First source per reference number wins.
pub fn build_source_refs(sources: &[Source]) -> BTreeMap<u32, SourceRef> {
    let mut refs = BTreeMap::new();
    for source in sources {
        if let Some(n) = source.ref_number {
            refs.entry(n).or_insert_with(|| SourceRef {
                url: source.url.clone(),
                title: source.title.clone(),
            });
        }
    }
    refs
}

use crate::record::{Source, SourceBalance};

/// Vocabulary terms found anywhere in the lower-cased response, in vocabulary
/// order. `None` when nothing matched so the field can be omitted.
pub fn propaganda_indicators(text: &str, vocabulary: &[String]) -> Option<Vec<String>> {
    let lowered = text.to_lowercase();
    let mut found: Vec<String> = Vec::new();
    for term in vocabulary {
        let term = term.to_lowercase();
        if !term.is_empty() && lowered.contains(&term) && !found.contains(&term) {
            found.push(term);
        }
    }
    (!found.is_empty()).then_some(found)
}

/// Diversity flags over the final source list.
///
/// International detection is a substring test on the URL, so
/// `https://bbc.co.uk/...` and `https://example.in.net/...` both count.
pub fn source_balance(sources: &[Source], international_tlds: &[String]) -> SourceBalance {
    let has_international_sources = sources.iter().any(|source| {
        let url = source.url.to_lowercase();
        international_tlds
            .iter()
            .any(|tld| !tld.is_empty() && url.contains(&tld.to_lowercase()))
    });

    SourceBalance {
        has_multiple_sources: sources.len() > 1,
        has_international_sources,
    }
}

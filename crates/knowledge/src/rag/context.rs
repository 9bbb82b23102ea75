//! Grounding context assembly.

use crate::rag::types::SourceRef;
use crate::types::SearchResult;

/// Maximum snippet length in characters.
const SNIPPET_CHARS: usize = 160;

/// Render retrieved passages for the prompt, best match first.
pub fn build_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| {
            format!(
                "[Document {} - {} (relevance: {:.2})]:\n{}\n",
                r.rank, r.source_id, r.similarity_score, r.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// User-facing references for the retrieved passages.
pub fn map_sources(results: &[SearchResult]) -> Vec<SourceRef> {
    results
        .iter()
        .map(|r| SourceRef {
            source: r.source_id.clone(),
            chunk_index: r.chunk_index,
            score: r.similarity_score,
            snippet: truncate_snippet(&r.text, SNIPPET_CHARS),
        })
        .collect()
}

/// Truncate to `max_chars` characters, preferring a word boundary.
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    let cut = match text.char_indices().nth(max_chars) {
        Some((byte, _)) => byte,
        None => return text.to_string(),
    };

    let truncated = &text[..cut];
    match truncated.rfind(char::is_whitespace) {
        Some(space) if space > 0 => format!("{}...", truncated[..space].trim_end()),
        _ => format!("{}...", truncated),
    }
}

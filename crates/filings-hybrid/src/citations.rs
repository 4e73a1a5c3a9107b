//! Numbered source blocks and `[n]` citation markers.

use std::collections::BTreeSet;

use filings_core::Chunk;

/// Chunks beyond this many are left out of the context block.
pub const MAX_CONTEXT_CHUNKS: usize = 5;

/// `[n] COMPANY 10-K YEAR, SECTION`
pub fn format_source_label(number: usize, chunk: &Chunk) -> String {
    format!("[{number}] {}", chunk.source_label())
}

/// Sources block for a generator prompt: one numbered, quoted entry per
/// chunk (at most `max_chunks`), followed by the question.
pub fn format_context(query: &str, chunks: &[Chunk], max_chunks: usize) -> String {
    let sources: Vec<String> = chunks
        .iter()
        .take(max_chunks)
        .enumerate()
        .map(|(i, c)| format!("{}\n\"{}\"", format_source_label(i + 1, c), c.text))
        .collect();
    format!("Sources:\n{}\n\nQuestion: {query}", sources.join("\n\n"))
}

/// Source numbers cited as `[n]` in generated text.
pub fn extract_citations(text: &str) -> BTreeSet<usize> {
    let mut found = BTreeSet::new();
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        rest = &rest[open + 1..];
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 && rest[digits..].starts_with(']') {
            if let Ok(n) = rest[..digits].parse() {
                found.insert(n);
            }
        }
    }
    found
}

/// Chunks referenced by `answer`, paired with their source number.
pub fn cited_sources<'a>(answer: &str, chunks: &'a [Chunk], max_chunks: usize) -> Vec<(usize, &'a Chunk)> {
    let cited = extract_citations(answer);
    chunks
        .iter()
        .take(max_chunks)
        .enumerate()
        .map(|(i, c)| (i + 1, c))
        .filter(|(n, _)| cited.contains(n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks() -> Vec<Chunk> {
        vec![
            Chunk::with_id("c1", "Revenue grew 8%.", "AAPL", 2023, "Item 7"),
            Chunk::with_id("c2", "Supply risk.", "AAPL", 2023, "Item 1A"),
        ]
    }

    #[test]
    fn context_block_numbers_sources() {
        let ctx = format_context("How did revenue change?", &chunks(), MAX_CONTEXT_CHUNKS);
        assert_eq!(
            ctx,
            "Sources:\n[1] AAPL 10-K 2023, Item 7\n\"Revenue grew 8%.\"\n\n[2] AAPL 10-K 2023, Item 1A\n\"Supply risk.\"\n\nQuestion: How did revenue change?"
        );
        assert!(!format_context("q", &chunks(), 1).contains("[2]"));
    }

    #[test]
    fn citations_are_parsed() {
        let got = extract_citations("Sales rose [1] while risk [2][12] and [x] [3 ] [] stayed [1].");
        assert_eq!(got.into_iter().collect::<Vec<_>>(), vec![1, 2, 12]);
        assert!(extract_citations("no markers").is_empty());
    }

    #[test]
    fn cited_sources_follow_numbering() {
        let cs = chunks();
        let cited = cited_sources("See [2] and [7].", &cs, MAX_CONTEXT_CHUNKS);
        assert_eq!(cited.len(), 1);
        assert_eq!(cited[0].0, 2);
        assert_eq!(cited[0].1.chunk_id, "c2");
    }
}

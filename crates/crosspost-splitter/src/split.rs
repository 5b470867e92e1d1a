//! The chunking pass: greedy sentence packing with a word-boundary fallback.

use serde::{Deserialize, Serialize};

use crosspost_model::Platform;

use crate::counting::measure;
use crate::extract::{SpecialContent, extract};
use crate::sentences::detect_sentences;

/// Units reserved at the end of every chunk for the `" (i/N)"` numbering
/// suffix appended when a split produces more than one chunk.
const RESERVED_SUFFIX: usize = 10;

/// Result of splitting one text for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitResult {
    pub platform: Platform,
    pub chunks: Vec<String>,
    pub needs_splitting: bool,
}

/// Split `text` into platform-compliant chunks.
///
/// Text that fits the platform limit is returned as a single untouched
/// chunk. Otherwise URLs, hashtags, and mentions are masked, the text is
/// packed sentence-by-sentence against the limit minus the reserved suffix
/// space, oversized sentences fall back to word-boundary packing, and the
/// restored chunks are numbered `" (i/N)"` when more than one resulted.
///
/// Every chunk measures within the platform limit except when a single
/// unsplittable token exceeds it by itself; such a token is surfaced as an
/// oversized chunk rather than an error.
pub fn split(text: &str, platform: Platform) -> SplitResult {
    let max_len = platform.max_post_len();

    if measure(text, platform) <= max_len {
        return SplitResult {
            platform,
            chunks: vec![text.to_string()],
            needs_splitting: false,
        };
    }

    let (masked, special) = extract(text);
    let sentences = detect_sentences(&masked);
    let effective_limit = max_len - RESERVED_SUFFIX;

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for sentence in &sentences {
        if fits(&current, sentence, &special, platform, effective_limit) {
            current.push_str(sentence);
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        if fits("", sentence, &special, platform, effective_limit) {
            current.push_str(sentence);
        } else {
            // The sentence alone exceeds the limit: pack it word by word.
            // Whatever remains keeps accumulating into the next sentence.
            for word in split_words(sentence) {
                if fits(&current, word, &special, platform, effective_limit) {
                    current.push_str(word);
                } else {
                    if !current.is_empty() {
                        chunks.push(std::mem::take(&mut current));
                    }
                    current.push_str(word);
                }
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    let total = chunks.len();
    let chunks = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let restored = special.restore(chunk);
            let trimmed = restored.trim();
            if total > 1 {
                format!("{trimmed} ({}/{})", i + 1, total)
            } else {
                trimmed.to_string()
            }
        })
        .collect();

    SplitResult {
        platform,
        chunks,
        needs_splitting: true,
    }
}

/// Split `text` for each platform in turn.
pub fn split_for_platforms(text: &str, platforms: &[Platform]) -> Vec<SplitResult> {
    platforms.iter().map(|&p| split(text, p)).collect()
}

/// Would `current + addition`, with placeholders restored, still fit?
/// Measured on restored text so masked URLs are charged at their real rate.
fn fits(
    current: &str,
    addition: &str,
    special: &SpecialContent,
    platform: Platform,
    limit: usize,
) -> bool {
    let candidate = format!("{current}{addition}");
    measure(&special.restore(&candidate), platform) <= limit
}

/// Split a sentence into alternating runs of non-whitespace and whitespace,
/// so packing on word boundaries keeps each word's trailing spacing with it.
fn split_words(sentence: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut in_whitespace: Option<bool> = None;

    for (i, c) in sentence.char_indices() {
        let ws = c.is_whitespace();
        match in_whitespace {
            None => in_whitespace = Some(ws),
            Some(prev) if prev != ws => {
                runs.push(&sentence[start..i]);
                start = i;
                in_whitespace = Some(ws);
            }
            _ => {}
        }
    }
    if start < sentence.len() {
        runs.push(&sentence[start..]);
    }

    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    /// Strip the `" (i/N)"` numbering suffix, if present.
    fn strip_suffix(chunk: &str) -> &str {
        match chunk.rfind(" (") {
            Some(idx) if chunk.ends_with(')') => &chunk[..idx],
            _ => chunk,
        }
    }

    fn without_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_short_text_is_untouched() {
        let result = split("Just a short post.", Platform::Twitter);
        assert_eq!(result.chunks, vec!["Just a short post."]);
        assert!(!result.needs_splitting);
    }

    #[test]
    fn test_text_at_exact_limit_is_untouched() {
        let text = "a".repeat(280);
        let result = split(&text, Platform::Twitter);
        assert!(!result.needs_splitting);
        assert_eq!(result.chunks, vec![text]);
    }

    #[test]
    fn test_long_text_splits_within_limit() {
        let text = "This is a sentence that fills some room. ".repeat(20);
        let result = split(&text, Platform::Twitter);

        assert!(result.needs_splitting);
        assert!(result.chunks.len() > 1);
        for chunk in &result.chunks {
            assert!(
                measure(chunk, Platform::Twitter) <= 280,
                "chunk over limit: {chunk:?}"
            );
        }
    }

    #[test]
    fn test_numbering_suffix_present_and_ordered() {
        let text = "One sentence here to take up space in the buffer. ".repeat(15);
        let result = split(&text, Platform::Twitter);

        let total = result.chunks.len();
        assert!(total > 1);
        for (i, chunk) in result.chunks.iter().enumerate() {
            assert!(
                chunk.ends_with(&format!(" ({}/{})", i + 1, total)),
                "chunk {i} missing suffix: {chunk:?}"
            );
        }
    }

    #[test]
    fn test_round_trip_preserves_content() {
        let text = "Alpha comes first. Beta follows after that. Gamma closes it out. ".repeat(10);
        let result = split(&text, Platform::Twitter);

        let rejoined: String = result
            .chunks
            .iter()
            .map(|c| strip_suffix(c))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(without_whitespace(&rejoined), without_whitespace(&text));
    }

    #[test]
    fn test_url_never_split_across_chunks() {
        let url = "https://example.com/some/long/path";
        let filler = "Padding sentence to push the total over the limit. ".repeat(6);
        let text = format!("{filler}Read more at {url} today. {filler}");
        let result = split(&text, Platform::Twitter);

        assert!(result.needs_splitting);
        let carrying: Vec<_> = result
            .chunks
            .iter()
            .filter(|c| c.contains(url))
            .collect();
        assert_eq!(carrying.len(), 1, "URL must appear intact in exactly one chunk");
    }

    #[test]
    fn test_hashtag_and_mention_survive() {
        let filler = "Some filler text that goes on and on for a while. ".repeat(7);
        let text = format!("{filler}Credit to @someone for #rustlang news.");
        let result = split(&text, Platform::Twitter);

        let joined = result.chunks.join(" ");
        assert!(joined.contains("@someone"));
        assert!(joined.contains("#rustlang"));
    }

    #[test]
    fn test_cjk_text_splits_on_cjk_terminators() {
        let text = "这是一个完整的句子。".repeat(60);
        let result = split(&text, Platform::Twitter);

        assert!(result.needs_splitting);
        for chunk in &result.chunks {
            assert!(
                measure(chunk, Platform::Twitter) <= 280,
                "chunk over limit: {chunk:?}"
            );
            // Boundaries land after terminators, so chunks end with 。
            // before the numbering suffix.
            assert!(strip_suffix(chunk).ends_with('。'), "bad boundary: {chunk:?}");
        }
    }

    #[test]
    fn test_oversized_sentence_falls_back_to_words() {
        // One long "sentence" (no terminators) of small words.
        let text = "word ".repeat(150);
        let result = split(&text, Platform::Twitter);

        assert!(result.needs_splitting);
        assert!(result.chunks.len() > 1);
        for chunk in &result.chunks {
            assert!(measure(chunk, Platform::Twitter) <= 280);
        }
    }

    #[test]
    fn test_unsplittable_token_surfaces_oversized() {
        let token = "x".repeat(600);
        let text = format!("Short lead. {token}");
        let result = split(&text, Platform::Threads);

        assert!(result.needs_splitting);
        // The giant token comes through as its own oversized chunk.
        assert!(
            result
                .chunks
                .iter()
                .any(|c| measure(c, Platform::Threads) > 500)
        );
        assert!(result.chunks.iter().any(|c| c.contains(&token)));
    }

    #[test]
    fn test_single_chunk_after_split_gets_no_suffix() {
        // Over the weighted limit thanks to CJK double-counting, but one
        // sentence that still fits the effective limit once packed.
        let text = "好".repeat(150);
        let result = split(&text, Platform::Twitter);

        if result.chunks.len() == 1 {
            assert!(result.needs_splitting);
            assert!(!result.chunks[0].contains("(1/1)"));
        }
    }

    #[test]
    fn test_split_for_platforms_one_result_each() {
        let text = "A middling-length update that fits most places.";
        let results = split_for_platforms(text, &[Platform::Twitter, Platform::Threads]);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].platform, Platform::Twitter);
        assert_eq!(results[1].platform, Platform::Threads);
    }

    proptest! {
        // Non-splitting inputs come back verbatim.
        #[test]
        fn prop_fitting_text_returns_single_chunk(text in "[a-zA-Z ,.]{1,200}") {
            let result = split(&text, Platform::Twitter);
            prop_assert!(!result.needs_splitting);
            prop_assert_eq!(&result.chunks, &vec![text]);
        }

        // Splitting is idempotent for non-splitting inputs.
        #[test]
        fn prop_split_idempotent_when_no_split(text in "[a-zA-Z ,.]{1,200}") {
            let first = split(&text, Platform::Twitter);
            let second = split(&first.chunks[0], Platform::Twitter);
            prop_assert_eq!(first, second);
        }

        // Every chunk of word-splittable text fits the limit, suffix included.
        #[test]
        fn prop_chunks_fit_limit(
            sentences in proptest::collection::vec("[a-z]{1,12}( [a-z]{1,12}){0,10}\\. ", 1..40)
        ) {
            let text = sentences.concat();
            let result = split(&text, Platform::Twitter);
            for chunk in &result.chunks {
                prop_assert!(
                    measure(chunk, Platform::Twitter) <= 280,
                    "chunk over limit: {:?}", chunk
                );
            }
        }

        // No sentence content is dropped or duplicated by the split.
        #[test]
        fn prop_round_trip_content(
            sentences in proptest::collection::vec("[a-z]{1,12}( [a-z]{1,12}){0,10}\\. ", 1..40)
        ) {
            let text = sentences.concat();
            let result = split(&text, Platform::Twitter);
            let rejoined: String = result
                .chunks
                .iter()
                .map(|c| strip_suffix(c))
                .collect::<Vec<_>>()
                .join(" ");
            prop_assert_eq!(without_whitespace(&rejoined), without_whitespace(&text));
        }
    }
}

//! Sentence boundary detection.
//!
//! Text is classified as CJK-bearing or not, then segmented on the matching
//! terminator set. Terminators stay attached to the sentence they end.

use std::sync::LazyLock;

use regex::Regex;

static CJK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{4E00}-\x{9FA5}]").expect("valid CJK regex"));

static CJK_TERMINATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[。!?！？\n]+").expect("valid CJK terminator regex"));

// Latin terminators only end a sentence when followed by whitespace, so
// "3.5" or "e.g." don't split mid-token.
static LATIN_TERMINATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?\n]+\s+").expect("valid Latin terminator regex"));

/// Split `text` into sentences, each retaining its terminator.
/// Whitespace-only segments are dropped.
pub fn detect_sentences(text: &str) -> Vec<String> {
    let terminator_re: &Regex = if CJK_RE.is_match(text) {
        &CJK_TERMINATOR_RE
    } else {
        &LATIN_TERMINATOR_RE
    };

    let mut sentences = Vec::new();
    let mut last = 0;

    for m in terminator_re.find_iter(text) {
        let sentence = &text[last..m.end()];
        if !sentence.trim().is_empty() {
            sentences.push(sentence.to_string());
        }
        last = m.end();
    }

    if last < text.len() {
        let tail = &text[last..];
        if !tail.trim().is_empty() {
            sentences.push(tail.to_string());
        }
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_latin_sentences_keep_terminators() {
        let sentences = detect_sentences("One. Two! Three? Four");
        assert_eq!(sentences, vec!["One. ", "Two! ", "Three? ", "Four"]);
    }

    #[test]
    fn test_latin_terminator_requires_trailing_whitespace() {
        // "3.5" must not split; the final period has no trailing whitespace.
        let sentences = detect_sentences("Version 3.5 is out.");
        assert_eq!(sentences, vec!["Version 3.5 is out."]);
    }

    #[test]
    fn test_cjk_sentences() {
        let sentences = detect_sentences("第一句。第二句！第三句？结尾");
        assert_eq!(sentences, vec!["第一句。", "第二句！", "第三句？", "结尾"]);
    }

    #[test]
    fn test_cjk_detection_switches_terminator_set() {
        // With a CJK char present, a bare "。" terminates without whitespace.
        let sentences = detect_sentences("好。ok");
        assert_eq!(sentences, vec!["好。", "ok"]);
    }

    #[test]
    fn test_newlines_terminate() {
        let sentences = detect_sentences("line one\nline two");
        assert_eq!(sentences, vec!["line one\n", "line two"]);
    }

    #[test]
    fn test_whitespace_only_segments_dropped() {
        let sentences = detect_sentences("One.   \n  ");
        assert_eq!(sentences, vec!["One.   \n  "]);

        let sentences = detect_sentences("  \n  ");
        assert!(sentences.is_empty());
    }

    #[test]
    fn test_single_sentence_without_terminator() {
        assert_eq!(detect_sentences("no terminator"), vec!["no terminator"]);
    }
}

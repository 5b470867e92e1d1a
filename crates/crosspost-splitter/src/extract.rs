//! Extraction of content that must never be split across chunk boundaries.
//!
//! URLs, hashtags, and mentions are swapped for short placeholders before
//! the chunking pass and restored afterwards, so boundary decisions can't
//! land inside them and their literal text can't confuse sentence detection.

use std::sync::LazyLock;

use regex::Regex;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid URL regex"));

// Word characters for tags/mentions include the CJK Unified Ideographs block.
static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[\w\x{4E00}-\x{9FA5}]+").expect("valid hashtag regex"));

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[\w\x{4E00}-\x{9FA5}]+").expect("valid mention regex"));

/// Special content lifted out of the text, in extraction order.
#[derive(Debug, Default)]
pub struct SpecialContent {
    urls: Vec<String>,
    hashtags: Vec<String>,
    mentions: Vec<String>,
}

impl SpecialContent {
    /// Re-insert extracted content into `text`, replacing each placeholder
    /// with its original. Placeholders absent from `text` (it may be a
    /// fragment of the masked whole) are skipped.
    pub fn restore(&self, text: &str) -> String {
        let mut restored = text.to_string();
        for (i, url) in self.urls.iter().enumerate() {
            restored = restored.replacen(&format!("__URL_{i}__"), url, 1);
        }
        for (i, tag) in self.hashtags.iter().enumerate() {
            restored = restored.replacen(&format!("__TAG_{i}__"), tag, 1);
        }
        for (i, mention) in self.mentions.iter().enumerate() {
            restored = restored.replacen(&format!("__MENTION_{i}__"), mention, 1);
        }
        restored
    }
}

/// Mask URLs, hashtags, and mentions in `text` with placeholders.
///
/// Returns the masked text and the extracted content needed to restore it.
pub fn extract(text: &str) -> (String, SpecialContent) {
    let special = SpecialContent {
        urls: URL_RE.find_iter(text).map(|m| m.as_str().to_string()).collect(),
        hashtags: HASHTAG_RE
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect(),
        mentions: MENTION_RE
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect(),
    };

    let mut masked = text.to_string();
    for (i, url) in special.urls.iter().enumerate() {
        masked = masked.replacen(url.as_str(), &format!("__URL_{i}__"), 1);
    }
    for (i, tag) in special.hashtags.iter().enumerate() {
        masked = masked.replacen(tag.as_str(), &format!("__TAG_{i}__"), 1);
    }
    for (i, mention) in special.mentions.iter().enumerate() {
        masked = masked.replacen(mention.as_str(), &format!("__MENTION_{i}__"), 1);
    }

    (masked, special)
}

//! Character-counting rules.
//!
//! The default rule counts Unicode code points. The weighted rule (used by
//! the Twitter-style platform) counts wide code points as 2, narrow ones as
//! 1, and any URL as a fixed 23 regardless of its literal length.

use std::sync::LazyLock;

use regex::Regex;

use crosspost_model::Platform;

/// Every URL counts as this many units under the weighted rule.
const URL_WEIGHT: usize = 23;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid URL regex"));

/// Measure `text` under `platform`'s counting rule.
pub fn measure(text: &str, platform: Platform) -> usize {
    if platform.weighted_counting() {
        weighted_len(text)
    } else {
        text.chars().count()
    }
}

/// Weighted length: URLs removed and charged a flat rate, remaining code
/// points weighed individually.
fn weighted_len(text: &str) -> usize {
    let mut length = 0;
    let mut urls = 0;
    let mut last = 0;

    for m in URL_RE.find_iter(text) {
        length += weigh_segment(&text[last..m.start()]);
        urls += 1;
        last = m.end();
    }
    length += weigh_segment(&text[last..]);

    length + urls * URL_WEIGHT
}

fn weigh_segment(segment: &str) -> usize {
    segment.chars().map(char_weight).sum()
}

/// Narrow ranges: Basic Latin through U+10FF plus the common punctuation
/// blocks. Everything else (CJK ideographs, symbols, emoji) is wide.
fn char_weight(c: char) -> usize {
    let code = c as u32;
    let narrow = code <= 0x10FF
        || (0x2000..=0x200D).contains(&code)
        || (0x2010..=0x201F).contains(&code)
        || (0x2032..=0x2037).contains(&code);
    if narrow { 1 } else { 2 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("", 0; "empty")]
    #[test_case("hello", 5; "ascii")]
    #[test_case("hello world!", 12; "ascii with punctuation")]
    #[test_case("你好", 4; "cjk counts double")]
    #[test_case("你好 world", 10; "mixed cjk and ascii")]
    #[test_case("😀", 2; "emoji counts double")]
    #[test_case("a\u{2014}b", 3; "em dash is narrow punctuation")]
    fn test_weighted_len(text: &str, expected: usize) {
        assert_eq!(weighted_len(text), expected);
    }

    #[test]
    fn test_url_counts_fixed_23() {
        assert_eq!(weighted_len("https://example.com"), 23);
        assert_eq!(
            weighted_len("https://example.com/a/very/long/path/that/keeps/going/and/going"),
            23
        );
        assert_eq!(weighted_len("see https://example.com now"), 4 + 23 + 4);
    }

    #[test]
    fn test_multiple_urls() {
        assert_eq!(weighted_len("https://a.com https://b.com"), 23 + 1 + 23);
    }

    #[test]
    fn test_measure_dispatches_by_platform() {
        // 2 CJK chars: 2 code points by default, 4 under the weighted rule.
        assert_eq!(measure("你好", Platform::Threads), 2);
        assert_eq!(measure("你好", Platform::Facebook), 2);
        assert_eq!(measure("你好", Platform::Twitter), 4);
    }

    #[test]
    fn test_default_rule_counts_code_points_not_bytes() {
        assert_eq!(measure("héllo", Platform::Threads), 5);
    }
}

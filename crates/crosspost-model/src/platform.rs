//! Supported publishing platforms and their posting constraints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A platform a post can be published to.
///
/// The set is closed: adding a platform means adding a variant here and
/// registering a publisher for it, not editing dispatch sites.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Instagram,
    Twitter,
    Threads,
}

/// Error returned when parsing an unrecognized platform name.
#[derive(Debug, Error)]
#[error("unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl Platform {
    /// All supported platforms, in canonical order.
    pub const ALL: [Platform; 4] = [
        Platform::Facebook,
        Platform::Instagram,
        Platform::Twitter,
        Platform::Threads,
    ];

    /// Maximum post length, in units of the platform's counting rule.
    pub fn max_post_len(self) -> usize {
        match self {
            Platform::Facebook => 63_206,
            Platform::Instagram => 2_200,
            Platform::Twitter => 280,
            Platform::Threads => 500,
        }
    }

    /// Whether a post to this platform must carry at least one media ref.
    pub fn requires_media(self) -> bool {
        matches!(self, Platform::Instagram)
    }

    /// Whether this platform measures text with the weighted rule
    /// (wide code points count 2, URLs a fixed 23) instead of plain
    /// code-point counting.
    pub fn weighted_counting(self) -> bool {
        matches!(self, Platform::Twitter)
    }

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Threads => "threads",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "facebook" => Ok(Platform::Facebook),
            "instagram" => Ok(Platform::Instagram),
            "twitter" => Ok(Platform::Twitter),
            "threads" => Ok(Platform::Threads),
            other => Err(UnknownPlatform(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_match_platform_docs() {
        assert_eq!(Platform::Facebook.max_post_len(), 63_206);
        assert_eq!(Platform::Instagram.max_post_len(), 2_200);
        assert_eq!(Platform::Twitter.max_post_len(), 280);
        assert_eq!(Platform::Threads.max_post_len(), 500);
    }

    #[test]
    fn test_only_instagram_requires_media() {
        for platform in Platform::ALL {
            assert_eq!(
                platform.requires_media(),
                platform == Platform::Instagram,
                "{platform}"
            );
        }
    }

    #[test]
    fn test_round_trip_names() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>().unwrap(), platform);
        }
    }

    #[test]
    fn test_unknown_platform_rejected() {
        assert!("mastodon".parse::<Platform>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Platform::Twitter).unwrap();
        assert_eq!(json, "\"twitter\"");
        let back: Platform = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Platform::Twitter);
    }
}

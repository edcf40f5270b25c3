use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Platform a content item was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Reddit,
    #[serde(rename = "youtube")]
    YouTube,
    #[serde(rename = "hackernews")]
    HackerNews,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Reddit => write!(f, "reddit"),
            SourceKind::YouTube => write!(f, "youtube"),
            SourceKind::HackerNews => write!(f, "hackernews"),
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reddit" => Ok(SourceKind::Reddit),
            "youtube" => Ok(SourceKind::YouTube),
            "hackernews" | "hn" => Ok(SourceKind::HackerNews),
            other => Err(ConfigError::Validation(format!(
                "unknown source kind '{other}'; must be reddit, youtube, or hackernews"
            ))),
        }
    }
}

/// Editorial priority of a source. Tier 1 is the highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SourceTier {
    High,
    #[default]
    Medium,
    Low,
}

impl TryFrom<u8> for SourceTier {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SourceTier::High),
            2 => Ok(SourceTier::Medium),
            3 => Ok(SourceTier::Low),
            other => Err(ConfigError::Validation(format!(
                "invalid tier {other}; must be 1, 2, or 3"
            ))),
        }
    }
}

impl From<SourceTier> for u8 {
    fn from(tier: SourceTier) -> Self {
        match tier {
            SourceTier::High => 1,
            SourceTier::Medium => 2,
            SourceTier::Low => 3,
        }
    }
}

/// Hacker News submission flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryType {
    #[default]
    Story,
    AskHn,
    ShowHn,
}

/// A content item supplied by a source adapter.
///
/// `primary_metric` and `secondary_metric` are the source's two engagement
/// counters: upvotes and comments on Reddit, views and likes on YouTube,
/// points and comments on Hacker News.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    /// Self text, story text, or transcript.
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub primary_metric: u64,
    #[serde(default)]
    pub secondary_metric: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub flair: Option<String>,
    #[serde(default)]
    pub transcript_available: bool,
    #[serde(default)]
    pub duration_seconds: Option<u64>,
    #[serde(default)]
    pub story_type: StoryType,
}

impl ContentItem {
    /// Title and body joined by a single space, the text that gets matched
    /// and classified.
    #[must_use]
    pub fn full_text(&self) -> String {
        if self.body.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_round_trips_through_u8() {
        for raw in 1_u8..=3 {
            let tier = SourceTier::try_from(raw).unwrap();
            assert_eq!(u8::from(tier), raw);
        }
    }

    #[test]
    fn tier_rejects_out_of_range() {
        assert!(SourceTier::try_from(0).is_err());
        assert!(SourceTier::try_from(4).is_err());
    }

    #[test]
    fn tier_orders_high_first() {
        assert!(SourceTier::High < SourceTier::Medium);
        assert!(SourceTier::Medium < SourceTier::Low);
        assert_eq!(SourceTier::default(), SourceTier::Medium);
    }

    #[test]
    fn source_kind_parses_aliases() {
        assert_eq!("Reddit".parse::<SourceKind>().unwrap(), SourceKind::Reddit);
        assert_eq!("hn".parse::<SourceKind>().unwrap(), SourceKind::HackerNews);
        assert!("twitter".parse::<SourceKind>().is_err());
    }

    #[test]
    fn content_item_deserializes_with_defaults() {
        let item: ContentItem = serde_json::from_str(
            r#"{"id":"abc","title":"Hello","created_at":"2026-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(item.primary_metric, 0);
        assert_eq!(item.story_type, StoryType::Story);
        assert_eq!(item.full_text(), "Hello");
    }

    #[test]
    fn full_text_joins_title_and_body() {
        let item: ContentItem = serde_json::from_str(
            r#"{"id":"abc","title":"Title","body":"Body","created_at":"2026-01-01T00:00:00Z","story_type":"ask_hn"}"#,
        )
        .unwrap();
        assert_eq!(item.full_text(), "Title Body");
        assert_eq!(item.story_type, StoryType::AskHn);
    }
}

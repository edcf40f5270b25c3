//! Relevance scoring.
//!
//! A score is the sum of five independently capped parts (engagement,
//! keywords, content quality, source tier, engagement velocity), clamped
//! to `[0, 100]`. Each [`SourceKind`] has a constant [`SourceWeights`]
//! table; one function applies any table, so per-source behaviour lives in
//! data rather than code.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use signalsift_core::{ContentItem, SourceKind, SourceTier, StoryType};

use crate::matcher::calculate_keyword_score;
use crate::types::{MatchRecord, ScoreBreakdown};

pub const MAX_SCORE: f64 = 100.0;

/// Floor on item age so brand-new items do not divide by ~zero.
const MIN_AGE_HOURS: f64 = 0.5;
const SECONDARY_METRIC_WEIGHT: f64 = 2.0;

/// `(minimum velocity, bonus)`, highest band first.
const VELOCITY_BANDS: &[(f64, f64)] = &[
    (50.0, 15.0),
    (20.0, 10.0),
    (10.0, 7.0),
    (5.0, 4.0),
    (2.0, 2.0),
];

const QUALITY_FLAIRS: &[&str] = &[
    "case study",
    "success",
    "strategy",
    "results",
    "guide",
    "tutorial",
];

static METRIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\d+%|\$\d+|\d+k\b|\d+\s*(?:views|visitors|users|clicks|sessions)|increased\s+by\s+\d+|\d+\s*x\b",
    )
    .expect("valid metric regex")
});

/// Bonus awarded when a value is strictly above `above`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold<T> {
    pub above: T,
    pub points: f64,
}

/// Video-length bonus bands, in seconds, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationBands {
    pub optimal: (u64, u64),
    pub optimal_points: f64,
    pub acceptable: (u64, u64),
    pub acceptable_points: f64,
}

/// Scoring table for one source kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceWeights {
    pub primary_divisor: f64,
    pub primary_cap: f64,
    pub secondary_divisor: f64,
    pub secondary_cap: f64,
    pub viral: Option<Threshold<u64>>,

    pub metrics_bonus: f64,
    /// Body (self text or transcript) longer than `above` characters.
    pub long_body: Option<Threshold<usize>>,
    pub flair_bonus: f64,
    pub duration: Option<DurationBands>,
    pub transcript_bonus: f64,
    pub ask_bonus: f64,
    pub show_bonus: f64,
    pub quality_cap: f64,

    /// Bonus for tiers 1, 2, and 3, non-increasing.
    pub tier_bonus: [f64; 3],
    /// Ceiling on the velocity bonus; 0 disables it.
    pub velocity_cap: f64,
}

impl SourceWeights {
    pub const REDDIT: Self = Self {
        primary_divisor: 2.5,
        primary_cap: 20.0,
        secondary_divisor: 1.33,
        secondary_cap: 15.0,
        viral: Some(Threshold {
            above: 100,
            points: 5.0,
        }),
        metrics_bonus: 5.0,
        long_body: Some(Threshold {
            above: 500,
            points: 5.0,
        }),
        flair_bonus: 5.0,
        duration: None,
        transcript_bonus: 0.0,
        ask_bonus: 0.0,
        show_bonus: 0.0,
        quality_cap: 15.0,
        tier_bonus: [10.0, 5.0, 0.0],
        velocity_cap: 15.0,
    };

    pub const YOUTUBE: Self = Self {
        primary_divisor: 666.67,
        primary_cap: 15.0,
        secondary_divisor: 50.0,
        secondary_cap: 10.0,
        viral: None,
        metrics_bonus: 0.0,
        long_body: Some(Threshold {
            above: 2000,
            points: 5.0,
        }),
        flair_bonus: 0.0,
        duration: Some(DurationBands {
            optimal: (600, 2400),
            optimal_points: 10.0,
            acceptable: (300, 3600),
            acceptable_points: 5.0,
        }),
        transcript_bonus: 5.0,
        ask_bonus: 0.0,
        show_bonus: 0.0,
        quality_cap: 20.0,
        tier_bonus: [15.0, 8.0, 0.0],
        velocity_cap: 0.0,
    };

    pub const HACKER_NEWS: Self = Self {
        primary_divisor: 2.0,
        primary_cap: 25.0,
        secondary_divisor: 2.0,
        secondary_cap: 15.0,
        viral: None,
        metrics_bonus: 0.0,
        long_body: None,
        flair_bonus: 0.0,
        duration: None,
        transcript_bonus: 0.0,
        ask_bonus: 10.0,
        show_bonus: 5.0,
        quality_cap: 15.0,
        tier_bonus: [10.0, 5.0, 0.0],
        velocity_cap: 10.0,
    };

    #[must_use]
    pub fn for_kind(kind: SourceKind) -> &'static Self {
        match kind {
            SourceKind::Reddit => &Self::REDDIT,
            SourceKind::YouTube => &Self::YOUTUBE,
            SourceKind::HackerNews => &Self::HACKER_NEWS,
        }
    }
}

/// Whether `text` mentions a concrete figure: a percentage, dollar amount,
/// `Nk`, traffic count, "increased by N", or multiplier.
#[must_use]
pub fn contains_metrics(text: &str) -> bool {
    METRIC_RE.is_match(text)
}

/// Weighted engagement per hour since `created_at`.
#[must_use]
pub fn engagement_velocity(
    primary: u64,
    secondary: u64,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let age_hours = ((now - created_at).num_milliseconds() as f64 / 3_600_000.0).max(MIN_AGE_HOURS);
    #[allow(clippy::cast_precision_loss)]
    let engagement = primary as f64 + SECONDARY_METRIC_WEIGHT * secondary as f64;
    engagement / age_hours
}

#[must_use]
pub fn velocity_bonus(velocity: f64) -> f64 {
    VELOCITY_BANDS
        .iter()
        .find(|(min, _)| velocity >= *min)
        .map_or(0.0, |(_, bonus)| *bonus)
}

#[allow(clippy::cast_precision_loss)]
fn engagement_score(item: &ContentItem, w: &SourceWeights) -> f64 {
    let mut score = (item.primary_metric as f64 / w.primary_divisor).min(w.primary_cap)
        + (item.secondary_metric as f64 / w.secondary_divisor).min(w.secondary_cap);
    if let Some(viral) = w.viral {
        if item.primary_metric > viral.above {
            score += viral.points;
        }
    }
    score
}

fn in_band(secs: u64, (lo, hi): (u64, u64)) -> bool {
    (lo..=hi).contains(&secs)
}

fn quality_score(item: &ContentItem, w: &SourceWeights) -> f64 {
    let mut score = 0.0;

    if w.metrics_bonus > 0.0 && contains_metrics(&item.full_text()) {
        score += w.metrics_bonus;
    }
    if let Some(long) = w.long_body {
        if item.body.chars().count() > long.above {
            score += long.points;
        }
    }
    if w.flair_bonus > 0.0 {
        let flair = item.flair.as_deref().unwrap_or_default().to_lowercase();
        if QUALITY_FLAIRS.iter().any(|f| flair.contains(f)) {
            score += w.flair_bonus;
        }
    }
    if let (Some(bands), Some(secs)) = (w.duration, item.duration_seconds) {
        if in_band(secs, bands.optimal) {
            score += bands.optimal_points;
        } else if in_band(secs, bands.acceptable) {
            score += bands.acceptable_points;
        }
    }
    if item.transcript_available {
        score += w.transcript_bonus;
    }
    score += match item.story_type {
        StoryType::AskHn => w.ask_bonus,
        StoryType::ShowHn => w.show_bonus,
        StoryType::Story => 0.0,
    };

    score.min(w.quality_cap)
}

fn tier_score(tier: SourceTier, w: &SourceWeights) -> f64 {
    let idx = match tier {
        SourceTier::High => 0,
        SourceTier::Medium => 1,
        SourceTier::Low => 2,
    };
    w.tier_bonus[idx]
}

fn velocity_score(item: &ContentItem, w: &SourceWeights, now: DateTime<Utc>) -> f64 {
    if w.velocity_cap <= 0.0 {
        return 0.0;
    }
    let velocity = engagement_velocity(item.primary_metric, item.secondary_metric, item.created_at, now);
    velocity_bonus(velocity).min(w.velocity_cap)
}

/// Score `item` against an explicit weights table.
#[must_use]
pub fn score_with_weights(
    item: &ContentItem,
    matches: &[MatchRecord],
    weights: &SourceWeights,
    tier: SourceTier,
    now: DateTime<Utc>,
) -> ScoreBreakdown {
    let engagement = engagement_score(item, weights);
    let keywords = calculate_keyword_score(matches);
    let quality = quality_score(item, weights);
    let tier = tier_score(tier, weights);
    let velocity = velocity_score(item, weights, now);
    let total = (engagement + keywords + quality + tier + velocity).clamp(0.0, MAX_SCORE);

    ScoreBreakdown {
        engagement,
        keywords,
        quality,
        tier,
        velocity,
        total,
    }
}

/// Per-component score for `item` using the table for `kind`.
#[must_use]
pub fn score_breakdown(
    item: &ContentItem,
    matches: &[MatchRecord],
    kind: SourceKind,
    tier: SourceTier,
    now: DateTime<Utc>,
) -> ScoreBreakdown {
    score_with_weights(item, matches, SourceWeights::for_kind(kind), tier, now)
}

/// Relevance score in `[0, 100]`.
#[must_use]
pub fn score_content(
    item: &ContentItem,
    matches: &[MatchRecord],
    kind: SourceKind,
    tier: SourceTier,
    now: DateTime<Utc>,
) -> f64 {
    score_breakdown(item, matches, kind, tier, now).total
}

#[cfg(test)]
#[path = "scorer_test.rs"]
mod tests;

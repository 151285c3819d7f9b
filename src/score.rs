// src/score.rs
//! Multi-factor scoring: five normalized signals in [0,1], combined as a
//! weighted sum.
//!
//! - `recency`     : 1.0 inside the active window, exponential decay after
//! - `credibility` : per-outlet trust weight from the credibility table
//! - `engagement`  : pluggable signal, constant placeholder for now
//! - `uniqueness`  : inverse duplicate-cluster size from dedupe output
//! - `relevance`   : domain keyword density over title + snippet
//!
//! Weights are normalized by their sum before use, so the composite stays in
//! [0,1] regardless of how the caller scaled them.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::{CuratorConfig, RankingWeights};
use crate::credibility::CredibilityTable;
use crate::schema::{clamp01, NewsItem, RankedStory, ScoreComponents};

/// Pluggable engagement signal. A real implementation (upvotes, shares,
/// click-through) can replace the constant without touching composition.
pub trait EngagementSignal {
    fn engagement(&self, item: &NewsItem) -> f32;
}

/// Placeholder until real engagement data is wired in: neutral 0.5 for every
/// item.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantEngagement;

impl EngagementSignal for ConstantEngagement {
    fn engagement(&self, _item: &NewsItem) -> f32 {
        0.5
    }
}

pub struct ScoringEngine<'a> {
    weights: RankingWeights,
    window_hours: f32,
    keywords: &'a [String],
    credibility: &'a CredibilityTable,
    engagement: &'a dyn EngagementSignal,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(
        config: &'a CuratorConfig,
        credibility: &'a CredibilityTable,
        engagement: &'a dyn EngagementSignal,
    ) -> Self {
        Self {
            weights: config.weights.normalized(),
            window_hours: config.window_hours,
            keywords: &config.keywords,
            credibility,
            engagement,
        }
    }

    /// Score every surviving item. Creates each `RankedStory` exactly once;
    /// downstream consumers treat it as read-only apart from the summary
    /// attach point.
    pub fn score_all(&self, items: Vec<NewsItem>, now: DateTime<Utc>) -> Vec<RankedStory> {
        items
            .into_iter()
            .map(|item| {
                let components = ScoreComponents {
                    recency: recency_score(&item, self.window_hours, now),
                    credibility: self.credibility.weight_for(&item.source_name),
                    engagement: clamp01(self.engagement.engagement(&item)),
                    uniqueness: uniqueness_score(&item),
                    relevance: relevance_score(&item, self.keywords),
                };
                let score = self.composite(&components);
                debug!(id = %item.id, score, "scored item");
                RankedStory {
                    item,
                    score,
                    components,
                    summary: None,
                }
            })
            .collect()
    }

    fn composite(&self, c: &ScoreComponents) -> f32 {
        let w = &self.weights;
        clamp01(
            w.recency * c.recency
                + w.credibility * c.credibility
                + w.engagement * c.engagement
                + w.uniqueness * c.uniqueness
                + w.relevance * c.relevance,
        )
    }
}

/// 1.0 while the item is inside the active window; beyond it the score halves
/// every `window_hours * 0.1` hours of excess age. Items without a timestamp
/// were excluded at the pipeline boundary; defensively they score 0 here.
pub fn recency_score(item: &NewsItem, window_hours: f32, now: DateTime<Utc>) -> f32 {
    let Some(published) = item.published_at else {
        return 0.0;
    };
    let age_hours = ((now - published).num_seconds() as f32 / 3600.0).max(0.0);
    if age_hours <= window_hours {
        return 1.0;
    }
    let excess = age_hours - window_hours;
    clamp01(0.5f32.powf(excess / (window_hours * 0.1)))
}

/// `1 / cluster_size`, where the cluster is the item plus everything absorbed
/// into it. A never-duplicated item scores 1.0.
pub fn uniqueness_score(item: &NewsItem) -> f32 {
    1.0 / (1 + item.duplicates.len()) as f32
}

/// Fraction of the keyword set found in title + snippet, doubled and capped
/// at 1.0. An empty keyword set is neutral rather than zero.
pub fn relevance_score(item: &NewsItem, keywords: &[String]) -> f32 {
    if keywords.is_empty() {
        return 0.5;
    }
    let text = item.embedding_text().to_lowercase();
    let matches = keywords
        .iter()
        .filter(|k| text.contains(&k.to_lowercase()))
        .count();
    let density = matches as f32 / keywords.len() as f32;
    clamp01(density * 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::HashMap;

    fn item_published(hours_ago: f32, now: DateTime<Utc>) -> NewsItem {
        let published = now - Duration::seconds((hours_ago * 3600.0) as i64);
        NewsItem {
            id: "test00000001".into(),
            source: "rss".into(),
            source_name: "TechCrunch".into(),
            title: "AI model research".into(),
            url: "https://example.com/x".into(),
            published_at: Some(published),
            author: None,
            summary_raw: String::new(),
            content_snippet: "a new llm from openai".into(),
            tags: vec![],
            engagement: HashMap::new(),
            duplicates: vec![],
            story_chain_id: None,
        }
    }

    #[test]
    fn recency_is_one_inside_window() {
        let now = Utc::now();
        let item = item_published(12.0, now);
        assert!((recency_score(&item, 24.0, now) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn recency_decay_hits_half_at_ten_percent_excess() {
        // age = window * 1.1 -> excess = 0.1 * window -> exactly one half-life.
        let now = Utc::now();
        let window = 24.0;
        let item = item_published(window * 1.1, now);
        let s = recency_score(&item, window, now);
        assert!((s - 0.5).abs() < 1e-3, "expected 0.5 at the boundary, got {}", s);
    }

    #[test]
    fn recency_handles_future_and_missing_timestamps() {
        let now = Utc::now();
        let future = item_published(-5.0, now);
        assert!((recency_score(&future, 24.0, now) - 1.0).abs() < 1e-6);

        let mut missing = item_published(1.0, now);
        missing.published_at = None;
        assert_eq!(recency_score(&missing, 24.0, now), 0.0);
    }

    #[test]
    fn uniqueness_is_inverse_cluster_size() {
        let now = Utc::now();
        let mut item = item_published(1.0, now);
        assert!((uniqueness_score(&item) - 1.0).abs() < 1e-6);
        item.duplicates.push("https://example.com/dup".into());
        assert!((uniqueness_score(&item) - 0.5).abs() < 1e-6);
        item.duplicates.push("https://example.com/dup2".into());
        assert!((uniqueness_score(&item) - (1.0 / 3.0)).abs() < 1e-6);
    }

    #[test]
    fn relevance_doubles_density_and_caps() {
        let now = Utc::now();
        let item = item_published(1.0, now);
        // 2 of 4 keywords match -> density 0.5 -> doubled to 1.0 (capped).
        let keywords: Vec<String> = ["llm", "openai", "quantum", "biotech"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!((relevance_score(&item, &keywords) - 1.0).abs() < 1e-6);

        // 1 of 4 -> 0.25 -> 0.5.
        let keywords: Vec<String> = ["llm", "quantum", "biotech", "fusion"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!((relevance_score(&item, &keywords) - 0.5).abs() < 1e-6);

        // Empty set is neutral.
        assert!((relevance_score(&item, &[]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn composite_stays_in_bounds_with_unnormalized_weights() {
        let now = Utc::now();
        let mut config = CuratorConfig::default();
        // Deliberately sums to 5.0; normalization must keep the composite in [0,1].
        config.weights = RankingWeights {
            recency: 1.0,
            credibility: 1.0,
            engagement: 1.0,
            uniqueness: 1.0,
            relevance: 1.0,
        };
        let credibility = CredibilityTable::default_seed();
        let engagement = ConstantEngagement;
        let engine = ScoringEngine::new(&config, &credibility, &engagement);
        let ranked = engine.score_all(vec![item_published(1.0, now)], now);
        assert_eq!(ranked.len(), 1);
        let r = &ranked[0];
        assert!((0.0..=1.0).contains(&r.score));
        for c in [
            r.components.recency,
            r.components.credibility,
            r.components.engagement,
            r.components.uniqueness,
            r.components.relevance,
        ] {
            assert!((0.0..=1.0).contains(&c));
        }
    }

    #[test]
    fn placeholder_engagement_is_neutral() {
        let now = Utc::now();
        let item = item_published(1.0, now);
        assert!((ConstantEngagement.engagement(&item) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn custom_engagement_signal_is_used() {
        struct FromMap;
        impl EngagementSignal for FromMap {
            fn engagement(&self, item: &NewsItem) -> f32 {
                item.engagement.get("upvotes_norm").copied().unwrap_or(0.5)
            }
        }
        let now = Utc::now();
        let mut item = item_published(1.0, now);
        item.engagement.insert("upvotes_norm".into(), 0.9);
        let config = CuratorConfig::default();
        let credibility = CredibilityTable::default_seed();
        let signal = FromMap;
        let engine = ScoringEngine::new(&config, &credibility, &signal);
        let ranked = engine.score_all(vec![item], now);
        assert!((ranked[0].components.engagement - 0.9).abs() < 1e-6);
    }
}

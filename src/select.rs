// src/select.rs
//! Deterministic ordering, cutoff filtering and primary/secondary
//! partitioning of ranked stories, plus the "developing stories" chain view.
//!
//! Chain membership is a property of the item set, not of the selection cut:
//! a weak but chain-linked item still appears in its chain's timeline even
//! when it missed the newsletter.

use std::collections::BTreeMap;

use tracing::info;

use crate::config::SelectionConfig;
use crate::schema::{NewsItem, RankedStory};

/// Output of selection: the newsletter cut plus the full ordered list.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// First `top_stories` entries at or above `min_score`.
    pub primary: Vec<RankedStory>,
    /// Next `secondary_stories` entries at or above `min_score`.
    pub secondary: Vec<RankedStory>,
    /// Every surviving story in rank order, cutoff or not; feeds the sources
    /// list at the bottom of the newsletter.
    pub sources: Vec<RankedStory>,
}

pub struct SelectionEngine {
    config: SelectionConfig,
}

impl SelectionEngine {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    /// Sort, filter and partition. Ties resolve by `published_at` desc, then
    /// credibility desc, then id asc, so fixtures reproduce exactly.
    pub fn select(&self, mut stories: Vec<RankedStory>) -> Selection {
        stories.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.item.published_ts().cmp(&a.item.published_ts()))
                .then_with(|| {
                    b.components
                        .credibility
                        .partial_cmp(&a.components.credibility)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.item.id.cmp(&b.item.id))
        });

        let eligible = stories
            .iter()
            .filter(|s| s.score >= self.config.min_score)
            .count();

        let primary_end = eligible.min(self.config.top_stories);
        let secondary_end = eligible.min(self.config.top_stories + self.config.secondary_stories);

        let primary = stories[..primary_end].to_vec();
        let secondary = stories[primary_end..secondary_end].to_vec();

        info!(
            total = stories.len(),
            eligible,
            primary = primary.len(),
            secondary = secondary.len(),
            "selection complete"
        );

        Selection {
            primary,
            secondary,
            sources: stories,
        }
    }
}

/// Group chain members by chain id for the "developing stories" view, ordered
/// by `published_at` then id inside each chain. Operates on the full item set
/// independently of the selection cut.
pub fn group_chains(items: &[NewsItem]) -> BTreeMap<String, Vec<NewsItem>> {
    let mut chains: BTreeMap<String, Vec<NewsItem>> = BTreeMap::new();
    for item in items {
        if let Some(chain_id) = &item.story_chain_id {
            chains.entry(chain_id.clone()).or_default().push(item.clone());
        }
    }
    for members in chains.values_mut() {
        members.sort_by(|a, b| {
            a.published_ts()
                .cmp(&b.published_ts())
                .then_with(|| a.id.cmp(&b.id))
        });
    }
    chains
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScoreComponents;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    fn story(id: &str, score: f32, day: u32, credibility: f32) -> RankedStory {
        RankedStory {
            item: NewsItem {
                id: id.to_string(),
                source: "rss".into(),
                source_name: "Outlet".into(),
                title: id.to_string(),
                url: format!("https://example.com/{}", id),
                published_at: Some(Utc.with_ymd_and_hms(2025, 8, day, 9, 0, 0).unwrap()),
                author: None,
                summary_raw: String::new(),
                content_snippet: String::new(),
                tags: vec![],
                engagement: HashMap::new(),
                duplicates: vec![],
                story_chain_id: None,
            },
            score,
            components: ScoreComponents {
                recency: 1.0,
                credibility,
                engagement: 0.5,
                uniqueness: 1.0,
                relevance: 0.5,
            },
            summary: None,
        }
    }

    fn engine(top: usize, secondary: usize, min_score: f32) -> SelectionEngine {
        SelectionEngine::new(SelectionConfig {
            top_stories: top,
            secondary_stories: secondary,
            min_score,
        })
    }

    #[test]
    fn cut_partitions_primary_secondary_and_drops_below_min() {
        // Scores [0.9, 0.7, 0.5, 0.29, 0.1], min 0.3, top 2.
        let stories = vec![
            story("a", 0.9, 1, 0.8),
            story("b", 0.7, 1, 0.8),
            story("c", 0.5, 1, 0.8),
            story("d", 0.29, 1, 0.8),
            story("e", 0.1, 1, 0.8),
        ];
        let sel = engine(2, 10, 0.3).select(stories);
        assert_eq!(
            sel.primary.iter().map(|s| s.item.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert_eq!(
            sel.secondary.iter().map(|s| s.item.id.as_str()).collect::<Vec<_>>(),
            vec!["c"]
        );
        // everything stays available for the sources list
        assert_eq!(sel.sources.len(), 5);
    }

    #[test]
    fn primary_is_prefix_of_filtered_order() {
        let stories: Vec<RankedStory> = (0..8)
            .map(|i| story(&format!("s{}", i), 0.9 - i as f32 * 0.05, 1, 0.8))
            .collect();
        let sel = engine(3, 2, 0.0).select(stories);
        assert_eq!(sel.primary.len(), 3);
        assert_eq!(sel.secondary.len(), 2);
        let all: Vec<&str> = sel.sources.iter().map(|s| s.item.id.as_str()).collect();
        let head: Vec<&str> = sel
            .primary
            .iter()
            .chain(sel.secondary.iter())
            .map(|s| s.item.id.as_str())
            .collect();
        assert_eq!(&all[..5], head.as_slice());
    }

    #[test]
    fn ties_resolve_by_recency_then_credibility_then_id() {
        let stories = vec![
            story("bb", 0.8, 1, 0.9),
            story("aa", 0.8, 2, 0.5), // newer wins despite lower credibility
            story("cc", 0.8, 1, 0.9), // equal to bb except id
        ];
        let sel = engine(3, 0, 0.0).select(stories);
        let order: Vec<&str> = sel.primary.iter().map(|s| s.item.id.as_str()).collect();
        assert_eq!(order, vec!["aa", "bb", "cc"]);
    }

    #[test]
    fn min_score_boundary_is_inclusive() {
        let stories = vec![story("a", 0.3, 1, 0.8), story("b", 0.2999, 1, 0.8)];
        let sel = engine(5, 5, 0.3).select(stories);
        assert_eq!(sel.primary.len(), 1);
        assert_eq!(sel.primary[0].item.id, "a");
        assert!(sel.secondary.is_empty());
    }

    #[test]
    fn chain_grouping_ignores_the_selection_cut() {
        let mut a = story("aa", 0.9, 1, 0.8);
        let mut b = story("bb", 0.05, 3, 0.8); // far below any sensible cut
        a.item.story_chain_id = Some("c0ffee00".into());
        b.item.story_chain_id = Some("c0ffee00".into());
        let c = story("cc", 0.5, 2, 0.8);

        let items: Vec<NewsItem> = vec![a.item.clone(), b.item.clone(), c.item.clone()];
        let chains = group_chains(&items);
        assert_eq!(chains.len(), 1);
        let members = &chains["c0ffee00"];
        assert_eq!(members.len(), 2);
        // ordered by published_at ascending
        assert_eq!(members[0].id, "aa");
        assert_eq!(members[1].id, "bb");
    }

    #[test]
    fn empty_input_selects_nothing() {
        let sel = engine(5, 10, 0.3).select(Vec::new());
        assert!(sel.primary.is_empty());
        assert!(sel.secondary.is_empty());
        assert!(sel.sources.is_empty());
    }
}

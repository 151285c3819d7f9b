// src/pipeline.rs
//! End-to-end curation: embeddings → similarity → dedupe → scoring →
//! selection. One synchronous pass over a fully materialized item batch; the
//! whole computation is a pure function of (items, config, clock).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::CuratorConfig;
use crate::credibility::CredibilityTable;
use crate::dedupe::Deduplicator;
use crate::embed::EmbeddingProvider;
use crate::schema::NewsItem;
use crate::score::{ConstantEngagement, EngagementSignal, ScoringEngine};
use crate::select::{group_chains, Selection, SelectionEngine};
use crate::similarity::SimilarityMatrix;

/// Everything a downstream collaborator needs: the newsletter cut, the
/// developing-stories view, and per-run accounting.
#[derive(Debug, Clone, Default)]
pub struct CurationReport {
    pub selection: Selection,
    /// Chain id → member items ordered by `published_at`. Includes members
    /// that fell outside the newsletter cut.
    pub chains: BTreeMap<String, Vec<NewsItem>>,
    /// Items absorbed as duplicates.
    pub dropped_duplicates: usize,
    /// Items excluded up front (missing timestamp).
    pub excluded: usize,
}

pub struct Curator {
    config: CuratorConfig,
    credibility: CredibilityTable,
    engagement: Box<dyn EngagementSignal>,
}

impl Curator {
    /// Validates the configuration up front; invalid weights or thresholds
    /// are a caller bug and fail before any item is touched.
    pub fn new(config: CuratorConfig, credibility: CredibilityTable) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            credibility,
            engagement: Box::new(ConstantEngagement),
        })
    }

    /// Swap in a real engagement signal.
    pub fn with_engagement(mut self, engagement: Box<dyn EngagementSignal>) -> Self {
        self.engagement = engagement;
        self
    }

    /// Run the full pass. `now` is explicit so runs are reproducible in tests
    /// and replays.
    pub fn curate(
        &self,
        items: Vec<NewsItem>,
        provider: &dyn EmbeddingProvider,
        now: DateTime<Utc>,
    ) -> anyhow::Result<CurationReport> {
        if items.is_empty() {
            info!("no items to curate");
            return Ok(CurationReport::default());
        }

        // Items whose timestamp failed to parse upstream are excluded from
        // the whole run, consistently, rather than scored as ageless.
        let (items, excluded): (Vec<_>, Vec<_>) =
            items.into_iter().partition(|i| i.published_at.is_some());
        for item in &excluded {
            warn!(id = %item.id, "excluding item without a published_at timestamp");
        }

        let texts: Vec<String> = items.iter().map(|i| i.embedding_text()).collect();
        let embeddings = provider.embed_batch(&texts);
        for (item, embedding) in items.iter().zip(&embeddings) {
            if embedding.is_none() {
                warn!(id = %item.id, "embedding failed; item proceeds as a unique singleton");
            }
        }

        let sims = SimilarityMatrix::from_embeddings(&embeddings);
        let dedupe = Deduplicator::from_config(&self.config.dedupe);
        let outcome = dedupe.deduplicate(items, &sims, &self.credibility);

        let chains = group_chains(&outcome.items);

        let scoring = ScoringEngine::new(&self.config, &self.credibility, self.engagement.as_ref());
        let ranked = scoring.score_all(outcome.items, now);

        let selection = SelectionEngine::new(self.config.selection).select(ranked);

        Ok(CurationReport {
            selection,
            chains,
            dropped_duplicates: outcome.dropped,
            excluded: excluded.len(),
        })
    }

    /// Convenience pre-filter: keep only items inside the active window.
    /// Callers that mix a long archive into one batch can trim it first.
    pub fn filter_by_time_window(&self, items: Vec<NewsItem>, now: DateTime<Utc>) -> Vec<NewsItem> {
        let cutoff = now - chrono::Duration::seconds((self.config.window_hours * 3600.0) as i64);
        let before = items.len();
        let kept: Vec<NewsItem> = items
            .into_iter()
            .filter(|i| i.published_at.map(|t| t >= cutoff).unwrap_or(false))
            .collect();
        info!(
            window_hours = self.config.window_hours,
            before,
            after = kept.len(),
            "time-window filter applied"
        );
        kept
    }
}

// src/schema.rs
//! Canonical data shapes exchanged with the ingestion, summarization and
//! rendering collaborators.
//!
//! `NewsItem` arrives already normalized; this crate only annotates it
//! (duplicate absorption, chain ids) and wraps it into `RankedStory`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An ingested, normalized article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Stable hash of the canonical URL (see [`NewsItem::id_for_url`]).
    pub id: String,
    /// Ingestion channel, e.g. "rss" | "arxiv".
    pub source: String,
    /// Display name of the outlet; keys the credibility lookup.
    pub source_name: String,
    pub title: String,
    pub url: String,
    /// `None` when the upstream timestamp failed to parse; such items are
    /// excluded from the run at the pipeline boundary.
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub summary_raw: String,
    /// Bounded-length text used for embedding and relevance scoring.
    #[serde(default)]
    pub content_snippet: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Sparse signal name -> value map; reserved for a real engagement scorer.
    #[serde(default)]
    pub engagement: HashMap<String, f32>,
    /// URLs folded into this item during dedupe. Empty until dedupe runs.
    #[serde(default)]
    pub duplicates: Vec<String>,
    /// Shared by items judged to be evolving coverage of one story.
    #[serde(default)]
    pub story_chain_id: Option<String>,
}

impl NewsItem {
    /// Derive the stable item id from a canonical URL: first 6 bytes of the
    /// SHA-256 digest as 12 lowercase hex chars. Same URL, same id, always.
    pub fn id_for_url(url: &str) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let digest = hasher.finalize();
        let mut out = String::with_capacity(12);
        for b in digest.iter().take(6) {
            use std::fmt::Write as _;
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }

    /// Text fed to the embedding provider and the relevance scorer.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.title, self.content_snippet)
    }

    /// Epoch seconds for ordering; items without a timestamp sort oldest.
    pub(crate) fn published_ts(&self) -> i64 {
        self.published_at.map(|t| t.timestamp()).unwrap_or(i64::MIN)
    }
}

/// LLM-generated summary, attached by the out-of-scope summarization
/// collaborator after selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySummary {
    /// Refined title.
    pub headline: String,
    /// 1-2 line intro.
    pub hook: String,
    /// 3-6 bullets.
    pub details: Vec<String>,
    pub why_it_matters: String,
    /// Chips | Research | Policy | Tools | Business | Funding.
    pub category: String,
}

/// The five sub-scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub recency: f32,
    pub credibility: f32,
    pub engagement: f32,
    pub uniqueness: f32,
    pub relevance: f32,
}

/// A surviving item plus its scoring output. Created once by the scoring
/// engine, read-only afterwards except for the summary attach point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStory {
    pub item: NewsItem,
    /// Weighted composite in [0, 1].
    pub score: f32,
    pub components: ScoreComponents,
    #[serde(default)]
    pub summary: Option<StorySummary>,
}

impl RankedStory {
    pub fn attach_summary(&mut self, summary: StorySummary) {
        self.summary = Some(summary);
    }
}

/// Clamp to [0.0, 1.0]. Shared by scoring and config validation.
pub(crate) fn clamp01(x: f32) -> f32 {
    if x < 0.0 {
        0.0
    } else if x > 1.0 {
        1.0
    } else {
        x
    }
}

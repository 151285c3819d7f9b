// src/lib.rs
// Public library surface for the newsletter content intelligence engine.

pub mod config;
pub mod credibility;
pub mod dedupe;
pub mod embed;
pub mod pipeline;
pub mod schema;
pub mod score;
pub mod select;
pub mod similarity;

// ---- Re-exports for stable public API ----
pub use crate::config::{CuratorConfig, DedupeConfig, RankingWeights, SelectionConfig};
pub use crate::credibility::CredibilityTable;
pub use crate::dedupe::{DedupeMode, DedupeOutcome, Deduplicator};
pub use crate::embed::{EmbeddingProvider, HashingEmbedder};
pub use crate::pipeline::{CurationReport, Curator};
pub use crate::schema::{NewsItem, RankedStory, ScoreComponents, StorySummary};
pub use crate::score::{ConstantEngagement, EngagementSignal, ScoringEngine};
pub use crate::select::{group_chains, Selection, SelectionEngine};
pub use crate::similarity::SimilarityMatrix;

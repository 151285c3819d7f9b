// src/config.rs
//! Curation configuration: dedupe thresholds, time window, ranking weights,
//! selection parameters and the relevance keyword set.
//!
//! Loaded from TOML (or built in code) and validated once, before any item is
//! processed. Invalid weights are the one fatal error in this crate: they mean
//! a caller bug, not noisy input data.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::dedupe::DedupeMode;

/// Default similarity threshold for same-day duplicate clustering.
pub const DEFAULT_DEDUPE_THRESHOLD: f32 = 0.85;
/// Default similarity threshold above which cross-day pairs form a story chain.
pub const DEFAULT_CHAIN_THRESHOLD: f32 = 0.75;
/// Default active time window in hours (24 = daily issue, 168 = weekly).
pub const DEFAULT_WINDOW_HOURS: f32 = 24.0;

#[derive(Debug, Clone, Deserialize)]
pub struct CuratorConfig {
    #[serde(default)]
    pub dedupe: DedupeConfig,
    /// Active time window in hours; also drives the recency decay.
    #[serde(default = "default_window_hours")]
    pub window_hours: f32,
    #[serde(default)]
    pub weights: RankingWeights,
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Domain keywords for the relevance sub-score.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DedupeConfig {
    /// Complete-linkage merge threshold in standard mode.
    #[serde(default = "default_dedupe_threshold")]
    pub threshold: f32,
    /// Lower bound of the story-chain similarity band in smart mode.
    #[serde(default = "default_chain_threshold")]
    pub chain_threshold: f32,
    /// Standard for short windows, Smart (story chains) for long ones.
    #[serde(default)]
    pub mode: DedupeMode,
}

/// Weights for the five sub-scores. Validated non-negative and finite with a
/// positive sum; normalized by the sum before use so the composite stays in
/// [0, 1] even when a caller's weights do not add up to exactly 1.0.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RankingWeights {
    #[serde(default = "default_w_recency")]
    pub recency: f32,
    #[serde(default = "default_w_credibility")]
    pub credibility: f32,
    #[serde(default = "default_w_engagement")]
    pub engagement: f32,
    #[serde(default = "default_w_uniqueness")]
    pub uniqueness: f32,
    #[serde(default = "default_w_relevance")]
    pub relevance: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SelectionConfig {
    #[serde(default = "default_top_stories")]
    pub top_stories: usize,
    #[serde(default = "default_secondary_stories")]
    pub secondary_stories: usize,
    #[serde(default = "default_min_score")]
    pub min_score: f32,
}

fn default_dedupe_threshold() -> f32 {
    DEFAULT_DEDUPE_THRESHOLD
}
fn default_chain_threshold() -> f32 {
    DEFAULT_CHAIN_THRESHOLD
}
fn default_window_hours() -> f32 {
    DEFAULT_WINDOW_HOURS
}
fn default_w_recency() -> f32 {
    0.30
}
fn default_w_credibility() -> f32 {
    0.25
}
fn default_w_engagement() -> f32 {
    0.15
}
fn default_w_uniqueness() -> f32 {
    0.15
}
fn default_w_relevance() -> f32 {
    0.15
}
fn default_top_stories() -> usize {
    5
}
fn default_secondary_stories() -> usize {
    10
}
fn default_min_score() -> f32 {
    0.3
}

fn default_keywords() -> Vec<String> {
    [
        "ai",
        "artificial intelligence",
        "machine learning",
        "llm",
        "model",
        "neural",
        "openai",
        "anthropic",
        "deepmind",
        "research",
        "chip",
        "gpu",
        "funding",
        "open source",
        "robotics",
        "agent",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self {
            dedupe: DedupeConfig::default(),
            window_hours: DEFAULT_WINDOW_HOURS,
            weights: RankingWeights::default(),
            selection: SelectionConfig::default(),
            keywords: default_keywords(),
        }
    }
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DEDUPE_THRESHOLD,
            chain_threshold: DEFAULT_CHAIN_THRESHOLD,
            mode: DedupeMode::default(),
        }
    }
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            recency: default_w_recency(),
            credibility: default_w_credibility(),
            engagement: default_w_engagement(),
            uniqueness: default_w_uniqueness(),
            relevance: default_w_relevance(),
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            top_stories: default_top_stories(),
            secondary_stories: default_secondary_stories(),
            min_score: default_min_score(),
        }
    }
}

impl CuratorConfig {
    /// Load from a TOML file.
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            anyhow::anyhow!(
                "Failed to read curator config at {}: {}",
                path.as_ref().display(),
                e
            )
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from a TOML string and validate.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let cfg: CuratorConfig = toml::from_str(toml_str)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Fail fast on caller bugs: bad weights, inverted thresholds, bad window.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.weights.validate()?;
        for (name, v) in [
            ("dedupe.threshold", self.dedupe.threshold),
            ("dedupe.chain_threshold", self.dedupe.chain_threshold),
            ("selection.min_score", self.selection.min_score),
        ] {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                anyhow::bail!("{} must be in [0, 1], got {}", name, v);
            }
        }
        if self.dedupe.chain_threshold > self.dedupe.threshold {
            anyhow::bail!(
                "dedupe.chain_threshold ({}) must not exceed dedupe.threshold ({})",
                self.dedupe.chain_threshold,
                self.dedupe.threshold
            );
        }
        if !self.window_hours.is_finite() || self.window_hours <= 0.0 {
            anyhow::bail!("window_hours must be positive, got {}", self.window_hours);
        }
        Ok(())
    }
}

impl RankingWeights {
    fn as_array(&self) -> [(&'static str, f32); 5] {
        [
            ("recency", self.recency),
            ("credibility", self.credibility),
            ("engagement", self.engagement),
            ("uniqueness", self.uniqueness),
            ("relevance", self.relevance),
        ]
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let mut sum = 0.0f32;
        for (name, w) in self.as_array() {
            if !w.is_finite() {
                anyhow::bail!("ranking weight `{}` is not finite", name);
            }
            if w < 0.0 {
                anyhow::bail!("ranking weight `{}` is negative ({})", name, w);
            }
            sum += w;
        }
        if sum <= 0.0 {
            anyhow::bail!("ranking weights sum to zero; at least one must be positive");
        }
        Ok(())
    }

    /// Weights scaled so they sum to 1.0. Callers must `validate()` first.
    pub fn normalized(&self) -> RankingWeights {
        let sum: f32 = self.as_array().iter().map(|(_, w)| w).sum();
        RankingWeights {
            recency: self.recency / sum,
            credibility: self.credibility / sum,
            engagement: self.engagement / sum,
            uniqueness: self.uniqueness / sum,
            relevance: self.relevance / sum,
        }
    }
}

// src/credibility.rs
//! Configurable mapping from outlet names (e.g. "TechCrunch", "arXiv") to
//! trust weights in `[0.0, 1.0]`.
//!
//! - Loads from JSON config (weights + aliases).
//! - Case-insensitive lookup with normalization of punctuation and dashes.
//! - Aliases map alternative spellings/domains to canonical outlet names.
//! - Fallback order: aliases → exact match → substring match → default.
//! - Ships a built-in `default_seed()` with common AI/tech outlets.
//!
//! Used twice by the core: as the credibility sub-score and as the first
//! tie-break when electing a duplicate cluster's representative.

use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;

use crate::schema::clamp01;

/// Source → credibility table, loaded from JSON or seeded with defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct CredibilityTable {
    /// Weight used when no match is found. Unknown outlets are not an error.
    #[serde(default = "default_default_weight")]
    pub default_weight: f32,
    /// Explicit weights for canonical outlet names.
    #[serde(default)]
    pub weights: HashMap<String, f32>,
    /// Aliases mapping non-canonical names → canonical names.
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

fn default_default_weight() -> f32 {
    0.70
}

impl Default for CredibilityTable {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl CredibilityTable {
    /// Load from a JSON file. Falls back to `default_seed()` on error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|_| Self::default_seed()),
            Err(_) => Self::default_seed(),
        }
    }

    /// Get the credibility weight for an outlet name.
    ///
    /// Steps:
    /// 1. Alias lookup (normalized) → canonical → weight.
    /// 2. Exact weight match.
    /// 3. Substring fallback (e.g. "The MIT Technology Review" → "mit technology review").
    /// 4. Default weight.
    pub fn weight_for(&self, source_name: &str) -> f32 {
        let s = normalize(source_name);

        if let Some(canon) = self.aliases.get(&s) {
            let c = normalize(canon);
            if let Some(&w) = self.weights.get(&c) {
                return clamp01(w);
            }
        }

        if let Some(&w) = self.weights.get(&s) {
            return clamp01(w);
        }

        for (k, &w) in &self.weights {
            if s.contains(k) {
                return clamp01(w);
            }
        }

        clamp01(self.default_weight)
    }

    /// Built-in seed with common research, tech-press and aggregator sources.
    pub fn default_seed() -> Self {
        let mut weights = HashMap::new();
        let mut aliases = HashMap::new();

        for (k, v) in [
            ("arxiv", 0.95),
            ("nature", 0.95),
            ("mit technology review", 0.92),
            ("reuters", 0.90),
            ("bloomberg", 0.88),
            ("financial times", 0.88),
            ("the information", 0.87),
            ("ars technica", 0.85),
            ("wired", 0.84),
            ("ieee spectrum", 0.88),
            ("techcrunch", 0.80),
            ("the verge", 0.80),
            ("venturebeat", 0.75),
            ("hacker news", 0.70),
            ("openai blog", 0.85),
            ("anthropic blog", 0.85),
            ("deepmind blog", 0.85),
            ("google ai blog", 0.82),
        ] {
            weights.insert(k.to_string(), v);
        }

        for (a, c) in [
            ("arxiv org", "arxiv"),
            ("mit tech review", "mit technology review"),
            ("technologyreview com", "mit technology review"),
            ("ft", "financial times"),
            ("arstechnica com", "ars technica"),
            ("techcrunch com", "techcrunch"),
            ("theverge com", "the verge"),
            ("hn", "hacker news"),
            ("news ycombinator com", "hacker news"),
            ("openai", "openai blog"),
            ("anthropic", "anthropic blog"),
            ("deepmind", "deepmind blog"),
            ("google ai", "google ai blog"),
        ] {
            aliases.insert(a.to_string(), c.to_string());
        }

        Self {
            default_weight: 0.70,
            weights,
            aliases,
        }
    }
}

/// Normalize an outlet name: lowercase, replace punctuation/dashes with
/// spaces, collapse runs of whitespace.
fn normalize(s: &str) -> String {
    let mut out = s.trim().to_ascii_lowercase();

    for ch in ['—', '–', '-', '_', '/', '\\'] {
        out = out.replace(ch, " ");
    }
    out = out.replace(['\n', '\r', '\t', '.', ',', '’', '\''], " ");

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

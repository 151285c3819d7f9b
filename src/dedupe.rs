// src/dedupe.rs
//! Semantic deduplication and cross-day story-chain detection.
//!
//! Two modes, picked once per run by configuration:
//! - **Standard** (short window): complete-linkage agglomerative clustering at
//!   `threshold`; each cluster elects one representative and absorbs the rest.
//! - **Smart** (long window): every pair is classified directly as duplicate /
//!   story chain / distinct from similarity plus calendar-day distance; chain
//!   links are merged transitively with a disjoint-set so (A,B) + (B,C) always
//!   ends as one chain, in any input order.
//!
//! All iteration happens in canonical item-id order, so shuffling the input
//! cannot change the resulting partition.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::DedupeConfig;
use crate::credibility::CredibilityTable;
use crate::schema::NewsItem;
use crate::similarity::SimilarityMatrix;

/// Same-day duplicate cutoff in smart mode. Pairs above it on *different*
/// days are deliberately distinct: near-identical text days apart is usually
/// a syndicated re-run, not one evolving story.
pub const SMART_DUPLICATE_THRESHOLD: f32 = 0.90;

/// Operating mode, selected by the caller based on the active time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupeMode {
    #[default]
    Standard,
    Smart,
}

/// Result of one dedupe pass.
#[derive(Debug, Clone)]
pub struct DedupeOutcome {
    /// Survivors, in input order, annotated with absorbed URLs and chain ids.
    pub items: Vec<NewsItem>,
    /// Chain id → member item ids, ordered by `published_at` then id.
    /// Empty in standard mode.
    pub chains: BTreeMap<String, Vec<String>>,
    /// Number of items absorbed as duplicates.
    pub dropped: usize,
}

#[derive(Debug, Clone)]
pub struct Deduplicator {
    threshold: f32,
    chain_threshold: f32,
    mode: DedupeMode,
}

impl Deduplicator {
    pub fn from_config(cfg: &DedupeConfig) -> Self {
        Self {
            threshold: cfg.threshold,
            chain_threshold: cfg.chain_threshold,
            mode: cfg.mode,
        }
    }

    pub fn mode(&self) -> DedupeMode {
        self.mode
    }

    /// Classify the working set into duplicate absorptions and (in smart
    /// mode) story chains. `sims` must be indexed the same way as `items`.
    pub fn deduplicate(
        &self,
        items: Vec<NewsItem>,
        sims: &SimilarityMatrix,
        credibility: &CredibilityTable,
    ) -> DedupeOutcome {
        if items.is_empty() {
            return DedupeOutcome {
                items,
                chains: BTreeMap::new(),
                dropped: 0,
            };
        }
        debug_assert_eq!(items.len(), sims.len());

        let before = items.len();
        let outcome = match self.mode {
            DedupeMode::Standard => self.standard(items, sims, credibility),
            DedupeMode::Smart => self.smart(items, sims, credibility),
        };
        info!(
            mode = ?self.mode,
            before,
            after = outcome.items.len(),
            dropped = outcome.dropped,
            chains = outcome.chains.len(),
            "deduplication complete"
        );
        outcome
    }

    /// Complete-linkage agglomerative clustering: repeatedly merge the pair of
    /// clusters whose *worst* cross-pair similarity is highest, while that
    /// worst pair still exceeds the threshold. A weak intermediate can never
    /// chain two unrelated items together.
    fn standard(
        &self,
        items: Vec<NewsItem>,
        sims: &SimilarityMatrix,
        credibility: &CredibilityTable,
    ) -> DedupeOutcome {
        // Clusters hold item indices; seeded in canonical id order so the
        // greedy merge sequence is a function of the set, not the input order.
        let mut clusters: Vec<Vec<usize>> = canonical_order(&items)
            .into_iter()
            .map(|i| vec![i])
            .collect();

        loop {
            // (linkage, id-key of a, id-key of b, position a, position b)
            let mut best: Option<(f32, &str, &str, usize, usize)> = None;
            for a in 0..clusters.len() {
                for b in (a + 1)..clusters.len() {
                    let linkage = complete_linkage(&clusters[a], &clusters[b], sims);
                    if linkage <= self.threshold {
                        continue;
                    }
                    let key_a = cluster_key(&clusters[a], &items);
                    let key_b = cluster_key(&clusters[b], &items);
                    let better = match &best {
                        None => true,
                        Some((s, ka, kb, _, _)) => {
                            linkage > *s
                                || (linkage == *s && (key_a, key_b) < (*ka, *kb))
                        }
                    };
                    if better {
                        best = Some((linkage, key_a, key_b, a, b));
                    }
                }
            }
            match best {
                Some((linkage, _, _, a, b)) => {
                    debug!(linkage, "merging clusters");
                    let merged = clusters.remove(b);
                    clusters[a].extend(merged);
                }
                None => break,
            }
        }

        let mut survivors = vec![false; items.len()];
        let mut updated: Vec<NewsItem> = items.clone();
        let mut dropped = 0usize;

        for cluster in &clusters {
            let rep = elect_representative(cluster, &items, credibility);
            survivors[rep] = true;
            if cluster.len() > 1 {
                let absorbed = absorption_order(cluster, rep, &items, credibility);
                debug!(
                    representative = %items[rep].id,
                    absorbed = absorbed.len(),
                    "duplicate cluster collapsed"
                );
                for &i in &absorbed {
                    updated[rep].duplicates.push(items[i].url.clone());
                    dropped += 1;
                }
            }
        }

        let kept = updated
            .into_iter()
            .enumerate()
            .filter(|(i, _)| survivors[*i])
            .map(|(_, item)| item)
            .collect();

        DedupeOutcome {
            items: kept,
            chains: BTreeMap::new(),
            dropped,
        }
    }

    /// Pairwise classification with transitive chain merging.
    fn smart(
        &self,
        items: Vec<NewsItem>,
        sims: &SimilarityMatrix,
        credibility: &CredibilityTable,
    ) -> DedupeOutcome {
        let n = items.len();
        let ids: Vec<&str> = items.iter().map(|it| it.id.as_str()).collect();
        let order = canonical_order(&items);

        let mut dup_sets = DisjointSet::new(n);
        let mut chain_edges: Vec<(usize, usize)> = Vec::new();

        for a in 0..order.len() {
            for b in (a + 1)..order.len() {
                let (i, j) = (order[a], order[b]);
                let s = sims.get(i, j);
                // The duplicate bar is fixed; only the chain band moves with
                // `chain_threshold`, so the skip must not swallow pairs above
                // the duplicate bar when `chain_threshold` sits above it.
                if s <= self.chain_threshold.min(SMART_DUPLICATE_THRESHOLD) {
                    continue;
                }
                match (day_of(&items[i]), day_of(&items[j])) {
                    (Some(di), Some(dj)) if di == dj => {
                        if s > SMART_DUPLICATE_THRESHOLD {
                            debug!(a = %items[i].id, b = %items[j].id, similarity = s, "duplicate pair");
                            dup_sets.union(i, j, &ids);
                        }
                        // Same-day pairs in (chain_threshold, 0.90] stay
                        // distinct: same-cycle coverage that didn't clear the
                        // duplicate bar is not an evolving story.
                    }
                    (Some(_), Some(_)) => {
                        if s <= SMART_DUPLICATE_THRESHOLD {
                            debug!(a = %items[i].id, b = %items[j].id, similarity = s, "story chain pair");
                            chain_edges.push((i, j));
                        }
                        // Near-identical text days apart: syndication, not a
                        // chain. Distinct.
                    }
                    // Items without a timestamp cannot qualify either way.
                    _ => {}
                }
            }
        }

        // Collapse duplicate groups to one representative each.
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for &i in &order {
            groups.entry(dup_sets.find(i)).or_default().push(i);
        }

        let mut survivor_of = vec![0usize; n];
        let mut survivors = vec![false; n];
        let mut updated: Vec<NewsItem> = items.clone();
        let mut dropped = 0usize;

        for group in groups.values() {
            let rep = elect_representative(group, &items, credibility);
            survivors[rep] = true;
            for &i in group {
                survivor_of[i] = rep;
            }
            if group.len() > 1 {
                for &i in &absorption_order(group, rep, &items, credibility) {
                    updated[rep].duplicates.push(items[i].url.clone());
                    dropped += 1;
                }
            }
        }

        // Chain links between absorbed items transfer to their survivors, so
        // nothing ever joins a chain under a discarded identity.
        let mut chain_sets = DisjointSet::new(n);
        for &(i, j) in &chain_edges {
            let (si, sj) = (survivor_of[i], survivor_of[j]);
            if si != sj {
                chain_sets.union(si, sj, &ids);
            }
        }

        // Components with at least two survivors become chains.
        let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for &i in &order {
            if survivors[i] {
                components.entry(chain_sets.find(i)).or_default().push(i);
            }
        }

        let mut chains: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for members in components.values() {
            if members.len() < 2 {
                continue;
            }
            let mut ordered = members.clone();
            ordered.sort_by(|&a, &b| {
                items[a]
                    .published_ts()
                    .cmp(&items[b].published_ts())
                    .then_with(|| items[a].id.cmp(&items[b].id))
            });
            let chain_id = chain_id_for(&items[ordered[0]].id);
            for &i in &ordered {
                updated[i].story_chain_id = Some(chain_id.clone());
            }
            chains.insert(
                chain_id,
                ordered.iter().map(|&i| items[i].id.clone()).collect(),
            );
        }

        let kept = updated
            .into_iter()
            .enumerate()
            .filter(|(i, _)| survivors[*i])
            .map(|(_, item)| item)
            .collect();

        DedupeOutcome {
            items: kept,
            chains,
            dropped,
        }
    }
}

/// Item indices sorted by item id; the canonical iteration order that makes
/// every decision independent of input permutation.
fn canonical_order(items: &[NewsItem]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| items[a].id.cmp(&items[b].id));
    order
}

/// Minimum cross-pair similarity between two clusters (complete linkage).
fn complete_linkage(a: &[usize], b: &[usize], sims: &SimilarityMatrix) -> f32 {
    let mut min = f32::MAX;
    for &i in a {
        for &j in b {
            min = min.min(sims.get(i, j));
        }
    }
    min
}

/// Smallest item id in a cluster, used as a deterministic tie-break key.
fn cluster_key<'a>(cluster: &[usize], items: &'a [NewsItem]) -> &'a str {
    cluster
        .iter()
        .map(|&i| items[i].id.as_str())
        .min()
        .expect("clusters are never empty")
}

/// Highest credibility wins; ties go to the most recent `published_at`, then
/// the lexicographically smallest id.
fn elect_representative(
    cluster: &[usize],
    items: &[NewsItem],
    credibility: &CredibilityTable,
) -> usize {
    let mut best = cluster[0];
    for &i in &cluster[1..] {
        if rep_rank(i, items, credibility) < rep_rank(best, items, credibility) {
            best = i;
        }
    }
    best
}

/// Sort key for representative election and absorption order. Credibility is
/// clamped to [0,1] and finite, so the bit trick gives a total order.
fn rep_rank<'a>(
    i: usize,
    items: &'a [NewsItem],
    credibility: &CredibilityTable,
) -> (i32, i64, &'a str) {
    let cred = credibility.weight_for(&items[i].source_name);
    // descending credibility, descending recency, ascending id
    (-((cred * 1_000_000.0) as i32), -items[i].published_ts(), items[i].id.as_str())
}

/// Non-representative members in absorption order: credibility descending,
/// then recency descending, then id.
fn absorption_order(
    cluster: &[usize],
    rep: usize,
    items: &[NewsItem],
    credibility: &CredibilityTable,
) -> Vec<usize> {
    let mut rest: Vec<usize> = cluster.iter().copied().filter(|&i| i != rep).collect();
    rest.sort_by(|&a, &b| {
        rep_rank(a, items, credibility).cmp(&rep_rank(b, items, credibility))
    });
    rest
}

fn day_of(item: &NewsItem) -> Option<NaiveDate> {
    item.published_at.map(|t| t.date_naive())
}

/// Chain id: first 8 hex chars of the SHA-256 of the canonical member's id
/// (earliest `published_at`, ties by smallest id). Stable across reruns and
/// input permutations.
fn chain_id_for(canonical_member_id: &str) -> String {
    let digest = Sha256::digest(canonical_member_id.as_bytes());
    let mut out = String::with_capacity(8);
    for b in digest.iter().take(4) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Disjoint-set over item indices. Unions keep the root with the smaller item
/// id, so component roots are stable under any processing order.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize, ids: &[&str]) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        if ids[ra] <= ids[rb] {
            self.parent[rb] = ra;
        } else {
            self.parent[ra] = rb;
        }
    }
}

// src/services/dedup.rs
//
// Duplicate detection and ranking for merged indexer results.
//
// CRITICAL RULES:
// - Exact phase: one result per guid, first seen wins
// - Fuzzy phase: similar normalized titles collapse unless their episode or
//   resolution markers differ; higher seeders win, ties keep discovery order
// - The fuzzy phase runs to a fixed point, so deduplicating twice changes nothing
// - Ranking: seeders desc, published desc, then discovery order

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::domain::{RankedResult, RawResult};

static EPISODE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bS\d{1,2}E(?P<se>\d{1,4})\b|\bE(?:p(?:isode)?)?\.?\s?(?P<ep>\d{1,4})\b|\s-\s(?P<dash>\d{1,4})\b|#(?P<hash>\d{1,4})\b",
    )
    .expect("episode marker regex should compile")
});

static RESOLUTION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:(?P<lines>480|576|720|1080|1440|2160)p|(?P<uhd>4k))\b")
        .expect("resolution marker regex should compile")
});

// ============================================================================
// SIMILARITY
// ============================================================================

/// String similarity used by the fuzzy phase, all scored in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    NormalizedLevenshtein,
    JaroWinkler,
    SorensenDice,
}

impl SimilarityMetric {
    pub fn score(&self, a: &str, b: &str) -> f64 {
        match self {
            SimilarityMetric::NormalizedLevenshtein => strsim::normalized_levenshtein(a, b),
            SimilarityMetric::JaroWinkler => strsim::jaro_winkler(a, b),
            SimilarityMetric::SorensenDice => strsim::sorensen_dice(a, b),
        }
    }
}

/// Lowercased title with brackets and separators turned into single spaces
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '[' | ']' | '(' | ')' | '{' | '}' | '_' | '.' | '|' => ' ',
            other => other,
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// RELEASE MARKERS
// ============================================================================

/// Episode and resolution labels found in a release title
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseMarkers {
    pub episode: Option<u32>,
    /// Vertical lines; `4K` reads as 2160
    pub resolution: Option<u32>,
}

impl ReleaseMarkers {
    pub fn parse(title: &str) -> Self {
        let episode = EPISODE_MARKER.captures(title).and_then(|caps| {
            ["se", "ep", "dash", "hash"]
                .iter()
                .find_map(|name| caps.name(name))
                .and_then(|m| m.as_str().parse().ok())
        });

        let resolution = RESOLUTION_MARKER.captures(title).and_then(|caps| {
            if caps.name("uhd").is_some() {
                Some(2160)
            } else {
                caps.name("lines").and_then(|m| m.as_str().parse().ok())
            }
        });

        Self {
            episode,
            resolution,
        }
    }

    /// True when both carry a marker of the same kind with different values
    pub fn conflicts(&self, other: &ReleaseMarkers) -> bool {
        fn differ(a: Option<u32>, b: Option<u32>) -> bool {
            matches!((a, b), (Some(a), Some(b)) if a != b)
        }
        differ(self.episode, other.episode) || differ(self.resolution, other.resolution)
    }
}

// ============================================================================
// CLUSTERS
// ============================================================================

/// A surviving result and everything that collapsed into it
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub representative: RawResult,
    /// Discovery position of the representative in the merged input
    pub order: usize,
    pub size: usize,
    normalized: String,
    markers: ReleaseMarkers,
}

impl Cluster {
    fn new(representative: RawResult, order: usize) -> Self {
        Self {
            normalized: normalize_title(&representative.title),
            markers: ReleaseMarkers::parse(&representative.title),
            representative,
            order,
            size: 1,
        }
    }

    /// Keeps the better representative; `self` must be the earlier-discovered cluster
    fn absorb(&mut self, other: Cluster) {
        let size = self.size + other.size;
        if other.representative.seeders > self.representative.seeders {
            *self = other;
        }
        self.size = size;
    }
}

/// Wraps every result in its own cluster, for runs with deduplication off
pub fn singletons(results: Vec<RawResult>) -> Vec<Cluster> {
    results
        .into_iter()
        .enumerate()
        .map(|(order, result)| Cluster::new(result, order))
        .collect()
}

// ============================================================================
// DEDUPLICATOR
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Deduplicator {
    metric: SimilarityMetric,
    threshold: f64,
}

impl Deduplicator {
    pub fn new(metric: SimilarityMetric, threshold: f64) -> Self {
        Self { metric, threshold }
    }

    /// Both phases over results in discovery order
    pub fn deduplicate(&self, results: Vec<RawResult>) -> Vec<Cluster> {
        let exact = self.exact(results);
        self.fuzzy(exact)
    }

    /// First occurrence of each guid survives
    pub fn exact(&self, results: Vec<RawResult>) -> Vec<Cluster> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut clusters: Vec<Cluster> = Vec::new();

        for (order, result) in results.into_iter().enumerate() {
            if seen.insert(result.guid.clone()) {
                clusters.push(Cluster::new(result, order));
            } else if let Some(first) = clusters
                .iter_mut()
                .find(|c| c.representative.guid == result.guid)
            {
                first.size += 1;
            }
        }
        clusters
    }

    /// Similarity must exceed the threshold and no release marker may differ
    pub fn collapsible(&self, a: &Cluster, b: &Cluster) -> bool {
        !a.markers.conflicts(&b.markers)
            && self.metric.score(&a.normalized, &b.normalized) > self.threshold
    }

    /// Merges similar clusters until no pair is collapsible
    pub fn fuzzy(&self, mut clusters: Vec<Cluster>) -> Vec<Cluster> {
        loop {
            let mut merged_any = false;
            let mut i = 0;
            while i < clusters.len() {
                let mut j = i + 1;
                while j < clusters.len() {
                    if self.collapsible(&clusters[i], &clusters[j]) {
                        let later = clusters.remove(j);
                        clusters[i].absorb(later);
                        merged_any = true;
                    } else {
                        j += 1;
                    }
                }
                i += 1;
            }
            if !merged_any {
                return clusters;
            }
            // Absorbing can swap a representative, so earlier pairs need a recheck
            clusters.sort_by_key(|c| c.order);
        }
    }
}

/// Seeders desc, published desc; equal keys keep discovery order
pub fn rank(mut clusters: Vec<Cluster>, max_results: usize) -> Vec<RankedResult> {
    clusters.sort_by_key(|c| c.order);
    clusters.sort_by(|a, b| compare_rank(&a.representative, &b.representative));
    clusters
        .into_iter()
        .take(max_results)
        .map(|c| RankedResult::new(c.representative, c.size))
        .collect()
}

fn compare_rank(a: &RawResult, b: &RawResult) -> Ordering {
    b.seeders
        .cmp(&a.seeders)
        .then_with(|| b.published_at.cmp(&a.published_at))
}

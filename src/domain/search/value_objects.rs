// src/domain/search/value_objects.rs
//
// Search Value Objects
//
// What the translator hands the planner, what the planner hands the
// aggregator, and what the aggregator returns.
//
// CRITICAL RULES:
// - Pure data, no I/O
// - Results live for one request only
// - Clone + Debug + Serialize for traceability

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// TRANSLATION SOURCE
// ============================================================================

/// Which translation tier produced an absolute episode number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationSource {
    /// `SxxEyy` entry of a user override
    Override,

    /// Season range arithmetic of a user override
    SeasonRange,

    /// Cached crossmap table
    Crossmap,

    /// Sum of known per-season episode counts
    Estimated,

    /// Episode number used unchanged
    PassThrough,
}

impl std::fmt::Display for TranslationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslationSource::Override => write!(f, "override"),
            TranslationSource::SeasonRange => write!(f, "season_range"),
            TranslationSource::Crossmap => write!(f, "crossmap"),
            TranslationSource::Estimated => write!(f, "estimated"),
            TranslationSource::PassThrough => write!(f, "pass_through"),
        }
    }
}

// ============================================================================
// SEARCH COORDINATE
// ============================================================================

/// Canonical position to search for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchCoordinate {
    /// Absolute episode number in anime release numbering
    Episode {
        absolute: u32,
        source: TranslationSource,
    },

    /// Season 0 entry (OVA, special)
    Special {
        number: u32,
        source: TranslationSource,
    },

    /// Whole series, no episode given
    Series,

    Movie { year: Option<i32> },
}

impl SearchCoordinate {
    pub fn episode(absolute: u32, source: TranslationSource) -> Self {
        SearchCoordinate::Episode { absolute, source }
    }

    pub fn special(number: u32, source: TranslationSource) -> Self {
        SearchCoordinate::Special { number, source }
    }

    pub fn movie(year: Option<i32>) -> Self {
        SearchCoordinate::Movie { year }
    }

    /// Translation tier behind an episode or special coordinate
    pub fn source(&self) -> Option<TranslationSource> {
        match self {
            SearchCoordinate::Episode { source, .. } | SearchCoordinate::Special { source, .. } => {
                Some(*source)
            }
            SearchCoordinate::Series | SearchCoordinate::Movie { .. } => None,
        }
    }

    pub fn is_movie(&self) -> bool {
        matches!(self, SearchCoordinate::Movie { .. })
    }
}

// ============================================================================
// QUERY
// ============================================================================

/// Indexer category a query is sent under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexerCategory {
    /// TV > Anime
    AnimeTv,
    Movies,
}

impl IndexerCategory {
    /// Newznab category code
    pub fn code(&self) -> u32 {
        match self {
            IndexerCategory::AnimeTv => 5070,
            IndexerCategory::Movies => 2000,
        }
    }

    pub fn for_coordinate(coordinate: &SearchCoordinate) -> Self {
        if coordinate.is_movie() {
            IndexerCategory::Movies
        } else {
            IndexerCategory::AnimeTv
        }
    }
}

/// One indexer query string plus the context it was planned from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,

    /// Title variant the query was built from
    pub source_title: String,

    pub coordinate: SearchCoordinate,

    pub category: IndexerCategory,
}

impl Query {
    pub fn new(text: String, source_title: &str, coordinate: SearchCoordinate) -> Self {
        Self {
            text,
            source_title: source_title.to_string(),
            category: IndexerCategory::for_coordinate(&coordinate),
            coordinate,
        }
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// A release as returned by one indexer call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    pub guid: String,
    pub title: String,
    pub link: String,
    pub indexer_id: String,
    pub seeders: u32,
    pub leechers: u32,
    pub published_at: Option<DateTime<Utc>>,

    /// Bytes; not used for ranking
    #[serde(default)]
    pub size: u64,

    #[serde(default)]
    pub info_url: Option<String>,
}

impl RawResult {
    pub fn new(guid: impl Into<String>, title: impl Into<String>, indexer_id: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            title: title.into(),
            link: String::new(),
            indexer_id: indexer_id.into(),
            seeders: 0,
            leechers: 0,
            published_at: None,
            size: 0,
            info_url: None,
        }
    }

    pub fn with_seeders(mut self, seeders: u32) -> Self {
        self.seeders = seeders;
        self
    }

    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }
}

/// A deduplicated, ranked result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    #[serde(flatten)]
    pub result: RawResult,

    /// Stable id of the duplicate cluster this result represents
    pub cluster_id: Uuid,

    /// Raw results collapsed into this one, itself included
    pub cluster_size: usize,
}

impl RankedResult {
    pub fn new(result: RawResult, cluster_size: usize) -> Self {
        Self {
            cluster_id: Uuid::new_v5(&Uuid::NAMESPACE_URL, result.guid.as_bytes()),
            result,
            cluster_size,
        }
    }
}

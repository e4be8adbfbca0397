// src/integrations/collaborators.rs
//
// Contracts of the external systems the pipeline consumes.
//
// CRITICAL RULES:
// - Narrow contracts only; protocols live behind the implementations
// - Every call may fail with AppError::Upstream, the pipeline recovers
// - Implementations are shared as Arc<dyn Trait> across concurrent requests

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    AnimeTitles, EpisodeCrossmap, IndexerCategory, RawResult, SeasonStructure, SourceId,
};
use crate::error::AppResult;

// ============================================================================
// OFFLINE TITLE/ID DATABASE
// ============================================================================

/// One entry of the offline title/id database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfflineRecord {
    pub titles: AnimeTitles,
    pub anilist_id: Option<u64>,
    pub mal_id: Option<u64>,
    pub anidb_id: Option<u64>,
    pub total_episodes: Option<u32>,
    pub year: Option<i32>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OfflineDatabase: Send + Sync {
    async fn lookup(&self, source: SourceId) -> AppResult<Option<OfflineRecord>>;
}

// ============================================================================
// METADATA API FALLBACK
// ============================================================================

/// Remote anime metadata service keyed by AniList id.
/// Calls are rate limited by the resolver, not by the implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataApi: Send + Sync {
    async fn fetch_by_anilist_id(&self, anilist_id: u64) -> AppResult<Option<AnimeTitles>>;
}

// ============================================================================
// EPISODE CROSSMAP
// ============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CrossmapSource: Send + Sync {
    /// Complete (season, episode) -> absolute table, or None if the service has none
    async fn fetch_crossmap(&self, source: SourceId) -> AppResult<Option<EpisodeCrossmap>>;
}

// ============================================================================
// SERIES METADATA
// ============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SeriesMetadataSource: Send + Sync {
    /// Authoritative per-season episode counts
    async fn season_structure(&self, source: SourceId) -> AppResult<Option<SeasonStructure>>;
}

// ============================================================================
// INDEXER BACKEND
// ============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IndexerBackend: Send + Sync {
    async fn search(&self, query: &str, category: IndexerCategory) -> AppResult<Vec<RawResult>>;
}

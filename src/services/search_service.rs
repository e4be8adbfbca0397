// src/services/search_service.rs
//
// Search Service - the resolveAndSearch facade
//
// Owns the request deadline and runs the pipeline:
// resolve -> translate -> plan -> aggregate
//
// CRITICAL RULES:
// - Only resolution failures and invalid episodes surface as typed failures
// - Indexer failures and translation fallbacks are absorbed
// - One deadline per request, shared by resolution and aggregation

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;

use crate::config::Settings;
use crate::domain::{
    AnimeIdentity, RankedResult, SearchCoordinate, SearchFailure, SourceId, SourceKind,
};
use crate::infrastructure::{Clock, TokenBucket};
use crate::integrations::{
    CrossmapSource, IndexerBackend, MetadataApi, OfflineDatabase, SeriesMetadataSource,
};
use crate::repositories::OverrideRepository;
use crate::services::aggregation_service::AggregationService;
use crate::services::episode_translator::EpisodeTranslator;
use crate::services::query_planner::QueryPlanner;
use crate::services::resolution_service::IdentifierResolver;

// ============================================================================
// REQUEST
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub source: SourceId,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub year: Option<i32>,
    /// Falls back to `planner.max_queries`
    pub max_queries: Option<usize>,
    /// Falls back to `aggregator.max_results`
    pub max_results: Option<usize>,
}

impl SearchRequest {
    pub fn new(source: SourceId) -> Self {
        Self {
            source,
            season: None,
            episode: None,
            year: None,
            max_queries: None,
            max_results: None,
        }
    }

    pub fn episode(source: SourceId, season: u32, episode: u32) -> Self {
        Self {
            season: Some(season),
            episode: Some(episode),
            ..Self::new(source)
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_limits(mut self, max_queries: usize, max_results: usize) -> Self {
        self.max_queries = Some(max_queries);
        self.max_results = Some(max_results);
        self
    }

    /// Movie for tmdb ids or a year-only request
    pub fn is_movie(&self) -> bool {
        self.source.kind == SourceKind::Tmdb
            || (self.season.is_none() && self.episode.is_none() && self.year.is_some())
    }
}

// ============================================================================
// COLLABORATORS
// ============================================================================

/// External systems the pipeline is wired to
pub struct Collaborators {
    pub overrides: Arc<dyn OverrideRepository>,
    pub offline_database: Arc<dyn OfflineDatabase>,
    pub metadata_api: Option<Arc<dyn MetadataApi>>,
    pub crossmap: Option<Arc<dyn CrossmapSource>>,
    pub series_metadata: Option<Arc<dyn SeriesMetadataSource>>,
    pub indexer: Arc<dyn IndexerBackend>,
}

// ============================================================================
// SEARCH SERVICE
// ============================================================================

pub struct SearchService {
    resolver: Arc<IdentifierResolver>,
    translator: EpisodeTranslator,
    planner: QueryPlanner,
    aggregator: AggregationService,
    settings: Settings,
}

impl SearchService {
    pub fn new(
        resolver: Arc<IdentifierResolver>,
        translator: EpisodeTranslator,
        aggregator: AggregationService,
        settings: Settings,
    ) -> Self {
        Self {
            resolver,
            translator,
            planner: QueryPlanner::new(),
            aggregator,
            settings,
        }
    }

    /// Wires the whole pipeline from settings
    pub fn build(settings: Settings, collaborators: Collaborators, clock: Arc<dyn Clock>) -> Self {
        let bucket = Arc::new(TokenBucket::per_minute(
            settings.rate_limit.metadata_api_per_minute,
        ));

        let resolver = Arc::new(IdentifierResolver::new(
            collaborators.overrides.clone(),
            collaborators.offline_database,
            collaborators.metadata_api,
            bucket,
            &settings.resolver,
            clock.clone(),
        ));

        let mut translator =
            EpisodeTranslator::new(collaborators.overrides, settings.translator.clone(), clock);
        if let Some(crossmap) = collaborators.crossmap {
            translator = translator.with_crossmap(crossmap);
        }
        if let Some(series_metadata) = collaborators.series_metadata {
            translator = translator.with_series_metadata(series_metadata);
        }

        let aggregator = AggregationService::new(collaborators.indexer, settings.aggregator.clone());

        Self::new(resolver, translator, aggregator, settings)
    }

    /// Shared resolver, for cache invalidation by the management layer
    pub fn resolver(&self) -> Arc<IdentifierResolver> {
        self.resolver.clone()
    }

    pub async fn resolve_and_search(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<RankedResult>, SearchFailure> {
        let deadline = Instant::now() + self.settings.search.request_timeout();

        let identity = self.resolver.resolve(request.source, deadline).await?;
        let coordinate = self.coordinate_for(&identity, request).await?;

        let max_queries = request.max_queries.unwrap_or(self.settings.planner.max_queries);
        let max_results = request
            .max_results
            .unwrap_or(self.settings.aggregator.max_results);

        let queries = self.planner.plan(&identity, coordinate, max_queries);
        if queries.is_empty() {
            log::info!("No queries planned for {}, returning no results", request.source);
            return Ok(Vec::new());
        }

        let results = self.aggregator.execute(&queries, deadline, max_results).await;
        if results.is_empty() {
            log::info!("Search for {} found no results", request.source);
        }
        Ok(results)
    }

    async fn coordinate_for(
        &self,
        identity: &AnimeIdentity,
        request: &SearchRequest,
    ) -> Result<SearchCoordinate, SearchFailure> {
        if request.is_movie() {
            return Ok(self.translator.translate_movie(identity, request.year));
        }
        match request.episode {
            Some(episode) => Ok(self
                .translator
                .translate(identity, request.season.unwrap_or(1), episode)
                .await?),
            None => Ok(SearchCoordinate::Series),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_routing() {
        assert!(SearchRequest::new(SourceId::tmdb(1)).is_movie());
        assert!(SearchRequest::new(SourceId::tvdb(1)).with_year(2016).is_movie());
        assert!(!SearchRequest::episode(SourceId::tvdb(1), 1, 3).with_year(2016).is_movie());
        assert!(!SearchRequest::new(SourceId::tvdb(1)).is_movie());
    }
}

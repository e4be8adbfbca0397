// src/services/mod.rs
//
// Services Module - Orchestration Layer
//
// Pipeline: resolve -> translate -> plan -> aggregate

pub mod aggregation_service;
pub mod dedup;
pub mod episode_translator;
pub mod override_service;
pub mod query_planner;
pub mod relevance;
pub mod resolution_service;
pub mod search_service;

#[cfg(test)]
mod resolution_service_tests;
#[cfg(test)]
mod aggregation_service_tests;

pub use aggregation_service::AggregationService;

pub use dedup::{Cluster, Deduplicator, SimilarityMetric};

pub use episode_translator::EpisodeTranslator;

pub use override_service::OverrideService;

pub use query_planner::QueryPlanner;

pub use resolution_service::{
    IdentifierResolver,
    MetadataApiTier,
    OfflineDatabaseTier,
    OverrideTier,
    RateLimitedMetadata,
    ResolutionContext,
    ResolutionTier,
};

pub use search_service::{
    Collaborators,
    SearchRequest,
    SearchService,
};

// src/lib.rs
// AnimeProxy - Anime-aware search bridge
//
// Architecture:
// - Domain-centric: identities, overrides and search values live in domain/
// - Explicit: every fallback is logged, every failure is typed
// - Collaborators behind traits: override store, offline database,
//   metadata API, crossmap, series metadata, indexer backend
// - One pipeline: resolve -> translate -> plan -> aggregate

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod repositories;
pub mod services;

// ============================================================================
// COLLABORATOR LAYER
// ============================================================================

pub mod integrations;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{
    // Identity
    AnimeIdentity,
    AnimeTitles,
    SourceId,
    SourceKind,
    // Overrides
    MappingOverride,
    SeasonRange,
    // Search
    EpisodeCrossmap,
    IndexerCategory,
    Query,
    RankedResult,
    RawResult,
    SearchCoordinate,
    SeasonStructure,
    TranslationSource,
    // Failures
    ResolutionFailure,
    ResolutionFailureReason,
    SearchFailure,
    TranslationFailure,
    TranslationFailureReason,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult, Collaborator};

// ============================================================================
// PUBLIC API - Configuration
// ============================================================================

pub use config::{Settings, SettingsSource};

// ============================================================================
// PUBLIC API - Collaborators
// ============================================================================

pub use integrations::{
    CrossmapSource, IndexerBackend, ManamiOfflineDatabase, MetadataApi, OfflineDatabase,
    OfflineRecord, SeriesMetadataSource,
};

pub use repositories::{InMemoryOverrideRepository, OverrideRepository};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    AggregationService,
    Collaborators,
    EpisodeTranslator,
    IdentifierResolver,
    OverrideService,
    QueryPlanner,
    SearchRequest,
    SearchService,
};

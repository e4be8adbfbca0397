// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file MUST declare all domain modules and re-export their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod identity;
pub mod mapping_override;
pub mod resolution;
pub mod search;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Identity Domain
pub use identity::{validate_identity, AnimeIdentity, AnimeTitles, SourceId, SourceKind};

// Override Domain
pub use mapping_override::{
    episode_key, parse_episode_key, validate_override, MappingOverride, SeasonRange,
};

// Resolution Outcomes
pub use resolution::{
    ResolutionFailure, ResolutionFailureReason, SearchFailure, TranslationFailure,
    TranslationFailureReason,
};

// Search Domain
pub use search::{
    EpisodeCrossmap, IndexerCategory, Query, RankedResult, RawResult, SearchCoordinate,
    SeasonStructure, TranslationSource,
};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid episode key '{0}', expected SxxEyy")]
    InvalidEpisodeKey(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;

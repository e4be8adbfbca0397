// src/domain/resolution/value_objects.rs
//
// Resolution Value Objects
//
// Typed failures of the search pipeline. These are expected outcomes that
// the boundary layer reports, not infrastructure errors.
//
// CRITICAL INVARIANTS:
// - All fields are immutable (no &mut self methods)
// - No side effects
// - Clone + Debug + Serialize for traceability

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::identity::SourceId;

// ============================================================================
// RESOLUTION FAILURE
// ============================================================================

/// A catalog id that could not be turned into an anime identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("Resolution of {source_id} failed ({reason}): {description}")]
pub struct ResolutionFailure {
    pub source_id: SourceId,

    pub reason: ResolutionFailureReason,

    /// Human-readable description
    pub description: String,

    /// When this failure occurred
    pub failed_at: DateTime<Utc>,
}

impl ResolutionFailure {
    pub fn new(source_id: SourceId, reason: ResolutionFailureReason, description: String) -> Self {
        Self {
            source_id,
            reason,
            description,
            failed_at: Utc::now(),
        }
    }

    pub fn not_found(source_id: SourceId) -> Self {
        Self::new(
            source_id,
            ResolutionFailureReason::NotFound,
            "No tier produced a usable title".to_string(),
        )
    }

    pub fn rate_limited(source_id: SourceId) -> Self {
        Self::new(
            source_id,
            ResolutionFailureReason::RateLimited,
            "Metadata API token unavailable before the request deadline".to_string(),
        )
    }
}

/// Reasons why resolution can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionFailureReason {
    /// No override, offline record or metadata API answer carried a title
    NotFound,

    /// Metadata API fallback could not get a token in time
    RateLimited,
}

impl std::fmt::Display for ResolutionFailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionFailureReason::NotFound => write!(f, "not_found"),
            ResolutionFailureReason::RateLimited => write!(f, "rate_limited"),
        }
    }
}

// ============================================================================
// TRANSLATION FAILURE
// ============================================================================

/// A season/episode pair that could not be placed in absolute numbering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("Translation of S{season:02}E{episode:02} failed ({reason}): {description}")]
pub struct TranslationFailure {
    pub season: u32,
    pub episode: u32,
    pub reason: TranslationFailureReason,
    pub description: String,
    pub failed_at: DateTime<Utc>,
}

impl TranslationFailure {
    pub fn new(
        season: u32,
        episode: u32,
        reason: TranslationFailureReason,
        description: String,
    ) -> Self {
        Self {
            season,
            episode,
            reason,
            description,
            failed_at: Utc::now(),
        }
    }

    pub fn invalid_episode(season: u32, episode: u32) -> Self {
        Self::new(
            season,
            episode,
            TranslationFailureReason::InvalidEpisode,
            "Episode numbers start at 1".to_string(),
        )
    }

    pub fn ambiguous_season(season: u32, episode: u32, description: String) -> Self {
        Self::new(season, episode, TranslationFailureReason::AmbiguousSeason, description)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationFailureReason {
    /// Season structure is known but cannot place the episode
    AmbiguousSeason,

    /// Episode 0 requested
    InvalidEpisode,
}

impl std::fmt::Display for TranslationFailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslationFailureReason::AmbiguousSeason => write!(f, "ambiguous_season"),
            TranslationFailureReason::InvalidEpisode => write!(f, "invalid_episode"),
        }
    }
}

// ============================================================================
// SEARCH FAILURE
// ============================================================================

/// Typed failure surfaced by `resolve_and_search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum SearchFailure {
    #[error(transparent)]
    Resolution(#[from] ResolutionFailure),

    #[error(transparent)]
    Translation(#[from] TranslationFailure),
}

impl SearchFailure {
    pub fn resolution(&self) -> Option<&ResolutionFailure> {
        match self {
            SearchFailure::Resolution(f) => Some(f),
            SearchFailure::Translation(_) => None,
        }
    }

    pub fn translation(&self) -> Option<&TranslationFailure> {
        match self {
            SearchFailure::Translation(f) => Some(f),
            SearchFailure::Resolution(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_failure_display() {
        let failure = ResolutionFailure::not_found(SourceId::tvdb(42));
        let text = failure.to_string();
        assert!(text.contains("tvdb:42"));
        assert!(text.contains("not_found"));
    }

    #[test]
    fn test_translation_failure_display() {
        let failure = TranslationFailure::invalid_episode(1, 0);
        assert!(failure.to_string().starts_with("Translation of S01E00 failed (invalid_episode)"));
    }

    #[test]
    fn test_search_failure_serializes_stage() {
        let failure = SearchFailure::from(ResolutionFailure::rate_limited(SourceId::tvdb(7)));
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["stage"], "resolution");
        assert_eq!(json["reason"], "rate_limited");
        assert!(failure.resolution().is_some());
        assert!(failure.translation().is_none());
    }
}

// src/config.rs
//
// Runtime settings of the search pipeline.
//
// Every component owns a config struct with defaults; `Settings` groups
// them and is what the embedding application loads.

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::services::dedup::SimilarityMetric;

pub const CONFIG_PATH_ENV: &str = "ANIMEPROXY_CONFIG_PATH";
pub const CONFIG_JSON_ENV: &str = "ANIMEPROXY_CONFIG_JSON";

// ============================================================================
// COMPONENT CONFIGS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// How long a resolved identity stays cached (seconds)
    pub cache_ttl_secs: u64,
    /// Merge metadata API titles into offline database hits
    pub enrich_with_metadata_api: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 7 * 24 * 60 * 60,
            enrich_with_metadata_api: false,
        }
    }
}

impl ResolverConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub crossmap_cache_ttl_secs: u64,
    /// Budget for one crossmap fetch (ms)
    pub crossmap_timeout_ms: u64,
    /// Budget for one season structure lookup (ms)
    pub series_metadata_timeout_ms: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            crossmap_cache_ttl_secs: 7 * 24 * 60 * 60,
            crossmap_timeout_ms: 10_000,
            series_metadata_timeout_ms: 10_000,
        }
    }
}

impl TranslatorConfig {
    pub fn crossmap_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.crossmap_cache_ttl_secs)
    }

    pub fn crossmap_timeout(&self) -> Duration {
        Duration::from_millis(self.crossmap_timeout_ms)
    }

    pub fn series_metadata_timeout(&self) -> Duration {
        Duration::from_millis(self.series_metadata_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Default cap on planned queries when the request gives none
    pub max_queries: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self { max_queries: 8 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Default cap on returned results when the request gives none
    pub max_results: usize,
    pub per_query_timeout_ms: u64,
    /// Upper bound on indexer calls in flight for one search
    pub max_concurrent_queries: usize,
    pub dedup_enabled: bool,
    pub similarity_metric: SimilarityMetric,
    /// Titles scoring above this similarity may collapse (0.0..=1.0)
    pub similarity_threshold: f64,
    /// Drop results sharing no keyword with any planned title
    pub relevance_filter: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_results: 100,
            per_query_timeout_ms: 30_000,
            max_concurrent_queries: 16,
            dedup_enabled: true,
            similarity_metric: SimilarityMetric::default(),
            similarity_threshold: 0.92,
            relevance_filter: false,
        }
    }
}

impl AggregatorConfig {
    pub fn per_query_timeout(&self) -> Duration {
        Duration::from_millis(self.per_query_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Metadata API calls per minute; 0 disables limiting
    pub metadata_api_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            metadata_api_per_minute: 90,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Whole-request deadline (ms)
    pub request_timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 45_000,
        }
    }
}

impl SearchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

// ============================================================================
// SETTINGS
// ============================================================================

/// Where the loaded settings came from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SettingsSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub resolver: ResolverConfig,
    pub translator: TranslatorConfig,
    pub planner: PlannerConfig,
    pub aggregator: AggregatorConfig,
    pub rate_limit: RateLimitConfig,
    pub search: SearchConfig,
}

impl Settings {
    /// Load settings using environment variables.
    /// Evaluation order:
    /// 1) `$ANIMEPROXY_CONFIG_PATH` (JSON file),
    /// 2) `$ANIMEPROXY_CONFIG_JSON` (inline JSON),
    /// 3) defaults if neither is set.
    pub fn load_from_env() -> anyhow::Result<(Self, SettingsSource)> {
        Self::load_from_values(env::var(CONFIG_PATH_ENV).ok(), env::var(CONFIG_JSON_ENV).ok())
    }

    fn load_from_values(
        path: Option<String>,
        inline: Option<String>,
    ) -> anyhow::Result<(Self, SettingsSource)> {
        if let Some(path_str) = path.filter(|p| !p.trim().is_empty()) {
            let path = PathBuf::from(path_str);
            let settings = Self::load_from_file(&path)?;
            return Ok((settings, SettingsSource::EnvPath(path)));
        }

        if let Some(raw) = inline.filter(|raw| !raw.trim().is_empty()) {
            let settings = Self::parse_json(&raw)
                .with_context(|| format!("failed to parse {}", CONFIG_JSON_ENV))?;
            return Ok((settings, SettingsSource::EnvInline));
        }

        Ok((Self::default(), SettingsSource::Default))
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        Self::parse_json(&contents)
            .with_context(|| format!("invalid settings file {}", path.display()))
    }

    pub fn parse_json(contents: &str) -> anyhow::Result<Self> {
        let settings: Self = serde_json::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let threshold = self.aggregator.similarity_threshold;
        ensure!(
            (0.0..=1.0).contains(&threshold),
            "aggregator.similarity_threshold must be within 0.0..=1.0, got {}",
            threshold
        );
        ensure!(
            self.aggregator.max_concurrent_queries >= 1,
            "aggregator.max_concurrent_queries must be at least 1"
        );
        Ok(())
    }
}

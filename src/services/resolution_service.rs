// src/services/resolution_service.rs
//
// Identifier Resolver
//
// Turns a catalog id into an AnimeIdentity with every known title variant.
//
// CRITICAL RULES:
// - Tiers run in order and the first identity wins:
//   override -> offline database -> metadata API
// - Override titles are never merged with lower tiers
// - Overrides bypass the cache on every call
// - Collaborator failures skip the tier; only a missing token before the
//   deadline aborts the cascade
// - Never mutates overrides

use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::Instant;

use crate::config::ResolverConfig;
use crate::domain::{
    validate_identity, AnimeIdentity, AnimeTitles, MappingOverride, ResolutionFailure, SourceId,
};
use crate::error::{AppError, AppResult};
use crate::infrastructure::{Clock, TokenBucket, TtlCache};
use crate::integrations::{MetadataApi, OfflineDatabase, OfflineRecord};
use crate::repositories::OverrideRepository;

// ============================================================================
// RESOLUTION CONTEXT
// ============================================================================

/// State shared by the tiers of one resolution
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    pub source: SourceId,
    pub deadline: Instant,

    pub anilist_id: Option<u64>,
    pub mal_id: Option<u64>,
    pub anidb_id: Option<u64>,
    pub total_episodes: Option<u32>,
    pub year: Option<i32>,

    /// Set once an override was found, even an id-only one
    pub user_override: bool,
}

impl ResolutionContext {
    pub fn new(source: SourceId, deadline: Instant) -> Self {
        Self {
            source,
            deadline,
            anilist_id: None,
            mal_id: None,
            anidb_id: None,
            total_episodes: None,
            year: None,
            user_override: false,
        }
    }

    /// Records ids from an override; these take precedence over anything found later
    fn absorb_override(&mut self, o: &MappingOverride) {
        self.user_override = true;
        self.anilist_id = o.anilist_id.or(self.anilist_id);
        self.mal_id = o.mal_id.or(self.mal_id);
        self.anidb_id = o.anidb_id.or(self.anidb_id);
        self.year = o.year.or(self.year);
    }

    /// Fills hints the context does not have yet
    fn absorb_record(&mut self, record: &OfflineRecord) {
        self.anilist_id = self.anilist_id.or(record.anilist_id);
        self.mal_id = self.mal_id.or(record.mal_id);
        self.anidb_id = self.anidb_id.or(record.anidb_id);
        self.total_episodes = self.total_episodes.or(record.total_episodes);
        self.year = self.year.or(record.year);
    }

    /// Builds an identity from the accumulated hints
    pub fn identity(&self, titles: AnimeTitles) -> AnimeIdentity {
        let mut identity = AnimeIdentity::new(self.source, titles)
            .with_total_episodes(self.total_episodes)
            .with_year(self.year);
        identity.anilist_id = self.anilist_id;
        identity.mal_id = self.mal_id;
        identity.anidb_id = self.anidb_id;
        identity.is_user_override = self.user_override;
        identity
    }
}

// ============================================================================
// TIERS
// ============================================================================

/// One step of the resolution cascade.
///
/// `Ok(Some(_))` ends the cascade, `Ok(None)` falls through,
/// `Err(_)` aborts resolution.
#[async_trait]
pub trait ResolutionTier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether identities from this tier may be cached
    fn cacheable(&self) -> bool {
        true
    }

    async fn attempt(
        &self,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<AnimeIdentity>, ResolutionFailure>;
}

/// Metadata API calls behind the shared token bucket
pub struct RateLimitedMetadata {
    api: Arc<dyn MetadataApi>,
    bucket: Arc<TokenBucket>,
}

impl RateLimitedMetadata {
    pub fn new(api: Arc<dyn MetadataApi>, bucket: Arc<TokenBucket>) -> Self {
        Self { api, bucket }
    }

    /// Outer error: no token before the deadline. Inner error: the call itself failed.
    async fn fetch(
        &self,
        ctx: &ResolutionContext,
        anilist_id: u64,
    ) -> Result<AppResult<Option<AnimeTitles>>, ResolutionFailure> {
        if self.bucket.acquire(ctx.deadline).await.is_err() {
            return Err(ResolutionFailure::rate_limited(ctx.source));
        }

        let call = self.api.fetch_by_anilist_id(anilist_id);
        Ok(match tokio::time::timeout_at(ctx.deadline, call).await {
            Ok(result) => result,
            Err(elapsed) => Err(AppError::from(elapsed)),
        })
    }
}

/// Tier 1: user-authored override
pub struct OverrideTier {
    overrides: Arc<dyn OverrideRepository>,
}

impl OverrideTier {
    pub fn new(overrides: Arc<dyn OverrideRepository>) -> Self {
        Self { overrides }
    }
}

#[async_trait]
impl ResolutionTier for OverrideTier {
    fn name(&self) -> &'static str {
        "override"
    }

    fn cacheable(&self) -> bool {
        false
    }

    async fn attempt(
        &self,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<AnimeIdentity>, ResolutionFailure> {
        let found = match self.overrides.get(ctx.source).await {
            Ok(found) => found,
            Err(e) => {
                log::warn!("Override lookup for {} failed, skipping: {}", ctx.source, e);
                return Ok(None);
            }
        };
        let Some(o) = found else {
            return Ok(None);
        };

        ctx.absorb_override(&o);
        if o.is_id_only() {
            log::debug!("Id-only override for {}, resolving titles from lower tiers", ctx.source);
            return Ok(None);
        }

        Ok(Some(
            ctx.identity(AnimeTitles::from_custom_titles(&o.custom_titles)),
        ))
    }
}

/// Tier 2: offline title/id database, optionally enriched from the metadata API
pub struct OfflineDatabaseTier {
    database: Arc<dyn OfflineDatabase>,
    enrichment: Option<RateLimitedMetadata>,
}

impl OfflineDatabaseTier {
    pub fn new(database: Arc<dyn OfflineDatabase>) -> Self {
        Self {
            database,
            enrichment: None,
        }
    }

    pub fn with_enrichment(mut self, metadata: RateLimitedMetadata) -> Self {
        self.enrichment = Some(metadata);
        self
    }

    async fn enrich(&self, ctx: &ResolutionContext, titles: &mut AnimeTitles) {
        let (Some(metadata), Some(anilist_id)) = (&self.enrichment, ctx.anilist_id) else {
            return;
        };
        match metadata.fetch(ctx, anilist_id).await {
            Ok(Ok(Some(extra))) => titles.merge(extra),
            Ok(Ok(None)) => {}
            Ok(Err(e)) => log::warn!("Title enrichment for {} failed: {}", ctx.source, e),
            Err(e) => log::warn!("Title enrichment for {} skipped: {}", ctx.source, e),
        }
    }
}

#[async_trait]
impl ResolutionTier for OfflineDatabaseTier {
    fn name(&self) -> &'static str {
        "offline_database"
    }

    async fn attempt(
        &self,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<AnimeIdentity>, ResolutionFailure> {
        let record = match self.database.lookup(ctx.source).await {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(None),
            Err(e) => {
                log::warn!("Offline database lookup for {} failed, skipping: {}", ctx.source, e);
                return Ok(None);
            }
        };

        ctx.absorb_record(&record);
        if record.titles.is_empty() {
            return Ok(None);
        }

        let mut titles = record.titles;
        self.enrich(ctx, &mut titles).await;
        Ok(Some(ctx.identity(titles)))
    }
}

/// Tier 3: metadata API, reachable only with a known AniList id
pub struct MetadataApiTier {
    metadata: RateLimitedMetadata,
}

impl MetadataApiTier {
    pub fn new(metadata: RateLimitedMetadata) -> Self {
        Self { metadata }
    }
}

#[async_trait]
impl ResolutionTier for MetadataApiTier {
    fn name(&self) -> &'static str {
        "metadata_api"
    }

    async fn attempt(
        &self,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<AnimeIdentity>, ResolutionFailure> {
        let Some(anilist_id) = ctx.anilist_id else {
            return Ok(None);
        };

        match self.metadata.fetch(ctx, anilist_id).await? {
            Ok(Some(titles)) if !titles.is_empty() => Ok(Some(ctx.identity(titles))),
            Ok(_) => Ok(None),
            Err(e) => {
                log::warn!("Metadata API lookup for {} failed, skipping: {}", ctx.source, e);
                Ok(None)
            }
        }
    }
}

// ============================================================================
// IDENTIFIER RESOLVER
// ============================================================================

pub struct IdentifierResolver {
    tiers: Vec<Box<dyn ResolutionTier>>,
    cache: TtlCache<SourceId, AnimeIdentity>,
}

impl IdentifierResolver {
    /// Standard cascade: override, offline database, then the metadata API when one is given
    pub fn new(
        overrides: Arc<dyn OverrideRepository>,
        database: Arc<dyn OfflineDatabase>,
        metadata_api: Option<Arc<dyn MetadataApi>>,
        bucket: Arc<TokenBucket>,
        config: &ResolverConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut offline = OfflineDatabaseTier::new(database);
        let mut tiers: Vec<Box<dyn ResolutionTier>> = vec![Box::new(OverrideTier::new(overrides))];

        if let Some(api) = metadata_api {
            if config.enrich_with_metadata_api {
                offline = offline.with_enrichment(RateLimitedMetadata::new(api.clone(), bucket.clone()));
            }
            tiers.push(Box::new(offline));
            tiers.push(Box::new(MetadataApiTier::new(RateLimitedMetadata::new(api, bucket))));
        } else {
            tiers.push(Box::new(offline));
        }

        Self::from_tiers(tiers, config, clock)
    }

    pub fn from_tiers(
        tiers: Vec<Box<dyn ResolutionTier>>,
        config: &ResolverConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tiers,
            cache: TtlCache::new(config.cache_ttl(), clock),
        }
    }

    pub async fn resolve(
        &self,
        source: SourceId,
        deadline: Instant,
    ) -> Result<AnimeIdentity, ResolutionFailure> {
        let mut ctx = ResolutionContext::new(source, deadline);
        let mut cache_checked = false;

        for tier in &self.tiers {
            if tier.cacheable() && !ctx.user_override && !cache_checked {
                cache_checked = true;
                if let Some(hit) = self.cache.get(&source) {
                    log::debug!("Resolution cache hit for {}", source);
                    return Ok(hit);
                }
            }

            let Some(identity) = tier.attempt(&mut ctx).await? else {
                log::debug!("Tier {} had nothing for {}", tier.name(), source);
                continue;
            };

            if let Err(e) = validate_identity(&identity) {
                log::warn!("Tier {} produced an unusable identity for {}: {}", tier.name(), source, e);
                continue;
            }

            log::info!(
                "Resolved {} via {} ({} titles)",
                source,
                tier.name(),
                identity.titles.len()
            );
            if tier.cacheable() && !identity.is_user_override {
                self.cache.insert(source, identity.clone());
            }
            return Ok(identity);
        }

        log::info!("No tier resolved {}", source);
        Err(ResolutionFailure::not_found(source))
    }

    /// Drops the cached identity of one catalog id
    pub fn invalidate(&self, source: SourceId) {
        if self.cache.remove(&source).is_some() {
            log::debug!("Invalidated cached identity for {}", source);
        }
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

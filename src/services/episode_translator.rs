// src/services/episode_translator.rs
//
// Episode Translator
//
// Converts a (season, episode) pair into the absolute episode number anime
// releases are labelled with.
//
// CRITICAL RULES:
// - Precedence: override key -> season ranges -> crossmap -> estimation
// - The override is read on every call, never cached
// - Crossmap misses, errors and timeouts are not cached
// - Season 0 never goes through range arithmetic or estimation
// - Only episode 0 is a hard failure; everything else degrades to pass-through

use std::sync::Arc;

use crate::config::TranslatorConfig;
use crate::domain::{
    AnimeIdentity, EpisodeCrossmap, MappingOverride, SearchCoordinate, SeasonStructure,
    SourceId, TranslationFailure, TranslationSource,
};
use crate::infrastructure::{Clock, TtlCache};
use crate::integrations::{CrossmapSource, SeriesMetadataSource};
use crate::repositories::OverrideRepository;

pub struct EpisodeTranslator {
    overrides: Arc<dyn OverrideRepository>,
    crossmap: Option<Arc<dyn CrossmapSource>>,
    series_metadata: Option<Arc<dyn SeriesMetadataSource>>,
    crossmap_cache: TtlCache<SourceId, Arc<EpisodeCrossmap>>,
    config: TranslatorConfig,
}

impl EpisodeTranslator {
    pub fn new(
        overrides: Arc<dyn OverrideRepository>,
        config: TranslatorConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            overrides,
            crossmap: None,
            series_metadata: None,
            crossmap_cache: TtlCache::new(config.crossmap_cache_ttl(), clock),
            config,
        }
    }

    pub fn with_crossmap(mut self, crossmap: Arc<dyn CrossmapSource>) -> Self {
        self.crossmap = Some(crossmap);
        self
    }

    pub fn with_series_metadata(mut self, series_metadata: Arc<dyn SeriesMetadataSource>) -> Self {
        self.series_metadata = Some(series_metadata);
        self
    }

    /// Translate a season/episode pair into a search coordinate
    pub async fn translate(
        &self,
        identity: &AnimeIdentity,
        season: u32,
        episode: u32,
    ) -> Result<SearchCoordinate, TranslationFailure> {
        if episode == 0 {
            return Err(TranslationFailure::invalid_episode(season, episode));
        }

        let coordinate = |absolute: u32, source: TranslationSource| {
            log::info!(
                "{} S{:02}E{:02} -> {} via {}",
                identity.source,
                season,
                episode,
                absolute,
                source
            );
            if season == 0 {
                SearchCoordinate::special(absolute, source)
            } else {
                SearchCoordinate::episode(absolute, source)
            }
        };

        if let Some(o) = self.load_override(identity.source).await {
            if let Some(absolute) = o.episode_override(season, episode) {
                return Ok(coordinate(absolute, TranslationSource::Override));
            }
            if season != 0 {
                if let Some(absolute) = o.range_absolute(season, episode) {
                    return Ok(coordinate(absolute, TranslationSource::SeasonRange));
                }
            }
        }

        if let Some(table) = self.crossmap_table(identity.source).await {
            if let Some(absolute) = table.absolute(season, episode) {
                return Ok(coordinate(absolute, TranslationSource::Crossmap));
            }
        }

        if season == 0 {
            return Ok(coordinate(episode, TranslationSource::PassThrough));
        }

        match self.season_structure(identity.source).await {
            Some(structure) => {
                match estimate_absolute(&structure, identity.total_episodes, season, episode) {
                    Ok(absolute) => Ok(coordinate(absolute, TranslationSource::Estimated)),
                    Err(failure) => {
                        log::warn!("{}; passing episode through", failure);
                        Ok(coordinate(episode, TranslationSource::PassThrough))
                    }
                }
            }
            None => {
                if season > 1 {
                    log::warn!(
                        "No season structure for {}, treating S{:02}E{:02} as absolute {}",
                        identity.source,
                        season,
                        episode,
                        episode
                    );
                }
                Ok(coordinate(episode, TranslationSource::PassThrough))
            }
        }
    }

    /// Movie path: the identity's year wins over the requested one
    pub fn translate_movie(&self, identity: &AnimeIdentity, year: Option<i32>) -> SearchCoordinate {
        SearchCoordinate::movie(identity.year.or(year))
    }

    async fn load_override(&self, source: SourceId) -> Option<MappingOverride> {
        match self.overrides.get(source).await {
            Ok(found) => found,
            Err(e) => {
                log::warn!("Override lookup for {} failed, ignoring overrides: {}", source, e);
                None
            }
        }
    }

    async fn crossmap_table(&self, source: SourceId) -> Option<Arc<EpisodeCrossmap>> {
        let fetcher = self.crossmap.as_ref()?;

        if let Some(table) = self.crossmap_cache.get(&source) {
            log::debug!("Crossmap cache hit for {}", source);
            return Some(table);
        }

        match tokio::time::timeout(self.config.crossmap_timeout(), fetcher.fetch_crossmap(source)).await {
            Ok(Ok(Some(table))) if !table.is_empty() => {
                let table = Arc::new(table);
                self.crossmap_cache.insert(source, table.clone());
                Some(table)
            }
            Ok(Ok(_)) => {
                log::debug!("No crossmap for {}", source);
                None
            }
            Ok(Err(e)) => {
                log::warn!("Crossmap fetch for {} failed: {}", source, e);
                None
            }
            Err(_) => {
                log::warn!(
                    "Crossmap fetch for {} timed out after {:?}",
                    source,
                    self.config.crossmap_timeout()
                );
                None
            }
        }
    }

    async fn season_structure(&self, source: SourceId) -> Option<SeasonStructure> {
        let lookup = self.series_metadata.as_ref()?;
        match tokio::time::timeout(
            self.config.series_metadata_timeout(),
            lookup.season_structure(source),
        )
        .await
        {
            Ok(Ok(structure)) => structure.filter(|s| !s.is_empty()),
            Ok(Err(e)) => {
                log::warn!("Season structure lookup for {} failed: {}", source, e);
                None
            }
            Err(_) => {
                log::warn!("Season structure lookup for {} timed out", source);
                None
            }
        }
    }
}

/// Absolute number from per-season counts: episodes of earlier seasons plus `episode`
fn estimate_absolute(
    structure: &SeasonStructure,
    total_episodes: Option<u32>,
    season: u32,
    episode: u32,
) -> Result<u32, TranslationFailure> {
    let before = structure.episodes_before(season).ok_or_else(|| {
        TranslationFailure::ambiguous_season(
            season,
            episode,
            format!("episode counts before season {} are incomplete", season),
        )
    })?;

    let count = structure.episode_count(season).ok_or_else(|| {
        TranslationFailure::ambiguous_season(season, episode, format!("season {} is unknown", season))
    })?;
    if episode > count {
        return Err(TranslationFailure::ambiguous_season(
            season,
            episode,
            format!("season {} has only {} episodes", season, count),
        ));
    }

    let absolute = before.checked_add(episode).ok_or_else(|| {
        TranslationFailure::ambiguous_season(
            season,
            episode,
            format!("episode counts before season {} overflow", season),
        )
    })?;
    if let Some(total) = total_episodes {
        if absolute > total {
            return Err(TranslationFailure::ambiguous_season(
                season,
                episode,
                format!("estimate {} exceeds total of {} episodes", absolute, total),
            ));
        }
    }
    Ok(absolute)
}

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::identity::SourceId;
use crate::domain::{DomainError, DomainResult};

static EPISODE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[Ss](\d{1,4})[Ee](\d{1,5})$").expect("episode key regex should compile"));

/// Canonical override key for a season/episode pair, e.g. `S02E01`
pub fn episode_key(season: u32, episode: u32) -> String {
    format!("S{:02}E{:02}", season, episode)
}

/// Parses `S<digits>E<digits>` (case-insensitive) into (season, episode)
pub fn parse_episode_key(key: &str) -> DomainResult<(u32, u32)> {
    let caps = EPISODE_KEY
        .captures(key.trim())
        .ok_or_else(|| DomainError::InvalidEpisodeKey(key.to_string()))?;

    let season = caps[1]
        .parse::<u32>()
        .map_err(|_| DomainError::InvalidEpisodeKey(key.to_string()))?;
    let episode = caps[2]
        .parse::<u32>()
        .map_err(|_| DomainError::InvalidEpisodeKey(key.to_string()))?;

    Ok((season, episode))
}

/// A contiguous block of one season mapped onto absolute numbering.
///
/// Episode `e` of `season` maps to `start_absolute + e - 1` while `1 <= e <= episode_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonRange {
    pub season: u32,
    pub episode_count: u32,
    pub start_absolute: u32,
}

impl SeasonRange {
    pub fn new(season: u32, episode_count: u32, start_absolute: u32) -> Self {
        Self {
            season,
            episode_count,
            start_absolute,
        }
    }

    pub fn absolute_for(&self, season: u32, episode: u32) -> Option<u32> {
        if season != self.season || episode == 0 || episode > self.episode_count {
            return None;
        }
        self.start_absolute.checked_add(episode - 1)
    }
}

/// A user-authored correction for one catalog id.
///
/// Owned by the management layer. The search pipeline only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingOverride {
    pub source: SourceId,

    pub anilist_id: Option<u64>,
    pub mal_id: Option<u64>,
    pub anidb_id: Option<u64>,

    /// Release year used by the movie path
    pub year: Option<i32>,

    /// Titles to search with, in query order. Empty means the override only pins ids.
    #[serde(default)]
    pub custom_titles: Vec<String>,

    pub notes: Option<String>,

    /// `SxxEyy` -> absolute episode
    #[serde(default)]
    pub season_episode_overrides: BTreeMap<String, u32>,

    /// Later ranges win where two ranges claim the same episode
    #[serde(default)]
    pub season_ranges: Vec<SeasonRange>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl MappingOverride {
    pub fn new(source: SourceId) -> Self {
        Self {
            source,
            anilist_id: None,
            mal_id: None,
            anidb_id: None,
            year: None,
            custom_titles: Vec::new(),
            notes: None,
            season_episode_overrides: BTreeMap::new(),
            season_ranges: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_custom_titles<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.custom_titles = titles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_anilist_id(mut self, id: u64) -> Self {
        self.anilist_id = Some(id);
        self
    }

    pub fn with_episode_override(mut self, season: u32, episode: u32, absolute: u32) -> Self {
        self.season_episode_overrides
            .insert(episode_key(season, episode), absolute);
        self
    }

    pub fn with_season_range(mut self, range: SeasonRange) -> Self {
        self.season_ranges.push(range);
        self
    }

    /// True when no custom title carries text
    pub fn is_id_only(&self) -> bool {
        self.custom_titles.iter().all(|t| t.trim().is_empty())
    }

    pub fn episode_override(&self, season: u32, episode: u32) -> Option<u32> {
        self.season_episode_overrides
            .get(&episode_key(season, episode))
            .copied()
    }

    /// Absolute episode from the season ranges, newest range first
    pub fn range_absolute(&self, season: u32, episode: u32) -> Option<u32> {
        self.season_ranges
            .iter()
            .rev()
            .find_map(|range| range.absolute_for(season, episode))
    }

    /// Rewrites episode-override keys into canonical `S02E01` form.
    /// When two spellings name the same episode, the later key in map order wins.
    pub fn normalize_episode_keys(&mut self) -> DomainResult<()> {
        let mut normalized = BTreeMap::new();
        for (key, absolute) in &self.season_episode_overrides {
            let (season, episode) = parse_episode_key(key)?;
            normalized.insert(episode_key(season, episode), *absolute);
        }
        self.season_episode_overrides = normalized;
        Ok(())
    }
}

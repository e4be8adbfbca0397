use std::collections::BTreeMap;

/// A complete (season, episode) -> absolute table for one catalog id,
/// as returned by the crossmap service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeCrossmap {
    entries: BTreeMap<(u32, u32), u32>,
}

impl EpisodeCrossmap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, season: u32, episode: u32, absolute: u32) {
        self.entries.insert((season, episode), absolute);
    }

    pub fn absolute(&self, season: u32, episode: u32) -> Option<u32> {
        self.entries.get(&(season, episode)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<((u32, u32), u32)> for EpisodeCrossmap {
    fn from_iter<T: IntoIterator<Item = ((u32, u32), u32)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Per-season episode counts of a series, season 1 first.
/// Season 0 (specials) is never part of the absolute numbering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeasonStructure {
    counts: BTreeMap<u32, u32>,
}

impl SeasonStructure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_season(mut self, season: u32, episode_count: u32) -> Self {
        self.counts.insert(season, episode_count);
        self
    }

    pub fn episode_count(&self, season: u32) -> Option<u32> {
        self.counts.get(&season).copied()
    }

    /// Episodes aired before `season` starts; None if any earlier season is unknown
    pub fn episodes_before(&self, season: u32) -> Option<u32> {
        (1..season).try_fold(0u32, |acc, s| acc.checked_add(self.episode_count(s)?))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(u32, u32)> for SeasonStructure {
    fn from_iter<T: IntoIterator<Item = (u32, u32)>>(iter: T) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}

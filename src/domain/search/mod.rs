// src/domain/search/mod.rs
//
// Search Domain
//
// Coordinates, queries, episode tables and results exchanged between the
// translator, planner and aggregator.

pub mod episode_map;
pub mod value_objects;

pub use episode_map::{EpisodeCrossmap, SeasonStructure};
pub use value_objects::{
    IndexerCategory, Query, RankedResult, RawResult, SearchCoordinate, TranslationSource,
};

// src/integrations/mod.rs
//
// External Integrations Module
//
// Collaborator contracts plus the one implementation the crate ships:
// the offline title/id database. Network-backed collaborators are
// provided by the embedding application.

pub mod collaborators;
pub mod manami;

pub use collaborators::{
    CrossmapSource, IndexerBackend, MetadataApi, OfflineDatabase, OfflineRecord,
    SeriesMetadataSource,
};
pub use manami::ManamiOfflineDatabase;

#[cfg(test)]
pub use collaborators::{
    MockCrossmapSource, MockIndexerBackend, MockMetadataApi, MockOfflineDatabase,
    MockSeriesMetadataSource,
};

// src/repositories/override_repository.rs
//
// Override persistence
//
// The pipeline only calls `get`. `save`, `delete` and `list` back the
// management layer.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::{MappingOverride, SourceId};
use crate::error::AppResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OverrideRepository: Send + Sync {
    async fn get(&self, source: SourceId) -> AppResult<Option<MappingOverride>>;
    async fn save(&self, mapping: &MappingOverride) -> AppResult<()>;
    /// Returns true if an override existed
    async fn delete(&self, source: SourceId) -> AppResult<bool>;
    async fn list(&self) -> AppResult<Vec<MappingOverride>>;
}

/// Process-local override store
#[derive(Debug, Default)]
pub struct InMemoryOverrideRepository {
    overrides: RwLock<HashMap<SourceId, MappingOverride>>,
}

impl InMemoryOverrideRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store, e.g. from a JSON export
    pub fn with_overrides<I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = MappingOverride>,
    {
        let map = overrides.into_iter().map(|o| (o.source, o)).collect();
        Self {
            overrides: RwLock::new(map),
        }
    }
}

#[async_trait]
impl OverrideRepository for InMemoryOverrideRepository {
    async fn get(&self, source: SourceId) -> AppResult<Option<MappingOverride>> {
        let overrides = self.overrides.read().unwrap_or_else(|e| e.into_inner());
        Ok(overrides.get(&source).cloned())
    }

    async fn save(&self, mapping: &MappingOverride) -> AppResult<()> {
        let mut overrides = self.overrides.write().unwrap_or_else(|e| e.into_inner());
        overrides.insert(mapping.source, mapping.clone());
        Ok(())
    }

    async fn delete(&self, source: SourceId) -> AppResult<bool> {
        let mut overrides = self.overrides.write().unwrap_or_else(|e| e.into_inner());
        Ok(overrides.remove(&source).is_some())
    }

    async fn list(&self) -> AppResult<Vec<MappingOverride>> {
        let overrides = self.overrides.read().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<MappingOverride> = overrides.values().cloned().collect();
        all.sort_by_key(|o| (o.source.kind as u8, o.source.id));
        Ok(all)
    }
}

// src/services/override_service.rs
//
// Override Service - management operations on user overrides
//
// CRITICAL RULES:
// - Overrides are validated before they are stored
// - Episode-override keys are stored in canonical SxxEyy form
// - Every write drops the resolver's cached identity for that id

use chrono::Utc;
use std::sync::Arc;

use crate::domain::{validate_override, MappingOverride, SourceId};
use crate::error::AppResult;
use crate::repositories::OverrideRepository;
use crate::services::resolution_service::IdentifierResolver;

pub struct OverrideService {
    repo: Arc<dyn OverrideRepository>,
    resolver: Option<Arc<IdentifierResolver>>,
}

impl OverrideService {
    pub fn new(repo: Arc<dyn OverrideRepository>) -> Self {
        Self {
            repo,
            resolver: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<IdentifierResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub async fn get(&self, source: SourceId) -> AppResult<Option<MappingOverride>> {
        self.repo.get(source).await
    }

    pub async fn list(&self) -> AppResult<Vec<MappingOverride>> {
        self.repo.list().await
    }

    /// Creates or replaces the override for `mapping.source`
    pub async fn save(&self, mut mapping: MappingOverride) -> AppResult<MappingOverride> {
        mapping.normalize_episode_keys()?;
        validate_override(&mapping)?;
        mapping.updated_at = Utc::now();

        self.repo.save(&mapping).await?;
        self.invalidate(mapping.source);

        log::info!("Saved override for {}", mapping.source);
        Ok(mapping)
    }

    /// Returns true if an override was removed
    pub async fn delete(&self, source: SourceId) -> AppResult<bool> {
        let removed = self.repo.delete(source).await?;
        self.invalidate(source);
        if removed {
            log::info!("Deleted override for {}", source);
        }
        Ok(removed)
    }

    fn invalidate(&self, source: SourceId) {
        if let Some(resolver) = &self.resolver {
            resolver.invalidate(source);
        }
    }
}

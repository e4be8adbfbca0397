// src/services/resolution_service_tests.rs
//
// UNIT TESTS: Identifier Resolver
//
// PURPOSE:
// - Prove tier precedence: override -> offline database -> metadata API
// - Prove override titles are used verbatim and never cached
// - Prove collaborator failures skip a tier instead of failing resolution
//
// INVARIANTS TESTED:
// - Override present => titles equal the custom title list exactly
// - Non-override identities are cached until TTL or invalidation
// - Missing token before the deadline => rate_limited failure

#[cfg(test)]
mod cascade_tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    use crate::config::ResolverConfig;
    use crate::domain::{
        AnimeTitles, MappingOverride, ResolutionFailureReason, SourceId,
    };
    use crate::error::{AppError, Collaborator};
    use crate::infrastructure::{ManualClock, SystemClock, TokenBucket};
    use crate::integrations::{MockMetadataApi, MockOfflineDatabase, OfflineRecord};
    use crate::repositories::{InMemoryOverrideRepository, OverrideRepository};
    use crate::services::resolution_service::IdentifierResolver;

    const FRIEREN: u64 = 424536;

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(30)
    }

    fn frieren_record() -> OfflineRecord {
        OfflineRecord {
            titles: AnimeTitles::new()
                .with_romaji("Sousou no Frieren")
                .with_synonym("Frieren"),
            anilist_id: Some(154587),
            mal_id: Some(52991),
            anidb_id: None,
            total_episodes: Some(28),
            year: Some(2023),
        }
    }

    fn offline_with(record: Option<OfflineRecord>, times: usize) -> MockOfflineDatabase {
        let mut db = MockOfflineDatabase::new();
        db.expect_lookup()
            .times(times)
            .returning(move |_| Ok(record.clone()));
        db
    }

    fn resolver(
        overrides: Arc<InMemoryOverrideRepository>,
        db: MockOfflineDatabase,
        api: Option<MockMetadataApi>,
        config: ResolverConfig,
    ) -> IdentifierResolver {
        IdentifierResolver::new(
            overrides,
            Arc::new(db),
            api.map(|a| Arc::new(a) as Arc<dyn crate::integrations::MetadataApi>),
            Arc::new(TokenBucket::per_minute(90)),
            &config,
            Arc::new(SystemClock),
        )
    }

    #[tokio::test]
    async fn test_override_titles_used_verbatim() {
        let overrides = Arc::new(InMemoryOverrideRepository::with_overrides([
            MappingOverride::new(SourceId::tvdb(FRIEREN))
                .with_custom_titles(["Frieren", "Sousou no Frieren"]),
        ]));
        let resolver = resolver(overrides, offline_with(None, 0), None, ResolverConfig::default());

        let identity = resolver.resolve(SourceId::tvdb(FRIEREN), deadline()).await.unwrap();

        assert!(identity.is_user_override);
        assert_eq!(identity.search_titles(), vec!["Frieren", "Sousou no Frieren"]);
        assert_eq!(resolver.cached_count(), 0);
    }

    #[tokio::test]
    async fn test_override_edits_visible_immediately() {
        let source = SourceId::tvdb(FRIEREN);
        let overrides = Arc::new(InMemoryOverrideRepository::new());
        overrides
            .save(&MappingOverride::new(source).with_custom_titles(["First"]))
            .await
            .unwrap();
        let resolver = resolver(overrides.clone(), offline_with(None, 0), None, ResolverConfig::default());

        let first = resolver.resolve(source, deadline()).await.unwrap();
        assert_eq!(first.search_titles(), vec!["First"]);

        overrides
            .save(&MappingOverride::new(source).with_custom_titles(["Second"]))
            .await
            .unwrap();
        let second = resolver.resolve(source, deadline()).await.unwrap();
        assert_eq!(second.search_titles(), vec!["Second"]);
    }

    #[tokio::test]
    async fn test_offline_record_resolves_and_is_cached() {
        let overrides = Arc::new(InMemoryOverrideRepository::new());
        // Second call must be served from cache
        let resolver = resolver(
            overrides,
            offline_with(Some(frieren_record()), 1),
            None,
            ResolverConfig::default(),
        );

        let identity = resolver.resolve(SourceId::tvdb(FRIEREN), deadline()).await.unwrap();
        assert!(!identity.is_user_override);
        assert_eq!(identity.anilist_id, Some(154587));
        assert_eq!(identity.total_episodes, Some(28));
        assert_eq!(identity.search_titles()[0], "Sousou no Frieren");

        let again = resolver.resolve(SourceId::tvdb(FRIEREN), deadline()).await.unwrap();
        assert_eq!(again, identity);
        assert_eq!(resolver.cached_count(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_lookup() {
        let overrides = Arc::new(InMemoryOverrideRepository::new());
        let resolver = resolver(
            overrides,
            offline_with(Some(frieren_record()), 2),
            None,
            ResolverConfig::default(),
        );
        let source = SourceId::tvdb(FRIEREN);

        resolver.resolve(source, deadline()).await.unwrap();
        resolver.invalidate(source);
        resolver.resolve(source, deadline()).await.unwrap();
    }

    #[tokio::test]
    async fn test_cache_entry_expires_with_clock() {
        let clock = Arc::new(ManualClock::default());
        let mut db = MockOfflineDatabase::new();
        db.expect_lookup()
            .times(2)
            .returning(|_| Ok(Some(frieren_record())));
        let resolver = IdentifierResolver::new(
            Arc::new(InMemoryOverrideRepository::new()),
            Arc::new(db),
            None,
            Arc::new(TokenBucket::per_minute(90)),
            &ResolverConfig {
                cache_ttl_secs: 3600,
                ..ResolverConfig::default()
            },
            clock.clone(),
        );
        let source = SourceId::tvdb(FRIEREN);

        resolver.resolve(source, deadline()).await.unwrap();
        clock.advance(chrono::Duration::minutes(30));
        resolver.resolve(source, deadline()).await.unwrap();
        clock.advance(chrono::Duration::minutes(31));
        resolver.resolve(source, deadline()).await.unwrap();
    }

    #[tokio::test]
    async fn test_id_only_override_pins_ids_and_skips_cache() {
        let source = SourceId::tvdb(FRIEREN);
        let overrides = Arc::new(InMemoryOverrideRepository::with_overrides([
            MappingOverride::new(source).with_anilist_id(999),
        ]));
        let resolver = resolver(
            overrides,
            offline_with(Some(frieren_record()), 2),
            None,
            ResolverConfig::default(),
        );

        let identity = resolver.resolve(source, deadline()).await.unwrap();
        assert!(identity.is_user_override);
        assert_eq!(identity.anilist_id, Some(999));
        assert_eq!(identity.mal_id, Some(52991));
        assert_eq!(identity.search_titles(), vec!["Sousou no Frieren", "Frieren"]);

        resolver.resolve(source, deadline()).await.unwrap();
        assert_eq!(resolver.cached_count(), 0);
    }

    #[tokio::test]
    async fn test_not_found_when_no_tier_has_titles() {
        let resolver = resolver(
            Arc::new(InMemoryOverrideRepository::new()),
            offline_with(None, 1),
            None,
            ResolverConfig::default(),
        );

        let failure = resolver.resolve(SourceId::tvdb(1), deadline()).await.unwrap_err();
        assert_eq!(failure.reason, ResolutionFailureReason::NotFound);
        assert_eq!(failure.source_id, SourceId::tvdb(1));
    }

    #[tokio::test]
    async fn test_metadata_api_fills_titleless_record() {
        let record = OfflineRecord {
            titles: AnimeTitles::new(),
            ..frieren_record()
        };
        let mut api = MockMetadataApi::new();
        api.expect_fetch_by_anilist_id()
            .withf(|id| *id == 154587)
            .times(1)
            .returning(|_| {
                Ok(Some(
                    AnimeTitles::new()
                        .with_romaji("Sousou no Frieren")
                        .with_english("Frieren: Beyond Journey's End"),
                ))
            });

        let resolver = resolver(
            Arc::new(InMemoryOverrideRepository::new()),
            offline_with(Some(record), 1),
            Some(api),
            ResolverConfig::default(),
        );

        let identity = resolver.resolve(SourceId::tvdb(FRIEREN), deadline()).await.unwrap();
        assert_eq!(
            identity.search_titles(),
            vec!["Sousou no Frieren", "Frieren: Beyond Journey's End"]
        );
        assert_eq!(identity.total_episodes, Some(28));
    }

    #[tokio::test]
    async fn test_metadata_api_skipped_without_anilist_id() {
        let mut api = MockMetadataApi::new();
        api.expect_fetch_by_anilist_id().never();

        let resolver = resolver(
            Arc::new(InMemoryOverrideRepository::new()),
            offline_with(None, 1),
            Some(api),
            ResolverConfig::default(),
        );

        assert!(resolver.resolve(SourceId::tvdb(5), deadline()).await.is_err());
    }

    #[tokio::test]
    async fn test_offline_failure_is_skipped() {
        let source = SourceId::tvdb(FRIEREN);
        let overrides = Arc::new(InMemoryOverrideRepository::with_overrides([
            MappingOverride::new(source).with_anilist_id(154587),
        ]));
        let mut db = MockOfflineDatabase::new();
        db.expect_lookup()
            .returning(|_| Err(AppError::upstream(Collaborator::OfflineDatabase, "corrupt dump")));
        let mut api = MockMetadataApi::new();
        api.expect_fetch_by_anilist_id()
            .returning(|_| Ok(Some(AnimeTitles::new().with_romaji("Sousou no Frieren"))));

        let resolver = resolver(overrides, db, Some(api), ResolverConfig::default());

        let identity = resolver.resolve(source, deadline()).await.unwrap();
        assert_eq!(identity.search_titles(), vec!["Sousou no Frieren"]);
        assert!(identity.is_user_override);
    }

    #[tokio::test]
    async fn test_metadata_api_error_yields_not_found() {
        let record = OfflineRecord {
            titles: AnimeTitles::new(),
            ..frieren_record()
        };
        let mut api = MockMetadataApi::new();
        api.expect_fetch_by_anilist_id()
            .returning(|_| Err(AppError::upstream(Collaborator::MetadataApi, "502")));

        let resolver = resolver(
            Arc::new(InMemoryOverrideRepository::new()),
            offline_with(Some(record), 1),
            Some(api),
            ResolverConfig::default(),
        );

        let failure = resolver.resolve(SourceId::tvdb(FRIEREN), deadline()).await.unwrap_err();
        assert_eq!(failure.reason, ResolutionFailureReason::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_before_deadline() {
        let record = OfflineRecord {
            titles: AnimeTitles::new(),
            ..frieren_record()
        };
        let mut api = MockMetadataApi::new();
        api.expect_fetch_by_anilist_id().never();

        let bucket = Arc::new(TokenBucket::per_minute(1));
        bucket.acquire(Instant::now()).await.unwrap();

        let resolver = IdentifierResolver::new(
            Arc::new(InMemoryOverrideRepository::new()),
            Arc::new(offline_with(Some(record), 1)),
            Some(Arc::new(api)),
            bucket,
            &ResolverConfig::default(),
            Arc::new(SystemClock),
        );

        let failure = resolver
            .resolve(SourceId::tvdb(FRIEREN), Instant::now() + Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(failure.reason, ResolutionFailureReason::RateLimited);
    }

    #[tokio::test]
    async fn test_enrichment_merges_metadata_titles() {
        let mut api = MockMetadataApi::new();
        api.expect_fetch_by_anilist_id()
            .times(1)
            .returning(|_| {
                Ok(Some(
                    AnimeTitles::new()
                        .with_romaji("Sousou no Frieren")
                        .with_english("Frieren: Beyond Journey's End"),
                ))
            });

        let resolver = resolver(
            Arc::new(InMemoryOverrideRepository::new()),
            offline_with(Some(frieren_record()), 1),
            Some(api),
            ResolverConfig {
                enrich_with_metadata_api: true,
                ..ResolverConfig::default()
            },
        );

        let identity = resolver.resolve(SourceId::tvdb(FRIEREN), deadline()).await.unwrap();
        assert_eq!(
            identity.search_titles(),
            vec!["Sousou no Frieren", "Frieren: Beyond Journey's End", "Frieren"]
        );
    }

    #[tokio::test]
    async fn test_enrichment_failure_keeps_offline_titles() {
        let mut api = MockMetadataApi::new();
        api.expect_fetch_by_anilist_id()
            .returning(|_| Err(AppError::Timeout));

        let resolver = resolver(
            Arc::new(InMemoryOverrideRepository::new()),
            offline_with(Some(frieren_record()), 1),
            Some(api),
            ResolverConfig {
                enrich_with_metadata_api: true,
                ..ResolverConfig::default()
            },
        );

        let identity = resolver.resolve(SourceId::tvdb(FRIEREN), deadline()).await.unwrap();
        assert_eq!(identity.search_titles(), vec!["Sousou no Frieren", "Frieren"]);
    }
}

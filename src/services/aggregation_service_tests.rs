// src/services/aggregation_service_tests.rs
//
// UNIT TESTS: Aggregator
//
// INVARIANTS TESTED:
// - Same guid from two queries => first-seen representative kept
// - All queries failing => empty list
// - Output order independent of completion order
// - Deadline keeps completed results and abandons the rest

#[cfg(test)]
mod fan_out_tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    use crate::config::AggregatorConfig;
    use crate::domain::{
        AnimeIdentity, AnimeTitles, Query, RawResult, SearchCoordinate, SourceId,
        TranslationSource,
    };
    use crate::error::{AppError, Collaborator};
    use crate::integrations::MockIndexerBackend;
    use crate::services::aggregation_service::AggregationService;
    use crate::services::query_planner::QueryPlanner;

    fn queries(n: usize) -> Vec<Query> {
        let identity = AnimeIdentity::new(
            SourceId::tvdb(424536),
            AnimeTitles::new()
                .with_romaji("Sousou no Frieren")
                .with_english("Frieren: Beyond Journey's End")
                .with_synonym("Frieren"),
        );
        QueryPlanner::new().plan(
            &identity,
            SearchCoordinate::episode(5, TranslationSource::PassThrough),
            n,
        )
    }

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(45)
    }

    fn raw(guid: &str, title: &str, seeders: u32) -> RawResult {
        RawResult::new(guid, title, "nyaa").with_seeders(seeders)
    }

    #[tokio::test]
    async fn test_same_guid_keeps_first_seen() {
        let mut indexer = MockIndexerBackend::new();
        indexer.expect_search().returning(|query, _| {
            if query.starts_with("Sousou") {
                Ok(vec![raw("guid-1", "[A] Sousou no Frieren - 05", 10)])
            } else {
                Ok(vec![raw("guid-1", "[A] Sousou no Frieren - 05", 999)])
            }
        });
        let aggregator = AggregationService::new(Arc::new(indexer), AggregatorConfig::default());

        let ranked = aggregator.execute(&queries(2), deadline(), 100).await;

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].result.seeders, 10);
        assert_eq!(ranked[0].cluster_size, 2);
    }

    #[tokio::test]
    async fn test_all_failures_yield_empty_list() {
        let mut indexer = MockIndexerBackend::new();
        indexer
            .expect_search()
            .times(3)
            .returning(|_, _| Err(AppError::upstream(Collaborator::Indexer, "connection refused")));
        let aggregator = AggregationService::new(Arc::new(indexer), AggregatorConfig::default());

        assert!(aggregator.execute(&queries(3), deadline(), 100).await.is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_other_results() {
        let mut indexer = MockIndexerBackend::new();
        indexer.expect_search().returning(|query, _| {
            if query.starts_with("Frieren:") {
                Err(AppError::Timeout)
            } else {
                Ok(vec![raw(query, query, 1)])
            }
        });
        let aggregator = AggregationService::new(Arc::new(indexer), AggregatorConfig::default());

        let ranked = aggregator.execute(&queries(3), deadline(), 100).await;
        let guids: Vec<&str> = ranked.iter().map(|r| r.result.guid.as_str()).collect();
        assert_eq!(guids, vec!["Sousou no Frieren 05", "Frieren 05"]);
    }

    #[tokio::test]
    async fn test_empty_plan_never_calls_indexer() {
        let mut indexer = MockIndexerBackend::new();
        indexer.expect_search().never();
        let aggregator = AggregationService::new(Arc::new(indexer), AggregatorConfig::default());

        assert!(aggregator.execute(&[], deadline(), 100).await.is_empty());
    }

    #[tokio::test]
    async fn test_global_truncation() {
        let mut indexer = MockIndexerBackend::new();
        indexer.expect_search().returning(|query, _| {
            Ok((0..10)
                .map(|i| raw(&format!("{}-{}", query, i), &format!("{} v{}", query, i), i))
                .collect())
        });
        let config = AggregatorConfig {
            dedup_enabled: false,
            ..AggregatorConfig::default()
        };
        let aggregator = AggregationService::new(Arc::new(indexer), config);

        let ranked = aggregator.execute(&queries(3), deadline(), 4).await;
        assert_eq!(ranked.len(), 4);
        assert!(ranked.iter().all(|r| r.result.seeders >= 8));
    }

    #[tokio::test]
    async fn test_relevance_filter_when_enabled() {
        let mut indexer = MockIndexerBackend::new();
        indexer.expect_search().returning(|_, _| {
            Ok(vec![
                raw("keep", "[SubsPlease] Sousou no Frieren - 05 (1080p)", 5),
                raw("drop", "[SubsPlease] One Piece - 1100 (1080p)", 50),
            ])
        });
        let config = AggregatorConfig {
            relevance_filter: true,
            ..AggregatorConfig::default()
        };
        let aggregator = AggregationService::new(Arc::new(indexer), config);

        let ranked = aggregator.execute(&queries(1), deadline(), 100).await;
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].result.guid, "keep");
    }

    /// Indexer whose latency depends on the query, so completion order differs from query order
    struct SlowIndexer;

    #[async_trait::async_trait]
    impl crate::integrations::IndexerBackend for SlowIndexer {
        async fn search(
            &self,
            query: &str,
            _category: crate::domain::IndexerCategory,
        ) -> crate::error::AppResult<Vec<RawResult>> {
            let delay = if query.starts_with("Sousou") {
                Duration::from_secs(20)
            } else if query.starts_with("Frieren:") {
                Duration::from_secs(10)
            } else {
                Duration::from_secs(1)
            };
            tokio::time::sleep(delay).await;
            Ok(vec![raw(query, query, 7)])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_independent_of_completion() {
        let aggregator = AggregationService::new(Arc::new(SlowIndexer), AggregatorConfig::default());

        let ranked = aggregator.execute(&queries(3), deadline(), 100).await;
        let guids: Vec<&str> = ranked.iter().map(|r| r.result.guid.as_str()).collect();
        // Equal seeders: discovery order is query order
        assert_eq!(
            guids,
            vec![
                "Sousou no Frieren 05",
                "Frieren: Beyond Journey's End 05",
                "Frieren 05",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_keeps_completed_results() {
        let aggregator = AggregationService::new(Arc::new(SlowIndexer), AggregatorConfig::default());
        let start = Instant::now();

        let ranked = aggregator
            .execute(&queries(3), start + Duration::from_secs(15), 100)
            .await;
        let guids: Vec<&str> = ranked.iter().map(|r| r.result.guid.as_str()).collect();

        assert_eq!(guids, vec!["Frieren: Beyond Journey's End 05", "Frieren 05"]);
        assert!(Instant::now() - start <= Duration::from_secs(16));
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_query_timeout_skips_slow_query() {
        let config = AggregatorConfig {
            per_query_timeout_ms: 5_000,
            ..AggregatorConfig::default()
        };
        let aggregator = AggregationService::new(Arc::new(SlowIndexer), config);

        let ranked = aggregator.execute(&queries(3), deadline(), 100).await;
        let guids: Vec<&str> = ranked.iter().map(|r| r.result.guid.as_str()).collect();
        assert_eq!(guids, vec!["Frieren 05"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_bound_of_one_still_completes() {
        let config = AggregatorConfig {
            max_concurrent_queries: 1,
            ..AggregatorConfig::default()
        };
        let aggregator = AggregationService::new(Arc::new(SlowIndexer), config);
        let start = Instant::now();

        let ranked = aggregator.execute(&queries(3), deadline(), 100).await;
        assert_eq!(ranked.len(), 3);
        // Sequential: 20 + 10 + 1 seconds
        assert!(Instant::now() - start >= Duration::from_secs(31));
    }
}

// src/services/aggregation_service.rs
//
// Aggregator / Deduplicator
//
// Dispatches planned queries to the indexer backend, merges what comes
// back, removes duplicates and ranks the survivors.
//
// CRITICAL RULES:
// - Queries run concurrently, each under its own timeout
// - Results are merged in query order, never completion order
// - A failed or timed-out query is logged and skipped
// - At the request deadline, completed queries are used and the rest abandoned
// - All queries failing yields an empty list, not an error

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::time::Instant;

use crate::config::AggregatorConfig;
use crate::domain::{Query, RankedResult, RawResult};
use crate::integrations::IndexerBackend;
use crate::services::dedup::{rank, singletons, Deduplicator};
use crate::services::relevance::filter_relevant;

pub struct AggregationService {
    indexer: Arc<dyn IndexerBackend>,
    config: AggregatorConfig,
    deduplicator: Deduplicator,
}

impl AggregationService {
    pub fn new(indexer: Arc<dyn IndexerBackend>, config: AggregatorConfig) -> Self {
        Self {
            deduplicator: Deduplicator::new(config.similarity_metric, config.similarity_threshold),
            indexer,
            config,
        }
    }

    /// Runs every query and returns at most `max_results` ranked results
    pub async fn execute(
        &self,
        queries: &[Query],
        deadline: Instant,
        max_results: usize,
    ) -> Vec<RankedResult> {
        if queries.is_empty() || max_results == 0 {
            return Vec::new();
        }

        let merged = self.dispatch(queries, deadline).await;
        let merged = if self.config.relevance_filter {
            let titles: Vec<&str> = queries.iter().map(|q| q.source_title.as_str()).collect();
            filter_relevant(merged, &titles)
        } else {
            merged
        };

        let raw_count = merged.len();
        let clusters = if self.config.dedup_enabled {
            self.deduplicator.deduplicate(merged)
        } else {
            singletons(merged)
        };
        let ranked = rank(clusters, max_results);

        log::info!(
            "Aggregated {} queries: {} raw results -> {} returned",
            queries.len(),
            raw_count,
            ranked.len()
        );
        ranked
    }

    /// Fans the queries out and returns the successful result lists concatenated in query order
    async fn dispatch(&self, queries: &[Query], deadline: Instant) -> Vec<RawResult> {
        let per_query = self.config.per_query_timeout();
        let concurrency = self.config.max_concurrent_queries.clamp(1, queries.len());
        let mut slots: Vec<Option<Vec<RawResult>>> = vec![None; queries.len()];

        let mut in_flight = stream::iter(queries.iter().enumerate().map(|(index, query)| {
            let indexer = self.indexer.clone();
            async move {
                let outcome =
                    tokio::time::timeout(per_query, indexer.search(&query.text, query.category))
                        .await;
                (index, outcome)
            }
        }))
        .buffer_unordered(concurrency);

        let fan_in = async {
            while let Some((index, outcome)) = in_flight.next().await {
                let query = &queries[index];
                match outcome {
                    Ok(Ok(results)) => {
                        log::debug!("Query '{}' returned {} results", query.text, results.len());
                        slots[index] = Some(results);
                    }
                    Ok(Err(e)) => log::warn!("Query '{}' failed: {}", query.text, e),
                    Err(_) => log::warn!("Query '{}' timed out after {:?}", query.text, per_query),
                }
            }
        };

        if tokio::time::timeout_at(deadline, fan_in).await.is_err() {
            let completed = slots.iter().filter(|s| s.is_some()).count();
            log::warn!(
                "Request deadline reached with {} of {} queries completed",
                completed,
                queries.len()
            );
        }

        slots.into_iter().flatten().flatten().collect()
    }
}

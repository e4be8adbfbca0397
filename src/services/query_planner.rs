// src/services/query_planner.rs
//
// Query Planner
//
// Expands an identity and a coordinate into indexer query strings.
//
// CRITICAL RULES:
// - Title order: romaji, english, native, synonyms
// - Truncation keeps title priority
// - Deterministic: same input -> same plan

use crate::domain::{AnimeIdentity, Query, SearchCoordinate};

/// Appended to every title on the movie path
pub const MOVIE_MARKER: &str = "movie";

/// Japanese theatrical-release tag common in movie release names
pub const THEATRICAL_MARKER: &str = "gekijouban";

#[derive(Debug, Clone, Copy, Default)]
pub struct QueryPlanner;

impl QueryPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Plans at most `max_queries` queries for one coordinate
    pub fn plan(
        &self,
        identity: &AnimeIdentity,
        coordinate: SearchCoordinate,
        max_queries: usize,
    ) -> Vec<Query> {
        let mut seen: Vec<String> = Vec::new();
        let mut plan = Vec::new();

        'titles: for title in identity.search_titles() {
            for text in query_texts(title, &coordinate) {
                if plan.len() >= max_queries {
                    break 'titles;
                }
                let folded = text.to_lowercase();
                if seen.contains(&folded) {
                    continue;
                }
                seen.push(folded);
                plan.push(Query::new(text, title, coordinate));
            }
        }

        log::debug!(
            "Planned {} queries for {} (cap {})",
            plan.len(),
            identity.source,
            max_queries
        );
        plan
    }
}

fn query_texts(title: &str, coordinate: &SearchCoordinate) -> Vec<String> {
    match coordinate {
        SearchCoordinate::Episode { absolute, .. } => vec![format!("{} {:02}", title, absolute)],
        SearchCoordinate::Special { number, .. } => vec![
            format!("{} OVA {:02}", title, number),
            format!("{} Special {:02}", title, number),
        ],
        SearchCoordinate::Series => vec![title.to_string()],
        SearchCoordinate::Movie { year } => {
            let mut texts = vec![format!("{} {}", title, MOVIE_MARKER)];
            if let Some(year) = year {
                texts.push(format!("{} {}", title, year));
            }
            texts.push(format!("{} {}", title, THEATRICAL_MARKER));
            texts
        }
    }
}

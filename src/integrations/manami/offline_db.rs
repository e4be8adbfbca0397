// src/integrations/manami/offline_db.rs
//
// Offline title/id database backed by the anime-offline-database JSON dump.
//
// The dump lists one entry per anime with the catalog pages it appears on
// (`sources`). Catalog ids are parsed out of those URLs and indexed.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::domain::{AnimeTitles, SourceId, SourceKind};
use crate::error::AppResult;
use crate::integrations::collaborators::{OfflineDatabase, OfflineRecord};

static SOURCE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<site>thetvdb\.com/series|themoviedb\.org/movie|anilist\.co/anime|myanimelist\.net/anime|anidb\.net/anime)/(?P<id>\d+)",
    )
    .expect("source url regex should compile")
});

static ANIDB_LEGACY_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"anidb\.net/perl-bin/animedb\.pl\?(?:[^#]*&)?aid=(?P<id>\d+)")
        .expect("anidb legacy url regex should compile")
});

// ============================================================================
// DOCUMENT FORMAT
// ============================================================================

#[derive(Debug, Deserialize)]
struct ManamiDocument {
    #[serde(default)]
    data: Vec<ManamiEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManamiEntry {
    #[serde(default)]
    sources: Vec<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    episodes: Option<u32>,
    #[serde(default)]
    anime_season: Option<ManamiSeason>,
    #[serde(default)]
    synonyms: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ManamiSeason {
    #[serde(default)]
    year: Option<i32>,
}

/// Ids found in an entry's source URLs
#[derive(Debug, Default, PartialEq)]
struct EntryIds {
    tvdb: Vec<u64>,
    tmdb: Vec<u64>,
    anilist: Option<u64>,
    mal: Option<u64>,
    anidb: Option<u64>,
}

fn parse_sources(sources: &[String]) -> EntryIds {
    let mut ids = EntryIds::default();
    for source in sources {
        if let Some(caps) = ANIDB_LEGACY_URL.captures(source) {
            ids.anidb = caps["id"].parse().ok();
            continue;
        }
        let Some(caps) = SOURCE_URL.captures(source) else {
            continue;
        };
        let Ok(id) = caps["id"].parse::<u64>() else {
            continue;
        };
        match &caps["site"] {
            "thetvdb.com/series" => ids.tvdb.push(id),
            "themoviedb.org/movie" => ids.tmdb.push(id),
            "anilist.co/anime" => ids.anilist = Some(id),
            "myanimelist.net/anime" => ids.mal = Some(id),
            "anidb.net/anime" => ids.anidb = Some(id),
            _ => {}
        }
    }
    ids
}

/// True when most letters are Latin script, so the title is usable on
/// western indexers. Strings without letters count as Latin.
pub fn is_latin_script(text: &str) -> bool {
    let (latin, other) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(latin, other), c| {
            let code = c as u32;
            let is_latin = (0x0041..=0x007A).contains(&code)
                || (0x00C0..=0x024F).contains(&code)
                || (0x1E00..=0x1EFF).contains(&code);
            if is_latin {
                (latin + 1, other)
            } else {
                (latin, other + 1)
            }
        });
    latin + other == 0 || latin > other
}

fn entry_titles(entry: &ManamiEntry) -> AnimeTitles {
    let mut titles = AnimeTitles::new().with_romaji(&entry.title);
    let (latin, other): (Vec<&String>, Vec<&String>) =
        entry.synonyms.iter().partition(|s| is_latin_script(s));
    for synonym in latin.into_iter().chain(other) {
        titles.add_synonym(synonym);
    }
    titles
}

// ============================================================================
// DATABASE
// ============================================================================

#[derive(Debug, Default)]
pub struct ManamiOfflineDatabase {
    records: Vec<OfflineRecord>,
    index: HashMap<SourceId, usize>,
}

impl ManamiOfflineDatabase {
    pub fn from_json_str(json: &str) -> AppResult<Self> {
        let document: ManamiDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(document))
    }

    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let db = Self::from_json_str(&json)?;
        log::info!(
            "Loaded offline database from {}: {} entries, {} catalog ids",
            path.display(),
            db.records.len(),
            db.index.len()
        );
        Ok(db)
    }

    fn from_document(document: ManamiDocument) -> Self {
        let mut db = Self::default();

        for entry in document.data {
            let ids = parse_sources(&entry.sources);
            if ids.tvdb.is_empty() && ids.tmdb.is_empty() {
                continue;
            }

            let position = db.records.len();
            db.records.push(OfflineRecord {
                titles: entry_titles(&entry),
                anilist_id: ids.anilist,
                mal_id: ids.mal,
                anidb_id: ids.anidb,
                total_episodes: entry.episodes.filter(|n| *n > 0),
                year: entry.anime_season.and_then(|s| s.year),
            });

            // Several entries (seasons, movies) can share a catalog id; the later entry wins
            for id in ids.tvdb {
                db.index.insert(SourceId::new(SourceKind::Tvdb, id), position);
            }
            for id in ids.tmdb {
                db.index.insert(SourceId::new(SourceKind::Tmdb, id), position);
            }
        }

        db
    }

    pub fn get(&self, source: SourceId) -> Option<&OfflineRecord> {
        self.index.get(&source).and_then(|i| self.records.get(*i))
    }

    /// Number of indexed catalog ids
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[async_trait]
impl OfflineDatabase for ManamiOfflineDatabase {
    async fn lookup(&self, source: SourceId) -> AppResult<Option<OfflineRecord>> {
        Ok(self.get(source).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DUMP: &str = r#"{
        "data": [
            {
                "sources": [
                    "https://anidb.net/anime/17617",
                    "https://anilist.co/anime/154587",
                    "https://myanimelist.net/anime/52991",
                    "https://thetvdb.com/series/424536"
                ],
                "title": "Sousou no Frieren",
                "type": "TV",
                "episodes": 28,
                "animeSeason": { "season": "FALL", "year": 2023 },
                "synonyms": ["葬送のフリーレン", "Frieren: Beyond Journey's End", "Frieren"]
            },
            {
                "sources": [
                    "https://anidb.net/perl-bin/animedb.pl?show=anime&aid=12345",
                    "https://www.themoviedb.org/movie/372058"
                ],
                "title": "Kimi no Na wa.",
                "episodes": 1,
                "animeSeason": { "year": 2016 },
                "synonyms": []
            },
            {
                "sources": ["https://anilist.co/anime/1"],
                "title": "No Catalog Id"
            }
        ]
    }"#;

    #[test]
    fn test_parses_ids_and_titles() {
        let db = ManamiOfflineDatabase::from_json_str(DUMP).unwrap();
        assert_eq!(db.len(), 2);

        let record = db.get(SourceId::tvdb(424536)).unwrap();
        assert_eq!(record.anilist_id, Some(154587));
        assert_eq!(record.mal_id, Some(52991));
        assert_eq!(record.anidb_id, Some(17617));
        assert_eq!(record.total_episodes, Some(28));
        assert_eq!(record.year, Some(2023));
        assert_eq!(
            record.titles.ordered(),
            vec![
                "Sousou no Frieren",
                "Frieren: Beyond Journey's End",
                "Frieren",
                "葬送のフリーレン",
            ]
        );
    }

    #[test]
    fn test_legacy_anidb_url_and_movie_id() {
        let db = ManamiOfflineDatabase::from_json_str(DUMP).unwrap();
        let record = db.get(SourceId::tmdb(372058)).unwrap();
        assert_eq!(record.anidb_id, Some(12345));
        assert_eq!(record.year, Some(2016));
        assert!(db.get(SourceId::tvdb(372058)).is_none());
    }

    #[test]
    fn test_latin_script_detection() {
        assert!(is_latin_script("Frieren"));
        assert!(is_latin_script("Pokémon"));
        assert!(is_latin_script("86"));
        assert!(!is_latin_script("葬送のフリーレン"));
        assert!(!is_latin_script("Провожающая"));
    }

    #[tokio::test]
    async fn test_loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DUMP.as_bytes()).unwrap();

        let db = ManamiOfflineDatabase::from_file(file.path()).unwrap();
        let record = db.lookup(SourceId::tvdb(424536)).await.unwrap();
        assert!(record.is_some());
        assert!(db.lookup(SourceId::tvdb(1)).await.unwrap().is_none());
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        assert!(ManamiOfflineDatabase::from_json_str("{ not json").is_err());
    }
}

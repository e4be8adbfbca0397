use serde::{Deserialize, Serialize};

/// Which foreign catalog an identifier belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Television database (series)
    Tvdb,
    /// Movie database (films)
    Tmdb,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Tvdb => write!(f, "tvdb"),
            SourceKind::Tmdb => write!(f, "tmdb"),
        }
    }
}

/// A foreign catalog identifier together with its catalog.
/// Rendered as `tvdb:388593`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId {
    pub kind: SourceKind,
    pub id: u64,
}

impl SourceId {
    pub fn new(kind: SourceKind, id: u64) -> Self {
        Self { kind, id }
    }

    pub fn tvdb(id: u64) -> Self {
        Self::new(SourceKind::Tvdb, id)
    }

    pub fn tmdb(id: u64) -> Self {
        Self::new(SourceKind::Tmdb, id)
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Title variants of one anime.
///
/// Behaves as a set: blank titles are never stored and a title already
/// present in any field is not added again as a synonym. Synonyms keep
/// first-insert order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeTitles {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

fn clean(title: &str) -> Option<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl AnimeTitles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a title set from a user-authored list; every entry becomes a synonym
    /// so the list order is the query order.
    pub fn from_custom_titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for title in titles {
            set.add_synonym(title.as_ref());
        }
        set
    }

    pub fn with_romaji(mut self, title: impl AsRef<str>) -> Self {
        self.romaji = clean(title.as_ref());
        self
    }

    pub fn with_english(mut self, title: impl AsRef<str>) -> Self {
        self.english = clean(title.as_ref());
        self
    }

    pub fn with_native(mut self, title: impl AsRef<str>) -> Self {
        self.native = clean(title.as_ref());
        self
    }

    pub fn with_synonym(mut self, title: impl AsRef<str>) -> Self {
        self.add_synonym(title.as_ref());
        self
    }

    /// Adds a synonym unless it is blank or already present. Returns true if added.
    pub fn add_synonym(&mut self, title: &str) -> bool {
        match clean(title) {
            Some(title) if !self.contains(&title) => {
                self.synonyms.push(title);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, title: &str) -> bool {
        self.romaji.as_deref() == Some(title)
            || self.english.as_deref() == Some(title)
            || self.native.as_deref() == Some(title)
            || self.synonyms.iter().any(|s| s == title)
    }

    /// Merge another title set into this one.
    ///
    /// Empty variant slots are filled from `other`; a variant that would
    /// displace an existing one is kept as a synonym instead, so no title is lost.
    pub fn merge(&mut self, other: AnimeTitles) {
        let AnimeTitles {
            romaji,
            english,
            native,
            synonyms,
        } = other;

        for (slot, incoming) in [
            (&mut self.romaji, romaji),
            (&mut self.english, english),
            (&mut self.native, native),
        ] {
            if let Some(incoming) = incoming.as_deref().and_then(clean) {
                if slot.is_none() {
                    *slot = Some(incoming);
                } else if slot.as_deref() != Some(incoming.as_str()) {
                    self.synonyms.push(incoming);
                }
            }
        }
        // Synonyms keep a stable order: existing ones, displaced variants, then incoming ones.
        // The loop above may have pushed duplicates; rebuild synonyms through add_synonym.
        let pending: Vec<String> = std::mem::take(&mut self.synonyms)
            .into_iter()
            .chain(synonyms)
            .collect();
        for synonym in pending {
            self.add_synonym(&synonym);
        }
    }

    /// All distinct titles, romaji first, then english, native and synonyms.
    pub fn ordered(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        let variants = [
            self.romaji.as_deref(),
            self.english.as_deref(),
            self.native.as_deref(),
        ];
        for title in variants
            .into_iter()
            .flatten()
            .chain(self.synonyms.iter().map(String::as_str))
        {
            if !title.trim().is_empty() && !out.contains(&title) {
                out.push(title);
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.ordered().is_empty()
    }

    pub fn len(&self) -> usize {
        self.ordered().len()
    }
}

/// The resolved bundle of alternate ids and title variants for one anime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeIdentity {
    /// Catalog id the identity was resolved from
    pub source: SourceId,

    pub anilist_id: Option<u64>,
    pub mal_id: Option<u64>,
    pub anidb_id: Option<u64>,

    pub titles: AnimeTitles,

    /// Total episode count, if known (zero is stored as unknown)
    pub total_episodes: Option<u32>,

    /// Release or first-air year, if known
    pub year: Option<i32>,

    /// True when the identity was built from a user override
    pub is_user_override: bool,
}

impl AnimeIdentity {
    pub fn new(source: SourceId, titles: AnimeTitles) -> Self {
        Self {
            source,
            anilist_id: None,
            mal_id: None,
            anidb_id: None,
            titles,
            total_episodes: None,
            year: None,
            is_user_override: false,
        }
    }

    pub fn with_total_episodes(mut self, total: Option<u32>) -> Self {
        self.total_episodes = total.filter(|n| *n > 0);
        self
    }

    pub fn with_year(mut self, year: Option<i32>) -> Self {
        self.year = year;
        self
    }

    /// Titles in query priority order
    pub fn search_titles(&self) -> Vec<&str> {
        self.titles.ordered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_display() {
        assert_eq!(SourceId::tvdb(388593).to_string(), "tvdb:388593");
        assert_eq!(SourceId::tmdb(129).to_string(), "tmdb:129");
    }

    #[test]
    fn test_ordered_romaji_first_and_deduplicated() {
        let titles = AnimeTitles::new()
            .with_synonym("Frieren")
            .with_english("Frieren: Beyond Journey's End")
            .with_romaji("Sousou no Frieren")
            .with_native("葬送のフリーレン");

        assert_eq!(
            titles.ordered(),
            vec![
                "Sousou no Frieren",
                "Frieren: Beyond Journey's End",
                "葬送のフリーレン",
                "Frieren",
            ]
        );
    }

    #[test]
    fn test_duplicates_collapse() {
        let mut titles = AnimeTitles::new().with_romaji("Bocchi the Rock!");
        assert!(!titles.add_synonym("Bocchi the Rock!"));
        assert!(!titles.add_synonym("   "));
        assert!(titles.add_synonym("BTR"));
        assert!(!titles.add_synonym(" BTR "));
        assert_eq!(titles.len(), 2);
    }

    #[test]
    fn test_english_equal_to_romaji_surfaces_once() {
        let titles = AnimeTitles::new().with_romaji("Monster").with_english("Monster");
        assert_eq!(titles.ordered(), vec!["Monster"]);
    }

    #[test]
    fn test_custom_titles_keep_list_order() {
        let titles = AnimeTitles::from_custom_titles(["Oshi no Ko", "", "[Oshi no Ko]", "Oshi no Ko"]);
        assert_eq!(titles.ordered(), vec!["Oshi no Ko", "[Oshi no Ko]"]);
        assert!(titles.romaji.is_none());
    }

    #[test]
    fn test_merge_fills_slots_and_keeps_displaced_variants() {
        let mut base = AnimeTitles::new()
            .with_romaji("Kusuriya no Hitorigoto")
            .with_synonym("Apothecary Diaries");
        let other = AnimeTitles::new()
            .with_romaji("Kusuriya no Hitorigoto 2")
            .with_english("The Apothecary Diaries")
            .with_synonym("Apothecary Diaries");

        base.merge(other);

        assert_eq!(base.romaji.as_deref(), Some("Kusuriya no Hitorigoto"));
        assert_eq!(base.english.as_deref(), Some("The Apothecary Diaries"));
        assert_eq!(
            base.synonyms,
            vec!["Apothecary Diaries".to_string(), "Kusuriya no Hitorigoto 2".to_string()]
        );
    }

    #[test]
    fn test_zero_total_episodes_is_unknown() {
        let identity = AnimeIdentity::new(SourceId::tvdb(1), AnimeTitles::new().with_romaji("A"))
            .with_total_episodes(Some(0));
        assert_eq!(identity.total_episodes, None);
    }
}

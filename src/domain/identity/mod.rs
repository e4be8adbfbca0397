pub mod entity;
pub mod invariants;

pub use entity::{AnimeIdentity, AnimeTitles, SourceId, SourceKind};
pub use invariants::validate_identity;

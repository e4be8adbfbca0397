pub mod entity;
pub mod invariants;

pub use entity::{episode_key, parse_episode_key, MappingOverride, SeasonRange};
pub use invariants::validate_override;

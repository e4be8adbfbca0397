use super::entity::{parse_episode_key, MappingOverride, SeasonRange};
use crate::domain::{DomainError, DomainResult};

/// Validates all MappingOverride invariants
/// Checked by the management layer before an override is stored
pub fn validate_override(o: &MappingOverride) -> DomainResult<()> {
    for range in &o.season_ranges {
        validate_season_range(range)?;
    }
    validate_episode_overrides(o)?;
    Ok(())
}

fn validate_season_range(range: &SeasonRange) -> DomainResult<()> {
    if range.episode_count == 0 {
        return Err(DomainError::InvariantViolation(format!(
            "Season {} range must cover at least one episode",
            range.season
        )));
    }
    if range.start_absolute == 0 {
        return Err(DomainError::InvariantViolation(format!(
            "Season {} range must start at absolute episode 1 or later",
            range.season
        )));
    }
    Ok(())
}

fn validate_episode_overrides(o: &MappingOverride) -> DomainResult<()> {
    for (key, absolute) in &o.season_episode_overrides {
        parse_episode_key(key)?;
        if *absolute == 0 {
            return Err(DomainError::InvariantViolation(format!(
                "Episode override {} must map to absolute episode 1 or later",
                key
            )));
        }
    }
    Ok(())
}

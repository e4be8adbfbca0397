use super::entity::AnimeIdentity;
use crate::domain::{DomainError, DomainResult};

/// Validates all AnimeIdentity invariants
pub fn validate_identity(identity: &AnimeIdentity) -> DomainResult<()> {
    validate_titles(identity)?;
    validate_total_episodes(identity.total_episodes)?;
    Ok(())
}

/// An identity without a usable title cannot be searched for
fn validate_titles(identity: &AnimeIdentity) -> DomainResult<()> {
    if identity.titles.is_empty() {
        return Err(DomainError::InvariantViolation(format!(
            "Identity {} has no non-empty title",
            identity.source
        )));
    }
    Ok(())
}

fn validate_total_episodes(total: Option<u32>) -> DomainResult<()> {
    if total == Some(0) {
        return Err(DomainError::InvariantViolation(
            "Total episodes must be positive when known".to_string(),
        ));
    }
    Ok(())
}

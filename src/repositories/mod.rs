// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO invariant enforcement (OverrideService validates before saving)
// - NO cross-repository calls

pub mod override_repository;

pub use override_repository::{InMemoryOverrideRepository, OverrideRepository};

#[cfg(test)]
pub use override_repository::MockOverrideRepository;

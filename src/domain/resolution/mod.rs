// src/domain/resolution/mod.rs
//
// Resolution Domain
//
// Typed outcomes of identifier resolution and episode translation.
//
// CRITICAL RULES:
// - All types are pure value objects (immutable)
// - No side effects
// - No persistence
// - Only resolution-level failures and invalid episodes are surfaced;
//   everything else is absorbed by the pipeline

pub mod value_objects;

pub use value_objects::{
    ResolutionFailure, ResolutionFailureReason, SearchFailure, TranslationFailure,
    TranslationFailureReason,
};

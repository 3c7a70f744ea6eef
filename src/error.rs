//! Error types.
//!
//! `TraitError` covers the recoverable "can't do that right now" outcomes
//! of trait commands. `LoadError` covers malformed content or config, which
//! aborts startup.

use crate::id::TraitId;
use thiserror::Error;

/// Format a cycle path as a readable string.
fn format_cycle_path(path: &[TraitId]) -> String {
    if path.is_empty() {
        return String::from("(empty cycle)");
    }
    path.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors returned by trait and slot commands.
///
/// Every variant is recoverable: the caller shows a message and lets the
/// player retry.
///
/// # Examples
///
/// ```rust
/// use trait_engine::{TraitError, TraitId};
///
/// let err = TraitError::NotAcquired(TraitId::new("iron_skin"));
/// assert_eq!(err.to_string(), "Trait not acquired: iron_skin");
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TraitError {
    /// No definition exists for the referenced trait id.
    ///
    /// Content may load after player state, so callers should treat this as
    /// "temporarily unknown" rather than fatal.
    #[error("Unknown trait: {0}")]
    NotFound(TraitId),

    /// The player does not own the trait.
    #[error("Trait not acquired: {0}")]
    NotAcquired(TraitId),

    /// The trait already occupies a slot.
    #[error("Trait {trait_id} is already equipped in slot {slot}")]
    AlreadyEquipped { trait_id: TraitId, slot: usize },

    /// Permanent traits are always active and cannot occupy a slot.
    #[error("Trait {0} is permanent and cannot be equipped")]
    AlreadyPermanent(TraitId),

    /// Every unlocked slot is occupied.
    #[error("No unlocked empty slot available")]
    NoAvailableSlot,

    /// The essence balance does not cover the cost.
    #[error("Insufficient essence: requires {required}, have {available}")]
    InsufficientEssence { required: u64, available: u64 },

    /// The slot index is out of range, or the slot is locked.
    #[error("Invalid slot index: {0}")]
    InvalidSlot(usize),

    /// An acquisition requirement is not satisfied.
    #[error("Requirement not met for {trait_id}: {requirement}")]
    RequirementNotMet {
        trait_id: TraitId,
        requirement: String,
    },
}

/// Errors raised while loading trait content or engine configuration.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The input is not valid JSON for the expected shape.
    #[error("Failed to parse content: {0}")]
    Parse(#[from] serde_json::Error),

    /// A trait lists a prerequisite that has no definition.
    #[error("Trait {trait_id} requires unknown prerequisite {prerequisite}")]
    UnknownPrerequisite {
        trait_id: TraitId,
        prerequisite: TraitId,
    },

    /// Prerequisites form a cycle, so none of them could ever be acquired.
    ///
    /// Contains the path of traits involved, closed on the first element.
    #[error("Prerequisite cycle detected: {}", format_cycle_path(.path))]
    PrerequisiteCycle { path: Vec<TraitId> },

    /// A configuration value is out of its valid range.
    #[error("Invalid config value for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TraitError::InsufficientEssence {
            required: 50,
            available: 10,
        };
        assert_eq!(err.to_string(), "Insufficient essence: requires 50, have 10");
    }

    #[test]
    fn test_cycle_error_display() {
        let a = TraitId::new("A");
        let b = TraitId::new("B");
        let err = LoadError::PrerequisiteCycle {
            path: vec![a.clone(), b, a],
        };
        let display = err.to_string();
        assert!(display.contains("Prerequisite cycle detected"));
        assert!(display.contains("A -> B -> A"));
    }

    #[test]
    fn test_empty_cycle_display() {
        let err = LoadError::PrerequisiteCycle { path: Vec::new() };
        assert!(err.to_string().contains("(empty cycle)"));
    }
}

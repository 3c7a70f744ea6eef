//! Progress context for requirement checks.
//!
//! `ProgressContext` is a read-only snapshot of the parts of player state
//! this crate consults but does not own: level, cumulative essence earned,
//! and NPC relationship values. The owning game layer builds one before
//! issuing commands; the core never mutates it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Snapshot of player progress used for unlock and acquisition gating.
///
/// # Examples
///
/// ```rust
/// use trait_engine::ProgressContext;
///
/// let progress = ProgressContext::new()
///     .with_level(7)
///     .with_relationship("mira", 30);
///
/// assert_eq!(progress.level, 7);
/// assert_eq!(progress.relationship("mira"), 30);
/// assert_eq!(progress.relationship("stranger"), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressContext {
    /// Current character level.
    #[serde(default)]
    pub level: u32,

    /// Essence earned over the whole playthrough (not the spendable balance).
    #[serde(default)]
    pub total_essence_earned: u64,

    /// Relationship value per NPC id.
    #[serde(default)]
    relationships: HashMap<String, i32>,
}

impl ProgressContext {
    /// Create a level-0 context with no relationships.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_total_essence_earned(mut self, total: u64) -> Self {
        self.total_essence_earned = total;
        self
    }

    pub fn with_relationship(mut self, npc_id: impl Into<String>, value: i32) -> Self {
        self.set_relationship(npc_id, value);
        self
    }

    pub fn set_relationship(&mut self, npc_id: impl Into<String>, value: i32) {
        self.relationships.insert(npc_id.into(), value);
    }

    /// Relationship with an NPC; unknown NPCs read as 0 (neutral).
    pub fn relationship(&self, npc_id: &str) -> i32 {
        self.relationships.get(npc_id).copied().unwrap_or(0)
    }
}

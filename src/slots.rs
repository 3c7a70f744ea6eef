//! Trait slots.
//!
//! A slot moves through `Locked → Unlocked → (Empty ⇄ Occupied)`. Unlocking
//! is one-directional. This module holds the slot type itself and the
//! layout a new slot set is built from; the invariants that span slots
//! (uniqueness of occupants, permanence) live in [`crate::manager`].

use crate::context::ProgressContext;
use crate::id::TraitId;
use serde::{Deserialize, Serialize};

/// What it takes to unlock a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "threshold", rename_all = "camelCase")]
pub enum UnlockRequirement {
    /// Unlocked from the start.
    Starter,
    /// Unlocked once the character reaches this level.
    Level(u32),
    /// Unlocked once this much essence has been earned in total.
    EssenceEarned(u64),
}

impl UnlockRequirement {
    /// Whether the progress snapshot satisfies this requirement.
    pub fn is_met(&self, progress: &ProgressContext) -> bool {
        match *self {
            UnlockRequirement::Starter => true,
            UnlockRequirement::Level(level) => progress.level >= level,
            UnlockRequirement::EssenceEarned(total) => progress.total_essence_earned >= total,
        }
    }
}

/// One equip slot.
///
/// Invariant: a locked slot never has an occupant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitSlot {
    pub id: String,
    /// Position in the slot list; lower indices win auto-assignment.
    pub index: usize,
    pub is_unlocked: bool,
    pub unlock_requirement: UnlockRequirement,
    pub occupant: Option<TraitId>,
}

impl TraitSlot {
    /// A new, empty slot. Starter slots begin unlocked.
    pub fn new(index: usize, unlock_requirement: UnlockRequirement) -> Self {
        Self {
            id: slot_id(index),
            index,
            is_unlocked: unlock_requirement == UnlockRequirement::Starter,
            unlock_requirement,
            occupant: None,
        }
    }

    /// Whether no trait occupies the slot, locked or not.
    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }

    /// Unlocked and empty, i.e. a valid equip target.
    pub fn is_available(&self) -> bool {
        self.is_unlocked && self.occupant.is_none()
    }

    /// Whether `trait_id` is the occupant.
    pub fn holds(&self, trait_id: &TraitId) -> bool {
        self.occupant.as_ref() == Some(trait_id)
    }

    /// Move the slot to list position `index`, rewriting its id to match.
    /// Returns `true` if anything changed.
    pub(crate) fn renumber(&mut self, index: usize) -> bool {
        let id = slot_id(index);
        if self.index == index && self.id == id {
            return false;
        }
        self.index = index;
        self.id = id;
        true
    }
}

fn slot_id(index: usize) -> String {
    format!("slot-{}", index)
}

/// The ordered unlock requirements a slot set is created from.
///
/// # Examples
///
/// ```rust
/// use trait_engine::slots::{SlotLayout, UnlockRequirement};
///
/// let layout = SlotLayout::new(vec![UnlockRequirement::Starter, UnlockRequirement::Level(5)]);
/// let slots = layout.build();
/// assert!(slots[0].is_unlocked);
/// assert!(!slots[1].is_unlocked);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotLayout(Vec<UnlockRequirement>);

impl SlotLayout {
    /// A layout with one slot per requirement, in order.
    pub fn new(requirements: Vec<UnlockRequirement>) -> Self {
        Self(requirements)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn requirements(&self) -> &[UnlockRequirement] {
        &self.0
    }

    /// Create the slots, indexed in layout order.
    pub fn build(&self) -> Vec<TraitSlot> {
        self.0
            .iter()
            .enumerate()
            .map(|(index, requirement)| TraitSlot::new(index, *requirement))
            .collect()
    }
}

impl Default for SlotLayout {
    /// Two starter slots, then slots at levels 5, 10 and 20, and one at
    /// 1000 essence earned.
    fn default() -> Self {
        Self(vec![
            UnlockRequirement::Starter,
            UnlockRequirement::Starter,
            UnlockRequirement::Level(5),
            UnlockRequirement::Level(10),
            UnlockRequirement::Level(20),
            UnlockRequirement::EssenceEarned(1000),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_thresholds() {
        let progress = ProgressContext::new()
            .with_level(5)
            .with_total_essence_earned(999);
        assert!(UnlockRequirement::Starter.is_met(&progress));
        assert!(UnlockRequirement::Level(5).is_met(&progress));
        assert!(!UnlockRequirement::Level(6).is_met(&progress));
        assert!(!UnlockRequirement::EssenceEarned(1000).is_met(&progress));
    }

    #[test]
    fn test_default_layout() {
        let slots = SlotLayout::default().build();
        assert_eq!(slots.len(), 6);
        assert_eq!(slots.iter().filter(|s| s.is_unlocked).count(), 2);
        assert!(slots.iter().all(|s| s.is_empty()));
        assert_eq!(slots[3].id, "slot-3");
        assert_eq!(slots[3].index, 3);
    }

    #[test]
    fn test_requirement_serde_shape() {
        let json = serde_json::to_string(&UnlockRequirement::Level(10)).unwrap();
        assert_eq!(json, r#"{"type":"level","threshold":10}"#);
        let starter: UnlockRequirement = serde_json::from_str(r#"{"type":"starter"}"#).unwrap();
        assert_eq!(starter, UnlockRequirement::Starter);
    }
}

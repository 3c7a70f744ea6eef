//! Trait slot manager.
//!
//! `TraitSlotManager` is the single owner of a player's trait state: the
//! ordered slot list, the discovered / acquired / permanent sets and the
//! essence balance. Consumers read through [`TraitSlotManager::snapshot`]
//! and write through the typed operations or [`TraitSlotManager::apply`];
//! nothing mutates the state directly.
//!
//! Invariants held after every operation:
//! - a locked slot has no occupant;
//! - a trait occupies at most one slot;
//! - permanent traits occupy no slot;
//! - only acquired traits occupy slots or are permanent;
//! - `acquired ⊆ discovered`.

use crate::config::EngineConfig;
use crate::context::ProgressContext;
use crate::error::TraitError;
use crate::id::TraitId;
use crate::registry::TraitRegistry;
use crate::slots::{SlotLayout, TraitSlot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Serializable trait state owned by a [`TraitSlotManager`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitState {
    pub slots: Vec<TraitSlot>,
    pub acquired: BTreeSet<TraitId>,
    pub permanent: BTreeSet<TraitId>,
    pub discovered: BTreeSet<TraitId>,
    /// Spendable essence balance.
    pub essence: u64,
}

/// Commands accepted by [`TraitSlotManager::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum TraitCommand {
    Discover(TraitId),
    Acquire(TraitId),
    Equip {
        trait_id: TraitId,
        slot: Option<usize>,
    },
    Unequip(TraitId),
    UnequipSlot(usize),
    Promote(TraitId),
    UnlockSlot(usize),
    GrantEssence(u64),
}

/// Result of a successful promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Promotion {
    /// Essence charged; 0 when the trait was already permanent.
    pub cost: u64,
    /// Slot the trait was removed from, if it was equipped.
    pub cleared_slot: Option<usize>,
    pub already_permanent: bool,
}

/// Successful outcome of a [`TraitCommand`].
#[derive(Debug, Clone, PartialEq)]
pub enum TraitOutcome {
    Discovered { newly: bool },
    Acquired { cost: u64 },
    Equipped { slot: usize },
    Unequipped { slot: Option<usize> },
    SlotCleared { trait_id: Option<TraitId> },
    Promoted(Promotion),
    SlotUnlocked { newly: bool },
    EssenceGranted { balance: u64 },
}

/// Owner of the slot list and trait ownership sets.
///
/// # Examples
///
/// ```rust
/// use trait_engine::{EngineConfig, ProgressContext, TraitRegistry, TraitSlotManager};
///
/// let registry = TraitRegistry::load(r#"{"keen_eye": {"name": "Keen Eye", "essenceCost": 10,
///     "effects": {"criticalChance": 0.05}}}"#).unwrap();
/// let progress = ProgressContext::new();
///
/// let mut manager = TraitSlotManager::new(&EngineConfig::default());
/// manager.grant_essence(25);
/// manager.acquire(&"keen_eye".into(), &registry, &progress).unwrap();
///
/// let slot = manager.equip(&"keen_eye".into(), None).unwrap();
/// assert_eq!(slot, 0);
/// assert_eq!(manager.essence(), 15);
/// assert!(manager.active_trait_ids().contains("keen_eye"));
/// ```
#[derive(Debug, Clone)]
pub struct TraitSlotManager {
    state: TraitState,
    permanence_cost_multiplier: f64,
}

impl TraitSlotManager {
    /// A fresh manager with the configured slot layout and no traits.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_layout(&config.slot_layout, config.permanence_cost_multiplier)
    }

    pub fn with_layout(layout: &SlotLayout, permanence_cost_multiplier: f64) -> Self {
        Self {
            state: TraitState {
                slots: layout.build(),
                ..TraitState::default()
            },
            permanence_cost_multiplier,
        }
    }

    /// Restore a manager from a saved state.
    ///
    /// Slots are renumbered to their list position. Permanent traits that
    /// were never acquired are dropped. Occupants that would break an
    /// invariant (locked slot, duplicate, permanent, or not acquired) are
    /// cleared. Every repair logs a warning. Acquired traits are marked
    /// discovered.
    pub fn from_state(mut state: TraitState, config: &EngineConfig) -> Self {
        for (position, slot) in state.slots.iter_mut().enumerate() {
            let stale = slot.index;
            if slot.renumber(position) {
                log::warn!("renumbered slot {} to {}", stale, position);
            }
        }

        let acquired = &state.acquired;
        state.permanent.retain(|trait_id| {
            let keep = acquired.contains(trait_id);
            if !keep {
                log::warn!("dropping permanent {}: never acquired", trait_id);
            }
            keep
        });

        let mut seen = BTreeSet::new();
        for slot in &mut state.slots {
            let Some(occupant) = slot.occupant.clone() else {
                continue;
            };
            let valid = slot.is_unlocked
                && state.acquired.contains(&occupant)
                && !state.permanent.contains(&occupant)
                && seen.insert(occupant.clone());
            if !valid {
                log::warn!("dropping invalid occupant {} from slot {}", occupant, slot.index);
                slot.occupant = None;
            }
        }
        let acquired = state.acquired.clone();
        state.discovered.extend(acquired);

        Self {
            state,
            permanence_cost_multiplier: config.permanence_cost_multiplier,
        }
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> TraitState {
        self.state.clone()
    }

    /// Borrow the current state.
    pub fn state(&self) -> &TraitState {
        &self.state
    }

    /// Slots in index order.
    pub fn slots(&self) -> &[TraitSlot] {
        &self.state.slots
    }

    /// Spendable essence.
    pub fn essence(&self) -> u64 {
        self.state.essence
    }

    /// Whether the trait has been seen.
    pub fn is_discovered(&self, trait_id: &TraitId) -> bool {
        self.state.discovered.contains(trait_id)
    }

    /// Whether the trait has been bought.
    pub fn is_acquired(&self, trait_id: &TraitId) -> bool {
        self.state.acquired.contains(trait_id)
    }

    /// Whether the trait is permanently active.
    pub fn is_permanent(&self, trait_id: &TraitId) -> bool {
        self.state.permanent.contains(trait_id)
    }

    /// Index of the slot holding `trait_id`, if equipped.
    pub fn slot_of(&self, trait_id: &TraitId) -> Option<usize> {
        self.state
            .slots
            .iter()
            .position(|slot| slot.holds(trait_id))
    }

    /// Traits whose effects currently apply: slot occupants plus permanents.
    pub fn active_trait_ids(&self) -> BTreeSet<TraitId> {
        self.state
            .slots
            .iter()
            .filter_map(|slot| slot.occupant.clone())
            .chain(self.state.permanent.iter().cloned())
            .collect()
    }

    /// Promotion cost of a trait under this manager's multiplier.
    pub fn promotion_cost(&self, trait_id: &TraitId, registry: &TraitRegistry) -> Result<u64, TraitError> {
        let def = registry.get(trait_id)?;
        Ok((def.essence_cost as f64 * self.permanence_cost_multiplier).floor() as u64)
    }

    /// Dispatch a command to the matching operation.
    pub fn apply(
        &mut self,
        command: TraitCommand,
        registry: &TraitRegistry,
        progress: &ProgressContext,
    ) -> Result<TraitOutcome, TraitError> {
        match command {
            TraitCommand::Discover(id) => Ok(TraitOutcome::Discovered {
                newly: self.discover(&id),
            }),
            TraitCommand::Acquire(id) => self
                .acquire(&id, registry, progress)
                .map(|cost| TraitOutcome::Acquired { cost }),
            TraitCommand::Equip { trait_id, slot } => self
                .equip(&trait_id, slot)
                .map(|slot| TraitOutcome::Equipped { slot }),
            TraitCommand::Unequip(id) => Ok(TraitOutcome::Unequipped {
                slot: self.unequip(&id),
            }),
            TraitCommand::UnequipSlot(index) => self
                .unequip_slot(index)
                .map(|trait_id| TraitOutcome::SlotCleared { trait_id }),
            TraitCommand::Promote(id) => self.promote(&id, registry).map(TraitOutcome::Promoted),
            TraitCommand::UnlockSlot(index) => self
                .unlock_slot(index)
                .map(|newly| TraitOutcome::SlotUnlocked { newly }),
            TraitCommand::GrantEssence(amount) => Ok(TraitOutcome::EssenceGranted {
                balance: self.grant_essence(amount),
            }),
        }
    }

    /// Mark a trait as seen. Returns `true` if it was new.
    pub fn discover(&mut self, trait_id: &TraitId) -> bool {
        self.state.discovered.insert(trait_id.clone())
    }

    /// Pay for a trait and add it to the acquired set.
    ///
    /// Returns the essence spent, which is 0 if the trait was already owned.
    pub fn acquire(
        &mut self,
        trait_id: &TraitId,
        registry: &TraitRegistry,
        progress: &ProgressContext,
    ) -> Result<u64, TraitError> {
        if self.is_acquired(trait_id) {
            return Ok(0);
        }

        let def = registry.get(trait_id)?;
        let requirements = &def.requirements;

        if let Some(level) = requirements.level {
            if progress.level < level {
                return Err(unmet(trait_id, format!("level {}", level)));
            }
        }
        if let Some(relationship) = &requirements.relationship {
            if progress.relationship(&relationship.npc_id) < relationship.value {
                return Err(unmet(
                    trait_id,
                    format!("relationship {} with {}", relationship.value, relationship.npc_id),
                ));
            }
        }
        if let Some(missing) = requirements
            .prerequisites
            .iter()
            .find(|prereq| !self.state.acquired.contains(*prereq))
        {
            return Err(unmet(trait_id, format!("prerequisite {}", missing)));
        }

        let cost = def.essence_cost;
        self.spend(cost)?;
        self.state.acquired.insert(trait_id.clone());
        self.state.discovered.insert(trait_id.clone());

        log::debug!("acquired trait {} for {} essence", trait_id, cost);
        Ok(cost)
    }

    /// Put an acquired trait into a slot and return the index used.
    ///
    /// A requested slot that is locked or occupied falls back to the
    /// lowest-index unlocked empty slot.
    pub fn equip(&mut self, trait_id: &TraitId, slot_index: Option<usize>) -> Result<usize, TraitError> {
        if !self.is_acquired(trait_id) {
            return Err(TraitError::NotAcquired(trait_id.clone()));
        }
        if self.is_permanent(trait_id) {
            return Err(TraitError::AlreadyPermanent(trait_id.clone()));
        }
        if let Some(slot) = self.slot_of(trait_id) {
            return Err(TraitError::AlreadyEquipped {
                trait_id: trait_id.clone(),
                slot,
            });
        }

        let requested = match slot_index {
            Some(index) => {
                let slot = self
                    .state
                    .slots
                    .get(index)
                    .ok_or(TraitError::InvalidSlot(index))?;
                slot.is_available().then_some(index)
            }
            None => None,
        };
        let target = requested
            .or_else(|| self.first_available_slot())
            .ok_or(TraitError::NoAvailableSlot)?;

        self.state.slots[target].occupant = Some(trait_id.clone());
        log::debug!("equipped {} in slot {}", trait_id, target);
        Ok(target)
    }

    /// Remove a trait from its slot. Returns the slot it left, or `None`
    /// (with a warning) if it was not equipped.
    pub fn unequip(&mut self, trait_id: &TraitId) -> Option<usize> {
        match self.slot_of(trait_id) {
            Some(index) => {
                self.state.slots[index].occupant = None;
                log::debug!("unequipped {} from slot {}", trait_id, index);
                Some(index)
            }
            None => {
                log::warn!("unequip ignored: {} is not equipped", trait_id);
                None
            }
        }
    }

    /// Clear a slot by index. Returns the trait that was in it.
    pub fn unequip_slot(&mut self, index: usize) -> Result<Option<TraitId>, TraitError> {
        let slot = self
            .state
            .slots
            .get_mut(index)
            .ok_or(TraitError::InvalidSlot(index))?;
        let previous = slot.occupant.take();
        if previous.is_none() {
            log::warn!("unequip ignored: slot {} is empty", index);
        }
        Ok(previous)
    }

    /// Make a trait permanently active.
    ///
    /// Charges the promotion cost, then adds the trait to the permanent set
    /// and clears any slot it occupied, so its effects are never counted
    /// twice. Promoting an already-permanent trait is a free no-op.
    pub fn promote(&mut self, trait_id: &TraitId, registry: &TraitRegistry) -> Result<Promotion, TraitError> {
        if !self.is_acquired(trait_id) {
            return Err(TraitError::NotAcquired(trait_id.clone()));
        }
        if self.is_permanent(trait_id) {
            return Ok(Promotion {
                cost: 0,
                cleared_slot: None,
                already_permanent: true,
            });
        }

        let cost = self.promotion_cost(trait_id, registry)?;
        self.spend(cost)?;

        self.state.permanent.insert(trait_id.clone());
        let cleared_slot = self.slot_of(trait_id);
        if let Some(index) = cleared_slot {
            self.state.slots[index].occupant = None;
        }

        log::debug!("promoted {} to permanent for {} essence", trait_id, cost);
        Ok(Promotion {
            cost,
            cleared_slot,
            already_permanent: false,
        })
    }

    /// Unlock a slot. Returns `true` if it was locked before.
    pub fn unlock_slot(&mut self, index: usize) -> Result<bool, TraitError> {
        let slot = self
            .state
            .slots
            .get_mut(index)
            .ok_or(TraitError::InvalidSlot(index))?;
        if slot.is_unlocked {
            return Ok(false);
        }
        slot.is_unlocked = true;
        log::debug!("unlocked slot {}", index);
        Ok(true)
    }

    /// Unlock every slot whose requirement the progress snapshot meets.
    /// Returns the newly unlocked indices in ascending order.
    pub fn refresh_unlocks(&mut self, progress: &ProgressContext) -> Vec<usize> {
        let mut unlocked = Vec::new();
        for slot in &mut self.state.slots {
            if !slot.is_unlocked && slot.unlock_requirement.is_met(progress) {
                slot.is_unlocked = true;
                unlocked.push(slot.index);
            }
        }
        if !unlocked.is_empty() {
            log::debug!("unlocked slots {:?}", unlocked);
        }
        unlocked
    }

    /// Credit essence. Returns the new balance.
    pub fn grant_essence(&mut self, amount: u64) -> u64 {
        self.state.essence = self.state.essence.saturating_add(amount);
        self.state.essence
    }

    fn spend(&mut self, cost: u64) -> Result<(), TraitError> {
        if self.state.essence < cost {
            return Err(TraitError::InsufficientEssence {
                required: cost,
                available: self.state.essence,
            });
        }
        self.state.essence -= cost;
        Ok(())
    }

    fn first_available_slot(&self) -> Option<usize> {
        self.state
            .slots
            .iter()
            .position(TraitSlot::is_available)
    }
}

fn unmet(trait_id: &TraitId, requirement: String) -> TraitError {
    TraitError::RequirementNotMet {
        trait_id: trait_id.clone(),
        requirement,
    }
}

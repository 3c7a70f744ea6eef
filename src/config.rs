//! Engine configuration.
//!
//! Tunable constants for slots, permanence and combat. Every field has a
//! default, so a config file only needs the values it changes.

use crate::error::LoadError;
use crate::slots::SlotLayout;
use serde::{Deserialize, Serialize};

/// Combat tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CombatConfig {
    /// Share of dealt damage returned as essence on a siphon proc.
    pub siphon_ratio: f64,
    /// Lowest signed offset added to enemy damage.
    pub variance_min: i64,
    /// Highest signed offset added to enemy damage.
    pub variance_max: i64,
    /// Probability that a retreat attempt succeeds.
    pub retreat_chance: f64,
}

impl CombatConfig {
    /// Reject combat values the resolver cannot work with.
    pub fn validate(&self) -> Result<(), LoadError> {
        if !(0.0..=1.0).contains(&self.siphon_ratio) {
            return Err(invalid("combat.siphonRatio", "must be within 0..=1"));
        }
        if !(0.0..=1.0).contains(&self.retreat_chance) {
            return Err(invalid("combat.retreatChance", "must be within 0..=1"));
        }
        if self.variance_min > self.variance_max {
            return Err(invalid("combat.varianceMin", "must not exceed varianceMax"));
        }
        Ok(())
    }

    /// Coerce out-of-range values into range: an inverted variance range
    /// is swapped and probabilities are clamped to `0..=1` (NaN becomes 0).
    pub fn sanitized(mut self) -> Self {
        if self.variance_min > self.variance_max {
            std::mem::swap(&mut self.variance_min, &mut self.variance_max);
        }
        self.siphon_ratio = clamp_unit(self.siphon_ratio);
        self.retreat_chance = clamp_unit(self.retreat_chance);
        self
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            siphon_ratio: 0.2,
            variance_min: -2,
            variance_max: 2,
            retreat_chance: 0.5,
        }
    }
}

/// Top-level configuration.
///
/// # Examples
///
/// ```rust
/// use trait_engine::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{"combat": {"retreatChance": 0.75}}"#).unwrap();
/// assert_eq!(config.combat.retreat_chance, 0.75);
/// assert_eq!(config.combat.siphon_ratio, 0.2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Slots a new player starts with, and how each unlocks.
    pub slot_layout: SlotLayout,
    /// Promotion costs `essence_cost × multiplier` (floored).
    pub permanence_cost_multiplier: f64,
    pub combat: CombatConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slot_layout: SlotLayout::default(),
            permanence_cost_multiplier: 2.0,
            combat: CombatConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.slot_layout.is_empty() {
            return Err(invalid("slotLayout", "at least one slot is required"));
        }
        if !(self.permanence_cost_multiplier >= 0.0) {
            return Err(invalid("permanenceCostMultiplier", "must be non-negative"));
        }
        self.combat.validate()
    }
}

fn invalid(field: &'static str, reason: &str) -> LoadError {
    LoadError::InvalidConfig {
        field,
        reason: reason.to_string(),
    }
}

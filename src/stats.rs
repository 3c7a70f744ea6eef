//! Base and derived player stats.
//!
//! Derived combat numbers are integers: `floor(base × (1 + bonus))`,
//! truncated rather than rounded, and never negative.

use crate::modifiers::ModifierRecord;
use serde::{Deserialize, Serialize};

/// Absorbs binary representation error before flooring, so that
/// `20 × 1.15` yields 23 rather than 22.
const FLOOR_EPSILON: f64 = 1e-9;

/// Floor a non-negative stat product to an integer.
pub(crate) fn floor_stat(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    (value + FLOOR_EPSILON).floor().min(u32::MAX as f64) as u32
}

/// The player's stats before trait modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseStats {
    pub attack: u32,
    pub defense: u32,
    pub health: u32,
    pub max_health: u32,
    pub mana: u32,
    pub max_mana: u32,
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            attack: 10,
            defense: 5,
            health: 100,
            max_health: 100,
            mana: 50,
            max_mana: 50,
        }
    }
}

/// Stats after applying a modifier record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStats {
    pub attack: u32,
    pub defense: u32,
}

impl DerivedStats {
    /// # Examples
    ///
    /// ```rust
    /// use trait_engine::{DerivedStats, ModifierRecord};
    ///
    /// let mut modifiers = ModifierRecord::neutral();
    /// modifiers.set("attackBonus", 0.15);
    ///
    /// // floor(10 × 1.15) = floor(11.5) = 11
    /// let derived = DerivedStats::compute(10, 5, &modifiers);
    /// assert_eq!(derived.attack, 11);
    /// assert_eq!(derived.defense, 5);
    /// ```
    pub fn compute(base_attack: u32, base_defense: u32, modifiers: &ModifierRecord) -> Self {
        Self {
            attack: final_attack(base_attack, modifiers),
            defense: final_defense(base_defense, modifiers),
        }
    }

    pub fn from_base(base: &BaseStats, modifiers: &ModifierRecord) -> Self {
        Self::compute(base.attack, base.defense, modifiers)
    }
}

/// `floor(base_attack × (1 + attackBonus))`.
pub fn final_attack(base_attack: u32, modifiers: &ModifierRecord) -> u32 {
    floor_stat(base_attack as f64 * (1.0 + modifiers.attack_bonus()))
}

/// `floor(base_defense × (1 + defenseBonus))`.
pub fn final_defense(base_defense: u32, modifiers: &ModifierRecord) -> u32 {
    floor_stat(base_defense as f64 * (1.0 + modifiers.defense_bonus()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with(key: &str, value: f64) -> ModifierRecord {
        let mut record = ModifierRecord::neutral();
        record.set(key, value);
        record
    }

    #[test]
    fn test_floor_not_round() {
        assert_eq!(final_attack(10, &with("attackBonus", 0.15)), 11);
        assert_eq!(final_attack(10, &with("attackBonus", 0.19)), 11);
        assert_eq!(final_defense(7, &with("defenseBonus", 0.5)), 10);
    }

    #[test]
    fn test_representation_error_absorbed() {
        assert_eq!(final_attack(20, &with("attackBonus", 0.15)), 23);
    }

    #[test]
    fn test_negative_bonus_clamps_at_zero() {
        assert_eq!(final_attack(10, &with("attackBonus", -2.0)), 0);
        assert_eq!(final_attack(10, &with("attackBonus", -0.5)), 5);
    }

    #[test]
    fn test_neutral_is_identity() {
        let derived = DerivedStats::from_base(&BaseStats::default(), &ModifierRecord::neutral());
        assert_eq!(derived, DerivedStats { attack: 10, defense: 5 });
    }
}

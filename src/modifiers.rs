//! Effect aggregation.
//!
//! Folds the effects of every active trait into one flat
//! [`ModifierRecord`]. Each effect key has a [`CombineRule`]: additive keys
//! start at 0 and sum, multiplicative keys start at 1 and multiply. Keys the
//! engine does not know are kept and summed.
//!
//! Records are not cached. Equip, unequip and promote are the only things
//! that change the active set, and the caller re-aggregates after them.

use crate::id::{EffectKey, TraitId};
use crate::registry::TraitRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Effect keys with built-in meaning.
pub mod keys {
    pub const ATTACK_BONUS: &str = "attackBonus";
    pub const DEFENSE_BONUS: &str = "defenseBonus";
    pub const DODGE_CHANCE: &str = "dodgeChance";
    pub const CRITICAL_CHANCE: &str = "criticalChance";
    pub const CRITICAL_DAMAGE: &str = "criticalDamage";
    pub const ESSENCE_SIPHON_CHANCE: &str = "essenceSiphonChance";
    pub const XP_MULTIPLIER: &str = "xpMultiplier";
    pub const GOLD_MULTIPLIER: &str = "goldMultiplier";

    /// Keys that sum across traits.
    pub const ADDITIVE: [&str; 6] = [
        ATTACK_BONUS,
        DEFENSE_BONUS,
        DODGE_CHANCE,
        CRITICAL_CHANCE,
        CRITICAL_DAMAGE,
        ESSENCE_SIPHON_CHANCE,
    ];

    /// Keys that multiply across traits.
    pub const MULTIPLICATIVE: [&str; 2] = [XP_MULTIPLIER, GOLD_MULTIPLIER];
}

/// How contributions to one key combine across traits.
///
/// # Examples
///
/// ```rust
/// use trait_engine::modifiers::CombineRule;
///
/// assert_eq!(CombineRule::for_key("attackBonus"), CombineRule::Additive);
/// assert_eq!(CombineRule::for_key("goldMultiplier"), CombineRule::Multiplicative);
/// assert_eq!(CombineRule::for_key("somethingNew"), CombineRule::Additive);
/// assert_eq!(CombineRule::Multiplicative.combine(1.5, 2.0), 3.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombineRule {
    /// Neutral 0, contributions are summed.
    Additive,
    /// Neutral 1, contributions are multiplied.
    Multiplicative,
}

impl CombineRule {
    /// Rule for a key. Unknown keys are additive.
    pub fn for_key(key: &str) -> Self {
        if keys::MULTIPLICATIVE.contains(&key) {
            CombineRule::Multiplicative
        } else {
            CombineRule::Additive
        }
    }

    /// Starting value before any contribution.
    pub fn neutral(self) -> f64 {
        match self {
            CombineRule::Additive => 0.0,
            CombineRule::Multiplicative => 1.0,
        }
    }

    /// Fold one contribution into the running value.
    pub fn combine(self, acc: f64, magnitude: f64) -> f64 {
        match self {
            CombineRule::Additive => acc + magnitude,
            CombineRule::Multiplicative => acc * magnitude,
        }
    }
}

/// Merged effect values of a set of traits.
///
/// Always contains every built-in key; unknown keys appear only when a
/// trait contributed to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierRecord {
    values: BTreeMap<EffectKey, f64>,
}

impl Default for ModifierRecord {
    /// All built-in keys at their neutral values.
    fn default() -> Self {
        let values = keys::ADDITIVE
            .iter()
            .chain(keys::MULTIPLICATIVE.iter())
            .map(|key| (EffectKey::new(key), CombineRule::for_key(key).neutral()))
            .collect();
        Self { values }
    }
}

impl ModifierRecord {
    /// A record with every built-in key neutral.
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Value for a key; missing keys read as their neutral value.
    pub fn get(&self, key: &str) -> f64 {
        self.values
            .get(key)
            .copied()
            .unwrap_or_else(|| CombineRule::for_key(key).neutral())
    }

    /// Overwrite a key. Mostly useful for building records in tests and tools.
    pub fn set(&mut self, key: &str, value: f64) -> &mut Self {
        self.values.insert(EffectKey::new(key), value);
        self
    }

    /// Fold one contribution in using the key's rule.
    pub fn combine(&mut self, key: &EffectKey, magnitude: f64) {
        let rule = CombineRule::for_key(key.as_str());
        let entry = self.values.entry(key.clone()).or_insert_with(|| rule.neutral());
        *entry = rule.combine(*entry, magnitude);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EffectKey, f64)> {
        self.values.iter().map(|(key, value)| (key, *value))
    }

    pub fn attack_bonus(&self) -> f64 {
        self.get(keys::ATTACK_BONUS)
    }

    pub fn defense_bonus(&self) -> f64 {
        self.get(keys::DEFENSE_BONUS)
    }

    pub fn dodge_chance(&self) -> f64 {
        self.get(keys::DODGE_CHANCE)
    }

    pub fn critical_chance(&self) -> f64 {
        self.get(keys::CRITICAL_CHANCE)
    }

    pub fn critical_damage(&self) -> f64 {
        self.get(keys::CRITICAL_DAMAGE)
    }

    pub fn essence_siphon_chance(&self) -> f64 {
        self.get(keys::ESSENCE_SIPHON_CHANCE)
    }

    pub fn xp_multiplier(&self) -> f64 {
        self.get(keys::XP_MULTIPLIER)
    }

    pub fn gold_multiplier(&self) -> f64 {
        self.get(keys::GOLD_MULTIPLIER)
    }
}

/// A record together with where each value came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifierBreakdown {
    pub record: ModifierRecord,
    /// Per key, each `(trait, magnitude)` contribution in aggregation order.
    pub contributions: BTreeMap<EffectKey, Vec<(TraitId, f64)>>,
    /// Active ids with no definition in the registry.
    pub unknown: Vec<TraitId>,
}

impl ModifierBreakdown {
    /// Traits that contributed to `key`.
    pub fn sources_of(&self, key: &str) -> &[(TraitId, f64)] {
        self.contributions.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Merge the effects of `trait_ids`.
///
/// Ids without a definition are skipped with a warning.
///
/// # Examples
///
/// ```rust
/// use std::collections::BTreeSet;
/// use trait_engine::{aggregate, TraitId, TraitRegistry};
///
/// let registry = TraitRegistry::load(r#"{
///     "brute": {"name": "Brute", "effects": {"attackBonus": 0.1, "xpMultiplier": 1.5}},
///     "scholar": {"name": "Scholar", "effects": [{"type": "xpMultiplier", "magnitude": 2.0}]}
/// }"#).unwrap();
///
/// let active: BTreeSet<TraitId> = ["brute", "scholar"].into_iter().map(TraitId::from).collect();
/// let record = aggregate(&active, &registry);
/// assert_eq!(record.attack_bonus(), 0.1);
/// assert_eq!(record.xp_multiplier(), 3.0);
/// assert_eq!(record.gold_multiplier(), 1.0);
/// ```
pub fn aggregate<'a, I>(trait_ids: I, registry: &TraitRegistry) -> ModifierRecord
where
    I: IntoIterator<Item = &'a TraitId>,
{
    aggregate_with_breakdown(trait_ids, registry).record
}

/// Like [`aggregate`], but also records each trait's contribution.
pub fn aggregate_with_breakdown<'a, I>(trait_ids: I, registry: &TraitRegistry) -> ModifierBreakdown
where
    I: IntoIterator<Item = &'a TraitId>,
{
    // Sorted, de-duplicated iteration keeps float results reproducible.
    let ordered: BTreeSet<&TraitId> = trait_ids.into_iter().collect();
    let mut breakdown = ModifierBreakdown::default();

    for id in ordered {
        let def = match registry.get(id) {
            Ok(def) => def,
            Err(err) => {
                log::warn!("skipping trait during aggregation: {}", err);
                breakdown.unknown.push(id.clone());
                continue;
            }
        };
        for (key, magnitude) in &def.effects {
            breakdown.record.combine(key, *magnitude);
            breakdown
                .contributions
                .entry(key.clone())
                .or_default()
                .push((id.clone(), *magnitude));
        }
    }

    breakdown
}

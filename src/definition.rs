//! Trait definitions.
//!
//! Content files describe traits in a loose, partly legacy JSON shape
//! ([`RawTraitDefinition`]). Loading normalizes every entry into a
//! [`TraitDefinition`] whose effects are always a flat key → magnitude map,
//! so nothing downstream has to care which shape the content used.

use crate::id::{EffectKey, TraitId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category used when neither `category` nor the legacy `type` is present.
pub const DEFAULT_CATEGORY: &str = "General";

/// Trait rarity. Missing rarity in content defaults to `Common`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

/// A single effect record in the list form of `effects`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEffect {
    /// Effect key, e.g. `attackBonus`.
    #[serde(rename = "type")]
    pub kind: String,
    pub magnitude: f64,
    /// Carried through from content; passive aggregation ignores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

/// The two shapes `effects` appears in within content files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawEffects {
    /// Ordered `{type, magnitude, duration?}` records.
    List(Vec<RawEffect>),
    /// Flat effect-key → magnitude map.
    Map(BTreeMap<String, f64>),
}

impl Default for RawEffects {
    fn default() -> Self {
        RawEffects::Map(BTreeMap::new())
    }
}

impl RawEffects {
    /// Normalize into the canonical flat map.
    ///
    /// In the list form, a later record for the same key overwrites an
    /// earlier one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trait_engine::definition::{RawEffect, RawEffects};
    ///
    /// let effects = RawEffects::List(vec![
    ///     RawEffect { kind: "attackBonus".into(), magnitude: 0.1, duration: None },
    ///     RawEffect { kind: "attackBonus".into(), magnitude: 0.3, duration: None },
    /// ]);
    /// let flat = effects.normalize();
    /// assert_eq!(flat.get("attackBonus"), Some(&0.3));
    /// ```
    pub fn normalize(&self) -> BTreeMap<EffectKey, f64> {
        match self {
            RawEffects::List(records) => records.iter().fold(BTreeMap::new(), |mut acc, effect| {
                acc.insert(EffectKey::from(effect.kind.as_str()), effect.magnitude);
                acc
            }),
            RawEffects::Map(map) => map
                .iter()
                .map(|(key, magnitude)| (EffectKey::from(key.as_str()), *magnitude))
                .collect(),
        }
    }
}

/// Minimum relationship with a specific NPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipRequirement {
    pub npc_id: String,
    pub value: i32,
}

/// Conditions the player must meet before a trait can be acquired.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<RelationshipRequirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prerequisites: Vec<TraitId>,
}

impl Requirements {
    /// True when nothing gates acquisition.
    pub fn is_empty(&self) -> bool {
        self.level.is_none() && self.relationship.is_none() && self.prerequisites.is_empty()
    }
}

/// A trait definition exactly as it appears in a content file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTraitDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Legacy synonym for `category`.
    #[serde(default, rename = "type")]
    pub legacy_type: Option<String>,
    #[serde(default)]
    pub rarity: Option<Rarity>,
    #[serde(default)]
    pub tier: Option<u32>,
    #[serde(default)]
    pub effects: RawEffects,
    #[serde(default, alias = "cost")]
    pub essence_cost: u64,
    #[serde(default)]
    pub requirements: Requirements,
}

/// A normalized, immutable trait definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitDefinition {
    pub id: TraitId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub rarity: Rarity,
    pub tier: u32,
    pub effects: BTreeMap<EffectKey, f64>,
    pub essence_cost: u64,
    pub requirements: Requirements,
}

impl TraitDefinition {
    /// Normalize a raw content entry stored under `id`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trait_engine::definition::{Rarity, RawTraitDefinition, TraitDefinition};
    ///
    /// let raw: RawTraitDefinition = serde_json::from_str(
    ///     r#"{"name": "Iron Skin", "type": "Defense", "effects": {"defenseBonus": 0.1}}"#,
    /// ).unwrap();
    /// let def = TraitDefinition::from_raw("iron_skin".into(), raw);
    /// assert_eq!(def.category, "Defense");
    /// assert_eq!(def.rarity, Rarity::Common);
    /// ```
    pub fn from_raw(id: TraitId, raw: RawTraitDefinition) -> Self {
        let effects = raw.effects.normalize();
        let category = raw
            .category
            .or(raw.legacy_type)
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        Self {
            id,
            name: raw.name,
            description: raw.description,
            category,
            rarity: raw.rarity.unwrap_or_default(),
            tier: raw.tier.unwrap_or(1),
            effects,
            essence_cost: raw.essence_cost,
            requirements: raw.requirements,
        }
    }

    /// Magnitude of a single effect, if the trait has it.
    pub fn effect(&self, key: &str) -> Option<f64> {
        self.effects.get(key).copied()
    }
}

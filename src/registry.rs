//! Trait registry module.
//!
//! The registry is the immutable catalog of every trait definition, built
//! once from a content file. Loading normalizes legacy shapes and validates
//! prerequisites; after that it is a read-only lookup table that can be
//! shared freely (e.g. behind an `Arc`).

use crate::definition::{Rarity, RawTraitDefinition, TraitDefinition};
use crate::error::{LoadError, TraitError};
use crate::graph::PrerequisiteGraph;
use crate::id::TraitId;
use std::collections::BTreeMap;

/// Immutable catalog of trait definitions keyed by id.
///
/// # Examples
///
/// ```rust
/// use trait_engine::{TraitId, TraitRegistry};
///
/// let registry = TraitRegistry::load(r#"{
///     "iron_skin": {"name": "Iron Skin", "effects": {"defenseBonus": 0.1}, "essenceCost": 30}
/// }"#).unwrap();
///
/// let def = registry.get(&TraitId::new("iron_skin")).unwrap();
/// assert_eq!(def.essence_cost, 30);
/// assert!(registry.get(&TraitId::new("missing")).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TraitRegistry {
    definitions: BTreeMap<TraitId, TraitDefinition>,
    prerequisites: PrerequisiteGraph,
}

impl TraitRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON content map of id → definition.
    ///
    /// A parse failure is a load error for the whole file, not a per-trait
    /// error.
    pub fn load(raw_json: &str) -> Result<Self, LoadError> {
        let raw: BTreeMap<String, RawTraitDefinition> = serde_json::from_str(raw_json)?;
        Self::from_raw(raw)
    }

    /// Build a registry from already-deserialized raw definitions.
    pub fn from_raw(raw: BTreeMap<String, RawTraitDefinition>) -> Result<Self, LoadError> {
        let definitions = raw
            .into_iter()
            .map(|(id, raw_def)| {
                let id = TraitId::from(id);
                (id.clone(), TraitDefinition::from_raw(id, raw_def))
            })
            .collect();
        Self::from_definitions(definitions)
    }

    /// Build a registry from normalized definitions.
    ///
    /// Fails if a prerequisite names a trait that is not in the map, or if
    /// prerequisites form a cycle.
    pub fn from_definitions(definitions: BTreeMap<TraitId, TraitDefinition>) -> Result<Self, LoadError> {
        let mut prerequisites = PrerequisiteGraph::new();

        for (id, def) in &definitions {
            prerequisites.add_node(id.clone());
            for prereq in &def.requirements.prerequisites {
                if !definitions.contains_key(prereq) {
                    return Err(LoadError::UnknownPrerequisite {
                        trait_id: id.clone(),
                        prerequisite: prereq.clone(),
                    });
                }
                prerequisites.add_requirement(id.clone(), prereq.clone());
            }
        }

        prerequisites.detect_cycles()?;

        log::debug!("loaded {} trait definitions", definitions.len());

        Ok(Self {
            definitions,
            prerequisites,
        })
    }

    /// Look up a definition.
    pub fn get(&self, id: &TraitId) -> Result<&TraitDefinition, TraitError> {
        self.definitions
            .get(id)
            .ok_or_else(|| TraitError::NotFound(id.clone()))
    }

    /// Check whether a definition exists.
    pub fn contains(&self, id: &TraitId) -> bool {
        self.definitions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// All ids, in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &TraitId> {
        self.definitions.keys()
    }

    /// All definitions, in id order.
    pub fn iter(&self) -> impl Iterator<Item = &TraitDefinition> {
        self.definitions.values()
    }

    /// Definitions in a category (exact, case-sensitive match).
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a TraitDefinition> {
        self.iter().filter(move |def| def.category == category)
    }

    /// Definitions of a rarity.
    pub fn by_rarity(&self, rarity: Rarity) -> impl Iterator<Item = &TraitDefinition> {
        self.iter().filter(move |def| def.rarity == rarity)
    }

    /// Transitive prerequisites of a trait, ordered so each entry's own
    /// prerequisites come before it.
    pub fn prerequisite_chain(&self, id: &TraitId) -> Result<Vec<TraitId>, TraitError> {
        if !self.contains(id) {
            return Err(TraitError::NotFound(id.clone()));
        }
        // Cycles were rejected at load, so the chain always sorts.
        Ok(self.prerequisites.prerequisite_chain(id).unwrap_or_default())
    }
}

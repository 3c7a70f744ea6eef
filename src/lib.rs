//! # trait-engine - Trait Slots, Effect Aggregation and Combat Resolution
//!
//! The rules core of an RPG progression game:
//! - **Traits** are passive modifiers a player discovers, buys with essence,
//!   equips into a limited set of slots, or promotes to permanent.
//! - **Aggregation** folds the effects of every active trait into one
//!   modifier record (additive keys sum, multiplicative keys multiply).
//! - **Combat** consumes that record to resolve a turn-based fight with
//!   damage variance, critical hits, dodges and essence siphon procs.
//!
//! ## Pipeline
//!
//! ```text
//! [TraitRegistry] → [TraitSlotManager] → active ids → [aggregate] → [ModifierRecord]
//!                                                                          ↓
//!                                       rewards/essence ← [CombatResolver]
//! ```
//!
//! Everything here is synchronous and works on explicit state. Errors for
//! "can't do that right now" are returned as [`TraitError`]; only malformed
//! content or config ([`LoadError`]) is fatal.
//!
//! ## Example
//!
//! ```rust
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use trait_engine::*;
//!
//! let registry = TraitRegistry::load(r#"{
//!     "brawler": {"name": "Brawler", "essenceCost": 20, "effects": {"attackBonus": 0.5}}
//! }"#).unwrap();
//! let config = EngineConfig::default();
//! let progress = ProgressContext::new();
//!
//! let mut traits = TraitSlotManager::new(&config);
//! traits.grant_essence(20);
//! traits.apply(TraitCommand::Acquire("brawler".into()), &registry, &progress).unwrap();
//! traits.apply(TraitCommand::Equip { trait_id: "brawler".into(), slot: None }, &registry, &progress).unwrap();
//!
//! let modifiers = aggregate(&traits.active_trait_ids(), &registry);
//! assert_eq!(DerivedStats::from_base(&BaseStats::default(), &modifiers).attack, 15);
//!
//! let resolver = CombatResolver::new(config.combat.clone());
//! let enemy = EnemyTemplate {
//!     name: "Bandit".into(), level: 1, health: 30, attack: 6, defense: 2,
//!     experience_reward: 12, gold_reward: 5,
//! };
//! let mut encounter = resolver.start_encounter(&BaseStats::default(), &enemy, 1.0, 1.0);
//! let report = resolver.player_attack(&mut encounter, &modifiers, &mut StdRng::seed_from_u64(1));
//! assert_eq!(report.damage_by(Combatant::Player), 13);
//! ```
//!
//! ## Modules
//!
//! - [`id`] - Trait and effect identifiers
//! - [`definition`] - Trait content model and normalization
//! - [`graph`] - Prerequisite graph
//! - [`registry`] - Trait catalog
//! - [`context`] - Player progress snapshot for gating
//! - [`slots`] - Slot type and layout
//! - [`manager`] - Slot and ownership state machine
//! - [`modifiers`] - Effect aggregation
//! - [`stats`] - Base and derived stats
//! - [`encounter`] - Encounter state
//! - [`combat`] - Combat resolution
//! - [`config`] - Engine configuration
//! - [`error`] - Error types

pub mod combat;
pub mod config;
pub mod context;
pub mod definition;
pub mod encounter;
pub mod error;
pub mod graph;
pub mod id;
pub mod manager;
pub mod modifiers;
pub mod registry;
pub mod slots;
pub mod stats;

// Re-export main types for convenience
pub use combat::{is_terminal, CombatCommand, CombatEvent, CombatReport, CombatResolver, Combatant};
pub use config::{CombatConfig, EngineConfig};
pub use context::ProgressContext;
pub use definition::{Rarity, TraitDefinition};
pub use encounter::{EncounterState, EnemyTemplate, Outcome, Rewards};
pub use error::{LoadError, TraitError};
pub use id::{EffectKey, TraitId};
pub use manager::{Promotion, TraitCommand, TraitOutcome, TraitSlotManager, TraitState};
pub use modifiers::{aggregate, aggregate_with_breakdown, CombineRule, ModifierBreakdown, ModifierRecord};
pub use registry::TraitRegistry;
pub use slots::{SlotLayout, TraitSlot, UnlockRequirement};
pub use stats::{BaseStats, DerivedStats};

//! Encounter state.
//!
//! An `EncounterState` is one fight against a single enemy. It is created
//! by [`crate::CombatResolver::start_encounter`], advanced only through the
//! resolver, and discarded by the caller once [`EncounterState::outcome`]
//! reports a terminal result.

use crate::stats::floor_stat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Enemy stats before level and difficulty scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyTemplate {
    pub name: String,
    #[serde(default = "default_level")]
    pub level: u32,
    pub health: u32,
    pub attack: u32,
    pub defense: u32,
    #[serde(default)]
    pub experience_reward: u64,
    #[serde(default)]
    pub gold_reward: u64,
}

fn default_level() -> u32 {
    1
}

/// Scaled enemy stats inside an encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyState {
    pub name: String,
    pub level: u32,
    pub current_health: u32,
    pub max_health: u32,
    pub attack: u32,
    pub defense: u32,
    pub experience_reward: u64,
    pub gold_reward: u64,
}

impl EnemyState {
    /// Scale a template by `level_multiplier × difficulty_multiplier`.
    ///
    /// Health, attack, defense and rewards are floored; health is at
    /// least 1.
    pub fn scaled(template: &EnemyTemplate, level_multiplier: f64, difficulty_multiplier: f64) -> Self {
        let scale = level_multiplier * difficulty_multiplier;
        let max_health = floor_stat(template.health as f64 * scale).max(1);

        Self {
            name: template.name.clone(),
            level: template.level,
            current_health: max_health,
            max_health,
            attack: floor_stat(template.attack as f64 * scale),
            defense: floor_stat(template.defense as f64 * scale),
            experience_reward: floor_reward(template.experience_reward, scale),
            gold_reward: floor_reward(template.gold_reward, scale),
        }
    }
}

/// `floor(amount × factor)`, never negative.
///
/// The epsilon only absorbs binary representation error in products that
/// are integral in decimal (`20 × 1.15`). A product within 1e-9 below an
/// integer is read as that integer.
pub(crate) fn floor_reward(amount: u64, factor: f64) -> u64 {
    let value = amount as f64 * factor;
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        (value + 1e-9).floor() as u64
    }
}

/// The player's side of an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCombatState {
    pub current_health: u32,
    pub max_health: u32,
    pub current_mana: u32,
    pub max_mana: u32,
    pub base_attack: u32,
    pub base_defense: u32,
}

/// Rewards granted on victory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewards {
    pub experience: u64,
    pub gold: u64,
}

/// Terminal result of an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Victory(Rewards),
    Defeat,
    Retreated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogKind {
    System,
    PlayerAction,
    EnemyAction,
    Critical,
    Dodge,
    Siphon,
    Victory,
    Defeat,
    Retreat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Importance {
    Low,
    Normal,
    High,
}

/// One line of the combat log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatLogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub kind: LogKind,
    pub importance: Importance,
}

/// State of a single fight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterState {
    /// Individual actions taken so far; each advances the round by half.
    pub(crate) half_turns: u32,
    pub player_turn: bool,
    pub player: PlayerCombatState,
    pub enemy: EnemyState,
    pub(crate) log: Vec<CombatLogEntry>,
    pub active: bool,
    pub(crate) outcome: Option<Outcome>,
}

impl EncounterState {
    pub(crate) fn new(player: PlayerCombatState, enemy: EnemyState) -> Self {
        let mut state = Self {
            half_turns: 0,
            player_turn: true,
            player,
            enemy,
            log: Vec::new(),
            active: true,
            outcome: None,
        };
        let opening = format!("A level {} {} appears!", state.enemy.level, state.enemy.name);
        state.push_log(opening, LogKind::System, Importance::Normal);
        state
    }

    /// Current round: 1.0 at the start, +0.5 per action.
    pub fn round(&self) -> f64 {
        1.0 + self.half_turns as f64 / 2.0
    }

    /// Completed full rounds (one player action plus one enemy action).
    pub fn completed_rounds(&self) -> u32 {
        self.half_turns / 2
    }

    /// The append-only combat log.
    pub fn log(&self) -> &[CombatLogEntry] {
        &self.log
    }

    /// Terminal outcome, or `None` while the fight goes on.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub(crate) fn push_log(&mut self, message: impl Into<String>, kind: LogKind, importance: Importance) {
        self.log.push(CombatLogEntry {
            timestamp: Utc::now(),
            message: message.into(),
            kind,
            importance,
        });
    }

    pub(crate) fn finish(&mut self, outcome: Outcome) {
        self.active = false;
        self.outcome = Some(outcome);
    }
}

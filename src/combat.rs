//! Turn-based combat resolution.
//!
//! `PlayerTurn ⇄ EnemyTurn → Victory | Defeat | Retreated`. The resolver is
//! stateless apart from its tuning; every action takes the encounter by
//! `&mut`, runs to completion and returns a [`CombatReport`] of what
//! happened. Randomness comes from the caller's `Rng`, so a seeded RNG
//! replays a fight exactly.
//!
//! Actions on a finished encounter, or out of turn, are no-ops that return
//! an empty report.

use crate::config::CombatConfig;
use crate::encounter::{
    floor_reward, EncounterState, EnemyState, EnemyTemplate, Importance, LogKind, Outcome, PlayerCombatState,
    Rewards,
};
use crate::modifiers::ModifierRecord;
use crate::stats::{final_attack, final_defense, BaseStats};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Who acted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combatant {
    Player,
    Enemy,
}

/// Something that happened during one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// The player's attack was evaded.
    Dodged,
    Hit {
        attacker: Combatant,
        damage: u32,
        critical: bool,
    },
    /// Essence for the caller to credit; independent of the damage dealt.
    EssenceSiphoned { amount: u64 },
    Victory(Rewards),
    Defeat,
    Retreated,
    RetreatFailed,
}

/// Events produced by one combat action, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatReport {
    pub events: Vec<CombatEvent>,
}

impl CombatReport {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total damage dealt by `attacker`.
    pub fn damage_by(&self, attacker: Combatant) -> u32 {
        self.events
            .iter()
            .filter_map(|event| match event {
                CombatEvent::Hit {
                    attacker: who, damage, ..
                } if *who == attacker => Some(*damage),
                _ => None,
            })
            .sum()
    }

    pub fn essence_siphoned(&self) -> u64 {
        self.events
            .iter()
            .filter_map(|event| match event {
                CombatEvent::EssenceSiphoned { amount } => Some(*amount),
                _ => None,
            })
            .sum()
    }

    pub fn rewards(&self) -> Option<Rewards> {
        self.events.iter().find_map(|event| match event {
            CombatEvent::Victory(rewards) => Some(*rewards),
            _ => None,
        })
    }

    fn push(&mut self, event: CombatEvent) {
        self.events.push(event);
    }
}

/// Commands accepted by [`CombatResolver::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatCommand {
    PlayerAttack,
    EnemyAttack,
    Retreat,
}

/// Terminal outcome of an encounter, if any.
pub fn is_terminal(encounter: &EncounterState) -> Option<Outcome> {
    encounter.outcome()
}

/// Roll a probability, clamped to `0..=1`. Zero never consumes randomness.
fn roll<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    if chance.is_nan() || chance <= 0.0 {
        false
    } else if chance >= 1.0 {
        true
    } else {
        rng.gen_bool(chance)
    }
}

/// Resolves encounter actions.
///
/// # Examples
///
/// ```rust
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use trait_engine::{BaseStats, CombatResolver, EnemyTemplate, ModifierRecord};
///
/// let resolver = CombatResolver::default();
/// let enemy = EnemyTemplate {
///     name: "Slime".into(), level: 1, health: 50, attack: 5, defense: 3,
///     experience_reward: 10, gold_reward: 4,
/// };
/// let mut encounter = resolver.start_encounter(&BaseStats::default(), &enemy, 1.0, 1.0);
/// let mut rng = StdRng::seed_from_u64(7);
///
/// let report = resolver.player_attack(&mut encounter, &ModifierRecord::neutral(), &mut rng);
/// assert_eq!(encounter.enemy.current_health, 43);
/// assert!(!report.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CombatResolver {
    config: CombatConfig,
}

impl CombatResolver {
    /// Build a resolver. Out-of-range tuning is coerced into range with a
    /// warning; use [`CombatConfig::validate`] to reject it instead.
    pub fn new(config: CombatConfig) -> Self {
        if let Err(err) = config.validate() {
            log::warn!("combat config adjusted: {}", err);
        }
        Self {
            config: config.sanitized(),
        }
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Set up a fight. The player always acts first.
    pub fn start_encounter(
        &self,
        player: &BaseStats,
        enemy: &EnemyTemplate,
        level_multiplier: f64,
        difficulty_multiplier: f64,
    ) -> EncounterState {
        let player = PlayerCombatState {
            current_health: player.health.min(player.max_health),
            max_health: player.max_health,
            current_mana: player.mana.min(player.max_mana),
            max_mana: player.max_mana,
            base_attack: player.attack,
            base_defense: player.defense,
        };
        let enemy = EnemyState::scaled(enemy, level_multiplier, difficulty_multiplier);
        log::debug!(
            "encounter started: {} (hp {}, atk {}, def {})",
            enemy.name,
            enemy.max_health,
            enemy.attack,
            enemy.defense
        );
        EncounterState::new(player, enemy)
    }

    /// Dispatch a command to the matching action.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        encounter: &mut EncounterState,
        command: CombatCommand,
        modifiers: &ModifierRecord,
        rng: &mut R,
    ) -> CombatReport {
        match command {
            CombatCommand::PlayerAttack => self.player_attack(encounter, modifiers, rng),
            CombatCommand::EnemyAttack => self.enemy_attack(encounter, modifiers, rng),
            CombatCommand::Retreat => self.attempt_retreat(encounter, modifiers, rng),
        }
    }

    /// Resolve the player's basic attack.
    pub fn player_attack<R: Rng + ?Sized>(
        &self,
        encounter: &mut EncounterState,
        modifiers: &ModifierRecord,
        rng: &mut R,
    ) -> CombatReport {
        let mut report = CombatReport::default();
        if !encounter.active || !encounter.player_turn {
            log::warn!("player attack ignored: encounter inactive or not the player's turn");
            return report;
        }
        encounter.half_turns += 1;

        if roll(rng, modifiers.dodge_chance()) {
            let message = format!("{} dodges your attack!", encounter.enemy.name);
            encounter.push_log(message, LogKind::Dodge, Importance::Normal);
            report.push(CombatEvent::Dodged);
            encounter.player_turn = false;
            return report;
        }

        let attack = final_attack(encounter.player.base_attack, modifiers) as i64;
        let base_damage = (attack - encounter.enemy.defense as i64).max(1);

        let critical = roll(rng, modifiers.critical_chance());
        let mut raw = base_damage as f64;
        if critical {
            raw *= 1.0 + modifiers.critical_damage();
        }
        let damage = (raw.round().max(1.0)).min(u32::MAX as f64) as u32;

        encounter.enemy.current_health = encounter.enemy.current_health.saturating_sub(damage);
        let (message, kind, importance) = if critical {
            (
                format!("Critical hit! You deal {} damage to {}.", damage, encounter.enemy.name),
                LogKind::Critical,
                Importance::High,
            )
        } else {
            (
                format!("You deal {} damage to {}.", damage, encounter.enemy.name),
                LogKind::PlayerAction,
                Importance::Normal,
            )
        };
        encounter.push_log(message, kind, importance);
        report.push(CombatEvent::Hit {
            attacker: Combatant::Player,
            damage,
            critical,
        });

        if roll(rng, modifiers.essence_siphon_chance()) {
            let amount = ((damage as f64 * self.config.siphon_ratio) - 1e-9).ceil().max(0.0) as u64;
            encounter.push_log(format!("You siphon {} essence.", amount), LogKind::Siphon, Importance::Low);
            report.push(CombatEvent::EssenceSiphoned { amount });
        }

        if encounter.enemy.current_health == 0 {
            let rewards = Rewards {
                experience: floor_reward(encounter.enemy.experience_reward, modifiers.xp_multiplier()),
                gold: floor_reward(encounter.enemy.gold_reward, modifiers.gold_multiplier()),
            };
            let message = format!(
                "{} is defeated! You gain {} experience and {} gold.",
                encounter.enemy.name, rewards.experience, rewards.gold
            );
            encounter.push_log(message, LogKind::Victory, Importance::High);
            encounter.finish(Outcome::Victory(rewards));
            report.push(CombatEvent::Victory(rewards));
            log::debug!("victory over {}: {:?}", encounter.enemy.name, rewards);
        } else {
            encounter.player_turn = false;
        }

        report
    }

    /// Resolve the enemy's attack. It always lands for at least 1 damage.
    pub fn enemy_attack<R: Rng + ?Sized>(
        &self,
        encounter: &mut EncounterState,
        modifiers: &ModifierRecord,
        rng: &mut R,
    ) -> CombatReport {
        let mut report = CombatReport::default();
        if !encounter.active || encounter.player_turn {
            log::warn!("enemy attack ignored: encounter inactive or not the enemy's turn");
            return report;
        }
        encounter.half_turns += 1;
        self.enemy_strike(encounter, modifiers, rng, &mut report);
        report
    }

    /// Try to leave the fight on the player's turn.
    ///
    /// Success ends the encounter with no rewards. Failure spends the
    /// player's turn and lets the enemy strike once.
    pub fn attempt_retreat<R: Rng + ?Sized>(
        &self,
        encounter: &mut EncounterState,
        modifiers: &ModifierRecord,
        rng: &mut R,
    ) -> CombatReport {
        let mut report = CombatReport::default();
        if !encounter.active || !encounter.player_turn {
            log::warn!("retreat ignored: encounter inactive or not the player's turn");
            return report;
        }
        encounter.half_turns += 1;

        if roll(rng, self.config.retreat_chance) {
            encounter.push_log("You escape from the fight.", LogKind::Retreat, Importance::High);
            encounter.finish(Outcome::Retreated);
            report.push(CombatEvent::Retreated);
            return report;
        }

        let message = format!("You fail to escape! The {} attacks.", encounter.enemy.name);
        encounter.push_log(message, LogKind::Retreat, Importance::Normal);
        report.push(CombatEvent::RetreatFailed);

        encounter.half_turns += 1;
        self.enemy_strike(encounter, modifiers, rng, &mut report);
        report
    }

    fn enemy_strike<R: Rng + ?Sized>(
        &self,
        encounter: &mut EncounterState,
        modifiers: &ModifierRecord,
        rng: &mut R,
        report: &mut CombatReport,
    ) {
        let defense = final_defense(encounter.player.base_defense, modifiers) as i64;
        let base_damage = (encounter.enemy.attack as i64 - defense).max(1);
        let variance = rng.gen_range(self.config.variance_min..=self.config.variance_max);
        let damage = (base_damage + variance).max(1).min(u32::MAX as i64) as u32;

        encounter.player.current_health = encounter.player.current_health.saturating_sub(damage);
        let message = format!("{} deals {} damage to you.", encounter.enemy.name, damage);
        encounter.push_log(message, LogKind::EnemyAction, Importance::Normal);
        report.push(CombatEvent::Hit {
            attacker: Combatant::Enemy,
            damage,
            critical: false,
        });

        if encounter.player.current_health == 0 {
            encounter.push_log("You have been defeated.", LogKind::Defeat, Importance::High);
            encounter.finish(Outcome::Defeat);
            report.push(CombatEvent::Defeat);
            log::debug!("defeated by {}", encounter.enemy.name);
        } else {
            encounter.player_turn = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn enemy() -> EnemyTemplate {
        EnemyTemplate {
            name: "Slime".into(),
            level: 1,
            health: 50,
            attack: 5,
            defense: 3,
            experience_reward: 30,
            gold_reward: 11,
        }
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn with(pairs: &[(&str, f64)]) -> ModifierRecord {
        let mut record = ModifierRecord::neutral();
        for (key, value) in pairs {
            record.set(key, *value);
        }
        record
    }

    #[test]
    fn test_basic_exchange() {
        let resolver = CombatResolver::default();
        let mut encounter = resolver.start_encounter(&BaseStats::default(), &enemy(), 1.0, 1.0);
        let mut rng = rng();
        let neutral = ModifierRecord::neutral();

        let report = resolver.player_attack(&mut encounter, &neutral, &mut rng);
        assert_eq!(report.damage_by(Combatant::Player), 7);
        assert_eq!(encounter.enemy.current_health, 43);
        assert!(!encounter.player_turn);
        assert_eq!(encounter.round(), 1.5);

        let report = resolver.enemy_attack(&mut encounter, &neutral, &mut rng);
        let taken = report.damage_by(Combatant::Enemy);
        assert!((1..=3).contains(&taken), "damage was {}", taken);
        assert_eq!(encounter.player.current_health, 100 - taken);
        assert!(encounter.player_turn);
        assert_eq!(encounter.completed_rounds(), 1);
    }

    #[test]
    fn test_out_of_turn_is_noop() {
        let resolver = CombatResolver::default();
        let mut encounter = resolver.start_encounter(&BaseStats::default(), &enemy(), 1.0, 1.0);
        let before = encounter.clone();
        let report = resolver.enemy_attack(&mut encounter, &ModifierRecord::neutral(), &mut rng());
        assert!(report.is_empty());
        assert_eq!(encounter, before);
    }

    #[test]
    fn test_guaranteed_crit() {
        let resolver = CombatResolver::default();
        let mut encounter = resolver.start_encounter(&BaseStats::default(), &enemy(), 1.0, 1.0);
        let modifiers = with(&[("criticalChance", 1.0), ("criticalDamage", 0.5)]);

        let report = resolver.player_attack(&mut encounter, &modifiers, &mut rng());
        // 7 × 1.5 = 10.5 rounds to 11
        assert_eq!(
            report.events[0],
            CombatEvent::Hit {
                attacker: Combatant::Player,
                damage: 11,
                critical: true
            }
        );
        assert_eq!(encounter.log().last().map(|e| e.kind), Some(LogKind::Critical));
    }

    #[test]
    fn test_dodge_chance_voids_player_attack() {
        let resolver = CombatResolver::default();
        let mut encounter = resolver.start_encounter(&BaseStats::default(), &enemy(), 1.0, 1.0);
        let modifiers = with(&[("dodgeChance", 1.0), ("essenceSiphonChance", 1.0)]);

        let report = resolver.player_attack(&mut encounter, &modifiers, &mut rng());
        assert_eq!(report.events, vec![CombatEvent::Dodged]);
        assert_eq!(encounter.enemy.current_health, 50);
        assert_eq!(encounter.log().last().map(|e| e.kind), Some(LogKind::Dodge));
        assert!(!encounter.player_turn);
        assert_eq!(encounter.round(), 1.5);
    }

    #[test]
    fn test_enemy_attack_always_lands() {
        let resolver = CombatResolver::default();
        let mut encounter = resolver.start_encounter(&BaseStats::default(), &enemy(), 1.0, 1.0);
        let modifiers = with(&[("dodgeChance", 1.0)]);
        let mut rng = rng();
        resolver.player_attack(&mut encounter, &modifiers, &mut rng);

        let report = resolver.enemy_attack(&mut encounter, &modifiers, &mut rng);
        let taken = report.damage_by(Combatant::Enemy);
        assert!(taken >= 1);
        assert_eq!(encounter.player.current_health, 100 - taken);
        assert!(!report.events.contains(&CombatEvent::Dodged));
    }

    #[test]
    fn test_inverted_variance_does_not_panic() {
        let config = CombatConfig {
            variance_min: 2,
            variance_max: -2,
            ..CombatConfig::default()
        };
        let resolver = CombatResolver::new(config);
        assert_eq!(resolver.config().variance_min, -2);
        assert_eq!(resolver.config().variance_max, 2);

        let mut encounter = resolver.start_encounter(&BaseStats::default(), &enemy(), 1.0, 1.0);
        let neutral = ModifierRecord::neutral();
        let mut rng = rng();
        resolver.player_attack(&mut encounter, &neutral, &mut rng);
        let taken = resolver.enemy_attack(&mut encounter, &neutral, &mut rng).damage_by(Combatant::Enemy);
        assert!((1..=3).contains(&taken));
    }

    #[test]
    fn test_siphon_rounds_up() {
        let resolver = CombatResolver::default();
        let mut encounter = resolver.start_encounter(&BaseStats::default(), &enemy(), 1.0, 1.0);
        let modifiers = with(&[("essenceSiphonChance", 1.0)]);

        let report = resolver.player_attack(&mut encounter, &modifiers, &mut rng());
        // ceil(7 × 0.2) = 2
        assert_eq!(report.essence_siphoned(), 2);
    }

    #[test]
    fn test_victory_rewards_scale() {
        let resolver = CombatResolver::default();
        let mut template = enemy();
        template.health = 5;
        let mut encounter = resolver.start_encounter(&BaseStats::default(), &template, 1.0, 1.0);
        let modifiers = with(&[("xpMultiplier", 1.5), ("goldMultiplier", 2.0)]);

        let report = resolver.player_attack(&mut encounter, &modifiers, &mut rng());
        let rewards = Rewards {
            experience: 45,
            gold: 22,
        };
        assert_eq!(report.rewards(), Some(rewards));
        assert_eq!(is_terminal(&encounter), Some(Outcome::Victory(rewards)));
        assert!(!encounter.active);

        // finished encounters ignore further actions
        assert!(resolver
            .player_attack(&mut encounter, &modifiers, &mut rng())
            .is_empty());
    }

    #[test]
    fn test_defeat() {
        let resolver = CombatResolver::default();
        let mut player = BaseStats::default();
        player.health = 1;
        let mut encounter = resolver.start_encounter(&player, &enemy(), 1.0, 1.0);
        let neutral = ModifierRecord::neutral();
        let mut rng = rng();

        resolver.player_attack(&mut encounter, &neutral, &mut rng);
        let report = resolver.enemy_attack(&mut encounter, &neutral, &mut rng);
        assert_eq!(report.events.last(), Some(&CombatEvent::Defeat));
        assert_eq!(is_terminal(&encounter), Some(Outcome::Defeat));
        assert_eq!(encounter.player.current_health, 0);
    }

    #[test]
    fn test_retreat_success_and_failure() {
        let mut config = CombatConfig::default();
        config.retreat_chance = 1.0;
        let resolver = CombatResolver::new(config.clone());
        let mut encounter = resolver.start_encounter(&BaseStats::default(), &enemy(), 1.0, 1.0);
        let report = resolver.attempt_retreat(&mut encounter, &ModifierRecord::neutral(), &mut rng());
        assert_eq!(report.events, vec![CombatEvent::Retreated]);
        assert_eq!(is_terminal(&encounter), Some(Outcome::Retreated));

        config.retreat_chance = 0.0;
        let resolver = CombatResolver::new(config);
        let mut encounter = resolver.start_encounter(&BaseStats::default(), &enemy(), 1.0, 1.0);
        let report = resolver.attempt_retreat(&mut encounter, &ModifierRecord::neutral(), &mut rng());
        assert_eq!(report.events[0], CombatEvent::RetreatFailed);
        assert!(report.damage_by(Combatant::Enemy) >= 1);
        assert!(encounter.player_turn);
        assert_eq!(encounter.completed_rounds(), 1);
    }

    #[test]
    fn test_apply_dispatch() {
        let resolver = CombatResolver::default();
        let mut encounter = resolver.start_encounter(&BaseStats::default(), &enemy(), 1.0, 1.0);
        let neutral = ModifierRecord::neutral();
        let mut rng = rng();
        let report = resolver.apply(&mut encounter, CombatCommand::PlayerAttack, &neutral, &mut rng);
        assert_eq!(report.damage_by(Combatant::Player), 7);
        let report = resolver.apply(&mut encounter, CombatCommand::EnemyAttack, &neutral, &mut rng);
        assert_eq!(report.events.len(), 1);
    }
}

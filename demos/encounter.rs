//! Encounter demo: equip traits, aggregate them, and fight.
//!
//! This example demonstrates:
//! - Loading trait content
//! - Acquiring, equipping and promoting traits
//! - Aggregating modifiers with a per-trait breakdown
//! - Resolving a fight turn by turn

use rand::rngs::StdRng;
use rand::SeedableRng;
use trait_engine::*;

const CONTENT: &str = r#"{
    "keen_eye": {"name": "Keen Eye", "essenceCost": 25,
                 "effects": {"criticalChance": 0.2, "criticalDamage": 0.5}},
    "iron_skin": {"name": "Iron Skin", "essenceCost": 40,
                  "effects": [{"type": "defenseBonus", "magnitude": 0.4}]},
    "leech": {"name": "Leech", "essenceCost": 30, "effects": {"essenceSiphonChance": 0.5}}
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = TraitRegistry::load(CONTENT)?;
    let config = EngineConfig::default();
    let progress = ProgressContext::new().with_level(1);

    let mut traits = TraitSlotManager::new(&config);
    traits.grant_essence(200);
    for id in ["keen_eye", "iron_skin", "leech"] {
        traits.apply(TraitCommand::Acquire(id.into()), &registry, &progress)?;
    }
    traits.equip(&"keen_eye".into(), None)?;
    traits.equip(&"leech".into(), None)?;
    traits.promote(&"iron_skin".into(), &registry)?;
    println!("Essence left: {}", traits.essence());

    let breakdown = aggregate_with_breakdown(&traits.active_trait_ids(), &registry);
    println!("\n=== Modifiers ===");
    for (key, value) in breakdown.record.iter() {
        let sources: Vec<String> = breakdown
            .sources_of(key.as_str())
            .iter()
            .map(|(id, magnitude)| format!("{}={}", id, magnitude))
            .collect();
        println!("  {}: {:.2} [{}]", key, value, sources.join(", "));
    }

    let base = BaseStats::default();
    let derived = DerivedStats::from_base(&base, &breakdown.record);
    println!("\nAttack {} / Defense {}", derived.attack, derived.defense);

    let resolver = CombatResolver::new(config.combat.clone());
    let enemy = EnemyTemplate {
        name: "Cave Troll".into(),
        level: 3,
        health: 45,
        attack: 9,
        defense: 2,
        experience_reward: 40,
        gold_reward: 15,
    };
    let mut encounter = resolver.start_encounter(&base, &enemy, 1.2, 1.0);
    let mut rng = StdRng::seed_from_u64(2024);

    while is_terminal(&encounter).is_none() {
        let command = if encounter.player_turn {
            CombatCommand::PlayerAttack
        } else {
            CombatCommand::EnemyAttack
        };
        let report = resolver.apply(&mut encounter, command, &breakdown.record, &mut rng);
        traits.grant_essence(report.essence_siphoned());
    }

    println!("\n=== Combat Log ===");
    for entry in encounter.log() {
        println!("  [{:?}] {}", entry.kind, entry.message);
    }
    println!("\nOutcome after {} rounds: {:?}", encounter.completed_rounds(), encounter.outcome());
    println!("Essence now: {}", traits.essence());

    Ok(())
}

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;
use trait_engine::*;

const CONTENT: &str = r#"{
    "iron_skin": {
        "name": "Iron Skin",
        "description": "Hardened hide.",
        "category": "Defense",
        "rarity": "Uncommon",
        "essenceCost": 40,
        "effects": [{"type": "defenseBonus", "magnitude": 0.2}]
    },
    "keen_eye": {
        "name": "Keen Eye",
        "type": "Combat",
        "essenceCost": 25,
        "effects": {"criticalChance": 0.1, "criticalDamage": 0.5}
    },
    "scholar": {
        "name": "Scholar",
        "category": "Mind",
        "essenceCost": 60,
        "effects": {"xpMultiplier": 1.5},
        "requirements": {"level": 3}
    },
    "merchant_friend": {
        "name": "Merchant's Friend",
        "category": "Social",
        "essenceCost": 30,
        "effects": {"goldMultiplier": 2.0},
        "requirements": {"relationship": {"npcId": "tomas", "value": 20}}
    },
    "predator": {
        "name": "Predator",
        "category": "Combat",
        "rarity": "Epic",
        "essenceCost": 100,
        "effects": {"attackBonus": 0.15, "essenceSiphonChance": 0.25},
        "requirements": {"prerequisites": ["keen_eye"]}
    }
}"#;

fn registry() -> TraitRegistry {
    TraitRegistry::load(CONTENT).unwrap()
}

fn id(s: &str) -> TraitId {
    TraitId::new(s)
}

fn slime() -> EnemyTemplate {
    EnemyTemplate {
        name: "Slime".into(),
        level: 1,
        health: 50,
        attack: 5,
        defense: 3,
        experience_reward: 20,
        gold_reward: 7,
    }
}

/// Full lifecycle: discover, acquire, equip, promote, aggregate.
#[test]
fn test_trait_lifecycle() {
    let registry = registry();
    let config = EngineConfig::default();
    let progress = ProgressContext::new().with_level(3);
    let mut manager = TraitSlotManager::new(&config);
    manager.grant_essence(500);

    for trait_id in ["iron_skin", "keen_eye", "scholar"] {
        manager
            .apply(TraitCommand::Discover(id(trait_id)), &registry, &progress)
            .unwrap();
        manager
            .apply(TraitCommand::Acquire(id(trait_id)), &registry, &progress)
            .unwrap();
    }
    assert_eq!(manager.essence(), 500 - 40 - 25 - 60);

    assert_eq!(manager.equip(&id("iron_skin"), None), Ok(0));
    assert_eq!(manager.equip(&id("keen_eye"), None), Ok(1));
    assert_eq!(manager.equip(&id("scholar"), None), Err(TraitError::NoAvailableSlot));

    // promoting frees the slot for the next trait
    let promotion = manager.promote(&id("iron_skin"), &registry).unwrap();
    assert_eq!(promotion.cleared_slot, Some(0));
    assert_eq!(promotion.cost, 80);
    assert_eq!(manager.equip(&id("scholar"), None), Ok(0));

    let active = manager.active_trait_ids();
    assert_eq!(active.len(), 3);

    let modifiers = aggregate(&active, &registry);
    assert_eq!(modifiers.defense_bonus(), 0.2);
    assert_eq!(modifiers.critical_chance(), 0.1);
    assert_eq!(modifiers.xp_multiplier(), 1.5);
    assert_eq!(modifiers.gold_multiplier(), 1.0);
}

/// A permanent trait is counted once even if it was equipped before promotion.
#[test]
fn test_promotion_does_not_double_count() {
    let registry = registry();
    let progress = ProgressContext::new();
    let mut manager = TraitSlotManager::new(&EngineConfig::default());
    manager.grant_essence(1_000);
    manager.acquire(&id("keen_eye"), &registry, &progress).unwrap();
    manager.equip(&id("keen_eye"), None).unwrap();

    let before = aggregate(&manager.active_trait_ids(), &registry);
    manager.promote(&id("keen_eye"), &registry).unwrap();
    let after = aggregate(&manager.active_trait_ids(), &registry);

    assert_eq!(before, after);
}

#[test]
fn test_equip_unequip_round_trip() {
    let registry = registry();
    let mut manager = TraitSlotManager::new(&EngineConfig::default());
    manager.grant_essence(100);
    manager
        .acquire(&id("keen_eye"), &registry, &ProgressContext::new())
        .unwrap();

    let before = manager.snapshot();
    let slot = manager.equip(&id("keen_eye"), Some(1)).unwrap();
    assert_eq!(manager.unequip(&id("keen_eye")), Some(slot));
    assert_eq!(manager.snapshot(), before);
}

#[test]
fn test_acquisition_gating() {
    let registry = registry();
    let mut manager = TraitSlotManager::new(&EngineConfig::default());
    manager.grant_essence(1_000);

    let stranger = ProgressContext::new();
    assert!(matches!(
        manager.acquire(&id("merchant_friend"), &registry, &stranger),
        Err(TraitError::RequirementNotMet { .. })
    ));
    let friend = ProgressContext::new().with_relationship("tomas", 25);
    assert_eq!(manager.acquire(&id("merchant_friend"), &registry, &friend), Ok(30));

    assert!(matches!(
        manager.acquire(&id("predator"), &registry, &friend),
        Err(TraitError::RequirementNotMet { .. })
    ));
    assert_eq!(
        registry.prerequisite_chain(&id("predator")).unwrap(),
        vec![id("keen_eye")]
    );
    manager.acquire(&id("keen_eye"), &registry, &friend).unwrap();
    assert_eq!(manager.acquire(&id("predator"), &registry, &friend), Ok(100));
}

#[test]
fn test_slot_unlock_progression() {
    let mut manager = TraitSlotManager::new(&EngineConfig::default());
    let unlocked = |m: &TraitSlotManager| m.slots().iter().filter(|s| s.is_unlocked).count();
    assert_eq!(unlocked(&manager), 2);

    let progress = ProgressContext::new().with_level(10);
    assert_eq!(manager.refresh_unlocks(&progress), vec![2, 3]);

    let progress = progress.with_total_essence_earned(1_000);
    assert_eq!(manager.refresh_unlocks(&progress), vec![5]);
    assert_eq!(unlocked(&manager), 5);

    assert_eq!(manager.unlock_slot(4), Ok(true));
    assert_eq!(manager.unlock_slot(4), Ok(false));
}

#[test]
fn test_list_and_map_effects_aggregate_identically() {
    let list = TraitRegistry::load(
        r#"{"t": {"name": "T", "effects": [
            {"type": "attackBonus", "magnitude": 0.25},
            {"type": "goldMultiplier", "magnitude": 1.2},
            {"type": "stealth", "magnitude": 3}
        ]}}"#,
    )
    .unwrap();
    let map = TraitRegistry::load(
        r#"{"t": {"name": "T", "effects": {"attackBonus": 0.25, "goldMultiplier": 1.2, "stealth": 3}}}"#,
    )
    .unwrap();
    let active: BTreeSet<TraitId> = [id("t")].into_iter().collect();
    assert_eq!(aggregate(&active, &list), aggregate(&active, &map));
}

#[test]
fn test_empty_aggregation_is_neutral() {
    let record = aggregate(&BTreeSet::new(), &registry());
    assert_eq!(record.attack_bonus(), 0.0);
    assert_eq!(record.essence_siphon_chance(), 0.0);
    assert_eq!(record.xp_multiplier(), 1.0);
    assert_eq!(record.gold_multiplier(), 1.0);
}

/// Player 10/5 vs enemy 5/3 with 50 health and no bonuses.
#[test]
fn test_reference_encounter() {
    let resolver = CombatResolver::default();
    let player = BaseStats::default();
    let mut encounter = resolver.start_encounter(&player, &slime(), 1.0, 1.0);
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let neutral = ModifierRecord::neutral();

    resolver.player_attack(&mut encounter, &neutral, &mut rng);
    assert_eq!(encounter.enemy.current_health, 43);

    let report = resolver.enemy_attack(&mut encounter, &neutral, &mut rng);
    let taken = report.damage_by(Combatant::Enemy);
    assert!((1..=3).contains(&taken));
    assert_eq!(is_terminal(&encounter), None);
}

#[test]
fn test_minimum_damage_against_huge_defense() {
    let resolver = CombatResolver::default();
    let mut fortress = slime();
    fortress.defense = 10_000;
    fortress.attack = 0;
    let mut encounter = resolver.start_encounter(&BaseStats::default(), &fortress, 1.0, 1.0);
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let neutral = ModifierRecord::neutral();

    for _ in 0..20 {
        let report = resolver.player_attack(&mut encounter, &neutral, &mut rng);
        assert_eq!(report.damage_by(Combatant::Player), 1);
        let report = resolver.enemy_attack(&mut encounter, &neutral, &mut rng);
        assert!(report.damage_by(Combatant::Enemy) >= 1);
    }
}

#[test]
fn test_rewards_scale_linearly() {
    let resolver = CombatResolver::default();
    let mut weak = slime();
    weak.health = 1;

    let rewards_for = |xp: f64, gold: f64| {
        let mut encounter = resolver.start_encounter(&BaseStats::default(), &weak, 1.0, 1.0);
        let mut modifiers = ModifierRecord::neutral();
        modifiers.set("xpMultiplier", xp).set("goldMultiplier", gold);
        resolver
            .player_attack(&mut encounter, &modifiers, &mut ChaCha8Rng::seed_from_u64(0))
            .rewards()
            .unwrap()
    };

    let base = rewards_for(1.0, 1.0);
    let doubled = rewards_for(2.0, 2.0);
    assert_eq!(doubled.experience, base.experience * 2);
    assert_eq!(doubled.gold, base.gold * 2);
}

/// Traits flow through aggregation into a full fight to completion.
#[test]
fn test_fight_to_completion_with_traits() {
    let registry = registry();
    let mut manager = TraitSlotManager::new(&EngineConfig::default());
    manager.grant_essence(1_000);
    let progress = ProgressContext::new();
    manager.acquire(&id("keen_eye"), &registry, &progress).unwrap();
    manager.acquire(&id("predator"), &registry, &progress).unwrap();
    manager.equip(&id("keen_eye"), None).unwrap();
    manager.equip(&id("predator"), None).unwrap();

    let modifiers = aggregate(&manager.active_trait_ids(), &registry);
    let resolver = CombatResolver::default();
    let mut encounter = resolver.start_encounter(&BaseStats::default(), &slime(), 1.2, 1.0);
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    let mut siphoned = 0;
    while is_terminal(&encounter).is_none() {
        let command = if encounter.player_turn {
            CombatCommand::PlayerAttack
        } else {
            CombatCommand::EnemyAttack
        };
        let report = resolver.apply(&mut encounter, command, &modifiers, &mut rng);
        siphoned += report.essence_siphoned();
        assert!(encounter.round() < 100.0, "fight did not terminate");
    }
    manager.grant_essence(siphoned);

    // 11 attack vs 3 defense; the enemy deals at most 3 per hit
    assert!(matches!(is_terminal(&encounter), Some(Outcome::Victory(_))));
    assert!(!encounter.active);
    assert!(encounter.log().len() > 2);
}

#[test]
fn test_snapshot_serializes() {
    let registry = registry();
    let mut manager = TraitSlotManager::new(&EngineConfig::default());
    manager.grant_essence(50);
    manager
        .acquire(&id("keen_eye"), &registry, &ProgressContext::new())
        .unwrap();
    manager.equip(&id("keen_eye"), None).unwrap();

    let json = serde_json::to_string(&manager.snapshot()).unwrap();
    let state: TraitState = serde_json::from_str(&json).unwrap();
    let restored = TraitSlotManager::from_state(state, &EngineConfig::default());
    assert_eq!(restored.snapshot(), manager.snapshot());
}

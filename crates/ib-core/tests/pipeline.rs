//! End-to-end resolution scenarios driven through the public entry points.

use ib_core::combat::{AttackPlan, CombatEvent, Weapon, WeaponTraits, hit_chance};
use ib_core::creature::{
    BehaviorFlags, ConditionKind, KindFlags, LinkedUniqueGroup, ResistFlags, Species, SpeciesId,
};
use ib_core::effect::{AttributeTag, EffectEnvelope, EffectSource, project_effect};
use ib_core::errors::EngineError;
use ib_core::{World, apply_damage, resolve_melee};
use ib_rng::{Dice, GameRng, RandomSource, ScriptedRng};

fn world_with(species: Species, maxhp: i32) -> (World, ib_core::creature::CreatureHandle) {
    let mut world = World::new();
    let id = world.species.add(species);
    let handle = world.spawn(id, maxhp, 5, 5).unwrap();
    (world, handle)
}

#[test]
fn full_resistance_always_shapes_damage() {
    for seed in 0..50u64 {
        let mut species = Species::stub(SpeciesId(0), "greater wall monster", 30, 40);
        species.resists = ResistFlags::ALL;
        let (mut world, handle) = world_with(species, 1_000_000);
        let mut rng = GameRng::new(seed);
        let d = 150 + rng.rn2(5000) as i32;
        let out = apply_damage(&mut world, handle, d, EffectSource::Player, &mut rng).unwrap();
        // Exactly the quotient, never the raw amount (d >= 150 means the
        // 1-point floor never applies here).
        assert_eq!(out.damage_dealt, d / 100, "seed {seed}");
    }
}

#[test]
fn slay_scenario_two_d6_against_matching_race() {
    let mut species = Species::stub(SpeciesId(0), "dire wolf", 8, 20);
    species.kind = KindFlags::ANIMAL;
    let (mut world, handle) = world_with(species, 100);

    let weapon = Weapon::new("hunting spear", Dice::plain(2, 6), 0, 0)
        .with_traits(WeaponTraits::SLAY_ANIMAL);
    let plan = AttackPlan::new(1, 100, weapon);
    // Hit roll, then 2d6 scripted to 4 and 5: 9 * 25 / 10 = 22.
    let mut rng = ScriptedRng::new([50, 3, 4]);
    let out = resolve_melee(&mut world, EffectSource::Player, handle, &plan, &mut rng).unwrap();
    assert_eq!(out.damage_dealt, 22);
    assert_eq!(world.arena.get(handle).unwrap().hp, 78);
}

#[test]
fn accuracy_sixty_versus_ac_twenty_is_seventy_two() {
    assert_eq!(hit_chance(60, 20), 72);

    let species = Species::stub(SpeciesId(0), "gnoll", 5, 20);
    let (mut world, handle) = world_with(species, 100);
    let plan = AttackPlan::new(1, 60, Weapon::new("staff", Dice::plain(1, 4), 0, 0));
    // Percentile 72 connects, 73 does not.
    let mut rng = ScriptedRng::new([71, 2]);
    let out = resolve_melee(&mut world, EffectSource::Player, handle, &plan, &mut rng).unwrap();
    assert!(out.events.iter().any(|e| matches!(e, CombatEvent::Hit { .. })));
    let mut rng = ScriptedRng::new([72]);
    let out = resolve_melee(&mut world, EffectSource::Player, handle, &plan, &mut rng).unwrap();
    assert!(out.has(CombatEvent::Miss));
}

#[test]
fn second_kill_of_same_creature_is_rejected() {
    let species = Species::stub(SpeciesId(0), "rock lizard", 1, 4);
    let (mut world, handle) = world_with(species, 5);
    let mut rng = GameRng::new(1);
    let out = apply_damage(&mut world, handle, 100, EffectSource::Player, &mut rng).unwrap();
    assert!(out.death);
    let before = world.player.experience.points;
    // The handle went stale with the death; a replay cannot double-award.
    assert_eq!(
        apply_damage(&mut world, handle, 100, EffectSource::Player, &mut rng),
        Err(EngineError::StaleHandle(handle))
    );
    assert_eq!(world.player.experience.points, before);
}

#[test]
fn quasi_unique_survives_monster_damage_at_one_hp() {
    let mut species = Species::stub(SpeciesId(0), "the witch king", 50, 70);
    species.behavior = BehaviorFlags::UNIQUE | BehaviorFlags::NAZGUL;
    let (mut world, handle) = world_with(species, 200);
    let other = ib_core::creature::CreatureHandle { index: 77, generation: 0 };
    let mut rng = GameRng::new(3);
    for _ in 0..5 {
        apply_damage(&mut world, handle, 10_000, EffectSource::Monster(other), &mut rng).unwrap();
        let hp = world.arena.get(handle).unwrap().hp;
        assert!(hp >= 1, "hp went to {hp} from a non-player source");
    }
}

#[test]
fn status_reapplication_never_shortens() {
    let species = Species::stub(SpeciesId(0), "novice mage", 2, 10);
    let (mut world, handle) = world_with(species, 100);
    let envelope = EffectEnvelope::player_bolt(AttributeTag::Confusion, 200, (5, 5));
    let mut rng = GameRng::new(9);
    let mut last = 0u16;
    for _ in 0..6 {
        project_effect(&mut world, &envelope, &mut rng).unwrap();
        let now = world
            .arena
            .get(handle)
            .unwrap()
            .conditions
            .get(ConditionKind::Confusion);
        assert!(now >= last, "duration shrank from {last} to {now}");
        last = now;
    }
    // A level-2 target cannot keep saving against damage-200 bolts
    // forever; the counter must actually have grown.
    assert!(last > 0);
}

#[test]
fn linked_triple_resolves_together_through_melee() {
    let mut world = World::new();
    let fused = world.species.add({
        let mut s = Species::stub(SpeciesId(0), "vehlor the whole", 45, 70);
        s.behavior = BehaviorFlags::UNIQUE;
        s
    });
    let shadow = world.species.add({
        let mut s = Species::stub(SpeciesId(0), "vehlor's shadow", 35, 50);
        s.behavior = BehaviorFlags::UNIQUE;
        s
    });
    let flame = world.species.add({
        let mut s = Species::stub(SpeciesId(0), "vehlor's flame", 35, 50);
        s.behavior = BehaviorFlags::UNIQUE;
        s
    });
    world.linked_uniques.push(LinkedUniqueGroup { fused, halves: [shadow, flame] });

    let target = world.spawn(fused, 10, 5, 5).unwrap();
    let bystander = world.spawn(flame, 120, 9, 9).unwrap();

    let plan = AttackPlan::new(2, 200, Weapon::new("greatsword", Dice::new(0, 0, 60), 0, 0));
    let mut rng = ScriptedRng::new([50]);
    let out = resolve_melee(&mut world, EffectSource::Player, target, &plan, &mut rng).unwrap();
    assert!(out.death);
    assert!(!world.arena.is_live(target));
    assert!(!world.arena.is_live(bystander));
    for id in [fused, shadow, flame] {
        assert_eq!(world.lore.kills(id), 1);
    }
}

#[test]
fn cornered_low_hp_monster_breaks_and_runs() {
    let species = Species::stub(SpeciesId(0), "cave bear", 12, 20);
    let (mut world, handle) = world_with(species, 100);
    world.arena.get_mut(handle).unwrap().hp = 5;
    // 2 damage leaves 3 hp (3%): the low-hp fear table rolls 9 >= 3,
    // then a 7-turn duration.
    let mut rng = ScriptedRng::new([8, 6]);
    let out = apply_damage(&mut world, handle, 2, EffectSource::Player, &mut rng).unwrap();
    assert!(out.fear);
    assert!(out.has(CombatEvent::Flees));
    assert!(world.arena.get(handle).unwrap().is_fleeing());
}

#[test]
fn debug_attribute_ignores_the_umbrella() {
    let mut species = Species::stub(SpeciesId(0), "prism golem", 25, 60);
    species.resists = ResistFlags::ALL;
    let (mut world, handle) = world_with(species, 500);
    let mut rng = GameRng::new(4);

    let blocked = EffectEnvelope::player_bolt(AttributeTag::Chaos, 120, (5, 5));
    let out = project_effect(&mut world, &blocked, &mut rng).unwrap();
    assert!(out.has(CombatEvent::NoEffect));
    assert_eq!(world.arena.get(handle).unwrap().hp, 500);

    let allowed = EffectEnvelope::player_bolt(AttributeTag::Debug, 120, (5, 5));
    let out = project_effect(&mut world, &allowed, &mut rng).unwrap();
    assert_eq!(out.damage_dealt, 120);
    assert_eq!(world.arena.get(handle).unwrap().hp, 380);
}

#[test]
fn conditions_decay_and_report_recovery() {
    let species = Species::stub(SpeciesId(0), "soldier ant", 2, 12);
    let (mut world, handle) = world_with(species, 30);
    let creature = world.arena.get_mut(handle).unwrap();
    creature.conditions.add(ConditionKind::Stun, 2);
    creature.conditions.add(ConditionKind::Haste, 5);

    assert!(creature.conditions.tick().is_empty());
    assert_eq!(creature.conditions.tick(), vec![ConditionKind::Stun]);
    assert_eq!(creature.conditions.get(ConditionKind::Haste), 3);
}

#[test]
fn experience_accumulates_across_fractional_kills() {
    // Kills whose award carries a fraction must not leak it: the ledger
    // total equals the sum of whole points plus carried remainders.
    let species = Species::stub(SpeciesId(0), "giant frog", 7, 10);
    let mut world = World::new();
    let id = world.species.add(species);
    let mut rng = GameRng::new(6);
    let mut reported = 0u64;
    for i in 0..9 {
        let handle = world.spawn(id, 20, i, 0).unwrap();
        let out = apply_damage(&mut world, handle, 999, EffectSource::Player, &mut rng).unwrap();
        reported += out.experience as u64;
    }
    let banked = world.player.experience.points;
    // The ledger reports exactly what it banks, fraction carried.
    assert_eq!(banked, reported);
    // level 7 * base 10 / 3 = 23.33 per kill; nine kills floor to 209.
    assert_eq!(banked, 209);
}

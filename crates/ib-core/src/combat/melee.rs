//! The melee blow sequencer.
//!
//! Drives the blows of one direct attack, re-running accuracy, damage and
//! status work per blow and stopping early when the defender dies, breaks
//! and runs, or is no longer there to hit.

use ib_rng::RandomSource;
use serde::{Deserialize, Serialize};

use super::accuracy::{bypass_hit, monster_hits_monster, monster_hits_player, player_hits_monster};
use super::damage::{Weapon, melee_damage};
use super::status::{apply_status_monster, apply_status_player, status_duration};
use super::{CombatEvent, Outcome};
use crate::creature::{AuraFlags, ConditionKind, CreatureHandle};
use crate::death::apply_damage_raw;
use crate::effect::{AttributeTag, EffectSource, aura_retaliation, elemental_adjust};
use crate::errors::EngineError;
use crate::world::World;

/// How hits are decided for a melee plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackMode {
    /// The closed-form accuracy formula.
    Normal,
    /// Called-shot techniques: skip the formula, land 1-in-`chance`.
    VitalStrike { chance: u32 },
}

/// One planned melee attack: who swings what, how often, and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackPlan {
    pub blows: u8,
    pub accuracy: i32,
    pub weapon: Weapon,
    pub mode: AttackMode,
    pub defender_visible: bool,
}

impl AttackPlan {
    pub fn new(blows: u8, accuracy: i32, weapon: Weapon) -> Self {
        Self {
            blows,
            accuracy,
            weapon,
            mode: AttackMode::Normal,
            defender_visible: true,
        }
    }

    pub fn with_mode(mut self, mode: AttackMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Per-blow scratch. Built fresh for each blow, discarded with it.
#[derive(Debug)]
pub struct AttackContext<'a> {
    pub weapon: &'a Weapon,
    pub blow: u8,
    pub ambush: bool,
    pub damage: i32,
}

impl<'a> AttackContext<'a> {
    fn for_blow(plan: &'a AttackPlan, blow: u8, ambush: bool) -> Self {
        Self {
            weapon: &plan.weapon,
            blow,
            ambush,
            damage: 0,
        }
    }
}

/// Resolve a full weapon attack against a monster.
///
/// `attacker` attributes the damage for the death rules; pass
/// [`EffectSource::Player`] for the player's own swings.
pub fn resolve_melee(
    world: &mut World,
    attacker: EffectSource,
    defender: CreatureHandle,
    plan: &AttackPlan,
    rng: &mut dyn RandomSource,
) -> Result<Outcome, EngineError> {
    if plan.blows == 0 {
        return Err(EngineError::EmptyAttack);
    }

    let mut out = Outcome::default();
    if attacker == EffectSource::Player
        && world.options.forbid_peaceful
        && world.arena.get(defender)?.peaceful
    {
        out.push(CombatEvent::AttackRefused);
        return Ok(out);
    }
    for blow in 0..plan.blows {
        if !world.arena.is_live(defender) {
            break;
        }
        let species = world.species_of(defender)?.clone();
        let (defender_hp, ambush) = {
            let creature = world.arena.get(defender)?;
            (creature.hp, creature.is_asleep())
        };

        // A stunned attacker has the same flat 50% auto-miss as stunned
        // monsters, before any hit formula.
        if attacker == EffectSource::Player && world.player.is_stunned() && rng.one_in(2) {
            out.push(CombatEvent::Miss);
            continue;
        }
        let hit = match plan.mode {
            AttackMode::Normal => player_hits_monster(
                plan.accuracy,
                species.ac as i32,
                plan.defender_visible,
                rng,
            ),
            AttackMode::VitalStrike { chance } => bypass_hit(chance, rng),
        };
        if !hit {
            out.push(CombatEvent::Miss);
            continue;
        }

        let mut ctx = AttackContext::for_blow(plan, blow, ambush);
        ctx.damage = melee_damage(
            ctx.weapon,
            &species,
            defender_hp,
            ctx.ambush,
            true,
            rng,
            &mut out,
        )?;
        let events_at = out.events.len();

        {
            let creature = world.arena.get_mut(defender)?;
            if ctx.ambush {
                creature.conditions.dispel(ConditionKind::Sleep);
                out.push(CombatEvent::WakesUp);
            }
            if creature.peaceful || creature.is_pet {
                creature.anger();
                out.push(CombatEvent::Angered);
            }
        }

        // The hit event reports what actually landed after the damage
        // processor's shaping, not the pre-mitigation roll.
        let dealt_before = out.damage_dealt;
        apply_damage_raw(world, defender, ctx.damage, attacker, false, rng, &mut out)?;
        let landed = out.damage_dealt - dealt_before;
        if landed > 0 {
            out.events.insert(events_at, CombatEvent::Hit { damage: landed });
        }
        if out.death || !world.arena.is_live(defender) {
            break;
        }

        // Contact exposes the attacker to the defender's auras.
        aura_retaliation(world, defender, attacker, rng, &mut out)?;

        if out.fear || out.has(CombatEvent::Teleported) {
            break;
        }
    }

    world.lore.record_all(&out.lore);
    Ok(out)
}

/// Run a monster's natural blow table against the player.
pub fn monster_attack_player(
    world: &mut World,
    attacker: CreatureHandle,
    rng: &mut dyn RandomSource,
) -> Result<Outcome, EngineError> {
    let mut out = Outcome::default();
    let species = world.species_of(attacker)?.clone();

    for blow in species.blows.iter().filter(|b| b.is_active()) {
        if !world.arena.is_live(attacker) {
            break;
        }
        if !blow.dice.is_valid() {
            return Err(EngineError::DegenerateDice {
                num: blow.dice.num,
                sides: blow.dice.sides,
            });
        }

        let stunned = world.arena.get(attacker)?.is_stunned();
        if !monster_hits_player(
            blow.effect.base_power(),
            species.level,
            stunned,
            world.player.ac,
            rng,
        ) {
            out.push(CombatEvent::Miss);
            continue;
        }

        let damage = blow.dice.roll(rng).max(0);
        world.player.hp -= damage;
        out.damage_dealt += damage;
        out.push(CombatEvent::PlayerHit { damage });

        if let Some(kind) = blow.effect.condition() {
            let duration = status_duration(damage, rng);
            let save = world.player.save_skill;
            apply_status_player(
                &mut world.player.conditions,
                save,
                kind,
                duration,
                species.level,
                rng,
                &mut out,
            );
        }

        if blow.method.makes_contact() && !world.player.auras.is_empty() {
            player_aura_retaliation(world, attacker, rng, &mut out)?;
        }
    }

    world.lore.record_all(&out.lore);
    Ok(out)
}

/// Run a monster's natural blow table against another monster.
pub fn monster_attack_monster(
    world: &mut World,
    attacker: CreatureHandle,
    defender: CreatureHandle,
    rng: &mut dyn RandomSource,
) -> Result<Outcome, EngineError> {
    let mut out = Outcome::default();
    let atk_species = world.species_of(attacker)?.clone();

    for blow in atk_species.blows.iter().filter(|b| b.is_active()) {
        if !world.arena.is_live(attacker) || !world.arena.is_live(defender) {
            break;
        }
        if !blow.dice.is_valid() {
            return Err(EngineError::DegenerateDice {
                num: blow.dice.num,
                sides: blow.dice.sides,
            });
        }

        let def_species = world.species_of(defender)?.clone();
        let stunned = world.arena.get(attacker)?.is_stunned();
        if !monster_hits_monster(
            blow.effect.base_power(),
            atk_species.level,
            stunned,
            def_species.ac as i32,
            rng,
        ) {
            out.push(CombatEvent::Miss);
            continue;
        }

        let mut damage = blow.dice.roll(rng).max(0);
        if let Some(attr) = blow.effect.attribute() {
            damage = elemental_adjust(world, defender, attr, damage, false, &mut out)?;
        }
        let events_at = out.events.len();

        if let Some(kind) = blow.effect.condition() {
            let duration = status_duration(damage, rng);
            let creature = world.arena.get_mut(defender)?;
            apply_status_monster(
                creature,
                &def_species,
                kind,
                duration,
                atk_species.level,
                rng,
                &mut out,
            );
        }

        let dealt_before = out.damage_dealt;
        apply_damage_raw(
            world,
            defender,
            damage,
            EffectSource::Monster(attacker),
            false,
            rng,
            &mut out,
        )?;
        let landed = out.damage_dealt - dealt_before;
        if landed > 0 {
            out.events.insert(events_at, CombatEvent::Hit { damage: landed });
        }
        if out.death || !world.arena.is_live(defender) {
            break;
        }

        if blow.method.makes_contact() {
            aura_retaliation(world, defender, EffectSource::Monster(attacker), rng, &mut out)?;
        }

        if out.fear || out.has(CombatEvent::Teleported) {
            break;
        }
    }

    world.lore.record_all(&out.lore);
    Ok(out)
}

/// The player's own retributive auras, burning a monster that made
/// physical contact.
fn player_aura_retaliation(
    world: &mut World,
    toucher: CreatureHandle,
    rng: &mut dyn RandomSource,
    out: &mut Outcome,
) -> Result<(), EngineError> {
    for (flag, attr) in [
        (AuraFlags::FIRE, AttributeTag::Fire),
        (AuraFlags::COLD, AttributeTag::Cold),
        (AuraFlags::ELEC, AttributeTag::Elec),
    ] {
        if !world.player.auras.contains(flag) || !world.arena.is_live(toucher) {
            continue;
        }
        let dam = World::aura_dice(world.player.level).roll(rng).max(1);
        let dam = elemental_adjust(world, toucher, attr, dam, true, out)?;
        out.push(CombatEvent::AuraRetaliation { damage: dam });
        apply_damage_raw(world, toucher, dam, EffectSource::Player, false, rng, out)?;
    }
    Ok(())
}

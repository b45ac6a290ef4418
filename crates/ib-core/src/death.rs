//! Monster damage processing and death resolution.
//!
//! One pipeline for every damage amount, whatever produced it: an
//! invulnerability short-circuit, full-resistance damage shaping, the hp
//! subtraction, the quasi-unique death veto, then either death (lore,
//! special behavior, experience, removal, in that order) or the fear roll.

use ib_rng::RandomSource;

use crate::combat::{CombatEvent, Outcome, shape_full_resist};
use crate::consts::{
    BREEDER_EXP_DIVISOR_CAP, NEAR_DEATH_FEAR_BONUS, NEAR_DEATH_FEAR_PCT,
    PENETRATE_INVULN_CHANCE, SPEED_NORMAL,
};
use crate::creature::{
    BehaviorFlags, ConditionKind, CreatureHandle, DeathSpecial, ImmuneFlags, LoreEvent,
    ResistFlags, Species, SpeciesId,
};
use crate::effect::{EffectEnvelope, EffectSource, ProjectFlags, project_effect_raw};
use crate::errors::EngineError;
use crate::world::{DiaryNote, World};

/// Apply a damage amount to a monster and resolve the consequences.
///
/// This is the public entry point used by the aura and death-cascade
/// subsystems and by anything outside the core that already has a damage
/// number. Melee and projection call the same pipeline internally.
pub fn apply_damage(
    world: &mut World,
    target: CreatureHandle,
    amount: i32,
    source: EffectSource,
    rng: &mut dyn RandomSource,
) -> Result<Outcome, EngineError> {
    let mut out = Outcome::default();
    apply_damage_raw(world, target, amount, source, false, rng, &mut out)?;
    world.lore.record_all(&out.lore);
    Ok(out)
}

/// The damage pipeline proper. Lore observations accumulate in `out` and
/// are recorded by the public entry point that started the pass.
///
/// `penetrates` marks damage types designated to punch through both the
/// invulnerability globe and the full-resistance shaping.
pub(crate) fn apply_damage_raw(
    world: &mut World,
    target: CreatureHandle,
    amount: i32,
    source: EffectSource,
    penetrates: bool,
    rng: &mut dyn RandomSource,
    out: &mut Outcome,
) -> Result<(), EngineError> {
    let creature = world.arena.get(target)?;
    if creature.dead {
        return Err(EngineError::AlreadyDead(target));
    }
    let species = world.species.get(creature.species)?.clone();

    // Invulnerability globe: most damage bounces; a rare roll (or a
    // designated penetrating type) gets through.
    if creature.is_invulnerable() && !penetrates && !rng.one_in(PENETRATE_INVULN_CHANCE) {
        out.push(CombatEvent::Unharmed);
        return Ok(());
    }

    let mut amount = amount.max(0);
    if species.resists.contains(ResistFlags::ALL) && !penetrates {
        amount = shape_full_resist(amount, rng);
        if amount == 0 {
            out.push(CombatEvent::Unharmed);
            return Ok(());
        }
        out.push(CombatEvent::Resists);
    }

    {
        let creature = world.arena.get_mut(target)?;
        // Overkill past the remaining hp does not count toward the
        // chip-damage ledger; only damage that "landed on flesh" does.
        let counted = amount.min(creature.hp.max(0));
        creature.hp -= amount;
        creature.dealt_damage = creature.dealt_damage.saturating_add(counted as u32);
    }
    out.damage_dealt += amount;

    let creature = world.arena.get(target)?;
    if creature.hp < 0 {
        // Quasi-uniques only die at the player's own hand, unless the
        // arena override is on. Anything else leaves them at 1 hp.
        let vetoed = species.behavior.is_quasi_unique()
            && source != EffectSource::Player
            && !world.options.arena_mode;
        if vetoed {
            world.arena.get_mut(target)?.hp = 1;
        } else {
            return resolve_death(world, target, &species, source, rng, out);
        }
    }

    fear_roll(world, target, &species, amount, rng, out)
}

/// Post-damage fear: a fleeing creature may recover its nerve in
/// proportion to damage taken; otherwise low hit points or a near-death
/// flinch can break it.
fn fear_roll(
    world: &mut World,
    target: CreatureHandle,
    species: &Species,
    amount: i32,
    rng: &mut dyn RandomSource,
    out: &mut Outcome,
) -> Result<(), EngineError> {
    let creature = world.arena.get_mut(target)?;

    if creature.is_fleeing() {
        if amount > 0 {
            let recover = rng.rnd((amount / 4).max(1) as u32) as u16;
            if creature.conditions.reduce(ConditionKind::Fear, recover) {
                out.push(CombatEvent::RecoversCourage);
            }
        }
        out.fear = creature.is_fleeing();
        return Ok(());
    }

    if species.immune.contains(ImmuneFlags::FEAR) || amount <= 0 {
        return Ok(());
    }

    let percent = creature.hp_percent();
    let duration = if amount >= creature.hp && rng.rn2(100) < NEAR_DEATH_FEAR_PCT {
        // The blow alone would have finished it: near-death flinch.
        rng.rnd(10) as u16 + NEAR_DEATH_FEAR_BONUS
    } else if percent < 11 && rng.rnd(10) as i32 >= percent {
        rng.rnd(10) as u16
    } else {
        return Ok(());
    };

    creature.conditions.add(ConditionKind::Fear, duration);
    out.fear = true;
    out.push(CombatEvent::Flees);
    Ok(())
}

/// An accepted death. Order matters: lore counters, then special death
/// behavior, then experience, then removal; the cascade and any corpse
/// burst run against the world the removal leaves behind.
fn resolve_death(
    world: &mut World,
    target: CreatureHandle,
    species: &Species,
    source: EffectSource,
    rng: &mut dyn RandomSource,
    out: &mut Outcome,
) -> Result<(), EngineError> {
    // Self-resurrection pre-empts everything else.
    if let DeathSpecial::Resurrect { chance } = species.death_special {
        if rng.one_in(chance.max(1)) {
            let creature = world.arena.get_mut(target)?;
            creature.hp = (creature.maxhp / 2).max(1);
            out.push(CombatEvent::Revives);
            return Ok(());
        }
    }

    let (corpse_cell, dealt_damage, max_maxhp, apparent, was_pet) = {
        let creature = world.arena.get_mut(target)?;
        creature.dead = true;
        (
            (creature.x, creature.y),
            creature.dealt_damage,
            creature.max_maxhp,
            creature.apparent_species,
            creature.is_pet,
        )
    };

    out.death = true;
    out.push(CombatEvent::Dies);

    if source == EffectSource::Player {
        out.observe(LoreEvent::Killed(species.id));
        if apparent != species.id {
            // Disguised shapeshifter: the player also "saw" the mask.
            out.observe(LoreEvent::Sighted(apparent));
        }
        let q = experience_q16(
            species,
            world.player.level,
            world.lore.kills(species.id),
            dealt_damage,
            max_maxhp,
        );
        out.experience += world.player.experience.award_q16(q);
    }

    if species.behavior.is_quasi_unique() {
        world.note(DiaryNote::UniqueDefeated(species.id));
    }
    if was_pet {
        world.note(DiaryNote::PetKilled(species.id));
    }

    world.arena.remove(target)?;

    match species.death_special {
        DeathSpecial::Explode { attr, dice, radius } => {
            let envelope = EffectEnvelope {
                source: EffectSource::Indirect(source.monster()),
                radius,
                target: corpse_cell,
                damage: dice.roll(rng).max(0),
                attr,
                flags: ProjectFlags::NO_COUNTER,
                visible: true,
            };
            project_effect_raw(world, &envelope, rng, out)?;
        }
        DeathSpecial::Summon { species: kin, count } => {
            let level = world.species.get(kin)?.level;
            for i in 0..count {
                let maxhp = rng.dice(level.max(1) as u32, 8) as i32;
                let (x, y) = corpse_cell;
                world.spawn(kin, maxhp, x.wrapping_add(i as i8 + 1), y)?;
            }
        }
        DeathSpecial::None | DeathSpecial::Resurrect { .. } => {}
    }

    cascade_linked_uniques(world, species.id, source, out)
}

/// Linked split/merge uniques: defeating any member of a fused triple
/// resolves all three to defeated bookkeeping state. Live creatures of the
/// other member species die without a second experience award, and kill
/// counters follow the same player-only crediting rule as the primary
/// death.
fn cascade_linked_uniques(
    world: &mut World,
    died: SpeciesId,
    source: EffectSource,
    out: &mut Outcome,
) -> Result<(), EngineError> {
    let Some(group) = world
        .linked_uniques
        .iter()
        .find(|g| g.contains(died))
        .copied()
    else {
        return Ok(());
    };

    let credited = source == EffectSource::Player;
    for member in group.members() {
        if credited {
            out.observe(LoreEvent::Killed(member));
        }
        if member == died {
            continue;
        }
        let doomed: Vec<CreatureHandle> = world
            .arena
            .iter()
            .filter(|(_, c)| c.species == member && !c.dead)
            .map(|(h, _)| h)
            .collect();
        for handle in doomed {
            world.arena.get_mut(handle)?.dead = true;
            out.push(CombatEvent::Dies);
            world.arena.remove(handle)?;
        }
        world.note(DiaryNote::UniqueDefeated(member));
    }
    // The kill of the dying member itself was already credited by the
    // death path; drop the duplicate the loop above added.
    if credited {
        if let Some(pos) = out
            .lore
            .iter()
            .rposition(|e| *e == LoreEvent::Killed(died))
        {
            out.lore.remove(pos);
        }
    }
    Ok(())
}

/// Experience for a kill, in Q16.16 fixed point.
///
/// `level * base_exp`, scaled by the species speed, divided by the player
/// level curve, then penalized for breeders (per prior kill) and for
/// chip damage far beyond the creature's hp ceiling.
fn experience_q16(
    species: &Species,
    player_level: u8,
    prior_kills: u32,
    dealt_damage: u32,
    max_maxhp: i32,
) -> u64 {
    let level = species.level.max(1) as u64;
    let base = species.base_exp as u64;
    let mut q = (level * base) << 16;

    let speed_pct =
        (100 + (species.speed as i64 - SPEED_NORMAL as i64) * 10).clamp(10, 300) as u64;
    q = q * speed_pct / 100;

    q /= player_level as u64 + 2;

    if species.behavior.contains(BehaviorFlags::MULTIPLY) {
        q /= ((1 + prior_kills) as u64).min(BREEDER_EXP_DIVISOR_CAP as u64);
    }

    // Chip-damage penalty: halve per full hp-ceiling of damage ever dealt
    // beyond the first. Blunts "rest and shoot" farming of regenerators.
    let over = (dealt_damage / max_maxhp.max(1) as u32).saturating_sub(1).min(63);
    q >> over
}

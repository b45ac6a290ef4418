//! Attribute dispatch for projected effects.
//!
//! A registered handler table maps [`AttributeTag`] to behavior. Tags
//! without a handler resolve to a "no effect" outcome and are logged once
//! for diagnostics rather than crashing mid-resolution.

use std::collections::{HashMap, HashSet};

use ib_rng::RandomSource;
use tracing::warn;

use super::{AttributeTag, EffectEnvelope, EffectSource};
use crate::combat::{CombatEvent, Outcome, apply_status_monster, status_duration};
use crate::creature::{AuraFlags, CreatureHandle, LoreEvent, ResistFlags};
use crate::death::apply_damage_raw;
use crate::effect::ProjectFlags;
use crate::errors::EngineError;
use crate::world::World;

/// Behavior of one attribute tag. Plain function pointers so a handler can
/// be fetched from the table and then given the whole world.
pub type EffectHandler = fn(
    &mut World,
    CreatureHandle,
    &EffectEnvelope,
    i32,
    &mut dyn RandomSource,
    &mut Outcome,
) -> Result<(), EngineError>;

/// The attribute dispatch table. Extensible at runtime via [`register`].
///
/// [`register`]: EffectTable::register
pub struct EffectTable {
    handlers: HashMap<AttributeTag, EffectHandler>,
    unhandled_seen: HashSet<AttributeTag>,
}

impl EffectTable {
    /// Empty table; every tag resolves to "no effect".
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
            unhandled_seen: HashSet::new(),
        }
    }

    /// The standard game catalogue.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        for attr in [
            AttributeTag::Fire,
            AttributeTag::Cold,
            AttributeTag::Elec,
            AttributeTag::Acid,
            AttributeTag::Poison,
            AttributeTag::Nether,
            AttributeTag::Chaos,
            AttributeTag::Sound,
            AttributeTag::Shards,
        ] {
            table.register(attr, handle_elemental);
        }
        for attr in [AttributeTag::Missile, AttributeTag::Arrow, AttributeTag::Debug] {
            table.register(attr, handle_physical);
        }
        for attr in [
            AttributeTag::Confusion,
            AttributeTag::Fear,
            AttributeTag::Sleep,
            AttributeTag::Slow,
            AttributeTag::Stun,
        ] {
            table.register(attr, handle_status);
        }
        table.register(AttributeTag::TeleportAway, handle_teleport_away);
        table.register(AttributeTag::Polymorph, handle_polymorph);
        table.register(AttributeTag::Heal, handle_heal);
        table.register(AttributeTag::Capture, handle_capture);
        table.register(AttributeTag::Photo, handle_photo);
        table
    }

    pub fn register(&mut self, attr: AttributeTag, handler: EffectHandler) {
        self.handlers.insert(attr, handler);
    }

    fn get(&self, attr: AttributeTag) -> Option<EffectHandler> {
        self.handlers.get(&attr).copied()
    }

    /// Log a missing handler once per tag.
    fn note_unhandled(&mut self, attr: AttributeTag) {
        if self.unhandled_seen.insert(attr) {
            warn!(%attr, "no handler registered for attribute tag");
        }
    }
}

impl Default for EffectTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Effective caster level backing saving throws against this effect.
fn caster_level(world: &World, source: EffectSource, damage: i32) -> u8 {
    match source {
        EffectSource::Player => world.player.level,
        EffectSource::Monster(h) => world
            .species_of(h)
            .map(|s| s.level)
            .unwrap_or_else(|_| (damage / 2).clamp(1, 50) as u8),
        EffectSource::Indirect(_) => (damage / 2).clamp(1, 50) as u8,
    }
}

/// Resolve one projected effect.
///
/// Finds the creatures in the blast (one cell for bolts, a disc for balls),
/// runs the umbrella full-resistance gate and the attribute handler on
/// each, then the post-processing hooks. Lore observations are recorded
/// exactly once, here.
pub fn project_effect(
    world: &mut World,
    envelope: &EffectEnvelope,
    rng: &mut dyn RandomSource,
) -> Result<Outcome, EngineError> {
    let mut out = Outcome::default();
    project_effect_raw(world, envelope, rng, &mut out)?;
    world.lore.record_all(&out.lore);
    Ok(out)
}

/// [`project_effect`] without the lore recording; internal callers (death
/// bursts, aura feedback) carry their observations up to the public entry
/// point that started the pass, so nothing records twice.
pub(crate) fn project_effect_raw(
    world: &mut World,
    envelope: &EffectEnvelope,
    rng: &mut dyn RandomSource,
    out: &mut Outcome,
) -> Result<(), EngineError> {
    let targets = gather_targets(world, envelope);
    for handle in targets {
        project_one(world, handle, envelope, rng, out)?;
    }
    Ok(())
}

/// Creatures caught in the envelope's footprint, nearest cell first.
fn gather_targets(world: &World, envelope: &EffectEnvelope) -> Vec<CreatureHandle> {
    let (tx, ty) = envelope.target;
    if envelope.radius == 0 {
        return world.arena.at(tx, ty).into_iter().collect();
    }
    let r = envelope.radius as i32;
    let mut hit: Vec<(i32, CreatureHandle)> = world
        .arena
        .iter()
        .filter_map(|(h, c)| {
            let dist = (c.x as i32 - tx as i32).abs().max((c.y as i32 - ty as i32).abs());
            if dist > r {
                return None;
            }
            let reachable = envelope.flags.contains(ProjectFlags::THRU_WALL)
                || world.grid.line_of_effect((tx, ty), (c.x, c.y));
            reachable.then_some((dist, h))
        })
        .collect();
    hit.sort_by_key(|&(dist, h)| (dist, h.index));
    hit.into_iter().map(|(_, h)| h).collect()
}

fn project_one(
    world: &mut World,
    target: CreatureHandle,
    envelope: &EffectEnvelope,
    rng: &mut dyn RandomSource,
    out: &mut Outcome,
) -> Result<(), EngineError> {
    // The caster never catches its own projection.
    if envelope.source.monster() == Some(target) {
        return Ok(());
    }

    let species = world.species_of(target)?;
    let species_id = species.id;

    // Umbrella gate: "resists nearly everything" stops all but the
    // allow-listed tags before any handler runs.
    if species.resists.contains(ResistFlags::ALL) && !envelope.attr.bypasses_full_resist() {
        out.push(CombatEvent::NoEffect);
        if envelope.visible {
            out.observe(LoreEvent::ResistObserved(species_id, envelope.attr));
        }
        return Ok(());
    }

    let Some(handler) = world.effects.get(envelope.attr) else {
        world.effects.note_unhandled(envelope.attr);
        out.push(CombatEvent::NoEffect);
        return Ok(());
    };

    let dealt_before = out.damage_dealt;
    handler(world, target, envelope, envelope.damage, rng, out)?;
    let dealt = out.damage_dealt - dealt_before;

    post_process(world, target, envelope, dealt, rng, out)
}

/// Post-processing hooks shared by every handler: pet retargeting, mount
/// shake-off coupling, and aura counterattacks on contact effects.
fn post_process(
    world: &mut World,
    target: CreatureHandle,
    envelope: &EffectEnvelope,
    dealt: i32,
    rng: &mut dyn RandomSource,
    out: &mut Outcome,
) -> Result<(), EngineError> {
    if let Ok(creature) = world.arena.get_mut(target) {
        if creature.is_pet && dealt > 0 {
            creature.target = envelope.source.monster();
        }
    }

    if world.player.riding == Some(target) && dealt > 0 {
        let shake = rng.rnd((dealt / 10).max(1) as u32) as i32;
        world.player.hp -= shake;
        out.push(CombatEvent::MountShaken { damage: shake });
    }

    if envelope.flags.contains(ProjectFlags::CONTACT)
        && !envelope.flags.contains(ProjectFlags::NO_COUNTER)
        && world.arena.is_live(target)
    {
        aura_retaliation(world, target, envelope.source, rng, out)?;
    }

    Ok(())
}

/// Retributive aura damage from `bearer` against whoever touched it.
pub fn aura_retaliation(
    world: &mut World,
    bearer: CreatureHandle,
    toucher: EffectSource,
    rng: &mut dyn RandomSource,
    out: &mut Outcome,
) -> Result<(), EngineError> {
    let species = world.species_of(bearer)?;
    let auras = species.auras;
    let level = species.level;
    if auras.is_empty() {
        return Ok(());
    }

    for (flag, attr) in [
        (AuraFlags::FIRE, AttributeTag::Fire),
        (AuraFlags::COLD, AttributeTag::Cold),
        (AuraFlags::ELEC, AttributeTag::Elec),
    ] {
        if !auras.contains(flag) {
            continue;
        }
        let dam = World::aura_dice(level).roll(rng).max(1);
        match toucher {
            EffectSource::Player => {
                world.player.hp -= dam;
                out.push(CombatEvent::AuraRetaliation { damage: dam });
            }
            EffectSource::Monster(h) => {
                if !world.arena.is_live(h) {
                    continue;
                }
                let dam = elemental_adjust(world, h, attr, dam, false, out)?;
                out.push(CombatEvent::AuraRetaliation { damage: dam });
                apply_damage_raw(world, h, dam, EffectSource::Indirect(Some(bearer)), false, rng, out)?;
            }
            EffectSource::Indirect(_) => {}
        }
    }
    Ok(())
}

/// Apply the target's elemental resistance or vulnerability to a damage
/// amount, emitting the matching events.
pub(crate) fn elemental_adjust(
    world: &World,
    target: CreatureHandle,
    attr: AttributeTag,
    damage: i32,
    visible: bool,
    out: &mut Outcome,
) -> Result<i32, EngineError> {
    let species = world.species_of(target)?;
    if let Some(bit) = attr.resist_bit() {
        if species.resists.contains(bit) {
            out.push(CombatEvent::Resists);
            if visible {
                out.observe(LoreEvent::ResistObserved(species.id, attr));
            }
            return Ok(damage / 3);
        }
    }
    if let Some(bit) = attr.vuln_bit() {
        if species.vuln.contains(bit) {
            return Ok(damage * 2);
        }
    }
    Ok(damage)
}

fn handle_elemental(
    world: &mut World,
    target: CreatureHandle,
    envelope: &EffectEnvelope,
    damage: i32,
    rng: &mut dyn RandomSource,
    out: &mut Outcome,
) -> Result<(), EngineError> {
    let dam = elemental_adjust(world, target, envelope.attr, damage, envelope.visible, out)?;
    apply_damage_raw(world, target, dam, envelope.source, false, rng, out)?;

    // Side statuses carried by the wilder elements.
    let side = match envelope.attr {
        AttributeTag::Chaos => Some(crate::creature::ConditionKind::Confusion),
        AttributeTag::Sound => Some(crate::creature::ConditionKind::Stun),
        _ => None,
    };
    if let Some(kind) = side {
        if world.arena.is_live(target) {
            let level = caster_level(world, envelope.source, damage);
            let duration = status_duration(dam, rng);
            let species = world.species_of(target)?.clone();
            let creature = world.arena.get_mut(target)?;
            apply_status_monster(creature, &species, kind, duration, level, rng, out);
        }
    }
    Ok(())
}

fn handle_physical(
    world: &mut World,
    target: CreatureHandle,
    envelope: &EffectEnvelope,
    damage: i32,
    rng: &mut dyn RandomSource,
    out: &mut Outcome,
) -> Result<(), EngineError> {
    let penetrates = envelope.attr == AttributeTag::Debug;
    apply_damage_raw(world, target, damage, envelope.source, penetrates, rng, out)
}

fn handle_status(
    world: &mut World,
    target: CreatureHandle,
    envelope: &EffectEnvelope,
    damage: i32,
    rng: &mut dyn RandomSource,
    out: &mut Outcome,
) -> Result<(), EngineError> {
    // Registered only for tags that carry a condition.
    let Some(kind) = envelope.attr.condition() else {
        out.push(CombatEvent::NoEffect);
        return Ok(());
    };
    let level = caster_level(world, envelope.source, damage);
    let duration = status_duration(damage, rng);
    let species = world.species_of(target)?.clone();
    let creature = world.arena.get_mut(target)?;
    apply_status_monster(creature, &species, kind, duration, level, rng, out);
    Ok(())
}

fn handle_teleport_away(
    world: &mut World,
    target: CreatureHandle,
    envelope: &EffectEnvelope,
    _damage: i32,
    _rng: &mut dyn RandomSource,
    out: &mut Outcome,
) -> Result<(), EngineError> {
    let species = world.species_of(target)?;
    if species.resists.contains(ResistFlags::TELEPORT) {
        out.push(CombatEvent::Resists);
        if envelope.visible {
            out.observe(LoreEvent::ResistObserved(species.id, AttributeTag::TeleportAway));
        }
        return Ok(());
    }
    let creature = world.arena.get_mut(target)?;
    creature.target = None;
    out.push(CombatEvent::Teleported);
    Ok(())
}

fn handle_polymorph(
    world: &mut World,
    target: CreatureHandle,
    _envelope: &EffectEnvelope,
    damage: i32,
    rng: &mut dyn RandomSource,
    out: &mut Outcome,
) -> Result<(), EngineError> {
    let species = world.species_of(target)?;
    if species.behavior.is_quasi_unique() {
        out.push(CombatEvent::NoEffect);
        return Ok(());
    }
    if species.level as u32 > rng.rnd(damage.max(1) as u32) {
        out.push(CombatEvent::Resists);
        return Ok(());
    }
    let creature = world.arena.get_mut(target)?;
    creature.conditions = Default::default();
    out.push(CombatEvent::Polymorphed);
    Ok(())
}

fn handle_heal(
    world: &mut World,
    target: CreatureHandle,
    _envelope: &EffectEnvelope,
    damage: i32,
    _rng: &mut dyn RandomSource,
    out: &mut Outcome,
) -> Result<(), EngineError> {
    let creature = world.arena.get_mut(target)?;
    let healed = creature.heal(damage);
    creature.conditions.dispel(crate::creature::ConditionKind::Fear);
    out.push(CombatEvent::Healed { amount: healed });
    Ok(())
}

fn handle_capture(
    world: &mut World,
    target: CreatureHandle,
    _envelope: &EffectEnvelope,
    _damage: i32,
    _rng: &mut dyn RandomSource,
    out: &mut Outcome,
) -> Result<(), EngineError> {
    let species = world.species_of(target)?;
    let weakened = world.arena.get(target)?.hp_percent() <= 25;
    if species.behavior.is_quasi_unique() || !weakened {
        out.push(CombatEvent::NoEffect);
        return Ok(());
    }
    world.arena.remove(target)?;
    out.push(CombatEvent::Captured);
    Ok(())
}

fn handle_photo(
    world: &mut World,
    target: CreatureHandle,
    _envelope: &EffectEnvelope,
    _damage: i32,
    _rng: &mut dyn RandomSource,
    out: &mut Outcome,
) -> Result<(), EngineError> {
    let creature = world.arena.get_mut(target)?;
    let apparent = creature.apparent_species;
    creature.anger();
    out.push(CombatEvent::Angered);
    out.observe(LoreEvent::Sighted(apparent));
    Ok(())
}

//! Resistance-gated application of timed conditions.
//!
//! Every condition follows one shape: immunity check (observed on
//! failure), saving throw, then additive escalation. A re-application
//! stacks onto the remaining duration, at half strength when the condition
//! is already active, so repeated hits make it worse rather than simply
//! refreshing it.

use ib_rng::RandomSource;

use super::{CombatEvent, Outcome};
use crate::creature::{
    ConditionKind, Creature, ImmuneFlags, LoreEvent, Species, TimedConditions,
};

/// Species immunity bit for a condition counter, if one exists.
fn immunity_bit(kind: ConditionKind) -> ImmuneFlags {
    match kind {
        ConditionKind::Sleep => ImmuneFlags::SLEEP,
        ConditionKind::Stun => ImmuneFlags::STUN,
        ConditionKind::Confusion => ImmuneFlags::CONFUSION,
        ConditionKind::Fear => ImmuneFlags::FEAR,
        ConditionKind::Slow => ImmuneFlags::SLOW,
        // Haste and invulnerability are beneficial; nothing is immune.
        ConditionKind::Haste | ConditionKind::Invulnerable => ImmuneFlags::empty(),
    }
}

/// Escalating duration add: full amount when freshly applied, half when
/// the condition is already running.
fn escalate(conditions: &mut TimedConditions, kind: ConditionKind, duration: u16) {
    let amount = if conditions.is_active(kind) {
        (duration / 2).max(1)
    } else {
        duration
    };
    conditions.add(kind, amount);
}

/// Attempt to put a timed condition on a monster.
///
/// Returns true if the condition landed.
pub fn apply_status_monster(
    creature: &mut Creature,
    species: &Species,
    kind: ConditionKind,
    duration: u16,
    caster_level: u8,
    rng: &mut dyn RandomSource,
    out: &mut Outcome,
) -> bool {
    if duration == 0 {
        return false;
    }

    let bit = immunity_bit(kind);
    if !bit.is_empty() && species.immune.contains(bit) {
        out.push(CombatEvent::NoEffect);
        out.observe(LoreEvent::StatusImmunityObserved(species.id, kind));
        return false;
    }

    // Monster saving throw against the caster's effective level.
    let reach = (caster_level as i32 - 10).max(1) as u32;
    if species.level as i32 > rng.rnd(reach) as i32 + 10 {
        out.push(CombatEvent::StatusResisted { kind });
        return false;
    }

    escalate(&mut creature.conditions, kind, duration);
    out.push(CombatEvent::StatusInflicted { kind });

    // A landed status breaks passivity, except when it puts the target
    // under (waking an angry creature is somebody else's problem).
    if kind != ConditionKind::Sleep && (creature.peaceful || creature.is_pet) {
        creature.anger();
        out.push(CombatEvent::Angered);
    }

    true
}

/// Attempt to put a timed condition on the player.
///
/// The player saves with skill rather than level: a roll over
/// `100 + caster_level/2` percentiles against the save skill.
pub fn apply_status_player(
    conditions: &mut TimedConditions,
    save_skill: i32,
    kind: ConditionKind,
    duration: u16,
    caster_level: u8,
    rng: &mut dyn RandomSource,
    out: &mut Outcome,
) -> bool {
    if duration == 0 {
        return false;
    }

    if (rng.rnd(100 + caster_level as u32 / 2) as i32) < save_skill {
        out.push(CombatEvent::StatusResisted { kind });
        return false;
    }

    escalate(conditions, kind, duration);
    out.push(CombatEvent::StatusInflicted { kind });
    true
}

/// Condition duration derived from effect damage, for projected statuses.
pub fn status_duration(damage: i32, rng: &mut dyn RandomSource) -> u16 {
    (damage / 8).clamp(0, 40) as u16 + rng.rnd(8) as u16
}

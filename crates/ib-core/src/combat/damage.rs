//! Damage calculation: base dice, slay/brand multiplier, critical roll,
//! vorpal layering, and the full-resistance damage shaping.

use ib_rng::{Dice, RandomSource};
use serde::{Deserialize, Serialize};
use strum::Display;

use super::slays::{WeaponTraits, melee_multiplier};
use super::{CombatEvent, Outcome};
use crate::consts::{
    AMBUSH_MULT, FULL_RESIST_DIVISOR, FULL_RESIST_FLOOR_CHANCE, VORPAL_ACTIVATE_CHANCE,
    VORPAL_CHANCE,
};
use crate::creature::Species;
use crate::errors::EngineError;

/// A wielded weapon, as the damage pipeline sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub dice: Dice,
    /// Tenths of a pound; drives the critical roll.
    pub weight: u16,
    /// To-hit bonus; also feeds the critical roll.
    pub to_hit: i16,
    pub traits: WeaponTraits,
}

impl Weapon {
    pub fn new(name: &str, dice: Dice, weight: u16, to_hit: i16) -> Self {
        Self {
            name: name.to_string(),
            dice,
            weight,
            to_hit,
            traits: WeaponTraits::empty(),
        }
    }

    pub fn with_traits(mut self, traits: WeaponTraits) -> Self {
        self.traits = traits;
        self
    }
}

/// Critical hit message tier. Higher tiers multiply harder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum CritTier {
    Good,
    Great,
    Superb,
    Masterful,
    Legendary,
}

impl CritTier {
    /// (x10 multiplier, flat bonus) for the tier.
    pub const fn scaling(&self) -> (i32, i32) {
        match self {
            CritTier::Good => (20, 5),
            CritTier::Great => (20, 10),
            CritTier::Superb => (30, 15),
            CritTier::Masterful => (30, 20),
            CritTier::Legendary => (35, 25),
        }
    }
}

/// Roll for a critical hit, keyed on weapon weight and to-hit bonus.
///
/// Heavier, more accurate weapons crit more often and harder.
pub fn critical_roll(weight: u16, to_hit: i16, rng: &mut dyn RandomSource) -> Option<CritTier> {
    let power = weight as i32 + to_hit as i32 * 5;
    if power <= 0 || rng.rnd(5000) as i32 > power {
        return None;
    }
    let severity = weight as i32 + rng.rnd(650) as i32;
    Some(match severity {
        s if s < 400 => CritTier::Good,
        s if s < 700 => CritTier::Great,
        s if s < 900 => CritTier::Superb,
        s if s < 1300 => CritTier::Masterful,
        _ => CritTier::Legendary,
    })
}

/// Full-resistance damage shaping: divide by 100, with a 1-in-3 chance of
/// flooring at 1 rather than 0 so "resists everything" never becomes true
/// invulnerability.
pub fn shape_full_resist(damage: i32, rng: &mut dyn RandomSource) -> i32 {
    let shaped = damage / FULL_RESIST_DIVISOR;
    if shaped == 0 && damage > 0 && rng.one_in(FULL_RESIST_FLOOR_CHANCE) {
        return 1;
    }
    shaped
}

/// Compute the damage of one connecting melee blow, in fixed order:
/// dice, ambush bonus, slay/brand multiplier, critical, vorpal.
///
/// Full-resistance shaping is NOT applied here; the damage processor does
/// that just before hit points change, so melee and projected damage share
/// one implementation.
pub fn melee_damage(
    weapon: &Weapon,
    species: &Species,
    defender_hp: i32,
    defender_sleeping: bool,
    crit_candidate: bool,
    rng: &mut dyn RandomSource,
    out: &mut Outcome,
) -> Result<i32, EngineError> {
    if !weapon.dice.is_valid() {
        return Err(EngineError::DegenerateDice {
            num: weapon.dice.num,
            sides: weapon.dice.sides,
        });
    }

    let mut damage = weapon.dice.roll(rng).max(0);

    if defender_sleeping {
        damage = damage * AMBUSH_MULT / 10;
    }

    let mult = melee_multiplier(weapon.traits, species, out);
    damage = damage * mult / 10;

    if crit_candidate {
        if let Some(tier) = critical_roll(weapon.weight, weapon.to_hit, rng) {
            let (crit_mult, bonus) = tier.scaling();
            damage = damage * crit_mult / 10 + bonus;
            out.push(CombatEvent::Critical { tier });
        }
    }

    if weapon.traits.contains(WeaponTraits::VORPAL) && rng.one_in(VORPAL_ACTIVATE_CHANCE) {
        let mut vorpal_mult: i32 = 2;
        while rng.one_in(VORPAL_CHANCE) {
            vorpal_mult += 1;
        }
        damage = damage.saturating_mul(vorpal_mult);
        out.push(CombatEvent::VorpalCut {
            cuts: (vorpal_mult - 1) as u32,
        });
        if damage > defender_hp {
            out.push(CombatEvent::CutInHalf);
        }
    }

    Ok(damage.max(0))
}

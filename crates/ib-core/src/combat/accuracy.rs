//! Hit/miss resolution for a single blow.
//!
//! One closed-form chance shared by every variant:
//! `chance = SURE_MISS + (100 - min(100, ac*75/accuracy)) * span/100`,
//! clamped into `[SURE_MISS, SURE_HIT]` so the guaranteed-miss and
//! guaranteed-hit percentiles are folded into the formula itself.

use ib_rng::RandomSource;

use crate::consts::{SURE_HIT_PCT, SURE_MISS_PCT};

/// Hit chance in percent for an attack with `accuracy` against `ac`.
pub fn hit_chance(accuracy: i32, ac: i32) -> i32 {
    if accuracy <= 0 {
        return SURE_MISS_PCT;
    }
    let deflect = (ac.max(0) * 75 / accuracy).min(100);
    let span = SURE_HIT_PCT - SURE_MISS_PCT;
    let chance = SURE_MISS_PCT + (100 - deflect) * span / 100;
    chance.clamp(SURE_MISS_PCT, SURE_HIT_PCT)
}

/// Hit chance against a defender that may not be visible. Hidden defenders
/// are harder to hit: effective accuracy is halved.
pub fn hit_chance_vs(accuracy: i32, ac: i32, defender_visible: bool) -> i32 {
    let effective = if defender_visible {
        accuracy
    } else {
        accuracy / 2
    };
    hit_chance(effective, ac)
}

/// Roll one blow against the closed-form chance.
fn roll_hit(chance: i32, rng: &mut dyn RandomSource) -> bool {
    rng.rnd(100) as i32 <= chance
}

/// Player blow against a monster.
pub fn player_hits_monster(
    accuracy: i32,
    ac: i32,
    defender_visible: bool,
    rng: &mut dyn RandomSource,
) -> bool {
    roll_hit(hit_chance_vs(accuracy, ac, defender_visible), rng)
}

/// Monster blow against the player. Adds attacker level to the blow's base
/// power; a stunned attacker has a flat 50% auto-miss before the formula.
pub fn monster_hits_player(
    base_power: i32,
    attacker_level: u8,
    attacker_stunned: bool,
    player_ac: i32,
    rng: &mut dyn RandomSource,
) -> bool {
    if attacker_stunned && rng.one_in(2) {
        return false;
    }
    let accuracy = base_power + attacker_level as i32 * 3;
    roll_hit(hit_chance(accuracy, player_ac), rng)
}

/// Monster blow against another monster: the same formula with no
/// player-only modifiers.
pub fn monster_hits_monster(
    base_power: i32,
    attacker_level: u8,
    attacker_stunned: bool,
    defender_ac: i32,
    rng: &mut dyn RandomSource,
) -> bool {
    if attacker_stunned && rng.one_in(2) {
        return false;
    }
    let accuracy = base_power + attacker_level as i32 * 3;
    roll_hit(hit_chance(accuracy, defender_ac), rng)
}

/// Called-shot / vital-strike style modes skip the formula entirely and
/// succeed with a fixed 1-in-`n` chance.
pub fn bypass_hit(n: u32, rng: &mut dyn RandomSource) -> bool {
    rng.one_in(n.max(1))
}

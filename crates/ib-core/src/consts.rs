//! Tuning constants for the combat core.

/// Percentile below which any blow misses regardless of skill.
pub const SURE_MISS_PCT: i32 = 5;

/// Percentile above which any blow connects regardless of armor.
pub const SURE_HIT_PCT: i32 = 95;

/// Base multiplier in the x10 fixed-point slay/brand scale (x1.0).
pub const BASE_MULT: i32 = 10;

/// Upper clamp on the combined slay/brand multiplier (x15.0).
pub const SLAY_MULT_CAP: i32 = 150;

/// Divisor applied to damage against full-resistance creatures.
pub const FULL_RESIST_DIVISOR: i32 = 100;

/// When full-resistance floors damage to zero, a 1-in-this chance leaves 1
/// point instead. Keeps "resists everything" short of true invulnerability.
pub const FULL_RESIST_FLOOR_CHANCE: u32 = 3;

/// 1-in-this chance for a blow to punch through an invulnerability globe.
pub const PENETRATE_INVULN_CHANCE: u32 = 13;

/// Geometric continuation chance for vorpal cuts: the multiplier keeps
/// climbing while one_in(VORPAL_CHANCE) holds.
pub const VORPAL_CHANCE: u32 = 4;

/// 1-in-this chance for a vorpal weapon to activate at all on a given hit.
pub const VORPAL_ACTIVATE_CHANCE: u32 = 6;

/// Damage multiplier against sleeping defenders (x10 fixed point).
pub const AMBUSH_MULT: i32 = 20;

/// Natural attacks per species blow table.
pub const MAX_BLOWS: usize = 4;

/// Speed value meaning "normal" in the species tables.
pub const SPEED_NORMAL: i16 = 110;

/// Fear probability (percent) for the near-death flinch, taken when a
/// single blow's damage exceeds the defender's remaining hit points.
pub const NEAR_DEATH_FEAR_PCT: u32 = 80;

/// Extra fear duration added by a near-death flinch.
pub const NEAR_DEATH_FEAR_BONUS: u16 = 20;

/// Cap on the breeder-kill experience divisor.
pub const BREEDER_EXP_DIVISOR_CAP: u32 = 40;

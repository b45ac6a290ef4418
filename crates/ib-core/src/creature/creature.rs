//! Creature instances and their timed conditions.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, IntoEnumIterator};

use super::SpeciesId;
use crate::impl_bitflags_serde;

/// Timed condition kinds tracked on every creature.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumCount,
)]
#[repr(u8)]
pub enum ConditionKind {
    Sleep,
    Haste,
    Slow,
    Stun,
    Confusion,
    Fear,
    Invulnerable,
}

/// Remaining durations for every [`ConditionKind`].
///
/// Refresh policy: an explicit `extend_to` never shortens an active effect;
/// escalation goes through `add`. Only `dispel` cuts a timer short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimedConditions {
    remaining: [u16; ConditionKind::COUNT],
}

impl TimedConditions {
    pub fn get(&self, kind: ConditionKind) -> u16 {
        self.remaining[kind as usize]
    }

    pub fn is_active(&self, kind: ConditionKind) -> bool {
        self.get(kind) > 0
    }

    /// Add to the remaining duration (saturating). Used by the status
    /// applier's "it gets worse" escalation.
    pub fn add(&mut self, kind: ConditionKind, amount: u16) {
        let slot = &mut self.remaining[kind as usize];
        *slot = slot.saturating_add(amount);
    }

    /// Set the duration only if the new one is longer or the condition was
    /// inactive. Never silently shortens an active effect.
    pub fn extend_to(&mut self, kind: ConditionKind, duration: u16) {
        let slot = &mut self.remaining[kind as usize];
        if duration > *slot {
            *slot = duration;
        }
    }

    /// Explicit dispel: zero the timer regardless of remaining duration.
    pub fn dispel(&mut self, kind: ConditionKind) {
        self.remaining[kind as usize] = 0;
    }

    /// Reduce one timer by `amount`, reporting whether it just ran out.
    pub fn reduce(&mut self, kind: ConditionKind, amount: u16) -> bool {
        let slot = &mut self.remaining[kind as usize];
        if *slot == 0 {
            return false;
        }
        *slot = slot.saturating_sub(amount);
        *slot == 0
    }

    /// Per-turn decay. Returns the kinds that recovered this tick.
    pub fn tick(&mut self) -> Vec<ConditionKind> {
        let mut recovered = Vec::new();
        for kind in ConditionKind::iter() {
            if self.reduce(kind, 1) {
                recovered.push(kind);
            }
        }
        recovered
    }
}

bitflags! {
    /// Creature alignment bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AlignFlags: u8 {
        const EVIL    = 0x01;
        const GOOD    = 0x02;
        const LAWFUL  = 0x04;
        const CHAOTIC = 0x08;
    }
}

impl_bitflags_serde!(AlignFlags, u8);

/// A live creature.
///
/// Invariant outside death processing: `0 <= hp <= maxhp <= max_maxhp`.
/// A negative `hp` marks "pending death" inside one resolution pass only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    /// True species.
    pub species: SpeciesId,

    /// What the creature currently appears to be (disguise, polymorph,
    /// hallucination). Equals `species` for most creatures.
    pub apparent_species: SpeciesId,

    pub hp: i32,
    pub maxhp: i32,

    /// Ceiling `maxhp` can ever be raised to.
    pub max_maxhp: i32,

    pub alignment: AlignFlags,

    pub conditions: TimedConditions,

    /// Monotonic total damage this creature has ever taken. Feeds the
    /// chip-damage experience penalty.
    pub dealt_damage: u32,

    /// Distance at which this instance wakes to intruders.
    pub alert_radius: u8,

    pub x: i8,
    pub y: i8,

    pub peaceful: bool,
    pub is_pet: bool,

    /// Current combat target (for pet retargeting), if any.
    pub target: Option<super::CreatureHandle>,

    /// Set once death processing has accepted this creature's death.
    /// Guards against double resolution within one pass.
    pub dead: bool,
}

impl Creature {
    pub fn new(species: SpeciesId, maxhp: i32) -> Self {
        Self {
            species,
            apparent_species: species,
            hp: maxhp,
            maxhp,
            max_maxhp: maxhp,
            alignment: AlignFlags::empty(),
            conditions: TimedConditions::default(),
            dealt_damage: 0,
            alert_radius: 20,
            x: 0,
            y: 0,
            peaceful: false,
            is_pet: false,
            target: None,
            dead: false,
        }
    }

    pub fn at(mut self, x: i8, y: i8) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Percentage of maximum hit points remaining, 0..=100.
    pub fn hp_percent(&self) -> i32 {
        if self.maxhp <= 0 {
            return 0;
        }
        (100 * self.hp.max(0)) / self.maxhp
    }

    /// Heal without breaching `maxhp`.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0)).min(self.maxhp);
        self.hp - before
    }

    /// Anger: breaks passivity and pet-friendliness bookkeeping.
    pub fn anger(&mut self) {
        self.peaceful = false;
        self.is_pet = false;
    }

    pub fn is_asleep(&self) -> bool {
        self.conditions.is_active(ConditionKind::Sleep)
    }

    pub fn is_fleeing(&self) -> bool {
        self.conditions.is_active(ConditionKind::Fear)
    }

    pub fn is_stunned(&self) -> bool {
        self.conditions.is_active(ConditionKind::Stun)
    }

    pub fn is_invulnerable(&self) -> bool {
        self.conditions.is_active(ConditionKind::Invulnerable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_never_shortens() {
        let mut c = TimedConditions::default();
        c.extend_to(ConditionKind::Confusion, 10);
        c.extend_to(ConditionKind::Confusion, 4);
        assert_eq!(c.get(ConditionKind::Confusion), 10);
        c.extend_to(ConditionKind::Confusion, 15);
        assert_eq!(c.get(ConditionKind::Confusion), 15);
    }

    #[test]
    fn test_dispel_is_the_only_shortcut() {
        let mut c = TimedConditions::default();
        c.add(ConditionKind::Fear, 12);
        c.dispel(ConditionKind::Fear);
        assert!(!c.is_active(ConditionKind::Fear));
    }

    #[test]
    fn test_add_saturates() {
        let mut c = TimedConditions::default();
        c.add(ConditionKind::Stun, u16::MAX - 1);
        c.add(ConditionKind::Stun, 50);
        assert_eq!(c.get(ConditionKind::Stun), u16::MAX);
    }

    #[test]
    fn test_tick_reports_recoveries() {
        let mut c = TimedConditions::default();
        c.add(ConditionKind::Sleep, 1);
        c.add(ConditionKind::Haste, 3);
        let recovered = c.tick();
        assert_eq!(recovered, vec![ConditionKind::Sleep]);
        assert_eq!(c.get(ConditionKind::Haste), 2);
    }

    #[test]
    fn test_hp_percent() {
        let mut c = Creature::new(SpeciesId(0), 40);
        assert_eq!(c.hp_percent(), 100);
        c.hp = 2;
        assert_eq!(c.hp_percent(), 5);
        c.hp = -3;
        assert_eq!(c.hp_percent(), 0);
    }

    #[test]
    fn test_heal_caps_at_maxhp() {
        let mut c = Creature::new(SpeciesId(0), 30);
        c.hp = 10;
        assert_eq!(c.heal(100), 20);
        assert_eq!(c.hp, 30);
    }

    #[test]
    fn test_anger_clears_friendliness() {
        let mut c = Creature::new(SpeciesId(0), 10);
        c.peaceful = true;
        c.is_pet = true;
        c.anger();
        assert!(!c.peaceful);
        assert!(!c.is_pet);
    }
}

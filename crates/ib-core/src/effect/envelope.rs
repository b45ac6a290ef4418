//! The payload of one projected effect. Created per application, discarded
//! after.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::AttributeTag;
use crate::creature::CreatureHandle;
use crate::impl_bitflags_serde;

/// Where a projected effect (or a damage amount) came from. Death rules
/// care about the distinction: quasi-uniques only die to `Player`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectSource {
    /// The player, directly.
    Player,
    /// Another monster, directly.
    Monster(CreatureHandle),
    /// An area effect, trap, or aura; optionally attributed to a monster
    /// for retargeting purposes.
    Indirect(Option<CreatureHandle>),
}

impl EffectSource {
    pub fn monster(&self) -> Option<CreatureHandle> {
        match *self {
            EffectSource::Monster(h) => Some(h),
            EffectSource::Indirect(h) => h,
            EffectSource::Player => None,
        }
    }
}

bitflags! {
    /// Projection behavior modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ProjectFlags: u8 {
        /// Ignore line-of-effect blocking.
        const THRU_WALL  = 0x01;
        /// Suppress aura counterattacks against the source.
        const NO_COUNTER = 0x02;
        /// The effect originated from physical contact (melee touch,
        /// aura brush); exposes the source to retributive auras.
        const CONTACT    = 0x04;
    }
}

impl_bitflags_serde!(ProjectFlags, u8);

/// One projected effect application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectEnvelope {
    pub source: EffectSource,
    /// Burst radius; 0 for bolts and direct touches.
    pub radius: u8,
    /// Target cell.
    pub target: (i8, i8),
    pub damage: i32,
    pub attr: AttributeTag,
    pub flags: ProjectFlags,
    /// Whether the player can see the application (gates lore).
    pub visible: bool,
}

impl EffectEnvelope {
    /// A bolt from the player at a cell: no radius, visible, counterable.
    pub fn player_bolt(attr: AttributeTag, damage: i32, target: (i8, i8)) -> Self {
        Self {
            source: EffectSource::Player,
            radius: 0,
            target,
            damage,
            attr,
            flags: ProjectFlags::empty(),
            visible: true,
        }
    }

    pub fn with_flags(mut self, flags: ProjectFlags) -> Self {
        self.flags |= flags;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_attribution() {
        let h = CreatureHandle { index: 2, generation: 0 };
        assert_eq!(EffectSource::Player.monster(), None);
        assert_eq!(EffectSource::Monster(h).monster(), Some(h));
        assert_eq!(EffectSource::Indirect(Some(h)).monster(), Some(h));
        assert_eq!(EffectSource::Indirect(None).monster(), None);
    }

    #[test]
    fn test_bolt_constructor() {
        let envelope = EffectEnvelope::player_bolt(AttributeTag::Fire, 40, (3, 3))
            .with_flags(ProjectFlags::CONTACT);
        assert_eq!(envelope.radius, 0);
        assert!(envelope.flags.contains(ProjectFlags::CONTACT));
        assert!(!envelope.flags.contains(ProjectFlags::THRU_WALL));
    }
}

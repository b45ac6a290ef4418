//! Species (race) templates.
//!
//! A species row is immutable shared data: many creature instances point at
//! one row, and combat never writes through it. Observation bookkeeping
//! ("the player has now seen this thing shrug off fire") flows through
//! [`crate::creature::LoreEvent`] instead of mutating these tables in place.

use bitflags::bitflags;
use ib_rng::Dice;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::consts::MAX_BLOWS;
use crate::effect::AttributeTag;
use crate::errors::EngineError;
use crate::impl_bitflags_serde;

/// Index into the species table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeciesId(pub u16);

bitflags! {
    /// Elemental and exotic resistances.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ResistFlags: u32 {
        const FIRE    = 0x0001;
        const COLD    = 0x0002;
        const ELEC    = 0x0004;
        const ACID    = 0x0008;
        const POISON  = 0x0010;
        const NETHER  = 0x0020;
        const CHAOS   = 0x0040;
        const SOUND   = 0x0080;
        const SHARDS  = 0x0100;
        const TELEPORT = 0x0200;
        /// Umbrella flag: resists nearly everything. Only a short
        /// allow-list of attribute tags punches through.
        const ALL     = 0x8000;
    }
}

bitflags! {
    /// Outright immunity to timed conditions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ImmuneFlags: u16 {
        const CONFUSION = 0x0001;
        const SLEEP     = 0x0002;
        const STUN      = 0x0004;
        const FEAR      = 0x0008;
        const SLOW      = 0x0010;
        const BLIND     = 0x0020;
        const HOLD      = 0x0040;
    }
}

bitflags! {
    /// Elemental vulnerabilities (brands hit these harder).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct VulnFlags: u8 {
        const FIRE   = 0x01;
        const COLD   = 0x02;
        const ELEC   = 0x04;
        const ACID   = 0x08;
        const POISON = 0x10;
    }
}

bitflags! {
    /// Race categories that slay weapons key on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct KindFlags: u32 {
        const ANIMAL    = 0x0001;
        const ORC       = 0x0002;
        const TROLL     = 0x0004;
        const GIANT     = 0x0008;
        const DRAGON    = 0x0010;
        const DEMON     = 0x0020;
        const UNDEAD    = 0x0040;
        const HUMAN     = 0x0080;
        const EVIL      = 0x0100;
        const GOOD      = 0x0200;
        const NONLIVING = 0x0400;
    }
}

bitflags! {
    /// Behavior flags consulted by the resolution rules.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BehaviorFlags: u32 {
        /// One-of-a-kind creature.
        const UNIQUE     = 0x0001;
        /// Required alive by a quest.
        const QUESTOR    = 0x0002;
        /// Population-capped pseudo-unique (a fixed number ever exist).
        const NAZGUL     = 0x0004;
        /// Never leaves its cell.
        const NEVER_MOVE = 0x0008;
        /// Breeds explosively; experience for kills diminishes.
        const MULTIPLY   = 0x0010;
    }
}

bitflags! {
    /// Retributive damage auras. Shared by species rows and the player.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AuraFlags: u8 {
        const FIRE = 0x01;
        const COLD = 0x02;
        const ELEC = 0x04;
    }
}

impl_bitflags_serde!(ResistFlags, u32);
impl_bitflags_serde!(ImmuneFlags, u16);
impl_bitflags_serde!(VulnFlags, u8);
impl_bitflags_serde!(KindFlags, u32);
impl_bitflags_serde!(BehaviorFlags, u32);
impl_bitflags_serde!(AuraFlags, u8);

impl BehaviorFlags {
    /// Unique, quest-critical, or population-capped: subject to the
    /// non-player death veto.
    pub fn is_quasi_unique(&self) -> bool {
        self.intersects(Self::UNIQUE | Self::QUESTOR | Self::NAZGUL)
    }
}

/// How a natural attack is delivered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum BlowMethod {
    #[default]
    None,
    Hit,
    Touch,
    Claw,
    Bite,
    Sting,
    Butt,
    Crush,
    Gaze,
    Explode,
}

impl BlowMethod {
    /// Physical contact exposes the attacker to retributive auras.
    pub const fn makes_contact(&self) -> bool {
        !matches!(self, BlowMethod::None | BlowMethod::Gaze)
    }
}

/// What a natural attack does beyond its dice.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum BlowEffect {
    #[default]
    Hurt,
    /// Raw damage with extra armor-shattering weight behind it.
    Shatter,
    Poison,
    Acid,
    Elec,
    Fire,
    Cold,
    Blind,
    Confuse,
    Terrify,
    Paralyze,
    Sleep,
    Stun,
}

impl BlowEffect {
    /// Base accuracy power of the effect, fed into the monster to-hit
    /// formula alongside attacker level.
    pub const fn base_power(&self) -> i32 {
        match self {
            BlowEffect::Hurt | BlowEffect::Shatter => 60,
            BlowEffect::Poison => 5,
            BlowEffect::Acid => 0,
            BlowEffect::Elec | BlowEffect::Fire | BlowEffect::Cold => 10,
            BlowEffect::Blind | BlowEffect::Paralyze => 2,
            BlowEffect::Confuse | BlowEffect::Terrify => 10,
            BlowEffect::Sleep | BlowEffect::Stun => 10,
        }
    }

    /// The timed condition this blow tries to inflict, if any. Blindness
    /// and paralysis fold onto the nearest tracked counter.
    pub const fn condition(&self) -> Option<super::ConditionKind> {
        use super::ConditionKind;
        match self {
            BlowEffect::Blind | BlowEffect::Confuse => Some(ConditionKind::Confusion),
            BlowEffect::Terrify => Some(ConditionKind::Fear),
            BlowEffect::Paralyze | BlowEffect::Sleep => Some(ConditionKind::Sleep),
            BlowEffect::Stun => Some(ConditionKind::Stun),
            _ => None,
        }
    }

    /// The elemental attribute riding on this blow's damage, if any.
    pub const fn attribute(&self) -> Option<AttributeTag> {
        match self {
            BlowEffect::Poison => Some(AttributeTag::Poison),
            BlowEffect::Acid => Some(AttributeTag::Acid),
            BlowEffect::Elec => Some(AttributeTag::Elec),
            BlowEffect::Fire => Some(AttributeTag::Fire),
            BlowEffect::Cold => Some(AttributeTag::Cold),
            _ => None,
        }
    }
}

/// One row of a species blow table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Blow {
    pub method: BlowMethod,
    pub effect: BlowEffect,
    pub dice: Dice,
}

impl Blow {
    pub const fn new(method: BlowMethod, effect: BlowEffect, dice: Dice) -> Self {
        Self {
            method,
            effect,
            dice,
        }
    }

    pub const fn is_active(&self) -> bool {
        !matches!(self.method, BlowMethod::None)
    }
}

/// Blow table for a species.
pub type BlowTable = [Blow; MAX_BLOWS];

/// Special behavior dispatched when a creature of this species dies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeathSpecial {
    #[default]
    None,
    /// Area burst centered on the corpse, fed back through the effect
    /// projection path.
    Explode {
        attr: AttributeTag,
        dice: Dice,
        radius: u8,
    },
    /// Calls kin as it goes down.
    Summon { species: SpeciesId, count: u8 },
    /// Chance to get back up at half health.
    Resurrect { chance: u32 },
}

/// A fused unique and its two halves. Defeating any member resolves all
/// three to defeated bookkeeping state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedUniqueGroup {
    pub fused: SpeciesId,
    pub halves: [SpeciesId; 2],
}

impl LinkedUniqueGroup {
    pub fn members(&self) -> [SpeciesId; 3] {
        [self.fused, self.halves[0], self.halves[1]]
    }

    pub fn contains(&self, id: SpeciesId) -> bool {
        self.members().contains(&id)
    }
}

/// Immutable species template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub id: SpeciesId,
    pub name: String,

    /// Native depth; doubles as the defender level for saving throws.
    pub level: u8,

    /// Base armor class.
    pub ac: i16,

    /// Speed; 110 is normal.
    pub speed: i16,

    /// Base experience value, scaled by level and speed on award.
    pub base_exp: u32,

    pub resists: ResistFlags,
    pub immune: ImmuneFlags,
    pub vuln: VulnFlags,
    pub kind: KindFlags,
    pub behavior: BehaviorFlags,
    pub auras: AuraFlags,

    pub blows: BlowTable,

    /// Distance at which it notices intruders.
    pub alert_radius: u8,

    /// Initial drowsiness for freshly spawned instances.
    pub base_sleep: u8,

    pub death_special: DeathSpecial,
}

impl Species {
    /// Minimal template for tests and tools: everything zeroed except
    /// identity and the stats that gate the formulas.
    pub fn stub(id: SpeciesId, name: &str, level: u8, ac: i16) -> Self {
        Self {
            id,
            name: name.to_string(),
            level,
            ac,
            speed: crate::consts::SPEED_NORMAL,
            base_exp: 10,
            resists: ResistFlags::empty(),
            immune: ImmuneFlags::empty(),
            vuln: VulnFlags::empty(),
            kind: KindFlags::empty(),
            behavior: BehaviorFlags::empty(),
            auras: AuraFlags::empty(),
            blows: BlowTable::default(),
            alert_radius: 20,
            base_sleep: 0,
            death_special: DeathSpecial::None,
        }
    }
}

/// The species store, keyed by [`SpeciesId`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeciesTable {
    rows: Vec<Species>,
}

impl SpeciesTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row; its `id` field is rewritten to its table position.
    pub fn add(&mut self, mut species: Species) -> SpeciesId {
        let id = SpeciesId(self.rows.len() as u16);
        species.id = id;
        self.rows.push(species);
        id
    }

    pub fn get(&self, id: SpeciesId) -> Result<&Species, EngineError> {
        self.rows
            .get(id.0 as usize)
            .ok_or(EngineError::UnknownSpecies(id))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Species> {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quasi_unique_detection() {
        assert!(BehaviorFlags::UNIQUE.is_quasi_unique());
        assert!(BehaviorFlags::QUESTOR.is_quasi_unique());
        assert!(BehaviorFlags::NAZGUL.is_quasi_unique());
        assert!(!BehaviorFlags::MULTIPLY.is_quasi_unique());
        assert!(!(BehaviorFlags::NEVER_MOVE | BehaviorFlags::MULTIPLY).is_quasi_unique());
    }

    #[test]
    fn test_blow_activity() {
        let blow = Blow::new(BlowMethod::Bite, BlowEffect::Hurt, Dice::plain(1, 6));
        assert!(blow.is_active());
        assert!(!Blow::default().is_active());
    }

    #[test]
    fn test_contact_methods() {
        assert!(BlowMethod::Bite.makes_contact());
        assert!(BlowMethod::Touch.makes_contact());
        assert!(!BlowMethod::Gaze.makes_contact());
        assert!(!BlowMethod::None.makes_contact());
    }

    #[test]
    fn test_species_table_ids() {
        let mut table = SpeciesTable::new();
        let a = table.add(Species::stub(SpeciesId(0), "white jelly", 5, 1));
        let b = table.add(Species::stub(SpeciesId(0), "cave orc", 7, 20));
        assert_ne!(a, b);
        assert_eq!(table.get(b).unwrap().name, "cave orc");
        assert_eq!(
            table.get(SpeciesId(99)),
            Err(EngineError::UnknownSpecies(SpeciesId(99)))
        );
    }

    #[test]
    fn test_linked_group_membership() {
        let group = LinkedUniqueGroup {
            fused: SpeciesId(3),
            halves: [SpeciesId(1), SpeciesId(2)],
        };
        assert!(group.contains(SpeciesId(1)));
        assert!(group.contains(SpeciesId(3)));
        assert!(!group.contains(SpeciesId(4)));
    }

    #[test]
    fn test_flags_serde_as_bits() {
        let flags = ResistFlags::FIRE | ResistFlags::ALL;
        let json = serde_json::to_string(&flags).unwrap();
        let back: ResistFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(flags, back);
    }
}

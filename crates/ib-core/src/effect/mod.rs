//! Non-melee effect projection: spells, breaths, bolts, balls, and auras.
//!
//! Each projected effect carries an [`AttributeTag`]; a registered handler
//! table maps the tag to behavior, so the effect catalogue stays open-ended
//! without one giant match.

mod envelope;
mod resolver;

pub use envelope::{EffectEnvelope, EffectSource, ProjectFlags};
pub use resolver::{EffectHandler, EffectTable, aura_retaliation, project_effect};
pub(crate) use resolver::{elemental_adjust, project_effect_raw};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::creature::{ConditionKind, ResistFlags, VulnFlags};

/// What kind of energy or influence a projected effect carries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
pub enum AttributeTag {
    // Elemental and exotic damage.
    Fire,
    Cold,
    Elec,
    Acid,
    Poison,
    Nether,
    Chaos,
    Sound,
    Shards,

    // Pure physical damage; punches through the full-resistance umbrella.
    Missile,
    Arrow,
    /// Unconditional test damage, also umbrella-exempt.
    Debug,

    // Status carriers.
    Confusion,
    Fear,
    Sleep,
    Slow,
    Stun,

    // Non-damage influences.
    TeleportAway,
    Polymorph,
    Heal,
    Capture,
    Photo,
}

impl AttributeTag {
    /// Whether this tag punches through the full-resistance umbrella.
    pub const fn bypasses_full_resist(&self) -> bool {
        matches!(self, AttributeTag::Missile | AttributeTag::Arrow | AttributeTag::Debug)
    }

    /// Species resistance bit partially mitigating this tag, if any.
    pub const fn resist_bit(&self) -> Option<ResistFlags> {
        match self {
            AttributeTag::Fire => Some(ResistFlags::FIRE),
            AttributeTag::Cold => Some(ResistFlags::COLD),
            AttributeTag::Elec => Some(ResistFlags::ELEC),
            AttributeTag::Acid => Some(ResistFlags::ACID),
            AttributeTag::Poison => Some(ResistFlags::POISON),
            AttributeTag::Nether => Some(ResistFlags::NETHER),
            AttributeTag::Chaos => Some(ResistFlags::CHAOS),
            AttributeTag::Sound => Some(ResistFlags::SOUND),
            AttributeTag::Shards => Some(ResistFlags::SHARDS),
            _ => None,
        }
    }

    /// Species vulnerability bit doubling this tag, if any.
    pub const fn vuln_bit(&self) -> Option<VulnFlags> {
        match self {
            AttributeTag::Fire => Some(VulnFlags::FIRE),
            AttributeTag::Cold => Some(VulnFlags::COLD),
            AttributeTag::Elec => Some(VulnFlags::ELEC),
            AttributeTag::Acid => Some(VulnFlags::ACID),
            AttributeTag::Poison => Some(VulnFlags::POISON),
            _ => None,
        }
    }

    /// The timed condition a status-carrier tag inflicts, if any.
    pub const fn condition(&self) -> Option<ConditionKind> {
        match self {
            AttributeTag::Confusion => Some(ConditionKind::Confusion),
            AttributeTag::Fear => Some(ConditionKind::Fear),
            AttributeTag::Sleep => Some(ConditionKind::Sleep),
            AttributeTag::Slow => Some(ConditionKind::Slow),
            AttributeTag::Stun => Some(ConditionKind::Stun),
            _ => None,
        }
    }
}

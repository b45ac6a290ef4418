//! Creature system: species templates, live instances, the handle arena,
//! and the lore side-channel.

mod arena;
#[allow(clippy::module_inception)]
mod creature;
mod lore;
mod species;

pub use arena::{CreatureArena, CreatureHandle};
pub use creature::{AlignFlags, ConditionKind, Creature, TimedConditions};
pub use lore::{LoreBook, LoreEntry, LoreEvent};
pub use species::{
    AuraFlags, BehaviorFlags, Blow, BlowEffect, BlowMethod, BlowTable, DeathSpecial, ImmuneFlags,
    KindFlags, LinkedUniqueGroup, ResistFlags, Species, SpeciesId, SpeciesTable, VulnFlags,
};

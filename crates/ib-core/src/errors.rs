//! Engine error taxonomy.
//!
//! Only programming-contract violations surface here. Expected game-rule
//! negatives (a miss, a resisted effect, zero damage after mitigation) are
//! ordinary [`crate::combat::Outcome`] variants, never errors.

use thiserror::Error;

use crate::creature::{CreatureHandle, SpeciesId};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// Lookup through a handle whose slot was freed or recycled.
    #[error("stale creature handle {0:?}")]
    StaleHandle(CreatureHandle),

    /// Damage or death processing invoked on a creature already resolved
    /// as dead in this pass.
    #[error("creature {0:?} is already dead")]
    AlreadyDead(CreatureHandle),

    /// A species reference with no row in the species table.
    #[error("unknown species {0:?}")]
    UnknownSpecies(SpeciesId),

    /// A dice spec that rolls dice with zero sides.
    #[error("degenerate dice spec {num}d{sides}")]
    DegenerateDice { num: u8, sides: u8 },

    /// A melee plan with zero blows.
    #[error("attack plan has no blows")]
    EmptyAttack,
}

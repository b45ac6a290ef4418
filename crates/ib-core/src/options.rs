//! Global combat rule toggles.

use serde::{Deserialize, Serialize};

/// Options the resolution rules consult.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CombatOptions {
    /// Arena/tournament override: lifts the quasi-unique death veto so
    /// staged fights between monsters can end.
    pub arena_mode: bool,

    /// Refuse player melee against peaceful creatures instead of swinging
    /// and angering them.
    pub forbid_peaceful: bool,
}

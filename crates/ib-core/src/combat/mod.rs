//! Combat resolution: accuracy, damage, status application, and the melee
//! blow sequencer.

mod accuracy;
mod damage;
mod melee;
mod slays;
mod status;

pub use accuracy::{
    bypass_hit, hit_chance, hit_chance_vs, monster_hits_monster, monster_hits_player,
    player_hits_monster,
};
pub use damage::{CritTier, Weapon, critical_roll, melee_damage, shape_full_resist};
pub use melee::{
    AttackContext, AttackMode, AttackPlan, monster_attack_monster, monster_attack_player,
    resolve_melee,
};
pub use slays::{BrandRule, SlayRule, WeaponTraits, melee_multiplier, BRAND_RULES, SLAY_RULES};
pub use status::{apply_status_monster, apply_status_player, status_duration};

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::creature::{ConditionKind, LoreEvent};

/// Structured event tags produced by resolution.
///
/// These identify the message category; formatting them into prose is the
/// UI collaborator's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum CombatEvent {
    Miss,
    Hit { damage: i32 },
    /// A blow landed but left no mark at all.
    Unharmed,
    /// Partial mitigation by a resistance.
    Resists,
    /// A status attempt failed a saving throw.
    StatusResisted { kind: ConditionKind },
    /// A status attempt bounced off an immunity.
    NoEffect,
    StatusInflicted { kind: ConditionKind },
    Critical { tier: CritTier },
    /// Vorpal bonus cuts landed.
    VorpalCut { cuts: u32 },
    /// Vorpal damage already exceeds remaining hit points.
    CutInHalf,
    WakesUp,
    Angered,
    /// A swing at a peaceful creature was refused by the option toggle.
    AttackRefused,
    Flees,
    RecoversCourage,
    Dies,
    Revives,
    Teleported,
    Polymorphed,
    Healed { amount: i32 },
    Captured,
    /// The player took a hit from a natural attack.
    PlayerHit { damage: i32 },
    /// The attacker was burned by the defender's aura.
    AuraRetaliation { damage: i32 },
    /// A ridden mount was hit and jostled its rider.
    MountShaken { damage: i32 },
}

/// What one resolution pass did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Total damage applied to the primary target.
    pub damage_dealt: i32,
    /// The target ended the pass fleeing.
    pub fear: bool,
    /// The target died.
    pub death: bool,
    /// Experience awarded to the player, if any.
    pub experience: u32,
    /// Ordered message tags.
    pub events: Vec<CombatEvent>,
    /// Observations for the lore book.
    pub lore: Vec<LoreEvent>,
}

impl Outcome {
    pub fn push(&mut self, event: CombatEvent) {
        self.events.push(event);
    }

    pub fn observe(&mut self, event: LoreEvent) {
        self.lore.push(event);
    }

    /// Fold a sub-resolution (one blow, one cascade step) into this one.
    pub fn absorb(&mut self, other: Outcome) {
        self.damage_dealt += other.damage_dealt;
        self.fear |= other.fear;
        self.death |= other.death;
        self.experience += other.experience;
        self.events.extend(other.events);
        self.lore.extend(other.lore);
    }

    pub fn has(&self, event: CombatEvent) -> bool {
        self.events.contains(&event)
    }
}

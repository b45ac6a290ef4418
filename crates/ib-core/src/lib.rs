//! ib-core: combat and status-effect resolution for Ironband.
//!
//! This crate is the rules engine: whether an attack hits, what it does
//! after dice, slay/brand and critical multipliers, how resistances gate
//! elemental and status effects, how timed conditions accumulate and
//! decay, and how death resolves (experience, lore, death cascades).
//! It owns no I/O and no randomness; gameplay injects a
//! [`ib_rng::RandomSource`] and consumes the structured [`combat::Outcome`]
//! each entry point returns. Terrain, AI and rendering are collaborators
//! behind the seams in [`world`].

pub mod combat;
pub mod consts;
pub mod creature;
pub mod death;
pub mod effect;
pub mod errors;
pub mod options;
pub mod world;

pub use combat::{AttackMode, AttackPlan, Outcome, Weapon, resolve_melee};
pub use death::apply_damage;
pub use effect::{AttributeTag, EffectEnvelope, EffectSource, project_effect};
pub use errors::EngineError;
pub use world::World;

/// Serde for bitflags types as their raw bits. Unknown bits are retained
/// so newer saves stay loadable by older tables.
macro_rules! impl_bitflags_serde {
    ($type:ty, $repr:ty) => {
        impl serde::Serialize for $type {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                self.bits().serialize(serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $type {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let bits = <$repr>::deserialize(deserializer)?;
                Ok(<$type>::from_bits_retain(bits))
            }
        }
    };
}

pub(crate) use impl_bitflags_serde;

//! Slay and brand multiplier tables.
//!
//! Multipliers are stored x10 for integer math: 10 means x1.0, 25 means
//! x2.5. The combined multiplier is always in `[10, 150]` before critical
//! and vorpal layering.

use bitflags::bitflags;

use crate::combat::Outcome;
use crate::consts::{BASE_MULT, SLAY_MULT_CAP};
use crate::creature::{KindFlags, LoreEvent, ResistFlags, Species, VulnFlags};
use crate::impl_bitflags_serde;

bitflags! {
    /// Weapon-intrinsic slay, brand and vorpal traits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WeaponTraits: u32 {
        const SLAY_ANIMAL = 0x00000001;
        const SLAY_EVIL   = 0x00000002;
        const SLAY_GOOD   = 0x00000004;
        const SLAY_HUMAN  = 0x00000008;
        const SLAY_UNDEAD = 0x00000010;
        const SLAY_DEMON  = 0x00000020;
        const SLAY_ORC    = 0x00000040;
        const SLAY_TROLL  = 0x00000080;
        const SLAY_GIANT  = 0x00000100;
        const SLAY_DRAGON = 0x00000200;
        /// Dragon bane: a stronger slay on the same mask.
        const KILL_DRAGON = 0x00000400;

        const BRAND_ACID  = 0x00010000;
        const BRAND_ELEC  = 0x00020000;
        const BRAND_FIRE  = 0x00040000;
        const BRAND_COLD  = 0x00080000;
        const BRAND_POISON = 0x00100000;

        const VORPAL      = 0x01000000;
    }
}

impl_bitflags_serde!(WeaponTraits, u32);

/// Static slay table row: tag, race mask it bites, x10 multiplier.
#[derive(Debug, Clone, Copy)]
pub struct SlayRule {
    pub tag: WeaponTraits,
    pub mask: KindFlags,
    pub mult: i32,
}

pub const SLAY_RULES: &[SlayRule] = &[
    SlayRule { tag: WeaponTraits::SLAY_ANIMAL, mask: KindFlags::ANIMAL, mult: 25 },
    SlayRule { tag: WeaponTraits::SLAY_EVIL, mask: KindFlags::EVIL, mult: 20 },
    SlayRule { tag: WeaponTraits::SLAY_GOOD, mask: KindFlags::GOOD, mult: 20 },
    SlayRule { tag: WeaponTraits::SLAY_HUMAN, mask: KindFlags::HUMAN, mult: 25 },
    SlayRule { tag: WeaponTraits::SLAY_UNDEAD, mask: KindFlags::UNDEAD, mult: 30 },
    SlayRule { tag: WeaponTraits::SLAY_DEMON, mask: KindFlags::DEMON, mult: 30 },
    SlayRule { tag: WeaponTraits::SLAY_ORC, mask: KindFlags::ORC, mult: 30 },
    SlayRule { tag: WeaponTraits::SLAY_TROLL, mask: KindFlags::TROLL, mult: 30 },
    SlayRule { tag: WeaponTraits::SLAY_GIANT, mask: KindFlags::GIANT, mult: 30 },
    SlayRule { tag: WeaponTraits::SLAY_DRAGON, mask: KindFlags::DRAGON, mult: 30 },
    SlayRule { tag: WeaponTraits::KILL_DRAGON, mask: KindFlags::DRAGON, mult: 50 },
];

/// Static brand table row: tag, immunity mask that short-circuits it, and
/// the vulnerability flag that elevates it.
#[derive(Debug, Clone, Copy)]
pub struct BrandRule {
    pub tag: WeaponTraits,
    pub immunity: ResistFlags,
    pub vuln: VulnFlags,
    pub mult: i32,
    pub vuln_mult: i32,
}

pub const BRAND_RULES: &[BrandRule] = &[
    BrandRule {
        tag: WeaponTraits::BRAND_ACID,
        immunity: ResistFlags::ACID,
        vuln: VulnFlags::ACID,
        mult: 25,
        vuln_mult: 50,
    },
    BrandRule {
        tag: WeaponTraits::BRAND_ELEC,
        immunity: ResistFlags::ELEC,
        vuln: VulnFlags::ELEC,
        mult: 25,
        vuln_mult: 50,
    },
    BrandRule {
        tag: WeaponTraits::BRAND_FIRE,
        immunity: ResistFlags::FIRE,
        vuln: VulnFlags::FIRE,
        mult: 25,
        vuln_mult: 50,
    },
    BrandRule {
        tag: WeaponTraits::BRAND_COLD,
        immunity: ResistFlags::COLD,
        vuln: VulnFlags::COLD,
        mult: 25,
        vuln_mult: 50,
    },
    BrandRule {
        tag: WeaponTraits::BRAND_POISON,
        immunity: ResistFlags::POISON,
        vuln: VulnFlags::POISON,
        mult: 25,
        vuln_mult: 50,
    },
];

/// Combined slay/brand multiplier (x10) for a weapon against a species.
///
/// Takes the max over all matching slay rows and brand rows; a brand that
/// hits a matching immunity contributes only the base multiplier and is
/// marked observed; a matching vulnerability elevates it instead. The
/// result is clamped to `[BASE_MULT, SLAY_MULT_CAP]`.
pub fn melee_multiplier(traits: WeaponTraits, species: &Species, out: &mut Outcome) -> i32 {
    let mut best = BASE_MULT;

    for rule in SLAY_RULES {
        if traits.contains(rule.tag) && species.kind.intersects(rule.mask) {
            out.observe(LoreEvent::SlayObserved(species.id, species.kind & rule.mask));
            best = best.max(rule.mult);
        }
    }

    for rule in BRAND_RULES {
        if !traits.contains(rule.tag) {
            continue;
        }
        if species.resists.intersects(rule.immunity) {
            out.observe(LoreEvent::BrandImmunityObserved(
                species.id,
                species.resists & rule.immunity,
            ));
        } else if species.vuln.intersects(rule.vuln) {
            best = best.max(rule.vuln_mult);
        } else {
            best = best.max(rule.mult);
        }
    }

    best.clamp(BASE_MULT, SLAY_MULT_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::SpeciesId;

    fn animal() -> Species {
        let mut s = Species::stub(SpeciesId(0), "warg", 10, 20);
        s.kind = KindFlags::ANIMAL | KindFlags::EVIL;
        s
    }

    #[test]
    fn test_no_traits_gives_base() {
        let mut out = Outcome::default();
        assert_eq!(
            melee_multiplier(WeaponTraits::empty(), &animal(), &mut out),
            BASE_MULT
        );
        assert!(out.lore.is_empty());
    }

    #[test]
    fn test_matching_slay() {
        let mut out = Outcome::default();
        let mult = melee_multiplier(WeaponTraits::SLAY_ANIMAL, &animal(), &mut out);
        assert_eq!(mult, 25);
        assert!(out
            .lore
            .contains(&LoreEvent::SlayObserved(SpeciesId(0), KindFlags::ANIMAL)));
    }

    #[test]
    fn test_max_of_matching_rules() {
        let mut out = Outcome::default();
        // Animal x2.5 and evil x2.0 both match: take the max.
        let traits = WeaponTraits::SLAY_ANIMAL | WeaponTraits::SLAY_EVIL;
        assert_eq!(melee_multiplier(traits, &animal(), &mut out), 25);
    }

    #[test]
    fn test_brand_immunity_short_circuits() {
        let mut species = animal();
        species.resists |= ResistFlags::FIRE;
        let mut out = Outcome::default();
        let mult = melee_multiplier(WeaponTraits::BRAND_FIRE, &species, &mut out);
        assert_eq!(mult, BASE_MULT);
        assert!(out.lore.contains(&LoreEvent::BrandImmunityObserved(
            SpeciesId(0),
            ResistFlags::FIRE
        )));
    }

    #[test]
    fn test_brand_vulnerability_elevates() {
        let mut species = animal();
        species.vuln |= VulnFlags::COLD;
        let mut out = Outcome::default();
        assert_eq!(
            melee_multiplier(WeaponTraits::BRAND_COLD, &species, &mut out),
            50
        );
    }

    #[test]
    fn test_multiplier_range_over_all_combinations() {
        // Every trait at once, against a species matching everything,
        // must stay inside [10, 150].
        let mut species = animal();
        species.kind = KindFlags::all();
        species.vuln = VulnFlags::all();
        let mut out = Outcome::default();
        let mult = melee_multiplier(WeaponTraits::all(), &species, &mut out);
        assert!((BASE_MULT..=SLAY_MULT_CAP).contains(&mult));
    }
}

//! Lore: what the player has observed about each species.
//!
//! The combat path never writes observation bits into the shared species
//! rows. It emits [`LoreEvent`]s in its outcomes; whoever owns the
//! [`LoreBook`] applies them. This keeps the damage path a pure function of
//! immutable species data plus instance state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{ConditionKind, ImmuneFlags, KindFlags, ResistFlags, SpeciesId};
use crate::effect::AttributeTag;

/// One observation made during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoreEvent {
    /// A creature of this species died with the player credited.
    Killed(SpeciesId),
    /// A creature of this species was seen.
    Sighted(SpeciesId),
    /// A weapon slay visibly bit (or failed to bite) this species.
    SlayObserved(SpeciesId, KindFlags),
    /// A brand was shrugged off by an elemental immunity.
    BrandImmunityObserved(SpeciesId, ResistFlags),
    /// A projected attribute was resisted.
    ResistObserved(SpeciesId, AttributeTag),
    /// A status attempt bounced off an outright immunity.
    StatusImmunityObserved(SpeciesId, ConditionKind),
}

impl LoreEvent {
    pub fn species(&self) -> SpeciesId {
        match *self {
            LoreEvent::Killed(id)
            | LoreEvent::Sighted(id)
            | LoreEvent::SlayObserved(id, _)
            | LoreEvent::BrandImmunityObserved(id, _)
            | LoreEvent::ResistObserved(id, _)
            | LoreEvent::StatusImmunityObserved(id, _) => id,
        }
    }
}

/// Accumulated observations for one species.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoreEntry {
    pub kills: u32,
    pub sights: u32,
    pub observed_slays: KindFlags,
    pub observed_brand_immunities: ResistFlags,
    pub observed_status_immunities: ImmuneFlags,
    /// Distinct projected attributes seen resisted.
    pub observed_resists: Vec<AttributeTag>,
}

/// Observation store for all species.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoreBook {
    entries: HashMap<SpeciesId, LoreEntry>,
}

impl LoreBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, id: SpeciesId) -> Option<&LoreEntry> {
        self.entries.get(&id)
    }

    pub fn kills(&self, id: SpeciesId) -> u32 {
        self.entries.get(&id).map_or(0, |e| e.kills)
    }

    pub fn record(&mut self, event: &LoreEvent) {
        let entry = self.entries.entry(event.species()).or_default();
        match *event {
            LoreEvent::Killed(_) => entry.kills += 1,
            LoreEvent::Sighted(_) => entry.sights += 1,
            LoreEvent::SlayObserved(_, kind) => entry.observed_slays |= kind,
            LoreEvent::BrandImmunityObserved(_, resist) => {
                entry.observed_brand_immunities |= resist;
            }
            LoreEvent::ResistObserved(_, attr) => {
                if !entry.observed_resists.contains(&attr) {
                    entry.observed_resists.push(attr);
                }
            }
            LoreEvent::StatusImmunityObserved(_, kind) => {
                entry.observed_status_immunities |= match kind {
                    ConditionKind::Sleep => ImmuneFlags::SLEEP,
                    ConditionKind::Stun => ImmuneFlags::STUN,
                    ConditionKind::Confusion => ImmuneFlags::CONFUSION,
                    ConditionKind::Fear => ImmuneFlags::FEAR,
                    ConditionKind::Slow => ImmuneFlags::SLOW,
                    // Haste/invulnerability have no immunity bit; nothing
                    // to learn from them.
                    _ => ImmuneFlags::empty(),
                };
            }
        }
    }

    pub fn record_all(&mut self, events: &[LoreEvent]) {
        for event in events {
            self.record(event);
        }
    }
}

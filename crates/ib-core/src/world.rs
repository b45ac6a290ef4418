//! The mutable state the resolution pipeline runs against: the creature
//! arena, the species store, the player, and the collaborator seams
//! (grid queries, diary sink).

use ib_rng::Dice;
use serde::{Deserialize, Serialize};

use crate::creature::{
    AuraFlags, ConditionKind, Creature, CreatureArena, CreatureHandle, LinkedUniqueGroup,
    LoreBook, Species, SpeciesId, SpeciesTable, TimedConditions,
};
use crate::effect::EffectTable;
use crate::errors::EngineError;
use crate::options::CombatOptions;

/// Read-only positional queries answered by the dungeon collaborator.
pub trait GridQuery {
    /// Whether an effect can travel between two cells.
    fn line_of_effect(&self, from: (i8, i8), to: (i8, i8)) -> bool;
}

/// Featureless grid: everything sees everything. Default for tests and
/// staged fights.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenField;

impl GridQuery for OpenField {
    fn line_of_effect(&self, _from: (i8, i8), _to: (i8, i8)) -> bool {
        true
    }
}

/// Milestone notes for the diary collaborator. Write-only, fire-and-forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiaryNote {
    UniqueDefeated(SpeciesId),
    PetKilled(SpeciesId),
}

/// Sink for diary notes.
pub trait EventSink {
    fn record(&mut self, note: DiaryNote);
}

/// Fixed-point experience accumulator (Q16.16): fractional experience from
/// the award formula carries across kills instead of being dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceLedger {
    pub points: u64,
    frac: u32,
}

impl ExperienceLedger {
    /// Bank a Q16.16 amount; returns the whole points gained.
    pub fn award_q16(&mut self, amount: u64) -> u32 {
        let total = self.frac as u64 + amount;
        let gained = total >> 16;
        self.frac = (total & 0xFFFF) as u32;
        self.points += gained;
        gained as u32
    }
}

/// The player, as the combat core sees them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub level: u8,
    pub ac: i32,
    pub save_skill: i32,
    pub hp: i32,
    pub maxhp: i32,
    pub conditions: TimedConditions,
    /// Retributive auras granted by equipment or form.
    pub auras: AuraFlags,
    /// Mount, if riding.
    pub riding: Option<CreatureHandle>,
    pub experience: ExperienceLedger,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            level: 1,
            ac: 0,
            save_skill: 20,
            hp: 20,
            maxhp: 20,
            conditions: TimedConditions::default(),
            auras: AuraFlags::empty(),
            riding: None,
            experience: ExperienceLedger::default(),
        }
    }
}

impl Player {
    pub fn is_stunned(&self) -> bool {
        self.conditions.is_active(ConditionKind::Stun)
    }
}

/// Everything one resolution pass may read or write. The core assumes
/// exclusive access for the duration of a pass.
pub struct World {
    pub species: SpeciesTable,
    pub arena: CreatureArena,
    pub player: Player,
    pub options: CombatOptions,
    pub lore: LoreBook,
    pub linked_uniques: Vec<LinkedUniqueGroup>,
    pub effects: EffectTable,
    pub grid: Box<dyn GridQuery>,
    pub diary: Option<Box<dyn EventSink>>,
}

impl Default for World {
    fn default() -> Self {
        Self {
            species: SpeciesTable::new(),
            arena: CreatureArena::new(),
            player: Player::default(),
            options: CombatOptions::default(),
            lore: LoreBook::new(),
            linked_uniques: Vec::new(),
            effects: EffectTable::standard(),
            grid: Box::new(OpenField),
            diary: None,
        }
    }
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a creature of a known species at a cell.
    pub fn spawn(
        &mut self,
        species: SpeciesId,
        maxhp: i32,
        x: i8,
        y: i8,
    ) -> Result<CreatureHandle, EngineError> {
        let row = self.species.get(species)?;
        let mut creature = Creature::new(species, maxhp).at(x, y);
        creature.alert_radius = row.alert_radius;
        if row.base_sleep > 0 {
            creature
                .conditions
                .extend_to(ConditionKind::Sleep, row.base_sleep as u16);
        }
        Ok(self.arena.spawn(creature))
    }

    /// Species row for a live creature.
    pub fn species_of(&self, handle: CreatureHandle) -> Result<&Species, EngineError> {
        self.species.get(self.arena.get(handle)?.species)
    }

    /// Damage dice of a retributive aura, scaled by the owner's level.
    pub fn aura_dice(level: u8) -> Dice {
        Dice::plain(1, level / 2 + 1)
    }

    pub fn note(&mut self, note: DiaryNote) {
        if let Some(diary) = self.diary.as_mut() {
            diary.record(note);
        }
    }
}

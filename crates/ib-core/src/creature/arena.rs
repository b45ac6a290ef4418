//! Generation-checked arena for live creatures.
//!
//! Replaces the raw-index live-creature array of old band codebases:
//! handles carry a generation, so a stale reference to a dead (or recycled)
//! slot fails fast instead of silently addressing a new occupant.

use serde::{Deserialize, Serialize};

use super::Creature;
use crate::errors::EngineError;

/// Stable reference to a live creature. Invalidated on death/removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreatureHandle {
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Slot {
    generation: u32,
    occupant: Option<Creature>,
}

/// The live-creature table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatureArena {
    slots: Vec<Slot>,
    live: usize,
}

impl CreatureArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a creature, reusing the first free slot.
    pub fn spawn(&mut self, creature: Creature) -> CreatureHandle {
        self.live += 1;
        if let Some(index) = self.slots.iter().position(|s| s.occupant.is_none()) {
            let slot = &mut self.slots[index];
            slot.occupant = Some(creature);
            return CreatureHandle {
                index: index as u32,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            occupant: Some(creature),
        });
        CreatureHandle {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    fn slot(&self, handle: CreatureHandle) -> Result<&Slot, EngineError> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation && s.occupant.is_some())
            .ok_or(EngineError::StaleHandle(handle))
    }

    pub fn get(&self, handle: CreatureHandle) -> Result<&Creature, EngineError> {
        Ok(self.slot(handle)?.occupant.as_ref().unwrap())
    }

    pub fn get_mut(&mut self, handle: CreatureHandle) -> Result<&mut Creature, EngineError> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation && s.occupant.is_some())
            .ok_or(EngineError::StaleHandle(handle))?;
        Ok(slot.occupant.as_mut().unwrap())
    }

    /// Remove a creature, bumping the slot generation so the handle (and
    /// any copy of it) goes stale.
    pub fn remove(&mut self, handle: CreatureHandle) -> Result<Creature, EngineError> {
        self.slot(handle)?;
        let slot = &mut self.slots[handle.index as usize];
        slot.generation += 1;
        self.live -= 1;
        Ok(slot.occupant.take().unwrap())
    }

    pub fn is_live(&self, handle: CreatureHandle) -> bool {
        self.slot(handle).is_ok()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (CreatureHandle, &Creature)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.occupant.as_ref().map(|c| {
                (
                    CreatureHandle {
                        index: i as u32,
                        generation: s.generation,
                    },
                    c,
                )
            })
        })
    }

    /// Handle of the creature occupying cell `(x, y)`, if any.
    pub fn at(&self, x: i8, y: i8) -> Option<CreatureHandle> {
        self.iter()
            .find(|(_, c)| c.x == x && c.y == y)
            .map(|(h, _)| h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::SpeciesId;

    fn creature() -> Creature {
        Creature::new(SpeciesId(0), 10)
    }

    #[test]
    fn test_spawn_and_get() {
        let mut arena = CreatureArena::new();
        let h = arena.spawn(creature());
        assert_eq!(arena.get(h).unwrap().hp, 10);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_remove_invalidates_handle() {
        let mut arena = CreatureArena::new();
        let h = arena.spawn(creature());
        arena.remove(h).unwrap();
        assert_eq!(arena.get(h), Err(EngineError::StaleHandle(h)));
        assert!(!arena.is_live(h));
    }

    #[test]
    fn test_recycled_slot_gets_new_generation() {
        let mut arena = CreatureArena::new();
        let old = arena.spawn(creature());
        arena.remove(old).unwrap();
        let new = arena.spawn(creature());
        assert_eq!(old.index, new.index);
        assert_ne!(old.generation, new.generation);
        // The stale handle must not reach the new occupant.
        assert!(arena.get(old).is_err());
        assert!(arena.get(new).is_ok());
    }

    #[test]
    fn test_double_remove_fails() {
        let mut arena = CreatureArena::new();
        let h = arena.spawn(creature());
        arena.remove(h).unwrap();
        assert_eq!(arena.remove(h), Err(EngineError::StaleHandle(h)));
    }

    #[test]
    fn test_lookup_by_cell() {
        let mut arena = CreatureArena::new();
        let h = arena.spawn(creature().at(3, 4));
        arena.spawn(creature().at(5, 5));
        assert_eq!(arena.at(3, 4), Some(h));
        assert_eq!(arena.at(9, 9), None);
    }
}

//! Fixed-capacity pools of reusable entities.
//!
//! Every slot is created up front and parked at [`PARKED_POSITION`] while
//! inactive. Spawning claims the lowest-index inactive slot; when none is
//! left the request is dropped and the caller decides how to report it.

use shmup_core::{
    Bounds, EntitySnapshot, PoolHandle, PoolKind, PoolView, SlotId, Vec2, PARKED_POSITION,
};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Slot {
    position: Vec2,
    velocity: Vec2,
    active: bool,
}

impl Slot {
    const PARKED: Self = Self {
        position: PARKED_POSITION,
        velocity: Vec2::ZERO,
        active: false,
    };
}

/// Fixed set of entities of one kind, recycled instead of allocated.
#[derive(Clone, Debug)]
pub struct Pool {
    kind: PoolKind,
    bounds: Bounds,
    slots: Vec<Slot>,
    cursor: usize,
}

impl Pool {
    /// Creates a pool with every slot parked.
    #[must_use]
    pub fn new(kind: PoolKind, capacity: usize, bounds: Bounds) -> Self {
        Self {
            kind,
            bounds,
            slots: vec![Slot::PARKED; capacity],
            cursor: 0,
        }
    }

    /// Kind of entity stored in the pool.
    #[must_use]
    pub const fn kind(&self) -> PoolKind {
        self.kind
    }

    /// Number of slots, active or not.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of active slots.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.active).count()
    }

    /// Reports whether the slot is in play.
    #[must_use]
    pub fn is_active(&self, slot: SlotId) -> bool {
        self.slot(slot).is_some_and(|entry| entry.active)
    }

    /// Position of the slot; the parked position while inactive.
    #[must_use]
    pub fn position(&self, slot: SlotId) -> Option<Vec2> {
        self.slot(slot).map(|entry| entry.position)
    }

    /// Claims the lowest-index inactive slot.
    ///
    /// The returned claim must be activated before the slot is considered in
    /// play; dropping it leaves the slot parked.
    pub fn acquire(&mut self) -> Option<Claim<'_>> {
        let index = self.slots.iter().position(|slot| !slot.active)?;
        Some(Claim { pool: self, index })
    }

    /// Claims the first inactive slot at or after the rotating cursor.
    ///
    /// Repeated calls spread activations across the pool instead of always
    /// reusing the lowest index.
    pub fn acquire_wrapping(&mut self) -> Option<Claim<'_>> {
        let capacity = self.slots.len();
        let index = (0..capacity)
            .map(|offset| (self.cursor + offset) % capacity)
            .find(|&index| !self.slots[index].active)?;
        self.cursor = (index + 1) % capacity;
        Some(Claim { pool: self, index })
    }

    /// Parks the slot. Returns `false` when it was already inactive.
    pub fn deactivate(&mut self, slot: SlotId) -> bool {
        let Some(entry) = self.slot_mut(slot) else {
            return false;
        };
        if !entry.active {
            return false;
        }
        *entry = Slot::PARKED;
        true
    }

    /// Parks every slot, reporting the ones that were active.
    pub fn deactivate_all(&mut self, parked: &mut Vec<SlotId>) {
        for (index, entry) in self.slots.iter_mut().enumerate() {
            if entry.active {
                *entry = Slot::PARKED;
                parked.push(slot_id(index));
            }
        }
    }

    /// Integrates active slots and parks the ones that left the bounds.
    pub fn update(&mut self, dt: f32, parked: &mut Vec<SlotId>) {
        for (index, entry) in self.slots.iter_mut().enumerate() {
            if !entry.active {
                continue;
            }
            entry.position += entry.velocity * dt;
            if !self.bounds.contains(entry.position) {
                *entry = Slot::PARKED;
                parked.push(slot_id(index));
            }
        }
    }

    /// Captures a snapshot of every slot.
    #[must_use]
    pub fn view(&self) -> PoolView {
        PoolView::from_snapshots(
            self.slots
                .iter()
                .enumerate()
                .map(|(index, entry)| EntitySnapshot {
                    handle: PoolHandle::new(self.kind, slot_id(index)),
                    position: entry.position,
                    velocity: entry.velocity,
                    active: entry.active,
                })
                .collect(),
        )
    }

    fn slot(&self, slot: SlotId) -> Option<&Slot> {
        self.slots.get(slot.get() as usize)
    }

    fn slot_mut(&mut self, slot: SlotId) -> Option<&mut Slot> {
        self.slots.get_mut(slot.get() as usize)
    }
}

/// Exclusive claim on an inactive slot returned by [`Pool::acquire`].
#[derive(Debug)]
pub struct Claim<'a> {
    pool: &'a mut Pool,
    index: usize,
}

impl Claim<'_> {
    /// Slot that would be activated.
    #[must_use]
    pub fn slot(&self) -> SlotId {
        slot_id(self.index)
    }

    /// Places the entity in play.
    ///
    /// A position outside the pool bounds leaves the slot parked and yields
    /// `None`.
    pub fn activate(self, position: Vec2, velocity: Vec2) -> Option<SlotId> {
        if !self.pool.bounds.contains(position) {
            return None;
        }
        self.pool.slots[self.index] = Slot {
            position,
            velocity,
            active: true,
        };
        Some(slot_id(self.index))
    }
}

fn slot_id(index: usize) -> SlotId {
    SlotId::new(u32::try_from(index).unwrap_or(u32::MAX))
}

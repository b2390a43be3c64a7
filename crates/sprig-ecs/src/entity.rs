use std::fmt;

use tracing::warn;

/// A generational entity handle. `index` names the slot, `generation` counts how
/// many times that slot has been reissued.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityHandle {
    pub(crate) index: i32,
    pub(crate) generation: i32,
}

impl EntityHandle {
    /// The reserved "no entity" handle.
    pub const NULL: EntityHandle = EntityHandle {
        index: -1,
        generation: -1,
    };

    /// Create a handle from raw parts (mainly for testing).
    pub const fn from_raw(index: i32, generation: i32) -> Self {
        Self { index, generation }
    }

    /// The slot index of this entity, `-1` for the null handle.
    pub fn index(&self) -> i32 {
        self.index
    }

    /// The generation of this entity (incremented on reuse).
    pub fn generation(&self) -> i32 {
        self.generation
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// Slot index usable for array access, `None` for negative indices.
    pub(crate) fn slot(&self) -> Option<usize> {
        usize::try_from(self.index).ok()
    }
}

impl Default for EntityHandle {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Fixed-capacity slot arena with generational tracking and a deferred
/// deletion queue.
///
/// Slots are handed out from `next_free` until a slot is released; released
/// slots are reused last-in first-out with their generation bumped. A slot
/// whose generation reaches `i32::MAX` is retired instead of being reused.
pub struct EntityArena {
    capacity: usize,
    /// Current handle per slot.
    handles: Vec<EntityHandle>,
    /// Position of each slot inside `active`, `None` when the slot is free.
    positions: Vec<Option<usize>>,
    active: Vec<EntityHandle>,
    free_list: Vec<EntityHandle>,
    next_free: usize,
    pending: Vec<EntityHandle>,
    pending_flags: Vec<bool>,
}

impl EntityArena {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            handles: vec![EntityHandle::NULL; capacity],
            positions: vec![None; capacity],
            active: Vec::with_capacity(capacity),
            free_list: Vec::with_capacity(capacity),
            next_free: 0,
            pending: Vec::new(),
            pending_flags: vec![false; capacity],
        }
    }

    /// Claim a slot, preferring the most recently released one. Returns
    /// [`EntityHandle::NULL`] when every slot is live.
    pub fn allocate(&mut self) -> EntityHandle {
        if self.active.len() >= self.capacity {
            return EntityHandle::NULL;
        }

        let handle = if let Some(freed) = self.free_list.pop() {
            EntityHandle {
                index: freed.index,
                generation: freed.generation + 1,
            }
        } else {
            if self.next_free >= self.capacity {
                return EntityHandle::NULL;
            }
            let index = self.next_free;
            self.next_free += 1;
            EntityHandle {
                index: index as i32,
                generation: 0,
            }
        };

        let slot = handle.index as usize;
        self.handles[slot] = handle;
        self.positions[slot] = Some(self.active.len());
        self.active.push(handle);
        handle
    }

    /// Check if a handle refers to the current occupant of a live slot.
    pub fn is_live(&self, handle: EntityHandle) -> bool {
        let Some(slot) = handle.slot() else {
            return false;
        };
        slot < self.capacity && self.positions[slot].is_some() && self.handles[slot] == handle
    }

    /// Queue a live entity for removal at the next maintenance point.
    pub fn queue_delete(&mut self, handle: EntityHandle) -> bool {
        if !self.is_live(handle) {
            warn!("Tried to delete non active entity {handle:?}");
            return false;
        }
        let slot = handle.index as usize;
        if self.pending_flags[slot] {
            warn!("Entity {handle:?} is already queued for deletion");
            return false;
        }
        self.pending_flags[slot] = true;
        self.pending.push(handle);
        true
    }

    /// Whether a handle is waiting for the next maintenance point.
    pub fn is_pending_delete(&self, handle: EntityHandle) -> bool {
        self.is_live(handle) && self.pending_flags[handle.index as usize]
    }

    /// Take every queued deletion, in request order.
    pub(crate) fn drain_pending(&mut self) -> Vec<EntityHandle> {
        std::mem::take(&mut self.pending)
    }

    /// Return a live slot to the free list. Returns `true` if it was live.
    pub(crate) fn release(&mut self, handle: EntityHandle) -> bool {
        if !self.is_live(handle) {
            return false;
        }
        let slot = handle.index as usize;
        let Some(position) = self.positions[slot].take() else {
            return false;
        };

        self.active.swap_remove(position);
        if let Some(moved) = self.active.get(position) {
            self.positions[moved.index as usize] = Some(position);
        }
        self.pending_flags[slot] = false;
        if handle.generation == i32::MAX {
            warn!("Retiring slot {slot}, its generations are exhausted");
        } else {
            self.free_list.push(handle);
        }
        true
    }

    /// The live handle occupying `slot`, or [`EntityHandle::NULL`].
    pub fn handle_at(&self, slot: usize) -> EntityHandle {
        match self.positions.get(slot) {
            Some(Some(_)) => self.handles[slot],
            _ => EntityHandle::NULL,
        }
    }

    /// Live handles in active-list order.
    pub fn active(&self) -> &[EntityHandle] {
        &self.active
    }

    /// The last handle in the active list, or [`EntityHandle::NULL`] when empty.
    pub fn last_active(&self) -> EntityHandle {
        self.active.last().copied().unwrap_or(EntityHandle::NULL)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Maximum number of live entities.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_sequential() {
        let mut arena = EntityArena::new(8);
        let e0 = arena.allocate();
        let e1 = arena.allocate();
        assert_eq!(e0.index(), 0);
        assert_eq!(e1.index(), 1);
        assert_eq!(e0.generation(), 0);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn release_and_reuse_lifo() {
        let mut arena = EntityArena::new(8);
        let e0 = arena.allocate();
        let e1 = arena.allocate();
        let _e2 = arena.allocate();
        assert!(arena.release(e0));
        assert!(arena.release(e1));

        let reused = arena.allocate();
        assert_eq!(reused, EntityHandle::from_raw(1, 1));
        let reused = arena.allocate();
        assert_eq!(reused, EntityHandle::from_raw(0, 1));
    }

    #[test]
    fn capacity_exhausted_returns_null() {
        let mut arena = EntityArena::new(2);
        arena.allocate();
        arena.allocate();
        assert!(arena.allocate().is_null());
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn double_queue_rejected() {
        let mut arena = EntityArena::new(4);
        let e = arena.allocate();
        assert!(arena.queue_delete(e));
        assert!(!arena.queue_delete(e));
        assert!(arena.is_pending_delete(e));
        assert_eq!(arena.drain_pending(), vec![e]);
    }

    #[test]
    fn stale_handle_not_live() {
        let mut arena = EntityArena::new(4);
        let e0 = arena.allocate();
        arena.release(e0);
        assert!(!arena.is_live(e0));
        let e0_new = arena.allocate();
        assert_eq!(e0_new.index(), e0.index());
        assert!(arena.is_live(e0_new));
        assert!(!arena.is_live(e0));
    }

    #[test]
    fn exhausted_slot_is_retired() {
        let mut arena = EntityArena::new(1);
        let first = arena.allocate();
        let last = EntityHandle::from_raw(0, i32::MAX);
        arena.handles[0] = last;
        arena.active[0] = last;

        assert!(arena.release(last));
        assert!(arena.allocate().is_null());
        assert!(!arena.is_live(first));
        assert!(!arena.is_live(last));
        assert!(arena.is_empty());
    }

    #[test]
    fn null_and_out_of_range_not_live() {
        let mut arena = EntityArena::new(2);
        arena.allocate();
        assert!(!arena.is_live(EntityHandle::NULL));
        assert!(!arena.is_live(EntityHandle::from_raw(7, 0)));
    }

    #[test]
    fn swap_remove_keeps_positions() {
        let mut arena = EntityArena::new(4);
        let e0 = arena.allocate();
        let e1 = arena.allocate();
        let e2 = arena.allocate();
        arena.release(e0);
        assert_eq!(arena.active(), &[e2, e1]);
        assert!(arena.release(e2));
        assert_eq!(arena.active(), &[e1]);
        assert_eq!(arena.last_active(), e1);
        assert_eq!(arena.handle_at(1), e1);
        assert!(arena.handle_at(2).is_null());
    }
}

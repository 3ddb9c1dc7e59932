//! Fixed-capacity object pool
//!
//! Slots are allocated by a first-free linear scan and released by clearing
//! their active flag. The pool never grows: when every slot is taken,
//! allocation returns `None` and the caller drops the spawn. Payload memory is
//! reused as-is on the next allocation.

/// Handle to a pool slot
///
/// Valid only for the frame it was obtained in; re-read positions from the
/// pool instead of holding on to ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

impl SlotId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One slot: payload is meaningful only while `active`
#[derive(Debug, Clone)]
pub struct PoolSlot<T> {
    active: bool,
    payload: T,
}

/// Fixed-capacity slot table
#[derive(Debug, Clone)]
pub struct ObjectPool<T> {
    slots: Vec<PoolSlot<T>>,
    active: usize,
}

impl<T: Default> ObjectPool<T> {
    /// Create a pool with `capacity` inactive slots
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| PoolSlot {
                active: false,
                payload: T::default(),
            })
            .collect();
        Self { slots, active: 0 }
    }
}

impl<T> ObjectPool<T> {
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn is_full(&self) -> bool {
        self.active == self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    fn first_free(&self) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        self.slots.iter().position(|s| !s.active)
    }

    /// Claim the first free slot with a fresh payload
    pub fn allocate(&mut self, payload: T) -> Option<SlotId> {
        let i = self.first_free()?;
        let slot = &mut self.slots[i];
        slot.active = true;
        slot.payload = payload;
        self.active += 1;
        Some(SlotId(i))
    }

    /// Claim the first free slot and initialise it in place
    ///
    /// `init` sees whatever the previous occupant left behind and must write
    /// every field the new entity reads.
    pub fn allocate_with(&mut self, init: impl FnOnce(&mut T)) -> Option<SlotId> {
        let i = self.first_free()?;
        let slot = &mut self.slots[i];
        slot.active = true;
        init(&mut slot.payload);
        self.active += 1;
        Some(SlotId(i))
    }

    /// Release a slot. Returns false if it was not active.
    pub fn release(&mut self, id: SlotId) -> bool {
        match self.slots.get_mut(id.0) {
            Some(slot) if slot.active => {
                slot.active = false;
                self.active -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn is_active(&self, id: SlotId) -> bool {
        self.slots.get(id.0).is_some_and(|s| s.active)
    }

    /// Payload of an active slot
    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots
            .get(id.0)
            .filter(|s| s.active)
            .map(|s| &s.payload)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots
            .get_mut(id.0)
            .filter(|s| s.active)
            .map(|s| &mut s.payload)
    }

    /// Active slots in slot order
    pub fn iter_active(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.active)
            .map(|(i, s)| (SlotId(i), &s.payload))
    }

    pub fn for_each_active(&self, mut f: impl FnMut(SlotId, &T)) {
        for (id, payload) in self.iter_active() {
            f(id, payload);
        }
    }

    pub fn for_each_active_mut(&mut self, mut f: impl FnMut(SlotId, &mut T)) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.active {
                f(SlotId(i), &mut slot.payload);
            }
        }
    }

    /// Visit every active slot once, releasing those for which `keep` returns false
    ///
    /// Returns the number of released slots. Releasing happens in place, so a
    /// slot is never visited twice and later slots are never skipped.
    pub fn retain_active(&mut self, mut keep: impl FnMut(SlotId, &mut T) -> bool) -> usize {
        let mut released = 0;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.active && !keep(SlotId(i), &mut slot.payload) {
                slot.active = false;
                released += 1;
            }
        }
        self.active -= released;
        released
    }

    /// Release every slot
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.active = false;
        }
        self.active = 0;
    }
}

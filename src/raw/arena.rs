use alloc::vec::Vec;

use super::handle::{Generation, Handle};

#[derive(Clone)]
struct Slot<T> {
    generation: Generation,
    element: Option<T>,
}

/// Slot storage with stable handles.
///
/// An element never moves once allocated. Vacating a slot bumps its generation, so a
/// `(Handle, Generation)` pair taken earlier can be recognised as stale after reuse.
/// A slot whose generation runs out is retired and never handed out again.
///
/// `clear` forgets every slot, so pairs issued before it may match again afterwards;
/// telling those apart is up to the owner.
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<Handle>,
    retired: usize,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            retired: 0,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            retired: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    pub(crate) const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len() + self.retired)
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn alloc(&mut self, element: T) -> Handle {
        if let Some(h) = self.free.pop() {
            self.slots[h.to_index()].element = Some(element);
            h
        } else {
            assert!(
                self.slots.len() < Handle::MAX,
                "`Arena::alloc()` - arena is at maximum capacity ({})",
                Handle::MAX
            );
            self.slots.push(Slot {
                generation: Generation::default(),
                element: Some(element),
            });
            Handle::from_index(self.slots.len() - 1)
        }
    }

    /// Generation the slot behind `handle` is currently in.
    #[inline]
    pub(crate) fn generation(&self, handle: Handle) -> Generation {
        self.slots[handle.to_index()].generation
    }

    /// Returns true if `handle` was issued under `generation` and still holds its element.
    #[inline]
    pub(crate) fn is_live(&self, handle: Handle, generation: Generation) -> bool {
        self.slots
            .get(handle.to_index())
            .is_some_and(|slot| slot.generation == generation && slot.element.is_some())
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.to_index()].element.as_ref().expect("`Arena::get()` - `handle` is invalid!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.to_index()].element.as_mut().expect("`Arena::get_mut()` - `handle` is invalid!")
    }

    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let slot = &mut self.slots[handle.to_index()];
        let element = slot.element.take().expect("`Arena::take()` - `handle` is invalid!");
        match slot.generation.next() {
            Some(generation) => {
                slot.generation = generation;
                self.free.push(handle);
            }
            None => self.retired += 1,
        }
        element
    }

    /// Drops every element and every slot; capacity is kept.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.retired = 0;
    }
}

#[cfg(test)]
impl<T> Arena<T> {
    /// Slots handed out since the last clear, vacant ones included.
    pub(crate) fn slots_in_use(&self) -> usize {
        self.slots.len()
    }
}

impl<T: Clone> Clone for Arena<T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            free: self.free.clone(),
            retired: self.retired,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.slots.clone_from(&source.slots);
        self.free.clone_from(&source.free);
        self.retired = source.retired;
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn arena_capacity() {
        let arena: Arena<u32> = Arena::with_capacity(10);
        assert_eq!(arena.capacity(), 10);
    }

    #[test]
    fn reused_slot_is_not_live_for_old_generation() {
        let mut arena: Arena<u32> = Arena::new();
        let first = arena.alloc(1);
        let issued = arena.generation(first);
        arena.take(first);
        let second = arena.alloc(2);

        assert_eq!(first, second);
        assert!(!arena.is_live(first, issued));
        assert!(arena.is_live(second, arena.generation(second)));
    }

    #[test]
    fn clear_releases_every_slot() {
        let mut arena: Arena<u32> = Arena::with_capacity(8);
        for i in 0..1_000 {
            arena.alloc(i);
        }

        arena.clear();
        assert!(arena.is_empty());
        assert!(arena.slots.is_empty());
        assert!(arena.free.is_empty());
        assert!(arena.capacity() >= 1_000);

        // Lowest slots are handed out first again.
        assert_eq!(arena.alloc(42).to_index(), 0);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn exhausted_slot_is_retired() {
        let mut arena: Arena<u32> = Arena::new();
        let handle = arena.alloc(0);
        let mut issued = Vec::new();

        // Cycle one slot until its generation runs out.
        loop {
            issued.push(arena.generation(handle));
            arena.take(handle);
            if arena.free.is_empty() {
                break;
            }
            assert_eq!(arena.alloc(0), handle);
        }

        assert_eq!(arena.retired, 1);
        assert!(arena.is_empty());
        let fresh = arena.alloc(1);
        assert_ne!(fresh, handle);
        assert_eq!(arena.len(), 1);
        for generation in issued {
            assert!(!arena.is_live(handle, generation));
        }
    }

    proptest! {
        #[test]
        fn arena_behaves_like_vec(operations in prop::collection::vec(strategy(), 0..256)) {
            let mut model: Vec<(Handle, Generation, u32)> = Vec::new();
            let mut stale: Vec<(Handle, Generation)> = Vec::new();
            let mut arena: Arena<u32> = Arena::new();

            for operation in operations {
                match operation {
                    Operation::Alloc(value) => {
                        let handle = arena.alloc(value);
                        model.push((handle, arena.generation(handle), value));
                    }
                    Operation::GetMut(which, value) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        *arena.get_mut(model[index].0) = value;
                        model[index].2 = value;
                    }
                    Operation::Take(which) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let (handle, generation, expected) = model.swap_remove(index);
                        prop_assert_eq!(arena.take(handle), expected);
                        stale.push((handle, generation));
                    }
                    Operation::Clear => {
                        // Pairs from before a clear are no longer tracked by the arena.
                        arena.clear();
                        model.clear();
                        stale.clear();
                    }
                }

                prop_assert_eq!(arena.len(), model.len());
                prop_assert_eq!(arena.is_empty(), model.is_empty());

                for &(handle, generation, value) in &model {
                    prop_assert!(arena.is_live(handle, generation));
                    prop_assert_eq!(*arena.get(handle), value);
                }
                for &(handle, generation) in &stale {
                    prop_assert!(!arena.is_live(handle, generation));
                }
            }
        }
    }

    #[derive(Clone, Debug)]
    enum Operation {
        Alloc(u32),
        GetMut(usize, u32),
        Take(usize),
        Clear,
    }

    fn strategy() -> impl Strategy<Value = Operation> {
        prop_oneof![
            20 => any::<u32>().prop_map(Operation::Alloc),
            5 => (any::<usize>(), any::<u32>()).prop_map(|(which, value)| Operation::GetMut(which, value)),
            8 => any::<usize>().prop_map(Operation::Take),
            1 => Just(Operation::Clear),
        ]
    }
}

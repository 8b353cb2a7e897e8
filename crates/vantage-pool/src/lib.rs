//! Reusable-object pool for transient render objects.
//!
//! Instead of allocating and dropping particles, decals or scratch meshes every
//! frame, callers [`acquire`](ObjectPool::acquire) a [`PoolHandle`] and
//! [`release`](ObjectPool::release) it when done. The pool is the sole owner of
//! every instance; handles are generational, so a handle kept past its release
//! can never reach the instance's next user.

use tracing::{debug, warn};

/// Opaque reference to an instance currently checked out of an [`ObjectPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    index: u32,
    generation: u32,
}

impl PoolHandle {
    /// Slot index inside the pool. Stable for the lifetime of the pool.
    pub fn index(&self) -> u32 {
        self.index
    }
}

struct Slot<T> {
    value: T,
    generation: u32,
    in_use: bool,
}

type CreateFn<T> = Box<dyn FnMut() -> T>;
type ResetFn<T> = Box<dyn FnMut(&mut T)>;
type DisposeFn<T> = Box<dyn FnMut(T)>;

/// A growable pool of `T` with an available set and an in-use set.
///
/// `available_count() + in_use_count()` only changes when an `acquire` finds
/// the pool starved and creates a new instance, or on [`dispose`](Self::dispose).
pub struct ObjectPool<T> {
    slots: Vec<Slot<T>>,
    /// Indices of slots that are not in use.
    available: Vec<u32>,
    in_use: usize,
    /// Instances created over the pool's lifetime, including disposed ones.
    created: usize,
    /// Generation given to newly created slots. Raised past every handed-out
    /// generation on dispose so pre-dispose handles stay stale.
    base_generation: u32,
    create: CreateFn<T>,
    reset: ResetFn<T>,
    dispose: Option<DisposeFn<T>>,
    soft_ceiling: Option<usize>,
}

impl<T> ObjectPool<T> {
    /// Create a pool pre-filled with `initial_size` instances.
    ///
    /// `create` builds a fresh instance; `reset` returns a used instance to
    /// its pristine state before it becomes available again.
    pub fn new(
        create: impl FnMut() -> T + 'static,
        reset: impl FnMut(&mut T) + 'static,
        initial_size: usize,
    ) -> Self {
        let mut pool = Self {
            slots: Vec::with_capacity(initial_size),
            available: Vec::with_capacity(initial_size),
            in_use: 0,
            created: 0,
            base_generation: 0,
            create: Box::new(create),
            reset: Box::new(reset),
            dispose: None,
            soft_ceiling: None,
        };
        pool.prefill(initial_size);
        pool
    }

    /// Procedure that releases an instance's underlying resources when the
    /// pool is disposed.
    pub fn with_dispose(mut self, dispose: impl FnMut(T) + 'static) -> Self {
        self.dispose = Some(Box::new(dispose));
        self
    }

    /// Log a warning whenever starvation grows the pool beyond `ceiling` instances.
    pub fn with_soft_ceiling(mut self, ceiling: usize) -> Self {
        self.soft_ceiling = Some(ceiling);
        self
    }

    /// Create instances until the pool holds at least `count`.
    pub fn prefill(&mut self, count: usize) {
        while self.slots.len() < count {
            let index = self.push_slot();
            self.available.push(index);
        }
    }

    fn push_slot(&mut self) -> u32 {
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            value: (self.create)(),
            generation: self.base_generation,
            in_use: false,
        });
        self.created += 1;
        index
    }

    /// Check out an instance, creating one if none is available.
    pub fn acquire(&mut self) -> PoolHandle {
        let index = match self.available.pop() {
            Some(index) => index,
            None => {
                let index = self.push_slot();
                let total = self.slots.len();
                match self.soft_ceiling {
                    Some(ceiling) if total > ceiling => {
                        warn!(total, ceiling, "object pool grew past its soft ceiling");
                    }
                    _ => debug!(total, "object pool starved, created instance"),
                }
                index
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.in_use = true;
        self.in_use += 1;
        PoolHandle {
            index,
            generation: slot.generation,
        }
    }

    fn live_slot(&self, handle: PoolHandle) -> Option<&Slot<T>> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.in_use && slot.generation == handle.generation)
    }

    /// Borrow a checked-out instance. `None` once the handle has been released.
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.live_slot(handle).map(|slot| &slot.value)
    }

    /// Mutably borrow a checked-out instance.
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.in_use && slot.generation == handle.generation)
            .map(|slot| &mut slot.value)
    }

    /// Whether `handle` still refers to a checked-out instance.
    pub fn is_in_use(&self, handle: PoolHandle) -> bool {
        self.live_slot(handle).is_some()
    }

    /// Return an instance to the available set.
    ///
    /// Idempotent: releasing a handle that is not in use does nothing and
    /// returns `false`.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        let Some(slot) = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.in_use && slot.generation == handle.generation)
        else {
            return false;
        };
        (self.reset)(&mut slot.value);
        slot.in_use = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.available.push(handle.index);
        self.in_use -= 1;
        true
    }

    /// Release every checked-out instance.
    pub fn release_all(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.in_use {
                (self.reset)(&mut slot.value);
                slot.in_use = false;
                slot.generation = slot.generation.wrapping_add(1);
                self.available.push(index as u32);
            }
        }
        self.in_use = 0;
    }

    /// Visit every checked-out instance.
    pub fn for_each_in_use(&mut self, mut f: impl FnMut(PoolHandle, &mut T)) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.in_use {
                let handle = PoolHandle {
                    index: index as u32,
                    generation: slot.generation,
                };
                f(handle, &mut slot.value);
            }
        }
    }

    /// Release the resources of every instance, in use or not, and empty the pool.
    ///
    /// Outstanding handles become stale. The pool stays usable and grows again
    /// on the next `acquire`.
    pub fn dispose(&mut self) {
        let count = self.slots.len();
        self.available.clear();
        self.in_use = 0;
        for slot in self.slots.drain(..) {
            self.base_generation = self
                .base_generation
                .max(slot.generation.wrapping_add(1));
            if let Some(dispose) = self.dispose.as_mut() {
                dispose(slot.value);
            }
        }
        if count > 0 {
            debug!(count, "object pool disposed");
        }
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    pub fn in_use_count(&self) -> usize {
        self.in_use
    }

    /// Instances owned by the pool (available + in use).
    pub fn total_count(&self) -> usize {
        self.slots.len()
    }

    /// Instances ever created, which only exceeds the initial size after starvation.
    pub fn created_count(&self) -> usize {
        self.created
    }
}

impl<T> Drop for ObjectPool<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

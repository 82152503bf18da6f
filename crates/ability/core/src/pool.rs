//! Object pools owned by each ability system component.
//!
//! Pooled objects are reset when they are released, so whatever is handed out
//! by [`Pool::acquire_with`] is always in its freshly-constructed state.
//! Nothing here is global: every component carries its own [`PoolManager`].

use std::any::TypeId;
use std::collections::HashMap;

use crate::ability::{AbilitySpec, AbilityTask};
use crate::effect::{ActiveEffect, EffectSpec};

/// An object that can be returned to a pool and reused.
pub trait Poolable {
    /// Restores the object to its freshly-constructed state.
    fn reset(&mut self);
}

impl<T: Poolable + ?Sized> Poolable for Box<T> {
    fn reset(&mut self) {
        (**self).reset();
    }
}

/// Running counters for one pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Objects handed out.
    pub acquired: u64,
    /// Objects that had to be constructed because the pool was empty.
    pub created: u64,
    /// Objects returned (retained or dropped).
    pub released: u64,
}

/// A bounded free list of reusable objects.
#[derive(Debug)]
pub struct Pool<T> {
    free: Vec<T>,
    max_retained: usize,
    stats: PoolStats,
}

impl<T: Poolable> Pool<T> {
    pub fn new(max_retained: usize) -> Self {
        Self {
            free: Vec::new(),
            max_retained,
            stats: PoolStats::default(),
        }
    }

    /// Creates a pool holding `count` objects built by `make`.
    pub fn with_prewarm(max_retained: usize, count: usize, mut make: impl FnMut() -> T) -> Self {
        let count = count.min(max_retained);
        let mut free = Vec::with_capacity(count);
        for _ in 0..count {
            free.push(make());
        }
        Self {
            free,
            max_retained,
            stats: PoolStats::default(),
        }
    }

    /// Takes an idle object, or builds one with `make` if none is idle.
    pub fn acquire_with(&mut self, make: impl FnOnce() -> T) -> T {
        self.stats.acquired += 1;
        match self.free.pop() {
            Some(item) => item,
            None => {
                self.stats.created += 1;
                make()
            }
        }
    }

    /// Resets `item` and keeps it for reuse, unless the pool is full.
    pub fn release(&mut self, mut item: T) {
        self.stats.released += 1;
        item.reset();
        if self.free.len() < self.max_retained {
            self.free.push(item);
        }
    }

    /// Number of idle objects.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Drops every idle object.
    pub fn clear(&mut self) {
        self.free.clear();
    }
}

impl<T: Poolable + Default> Pool<T> {
    pub fn acquire(&mut self) -> T {
        self.acquire_with(T::default)
    }
}

/// Free lists of boxed trait objects keyed by concrete type.
///
/// Callers downcast on acquire; see [`AbilityTask`] for the task variant.
pub struct TypedPool<B: ?Sized> {
    free: HashMap<TypeId, Vec<Box<B>>>,
    max_retained: usize,
    stats: PoolStats,
}

impl<B: ?Sized + Poolable> TypedPool<B> {
    pub fn new(max_retained: usize) -> Self {
        Self {
            free: HashMap::new(),
            max_retained,
            stats: PoolStats::default(),
        }
    }

    /// Pops an idle object of concrete type `key`.
    pub fn take(&mut self, key: TypeId) -> Option<Box<B>> {
        self.stats.acquired += 1;
        let item = self.free.get_mut(&key).and_then(Vec::pop);
        if item.is_none() {
            self.stats.created += 1;
        }
        item
    }

    /// Resets `item` and files it under `key`.
    pub fn release(&mut self, key: TypeId, mut item: Box<B>) {
        self.stats.released += 1;
        item.reset();
        let bucket = self.free.entry(key).or_default();
        if bucket.len() < self.max_retained {
            bucket.push(item);
        }
    }

    /// Number of idle objects of concrete type `key`.
    pub fn available(&self, key: TypeId) -> usize {
        self.free.get(&key).map_or(0, Vec::len)
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.free.clear();
    }
}

impl<B: ?Sized> std::fmt::Debug for TypedPool<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedPool")
            .field("types", &self.free.len())
            .field("max_retained", &self.max_retained)
            .field("stats", &self.stats)
            .finish()
    }
}

/// The per-component set of pools.
///
/// Effect contexts are pooled by the component's
/// [`EffectContextFactory`](crate::effect::EffectContextFactory) instead, since
/// their concrete type is pluggable.
#[derive(Debug)]
pub struct PoolManager {
    pub(crate) specs: Pool<EffectSpec>,
    pub(crate) active_effects: Pool<ActiveEffect>,
    pub(crate) ability_specs: Pool<AbilitySpec>,
    pub(crate) tasks: TypedPool<dyn AbilityTask>,
}

impl PoolManager {
    pub fn new(prewarm: usize, max_retained: usize) -> Self {
        Self {
            specs: Pool::with_prewarm(max_retained, prewarm, EffectSpec::default),
            active_effects: Pool::with_prewarm(max_retained, prewarm, ActiveEffect::default),
            ability_specs: Pool::new(max_retained),
            tasks: TypedPool::new(max_retained),
        }
    }

    pub fn spec_stats(&self) -> PoolStats {
        self.specs.stats()
    }

    pub fn active_effect_stats(&self) -> PoolStats {
        self.active_effects.stats()
    }

    pub fn ability_spec_stats(&self) -> PoolStats {
        self.ability_specs.stats()
    }

    pub fn task_stats(&self) -> PoolStats {
        self.tasks.stats()
    }

    /// Idle task objects of type `T`.
    pub fn idle_tasks<T: AbilityTask>(&self) -> usize {
        self.tasks.available(TypeId::of::<T>())
    }

    /// Drops all idle objects.
    pub fn clear(&mut self) {
        self.specs.clear();
        self.active_effects.clear();
        self.ability_specs.clear();
        self.tasks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Scratch {
        values: Vec<u32>,
    }

    impl Poolable for Scratch {
        fn reset(&mut self) {
            self.values.clear();
        }
    }

    #[test]
    fn released_objects_are_reset_and_reused() {
        let mut pool: Pool<Scratch> = Pool::new(4);
        let mut item = pool.acquire();
        item.values.extend([1, 2, 3]);
        pool.release(item);

        let reused = pool.acquire();
        assert!(reused.values.is_empty());
        assert!(reused.values.capacity() >= 3);
        assert_eq!(pool.stats().created, 1);
        assert_eq!(pool.stats().acquired, 2);
    }

    #[test]
    fn pool_drops_beyond_limit() {
        let mut pool: Pool<Scratch> = Pool::new(1);
        pool.release(Scratch::default());
        pool.release(Scratch::default());
        assert_eq!(pool.available(), 1);
        assert_eq!(pool.stats().released, 2);
    }

    #[test]
    fn prewarm_is_capped_by_limit() {
        let pool: Pool<Scratch> = Pool::with_prewarm(2, 10, Scratch::default);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn typed_pool_files_by_type() {
        let mut pool: TypedPool<Scratch> = TypedPool::new(4);
        let key = TypeId::of::<Scratch>();
        assert!(pool.take(key).is_none());

        let mut boxed = Box::new(Scratch::default());
        boxed.values.push(9);
        pool.release(key, boxed);
        assert_eq!(pool.available(key), 1);
        assert!(pool.take(key).is_some_and(|item| item.values.is_empty()));
    }
}

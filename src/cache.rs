//! Compiled factory cache: one [`CompiledFactory`] per root service key.
//!
//! Sharded by key hash so first compilations of unrelated services never
//! contend. Each key maps to a `OnceCell`; the shard lock is held only to
//! fetch or insert that cell, never while compiling.

use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::compiler::CompiledFactory;
use crate::error::{DiError, DiResult};
use crate::internal::FastMap;
use crate::key::Key;

/// Number of shards. Powers of 2 work best for hash distribution.
const SHARD_COUNT: usize = 16;

type FactoryCell = Arc<OnceCell<Arc<CompiledFactory>>>;

/// Memoizes compiled factories by root key.
///
/// Racing first calls for the same key run the compile closure exactly
/// once; every caller receives the same `Arc<CompiledFactory>`. A failed
/// compilation is not cached, so a later call compiles again.
///
/// # Examples
///
/// ```
/// use ferrous_factory::{Constructor, Injectable, Key, Resolver, ServiceCollection};
///
/// struct Clock;
/// impl Injectable for Clock {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::of::<Self>().build(|_| Ok(Clock))]
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_transient::<Clock>().unwrap();
/// let provider = services.build();
///
/// provider.get_instance::<Clock>().unwrap();
/// provider.get_instance::<Clock>().unwrap();
/// assert_eq!(provider.compilations(), 1);
/// ```
pub struct CompiledFactoryCache {
    shards: [RwLock<FastMap<Key, FactoryCell>>; SHARD_COUNT],
    hasher: std::collections::hash_map::RandomState,
    compilations: AtomicUsize,
}

impl CompiledFactoryCache {
    pub fn new() -> Self {
        Self {
            shards: std::array::from_fn(|_| RwLock::new(FastMap::default())),
            hasher: Default::default(),
            compilations: AtomicUsize::new(0),
        }
    }

    /// Returns the cached factory for `key`, compiling it with `compile` on first use.
    pub fn get_or_compile<F>(&self, key: &Key, compile: F) -> DiResult<Arc<CompiledFactory>>
    where
        F: FnOnce() -> DiResult<CompiledFactory>,
    {
        let cell = self.cell(key);
        let factory = cell.get_or_try_init(|| {
            let factory = compile()?;
            self.compilations.fetch_add(1, Ordering::Relaxed);
            Ok::<_, DiError>(Arc::new(factory))
        })?;
        Ok(factory.clone())
    }

    /// The cached factory for `key`, if one was compiled.
    pub fn get(&self, key: &Key) -> Option<Arc<CompiledFactory>> {
        let shard = self.shards[self.shard_index(key)].read();
        shard.get(key)?.get().cloned()
    }

    /// Number of successful compilations so far.
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }

    /// Number of compiled factories held.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.read().values().filter(|cell| cell.get().is_some()).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell(&self, key: &Key) -> FactoryCell {
        let shard = &self.shards[self.shard_index(key)];

        // Fast path: cell already present
        if let Some(cell) = shard.read().get(key) {
            return cell.clone();
        }

        // Slow path: insert once per key
        shard
            .write()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    fn shard_index(&self, key: &Key) -> usize {
        let mut hasher = self.hasher.build_hasher();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % SHARD_COUNT
    }
}

impl Default for CompiledFactoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CompiledFactoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledFactoryCache")
            .field("factories", &self.len())
            .field("compilations", &self.compilations())
            .finish()
    }
}

//! Hash function utilities for the engine's bookkeeping tables
//!
//! Provides ahash-backed maps and sets for the render-state tracker and the
//! lane allocator. Keys are small integers and tuples, so a fast
//! non-cryptographic hasher is used throughout.

use ahash::RandomState;
use std::collections::{HashMap, HashSet};

/// Create a new `HashMap` with the crate's hasher
///
/// # Example
///
/// ```rust
/// use danmaku_core::utils::hashers::create_hash_map;
///
/// let mut map = create_hash_map::<usize, f32>();
/// map.insert(3, 180.0);
/// ```
#[must_use]
pub fn create_hash_map<K, V>() -> HashMap<K, V, RandomState> {
    HashMap::with_hasher(RandomState::new())
}

/// Create a new `HashSet` with the crate's hasher
#[must_use]
pub fn create_hash_set<T>() -> HashSet<T, RandomState> {
    HashSet::with_hasher(RandomState::new())
}

/// `HashMap` alias using the crate's hasher
pub type FastMap<K, V> = HashMap<K, V, RandomState>;

/// `HashSet` alias using the crate's hasher
pub type FastSet<T> = HashSet<T, RandomState>;

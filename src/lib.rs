//! chained-hashmap: a single-threaded, separately chained hash map with
//! per-entry render and dispose hooks.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: build ChainedHashMap from small layers that can each be tested
//!   on their own.
//! - Layers:
//!   - ResizableArray<T>: growable sequence with an observable capacity
//!     policy (double when full, halve below a quarter); holds the buckets.
//!   - Chain + ChainArena<T>: singly linked bucket lists whose nodes live
//!     in one generational arena per map, so rehashing relinks nodes
//!     instead of moving items.
//!   - Entry<K, V>: key, value, cached hash and the hooks captured at
//!     insertion.
//!   - ChainedHashMap<K, V, S>: public map over `ResizableArray<Chain>`.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` (hooks are `Rc` closures).
//! - Duplicate inserts append; the oldest entry for a key answers lookups
//!   until it is removed. `try_insert` gives unique-key semantics.
//! - Each entry stores its `u64` hash; `K: Hash` is never invoked after
//!   insertion, including during growth.
//! - Keys are hashed and compared by content. Wrap pointers in
//!   `ByAddress` for identity semantics.
//!
//! Reentrancy policy
//! - The map calls user code only through `K: Hash`, `K: Eq`, `V: PartialEq`
//!   and the installed hooks. Scans that run `Hash`/`Eq` are covered by a
//!   debug-only guard that panics on nested entry into the same map.
//! - Disposers run after the entry is unlinked and the guard released, so a
//!   disposer may touch anything it can reach.
//!
//! Errors and logging
//! - Fallible operations return `error::Result` with a `thiserror` enum;
//!   nothing panics on bad indices or configuration.
//! - Growth, clearing and configuration changes are logged at `debug`,
//!   array resizing at `trace`, through the `log` facade.

pub mod by_address;
pub mod chain;
mod chained_hash_map;
mod chained_hash_map_proptest;
pub mod entry;
pub mod error;
mod reentrancy;
pub mod resizable_array;

// Public surface
pub use by_address::ByAddress;
pub use chain::{Chain, ChainArena, Link};
pub use chained_hash_map::{
    ChainedHashMap, ChainedHashMapBuilder, Drain, Growth, Iter, IterMut, DEFAULT_LOAD_FACTOR,
    INITIAL_CAPACITY, MAX_BUCKETS,
};
pub use entry::{Disposer, Entry, Hooks, Renderer};
pub use error::{Error, Result};
pub use resizable_array::{ResizableArray, GROWTH_FACTOR};

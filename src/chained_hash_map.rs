//! ChainedHashMap: separate chaining over a resizable array of buckets.
//!
//! Layout
//! - `buckets: ResizableArray<Chain>` holds one chain per bucket; an entry
//!   lives in the chain at `entry.hash % capacity`.
//! - `arena: ChainArena<Entry<K, V>>` stores every chain node of the map.
//! - Each entry's hash is computed once at insertion. Growth relinks nodes
//!   using the stored hash and never calls `K: Hash` again.
//!
//! Duplicate keys
//! - `insert` does not look for an existing key; it appends. A forward scan
//!   finds the oldest entry first, so a newer entry for the same key stays
//!   shadowed until the older one is removed. `try_insert` rejects
//!   duplicates instead.
//!
//! Disposal
//! - Entries are unlinked before their disposers run, so a disposer sees a
//!   consistent map.

use crate::chain::{ArenaIter, ArenaIterMut, Chain, ChainArena, Link};
use crate::entry::{Entry, Hooks};
use crate::error::{Error, Result};
use crate::reentrancy::ScanGuard;
use crate::resizable_array::{ResizableArray, GROWTH_FACTOR};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use hashbrown::hash_map::DefaultHashBuilder;
use log::debug;
use std::rc::Rc;

pub const INITIAL_CAPACITY: usize = 17;
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// Largest bucket count a `ResizableArray<Chain>` can allocate.
pub const MAX_BUCKETS: usize = isize::MAX as usize / core::mem::size_of::<Chain>();

/// What happens to the bucket count once `len` exceeds the threshold.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Growth {
    /// Keep the bucket count; chains just get longer.
    Fixed,
    /// Multiply the bucket count by this factor (at least 2) and rehash.
    Factor(usize),
}

impl Default for Growth {
    fn default() -> Self {
        Growth::Factor(GROWTH_FACTOR)
    }
}

/// A load factor must be finite and leave a threshold of at least 1 at
/// `MAX_BUCKETS`.
fn check_load_factor(load_factor: f64) -> Result<()> {
    if load_factor.is_finite() && load_factor * MAX_BUCKETS as f64 >= 1.0 {
        Ok(())
    } else {
        Err(Error::invalid("load factor", load_factor))
    }
}

/// Configures capacity, load factor, growth and hasher before building.
pub struct ChainedHashMapBuilder<K, V, S = DefaultHashBuilder> {
    capacity: usize,
    load_factor: f64,
    growth: Growth,
    hasher: S,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<K, V> ChainedHashMapBuilder<K, V> {
    pub fn new() -> Self {
        Self {
            capacity: INITIAL_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
            growth: Growth::default(),
            hasher: DefaultHashBuilder::default(),
            _types: PhantomData,
        }
    }
}

impl<K, V> Default for ChainedHashMapBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ChainedHashMapBuilder<K, V, S> {
    /// Initial (and post-`clear`) bucket count.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    pub fn with_growth(mut self, growth: Growth) -> Self {
        self.growth = growth;
        self
    }

    pub fn with_hasher<T>(self, hasher: T) -> ChainedHashMapBuilder<K, V, T> {
        ChainedHashMapBuilder {
            capacity: self.capacity,
            load_factor: self.load_factor,
            growth: self.growth,
            hasher,
            _types: PhantomData,
        }
    }

    pub fn build(self) -> Result<ChainedHashMap<K, V, S>>
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        if self.capacity == 0 {
            return Err(Error::invalid("capacity", self.capacity));
        }
        check_load_factor(self.load_factor)?;
        if let Growth::Factor(f) = self.growth {
            if f < 2 {
                return Err(Error::invalid("growth factor", f));
            }
        }
        Ok(ChainedHashMap::from_parts(
            self.hasher,
            self.capacity,
            self.load_factor,
            self.growth,
        ))
    }
}

impl<K, V, S> fmt::Debug for ChainedHashMapBuilder<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedHashMapBuilder")
            .field("capacity", &self.capacity)
            .field("load_factor", &self.load_factor)
            .field("growth", &self.growth)
            .finish()
    }
}

pub struct ChainedHashMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    buckets: ResizableArray<Chain>,
    arena: ChainArena<Entry<K, V>>,
    len: usize,
    initial_capacity: usize,
    load_factor: f64,
    growth: Growth,
    debug_level: u32,
    // Snapshotted into each entry on insert.
    hooks: Hooks<K, V>,
    guard: ScanGuard,
}

impl<K, V> ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn builder() -> ChainedHashMapBuilder<K, V> {
        ChainedHashMapBuilder::new()
    }
}

impl<K, V> Default for ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over `(&K, &V)` in storage order.
pub struct Iter<'a, K, V> {
    it: ArenaIter<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|e| (e.key(), e.value()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Iterator over `(&K, &mut V)` in storage order.
pub struct IterMut<'a, K, V> {
    it: ArenaIterMut<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|e| e.parts_mut())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Owned `(K, V)` pairs taken out by `drain`; no disposer runs for them.
pub struct Drain<K, V> {
    it: std::vec::IntoIter<Entry<K, V>>,
}

impl<K, V> Iterator for Drain<K, V> {
    type Item = (K, V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(Entry::into_parts)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

// Operations that never hash or compare keys.
impl<K, V, S> ChainedHashMap<K, V, S> {
    fn empty_buckets(capacity: usize, debug_level: u32) -> ResizableArray<Chain> {
        let mut buckets: ResizableArray<Chain> = (0..capacity).map(|_| Chain::new()).collect();
        buckets.shrink_to_fit();
        buckets.set_debug_level(debug_level);
        buckets
    }

    fn from_parts(hasher: S, capacity: usize, load_factor: f64, growth: Growth) -> Self {
        Self {
            hasher,
            buckets: Self::empty_buckets(capacity, 0),
            arena: ChainArena::new(),
            len: 0,
            initial_capacity: capacity,
            load_factor,
            growth,
            debug_level: 0,
            hooks: Hooks::none(),
            guard: ScanGuard::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Largest `len` that does not trigger growth: `floor(capacity * load_factor)`.
    pub fn threshold(&self) -> usize {
        (self.capacity() as f64 * self.load_factor) as usize
    }

    pub fn growth(&self) -> Growth {
        self.growth
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Chain lengths per bucket, in bucket order.
    pub fn bucket_lens(&self) -> Vec<usize> {
        self.buckets.iter().map(Chain::len).collect()
    }

    /// Replace the resize threshold ratio, returning the previous one.
    pub fn set_load_factor(&mut self, load_factor: f64) -> Result<f64> {
        check_load_factor(load_factor)?;
        let old = core::mem::replace(&mut self.load_factor, load_factor);
        debug!("chained map load factor {} -> {}", old, load_factor);
        Ok(old)
    }

    pub fn debug_level(&self) -> u32 {
        self.debug_level
    }

    /// Set how much `Display` reports; returns the previous level.
    pub fn set_debug_level(&mut self, level: u32) -> u32 {
        let old = core::mem::replace(&mut self.debug_level, level);
        self.buckets.set_debug_level(level);
        debug!("chained map debug level {} -> {}", old, level);
        old
    }

    pub fn set_display_key<F>(&mut self, render: F)
    where
        F: Fn(&K, &mut fmt::Formatter<'_>) -> fmt::Result + 'static,
    {
        self.hooks.display_key = Some(Rc::new(render));
    }

    pub fn set_display_value<F>(&mut self, render: F)
    where
        F: Fn(&V, &mut fmt::Formatter<'_>) -> fmt::Result + 'static,
    {
        self.hooks.display_value = Some(Rc::new(render));
    }

    pub fn set_free_key<F>(&mut self, free: F)
    where
        F: Fn(K) + 'static,
    {
        self.hooks.free_key = Some(Rc::new(free));
    }

    pub fn set_free_value<F>(&mut self, free: F)
    where
        F: Fn(V) + 'static,
    {
        self.hooks.free_value = Some(Rc::new(free));
    }

    /// Uninstall all four default hooks. Existing entries keep theirs.
    pub fn clear_hooks(&mut self) {
        self.hooks = Hooks::none();
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.arena.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.arena.iter_mut(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// True if any entry holds a value equal to `value`.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        let _g = self.guard.enter("contains_value");
        self.arena.iter().any(|e| e.value() == value)
    }

    /// Destroy every entry (disposers run) and return to the empty state at
    /// the initial capacity.
    pub fn clear(&mut self) {
        let removed = self.take_entries(self.initial_capacity);
        debug!(
            "chained map cleared {} entries, capacity reset to {}",
            removed.len(),
            self.initial_capacity
        );
        for entry in removed {
            entry.destroy();
        }
    }

    /// Empty the map, handing out owned pairs in bucket order. Capacity is
    /// reset to the initial capacity.
    pub fn drain(&mut self) -> Drain<K, V> {
        Drain {
            it: self.take_entries(self.initial_capacity).into_iter(),
        }
    }

    /// Detach every entry in bucket order and reinitialize the buckets. The
    /// map is consistent (and empty) before any entry is handed back.
    fn take_entries(&mut self, capacity: usize) -> Vec<Entry<K, V>> {
        let mut old = core::mem::replace(
            &mut self.buckets,
            Self::empty_buckets(capacity, self.debug_level),
        );
        let mut arena = core::mem::take(&mut self.arena);
        self.len = 0;
        let mut out = Vec::with_capacity(arena.len());
        for chain in old.iter_mut() {
            out.extend(chain.drain(&mut arena));
        }
        debug_assert!(arena.is_empty());
        out
    }

    fn bucket_index(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    /// Grow while `len` exceeds the threshold and the policy allows it. A
    /// target past `MAX_BUCKETS` leaves the buckets as they are.
    fn grow_if_needed(&mut self) {
        let factor = match self.growth {
            Growth::Fixed => return,
            Growth::Factor(f) => f,
        };
        let mut new_capacity = self.capacity();
        while self.len > (new_capacity as f64 * self.load_factor) as usize {
            match new_capacity.checked_mul(factor) {
                Some(n) if n <= MAX_BUCKETS => new_capacity = n,
                _ => {
                    debug!(
                        "chained map keeps {} buckets at {} entries: no room to grow",
                        self.capacity(),
                        self.len
                    );
                    return;
                }
            }
        }
        if new_capacity != self.capacity() {
            self.rehash(new_capacity);
        }
    }

    fn rehash(&mut self, new_capacity: usize) {
        debug!(
            "chained map growing {} -> {} buckets at {} entries",
            self.capacity(),
            new_capacity,
            self.len
        );
        let mut next = Self::empty_buckets(new_capacity, self.debug_level);
        for chain in self.buckets.iter_mut() {
            for link in chain.detach(&self.arena) {
                let hash = self
                    .arena
                    .item(link)
                    .map(|e| e.hash)
                    .expect("detached link must resolve in its arena");
                let index = (hash % new_capacity as u64) as usize;
                next[index].link_back(&mut self.arena, link);
            }
        }
        self.buckets = next;
    }

    /// Write the map: optional statistics header, then `[i: chain, ...]`.
    pub fn display_to<W: fmt::Write>(&self, w: &mut W) -> fmt::Result {
        let debug = self.debug_level > 0;
        if debug {
            writeln!(w, "Size: {}", self.len)?;
            writeln!(w, "Capacity: {}", self.capacity())?;
            writeln!(w, "Load Factor: {:.6}", self.load_factor)?;
            writeln!(w, "Threshold: {}", self.threshold())?;
        }
        w.write_str("[")?;
        for (i, chain) in self.buckets.iter().enumerate() {
            if i > 0 {
                w.write_str(", ")?;
            }
            write!(w, "{}: {}", i, chain.display(&self.arena, debug))?;
        }
        w.write_str("]")
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_parts(hasher, INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR, Growth::default())
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Append `key -> value` to its bucket. An equal key already present is
    /// not replaced; it shadows this entry until removed.
    pub fn insert(&mut self, key: K, value: V) {
        let hash = {
            let _g = self.guard.enter("insert");
            self.make_hash(&key)
        };
        self.link_new(hash, key, value);
    }

    /// Insert only if no equal key is present.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<()> {
        let hash = {
            let _g = self.guard.enter("try_insert");
            let hash = self.make_hash(&key);
            if self.find_link(hash, &key).is_some() {
                return Err(Error::DuplicateKey);
            }
            hash
        };
        self.link_new(hash, key, value);
        Ok(())
    }

    /// First node in `hash`'s bucket whose key equals `q`.
    fn find_link<Q>(&self, hash: u64, q: &Q) -> Option<Link>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let chain = &self.buckets[self.bucket_index(hash)];
        chain.find(&self.arena, |e| e.key().borrow() == q)
    }

    fn link_new(&mut self, hash: u64, key: K, value: V) {
        let entry = Entry::hashed(key, value, hash, self.hooks.clone());
        let index = self.bucket_index(hash);
        self.buckets[index].push_back(&mut self.arena, entry);
        self.len += 1;
        if self.len > self.threshold() {
            self.grow_if_needed();
        }
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).map(|(_, v)| v)
    }

    /// Stored key and value of the first entry matching `q`.
    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter("get");
        let hash = self.make_hash(q);
        let chain = &self.buckets[self.bucket_index(hash)];
        chain
            .iter(&self.arena)
            .find(|e| e.key().borrow() == q)
            .map(|e| (e.key(), e.value()))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter("get_mut");
        let link = self.find_link(self.make_hash(q), q)?;
        self.arena.item_mut(link).map(Entry::value_mut)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter("contains_key");
        self.find_link(self.make_hash(q), q).is_some()
    }

    /// Replace the value of the entry matching `q`, returning the old value.
    pub fn update<Q>(&mut self, q: &Q, value: V) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let link = {
            let _g = self.guard.enter("update");
            self.find_link(self.make_hash(q), q)
        };
        link.and_then(|l| self.arena.item_mut(l))
            .map(|e| e.replace_value(value))
            .ok_or(Error::KeyNotFound)
    }

    /// Remove the first entry matching `q`. The value goes to the caller;
    /// the key goes to the entry's key disposer, if any.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.unlink(q).map(Entry::into_value)
    }

    /// Remove the first entry matching `q`, handing out key and value
    /// without running any disposer.
    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.unlink(q).map(Entry::into_parts)
    }

    fn unlink<Q>(&mut self, q: &Q) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.guard.enter("remove");
        let hash = self.make_hash(q);
        let index = self.bucket_index(hash);
        let entry = self.buckets[index]
            .unlink_first(&mut self.arena, |e| e.key().borrow() == q)?;
        self.len -= 1;
        Some(entry)
    }
}

impl<K, V, S> Drop for ChainedHashMap<K, V, S> {
    fn drop(&mut self) {
        // Capacity 1 keeps the replacement bucket array minimal.
        for entry in self.take_entries(1) {
            entry.destroy();
        }
    }
}

impl<K, V, S> Extend<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> fmt::Display for ChainedHashMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display_to(f)
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for ChainedHashMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

//! Entry: a key/value pair plus the hooks used to render and dispose of it.
//!
//! Hooks are shared `Rc` closures so that a map can hand the same set to
//! every entry it creates. An entry keeps the hooks it was built with; the
//! map installing different ones later does not reach back into it.

use core::fmt;
use std::rc::Rc;

/// Renders one side of an entry (or one element of a sequence).
pub type Renderer<T> = Rc<dyn Fn(&T, &mut fmt::Formatter<'_>) -> fmt::Result>;

/// Takes ownership of a key or value when the owning container destroys it.
pub type Disposer<T> = Rc<dyn Fn(T)>;

/// Display adapter: uses the renderer when present, the address otherwise.
pub(crate) struct Rendered<'a, T> {
    pub(crate) item: &'a T,
    pub(crate) with: Option<&'a Renderer<T>>,
}

impl<'a, T> fmt::Display for Rendered<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.with {
            Some(render) => render(self.item, f),
            None => write!(f, "{:p}", self.item),
        }
    }
}

/// Renderers and disposers for the key and value of an entry.
pub struct Hooks<K, V> {
    pub display_key: Option<Renderer<K>>,
    pub display_value: Option<Renderer<V>>,
    pub free_key: Option<Disposer<K>>,
    pub free_value: Option<Disposer<V>>,
}

impl<K, V> Hooks<K, V> {
    pub const fn none() -> Self {
        Self {
            display_key: None,
            display_value: None,
            free_key: None,
            free_value: None,
        }
    }
}

impl<K, V> Default for Hooks<K, V> {
    fn default() -> Self {
        Self::none()
    }
}

// Manual impl: cloning only bumps the Rc counts, so K/V need not be Clone.
impl<K, V> Clone for Hooks<K, V> {
    fn clone(&self) -> Self {
        Self {
            display_key: self.display_key.clone(),
            display_value: self.display_value.clone(),
            free_key: self.free_key.clone(),
            free_value: self.free_value.clone(),
        }
    }
}

impl<K, V> fmt::Debug for Hooks<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("display_key", &self.display_key.is_some())
            .field("display_value", &self.display_value.is_some())
            .field("free_key", &self.free_key.is_some())
            .field("free_value", &self.free_value.is_some())
            .finish()
    }
}

pub struct Entry<K, V> {
    key: K,
    value: V,
    // Filled in by the map on insertion; chains are selected from it on rehash.
    pub(crate) hash: u64,
    hooks: Hooks<K, V>,
}

impl<K, V> Entry<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self::with_hooks(key, value, Hooks::none())
    }

    pub fn with_hooks(key: K, value: V, hooks: Hooks<K, V>) -> Self {
        Self {
            key,
            value,
            hash: 0,
            hooks,
        }
    }

    pub(crate) fn hashed(key: K, value: V, hash: u64, hooks: Hooks<K, V>) -> Self {
        Self {
            key,
            value,
            hash,
            hooks,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    pub(crate) fn parts_mut(&mut self) -> (&K, &mut V) {
        (&self.key, &mut self.value)
    }

    pub fn hooks(&self) -> &Hooks<K, V> {
        &self.hooks
    }

    pub(crate) fn replace_value(&mut self, value: V) -> V {
        core::mem::replace(&mut self.value, value)
    }

    /// Hand key and value to the caller; no disposer runs.
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }

    /// Hand the value to the caller and dispose of the key.
    pub(crate) fn into_value(self) -> V {
        let Entry {
            key, value, hooks, ..
        } = self;
        match hooks.free_key {
            Some(free) => free(key),
            None => drop(key),
        }
        value
    }

    /// Destroy the entry, routing key and value through their disposers.
    pub fn destroy(self) {
        let Entry {
            key, value, hooks, ..
        } = self;
        match hooks.free_key {
            Some(free) => free(key),
            None => drop(key),
        }
        match hooks.free_value {
            Some(free) => free(value),
            None => drop(value),
        }
    }
}

impl<K, V> fmt::Display for Entry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = Rendered {
            item: &self.key,
            with: self.hooks.display_key.as_ref(),
        };
        let value = Rendered {
            item: &self.value,
            with: self.hooks.display_value.as_ref(),
        };
        write!(f, "({} : {})", key, value)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Entry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("hash", &self.hash)
            .finish()
    }
}

//! Debug-only scan guard.
//!
//! The map calls user code (`K: Hash`, `K: Eq`) while it walks a chain. A
//! nested call into the same map from there would observe a half-finished
//! operation, so in debug builds each public operation marks itself busy
//! and a second entry panics, naming both operations. Release builds carry
//! no state and the guard is a no-op.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug)]
pub(crate) struct ScanGuard {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // !Send + !Sync, like the map that embeds it.
    _nosend: PhantomData<*mut ()>,
}

impl ScanGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Mark `op` as running until the returned token is dropped.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> Busy<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!(
                    "reentrant call into ChainedHashMap::{op} while ChainedHashMap::{outer} is in progress"
                );
            }
            self.active.set(Some(op));
            Busy { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            Busy { _z: PhantomData }
        }
    }

    #[cfg(all(test, debug_assertions))]
    pub(crate) fn active(&self) -> Option<&'static str> {
        self.active.get()
    }
}

impl Default for ScanGuard {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct Busy<'a> {
    #[cfg(debug_assertions)]
    owner: &'a ScanGuard,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl<'a> Drop for Busy<'a> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.active.get().is_some());
            self.owner.active.set(None);
        }
    }
}

//! ByAddress: key wrapper with pointer-identity `Hash`/`Eq`.
//!
//! The map hashes and compares keys by content. Callers that want two
//! equal-valued but distinct allocations to be different keys wrap the
//! pointer in `ByAddress`; clones of the same `Rc` (or the same `&T`) then
//! address the same entry and nothing else.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::Deref;

#[derive(Clone, Copy, Default)]
pub struct ByAddress<P>(pub P);

impl<P: Deref> ByAddress<P> {
    /// Address of the pointee, metadata stripped.
    pub fn addr(&self) -> *const () {
        (&*self.0 as *const P::Target).cast()
    }

    pub fn into_inner(self) -> P {
        self.0
    }
}

impl<P: Deref> Deref for ByAddress<P> {
    type Target = P::Target;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<P: Deref> PartialEq for ByAddress<P> {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl<P: Deref> Eq for ByAddress<P> {}

impl<P: Deref> Hash for ByAddress<P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.addr() as usize).hash(state);
    }
}

impl<P> fmt::Debug for ByAddress<P>
where
    P: Deref,
    P::Target: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByAddress({:?} @ {:p})", &*self.0, self.addr())
    }
}

// Reentrancy through the public API: user `Hash`/`Eq` code that calls back
// into the map it is being hashed for.
use chained_hashmap::ChainedHashMap;
use std::cell::Cell;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

type Map = ChainedHashMap<PeekingKey, u32>;

// Key whose Hash impl peeks at a map through a raw pointer when armed.
struct PeekingKey {
    id: u32,
    map: Rc<Cell<*const Map>>,
}

impl PartialEq for PeekingKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for PeekingKey {}

impl Hash for PeekingKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let m = self.map.get();
        if !m.is_null() {
            // Re-enter the same map during hashing.
            unsafe {
                let _ = (*m).contains_key(&PeekingKey {
                    id: 0,
                    map: Rc::new(Cell::new(std::ptr::null())),
                });
            }
        }
        self.id.hash(state);
    }
}

#[test]
fn unarmed_keys_work_normally() {
    let slot = Rc::new(Cell::new(std::ptr::null()));
    let mut m: Map = ChainedHashMap::new();
    m.insert(PeekingKey { id: 1, map: slot.clone() }, 10);
    assert_eq!(m.get(&PeekingKey { id: 1, map: slot }), Some(&10));
}

#[cfg(debug_assertions)]
#[test]
fn reentrant_hash_during_insert_panics_in_debug() {
    let slot = Rc::new(Cell::new(std::ptr::null()));
    let mut m: Map = ChainedHashMap::new();
    slot.set(&m as *const Map);
    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        m.insert(PeekingKey { id: 2, map: slot.clone() }, 20);
    }));
    let msg = res
        .expect_err("expected reentrancy to panic in debug builds")
        .downcast::<String>()
        .map(|s| *s)
        .unwrap_or_default();
    assert!(msg.contains("ChainedHashMap::insert"), "{msg}");
    assert!(msg.contains("ChainedHashMap::contains_key"), "{msg}");
    slot.set(std::ptr::null());
    // The guard is released by unwinding; the map stays usable.
    m.insert(PeekingKey { id: 3, map: slot.clone() }, 30);
    assert_eq!(m.len(), 1);
}

#[cfg(not(debug_assertions))]
#[test]
fn reentrant_hash_is_tolerated_in_release() {
    let slot = Rc::new(Cell::new(std::ptr::null()));
    let mut m: Map = ChainedHashMap::new();
    slot.set(&m as *const Map);
    m.insert(PeekingKey { id: 2, map: slot.clone() }, 20);
    slot.set(std::ptr::null());
    assert_eq!(m.len(), 1);
}

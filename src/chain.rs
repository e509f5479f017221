//! Chain: singly linked bucket list whose nodes live in a shared arena.
//!
//! A `Chain` is only the head/tail/len triple; the nodes are stored in a
//! `ChainArena` owned by the same container, addressed by generational
//! `Link` keys. Every node is linked into at most one chain, so the chain
//! exclusively owns the items reachable from it. Relinking a node into a
//! different chain (`detach` + `link_back`) moves no item, which is how the
//! map rehashes without touching keys.

use crate::error::{Error, Result};
use core::fmt;
use slotmap::{DefaultKey, SlotMap};

/// Generational key of one arena node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Link(DefaultKey);

struct Node<T> {
    item: T,
    next: Option<DefaultKey>,
}

/// Node storage shared by every chain of one container.
pub struct ChainArena<T> {
    nodes: SlotMap<DefaultKey, Node<T>>,
}

impl<T> ChainArena<T> {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn item(&self, link: Link) -> Option<&T> {
        self.nodes.get(link.0).map(|n| &n.item)
    }

    pub fn item_mut(&mut self, link: Link) -> Option<&mut T> {
        self.nodes.get_mut(link.0).map(|n| &mut n.item)
    }

    /// Every item in the arena, in storage order.
    pub fn iter(&self) -> ArenaIter<'_, T> {
        ArenaIter {
            it: self.nodes.values(),
        }
    }

    pub fn iter_mut(&mut self) -> ArenaIterMut<'_, T> {
        ArenaIterMut {
            it: self.nodes.values_mut(),
        }
    }

    fn alloc(&mut self, item: T) -> DefaultKey {
        self.nodes.insert(Node { item, next: None })
    }

    fn next_of(&self, k: DefaultKey) -> Option<DefaultKey> {
        self.nodes.get(k).and_then(|n| n.next)
    }

    fn set_next(&mut self, k: DefaultKey, next: Option<DefaultKey>) {
        if let Some(n) = self.nodes.get_mut(k) {
            n.next = next;
        }
    }
}

pub struct ArenaIter<'a, T> {
    it: slotmap::basic::Values<'a, DefaultKey, Node<T>>,
}

impl<'a, T> Iterator for ArenaIter<'a, T> {
    type Item = &'a T;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|n| &n.item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

pub struct ArenaIterMut<'a, T> {
    it: slotmap::basic::ValuesMut<'a, DefaultKey, Node<T>>,
}

impl<'a, T> Iterator for ArenaIterMut<'a, T> {
    type Item = &'a mut T;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|n| &mut n.item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<T> Default for ChainArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Head, tail and length of one list in a `ChainArena`. A chain is moved,
/// never duplicated, so no two values describe the same nodes:
///
/// ```compile_fail
/// use chained_hashmap::{Chain, ChainArena};
///
/// let mut arena = ChainArena::new();
/// let mut a = Chain::new();
/// let b = a;
/// a.push_back(&mut arena, 1);
/// assert_eq!(b.len(), 0);
/// ```
#[derive(Debug, Default, Eq, PartialEq)]
pub struct Chain {
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
    len: usize,
}

impl Chain {
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push_back<T>(&mut self, arena: &mut ChainArena<T>, item: T) -> Link {
        let k = arena.alloc(item);
        self.attach_back(arena, k);
        Link(k)
    }

    /// Append a node previously returned by `detach`.
    pub fn link_back<T>(&mut self, arena: &mut ChainArena<T>, link: Link) {
        arena.set_next(link.0, None);
        self.attach_back(arena, link.0);
    }

    fn attach_back<T>(&mut self, arena: &mut ChainArena<T>, k: DefaultKey) {
        match self.tail {
            Some(t) => arena.set_next(t, Some(k)),
            None => self.head = Some(k),
        }
        self.tail = Some(k);
        self.len += 1;
    }

    /// Insert so that `item` ends up at position `index` (`index <= len`).
    pub fn insert<T>(&mut self, arena: &mut ChainArena<T>, index: usize, item: T) -> Result<()> {
        if index > self.len {
            return Err(Error::out_of_bounds(index, self.len));
        }
        if index == self.len {
            self.push_back(arena, item);
            return Ok(());
        }
        let k = arena.alloc(item);
        if index == 0 {
            arena.set_next(k, self.head);
            self.head = Some(k);
        } else {
            let prev = self.key_at(arena, index - 1);
            arena.set_next(k, arena.next_of(prev));
            arena.set_next(prev, Some(k));
        }
        self.len += 1;
        Ok(())
    }

    pub fn get<'a, T>(&self, arena: &'a ChainArena<T>, index: usize) -> Result<&'a T> {
        if index >= self.len {
            return Err(Error::out_of_bounds(index, self.len));
        }
        let k = self.key_at(arena, index);
        arena
            .item(Link(k))
            .ok_or_else(|| Error::out_of_bounds(index, self.len))
    }

    pub fn get_mut<'a, T>(&self, arena: &'a mut ChainArena<T>, index: usize) -> Result<&'a mut T> {
        if index >= self.len {
            return Err(Error::out_of_bounds(index, self.len));
        }
        let k = self.key_at(arena, index);
        let len = self.len;
        arena
            .item_mut(Link(k))
            .ok_or_else(|| Error::out_of_bounds(index, len))
    }

    // Caller guarantees index < len.
    fn key_at<T>(&self, arena: &ChainArena<T>, index: usize) -> DefaultKey {
        let mut cur = self.head;
        for _ in 0..index {
            cur = cur.and_then(|k| arena.next_of(k));
        }
        cur.unwrap_or_default()
    }

    pub fn iter<'a, T>(&self, arena: &'a ChainArena<T>) -> Iter<'a, T> {
        Iter {
            arena,
            cur: self.head,
            remaining: self.len,
        }
    }

    /// Visit every item mutably, in chain order.
    pub fn for_each_mut<T, F>(&self, arena: &mut ChainArena<T>, mut f: F)
    where
        F: FnMut(&mut T),
    {
        let mut cur = self.head;
        while let Some(k) = cur {
            match arena.nodes.get_mut(k) {
                Some(node) => {
                    f(&mut node.item);
                    cur = node.next;
                }
                None => break,
            }
        }
    }

    /// Links of this chain in order; the items stay in place.
    pub fn links<T>(&self, arena: &ChainArena<T>) -> Vec<Link> {
        let mut out = Vec::with_capacity(self.len);
        let mut cur = self.head;
        while let Some(k) = cur {
            out.push(Link(k));
            cur = arena.next_of(k);
        }
        out
    }

    /// Position of the first item matching `pred`.
    pub fn position<T, F>(&self, arena: &ChainArena<T>, mut pred: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        self.iter(arena).position(|item| pred(item))
    }

    /// Link of the first item matching `pred`.
    pub fn find<T, F>(&self, arena: &ChainArena<T>, mut pred: F) -> Option<Link>
    where
        F: FnMut(&T) -> bool,
    {
        let mut cur = self.head;
        while let Some(k) = cur {
            let node = arena.nodes.get(k)?;
            if pred(&node.item) {
                return Some(Link(k));
            }
            cur = node.next;
        }
        None
    }

    /// Unlink the first item matching `pred` and return it.
    pub fn unlink_first<T, F>(&mut self, arena: &mut ChainArena<T>, mut pred: F) -> Option<T>
    where
        F: FnMut(&T) -> bool,
    {
        let mut prev: Option<DefaultKey> = None;
        let mut cur = self.head;
        while let Some(k) = cur {
            let node = arena.nodes.get(k)?;
            if pred(&node.item) {
                return Some(self.unlink_after(arena, prev, k));
            }
            prev = Some(k);
            cur = node.next;
        }
        None
    }

    pub fn remove<T>(&mut self, arena: &mut ChainArena<T>, index: usize) -> Result<T> {
        if index >= self.len {
            return Err(Error::out_of_bounds(index, self.len));
        }
        let prev = if index == 0 {
            None
        } else {
            Some(self.key_at(arena, index - 1))
        };
        let k = match prev {
            Some(p) => arena.next_of(p),
            None => self.head,
        };
        match k {
            Some(k) => Ok(self.unlink_after(arena, prev, k)),
            None => Err(Error::out_of_bounds(index, self.len)),
        }
    }

    fn unlink_after<T>(
        &mut self,
        arena: &mut ChainArena<T>,
        prev: Option<DefaultKey>,
        k: DefaultKey,
    ) -> T {
        let node = arena
            .nodes
            .remove(k)
            .expect("linked node must be present in its arena");
        match prev {
            Some(p) => arena.set_next(p, node.next),
            None => self.head = node.next,
        }
        if self.tail == Some(k) {
            self.tail = prev;
        }
        self.len -= 1;
        node.item
    }

    /// Forget every node without freeing it and return their links in order,
    /// ready for `link_back` into other chains.
    pub fn detach<T>(&mut self, arena: &ChainArena<T>) -> Vec<Link> {
        let links = self.links(arena);
        *self = Chain::new();
        links
    }

    /// Remove every node from the arena, returning the items in order.
    pub fn drain<T>(&mut self, arena: &mut ChainArena<T>) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        let mut cur = self.head;
        while let Some(k) = cur {
            match arena.nodes.remove(k) {
                Some(node) => {
                    cur = node.next;
                    out.push(node.item);
                }
                None => break,
            }
        }
        *self = Chain::new();
        out
    }

    /// Display adapter: `[a,b]`, or `[a,b]{2}` when `debug` is set.
    pub fn display<'a, T: fmt::Display>(
        &'a self,
        arena: &'a ChainArena<T>,
        debug: bool,
    ) -> ChainDisplay<'a, T> {
        ChainDisplay {
            chain: self,
            arena,
            debug,
        }
    }
}

/// Iterator over the items of one chain.
pub struct Iter<'a, T> {
    arena: &'a ChainArena<T>,
    cur: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.cur?;
        let node = self.arena.nodes.get(k)?;
        self.cur = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some(&node.item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

pub struct ChainDisplay<'a, T> {
    chain: &'a Chain,
    arena: &'a ChainArena<T>,
    debug: bool,
}

impl<'a, T: fmt::Display> fmt::Display for ChainDisplay<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.chain.iter(self.arena).enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", item)?;
        }
        f.write_str("]")?;
        if self.debug {
            write!(f, "{{{}}}", self.chain.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_of(arena: &mut ChainArena<char>, s: &str) -> Chain {
        let mut c = Chain::new();
        for ch in s.chars() {
            c.push_back(arena, ch);
        }
        c
    }

    fn collect(c: &Chain, arena: &ChainArena<char>) -> String {
        c.iter(arena).collect()
    }

    /// Invariant: `push_back` preserves insertion order and `len` tracks size.
    #[test]
    fn push_back_keeps_order() {
        let mut arena = ChainArena::new();
        let c = chain_of(&mut arena, "abc");
        assert_eq!(c.len(), 3);
        assert_eq!(collect(&c, &arena), "abc");
        assert_eq!(*c.get(&arena, 2).unwrap(), 'c');
        assert_eq!(c.get(&arena, 3), Err(Error::out_of_bounds(3, 3)));
    }

    /// Invariant: Indexed insert places the item at the requested position,
    /// including front and back, and keeps the tail usable for appends.
    #[test]
    fn insert_at_index() {
        let mut arena = ChainArena::new();
        let mut c = chain_of(&mut arena, "bd");
        c.insert(&mut arena, 0, 'a').unwrap();
        c.insert(&mut arena, 2, 'c').unwrap();
        c.insert(&mut arena, 4, 'e').unwrap();
        c.push_back(&mut arena, 'f');
        assert_eq!(collect(&c, &arena), "abcdef");
        assert_eq!(c.insert(&mut arena, 9, 'z'), Err(Error::out_of_bounds(9, 6)));
    }

    /// Invariant: Unlinking the first match leaves later duplicates in place
    /// and repairs head and tail.
    #[test]
    fn unlink_first_match_only() {
        let mut arena = ChainArena::new();
        let mut c = chain_of(&mut arena, "abab");
        assert_eq!(c.unlink_first(&mut arena, |&x| x == 'b'), Some('b'));
        assert_eq!(collect(&c, &arena), "aab");
        assert_eq!(c.unlink_first(&mut arena, |&x| x == 'b'), Some('b'));
        assert_eq!(c.unlink_first(&mut arena, |&x| x == 'b'), None);
        c.push_back(&mut arena, 'z');
        assert_eq!(collect(&c, &arena), "aaz");
        assert_eq!(c.unlink_first(&mut arena, |&x| x == 'a'), Some('a'));
        assert_eq!(collect(&c, &arena), "az");
        assert_eq!(arena.len(), 2);
    }

    /// Invariant: Removing by index returns the item and keeps the rest linked.
    #[test]
    fn remove_by_index() {
        let mut arena = ChainArena::new();
        let mut c = chain_of(&mut arena, "abcd");
        assert_eq!(c.remove(&mut arena, 3), Ok('d'));
        assert_eq!(c.remove(&mut arena, 0), Ok('a'));
        c.push_back(&mut arena, 'e');
        assert_eq!(collect(&c, &arena), "bce");
        assert_eq!(c.remove(&mut arena, 3), Err(Error::out_of_bounds(3, 3)));
    }

    /// Invariant: Detached links can be relinked into other chains without
    /// moving items; order within the source is preserved.
    #[test]
    fn detach_and_relink() {
        let mut arena = ChainArena::new();
        let mut src = chain_of(&mut arena, "abcd");
        let links = src.detach(&arena);
        assert!(src.is_empty());
        let (mut even, mut odd) = (Chain::new(), Chain::new());
        for (i, l) in links.into_iter().enumerate() {
            if i % 2 == 0 {
                even.link_back(&mut arena, l);
            } else {
                odd.link_back(&mut arena, l);
            }
        }
        assert_eq!(collect(&even, &arena), "ac");
        assert_eq!(collect(&odd, &arena), "bd");
        assert_eq!(arena.len(), 4);
    }

    /// Invariant: `drain` frees every node of the chain and only that chain.
    #[test]
    fn drain_frees_nodes() {
        let mut arena = ChainArena::new();
        let mut a = chain_of(&mut arena, "xy");
        let b = chain_of(&mut arena, "z");
        assert_eq!(a.drain(&mut arena), vec!['x', 'y']);
        assert!(a.is_empty());
        assert_eq!(arena.len(), 1);
        assert_eq!(collect(&b, &arena), "z");
    }

    /// Invariant: Display lists items; debug adds the length.
    #[test]
    fn display_plain_and_debug() {
        let mut arena = ChainArena::new();
        let c = chain_of(&mut arena, "ab");
        assert_eq!(c.display(&arena, false).to_string(), "[a,b]");
        assert_eq!(c.display(&arena, true).to_string(), "[a,b]{2}");
        assert_eq!(Chain::new().display(&arena, true).to_string(), "[]{0}");
    }

    /// Invariant: `find` and `position` agree on the first match.
    #[test]
    fn find_and_position() {
        let mut arena = ChainArena::new();
        let c = chain_of(&mut arena, "abcb");
        assert_eq!(c.position(&arena, |&x| x == 'b'), Some(1));
        let l = c.find(&arena, |&x| x == 'b').unwrap();
        *arena.item_mut(l).unwrap() = 'B';
        assert_eq!(collect(&c, &arena), "aBcb");
        *c.get_mut(&mut arena, 3).unwrap() = 'D';
        assert_eq!(collect(&c, &arena), "aBcD");
        c.for_each_mut(&mut arena, |x| *x = x.to_ascii_lowercase());
        assert_eq!(collect(&c, &arena), "abcd");
        assert_eq!(c.position(&arena, |&x| x == 'q'), None);
        assert!(c.find(&arena, |&x| x == 'q').is_none());
    }
}

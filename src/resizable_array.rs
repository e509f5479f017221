//! ResizableArray: the growable sequence backing the bucket array.
//!
//! Capacity is tracked explicitly so the growth policy is observable:
//! - an insert into a full array doubles the capacity;
//! - a removal that leaves `len / capacity < 0.25` halves it (down to 1
//!   when the array becomes empty);
//! - capacity never drops below 1.

use crate::entry::{Disposer, Rendered, Renderer};
use crate::error::{Error, Result};
use core::fmt;
use log::trace;
use std::rc::Rc;

pub const GROWTH_FACTOR: usize = 2;
const MIN_LEN_CAPACITY_RATIO: f64 = 0.25;

pub struct ResizableArray<T> {
    items: Vec<T>,
    capacity: usize,
    debug_level: u32,
    display: Option<Renderer<T>>,
    free: Option<Disposer<T>>,
}

impl<T> ResizableArray<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::with_capacity(1),
            capacity: 1,
            debug_level: 0,
            display: None,
            free: None,
        }
    }

    pub fn set_display<F>(&mut self, render: F)
    where
        F: Fn(&T, &mut fmt::Formatter<'_>) -> fmt::Result + 'static,
    {
        self.display = Some(Rc::new(render));
    }

    /// Install the disposer that receives every element still held when the
    /// array is dropped.
    pub fn set_free<F>(&mut self, free: F)
    where
        F: Fn(T) + 'static,
    {
        self.free = Some(Rc::new(free));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn debug_level(&self) -> u32 {
        self.debug_level
    }

    /// Returns the previous level.
    pub fn set_debug_level(&mut self, level: u32) -> u32 {
        core::mem::replace(&mut self.debug_level, level)
    }

    /// Insert at `index` (`index <= len`), shifting later elements right.
    pub fn insert(&mut self, index: usize, value: T) -> Result<()> {
        if index > self.items.len() {
            return Err(Error::out_of_bounds(index, self.items.len()));
        }
        if self.items.len() == self.capacity {
            self.grow();
        }
        self.items.insert(index, value);
        Ok(())
    }

    pub fn push_back(&mut self, value: T) {
        if self.items.len() == self.capacity {
            self.grow();
        }
        self.items.push(value);
    }

    pub fn remove(&mut self, index: usize) -> Result<T> {
        if index >= self.items.len() {
            return Err(Error::out_of_bounds(index, self.items.len()));
        }
        let old = self.items.remove(index);
        self.shrink_if_sparse();
        Ok(old)
    }

    pub fn pop_back(&mut self) -> Option<T> {
        let old = self.items.pop()?;
        self.shrink_if_sparse();
        Some(old)
    }

    pub fn get(&self, index: usize) -> Result<&T> {
        let len = self.items.len();
        self.items
            .get(index)
            .ok_or_else(|| Error::out_of_bounds(index, len))
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or_else(|| Error::out_of_bounds(index, len))
    }

    /// Replace the element at `index`, returning the old one. `index == len`
    /// appends instead and returns `None`.
    pub fn set(&mut self, index: usize, value: T) -> Result<Option<T>> {
        let len = self.items.len();
        if index < len {
            Ok(Some(core::mem::replace(&mut self.items[index], value)))
        } else if index == len {
            self.push_back(value);
            Ok(None)
        } else {
            Err(Error::out_of_bounds(index, len))
        }
    }

    /// Move every element of `donor` to the back of `self`, in order.
    pub fn append(&mut self, mut donor: ResizableArray<T>) {
        for value in donor.items.drain(..) {
            self.push_back(value);
        }
        // The donor is now empty, so its disposer has nothing left to see.
    }

    /// Reduce capacity to the current length (at least 1).
    pub fn shrink_to_fit(&mut self) {
        let target = self.items.len().max(1);
        if target != self.capacity {
            trace!("resizable array shrink_to_fit {} -> {}", self.capacity, target);
            self.capacity = target;
            self.items.shrink_to(target);
        }
    }

    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    fn grow(&mut self) {
        let new_capacity = self.capacity * GROWTH_FACTOR;
        trace!("resizable array grow {} -> {}", self.capacity, new_capacity);
        self.items.reserve_exact(new_capacity - self.items.len());
        self.capacity = new_capacity;
    }

    fn shrink_if_sparse(&mut self) {
        let ratio = self.items.len() as f64 / self.capacity as f64;
        if ratio >= MIN_LEN_CAPACITY_RATIO || self.capacity == 1 {
            return;
        }
        let new_capacity = if self.items.is_empty() {
            1
        } else {
            (self.capacity / GROWTH_FACTOR).max(1)
        };
        trace!("resizable array shrink {} -> {}", self.capacity, new_capacity);
        self.items.shrink_to(new_capacity);
        self.capacity = new_capacity;
    }
}

impl<T> Default for ResizableArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for ResizableArray<T> {
    fn drop(&mut self) {
        if let Some(free) = self.free.take() {
            for value in self.items.drain(..) {
                free(value);
            }
        }
    }
}

impl<T> core::ops::Index<usize> for ResizableArray<T> {
    type Output = T;
    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T> core::ops::IndexMut<usize> for ResizableArray<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.items[index]
    }
}

impl<T> FromIterator<T> for ResizableArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut arr = ResizableArray::new();
        for value in iter {
            arr.push_back(value);
        }
        arr
    }
}

impl<T> fmt::Display for ResizableArray<T> {
    /// `[a,b,c]`; with a debug level above zero the number of unused slots
    /// follows in brackets: `[a,b,[2]]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            let shown = Rendered {
                item,
                with: self.display.as_ref(),
            };
            write!(f, "{}", shown)?;
        }
        if self.debug_level > 0 {
            if !self.items.is_empty() {
                f.write_str(",")?;
            }
            write!(f, "[{}]", self.capacity - self.items.len())?;
        }
        f.write_str("]")
    }
}

impl<T: fmt::Debug> fmt::Debug for ResizableArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResizableArray")
            .field("items", &self.items)
            .field("capacity", &self.capacity)
            .finish()
    }
}

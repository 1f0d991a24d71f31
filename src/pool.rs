// This file is part of rigid2d.
//
// rigid2d is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// rigid2d is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with rigid2d. If not, see <http://www.gnu.org/licenses/>.

use std::fmt;
use std::iter::FilterMap;
use std::marker::PhantomData;
use std::mem;
use std::slice;
use std::vec::Vec;

/// A typed index into a `Pool`. Carries the slot's generation at the time it
/// was issued; once the slot is removed the handle goes stale and every
/// access through it fails validation.
pub struct Handle<T> {
    index: u32,
    generation: u32,
    marker: PhantomData<T>,
}

impl<T> Handle<T> {
    fn new(index: u32, generation: u32) -> Self {
        Handle {
            index,
            generation,
            marker: PhantomData,
        }
    }

    /// A handle that no pool will ever validate.
    pub fn invalid() -> Self {
        Handle::new(u32::max_value(), u32::max_value())
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl<T> Copy for Handle<T> {}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Handle::invalid()
    }
}

/// Internal storage type used by Pool.
pub enum PoolEntry<T> {
    FreeListEnd,
    FreeListPtr { next_free: usize },
    Occupied(T),
}

/// Growable array type that allows items to be removed and inserted without
/// changing the indices of other entries. Slots are reused through a free
/// list; each reuse bumps the slot's generation so handles into the old
/// occupant fail instead of aliasing the new one.
pub struct Pool<T> {
    len: usize,
    free_list: Option<usize>,
    entries: Vec<PoolEntry<T>>,
    generations: Vec<u32>,
}

impl<T> Pool<T> {
    /// Create an empty Pool.
    pub fn new() -> Self {
        Pool {
            len: 0,
            free_list: None,
            entries: Vec::new(),
            generations: Vec::new(),
        }
    }

    /// Create an empty Pool large enough to fit cap items.
    pub fn with_capacity(cap: usize) -> Self {
        Pool {
            len: 0,
            free_list: None,
            entries: Vec::with_capacity(cap),
            generations: Vec::with_capacity(cap),
        }
    }

    /// Determines if the Pool is empty.
    pub fn empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Push a new item to the Pool. Attempts to use spots left empty from
    /// removed items before performing a heap allocation.
    pub fn push(&mut self, item: T) -> Handle<T> {
        self.len += 1;
        if let Some(free_item) = self.free_list {
            self.free_list = match self.entries[free_item] {
                PoolEntry::FreeListEnd => None,
                PoolEntry::FreeListPtr { next_free } => Some(next_free),
                _ => unreachable!(),
            };
            self.entries[free_item] = PoolEntry::Occupied(item);
            Handle::new(free_item as u32, self.generations[free_item])
        } else {
            let i = self.entries.len();
            self.entries.push(PoolEntry::Occupied(item));
            self.generations.push(0);
            Handle::new(i as u32, 0)
        }
    }

    /// Marks a slot as empty, bumps its generation and adds it to the free
    /// list, allowing the spot to be reclaimed later. Panics if the handle
    /// is stale or the slot is already free.
    pub fn remove(&mut self, handle: Handle<T>) -> T {
        self.validate(handle);
        let i = handle.index();
        let new_entry = if let Some(free_item) = self.free_list {
            PoolEntry::FreeListPtr {
                next_free: free_item,
            }
        } else {
            PoolEntry::FreeListEnd
        };
        self.free_list = Some(i);
        if let PoolEntry::Occupied(item) = mem::replace(&mut self.entries[i], new_entry) {
            self.len -= 1;
            self.generations[i] += 1;
            item
        } else {
            panic!("handle {:?} is not occupied", handle);
        }
    }

    /// True when the handle still refers to a live item.
    pub fn contains(&self, handle: Handle<T>) -> bool {
        let i = handle.index();
        match self.entries.get(i) {
            Some(&PoolEntry::Occupied(_)) => self.generations[i] == handle.generation,
            _ => false,
        }
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        let i = handle.index();
        match self.entries.get(i) {
            Some(&PoolEntry::Occupied(ref item)) if self.generations[i] == handle.generation => {
                Some(item)
            }
            _ => None,
        }
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        let i = handle.index();
        match self.entries.get_mut(i) {
            Some(&mut PoolEntry::Occupied(ref mut item))
                if self.generations[i] == handle.generation =>
            {
                Some(item)
            }
            _ => None,
        }
    }

    fn validate(&self, handle: Handle<T>) {
        if !self.contains(handle) {
            panic!("handle {:?} is stale or removed", handle);
        }
    }

    /// Mutable access to two distinct slots at once, for constraints that
    /// write both of their endpoints.
    pub fn pair_mut(&mut self, a: Handle<T>, b: Handle<T>) -> (&mut T, &mut T) {
        assert!(
            a.index != b.index,
            "pair_mut requires two distinct handles, got {:?} twice",
            a
        );
        self.validate(a);
        self.validate(b);
        let (lo, hi, flipped) = if a.index < b.index {
            (a.index(), b.index(), false)
        } else {
            (b.index(), a.index(), true)
        };
        let (head, tail) = self.entries.split_at_mut(hi);
        match (&mut head[lo], &mut tail[0]) {
            (&mut PoolEntry::Occupied(ref mut x), &mut PoolEntry::Occupied(ref mut y)) => {
                if flipped {
                    (y, x)
                } else {
                    (x, y)
                }
            }
            _ => unreachable!(),
        }
    }

    /// Live handles in slot order. The order is stable while the population
    /// is unchanged, which pair enumeration depends on.
    pub fn handles<'a>(&'a self) -> impl Iterator<Item = Handle<T>> + 'a {
        let generations = &self.generations;
        self.entries
            .iter()
            .enumerate()
            .filter_map(move |(i, entry)| match entry {
                &PoolEntry::Occupied(_) => Some(Handle::new(i as u32, generations[i])),
                _ => None,
            })
    }

    pub fn iter<'a>(
        &'a self,
    ) -> FilterMap<slice::Iter<'a, PoolEntry<T>>, fn(&PoolEntry<T>) -> Option<&T>> {
        self.into_iter()
    }

    pub fn iter_mut<'a>(
        &'a mut self,
    ) -> FilterMap<slice::IterMut<'a, PoolEntry<T>>, fn(&mut PoolEntry<T>) -> Option<&mut T>> {
        self.into_iter()
    }
}

impl<T> std::ops::Index<Handle<T>> for Pool<T> {
    type Output = T;

    fn index(&self, handle: Handle<T>) -> &T {
        match self.get(handle) {
            Some(item) => item,
            None => panic!("handle {:?} is stale or removed", handle),
        }
    }
}

impl<T> std::ops::IndexMut<Handle<T>> for Pool<T> {
    fn index_mut(&mut self, handle: Handle<T>) -> &mut T {
        match self.get_mut(handle) {
            Some(item) => item,
            None => panic!("handle {:?} is stale or removed", handle),
        }
    }
}

#[inline(always)]
fn filter_pool<'a, T>(item: &'a PoolEntry<T>) -> Option<&'a T> {
    if let &PoolEntry::Occupied(ref item) = item {
        Some(item)
    } else {
        None
    }
}

impl<'a, T> IntoIterator for &'a Pool<T> {
    type Item = &'a T;
    type IntoIter = FilterMap<slice::Iter<'a, PoolEntry<T>>, fn(&PoolEntry<T>) -> Option<&T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter().filter_map(filter_pool)
    }
}

#[inline(always)]
fn filter_pool_mut<'a, T>(item: &'a mut PoolEntry<T>) -> Option<&'a mut T> {
    if let &mut PoolEntry::Occupied(ref mut item) = item {
        Some(item)
    } else {
        None
    }
}

impl<'a, T> IntoIterator for &'a mut Pool<T> {
    type Item = &'a mut T;
    type IntoIter =
        FilterMap<slice::IterMut<'a, PoolEntry<T>>, fn(&mut PoolEntry<T>) -> Option<&mut T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter_mut().filter_map(filter_pool_mut)
    }
}

#[cfg(test)]
mod tests {
    mod pool {
        use crate::pool::*;

        #[test]
        fn test_manual_code() {
            let mut pool: Pool<usize> = Pool::new();

            let id0 = pool.push(0);
            let id1 = pool.push(1);
            let id2 = pool.push(2);
            let id3 = pool.push(3);

            assert_eq!(id0.index(), 0);
            assert_eq!(id3.index(), 3);

            pool.remove(id1);
            pool.remove(id2);

            assert_eq!(pool[id0], 0);
            assert_eq!(pool[id3], 3);

            assert_eq!(pool.iter().map(|&u| u).collect::<Vec<usize>>(), vec![0, 3]);
        }

        #[test]
        fn test_slot_reuse_keeps_order() {
            let mut pool: Pool<usize> = Pool::new();
            let mut handles = Vec::new();
            for i in 0..8 {
                handles.push(pool.push(i));
            }
            for i in 0..4 {
                pool.remove(handles[i * 2]);
            }
            assert_eq!(pool.iter().cloned().collect::<Vec<usize>>(), vec![1, 3, 5, 7]);

            // Refill the holes; slot order still drives iteration order.
            for i in 0..4 {
                pool.push(100 + i);
            }
            assert_eq!(pool.len(), 8);
            let collected: Vec<usize> = pool.iter().cloned().collect();
            assert_eq!(collected.len(), 8);
            assert_eq!(collected[1], 1);
            assert_eq!(collected[7], 7);
        }

        #[test]
        fn test_stale_handle_is_invalid() {
            let mut pool: Pool<&'static str> = Pool::new();
            let a = pool.push("a");
            assert!(pool.contains(a));
            pool.remove(a);
            assert!(!pool.contains(a));
            assert!(pool.get(a).is_none());

            // The slot is reused under a new generation; the old handle must
            // not alias the new item.
            let b = pool.push("b");
            assert_eq!(b.index(), a.index());
            assert!(a != b);
            assert!(pool.get(a).is_none());
            assert_eq!(pool[b], "b");
        }

        #[test]
        #[should_panic(expected = "stale or removed")]
        fn test_stale_handle_panics_on_index() {
            let mut pool: Pool<u32> = Pool::new();
            let a = pool.push(7);
            pool.remove(a);
            let _ = pool[a];
        }

        #[test]
        #[should_panic(expected = "stale or removed")]
        fn test_invalid_handle_panics_on_remove() {
            let mut pool: Pool<u32> = Pool::new();
            pool.push(7);
            pool.remove(Handle::invalid());
        }

        #[test]
        fn test_pair_mut() {
            let mut pool: Pool<i32> = Pool::new();
            let a = pool.push(1);
            let b = pool.push(2);
            {
                let (x, y) = pool.pair_mut(a, b);
                *x += 10;
                *y += 20;
            }
            {
                // Order follows the argument order, not slot order.
                let (y, x) = pool.pair_mut(b, a);
                assert_eq!(*y, 22);
                assert_eq!(*x, 11);
            }
        }

        #[test]
        fn test_handles_iterate_in_slot_order() {
            let mut pool: Pool<u32> = Pool::new();
            let a = pool.push(0);
            let b = pool.push(1);
            let c = pool.push(2);
            pool.remove(b);
            let handles: Vec<_> = pool.handles().collect();
            assert_eq!(handles, vec![a, c]);
        }
    }
}

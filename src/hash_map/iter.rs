//! Borrowing and owning iterators over a [`HashMap`](super::HashMap).

use super::cursor::TableWalk;
use crate::hash_table::directory::Directory;
use crate::hash_table::group::{Group, Slot, GROUP_SLOTS};
use crate::hash_table::table::Table;
use std::iter::{Chain, FusedIterator};
use std::{array, fmt, slice, vec};

/// An iterator over the entries of a [`HashMap`](super::HashMap).
///
/// Visits tables and slots in the same randomized order as a [`Cursor`](super::Cursor).
pub struct Iter<'h, K, V> {
    directory: &'h Directory<K, V>,
    walk: TableWalk,
    entry_offset: usize,
    table: Option<&'h Table<K, V>>,
    entry: usize,
    remaining: usize,
}

/// A mutable iterator over the entries of a [`HashMap`](super::HashMap).
pub struct IterMut<'h, K, V> {
    tables: Chain<slice::IterMut<'h, Table<K, V>>, slice::IterMut<'h, Table<K, V>>>,
    groups: slice::IterMut<'h, Group<K, V>>,
    slots: slice::IterMut<'h, Option<Slot<K, V>>>,
    remaining: usize,
}

/// An owning iterator over the entries of a [`HashMap`](super::HashMap).
pub struct IntoIter<K, V> {
    tables: vec::IntoIter<Table<K, V>>,
    groups: vec::IntoIter<Group<K, V>>,
    slots: Option<array::IntoIter<Option<Slot<K, V>>, GROUP_SLOTS>>,
    remaining: usize,
}

impl<'h, K, V> Iter<'h, K, V> {
    pub(super) fn new(directory: &'h Directory<K, V>, len: usize) -> Self {
        Self {
            directory,
            walk: TableWalk::new(directory.global_depth()),
            entry_offset: rand::random::<u64>() as usize,
            table: None,
            entry: 0,
            remaining: len,
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            directory: self.directory,
            walk: self.walk,
            entry_offset: self.entry_offset,
            table: self.table,
            entry: self.entry,
            remaining: self.remaining,
        }
    }
}

impl<K, V> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

impl<'h, K, V> Iterator for Iter<'h, K, V> {
    type Item = (&'h K, &'h V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining != 0 {
            let table = if let Some(table) = self.table {
                table
            } else {
                let table = self.walk.table(self.directory)?;
                self.table = Some(table);
                self.entry = 0;
                table
            };
            let mask = table.capacity() - 1;
            while self.entry < table.capacity() {
                let entry = self.entry.wrapping_add(self.entry_offset) & mask;
                self.entry += 1;
                if let Some(slot) = table.slot_at(entry) {
                    self.remaining -= 1;
                    return Some((&slot.key, &slot.val));
                }
            }
            self.walk.advance(table.local_depth());
            self.table = None;
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<'h, K, V> IterMut<'h, K, V> {
    /// Starts with a random table, then visits the others in creation order.
    pub(super) fn new(tables: &'h mut [Table<K, V>], len: usize) -> Self {
        let first = if tables.is_empty() {
            0
        } else {
            rand::random::<u32>() as usize % tables.len()
        };
        let (before, after) = tables.split_at_mut(first);
        Self {
            tables: after.iter_mut().chain(before.iter_mut()),
            groups: Default::default(),
            slots: Default::default(),
            remaining: len,
        }
    }
}

impl<K, V> fmt::Debug for IterMut<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

impl<'h, K, V> Iterator for IterMut<'h, K, V> {
    type Item = (&'h K, &'h mut V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining != 0 {
            if let Some(slot) = self.slots.next() {
                if let Some(Slot { key, val, .. }) = slot {
                    self.remaining -= 1;
                    return Some((&*key, val));
                }
            } else if let Some(group) = self.groups.next() {
                self.slots = group.slots_mut().iter_mut();
            } else {
                self.groups = self.tables.next()?.groups_mut().iter_mut();
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

impl<K, V> IntoIter<K, V> {
    /// Starts with a random table, then visits the others in creation order.
    pub(super) fn new(mut tables: Vec<Table<K, V>>, len: usize) -> Self {
        if !tables.is_empty() {
            let first = rand::random::<u32>() as usize % tables.len();
            tables.rotate_left(first);
        }
        Self {
            tables: tables.into_iter(),
            groups: Vec::new().into_iter(),
            slots: None,
            remaining: len,
        }
    }
}

impl<K, V> fmt::Debug for IntoIter<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntoIter")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining != 0 {
            if let Some(slot) = self.slots.as_mut().and_then(Iterator::next) {
                if let Some(Slot { key, val, .. }) = slot {
                    self.remaining -= 1;
                    return Some((key, val));
                }
            } else if let Some(group) = self.groups.next() {
                self.slots = Some(group.into_slots().into_iter());
            } else {
                self.groups = self.tables.next()?.into_groups().into_iter();
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}

//! [`Cursor`] iterates over a [`HashMap`] that may be modified between steps.

use super::HashMap;
use crate::hash_table::directory::Directory;
use crate::hash_table::table::Table;
use std::hash::BuildHasher;
use std::vec;

/// [`Cursor`] is a detached iterator over a [`HashMap`].
///
/// A [`Cursor`] does not borrow the [`HashMap`] between steps, so the owner is free to insert,
/// update or remove entries in between calls to [`next`](Self::next).
///
/// * Entries present for the whole iteration are returned exactly once.
/// * Entries inserted during iteration may or may not be returned.
/// * Removed entries are never returned.
/// * Returned values are always the latest ones.
/// * [`HashMap::clear`] ends the iteration.
///
/// The starting table and the starting slot within each table are chosen at random when the
/// [`Cursor`] is created.
///
/// # Examples
///
/// ```
/// use exhash::HashMap;
///
/// let mut hashmap: HashMap<u64, u64> = HashMap::default();
/// for i in 0..16 {
///     assert!(hashmap.insert(i, i).is_ok());
/// }
///
/// let mut cursor = hashmap.cursor();
/// let mut seen = 0;
/// while let Some((k, _)) = cursor.next(&hashmap) {
///     let k = *k;
///     seen += 1;
///     hashmap.upsert(k + 100, 0);
/// }
/// assert!(seen >= 16);
/// ```
#[derive(Debug)]
pub struct Cursor {
    map_id: u64,
    clear_seq: u64,
    walk: TableWalk,
    entry_offset: usize,
    captured: Option<Captured>,
    done: bool,
}

/// The `(hash, id)` pairs of a table as it was when the [`Cursor`] reached it.
#[derive(Debug)]
struct Captured {
    local_depth: u32,
    entries: vec::IntoIter<(u64, u64)>,
}

/// Visits every table of a [`Directory`] once, starting from a random directory entry.
///
/// `dir_idx` counts directory entries already covered; the entry looked at is
/// `(dir_idx + dir_offset) & (len - 1)`.
#[derive(Clone, Copy, Debug)]
pub(super) struct TableWalk {
    global_depth: u32,
    dir_idx: usize,
    dir_offset: usize,
}

impl TableWalk {
    pub(super) fn new(global_depth: u32) -> Self {
        Self {
            global_depth,
            dir_idx: 0,
            dir_offset: rand::random::<u64>() as usize,
        }
    }

    /// Follows directory doubling since the last step.
    pub(super) fn rescale(&mut self, global_depth: u32) {
        if self.global_depth != global_depth {
            let orders = global_depth - self.global_depth;
            self.dir_idx <<= orders;
            self.dir_offset <<= orders;
            self.global_depth = global_depth;
        }
    }

    /// Returns the next table to visit, or `None` once the directory has been covered.
    pub(super) fn table<'d, K, V>(
        &mut self,
        directory: &'d Directory<K, V>,
    ) -> Option<&'d Table<K, V>> {
        if self.dir_idx >= directory.len() {
            return None;
        }
        let index = self.dir_idx.wrapping_add(self.dir_offset) & (directory.len() - 1);
        let table = directory.table_at(index);
        if table.index() != index {
            // Only the random initial position may fall in the middle of a block.
            self.dir_offset = self.dir_offset.wrapping_sub(index - table.index());
        }
        Some(table)
    }

    /// Skips every directory entry of a finished table of `local_depth`.
    pub(super) fn advance(&mut self, local_depth: u32) {
        self.dir_idx += 1_usize << (self.global_depth - local_depth);
    }
}

impl Cursor {
    pub(super) fn new<K, V, H: BuildHasher>(hashmap: &HashMap<K, V, H>) -> Self {
        Self {
            map_id: hashmap.map_id,
            clear_seq: hashmap.clear_seq,
            walk: TableWalk::new(hashmap.directory.global_depth()),
            entry_offset: rand::random::<u64>() as usize,
            captured: None,
            done: hashmap.is_empty(),
        }
    }

    /// Returns the next entry.
    ///
    /// Each table is captured when first reached and every captured entry is looked up again in
    /// the current state of the [`HashMap`].
    ///
    /// # Panics
    ///
    /// Panics if `hashmap` is not the [`HashMap`] the [`Cursor`] was created for, or if a previous
    /// write to the [`HashMap`] did not complete.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u64> = HashMap::default();
    /// assert!(hashmap.insert(1, 2).is_ok());
    ///
    /// let mut cursor = hashmap.cursor();
    /// hashmap.upsert(1, 3);
    /// assert_eq!(cursor.next(&hashmap), Some((&1, &3)));
    /// assert!(cursor.next(&hashmap).is_none());
    /// ```
    pub fn next<'h, K, V, H: BuildHasher>(
        &mut self,
        hashmap: &'h HashMap<K, V, H>,
    ) -> Option<(&'h K, &'h V)> {
        assert_eq!(
            self.map_id, hashmap.map_id,
            "cursor used with a different map"
        );
        if hashmap.writing {
            panic!("concurrent map iteration and map write");
        }
        if self.done {
            return None;
        }
        if self.clear_seq != hashmap.clear_seq {
            self.finish();
            return None;
        }
        let directory = &hashmap.directory;
        self.walk.rescale(directory.global_depth());
        loop {
            if self.captured.is_none() {
                let Some(table) = self.walk.table(directory) else {
                    self.finish();
                    return None;
                };
                self.captured = Some(Captured {
                    local_depth: table.local_depth(),
                    entries: table.snapshot(self.entry_offset).into_iter(),
                });
            }
            let Some(captured) = self.captured.as_mut() else {
                return None;
            };
            for (hash, id) in captured.entries.by_ref() {
                let live = directory
                    .table_for(hash)
                    .and_then(|t| t.find_by_id(hash, id).and_then(|pos| t.slot(pos)));
                if let Some(slot) = live {
                    return Some((&slot.key, &slot.val));
                }
            }
            self.walk.advance(captured.local_depth);
            self.captured = None;
        }
    }

    /// Returns `true` if the [`Cursor`] will not return any more entries.
    #[inline]
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    fn finish(&mut self) {
        self.done = true;
        self.captured = None;
    }
}

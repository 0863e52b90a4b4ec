//! [`Directory`] routes hashes to [`Table`]s by their most significant bits.

use super::group::GROUP_SLOTS;
use super::table::{Table, MAX_TABLE_CAPACITY};
use std::mem;
use tracing::debug;

/// [`Directory`] owns every [`Table`] of a map and `2^global_depth` entries referencing them.
///
/// A table of local depth `d` is referenced by the `2^(global_depth - d)` consecutive entries
/// starting at its index, and its index is a multiple of that count.
pub(crate) struct Directory<K, V> {
    /// Tables in creation order; a split replaces the left half in place and appends the right.
    tables: Vec<Table<K, V>>,
    /// Positions in `tables`.
    entries: Vec<usize>,
    global_depth: u32,
}

impl<K, V> Directory<K, V> {
    /// Creates a [`Directory`] without any table.
    #[inline]
    pub(crate) const fn new() -> Self {
        Self {
            tables: Vec::new(),
            entries: Vec::new(),
            global_depth: 0,
        }
    }

    /// Creates a [`Directory`] sized for `hint` entries.
    ///
    /// Hints up to a group get a small table, moderate ones a single table, and larger ones one
    /// table of at most [`MAX_TABLE_CAPACITY`] per directory entry.
    ///
    /// # Panics
    ///
    /// Panics if the required capacity overflows `usize`.
    pub(crate) fn with_capacity(hint: usize) -> Self {
        if hint == 0 {
            return Self::new();
        }
        if hint <= GROUP_SLOTS {
            return Self::single(Table::small());
        }
        let Some(target) = hint.checked_mul(8).map(|c| c / 7) else {
            panic!("capacity overflow");
        };
        if target <= MAX_TABLE_CAPACITY {
            return Self::single(Table::new(target, 0, 0));
        }
        let tables_needed =
            target / MAX_TABLE_CAPACITY + usize::from(target % MAX_TABLE_CAPACITY != 0);
        let Some(dir_size) = tables_needed.checked_next_power_of_two() else {
            panic!("capacity overflow");
        };
        let global_depth = dir_size.trailing_zeros();
        let capacity = target / dir_size;
        Self {
            tables: (0..dir_size)
                .map(|i| Table::new(capacity, i, global_depth))
                .collect(),
            entries: (0..dir_size).collect(),
            global_depth,
        }
    }

    fn single(table: Table<K, V>) -> Self {
        Self {
            tables: vec![table],
            entries: vec![0],
            global_depth: 0,
        }
    }

    #[inline]
    pub(crate) const fn global_depth(&self) -> u32 {
        self.global_depth
    }

    /// Returns the number of directory entries.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub(crate) fn tables(&self) -> &[Table<K, V>] {
        &self.tables
    }

    #[inline]
    pub(crate) fn tables_mut(&mut self) -> &mut [Table<K, V>] {
        &mut self.tables
    }

    #[inline]
    pub(crate) fn into_tables(self) -> Vec<Table<K, V>> {
        self.tables
    }

    /// Returns the table position for the hash if any table exists.
    #[inline]
    pub(crate) fn arena_of(&self, hash: u64) -> Option<usize> {
        self.entries.get(self.index_of(hash)).copied()
    }

    /// Returns the directory entry for the hash.
    #[inline]
    pub(crate) const fn index_of(&self, hash: u64) -> usize {
        if self.global_depth == 0 {
            0
        } else {
            (hash >> (u64::BITS - self.global_depth)) as usize
        }
    }

    /// Returns the table referenced by a directory entry.
    #[inline]
    pub(crate) fn table_at(&self, index: usize) -> &Table<K, V> {
        &self.tables[self.entries[index]]
    }

    #[inline]
    pub(crate) fn table_for(&self, hash: u64) -> Option<&Table<K, V>> {
        self.arena_of(hash).map(|arena| &self.tables[arena])
    }

    #[inline]
    pub(crate) fn table(&self, arena: usize) -> &Table<K, V> {
        &self.tables[arena]
    }

    #[inline]
    pub(crate) fn table_mut(&mut self, arena: usize) -> &mut Table<K, V> {
        &mut self.tables[arena]
    }

    /// Returns the table position for the hash, creating a small table if none exists.
    #[inline]
    pub(crate) fn route(&mut self, hash: u64) -> usize {
        if self.entries.is_empty() {
            self.tables.push(Table::small());
            self.entries.push(0);
        }
        self.entries[self.index_of(hash)]
    }

    /// Makes room for `hash` in the table at `arena` by growing it or splitting it.
    pub(crate) fn rehash(&mut self, arena: usize, hash: u64) {
        if let Some(right) = self.tables[arena].rehash(hash) {
            self.install_table_split(arena, right);
        }
    }

    /// Registers the halves of a split: the left half already replaced the old table at `arena`.
    ///
    /// The directory doubles first if the old table was referenced by a single entry.
    pub(crate) fn install_table_split(&mut self, arena: usize, mut right: Table<K, V>) {
        let local_depth = self.tables[arena].local_depth();
        debug_assert_eq!(right.local_depth(), local_depth);
        if local_depth - 1 == self.global_depth {
            self.double();
        }
        let left_index = self.tables[arena].index();
        right.set_index(left_index + (1_usize << (self.global_depth - local_depth)));
        self.tables.push(right);
        let right_arena = self.tables.len() - 1;
        self.replace_table(arena);
        self.replace_table(right_arena);
    }

    /// Drops every entry while keeping every table allocated.
    pub(crate) fn clear(&mut self) {
        self.tables.iter_mut().for_each(Table::clear);
    }

    /// Points every entry of the block owned by the table at `arena` to it.
    fn replace_table(&mut self, arena: usize) {
        let table = &self.tables[arena];
        let entries = 1_usize << (self.global_depth - table.local_depth());
        let start = table.index();
        self.entries[start..start + entries].fill(arena);
    }

    fn double(&mut self) {
        if self.global_depth == u64::BITS || self.entries.len() > isize::MAX as usize / 2 {
            panic!("directory overflow");
        }
        let entries = mem::take(&mut self.entries);
        self.entries = entries.iter().flat_map(|&arena| [arena, arena]).collect();
        self.tables
            .iter_mut()
            .for_each(|t| t.set_index(t.index() * 2));
        self.global_depth += 1;
        debug!(
            target: "exhash",
            global_depth = self.global_depth,
            entries = self.entries.len(),
            "directory doubled"
        );
    }

    /// Verifies that every table owns exactly its aligned block of entries.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        assert_eq!(self.entries.len(), 1_usize << self.global_depth);
        if self.tables.iter().any(Table::is_small) {
            assert_eq!(self.tables.len(), 1, "small table next to another table");
        }
        let mut referenced = vec![0_usize; self.tables.len()];
        for (i, &arena) in self.entries.iter().enumerate() {
            let table = &self.tables[arena];
            assert!(table.local_depth() <= self.global_depth);
            let entries = 1_usize << (self.global_depth - table.local_depth());
            assert_eq!(table.index() % entries, 0, "misaligned table at {i}");
            assert!(
                (table.index()..table.index() + entries).contains(&i),
                "entry {i} outside the block of its table"
            );
            referenced[arena] += 1;
        }
        for (arena, table) in self.tables.iter().enumerate() {
            assert_eq!(
                referenced[arena],
                1_usize << (self.global_depth - table.local_depth())
            );
            table.check_invariants();
        }
    }
}

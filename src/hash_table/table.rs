//! [`Table`] is a single open-addressed hash table made of [`Group`]s.

use super::group::{Group, Slot, CTRL_DELETED, CTRL_EMPTY, GROUP_SLOTS};
use super::{h2, local_depth_mask, ProbeSeq};
use crate::Equivalent;
use std::mem;
use tracing::debug;

/// The capacity beyond which a [`Table`] splits instead of growing.
pub(crate) const MAX_TABLE_CAPACITY: usize = 1024;

/// The maximum number of entries per group on average before a rehash is required.
const MAX_AVG_GROUP_LOAD: usize = 7;

/// The position of a slot inside a [`Table`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct SlotPos {
    group: usize,
    slot: usize,
}

/// The outcome of looking for a place to store a key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum PutSlot {
    /// The key is stored at the position.
    Occupied(SlotPos),
    /// The key is absent and may be stored at the position.
    Vacant(SlotPos),
    /// The key is absent and the table must be rehashed before it can be stored.
    Full,
}

/// [`Table`] is an open-addressed hash table routed to by `2^(global_depth - local_depth)`
/// consecutive directory entries starting at `index`.
///
/// At least one slot is always empty, which guarantees that every probe sequence terminates.
/// The exception is a small table: a lone group that may fill all of its slots, since its probe
/// sequence ends after the first group anyway. It never leaves a tombstone.
pub(crate) struct Table<K, V> {
    groups: Vec<Group<K, V>>,
    capacity: usize,
    used: usize,
    growth_left: usize,
    local_depth: u32,
    index: usize,
    small: bool,
}

impl SlotPos {
    /// Converts a flat slot number into a position.
    #[inline]
    pub(crate) const fn from_entry(entry: usize) -> Self {
        Self {
            group: entry / GROUP_SLOTS,
            slot: entry % GROUP_SLOTS,
        }
    }
}

impl<K, V> Table<K, V> {
    /// Creates an empty [`Table`].
    ///
    /// The capacity is rounded up to a power of two no smaller than a group.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds [`MAX_TABLE_CAPACITY`].
    pub(crate) fn new(capacity: usize, index: usize, local_depth: u32) -> Self {
        assert!(
            capacity <= MAX_TABLE_CAPACITY,
            "initial table capacity too large: {capacity}"
        );
        Self::alloc(capacity.max(GROUP_SLOTS).next_power_of_two(), index, local_depth)
    }

    /// Creates an empty small [`Table`] of a single group, the only table of its map.
    pub(crate) fn small() -> Self {
        let mut table = Self::alloc(GROUP_SLOTS, 0, 0);
        table.small = true;
        table.growth_left = GROUP_SLOTS;
        table
    }

    fn alloc(capacity: usize, index: usize, local_depth: u32) -> Self {
        debug_assert!(capacity.is_power_of_two() && capacity >= GROUP_SLOTS);
        let mut groups = Vec::with_capacity(capacity / GROUP_SLOTS);
        groups.resize_with(capacity / GROUP_SLOTS, Group::new);
        Self {
            groups,
            capacity,
            used: 0,
            growth_left: max_growth_left(capacity),
            local_depth,
            index,
            small: false,
        }
    }

    #[inline]
    pub(crate) const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of entries.
    #[cfg(test)]
    pub(crate) const fn len(&self) -> usize {
        self.used
    }

    #[inline]
    pub(crate) const fn local_depth(&self) -> u32 {
        self.local_depth
    }

    /// Returns the first directory entry referencing this table.
    #[inline]
    pub(crate) const fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    #[cfg(test)]
    pub(crate) const fn is_small(&self) -> bool {
        self.small
    }

    /// Returns the number of tombstones.
    #[inline]
    pub(crate) const fn tombstones(&self) -> usize {
        self.max_growth() - self.used - self.growth_left
    }

    #[inline]
    pub(crate) fn slot(&self, pos: SlotPos) -> Option<&Slot<K, V>> {
        self.groups[pos.group].slot(pos.slot)
    }

    #[inline]
    pub(crate) fn slot_mut(&mut self, pos: SlotPos) -> Option<&mut Slot<K, V>> {
        self.groups[pos.group].slot_mut(pos.slot)
    }

    /// Returns the slot at the flat slot number.
    #[inline]
    pub(crate) fn slot_at(&self, entry: usize) -> Option<&Slot<K, V>> {
        self.slot(SlotPos::from_entry(entry))
    }

    #[inline]
    pub(crate) fn groups_mut(&mut self) -> &mut [Group<K, V>] {
        &mut self.groups
    }

    #[inline]
    pub(crate) fn into_groups(self) -> Vec<Group<K, V>> {
        self.groups
    }

    /// Finds the entry matching `key`.
    #[inline]
    pub(crate) fn find<Q>(&self, hash: u64, key: &Q) -> Option<SlotPos>
    where
        Q: Equivalent<K> + ?Sized,
    {
        self.probe(hash, |s| s.hash == hash && key.equivalent(&s.key))
    }

    /// Finds the entry with the given id without comparing keys.
    #[inline]
    pub(crate) fn find_by_id(&self, hash: u64, id: u64) -> Option<SlotPos> {
        self.probe(hash, |s| s.id == id)
    }

    /// Looks for the slot in which `key` is or should be stored.
    ///
    /// A tombstone seen before the end of the probe sequence is preferred to the terminating empty
    /// slot since reusing it does not consume growth.
    pub(crate) fn put_slot<Q>(&self, hash: u64, key: &Q) -> PutSlot
    where
        Q: Equivalent<K> + ?Sized,
    {
        let h2 = h2(hash);
        let mut first_deleted = None;
        let mut seq = ProbeSeq::new(hash, self.group_mask());
        while !seq.exhausted() {
            let group = &self.groups[seq.offset()];
            let ctrl = group.ctrl();
            for i in ctrl.match_h2(h2) {
                if group
                    .slot(i)
                    .is_some_and(|s| s.hash == hash && key.equivalent(&s.key))
                {
                    return PutSlot::Occupied(SlotPos {
                        group: seq.offset(),
                        slot: i,
                    });
                }
            }
            if first_deleted.is_none() {
                first_deleted = ctrl.match_deleted().first().map(|slot| SlotPos {
                    group: seq.offset(),
                    slot,
                });
            }
            if let Some(slot) = ctrl.match_empty().first() {
                if let Some(pos) = first_deleted {
                    return PutSlot::Vacant(pos);
                }
                if self.growth_left > 0 {
                    return PutSlot::Vacant(SlotPos {
                        group: seq.offset(),
                        slot,
                    });
                }
                return PutSlot::Full;
            }
            seq.advance();
        }
        debug_assert!(self.small, "no empty slot in a table of capacity {}", self.capacity);
        first_deleted.map_or(PutSlot::Full, PutSlot::Vacant)
    }

    /// Stores a new entry at a position returned as vacant by [`put_slot`](Self::put_slot).
    pub(crate) fn insert_at(&mut self, pos: SlotPos, slot: Slot<K, V>) -> &mut Slot<K, V> {
        let group = &mut self.groups[pos.group];
        match group.ctrl().get(pos.slot) {
            CTRL_EMPTY => {
                debug_assert!(self.growth_left > 0);
                self.growth_left -= 1;
            }
            CTRL_DELETED => (),
            ctrl => panic!("slot {pos:?} is already full: {ctrl:#04x}"),
        }
        self.used += 1;
        group.store(pos.slot, h2(slot.hash), slot)
    }

    /// Removes the entry at `pos`.
    ///
    /// The slot becomes empty if its group still has an empty slot, otherwise a tombstone is left
    /// so that probe sequences passing through the group keep going.
    pub(crate) fn remove_at(&mut self, pos: SlotPos) -> Slot<K, V> {
        let group = &mut self.groups[pos.group];
        let ctrl = if self.small || !group.ctrl().match_empty().is_empty() {
            CTRL_EMPTY
        } else {
            CTRL_DELETED
        };
        let Some(slot) = group.take(pos.slot, ctrl) else {
            panic!("slot {pos:?} is not full");
        };
        if ctrl == CTRL_EMPTY {
            self.growth_left += 1;
        }
        self.used -= 1;
        slot
    }

    /// Removes the entry matching `key`.
    #[cfg(test)]
    pub(crate) fn remove<Q>(&mut self, hash: u64, key: &Q) -> Option<Slot<K, V>>
    where
        Q: Equivalent<K> + ?Sized,
    {
        let pos = self.find(hash, key)?;
        Some(self.remove_at(pos))
    }

    /// Removes every entry for which `pred` returns `false`, counting removals in `removed`.
    ///
    /// The table stays consistent if `pred` panics.
    pub(crate) fn retain<F: FnMut(&K, &mut V) -> bool>(
        &mut self,
        pred: &mut F,
        removed: &mut usize,
    ) {
        for entry in 0..self.capacity {
            let pos = SlotPos::from_entry(entry);
            let Some(slot) = self.slot_mut(pos) else {
                continue;
            };
            if !pred(&slot.key, &mut slot.val) {
                let slot = self.remove_at(pos);
                *removed += 1;
                drop(slot);
            }
        }
    }

    /// Drops every entry and every tombstone.
    pub(crate) fn clear(&mut self) {
        let max_growth = self.max_growth();
        if self.used == 0 && self.growth_left == max_growth {
            return;
        }
        self.groups.iter_mut().for_each(Group::clear);
        self.used = 0;
        self.growth_left = max_growth;
    }

    /// Doubles the capacity if the result stays within [`MAX_TABLE_CAPACITY`], otherwise splits the
    /// table into two tables one level deeper; `self` becomes the left half and the right half is
    /// returned for the caller to register.
    ///
    /// A table whose entries and pending `hash` would all land in the same half keeps doubling
    /// instead, beyond [`MAX_TABLE_CAPACITY`] if need be. Splitting it would only move every entry
    /// into a new table of the same size.
    ///
    /// Capacity is never reclaimed in place: an iterator relies on a table's layout being replaced
    /// only as a whole.
    pub(crate) fn rehash(&mut self, hash: u64) -> Option<Table<K, V>> {
        if self.capacity * 2 <= MAX_TABLE_CAPACITY || !self.splits(hash) {
            self.grow();
            None
        } else {
            Some(self.split())
        }
    }

    /// Returns the `(hash, id)` pairs of every entry visited from `entry_offset`.
    pub(crate) fn snapshot(&self, entry_offset: usize) -> Vec<(u64, u64)> {
        let mask = self.capacity - 1;
        let mut entries = Vec::with_capacity(self.used);
        for entry in 0..self.capacity {
            if let Some(slot) = self.slot_at(entry.wrapping_add(entry_offset) & mask) {
                entries.push((slot.hash, slot.id));
            }
        }
        entries
    }

    fn grow(&mut self) {
        let Some(capacity) = self.capacity.checked_mul(2) else {
            panic!("capacity overflow");
        };
        let grown = Table::alloc(capacity, self.index, self.local_depth);
        let old = mem::replace(self, grown);
        for slot in old.drain() {
            self.unchecked_put(slot);
        }
        debug!(
            target: "exhash",
            capacity,
            index = self.index,
            local_depth = self.local_depth,
            "table grown"
        );
    }

    fn split(&mut self) -> Table<K, V> {
        let local_depth = self.local_depth + 1;
        assert!(local_depth <= u64::BITS, "directory overflow");
        // Either half may receive every entry.
        let left = Table::alloc(self.capacity, self.index, local_depth);
        let mut right = Table::alloc(self.capacity, 0, local_depth);
        let old = mem::replace(self, left);
        let mask = local_depth_mask(local_depth);
        for slot in old.drain() {
            if slot.hash & mask == 0 {
                self.unchecked_put(slot);
            } else {
                right.unchecked_put(slot);
            }
        }
        debug!(
            target: "exhash",
            local_depth,
            left = self.used,
            right = right.used,
            "table split"
        );
        right
    }

    /// Stores an entry known to be absent, skipping the key comparison.
    fn unchecked_put(&mut self, slot: Slot<K, V>) {
        assert!(
            self.growth_left > 0,
            "invariant failed: growth_left is unexpectedly 0"
        );
        let mut seq = ProbeSeq::new(slot.hash, self.group_mask());
        while !seq.exhausted() {
            if let Some(i) = self.groups[seq.offset()].ctrl().match_empty_or_deleted().first() {
                let pos = SlotPos {
                    group: seq.offset(),
                    slot: i,
                };
                self.insert_at(pos, slot);
                return;
            }
            seq.advance();
        }
        panic!("no empty slot in a table of capacity {}", self.capacity)
    }

    /// Returns `true` if a split would put at least one entry, or the pending `hash`, in each half.
    fn splits(&self, hash: u64) -> bool {
        if self.local_depth == u64::BITS {
            return false;
        }
        let mask = local_depth_mask(self.local_depth + 1);
        let side = hash & mask;
        self.groups
            .iter()
            .flat_map(|g| (0..GROUP_SLOTS).filter_map(move |i| g.slot(i)))
            .any(|s| s.hash & mask != side)
    }

    #[inline]
    const fn max_growth(&self) -> usize {
        if self.small {
            GROUP_SLOTS
        } else {
            max_growth_left(self.capacity)
        }
    }

    fn drain(self) -> impl Iterator<Item = Slot<K, V>> {
        self.groups
            .into_iter()
            .flat_map(|g| g.into_slots().into_iter().flatten())
    }

    fn probe<F: FnMut(&Slot<K, V>) -> bool>(&self, hash: u64, mut matches: F) -> Option<SlotPos> {
        let h2 = h2(hash);
        let mut seq = ProbeSeq::new(hash, self.group_mask());
        while !seq.exhausted() {
            let group = &self.groups[seq.offset()];
            let ctrl = group.ctrl();
            for i in ctrl.match_h2(h2) {
                if group.slot(i).is_some_and(&mut matches) {
                    return Some(SlotPos {
                        group: seq.offset(),
                        slot: i,
                    });
                }
            }
            if !ctrl.match_empty().is_empty() {
                return None;
            }
            seq.advance();
        }
        None
    }

    #[inline]
    fn group_mask(&self) -> usize {
        self.groups.len() - 1
    }

    /// Verifies the control bytes and the counters against the slots.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        assert_eq!(self.groups.len() * GROUP_SLOTS, self.capacity);
        assert!(self.capacity.is_power_of_two());
        let (mut used, mut deleted, mut empty) = (0, 0, 0);
        for (g, group) in self.groups.iter().enumerate() {
            let ctrl = group.ctrl();
            assert!(
                ctrl.match_deleted().is_empty() || ctrl.match_empty().is_empty(),
                "group {g} holds both empty and deleted slots"
            );
            for i in 0..GROUP_SLOTS {
                match ctrl.get(i) {
                    CTRL_EMPTY => {
                        empty += 1;
                        assert!(group.slot(i).is_none());
                    }
                    CTRL_DELETED => {
                        deleted += 1;
                        assert!(group.slot(i).is_none());
                    }
                    stored => {
                        used += 1;
                        let Some(slot) = group.slot(i) else {
                            panic!("full control byte without an entry at {g}:{i}");
                        };
                        assert_eq!(h2(slot.hash), stored);
                        assert_eq!(
                            self.find_by_id(slot.hash, slot.id),
                            Some(SlotPos { group: g, slot: i })
                        );
                    }
                }
            }
        }
        assert_eq!(used, self.used);
        if self.small {
            assert_eq!(self.capacity, GROUP_SLOTS);
            assert_eq!(deleted, 0, "tombstone in a small table");
        } else {
            assert!(empty > 0, "no empty slot left");
        }
        assert_eq!(self.growth_left, self.max_growth() - used - deleted);
        assert_eq!(deleted, self.tombstones());
    }
}

/// Returns the number of entries a table of `capacity` may hold.
#[inline]
const fn max_growth_left(capacity: usize) -> usize {
    if capacity <= GROUP_SLOTS {
        // One slot has to stay empty.
        capacity - 1
    } else {
        capacity / GROUP_SLOTS * MAX_AVG_GROUP_LOAD
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn slot(hash: u64, key: u64) -> Slot<u64, u64> {
        Slot {
            hash,
            id: key,
            key,
            val: key * 10,
        }
    }

    fn put(table: &mut Table<u64, u64>, hash: u64, key: u64) -> PutSlot {
        let result = table.put_slot(hash, &key);
        if let PutSlot::Vacant(pos) = result {
            table.insert_at(pos, slot(hash, key));
        }
        result
    }

    #[test]
    fn put_get_remove() {
        let mut table: Table<u64, u64> = Table::new(0, 0, 0);
        assert_eq!(table.capacity(), GROUP_SLOTS);
        for key in 0..7 {
            assert!(matches!(put(&mut table, key * 31, key), PutSlot::Vacant(_)));
        }
        table.check_invariants();
        assert_eq!(table.len(), 7);
        for key in 0..7 {
            let pos = table.find(key * 31, &key);
            assert_eq!(pos.and_then(|p| table.slot(p)).map(|s| s.val), Some(key * 10));
            assert!(matches!(put(&mut table, key * 31, key), PutSlot::Occupied(_)));
        }
        assert_eq!(put(&mut table, 1000, 1000), PutSlot::Full);
        assert!(table.find(999, &999).is_none());

        let removed = table.remove(3 * 31, &3);
        assert_eq!(removed.map(|s| s.key), Some(3));
        assert!(table.find(3 * 31, &3).is_none());
        assert_eq!(table.tombstones(), 0);
        table.check_invariants();
        assert!(matches!(put(&mut table, 1000, 1000), PutSlot::Vacant(_)));
        table.check_invariants();
    }

    #[test]
    fn colliding_hashes() {
        let mut table: Table<u64, u64> = Table::new(64, 0, 0);
        for key in 0..40 {
            put(&mut table, 0x1234, key);
        }
        table.check_invariants();
        for key in 0..40 {
            assert!(table.find(0x1234, &key).is_some());
        }
        assert!(table.find(0x1234, &40).is_none());
    }

    #[test]
    fn tombstone_reuse() {
        let mut table: Table<u64, u64> = Table::new(16, 0, 0);
        // Hashes below 128 all start probing at group 0.
        for key in 0..GROUP_SLOTS as u64 {
            put(&mut table, key, key);
        }
        assert!(table.groups[0].ctrl().match_empty().is_empty());
        let growth_left = table.growth_left;

        assert!(table.remove(2, &2).is_some());
        assert_eq!(table.tombstones(), 1);
        assert_eq!(table.growth_left, growth_left);
        table.check_invariants();

        let PutSlot::Vacant(pos) = put(&mut table, 100, 100) else {
            panic!("tombstone not offered");
        };
        assert_eq!(pos, SlotPos { group: 0, slot: 2 });
        assert_eq!(table.tombstones(), 0);
        assert_eq!(table.growth_left, growth_left);
        table.check_invariants();
    }

    #[test]
    fn grow_keeps_entries() {
        let mut table: Table<u64, u64> = Table::new(8, 0, 0);
        let mut key = 0_u64;
        while put(&mut table, key.wrapping_mul(0x9e37_79b9_7f4a_7c15), key) != PutSlot::Full {
            key += 1;
        }
        assert_eq!(key, 7);
        assert!(table.rehash(0).is_none());
        assert_eq!(table.capacity(), 16);
        table.check_invariants();
        for k in 0..key {
            assert!(table.find(k.wrapping_mul(0x9e37_79b9_7f4a_7c15), &k).is_some());
        }
    }

    #[test]
    fn split_partitions_by_depth_bit() {
        let mut table: Table<u64, u64> = Table::new(MAX_TABLE_CAPACITY, 4, 2);
        let hashes: Vec<u64> = (0..64_u64)
            .map(|i| (i << 58) | i.wrapping_mul(0x2545_f491_4f6c_dd1d) >> 6)
            .collect();
        for (key, hash) in hashes.iter().enumerate() {
            put(&mut table, *hash, key as u64);
        }
        let Some(right) = table.rehash(0) else {
            panic!("table at maximum capacity grew");
        };
        let left = table;
        left.check_invariants();
        right.check_invariants();
        assert_eq!(left.local_depth(), 3);
        assert_eq!(right.local_depth(), 3);
        assert_eq!(left.index(), 4);
        assert_eq!(left.len() + right.len(), hashes.len());
        for (key, hash) in hashes.iter().enumerate() {
            let (keep, other) = if hash & local_depth_mask(3) == 0 {
                (&left, &right)
            } else {
                (&right, &left)
            };
            assert!(keep.find(*hash, &(key as u64)).is_some());
            assert!(other.find(*hash, &(key as u64)).is_none());
        }
    }

    #[test]
    fn same_side_hashes_grow_past_maximum() {
        let mut table: Table<u64, u64> = Table::new(MAX_TABLE_CAPACITY, 0, 0);
        // The top bit is clear in every hash.
        let hash = |key: u64| key.wrapping_mul(0x9e37_79b9_7f4a_7c15) >> 1;
        let mut key = 0_u64;
        while put(&mut table, hash(key), key) != PutSlot::Full {
            key += 1;
        }
        assert!(table.rehash(hash(key)).is_none());
        assert_eq!(table.capacity(), MAX_TABLE_CAPACITY * 2);
        assert_eq!(table.local_depth(), 0);
        table.check_invariants();

        // A pending hash on the other side is enough to split.
        while put(&mut table, hash(key), key) != PutSlot::Full {
            key += 1;
        }
        let Some(right) = table.rehash(u64::MAX) else {
            panic!("table did not split");
        };
        assert_eq!(right.len(), 0);
        assert_eq!(right.capacity(), MAX_TABLE_CAPACITY * 2);
        assert_eq!(table.len(), key as usize);
        table.check_invariants();
        right.check_invariants();
    }

    #[test]
    fn identical_hashes_at_full_depth() {
        let mut table: Table<u64, u64> = Table::new(MAX_TABLE_CAPACITY, 0, u64::BITS);
        assert!(!table.splits(7));
        for key in 0..10 {
            put(&mut table, 7, key);
        }
        assert!(!table.splits(u64::MAX));
        assert!(table.rehash(7).is_none());
        assert_eq!(table.capacity(), MAX_TABLE_CAPACITY * 2);
    }

    #[test]
    fn small_table_fills_every_slot() {
        let mut table: Table<u64, u64> = Table::small();
        // Spread hashes would target different groups in a larger table.
        for key in 0..GROUP_SLOTS as u64 {
            let hash = key.wrapping_mul(0x9e37_79b9_7f4a_7c15);
            assert!(matches!(put(&mut table, hash, key), PutSlot::Vacant(_)));
        }
        assert!(table.is_small());
        assert_eq!(table.len(), GROUP_SLOTS);
        assert_eq!(table.capacity(), GROUP_SLOTS);
        table.check_invariants();
        assert_eq!(put(&mut table, 1, 100), PutSlot::Full);

        // Removal from a full small table never leaves a tombstone.
        let hash = 3_u64.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        assert!(table.remove(hash, &3).is_some());
        assert_eq!(table.tombstones(), 0);
        table.check_invariants();
        assert!(matches!(put(&mut table, 1, 100), PutSlot::Vacant(_)));
        assert_eq!(put(&mut table, 2, 101), PutSlot::Full);

        assert!(table.rehash(2).is_none());
        assert!(!table.is_small());
        assert_eq!(table.capacity(), 16);
        assert_eq!(table.len(), GROUP_SLOTS);
        table.check_invariants();
        assert!(table.find(1, &100).is_some());
    }

    #[test]
    fn clear_resets_counters() {
        let mut table: Table<u64, u64> = Table::new(16, 0, 0);
        for key in 0..GROUP_SLOTS as u64 {
            put(&mut table, key, key);
        }
        assert!(table.remove(0, &0).is_some());
        assert_eq!(table.tombstones(), 1);
        table.clear();
        assert_eq!(table.len(), 0);
        assert_eq!(table.tombstones(), 0);
        assert_eq!(table.snapshot(0), Vec::new());
        table.check_invariants();
    }

    #[test]
    fn snapshot_order() {
        let mut table: Table<u64, u64> = Table::new(8, 0, 0);
        for key in 0..5 {
            put(&mut table, key, key);
        }
        let forward = table.snapshot(0);
        let rotated = table.snapshot(3);
        assert_eq!(forward.len(), 5);
        assert_eq!(rotated.len(), 5);
        let mut sorted = rotated.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, forward);
        assert_ne!(rotated, forward);
    }
}

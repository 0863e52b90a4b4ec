//! Control bytes and slot groups.

use std::array;

/// The number of slots in a [`Group`].
pub(crate) const GROUP_SLOTS: usize = 8;

/// The control byte of a slot that has never been written since the last reset.
pub(crate) const CTRL_EMPTY: u8 = 0b1000_0000;

/// The control byte of a tombstone.
pub(crate) const CTRL_DELETED: u8 = 0b1111_1110;

const BITSET_LSB: u64 = 0x0101_0101_0101_0101;
const BITSET_MSB: u64 = 0x8080_8080_8080_8080;
const BITSET_LOW7: u64 = 0x7f7f_7f7f_7f7f_7f7f;

/// A set of slot indexes within a [`Group`], one bit per control byte.
///
/// Only the most significant bit of each byte is ever set.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct BitSet(u64);

/// Eight control bytes packed in a word; byte `i` belongs to slot `i`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct CtrlWord(u64);

/// A stored entry.
///
/// `hash` is kept so that grow and split never call back into user code, and `id` is unique
/// within the owning map for the lifetime of the entry.
#[derive(Debug)]
pub(crate) struct Slot<K, V> {
    pub(crate) hash: u64,
    pub(crate) id: u64,
    pub(crate) key: K,
    pub(crate) val: V,
}

/// A block of [`GROUP_SLOTS`] slots and their control word.
///
/// A slot holds `Some` if and only if its control byte is full.
pub(crate) struct Group<K, V> {
    ctrl: CtrlWord,
    slots: [Option<Slot<K, V>>; GROUP_SLOTS],
}

impl BitSet {
    /// Returns `true` if no slot is in the set.
    #[inline]
    pub(crate) const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the lowest slot index in the set.
    #[inline]
    pub(crate) fn first(self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some((self.0.trailing_zeros() >> 3) as usize)
        }
    }

    /// Removes the lowest slot index from the set.
    #[inline]
    pub(crate) const fn remove_first(self) -> Self {
        Self(self.0 & self.0.wrapping_sub(1))
    }

    #[cfg(test)]
    pub(crate) const fn len(self) -> usize {
        self.0.count_ones() as usize
    }
}

impl Iterator for BitSet {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let first = self.first()?;
        *self = self.remove_first();
        Some(first)
    }
}

impl CtrlWord {
    /// Every slot is empty.
    pub(crate) const EMPTY: Self = Self(BITSET_MSB);

    /// Returns the control byte of slot `i`.
    #[inline]
    pub(crate) const fn get(self, i: usize) -> u8 {
        (self.0 >> (i * 8)) as u8
    }

    /// Sets the control byte of slot `i`.
    #[inline]
    pub(crate) fn set(&mut self, i: usize, ctrl: u8) {
        let shift = i * 8;
        self.0 = (self.0 & !(0xff << shift)) | (u64::from(ctrl) << shift);
    }

    /// Marks every slot empty.
    #[inline]
    pub(crate) fn set_empty(&mut self) {
        *self = Self::EMPTY;
    }

    /// Returns the slots whose control byte stores `h2`.
    ///
    /// The match is exact: no per-byte borrow leaks into the neighbouring byte.
    #[inline]
    pub(crate) const fn match_h2(self, h2: u8) -> BitSet {
        let x = self.0 ^ (BITSET_LSB * h2 as u64);
        BitSet(!(((x & BITSET_LOW7) + BITSET_LOW7) | x | BITSET_LOW7))
    }

    /// Returns the empty slots.
    #[inline]
    pub(crate) const fn match_empty(self) -> BitSet {
        // Empty has bit 1 cleared, deleted has it set, full has bit 7 cleared.
        BitSet(self.0 & !(self.0 << 6) & BITSET_MSB)
    }

    /// Returns the empty and deleted slots.
    #[inline]
    pub(crate) const fn match_empty_or_deleted(self) -> BitSet {
        BitSet(self.0 & !(self.0 << 7) & BITSET_MSB)
    }

    /// Returns the deleted slots.
    #[inline]
    pub(crate) const fn match_deleted(self) -> BitSet {
        BitSet(self.match_empty_or_deleted().0 & !self.match_empty().0)
    }

    /// Returns the full slots.
    #[cfg(test)]
    pub(crate) const fn match_full(self) -> BitSet {
        BitSet(!self.0 & BITSET_MSB)
    }
}

impl<K, V> Group<K, V> {
    /// Creates a [`Group`] of empty slots.
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            ctrl: CtrlWord::EMPTY,
            slots: array::from_fn(|_| None),
        }
    }

    #[inline]
    pub(crate) const fn ctrl(&self) -> CtrlWord {
        self.ctrl
    }

    #[inline]
    pub(crate) fn slot(&self, i: usize) -> Option<&Slot<K, V>> {
        self.slots[i].as_ref()
    }

    #[inline]
    pub(crate) fn slot_mut(&mut self, i: usize) -> Option<&mut Slot<K, V>> {
        self.slots[i].as_mut()
    }

    #[inline]
    pub(crate) fn slots_mut(&mut self) -> &mut [Option<Slot<K, V>>; GROUP_SLOTS] {
        &mut self.slots
    }

    /// Stores `slot` at `i` as full with the supplied `h2`.
    #[inline]
    pub(crate) fn store(&mut self, i: usize, h2: u8, slot: Slot<K, V>) -> &mut Slot<K, V> {
        self.ctrl.set(i, h2);
        self.slots[i].insert(slot)
    }

    /// Takes the slot out of `i` and sets its control byte to `ctrl`, which must not be full.
    #[inline]
    pub(crate) fn take(&mut self, i: usize, ctrl: u8) -> Option<Slot<K, V>> {
        debug_assert!(ctrl == CTRL_EMPTY || ctrl == CTRL_DELETED);
        self.ctrl.set(i, ctrl);
        self.slots[i].take()
    }

    /// Drops every entry and marks every slot empty.
    pub(crate) fn clear(&mut self) {
        self.ctrl.set_empty();
        self.slots.iter_mut().for_each(|s| *s = None);
    }

    /// Consumes the [`Group`], returning the slot storage.
    #[inline]
    pub(crate) fn into_slots(self) -> [Option<Slot<K, V>>; GROUP_SLOTS] {
        self.slots
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use proptest::prelude::*;

    fn ctrl_word(bytes: [u8; GROUP_SLOTS]) -> CtrlWord {
        let mut word = CtrlWord::EMPTY;
        for (i, b) in bytes.iter().enumerate() {
            word.set(i, *b);
        }
        word
    }

    #[test]
    fn empty_word() {
        let word = CtrlWord::EMPTY;
        assert_eq!(word.match_empty().len(), GROUP_SLOTS);
        assert_eq!(word.match_empty().collect::<Vec<_>>(), (0..8).collect::<Vec<_>>());
        assert!(word.match_full().is_empty());
        assert!(word.match_deleted().is_empty());
        assert!(word.match_h2(0).is_empty());
        for i in 0..GROUP_SLOTS {
            assert_eq!(word.get(i), CTRL_EMPTY);
        }
    }

    #[test]
    fn mixed_word() {
        let word = ctrl_word([
            0x12,
            CTRL_EMPTY,
            CTRL_DELETED,
            0x12,
            0x00,
            0x7f,
            CTRL_DELETED,
            0x13,
        ]);
        assert_eq!(word.match_h2(0x12).collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(word.match_h2(0x13).collect::<Vec<_>>(), vec![7]);
        assert_eq!(word.match_h2(0x00).collect::<Vec<_>>(), vec![4]);
        assert_eq!(word.match_h2(0x7f).collect::<Vec<_>>(), vec![5]);
        assert_eq!(word.match_empty().collect::<Vec<_>>(), vec![1]);
        assert_eq!(word.match_deleted().collect::<Vec<_>>(), vec![2, 6]);
        assert_eq!(
            word.match_empty_or_deleted().collect::<Vec<_>>(),
            vec![1, 2, 6]
        );
        assert_eq!(word.match_full().collect::<Vec<_>>(), vec![0, 3, 4, 5, 7]);
    }

    #[test]
    fn bitset_first() {
        let word = ctrl_word([0x01, 0x02, 0x03, 0x01, 0x05, 0x06, 0x07, 0x01]);
        let matched = word.match_h2(0x01);
        assert_eq!(matched.first(), Some(0));
        assert_eq!(matched.remove_first().first(), Some(3));
        assert_eq!(matched.remove_first().remove_first().first(), Some(7));
        assert!(matched
            .remove_first()
            .remove_first()
            .remove_first()
            .is_empty());
    }

    #[test]
    fn group_store_take() {
        let mut group: Group<u64, u64> = Group::new();
        let slot = group.store(
            5,
            0x21,
            Slot {
                hash: 0xa1,
                id: 3,
                key: 7,
                val: 11,
            },
        );
        slot.val += 1;
        assert_eq!(group.ctrl().match_h2(0x21).first(), Some(5));
        assert_eq!(group.slot(5).map(|s| s.val), Some(12));
        assert!(group.slot(4).is_none());
        let taken = group.take(5, CTRL_DELETED);
        assert_eq!(taken.map(|s| (s.key, s.id)), Some((7, 3)));
        assert_eq!(group.ctrl().match_deleted().first(), Some(5));
        group.clear();
        assert_eq!(group.ctrl(), CtrlWord::EMPTY);
    }

    proptest! {
        #[test]
        fn match_h2_is_exact(bytes in proptest::array::uniform8(0_u8..=255), h2 in 0_u8..128) {
            let bytes = bytes.map(|b| match b {
                0..=127 => b,
                128..=191 => CTRL_EMPTY,
                _ => CTRL_DELETED,
            });
            let word = ctrl_word(bytes);
            let expected: Vec<usize> = (0..GROUP_SLOTS).filter(|i| bytes[*i] == h2).collect();
            prop_assert_eq!(word.match_h2(h2).collect::<Vec<_>>(), expected);
            let empty: Vec<usize> = (0..GROUP_SLOTS).filter(|i| bytes[*i] == CTRL_EMPTY).collect();
            prop_assert_eq!(word.match_empty().collect::<Vec<_>>(), empty);
            let full: Vec<usize> = (0..GROUP_SLOTS).filter(|i| bytes[*i] < 128).collect();
            prop_assert_eq!(word.match_full().collect::<Vec<_>>(), full);
        }
    }
}

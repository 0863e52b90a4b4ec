//! Open-addressed tables routed by an extendible hashing directory.

pub(crate) mod directory;
pub(crate) mod group;
pub(crate) mod table;

/// Spreads the bits of a hash over the whole word.
///
/// The directory consumes the most significant bits and the control byte the least significant
/// ones, so a hasher that leaves either end constant would route every key to one table.
#[inline]
pub(crate) const fn mix(hash: u64) -> u64 {
    let mut h = hash;
    h ^= h >> 30;
    h = h.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h ^= h >> 27;
    h = h.wrapping_mul(0x94d0_49bb_1331_11eb);
    h ^ (h >> 31)
}

/// Returns the probe and directory bits of a hash.
#[inline]
pub(crate) const fn h1(hash: u64) -> u64 {
    hash >> 7
}

/// Returns the seven bits of a hash cached in the control byte.
#[inline]
pub(crate) const fn h2(hash: u64) -> u8 {
    (hash & 0x7f) as u8
}

/// Returns the hash bit that separates the two halves of a table split to `local_depth`.
///
/// `local_depth` counts hash bits from the most significant end, so depth `d` selects bit
/// `64 - d`.
#[inline]
pub(crate) const fn local_depth_mask(local_depth: u32) -> u64 {
    debug_assert!(local_depth >= 1 && local_depth <= u64::BITS);
    1_u64 << (u64::BITS - local_depth)
}

/// Triangular probe sequence over the groups of a table.
///
/// Offsets are `(h1 + (i * i + i) / 2) & mask`; with a power-of-two group count the sequence
/// visits each group exactly once in the first `mask + 1` steps.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ProbeSeq {
    mask: usize,
    offset: usize,
    index: usize,
}

impl ProbeSeq {
    #[inline]
    pub(crate) const fn new(hash: u64, mask: usize) -> Self {
        Self {
            mask,
            offset: h1(hash) as usize & mask,
            index: 0,
        }
    }

    /// The group the sequence currently points at.
    #[inline]
    pub(crate) const fn offset(&self) -> usize {
        self.offset
    }

    /// Returns `true` once every group has been visited.
    #[inline]
    pub(crate) const fn exhausted(&self) -> bool {
        self.index > self.mask
    }

    #[inline]
    pub(crate) fn advance(&mut self) {
        self.index += 1;
        self.offset = (self.offset + self.index) & self.mask;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn hash_split() {
        let hash = 0xdead_beef_0123_4567_u64;
        assert_eq!(h2(hash), 0x67);
        assert_eq!(h1(hash), hash >> 7);
        assert_eq!((h1(hash) << 7) | u64::from(h2(hash)), hash);
        assert_eq!(local_depth_mask(1), 1 << 63);
        assert_eq!(local_depth_mask(64), 1);
    }

    #[test]
    fn mix_spreads_small_integers() {
        assert_eq!(mix(0), 0);
        let top: std::collections::HashSet<u64> = (1..=64_u64).map(|i| mix(i) >> 58).collect();
        assert!(top.len() > 24);
        let low: std::collections::HashSet<u8> = (1..=64_u64).map(|i| h2(mix(i << 32))).collect();
        assert!(low.len() > 24);
    }

    #[test]
    fn triangular_offsets() {
        let mut seq = ProbeSeq::new(3 << 7, 15);
        let mut offsets = Vec::new();
        while !seq.exhausted() {
            offsets.push(seq.offset());
            seq.advance();
        }
        assert_eq!(&offsets[..5], &[3, 4, 6, 9, 13]);
    }

    proptest! {
        #[test]
        fn probe_visits_every_group(hash in any::<u64>(), shift in 0_u32..8) {
            let groups = 1_usize << shift;
            let mut seq = ProbeSeq::new(hash, groups - 1);
            let mut visited = vec![false; groups];
            while !seq.exhausted() {
                prop_assert!(!visited[seq.offset()]);
                visited[seq.offset()] = true;
                seq.advance();
            }
            prop_assert!(visited.iter().all(|v| *v));
        }
    }
}

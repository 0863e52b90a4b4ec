//! [`HashMap`] is an extendible hashing map of SwissTable-style tables.

mod cursor;
mod iter;

pub use cursor::Cursor;
pub use iter::{IntoIter, Iter, IterMut};

use crate::hash_table::directory::Directory;
use crate::hash_table::group::Slot;
use crate::hash_table::mix;
use crate::hash_table::table::{PutSlot, SlotPos, Table};
use crate::Equivalent;
use std::collections::hash_map::RandomState;
use std::fmt::{self, Debug};
use std::hash::{BuildHasher, Hash};
use std::mem::replace;
use std::ops::{Deref, DerefMut, Index};
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::Relaxed;

/// Hash map built of a directory of open-addressed tables.
///
/// [`HashMap`] routes each key to a table by the most significant bits of its hash. A table
/// doubles in capacity until it reaches 1024 slots; beyond that it splits into two tables, each
/// taking one half of the hash prefix it used to own, and the directory doubles whenever a split
/// needs one more bit than it currently uses. As a result, no single insertion ever has to
/// relocate more than one table worth of entries.
///
/// ## The key features of [`HashMap`]
///
/// * Group probing: eight control bytes are matched at once to find candidate slots.
/// * Incremental growth: only the table that ran out of space is rehashed.
/// * Stable iteration: a [`Cursor`] tolerates insertions, removals, growth, splits, and
///   [`clear`](Self::clear) between its steps.
///
/// ## Single writer
///
/// Mutation requires `&mut self`. A write that panics half-way, for instance in a user-supplied
/// [`Hash`] or [`Eq`] implementation, leaves the [`HashMap`] marked as being written, and any
/// later access panics instead of running into an inconsistent state.
pub struct HashMap<K, V, H = RandomState>
where
    H: BuildHasher,
{
    directory: Directory<K, V>,
    len: usize,
    clear_seq: u64,
    next_id: u64,
    map_id: u64,
    writing: bool,
    key_update: bool,
    build_hasher: H,
}

/// [`Entry`] represents a single entry in a [`HashMap`].
pub enum Entry<'h, K, V, H = RandomState>
where
    H: BuildHasher,
{
    /// An occupied entry.
    Occupied(OccupiedEntry<'h, K, V, H>),

    /// A vacant entry.
    Vacant(VacantEntry<'h, K, V, H>),
}

/// [`OccupiedEntry`] is a view into an occupied entry in a [`HashMap`].
pub struct OccupiedEntry<'h, K, V, H = RandomState>
where
    H: BuildHasher,
{
    hashmap: &'h mut HashMap<K, V, H>,
    arena: usize,
    pos: SlotPos,
}

/// [`VacantEntry`] is a view into a vacant entry in a [`HashMap`].
///
/// The slot has already been reserved: inserting through a [`VacantEntry`] never rehashes.
pub struct VacantEntry<'h, K, V, H = RandomState>
where
    H: BuildHasher,
{
    hashmap: &'h mut HashMap<K, V, H>,
    key: K,
    hash: u64,
    arena: usize,
    pos: SlotPos,
}

/// Structural statistics of a [`HashMap`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Statistics {
    /// The number of hash bits the directory uses.
    pub global_depth: u32,
    /// The number of directory entries.
    pub directory_len: usize,
    /// The number of tables.
    pub tables: usize,
    /// The sum of the capacity of every table.
    pub capacity: usize,
    /// The number of entries.
    pub len: usize,
    /// The number of tombstones.
    pub tombstones: usize,
}

/// Where a key is, or where it is going to be stored.
enum Reserved {
    Occupied(usize, SlotPos),
    Vacant(usize, SlotPos),
}

/// Resets the write flag and the length even if the predicate of [`HashMap::retain`] panics.
struct RetainGuard<'h, K, V, H>
where
    H: BuildHasher,
{
    hashmap: &'h mut HashMap<K, V, H>,
    removed: usize,
}

static MAP_ID: AtomicU64 = AtomicU64::new(0);

impl<K, V, H> HashMap<K, V, H>
where
    H: BuildHasher,
{
    /// Creates an empty [`HashMap`] with the given [`BuildHasher`].
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    /// use std::collections::hash_map::RandomState;
    ///
    /// let hashmap: HashMap<u64, u32, RandomState> = HashMap::with_hasher(RandomState::new());
    /// ```
    #[inline]
    pub fn with_hasher(build_hasher: H) -> Self {
        Self::with_directory(Directory::new(), build_hasher)
    }

    /// Creates an empty [`HashMap`] with the specified capacity and [`BuildHasher`].
    ///
    /// The actual capacity is equal to or greater than the specified capacity. Capacities above a
    /// single table are spread over a directory of tables.
    ///
    /// # Panics
    ///
    /// Panics if the required capacity overflows `usize`.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    /// use std::collections::hash_map::RandomState;
    ///
    /// let hashmap: HashMap<u64, u32, RandomState> =
    ///     HashMap::with_capacity_and_hasher(1000, RandomState::new());
    ///
    /// let result = hashmap.capacity();
    /// assert_eq!(result, 2048);
    /// ```
    #[inline]
    pub fn with_capacity_and_hasher(capacity: usize, build_hasher: H) -> Self {
        Self::with_directory(Directory::with_capacity(capacity), build_hasher)
    }

    /// Makes an upsert that matches an existing key also replace the stored key.
    ///
    /// This is needed for key types of which equal instances are distinguishable, such as
    /// floating point numbers wrapped to equate `-0.0` and `+0.0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    /// use std::hash::{Hash, Hasher};
    ///
    /// #[derive(Debug)]
    /// struct Tagged(u64, &'static str);
    /// impl PartialEq for Tagged {
    ///     fn eq(&self, other: &Self) -> bool {
    ///         self.0 == other.0
    ///     }
    /// }
    /// impl Eq for Tagged {}
    /// impl Hash for Tagged {
    ///     fn hash<S: Hasher>(&self, state: &mut S) {
    ///         self.0.hash(state);
    ///     }
    /// }
    ///
    /// let mut hashmap: HashMap<Tagged, u32> = HashMap::default().with_key_update(true);
    ///
    /// hashmap.upsert(Tagged(1, "old"), 0);
    /// hashmap.upsert(Tagged(1, "new"), 1);
    /// assert_eq!(hashmap.get_key_value(&Tagged(1, "")).map(|(k, _)| k.1), Some("new"));
    /// ```
    #[inline]
    #[must_use]
    pub fn with_key_update(mut self, key_update: bool) -> Self {
        self.key_update = key_update;
        self
    }

    /// Returns a reference to the specified [`BuildHasher`].
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    /// use std::collections::hash_map::RandomState;
    ///
    /// let hashmap: HashMap<u64, u32> = HashMap::default();
    /// let _hasher: &RandomState = hashmap.hasher();
    /// ```
    #[inline]
    pub fn hasher(&self) -> &H {
        &self.build_hasher
    }

    /// Returns the number of entries in the [`HashMap`].
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// assert!(hashmap.insert(1, 0).is_ok());
    /// assert_eq!(hashmap.len(), 1);
    /// ```
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the [`HashMap`] is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// assert!(hashmap.is_empty());
    /// assert!(hashmap.insert(1, 0).is_ok());
    /// assert!(!hashmap.is_empty());
    /// ```
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the capacity of the [`HashMap`].
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    /// assert_eq!(hashmap.capacity(), 0);
    ///
    /// assert!(hashmap.insert(1, 0).is_ok());
    /// assert_eq!(hashmap.capacity(), 8);
    /// ```
    #[inline]
    pub fn capacity(&self) -> usize {
        self.directory.tables().iter().map(Table::capacity).sum()
    }

    /// Returns the structural [`Statistics`] of the [`HashMap`].
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let hashmap: HashMap<u64, u32> = HashMap::with_capacity(10_000);
    /// let statistics = hashmap.statistics();
    ///
    /// assert_eq!(statistics.global_depth, 4);
    /// assert_eq!(statistics.tables, 16);
    /// assert_eq!(statistics.tombstones, 0);
    /// ```
    pub fn statistics(&self) -> Statistics {
        let tables = self.directory.tables();
        Statistics {
            global_depth: self.directory.global_depth(),
            directory_len: self.directory.len(),
            tables: tables.len(),
            capacity: tables.iter().map(Table::capacity).sum(),
            len: self.len,
            tombstones: tables.iter().map(Table::tombstones).sum(),
        }
    }

    /// Clears the [`HashMap`] by removing all key-value pairs.
    ///
    /// Tables stay allocated. A [`Cursor`] created before the call returns no more entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// assert!(hashmap.insert(1, 0).is_ok());
    /// hashmap.clear();
    ///
    /// assert!(hashmap.is_empty());
    /// assert_eq!(hashmap.capacity(), 8);
    /// ```
    pub fn clear(&mut self) {
        self.begin_write();
        self.directory.clear();
        self.len = 0;
        self.clear_seq = self.clear_seq.wrapping_add(1);
        self.end_write();
    }

    /// Returns a [`Cursor`] that may be advanced while the [`HashMap`] is being modified.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    /// assert!(hashmap.insert(1, 0).is_ok());
    /// assert!(hashmap.insert(2, 0).is_ok());
    ///
    /// let mut cursor = hashmap.cursor();
    /// let first = *cursor.next(&hashmap).unwrap().0;
    /// hashmap.remove(&(3 - first));
    /// assert!(cursor.next(&hashmap).is_none());
    /// ```
    #[inline]
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self)
    }

    /// Returns an iterator over the entries in a random order.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let hashmap: HashMap<u64, u32> = (0..4).map(|i| (i, 0)).collect();
    ///
    /// let mut keys: Vec<u64> = hashmap.iter().map(|(k, _)| *k).collect();
    /// keys.sort_unstable();
    /// assert_eq!(keys, vec![0, 1, 2, 3]);
    /// ```
    #[inline]
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.check_reading();
        Iter::new(&self.directory, self.len)
    }

    /// Returns an iterator over the entries allowing modification of the values.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = (0..4).map(|i| (i, 0)).collect();
    ///
    /// hashmap.iter_mut().for_each(|(k, v)| *v = *k as u32 * 2);
    /// assert_eq!(hashmap.get(&3), Some(&6));
    /// ```
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.check_writing();
        IterMut::new(self.directory.tables_mut(), self.len)
    }

    fn with_directory(directory: Directory<K, V>, build_hasher: H) -> Self {
        Self {
            directory,
            len: 0,
            clear_seq: 0,
            next_id: 0,
            map_id: MAP_ID.fetch_add(1, Relaxed),
            writing: false,
            key_update: false,
            build_hasher,
        }
    }

    #[inline]
    fn check_reading(&self) {
        if self.writing {
            panic!("concurrent map read and map write");
        }
    }

    #[inline]
    fn check_writing(&self) {
        if self.writing {
            panic!("concurrent map writes");
        }
    }

    #[inline]
    fn begin_write(&mut self) {
        self.check_writing();
        self.writing = true;
    }

    #[inline]
    fn end_write(&mut self) {
        if !self.writing {
            panic!("concurrent map writes");
        }
        self.writing = false;
    }

    /// Stores a new entry in a slot reserved by [`reserve`](Self::reserve).
    fn insert_vacant(
        &mut self,
        arena: usize,
        pos: SlotPos,
        hash: u64,
        key: K,
        val: V,
    ) -> &mut V {
        let id = self.next_id;
        self.next_id += 1;
        self.len += 1;
        let slot = Slot { hash, id, key, val };
        &mut self.directory.table_mut(arena).insert_at(pos, slot).val
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        if !self.directory.is_empty() {
            self.directory.check_invariants();
        }
        let len: usize = self.directory.tables().iter().map(Table::len).sum();
        assert_eq!(len, self.len);
    }
}

impl<K, V, H> HashMap<K, V, H>
where
    K: Eq + Hash,
    H: BuildHasher,
{
    /// Gets the entry associated with the given key in the map for in-place manipulation.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<char, u32> = HashMap::default();
    ///
    /// for ch in "a short treatise on fungi".chars() {
    ///     hashmap.entry(ch).and_modify(|counter| *counter += 1).or_insert(1);
    /// }
    ///
    /// assert_eq!(hashmap.get(&'s'), Some(&2));
    /// assert_eq!(hashmap.get(&'t'), Some(&3));
    /// assert!(hashmap.get(&'y').is_none());
    /// ```
    #[inline]
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, H> {
        let hash = self.hash(&key);
        match self.reserve(hash, &key) {
            Reserved::Occupied(arena, pos) => Entry::Occupied(OccupiedEntry {
                hashmap: self,
                arena,
                pos,
            }),
            Reserved::Vacant(arena, pos) => Entry::Vacant(VacantEntry {
                hashmap: self,
                key,
                hash,
                arena,
                pos,
            }),
        }
    }

    /// Inserts a key-value pair into the [`HashMap`].
    ///
    /// # Errors
    ///
    /// Returns an error along with the supplied key-value pair if the key exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// assert!(hashmap.insert(1, 0).is_ok());
    /// assert_eq!(hashmap.insert(1, 1).unwrap_err(), (1, 1));
    /// ```
    #[inline]
    pub fn insert(&mut self, key: K, val: V) -> Result<(), (K, V)> {
        let hash = self.hash(&key);
        match self.reserve(hash, &key) {
            Reserved::Occupied(..) => Err((key, val)),
            Reserved::Vacant(arena, pos) => {
                self.insert_vacant(arena, pos, hash, key, val);
                Ok(())
            }
        }
    }

    /// Upserts a key-value pair into the [`HashMap`].
    ///
    /// Returns the old value if the [`HashMap`] has this key present, or returns `None`. The
    /// stored key is replaced as well if [`with_key_update`](Self::with_key_update) is enabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// assert!(hashmap.upsert(1, 0).is_none());
    /// assert_eq!(hashmap.upsert(1, 1).unwrap(), 0);
    /// assert_eq!(hashmap.get(&1), Some(&1));
    /// ```
    #[inline]
    pub fn upsert(&mut self, key: K, val: V) -> Option<V> {
        let hash = self.hash(&key);
        match self.reserve(hash, &key) {
            Reserved::Occupied(arena, pos) => {
                let key_update = self.key_update;
                let slot = occupied(self.directory.table_mut(arena).slot_mut(pos));
                if key_update {
                    slot.key = key;
                }
                Some(replace(&mut slot.val, val))
            }
            Reserved::Vacant(arena, pos) => {
                self.insert_vacant(arena, pos, hash, key, val);
                None
            }
        }
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// assert!(hashmap.get(&1).is_none());
    /// assert!(hashmap.insert(1, 10).is_ok());
    /// assert_eq!(hashmap.get(&1), Some(&10));
    /// ```
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: Equivalent<K> + Hash + ?Sized,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the key-value pair corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<String, u32> = HashMap::default();
    ///
    /// assert!(hashmap.insert("one".to_string(), 1).is_ok());
    /// assert_eq!(hashmap.get_key_value("one"), Some((&"one".to_string(), &1)));
    /// ```
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        Q: Equivalent<K> + Hash + ?Sized,
    {
        self.check_reading();
        if self.len == 0 {
            return None;
        }
        let hash = self.hash(key);
        let table = self.directory.table_for(hash)?;
        let slot = table.slot(table.find(hash, key)?)?;
        Some((&slot.key, &slot.val))
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// assert!(hashmap.insert(1, 10).is_ok());
    /// if let Some(v) = hashmap.get_mut(&1) {
    ///     *v += 1;
    /// }
    /// assert_eq!(hashmap.get(&1), Some(&11));
    /// ```
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        Q: Equivalent<K> + Hash + ?Sized,
    {
        self.check_writing();
        if self.len == 0 {
            return None;
        }
        let hash = self.hash(key);
        let table = self.directory.table_mut(self.directory.arena_of(hash)?);
        let pos = table.find(hash, key)?;
        table.slot_mut(pos).map(|s| &mut s.val)
    }

    /// Returns `true` if the [`HashMap`] contains a value for the specified key.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// assert!(!hashmap.contains_key(&1));
    /// assert!(hashmap.insert(1, 0).is_ok());
    /// assert!(hashmap.contains_key(&1));
    /// ```
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: Equivalent<K> + Hash + ?Sized,
    {
        self.get_key_value(key).is_some()
    }

    /// Removes a key-value pair if the key exists.
    ///
    /// Returns `None` if the key does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// assert!(hashmap.remove(&1).is_none());
    /// assert!(hashmap.insert(1, 0).is_ok());
    /// assert_eq!(hashmap.remove(&1).unwrap(), (1, 0));
    /// ```
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        Q: Equivalent<K> + Hash + ?Sized,
    {
        self.remove_if(key, |_| true)
    }

    /// Removes a key-value pair if the key exists and the given condition is met.
    ///
    /// Returns `None` if the key does not exist or the condition was not met.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// assert!(hashmap.insert(1, 0).is_ok());
    /// assert!(hashmap.remove_if(&1, |v| { *v += 1; false }).is_none());
    /// assert_eq!(hashmap.remove_if(&1, |v| *v == 1).unwrap(), (1, 1));
    /// ```
    pub fn remove_if<Q, F: FnOnce(&mut V) -> bool>(
        &mut self,
        key: &Q,
        condition: F,
    ) -> Option<(K, V)>
    where
        Q: Equivalent<K> + Hash + ?Sized,
    {
        self.check_writing();
        if self.len == 0 {
            return None;
        }
        let hash = self.hash(key);
        self.begin_write();
        let removed = self.directory.arena_of(hash).and_then(|arena| {
            let table = self.directory.table_mut(arena);
            let pos = table.find(hash, key)?;
            if !condition(&mut occupied(table.slot_mut(pos)).val) {
                return None;
            }
            Some(table.remove_at(pos))
        });
        if removed.is_some() {
            self.len -= 1;
        }
        self.end_write();
        removed.map(|slot| (slot.key, slot.val))
    }

    /// Retains the entries specified by the predicate.
    ///
    /// Removed entries leave tombstones where needed; tables are never rehashed by this method.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = (0..8).map(|i| (i, i as u32)).collect();
    ///
    /// hashmap.retain(|k, v| { *v += 1; k % 2 == 0 });
    /// assert_eq!(hashmap.len(), 4);
    /// assert_eq!(hashmap.get(&2), Some(&3));
    /// assert!(hashmap.get(&3).is_none());
    /// ```
    pub fn retain<F: FnMut(&K, &mut V) -> bool>(&mut self, mut pred: F) {
        self.begin_write();
        let mut guard = RetainGuard {
            hashmap: self,
            removed: 0,
        };
        let RetainGuard { hashmap, removed } = &mut guard;
        for table in hashmap.directory.tables_mut() {
            table.retain(&mut pred, removed);
        }
    }

    /// Finds the slot of the key, rehashing its table until a vacant slot is available.
    fn reserve(&mut self, hash: u64, key: &K) -> Reserved {
        self.begin_write();
        let reserved = loop {
            let arena = self.directory.route(hash);
            match self.directory.table(arena).put_slot(hash, key) {
                PutSlot::Occupied(pos) => break Reserved::Occupied(arena, pos),
                PutSlot::Vacant(pos) => break Reserved::Vacant(arena, pos),
                PutSlot::Full => self.directory.rehash(arena, hash),
            }
        };
        self.end_write();
        reserved
    }

    #[inline]
    fn hash<Q: Hash + ?Sized>(&self, key: &Q) -> u64 {
        mix(self.build_hasher.hash_one(key))
    }
}

impl<K, V> HashMap<K, V, RandomState> {
    /// Creates an empty default [`HashMap`].
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let hashmap: HashMap<u64, u32> = HashMap::new();
    ///
    /// let result = hashmap.capacity();
    /// assert_eq!(result, 0);
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty [`HashMap`] with the specified capacity.
    ///
    /// The actual capacity is equal to or greater than the specified capacity.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let hashmap: HashMap<u64, u32> = HashMap::with_capacity(100);
    ///
    /// let result = hashmap.capacity();
    /// assert_eq!(result, 128);
    /// ```
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<K, V, H> Clone for HashMap<K, V, H>
where
    K: Clone + Eq + Hash,
    V: Clone,
    H: BuildHasher + Clone,
{
    #[inline]
    fn clone(&self) -> Self {
        let mut self_clone = Self::with_capacity_and_hasher(self.len, self.build_hasher.clone())
            .with_key_update(self.key_update);
        for (k, v) in self {
            let _result = self_clone.insert(k.clone(), v.clone());
        }
        self_clone
    }
}

impl<K, V, H> Debug for HashMap<K, V, H>
where
    K: Debug,
    V: Debug,
    H: BuildHasher,
{
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, H> Default for HashMap<K, V, H>
where
    H: BuildHasher + Default,
{
    /// Creates an empty default [`HashMap`].
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// let result = hashmap.capacity();
    /// assert_eq!(result, 0);
    /// ```
    #[inline]
    fn default() -> Self {
        Self::with_hasher(H::default())
    }
}

impl<K, V, H> Extend<(K, V)> for HashMap<K, V, H>
where
    K: Eq + Hash,
    H: BuildHasher,
{
    #[inline]
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        iter.into_iter().for_each(|(k, v)| {
            self.upsert(k, v);
        });
    }
}

impl<K, V, H> FromIterator<(K, V)> for HashMap<K, V, H>
where
    K: Eq + Hash,
    H: BuildHasher + Default,
{
    #[inline]
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let into_iter = iter.into_iter();
        let mut hashmap = Self::with_capacity_and_hasher(into_iter.size_hint().0, H::default());
        hashmap.extend(into_iter);
        hashmap
    }
}

impl<K, V, Q, H> Index<&Q> for HashMap<K, V, H>
where
    K: Eq + Hash,
    Q: Equivalent<K> + Hash + ?Sized,
    H: BuildHasher,
{
    type Output = V;

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the [`HashMap`].
    #[inline]
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(v) => v,
            None => panic!("key not found"),
        }
    }
}

impl<K, V, H> IntoIterator for HashMap<K, V, H>
where
    H: BuildHasher,
{
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.check_writing();
        IntoIter::new(self.directory.into_tables(), self.len)
    }
}

impl<'h, K, V, H> IntoIterator for &'h HashMap<K, V, H>
where
    H: BuildHasher,
{
    type Item = (&'h K, &'h V);
    type IntoIter = Iter<'h, K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'h, K, V, H> IntoIterator for &'h mut HashMap<K, V, H>
where
    H: BuildHasher,
{
    type Item = (&'h K, &'h mut V);
    type IntoIter = IterMut<'h, K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, H> PartialEq for HashMap<K, V, H>
where
    K: Eq + Hash,
    V: PartialEq,
    H: BuildHasher,
{
    /// Compares two [`HashMap`] instances.
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, H> Eq for HashMap<K, V, H>
where
    K: Eq + Hash,
    V: Eq,
    H: BuildHasher,
{
}

impl<'h, K, V, H> Entry<'h, K, V, H>
where
    K: Eq + Hash,
    H: BuildHasher,
{
    /// Ensures a value is in the entry by inserting the supplied instance if empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// hashmap.entry(3).or_insert(7);
    /// assert_eq!(hashmap.get(&3), Some(&7));
    /// ```
    #[inline]
    pub fn or_insert(self, val: V) -> OccupiedEntry<'h, K, V, H> {
        self.or_insert_with(|| val)
    }

    /// Ensures a value is in the entry by inserting the result of the supplied closure if empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// hashmap.entry(19).or_insert_with(|| 5);
    /// assert_eq!(hashmap.get(&19), Some(&5));
    /// ```
    #[inline]
    pub fn or_insert_with<F: FnOnce() -> V>(self, constructor: F) -> OccupiedEntry<'h, K, V, H> {
        self.or_insert_with_key(|_| constructor())
    }

    /// Ensures a value is in the entry by inserting the result of the supplied closure if empty.
    ///
    /// The reference to the moved key is provided, therefore cloning or copying the key is
    /// unnecessary.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// hashmap.entry(11).or_insert_with_key(|k| if *k == 11 { 7 } else { 3 });
    /// assert_eq!(hashmap.get(&11), Some(&7));
    /// ```
    #[inline]
    pub fn or_insert_with_key<F: FnOnce(&K) -> V>(
        self,
        constructor: F,
    ) -> OccupiedEntry<'h, K, V, H> {
        match self {
            Self::Occupied(o) => o,
            Self::Vacant(v) => {
                let val = constructor(v.key());
                v.insert_entry(val)
            }
        }
    }

    /// Returns a reference to the key of this entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    /// assert_eq!(hashmap.entry(31).key(), &31);
    /// ```
    #[inline]
    pub fn key(&self) -> &K {
        match self {
            Self::Occupied(o) => o.key(),
            Self::Vacant(v) => v.key(),
        }
    }

    /// Provides in-place mutable access to an occupied entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// hashmap.entry(37).and_modify(|v| { *v += 1 }).or_insert(47);
    /// assert_eq!(hashmap.get(&37), Some(&47));
    ///
    /// hashmap.entry(37).and_modify(|v| { *v += 1 }).or_insert(3);
    /// assert_eq!(hashmap.get(&37), Some(&48));
    /// ```
    #[inline]
    #[must_use]
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Self::Occupied(mut o) => {
                f(o.get_mut());
                Self::Occupied(o)
            }
            Self::Vacant(v) => Self::Vacant(v),
        }
    }

    /// Sets the value of the entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    /// let entry = hashmap.entry(11).insert_entry(17);
    /// assert_eq!(entry.key(), &11);
    /// ```
    #[inline]
    pub fn insert_entry(self, val: V) -> OccupiedEntry<'h, K, V, H> {
        match self {
            Self::Occupied(mut o) => {
                o.insert(val);
                o
            }
            Self::Vacant(v) => v.insert_entry(val),
        }
    }
}

impl<'h, K, V, H> Entry<'h, K, V, H>
where
    K: Eq + Hash,
    V: Default,
    H: BuildHasher,
{
    /// Ensures a value is in the entry by inserting the default value if empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    /// hashmap.entry(11).or_default();
    /// assert_eq!(hashmap.get(&11), Some(&0));
    /// ```
    #[inline]
    pub fn or_default(self) -> OccupiedEntry<'h, K, V, H> {
        match self {
            Self::Occupied(o) => o,
            Self::Vacant(v) => v.insert_entry(Default::default()),
        }
    }
}

impl<K, V, H> Debug for Entry<'_, K, V, H>
where
    K: Debug,
    V: Debug,
    H: BuildHasher,
{
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vacant(v) => f.debug_tuple("Entry").field(v).finish(),
            Self::Occupied(o) => f.debug_tuple("Entry").field(o).finish(),
        }
    }
}

impl<'h, K, V, H> OccupiedEntry<'h, K, V, H>
where
    H: BuildHasher,
{
    /// Gets a reference to the key in the entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// assert_eq!(hashmap.entry(29).or_default().key(), &29);
    /// ```
    #[inline]
    #[must_use]
    pub fn key(&self) -> &K {
        &self.slot().key
    }

    /// Takes ownership of the key and value from the [`HashMap`].
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    /// use exhash::hash_map::Entry;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// hashmap.entry(11).or_insert(17);
    ///
    /// if let Entry::Occupied(o) = hashmap.entry(11) {
    ///     assert_eq!(o.remove_entry(), (11, 17));
    /// };
    /// assert!(hashmap.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn remove_entry(self) -> (K, V) {
        let slot = self.hashmap.directory.table_mut(self.arena).remove_at(self.pos);
        self.hashmap.len -= 1;
        (slot.key, slot.val)
    }

    /// Gets a reference to the value in the entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    /// use exhash::hash_map::Entry;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// hashmap.entry(19).or_insert(11);
    ///
    /// if let Entry::Occupied(o) = hashmap.entry(19) {
    ///     assert_eq!(o.get(), &11);
    /// };
    /// ```
    #[inline]
    #[must_use]
    pub fn get(&self) -> &V {
        &self.slot().val
    }

    /// Gets a mutable reference to the value in the entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    /// use exhash::hash_map::Entry;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// hashmap.entry(37).or_insert(11);
    ///
    /// if let Entry::Occupied(mut o) = hashmap.entry(37) {
    ///     *o.get_mut() += 18;
    ///     assert_eq!(*o.get(), 29);
    /// }
    ///
    /// assert_eq!(hashmap.get(&37), Some(&29));
    /// ```
    #[inline]
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.slot_mut().val
    }

    /// Converts the entry into a mutable reference to the value bound to the map's lifetime.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// let v = hashmap.entry(5).or_insert(1).into_mut();
    /// *v += 1;
    /// assert_eq!(hashmap.get(&5), Some(&2));
    /// ```
    #[inline]
    #[must_use]
    pub fn into_mut(self) -> &'h mut V {
        let OccupiedEntry {
            hashmap,
            arena,
            pos,
        } = self;
        &mut occupied(hashmap.directory.table_mut(arena).slot_mut(pos)).val
    }

    /// Sets the value of the entry, and returns the old value.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    /// use exhash::hash_map::Entry;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// hashmap.entry(37).or_insert(11);
    ///
    /// if let Entry::Occupied(mut o) = hashmap.entry(37) {
    ///     assert_eq!(o.insert(17), 11);
    /// }
    ///
    /// assert_eq!(hashmap.get(&37), Some(&17));
    /// ```
    #[inline]
    pub fn insert(&mut self, val: V) -> V {
        replace(self.get_mut(), val)
    }

    /// Takes the value out of the entry, and returns it.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    /// use exhash::hash_map::Entry;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// hashmap.entry(11).or_insert(17);
    ///
    /// if let Entry::Occupied(o) = hashmap.entry(11) {
    ///     assert_eq!(o.remove(), 17);
    /// };
    /// ```
    #[inline]
    #[must_use]
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    #[inline]
    fn slot(&self) -> &Slot<K, V> {
        occupied(self.hashmap.directory.table(self.arena).slot(self.pos))
    }

    #[inline]
    fn slot_mut(&mut self) -> &mut Slot<K, V> {
        occupied(self.hashmap.directory.table_mut(self.arena).slot_mut(self.pos))
    }
}

impl<K, V, H> Debug for OccupiedEntry<'_, K, V, H>
where
    K: Debug,
    V: Debug,
    H: BuildHasher,
{
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OccupiedEntry")
            .field("key", self.key())
            .field("value", self.get())
            .finish_non_exhaustive()
    }
}

impl<K, V, H> Deref for OccupiedEntry<'_, K, V, H>
where
    H: BuildHasher,
{
    type Target = V;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.get()
    }
}

impl<K, V, H> DerefMut for OccupiedEntry<'_, K, V, H>
where
    H: BuildHasher,
{
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.get_mut()
    }
}

impl<'h, K, V, H> VacantEntry<'h, K, V, H>
where
    H: BuildHasher,
{
    /// Gets a reference to the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    /// assert_eq!(hashmap.entry(11).key(), &11);
    /// ```
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Takes ownership of the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    /// use exhash::hash_map::Entry;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// if let Entry::Vacant(v) = hashmap.entry(17) {
    ///     assert_eq!(v.into_key(), 17);
    /// };
    /// ```
    #[inline]
    pub fn into_key(self) -> K {
        self.key
    }

    /// Sets the value of the entry with its key, and returns a mutable reference to the value.
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    /// use exhash::hash_map::Entry;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// if let Entry::Vacant(v) = hashmap.entry(19) {
    ///     *v.insert(29) += 1;
    /// };
    /// assert_eq!(hashmap.get(&19), Some(&30));
    /// ```
    #[inline]
    pub fn insert(self, val: V) -> &'h mut V {
        let VacantEntry {
            hashmap,
            key,
            hash,
            arena,
            pos,
        } = self;
        hashmap.insert_vacant(arena, pos, hash, key, val)
    }

    /// Sets the value of the entry with its key, and returns an [`OccupiedEntry`].
    ///
    /// # Examples
    ///
    /// ```
    /// use exhash::HashMap;
    /// use exhash::hash_map::Entry;
    ///
    /// let mut hashmap: HashMap<u64, u32> = HashMap::default();
    ///
    /// if let Entry::Vacant(o) = hashmap.entry(19) {
    ///     o.insert_entry(29);
    /// }
    ///
    /// assert_eq!(hashmap.get(&19), Some(&29));
    /// ```
    #[inline]
    pub fn insert_entry(self, val: V) -> OccupiedEntry<'h, K, V, H> {
        let VacantEntry {
            hashmap,
            key,
            hash,
            arena,
            pos,
        } = self;
        hashmap.insert_vacant(arena, pos, hash, key, val);
        OccupiedEntry {
            hashmap,
            arena,
            pos,
        }
    }
}

impl<K, V, H> Debug for VacantEntry<'_, K, V, H>
where
    K: Debug,
    H: BuildHasher,
{
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VacantEntry").field(self.key()).finish()
    }
}

impl<K, V, H> Drop for RetainGuard<'_, K, V, H>
where
    H: BuildHasher,
{
    #[inline]
    fn drop(&mut self) {
        self.hashmap.len -= self.removed;
        self.hashmap.writing = false;
    }
}

/// Unwraps the slot of an entry known to be present.
#[inline]
fn occupied<T>(slot: Option<T>) -> T {
    match slot {
        Some(slot) => slot,
        None => panic!("entry vanished from its slot"),
    }
}

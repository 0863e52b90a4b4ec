//! [`Serialize`] and [`Deserialize`] for [`HashMap`], as a map of its entries.

use super::HashMap;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;

/// Upper bound on the number of entries reserved from a size hint.
///
/// The hint comes from the input, so an oversized one must not allocate before any entry is read.
const MAX_PREALLOCATED: usize = 4096;

/// Builds a [`HashMap`] from a serialized map, upserting entries in input order so that the last
/// of duplicate keys wins.
struct EntryVisitor<K, V, H>(PhantomData<fn() -> HashMap<K, V, H>>);

impl<'de, K, V, H> Visitor<'de> for EntryVisitor<K, V, H>
where
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de>,
    H: BuildHasher + Default,
{
    type Value = HashMap<K, V, H>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
        let capacity = access.size_hint().map_or(0, |n| n.min(MAX_PREALLOCATED));
        let mut hashmap = HashMap::with_capacity_and_hasher(capacity, H::default());
        while let Some((key, val)) = access.next_entry()? {
            hashmap.upsert(key, val);
        }
        Ok(hashmap)
    }
}

impl<'de, K, V, H> Deserialize<'de> for HashMap<K, V, H>
where
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de>,
    H: BuildHasher + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(EntryVisitor(PhantomData))
    }
}

impl<K, V, H> Serialize for HashMap<K, V, H>
where
    K: Serialize,
    V: Serialize,
    H: BuildHasher,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        self.iter()
            .try_for_each(|(key, val)| map.serialize_entry(key, val))?;
        map.end()
    }
}

//! Keyed object indices and the membership ledger behind them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;
use vigil_core::ObjectId;

use crate::refs::CountedRef;

/// Per-object count of index entries, shared by every [`ObjectIndex`]
/// built from the same ledger.
///
/// The container checks the count at destruction: by then every index
/// must have let go of the object. Cloning yields another handle to the
/// same ledger.
#[derive(Clone, Debug, Default)]
pub struct Memberships {
    counts: Rc<RefCell<HashMap<ObjectId, u32>>>,
}

impl Memberships {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of index entries currently holding `id`.
    pub fn count(&self, id: ObjectId) -> u32 {
        self.counts.borrow().get(&id).copied().unwrap_or(0)
    }

    /// Total entries across every object.
    pub fn total(&self) -> u64 {
        self.counts.borrow().values().map(|&c| u64::from(c)).sum()
    }

    fn enroll(&self, id: ObjectId) {
        *self.counts.borrow_mut().entry(id).or_insert(0) += 1;
    }

    fn withdraw(&self, id: ObjectId) {
        let mut counts = self.counts.borrow_mut();
        match counts.get_mut(&id) {
            Some(c) if *c > 1 => *c -= 1,
            Some(_) => {
                counts.remove(&id);
            }
            None => {
                tracing::error!(%id, "membership withdrawn for an object with none recorded");
            }
        }
    }

    /// Drop whatever is recorded for `id`, returning the old count.
    pub(crate) fn forget(&self, id: ObjectId) -> u32 {
        self.counts.borrow_mut().remove(&id).unwrap_or(0)
    }
}

type Bucket = SmallVec<[CountedRef; 4]>;

/// Objects grouped by key, holding [`CountedRef`]s.
///
/// An object appears at most once per key. Insertion order is kept
/// within each key and across keys. Dropping the index withdraws all of
/// its memberships.
pub struct ObjectIndex<K: Hash + Eq + Copy + Debug> {
    name: &'static str,
    entries: IndexMap<K, Bucket>,
    memberships: Memberships,
}

impl<K: Hash + Eq + Copy + Debug> ObjectIndex<K> {
    /// Create an empty index reporting to `memberships`.
    ///
    /// `name` only appears in log output.
    pub fn new(name: &'static str, memberships: Memberships) -> Self {
        Self {
            name,
            entries: IndexMap::new(),
            memberships,
        }
    }

    /// Index name used in diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Add `member` under `key`. Returns `false` if it was already there.
    pub fn insert(&mut self, key: K, member: CountedRef) -> bool {
        let bucket = self.entries.entry(key).or_default();
        if bucket.iter().any(|m| m.id() == member.id()) {
            return false;
        }
        bucket.push(member);
        self.memberships.enroll(member.id());
        true
    }

    /// Remove `id` from `key`. Returns whether it was present.
    pub fn remove(&mut self, key: K, id: ObjectId) -> bool {
        let Some(bucket) = self.entries.get_mut(&key) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|m| m.id() == id) else {
            return false;
        };
        bucket.remove(pos);
        if bucket.is_empty() {
            self.entries.shift_remove(&key);
        }
        self.memberships.withdraw(id);
        true
    }

    /// Remove `id` from every key. Returns the number of entries removed.
    pub fn scrub(&mut self, id: ObjectId) -> usize {
        let mut removed = 0;
        let memberships = &self.memberships;
        self.entries.retain(|_, bucket| {
            let before = bucket.len();
            bucket.retain(|m| m.id() != id);
            for _ in bucket.len()..before {
                memberships.withdraw(id);
                removed += 1;
            }
            !bucket.is_empty()
        });
        if removed > 0 {
            tracing::trace!(index = self.name, %id, removed, "scrubbed object from index");
        }
        removed
    }

    /// Remove `key` and every member filed under it. Returns their ids.
    pub fn remove_key(&mut self, key: K) -> Vec<ObjectId> {
        let Some(bucket) = self.entries.shift_remove(&key) else {
            return Vec::new();
        };
        bucket
            .iter()
            .map(|m| {
                self.memberships.withdraw(m.id());
                m.id()
            })
            .collect()
    }

    /// Members under `key`, in insertion order.
    pub fn get(&self, key: K) -> &[CountedRef] {
        self.entries.get(&key).map(|b| b.as_slice()).unwrap_or(&[])
    }

    /// Whether `id` is filed under `key`.
    pub fn contains(&self, key: K, id: ObjectId) -> bool {
        self.get(key).iter().any(|m| m.id() == id)
    }

    /// Whether `id` is filed under any key.
    pub fn contains_id(&self, id: ObjectId) -> bool {
        self.entries.values().any(|b| b.iter().any(|m| m.id() == id))
    }

    /// Keys `id` is filed under.
    pub fn keys_of(&self, id: ObjectId) -> Vec<K> {
        self.entries
            .iter()
            .filter(|(_, b)| b.iter().any(|m| m.id() == id))
            .map(|(k, _)| *k)
            .collect()
    }

    /// Keys with at least one member, in first-insertion order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.keys().copied()
    }

    /// Total entries across all keys.
    pub fn len(&self) -> usize {
        self.entries.values().map(|b| b.len()).sum()
    }

    /// Whether the index holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        for bucket in self.entries.values() {
            for member in bucket {
                self.memberships.withdraw(member.id());
            }
        }
        self.entries.clear();
    }
}

impl<K: Hash + Eq + Copy + Debug> Drop for ObjectIndex<K> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K: Hash + Eq + Copy + Debug> Debug for ObjectIndex<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectIndex")
            .field("name", &self.name)
            .field("entries", &self.entries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refs::WeakRef;

    fn member(id: u32) -> CountedRef {
        CountedRef::new(WeakRef::bound(ObjectId(id), 1))
    }

    #[test]
    fn insert_is_unique_per_key() {
        let ledger = Memberships::new();
        let mut index = ObjectIndex::new("squads", ledger.clone());
        assert!(index.insert(1u32, member(5)));
        assert!(!index.insert(1u32, member(5)));
        assert!(index.insert(2u32, member(5)));
        assert_eq!(ledger.count(ObjectId(5)), 2);
        assert_eq!(index.keys_of(ObjectId(5)), vec![1, 2]);
    }

    #[test]
    fn remove_updates_ledger_and_drops_empty_keys() {
        let ledger = Memberships::new();
        let mut index = ObjectIndex::new("squads", ledger.clone());
        index.insert(7u32, member(1));
        assert!(index.remove(7, ObjectId(1)));
        assert!(!index.remove(7, ObjectId(1)));
        assert_eq!(ledger.count(ObjectId(1)), 0);
        assert!(index.is_empty());
    }

    #[test]
    fn scrub_removes_from_every_key() {
        let ledger = Memberships::new();
        let mut index = ObjectIndex::new("teams", ledger.clone());
        for key in 0..3u8 {
            index.insert(key, member(4));
            index.insert(key, member(9));
        }
        assert_eq!(index.scrub(ObjectId(4)), 3);
        assert!(!index.contains_id(ObjectId(4)));
        assert_eq!(index.len(), 3);
        assert_eq!(ledger.count(ObjectId(4)), 0);
        assert_eq!(ledger.count(ObjectId(9)), 3);
    }

    #[test]
    fn remove_key_withdraws_its_members() {
        let ledger = Memberships::new();
        let mut index = ObjectIndex::new("tracks", ledger.clone());
        index.insert(ObjectId(1), member(2));
        index.insert(ObjectId(1), member(3));
        index.insert(ObjectId(4), member(2));
        assert_eq!(index.remove_key(ObjectId(1)), vec![ObjectId(2), ObjectId(3)]);
        assert!(index.remove_key(ObjectId(1)).is_empty());
        assert_eq!(ledger.count(ObjectId(2)), 1);
        assert_eq!(ledger.count(ObjectId(3)), 0);
    }

    #[test]
    fn get_keeps_insertion_order() {
        let mut index = ObjectIndex::new("order", Memberships::new());
        for id in [3, 1, 2] {
            index.insert('a', member(id));
        }
        let ids: Vec<u32> = index.get('a').iter().map(|m| m.id().0).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert!(index.get('b').is_empty());
    }

    #[test]
    fn dropping_index_withdraws_memberships() {
        let ledger = Memberships::new();
        {
            let mut index = ObjectIndex::new("temp", ledger.clone());
            index.insert(0u8, member(1));
            index.insert(1u8, member(2));
            assert_eq!(ledger.total(), 2);
        }
        assert_eq!(ledger.total(), 0);
    }

    #[test]
    fn two_indices_share_a_ledger() {
        let ledger = Memberships::new();
        let mut a = ObjectIndex::new("a", ledger.clone());
        let mut b = ObjectIndex::new("b", ledger.clone());
        a.insert(0u8, member(6));
        b.insert(0u8, member(6));
        assert_eq!(ledger.count(ObjectId(6)), 2);
        a.clear();
        assert_eq!(ledger.count(ObjectId(6)), 1);
    }
}

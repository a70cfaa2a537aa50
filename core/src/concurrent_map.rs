//! Integer-keyed map split into independently locked buckets.
//!
//! Workers touching keys in different buckets never block each other, which
//! lets parallel ranking accumulate per-document relevance without a global
//! lock.

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

/// Integer keys that can be assigned to a bucket.
pub trait ShardKey: Copy + Ord {
    fn shard_hash(self) -> u64;
}

macro_rules! impl_shard_key {
    ($($t:ty),*) => {
        $(impl ShardKey for $t {
            #[inline]
            fn shard_hash(self) -> u64 { self as u64 }
        })*
    };
}

impl_shard_key!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Exclusive access to one value; the bucket stays locked until this is dropped.
pub struct Access<'a, V> {
    guard: MappedMutexGuard<'a, V>,
}

impl<V> Deref for Access<'_, V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.guard
    }
}

impl<V> DerefMut for Access<'_, V> {
    fn deref_mut(&mut self) -> &mut V {
        &mut self.guard
    }
}

pub struct ConcurrentMap<K, V> {
    buckets: Vec<Mutex<BTreeMap<K, V>>>,
}

impl<K: ShardKey, V> ConcurrentMap<K, V> {
    /// Zero buckets is treated as one.
    pub fn new(bucket_count: usize) -> Self {
        let buckets = (0..bucket_count.max(1))
            .map(|_| Mutex::new(BTreeMap::new()))
            .collect();
        Self { buckets }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn bucket(&self, key: K) -> &Mutex<BTreeMap<K, V>> {
        let idx = key.shard_hash() % self.buckets.len() as u64;
        &self.buckets[idx as usize]
    }

    /// Locks the bucket owning `key` and hands out its value, inserting
    /// `V::default()` first when absent.
    pub fn access(&self, key: K) -> Access<'_, V>
    where
        V: Default,
    {
        let guard = MutexGuard::map(self.bucket(key).lock(), |map| map.entry(key).or_default());
        Access { guard }
    }

    pub fn erase(&self, key: K) {
        self.bucket(key).lock().remove(&key);
    }

    /// Merges every bucket into one ordered map, locking buckets one at a time.
    pub fn build_ordinary_map(&self) -> BTreeMap<K, V>
    where
        V: Clone,
    {
        let mut result = BTreeMap::new();
        for bucket in &self.buckets {
            let map = bucket.lock();
            result.extend(map.iter().map(|(k, v)| (*k, v.clone())));
        }
        result
    }

    pub fn into_ordinary_map(self) -> BTreeMap<K, V> {
        self.buckets
            .into_iter()
            .flat_map(|bucket| bucket.into_inner())
            .collect()
    }
}

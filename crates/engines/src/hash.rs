//! Separate-chaining hash table engine.
//!
//! Buckets are plain `Vec<Entry>` chains indexed by a hash masked against
//! a power-of-two bucket count (`hash & (len - 1)` instead of a modulo).
//! Hashing uses `rustc-hash`'s `FxHasher` — the same fast non-cryptographic
//! hasher the teacher's storage crate reaches for over `std`'s
//! SipHash-based default — in place of the original's hand-rolled FNV-1a;
//! either is a "reasonable string hash" per the design doc, and this one
//! avoids hand-rolling what the dependency stack already provides. The
//! table rehashes into double the buckets once the load factor is
//! exceeded, mirroring the original's resize-on-insert policy.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use kvstore_core::Result;

use crate::engine::{validate_key, validate_value, DeleteOutcome, Engine, ModifyOutcome, SetOutcome};
use crate::entry::Entry;

const DEFAULT_BUCKETS: usize = 1024;
const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// Hash-table-backed engine with chaining and power-of-two bucket counts.
#[derive(Debug)]
pub struct HashEngine {
    buckets: Vec<Vec<Entry>>,
    count: usize,
    load_factor: f64,
}

impl Default for HashEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HashEngine {
    /// Create an engine with the default bucket count and load factor.
    pub fn new() -> Self {
        Self::with_config(DEFAULT_BUCKETS, DEFAULT_LOAD_FACTOR)
    }

    /// Create an engine with a specific initial bucket count (must be a
    /// power of two) and resize threshold.
    ///
    /// # Panics
    /// Panics if `initial_buckets` is not a power of two; `Config`
    /// validation is expected to have already rejected this earlier.
    pub fn with_config(initial_buckets: usize, load_factor: f64) -> Self {
        assert!(
            initial_buckets.is_power_of_two(),
            "initial_buckets must be a power of two"
        );
        Self {
            buckets: (0..initial_buckets).map(|_| Vec::new()).collect(),
            count: 0,
            load_factor,
        }
    }

    fn bucket_index(&self, key: &str) -> usize {
        (hash_key(key) as usize) & (self.buckets.len() - 1)
    }

    fn maybe_resize(&mut self) {
        if (self.count as f64) <= self.load_factor * self.buckets.len() as f64 {
            return;
        }
        let new_len = self.buckets.len() * 2;
        let mut new_buckets: Vec<Vec<Entry>> = (0..new_len).map(|_| Vec::new()).collect();
        for bucket in self.buckets.drain(..) {
            for entry in bucket {
                let idx = (hash_key(&entry.key) as usize) & (new_len - 1);
                new_buckets[idx].push(entry);
            }
        }
        self.buckets = new_buckets;
    }
}

fn hash_key(key: &str) -> u64 {
    let mut hasher = FxHasher::default();
    key.hash(&mut hasher);
    hasher.finish()
}

impl Engine for HashEngine {
    fn set(&mut self, key: &str, value: &str) -> Result<SetOutcome> {
        validate_key(key)?;
        validate_value(value)?;
        let idx = self.bucket_index(key);
        if let Some(entry) = self.buckets[idx].iter_mut().find(|e| e.key == key) {
            entry.value = value.to_string();
            return Ok(SetOutcome::Updated);
        }
        self.buckets[idx].push(Entry::new(key, value));
        self.count += 1;
        self.maybe_resize();
        Ok(SetOutcome::Inserted)
    }

    fn get(&self, key: &str) -> Result<Option<&str>> {
        validate_key(key)?;
        let idx = self.bucket_index(key);
        Ok(self.buckets[idx]
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str()))
    }

    fn delete(&mut self, key: &str) -> Result<DeleteOutcome> {
        validate_key(key)?;
        let idx = self.bucket_index(key);
        let bucket = &mut self.buckets[idx];
        match bucket.iter().position(|e| e.key == key) {
            Some(pos) => {
                bucket.swap_remove(pos);
                self.count -= 1;
                Ok(DeleteOutcome::Deleted)
            }
            None => Ok(DeleteOutcome::Absent),
        }
    }

    fn modify(&mut self, key: &str, value: &str) -> Result<ModifyOutcome> {
        validate_key(key)?;
        validate_value(value)?;
        let idx = self.bucket_index(key);
        match self.buckets[idx].iter_mut().find(|e| e.key == key) {
            Some(entry) => {
                entry.value = value.to_string();
                Ok(ModifyOutcome::Modified)
            }
            None => Ok(ModifyOutcome::Absent),
        }
    }

    fn count(&self) -> usize {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let mut engine = HashEngine::new();
        engine.set("a", "1").unwrap();
        assert_eq!(engine.get("a").unwrap(), Some("1"));
    }

    #[test]
    fn resize_preserves_all_entries() {
        let mut engine = HashEngine::with_config(4, 0.75);
        for i in 0..100 {
            engine.set(&format!("key{i}"), &format!("val{i}")).unwrap();
        }
        assert_eq!(engine.count(), 100);
        assert!(engine.buckets.len() > 4);
        for i in 0..100 {
            assert_eq!(engine.get(&format!("key{i}")).unwrap(), Some(format!("val{i}").as_str()));
        }
    }

    #[test]
    fn delete_then_get_returns_none() {
        let mut engine = HashEngine::new();
        engine.set("a", "1").unwrap();
        assert_eq!(engine.delete("a").unwrap(), DeleteOutcome::Deleted);
        assert_eq!(engine.get("a").unwrap(), None);
        assert_eq!(engine.count(), 0);
    }

    #[test]
    fn bucket_count_must_be_power_of_two() {
        let result = std::panic::catch_unwind(|| HashEngine::with_config(1000, 0.75));
        assert!(result.is_err());
    }

    #[test]
    fn modify_existing_key_updates_value() {
        let mut engine = HashEngine::new();
        engine.set("a", "1").unwrap();
        assert_eq!(engine.modify("a", "2").unwrap(), ModifyOutcome::Modified);
        assert_eq!(engine.get("a").unwrap(), Some("2"));
    }
}

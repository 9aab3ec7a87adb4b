//! Linear-scan array engine.
//!
//! The simplest of the five: entries live in a flat `Vec` and every lookup
//! is O(n). Deletion swaps the removed entry with the last one instead of
//! shifting the tail, trading order preservation for O(1) removal — the
//! array engine makes no ordering guarantee, so nothing is lost.

use kvstore_core::Result;

use crate::engine::{validate_key, validate_value, DeleteOutcome, Engine, ModifyOutcome, SetOutcome};
use crate::entry::Entry;

/// Array-backed engine: O(n) set/get/delete/modify, O(1) count.
#[derive(Debug, Default)]
pub struct ArrayEngine {
    entries: Vec<Entry>,
}

impl ArrayEngine {
    /// Create an engine with the default initial capacity.
    pub fn new() -> Self {
        Self::with_capacity(16)
    }

    /// Create an engine with a preallocated capacity hint.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }
}

impl Engine for ArrayEngine {
    fn set(&mut self, key: &str, value: &str) -> Result<SetOutcome> {
        validate_key(key)?;
        validate_value(value)?;
        match self.position(key) {
            Some(idx) => {
                self.entries[idx].value = value.to_string();
                Ok(SetOutcome::Updated)
            }
            None => {
                self.entries.push(Entry::new(key, value));
                Ok(SetOutcome::Inserted)
            }
        }
    }

    fn get(&self, key: &str) -> Result<Option<&str>> {
        validate_key(key)?;
        Ok(self.position(key).map(|idx| self.entries[idx].value.as_str()))
    }

    fn delete(&mut self, key: &str) -> Result<DeleteOutcome> {
        validate_key(key)?;
        match self.position(key) {
            Some(idx) => {
                self.entries.swap_remove(idx);
                Ok(DeleteOutcome::Deleted)
            }
            None => Ok(DeleteOutcome::Absent),
        }
    }

    fn modify(&mut self, key: &str, value: &str) -> Result<ModifyOutcome> {
        validate_key(key)?;
        validate_value(value)?;
        match self.position(key) {
            Some(idx) => {
                self.entries[idx].value = value.to_string();
                Ok(ModifyOutcome::Modified)
            }
            None => Ok(ModifyOutcome::Absent),
        }
    }

    fn count(&self) -> usize {
        self.entries.len()
    }
}

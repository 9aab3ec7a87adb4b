//! Skip list engine.
//!
//! Arena-backed the same way as the red-black tree: nodes live in a
//! `Vec<Node>` addressed by index, with a free-list for reclaimed slots.
//! `forward` links are `Vec<Option<usize>>`, one entry per level the node
//! was drawn at. A header node occupies slot 0 and is never freed.
//!
//! `random_level` reproduces the original's Bernoulli(p = 0.5) climb
//! capped at `MAX_LEVEL`, but draws from an RNG owned by the engine
//! instance and seeded at construction time rather than a process-global
//! `rand()` seeded from the wall clock — the same sequence of inserts
//! then produces the same skip list shape from run to run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use kvstore_core::Result;

use crate::engine::{validate_key, validate_value, DeleteOutcome, Engine, ModifyOutcome, SetOutcome};

const MAX_LEVEL: usize = 16;
const HEADER: usize = 0;

#[derive(Debug)]
struct Node {
    key: String,
    value: String,
    forward: Vec<Option<usize>>,
}

/// Skip-list-backed engine: expected O(log n) set/get/delete/modify,
/// entries kept in key order.
#[derive(Debug)]
pub struct SkipListEngine {
    nodes: Vec<Node>,
    free: Vec<usize>,
    level: usize,
    count: usize,
    rng: StdRng,
}

impl Default for SkipListEngine {
    fn default() -> Self {
        Self::new(0x5EED_5EED_5EED_5EED)
    }
}

impl SkipListEngine {
    /// Create an empty skip list whose level draws come from `seed`.
    pub fn new(seed: u64) -> Self {
        let header = Node {
            key: String::new(),
            value: String::new(),
            forward: vec![None; MAX_LEVEL],
        };
        Self {
            nodes: vec![header],
            free: Vec::new(),
            level: 1,
            count: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Keys in ascending order, read off the bottom (level-0) list.
    /// Exposed for verifying the ordering invariant; not part of `Engine`.
    pub fn in_order_keys(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.count);
        let mut cur = self.nodes[HEADER].forward[0];
        while let Some(idx) = cur {
            out.push(self.nodes[idx].key.as_str());
            cur = self.nodes[idx].forward[0];
        }
        out
    }

    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while self.rng.gen_bool(0.5) && level < MAX_LEVEL {
            level += 1;
        }
        level
    }

    fn alloc(&mut self, key: String, value: String, level: usize) -> usize {
        let node = Node {
            key,
            value,
            forward: vec![None; level],
        };
        if let Some(slot) = self.free.pop() {
            self.nodes[slot] = node;
            slot
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    /// Search, returning the node index holding `key` if present, along
    /// with the per-level predecessor trail (`update`) that insert/delete
    /// need to splice into.
    fn search_with_trail(&self, key: &str) -> ([Option<usize>; MAX_LEVEL], Option<usize>) {
        let mut update = [None; MAX_LEVEL];
        let mut x = HEADER;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].forward[i] {
                if self.nodes[next].key.as_str() < key {
                    x = next;
                } else {
                    break;
                }
            }
            update[i] = Some(x);
        }
        let candidate = self.nodes[x].forward[0];
        let found = candidate.filter(|&idx| self.nodes[idx].key == key);
        (update, found)
    }
}

impl Engine for SkipListEngine {
    fn set(&mut self, key: &str, value: &str) -> Result<SetOutcome> {
        validate_key(key)?;
        validate_value(value)?;
        let (update, found) = self.search_with_trail(key);
        if let Some(idx) = found {
            self.nodes[idx].value = value.to_string();
            return Ok(SetOutcome::Updated);
        }

        let new_level = self.random_level();
        let mut update = update;
        if new_level > self.level {
            for slot in update.iter_mut().take(new_level).skip(self.level) {
                *slot = Some(HEADER);
            }
            self.level = new_level;
        }

        let new_idx = self.alloc(key.to_string(), value.to_string(), new_level);
        for i in 0..new_level {
            let pred = update[i].expect("predecessor trail covers every level up to new_level");
            self.nodes[new_idx].forward[i] = self.nodes[pred].forward[i];
            self.nodes[pred].forward[i] = Some(new_idx);
        }
        self.count += 1;
        Ok(SetOutcome::Inserted)
    }

    fn get(&self, key: &str) -> Result<Option<&str>> {
        validate_key(key)?;
        let (_, found) = self.search_with_trail(key);
        Ok(found.map(|idx| self.nodes[idx].value.as_str()))
    }

    fn delete(&mut self, key: &str) -> Result<DeleteOutcome> {
        validate_key(key)?;
        let (update, found) = self.search_with_trail(key);
        let Some(target) = found else {
            return Ok(DeleteOutcome::Absent);
        };

        for i in 0..self.level {
            let Some(pred) = update[i] else { break };
            if self.nodes[pred].forward[i] != Some(target) {
                break;
            }
            self.nodes[pred].forward[i] = self.nodes[target].forward[i];
        }

        while self.level > 1 && self.nodes[HEADER].forward[self.level - 1].is_none() {
            self.level -= 1;
        }

        self.free.push(target);
        self.count -= 1;
        Ok(DeleteOutcome::Deleted)
    }

    fn modify(&mut self, key: &str, value: &str) -> Result<ModifyOutcome> {
        validate_key(key)?;
        validate_value(value)?;
        let (_, found) = self.search_with_trail(key);
        match found {
            Some(idx) => {
                self.nodes[idx].value = value.to_string();
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
    use rand::seq::SliceRandom;

    #[test]
    fn set_then_get_round_trips() {
        let mut engine = SkipListEngine::new(1);
        engine.set("a", "1").unwrap();
        assert_eq!(engine.get("a").unwrap(), Some("1"));
    }

    #[test]
    fn in_order_traversal_is_sorted() {
        let mut engine = SkipListEngine::new(7);
        for key in ["m", "a", "z", "c", "x", "b"] {
            engine.set(key, "v").unwrap();
        }
        let keys = engine.in_order_keys();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn same_seed_yields_same_shape() {
        let mut a = SkipListEngine::new(99);
        let mut b = SkipListEngine::new(99);
        for i in 0..200 {
            let key = format!("k{i:04}");
            a.set(&key, "v").unwrap();
            b.set(&key, "v").unwrap();
        }
        assert_eq!(a.in_order_keys(), b.in_order_keys());
        assert_eq!(a.level, b.level);
    }

    #[test]
    fn delete_absent_key_is_noop() {
        let mut engine = SkipListEngine::new(3);
        engine.set("a", "1").unwrap();
        assert_eq!(engine.delete("missing").unwrap(), DeleteOutcome::Absent);
    }

    #[test]
    fn stress_random_insert_delete_preserves_order_and_count() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut engine = SkipListEngine::new(55);
        let mut live: Vec<String> = Vec::new();

        for i in 0..2000 {
            let key = format!("k{i:05}");
            engine.set(&key, "v").unwrap();
            live.push(key);
        }
        live.shuffle(&mut rng);

        for key in live.drain(..1000) {
            assert_eq!(engine.delete(&key).unwrap(), DeleteOutcome::Deleted);
        }

        assert_eq!(engine.count(), 1000);
        let keys = engine.in_order_keys();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn set_on_existing_key_updates_without_duplicating() {
        let mut engine = SkipListEngine::new(2);
        engine.set("a", "1").unwrap();
        assert_eq!(engine.set("a", "2").unwrap(), SetOutcome::Updated);
        assert_eq!(engine.count(), 1);
        assert_eq!(engine.get("a").unwrap(), Some("2"));
    }
}

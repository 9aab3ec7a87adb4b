//! B-tree engine, minimum degree t = 3 (2..=5 keys per node, 3..=6 children).
//!
//! The original implementation preallocates fixed-size `keys`/`values`/
//! `children` arrays sized to the maximum a node can ever hold and tracks
//! occupancy with a separate `n` counter. Rust's `Vec` already tracks its
//! own length, so each node holds `Vec<String>`/`Vec<usize>` directly and
//! grows/shrinks through ordinary `insert`/`remove`/`push`/`pop` instead of
//! manual index shuffling. Nodes live in an arena (`Vec<Node>`, `Option`-free
//! since the tree always has a root) with a free-list for slots freed by
//! merges and root collapses.

use kvstore_core::Result;

use crate::engine::{validate_key, validate_value, DeleteOutcome, Engine, ModifyOutcome, SetOutcome};

const DEGREE: usize = 3;
const MAX_KEYS: usize = 2 * DEGREE - 1;

#[derive(Debug)]
struct Node {
    leaf: bool,
    keys: Vec<String>,
    values: Vec<String>,
    children: Vec<usize>,
}

impl Node {
    fn new(leaf: bool) -> Self {
        Self {
            leaf,
            keys: Vec::new(),
            values: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// B-tree-backed engine: O(log n) set/get/delete/modify, entries kept in
/// key order across a shallow, wide tree.
#[derive(Debug)]
pub struct BTreeEngine {
    nodes: Vec<Node>,
    free: Vec<usize>,
    root: usize,
    count: usize,
}

impl Default for BTreeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BTreeEngine {
    /// Create an empty tree (a single empty leaf root).
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(true)],
            free: Vec::new(),
            root: 0,
            count: 0,
        }
    }

    /// Keys in ascending order, via an in-order traversal. Exposed for
    /// verifying the ordering invariant; not part of the `Engine` contract.
    pub fn in_order_keys(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.count);
        self.in_order(self.root, &mut out);
        out
    }

    fn in_order<'a>(&'a self, idx: usize, out: &mut Vec<&'a str>) {
        let node = &self.nodes[idx];
        if node.leaf {
            out.extend(node.keys.iter().map(String::as_str));
            return;
        }
        for (i, key) in node.keys.iter().enumerate() {
            self.in_order(node.children[i], out);
            out.push(key.as_str());
        }
        self.in_order(*node.children.last().expect("internal node has n+1 children"), out);
    }

    fn alloc_node(&mut self, leaf: bool) -> usize {
        if let Some(slot) = self.free.pop() {
            self.nodes[slot] = Node::new(leaf);
            slot
        } else {
            self.nodes.push(Node::new(leaf));
            self.nodes.len() - 1
        }
    }

    fn find_slot(&self, key: &str) -> Option<(usize, usize)> {
        let mut x = self.root;
        loop {
            let i = self.nodes[x].keys.partition_point(|k| k.as_str() < key);
            if i < self.nodes[x].keys.len() && self.nodes[x].keys[i] == key {
                return Some((x, i));
            }
            if self.nodes[x].leaf {
                return None;
            }
            x = self.nodes[x].children[i];
        }
    }

    /// Split the full child `x.children[i]` around its middle key, which
    /// moves up into `x`.
    fn split_child(&mut self, x: usize, i: usize) {
        let y = self.nodes[x].children[i];
        let y_leaf = self.nodes[y].leaf;

        let mid_key = self.nodes[y].keys.remove(DEGREE - 1);
        let mid_val = self.nodes[y].values.remove(DEGREE - 1);
        let z_keys = self.nodes[y].keys.split_off(DEGREE - 1);
        let z_values = self.nodes[y].values.split_off(DEGREE - 1);
        let z_children = if y_leaf {
            Vec::new()
        } else {
            self.nodes[y].children.split_off(DEGREE)
        };

        let z = self.alloc_node(y_leaf);
        self.nodes[z].keys = z_keys;
        self.nodes[z].values = z_values;
        self.nodes[z].children = z_children;

        self.nodes[x].children.insert(i + 1, z);
        self.nodes[x].keys.insert(i, mid_key);
        self.nodes[x].values.insert(i, mid_val);
    }

    fn insert_nonfull(&mut self, x: usize, key: String, value: String) {
        if self.nodes[x].leaf {
            let pos = self.nodes[x].keys.partition_point(|k| k.as_str() < key.as_str());
            self.nodes[x].keys.insert(pos, key);
            self.nodes[x].values.insert(pos, value);
            return;
        }

        let mut i = self.nodes[x].keys.partition_point(|k| k.as_str() < key.as_str());
        if self.nodes[self.nodes[x].children[i]].keys.len() == MAX_KEYS {
            self.split_child(x, i);
            if key.as_str() > self.nodes[x].keys[i].as_str() {
                i += 1;
            }
        }
        let child = self.nodes[x].children[i];
        self.insert_nonfull(child, key, value);
    }

    fn insert(&mut self, key: String, value: String) -> SetOutcome {
        if let Some((node, pos)) = self.find_slot(&key) {
            self.nodes[node].values[pos] = value;
            return SetOutcome::Updated;
        }

        if self.nodes[self.root].keys.len() == MAX_KEYS {
            let old_root = self.root;
            let new_root = self.alloc_node(false);
            self.nodes[new_root].children.push(old_root);
            self.split_child(new_root, 0);
            self.root = new_root;
        }
        self.insert_nonfull(self.root, key, value);
        SetOutcome::Inserted
    }

    fn subtree_max(&self, mut idx: usize) -> (String, String) {
        while !self.nodes[idx].leaf {
            idx = *self.nodes[idx].children.last().expect("internal node has children");
        }
        (
            self.nodes[idx].keys.last().expect("leaf has at least DEGREE-1 keys").clone(),
            self.nodes[idx].values.last().unwrap().clone(),
        )
    }

    fn subtree_min(&self, mut idx: usize) -> (String, String) {
        while !self.nodes[idx].leaf {
            idx = self.nodes[idx].children[0];
        }
        (self.nodes[idx].keys[0].clone(), self.nodes[idx].values[0].clone())
    }

    fn borrow_from_prev(&mut self, x: usize, i: usize) {
        let child = self.nodes[x].children[i];
        let sibling = self.nodes[x].children[i - 1];

        let sib_key = self.nodes[sibling].keys.pop().expect("sibling has a spare key");
        let sib_val = self.nodes[sibling].values.pop().unwrap();

        let parent_key = std::mem::replace(&mut self.nodes[x].keys[i - 1], sib_key);
        let parent_val = std::mem::replace(&mut self.nodes[x].values[i - 1], sib_val);

        self.nodes[child].keys.insert(0, parent_key);
        self.nodes[child].values.insert(0, parent_val);

        if !self.nodes[child].leaf {
            let moved_child = self.nodes[sibling].children.pop().expect("internal sibling has children");
            self.nodes[child].children.insert(0, moved_child);
        }
    }

    fn borrow_from_next(&mut self, x: usize, i: usize) {
        let child = self.nodes[x].children[i];
        let sibling = self.nodes[x].children[i + 1];

        let sib_key = self.nodes[sibling].keys.remove(0);
        let sib_val = self.nodes[sibling].values.remove(0);

        let parent_key = std::mem::replace(&mut self.nodes[x].keys[i], sib_key);
        let parent_val = std::mem::replace(&mut self.nodes[x].values[i], sib_val);

        self.nodes[child].keys.push(parent_key);
        self.nodes[child].values.push(parent_val);

        if !self.nodes[child].leaf {
            let moved_child = self.nodes[sibling].children.remove(0);
            self.nodes[child].children.push(moved_child);
        }
    }

    /// Merge `x.children[i]` and `x.children[i + 1]` into a single node,
    /// pulling `x.keys[i]` down between them. The sibling's arena slot is
    /// freed afterward.
    fn merge_children(&mut self, x: usize, i: usize) {
        let child = self.nodes[x].children[i];
        let sibling = self.nodes[x].children.remove(i + 1);

        let parent_key = self.nodes[x].keys.remove(i);
        let parent_val = self.nodes[x].values.remove(i);

        self.nodes[child].keys.push(parent_key);
        self.nodes[child].values.push(parent_val);

        let mut sib_keys = std::mem::take(&mut self.nodes[sibling].keys);
        let mut sib_values = std::mem::take(&mut self.nodes[sibling].values);
        let mut sib_children = std::mem::take(&mut self.nodes[sibling].children);

        self.nodes[child].keys.append(&mut sib_keys);
        self.nodes[child].values.append(&mut sib_values);
        self.nodes[child].children.append(&mut sib_children);

        self.free.push(sibling);
    }

    fn fill(&mut self, x: usize, i: usize) {
        let n = self.nodes[x].keys.len();
        if i != 0 && self.nodes[self.nodes[x].children[i - 1]].keys.len() >= DEGREE {
            self.borrow_from_prev(x, i);
        } else if i != n && self.nodes[self.nodes[x].children[i + 1]].keys.len() >= DEGREE {
            self.borrow_from_next(x, i);
        } else if i != n {
            self.merge_children(x, i);
        } else {
            self.merge_children(x, i - 1);
        }
    }

    fn delete_key(&mut self, x: usize, key: &str) {
        let i = self.nodes[x].keys.partition_point(|k| k.as_str() < key);
        let found_here = i < self.nodes[x].keys.len() && self.nodes[x].keys[i] == key;

        if found_here {
            if self.nodes[x].leaf {
                self.nodes[x].keys.remove(i);
                self.nodes[x].values.remove(i);
                return;
            }

            let left = self.nodes[x].children[i];
            let right = self.nodes[x].children[i + 1];

            if self.nodes[left].keys.len() >= DEGREE {
                let (pred_key, pred_val) = self.subtree_max(left);
                self.nodes[x].keys[i] = pred_key.clone();
                self.nodes[x].values[i] = pred_val;
                self.delete_key(left, &pred_key);
            } else if self.nodes[right].keys.len() >= DEGREE {
                let (succ_key, succ_val) = self.subtree_min(right);
                self.nodes[x].keys[i] = succ_key.clone();
                self.nodes[x].values[i] = succ_val;
                self.delete_key(right, &succ_key);
            } else {
                self.merge_children(x, i);
                self.delete_key(left, key);
            }
            return;
        }

        if self.nodes[x].leaf {
            return;
        }

        let n = self.nodes[x].keys.len();
        let at_end = i == n;
        let child = self.nodes[x].children[i];
        if self.nodes[child].keys.len() < DEGREE {
            self.fill(x, i);
        }
        let descend_into = if at_end && i > self.nodes[x].keys.len() {
            i - 1
        } else {
            i
        };
        let next_child = self.nodes[x].children[descend_into];
        self.delete_key(next_child, key);
    }

    fn remove(&mut self, key: &str) -> bool {
        if self.find_slot(key).is_none() {
            return false;
        }
        self.delete_key(self.root, key);
        if self.nodes[self.root].keys.is_empty() && !self.nodes[self.root].leaf {
            let old_root = self.root;
            self.root = self.nodes[old_root].children[0];
            self.free.push(old_root);
        }
        true
    }
}

impl Engine for BTreeEngine {
    fn set(&mut self, key: &str, value: &str) -> Result<SetOutcome> {
        validate_key(key)?;
        validate_value(value)?;
        let outcome = self.insert(key.to_string(), value.to_string());
        if outcome == SetOutcome::Inserted {
            self.count += 1;
        }
        Ok(outcome)
    }

    fn get(&self, key: &str) -> Result<Option<&str>> {
        validate_key(key)?;
        Ok(self.find_slot(key).map(|(node, pos)| self.nodes[node].values[pos].as_str()))
    }

    fn delete(&mut self, key: &str) -> Result<DeleteOutcome> {
        validate_key(key)?;
        if self.remove(key) {
            self.count -= 1;
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::Absent)
        }
    }

    fn modify(&mut self, key: &str, value: &str) -> Result<ModifyOutcome> {
        validate_key(key)?;
        validate_value(value)?;
        match self.find_slot(key) {
            Some((node, pos)) => {
                self.nodes[node].values[pos] = value.to_string();
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
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    #[test]
    fn set_then_get_round_trips() {
        let mut engine = BTreeEngine::new();
        engine.set("a", "1").unwrap();
        assert_eq!(engine.get("a").unwrap(), Some("1"));
    }

    #[test]
    fn in_order_traversal_is_sorted_after_many_splits() {
        let mut engine = BTreeEngine::new();
        for i in 0..500 {
            engine.set(&format!("k{i:04}"), "v").unwrap();
        }
        let keys = engine.in_order_keys();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
        assert_eq!(engine.count(), 500);
    }

    #[test]
    fn delete_triggers_predecessor_swap_and_merge() {
        let mut engine = BTreeEngine::new();
        for i in 0..50 {
            engine.set(&format!("k{i:02}"), "v").unwrap();
        }
        for i in 0..50 {
            assert_eq!(engine.delete(&format!("k{i:02}")).unwrap(), DeleteOutcome::Deleted);
        }
        assert_eq!(engine.count(), 0);
        assert!(engine.in_order_keys().is_empty());
        assert!(engine.nodes[engine.root].leaf);
    }

    #[test]
    fn delete_absent_key_is_noop() {
        let mut engine = BTreeEngine::new();
        engine.set("a", "1").unwrap();
        assert_eq!(engine.delete("missing").unwrap(), DeleteOutcome::Absent);
        assert_eq!(engine.count(), 1);
    }

    #[test]
    fn stress_random_insert_delete_preserves_order_and_count() {
        let mut rng = StdRng::seed_from_u64(123);
        let mut engine = BTreeEngine::new();
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

        for key in &live {
            assert!(engine.get(key).unwrap().is_some());
        }
    }

    #[test]
    fn set_on_existing_key_updates_without_duplicating() {
        let mut engine = BTreeEngine::new();
        engine.set("a", "1").unwrap();
        assert_eq!(engine.set("a", "2").unwrap(), SetOutcome::Updated);
        assert_eq!(engine.count(), 1);
        assert_eq!(engine.get("a").unwrap(), Some("2"));
    }
}

//! Red-black tree engine.
//!
//! The original implementation links nodes with raw pointers and a shared
//! sentinel `nil` node. Rust renders that as an arena: nodes live in a
//! `Vec<Node>`, child/parent links are `Option<usize>` indices into it, and
//! a freed slot's index is pushed onto a free-list for reuse instead of
//! being deallocated, so indices stay stable across inserts and deletes.
//! A missing link (`None`) plays the sentinel's role; its color reads as
//! black by convention (see `color_of`) without a real node backing it.
//!
//! Insertion and deletion follow the classical CLRS fixup algorithms.

use std::cmp::Ordering;

use kvstore_core::Result;

use crate::engine::{validate_key, validate_value, DeleteOutcome, Engine, ModifyOutcome, SetOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Debug)]
struct Node {
    key: String,
    value: String,
    color: Color,
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
}

/// Red-black-tree-backed engine: O(log n) set/get/delete/modify, entries
/// kept in key order.
#[derive(Debug, Default)]
pub struct RbTreeEngine {
    nodes: Vec<Node>,
    free: Vec<usize>,
    root: Option<usize>,
    count: usize,
}

impl RbTreeEngine {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys in ascending order, via an in-order traversal. Exposed for
    /// verifying the ordering invariant; not part of the `Engine` contract.
    pub fn in_order_keys(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.count);
        self.in_order(self.root, &mut out);
        out
    }

    fn in_order<'a>(&'a self, node: Option<usize>, out: &mut Vec<&'a str>) {
        if let Some(idx) = node {
            self.in_order(self.nodes[idx].left, out);
            out.push(self.nodes[idx].key.as_str());
            self.in_order(self.nodes[idx].right, out);
        }
    }

    fn find(&self, key: &str) -> Option<usize> {
        let mut cur = self.root;
        while let Some(idx) = cur {
            match key.cmp(self.nodes[idx].key.as_str()) {
                Ordering::Equal => return Some(idx),
                Ordering::Less => cur = self.nodes[idx].left,
                Ordering::Greater => cur = self.nodes[idx].right,
            }
        }
        None
    }

    fn color_of(&self, node: Option<usize>) -> Color {
        match node {
            Some(idx) => self.nodes[idx].color,
            None => Color::Black,
        }
    }

    fn set_color(&mut self, node: Option<usize>, color: Color) {
        if let Some(idx) = node {
            self.nodes[idx].color = color;
        }
    }

    fn alloc(&mut self, key: String, value: String, color: Color, parent: Option<usize>) -> usize {
        let node = Node {
            key,
            value,
            color,
            parent,
            left: None,
            right: None,
        };
        if let Some(slot) = self.free.pop() {
            self.nodes[slot] = node;
            slot
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    fn free_slot(&mut self, idx: usize) {
        self.free.push(idx);
    }

    fn minimum(&self, mut idx: usize) -> usize {
        while let Some(left) = self.nodes[idx].left {
            idx = left;
        }
        idx
    }

    fn rotate_left(&mut self, x: usize) {
        let y = self.nodes[x].right.expect("rotate_left requires a right child");
        self.nodes[x].right = self.nodes[y].left;
        if let Some(yl) = self.nodes[y].left {
            self.nodes[yl].parent = Some(x);
        }
        self.nodes[y].parent = self.nodes[x].parent;
        match self.nodes[x].parent {
            None => self.root = Some(y),
            Some(p) if self.nodes[p].left == Some(x) => self.nodes[p].left = Some(y),
            Some(p) => self.nodes[p].right = Some(y),
        }
        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);
    }

    fn rotate_right(&mut self, x: usize) {
        let y = self.nodes[x].left.expect("rotate_right requires a left child");
        self.nodes[x].left = self.nodes[y].right;
        if let Some(yr) = self.nodes[y].right {
            self.nodes[yr].parent = Some(x);
        }
        self.nodes[y].parent = self.nodes[x].parent;
        match self.nodes[x].parent {
            None => self.root = Some(y),
            Some(p) if self.nodes[p].left == Some(x) => self.nodes[p].left = Some(y),
            Some(p) => self.nodes[p].right = Some(y),
        }
        self.nodes[y].right = Some(x);
        self.nodes[x].parent = Some(y);
    }

    fn insert(&mut self, key: String, value: String) -> SetOutcome {
        let mut parent = None;
        let mut cur = self.root;
        let mut insert_left = false;
        while let Some(idx) = cur {
            parent = Some(idx);
            match key.as_str().cmp(self.nodes[idx].key.as_str()) {
                Ordering::Equal => {
                    self.nodes[idx].value = value;
                    return SetOutcome::Updated;
                }
                Ordering::Less => {
                    insert_left = true;
                    cur = self.nodes[idx].left;
                }
                Ordering::Greater => {
                    insert_left = false;
                    cur = self.nodes[idx].right;
                }
            }
        }
        let new_idx = self.alloc(key, value, Color::Red, parent);
        match parent {
            None => self.root = Some(new_idx),
            Some(p) if insert_left => self.nodes[p].left = Some(new_idx),
            Some(p) => self.nodes[p].right = Some(new_idx),
        }
        self.count += 1;
        self.fix_after_insertion(new_idx);
        SetOutcome::Inserted
    }

    fn fix_after_insertion(&mut self, mut z: usize) {
        while self.color_of(self.nodes[z].parent) == Color::Red {
            let p = self.nodes[z].parent.expect("red node has a parent");
            let gp = self.nodes[p]
                .parent
                .expect("a red node's parent cannot be the root, so it has a parent");
            if Some(p) == self.nodes[gp].left {
                let uncle = self.nodes[gp].right;
                if self.color_of(uncle) == Color::Red {
                    self.set_color(Some(p), Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(Some(gp), Color::Red);
                    z = gp;
                } else {
                    if Some(z) == self.nodes[p].right {
                        z = p;
                        self.rotate_left(z);
                    }
                    let p = self.nodes[z].parent.expect("z has a parent after rotation");
                    let gp = self.nodes[p].parent.expect("p has a parent");
                    self.set_color(Some(p), Color::Black);
                    self.set_color(Some(gp), Color::Red);
                    self.rotate_right(gp);
                }
            } else {
                let uncle = self.nodes[gp].left;
                if self.color_of(uncle) == Color::Red {
                    self.set_color(Some(p), Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(Some(gp), Color::Red);
                    z = gp;
                } else {
                    if Some(z) == self.nodes[p].left {
                        z = p;
                        self.rotate_right(z);
                    }
                    let p = self.nodes[z].parent.expect("z has a parent after rotation");
                    let gp = self.nodes[p].parent.expect("p has a parent");
                    self.set_color(Some(p), Color::Black);
                    self.set_color(Some(gp), Color::Red);
                    self.rotate_left(gp);
                }
            }
        }
        if let Some(root) = self.root {
            self.set_color(Some(root), Color::Black);
        }
    }

    fn transplant(&mut self, u: usize, v: Option<usize>) {
        let parent = self.nodes[u].parent;
        match parent {
            None => self.root = v,
            Some(p) if self.nodes[p].left == Some(u) => self.nodes[p].left = v,
            Some(p) => self.nodes[p].right = v,
        }
        if let Some(v) = v {
            self.nodes[v].parent = parent;
        }
    }

    fn delete_node(&mut self, z: usize) {
        let z_left = self.nodes[z].left;
        let z_right = self.nodes[z].right;
        let mut y_original_color = self.nodes[z].color;
        let x: Option<usize>;
        let x_parent: Option<usize>;

        if z_left.is_none() {
            x = z_right;
            x_parent = self.nodes[z].parent;
            self.transplant(z, z_right);
        } else if z_right.is_none() {
            x = z_left;
            x_parent = self.nodes[z].parent;
            self.transplant(z, z_left);
        } else {
            let y = self.minimum(z_right.unwrap());
            y_original_color = self.nodes[y].color;
            x = self.nodes[y].right;
            if self.nodes[y].parent == Some(z) {
                x_parent = Some(y);
            } else {
                x_parent = self.nodes[y].parent;
                let y_right = self.nodes[y].right;
                self.transplant(y, y_right);
                self.nodes[y].right = z_right;
                if let Some(r) = self.nodes[y].right {
                    self.nodes[r].parent = Some(y);
                }
            }
            self.transplant(z, Some(y));
            self.nodes[y].left = z_left;
            if let Some(l) = self.nodes[y].left {
                self.nodes[l].parent = Some(y);
            }
            self.nodes[y].color = self.nodes[z].color;
        }

        self.free_slot(z);

        if y_original_color == Color::Black {
            self.fix_after_deletion(x, x_parent);
        }
    }

    fn fix_after_deletion(&mut self, mut x: Option<usize>, mut xp: Option<usize>) {
        while x != self.root && self.color_of(x) == Color::Black {
            let p = xp.expect("a non-root node always has a parent");
            if x == self.nodes[p].left {
                let mut w = self.nodes[p].right;
                if self.color_of(w) == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(Some(p), Color::Red);
                    self.rotate_left(p);
                    w = self.nodes[p].right;
                }
                let w_idx = w.expect("black-height deficiency implies a real sibling");
                if self.color_of(self.nodes[w_idx].left) == Color::Black
                    && self.color_of(self.nodes[w_idx].right) == Color::Black
                {
                    self.set_color(w, Color::Red);
                    x = Some(p);
                    xp = self.nodes[p].parent;
                } else {
                    if self.color_of(self.nodes[w_idx].right) == Color::Black {
                        self.set_color(self.nodes[w_idx].left, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_right(w_idx);
                        w = self.nodes[p].right;
                    }
                    let w_idx = w.unwrap();
                    self.nodes[w_idx].color = self.nodes[p].color;
                    self.set_color(Some(p), Color::Black);
                    self.set_color(self.nodes[w_idx].right, Color::Black);
                    self.rotate_left(p);
                    x = self.root;
                    xp = None;
                }
            } else {
                let mut w = self.nodes[p].left;
                if self.color_of(w) == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(Some(p), Color::Red);
                    self.rotate_right(p);
                    w = self.nodes[p].left;
                }
                let w_idx = w.expect("black-height deficiency implies a real sibling");
                if self.color_of(self.nodes[w_idx].right) == Color::Black
                    && self.color_of(self.nodes[w_idx].left) == Color::Black
                {
                    self.set_color(w, Color::Red);
                    x = Some(p);
                    xp = self.nodes[p].parent;
                } else {
                    if self.color_of(self.nodes[w_idx].left) == Color::Black {
                        self.set_color(self.nodes[w_idx].right, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_left(w_idx);
                        w = self.nodes[p].left;
                    }
                    let w_idx = w.unwrap();
                    self.nodes[w_idx].color = self.nodes[p].color;
                    self.set_color(Some(p), Color::Black);
                    self.set_color(self.nodes[w_idx].left, Color::Black);
                    self.rotate_right(p);
                    x = self.root;
                    xp = None;
                }
            }
        }
        if let Some(idx) = x {
            self.set_color(Some(idx), Color::Black);
        }
    }
}

impl Engine for RbTreeEngine {
    fn set(&mut self, key: &str, value: &str) -> Result<SetOutcome> {
        validate_key(key)?;
        validate_value(value)?;
        Ok(self.insert(key.to_string(), value.to_string()))
    }

    fn get(&self, key: &str) -> Result<Option<&str>> {
        validate_key(key)?;
        Ok(self.find(key).map(|idx| self.nodes[idx].value.as_str()))
    }

    fn delete(&mut self, key: &str) -> Result<DeleteOutcome> {
        validate_key(key)?;
        match self.find(key) {
            Some(idx) => {
                self.delete_node(idx);
                self.count -= 1;
                Ok(DeleteOutcome::Deleted)
            }
            None => Ok(DeleteOutcome::Absent),
        }
    }

    fn modify(&mut self, key: &str, value: &str) -> Result<ModifyOutcome> {
        validate_key(key)?;
        validate_value(value)?;
        match self.find(key) {
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
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    #[test]
    fn set_then_get_round_trips() {
        let mut engine = RbTreeEngine::new();
        engine.set("b", "2").unwrap();
        assert_eq!(engine.get("b").unwrap(), Some("2"));
    }

    #[test]
    fn in_order_traversal_is_sorted() {
        let mut engine = RbTreeEngine::new();
        for key in ["m", "a", "z", "c", "x", "b"] {
            engine.set(key, "v").unwrap();
        }
        let keys = engine.in_order_keys();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn delete_leaf_and_internal_nodes() {
        let mut engine = RbTreeEngine::new();
        for key in ["d", "b", "f", "a", "c", "e", "g"] {
            engine.set(key, "v").unwrap();
        }
        assert_eq!(engine.delete("a").unwrap(), DeleteOutcome::Deleted); // leaf
        assert_eq!(engine.delete("d").unwrap(), DeleteOutcome::Deleted); // root, two children
        assert_eq!(engine.count(), 5);
        let keys = engine.in_order_keys();
        assert_eq!(keys, vec!["b", "c", "e", "f", "g"]);
    }

    #[test]
    fn delete_absent_key_is_noop() {
        let mut engine = RbTreeEngine::new();
        engine.set("a", "1").unwrap();
        assert_eq!(engine.delete("z").unwrap(), DeleteOutcome::Absent);
        assert_eq!(engine.count(), 1);
    }

    #[test]
    fn stress_random_insert_delete_preserves_order_and_count() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut engine = RbTreeEngine::new();
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
    fn empty_key_rejected() {
        let mut engine = RbTreeEngine::new();
        assert!(engine.set("", "1").is_err());
    }
}

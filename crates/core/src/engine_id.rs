//! The five compiled-in engine identities and their wire prefixes

use std::fmt;

/// Identifies one of the five interchangeable indexing engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EngineId {
    /// Unsorted dynamic array, linear scan
    Array,
    /// Self-balancing red-black tree
    RbTree,
    /// Separate-chaining hash table
    Hash,
    /// Probabilistic skip list
    SkipList,
    /// Minimum-degree-3 B-tree
    BTree,
}

impl EngineId {
    /// All five engine identities, in their fixed lifecycle order (§4.9)
    pub const ALL: [EngineId; 5] = [
        EngineId::Array,
        EngineId::RbTree,
        EngineId::Hash,
        EngineId::SkipList,
        EngineId::BTree,
    ];

    /// Resolve a verb's prefix letter to the engine identity it selects.
    /// `None` names the default (array) engine, whose prefix is the empty
    /// string; any letter outside `R`/`H`/`S`/`B` is not a known engine.
    pub fn from_prefix(prefix: Option<char>) -> Option<EngineId> {
        match prefix {
            None => Some(EngineId::Array),
            Some('R') => Some(EngineId::RbTree),
            Some('H') => Some(EngineId::Hash),
            Some('S') => Some(EngineId::SkipList),
            Some('B') => Some(EngineId::BTree),
            Some(_) => None,
        }
    }

    /// Human-readable engine name, used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            EngineId::Array => "array",
            EngineId::RbTree => "rbtree",
            EngineId::Hash => "hash",
            EngineId::SkipList => "skiplist",
            EngineId::BTree => "btree",
        }
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

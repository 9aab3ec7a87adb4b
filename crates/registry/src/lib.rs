//! Owns one instance of each compiled-in engine and routes requests to
//! the one a command's prefix names.
//!
//! The original implementation dispatches through a runtime string switch
//! over five hardcoded engine names. The set of engines is fixed at
//! compile time here too — unlike a general-purpose plugin registry keyed
//! by a dynamic map, [`EngineRegistry`] is a plain struct with one field
//! per engine, each gated by its own Cargo feature. Disabling a feature
//! removes that engine from the binary entirely rather than just from a
//! runtime table.

#![warn(missing_docs)]
#![warn(clippy::all)]

use kvstore_core::{Config, EngineId, Error, Result};
use kvstore_engines::Engine;

#[cfg(feature = "engine-array")]
use kvstore_engines::ArrayEngine;
#[cfg(feature = "engine-btree")]
use kvstore_engines::BTreeEngine;
#[cfg(feature = "engine-hash")]
use kvstore_engines::HashEngine;
#[cfg(feature = "engine-rbtree")]
use kvstore_engines::RbTreeEngine;
#[cfg(feature = "engine-skiplist")]
use kvstore_engines::SkipListEngine;

/// Holds one instance of each engine compiled into this binary.
///
/// Construction and shutdown both walk engines in the fixed order
/// `[array, rbtree, hash, skiplist, btree]`, logging one line per engine.
pub struct EngineRegistry {
    #[cfg(feature = "engine-array")]
    array: ArrayEngine,
    #[cfg(feature = "engine-rbtree")]
    rbtree: RbTreeEngine,
    #[cfg(feature = "engine-hash")]
    hash: HashEngine,
    #[cfg(feature = "engine-skiplist")]
    skiplist: SkipListEngine,
    #[cfg(feature = "engine-btree")]
    btree: BTreeEngine,
}

impl EngineRegistry {
    /// Build every compiled-in engine from `config`, in lifecycle order.
    pub fn new(config: &Config) -> Self {
        #[cfg(feature = "engine-array")]
        let array = {
            tracing::info!(engine = "array", "constructing engine");
            ArrayEngine::with_capacity(config.array.initial_capacity)
        };
        #[cfg(feature = "engine-rbtree")]
        let rbtree = {
            tracing::info!(engine = "rbtree", "constructing engine");
            RbTreeEngine::new()
        };
        #[cfg(feature = "engine-hash")]
        let hash = {
            tracing::info!(engine = "hash", "constructing engine");
            HashEngine::with_config(config.hash.initial_buckets, config.hash.load_factor)
        };
        #[cfg(feature = "engine-skiplist")]
        let skiplist = {
            tracing::info!(engine = "skiplist", "constructing engine");
            SkipListEngine::new(config.skiplist.seed)
        };
        #[cfg(feature = "engine-btree")]
        let btree = {
            tracing::info!(engine = "btree", "constructing engine");
            BTreeEngine::new()
        };

        Self {
            #[cfg(feature = "engine-array")]
            array,
            #[cfg(feature = "engine-rbtree")]
            rbtree,
            #[cfg(feature = "engine-hash")]
            hash,
            #[cfg(feature = "engine-skiplist")]
            skiplist,
            #[cfg(feature = "engine-btree")]
            btree,
        }
    }

    /// Borrow the engine for `id`, or an error if it was not compiled in.
    pub fn engine(&self, id: EngineId) -> Result<&dyn Engine> {
        match id {
            #[cfg(feature = "engine-array")]
            EngineId::Array => Ok(&self.array),
            #[cfg(not(feature = "engine-array"))]
            EngineId::Array => Err(Error::EngineDisabled(id)),

            #[cfg(feature = "engine-rbtree")]
            EngineId::RbTree => Ok(&self.rbtree),
            #[cfg(not(feature = "engine-rbtree"))]
            EngineId::RbTree => Err(Error::EngineDisabled(id)),

            #[cfg(feature = "engine-hash")]
            EngineId::Hash => Ok(&self.hash),
            #[cfg(not(feature = "engine-hash"))]
            EngineId::Hash => Err(Error::EngineDisabled(id)),

            #[cfg(feature = "engine-skiplist")]
            EngineId::SkipList => Ok(&self.skiplist),
            #[cfg(not(feature = "engine-skiplist"))]
            EngineId::SkipList => Err(Error::EngineDisabled(id)),

            #[cfg(feature = "engine-btree")]
            EngineId::BTree => Ok(&self.btree),
            #[cfg(not(feature = "engine-btree"))]
            EngineId::BTree => Err(Error::EngineDisabled(id)),
        }
    }

    /// Mutably borrow the engine for `id`, or an error if it was not
    /// compiled in.
    pub fn engine_mut(&mut self, id: EngineId) -> Result<&mut dyn Engine> {
        match id {
            #[cfg(feature = "engine-array")]
            EngineId::Array => Ok(&mut self.array),
            #[cfg(not(feature = "engine-array"))]
            EngineId::Array => Err(Error::EngineDisabled(id)),

            #[cfg(feature = "engine-rbtree")]
            EngineId::RbTree => Ok(&mut self.rbtree),
            #[cfg(not(feature = "engine-rbtree"))]
            EngineId::RbTree => Err(Error::EngineDisabled(id)),

            #[cfg(feature = "engine-hash")]
            EngineId::Hash => Ok(&mut self.hash),
            #[cfg(not(feature = "engine-hash"))]
            EngineId::Hash => Err(Error::EngineDisabled(id)),

            #[cfg(feature = "engine-skiplist")]
            EngineId::SkipList => Ok(&mut self.skiplist),
            #[cfg(not(feature = "engine-skiplist"))]
            EngineId::SkipList => Err(Error::EngineDisabled(id)),

            #[cfg(feature = "engine-btree")]
            EngineId::BTree => Ok(&mut self.btree),
            #[cfg(not(feature = "engine-btree"))]
            EngineId::BTree => Err(Error::EngineDisabled(id)),
        }
    }

    /// Log one summary line per compiled-in engine. Called as the harness
    /// shuts down.
    pub fn shutdown(&self) {
        #[cfg(feature = "engine-array")]
        tracing::info!(engine = "array", entries = self.array.count(), "engine shutdown");
        #[cfg(feature = "engine-rbtree")]
        tracing::info!(engine = "rbtree", entries = self.rbtree.count(), "engine shutdown");
        #[cfg(feature = "engine-hash")]
        tracing::info!(engine = "hash", entries = self.hash.count(), "engine shutdown");
        #[cfg(feature = "engine-skiplist")]
        tracing::info!(engine = "skiplist", entries = self.skiplist.count(), "engine shutdown");
        #[cfg(feature = "engine-btree")]
        tracing::info!(engine = "btree", entries = self.btree.count(), "engine shutdown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_default_engine_is_reachable() {
        let config = Config::default();
        let mut registry = EngineRegistry::new(&config);
        for id in EngineId::ALL {
            registry.engine_mut(id).unwrap().set("k", "v").unwrap();
            assert_eq!(registry.engine(id).unwrap().get("k").unwrap(), Some("v"));
        }
    }

    #[test]
    fn engines_are_independent() {
        let config = Config::default();
        let mut registry = EngineRegistry::new(&config);
        registry.engine_mut(EngineId::Array).unwrap().set("k", "array-value").unwrap();
        registry.engine_mut(EngineId::Hash).unwrap().set("k", "hash-value").unwrap();
        assert_eq!(
            registry.engine(EngineId::Array).unwrap().get("k").unwrap(),
            Some("array-value")
        );
        assert_eq!(
            registry.engine(EngineId::Hash).unwrap().get("k").unwrap(),
            Some("hash-value")
        );
    }
}

//! Store configuration via `kvstore.toml`
//!
//! Same model as a Redis-style config file: defaults are baked in, and an
//! optional file in the working directory can override them. Unknown keys
//! in the file are rejected rather than silently ignored.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Error;
use crate::limits::DEFAULT_MAX_TOKENS;

/// Config file name the harness looks for in its working directory.
pub const CONFIG_FILE_NAME: &str = "kvstore.toml";

/// Tuning knobs for the array engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ArrayConfig {
    /// Initial backing-vector capacity hint.
    #[serde(default = "default_array_capacity")]
    pub initial_capacity: usize,
}

fn default_array_capacity() -> usize {
    16
}

impl Default for ArrayConfig {
    fn default() -> Self {
        Self {
            initial_capacity: default_array_capacity(),
        }
    }
}

/// Tuning knobs for the hash engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HashConfig {
    /// Initial bucket count; must be a power of two.
    #[serde(default = "default_hash_buckets")]
    pub initial_buckets: usize,
    /// Resize trigger: rehash when `count > load_factor * buckets`.
    #[serde(default = "default_load_factor")]
    pub load_factor: f64,
}

fn default_hash_buckets() -> usize {
    1024
}

fn default_load_factor() -> f64 {
    0.75
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            initial_buckets: default_hash_buckets(),
            load_factor: default_load_factor(),
        }
    }
}

/// Tuning knobs for the skip list engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SkipListConfig {
    /// RNG seed for `random_level`. Fixed by default so out-of-the-box runs
    /// are reproducible; override for production-grade randomness.
    #[serde(default = "default_skiplist_seed")]
    pub seed: u64,
}

fn default_skiplist_seed() -> u64 {
    0x5EED_5EED_5EED_5EED
}

impl Default for SkipListConfig {
    fn default() -> Self {
        Self {
            seed: default_skiplist_seed(),
        }
    }
}

/// Top-level store configuration, loaded from defaults and optionally
/// overridden by a `kvstore.toml` file.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Maximum tokens a request line may split into.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Array engine tuning.
    #[serde(default)]
    pub array: ArrayConfig,
    /// Hash engine tuning.
    #[serde(default)]
    pub hash: HashConfig,
    /// Skip list engine tuning.
    #[serde(default)]
    pub skiplist: SkipListConfig,
}

fn default_max_tokens() -> usize {
    DEFAULT_MAX_TOKENS
}

impl Config {
    /// Load configuration, starting from defaults and applying `path` if it
    /// exists. Missing file is not an error; a malformed one is.
    pub fn load(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        let config: Config =
            toml::from_str(content).map_err(|e| Error::Config(format!("parsing toml: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.max_tokens == 0 {
            return Err(Error::Config("max_tokens must be > 0".to_string()));
        }
        if !self.hash.initial_buckets.is_power_of_two() {
            return Err(Error::Config(
                "hash.initial_buckets must be a power of two".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.hash.load_factor) {
            return Err(Error::Config(
                "hash.load_factor must be in [0.0, 1.0)".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_tokens, 128);
        assert_eq!(config.hash.initial_buckets, 1024);
    }

    #[test]
    fn parses_partial_overrides() {
        let config = Config::from_toml("max_tokens = 256\n").unwrap();
        assert_eq!(config.max_tokens, 256);
        assert_eq!(config.hash.initial_buckets, 1024); // still default
    }

    #[test]
    fn rejects_unknown_fields() {
        let result = Config::from_toml("typo_field = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn rejects_non_power_of_two_buckets() {
        let toml = "[hash]\ninitial_buckets = 1000\n";
        let result = Config::from_toml(toml);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn rejects_zero_max_tokens() {
        let result = Config::from_toml("max_tokens = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let config = Config::load(Path::new("/nonexistent/kvstore.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn loads_overrides_from_an_actual_file_on_disk() {
        use std::io::Write;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("kvstore.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "max_tokens = 64\n[skiplist]\nseed = 42").unwrap();
        drop(file);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.max_tokens, 64);
        assert_eq!(config.skiplist.seed, 42);
        assert_eq!(config.array, ArrayConfig::default());
    }
}

//! Command-word grammar: `(A|R|H|S|B)?(SET|GET|DEL|MOD|COUNT)`.
//!
//! The original implementation hardcodes all 25 combinations
//! (`"SET"`, `"RSET"`, `"HSET"`, ..., `"BCOUNT"`) as a flat string table
//! and does a linear `strcmp` scan against it. This is the same grammar
//! expressed compositionally: an optional engine-prefix letter resolved
//! through [`EngineId::from_prefix`](kvstore_core::EngineId::from_prefix)
//! followed by one of five base verbs, so adding a sixth engine never
//! means adding five more string literals — the prefix→engine mapping
//! lives in exactly one place.

use kvstore_core::EngineId;

/// One of the five operations every engine supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Insert or overwrite.
    Set,
    /// Look up.
    Get,
    /// Remove.
    Del,
    /// Overwrite an existing entry only.
    Mod,
    /// Report the number of stored entries.
    Count,
}

impl Verb {
    fn parse(word: &str) -> Option<Verb> {
        match word {
            "SET" => Some(Verb::Set),
            "GET" => Some(Verb::Get),
            "DEL" => Some(Verb::Del),
            "MOD" => Some(Verb::Mod),
            "COUNT" => Some(Verb::Count),
            _ => None,
        }
    }
}

/// Parse a full command word (e.g. `"RSET"`, `"COUNT"`) into the engine it
/// targets and the operation it names. The unprefixed form targets the
/// array engine, matching the original's unprefixed `SET`/`GET`/... table
/// entries.
pub fn parse_command(word: &str) -> Option<(EngineId, Verb)> {
    // Try the word whole first: an unprefixed verb targets the array
    // engine, and trying this before peeling off a letter stops a base
    // verb that happens to start with another engine's prefix letter
    // (`SET` starting with skip list's `S`) from being misparsed.
    if let Some(verb) = Verb::parse(word) {
        return Some((EngineId::Array, verb));
    }
    let mut chars = word.chars();
    let prefix = chars.next()?;
    let engine = EngineId::from_prefix(Some(prefix))?;
    let verb = Verb::parse(chars.as_str())?;
    Some((engine, verb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unprefixed_targets_array() {
        assert_eq!(parse_command("SET"), Some((EngineId::Array, Verb::Set)));
        assert_eq!(parse_command("COUNT"), Some((EngineId::Array, Verb::Count)));
    }

    #[test]
    fn prefixed_targets_matching_engine() {
        assert_eq!(parse_command("RSET"), Some((EngineId::RbTree, Verb::Set)));
        assert_eq!(parse_command("HGET"), Some((EngineId::Hash, Verb::Get)));
        assert_eq!(parse_command("SDEL"), Some((EngineId::SkipList, Verb::Del)));
        assert_eq!(parse_command("BMOD"), Some((EngineId::BTree, Verb::Mod)));
        assert_eq!(parse_command("BCOUNT"), Some((EngineId::BTree, Verb::Count)));
    }

    #[test]
    fn unknown_word_is_none() {
        assert_eq!(parse_command("FOO"), None);
        assert_eq!(parse_command("XSET"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn prefix_without_matching_verb_is_none() {
        assert_eq!(parse_command("R"), None);
        assert_eq!(parse_command("RFOO"), None);
    }
}

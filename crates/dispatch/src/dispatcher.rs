//! The command dispatcher (C8): tokenize, resolve, invoke, reply.
//!
//! The original implementation is a large `switch`/`strcmp` ladder over a
//! flat `commands[]` table, re-scanned on every request. Here resolution
//! is compositional (tokenizer → [`parse_command`] → registry lookup) and
//! the dispatcher itself is a zero-sized, stateless struct: all mutable
//! state lives in the [`EngineRegistry`] passed in by reference.

use kvstore_core::Error;
use kvstore_engines::{DeleteOutcome, Engine, ModifyOutcome, SetOutcome};
use kvstore_registry::EngineRegistry;

use crate::reply::Reply;
use crate::tokenizer::split_tokens;
use crate::verb::{parse_command, Verb};

/// Tokenizes and routes one request line, producing one [`Reply`].
///
/// Holds no state of its own: every call is independent, and nothing it
/// does outlives the call.
#[derive(Debug, Default, Clone, Copy)]
pub struct Dispatcher;

impl Dispatcher {
    /// Create a dispatcher. There is nothing to configure — this exists
    /// only so call sites read `Dispatcher::new()` rather than a bare
    /// unit-struct literal.
    pub fn new() -> Self {
        Self
    }

    /// Dispatch one request line against `registry`, returning the reply
    /// to write back. `max_tokens` bounds how many whitespace-delimited
    /// tokens the line is split into (see [`kvstore_core::limits`]).
    pub fn dispatch(&self, registry: &mut EngineRegistry, line: &str, max_tokens: usize) -> Reply {
        let tokens = split_tokens(line, max_tokens);
        let Some(&verb_word) = tokens.first() else {
            tracing::warn!("empty request line");
            return Reply::Error;
        };

        let Some((engine_id, verb)) = parse_command(verb_word) else {
            return reply_for_protocol_error(Error::UnknownVerb(verb_word.to_string()));
        };

        let span = tracing::debug_span!("dispatch", engine = %engine_id, verb = ?verb);
        let _enter = span.enter();

        let expected = required_token_count(verb);
        if !expected.contains(&tokens.len()) {
            return reply_for_protocol_error(Error::MalformedRequest {
                reason: format!(
                    "{verb_word} requires {expected:?} tokens, got {}",
                    tokens.len()
                ),
            });
        }

        let engine = match registry.engine_mut(engine_id) {
            Ok(engine) => engine,
            Err(err) => return reply_for_protocol_error(err),
        };

        match verb {
            Verb::Set => reply_for_set(engine, tokens[1], tokens[2]),
            Verb::Get => reply_for_get(engine, tokens[1]),
            Verb::Del => reply_for_delete(engine, tokens[1]),
            Verb::Mod => reply_for_modify(engine, tokens[1], tokens[2]),
            Verb::Count => Reply::Count(engine.count()),
        }
    }
}

/// Required token count (verb + args) per §4.8's table, as an inclusive
/// range so `contains` reads naturally at the call site.
fn required_token_count(verb: Verb) -> std::ops::RangeInclusive<usize> {
    match verb {
        Verb::Set | Verb::Mod => 3..=3,
        Verb::Get | Verb::Del => 2..=2,
        Verb::Count => 1..=1,
    }
}

/// Log and flatten a protocol-level [`Error`] into the wire-level `ERROR`
/// reply (§7: "Protocol error ... reply ERROR, connection continues").
/// Every caller builds one of `Error`'s protocol variants, never a
/// validation or config error, hence the assertion rather than a branch.
fn reply_for_protocol_error(err: Error) -> Reply {
    debug_assert!(err.is_protocol_error(), "non-protocol error routed through dispatch: {err:?}");
    tracing::warn!(error = %err, "protocol error");
    Reply::Error
}

fn reply_for_set(engine: &mut dyn Engine, key: &str, value: &str) -> Reply {
    match engine.set(key, value) {
        Ok(SetOutcome::Inserted | SetOutcome::Updated) => Reply::Success,
        Err(_) => Reply::Error,
    }
}

fn reply_for_get(engine: &mut dyn Engine, key: &str) -> Reply {
    match engine.get(key) {
        Ok(Some(value)) => Reply::Value(value.to_string()),
        Ok(None) => Reply::NoExist,
        Err(_) => Reply::Error,
    }
}

fn reply_for_delete(engine: &mut dyn Engine, key: &str) -> Reply {
    match engine.delete(key) {
        Ok(DeleteOutcome::Deleted) => Reply::Success,
        Ok(DeleteOutcome::Absent) => Reply::NoExist,
        Err(_) => Reply::Error,
    }
}

fn reply_for_modify(engine: &mut dyn Engine, key: &str, value: &str) -> Reply {
    match engine.modify(key, value) {
        Ok(ModifyOutcome::Modified) => Reply::Success,
        Ok(ModifyOutcome::Absent) => Reply::NoExist,
        Err(_) => Reply::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvstore_core::Config;

    fn registry() -> EngineRegistry {
        EngineRegistry::new(&Config::default())
    }

    #[test]
    fn set_get_count_round_trip() {
        let mut reg = registry();
        let d = Dispatcher::new();
        assert_eq!(d.dispatch(&mut reg, "BSET name alice", 128), Reply::Success);
        assert_eq!(d.dispatch(&mut reg, "BGET name", 128), Reply::Value("alice".into()));
        assert_eq!(d.dispatch(&mut reg, "BCOUNT", 128), Reply::Count(1));
    }

    #[test]
    fn set_overwrite_keeps_count() {
        let mut reg = registry();
        let d = Dispatcher::new();
        d.dispatch(&mut reg, "BSET name alice", 128);
        assert_eq!(d.dispatch(&mut reg, "BSET name bob", 128), Reply::Success);
        assert_eq!(d.dispatch(&mut reg, "BGET name", 128), Reply::Value("bob".into()));
        assert_eq!(d.dispatch(&mut reg, "BCOUNT", 128), Reply::Count(1));
    }

    #[test]
    fn delete_then_get_and_recount() {
        let mut reg = registry();
        let d = Dispatcher::new();
        d.dispatch(&mut reg, "BSET name alice", 128);
        assert_eq!(d.dispatch(&mut reg, "BDEL name", 128), Reply::Success);
        assert_eq!(d.dispatch(&mut reg, "BGET name", 128), Reply::NoExist);
        assert_eq!(d.dispatch(&mut reg, "BCOUNT", 128), Reply::Count(0));
        assert_eq!(d.dispatch(&mut reg, "BDEL name", 128), Reply::NoExist);
    }

    #[test]
    fn sequential_inserts_then_middle_delete() {
        let mut reg = registry();
        let d = Dispatcher::new();
        for i in 1..=50 {
            d.dispatch(&mut reg, &format!("BSET k{i:02} v{i}"), 128);
        }
        assert_eq!(d.dispatch(&mut reg, "BDEL k25", 128), Reply::Success);
        assert_eq!(d.dispatch(&mut reg, "BGET k25", 128), Reply::NoExist);
        assert_eq!(d.dispatch(&mut reg, "BGET k24", 128), Reply::Value("v24".into()));
        assert_eq!(d.dispatch(&mut reg, "BCOUNT", 128), Reply::Count(49));
    }

    #[test]
    fn cross_engine_independence() {
        let mut reg = registry();
        let d = Dispatcher::new();
        d.dispatch(&mut reg, "SET a 1", 128);
        d.dispatch(&mut reg, "HSET a 2", 128);
        d.dispatch(&mut reg, "RSET a 3", 128);
        assert_eq!(d.dispatch(&mut reg, "GET a", 128), Reply::Value("1".into()));
        assert_eq!(d.dispatch(&mut reg, "HGET a", 128), Reply::Value("2".into()));
        assert_eq!(d.dispatch(&mut reg, "RGET a", 128), Reply::Value("3".into()));
    }

    #[test]
    fn unknown_verb_is_error() {
        let mut reg = registry();
        let d = Dispatcher::new();
        assert_eq!(d.dispatch(&mut reg, "FOO x", 128), Reply::Error);
    }

    #[test]
    fn wrong_token_count_is_error() {
        let mut reg = registry();
        let d = Dispatcher::new();
        assert_eq!(d.dispatch(&mut reg, "SET onlykey", 128), Reply::Error);
        assert_eq!(d.dispatch(&mut reg, "GET", 128), Reply::Error);
    }

    #[test]
    fn empty_key_or_value_is_error() {
        let mut reg = registry();
        let d = Dispatcher::new();
        // split_whitespace drops empty tokens, so an empty arg can only
        // arise from a verb misuse elsewhere; exercise validation via a
        // direct engine call path instead is covered in kvstore-engines.
        // Here we confirm a blank line is rejected as no verb at all.
        assert_eq!(d.dispatch(&mut reg, "   ", 128), Reply::Error);
    }

    #[test]
    fn modify_absent_key_is_no_exist() {
        let mut reg = registry();
        let d = Dispatcher::new();
        assert_eq!(d.dispatch(&mut reg, "MOD missing v", 128), Reply::NoExist);
    }
}

//! Error types shared across the kvstore crates
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations,
//! following the same pattern as the rest of the workspace.

use crate::engine_id::EngineId;
use thiserror::Error;

/// Result type alias for kvstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the kvstore crates
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    /// A `set`/`modify` call was given an empty key
    #[error("key must not be empty")]
    EmptyKey,

    /// A `set`/`modify` call was given an empty value
    #[error("value must not be empty")]
    EmptyValue,

    /// The first token of a request line did not match any known verb
    #[error("unknown verb: {0}")]
    UnknownVerb(String),

    /// A request line did not carry the token count its verb requires
    #[error("malformed request: {reason}")]
    MalformedRequest {
        /// Human-readable reason (e.g. "SET requires 3 tokens, got 2")
        reason: String,
    },

    /// The verb resolved to an engine that was not compiled in
    #[error("engine not compiled in: {0:?}")]
    EngineDisabled(EngineId),

    /// Configuration failed to load or validate
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for errors that should surface as a protocol-level `ERROR` reply
    /// rather than a startup failure.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Error::EmptyKey
                | Error::EmptyValue
                | Error::UnknownVerb(_)
                | Error::MalformedRequest { .. }
                | Error::EngineDisabled(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_display() {
        assert_eq!(Error::EmptyKey.to_string(), "key must not be empty");
    }

    #[test]
    fn unknown_verb_display() {
        let err = Error::UnknownVerb("FOO".to_string());
        assert!(err.to_string().contains("FOO"));
    }

    #[test]
    fn protocol_error_classification() {
        assert!(Error::EmptyKey.is_protocol_error());
        assert!(Error::UnknownVerb("X".into()).is_protocol_error());
        assert!(!Error::Config("bad toml".into()).is_protocol_error());
    }
}

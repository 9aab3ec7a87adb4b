//! The wire-format reply alphabet (§6).
//!
//! The original assembles each reply with an ad hoc `snprintf` call at
//! every dispatch site. `Reply` collects the five possible shapes into one
//! enum with a single `Display` impl, so the wire format is generated from
//! one place.

use std::fmt;

/// One of the five reply shapes the dispatcher can produce for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A set/modify/delete completed.
    Success,
    /// A set/modify failed for an internal (non-protocol) reason.
    ///
    /// No engine in this crate currently returns this — there is no
    /// allocator to run out of heap — but the variant is kept so the
    /// reply alphabet matches the spec's full table.
    Failed,
    /// A protocol or validation error: unknown verb, wrong token count,
    /// empty key/value, or a verb that routed to a disabled engine.
    Error,
    /// `get`/`delete`/`modify` found no entry for the key.
    NoExist,
    /// The stored value, for a successful `get`.
    Value(String),
    /// The live entry count, for `COUNT`.
    Count(usize),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Success => f.write_str("SUCCESS"),
            Reply::Failed => f.write_str("FAILED"),
            Reply::Error => f.write_str("ERROR"),
            Reply::NoExist => f.write_str("NO EXIST"),
            Reply::Value(value) => f.write_str(value),
            Reply::Count(count) => write!(f, "{count}"),
        }
    }
}

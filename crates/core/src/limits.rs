//! Protocol-level size limits
//!
//! Mirrors the original implementation's `KVSTORE_MAX_TOKENS` constant, kept
//! as a tunable default rather than a hardcoded literal.

/// Maximum number of whitespace-delimited tokens a single request line may
/// be split into. The original implementation fixed this at 128; we keep
/// the same default but let configuration raise it.
pub const DEFAULT_MAX_TOKENS: usize = 128;

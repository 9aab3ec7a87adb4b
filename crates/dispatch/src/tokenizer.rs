//! Request-line tokenizing.
//!
//! The original implementation splits on a single space via `strtok` into
//! a fixed `char *tokens[KVSTORE_MAX_TOKENS]` array, with no check against
//! overflowing it. `split_tokens` splits on any run of whitespace (the
//! idiomatic equivalent of repeated single-space delimiters) and caps the
//! result at `max_tokens` instead of reading past the end of a fixed
//! buffer.

/// Split `line` into at most `max_tokens` whitespace-delimited tokens.
/// Tokens beyond the limit are dropped, not an error: a client that sends
/// an oversized line gets a best-effort parse of its head rather than a
/// flat rejection.
pub fn split_tokens(line: &str, max_tokens: usize) -> Vec<&str> {
    line.split_whitespace().take(max_tokens).collect()
}

//! # Error Handling for the TCAM Interpreter
//!
//! This module defines the single crate-wide error type used throughout the
//! loaders and the evaluator.
//!
//! ## Design
//! - [`TcamError`] has exactly two variants, mirroring the two error kinds
//!   the specification distinguishes: [`TcamError::Parse`] for malformed
//!   JSON/grammar/shape-invariant problems detected before a run starts, and
//!   [`TcamError::Runtime`] for faults detected while evaluating a packet.
//! - Both variants carry a human-readable message that names the offending
//!   sub-tree (expression, action, location, or lexeme), per the
//!   specification's error-handling contract.
//! - No retries, no partial recovery: every fallible function in this crate
//!   returns `Result<_, TcamError>` and propagates with `?`.
//!
//! ## Display
//! Implements [`fmt::Display`] for human-readable messages and
//! [`std::error::Error`] so `TcamError` integrates with Rust's standard
//! error handling ecosystem.

use std::fmt;

/// Errors that can occur while loading or interpreting a TCAM program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TcamError {
    /// A document failed to decode: malformed JSON shape, a grammar error in
    /// an expression/location/pattern string, or a structural invariant
    /// (shape, key/pattern agreement) violated before interpretation began.
    Parse(String),
    /// A fault detected while evaluating the TCAM against a packet: an
    /// out-of-bounds read/write, a write to an immutable or non-writable
    /// store, a width mismatch, a duplicate header, etc.
    Runtime(String),
}

impl TcamError {
    /// Construct a [`TcamError::Parse`] from anything that can become a
    /// message string.
    pub fn parse(msg: impl Into<String>) -> Self {
        TcamError::Parse(msg.into())
    }

    /// Construct a [`TcamError::Runtime`] from anything that can become a
    /// message string.
    pub fn runtime(msg: impl Into<String>) -> Self {
        TcamError::Runtime(msg.into())
    }
}

impl fmt::Display for TcamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TcamError::Parse(msg) => write!(f, "parse error: {}", msg),
            TcamError::Runtime(msg) => write!(f, "runtime error: {}", msg),
        }
    }
}

impl std::error::Error for TcamError {}

/// Convenience alias used across loaders and the evaluator.
pub type Result<T> = std::result::Result<T, TcamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_distinguish_kinds() {
        let p = TcamError::parse("bad token '~'");
        let r = TcamError::runtime("cursor past end of packet");
        assert_eq!(p.to_string(), "parse error: bad token '~'");
        assert_eq!(r.to_string(), "runtime error: cursor past end of packet");
    }
}

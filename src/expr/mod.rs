//! # Integer/location expression grammar
//!
//! Splits into [`lexer`] (raw text → tokens) and [`parser`] (tokens →
//! [`crate::ast::IntExp`]). Loaders call the two free functions below
//! rather than touching `Parser` directly.

pub mod lexer;
pub mod parser;

use crate::ast::{IntExp, LocationExp};
use crate::error::Result;

/// Parse an `intexp` string.
pub fn parse_intexp(src: &str) -> Result<IntExp> {
    parser::Parser::parse(src)
}

/// Parse a `locexp` string, failing if it does not reduce to a location.
pub fn parse_locexp(src: &str) -> Result<LocationExp> {
    parser::Parser::parse_location(src)
}

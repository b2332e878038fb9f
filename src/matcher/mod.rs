//! Pattern matching for TRON and Ethereum addresses.
//!
//! - TRON: case-sensitive; the prefix starts right after the leading `T`,
//!   the suffix matches the tail of the full address
//! - Ethereum: case-insensitive; the prefix starts right after `0x`

mod pattern;

pub use pattern::{MatchResult, PatternError, PatternField, SearchPattern};

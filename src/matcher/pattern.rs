//! Pattern validation and matching implementation.

use std::fmt;
use std::ops::Range;

use serde::Serialize;

use crate::network::Network;

/// Which half of the pattern a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternField {
    Prefix,
    Suffix,
}

impl fmt::Display for PatternField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternField::Prefix => write!(f, "prefix"),
            PatternField::Suffix => write!(f, "suffix"),
        }
    }
}

/// Reasons a prefix/suffix pair is rejected before any worker starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("Invalid {network} character in {field}: {ch:?}")]
    InvalidCharacter {
        field: PatternField,
        ch: char,
        network: Network,
    },

    #[error("Second address character cannot be lowercase [a-z], got {0:?}")]
    LowercaseLeader(char),

    #[error("{field} is {len} characters, {network} allows at most {max}")]
    TooLong {
        field: PatternField,
        len: usize,
        max: usize,
        network: Network,
    },
}

/// Result of a pattern match operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// Full match found
    Match,
    /// No match
    NoMatch,
}

impl MatchResult {
    #[inline]
    pub fn is_match(self) -> bool {
        matches!(self, MatchResult::Match)
    }
}

impl From<bool> for MatchResult {
    #[inline]
    fn from(matched: bool) -> Self {
        if matched {
            MatchResult::Match
        } else {
            MatchResult::NoMatch
        }
    }
}

/// A validated prefix/suffix pair for one network.
///
/// Construction is the only way to obtain one, so every `SearchPattern`
/// handed to a worker is known to use the network's alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchPattern {
    prefix: String,
    suffix: String,
    network: Network,
}

impl SearchPattern {
    /// Validates and creates a pattern.
    ///
    /// Ethereum patterns are stored lowercase since matching ignores case.
    pub fn new(
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        network: Network,
    ) -> Result<Self, PatternError> {
        let prefix = prefix.into();
        let suffix = suffix.into();

        Self::validate(&prefix, PatternField::Prefix, network)?;
        Self::validate(&suffix, PatternField::Suffix, network)?;

        // Ethereum prefix and suffix cannot overlap inside the 40 hex digits.
        if network == Network::Eth && prefix.len() + suffix.len() > network.max_prefix_len() {
            return Err(PatternError::TooLong {
                field: PatternField::Suffix,
                len: prefix.len() + suffix.len(),
                max: network.max_prefix_len(),
                network,
            });
        }

        if network == Network::Tron {
            if let Some(first) = prefix.chars().next() {
                if first.is_ascii_lowercase() {
                    return Err(PatternError::LowercaseLeader(first));
                }
            }
        }

        let (prefix, suffix) = if network.case_insensitive() {
            (prefix.to_ascii_lowercase(), suffix.to_ascii_lowercase())
        } else {
            (prefix, suffix)
        };

        Ok(Self {
            prefix,
            suffix,
            network,
        })
    }

    fn validate(text: &str, field: PatternField, network: Network) -> Result<(), PatternError> {
        if let Some(ch) = text.chars().find(|&c| !network.is_valid_char(c)) {
            return Err(PatternError::InvalidCharacter { field, ch, network });
        }

        let max = match field {
            PatternField::Prefix => network.max_prefix_len(),
            PatternField::Suffix => network.max_suffix_len(),
        };
        if text.len() > max {
            return Err(PatternError::TooLong {
                field,
                len: text.len(),
                max,
                network,
            });
        }

        Ok(())
    }

    /// Returns the prefix (matched right after the network leader).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the suffix (matched against the address tail).
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Returns the network this pattern targets.
    pub fn network(&self) -> Network {
        self.network
    }

    /// Combined prefix + suffix length.
    pub fn len(&self) -> usize {
        self.prefix.len() + self.suffix.len()
    }

    /// True when both halves are empty, i.e. every address matches.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Matches an encoded address against this pattern.
    ///
    /// Runs in O(pattern length); the address is never copied.
    #[inline]
    pub fn matches(&self, address: &str) -> MatchResult {
        let address = address.as_bytes();
        let offset = self.network.leader().len();

        let body = match address.get(offset..) {
            Some(body) => body,
            None => return MatchResult::NoMatch,
        };

        let prefix = self.prefix.as_bytes();
        let suffix = self.suffix.as_bytes();

        if body.len() < prefix.len() || address.len() < suffix.len() {
            return MatchResult::NoMatch;
        }

        let head = &body[..prefix.len()];
        let tail = &address[address.len() - suffix.len()..];

        if self.network.case_insensitive() {
            (head.eq_ignore_ascii_case(prefix) && tail.eq_ignore_ascii_case(suffix)).into()
        } else {
            (head == prefix && tail == suffix).into()
        }
    }

    /// Byte ranges of the matched prefix and suffix inside `address`, for
    /// highlighting a result. Empty halves yield `None`.
    pub fn match_spans(&self, address: &str) -> (Option<Range<usize>>, Option<Range<usize>>) {
        let offset = self.network.leader().len();

        let prefix = (!self.prefix.is_empty())
            .then(|| offset..offset + self.prefix.len())
            .filter(|r| r.end <= address.len());
        let suffix = (!self.suffix.is_empty())
            .then(|| address.len().saturating_sub(self.suffix.len())..address.len());

        (prefix, suffix)
    }
}

impl fmt::Display for SearchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.prefix.is_empty() { "*" } else { &self.prefix };
        let suffix = if self.suffix.is_empty() { "*" } else { &self.suffix };
        write!(f, "{}{}...{}", self.network.leader(), prefix, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRON_ADDR: &str = "TMVQGm1qAQYVdetCeGRRkTWYYrLXuHK2HC";
    const ETH_ADDR: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";

    #[test]
    fn test_tron_prefix_match() {
        let pattern = SearchPattern::new("MVQ", "", Network::Tron).unwrap();
        assert!(pattern.matches(TRON_ADDR).is_match());
    }

    #[test]
    fn test_tron_is_case_sensitive() {
        let pattern = SearchPattern::new("MVq", "", Network::Tron).unwrap();
        assert!(!pattern.matches(TRON_ADDR).is_match());
        let pattern = SearchPattern::new("", "k2hc", Network::Tron).unwrap();
        assert!(!pattern.matches(TRON_ADDR).is_match());
    }

    #[test]
    fn test_tron_suffix_match() {
        let pattern = SearchPattern::new("", "K2HC", Network::Tron).unwrap();
        assert!(pattern.matches(TRON_ADDR).is_match());
        let pattern = SearchPattern::new("M", "HC", Network::Tron).unwrap();
        assert!(pattern.matches(TRON_ADDR).is_match());
    }

    #[test]
    fn test_tron_suffix_may_cover_leader() {
        let pattern = SearchPattern::new("", TRON_ADDR, Network::Tron).unwrap();
        assert!(pattern.matches(TRON_ADDR).is_match());
    }

    #[test]
    fn test_eth_case_insensitive() {
        let pattern = SearchPattern::new("7E5f", "bDF", Network::Eth).unwrap();
        assert_eq!(pattern.prefix(), "7e5f");
        assert!(pattern.matches(ETH_ADDR).is_match());
        assert!(pattern.matches(&ETH_ADDR.to_lowercase()).is_match());
    }

    #[test]
    fn test_eth_prefix_skips_leader() {
        let pattern = SearchPattern::new("0x", "", Network::Eth);
        // 'x' is not hex, the leader is never part of the pattern
        assert!(pattern.is_err());
        let pattern = SearchPattern::new("e5", "", Network::Eth).unwrap();
        assert!(!pattern.matches(ETH_ADDR).is_match());
    }

    #[test]
    fn test_empty_pattern_matches_everything() {
        let pattern = SearchPattern::new("", "", Network::Tron).unwrap();
        assert!(pattern.is_empty());
        assert!(pattern.matches(TRON_ADDR).is_match());
    }

    #[test]
    fn test_short_address_never_matches() {
        let pattern = SearchPattern::new("ABC", "", Network::Tron).unwrap();
        assert!(!pattern.matches("TAB").is_match());
        assert!(!pattern.matches("").is_match());
    }

    #[test]
    fn test_invalid_characters() {
        let err = SearchPattern::new("0OIl", "", Network::Tron).unwrap_err();
        assert_eq!(
            err,
            PatternError::InvalidCharacter {
                field: PatternField::Prefix,
                ch: '0',
                network: Network::Tron,
            }
        );

        let err = SearchPattern::new("", "cafez", Network::Eth).unwrap_err();
        assert!(matches!(
            err,
            PatternError::InvalidCharacter { field: PatternField::Suffix, ch: 'z', .. }
        ));
    }

    #[test]
    fn test_lowercase_leader_rejected() {
        let err = SearchPattern::new("abc", "", Network::Tron).unwrap_err();
        assert_eq!(err, PatternError::LowercaseLeader('a'));
        // Only the first prefix character is restricted
        assert!(SearchPattern::new("Abc", "", Network::Tron).is_ok());
        assert!(SearchPattern::new("", "abc", Network::Tron).is_ok());
    }

    #[test]
    fn test_length_limits() {
        let long = "A".repeat(34);
        assert!(matches!(
            SearchPattern::new(long.as_str(), "", Network::Tron),
            Err(PatternError::TooLong { field: PatternField::Prefix, max: 33, .. })
        ));
        assert!(SearchPattern::new("", long.as_str(), Network::Tron).is_ok());
        assert!(SearchPattern::new("a".repeat(41), "", Network::Eth).is_err());
        assert!(SearchPattern::new("a".repeat(20), "b".repeat(20), Network::Eth).is_ok());
        assert!(matches!(
            SearchPattern::new("a".repeat(21), "b".repeat(20), Network::Eth),
            Err(PatternError::TooLong { len: 41, max: 40, .. })
        ));
    }

    #[test]
    fn test_match_spans() {
        let pattern = SearchPattern::new("MV", "HC", Network::Tron).unwrap();
        let (prefix, suffix) = pattern.match_spans(TRON_ADDR);
        assert_eq!(prefix, Some(1..3));
        assert_eq!(suffix, Some(32..34));

        let pattern = SearchPattern::new("7e", "", Network::Eth).unwrap();
        let (prefix, suffix) = pattern.match_spans(ETH_ADDR);
        assert_eq!(&ETH_ADDR[prefix.unwrap()], "7E");
        assert_eq!(suffix, None);
    }
}

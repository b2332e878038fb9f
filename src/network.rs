//! Supported address networks and their character sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Base58 alphabet used by TRON (Bitcoin ordering, no `0`, `O`, `I`, `l`).
pub const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Hex alphabet accepted for Ethereum patterns (either case).
pub const HEX_ALPHABET: &str = "0123456789abcdefABCDEF";

/// The address format being mined.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// TRON: Base58Check over `0x41 || hash20`, always starting with `T`
    #[default]
    Tron,
    /// Ethereum: `0x` followed by 40 hex characters
    Eth,
}

impl Network {
    /// Characters a prefix or suffix may contain.
    pub fn alphabet(self) -> &'static str {
        match self {
            Network::Tron => BASE58_ALPHABET,
            Network::Eth => HEX_ALPHABET,
        }
    }

    /// Returns true if `c` belongs to this network's pattern alphabet.
    #[inline]
    pub fn is_valid_char(self, c: char) -> bool {
        c.is_ascii() && self.alphabet().contains(c)
    }

    /// The fixed leader every address starts with.
    pub fn leader(self) -> &'static str {
        match self {
            Network::Tron => "T",
            Network::Eth => "0x",
        }
    }

    /// Total address length in characters, leader included.
    pub fn address_len(self) -> usize {
        match self {
            Network::Tron => 34,
            Network::Eth => 42,
        }
    }

    /// Number of symbols a single position can take, used by the estimator.
    ///
    /// For TRON the first character after `T` is restricted to digits and
    /// uppercase Base58 letters (33 symbols); every other position uses the
    /// full alphabet. Ethereum matching is case-insensitive, so 16 everywhere.
    pub fn position_cardinality(self, first_prefix_position: bool) -> u32 {
        match self {
            Network::Tron if first_prefix_position => 33,
            Network::Tron => 58,
            Network::Eth => 16,
        }
    }

    /// Longest prefix that fits in the address body after the leader.
    pub fn max_prefix_len(self) -> usize {
        self.address_len() - self.leader().len()
    }

    /// Longest suffix allowed. TRON suffixes may overlap the `T` leader.
    pub fn max_suffix_len(self) -> usize {
        match self {
            Network::Tron => self.address_len(),
            Network::Eth => self.max_prefix_len(),
        }
    }

    /// Whether prefix/suffix comparison ignores ASCII case.
    pub fn case_insensitive(self) -> bool {
        matches!(self, Network::Eth)
    }

    /// Human-readable network name.
    pub fn name(self) -> &'static str {
        match self {
            Network::Tron => "TRON",
            Network::Eth => "Ethereum",
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tron" | "trx" => Ok(Network::Tron),
            "eth" | "ethereum" => Ok(Network::Eth),
            _ => Err(format!("Unknown network: {}", s)),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

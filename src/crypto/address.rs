//! Account hash representation and per-network address encoding.

use std::fmt;

use sha2::{Digest, Sha256};
use tiny_keccak::{Hasher, Keccak};

use crate::network::Network;

/// TRON mainnet address version byte.
pub const TRON_ADDRESS_PREFIX: u8 = 0x41;

/// A 20-byte account hash shared by Ethereum and TRON.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Creates an address from raw bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Returns the address as raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns the address as a lowercase hex string (without 0x prefix).
    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns the address with checksum encoding (EIP-55).
    pub fn to_checksum(&self) -> String {
        let hex_addr = self.to_hex();
        let mut hasher = Keccak::v256();
        hasher.update(hex_addr.as_bytes());
        let mut hash = [0u8; 32];
        hasher.finalize(&mut hash);

        let mut checksum = String::with_capacity(42);
        checksum.push_str("0x");

        for (i, c) in hex_addr.chars().enumerate() {
            let hash_byte = hash[i / 2];
            let hash_nibble = if i % 2 == 0 {
                hash_byte >> 4
            } else {
                hash_byte & 0x0f
            };

            if hash_nibble >= 8 {
                checksum.push(c.to_ascii_uppercase());
            } else {
                checksum.push(c);
            }
        }

        checksum
    }

    /// Returns the TRON Base58Check address (`0x41 || hash20 || checksum4`).
    pub fn to_tron(&self) -> String {
        let mut data = [0u8; 25];
        data[0] = TRON_ADDRESS_PREFIX;
        data[1..21].copy_from_slice(&self.0);

        let checksum = Sha256::digest(Sha256::digest(&data[..21]));
        data[21..].copy_from_slice(&checksum[..4]);

        bs58::encode(data).into_string()
    }

    /// Encodes the address the way `network` displays it.
    pub fn encode(&self, network: Network) -> String {
        match network {
            Network::Tron => self.to_tron(),
            Network::Eth => self.to_checksum(),
        }
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", self.to_hex())
    }
}

//! The key generation capability consumed by workers.

use secp256k1::{Secp256k1, SignOnly};
use serde::Serialize;

use crate::network::Network;

use super::{GeneratorError, Keypair};

/// One freshly generated account, already encoded for its network.
///
/// Ephemeral: workers drop it unless it matches the pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedAddress {
    /// Display address (`T...` for TRON, checksummed `0x...` for Ethereum)
    pub address: String,
    /// Private key hex (`0x`-prefixed for Ethereum, bare for TRON)
    pub private_key: String,
}

/// Produces one random keypair and its derived address per call.
///
/// Implementations must draw key material from a cryptographically secure
/// source and must not touch the network or persist anything.
pub trait KeyGenerator: Send + Sync {
    /// Generates a random account for `network`.
    fn generate(&self, network: Network) -> Result<GeneratedAddress, GeneratorError>;
}

/// secp256k1 + Keccak-256 generator covering both supported networks.
#[derive(Debug, Clone)]
pub struct Secp256k1Generator {
    secp: Secp256k1<SignOnly>,
}

impl Secp256k1Generator {
    /// Creates a generator with its own signing context.
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::signing_only(),
        }
    }

    /// Encodes an existing keypair for `network`.
    pub fn encode(keypair: &Keypair, network: Network) -> GeneratedAddress {
        let private_key = match network {
            Network::Eth => format!("0x{}", keypair.private_key_hex()),
            Network::Tron => keypair.private_key_hex(),
        };

        GeneratedAddress {
            address: keypair.address().encode(network),
            private_key,
        }
    }

    /// Derives the account for a known secret key.
    pub fn from_secret_key(
        &self,
        secret_bytes: [u8; 32],
        network: Network,
    ) -> Result<GeneratedAddress, GeneratorError> {
        let keypair = Keypair::from_secret_key(&self.secp, secret_bytes)?;
        Ok(Self::encode(&keypair, network))
    }
}

impl Default for Secp256k1Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyGenerator for Secp256k1Generator {
    #[inline]
    fn generate(&self, network: Network) -> Result<GeneratedAddress, GeneratorError> {
        let keypair = Keypair::generate(&self.secp)?;
        Ok(Self::encode(&keypair, network))
    }
}

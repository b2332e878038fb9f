//! secp256k1 keypair generation.

use rand::rngs::OsRng;
use rand::RngCore;
use secp256k1::{PublicKey, Secp256k1, SecretKey, Signing};
use tiny_keccak::{Hasher, Keccak};

use super::{Address, GeneratorError};

/// A secp256k1 private key together with its 20-byte account hash.
#[derive(Clone)]
pub struct Keypair {
    /// The private key bytes (32 bytes)
    secret_key: [u8; 32],
    /// The derived account hash
    address: Address,
}

impl Keypair {
    /// Generates a new random keypair.
    ///
    /// Key material comes straight from the operating system RNG. An entropy
    /// failure or an out-of-range scalar is reported, never retried.
    #[inline]
    pub fn generate<C: Signing>(secp: &Secp256k1<C>) -> Result<Self, GeneratorError> {
        let mut secret_bytes = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut secret_bytes)
            .map_err(|e| GeneratorError::Entropy(e.to_string()))?;

        Self::from_secret_key(secp, secret_bytes)
    }

    /// Derives the keypair for an existing secret key.
    pub fn from_secret_key<C: Signing>(
        secp: &Secp256k1<C>,
        secret_bytes: [u8; 32],
    ) -> Result<Self, GeneratorError> {
        let secret_key =
            SecretKey::from_slice(&secret_bytes).map_err(|_| GeneratorError::InvalidSecretKey)?;
        let public_key = PublicKey::from_secret_key(secp, &secret_key);

        Ok(Self {
            secret_key: secret_bytes,
            address: Self::derive_address(&public_key),
        })
    }

    /// Keccak-256 over the 64-byte uncompressed public key (0x04 tag
    /// dropped); the last 20 bytes are the account hash.
    #[inline]
    fn derive_address(public_key: &PublicKey) -> Address {
        let public_key_bytes = public_key.serialize_uncompressed();

        let mut hasher = Keccak::v256();
        hasher.update(&public_key_bytes[1..]);

        let mut hash = [0u8; 32];
        hasher.finalize(&mut hash);

        let mut address_bytes = [0u8; 20];
        address_bytes.copy_from_slice(&hash[12..]);

        Address::from_bytes(address_bytes)
    }

    /// Returns the private key as a hex string (without 0x prefix).
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key)
    }

    /// Returns the private key bytes.
    pub fn private_key_bytes(&self) -> &[u8; 32] {
        &self.secret_key
    }

    /// Returns a reference to the derived account hash.
    #[inline]
    pub fn address(&self) -> &Address {
        &self.address
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

//! Cryptographic operations for TRON and Ethereum key and address generation.
//!
//! This module provides:
//! - Secure random key generation using secp256k1
//! - Account hash derivation using Keccak-256
//! - Base58Check (TRON) and EIP-55 (Ethereum) address encoding
//! - The `KeyGenerator` capability workers call in their hot loop

mod address;
mod generator;
mod keypair;

pub use address::{Address, TRON_ADDRESS_PREFIX};
pub use generator::{GeneratedAddress, KeyGenerator, Secp256k1Generator};
pub use keypair::Keypair;

/// Errors raised while producing a keypair. Always terminal for the worker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
    #[error("Random source unavailable: {0}")]
    Entropy(String),

    #[error("Generated secret key is outside the curve order")]
    InvalidSecretKey,

    #[error("Key generator unavailable: {0}")]
    Unavailable(String),
}

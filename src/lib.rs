//! # tron_vanity
//!
//! Multi-core TRON & Ethereum vanity address generator.
//!
//! ## Architecture
//!
//! - `network`: Supported address formats and their alphabets
//! - `crypto`: Key generation and address encoding
//! - `matcher`: Pattern validation and matching
//! - `worker`: Worker loop, message protocol and the search coordinator
//! - `stats`: Odds/ETA estimation and throughput aggregation
//! - `config`: Runtime configuration

pub mod config;
pub mod crypto;
pub mod matcher;
pub mod network;
pub mod stats;
pub mod worker;

pub use config::Config;
pub use crypto::{GeneratedAddress, GeneratorError, KeyGenerator, Keypair, Secp256k1Generator};
pub use matcher::{MatchResult, PatternError, SearchPattern};
pub use network::Network;
pub use stats::{StatsAggregator, StatsSnapshot};
pub use worker::{
    Coordinator, FoundAddress, SearchError, SearchEvents, SearchOptions, SessionHandle,
    SessionStatus, SessionSummary,
};

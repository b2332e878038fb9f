//! Search statistics: odds/ETA estimation and cross-worker aggregation.

mod aggregator;
mod probability;

pub use aggregator::{StatsAggregator, StatsSnapshot, DEFAULT_ASSUMED_RATE};
pub use probability::{
    describe_odds, eta_seconds, expected_attempts, expected_attempts_for, format_eta,
    format_probability, probability,
};

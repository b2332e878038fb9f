//! Runtime configuration for the vanity address generator.

use std::time::Duration;

use clap::Parser;

use crate::matcher::{PatternError, SearchPattern};
use crate::network::Network;
use crate::stats::DEFAULT_ASSUMED_RATE;
use crate::worker::{SearchOptions, WorkerConfig, DEFAULT_BATCH_SIZE};

/// Largest number of results a single run may collect.
pub const MAX_RESULT_LIMIT: usize = 100;

/// TRON & Ethereum Vanity Address Generator
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Prefix to match right after the fixed leader (`T` or `0x`)
    #[arg(short, long, default_value = "")]
    pub prefix: String,

    /// Suffix to match at the end of the address
    #[arg(short, long, default_value = "")]
    pub suffix: String,

    /// Address format to search
    #[arg(short = 'N', long, value_enum, default_value_t = Network::Tron)]
    pub network: Network,

    /// Stop after finding N addresses (clamped to 1..=100)
    #[arg(short = 'n', long, default_value = "1")]
    pub limit: i64,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Keys generated between two cancellation checks
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Minimum interval between worker statistics reports, in milliseconds
    #[arg(long, default_value = "500")]
    pub report_interval_ms: u64,

    /// Hash rate assumed for ETA before any worker reports
    #[arg(long, default_value_t = DEFAULT_ASSUMED_RATE)]
    pub assume_rate: u64,

    /// Print odds and ETA for the pattern without searching
    #[arg(long, default_value = "false")]
    pub estimate: bool,

    /// Emit one JSON object per event instead of text
    #[arg(long, default_value = "false")]
    pub json: bool,

    /// Disable ANSI highlighting of the matched prefix/suffix
    #[arg(long, default_value = "false")]
    pub no_color: bool,
}

impl Config {
    /// Returns the number of workers, defaulting to CPU count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Returns the result limit clamped into `1..=MAX_RESULT_LIMIT`.
    pub fn result_limit(&self) -> usize {
        self.limit.clamp(1, MAX_RESULT_LIMIT as i64) as usize
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == Some(0) {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatch);
        }
        self.search_pattern()?;
        Ok(())
    }

    /// Builds the validated pattern from the trimmed prefix and suffix.
    pub fn search_pattern(&self) -> Result<SearchPattern, PatternError> {
        SearchPattern::new(self.prefix.trim(), self.suffix.trim(), self.network)
    }

    /// Returns the coordinator options this configuration describes.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            workers: self.worker_count(),
            worker: WorkerConfig {
                batch_size: self.batch_size,
                report_interval: Duration::from_millis(self.report_interval_ms),
            },
            initial_rate: self.assume_rate,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] PatternError),

    #[error("Worker count must be at least 1")]
    ZeroWorkers,

    #[error("Batch size must be at least 1")]
    ZeroBatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_config(prefix: &str, network: Network) -> Config {
        Config {
            prefix: prefix.into(),
            suffix: String::new(),
            network,
            limit: 1,
            workers: None,
            batch_size: DEFAULT_BATCH_SIZE,
            report_interval_ms: 500,
            assume_rate: DEFAULT_ASSUMED_RATE,
            estimate: false,
            json: false,
            no_color: false,
        }
    }

    #[test]
    fn test_valid_pattern() {
        let config = make_test_config("TRX", Network::Tron);
        assert!(config.validate().is_ok());
        let config = make_test_config("dead", Network::Eth);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_pattern() {
        let config = make_test_config("xyz", Network::Eth);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPattern(_))
        ));
        let config = make_test_config("abc", Network::Tron);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pattern_is_trimmed() {
        let config = make_test_config("  ABC ", Network::Tron);
        assert_eq!(config.search_pattern().unwrap().prefix(), "ABC");
    }

    #[test]
    fn test_limit_clamped() {
        let mut config = make_test_config("A", Network::Tron);
        config.limit = 0;
        assert_eq!(config.result_limit(), 1);
        config.limit = -5;
        assert_eq!(config.result_limit(), 1);
        config.limit = 250;
        assert_eq!(config.result_limit(), 100);
        config.limit = 7;
        assert_eq!(config.result_limit(), 7);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = make_test_config("A", Network::Tron);
        config.workers = Some(0);
        assert!(matches!(config.validate(), Err(ConfigError::ZeroWorkers)));
    }

    #[test]
    fn test_cli_parsing() {
        let config = Config::parse_from(["tron-vanity", "-p", "ABC", "-N", "eth", "-n", "3"]);
        assert_eq!(config.network, Network::Eth);
        assert_eq!(config.result_limit(), 3);
        assert_eq!(config.prefix, "ABC");
        assert!(config.suffix.is_empty());
    }
}

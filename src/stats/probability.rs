//! Expected-attempt estimation and human-readable odds/ETA formatting.

use crate::matcher::SearchPattern;
use crate::network::Network;

/// Expected number of attempts before a random address matches.
///
/// Ethereum: `16^(prefix + suffix)`. TRON: the first prefix position has 33
/// possible symbols, every other prefix position and every suffix position 58.
/// An empty pattern needs exactly one attempt.
pub fn expected_attempts(pattern: &SearchPattern) -> f64 {
    expected_attempts_for(pattern.prefix().len(), pattern.suffix().len(), pattern.network())
}

/// Same as [`expected_attempts`] from raw lengths.
pub fn expected_attempts_for(prefix_len: usize, suffix_len: usize, network: Network) -> f64 {
    let mut attempts = 1.0_f64;

    for i in 0..prefix_len {
        attempts *= network.position_cardinality(i == 0) as f64;
    }
    attempts * (network.position_cardinality(false) as f64).powi(suffix_len as i32)
}

/// Probability that a single attempt matches. `1.0` for an empty pattern.
pub fn probability(pattern: &SearchPattern) -> f64 {
    1.0 / expected_attempts(pattern)
}

/// Formats odds as `1 in <n>` with k/M/B/T buckets at 10^3/10^6/10^9/10^12.
pub fn format_probability(attempts: f64) -> String {
    if attempts < 1_000.0 {
        format!("1 in {}", attempts.round())
    } else if attempts < 1_000_000.0 {
        format!("1 in {:.1}k", attempts / 1e3)
    } else if attempts < 1_000_000_000.0 {
        format!("1 in {:.1}M", attempts / 1e6)
    } else if attempts < 1_000_000_000_000.0 {
        format!("1 in {:.1}B", attempts / 1e9)
    } else {
        format!("1 in {:.1}T", attempts / 1e12)
    }
}

/// Odds for a pattern; an empty pattern (certain match) displays as `---`.
pub fn describe_odds(pattern: &SearchPattern) -> String {
    if pattern.is_empty() {
        return "---".into();
    }
    format_probability(expected_attempts(pattern))
}

/// Seconds until the first expected match: `floor((1 / probability) / rate)`.
///
/// `None` when the estimate is meaningless: probability 0 or 1, no rate, or a
/// non-finite result.
pub fn eta_seconds(probability: f64, rate: f64) -> Option<u64> {
    if !(probability > 0.0 && probability < 1.0) || !(rate > 0.0) {
        return None;
    }

    let eta = ((1.0 / probability) / rate).floor();
    if eta.is_finite() && eta <= u64::MAX as f64 {
        Some(eta as u64)
    } else {
        None
    }
}

/// Formats an ETA: `42s`, `3m 5s`, `2h 10m`, `4d 3h`, or `---` when undefined.
pub fn format_eta(seconds: Option<u64>) -> String {
    let Some(seconds) = seconds else {
        return "---".into();
    };

    match seconds {
        0..=59 => format!("{}s", seconds),
        60..=3_599 => format!("{}m {}s", seconds / 60, seconds % 60),
        3_600..=86_399 => format!("{}h {}m", seconds / 3_600, (seconds % 3_600) / 60),
        _ => format!("{}d {}h", seconds / 86_400, (seconds % 86_400) / 3_600),
    }
}

//! TRON & Ethereum Vanity Address Generator CLI
//!
//! Usage:
//!   tron-vanity -p ABC                 # TRON address starting with "TABC"
//!   tron-vanity -s 888 -n 3            # 3 TRON addresses ending with "888"
//!   tron-vanity -N eth -p dead -s beef # Ethereum 0xdead...beef
//!   tron-vanity -p ABCD --estimate     # Odds and ETA only

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::warn;

use tron_vanity::stats::{describe_odds, expected_attempts, format_eta, StatsAggregator};
use tron_vanity::{
    Config, Coordinator, FoundAddress, SearchEvents, SearchPattern, Secp256k1Generator,
    SessionSummary, StatsSnapshot,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate().context("Configuration error")?;
    let pattern = config.search_pattern()?;
    let options = config.search_options();

    if config.estimate {
        print_estimate(&config, &pattern);
        return Ok(());
    }

    if !config.json {
        print_banner(&config, &pattern);
    }

    let coordinator = Coordinator::new(Arc::new(Secp256k1Generator::new()), options);
    let printer = Printer {
        pattern: pattern.clone(),
        json: config.json,
        color: !config.no_color && !config.json,
        workers: options.workers,
    };
    let session = coordinator.start_search(pattern, config.result_limit(), printer)?;

    let cancel = session.canceller();
    if let Err(e) = ctrlc::set_handler(cancel) {
        warn!(error = %e, "could not install Ctrl-C handler");
    }

    let summary = session.wait()?;
    if summary.status == tron_vanity::SessionStatus::Failed {
        std::process::exit(1);
    }
    Ok(())
}

fn print_banner(config: &Config, pattern: &SearchPattern) {
    let eta = StatsAggregator::new(config.assume_rate).eta_seconds(pattern);

    println!("{} Vanity Address Generator", pattern.network().name());
    println!("==================================");
    println!("Pattern:    {}", pattern);
    println!("Odds:       {}", describe_odds(pattern));
    println!("ETA:        {} (at {} H/s)", format_eta(eta), config.assume_rate);
    println!("Workers:    {}/{} cores", config.worker_count(), num_cpus::get());
    println!("Target:     {} address(es)", config.result_limit());
    println!();
    println!("Searching... (Press Ctrl+C to stop)\n");
}

fn print_estimate(config: &Config, pattern: &SearchPattern) {
    let eta = StatsAggregator::new(config.assume_rate).eta_seconds(pattern);

    if config.json {
        let line = json!({
            "pattern": pattern,
            "expected_attempts": expected_attempts(pattern),
            "odds": describe_odds(pattern),
            "eta_seconds": eta,
            "assumed_rate": config.assume_rate,
        });
        println!("{}", line);
    } else {
        println!("Pattern: {}", pattern);
        println!("Odds:    {}", describe_odds(pattern));
        println!("ETA:     {} (at {} H/s)", format_eta(eta), config.assume_rate);
    }
}

/// Prints session events to stdout.
struct Printer {
    pattern: SearchPattern,
    json: bool,
    color: bool,
    workers: usize,
}

impl Printer {
    fn highlight(&self, address: &str) -> String {
        if !self.color {
            return address.to_string();
        }

        let (prefix, suffix) = self.pattern.match_spans(address);
        let mut out = String::with_capacity(address.len() + 32);
        let mut pos = 0;

        for range in [prefix, suffix].into_iter().flatten() {
            if range.start < pos {
                continue;
            }
            out.push_str(&address[pos..range.start]);
            out.push_str("\x1b[1;32m");
            out.push_str(&address[range.clone()]);
            out.push_str("\x1b[0m");
            pos = range.end;
        }
        out.push_str(&address[pos..]);
        out
    }
}

impl SearchEvents for Printer {
    fn on_found(&mut self, result: &FoundAddress) {
        if self.json {
            println!("{}", json!({ "event": "found", "result": result }));
            return;
        }
        println!("=== Match #{} ===", result.index);
        println!("Address:     {}", self.highlight(&result.address));
        println!("Private Key: {}", result.private_key);
        println!("Worker:      {}", result.worker_id);
        println!();
    }

    fn on_stats(&mut self, stats: &StatsSnapshot) {
        if self.json {
            println!("{}", json!({ "event": "stats", "stats": stats }));
            return;
        }
        println!(
            "[{:>4}s] {} H/s | {} keys | ETA {} | {:.1}% | {}/{} cores",
            stats.elapsed.as_secs(),
            format_number(stats.hashes_per_second),
            format_number(stats.total_hashes),
            format_eta(stats.eta_seconds),
            stats.progress * 100.0,
            self.workers,
            stats.available_cores,
        );
    }

    fn on_error(&mut self, message: &str) {
        if self.json {
            println!("{}", json!({ "event": "error", "message": message }));
            return;
        }
        eprintln!("Worker error: {}", message);
    }

    fn on_finished(&mut self, summary: &SessionSummary) {
        if self.json {
            println!("{}", json!({ "event": "finished", "summary": summary }));
            return;
        }
        println!("\n--- Final Statistics ({:?}) ---", summary.status);
        println!("Total keys generated: {}", format_number(summary.total_hashes));
        println!("Total matches found:  {}/{}", summary.found, summary.limit);
        println!("Time elapsed:         {:.2}s", summary.elapsed.as_secs_f64());
        println!(
            "Average speed:        {}/s",
            format_number(summary.average_rate() as u64)
        );
    }
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

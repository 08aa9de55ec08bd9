//! tally - reports over a plain text double-entry journal
//! ---
//!
//! This crate wires [`libtally`] processors into report runs: a YAML
//! [`Config`][config::Config] describes what to report, and every command
//! takes a registry plus a ledger and hands back a [`Table`][libtally::table::Table].
//!

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Report runs: balance, register, returns, weights and check.
pub mod commands;

/// YAML configuration of a report run.
pub mod config;

pub use config::Config;

static TRACING: Once = Once::new();

/// Installs a fmt subscriber filtered by `RUST_LOG`, defaulting to
/// `tally=info`. Calling it again is a no-op.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("tally=info,libtally=info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

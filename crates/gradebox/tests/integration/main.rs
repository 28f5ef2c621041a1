//! Integration tests for gradebox
//!
//! These tests run real submissions and require `python3` on the PATH.
//! Run with: cargo test -p gradebox --features integration-tests

#![cfg(feature = "integration-tests")]

use std::fs;
use std::sync::Once;

use gradebox::{Config, Grader};

mod config_loading;
mod free_form;
mod named_function;
mod supervision;

const FIXTURES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

static TRACING: Once = Once::new();

/// Install a test subscriber honouring RUST_LOG, once per test binary
pub(crate) fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Helper to get fixture file content
pub(crate) fn fixture(path: &str) -> String {
    let path = format!("{FIXTURES_PATH}/{path}");
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read fixture {path}: {e}"))
}

/// Grader using the embedded default configuration
pub(crate) fn test_grader() -> Grader {
    init_tracing();
    Grader::new(Config::default())
}

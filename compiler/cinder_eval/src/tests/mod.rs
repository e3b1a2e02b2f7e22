//! End-to-end tests for the contract lifecycle.
//!
//! Contracts here are built directly as IR; `build` holds the constructors
//! shared by the test files.

mod property_tests;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a tracing subscriber when `RUST_LOG` is set.
///
/// Safe to call from every test.
pub(crate) fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_test_writer())
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

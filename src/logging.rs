//! # Structured Logging Module
//!
//! Console tracing setup shared by embedders and the test suite. Output
//! format follows `DOCROUTER_LOG_FORMAT` (`json` or plain text) and the
//! filter follows `RUST_LOG`, defaulting to `info`.

use std::env;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process. Safe to call from every
/// entry point; later calls are no-ops, as is running under a subscriber
/// installed by the embedder.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let json_output = env::var("DOCROUTER_LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let layer = if json_output {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .boxed()
        };

        // A subscriber may already be installed; that is not our problem
        let _ = tracing_subscriber::registry()
            .with(layer.with_filter(filter))
            .try_init();
    });
}

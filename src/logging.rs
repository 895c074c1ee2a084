//! Tracing setup.
//!
//! The engine emits `tracing` events (`debug` for renders and commits, `trace`
//! per unit of work). Nothing is printed unless a subscriber is installed.
//!
//! A fullscreen terminal app owns stderr's screen, so log to a file there:
//!
//! ```bash
//! RUST_LOG=spark_fiber=debug cargo run --example counter
//! ```

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install a subscriber writing compact lines to stderr.
///
/// Reads `RUST_LOG`, defaulting to `warn`. Does nothing if a global
/// subscriber is already set.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_writer(io::stderr).compact())
        .try_init();
}

/// Install a subscriber appending to `path`, for fullscreen apps.
pub fn init_to_file(path: impl AsRef<Path>) -> io::Result<()> {
    let file = File::options().create(true).append(true).open(path)?;

    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false).compact())
        .try_init();
    Ok(())
}

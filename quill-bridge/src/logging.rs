//! Tracing subscriber setup for binaries.

use tracing_subscriber::EnvFilter;

/// Install a compact `fmt` subscriber writing to stderr.
///
/// Honors `RUST_LOG` (e.g. `RUST_LOG=quill_bridge=debug,quill_core=trace`)
/// and falls back to `info`. Calling it twice is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .compact()
        .try_init();
}

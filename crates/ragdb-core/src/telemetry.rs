//! Tracing subscriber setup for binaries, examples and tests.

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RAGDB_LOG` (default `info`).
///
/// Returns `false` when a global subscriber was already installed, which is
/// the normal case when several tests call this.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_env("RAGDB_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

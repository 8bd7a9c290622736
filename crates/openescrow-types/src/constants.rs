//! System-wide constants for the OpenEscrow custody engine.

/// Default verification delay in seconds (2 hours).
pub const DEFAULT_VERIFICATION_DELAY_SECS: u64 = 2 * 60 * 60;

/// Default maximum attempts for oracle checks and decision submission.
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 5;

/// Default initial retry backoff in milliseconds.
pub const DEFAULT_RETRY_INITIAL_BACKOFF_MS: u64 = 200;

/// Default retry backoff ceiling in milliseconds.
pub const DEFAULT_RETRY_MAX_BACKOFF_MS: u64 = 30_000;

/// Capacity of the live event broadcast channel. Slow subscribers past this
/// lag must resynchronize from the historical log.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OpenEscrow";

//! Constants for the download module (timeouts, streaming).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for slow mirrors).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Largest slice of the response body written to disk per write call (8 KiB).
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Longest file name shown next to a progress bar, in characters.
pub const DISPLAY_NAME_MAX_CHARS: usize = 30;

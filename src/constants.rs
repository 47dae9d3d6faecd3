//! Shared constants/setters for things
//!

/// File name offered when downloading the rendered greeting.
pub const DOWNLOAD_FILE_NAME: &str = "greeting_image.png";

/// MIME type of the rendered greeting.
pub const OUTPUT_MIME_TYPE: &str = "image/png";

/// Uploads larger than this are rejected before they reach the handler.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// The output file is rewritten on every render, so clients must revalidate.
pub const OUTPUT_CACHE_CONTROL: &str = "no-cache";

/// Minutes of inactivity before a session (draft and selection) is dropped.
pub const SESSION_IDLE_MINUTES: i64 = 60;

/// Seconds between sweeps of expired sessions.
pub const SESSION_SWEEP_SECS: u64 = 60;

#[cfg(test)]
/// Greeting used by the stub generator in tests
pub const TEST_GREETING: &str = "Wishing you a wonderful Diwali!";

// LobbyScout - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "LobbyScout";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "LobbyScout";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Log location
// =============================================================================

/// Subdirectory of the game install directory holding one folder per session.
pub const LOGS_DIR_NAME: &str = "Logs";

/// Token in a session directory name that precedes the shared date-stamp
/// prefix, e.g. `log_2024.01.01_10-00-00_0.14.0.1234`.
pub const SESSION_DIR_MARKER: &str = "log_";

/// Suffix appended to the date-stamp prefix to form the data file name.
pub const APPLICATION_LOG_SUFFIX: &str = " application.log";

// =============================================================================
// Live tail
// =============================================================================

/// Default wait between read attempts once the tail has drained the file (ms).
pub const DEFAULT_TAIL_POLL_INTERVAL_MS: u64 = 1_000;

/// Minimum user-configurable tail poll interval (ms).
pub const MIN_TAIL_POLL_INTERVAL_MS: u64 = 10;

/// Maximum user-configurable tail poll interval (ms).
pub const MAX_TAIL_POLL_INTERVAL_MS: u64 = 60_000;

/// Consecutive end-of-stream observations tolerated before the locator is
/// consulted for a newer session. The probe fires when the counter exceeds
/// this value, i.e. on the 31st empty read with the default.
pub const DEFAULT_ROTATION_CHECK_THRESHOLD: u32 = 30;

/// Minimum user-configurable rotation check threshold.
pub const MIN_ROTATION_CHECK_THRESHOLD: u32 = 1;

/// Maximum user-configurable rotation check threshold.
pub const MAX_ROTATION_CHECK_THRESHOLD: u32 = 10_000;

/// Capacity of the bounded channel used when tailed lines are handed to
/// another task instead of being processed inline.
pub const TAIL_CHANNEL_CAPACITY: usize = 64;

/// Longest unterminated fragment held back waiting for its newline. A
/// fragment that reaches this size is emitted as a line on its own.
pub const MAX_PENDING_LINE_BYTES: usize = 64 * 1024;

/// Content substituted for a line whose bytes are not valid UTF-8.
pub const DECODE_ERROR_SENTINEL: &str = "DECODE_ERROR";

// =============================================================================
// Network
// =============================================================================

/// Default IP-to-country service. The address is appended as a path segment.
pub const DEFAULT_GEOLOCATION_BASE_URL: &str = "http://ip-api.com/json";

/// Default per-request timeout for the geolocation and webhook calls (seconds).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Minimum user-configurable request timeout (seconds).
pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;

/// Maximum user-configurable request timeout (seconds).
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Value of the `status` field the geolocation service returns on success.
pub const GEOLOCATION_SUCCESS_STATUS: &str = "success";

/// Notification field label for the lobby short ID.
pub const LOBBY_ID_FIELD_NAME: &str = "Lobby ID";

/// Notification field label for the resolved country.
pub const COUNTRY_FIELD_NAME: &str = "Country";

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum length of a log line included in debug output.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

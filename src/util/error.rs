// LobbyScout - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation; every variant keeps its cause so the
// full chain can be logged.
//
// Two conditions from the error taxonomy never appear here:
//   - an undecodable line is the `LineContent::Malformed` sentinel, and
//   - a line that does not describe a lobby is simply `None`.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all LobbyScout operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum LobbyScoutError {
    /// No session log could be located.
    Locate(LocateError),

    /// The session log could not be opened or read.
    Tail(TailError),

    /// The IP-to-country lookup failed.
    Lookup(LookupError),

    /// The webhook notification could not be delivered.
    Notify(NotifyError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// A built-in line pattern failed to compile.
    Pattern {
        pattern: &'static str,
        source: regex::Error,
    },
}

impl fmt::Display for LobbyScoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locate(e) => write!(f, "Log location error: {e}"),
            Self::Tail(e) => write!(f, "Tail error: {e}"),
            Self::Lookup(e) => write!(f, "Geolocation error: {e}"),
            Self::Notify(e) => write!(f, "Notification error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Pattern { pattern, source } => {
                write!(f, "Invalid line pattern '{pattern}': {source}")
            }
        }
    }
}

impl std::error::Error for LobbyScoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Locate(e) => Some(e),
            Self::Tail(e) => Some(e),
            Self::Lookup(e) => Some(e),
            Self::Notify(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Pattern { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Locate errors
// ---------------------------------------------------------------------------

/// Errors produced while resolving the session log currently being written.
#[derive(Debug)]
pub enum LocateError {
    /// The logs root could not be enumerated.
    LogsRootUnreadable { path: PathBuf, source: io::Error },

    /// The logs root holds no session directory.
    NoSessionDirectory { root: PathBuf },
}

impl fmt::Display for LocateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LogsRootUnreadable { path, source } => {
                write!(f, "Cannot read logs directory '{}': {source}", path.display())
            }
            Self::NoSessionDirectory { root } => write!(
                f,
                "No log directories in '{}'. Start the game before starting LobbyScout.",
                root.display()
            ),
        }
    }
}

impl std::error::Error for LocateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::LogsRootUnreadable { source, .. } => Some(source),
            Self::NoSessionDirectory { .. } => None,
        }
    }
}

impl From<LocateError> for LobbyScoutError {
    fn from(e: LocateError) -> Self {
        Self::Locate(e)
    }
}

// ---------------------------------------------------------------------------
// Tail errors
// ---------------------------------------------------------------------------

/// Errors opening or reading the tailed log file.
#[derive(Debug)]
pub enum TailError {
    /// The file does not exist or could not be opened for shared reading.
    Open { path: PathBuf, source: io::Error },

    /// A read on an already-open handle failed.
    Read { path: PathBuf, source: io::Error },
}

impl fmt::Display for TailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "Cannot open '{}': {source}", path.display())
            }
            Self::Read { path, source } => {
                write!(f, "Read error on '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for TailError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Read { source, .. } => Some(source),
        }
    }
}

impl From<TailError> for LobbyScoutError {
    fn from(e: TailError) -> Self {
        Self::Tail(e)
    }
}

// ---------------------------------------------------------------------------
// Lookup errors
// ---------------------------------------------------------------------------

/// Errors from the IP-to-country service.
#[derive(Debug)]
pub enum LookupError {
    /// The request could not be sent, timed out, or the body was not JSON.
    Http(reqwest::Error),

    /// The service answered but reported a non-success status.
    Unsuccessful { ip: String, message: String },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "request failed: {e}"),
            Self::Unsuccessful { ip, message } => {
                write!(f, "unsuccessful query for {ip}: {message}")
            }
        }
    }
}

impl std::error::Error for LookupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Unsuccessful { .. } => None,
        }
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<LookupError> for LobbyScoutError {
    fn from(e: LookupError) -> Self {
        Self::Lookup(e)
    }
}

// ---------------------------------------------------------------------------
// Notify errors
// ---------------------------------------------------------------------------

/// Errors delivering a webhook notification.
#[derive(Debug)]
pub enum NotifyError {
    /// The request could not be sent or timed out.
    Http(reqwest::Error),

    /// The endpoint answered with a non-success HTTP status.
    Rejected { status: u16 },
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "webhook request failed: {e}"),
            Self::Rejected { status } => write!(f, "webhook rejected message (HTTP {status})"),
        }
    }
}

impl std::error::Error for NotifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Rejected { .. } => None,
        }
    }
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<NotifyError> for LobbyScoutError {
    fn from(e: NotifyError) -> Self {
        Self::Notify(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// No config file exists at any of the searched locations.
    NotFound { searched: Vec<PathBuf> },

    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A required field is absent or empty.
    MissingField { field: &'static str },

    /// A config value is present but unusable.
    InvalidValue { field: &'static str, reason: String },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { searched } => {
                let paths: Vec<String> =
                    searched.iter().map(|p| p.display().to_string()).collect();
                write!(f, "No config found. Searched: {}", paths.join(", "))
            }
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::MissingField { field } => {
                write!(f, "Config is missing required field '{field}'")
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Config '{field}' is invalid: {reason}")
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for LobbyScoutError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// LobbyScout - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no platform
// dependencies. These types are the shared vocabulary across all layers.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};

// =============================================================================
// Log source
// =============================================================================

/// One resolved instance of the game's session log.
///
/// Immutable once resolved. The locator produces a fresh value every time a
/// rotation is suspected; two sources are the same file when their paths
/// are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSource {
    /// Full path to the `<prefix> application.log` data file.
    pub path: PathBuf,

    /// Creation time of the session directory containing the file.
    pub dir_created: DateTime<Utc>,
}

impl LogSource {
    /// Returns `true` when `other` refers to the same file on disk.
    pub fn same_file(&self, other: &LogSource) -> bool {
        self.path == other.path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// =============================================================================
// Tailed lines
// =============================================================================

/// The payload of one line read from the session log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineContent {
    /// Decoded line with its terminator removed.
    Text(String),

    /// The line's bytes were not valid UTF-8. Stands in for exactly one line
    /// so the stream keeps going.
    Malformed,
}

/// A single line produced by the tail engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailedLine {
    pub content: LineContent,

    /// `false` for every line read before end-of-stream was first reached on
    /// the current file, `true` for every line after. Every line of a file
    /// switched to because a newer session directory appeared is `true`.
    pub is_live: bool,
}

impl TailedLine {
    pub fn text(content: impl Into<String>, is_live: bool) -> Self {
        Self {
            content: LineContent::Text(content.into()),
            is_live,
        }
    }

    pub fn malformed(is_live: bool) -> Self {
        Self {
            content: LineContent::Malformed,
            is_live,
        }
    }

    /// Decoded text, or `None` for the malformed-line sentinel.
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            LineContent::Text(s) => Some(s),
            LineContent::Malformed => None,
        }
    }
}

impl fmt::Display for TailedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.content {
            LineContent::Text(s) => f.write_str(s),
            LineContent::Malformed => f.write_str(crate::util::constants::DECODE_ERROR_SENTINEL),
        }
    }
}

// =============================================================================
// Lobby events
// =============================================================================

/// A matchmaking lobby assignment parsed from a log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyEvent {
    /// Wall-clock time written by the game at the start of the line.
    pub time: NaiveDateTime,

    /// Address of the game server, exactly as written in the log.
    pub ip: String,

    /// Four-character lobby short ID.
    pub lobby_id: String,
}

/// A lobby event whose server address has been resolved to a country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedLobby {
    pub event: LobbyEvent,
    pub country: String,
}

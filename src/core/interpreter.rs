// LobbyScout - core/interpreter.rs
//
// Extracts lobby assignments from raw log lines.
//
// The game logs a matchmaking assignment as a single line of the shape
//
//   2024-01-01 10:00:00.123|...|Status: Busy, Ip: 203.0.113.5, ... shortId: AB12 ...
//
// Everything else in the log is noise: a line that does not match yields
// `None`, never an error. A line whose timestamp cannot be turned into a
// calendar date-time (e.g. month 13) is treated the same way.

use crate::core::model::{LobbyEvent, TailedLine};
use chrono::NaiveDateTime;
use regex::Regex;

/// Pattern for a lobby assignment line.
///
/// Groups: 1 = leading date-time, 2 = server address, 3 = lobby short ID.
pub const LOBBY_LINE_PATTERN: &str = r"^(\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:[.,]\d+)?).*Status: Busy, Ip: ([^,]+).*shortId: (.{4})";

/// Timestamp layout after normalising the date/time separator to a space.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Compiled lobby-line matcher.
#[derive(Debug, Clone)]
pub struct LineInterpreter {
    pattern: Regex,
}

impl LineInterpreter {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(LOBBY_LINE_PATTERN)?,
        })
    }

    /// Parse a tailed line. The malformed-line sentinel never matches.
    pub fn interpret_line(&self, line: &TailedLine) -> Option<LobbyEvent> {
        line.as_text().and_then(|text| self.interpret(text))
    }

    /// Parse one line of text into a lobby event.
    pub fn interpret(&self, line: &str) -> Option<LobbyEvent> {
        let caps = self.pattern.captures(line)?;

        let raw_time = caps.get(1)?.as_str();
        let time = match parse_timestamp(raw_time) {
            Some(t) => t,
            None => {
                tracing::debug!(raw = raw_time, "Lobby line with unparseable timestamp");
                return None;
            }
        };

        Some(LobbyEvent {
            time,
            ip: caps.get(2)?.as_str().trim().to_string(),
            lobby_id: caps.get(3)?.as_str().to_string(),
        })
    }
}

/// Parse `2024-01-01T10:00:00`, `2024-01-01 10:00:00.123` or the
/// comma-fraction variant `2024-01-01 10:00:00,123`.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let normalised = raw.trim().replacen('T', " ", 1).replace(',', ".");
    NaiveDateTime::parse_from_str(&normalised, TIMESTAMP_FORMAT).ok()
}

// LobbyScout - platform/fs.rs
//
// Shared-access, read-only line reader for a file another process is
// actively writing.
//
// The game keeps its session log open for the whole session. The handle
// opened here must never lock it:
//   - Windows: the file is opened with FILE_SHARE_READ | FILE_SHARE_WRITE |
//     FILE_SHARE_DELETE so the writer can keep appending, and may delete or
//     rename the file, while we hold it.
//   - Other platforms: a plain read-only open takes no lock, so the default
//     open mode already has these semantics.
//
// Decoding: each line is decoded as UTF-8 on its own. A line that fails to
// decode becomes a single `LineContent::Malformed` and reading resumes at the
// byte after its terminator.
//
// Incomplete lines: bytes after the last '\n' belong to a line the writer has
// not finished. They are held back and reported as end-of-stream until the
// terminator arrives, so a line is never split in two. The one exception is a
// fragment that reaches `MAX_PENDING_LINE_BYTES`, which is emitted as is.

use crate::core::model::LineContent;
use crate::util::constants;
use crate::util::error::TailError;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

#[cfg(windows)]
const FILE_SHARE_READ: u32 = 0x0000_0001;
#[cfg(windows)]
const FILE_SHARE_WRITE: u32 = 0x0000_0002;
#[cfg(windows)]
const FILE_SHARE_DELETE: u32 = 0x0000_0004;

/// Result of one read attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete line.
    Line(LineContent),
    /// Nothing more to read right now.
    EndOfStream,
}

/// Streaming line reader over a shared-access file handle.
#[derive(Debug)]
pub struct SharedReader {
    path: PathBuf,
    reader: BufReader<File>,
    /// Bytes of a line whose terminator has not been written yet.
    pending: Vec<u8>,
}

impl SharedReader {
    /// Open `path` for reading without blocking or disrupting its writer.
    pub fn open(path: &Path) -> Result<Self, TailError> {
        let file = shared_open_options()
            .open(path)
            .map_err(|source| TailError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(file = %path.display(), "Opened log file for shared reading");

        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            pending: Vec::new(),
        })
    }

    /// Read the next complete line.
    ///
    /// A read error leaves any partially collected bytes in place so the
    /// line can still complete on a later call. Bytes without a terminator
    /// are held back until `MAX_PENDING_LINE_BYTES` have collected; at that
    /// point they are returned as a line of their own.
    pub fn read_line(&mut self) -> Result<ReadOutcome, TailError> {
        let room = constants::MAX_PENDING_LINE_BYTES.saturating_sub(self.pending.len()) as u64;
        (&mut self.reader)
            .take(room)
            .read_until(b'\n', &mut self.pending)
            .map_err(|source| TailError::Read {
                path: self.path.clone(),
                source,
            })?;

        if !self.pending.ends_with(b"\n") {
            if self.pending.len() < constants::MAX_PENDING_LINE_BYTES {
                return Ok(ReadOutcome::EndOfStream);
            }
            tracing::warn!(
                file = %self.path.display(),
                bytes = self.pending.len(),
                "Unterminated line hit the length cap, emitting it as is"
            );
        }

        let bytes = std::mem::take(&mut self.pending);
        Ok(ReadOutcome::Line(decode_line(bytes)))
    }

    /// Take the held-back incomplete line, if any.
    ///
    /// Used when the writer has moved on to a new file and the unterminated
    /// tail of this one will never be completed.
    pub fn take_partial(&mut self) -> Option<LineContent> {
        if self.pending.is_empty() {
            return None;
        }
        Some(decode_line(std::mem::take(&mut self.pending)))
    }
}

#[cfg(windows)]
fn shared_open_options() -> OpenOptions {
    use std::os::windows::fs::OpenOptionsExt;

    let mut options = OpenOptions::new();
    options
        .read(true)
        .share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE);
    options
}

#[cfg(not(windows))]
fn shared_open_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.read(true);
    options
}

/// Strip the line terminator (and a leading byte-order mark) and decode.
fn decode_line(mut bytes: Vec<u8>) -> LineContent {
    if bytes.ends_with(b"\n") {
        bytes.pop();
        if bytes.ends_with(b"\r") {
            bytes.pop();
        }
    }
    if bytes.starts_with(b"\xEF\xBB\xBF") {
        bytes.drain(..3);
    }

    match String::from_utf8(bytes) {
        Ok(text) => LineContent::Text(text),
        Err(e) => {
            tracing::warn!(
                valid_up_to = e.utf8_error().valid_up_to(),
                "Skipped line because of decode error"
            );
            LineContent::Malformed
        }
    }
}

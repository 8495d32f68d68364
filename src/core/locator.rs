// LobbyScout - core/locator.rs
//
// Finds the session log the game is currently writing.
//
// The game creates one directory per client session under `<install>/Logs`,
// named `log_<prefix>`, and writes `<prefix> application.log` inside it. The
// newest session is the directory with the greatest creation time.
//
// Tie-break: when several directories share the greatest creation time the
// first one yielded by the directory listing wins. Listing order is whatever
// the OS returns and is not stable across platforms.
//
// Creation time is preferred whenever any candidate reports one. Modification
// time is only used when none does (file systems without birth time). A
// directory's mtime moves whenever the game adds a file to it, so under that
// fallback an older session can briefly rank as the newest.
//
// Only metadata is read here; the data file is never opened.

use crate::core::model::LogSource;
use crate::util::constants::{APPLICATION_LOG_SUFFIX, SESSION_DIR_MARKER};
use crate::util::error::LocateError;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::SystemTime;

/// Resolves the log file currently being written by the game.
///
/// The tail engine calls this once at startup and again on every rotation
/// probe, so implementations should be cheap enough to run every ~30 s.
pub trait LogLocator {
    fn locate(&self) -> Result<LogSource, LocateError>;
}

/// Locator for the game's `Logs/log_<prefix>/<prefix> application.log` layout.
#[derive(Debug, Clone)]
pub struct SessionLogLocator {
    logs_root: PathBuf,
}

impl SessionLogLocator {
    pub fn new(logs_root: impl Into<PathBuf>) -> Self {
        Self {
            logs_root: logs_root.into(),
        }
    }
}

impl LogLocator for SessionLogLocator {
    fn locate(&self) -> Result<LogSource, LocateError> {
        let mut candidates = Vec::new();

        let walker = walkdir::WalkDir::new(&self.logs_root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false);

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) if e.depth() == 0 => {
                    return Err(LocateError::LogsRootUnreadable {
                        path: self.logs_root.clone(),
                        source: e
                            .into_io_error()
                            .unwrap_or_else(|| std::io::Error::other("directory loop")),
                    });
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Locator: skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            let Some(dir_name) = entry.file_name().to_str() else {
                continue;
            };
            let Some(file_name) = session_log_name(dir_name) else {
                tracing::trace!(dir = dir_name, "Locator: not a session directory");
                continue;
            };

            let meta = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    tracing::debug!(dir = dir_name, error = %e, "Locator: metadata error");
                    continue;
                }
            };

            candidates.push(Candidate {
                created: meta.created().ok(),
                modified: meta.modified().ok(),
                file: entry.path().join(file_name),
            });
        }

        let (file, stamp) = newest(candidates).ok_or_else(|| LocateError::NoSessionDirectory {
            root: self.logs_root.clone(),
        })?;

        let source = LogSource {
            path: file,
            dir_created: DateTime::<Utc>::from(stamp),
        };
        tracing::debug!(file = %source.path.display(), "Locator: newest session log");
        Ok(source)
    }
}

/// A session directory seen during one scan.
#[derive(Debug)]
struct Candidate {
    file: PathBuf,
    created: Option<SystemTime>,
    modified: Option<SystemTime>,
}

/// Pick the newest candidate in listing order.
///
/// Ranks by creation time when any candidate has one, otherwise by
/// modification time. Candidates with no usable timestamp are ignored.
/// Strictly greater wins, so the first of equal timestamps is kept.
fn newest(candidates: Vec<Candidate>) -> Option<(PathBuf, SystemTime)> {
    let by_created = candidates.iter().any(|c| c.created.is_some());
    if !by_created {
        tracing::debug!("Locator: no creation times, ranking by modification time");
    }

    let mut best: Option<(PathBuf, SystemTime)> = None;
    for c in candidates {
        let stamp = if by_created { c.created } else { c.modified };
        let Some(stamp) = stamp else {
            continue;
        };
        if best.as_ref().map_or(true, |(_, t)| stamp > *t) {
            best = Some((c.file, stamp));
        }
    }
    best
}

/// Derive the data file name from a session directory name.
///
/// `log_2024.01.01_10-00-00_0.14.0.1234` becomes
/// `2024.01.01_10-00-00_0.14.0.1234 application.log`. Returns `None` when the
/// name does not contain the session marker.
pub fn session_log_name(dir_name: &str) -> Option<String> {
    let (_, prefix) = dir_name.split_once(SESSION_DIR_MARKER)?;
    Some(format!("{prefix}{APPLICATION_LOG_SUFFIX}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;

    fn make_session(root: &Path, prefix: &str) -> PathBuf {
        let dir = root.join(format!("log_{prefix}"));
        fs::create_dir(&dir).unwrap();
        let file = dir.join(format!("{prefix} application.log"));
        fs::write(&file, "").unwrap();
        file
    }

    #[test]
    fn derives_file_name_from_directory_name() {
        assert_eq!(
            session_log_name("log_2024.01.01_10-00-00_0.14.0.1234").as_deref(),
            Some("2024.01.01_10-00-00_0.14.0.1234 application.log")
        );
        assert_eq!(session_log_name("crashes"), None);
    }

    #[test]
    fn picks_most_recently_created_directory() {
        let tmp = tempfile::tempdir().unwrap();
        make_session(tmp.path(), "2024.01.01_10-00-00_1");
        std::thread::sleep(Duration::from_millis(50));
        let newest = make_session(tmp.path(), "2023.12.31_09-00-00_0");

        let source = SessionLogLocator::new(tmp.path()).locate().unwrap();
        assert_eq!(source.path, newest);
    }

    #[test]
    fn ignores_files_and_unrelated_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let session = make_session(tmp.path(), "2024.01.01_10-00-00_1");
        std::thread::sleep(Duration::from_millis(50));
        fs::create_dir(tmp.path().join("crashes")).unwrap();
        fs::write(tmp.path().join("log_stray.txt"), "x").unwrap();

        let source = SessionLogLocator::new(tmp.path()).locate().unwrap();
        assert_eq!(source.path, session);
    }

    #[test]
    fn does_not_require_the_data_file_to_exist() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("log_2024.02.02_00-00-00_9")).unwrap();

        let source = SessionLogLocator::new(tmp.path()).locate().unwrap();
        assert!(source.path.ends_with("2024.02.02_00-00-00_9 application.log"));
        assert!(!source.path.exists());
    }

    fn at(secs: u64) -> Option<SystemTime> {
        Some(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    }

    fn candidate(name: &str, created: Option<SystemTime>, modified: Option<SystemTime>) -> Candidate {
        Candidate {
            file: PathBuf::from(name),
            created,
            modified,
        }
    }

    #[test]
    fn creation_time_outranks_a_fresher_modification_time() {
        let picked = newest(vec![
            candidate("older", at(100), at(900)),
            candidate("newer", at(200), at(300)),
        ]);
        assert_eq!(picked, Some((PathBuf::from("newer"), at(200).unwrap())));
    }

    #[test]
    fn candidates_without_creation_time_are_skipped_when_others_have_one() {
        let picked = newest(vec![
            candidate("mtime only", None, at(900)),
            candidate("created", at(100), at(100)),
        ]);
        assert_eq!(picked, Some((PathBuf::from("created"), at(100).unwrap())));
    }

    #[test]
    fn modification_time_is_used_when_no_creation_time_exists() {
        let picked = newest(vec![
            candidate("a", None, at(100)),
            candidate("b", None, at(300)),
            candidate("c", None, None),
        ]);
        assert_eq!(picked, Some((PathBuf::from("b"), at(300).unwrap())));
    }

    #[test]
    fn first_listed_wins_a_tie() {
        let picked = newest(vec![
            candidate("first", at(100), None),
            candidate("second", at(100), None),
        ]);
        assert_eq!(picked.map(|(p, _)| p), Some(PathBuf::from("first")));
    }

    #[test]
    fn empty_root_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let result = SessionLogLocator::new(tmp.path()).locate();
        assert!(
            matches!(result, Err(LocateError::NoSessionDirectory { .. })),
            "expected NoSessionDirectory, got {result:?}"
        );
    }

    #[test]
    fn missing_root_is_unreadable() {
        let tmp = tempfile::tempdir().unwrap();
        let result = SessionLogLocator::new(tmp.path().join("nope")).locate();
        assert!(
            matches!(result, Err(LocateError::LogsRootUnreadable { .. })),
            "expected LogsRootUnreadable, got {result:?}"
        );
    }
}

// LobbyScout - app/tail.rs
//
// Live tail of the game's session log, with rotation detection.
//
// Architecture:
//   - `TailEngine` is a synchronous state machine. Each `step()` makes one
//     read attempt on the current handle and returns either a line or `Idle`.
//   - `run_tail` is the async driver. It forwards lines to a `LineSink` and
//     sleeps the poll interval whenever the engine reports `Idle`. It runs
//     until its `CancellationToken` is cancelled or the sink closes.
//
// States (per step):
//   READING   a line was available: emit it, reset the empty-read counter.
//   DRAINED   end-of-stream: mark the file as scanned through, count the empty
//             read, report Idle so the driver waits before retrying.
//   ROTATING  entered from DRAINED once the counter exceeds the threshold:
//             ask the locator for the newest session log. A different path
//             that opens successfully replaces the current handle; anything
//             else (same path, locate error, open error) means "no rotation
//             yet". The counter resets either way.
//
// Live/historical tagging:
//   - Lines of a file are historical until end-of-stream is first reached on
//     it, live afterwards. `scanned_through_file` resets on every switch.
//   - Exception: a file adopted through rotation whose session directory was
//     created after the current one's is a new session, so every line in it
//     is live. A switch to a session that is not newer (the newest directory
//     was deleted, or a tie listed in another order) keeps the normal rule,
//     so its history is not replayed as live.
//
// Ordering: a rotation probe only runs after repeated empty reads, so the old
// handle is always fully drained first. An unterminated final line of the old
// file is flushed before the first line of the new one.

use crate::core::locator::LogLocator;
use crate::core::model::{LogSource, TailedLine};
use crate::platform::fs::{ReadOutcome, SharedReader};
use crate::util::constants;
use crate::util::error::LobbyScoutError;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// =============================================================================
// Settings
// =============================================================================

/// Timing knobs for the tail loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailSettings {
    /// Wait after every empty read before the next attempt.
    pub poll_interval: Duration,
    /// A rotation probe runs when the consecutive empty-read count exceeds
    /// this value.
    pub rotation_check_threshold: u32,
}

impl Default for TailSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(constants::DEFAULT_TAIL_POLL_INTERVAL_MS),
            rotation_check_threshold: constants::DEFAULT_ROTATION_CHECK_THRESHOLD,
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Outcome of a single engine step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A line is ready for the consumer.
    Line(TailedLine),
    /// Nothing to read; the driver should wait before stepping again.
    Idle,
}

/// How the current file was adopted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Opened at startup, or rotated to a session that is not newer.
    Existing,
    /// Rotated to a session created after the previous one.
    NewSession,
}

/// Single-owner tail state machine over one session log at a time.
pub struct TailEngine<L> {
    locator: L,
    source: LogSource,
    reader: SharedReader,
    origin: Origin,
    /// True once end-of-stream has been reached on the current handle.
    scanned_through_file: bool,
    /// Consecutive end-of-stream observations since the last line or probe.
    empty_reads: u32,
    rotation_check_threshold: u32,
    /// Unterminated last line of a rotated-out file, emitted before anything
    /// from the new file.
    carried: Option<TailedLine>,
}

impl<L: LogLocator> TailEngine<L> {
    /// Locate and open the current session log.
    ///
    /// Failure here is fatal: there is nothing to tail yet.
    pub fn start(locator: L, settings: &TailSettings) -> Result<Self, LobbyScoutError> {
        let source = locator.locate()?;
        let reader = SharedReader::open(source.path())?;

        tracing::info!(file = %source.path.display(), "Tailing session log");

        Ok(Self {
            locator,
            source,
            reader,
            origin: Origin::Existing,
            scanned_through_file: false,
            empty_reads: 0,
            rotation_check_threshold: settings.rotation_check_threshold,
            carried: None,
        })
    }

    /// The session log currently being read.
    pub fn source(&self) -> &LogSource {
        &self.source
    }

    /// True once the current file has been read through to its end.
    pub fn is_caught_up(&self) -> bool {
        self.scanned_through_file
    }

    /// Make one read attempt.
    pub fn step(&mut self) -> Step {
        if let Some(line) = self.carried.take() {
            return Step::Line(line);
        }

        match self.reader.read_line() {
            Ok(ReadOutcome::Line(content)) => {
                self.empty_reads = 0;
                let line = TailedLine {
                    content,
                    is_live: self.is_live(),
                };
                tracing::trace!(
                    live = line.is_live,
                    line = preview(line.as_text().unwrap_or(constants::DECODE_ERROR_SENTINEL)),
                    "Tail: read"
                );
                Step::Line(line)
            }
            Ok(ReadOutcome::EndOfStream) => self.drained(),
            Err(e) => {
                tracing::warn!(error = %e, "Tail: read failed, treating as end of stream");
                self.drained()
            }
        }
    }

    fn drained(&mut self) -> Step {
        if !self.scanned_through_file {
            self.scanned_through_file = true;
            tracing::info!(
                file = %self.source.path.display(),
                "Caught up with session log"
            );
        }

        self.empty_reads = self.empty_reads.saturating_add(1);
        if self.empty_reads > self.rotation_check_threshold {
            self.empty_reads = 0;
            self.probe_rotation();
        }

        Step::Idle
    }

    fn probe_rotation(&mut self) {
        let candidate = match self.locator.locate() {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!(error = %e, "Tail: rotation probe could not locate a log");
                return;
            }
        };

        if candidate.same_file(&self.source) {
            tracing::debug!("Tail: no new log file");
            return;
        }

        // The game creates the directory slightly before the file is
        // readable; a failed open is retried on the next probe.
        let reader = match SharedReader::open(candidate.path()) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, "Tail: new log file not readable yet");
                return;
            }
        };

        if let Some(content) = self.reader.take_partial() {
            self.carried = Some(TailedLine {
                content,
                is_live: self.is_live(),
            });
        }

        let origin = if candidate.dir_created > self.source.dir_created {
            Origin::NewSession
        } else {
            Origin::Existing
        };

        tracing::info!(
            old = %self.source.path.display(),
            new = %candidate.path.display(),
            new_session = origin == Origin::NewSession,
            "Session log rotated, switching files"
        );

        // The old handle is dropped only now, after the new one is open.
        self.reader = reader;
        self.source = candidate;
        self.origin = origin;
        self.scanned_through_file = false;
    }

    fn is_live(&self) -> bool {
        self.origin == Origin::NewSession || self.scanned_through_file
    }
}

fn preview(line: &str) -> &str {
    match line.char_indices().nth(constants::DEBUG_MAX_LINE_PREVIEW) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

// =============================================================================
// Driver
// =============================================================================

/// Whether a sink wants more lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkStatus {
    Continue,
    Closed,
}

/// Consumer of tailed lines.
///
/// The driver awaits `accept` before reading the next line, so a sink that
/// does its work inline gets strictly sequential, one-at-a-time delivery.
pub trait LineSink {
    fn accept(&mut self, line: TailedLine) -> impl Future<Output = SinkStatus>;
}

/// Bounded hand-off to another task. Closes when the receiver is dropped.
impl LineSink for mpsc::Sender<TailedLine> {
    async fn accept(&mut self, line: TailedLine) -> SinkStatus {
        match self.send(line).await {
            Ok(()) => SinkStatus::Continue,
            Err(_) => SinkStatus::Closed,
        }
    }
}

/// Bounded channel sized for tail hand-off.
pub fn line_channel() -> (mpsc::Sender<TailedLine>, mpsc::Receiver<TailedLine>) {
    mpsc::channel(constants::TAIL_CHANNEL_CAPACITY)
}

/// Drive `engine` until `cancel` fires or `sink` closes.
///
/// Waits `poll_interval` after every empty read. An in-flight wait or sink
/// call is abandoned as soon as `cancel` fires.
pub async fn run_tail<L, S>(
    mut engine: TailEngine<L>,
    sink: &mut S,
    poll_interval: Duration,
    cancel: CancellationToken,
) where
    L: LogLocator,
    S: LineSink,
{
    loop {
        if cancel.is_cancelled() {
            break;
        }

        match engine.step() {
            Step::Line(line) => {
                let status = tokio::select! {
                    _ = cancel.cancelled() => break,
                    status = sink.accept(line) => status,
                };
                if status == SinkStatus::Closed {
                    tracing::debug!("Tail: sink closed");
                    break;
                }
            }
            Step::Idle => {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(poll_interval) => {}
                }
            }
        }
    }

    tracing::info!(file = %engine.source().path.display(), "Tail stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::LineContent;
    use crate::util::error::LocateError;
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    /// Locator whose answer the test controls.
    #[derive(Clone)]
    struct ScriptedLocator {
        current: Rc<RefCell<Option<LogSource>>>,
        calls: Rc<RefCell<u32>>,
    }

    /// Session directory created at 10:`minute` on the test day.
    fn session(path: &Path, minute: u32) -> LogSource {
        LogSource {
            path: path.to_path_buf(),
            dir_created: Utc.with_ymd_and_hms(2024, 1, 1, 10, minute, 0).unwrap(),
        }
    }

    impl ScriptedLocator {
        fn new(path: &Path) -> Self {
            Self {
                current: Rc::new(RefCell::new(Some(session(path, 10)))),
                calls: Rc::new(RefCell::new(0)),
            }
        }

        /// Report `path` as a session newer than the startup one.
        fn point_at(&self, path: &Path) {
            *self.current.borrow_mut() = Some(session(path, 20));
        }

        /// Report `path` as a session older than the startup one.
        fn point_at_older(&self, path: &Path) {
            *self.current.borrow_mut() = Some(session(path, 0));
        }

        fn calls(&self) -> u32 {
            *self.calls.borrow()
        }
    }

    impl LogLocator for ScriptedLocator {
        fn locate(&self) -> Result<LogSource, LocateError> {
            *self.calls.borrow_mut() += 1;
            self.current
                .borrow()
                .clone()
                .ok_or_else(|| LocateError::NoSessionDirectory {
                    root: PathBuf::from("Logs"),
                })
        }
    }

    fn settings(threshold: u32) -> TailSettings {
        TailSettings {
            poll_interval: Duration::from_millis(5),
            rotation_check_threshold: threshold,
        }
    }

    fn append(path: &Path, text: &str) {
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        f.write_all(text.as_bytes()).unwrap();
    }

    fn expect_line(engine: &mut TailEngine<ScriptedLocator>, text: &str, live: bool) {
        assert_eq!(engine.step(), Step::Line(TailedLine::text(text, live)));
    }

    #[test]
    fn start_fails_without_session_directory() {
        let locator = ScriptedLocator::new(Path::new("unused"));
        *locator.current.borrow_mut() = None;
        let result = TailEngine::start(locator, &settings(30));
        assert!(matches!(result, Err(LobbyScoutError::Locate(_))));
    }

    #[test]
    fn start_fails_when_file_cannot_be_opened() {
        let tmp = tempfile::tempdir().unwrap();
        let locator = ScriptedLocator::new(&tmp.path().join("missing.log"));
        let result = TailEngine::start(locator, &settings(30));
        assert!(matches!(result, Err(LobbyScoutError::Tail(_))));
    }

    #[test]
    fn lines_before_first_end_of_stream_are_historical() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("a.log");
        append(&log, "old 1\nold 2\n");

        let mut engine = TailEngine::start(ScriptedLocator::new(&log), &settings(30)).unwrap();
        expect_line(&mut engine, "old 1", false);
        expect_line(&mut engine, "old 2", false);
        assert!(!engine.is_caught_up());
        assert_eq!(engine.step(), Step::Idle);
        assert!(engine.is_caught_up());

        append(&log, "new 1\n");
        expect_line(&mut engine, "new 1", true);
    }

    #[test]
    fn bursts_with_pauses_stay_live() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("a.log");
        append(&log, "history\n");

        let mut engine = TailEngine::start(ScriptedLocator::new(&log), &settings(30)).unwrap();
        expect_line(&mut engine, "history", false);

        for burst in 0..3 {
            for _ in 0..5 {
                assert_eq!(engine.step(), Step::Idle);
            }
            append(&log, &format!("burst {burst} a\nburst {burst} b\n"));
            expect_line(&mut engine, &format!("burst {burst} a"), true);
            expect_line(&mut engine, &format!("burst {burst} b"), true);
        }
    }

    #[test]
    fn rotation_probe_runs_once_threshold_is_exceeded() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("a.log");
        append(&log, "");
        let locator = ScriptedLocator::new(&log);

        let mut engine = TailEngine::start(locator.clone(), &settings(30)).unwrap();
        assert_eq!(locator.calls(), 1);

        for _ in 0..30 {
            assert_eq!(engine.step(), Step::Idle);
        }
        assert_eq!(locator.calls(), 1, "no probe within the threshold");

        assert_eq!(engine.step(), Step::Idle);
        assert_eq!(locator.calls(), 2, "31st empty read probes");

        for _ in 0..31 {
            engine.step();
        }
        assert_eq!(locator.calls(), 3, "counter restarts after a probe");
    }

    #[test]
    fn a_line_resets_the_empty_read_counter() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("a.log");
        append(&log, "");
        let locator = ScriptedLocator::new(&log);
        let mut engine = TailEngine::start(locator.clone(), &settings(3)).unwrap();

        for _ in 0..3 {
            engine.step();
        }
        append(&log, "x\n");
        expect_line(&mut engine, "x", true);
        for _ in 0..3 {
            engine.step();
        }
        assert_eq!(locator.calls(), 1);
        engine.step();
        assert_eq!(locator.calls(), 2);
    }

    #[test]
    fn switches_to_new_file_after_rotation() {
        let tmp = tempfile::tempdir().unwrap();
        let old = tmp.path().join("old.log");
        let new = tmp.path().join("new.log");
        append(&old, "o1\no2\n");
        let locator = ScriptedLocator::new(&old);

        let mut engine = TailEngine::start(locator.clone(), &settings(2)).unwrap();
        expect_line(&mut engine, "o1", false);
        expect_line(&mut engine, "o2", false);

        append(&new, "n1\n");
        locator.point_at(&new);

        for _ in 0..3 {
            assert_eq!(engine.step(), Step::Idle);
        }
        assert_eq!(engine.source().path, new);
        assert!(!engine.is_caught_up());

        expect_line(&mut engine, "n1", true);
        assert_eq!(engine.step(), Step::Idle);
        append(&new, "n2\n");
        expect_line(&mut engine, "n2", true);

        // Late writes to the old file are no longer read.
        append(&old, "o3\n");
        assert_eq!(engine.step(), Step::Idle);
    }

    #[test]
    fn rotation_to_an_older_session_keeps_its_history_historical() {
        let tmp = tempfile::tempdir().unwrap();
        let older = tmp.path().join("older.log");
        let newest = tmp.path().join("newest.log");
        append(&older, "2024-01-01 09:00:00.000|Status: Busy, Ip: 1.2.3.4, shortId: OLD1\n");
        append(&newest, "n1\n");
        let locator = ScriptedLocator::new(&newest);

        let mut engine = TailEngine::start(locator.clone(), &settings(2)).unwrap();
        expect_line(&mut engine, "n1", false);

        // Newest session directory gone: the locator falls back to an older one.
        locator.point_at_older(&older);
        for _ in 0..3 {
            assert_eq!(engine.step(), Step::Idle);
        }
        assert_eq!(engine.source().path, older);

        expect_line(
            &mut engine,
            "2024-01-01 09:00:00.000|Status: Busy, Ip: 1.2.3.4, shortId: OLD1",
            false,
        );
        assert_eq!(engine.step(), Step::Idle);
        append(&older, "after\n");
        expect_line(&mut engine, "after", true);
    }

    #[test]
    fn rotation_to_a_session_with_the_same_creation_time_is_not_new() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.log");
        let b = tmp.path().join("b.log");
        append(&a, "");
        append(&b, "b1\n");
        let locator = ScriptedLocator::new(&a);
        let mut engine = TailEngine::start(locator.clone(), &settings(1)).unwrap();

        *locator.current.borrow_mut() = Some(session(&b, 10));
        engine.step();
        engine.step();
        assert_eq!(engine.source().path, b);
        expect_line(&mut engine, "b1", false);
    }

    #[test]
    fn same_path_probe_keeps_reading_existing_handle() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("a.log");
        append(&log, "a\n");
        let locator = ScriptedLocator::new(&log);

        let mut engine = TailEngine::start(locator.clone(), &settings(1)).unwrap();
        expect_line(&mut engine, "a", false);
        for _ in 0..10 {
            assert_eq!(engine.step(), Step::Idle);
        }
        assert!(locator.calls() > 1);

        append(&log, "b\nc\n");
        expect_line(&mut engine, "b", true);
        expect_line(&mut engine, "c", true);
        assert_eq!(engine.step(), Step::Idle);
    }

    #[test]
    fn unreadable_rotation_target_is_retried_later() {
        let tmp = tempfile::tempdir().unwrap();
        let old = tmp.path().join("old.log");
        let new = tmp.path().join("new.log");
        append(&old, "");
        let locator = ScriptedLocator::new(&old);
        let mut engine = TailEngine::start(locator.clone(), &settings(1)).unwrap();

        locator.point_at(&new);
        for _ in 0..2 {
            engine.step();
        }
        assert_eq!(engine.source().path, old, "new file not on disk yet");

        append(&new, "fresh\n");
        for _ in 0..2 {
            engine.step();
        }
        assert_eq!(engine.source().path, new);
        expect_line(&mut engine, "fresh", true);
    }

    #[test]
    fn locate_failure_during_probe_is_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("a.log");
        append(&log, "");
        let locator = ScriptedLocator::new(&log);
        let mut engine = TailEngine::start(locator.clone(), &settings(1)).unwrap();

        *locator.current.borrow_mut() = None;
        for _ in 0..4 {
            assert_eq!(engine.step(), Step::Idle);
        }
        append(&log, "still here\n");
        expect_line(&mut engine, "still here", true);
    }

    #[test]
    fn unterminated_old_line_is_flushed_before_new_file() {
        let tmp = tempfile::tempdir().unwrap();
        let old = tmp.path().join("old.log");
        let new = tmp.path().join("new.log");
        append(&old, "whole\npartial");
        let locator = ScriptedLocator::new(&old);
        let mut engine = TailEngine::start(locator.clone(), &settings(1)).unwrap();
        expect_line(&mut engine, "whole", false);

        append(&new, "first\n");
        locator.point_at(&new);
        engine.step();
        engine.step();
        assert_eq!(engine.source().path, new);

        expect_line(&mut engine, "partial", true);
        expect_line(&mut engine, "first", true);
    }

    #[test]
    fn malformed_line_is_a_single_sentinel() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("a.log");
        std::fs::write(&log, b"ok\n\xC3\x28\nnext\n").unwrap();

        let mut engine = TailEngine::start(ScriptedLocator::new(&log), &settings(30)).unwrap();
        expect_line(&mut engine, "ok", false);
        assert_eq!(
            engine.step(),
            Step::Line(TailedLine {
                content: LineContent::Malformed,
                is_live: false,
            })
        );
        expect_line(&mut engine, "next", false);
        assert_eq!(engine.step(), Step::Idle);
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "é".repeat(constants::DEBUG_MAX_LINE_PREVIEW + 10);
        assert_eq!(
            preview(&long).chars().count(),
            constants::DEBUG_MAX_LINE_PREVIEW
        );
        assert_eq!(preview("short"), "short");
    }

    #[tokio::test]
    async fn driver_delivers_history_then_live_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("a.log");
        append(&log, "h1\nh2\n");

        let engine = TailEngine::start(ScriptedLocator::new(&log), &settings(30)).unwrap();
        let (mut tx, mut rx) = line_channel();
        let cancel = CancellationToken::new();

        let tail = run_tail(engine, &mut tx, Duration::from_millis(5), cancel.clone());
        let check = async {
            assert_eq!(rx.recv().await, Some(TailedLine::text("h1", false)));
            assert_eq!(rx.recv().await, Some(TailedLine::text("h2", false)));

            tokio::time::sleep(Duration::from_millis(30)).await;
            append(&log, "l1\n");
            assert_eq!(rx.recv().await, Some(TailedLine::text("l1", true)));
            cancel.cancel();
        };

        tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(tail, check);
        })
        .await
        .expect("driver should stop after cancel");
    }

    #[tokio::test]
    async fn driver_stops_when_receiver_is_dropped() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("a.log");
        append(&log, "one\ntwo\n");

        let engine = TailEngine::start(ScriptedLocator::new(&log), &settings(30)).unwrap();
        let (mut tx, rx) = line_channel();
        drop(rx);

        tokio::time::timeout(
            Duration::from_secs(5),
            run_tail(engine, &mut tx, Duration::from_millis(5), CancellationToken::new()),
        )
        .await
        .expect("driver should stop once the sink closes");
    }
}

// LobbyScout - app/pipeline.rs
//
// Turns tailed lines into lobby reports.
//
// For each line, in order and one at a time:
//   1. interpret: lines that are not lobby assignments are dropped silently
//   2. look up the server's country; a failed lookup is logged and the lobby
//      is dropped
//   3. report: historical lobbies go to the log only, live lobbies are also
//      sent to the notifier
//
// Nothing here stops the tail loop. Every failure is absorbed and counted.

use crate::app::geo::GeoLookup;
use crate::app::notify::Notifier;
use crate::app::tail::{LineSink, SinkStatus};
use crate::core::interpreter::LineInterpreter;
use crate::core::model::{LocatedLobby, TailedLine};

/// Running totals, logged at shutdown.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReportStats {
    pub lines: u64,
    pub malformed_lines: u64,
    pub lobbies: u64,
    pub lookups_failed: u64,
    pub notifications_sent: u64,
    pub notifications_failed: u64,
}

/// Sequential line consumer: interpret, locate, report.
pub struct LobbyReporter<G, N> {
    interpreter: LineInterpreter,
    geo: G,
    notifier: N,
    stats: ReportStats,
}

impl<G: GeoLookup, N: Notifier> LobbyReporter<G, N> {
    pub fn new(interpreter: LineInterpreter, geo: G, notifier: N) -> Self {
        Self {
            interpreter,
            geo,
            notifier,
            stats: ReportStats::default(),
        }
    }

    pub fn stats(&self) -> ReportStats {
        self.stats
    }

    /// Process one tailed line. Returns the located lobby if the line
    /// described one and its country could be resolved.
    pub async fn handle(&mut self, line: &TailedLine) -> Option<LocatedLobby> {
        self.stats.lines += 1;
        if line.as_text().is_none() {
            self.stats.malformed_lines += 1;
            return None;
        }

        let event = self.interpreter.interpret_line(line)?;
        self.stats.lobbies += 1;

        let country = match self.geo.country_of(&event.ip).await {
            Ok(c) => c,
            Err(e) => {
                self.stats.lookups_failed += 1;
                tracing::error!(
                    lobby_id = %event.lobby_id,
                    ip = %event.ip,
                    error = %e,
                    "Unsuccessful IP location query"
                );
                return None;
            }
        };

        let lobby = LocatedLobby { event, country };

        if !line.is_live {
            tracing::info!(
                "Previous session @ {}: lobby_id {}, country {}",
                lobby.event.time.format("%H:%M:%S"),
                lobby.event.lobby_id,
                lobby.country
            );
            return Some(lobby);
        }

        tracing::info!(
            "Live session: lobby_id {}, country {}",
            lobby.event.lobby_id,
            lobby.country
        );

        match self.notifier.notify(&lobby).await {
            Ok(()) => self.stats.notifications_sent += 1,
            Err(e) => {
                self.stats.notifications_failed += 1;
                tracing::warn!(lobby_id = %lobby.event.lobby_id, error = %e, "Notification failed");
            }
        }

        Some(lobby)
    }
}

impl<G: GeoLookup, N: Notifier> LineSink for LobbyReporter<G, N> {
    async fn accept(&mut self, line: TailedLine) -> SinkStatus {
        self.handle(&line).await;
        SinkStatus::Continue
    }
}

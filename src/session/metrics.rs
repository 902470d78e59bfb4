use crate::engine::{Absence, EngineEvent, SequenceState};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counters for one practice run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionMetrics {
    pub started_at: DateTime<Utc>,
    pub observations: u64,
    pub matches: u64,
    pub mismatches: u64,
    pub no_body: u64,
    pub source_unavailable: u64,
    pub advances: u64,
    pub stale_commits: u64,
    pub completed: bool,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            observations: 0,
            matches: 0,
            mismatches: 0,
            no_body: 0,
            source_unavailable: 0,
            advances: 0,
            stale_commits: 0,
            completed: false,
        }
    }

    pub fn record(&mut self, event: &EngineEvent, before: &SequenceState, after: &SequenceState) {
        match event {
            // Completion is latched; the state no longer reflects the observation.
            EngineEvent::Observed(_) if before.is_complete() => self.observations += 1,
            EngineEvent::Observed(_) => {
                self.observations += 1;
                if after.is_correct {
                    self.matches += 1;
                } else {
                    self.mismatches += 1;
                }
            }
            EngineEvent::Absent(Absence::NoBody) => self.no_body += 1,
            EngineEvent::Absent(Absence::SourceUnavailable { .. }) => self.source_unavailable += 1,
            EngineEvent::CommitAdvance { .. } => {
                if after.current_index > before.current_index {
                    self.advances += 1;
                } else {
                    self.stale_commits += 1;
                }
            }
        }
        self.completed = after.is_complete();
    }

    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

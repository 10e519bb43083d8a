use tracing::warn;

use timeline_scheduler::models::{Constraints, PlanNarrative, Task};
use timeline_scheduler::{EngineConfig, Overlay, TimelineSnapshot};

// Refreshes apply in completion order, so the caller has to drop stale ones.
// Each refresh takes a ticket when it starts; only the newest completed ticket may seed.
#[derive(Debug, Default)]
pub struct RefreshGate {
    issued: u64,
    applied: u64,
}

impl RefreshGate {
    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// True when the refresh holding `ticket` may be applied.
    pub fn complete(&mut self, ticket: u64) -> bool {
        if ticket <= self.applied {
            warn!(ticket, applied = self.applied, "discarding stale refresh");
            return false;
        }
        self.applied = ticket;
        true
    }
}

// Everything the view needs besides the overlay itself
#[derive(Debug, Clone)]
pub struct TimelineSession {
    pub overlay: Overlay,
    pub tasks: Vec<Task>,
    pub narrative: Option<PlanNarrative>,
    pub constraints: Constraints,
    pub engine: EngineConfig,
}

#[derive(Debug, Default)]
pub struct Session {
    pub gate: RefreshGate,
    pub current: Option<TimelineSession>,
}

impl Session {
    /// Seed from a completed refresh; a stale ticket leaves the session as is.
    pub fn apply_refresh(
        &mut self,
        ticket: u64,
        snapshot: TimelineSnapshot,
        tasks: Vec<Task>,
        narrative: Option<PlanNarrative>,
        constraints: Constraints,
        engine: EngineConfig,
    ) -> bool {
        if !self.gate.complete(ticket) {
            return false;
        }
        match &mut self.current {
            Some(current) => {
                current.overlay.seed(snapshot);
                current.tasks = tasks;
                current.narrative = narrative;
                current.constraints = constraints;
                current.engine = engine;
            }
            None => {
                self.current = Some(TimelineSession {
                    overlay: Overlay::new(snapshot),
                    tasks,
                    narrative,
                    constraints,
                    engine,
                });
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use timeline_scheduler::SyncState;

    fn snapshot(day: u32) -> TimelineSnapshot {
        TimelineSnapshot {
            date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            working_hours: vec![],
            items: vec![],
            dropped: 0,
        }
    }

    #[test]
    fn gate_rejects_older_tickets() {
        let mut gate = RefreshGate::default();
        let slow = gate.begin();
        let fast = gate.begin();
        assert!(gate.complete(fast));
        assert!(!gate.complete(slow));
        assert!(!gate.complete(fast));
    }

    #[test]
    fn stale_refresh_does_not_replace_newer_snapshot() {
        let mut session = Session::default();
        let slow = session.gate.begin();
        let fast = session.gate.begin();

        let cfg = EngineConfig::default();
        assert!(session.apply_refresh(fast, snapshot(13), vec![], None, Constraints::default(), cfg.clone()));
        assert!(!session.apply_refresh(slow, snapshot(12), vec![], None, Constraints::default(), cfg));

        let current = session.current.as_ref().unwrap();
        assert_eq!(current.overlay.baseline().date.to_string(), "2026-01-13");
        assert_eq!(current.overlay.state(), SyncState::Synced);
    }
}

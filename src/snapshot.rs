use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::config::EngineConfig;
use crate::merge;
use crate::models::{TimelineItem, WorkingHour};
use crate::normalize::{self, Sources};

/// Ordered timeline for one calendar day as delivered by a refresh.
///
/// Snapshots are replaced wholesale by the next refresh, never merged.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TimelineSnapshot {
    pub date: NaiveDate,
    pub working_hours: Vec<WorkingHour>,
    pub items: Vec<TimelineItem>,
    pub dropped: usize,
}

impl TimelineSnapshot {
    /// Normalize all sources and merge them into day order.
    pub fn build(
        date: NaiveDate,
        sources: Sources<'_>,
        working_hours: &[WorkingHour],
        cfg: &EngineConfig,
    ) -> Self {
        let normalized = normalize::normalize(sources, cfg.timezone);
        let items = merge::merge(normalized.items);
        debug!(%date, items = items.len(), dropped = normalized.dropped, "built timeline snapshot");

        Self {
            date,
            working_hours: working_hours.to_vec(),
            items,
            dropped: normalized.dropped,
        }
    }

    pub fn get(&self, id: &str) -> Option<&TimelineItem> {
        self.items.iter().find(|i| i.id == id)
    }
}

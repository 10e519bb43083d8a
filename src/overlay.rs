//! Local edit overlay.
//!
//! Holds the last server snapshot as a baseline plus a working copy that
//! drag/resize interactions mutate. A refresh always wins: `seed` throws
//! away any local edits. Nothing here is sent upstream.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, TimelineError};
use crate::merge;
use crate::models::TimelineItem;
use crate::snapshot::TimelineSnapshot;
use crate::time;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Synced,
    Dirty,
}

// A working item whose times diverge from the baseline
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItemEdit {
    pub id: String,
    pub original_start: DateTime<FixedOffset>,
    pub original_end: DateTime<FixedOffset>,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    baseline: TimelineSnapshot,
    working: Vec<TimelineItem>,
    state: SyncState,
}

impl Overlay {
    pub fn new(snapshot: TimelineSnapshot) -> Self {
        Self {
            working: snapshot.items.clone(),
            baseline: snapshot,
            state: SyncState::Synced,
        }
    }

    /// Replace everything with a fresh snapshot. Pending edits are dropped.
    pub fn seed(&mut self, snapshot: TimelineSnapshot) {
        if self.state == SyncState::Dirty {
            info!(
                discarded = self.pending_edits().len(),
                "refresh replaced local timeline edits"
            );
        }
        *self = Self::new(snapshot);
    }

    /// Move an editable item to a new span.
    pub fn apply_move(
        &mut self,
        id: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<()> {
        self.apply_edit(id, start, end)?;
        debug!(item = id, %start, %end, "moved timeline item");
        Ok(())
    }

    /// Resize an editable item. The new span must be at least one whole minute.
    pub fn apply_resize(
        &mut self,
        id: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<()> {
        self.apply_edit(id, start, end)?;
        debug!(item = id, %start, %end, "resized timeline item");
        Ok(())
    }

    // Shared guard: unknown id, then editability, then span. Rejections leave self untouched.
    fn apply_edit(
        &mut self,
        id: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<()> {
        let Some(pos) = self.working.iter().position(|i| i.id == id) else {
            return Err(TimelineError::UnknownItem { id: id.to_string() });
        };

        if !self.working[pos].editable {
            return Err(TimelineError::NotEditable { id: id.to_string() });
        }
        // sub-minute spans measure as 0 and would render with no height
        if time::duration_minutes(&start, &end) <= 0 {
            return Err(TimelineError::InvalidDuration {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }

        let item = &mut self.working[pos];
        item.start = start;
        item.end = end;

        // keep render order; other items keep their contents
        self.working = merge::merge(std::mem::take(&mut self.working));
        self.state = SyncState::Dirty;
        Ok(())
    }

    /// Drop local edits and go back to the baseline.
    pub fn revert(&mut self) {
        self.working = self.baseline.items.clone();
        self.state = SyncState::Synced;
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn items(&self) -> &[TimelineItem] {
        &self.working
    }

    pub fn baseline(&self) -> &TimelineSnapshot {
        &self.baseline
    }

    /// Items whose span differs from the baseline, in working order.
    pub fn pending_edits(&self) -> Vec<ItemEdit> {
        self.working
            .iter()
            .filter_map(|item| {
                let original = self.baseline.get(&item.id)?;
                if original.start == item.start && original.end == item.end {
                    return None;
                }
                Some(ItemEdit {
                    id: item.id.clone(),
                    original_start: original.start,
                    original_end: original.end,
                    start: item.start,
                    end: item.end,
                })
            })
            .collect()
    }
}

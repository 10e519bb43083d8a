/*
Merge & order.
Combines normalized items into one day sequence and checks the non-overlap invariant.
*/

use serde::Serialize;
use tracing::warn;

use crate::models::TimelineItem;

// Two committed items that share time. Advisory only; the planner fixes it on regeneration.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OverlapViolation {
    pub first_id: String,
    pub second_id: String,
    pub overlap_minutes: i64,
}

/// Sort by start ascending.
///
/// Sorting rules:
/// 1) Earlier start first
/// 2) If tied, kind precedence fixed > work > break > buffer
/// 3) Otherwise input order is kept (stable sort)
pub fn merge(mut items: Vec<TimelineItem>) -> Vec<TimelineItem> {
    items.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.kind.cmp(&b.kind)));
    items
}

/// Report every overlapping pair among committed items.
///
/// Break and buffer items are leftover capacity and are skipped. Every remaining
/// pair (fixed/fixed, fixed/work, work/work) must not intersect. Nothing is corrected here.
pub fn validate_non_overlap(items: &[TimelineItem]) -> Vec<OverlapViolation> {
    let mut committed: Vec<&TimelineItem> = items.iter().filter(|i| !i.kind.is_capacity()).collect();
    committed.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.kind.cmp(&b.kind)));

    let mut violations = Vec::new();
    for (i, a) in committed.iter().enumerate() {
        // sorted by start: once b starts at/after a ends, nothing later can overlap a
        for b in committed[i + 1..].iter().take_while(|b| b.start < a.end) {
            debug_assert!(a.overlaps(b));
            let overlap = (a.end.min(b.end) - b.start).num_minutes();
            warn!(first = %a.id, second = %b.id, minutes = overlap, "overlapping timeline items");
            violations.push(OverlapViolation {
                first_id: a.id.clone(),
                second_id: b.id.clone(),
                overlap_minutes: overlap,
            });
        }
    }
    violations
}

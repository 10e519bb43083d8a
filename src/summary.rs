/*
Overflow & summary.
Overflow is a set difference: open tasks that no timeline item references.
The summary totals work/buffer time and derives attention points by fixed threshold rules.
*/

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::models::{ItemKind, Task, TaskStatus, TimelineItem};
use crate::priority::{self, PriorityLabel};
use crate::time;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttentionKind {
    Rest,
    Reschedule,
    OnTrack,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AttentionPoint {
    pub kind: AttentionKind,
    pub subject_id: Option<String>, // work item id or task id
    pub message: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Summary {
    pub work_minutes: i64,
    pub buffer_minutes: i64,
    pub break_minutes: i64,
    pub overflow_minutes: i64,
    pub last_work_end: Option<DateTime<FixedOffset>>,
    pub attention_points: Vec<AttentionPoint>,
}

/// Open tasks not referenced by any item, in task-list order.
pub fn compute_overflow(tasks: &[Task], items: &[TimelineItem]) -> Vec<Task> {
    let scheduled: HashSet<Uuid> = items
        .iter()
        .filter_map(|i| i.source_ref.as_ref().and_then(|r| r.task_id()))
        .collect();

    tasks
        .iter()
        .filter(|t| t.status != TaskStatus::Done)
        .filter(|t| !scheduled.contains(&t.id))
        .cloned()
        .collect()
}

fn minutes_of(items: &[TimelineItem], kind: ItemKind) -> i64 {
    items
        .iter()
        .filter(|i| i.kind == kind)
        .map(TimelineItem::duration_min)
        .sum()
}

/// Totals and attention points for a timeline.
///
/// Rules:
/// - every work block >= `rest_threshold_min` gets a rest suggestion
/// - every High priority overflow task gets a reschedule suggestion
/// - if neither fires, a single on-track message
pub fn compute_summary(items: &[TimelineItem], overflow: &[Task], cfg: &EngineConfig) -> Summary {
    let tz = cfg.timezone;
    let work: Vec<&TimelineItem> = items.iter().filter(|i| i.kind == ItemKind::Work).collect();

    let mut attention: Vec<AttentionPoint> = work
        .iter()
        .filter(|i| i.duration_min() >= cfg.rest_threshold_min)
        .map(|i| AttentionPoint {
            kind: AttentionKind::Rest,
            subject_id: Some(i.id.clone()),
            message: format!(
                "\"{}\" runs {} without a pause ({} - {}); plan a short rest after it.",
                i.display_title(),
                time::format_duration(i.duration_min()),
                time::format_clock(&i.start, tz),
                time::format_clock(&i.end, tz),
            ),
        })
        .collect();

    attention.extend(
        overflow
            .iter()
            .filter(|t| priority::classify(t.priority) == PriorityLabel::High)
            .map(|t| AttentionPoint {
                kind: AttentionKind::Reschedule,
                subject_id: Some(t.id.to_string()),
                message: format!(
                    "High priority task \"{}\" did not fit today; consider rescheduling it.",
                    t.title
                ),
            }),
    );

    if attention.is_empty() {
        attention.push(AttentionPoint {
            kind: AttentionKind::OnTrack,
            subject_id: None,
            message: "Today's plan is on track.".to_string(),
        });
    }

    Summary {
        work_minutes: minutes_of(items, ItemKind::Work),
        buffer_minutes: minutes_of(items, ItemKind::Buffer),
        break_minutes: minutes_of(items, ItemKind::Break),
        overflow_minutes: overflow.iter().map(Task::effective_minutes).sum(),
        last_work_end: work.iter().map(|i| i.end).max(),
        attention_points: attention,
    }
}

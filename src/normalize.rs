/*
Schedule item normalization.
Each source family (plan blocks, fixed events, recurring occurrences) gets its own
converter into TimelineItem so merge/overlap logic only ever sees one shape.
*/

use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Result, TimelineError};
use crate::models::{
    BlockKind, FixedEvent, ItemKind, PlanBlock, RecurringOccurrence, RecurringSchedule,
    SourceRef, Task, TimelineItem,
};
use crate::time;

// Everything the normalizer reads for one refresh
#[derive(Debug, Clone, Copy, Default)]
pub struct Sources<'a> {
    pub tasks: &'a [Task],
    pub events: &'a [FixedEvent],
    pub occurrences: &'a [RecurringOccurrence],
    pub blocks: &'a [PlanBlock],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub items: Vec<TimelineItem>,
    pub dropped: usize, // data-quality count, never fatal
}

fn checked_span(
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
) -> Result<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
    if start >= end {
        return Err(TimelineError::InvalidDuration {
            start: start.to_rfc3339(),
            end: end.to_rfc3339(),
        });
    }
    Ok((start, end))
}

/// Plan block -> item. Only work blocks are editable.
pub fn from_plan_block(
    block: &PlanBlock,
    titles: &HashMap<Uuid, &str>,
    tz: Tz,
) -> Result<TimelineItem> {
    let (start, end) = checked_span(
        time::parse_timestamp(&block.start_at, tz)?,
        time::parse_timestamp(&block.end_at, tz)?,
    )?;

    // denormalized title first, then the live task list
    let title = block.task_title.clone().or_else(|| {
        block
            .task_id
            .and_then(|id| titles.get(&id).map(|t| t.to_string()))
    });

    Ok(TimelineItem {
        id: block.id.to_string(),
        title,
        start,
        end,
        kind: ItemKind::from(block.kind),
        editable: block.kind == BlockKind::Work,
        source_ref: block.task_id.map(SourceRef::Task),
    })
}

/// Fixed event -> item. Never editable, whatever the source's `locked` says.
pub fn from_fixed_event(event: &FixedEvent, tz: Tz) -> Result<TimelineItem> {
    let (start, end) = checked_span(
        time::parse_timestamp(&event.start_at, tz)?,
        time::parse_timestamp(&event.end_at, tz)?,
    )?;

    Ok(TimelineItem {
        id: event.id.to_string(),
        title: Some(event.title.clone()),
        start,
        end,
        kind: ItemKind::Fixed,
        editable: false,
        source_ref: Some(SourceRef::Event(event.id)),
    })
}

/// Recurring occurrence -> item, resolving its times of day against its date.
pub fn from_occurrence(occ: &RecurringOccurrence, tz: Tz) -> Result<TimelineItem> {
    let (start, end) = checked_span(
        time::at_time_of_day(occ.date, &occ.start_time, tz)?,
        time::at_time_of_day(occ.date, &occ.end_time, tz)?,
    )?;

    Ok(TimelineItem {
        id: occ.id.clone(),
        title: Some(occ.title.clone()),
        start,
        end,
        kind: ItemKind::Fixed,
        editable: false,
        source_ref: Some(SourceRef::Recurring(occ.schedule_id)),
    })
}

/// Normalize all sources. Items that fail to convert are dropped and counted.
pub fn normalize(sources: Sources<'_>, tz: Tz) -> Normalized {
    let titles: HashMap<Uuid, &str> = sources
        .tasks
        .iter()
        .map(|t| (t.id, t.title.as_str()))
        .collect();

    let converted = sources
        .blocks
        .iter()
        .map(|b| (b.id.to_string(), from_plan_block(b, &titles, tz)))
        .chain(
            sources
                .events
                .iter()
                .map(|e| (e.id.to_string(), from_fixed_event(e, tz))),
        )
        .chain(
            sources
                .occurrences
                .iter()
                .map(|o| (o.id.clone(), from_occurrence(o, tz))),
        );

    let mut out = Normalized::default();
    for (id, result) in converted {
        match result {
            Ok(item) => out.items.push(item),
            Err(err) => {
                warn!(item = %id, error = %err, "dropping schedule item");
                out.dropped += 1;
            }
        }
    }

    debug!(kept = out.items.len(), dropped = out.dropped, "normalized schedule items");
    out
}

/// Materialize the recurring schedules that fall on `date`.
pub fn occurrences_on(schedules: &[RecurringSchedule], date: NaiveDate) -> Vec<RecurringOccurrence> {
    let weekday = date.weekday().num_days_from_monday() as u8; // 0 = Monday

    schedules
        .iter()
        .filter(|s| s.days_of_week.contains(&weekday))
        .filter(|s| s.valid_from.is_none_or(|from| date >= from))
        .filter(|s| s.valid_to.is_none_or(|to| date <= to))
        .map(|s| RecurringOccurrence {
            id: format!("recurring-{}-{}", s.id, date),
            schedule_id: s.id,
            title: s.title.clone(),
            date,
            start_time: s.start_time.clone(),
            end_time: s.end_time.clone(),
        })
        .collect()
}

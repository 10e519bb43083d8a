/*
Working-hours backdrop.
Non-interactive background ranges for rendering; not part of reconciliation.
Also validates the day settings the backdrop and the plan request are built from.
*/

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::warn;

use crate::models::{Constraints, WorkingHour};
use crate::time;

const MAX_WINDOWS: usize = 3;

// Accepted ranges for plan constraints, inclusive
const BREAK_MINUTES: std::ops::RangeInclusive<i64> = 0..=30;
const FOCUS_MAX_MINUTES: std::ops::RangeInclusive<i64> = 30..=180;
const BUFFER_RATIO: std::ops::RangeInclusive<f64> = 0.0..=0.30;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Backdrop {
    pub id: String, // "working-<index>"
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

// One problem with one field of the working-hours list
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: &str) -> Self {
        Self {
            field: field.into(),
            message: message.to_string(),
        }
    }
}

/// Background ranges for `date`. Invalid windows are skipped.
pub fn backdrops(date: NaiveDate, windows: &[WorkingHour], tz: Tz) -> Vec<Backdrop> {
    windows
        .iter()
        .enumerate()
        .filter_map(|(index, w)| {
            let span = time::at_time_of_day(date, &w.start, tz)
                .and_then(|start| Ok((start, time::at_time_of_day(date, &w.end, tz)?)));
            match span {
                Ok((start, end)) if start < end => Some(Backdrop {
                    id: format!("working-{index}"),
                    start,
                    end,
                }),
                Ok(_) => {
                    warn!(index, start = %w.start, end = %w.end, "empty working-hour window skipped");
                    None
                }
                Err(err) => {
                    warn!(index, error = %err, "invalid working-hour window skipped");
                    None
                }
            }
        })
        .collect()
}

/// Check a working-hours list: 1..=3 windows, each start < end, no overlaps.
/// All problems are collected rather than stopping at the first.
pub fn validate_working_hours(windows: &[WorkingHour]) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if windows.is_empty() || windows.len() > MAX_WINDOWS {
        errors.push(FieldError::new("working_hours", "expected 1 to 3 windows"));
    }

    let mut valid: Vec<(NaiveTime, NaiveTime)> = Vec::new();
    for (index, w) in windows.iter().enumerate() {
        let start = time::parse_hhmm(&w.start);
        let end = time::parse_hhmm(&w.end);
        if start.is_err() {
            errors.push(FieldError::new(format!("working_hours.{index}.start"), "invalid start time"));
        }
        if end.is_err() {
            errors.push(FieldError::new(format!("working_hours.{index}.end"), "invalid end time"));
        }
        if let (Ok(start), Ok(end)) = (start, end) {
            if start < end {
                valid.push((start, end));
            } else {
                errors.push(FieldError::new(format!("working_hours.{index}.start"), "start must be before end"));
                errors.push(FieldError::new(format!("working_hours.{index}.end"), "start must be before end"));
            }
        }
    }

    valid.sort();
    if valid.windows(2).any(|pair| pair[1].0 <= pair[0].1) {
        errors.push(FieldError::new("working_hours", "windows overlap"));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Range-check the plan constraints forwarded to the plan generation service.
pub fn validate_constraints(c: &Constraints) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if !BREAK_MINUTES.contains(&c.break_minutes) {
        errors.push(FieldError::new("constraints.break_minutes", "expected 0 to 30"));
    }
    if !FOCUS_MAX_MINUTES.contains(&c.focus_max_minutes) {
        errors.push(FieldError::new("constraints.focus_max_minutes", "expected 30 to 180"));
    }
    // NaN falls outside every range
    if !BUFFER_RATIO.contains(&c.buffer_ratio) {
        errors.push(FieldError::new("constraints.buffer_ratio", "expected 0.00 to 0.30"));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/*
Time helpers shared by every timeline stage.
All wall-clock math goes through an explicit timezone; the host timezone is never consulted.
*/

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;

use crate::error::{Result, TimelineError};

// Accepted when the input carries no offset ("datetime-local" style)
const LOCAL_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parse an RFC3339 timestamp. Offset-less input is read as wall time in `tz`.
pub fn parse_timestamp(raw: &str, tz: Tz) -> Result<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt);
    }

    LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| TimelineError::InvalidTimestamp {
            value: raw.to_string(),
        })
}

/// Minutes since local midnight in `tz`.
pub fn minutes_of_day(dt: &DateTime<FixedOffset>, tz: Tz) -> u32 {
    let local = dt.with_timezone(&tz);
    local.hour() * 60 + local.minute()
}

/// Minutes since local midnight for a raw timestamp string.
///
/// Callers treat a failure as a zero-length item and hide it.
pub fn to_minutes_of_day(raw: &str, tz: Tz) -> Result<u32> {
    parse_timestamp(raw, tz).map(|dt| minutes_of_day(&dt, tz))
}

/// Whole minutes between two instants; partial minutes are truncated and
/// negative spans clamp to 0.
pub fn duration_minutes(start: &DateTime<FixedOffset>, end: &DateTime<FixedOffset>) -> i64 {
    (*end - *start).num_minutes().max(0)
}

/// "45m", "1h", "2h05m".
pub fn format_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let (h, m) = (minutes / 60, minutes % 60);
    if m == 0 {
        format!("{h}h")
    } else {
        format!("{h}h{m:02}m")
    }
}

/// "HH:MM" wall clock in `tz`.
pub fn format_clock(dt: &DateTime<FixedOffset>, tz: Tz) -> String {
    dt.with_timezone(&tz).format("%H:%M").to_string()
}

// Parse a "HH:MM" string
pub fn parse_hhmm(hhmm: &str) -> Result<NaiveTime> {
    let invalid = || TimelineError::InvalidTimeOfDay {
        value: hhmm.to_string(),
    };

    let parts: Vec<&str> = hhmm.trim().split(':').collect();
    if parts.len() != 2 {
        return Err(invalid());
    }
    let h: u32 = parts[0].parse().map_err(|_| invalid())?;
    let m: u32 = parts[1].parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(h, m, 0).ok_or_else(invalid)
}

/// Resolve a "HH:MM" time of day against `date` in `tz`.
///
/// Ambiguous wall times (DST fall-back) take the earlier instant; times
/// inside a DST gap are rejected.
pub fn at_time_of_day(date: NaiveDate, hhmm: &str, tz: Tz) -> Result<DateTime<FixedOffset>> {
    let time = parse_hhmm(hhmm)?;
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| TimelineError::InvalidTimeOfDay {
            value: hhmm.to_string(),
        })
}

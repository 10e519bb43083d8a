//! Error types for the timeline engine

use thiserror::Error;

/// Failures raised by engine operations.
///
/// None of these are fatal: normalization swallows them and counts the
/// dropped item, edit operations hand them back as a rejected result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimelineError {
    #[error("invalid timestamp: {value:?}")]
    InvalidTimestamp { value: String },

    #[error("invalid time of day: {value:?}")]
    InvalidTimeOfDay { value: String },

    #[error("invalid duration: {start} .. {end}")]
    InvalidDuration { start: String, end: String },

    #[error("item {id} is not editable")]
    NotEditable { id: String },

    #[error("unknown timeline item {id}")]
    UnknownItem { id: String },
}

impl TimelineError {
    /// Stable machine-readable code for API payloads.
    pub fn code(&self) -> &'static str {
        match self {
            TimelineError::InvalidTimestamp { .. } => "invalid_timestamp",
            TimelineError::InvalidTimeOfDay { .. } => "invalid_time_of_day",
            TimelineError::InvalidDuration { .. } => "invalid_duration",
            TimelineError::NotEditable { .. } => "not_editable",
            TimelineError::UnknownItem { .. } => "unknown_item",
        }
    }
}

pub type Result<T> = std::result::Result<T, TimelineError>;

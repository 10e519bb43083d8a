use std::path::PathBuf;

use chrono_tz::Tz;
use tracing::warn;

use crate::models::DaySettings;

pub const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";
pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_DB_PATH: &str = "data/db.json";

// Work blocks at or above this length get a rest suggestion
pub const DEFAULT_REST_THRESHOLD_MIN: i64 = 90;

const ADDR_ENV_VAR: &str = "TIMELINE_ADDR";
const DB_PATH_ENV_VAR: &str = "TIMELINE_DB_PATH";
const TIMEZONE_ENV_VAR: &str = "TIMELINE_TZ";

/// Settings threaded through every engine call.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub timezone: Tz,
    pub rest_threshold_min: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            rest_threshold_min: DEFAULT_REST_THRESHOLD_MIN,
        }
    }
}

impl EngineConfig {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            ..Self::default()
        }
    }

    /// Build from persisted day settings. `tz_override` (usually the
    /// environment) wins over the stored name.
    pub fn from_settings(settings: &DaySettings, tz_override: Option<&str>) -> Self {
        let name = tz_override.unwrap_or(&settings.timezone);
        Self::new(parse_timezone(name).unwrap_or_else(default_timezone))
    }
}

pub fn parse_timezone(name: &str) -> Option<Tz> {
    match name.trim().parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(err) => {
            warn!(timezone = name, error = %err, "unknown timezone, using default");
            None
        }
    }
}

fn default_timezone() -> Tz {
    chrono_tz::Asia::Tokyo
}

/// Host process settings, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    pub db_path: PathBuf,
    pub timezone_override: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            addr: non_empty(ADDR_ENV_VAR).unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            db_path: non_empty(DB_PATH_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            timezone_override: non_empty(TIMEZONE_ENV_VAR),
        }
    }
}

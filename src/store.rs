use std::{fs, path::Path};

use anyhow::Context;
use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::info;

use timeline_scheduler::models::{
    Constraints, Db, FixedEvent, PlanBlock, PlanNarrative, RecurringOccurrence, Task,
};
use timeline_scheduler::normalize::{self, Sources};
use timeline_scheduler::time;

pub fn load_db(path: &Path) -> anyhow::Result<Db> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let db: Db = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(db)
}

pub fn save_db(path: &Path, db: &Db) -> anyhow::Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    let text = serde_json::to_string_pretty(db).context("failed to serialize db")?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&tmp_path, text)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

// Write an empty repository file on first start
pub fn ensure_db(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        return Ok(());
    }
    info!(path = %path.display(), "creating empty repository file");
    save_db(path, &Db::default())
}

// Everything one refresh reads for a date
#[derive(Debug, Clone, Default)]
pub struct DaySources {
    pub tasks: Vec<Task>,
    pub events: Vec<FixedEvent>,
    pub occurrences: Vec<RecurringOccurrence>,
    pub blocks: Vec<PlanBlock>,
    pub narrative: Option<PlanNarrative>,
    pub constraints: Constraints,
}

impl DaySources {
    pub fn as_sources(&self) -> Sources<'_> {
        Sources {
            tasks: &self.tasks,
            events: &self.events,
            occurrences: &self.occurrences,
            blocks: &self.blocks,
        }
    }
}

// Select what belongs to `date`.
//
// Rules:
// - all tasks (overflow decides what is open)
// - events starting on `date` in `tz`; unparsable ones are kept so normalization counts them
// - recurring schedules expanded for `date`
// - blocks and narrative of the latest plan for `date`
pub fn day_sources(db: &Db, date: NaiveDate, tz: Tz) -> DaySources {
    let events = db
        .events
        .iter()
        .filter(|e| match time::parse_timestamp(&e.start_at, tz) {
            Ok(start) => start.with_timezone(&tz).date_naive() == date,
            Err(_) => true,
        })
        .cloned()
        .collect();

    let plan = db.plan_for(date);

    DaySources {
        tasks: db.tasks.clone(),
        events,
        occurrences: normalize::occurrences_on(&db.recurring, date),
        blocks: plan.map(|p| p.blocks.clone()).unwrap_or_default(),
        narrative: plan.and_then(|p| p.narrative.clone()),
        constraints: db.settings.constraints.clone(),
    }
}

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    Done,
}

// Fixed start/end for a task pinned to a time of day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixedWindow {
    pub start_at: DateTime<FixedOffset>,
    pub end_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub priority: i64,         // 1..=5
    pub estimate_minutes: i64, // > 0
    #[serde(default)]
    pub due_at: Option<DateTime<FixedOffset>>,
    // when set the task is not splittable and its duration comes from the window
    #[serde(default)]
    pub fixed: Option<FixedWindow>,
}

impl Task {
    /// Minutes the task occupies: the fixed window when pinned, the estimate otherwise.
    pub fn effective_minutes(&self) -> i64 {
        match &self.fixed {
            Some(w) => (w.end_at - w.start_at).num_minutes().max(0),
            None => self.estimate_minutes.max(0),
        }
    }

    pub fn is_splittable(&self) -> bool {
        self.fixed.is_none()
    }
}

// Immovable calendar entry. Timestamps stay raw until normalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixedEvent {
    pub id: Uuid,
    pub title: String,
    pub start_at: String, // RFC3339
    pub end_at: String,   // RFC3339
    #[serde(default = "locked_default")]
    pub locked: bool,
}

fn locked_default() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecurringSchedule {
    pub id: Uuid,
    pub title: String,
    pub start_time: String, // "HH:MM"
    pub end_time: String,   // "HH:MM"
    pub days_of_week: Vec<u8>, // 0 = Monday .. 6 = Sunday
    #[serde(default)]
    pub valid_from: Option<NaiveDate>,
    #[serde(default)]
    pub valid_to: Option<NaiveDate>,
}

// One day's materialization of a recurring schedule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecurringOccurrence {
    pub id: String, // "recurring-<schedule id>-<date>"
    pub schedule_id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: String, // "HH:MM"
    pub end_time: String,   // "HH:MM"
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Work,
    Break,
    Buffer,
}

// Server-computed timeline segment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanBlock {
    pub id: Uuid,
    pub start_at: String, // RFC3339
    pub end_at: String,   // RFC3339
    pub kind: BlockKind,
    #[serde(default)]
    pub task_id: Option<Uuid>,
    #[serde(default)]
    pub task_title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkingHour {
    pub start: String, // "HH:MM"
    pub end: String,   // "HH:MM"
}

impl WorkingHour {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }
}

// Parameters handed to the plan generation service; not read by the engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Constraints {
    pub break_minutes: i64,
    pub focus_max_minutes: i64,
    pub buffer_ratio: f64,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            break_minutes: 10,
            focus_max_minutes: 90,
            buffer_ratio: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverflowSuggestion {
    pub task_title: String,
    pub suggestions: Vec<String>,
}

// Natural-language summary from the plan generation service, passed through as-is
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlanNarrative {
    pub summary: String,
    #[serde(default)]
    pub why_this_order: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub overflow_plan: Vec<OverflowSuggestion>,
}

// Output of the plan generation service for one date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedPlan {
    pub date: NaiveDate,
    pub blocks: Vec<PlanBlock>,
    #[serde(default)]
    pub narrative: Option<PlanNarrative>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaySettings {
    pub timezone: String, // IANA name
    pub working_hours: Vec<WorkingHour>,
    #[serde(default)]
    pub constraints: Constraints,
}

impl Default for DaySettings {
    fn default() -> Self {
        Self {
            timezone: crate::config::DEFAULT_TIMEZONE.to_string(),
            working_hours: vec![
                WorkingHour::new("09:00", "12:00"),
                WorkingHour::new("13:00", "18:00"),
            ],
            constraints: Constraints::default(),
        }
    }
}

// Repository snapshot: everything the host reads before a refresh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Db {
    #[serde(default)]
    pub settings: DaySettings,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub events: Vec<FixedEvent>,
    #[serde(default)]
    pub recurring: Vec<RecurringSchedule>,
    #[serde(default)]
    pub plans: Vec<GeneratedPlan>,
}

impl Db {
    /// Latest generated plan for `date`, if any. Later entries win.
    pub fn plan_for(&self, date: NaiveDate) -> Option<&GeneratedPlan> {
        self.plans.iter().rev().find(|p| p.date == date)
    }
}

// Normalized kind of a timeline entry. Declaration order is the tie-break
// order for items starting at the same instant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Fixed,
    Work,
    Break,
    Buffer,
}

impl From<BlockKind> for ItemKind {
    fn from(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Work => ItemKind::Work,
            BlockKind::Break => ItemKind::Break,
            BlockKind::Buffer => ItemKind::Buffer,
        }
    }
}

impl ItemKind {
    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Fixed => "Fixed",
            ItemKind::Work => "Work",
            ItemKind::Break => "Break",
            ItemKind::Buffer => "Buffer",
        }
    }

    // break/buffer stand for leftover capacity, not committed time
    pub fn is_capacity(self) -> bool {
        matches!(self, ItemKind::Break | ItemKind::Buffer)
    }
}

// What a timeline item was derived from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum SourceRef {
    Task(Uuid),
    Event(Uuid),
    Recurring(Uuid),
}

impl SourceRef {
    pub fn task_id(&self) -> Option<Uuid> {
        match self {
            SourceRef::Task(id) => Some(*id),
            _ => None,
        }
    }
}

// Common shape every source is normalized into. start < end always holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineItem {
    pub id: String,
    pub title: Option<String>,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub kind: ItemKind,
    pub editable: bool,
    pub source_ref: Option<SourceRef>,
}

impl TimelineItem {
    pub fn duration_min(&self) -> i64 {
        crate::time::duration_minutes(&self.start, &self.end)
    }

    pub fn overlaps(&self, other: &TimelineItem) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Title for display, falling back to the kind.
    pub fn display_title(&self) -> &str {
        match (&self.title, self.kind) {
            (Some(t), _) if !t.trim().is_empty() => t,
            (_, ItemKind::Break) => "Break",
            (_, ItemKind::Buffer) => "Buffer",
            _ => "Scheduled",
        }
    }
}

// Timeline reconciliation engine.
// Pure, synchronous functions over in-memory state; the HTTP host lives in main.rs.
pub mod backdrop;  // Working-hours background ranges
pub mod config;    // Engine / server settings
pub mod error;     // Error taxonomy
pub mod merge;     // Ordering and overlap checks
pub mod models;    // Source records and the normalized TimelineItem
pub mod normalize; // Source records -> TimelineItem
pub mod overlay;   // Local drag/resize edits over a snapshot
pub mod priority;  // High/Medium/Low classification
pub mod snapshot;  // One refreshed day
pub mod summary;   // Overflow tasks, totals, attention points
pub mod time;      // Timezone-aware time helpers

pub use config::EngineConfig;
pub use error::TimelineError;
pub use models::{ItemKind, SourceRef, TimelineItem};
pub use overlay::{Overlay, SyncState};
pub use snapshot::TimelineSnapshot;

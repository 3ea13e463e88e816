//! # DayPlan Memory
//!
//! Long-term memory for the planner: user preferences, a bounded history of
//! completed tasks, and patterns learned by the reflection loop.
//!
//! ## Design
//! - One JSON file, human-readable, loaded once at startup
//! - Write-through: every mutation is on disk before the call returns
//! - A single writer lock serializes load-modify-persist across sessions
//! - Unknown top-level keys survive a save/load round trip

pub mod analysis;
pub mod record;
pub mod store;

pub use analysis::{HistoryAnalysis, analyze_task_history};
pub use record::{LearnedPattern, MAX_HISTORY, MemoryRecord, Metadata, PreferenceEntry, TaskRecord};
pub use store::PreferenceStore;

//! # DayPlan Core
//!
//! Shared data model, input normalization, configuration, and errors.
//! Every other crate consumes the fully-populated [`Task`] produced here.

pub mod config;
pub mod deadline;
pub mod error;
pub mod input;
pub mod types;

pub use config::DayPlanConfig;
pub use error::{DayPlanError, Result};
pub use input::{TaskDraft, normalize_input, parse_input};
pub use types::{
    Category, DEFAULT_DURATION_MINUTES, MAX_DURATION_MINUTES, Preferences, Priority, Task,
    TaskStatus,
};

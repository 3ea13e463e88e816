//! # DayPlan Agent
//!
//! The judging and coordinating half of the planner: grades schedules,
//! reflects on completed work, and runs the whole pipeline for a session.

pub mod archive;
pub mod evaluator;
pub mod habits;
pub mod orchestrator;
pub mod reflection;

pub use archive::PlanArchive;
pub use evaluator::{EvaluationResult, Grade, PlanEvaluator, ScoreBreakdown};
pub use orchestrator::{MessageType, Pipeline, PlanBundle, StageMessage};
pub use reflection::{CompletionStatus, ReflectionDecision, ReflectionLoop};

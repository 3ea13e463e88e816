//! Pipeline coordinator: runs the stages in order for one session and is
//! the only place that sees the whole flow:
//!
//! raw tasks → ranked tasks → schedule → (evaluation ‖ reminders) → reflection
//!
//! Every stage hand-off is recorded as a request/response pair in the
//! message log. Any stage error aborts the run; there is no partial bundle.

use chrono::{DateTime, FixedOffset, Local, Utc};
use dayplan_core::{DayPlanConfig, DayPlanError, Result, Task, normalize_input};
use dayplan_memory::PreferenceStore;
use dayplan_scheduler::{
    Planner, PriorityScorer, RankedTasks, Reminder, ScheduleBlock, anchor_on, build_reminders,
    render_schedule,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::evaluator::{EvaluationResult, PlanEvaluator};
use crate::reflection::{ReflectionDecision, ReflectionLoop};

pub const COORDINATOR: &str = "coordinator";
pub const STAGE_SCORER: &str = "priority_scorer";
pub const STAGE_PLANNER: &str = "planner";
pub const STAGE_EVALUATOR: &str = "evaluator";
pub const STAGE_REMINDERS: &str = "reminders";
pub const STAGE_REFLECTION: &str = "reflection";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Request,
    Response,
}

/// One hand-off between the coordinator and a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageMessage {
    pub message_id: String,
    pub from: String,
    pub to: String,
    pub message_type: MessageType,
    pub session_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanBundle {
    pub session_id: String,
    pub generated_at: DateTime<FixedOffset>,
    pub ranked: RankedTasks,
    pub schedule: Vec<ScheduleBlock>,
    pub evaluation: EvaluationResult,
    pub reminders: Vec<Reminder>,
    pub reflection: ReflectionDecision,
    pub formatted_schedule: String,
}

impl PlanBundle {
    /// Tasks in rank order, as planned.
    pub fn planned_tasks(&self) -> Vec<Task> {
        self.ranked.tasks.iter().map(|st| st.task.clone()).collect()
    }
}

/// Runs the planning pipeline against one shared store.
pub struct Pipeline {
    store: Arc<PreferenceStore>,
    config: DayPlanConfig,
    scorer: PriorityScorer,
    planner: Planner,
    evaluator: PlanEvaluator,
    reflection: ReflectionLoop,
    /// Stage hand-offs, oldest first.
    pub message_log: Vec<StageMessage>,
}

impl Pipeline {
    pub fn new(store: Arc<PreferenceStore>, config: DayPlanConfig) -> Self {
        let planner = Planner::new(config.breaks.clone());
        Self {
            store,
            config,
            scorer: PriorityScorer::new(),
            planner,
            evaluator: PlanEvaluator::new(),
            reflection: ReflectionLoop::new(),
            message_log: Vec::new(),
        }
    }

    pub fn store(&self) -> &Arc<PreferenceStore> {
        &self.store
    }

    pub fn config(&self) -> &DayPlanConfig {
        &self.config
    }

    /// Plan for today, starting now.
    pub fn run(&mut self, tasks: Vec<Task>, session_id: Option<&str>) -> Result<PlanBundle> {
        self.run_at(tasks, session_id, Local::now().fixed_offset())
    }

    /// Normalize raw input, then plan.
    pub fn run_raw(
        &mut self,
        raw: &str,
        session_id: Option<&str>,
        now: DateTime<FixedOffset>,
    ) -> Result<PlanBundle> {
        let tasks = normalize_input(raw, now.naive_local(), &self.config.input);
        self.run_at(tasks, session_id, now)
    }

    /// Plan with a pinned clock. Same tasks and `now` give the same ranking and schedule.
    pub fn run_at(
        &mut self,
        tasks: Vec<Task>,
        session_id: Option<&str>,
        now: DateTime<FixedOffset>,
    ) -> Result<PlanBundle> {
        let session_id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| new_session_id(now));
        if !is_valid_session_id(&session_id) {
            return Err(DayPlanError::Pipeline(format!(
                "Invalid session id '{session_id}': path separators and '..' are not allowed"
            )));
        }
        tracing::info!("🚀 Planning session {} ({} tasks)", session_id, tasks.len());

        let preferences = self.store.preferences();

        self.send(&session_id, STAGE_SCORER, format!("score {} tasks", tasks.len()));
        let ranked = self.scorer.score_and_rank(tasks, &preferences, now.naive_local());
        self.reply(
            &session_id,
            STAGE_SCORER,
            format!(
                "ranked {} tasks, {} urgent",
                ranked.summary.total_tasks, ranked.summary.urgent_tasks_count
            ),
        );

        let anchor = anchor_on(now, &self.config.workday);
        self.send(&session_id, STAGE_PLANNER, format!("schedule from {}", anchor.to_rfc3339()));
        let schedule = self.planner.build_schedule(&ranked.tasks, anchor);
        self.reply(&session_id, STAGE_PLANNER, format!("{} blocks", schedule.len()));

        let planned: Vec<Task> = ranked.tasks.iter().map(|st| st.task.clone()).collect();

        self.send(&session_id, STAGE_EVALUATOR, format!("evaluate {} blocks", schedule.len()));
        let evaluation = self.evaluator.evaluate(&schedule, &planned, &preferences);
        self.reply(
            &session_id,
            STAGE_EVALUATOR,
            format!("score {} grade {}", evaluation.total_score, evaluation.grade),
        );

        self.send(&session_id, STAGE_REMINDERS, format!("remind {} blocks", schedule.len()));
        let reminders = build_reminders(&schedule);
        self.reply(&session_id, STAGE_REMINDERS, format!("{} reminders", reminders.len()));

        // Nothing is completed at planning time.
        let reflection = self.reflect_session(&session_id, &[], &planned)?;

        let formatted_schedule = render_schedule(&schedule, reminders.len(), now);

        tracing::info!(
            "🏁 Session {} planned: grade {}, replan={}",
            session_id,
            evaluation.grade,
            reflection.replan_needed
        );

        Ok(PlanBundle {
            session_id,
            generated_at: now,
            ranked,
            schedule,
            evaluation,
            reminders,
            reflection,
            formatted_schedule,
        })
    }

    /// Reflect on a finished (or partly finished) day.
    pub fn reflect(
        &mut self,
        completed: &[Task],
        planned: &[Task],
        session_id: &str,
    ) -> Result<ReflectionDecision> {
        self.reflect_session(session_id, completed, planned)
    }

    /// Log a completed task into history.
    pub fn record_completion(&self, task: &Task, actual_minutes: Option<u32>) -> Result<()> {
        self.store
            .store_task_completion(task, Local::now().fixed_offset(), actual_minutes)?;
        tracing::info!("✅ Recorded completion: {}", task.name);
        Ok(())
    }

    /// Last `limit` messages, newest first.
    pub fn recent_messages(&self, limit: usize) -> Vec<&StageMessage> {
        self.message_log.iter().rev().take(limit).collect()
    }

    fn reflect_session(
        &mut self,
        session_id: &str,
        completed: &[Task],
        planned: &[Task],
    ) -> Result<ReflectionDecision> {
        self.send(
            session_id,
            STAGE_REFLECTION,
            format!("{} of {} completed", completed.len(), planned.len()),
        );
        let decision = self.reflection.reflect(completed, planned, &self.store)?;
        self.reply(
            session_id,
            STAGE_REFLECTION,
            format!("rate {:.1}%, replan={}", decision.completion_rate, decision.replan_needed),
        );
        Ok(decision)
    }

    fn send(&mut self, session_id: &str, stage: &str, content: String) {
        self.log(session_id, COORDINATOR, stage, MessageType::Request, content);
    }

    fn reply(&mut self, session_id: &str, stage: &str, content: String) {
        self.log(session_id, stage, COORDINATOR, MessageType::Response, content);
    }

    fn log(
        &mut self,
        session_id: &str,
        from: &str,
        to: &str,
        message_type: MessageType,
        content: String,
    ) {
        tracing::debug!(session = session_id, from, to, ?message_type, "{}", content);
        self.message_log.push(StageMessage {
            message_id: uuid::Uuid::new_v4().to_string(),
            from: from.to_string(),
            to: to.to_string(),
            message_type,
            session_id: session_id.to_string(),
            content,
            timestamp: Utc::now(),
        });
    }
}

/// Session ids name archive files, so they must stay a single path component.
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(['/', '\\', '\0']) && !id.contains("..")
}

/// `session_YYYYMMDD_HHMMSS` from the planning clock.
pub fn new_session_id(now: DateTime<FixedOffset>) -> String {
    format!("session_{}", now.format("%Y%m%d_%H%M%S"))
}

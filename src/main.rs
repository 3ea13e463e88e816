//! # DayPlan: daily planner CLI
//!
//! Turns a task list into a time-blocked day, grades the plan, and learns
//! from what actually got done.
//!
//! Usage:
//!   dayplan plan tasks.json                 # Plan today from a file
//!   cat todo.txt | dayplan plan             # ...or from stdin, one task per line
//!   dayplan reflect --done "Standup" Docs   # Compare the latest plan with what got done
//!   dayplan complete Docs --actual 75       # Log a finished task into history
//!   dayplan prefs set max_work_hours 7      # Tune preferences
//!   dayplan history                         # What the planner has learned

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use dayplan_agent::{Pipeline, PlanArchive, PlanBundle};
use dayplan_core::{DayPlanConfig, Task};
use dayplan_memory::PreferenceStore;
use dayplan_scheduler::day_anchor;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dayplan", version, about = "📅 DayPlan: time-blocked daily planning")]
struct Cli {
    /// Config file (default: ~/.dayplan/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Memory file, overrides the config
    #[arg(long, global = true)]
    memory: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score, schedule, and grade a task list
    Plan {
        /// Task file (JSON or one task per line); stdin when omitted
        file: Option<PathBuf>,
        /// Session id (default: derived from the clock)
        #[arg(short, long)]
        session: Option<String>,
        /// Plan for another date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Print the bundle as JSON instead of the formatted schedule
        #[arg(long)]
        json: bool,
        /// Do not write output files
        #[arg(long)]
        no_save: bool,
    },
    /// Compare a saved plan with what got done
    Reflect {
        /// Session to reflect on (default: latest)
        #[arg(short, long)]
        session: Option<String>,
        /// Completed tasks, by id or name
        #[arg(long, num_args = 0..)]
        done: Vec<String>,
        /// Also log the completed tasks into history
        #[arg(long)]
        record: bool,
    },
    /// Log a completed task into history
    Complete {
        /// Task id or name
        task: String,
        /// Minutes actually spent
        #[arg(short, long)]
        actual: Option<u32>,
        /// Session whose plan holds the task (default: latest)
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Read or change preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Show completion history and learned patterns
    History {
        /// Most recent records to list
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum PrefsAction {
    /// Set a preference (value parsed as JSON, else stored as text)
    Set { key: String, value: String },
    /// Print one preference
    Get { key: String },
    /// Print all preferences
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "dayplan=debug,dayplan_core=debug,dayplan_memory=debug,dayplan_scheduler=debug,dayplan_agent=debug"
    } else {
        "dayplan=info,dayplan_core=info,dayplan_memory=info,dayplan_scheduler=info,dayplan_agent=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => DayPlanConfig::load_from(path)?,
        None => DayPlanConfig::load()?,
    };
    if let Some(memory) = &cli.memory {
        config.memory_path = memory.clone();
    }

    let store = PreferenceStore::open(&config.memory_path())
        .with_context(|| format!("opening memory at {}", config.memory_path().display()))?;
    let archive = PlanArchive::new(&config.outputs_dir())?;
    let mut pipeline = Pipeline::new(Arc::new(store), config);

    match cli.command {
        Command::Plan { file, session, date, json, no_save } => {
            let raw = read_tasks(file.as_ref())?;
            let now = match date {
                Some(d) => day_anchor(d, &pipeline.config().workday),
                None => Local::now().fixed_offset(),
            };
            let bundle = pipeline.run_raw(&raw, session.as_deref(), now)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&bundle)?);
            } else {
                print_bundle(&bundle);
            }
            if !no_save {
                let written = archive.save(&bundle)?;
                println!("\n💾 Saved {} files to {}", written.len(), archive.dir().display());
            }
        }

        Command::Reflect { session, done, record } => {
            let bundle = load_bundle(&archive, session.as_deref())?;
            let planned = bundle.planned_tasks();
            let completed: Vec<Task> = planned
                .iter()
                .filter(|t| done.iter().any(|d| matches_task(t, d)))
                .cloned()
                .collect();
            if completed.len() < done.len() {
                println!(
                    "⚠️  {} of the names given did not match a planned task",
                    done.len() - completed.len()
                );
            }
            if record {
                for task in &completed {
                    pipeline.record_completion(task, None)?;
                }
            }

            let decision = pipeline.reflect(&completed, &planned, &bundle.session_id)?;
            println!("🔁 Reflection for {}", bundle.session_id);
            println!(
                "   Completed {}/{} ({:.1}%, {:?})",
                decision.completion_analysis.completed_tasks,
                decision.completion_analysis.planned_tasks,
                decision.completion_rate,
                decision.completion_analysis.status
            );
            println!("   Re-plan needed: {}", if decision.replan_needed { "yes" } else { "no" });
            println!("   {}", decision.replan_reason);
            for line in &decision.recommendations {
                println!("   → {line}");
            }
        }

        Command::Complete { task, actual, session } => {
            // A task missing from the saved plan is still worth logging.
            let found = load_bundle(&archive, session.as_deref())
                .ok()
                .and_then(|b| b.planned_tasks().into_iter().find(|t| matches_task(t, &task)));
            let task = found.unwrap_or_else(|| Task::new(&task));
            pipeline.record_completion(&task, actual)?;
            let spent = actual.map(|m| format!(" ({m} min)")).unwrap_or_default();
            println!("✅ Logged '{}'{}", task.name, spent);
        }

        Command::Prefs { action } => {
            let store = pipeline.store();
            match action {
                PrefsAction::Set { key, value } => {
                    let parsed = serde_json::from_str::<serde_json::Value>(&value)
                        .unwrap_or(serde_json::Value::String(value));
                    store.store_preference(&key, &parsed)?;
                    println!("✅ {key} = {parsed}");
                }
                PrefsAction::Get { key } => match store.get_preference_raw(&key) {
                    Some(v) => println!("{v}"),
                    None => println!(
                        "(unset), effective: {}",
                        serde_json::to_string(&store.preferences())?
                    ),
                },
                PrefsAction::Show => {
                    let snapshot = store.snapshot();
                    println!("⚙️  Preferences ({})", store.path().display());
                    for (key, entry) in &snapshot.user_preferences {
                        println!(
                            "   {key} = {} (updated {})",
                            entry.value,
                            entry.updated_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                    println!("   effective: {}", serde_json::to_string(&store.preferences())?);
                }
            }
        }

        Command::History { limit } => {
            let store = pipeline.store();
            let history = store.task_history();
            let analysis = store.analyze_task_history();
            println!("📊 {} tasks completed", analysis.total_tasks_completed);
            if let Some(hour) = analysis.most_productive_hour {
                println!("   Most productive hour: {hour}:00");
            }
            for (category, avg) in &analysis.average_duration_by_category {
                println!("   {category}: {avg:.1} min average");
            }
            if !history.is_empty() {
                println!("\n🕘 Recent:");
                for record in history.iter().rev().take(limit) {
                    println!(
                        "   {} {} ({})",
                        record.completed_at.format("%Y-%m-%d %H:%M"),
                        record.task_name,
                        record
                            .actual_duration
                            .map(|m| format!("{m} min"))
                            .unwrap_or_else(|| "no time logged".to_string())
                    );
                }
            }
            let snapshot = store.snapshot();
            if !snapshot.learned_patterns.is_empty() {
                println!("\n🧠 Learned patterns:");
                for (name, pattern) in &snapshot.learned_patterns {
                    println!("   {name}: {} (confidence {:.2})", pattern.data, pattern.confidence);
                }
            }
            let tips = store.personalized_recommendations();
            if !tips.is_empty() {
                println!("\n💡 Suggestions:");
                for tip in tips {
                    println!("   • {tip}");
                }
            }
        }
    }

    Ok(())
}

fn read_tasks(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        None => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw).context("reading tasks from stdin")?;
            Ok(raw)
        }
    }
}

fn load_bundle(archive: &PlanArchive, session: Option<&str>) -> Result<PlanBundle> {
    match session {
        Some(id) => Ok(archive.load(id)?),
        None => archive
            .latest()?
            .context("no saved plans yet; run `dayplan plan` first"),
    }
}

fn matches_task(task: &Task, needle: &str) -> bool {
    task.id.as_deref() == Some(needle) || task.name.eq_ignore_ascii_case(needle)
}

fn print_bundle(bundle: &PlanBundle) {
    println!("{}", bundle.formatted_schedule);

    let eval = &bundle.evaluation;
    println!("\n📝 Plan Quality: {}/{} (Grade {})", eval.total_score, eval.max_score, eval.grade);
    let s = &eval.scores_breakdown;
    println!(
        "   time {} · priority {} · feasibility {} · balance {}",
        s.time_efficiency, s.priority_alignment, s.feasibility, s.work_life_balance
    );
    for line in &eval.feedback {
        println!("   • {line}");
    }
    for line in &eval.recommendations {
        println!("   → {line}");
    }

    if !bundle.reminders.is_empty() {
        println!("\n⏰ Reminders:");
        for r in &bundle.reminders {
            println!("   {} {}", r.reminder_time.format("%I:%M %p"), r.message);
        }
    }
}

//! Text-mode front end over the hospital administration API. Each
//! invocation is one interaction: fetch, render, and for mutating commands
//! stage the action in a session store, dispatch it, then re-fetch.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use api_client::{load_settings, AiClient, ApiClient};
use shared::domain::{
    filter_medications_by_search, filter_patients_by_search, EntityKind, Medication, Patient,
    ProcessTask,
};
use shared::tasks::{
    filter_tasks_by_search, sort_for_display, TaskAction, TaskStatistics, TaskStatus,
};
use shared::validation::validate_task;
use workflow::{Dispatcher, SessionStore};

mod render;

#[derive(Parser, Debug)]
#[command(name = "console_dashboard", about = "hospital administration dashboard")]
struct Cli {
    /// Overrides the configured API base URL.
    #[arg(long)]
    server: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Entity counts, task statistics and AI liveness.
    Overview,
    /// Operations/tasks list, highest priority first.
    Tasks {
        #[arg(long, default_value = "")]
        search: String,
        /// Canonical status token or friendly label.
        #[arg(long)]
        status: Option<String>,
    },
    Patients {
        #[arg(long, default_value = "")]
        search: String,
    },
    Medications {
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Runs one lifecycle transition on a task.
    Task {
        id: i64,
        #[arg(value_parser = parse_action)]
        action: TaskAction,
    },
    /// Creates a task after local validation.
    CreateTask {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "other")]
        entity_type: String,
        #[arg(long, default_value = "")]
        entity_id: String,
        #[arg(long, default_value_t = 60)]
        sla_minutes: i64,
        #[arg(long, default_value_t = 0.0)]
        priority_score: f64,
    },
    /// Deletes a patient through the confirm-then-dispatch flow.
    DeletePatient { id: i64 },
    /// AI assistant liveness, optionally forcing a warmup.
    AiHealth {
        #[arg(long)]
        warmup: bool,
    },
    /// Asks the AI assistant a question.
    Ask {
        question: String,
        #[arg(long)]
        advanced: bool,
        #[arg(long)]
        model: Option<String>,
    },
}

fn parse_action(raw: &str) -> std::result::Result<TaskAction, String> {
    match raw.to_ascii_lowercase().as_str() {
        "start" => Ok(TaskAction::Start),
        "complete" => Ok(TaskAction::Complete),
        "cancel" => Ok(TaskAction::Cancel),
        other => Err(format!("unknown action '{other}' (start|complete|cancel)")),
    }
}

fn parse_status(raw: &str) -> Result<TaskStatus> {
    TaskStatus::from_label(raw)
        .with_context(|| format!("unknown status filter '{raw}'"))
}

/// Unknown kinds fold into `Other`, same as the wire decoding.
fn parse_entity_kind(raw: &str) -> EntityKind {
    let raw = raw.trim().to_ascii_lowercase();
    EntityKind::ALL
        .into_iter()
        .find(|kind| kind.as_str() == raw)
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(server) = cli.server {
        settings.api_base_url = server;
    }

    let api = Arc::new(ApiClient::new(&settings)?);
    let command = cli.command.unwrap_or(Command::Overview);

    match command {
        Command::Overview => {
            let patients: Vec<Patient> = api.list().await.unwrap_or_else(report_and_empty);
            let medications: Vec<Medication> = api.list().await.unwrap_or_else(report_and_empty);
            let tasks: Vec<ProcessTask> = api.list().await.unwrap_or_else(report_and_empty);

            println!(
                "patients: {} | medications: {} | tasks: {}",
                patients.len(),
                medications.len(),
                tasks.len()
            );
            let stats = TaskStatistics::collect(&tasks, Utc::now());
            print!("{}", render::render_statistics(&stats));

            let ai = AiClient::new(&settings)?;
            let health = ai.health().await;
            println!(
                "ai assistant: {}{}",
                health.status,
                health
                    .error
                    .map(|e| format!(" ({e})"))
                    .unwrap_or_default()
            );
        }
        Command::Tasks { search, status } => {
            let status = status.as_deref().map(parse_status).transpose()?;
            let mut tasks: Vec<ProcessTask> = api.list().await.unwrap_or_else(report_and_empty);
            sort_for_display(&mut tasks);
            let now = Utc::now();
            let visible = filter_tasks_by_search(&tasks, &search, status);
            print!("{}", render::render_tasks(&visible, now));
            print!(
                "{}",
                render::render_statistics(&TaskStatistics::collect(&tasks, now))
            );
        }
        Command::Patients { search } => {
            let patients: Vec<Patient> = api.list().await.unwrap_or_else(report_and_empty);
            let visible = filter_patients_by_search(&patients, &search);
            print!("{}", render::render_patients(&visible, Utc::now().date_naive()));
        }
        Command::Medications { search } => {
            let medications: Vec<Medication> = api.list().await.unwrap_or_else(report_and_empty);
            let visible = filter_medications_by_search(&medications, &search);
            print!("{}", render::render_medications(&visible));
        }
        Command::Task { id, action } => {
            let mut store = SessionStore::<ProcessTask>::new();
            store.stage_status_update(id, action);
            let dispatcher = Dispatcher::new(api.clone());
            let outcomes = dispatcher.run_staged(&mut store).await;
            print!("{}", render::render_outcomes(&outcomes));
            if let Ok(Some(task)) = api.get::<ProcessTask>(id).await {
                print!("{}", render::render_tasks(&[&task], Utc::now()));
            }
        }
        Command::CreateTask {
            name,
            entity_type,
            entity_id,
            sla_minutes,
            priority_score,
        } => {
            let task = ProcessTask {
                name,
                entity_type: parse_entity_kind(&entity_type),
                entity_id,
                sla_minutes,
                priority_score,
                ..ProcessTask::default()
            };

            // Validation runs before any network call; errors abort the
            // submission with one message per field.
            let errors = validate_task(&task);
            if !errors.is_empty() {
                for error in &errors {
                    eprintln!("invalid field {error}");
                }
                bail!("task not submitted: {} invalid field(s)", errors.len());
            }

            let mut store = SessionStore::<ProcessTask>::new();
            store.open_edit(None);
            store.stage_form_submission(task);
            let dispatcher = Dispatcher::new(api.clone());
            let outcomes = dispatcher.run_staged(&mut store).await;
            print!("{}", render::render_outcomes(&outcomes));
        }
        Command::DeletePatient { id } => {
            let mut store = SessionStore::<Patient>::new();
            store.open_delete_confirm(id);
            store.confirm_deletion();
            let dispatcher = Dispatcher::new(api.clone());
            let outcomes = dispatcher.run_staged(&mut store).await;
            print!("{}", render::render_outcomes(&outcomes));
        }
        Command::AiHealth { warmup } => {
            let ai = AiClient::new(&settings)?;
            if warmup {
                let ready = ai.warmup().await;
                println!("warmup: {}", if ready { "ready" } else { "not ready" });
            }
            let health = ai.health().await;
            println!("status: {}", health.status);
            if let Some(detail) = health.detail {
                println!("detail: {detail}");
            }
            if let Some(error) = health.error {
                println!("error: {error}");
            }
        }
        Command::Ask {
            question,
            advanced,
            model,
        } => {
            let ai = AiClient::new(&settings)?;
            let answer = if advanced {
                ai.ask_advanced(&question, model.as_deref()).await
            } else {
                ai.ask(&question, model.as_deref()).await
            };
            match answer {
                Ok(answer) => println!("{answer}"),
                Err(err) => eprintln!("assistant error: {err}"),
            }
        }
    }

    Ok(())
}

/// Boundary failures degrade to an error line plus an empty view; the page
/// keeps rendering.
fn report_and_empty<T>(err: shared::error::ApiError) -> Vec<T> {
    eprintln!("fetch failed: {err}");
    Vec::new()
}

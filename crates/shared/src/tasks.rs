//! Task lifecycle state machine plus the pure SLA and priority
//! classification used by the operations page.
//!
//! The wire vocabulary (`pending`, `in_progress`, ...) is canonical
//! everywhere in this workspace. Friendly labels exist only at the display
//! boundary ([`TaskStatus::label`]) and the filter-input boundary
//! ([`TaskStatus::from_label`]); no logic compares label strings.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ProcessTask;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Friendly display label, the only place the Portuguese vocabulary
    /// from the forms lives.
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pendente",
            TaskStatus::InProgress => "Em Progresso",
            TaskStatus::Completed => "Concluída",
            TaskStatus::Cancelled => "Cancelada",
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "🟡",
            TaskStatus::InProgress => "🔵",
            TaskStatus::Completed => "🟢",
            TaskStatus::Cancelled => "🔴",
        }
    }

    /// Parses filter input, accepting both the canonical tokens and the
    /// friendly labels the legacy forms used.
    pub fn from_label(raw: &str) -> Option<TaskStatus> {
        match raw.trim() {
            "pending" | "Pendente" => Some(TaskStatus::Pending),
            "in_progress" | "Em Progresso" => Some(TaskStatus::InProgress),
            "completed" | "Completado" | "Concluída" => Some(TaskStatus::Completed),
            "cancelled" | "Cancelado" | "Cancelada" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }

    /// Applies a lifecycle action: pending -> in_progress -> completed, and
    /// any non-terminal status -> cancelled. Terminal states accept nothing.
    pub fn apply(&self, action: TaskAction) -> Result<TaskStatus, TransitionError> {
        match (self, action) {
            (TaskStatus::Pending, TaskAction::Start) => Ok(TaskStatus::InProgress),
            (TaskStatus::InProgress, TaskAction::Complete) => Ok(TaskStatus::Completed),
            (TaskStatus::Pending | TaskStatus::InProgress, TaskAction::Cancel) => {
                Ok(TaskStatus::Cancelled)
            }
            (from, action) => Err(TransitionError::Invalid {
                from: *from,
                action,
            }),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskAction {
    Start,
    Complete,
    Cancel,
}

impl TaskAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskAction::Start => "start",
            TaskAction::Complete => "complete",
            TaskAction::Cancel => "cancel",
        }
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum TransitionError {
    /// The fetch-by-id of the read-modify-write returned nothing; the record
    /// was deleted concurrently and the update is skipped.
    #[error("task {0} no longer exists")]
    Vanished(i64),
    #[error("cannot {action} a task in status {from}")]
    Invalid { from: TaskStatus, action: TaskAction },
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// SLA classification of one task at one instant. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaState {
    Completed,
    NotStarted,
    OnTime,
    Warning,
    Overdue,
    Unknown,
}

impl SlaState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlaState::Completed => "completed",
            SlaState::NotStarted => "not_started",
            SlaState::OnTime => "on_time",
            SlaState::Warning => "warning",
            SlaState::Overdue => "overdue",
            SlaState::Unknown => "unknown",
        }
    }
}

/// Pure SLA classification against `now`. Subtraction is timezone-aware
/// (the timestamp keeps its own offset); a malformed timestamp classifies
/// as `Unknown` rather than erroring.
pub fn sla_state(task: &ProcessTask, now: DateTime<Utc>) -> SlaState {
    if task.status == TaskStatus::Completed {
        return SlaState::Completed;
    }

    let Some(raw) = task.started_at.as_deref().filter(|s| !s.is_empty()) else {
        return SlaState::NotStarted;
    };

    let Ok(started) = DateTime::parse_from_rfc3339(raw) else {
        return SlaState::Unknown;
    };

    let elapsed_minutes =
        now.signed_duration_since(started.with_timezone(&Utc)).num_seconds() as f64 / 60.0;
    let sla = task.sla_minutes as f64;

    if elapsed_minutes > sla {
        SlaState::Overdue
    } else if elapsed_minutes > sla * 0.8 {
        SlaState::Warning
    } else {
        SlaState::OnTime
    }
}

/// Priority band as a step function of the score, lower bounds inclusive:
/// [8,10] critical, [6,8) high, [4,6) medium, [0,4) low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PriorityBand {
    Low,
    Medium,
    High,
    Critical,
}

impl PriorityBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            PriorityBand::Critical
        } else if score >= 6.0 {
            PriorityBand::High
        } else if score >= 4.0 {
            PriorityBand::Medium
        } else {
            PriorityBand::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriorityBand::Critical => "critical",
            PriorityBand::High => "high",
            PriorityBand::Medium => "medium",
            PriorityBand::Low => "low",
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            PriorityBand::Critical => "🔴",
            PriorityBand::High => "🟠",
            PriorityBand::Medium => "🟡",
            PriorityBand::Low => "🟢",
        }
    }
}

impl fmt::Display for PriorityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Listing order: priority score descending, then started_at ascending with
/// missing timestamps first. RFC 3339 strings compare chronologically, so
/// the secondary key is a plain string compare.
pub fn sort_for_display(tasks: &mut [ProcessTask]) {
    tasks.sort_by(|a, b| {
        b.priority_score
            .partial_cmp(&a.priority_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                a.started_at
                    .as_deref()
                    .unwrap_or("")
                    .cmp(b.started_at.as_deref().unwrap_or(""))
            })
    });
}

pub fn filter_tasks_by_search<'a>(
    tasks: &'a [ProcessTask],
    term: &str,
    status: Option<TaskStatus>,
) -> Vec<&'a ProcessTask> {
    let term = term.trim().to_lowercase();
    tasks
        .iter()
        .filter(|t| status.map_or(true, |s| t.status == s))
        .filter(|t| {
            term.is_empty()
                || t.name.to_lowercase().contains(&term)
                || t.entity_type.as_str().contains(&term)
                || t.status.as_str().contains(&term)
        })
        .collect()
}

/// Aggregates for the operations statistics block.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskStatistics {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub overdue: usize,
    pub critical: usize,
    pub high: usize,
}

impl TaskStatistics {
    pub fn collect(tasks: &[ProcessTask], now: DateTime<Utc>) -> Self {
        let mut stats = Self {
            total: tasks.len(),
            ..Self::default()
        };
        for task in tasks {
            match task.status {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Cancelled => stats.cancelled += 1,
            }
            if sla_state(task, now) == SlaState::Overdue {
                stats.overdue += 1;
            }
            match PriorityBand::from_score(task.priority_score) {
                PriorityBand::Critical => stats.critical += 1,
                PriorityBand::High => stats.high += 1,
                _ => {}
            }
        }
        stats
    }
}

/// `dd/mm/yyyy hh:mm` display form; malformed input is shown verbatim and
/// a missing timestamp as `-`.
pub fn format_timestamp(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return "-".to_string();
    };
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.format("%d/%m/%Y %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn task(status: TaskStatus, started_minutes_ago: Option<i64>, sla: i64) -> ProcessTask {
        let now = Utc::now();
        ProcessTask {
            id: Some(1),
            name: "Follow-up".into(),
            status,
            sla_minutes: sla,
            started_at: started_minutes_ago
                .map(|m| (now - Duration::minutes(m)).to_rfc3339()),
            ..ProcessTask::default()
        }
    }

    #[test]
    fn lifecycle_transitions_are_one_directional() {
        assert_eq!(
            TaskStatus::Pending.apply(TaskAction::Start).expect("start"),
            TaskStatus::InProgress
        );
        assert_eq!(
            TaskStatus::InProgress
                .apply(TaskAction::Complete)
                .expect("complete"),
            TaskStatus::Completed
        );
        assert_eq!(
            TaskStatus::Pending.apply(TaskAction::Cancel).expect("cancel"),
            TaskStatus::Cancelled
        );
        assert_eq!(
            TaskStatus::InProgress
                .apply(TaskAction::Cancel)
                .expect("cancel"),
            TaskStatus::Cancelled
        );
    }

    #[test]
    fn terminal_states_reject_every_action() {
        for status in [TaskStatus::Completed, TaskStatus::Cancelled] {
            for action in [TaskAction::Start, TaskAction::Complete, TaskAction::Cancel] {
                assert!(status.apply(action).is_err(), "{status} must reject {action}");
            }
        }
        assert!(TaskStatus::Pending.apply(TaskAction::Complete).is_err());
        assert!(TaskStatus::InProgress.apply(TaskAction::Start).is_err());
    }

    #[test]
    fn completed_task_classifies_as_completed_regardless_of_clock() {
        let t = task(TaskStatus::Completed, Some(500), 10);
        assert_eq!(sla_state(&t, Utc::now()), SlaState::Completed);
    }

    #[test]
    fn unstarted_task_classifies_as_not_started() {
        let t = task(TaskStatus::Pending, None, 60);
        assert_eq!(sla_state(&t, Utc::now()), SlaState::NotStarted);
    }

    #[test]
    fn fifty_of_sixty_minutes_is_a_warning() {
        // 50 > 0.8 * 60 = 48 but below the 60-minute limit.
        let t = task(TaskStatus::InProgress, Some(50), 60);
        assert_eq!(sla_state(&t, Utc::now()), SlaState::Warning);
    }

    #[test]
    fn seventy_of_sixty_minutes_is_overdue() {
        let t = task(TaskStatus::InProgress, Some(70), 60);
        assert_eq!(sla_state(&t, Utc::now()), SlaState::Overdue);
    }

    #[test]
    fn well_inside_the_sla_is_on_time() {
        let t = task(TaskStatus::InProgress, Some(10), 60);
        assert_eq!(sla_state(&t, Utc::now()), SlaState::OnTime);
    }

    #[test]
    fn malformed_start_timestamp_classifies_as_unknown() {
        let mut t = task(TaskStatus::InProgress, None, 60);
        t.started_at = Some("yesterday-ish".into());
        assert_eq!(sla_state(&t, Utc::now()), SlaState::Unknown);
    }

    #[test]
    fn offset_timestamps_subtract_timezone_aware() {
        // Started 90 minutes ago but expressed in a -03:00 offset.
        let started = Utc::now() - Duration::minutes(90);
        let local = started.with_timezone(&chrono::FixedOffset::west_opt(3 * 3600).expect("tz"));
        let mut t = task(TaskStatus::InProgress, None, 60);
        t.started_at = Some(local.to_rfc3339());
        assert_eq!(sla_state(&t, Utc::now()), SlaState::Overdue);
    }

    #[test]
    fn priority_band_boundaries_are_inclusive_lower() {
        assert_eq!(PriorityBand::from_score(10.0), PriorityBand::Critical);
        assert_eq!(PriorityBand::from_score(8.0), PriorityBand::Critical);
        assert_eq!(PriorityBand::from_score(7.99), PriorityBand::High);
        assert_eq!(PriorityBand::from_score(6.0), PriorityBand::High);
        assert_eq!(PriorityBand::from_score(5.99), PriorityBand::Medium);
        assert_eq!(PriorityBand::from_score(4.0), PriorityBand::Medium);
        assert_eq!(PriorityBand::from_score(3.99), PriorityBand::Low);
        assert_eq!(PriorityBand::from_score(0.0), PriorityBand::Low);
    }

    #[test]
    fn priority_band_is_monotonic_in_score() {
        let mut previous = PriorityBand::Critical;
        let mut score = 10.0;
        while score >= 0.0 {
            let band = PriorityBand::from_score(score);
            assert!(band <= previous, "band must not increase as score drops");
            previous = band;
            score -= 0.25;
        }
    }

    #[test]
    fn sort_puts_high_priority_first_and_unstarted_before_started() {
        let mut tasks = vec![
            ProcessTask {
                name: "b".into(),
                priority_score: 5.0,
                started_at: Some("2026-01-02T10:00:00Z".into()),
                ..ProcessTask::default()
            },
            ProcessTask {
                name: "a".into(),
                priority_score: 9.0,
                started_at: None,
                ..ProcessTask::default()
            },
            ProcessTask {
                name: "c".into(),
                priority_score: 9.0,
                started_at: Some("2026-01-01T10:00:00Z".into()),
                ..ProcessTask::default()
            },
        ];
        sort_for_display(&mut tasks);
        let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["a", "c", "b"]);
    }

    #[test]
    fn statistics_count_canonical_statuses_and_bands() {
        let tasks = vec![
            task(TaskStatus::Pending, None, 60),
            ProcessTask {
                priority_score: 9.0,
                ..task(TaskStatus::InProgress, Some(70), 60)
            },
            ProcessTask {
                priority_score: 6.5,
                ..task(TaskStatus::Completed, Some(10), 60)
            },
            task(TaskStatus::Cancelled, None, 60),
        ];
        let stats = TaskStatistics::collect(&tasks, Utc::now());
        assert_eq!(stats.total, 4);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.critical, 1);
        assert_eq!(stats.high, 1);
    }

    #[test]
    fn status_labels_round_trip_through_the_boundary_mapping() {
        for status in TaskStatus::ALL {
            assert_eq!(TaskStatus::from_label(status.label()), Some(status));
            assert_eq!(TaskStatus::from_label(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::from_label("Todos"), None);
    }

    #[test]
    fn timestamp_formatting_degrades_gracefully() {
        assert_eq!(format_timestamp(None), "-");
        assert_eq!(format_timestamp(Some("")), "-");
        assert_eq!(
            format_timestamp(Some("2026-03-01T14:30:00Z")),
            "01/03/2026 14:30"
        );
        assert_eq!(format_timestamp(Some("not-a-date")), "not-a-date");
    }

    #[test]
    fn wire_vocabulary_is_snake_case() {
        assert_eq!(
            serde_json::to_value(TaskStatus::InProgress).expect("serialize"),
            serde_json::json!("in_progress")
        );
        let status: TaskStatus =
            serde_json::from_value(serde_json::json!("cancelled")).expect("deserialize");
        assert_eq!(status, TaskStatus::Cancelled);
    }
}

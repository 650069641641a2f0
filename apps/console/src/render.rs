//! Pure presentation: `(data) -> text`. Every function here is a plain
//! render pass over already-normalized records; re-running it after each
//! state mutation is the whole update model.

use chrono::{DateTime, NaiveDate, Utc};
use shared::domain::{format_cpf, format_phone, Medication, Patient, ProcessTask};
use shared::tasks::{
    format_timestamp, sla_state, PriorityBand, SlaState, TaskStatistics,
};
use workflow::ActionOutcome;

pub fn render_tasks(tasks: &[&ProcessTask], now: DateTime<Utc>) -> String {
    if tasks.is_empty() {
        return "no tasks to show\n".to_string();
    }

    let mut out = String::new();
    for task in tasks {
        let band = PriorityBand::from_score(task.priority_score);
        let sla = sla_state(task, now);
        out.push_str(&format!(
            "{} {:<28} [{}] {:<12} priority {} {:<8} sla {:<11} started {}\n",
            task.status.badge(),
            truncate(&task.name, 28),
            task.entity_type.as_str(),
            task.status.label(),
            band.badge(),
            band.label(),
            sla_label(sla),
            format_timestamp(task.started_at.as_deref()),
        ));
    }
    out
}

fn sla_label(state: SlaState) -> &'static str {
    match state {
        SlaState::Overdue => "OVERDUE",
        other => other.as_str(),
    }
}

pub fn render_statistics(stats: &TaskStatistics) -> String {
    format!(
        "tasks: {} total | {} pending | {} in progress | {} completed | {} cancelled\n\
         sla: {} overdue | priority: {} critical, {} high\n",
        stats.total,
        stats.pending,
        stats.in_progress,
        stats.completed,
        stats.cancelled,
        stats.overdue,
        stats.critical,
        stats.high,
    )
}

pub fn render_patients(patients: &[&Patient], today: NaiveDate) -> String {
    if patients.is_empty() {
        return "no patients to show\n".to_string();
    }

    let mut out = String::new();
    for patient in patients {
        let age = patient
            .age(today)
            .map(|a| format!("{a}y"))
            .unwrap_or_else(|| "-".to_string());
        let document = patient
            .document
            .as_deref()
            .map(format_cpf)
            .unwrap_or_default();
        let phone = patient
            .contact
            .as_ref()
            .and_then(|c| c.phone.as_deref())
            .map(format_phone)
            .unwrap_or_default();
        out.push_str(&format!(
            "{:<30} {:?} {:>4}  {:<14} {}\n",
            truncate(&patient.full_name, 30),
            patient.sex,
            age,
            document,
            phone,
        ));
    }
    out
}

pub fn render_medications(medications: &[&Medication]) -> String {
    if medications.is_empty() {
        return "no medications to show\n".to_string();
    }

    let mut out = String::new();
    for medication in medications {
        out.push_str(&format!(
            "{:<28} {:<24} {:<12} {}\n",
            truncate(&medication.name, 28),
            medication.active_ingredient.as_deref().unwrap_or("-"),
            medication.strength.as_deref().unwrap_or("-"),
            medication.form.as_deref().unwrap_or("-"),
        ));
    }
    out
}

pub fn render_outcomes(outcomes: &[ActionOutcome]) -> String {
    let mut out = String::new();
    for outcome in outcomes {
        let marker = if outcome.ok { "ok" } else { "error" };
        out.push_str(&format!("[{marker}] {}\n", outcome.message));
    }
    out
}

fn truncate(raw: &str, max_chars: usize) -> String {
    if raw.chars().count() <= max_chars {
        raw.to_string()
    } else {
        let cut: String = raw.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::EntityKind;
    use shared::tasks::TaskStatus;

    use super::*;

    #[test]
    fn task_rows_carry_badge_label_priority_and_sla() {
        let task = ProcessTask {
            id: Some(1),
            name: "Follow-up".into(),
            entity_type: EntityKind::Patient,
            status: TaskStatus::Pending,
            priority_score: 9.0,
            sla_minutes: 60,
            ..ProcessTask::default()
        };
        let rendered = render_tasks(&[&task], Utc::now());
        assert!(rendered.contains("Follow-up"));
        assert!(rendered.contains("Pendente"));
        assert!(rendered.contains("critical"));
        assert!(rendered.contains("not_started"));
    }

    #[test]
    fn empty_collections_render_placeholders_not_errors() {
        assert_eq!(render_tasks(&[], Utc::now()), "no tasks to show\n");
        assert_eq!(
            render_patients(&[], Utc::now().date_naive()),
            "no patients to show\n"
        );
        assert_eq!(render_medications(&[]), "no medications to show\n");
    }

    #[test]
    fn outcome_lines_distinguish_success_from_failure() {
        let outcomes = vec![
            ActionOutcome {
                ok: true,
                message: "task started successfully".into(),
                refresh: true,
            },
            ActionOutcome {
                ok: false,
                message: "failed to delete patient: timeout".into(),
                refresh: true,
            },
        ];
        let rendered = render_outcomes(&outcomes);
        assert!(rendered.contains("[ok] task started successfully"));
        assert!(rendered.contains("[error] failed to delete patient"));
    }
}

use chrono::{Datelike, NaiveDate};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::tasks::TaskStatus;

/// Binds a record type to its REST collection. The dispatcher and the API
/// client are generic over this, so CRUD logic exists exactly once instead
/// of one near-identical copy per entity kind.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// URL path segment, e.g. `patients` in `GET /patients/{id}/`.
    const COLLECTION: &'static str;
    /// Key a keyed list response may nest the collection under, probed by
    /// the normalizer after the conventional candidates.
    const PLURAL_KEY: &'static str;
    /// Singular noun for user-facing messages.
    const SINGULAR: &'static str;

    /// Server-assigned id; `None` until the record has been created.
    fn id(&self) -> Option<i64>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[default]
    M,
    F,
}

/// Contact details, each field independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub contact: Option<Contact>,
}

impl Patient {
    pub fn age(&self, today: NaiveDate) -> Option<i32> {
        let birthdate = self.birthdate?;
        let mut age = today.year() - birthdate.year();
        if (today.month(), today.day()) < (birthdate.month(), birthdate.day()) {
            age -= 1;
        }
        Some(age.max(0))
    }
}

impl Resource for Patient {
    const COLLECTION: &'static str = "patients";
    const PLURAL_KEY: &'static str = "patients";
    const SINGULAR: &'static str = "patient";

    fn id(&self) -> Option<i64> {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub active_ingredient: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub strength: Option<String>,
    #[serde(default)]
    pub atc_code: Option<String>,
}

impl Resource for Medication {
    const COLLECTION: &'static str = "medications";
    const PLURAL_KEY: &'static str = "medications";
    const SINGULAR: &'static str = "medication";

    fn id(&self) -> Option<i64> {
        self.id
    }
}

/// Entity a process task refers to. Unknown wire values fold into `Other`
/// rather than failing the whole record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Patient,
    Medication,
    Appointment,
    Admission,
    Prescription,
    #[default]
    #[serde(other)]
    Other,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Patient,
        EntityKind::Medication,
        EntityKind::Appointment,
        EntityKind::Admission,
        EntityKind::Prescription,
        EntityKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Patient => "patient",
            EntityKind::Medication => "medication",
            EntityKind::Appointment => "appointment",
            EntityKind::Admission => "admission",
            EntityKind::Prescription => "prescription",
            EntityKind::Other => "other",
        }
    }
}

fn default_sla_minutes() -> i64 {
    60
}

/// An operations/process task. `started_at` and `completed_at` are owned by
/// the server and carried verbatim as RFC 3339 strings; SLA math parses them
/// on demand and degrades to `Unknown` on malformed input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub entity_type: EntityKind,
    #[serde(default)]
    pub entity_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default = "default_sla_minutes")]
    pub sla_minutes: i64,
    #[serde(default)]
    pub priority_score: f64,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

impl Default for ProcessTask {
    fn default() -> Self {
        Self {
            id: None,
            entity_type: EntityKind::default(),
            entity_id: String::new(),
            name: String::new(),
            status: TaskStatus::default(),
            sla_minutes: default_sla_minutes(),
            priority_score: 0.0,
            started_at: None,
            completed_at: None,
        }
    }
}

impl Resource for ProcessTask {
    const COLLECTION: &'static str = "process-tasks";
    const PLURAL_KEY: &'static str = "process_tasks";
    const SINGULAR: &'static str = "task";

    fn id(&self) -> Option<i64> {
        self.id
    }
}

pub fn find_by_id<R: Resource>(records: &[R], id: i64) -> Option<&R> {
    records.iter().find(|r| r.id() == Some(id))
}

pub fn filter_patients_by_search<'a>(patients: &'a [Patient], term: &str) -> Vec<&'a Patient> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return patients.iter().collect();
    }
    patients
        .iter()
        .filter(|p| p.full_name.to_lowercase().contains(&term))
        .collect()
}

pub fn filter_medications_by_search<'a>(
    medications: &'a [Medication],
    term: &str,
) -> Vec<&'a Medication> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return medications.iter().collect();
    }
    medications
        .iter()
        .filter(|m| {
            m.name.to_lowercase().contains(&term)
                || m.active_ingredient
                    .as_deref()
                    .is_some_and(|i| i.to_lowercase().contains(&term))
        })
        .collect()
}

fn digits_of(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// `11122233344` -> `111.222.333-44`; anything else is returned verbatim.
pub fn format_cpf(raw: &str) -> String {
    let digits = digits_of(raw);
    if digits.len() == 11 {
        format!(
            "{}.{}.{}-{}",
            &digits[..3],
            &digits[3..6],
            &digits[6..9],
            &digits[9..]
        )
    } else {
        raw.to_string()
    }
}

/// Brazilian display format for 10- and 11-digit phone numbers.
pub fn format_phone(raw: &str) -> String {
    let digits = digits_of(raw);
    match digits.len() {
        11 => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
        10 => format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..]),
        _ => raw.to_string(),
    }
}

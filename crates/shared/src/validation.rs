//! Field-level form validation, run before any network call. A non-empty
//! result aborts the submission; messages surface one per field.

use std::fmt;

use chrono::NaiveDate;

use crate::domain::{Medication, Patient, ProcessTask};

pub const BIRTHDATE_MIN: (i32, u32, u32) = (1950, 1, 1);
pub const BIRTHDATE_MAX: (i32, u32, u32) = (2025, 12, 31);
pub const SLA_MINUTES_MIN: i64 = 1;
pub const SLA_MINUTES_MAX: i64 = 10_080; // one week

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn digits_of(raw: &str) -> Vec<u32> {
    raw.chars().filter_map(|c| c.to_digit(10)).collect()
}

/// Brazilian CPF check: strip to digits, require exactly 11, reject the
/// all-repeated-digit numbers, then verify both check digits.
pub fn cpf_is_valid(raw: &str) -> bool {
    let digits = digits_of(raw);
    if digits.len() != 11 {
        return false;
    }
    if digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    let check_digit = |take: usize| -> u32 {
        let first_weight = (take + 1) as u32;
        let sum: u32 = digits[..take]
            .iter()
            .enumerate()
            .map(|(i, &d)| d * (first_weight - i as u32))
            .sum();
        let digit = 11 - (sum % 11);
        if digit >= 10 {
            0
        } else {
            digit
        }
    };

    digits[9] == check_digit(9) && digits[10] == check_digit(10)
}

/// Deliberately shallow email shape check; deep RFC validation is a
/// non-goal.
pub fn email_is_valid(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty()
        && !host.starts_with('.')
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// Brazilian phone numbers carry 10 digits, or 11 with the mobile 9.
pub fn phone_is_valid(phone: &str) -> bool {
    matches!(digits_of(phone).len(), 10 | 11)
}

pub fn validate_patient(patient: &Patient) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if patient.full_name.trim().is_empty() {
        errors.push(FieldError::new("full_name", "full name is required"));
    }

    if let Some(birthdate) = patient.birthdate {
        let (y, m, d) = BIRTHDATE_MIN;
        let min = NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN);
        let (y, m, d) = BIRTHDATE_MAX;
        let max = NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MAX);
        if birthdate < min || birthdate > max {
            errors.push(FieldError::new(
                "birthdate",
                format!("birthdate must fall between {min} and {max}"),
            ));
        }
    }

    // Document is optional; when present it must be a valid CPF.
    if let Some(document) = patient.document.as_deref() {
        if !document.trim().is_empty() && !cpf_is_valid(document) {
            errors.push(FieldError::new("document", "invalid CPF"));
        }
    }

    if let Some(contact) = &patient.contact {
        if let Some(phone) = contact.phone.as_deref() {
            if !phone.trim().is_empty() && !phone_is_valid(phone) {
                errors.push(FieldError::new(
                    "contact.phone",
                    "phone must carry 10 or 11 digits",
                ));
            }
        }
        if let Some(email) = contact.email.as_deref() {
            if !email.trim().is_empty() && !email_is_valid(email) {
                errors.push(FieldError::new("contact.email", "invalid email address"));
            }
        }
    }

    errors
}

pub fn validate_medication(medication: &Medication) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if medication.name.trim().is_empty() {
        errors.push(FieldError::new("name", "name is required"));
    }
    errors
}

pub fn validate_task(task: &ProcessTask) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if task.name.trim().is_empty() {
        errors.push(FieldError::new("name", "task name is required"));
    }

    if !(SLA_MINUTES_MIN..=SLA_MINUTES_MAX).contains(&task.sla_minutes) {
        errors.push(FieldError::new(
            "sla_minutes",
            format!("SLA must lie between {SLA_MINUTES_MIN} and {SLA_MINUTES_MAX} minutes"),
        ));
    }

    if !(0.0..=10.0).contains(&task.priority_score) {
        errors.push(FieldError::new(
            "priority_score",
            "priority score must lie between 0.0 and 10.0",
        ));
    }

    errors
}

#[cfg(test)]
mod tests {
    use crate::domain::Contact;

    use super::*;

    #[test]
    fn repeated_digit_cpf_is_rejected() {
        assert!(!cpf_is_valid("111.111.111-11"));
        assert!(!cpf_is_valid("00000000000"));
    }

    #[test]
    fn valid_check_digit_cpf_passes_formatted_or_bare() {
        assert!(cpf_is_valid("529.982.247-25"));
        assert!(cpf_is_valid("52998224725"));
    }

    #[test]
    fn wrong_check_digit_cpf_fails() {
        assert!(!cpf_is_valid("529.982.247-26"));
        assert!(!cpf_is_valid("12345678901"));
    }

    #[test]
    fn cpf_requires_exactly_eleven_digits() {
        assert!(!cpf_is_valid("5299822472"));
        assert!(!cpf_is_valid("529982247255"));
        assert!(!cpf_is_valid(""));
    }

    #[test]
    fn email_shape_check_is_shallow_but_sane() {
        assert!(email_is_valid("ana.souza@hospital.org.br"));
        assert!(!email_is_valid("ana.souza"));
        assert!(!email_is_valid("@hospital.org"));
        assert!(!email_is_valid("ana@hospital"));
        assert!(!email_is_valid("ana@hospital.9"));
    }

    #[test]
    fn phone_accepts_ten_or_eleven_digits() {
        assert!(phone_is_valid("(11) 98765-4321"));
        assert!(phone_is_valid("1133334444"));
        assert!(!phone_is_valid("12345"));
        assert!(!phone_is_valid(""));
    }

    #[test]
    fn patient_with_empty_optionals_is_valid() {
        let patient = Patient {
            full_name: "Maria Souza".into(),
            ..Patient::default()
        };
        assert!(validate_patient(&patient).is_empty());
    }

    #[test]
    fn patient_errors_report_one_message_per_field() {
        let patient = Patient {
            full_name: "  ".into(),
            birthdate: NaiveDate::from_ymd_opt(1949, 12, 31),
            document: Some("111.111.111-11".into()),
            contact: Some(Contact {
                phone: Some("123".into()),
                email: Some("nope".into()),
                address: None,
            }),
            ..Patient::default()
        };
        let errors = validate_patient(&patient);
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            ["full_name", "birthdate", "document", "contact.phone", "contact.email"]
        );
    }

    #[test]
    fn medication_requires_a_name() {
        let medication = Medication::default();
        let errors = validate_medication(&medication);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "name");
    }

    #[test]
    fn task_bounds_are_enforced() {
        let task = ProcessTask {
            name: "Triage".into(),
            sla_minutes: 0,
            priority_score: 10.5,
            ..ProcessTask::default()
        };
        let errors = validate_task(&task);
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, ["sla_minutes", "priority_score"]);

        let ok = ProcessTask {
            name: "Triage".into(),
            sla_minutes: 10_080,
            priority_score: 10.0,
            ..ProcessTask::default()
        };
        assert!(validate_task(&ok).is_empty());
    }
}

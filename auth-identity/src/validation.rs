//! Field rules for identities and role extensions.
//!
//! Every validator collects all violations before failing so a client can
//! fix a form in one round trip.

use crate::config::DEFAULT_PASSWORD_MIN_LENGTH;
use crate::error::{IdentityError, Result};
use crate::models::{
    Availability, DoctorProfile, NewIdentity, NumberInput, NurseProfile, PatientProfile, Role,
    RoleFields, RoleProfile, WorkingHours,
};
use validator::ValidateEmail;

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_PASSWORD_MIN_LENGTH,
        }
    }
}

impl PasswordPolicy {
    /// Returns every rule `password` breaks.
    #[must_use]
    pub fn violations(&self, password: &str) -> Vec<String> {
        let mut violations = Vec::new();
        if password.chars().count() < self.min_length {
            violations.push(format!(
                "Password must be at least {} characters long",
                self.min_length
            ));
        }
        if !password.chars().any(char::is_alphabetic) {
            violations.push("Password must contain at least one letter".to_string());
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            violations.push("Password must contain at least one number".to_string());
        }
        violations
    }
}

/// Identity fields after validation, ready for hashing and storage.
#[derive(Debug, Clone)]
pub struct ValidIdentity {
    pub name: String,
    pub email: String,
    pub age: i32,
    pub role: Role,
}

/// Trims and lowercases an email for storage and lookup.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// # Errors
///
/// Returns [`IdentityError::Validation`] listing every violated constraint.
pub fn validate_identity(input: &NewIdentity, policy: &PasswordPolicy) -> Result<ValidIdentity> {
    let mut violations = Vec::new();

    let name = input.name.trim().to_string();
    if name.is_empty() {
        violations.push("Please provide a name".to_string());
    }

    let email = normalize_email(&input.email);
    if !email.validate_email() {
        violations.push("Please provide a valid email".to_string());
    }

    let age = match input.age.as_integer().map(i32::try_from) {
        Some(Ok(age)) if age > 0 => Some(age),
        _ => {
            violations.push("Age must be a positive integer".to_string());
            None
        }
    };

    let role = match input.role.parse::<Role>() {
        Ok(role) => Some(role),
        Err(IdentityError::Validation(mut messages)) => {
            violations.append(&mut messages);
            None
        }
        Err(other) => return Err(other),
    };

    violations.extend(policy.violations(&input.password));

    match (age, role) {
        (Some(age), Some(role)) if violations.is_empty() => Ok(ValidIdentity {
            name,
            email,
            age,
            role,
        }),
        _ => Err(IdentityError::Validation(violations)),
    }
}

/// Builds the extension variant for `role` from the submitted fields.
///
/// # Errors
///
/// Returns [`IdentityError::Validation`] naming each missing or invalid field.
pub fn validate_extension(role: Role, fields: &RoleFields) -> Result<RoleProfile> {
    match role {
        Role::Doctor => validate_doctor(fields).map(RoleProfile::Doctor),
        Role::Nurse => validate_nurse(fields).map(RoleProfile::Nurse),
        Role::Patient => validate_patient(fields).map(RoleProfile::Patient),
    }
}

fn validate_doctor(fields: &RoleFields) -> Result<DoctorProfile> {
    let mut violations = Vec::new();

    let specialization = required_text(
        fields.specialization.as_deref(),
        "Please provide a specialization",
        &mut violations,
    );

    let experience_years = match fields
        .experience
        .as_ref()
        .map(|experience| experience.as_integer().map(i32::try_from))
    {
        Some(Some(Ok(years))) if years >= 0 => Some(years),
        Some(_) => {
            violations.push("Experience must be a non-negative number of years".to_string());
            None
        }
        None => {
            violations.push("Please provide years of experience".to_string());
            None
        }
    };

    let availability = validate_availability(fields, &mut violations);

    let consultation_fee = match fields.consultation_fee.as_ref().map(NumberInput::as_amount) {
        Some(Some(fee)) if fee >= 0.0 => Some(fee),
        Some(_) => {
            violations.push("Consultation fee must be a non-negative amount".to_string());
            None
        }
        None => {
            violations.push("Please provide a consultation fee".to_string());
            None
        }
    };

    match (specialization, experience_years, availability, consultation_fee) {
        (Some(specialization), Some(experience_years), Some(availability), Some(consultation_fee))
            if violations.is_empty() =>
        {
            Ok(DoctorProfile {
                specialization,
                experience_years,
                availability,
                consultation_fee,
            })
        }
        _ => Err(IdentityError::Validation(violations)),
    }
}

fn validate_availability(fields: &RoleFields, violations: &mut Vec<String>) -> Option<Availability> {
    let Some(availability) = fields.availability.as_ref() else {
        violations.push("Please provide availability".to_string());
        return None;
    };

    let mut days = Vec::new();
    match availability.days.as_deref() {
        Some(submitted) if !submitted.is_empty() => {
            for day in submitted {
                match canonical_weekday(day) {
                    Some(canonical) if !days.contains(&canonical) => days.push(canonical),
                    Some(_) => {}
                    None => violations.push(format!("'{}' is not a valid day", day.trim())),
                }
            }
        }
        _ => violations.push("Please provide at least one available day".to_string()),
    }

    let hours = availability.working_hours.clone().unwrap_or_default();
    let start = working_hour(hours.start.as_deref(), "start", violations);
    let end = working_hour(hours.end.as_deref(), "end", violations);

    match (start, end) {
        (Some(start), Some(end)) if !days.is_empty() => Some(Availability {
            days,
            working_hours: WorkingHours { start, end },
        }),
        _ => None,
    }
}

fn validate_nurse(fields: &RoleFields) -> Result<NurseProfile> {
    let mut violations = Vec::new();
    let department = required_text(
        fields.department.as_deref(),
        "Please provide a department",
        &mut violations,
    );
    let shift = required_text(
        fields.shift.as_deref(),
        "Please provide a shift",
        &mut violations,
    );

    match (department, shift) {
        (Some(department), Some(shift)) => Ok(NurseProfile { department, shift }),
        _ => Err(IdentityError::Validation(violations)),
    }
}

fn validate_patient(fields: &RoleFields) -> Result<PatientProfile> {
    let mut violations = Vec::new();
    let blood_group = required_text(
        fields.blood_group.as_deref(),
        "Please provide a blood group",
        &mut violations,
    );

    match blood_group {
        Some(blood_group) => Ok(PatientProfile {
            medical_history: fields.medical_history.clone().unwrap_or_default(),
            allergies: fields.allergies.clone().unwrap_or_default(),
            blood_group,
        }),
        None => Err(IdentityError::Validation(violations)),
    }
}

fn required_text(value: Option<&str>, message: &str, violations: &mut Vec<String>) -> Option<String> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Some(text.to_string()),
        _ => {
            violations.push(message.to_string());
            None
        }
    }
}

fn canonical_weekday(day: &str) -> Option<String> {
    let day = day.trim();
    WEEKDAYS
        .iter()
        .find(|weekday| weekday.eq_ignore_ascii_case(day))
        .map(|weekday| (*weekday).to_string())
}

fn working_hour(value: Option<&str>, bound: &str, violations: &mut Vec<String>) -> Option<String> {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        violations.push(format!("Please provide a working hours {bound} time"));
        return None;
    };

    if is_clock_time(value) {
        Some(value.to_string())
    } else {
        violations.push(format!("Working hours {bound} must use HH:MM format"));
        None
    }
}

fn is_clock_time(value: &str) -> bool {
    let Some((hours, minutes)) = value.split_once(':') else {
        return false;
    };
    let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(hours) || !two_digits(minutes) {
        return false;
    }
    matches!(
        (hours.parse::<u8>(), minutes.parse::<u8>()),
        (Ok(h), Ok(m)) if h < 24 && m < 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvailabilityInput, WorkingHoursInput};

    fn new_identity(email: &str, age: i64, password: &str, role: &str) -> NewIdentity {
        NewIdentity {
            name: "Alice".into(),
            email: email.into(),
            age: age.into(),
            password: password.into(),
            role: role.into(),
        }
    }

    fn doctor_fields() -> RoleFields {
        RoleFields {
            specialization: Some("Cardiology".into()),
            experience: Some(10_i64.into()),
            availability: Some(AvailabilityInput {
                days: Some(vec!["monday".into(), "WEDNESDAY".into()]),
                working_hours: Some(WorkingHoursInput {
                    start: Some("09:00".into()),
                    end: Some("17:30".into()),
                }),
            }),
            consultation_fee: Some(75.0_f64.into()),
            ..Default::default()
        }
    }

    #[test]
    fn valid_identity_is_normalized() {
        let input = new_identity("  Alice@X.com ", 30, "secret123", "Nurse");
        let valid = validate_identity(&input, &PasswordPolicy::default()).unwrap();
        assert_eq!(valid.email, "alice@x.com");
        assert_eq!(valid.role, Role::Nurse);
        assert_eq!(valid.age, 30);
    }

    #[test]
    fn identity_violations_are_collected() {
        let mut input = new_identity("not-an-email", 0, "short", "admin");
        input.name = " ".into();
        let Err(IdentityError::Validation(violations)) =
            validate_identity(&input, &PasswordPolicy::default())
        else {
            panic!("expected validation failure");
        };

        assert!(violations.contains(&"Please provide a name".to_string()));
        assert!(violations.contains(&"Please provide a valid email".to_string()));
        assert!(violations.contains(&"Age must be a positive integer".to_string()));
        assert!(violations.iter().any(|v| v.starts_with("Role must be")));
        assert!(violations.iter().any(|v| v.contains("at least 8 characters")));
        assert!(violations.iter().any(|v| v.contains("one number")));
    }

    #[test]
    fn age_must_be_a_whole_number() {
        let policy = PasswordPolicy::default();
        let with_age = |age: NumberInput| NewIdentity {
            age,
            ..new_identity("a@x.com", 1, "secret123", "nurse")
        };

        let valid = validate_identity(&with_age(NumberInput::Text("30".into())), &policy).unwrap();
        assert_eq!(valid.age, 30);

        for age in [NumberInput::from(30.5), NumberInput::Text("abc".into())] {
            match validate_identity(&with_age(age), &policy) {
                Err(IdentityError::Validation(violations)) => {
                    assert_eq!(violations, vec!["Age must be a positive integer"]);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn non_integer_age_is_reported_with_other_violations() {
        let mut input = new_identity("not-an-email", 1, "short", "nurse");
        input.age = NumberInput::from(30.5);
        let Err(IdentityError::Validation(violations)) =
            validate_identity(&input, &PasswordPolicy::default())
        else {
            panic!("expected validation failure");
        };
        assert!(violations.contains(&"Please provide a valid email".to_string()));
        assert!(violations.contains(&"Age must be a positive integer".to_string()));
        assert!(violations.iter().any(|v| v.contains("at least 8 characters")));
    }

    #[test]
    fn doctor_numbers_accept_numeric_strings() {
        let fields = RoleFields {
            experience: Some(NumberInput::Text("12".into())),
            consultation_fee: Some(NumberInput::Text("60.5".into())),
            ..doctor_fields()
        };
        let Ok(RoleProfile::Doctor(doctor)) = validate_extension(Role::Doctor, &fields) else {
            panic!("expected doctor profile");
        };
        assert_eq!(doctor.experience_years, 12);

        let fields = RoleFields {
            experience: Some(NumberInput::from(2.5)),
            consultation_fee: Some(NumberInput::Text("free".into())),
            ..doctor_fields()
        };
        let Err(IdentityError::Validation(violations)) = validate_extension(Role::Doctor, &fields)
        else {
            panic!("expected validation failure");
        };
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn password_policy() {
        let policy = PasswordPolicy::default();
        assert!(policy.violations("secret123").is_empty());
        assert_eq!(policy.violations("12345678").len(), 1);
        assert_eq!(policy.violations("abcdefgh").len(), 1);
        assert_eq!(policy.violations("a1").len(), 1);
    }

    #[test]
    fn doctor_extension_canonicalizes_days() {
        let RoleProfile::Doctor(doctor) = validate_extension(Role::Doctor, &doctor_fields()).unwrap()
        else {
            panic!("expected doctor profile");
        };
        assert_eq!(doctor.availability.days, vec!["Monday", "Wednesday"]);
        assert_eq!(doctor.availability.working_hours.end, "17:30");
    }

    #[test]
    fn doctor_missing_specialization_is_named() {
        let fields = RoleFields {
            specialization: None,
            ..doctor_fields()
        };
        match validate_extension(Role::Doctor, &fields) {
            Err(IdentityError::Validation(violations)) => {
                assert_eq!(violations, vec!["Please provide a specialization"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn doctor_rejects_bad_availability() {
        let fields = RoleFields {
            availability: Some(AvailabilityInput {
                days: Some(vec!["Funday".into()]),
                working_hours: Some(WorkingHoursInput {
                    start: Some("9am".into()),
                    end: None,
                }),
            }),
            experience: Some((-1_i64).into()),
            consultation_fee: Some((-5.0_f64).into()),
            ..doctor_fields()
        };
        let Err(IdentityError::Validation(violations)) = validate_extension(Role::Doctor, &fields)
        else {
            panic!("expected validation failure");
        };
        assert_eq!(violations.len(), 5);
    }

    #[test]
    fn doctor_requires_at_least_one_day() {
        let fields = RoleFields {
            availability: Some(AvailabilityInput {
                days: Some(vec![]),
                working_hours: Some(WorkingHoursInput {
                    start: Some("09:00".into()),
                    end: Some("17:00".into()),
                }),
            }),
            ..doctor_fields()
        };
        assert!(validate_extension(Role::Doctor, &fields).is_err());
    }

    #[test]
    fn nurse_and_patient_rules() {
        let nurse = RoleFields {
            department: Some("ER".into()),
            shift: Some("night".into()),
            ..Default::default()
        };
        assert!(matches!(
            validate_extension(Role::Nurse, &nurse),
            Ok(RoleProfile::Nurse(_))
        ));
        assert!(validate_extension(Role::Nurse, &RoleFields::default()).is_err());

        let patient = RoleFields {
            blood_group: Some("O+".into()),
            ..Default::default()
        };
        let Ok(RoleProfile::Patient(profile)) = validate_extension(Role::Patient, &patient) else {
            panic!("expected patient profile");
        };
        assert_eq!(profile.medical_history, "");
        assert_eq!(profile.allergies, "");
    }

    #[test]
    fn clock_times() {
        assert!(is_clock_time("00:00"));
        assert!(is_clock_time("23:59"));
        assert!(!is_clock_time("24:00"));
        assert!(!is_clock_time("9:00"));
        assert!(!is_clock_time("09-00"));
        assert!(!is_clock_time("+9:00"));
        assert!(!is_clock_time("09:+5"));
        assert!(!is_clock_time("+1:+5"));
    }
}

use crate::error::{IdentityError, Result};
use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Nurse,
    Patient,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Doctor, Role::Nurse, Role::Patient];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Patient => "patient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = IdentityError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "doctor" => Ok(Role::Doctor),
            "nurse" => Ok(Role::Nurse),
            "patient" => Ok(Role::Patient),
            _ => Err(IdentityError::Validation(vec![
                "Role must be one of doctor, nurse or patient".to_string(),
            ])),
        }
    }
}

/// Stored identity record. Only the store and the hasher ever see
/// `password_hash`; everything leaving the crate goes through a view.
#[derive(Clone)]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    #[must_use]
    pub fn view(&self) -> IdentityView {
        IdentityView {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            age: self.age,
            role: self.role,
            created_at: self.created_at,
        }
    }

    #[must_use]
    pub fn session_view(&self) -> SessionView {
        self.view().session_view()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("age", &self.age)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Public identity as returned from signup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl IdentityView {
    #[must_use]
    pub fn session_view(&self) -> SessionView {
        SessionView {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Narrower view returned from login and `/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub days: Vec<String>,
    pub working_hours: WorkingHours,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorProfile {
    pub specialization: String,
    pub experience_years: i32,
    pub availability: Availability,
    pub consultation_fee: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NurseProfile {
    pub department: String,
    pub shift: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    pub medical_history: String,
    pub allergies: String,
    pub blood_group: String,
}

/// Role-specific detail; the variant always matches the owning identity's role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum RoleProfile {
    Doctor(DoctorProfile),
    Nurse(NurseProfile),
    Patient(PatientProfile),
}

impl RoleProfile {
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Doctor(_) => Role::Doctor,
            RoleProfile::Nurse(_) => Role::Nurse,
            RoleProfile::Patient(_) => Role::Patient,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleExtension {
    pub identity_id: Uuid,
    pub profile: RoleProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoleExtension {
    #[must_use]
    pub fn new(identity_id: Uuid, profile: RoleProfile) -> Self {
        let now = Utc::now();
        Self {
            identity_id,
            profile,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.profile.role()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHoursInput {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityInput {
    pub days: Option<Vec<String>>,
    pub working_hours: Option<WorkingHoursInput>,
}

/// A numeric form field as submitted.
///
/// Numbers and numeric strings are both accepted so that a value of the
/// wrong shape becomes a validation violation rather than a body error.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Integer(i64),
    Decimal(f64),
    Text(String),
    Other(IgnoredAny),
}

impl NumberInput {
    /// Whole-number value, if the input denotes one (`30`, `30.0`, `"30"`).
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Decimal(value) => whole_number(*value),
            Self::Text(text) => {
                let text = text.trim();
                text.parse::<i64>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().and_then(whole_number))
            }
            Self::Other(_) => None,
        }
    }

    /// Finite numeric value (`80.5`, `"80.5"`).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_amount(&self) -> Option<f64> {
        let amount = match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Decimal(value) => Some(*value),
            Self::Text(text) => text.trim().parse::<f64>().ok(),
            Self::Other(_) => None,
        };
        amount.filter(|value| value.is_finite())
    }

    fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }
}

impl From<i64> for NumberInput {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for NumberInput {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn whole_number(value: f64) -> Option<i64> {
    // Bounded well inside i64 so the cast is exact.
    (value.is_finite() && value.fract() == 0.0 && value.abs() <= f64::from(u32::MAX))
        .then_some(value as i64)
}

/// Unvalidated role-specific fields as they arrive with a signup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleFields {
    pub specialization: Option<String>,
    pub experience: Option<NumberInput>,
    pub availability: Option<AvailabilityInput>,
    pub consultation_fee: Option<NumberInput>,
    pub department: Option<String>,
    pub shift: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub blood_group: Option<String>,
}

/// Base identity fields once presence has been checked.
#[derive(Clone)]
pub struct NewIdentity {
    pub name: String,
    pub email: String,
    pub age: NumberInput,
    pub password: String,
    pub role: String,
}

impl fmt::Debug for NewIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewIdentity")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("age", &self.age)
            .field("password", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct RegistrationRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<NumberInput>,
    pub password: Option<String>,
    pub role: Option<String>,
    #[serde(flatten)]
    pub fields: RoleFields,
}

impl RegistrationRequest {
    /// Splits the request into base identity and role fields.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MissingFields`] naming every absent or blank
    /// base field.
    pub fn into_parts(self) -> Result<(NewIdentity, RoleFields)> {
        let mut missing = Vec::new();
        let name = present(self.name, "name", &mut missing);
        let email = present(self.email, "email", &mut missing);
        let password = present(self.password, "password", &mut missing);
        let role = present(self.role, "role", &mut missing);
        let age = self.age.filter(|age| !age.is_blank());
        if age.is_none() {
            missing.push("age".to_string());
        }

        match (name, email, age, password, role) {
            (Some(name), Some(email), Some(age), Some(password), Some(role)) => Ok((
                NewIdentity {
                    name,
                    email,
                    age,
                    password,
                    role,
                },
                self.fields,
            )),
            _ => Err(IdentityError::MissingFields(missing)),
        }
    }
}

impl fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("age", &self.age)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("role", &self.role)
            .field("fields", &self.fields)
            .finish()
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    /// # Errors
    ///
    /// Returns [`IdentityError::MissingFields`] if email or password is absent.
    pub fn into_parts(self) -> Result<(String, String)> {
        let mut missing = Vec::new();
        let email = present(self.email, "email", &mut missing);
        let password = present(self.password, "password", &mut missing);
        match (email, password) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(IdentityError::MissingFields(missing)),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn present(value: Option<String>, field: &str, missing: &mut Vec<String>) -> Option<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Some(value),
        _ => {
            missing.push(field.to_string());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Doctor".parse::<Role>().unwrap(), Role::Doctor);
        assert_eq!(" nurse ".parse::<Role>().unwrap(), Role::Nurse);
        assert!(matches!(
            "admin".parse::<Role>(),
            Err(IdentityError::Validation(_))
        ));
    }

    #[test]
    fn registration_request_reads_flattened_role_fields() {
        let request: RegistrationRequest = serde_json::from_value(serde_json::json!({
            "name": "Dana",
            "email": "dana@x.com",
            "age": 41,
            "password": "secret123",
            "role": "doctor",
            "specialization": "Cardiology",
            "experience": 12,
            "availability": {
                "days": ["Monday", "Friday"],
                "workingHours": { "start": "09:00", "end": "17:00" }
            },
            "consultationFee": 80.5
        }))
        .unwrap();

        let (identity, fields) = request.into_parts().unwrap();
        assert_eq!(identity.role, "doctor");
        assert_eq!(fields.specialization.as_deref(), Some("Cardiology"));
        assert_eq!(fields.experience, Some(NumberInput::Integer(12)));
        assert_eq!(fields.consultation_fee, Some(NumberInput::Decimal(80.5)));
        let hours = fields.availability.unwrap().working_hours.unwrap();
        assert_eq!(hours.start.as_deref(), Some("09:00"));
    }

    #[test]
    fn numeric_fields_accept_any_json_shape() {
        let request: RegistrationRequest = serde_json::from_value(serde_json::json!({
            "name": "Dana",
            "email": "dana@x.com",
            "age": "30",
            "password": "secret123",
            "role": "doctor",
            "experience": 7.5,
            "consultationFee": { "amount": 10 }
        }))
        .unwrap();

        let (identity, fields) = request.into_parts().unwrap();
        assert_eq!(identity.age.as_integer(), Some(30));
        assert_eq!(fields.experience.unwrap().as_integer(), None);
        assert_eq!(fields.consultation_fee.unwrap().as_amount(), None);
    }

    #[test]
    fn number_input_conversions() {
        assert_eq!(NumberInput::from(30_i64).as_integer(), Some(30));
        assert_eq!(NumberInput::from(30.0).as_integer(), Some(30));
        assert_eq!(NumberInput::from(30.5).as_integer(), None);
        assert_eq!(NumberInput::Text(" 30 ".into()).as_integer(), Some(30));
        assert_eq!(NumberInput::Text("abc".into()).as_integer(), None);
        assert_eq!(NumberInput::Text("80.5".into()).as_amount(), Some(80.5));
        assert_eq!(NumberInput::Text("NaN".into()).as_amount(), None);
    }

    #[test]
    fn blank_age_counts_as_missing() {
        let request = RegistrationRequest {
            name: Some("Dana".into()),
            email: Some("dana@x.com".into()),
            age: Some(NumberInput::Text(" ".into())),
            password: Some("secret123".into()),
            role: Some("patient".into()),
            ..Default::default()
        };
        match request.into_parts() {
            Err(IdentityError::MissingFields(fields)) => assert_eq!(fields, vec!["age"]),
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let request = RegistrationRequest {
            name: Some("  ".into()),
            email: Some("a@x.com".into()),
            ..Default::default()
        };
        match request.into_parts() {
            Err(IdentityError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["name", "password", "role", "age"]);
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn debug_output_hides_secrets() {
        let request = LoginRequest {
            email: Some("a@x.com".into()),
            password: Some("secret123".into()),
        };
        assert!(!format!("{request:?}").contains("secret123"));

        let identity = Identity {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: "a@x.com".into(),
            age: 30,
            password_hash: "$argon2id$v=19$...".into(),
            role: Role::Nurse,
            created_at: Utc::now(),
        };
        assert!(!format!("{identity:?}").contains("argon2id"));
    }

    #[test]
    fn views_serialize_camel_case_without_hash() {
        let identity = Identity {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: "a@x.com".into(),
            age: 30,
            password_hash: "hash".into(),
            role: Role::Nurse,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(identity.view()).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "nurse");

        let session = serde_json::to_value(identity.session_view()).unwrap();
        assert!(session.get("age").is_none());
        assert!(session.get("createdAt").is_none());
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{validate_birth_date, validate_email, validate_name};
use crate::error::RollcallError;

/// Enrollment status of a student.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    #[default]
    Active,
    Inactive,
}

impl std::fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

impl std::str::FromStr for StudentStatus {
    type Err = RollcallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(RollcallError::validation(
                "status",
                format!("'{other}' is neither active nor inactive"),
            )),
        }
    }
}

/// A student record as stored by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub name: String,
    #[serde(alias = "birth_date")]
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "class_id")]
    pub class_id: Option<i64>,
    #[serde(default)]
    pub status: StudentStatus,
}

/// A class (school group) as stored by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub capacity: Option<u32>,
}

/// Unchecked student input, as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDraft {
    pub name: String,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub class_id: Option<i64>,
    #[serde(default)]
    pub status: StudentStatus,
}

impl StudentDraft {
    /// Check every field and produce a [`NewStudent`].
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate(self) -> Result<NewStudent, RollcallError> {
        Ok(NewStudent {
            name: validate_name(&self.name)?,
            birth_date: validate_birth_date(self.birth_date)?,
            email: validate_email(self.email.as_deref())?,
            class_id: self.class_id,
            status: self.status,
        })
    }
}

/// A validated student ready to be created on the service.
///
/// Only obtainable through [`StudentDraft::validate`]; deserializing one
/// re-runs the same checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StudentDraft")]
pub struct NewStudent {
    name: String,
    birth_date: NaiveDate,
    email: Option<String>,
    class_id: Option<i64>,
    status: StudentStatus,
}

impl TryFrom<StudentDraft> for NewStudent {
    type Error = RollcallError;

    fn try_from(draft: StudentDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl NewStudent {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn birth_date(&self) -> NaiveDate {
        self.birth_date
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    #[must_use]
    pub const fn class_id(&self) -> Option<i64> {
        self.class_id
    }

    #[must_use]
    pub const fn status(&self) -> StudentStatus {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> StudentDraft {
        StudentDraft {
            name: name.to_string(),
            birth_date: NaiveDate::from_ymd_opt(2012, 3, 14).unwrap(),
            email: Some("ana.silva@escola.com".to_string()),
            class_id: Some(1),
            status: StudentStatus::Active,
        }
    }

    #[test]
    fn test_validate_draft() {
        let student = draft("  Ana Silva ").validate().unwrap();
        assert_eq!(student.name(), "Ana Silva");
        assert_eq!(student.email(), Some("ana.silva@escola.com"));
        assert_eq!(student.class_id(), Some(1));
        assert_eq!(student.status(), StudentStatus::Active);
    }

    #[test]
    fn test_validate_draft_rejects_short_name() {
        assert!(matches!(
            draft("Al").validate(),
            Err(RollcallError::Validation { field: "name", .. })
        ));
    }

    #[test]
    fn test_new_student_wire_format() {
        let student = draft("Ana Silva").validate().unwrap();
        let json = serde_json::to_value(&student).unwrap();

        assert_eq!(json["name"], "Ana Silva");
        assert_eq!(json["birthDate"], "2012-03-14");
        assert_eq!(json["classId"], 1);
        assert_eq!(json["status"], "active");
    }

    #[test]
    fn test_new_student_deserialize_revalidates() {
        let json = r#"{"name":"Al","birthDate":"2012-03-14","email":null,"classId":null,"status":"active"}"#;
        assert!(serde_json::from_str::<NewStudent>(json).is_err());
    }

    #[test]
    fn test_student_accepts_snake_case_fields() {
        let json = r#"{"id":7,"name":"Hugo Pereira","birth_date":"2011-05-02","email":null,"class_id":3,"status":"inactive"}"#;
        let student: Student = serde_json::from_str(json).unwrap();
        assert_eq!(student.id, 7);
        assert_eq!(student.class_id, Some(3));
        assert_eq!(student.status, StudentStatus::Inactive);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("Active".parse::<StudentStatus>().unwrap(), StudentStatus::Active);
        assert_eq!("inactive".parse::<StudentStatus>().unwrap(), StudentStatus::Inactive);
        assert!("graduated".parse::<StudentStatus>().is_err());
    }
}

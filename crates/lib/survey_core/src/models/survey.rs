//! Survey form input and its validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::building::{BuildingNumber, BuildingTag};
use super::wire::SurveyPayload;

/// Satisfaction scale (inclusive).
pub const SATISFACTION_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Form validation errors. Messages are shown next to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurveyError {
    #[error("Please enter your student number: type the 6 digits after 's' (e.g. s123456).")]
    MissingStudentNumber,

    #[error("Format: exactly 6 digits. Example: s123456. Don't type the 's', it's already filled in.")]
    MalformedStudentNumber,

    #[error("Please enter your DTU username.")]
    MissingUsername,

    #[error("Please choose a satisfaction rating between 1 and 5.")]
    SatisfactionOutOfRange,

    #[error("Unknown role: {0}")]
    UnknownRole(String),
}

/// Who is answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Employee,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => f.write_str("student"),
            Role::Employee => f.write_str("employee"),
        }
    }
}

impl FromStr for Role {
    type Err = SurveyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "employee" => Ok(Role::Employee),
            other => Err(SurveyError::UnknownRole(other.to_string())),
        }
    }
}

/// Raw values as typed into the survey form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurveyForm {
    pub role: Role,
    /// Six digits, typed without the leading `s`.
    pub student_number: String,
    pub username: String,
    pub satisfaction: u8,
    pub course_number: String,
    pub workshop: bool,
}

impl SurveyForm {
    /// Validate the student-number field. Only enforced for students.
    pub fn check_student_number(&self) -> Result<(), SurveyError> {
        if self.role != Role::Student {
            return Ok(());
        }
        let v = self.student_number.trim();
        if v.is_empty() {
            Err(SurveyError::MissingStudentNumber)
        } else if v.len() != 6 || !v.bytes().all(|b| b.is_ascii_digit()) {
            Err(SurveyError::MalformedStudentNumber)
        } else {
            Ok(())
        }
    }

    /// Validate the form and build the wire payload.
    ///
    /// Students send `s` + digits and a null username; employees send the
    /// trimmed username and a null student number.
    pub fn to_payload(
        &self,
        building: Option<BuildingNumber>,
        token: Option<&str>,
    ) -> Result<SurveyPayload, SurveyError> {
        self.check_student_number()?;
        if !SATISFACTION_RANGE.contains(&self.satisfaction) {
            return Err(SurveyError::SatisfactionOutOfRange);
        }

        let (student_number, username) = match self.role {
            Role::Student => (Some(format!("s{}", self.student_number.trim())), None),
            Role::Employee => {
                let username = self.username.trim();
                if username.is_empty() {
                    return Err(SurveyError::MissingUsername);
                }
                (None, Some(username.to_string()))
            }
        };

        let course = self.course_number.trim();

        Ok(SurveyPayload {
            role: self.role,
            student_number,
            username,
            satisfaction: self.satisfaction,
            course_number: (!course.is_empty()).then(|| course.to_string()),
            building_number: building.map(BuildingTag::Building),
            workshop: self.workshop,
            token: token.map(str::to_string),
        })
    }
}

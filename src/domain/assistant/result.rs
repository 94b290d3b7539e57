//! Retrieval outcomes, one variant per intent.

use serde::{Deserialize, Serialize};

use super::aggregates::{AttendanceSummary, ExcuseSummary};
use super::intent::Intent;
use crate::domain::foundation::Role;
use crate::domain::school::{AttendanceRecord, ClassSummary, ExcuseRecord, TeacherRecord};

/// Capabilities advertised for `help` questions.
pub const CAPABILITIES: &[&str] = &[
    "Attendance summaries and rates, e.g. \"What's my attendance rate this month?\"",
    "Absences and late marks for a period, e.g. \"How many times was I late last week?\"",
    "Class schedules and rooms, e.g. \"What is my schedule?\"",
    "Enrolled classes and subjects",
    "Teacher directory for your classes",
    "Excuse request status, e.g. \"Do I have pending excuse requests?\"",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RetrievalResult {
    Attendance {
        records: Vec<AttendanceRecord>,
        summary: AttendanceSummary,
        scope: String,
    },
    Schedule {
        classes: Vec<ClassSummary>,
        scope: String,
    },
    Classes {
        classes: Vec<ClassSummary>,
        scope: String,
    },
    Teachers {
        teachers: Vec<TeacherRecord>,
        scope: String,
    },
    Excuses {
        records: Vec<ExcuseRecord>,
        summary: ExcuseSummary,
        scope: String,
    },
    Help {
        capabilities: Vec<String>,
    },
    Unsupported {
        message: String,
    },
    /// Storage failed; no partial data is kept.
    Error {
        error: String,
    },
}

impl RetrievalResult {
    pub fn help() -> Self {
        RetrievalResult::Help {
            capabilities: CAPABILITIES.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn unsupported() -> Self {
        RetrievalResult::Unsupported {
            message: "Could not map question to a supported retrieval intent.".to_string(),
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        RetrievalResult::Error {
            error: reason.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RetrievalResult::Error { .. })
    }

    /// Number of list rows carried.
    pub fn row_count(&self) -> usize {
        match self {
            RetrievalResult::Attendance { records, .. } => records.len(),
            RetrievalResult::Excuses { records, .. } => records.len(),
            RetrievalResult::Schedule { classes, .. } | RetrievalResult::Classes { classes, .. } => {
                classes.len()
            }
            RetrievalResult::Teachers { teachers, .. } => teachers.len(),
            RetrievalResult::Help { capabilities } => capabilities.len(),
            RetrievalResult::Unsupported { .. } | RetrievalResult::Error { .. } => 0,
        }
    }
}

/// Human wording of whose data a result covers.
pub fn describe_scope(role: Role, intent: Intent) -> String {
    let text = match (intent, role) {
        (Intent::Schedule | Intent::Classes, Role::Student) => "your enrolled classes",
        (Intent::Schedule | Intent::Classes, Role::Teacher) => "classes you teach",
        (Intent::Schedule | Intent::Classes, _) => "all active classes",
        (Intent::Teacher, Role::Student) => "teachers of your classes",
        (Intent::Teacher, Role::Teacher) => "your own record",
        (Intent::Teacher, _) => "all teachers",
        (_, Role::Student) => "for you",
        (_, Role::Teacher) => "for students in your classes",
        (_, _) => "for all students",
    };
    text.to_string()
}

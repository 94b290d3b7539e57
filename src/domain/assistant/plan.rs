//! Retrieval plans: what will be read, for whom, and within which bounds.

use serde::{Deserialize, Serialize};

use super::intent::{contains_phrase, Intent};
use super::time_window::TimeWindow;
use crate::domain::foundation::{Role, StudentId, TeacherId, UserId};
use crate::domain::school::{AttendanceStatus, ExcuseStatus};

/// Rows a student-scoped query may return.
pub const STUDENT_ROW_CAP: usize = 100;

/// Rows any other scope may return.
pub const WIDE_ROW_CAP: usize = 200;

/// Table groups a plan reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    AttendanceRecords,
    AttendanceSessions,
    ClassModels,
    ClassEnrollments,
    Teachers,
    ExcuseRequests,
    Students,
}

impl Dataset {
    pub fn for_intent(intent: Intent) -> Vec<Dataset> {
        match intent {
            Intent::Attendance => vec![
                Dataset::AttendanceRecords,
                Dataset::AttendanceSessions,
                Dataset::Students,
            ],
            Intent::Schedule | Intent::Classes => {
                vec![Dataset::ClassModels, Dataset::ClassEnrollments]
            }
            Intent::Teacher => vec![Dataset::Teachers, Dataset::ClassModels],
            Intent::Excuse => vec![Dataset::ExcuseRequests, Dataset::Students],
            Intent::Help | Intent::Unknown => Vec::new(),
        }
    }
}

/// Status narrowing parsed from the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum StatusFilter {
    Attendance(AttendanceStatus),
    Excuse(ExcuseStatus),
}

impl StatusFilter {
    /// Only attendance and excuse intents take a status filter.
    pub fn extract(intent: Intent, normalized: &str) -> Option<StatusFilter> {
        match intent {
            Intent::Attendance => {
                let status = if any_phrase(normalized, &["absent", "absence", "absences", "absents", "missed"]) {
                    AttendanceStatus::Absent
                } else if any_phrase(normalized, &["late", "tardy", "tardiness", "lates"]) {
                    AttendanceStatus::Late
                } else if any_phrase(normalized, &["excused"]) {
                    AttendanceStatus::Excused
                } else if any_phrase(normalized, &["present"]) {
                    AttendanceStatus::Present
                } else {
                    return None;
                };
                Some(StatusFilter::Attendance(status))
            }
            Intent::Excuse => {
                let status = if any_phrase(normalized, &["pending", "waiting", "unreviewed"]) {
                    ExcuseStatus::Pending
                } else if any_phrase(normalized, &["approved", "accepted"]) {
                    ExcuseStatus::Approved
                } else if any_phrase(normalized, &["rejected", "denied", "declined"]) {
                    ExcuseStatus::Rejected
                } else {
                    return None;
                };
                Some(StatusFilter::Excuse(status))
            }
            _ => None,
        }
    }

    pub fn attendance(&self) -> Option<AttendanceStatus> {
        match self {
            StatusFilter::Attendance(s) => Some(*s),
            StatusFilter::Excuse(_) => None,
        }
    }

    pub fn excuse(&self) -> Option<ExcuseStatus> {
        match self {
            StatusFilter::Excuse(s) => Some(*s),
            StatusFilter::Attendance(_) => None,
        }
    }
}

fn any_phrase(normalized: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| contains_phrase(normalized, p))
}

/// Students a query is allowed to touch. Bound into the WHERE clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentScope {
    Only(Vec<StudentId>),
    All,
}

impl StudentScope {
    /// Deduplicates and sorts the roster.
    pub fn only(mut ids: Vec<StudentId>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        StudentScope::Only(ids)
    }

    /// True when the scope can never match a row.
    pub fn is_empty(&self) -> bool {
        matches!(self, StudentScope::Only(ids) if ids.is_empty())
    }

    pub fn permits(&self, id: StudentId) -> bool {
        match self {
            StudentScope::Only(ids) => ids.binary_search(&id).is_ok(),
            StudentScope::All => true,
        }
    }

    /// Ids to bind as a Postgres array, or `None` for unrestricted.
    pub fn as_bind(&self) -> Option<Vec<i64>> {
        match self {
            StudentScope::Only(ids) => Some(ids.iter().map(StudentId::get).collect()),
            StudentScope::All => None,
        }
    }
}

/// Role restrictions a plan actually applied, kept for provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConstraints {
    pub role: Role,
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<StudentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<TeacherId>,
    /// Students in scope when the scope is a roster
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roster_size: Option<usize>,
    pub unrestricted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalPlan {
    pub intent: Intent,
    pub datasets: Vec<Dataset>,
    pub time_window: Option<TimeWindow>,
    pub status_filter: Option<StatusFilter>,
    pub constraints: RoleConstraints,
    pub row_cap: usize,
    /// Set when an empty scope short-circuited the query.
    #[serde(default)]
    pub skipped_query: bool,
}

impl RetrievalPlan {
    pub fn row_cap_for(role: Role) -> usize {
        match role {
            Role::Student => STUDENT_ROW_CAP,
            _ => WIDE_ROW_CAP,
        }
    }
}

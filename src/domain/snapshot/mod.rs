//! User snapshot - the cached, role-scoped picture of an account.
//!
//! A snapshot is assembled once per cache window from the account row and
//! whichever role record backs it. The assistant only ever reads it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{ClassId, Role, StudentId, TeacherId, UserId};
use crate::domain::school::{AttendanceRecord, ClassSummary, ExcuseRecord, ExcuseStatus};

/// Row from `users`, plus the admin marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
    /// Raw `users.role` column
    pub role_column: Option<String>,
    /// Listed in `admins`
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentStats {
    pub total_classes: usize,
    pub recent_attendance_count: usize,
    pub pending_requests: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub student_id: StudentId,
    pub name: String,
    pub student_number: Option<String>,
    pub year: Option<String>,
    pub course: Option<String>,
    pub section: Option<String>,
    /// `students.class_id`, used when the enrollment pivot is empty
    pub home_class_id: Option<ClassId>,
    pub classes: Vec<ClassSummary>,
    pub recent_attendance: Vec<AttendanceRecord>,
    pub recent_requests: Vec<ExcuseRecord>,
    pub stats: StudentStats,
}

impl StudentProfile {
    /// Recomputes `stats` from the loaded lists.
    pub fn with_computed_stats(mut self) -> Self {
        self.stats = StudentStats {
            total_classes: self.classes.len(),
            recent_attendance_count: self.recent_attendance.len(),
            pending_requests: self
                .recent_requests
                .iter()
                .filter(|r| r.status == ExcuseStatus::Pending)
                .count(),
        };
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherStats {
    pub classes_count: usize,
    pub total_students: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherProfile {
    pub teacher_id: TeacherId,
    pub employee_code: Option<String>,
    pub name: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub classes: Vec<ClassSummary>,
    pub stats: TeacherStats,
}

/// Role-specific part of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum RoleProfile {
    Student(StudentProfile),
    Teacher(TeacherProfile),
    Admin,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub user: AccountSummary,
    pub profile: RoleProfile,
    pub built_at: DateTime<Utc>,
}

impl UserSnapshot {
    /// Assembles a snapshot from the account and its role records.
    ///
    /// Role precedence: teacher record, student record, admin marker, then
    /// the role column. An account whose role column claims student or
    /// teacher without the matching record is denied.
    pub fn assemble(
        account: Account,
        teacher: Option<TeacherProfile>,
        student: Option<StudentProfile>,
        built_at: DateTime<Utc>,
    ) -> Result<Self, SnapshotError> {
        let profile = match (teacher, student) {
            (Some(t), _) => RoleProfile::Teacher(t),
            (None, Some(s)) => RoleProfile::Student(s.with_computed_stats()),
            (None, None) if account.is_admin => RoleProfile::Admin,
            (None, None) => match Role::from_column(account.role_column.as_deref()) {
                Role::Admin => RoleProfile::Admin,
                Role::Unknown => RoleProfile::Unknown,
                role @ (Role::Student | Role::Teacher) => {
                    return Err(SnapshotError::AccessDenied {
                        user_id: account.id,
                        role,
                    })
                }
            },
        };

        Ok(Self {
            user: AccountSummary {
                id: account.id,
                name: account.name,
                email: account.email,
            },
            profile,
            built_at,
        })
    }

    pub fn role(&self) -> Role {
        match self.profile {
            RoleProfile::Student(_) => Role::Student,
            RoleProfile::Teacher(_) => Role::Teacher,
            RoleProfile::Admin => Role::Admin,
            RoleProfile::Unknown => Role::Unknown,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    /// Preferred display name: role record name, then account name.
    pub fn display_name(&self) -> &str {
        match &self.profile {
            RoleProfile::Student(s) if !s.name.is_empty() => &s.name,
            RoleProfile::Teacher(t) if !t.name.is_empty() => &t.name,
            _ => &self.user.name,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum SnapshotError {
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// Role claims a record that does not exist.
    #[error("Access denied for user {user_id}: no {role} record")]
    AccessDenied { user_id: UserId, role: Role },

    #[error("Snapshot source failed: {0}")]
    Source(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::school::ExcuseRecord;

    fn account(role: Option<&str>, is_admin: bool) -> Account {
        Account {
            id: UserId::new(5),
            name: "Account Name".to_string(),
            email: Some("person@school.edu".to_string()),
            role_column: role.map(String::from),
            is_admin,
        }
    }

    fn student() -> StudentProfile {
        StudentProfile {
            student_id: StudentId::new(77),
            name: "Maria Santos".to_string(),
            student_number: Some("2021-0042".to_string()),
            year: Some("3".to_string()),
            course: Some("BSIT".to_string()),
            section: Some("A".to_string()),
            home_class_id: None,
            classes: vec![],
            recent_attendance: vec![],
            recent_requests: vec![
                ExcuseRecord {
                    student_id: StudentId::new(77),
                    student_name: "Maria Santos".to_string(),
                    status: ExcuseStatus::Pending,
                    reason: None,
                    submitted_at: Utc::now(),
                },
                ExcuseRecord {
                    student_id: StudentId::new(77),
                    student_name: "Maria Santos".to_string(),
                    status: ExcuseStatus::Approved,
                    reason: None,
                    submitted_at: Utc::now(),
                },
            ],
            stats: StudentStats::default(),
        }
    }

    fn teacher() -> TeacherProfile {
        TeacherProfile {
            teacher_id: TeacherId::new(3),
            employee_code: None,
            name: "Jose Rizal".to_string(),
            department: Some("Math".to_string()),
            position: None,
            classes: vec![],
            stats: TeacherStats::default(),
        }
    }

    #[test]
    fn teacher_record_wins_over_student_record() {
        let snap = UserSnapshot::assemble(account(Some("student"), false), Some(teacher()), Some(student()), Utc::now()).unwrap();
        assert_eq!(snap.role(), Role::Teacher);
        assert_eq!(snap.display_name(), "Jose Rizal");
    }

    #[test]
    fn student_stats_are_computed() {
        let snap = UserSnapshot::assemble(account(None, false), None, Some(student()), Utc::now()).unwrap();
        match snap.profile {
            RoleProfile::Student(s) => assert_eq!(s.stats.pending_requests, 1),
            other => panic!("expected student profile, got {:?}", other),
        }
    }

    #[test]
    fn admin_marker_precedes_role_column() {
        let snap = UserSnapshot::assemble(account(Some("student"), true), None, None, Utc::now()).unwrap();
        assert_eq!(snap.role(), Role::Admin);
    }

    #[test]
    fn student_role_without_record_is_denied() {
        let err = UserSnapshot::assemble(account(Some("student"), false), None, None, Utc::now()).unwrap_err();
        assert!(matches!(err, SnapshotError::AccessDenied { role: Role::Student, .. }));
    }

    #[test]
    fn unrecognised_role_is_unknown() {
        let snap = UserSnapshot::assemble(account(Some("parent"), false), None, None, Utc::now()).unwrap();
        assert_eq!(snap.role(), Role::Unknown);
        assert_eq!(snap.display_name(), "Account Name");
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let snap = UserSnapshot::assemble(account(None, false), None, Some(student()), Utc::now()).unwrap();
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains(r#""role":"student""#));
        let back: UserSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}

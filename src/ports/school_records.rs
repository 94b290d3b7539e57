//! School Records Port - read-only, capped queries over the attendance schema.
//!
//! Every list query takes its `StudentScope` and limit as parameters, so
//! role isolation lives in the WHERE clause rather than in a post-filter.

use async_trait::async_trait;

use crate::domain::assistant::{AttendanceCounts, ExcuseSummary, StudentScope, TimeWindow};
use crate::domain::foundation::{ClassId, StudentId, TeacherId, UserId};
use crate::domain::school::{
    AttendanceRecord, AttendanceStatus, ClassSummary, ExcuseRecord, ExcuseStatus, TeacherRecord,
};

/// Filters for an attendance listing.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceQuery {
    pub scope: StudentScope,
    pub window: Option<TimeWindow>,
    pub status: Option<AttendanceStatus>,
    pub limit: usize,
}

/// Filters for an excuse listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcuseQuery {
    pub scope: StudentScope,
    pub window: Option<TimeWindow>,
    pub status: Option<ExcuseStatus>,
    pub limit: usize,
}

/// Read-only port over classes, enrollments, attendance and excuses.
#[async_trait]
pub trait SchoolRecordsReader: Send + Sync {
    /// Students enrolled in classes taught by this account. May contain
    /// duplicates when a student takes several of the teacher's classes.
    async fn enrolled_student_ids(&self, teacher_user: UserId)
        -> Result<Vec<StudentId>, RecordsError>;

    /// Attendance marks in scope, newest first.
    async fn attendance_records(
        &self,
        query: &AttendanceQuery,
    ) -> Result<Vec<AttendanceRecord>, RecordsError>;

    /// Per-status counts over the whole scope and window.
    async fn attendance_counts(
        &self,
        scope: &StudentScope,
        window: Option<&TimeWindow>,
    ) -> Result<AttendanceCounts, RecordsError>;

    /// Excuse requests in scope, newest first.
    async fn excuse_records(&self, query: &ExcuseQuery) -> Result<Vec<ExcuseRecord>, RecordsError>;

    /// Per-status excuse counts over the whole scope and window.
    async fn excuse_counts(
        &self,
        scope: &StudentScope,
        window: Option<&TimeWindow>,
    ) -> Result<ExcuseSummary, RecordsError>;

    /// Classes the student is enrolled in.
    async fn classes_for_student(
        &self,
        student: StudentId,
        limit: usize,
    ) -> Result<Vec<ClassSummary>, RecordsError>;

    async fn class_by_id(&self, class: ClassId) -> Result<Option<ClassSummary>, RecordsError>;

    /// Classes taught by this account.
    async fn classes_for_teacher(
        &self,
        teacher_user: UserId,
        limit: usize,
    ) -> Result<Vec<ClassSummary>, RecordsError>;

    async fn active_classes(&self, limit: usize) -> Result<Vec<ClassSummary>, RecordsError>;

    /// Distinct teachers of the student's enrolled classes.
    async fn teachers_for_student(
        &self,
        student: StudentId,
        limit: usize,
    ) -> Result<Vec<TeacherRecord>, RecordsError>;

    async fn teacher_by_id(&self, teacher: TeacherId) -> Result<Option<TeacherRecord>, RecordsError>;

    async fn all_teachers(&self, limit: usize) -> Result<Vec<TeacherRecord>, RecordsError>;
}

/// Errors from read-only storage.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RecordsError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Query timed out after {0}ms")]
    Timeout(u64),
}

impl From<sqlx::Error> for RecordsError {
    fn from(err: sqlx::Error) -> Self {
        RecordsError::Database(err.to_string())
    }
}

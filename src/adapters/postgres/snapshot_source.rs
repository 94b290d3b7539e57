//! PostgreSQL implementation of SnapshotSource.
//!
//! Loads the account row and whichever role record backs it. Class, attendance
//! and excuse lists reuse the records reader so both paths map rows the same way.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::time::Duration;

use super::rows::with_deadline;
use super::school_records_reader::PostgresSchoolRecordsReader;
use crate::domain::assistant::StudentScope;
use crate::domain::foundation::{ClassId, StudentId, TeacherId, UserId};
use crate::domain::snapshot::{
    Account, StudentProfile, StudentStats, TeacherProfile, TeacherStats,
};
use crate::ports::{AttendanceQuery, ExcuseQuery, RecordsError, SchoolRecordsReader, SnapshotSource};

const STUDENT_CLASS_LIMIT: usize = 10;
const TEACHER_CLASS_LIMIT: usize = 15;
const RECENT_ATTENDANCE_LIMIT: usize = 10;
const RECENT_EXCUSE_LIMIT: usize = 5;

/// PostgreSQL implementation of SnapshotSource.
#[derive(Clone)]
pub struct PostgresSnapshotSource {
    pool: PgPool,
    records: PostgresSchoolRecordsReader,
    query_timeout: Duration,
}

impl PostgresSnapshotSource {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            records: PostgresSchoolRecordsReader::new(pool.clone(), query_timeout),
            pool,
            query_timeout,
        }
    }
}

#[async_trait]
impl SnapshotSource for PostgresSnapshotSource {
    async fn account(&self, user: UserId) -> Result<Option<Account>, RecordsError> {
        let row = with_deadline(
            self.query_timeout,
            sqlx::query(
                r#"
                SELECT u.id, u.name, u.email, u.role,
                       EXISTS(SELECT 1 FROM admins a WHERE a.user_id = u.id) AS is_admin
                FROM users u
                WHERE u.id = $1
                "#,
            )
            .bind(user.get())
            .fetch_optional(&self.pool),
        )
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Account {
            id: UserId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            role_column: row.try_get("role")?,
            is_admin: row.try_get("is_admin")?,
        }))
    }

    async fn teacher_profile(&self, user: UserId) -> Result<Option<TeacherProfile>, RecordsError> {
        let row = with_deadline(
            self.query_timeout,
            sqlx::query(
                r#"
                SELECT t.id, t.teacher_id AS employee_code,
                       TRIM(CONCAT_WS(' ', t.first_name, t.last_name)) AS name,
                       t.department, t.position
                FROM teachers t
                WHERE t.user_id = $1
                "#,
            )
            .bind(user.get())
            .fetch_optional(&self.pool),
        )
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let classes = self
            .records
            .classes_for_teacher(user, TEACHER_CLASS_LIMIT)
            .await?;

        let total_students: i64 = with_deadline(
            self.query_timeout,
            sqlx::query_scalar(
                r#"
                SELECT COUNT(DISTINCT cs.student_id)
                FROM class_student cs
                JOIN class_models c ON c.id = cs.class_model_id
                WHERE c.teacher_id = $1
                  AND COALESCE(cs.status, 'enrolled') = 'enrolled'
                  AND COALESCE(c.is_active, true)
                "#,
            )
            .bind(user.get())
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(Some(TeacherProfile {
            teacher_id: TeacherId::new(row.try_get("id")?),
            employee_code: row.try_get("employee_code")?,
            name: row.try_get("name")?,
            department: row.try_get("department")?,
            position: row.try_get("position")?,
            stats: TeacherStats {
                classes_count: classes.len(),
                total_students: total_students.max(0) as usize,
            },
            classes,
        }))
    }

    async fn student_profile(&self, user: UserId) -> Result<Option<StudentProfile>, RecordsError> {
        let row = with_deadline(
            self.query_timeout,
            sqlx::query(
                r#"
                SELECT s.id, s.name, s.student_id AS student_number, s.year::text AS year,
                       s.course, s.section, s.class_id
                FROM students s
                WHERE s.user_id = $1
                "#,
            )
            .bind(user.get())
            .fetch_optional(&self.pool),
        )
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let student_id = StudentId::new(row.try_get("id")?);
        let home_class_id: Option<i64> = row.try_get("class_id")?;
        let home_class_id = home_class_id.map(ClassId::new);

        let mut classes = self
            .records
            .classes_for_student(student_id, STUDENT_CLASS_LIMIT)
            .await?;
        if classes.is_empty() {
            if let Some(home) = home_class_id {
                classes.extend(self.records.class_by_id(home).await?);
            }
        }

        let scope = StudentScope::only(vec![student_id]);
        let recent_attendance = self
            .records
            .attendance_records(&AttendanceQuery {
                scope: scope.clone(),
                window: None,
                status: None,
                limit: RECENT_ATTENDANCE_LIMIT,
            })
            .await?;
        let recent_requests = self
            .records
            .excuse_records(&ExcuseQuery {
                scope,
                window: None,
                status: None,
                limit: RECENT_EXCUSE_LIMIT,
            })
            .await?;

        let profile = StudentProfile {
            student_id,
            name: row.try_get("name")?,
            student_number: row.try_get("student_number")?,
            year: row.try_get("year")?,
            course: row.try_get("course")?,
            section: row.try_get("section")?,
            home_class_id,
            classes,
            recent_attendance,
            recent_requests,
            stats: StudentStats::default(),
        };

        Ok(Some(profile.with_computed_stats()))
    }
}

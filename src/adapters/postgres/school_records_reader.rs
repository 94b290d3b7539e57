//! PostgreSQL implementation of SchoolRecordsReader.
//!
//! Read-only queries over the attendance schema. The student scope is bound
//! as a `bigint[]` (`NULL` meaning unrestricted) and every list is capped with
//! `LIMIT`, so role isolation and row caps are enforced by the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::debug;

use super::rows::{
    attendance_from_row, class_from_row, clip, excuse_from_row, filter_rows, map_rows,
    teacher_from_row, with_deadline, CLASS_COLUMNS, TEACHER_COLUMNS,
};
use crate::domain::assistant::{AttendanceCounts, ExcuseSummary, StudentScope, TimeWindow};
use crate::domain::foundation::{ClassId, StudentId, TeacherId, UserId};
use crate::domain::school::{
    AttendanceRecord, AttendanceStatus, ClassSummary, ExcuseRecord, ExcuseStatus, TeacherRecord,
};
use crate::ports::{AttendanceQuery, ExcuseQuery, RecordsError, SchoolRecordsReader};

/// Excuse reasons are previews, not full text.
pub(super) const REASON_PREVIEW_CHARS: usize = 100;

const ATTENDANCE_AT: &str = "COALESCE(ar.marked_at, ar.created_at)::timestamptz";
const EXCUSE_AT: &str = "COALESCE(er.submitted_at, er.created_at)::timestamptz";

/// PostgreSQL implementation of SchoolRecordsReader.
#[derive(Clone)]
pub struct PostgresSchoolRecordsReader {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresSchoolRecordsReader {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

type Bounds = (Option<DateTime<Utc>>, Option<DateTime<Utc>>);

fn window_bounds(window: Option<&TimeWindow>) -> Bounds {
    match window {
        Some(w) => (Some(w.start), Some(w.end)),
        None => (None, None),
    }
}

/// Column spellings that map onto an excuse status.
fn excuse_status_values(status: Option<ExcuseStatus>) -> Option<Vec<String>> {
    status.map(|s| match s {
        ExcuseStatus::Rejected => vec!["rejected".to_string(), "denied".to_string()],
        other => vec![other.as_str().to_string()],
    })
}

#[async_trait]
impl SchoolRecordsReader for PostgresSchoolRecordsReader {
    async fn enrolled_student_ids(
        &self,
        teacher_user: UserId,
    ) -> Result<Vec<StudentId>, RecordsError> {
        let rows = with_deadline(
            self.query_timeout,
            sqlx::query(
                r#"
                SELECT cs.student_id
                FROM class_student cs
                JOIN class_models c ON c.id = cs.class_model_id
                WHERE c.teacher_id = $1
                  AND COALESCE(cs.status, 'enrolled') = 'enrolled'
                "#,
            )
            .bind(teacher_user.get())
            .fetch_all(&self.pool),
        )
        .await?;

        map_rows(&rows, |row| row.try_get::<i64, _>("student_id").map(StudentId::new))
    }

    async fn attendance_records(
        &self,
        query: &AttendanceQuery,
    ) -> Result<Vec<AttendanceRecord>, RecordsError> {
        if query.scope.is_empty() {
            return Ok(Vec::new());
        }
        let (start, end) = window_bounds(query.window.as_ref());

        let sql = format!(
            r#"
            SELECT ar.student_id, s.name AS student_name, c.name AS class_name,
                   ar.status, {at} AS marked_at
            FROM attendance_records ar
            JOIN students s ON s.id = ar.student_id
            LEFT JOIN attendance_sessions sess ON sess.id = ar.attendance_session_id
            LEFT JOIN class_models c ON c.id = sess.class_id
            WHERE ($1::bigint[] IS NULL OR ar.student_id = ANY($1))
              AND ($2::timestamptz IS NULL OR {at} >= $2)
              AND ($3::timestamptz IS NULL OR {at} < $3)
              AND ($4::text IS NULL OR LOWER(ar.status) = $4)
            ORDER BY marked_at DESC, ar.id DESC
            LIMIT $5
            "#,
            at = ATTENDANCE_AT
        );

        let rows = with_deadline(
            self.query_timeout,
            sqlx::query(&sql)
                .bind(query.scope.as_bind())
                .bind(start)
                .bind(end)
                .bind(query.status.map(|s| s.as_str()))
                .bind(query.limit as i64)
                .fetch_all(&self.pool),
        )
        .await?;

        debug!(rows = rows.len(), limit = query.limit, "Loaded attendance records");
        filter_rows(&rows, attendance_from_row)
    }

    async fn attendance_counts(
        &self,
        scope: &StudentScope,
        window: Option<&TimeWindow>,
    ) -> Result<AttendanceCounts, RecordsError> {
        if scope.is_empty() {
            return Ok(AttendanceCounts::default());
        }
        let (start, end) = window_bounds(window);

        let sql = format!(
            r#"
            SELECT LOWER(ar.status) AS status, COUNT(*) AS n
            FROM attendance_records ar
            WHERE ($1::bigint[] IS NULL OR ar.student_id = ANY($1))
              AND ($2::timestamptz IS NULL OR {at} >= $2)
              AND ($3::timestamptz IS NULL OR {at} < $3)
            GROUP BY LOWER(ar.status)
            "#,
            at = ATTENDANCE_AT
        );

        let rows = with_deadline(
            self.query_timeout,
            sqlx::query(&sql)
                .bind(scope.as_bind())
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool),
        )
        .await?;

        let mut counts = AttendanceCounts::default();
        for row in &rows {
            let status: String = row.try_get("status")?;
            let n: i64 = row.try_get("n")?;
            if let Some(status) = AttendanceStatus::from_column(&status) {
                counts.add(status, n.max(0) as u64);
            }
        }
        Ok(counts)
    }

    async fn excuse_records(&self, query: &ExcuseQuery) -> Result<Vec<ExcuseRecord>, RecordsError> {
        if query.scope.is_empty() {
            return Ok(Vec::new());
        }
        let (start, end) = window_bounds(query.window.as_ref());

        let sql = format!(
            r#"
            SELECT er.student_id, s.name AS student_name, er.status, er.reason,
                   {at} AS submitted_at
            FROM excuse_requests er
            JOIN students s ON s.id = er.student_id
            WHERE ($1::bigint[] IS NULL OR er.student_id = ANY($1))
              AND ($2::timestamptz IS NULL OR {at} >= $2)
              AND ($3::timestamptz IS NULL OR {at} < $3)
              AND ($4::text[] IS NULL OR LOWER(er.status) = ANY($4))
            ORDER BY submitted_at DESC, er.id DESC
            LIMIT $5
            "#,
            at = EXCUSE_AT
        );

        let rows = with_deadline(
            self.query_timeout,
            sqlx::query(&sql)
                .bind(query.scope.as_bind())
                .bind(start)
                .bind(end)
                .bind(excuse_status_values(query.status))
                .bind(query.limit as i64)
                .fetch_all(&self.pool),
        )
        .await?;

        let records = filter_rows(&rows, excuse_from_row)?;
        Ok(records
            .into_iter()
            .map(|mut r| {
                r.reason = clip(r.reason, REASON_PREVIEW_CHARS);
                r
            })
            .collect())
    }

    async fn excuse_counts(
        &self,
        scope: &StudentScope,
        window: Option<&TimeWindow>,
    ) -> Result<ExcuseSummary, RecordsError> {
        if scope.is_empty() {
            return Ok(ExcuseSummary::default());
        }
        let (start, end) = window_bounds(window);

        let sql = format!(
            r#"
            SELECT LOWER(er.status) AS status, COUNT(*) AS n
            FROM excuse_requests er
            WHERE ($1::bigint[] IS NULL OR er.student_id = ANY($1))
              AND ($2::timestamptz IS NULL OR {at} >= $2)
              AND ($3::timestamptz IS NULL OR {at} < $3)
            GROUP BY LOWER(er.status)
            "#,
            at = EXCUSE_AT
        );

        let rows = with_deadline(
            self.query_timeout,
            sqlx::query(&sql)
                .bind(scope.as_bind())
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool),
        )
        .await?;

        let mut summary = ExcuseSummary::default();
        for row in &rows {
            let status: String = row.try_get("status")?;
            let n: i64 = row.try_get("n")?;
            if let Some(status) = ExcuseStatus::from_column(&status) {
                summary.add(status, n.max(0) as u64);
            }
        }
        Ok(summary)
    }

    async fn classes_for_student(
        &self,
        student: StudentId,
        limit: usize,
    ) -> Result<Vec<ClassSummary>, RecordsError> {
        let sql = format!(
            r#"
            SELECT {CLASS_COLUMNS}
            FROM class_models c
            JOIN class_student cs ON cs.class_model_id = c.id
            WHERE cs.student_id = $1
              AND COALESCE(cs.status, 'enrolled') = 'enrolled'
            ORDER BY c.schedule_time NULLS LAST, c.name
            LIMIT $2
            "#
        );

        let rows = with_deadline(
            self.query_timeout,
            sqlx::query(&sql)
                .bind(student.get())
                .bind(limit as i64)
                .fetch_all(&self.pool),
        )
        .await?;

        map_rows(&rows, class_from_row)
    }

    async fn class_by_id(&self, class: ClassId) -> Result<Option<ClassSummary>, RecordsError> {
        let sql = format!("SELECT {CLASS_COLUMNS} FROM class_models c WHERE c.id = $1");

        let row = with_deadline(
            self.query_timeout,
            sqlx::query(&sql).bind(class.get()).fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref()
            .map(class_from_row)
            .transpose()
            .map_err(RecordsError::from)
    }

    async fn classes_for_teacher(
        &self,
        teacher_user: UserId,
        limit: usize,
    ) -> Result<Vec<ClassSummary>, RecordsError> {
        let sql = format!(
            r#"
            SELECT {CLASS_COLUMNS}
            FROM class_models c
            WHERE c.teacher_id = $1
              AND COALESCE(c.is_active, true)
            ORDER BY c.schedule_time NULLS LAST, c.name
            LIMIT $2
            "#
        );

        let rows = with_deadline(
            self.query_timeout,
            sqlx::query(&sql)
                .bind(teacher_user.get())
                .bind(limit as i64)
                .fetch_all(&self.pool),
        )
        .await?;

        map_rows(&rows, class_from_row)
    }

    async fn active_classes(&self, limit: usize) -> Result<Vec<ClassSummary>, RecordsError> {
        let sql = format!(
            r#"
            SELECT {CLASS_COLUMNS}
            FROM class_models c
            WHERE COALESCE(c.is_active, true)
            ORDER BY c.name
            LIMIT $1
            "#
        );

        let rows = with_deadline(
            self.query_timeout,
            sqlx::query(&sql).bind(limit as i64).fetch_all(&self.pool),
        )
        .await?;

        map_rows(&rows, class_from_row)
    }

    async fn teachers_for_student(
        &self,
        student: StudentId,
        limit: usize,
    ) -> Result<Vec<TeacherRecord>, RecordsError> {
        let sql = format!(
            r#"
            SELECT DISTINCT {TEACHER_COLUMNS}
            FROM teachers t
            JOIN class_models c ON c.teacher_id = t.user_id
            JOIN class_student cs ON cs.class_model_id = c.id
            WHERE cs.student_id = $1
              AND COALESCE(cs.status, 'enrolled') = 'enrolled'
            ORDER BY teacher_name
            LIMIT $2
            "#
        );

        let rows = with_deadline(
            self.query_timeout,
            sqlx::query(&sql)
                .bind(student.get())
                .bind(limit as i64)
                .fetch_all(&self.pool),
        )
        .await?;

        map_rows(&rows, teacher_from_row)
    }

    async fn teacher_by_id(&self, teacher: TeacherId) -> Result<Option<TeacherRecord>, RecordsError> {
        let sql = format!("SELECT {TEACHER_COLUMNS} FROM teachers t WHERE t.id = $1");

        let row = with_deadline(
            self.query_timeout,
            sqlx::query(&sql).bind(teacher.get()).fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref()
            .map(teacher_from_row)
            .transpose()
            .map_err(RecordsError::from)
    }

    async fn all_teachers(&self, limit: usize) -> Result<Vec<TeacherRecord>, RecordsError> {
        let sql = format!(
            r#"
            SELECT {TEACHER_COLUMNS}
            FROM teachers t
            ORDER BY teacher_name
            LIMIT $1
            "#
        );

        let rows = with_deadline(
            self.query_timeout,
            sqlx::query(&sql).bind(limit as i64).fetch_all(&self.pool),
        )
        .await?;

        map_rows(&rows, teacher_from_row)
    }
}

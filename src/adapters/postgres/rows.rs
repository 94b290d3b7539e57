//! Row projections shared by the PostgreSQL readers.
//!
//! Queries alias their columns to the names used here, so every reader maps
//! classes, teachers and records the same way.

use sqlx::postgres::PgRow;
use sqlx::Row;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::domain::foundation::{ClassId, StudentId, TeacherId, UserId};
use crate::domain::school::{
    parse_schedule_days, AttendanceRecord, AttendanceStatus, ClassSummary, ExcuseRecord,
    ExcuseStatus, TeacherRecord,
};
use crate::ports::RecordsError;

/// Columns every class query selects, prefixed by the `class_models` alias `c`.
pub(super) const CLASS_COLUMNS: &str = r#"
    c.id AS class_id,
    c.name AS class_name,
    c.class_code,
    c.subject,
    c.course,
    c.section,
    c.schedule_time::text AS schedule_time,
    c.schedule_days::text AS schedule_days,
    c.room
"#;

/// Columns every teacher query selects, prefixed by the `teachers` alias `t`.
pub(super) const TEACHER_COLUMNS: &str = r#"
    t.id AS teacher_id,
    t.user_id AS teacher_user_id,
    TRIM(CONCAT_WS(' ', t.first_name, t.last_name)) AS teacher_name,
    t.email AS teacher_email,
    t.department,
    t.position
"#;

/// Runs a query under the configured statement deadline.
pub(super) async fn with_deadline<T, F>(deadline: Duration, query: F) -> Result<T, RecordsError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(deadline, query).await {
        Ok(result) => result.map_err(RecordsError::from),
        Err(_) => {
            let millis = deadline.as_millis() as u64;
            warn!(timeout_ms = millis, "Records query timed out");
            Err(RecordsError::Timeout(millis))
        }
    }
}

pub(super) fn class_from_row(row: &PgRow) -> Result<ClassSummary, sqlx::Error> {
    let schedule_days: Option<String> = row.try_get("schedule_days")?;
    Ok(ClassSummary {
        id: ClassId::new(row.try_get("class_id")?),
        name: row.try_get("class_name")?,
        class_code: row.try_get("class_code")?,
        subject: row.try_get("subject")?,
        course: row.try_get("course")?,
        section: row.try_get("section")?,
        schedule_time: row.try_get("schedule_time")?,
        schedule_days: parse_schedule_days(schedule_days.as_deref()),
        room: row.try_get("room")?,
    })
}

pub(super) fn teacher_from_row(row: &PgRow) -> Result<TeacherRecord, sqlx::Error> {
    let user_id: Option<i64> = row.try_get("teacher_user_id")?;
    Ok(TeacherRecord {
        id: TeacherId::new(row.try_get("teacher_id")?),
        user_id: user_id.map(UserId::new),
        name: row.try_get("teacher_name")?,
        email: row.try_get("teacher_email")?,
        department: row.try_get("department")?,
        position: row.try_get("position")?,
    })
}

/// Maps an attendance row; rows with an unrecognized status are skipped.
pub(super) fn attendance_from_row(row: &PgRow) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    let raw_status: String = row.try_get("status")?;
    let Some(status) = AttendanceStatus::from_column(&raw_status) else {
        warn!(status = %raw_status, "Skipping attendance row with unknown status");
        return Ok(None);
    };
    Ok(Some(AttendanceRecord {
        student_id: StudentId::new(row.try_get("student_id")?),
        student_name: row.try_get("student_name")?,
        class_name: row.try_get("class_name")?,
        status,
        marked_at: row.try_get("marked_at")?,
    }))
}

/// Maps an excuse row; rows with an unrecognized status are skipped.
pub(super) fn excuse_from_row(row: &PgRow) -> Result<Option<ExcuseRecord>, sqlx::Error> {
    let raw_status: String = row.try_get("status")?;
    let Some(status) = ExcuseStatus::from_column(&raw_status) else {
        warn!(status = %raw_status, "Skipping excuse row with unknown status");
        return Ok(None);
    };
    Ok(Some(ExcuseRecord {
        student_id: StudentId::new(row.try_get("student_id")?),
        student_name: row.try_get("student_name")?,
        status,
        reason: row.try_get("reason")?,
        submitted_at: row.try_get("submitted_at")?,
    }))
}

/// Maps every row, stopping at the first decode error.
pub(super) fn map_rows<T>(
    rows: &[PgRow],
    map: impl Fn(&PgRow) -> Result<T, sqlx::Error>,
) -> Result<Vec<T>, RecordsError> {
    rows.iter()
        .map(|row| map(row).map_err(RecordsError::from))
        .collect()
}

/// Like [`map_rows`], dropping rows the mapper rejects.
pub(super) fn filter_rows<T>(
    rows: &[PgRow],
    map: impl Fn(&PgRow) -> Result<Option<T>, sqlx::Error>,
) -> Result<Vec<T>, RecordsError> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(item) = map(row)? {
            out.push(item);
        }
    }
    Ok(out)
}

/// Truncates free text to `max` characters.
pub(super) fn clip(text: Option<String>, max: usize) -> Option<String> {
    text.map(|t| {
        if t.chars().count() > max {
            t.chars().take(max).collect()
        } else {
            t
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_respects_char_boundaries() {
        assert_eq!(clip(Some("héllo wörld".into()), 5), Some("héllo".into()));
        assert_eq!(clip(Some("short".into()), 100), Some("short".into()));
        assert_eq!(clip(None, 3), None);
    }

    #[tokio::test]
    async fn deadline_elapses_into_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, sqlx::Error>(1)
        };
        let result = with_deadline(Duration::from_millis(10), slow).await;
        assert!(matches!(result, Err(RecordsError::Timeout(10))));
    }

    #[tokio::test]
    async fn deadline_passes_through_errors() {
        let failing = async { Err::<i32, _>(sqlx::Error::RowNotFound) };
        let result = with_deadline(Duration::from_secs(1), failing).await;
        assert!(matches!(result, Err(RecordsError::Database(_))));
    }
}

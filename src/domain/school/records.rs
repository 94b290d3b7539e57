//! Rows read from the attendance schema, already projected into the
//! shapes the assistant works with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ClassId, StudentId, TeacherId, UserId};

/// Attendance mark recorded for a student in one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Late,
        AttendanceStatus::Excused,
    ];

    /// Parses the `attendance_records.status` column.
    pub fn from_column(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "present" => Some(Self::Present),
            "absent" => Some(Self::Absent),
            "late" => Some(Self::Late),
            "excused" => Some(Self::Excused),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
            Self::Excused => "excused",
        }
    }
}

/// Review state of an excuse request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExcuseStatus {
    Pending,
    Approved,
    Rejected,
}

impl ExcuseStatus {
    /// Parses the `excuse_requests.status` column.
    pub fn from_column(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" | "denied" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// One attendance mark, joined with the student and class it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub student_id: StudentId,
    pub student_name: String,
    pub class_name: Option<String>,
    pub status: AttendanceStatus,
    pub marked_at: DateTime<Utc>,
}

/// One excuse request, joined with the student who filed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcuseRecord {
    pub student_id: StudentId,
    pub student_name: String,
    pub status: ExcuseStatus,
    pub reason: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Class with its weekly schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub id: ClassId,
    pub name: String,
    pub class_code: Option<String>,
    pub subject: Option<String>,
    pub course: Option<String>,
    pub section: Option<String>,
    pub schedule_time: Option<String>,
    #[serde(default)]
    pub schedule_days: Vec<String>,
    pub room: Option<String>,
}

/// Teacher directory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherRecord {
    pub id: TeacherId,
    pub user_id: Option<UserId>,
    pub name: String,
    pub email: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
}

/// Normalizes `class_models.schedule_days`, stored either as a JSON array or
/// as a plain comma-separated string.
pub fn parse_schedule_days(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Vec::new();
    };
    if let Ok(days) = serde_json::from_str::<Vec<String>>(raw) {
        return days;
    }
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

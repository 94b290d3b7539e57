//! School records - read models over classes, attendance and excuses.

mod records;

pub use records::{
    parse_schedule_days, AttendanceRecord, AttendanceStatus, ClassSummary, ExcuseRecord,
    ExcuseStatus, TeacherRecord,
};

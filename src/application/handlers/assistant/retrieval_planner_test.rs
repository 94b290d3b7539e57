use super::*;
use crate::adapters::memory::InMemorySchoolRecords;
use crate::domain::assistant::{RiskTier, STUDENT_ROW_CAP};
use crate::domain::foundation::ClassId;
use crate::domain::school::{
    AttendanceRecord, AttendanceStatus, ClassSummary, ExcuseRecord, ExcuseStatus, TeacherRecord,
};
use crate::domain::snapshot::{
    Account, StudentProfile, StudentStats, TeacherProfile, TeacherStats,
};
use chrono::{Duration, TimeZone};

const MARIA: StudentId = StudentId::new(77);
const PEDRO: StudentId = StudentId::new(88);
const TEACHER_USER: UserId = UserId::new(3);

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 18, 9, 30, 0).unwrap()
}

fn account(id: UserId, role: &str, is_admin: bool) -> Account {
    Account {
        id,
        name: "Account".to_string(),
        email: None,
        role_column: Some(role.to_string()),
        is_admin,
    }
}

fn student_snapshot() -> UserSnapshot {
    let profile = StudentProfile {
        student_id: MARIA,
        name: "Maria Santos".to_string(),
        student_number: None,
        year: None,
        course: None,
        section: None,
        home_class_id: None,
        classes: vec![],
        recent_attendance: vec![],
        recent_requests: vec![],
        stats: StudentStats::default(),
    };
    UserSnapshot::assemble(account(UserId::new(12), "student", false), None, Some(profile), now())
        .unwrap()
}

fn teacher_snapshot(total_students: usize) -> UserSnapshot {
    let profile = TeacherProfile {
        teacher_id: TeacherId::new(5),
        employee_code: None,
        name: "Jose Rizal".to_string(),
        department: None,
        position: None,
        classes: vec![],
        stats: TeacherStats {
            classes_count: 1,
            total_students,
        },
    };
    UserSnapshot::assemble(account(TEACHER_USER, "teacher", false), Some(profile), None, now())
        .unwrap()
}

fn admin_snapshot() -> UserSnapshot {
    UserSnapshot::assemble(account(UserId::new(1), "admin", true), None, None, now()).unwrap()
}

fn mark(student: StudentId, status: AttendanceStatus, days_ago: i64) -> AttendanceRecord {
    AttendanceRecord {
        student_id: student,
        student_name: format!("Student {}", student),
        class_name: Some("Math 101".to_string()),
        status,
        marked_at: now() - Duration::days(days_ago),
    }
}

fn excuse(student: StudentId, status: ExcuseStatus, days_ago: i64) -> ExcuseRecord {
    ExcuseRecord {
        student_id: student,
        student_name: format!("Student {}", student),
        status,
        reason: Some("Medical".to_string()),
        submitted_at: now() - Duration::days(days_ago),
    }
}

fn class(id: i64, name: &str) -> ClassSummary {
    ClassSummary {
        id: ClassId::new(id),
        name: name.to_string(),
        class_code: None,
        subject: Some(name.to_string()),
        course: None,
        section: None,
        schedule_time: Some("08:00".to_string()),
        schedule_days: vec!["Mon".to_string(), "Wed".to_string()],
        room: Some("R1".to_string()),
    }
}

fn teacher_record(id: i64, user: UserId, name: &str) -> TeacherRecord {
    TeacherRecord {
        id: TeacherId::new(id),
        user_id: Some(user),
        name: name.to_string(),
        email: None,
        department: None,
        position: None,
    }
}

/// 23 present and 2 absent for Maria this month, plus noise for Pedro and
/// for Maria outside the window.
fn school() -> InMemorySchoolRecords {
    let mut records = InMemorySchoolRecords::new();
    for day in 0..23 {
        records = records.with_attendance(mark(MARIA, AttendanceStatus::Present, day % 17));
    }
    records = records
        .with_attendance(mark(MARIA, AttendanceStatus::Absent, 2))
        .with_attendance(mark(MARIA, AttendanceStatus::Absent, 9))
        .with_attendance(mark(MARIA, AttendanceStatus::Absent, 40))
        .with_attendance(mark(PEDRO, AttendanceStatus::Absent, 1))
        .with_attendance(mark(PEDRO, AttendanceStatus::Late, 3));
    records
        .with_excuse(excuse(MARIA, ExcuseStatus::Pending, 3))
        .with_excuse(excuse(MARIA, ExcuseStatus::Approved, 20))
        .with_excuse(excuse(PEDRO, ExcuseStatus::Pending, 1))
        .with_class(class(1, "Math 101"), Some(TEACHER_USER))
        .with_class(class(2, "History 201"), Some(UserId::new(4)))
        .with_enrollment(ClassId::new(1), MARIA)
        .with_enrollment(ClassId::new(1), PEDRO)
        .with_enrollment(ClassId::new(2), PEDRO)
        .with_teacher(teacher_record(5, TEACHER_USER, "Jose Rizal"))
        .with_teacher(teacher_record(6, UserId::new(4), "Andres Bonifacio"))
}

fn planner(records: Arc<InMemorySchoolRecords>) -> RetrievalPlanner {
    RetrievalPlanner::new(records)
}

#[tokio::test]
async fn student_attendance_rate_this_month() {
    let records = Arc::new(school());
    let outcome = planner(records)
        .plan_and_execute_at("What's my attendance rate this month?", &student_snapshot(), now())
        .await;

    assert_eq!(outcome.intent, Intent::Attendance);
    let RetrievalResult::Attendance { records, summary, scope } = outcome.result else {
        panic!("expected attendance result");
    };
    assert_eq!(summary.present, 23);
    assert_eq!(summary.absent, 2);
    assert_eq!(summary.rate, 92.0);
    assert_eq!(summary.risk, Some(RiskTier::Good));
    assert_eq!(scope, "for you");
    assert!(records.iter().all(|r| r.student_id == MARIA));

    let window = outcome.plan.time_window.unwrap();
    assert_eq!(window.period, Period::ThisMonth);
    assert_eq!(outcome.plan.constraints.student_id, Some(MARIA));
    assert_eq!(outcome.plan.constraints.roster_size, Some(1));
    assert!(!outcome.plan.constraints.unrestricted);
    assert_eq!(outcome.plan.row_cap, 100);
}

#[tokio::test]
async fn student_never_sees_other_students_rows() {
    let records = Arc::new(school());
    let planner = planner(records);
    let snapshot = student_snapshot();

    for question in [
        "show my attendance this week",
        "how many absences did I have last month",
        "list my excuse requests",
        "pending excuse letters this semester",
    ] {
        let outcome = planner.plan_and_execute_at(question, &snapshot, now()).await;
        match outcome.result {
            RetrievalResult::Attendance { records, .. } => {
                assert!(records.iter().all(|r| r.student_id == MARIA), "{question}")
            }
            RetrievalResult::Excuses { records, .. } => {
                assert!(records.iter().all(|r| r.student_id == MARIA), "{question}")
            }
            other => panic!("unexpected result for {question}: {other:?}"),
        }
    }
}

#[tokio::test]
async fn status_filter_narrows_list_but_not_aggregates() {
    let outcome = planner(Arc::new(school()))
        .plan_and_execute_at("how many times was I absent this month", &student_snapshot(), now())
        .await;

    assert_eq!(
        outcome.plan.status_filter,
        Some(StatusFilter::Attendance(AttendanceStatus::Absent))
    );
    let RetrievalResult::Attendance { records, summary, .. } = outcome.result else {
        panic!("expected attendance result");
    };
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.status == AttendanceStatus::Absent));
    assert_eq!(summary.total, 25);
}

#[tokio::test]
async fn teacher_with_no_students_skips_storage() {
    let records = Arc::new(InMemorySchoolRecords::new());
    let outcome = planner(records.clone())
        .plan_and_execute_at("attendance summary this week", &teacher_snapshot(0), now())
        .await;

    let RetrievalResult::Attendance { records: rows, summary, .. } = outcome.result else {
        panic!("expected attendance result");
    };
    assert!(rows.is_empty());
    assert_eq!(summary, AttendanceSummary::empty());
    assert!(outcome.plan.skipped_query);
    assert_eq!(records.call_count(), 0);
}

#[tokio::test]
async fn teacher_with_empty_live_roster_stops_after_lookup() {
    let records = Arc::new(InMemorySchoolRecords::new());
    let outcome = planner(records.clone())
        .plan_and_execute_at("excuse requests", &teacher_snapshot(12), now())
        .await;

    assert!(outcome.plan.skipped_query);
    assert_eq!(outcome.plan.constraints.roster_size, Some(0));
    assert_eq!(records.call_count(), 1);
}

#[tokio::test]
async fn teacher_scope_is_deduplicated_roster() {
    let outcome = planner(Arc::new(school()))
        .plan_and_execute_at("attendance this month", &teacher_snapshot(2), now())
        .await;

    assert_eq!(outcome.plan.constraints.roster_size, Some(2));
    let RetrievalResult::Attendance { summary, scope, .. } = outcome.result else {
        panic!("expected attendance result");
    };
    assert_eq!(scope, "for students in your classes");
    assert_eq!(summary.total, 27);
}

#[tokio::test]
async fn admin_is_unrestricted_with_wide_cap() {
    let outcome = planner(Arc::new(school()))
        .plan_and_execute_at("attendance today", &admin_snapshot(), now())
        .await;

    assert!(outcome.plan.constraints.unrestricted);
    assert_eq!(outcome.plan.row_cap, 200);
    assert_eq!(outcome.plan.time_window.unwrap().period, Period::Today);
}

#[tokio::test]
async fn student_rows_are_capped() {
    let mut records = InMemorySchoolRecords::new();
    for i in 0..150 {
        records = records.with_attendance(mark(MARIA, AttendanceStatus::Present, i % 10));
    }
    let outcome = planner(Arc::new(records))
        .plan_and_execute_at("my attendance this month", &student_snapshot(), now())
        .await;

    let RetrievalResult::Attendance { records, summary, .. } = outcome.result else {
        panic!("expected attendance result");
    };
    assert_eq!(records.len(), STUDENT_ROW_CAP);
    assert_eq!(summary.total, 150);
}

#[tokio::test]
async fn excuse_defaults_to_semester_and_reads_status() {
    let outcome = planner(Arc::new(school()))
        .plan_and_execute_at("do I have pending excuse requests?", &student_snapshot(), now())
        .await;

    assert_eq!(outcome.intent, Intent::Excuse);
    assert_eq!(outcome.plan.time_window.unwrap().period, Period::ThisSemester);
    let RetrievalResult::Excuses { records, summary, .. } = outcome.result else {
        panic!("expected excuse result");
    };
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, ExcuseStatus::Pending);
    assert_eq!(summary.pending, 1);
    assert_eq!(summary.approved, 1);
}

#[tokio::test]
async fn student_schedule_lists_enrolled_classes_only() {
    let outcome = planner(Arc::new(school()))
        .plan_and_execute_at("what is my schedule?", &student_snapshot(), now())
        .await;

    assert_eq!(outcome.intent, Intent::Schedule);
    assert!(outcome.plan.time_window.is_none());
    let RetrievalResult::Schedule { classes, .. } = outcome.result else {
        panic!("expected schedule result");
    };
    let names: Vec<_> = classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Math 101"]);
}

fn with_home_class(mut snapshot: UserSnapshot, class: i64) -> UserSnapshot {
    if let RoleProfile::Student(s) = &mut snapshot.profile {
        s.home_class_id = Some(ClassId::new(class));
    }
    snapshot
}

#[tokio::test]
async fn unenrolled_student_falls_back_to_home_class() {
    let records = Arc::new(InMemorySchoolRecords::new().with_class(class(9, "Section 9-A"), None));
    let snapshot = with_home_class(student_snapshot(), 9);

    let outcome = planner(records.clone())
        .plan_and_execute_at("what is my schedule?", &snapshot, now())
        .await;

    let RetrievalResult::Schedule { classes, .. } = outcome.result else {
        panic!("expected schedule result");
    };
    let names: Vec<_> = classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Section 9-A"]);
    assert_eq!(records.call_count(), 2);
}

#[tokio::test]
async fn enrollments_win_over_home_class() {
    let snapshot = with_home_class(student_snapshot(), 2);

    let outcome = planner(Arc::new(school()))
        .plan_and_execute_at("List my subjects", &snapshot, now())
        .await;

    let RetrievalResult::Classes { classes, .. } = outcome.result else {
        panic!("expected classes result");
    };
    let names: Vec<_> = classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Math 101"]);
}

#[tokio::test]
async fn student_teacher_directory_covers_their_classes() {
    let outcome = planner(Arc::new(school()))
        .plan_and_execute_at("who is my teacher?", &student_snapshot(), now())
        .await;

    let RetrievalResult::Teachers { teachers, .. } = outcome.result else {
        panic!("expected teacher result");
    };
    assert_eq!(teachers.len(), 1);
    assert_eq!(teachers[0].name, "Jose Rizal");
}

#[tokio::test]
async fn help_and_unknown_never_touch_storage() {
    let records = Arc::new(school());
    let planner = planner(records.clone());

    let help = planner.plan_and_execute_at("help", &student_snapshot(), now()).await;
    assert!(matches!(help.result, RetrievalResult::Help { .. }));

    let unknown = planner
        .plan_and_execute_at("what's the weather like?", &student_snapshot(), now())
        .await;
    assert_eq!(unknown.intent, Intent::Unknown);
    assert!(matches!(unknown.result, RetrievalResult::Unsupported { .. }));

    assert_eq!(records.call_count(), 0);
}

#[tokio::test]
async fn storage_failure_is_terminal_error() {
    let records = Arc::new(school().failing(RecordsError::Timeout(5000)));
    let outcome = planner(records)
        .plan_and_execute_at("my attendance", &student_snapshot(), now())
        .await;

    assert_eq!(outcome.intent, Intent::Attendance);
    assert!(outcome.result.is_error());
    assert_eq!(outcome.result.row_count(), 0);
}

//! In-memory SchoolRecordsReader for tests and demos.
//!
//! Applies scope, window, status and limit the same way the SQL does, and
//! counts calls so callers can assert that a query was skipped.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::assistant::{AttendanceCounts, ExcuseSummary, StudentScope, TimeWindow};
use crate::domain::foundation::{ClassId, StudentId, TeacherId, UserId};
use crate::domain::school::{AttendanceRecord, ClassSummary, ExcuseRecord, TeacherRecord};
use crate::ports::{AttendanceQuery, ExcuseQuery, RecordsError, SchoolRecordsReader};

#[derive(Debug, Clone)]
struct ClassRow {
    class: ClassSummary,
    teacher_user: Option<UserId>,
    active: bool,
}

#[derive(Debug, Default)]
pub struct InMemorySchoolRecords {
    attendance: Vec<AttendanceRecord>,
    excuses: Vec<ExcuseRecord>,
    classes: Vec<ClassRow>,
    enrollments: Vec<(ClassId, StudentId)>,
    teachers: Vec<TeacherRecord>,
    failure: Option<RecordsError>,
    calls: AtomicUsize,
}

impl InMemorySchoolRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attendance(mut self, record: AttendanceRecord) -> Self {
        self.attendance.push(record);
        self
    }

    pub fn with_excuse(mut self, record: ExcuseRecord) -> Self {
        self.excuses.push(record);
        self
    }

    /// Adds an active class taught by `teacher_user`.
    pub fn with_class(mut self, class: ClassSummary, teacher_user: Option<UserId>) -> Self {
        self.classes.push(ClassRow {
            class,
            teacher_user,
            active: true,
        });
        self
    }

    pub fn with_inactive_class(mut self, class: ClassSummary, teacher_user: Option<UserId>) -> Self {
        self.classes.push(ClassRow {
            class,
            teacher_user,
            active: false,
        });
        self
    }

    pub fn with_enrollment(mut self, class: ClassId, student: StudentId) -> Self {
        self.enrollments.push((class, student));
        self
    }

    pub fn with_teacher(mut self, teacher: TeacherRecord) -> Self {
        self.teachers.push(teacher);
        self
    }

    /// Every call fails with `error`.
    pub fn failing(mut self, error: RecordsError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Number of reader calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), RecordsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn classes_of_student(&self, student: StudentId) -> Vec<ClassId> {
        self.enrollments
            .iter()
            .filter(|(_, s)| *s == student)
            .map(|(c, _)| *c)
            .collect()
    }

    fn attendance_in(&self, scope: &StudentScope, window: Option<&TimeWindow>) -> Vec<&AttendanceRecord> {
        self.attendance
            .iter()
            .filter(|r| scope.permits(r.student_id))
            .filter(|r| window.map_or(true, |w| w.contains(r.marked_at)))
            .collect()
    }

    fn excuses_in(&self, scope: &StudentScope, window: Option<&TimeWindow>) -> Vec<&ExcuseRecord> {
        self.excuses
            .iter()
            .filter(|r| scope.permits(r.student_id))
            .filter(|r| window.map_or(true, |w| w.contains(r.submitted_at)))
            .collect()
    }
}

#[async_trait]
impl SchoolRecordsReader for InMemorySchoolRecords {
    async fn enrolled_student_ids(&self, teacher_user: UserId) -> Result<Vec<StudentId>, RecordsError> {
        self.enter()?;
        let taught: Vec<ClassId> = self
            .classes
            .iter()
            .filter(|c| c.teacher_user == Some(teacher_user))
            .map(|c| c.class.id)
            .collect();
        Ok(self
            .enrollments
            .iter()
            .filter(|(c, _)| taught.contains(c))
            .map(|(_, s)| *s)
            .collect())
    }

    async fn attendance_records(&self, query: &AttendanceQuery) -> Result<Vec<AttendanceRecord>, RecordsError> {
        self.enter()?;
        let mut rows: Vec<AttendanceRecord> = self
            .attendance_in(&query.scope, query.window.as_ref())
            .into_iter()
            .filter(|r| query.status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.marked_at.cmp(&a.marked_at));
        rows.truncate(query.limit);
        Ok(rows)
    }

    async fn attendance_counts(
        &self,
        scope: &StudentScope,
        window: Option<&TimeWindow>,
    ) -> Result<AttendanceCounts, RecordsError> {
        self.enter()?;
        let mut counts = AttendanceCounts::default();
        for record in self.attendance_in(scope, window) {
            counts.add(record.status, 1);
        }
        Ok(counts)
    }

    async fn excuse_records(&self, query: &ExcuseQuery) -> Result<Vec<ExcuseRecord>, RecordsError> {
        self.enter()?;
        let mut rows: Vec<ExcuseRecord> = self
            .excuses_in(&query.scope, query.window.as_ref())
            .into_iter()
            .filter(|r| query.status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        rows.truncate(query.limit);
        Ok(rows)
    }

    async fn excuse_counts(
        &self,
        scope: &StudentScope,
        window: Option<&TimeWindow>,
    ) -> Result<ExcuseSummary, RecordsError> {
        self.enter()?;
        let mut summary = ExcuseSummary::default();
        for record in self.excuses_in(scope, window) {
            summary.add(record.status, 1);
        }
        Ok(summary)
    }

    async fn classes_for_student(&self, student: StudentId, limit: usize) -> Result<Vec<ClassSummary>, RecordsError> {
        self.enter()?;
        let enrolled = self.classes_of_student(student);
        Ok(self
            .classes
            .iter()
            .filter(|c| enrolled.contains(&c.class.id))
            .map(|c| c.class.clone())
            .take(limit)
            .collect())
    }

    async fn class_by_id(&self, class: ClassId) -> Result<Option<ClassSummary>, RecordsError> {
        self.enter()?;
        Ok(self
            .classes
            .iter()
            .find(|c| c.class.id == class)
            .map(|c| c.class.clone()))
    }

    async fn classes_for_teacher(&self, teacher_user: UserId, limit: usize) -> Result<Vec<ClassSummary>, RecordsError> {
        self.enter()?;
        Ok(self
            .classes
            .iter()
            .filter(|c| c.active && c.teacher_user == Some(teacher_user))
            .map(|c| c.class.clone())
            .take(limit)
            .collect())
    }

    async fn active_classes(&self, limit: usize) -> Result<Vec<ClassSummary>, RecordsError> {
        self.enter()?;
        Ok(self
            .classes
            .iter()
            .filter(|c| c.active)
            .map(|c| c.class.clone())
            .take(limit)
            .collect())
    }

    async fn teachers_for_student(&self, student: StudentId, limit: usize) -> Result<Vec<TeacherRecord>, RecordsError> {
        self.enter()?;
        let enrolled = self.classes_of_student(student);
        let mut teacher_users: Vec<UserId> = self
            .classes
            .iter()
            .filter(|c| enrolled.contains(&c.class.id))
            .filter_map(|c| c.teacher_user)
            .collect();
        teacher_users.sort_unstable();
        teacher_users.dedup();

        Ok(self
            .teachers
            .iter()
            .filter(|t| t.user_id.is_some_and(|u| teacher_users.contains(&u)))
            .cloned()
            .take(limit)
            .collect())
    }

    async fn teacher_by_id(&self, teacher: TeacherId) -> Result<Option<TeacherRecord>, RecordsError> {
        self.enter()?;
        Ok(self.teachers.iter().find(|t| t.id == teacher).cloned())
    }

    async fn all_teachers(&self, limit: usize) -> Result<Vec<TeacherRecord>, RecordsError> {
        self.enter()?;
        Ok(self.teachers.iter().take(limit).cloned().collect())
    }
}

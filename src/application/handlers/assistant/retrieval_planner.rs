//! Retrieval planner - turns a question and snapshot into a scoped, capped
//! retrieval and runs it.
//!
//! The role scope is resolved before any record query and passed into the
//! query itself. Storage failures become `RetrievalResult::Error`; no partial
//! data is returned alongside them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

use crate::domain::assistant::{
    classify, describe_scope, normalize, AttendanceSummary, Dataset, ExcuseSummary, Intent,
    Period, RetrievalPlan, RetrievalResult, RoleConstraints, StatusFilter, StudentScope,
};
use crate::domain::foundation::{ClassId, Role, StudentId, TeacherId, UserId};
use crate::domain::snapshot::{RoleProfile, UserSnapshot};
use crate::ports::{AttendanceQuery, ExcuseQuery, RecordsError, SchoolRecordsReader};

/// Intent, plan and result of one retrieval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalOutcome {
    pub intent: Intent,
    pub plan: RetrievalPlan,
    pub result: RetrievalResult,
}

pub struct RetrievalPlanner {
    records: Arc<dyn SchoolRecordsReader>,
}

/// Identity facts pulled from the snapshot.
struct Subject {
    role: Role,
    user_id: UserId,
    student_id: Option<StudentId>,
    teacher_id: Option<TeacherId>,
    /// `students.class_id`, used when the student has no enrollments
    home_class_id: Option<ClassId>,
    /// The snapshot already counted zero enrolled students.
    empty_roster: bool,
}

impl Subject {
    fn of(snapshot: &UserSnapshot) -> Self {
        let (student_id, teacher_id, home_class_id, empty_roster) = match &snapshot.profile {
            RoleProfile::Student(s) => (Some(s.student_id), None, s.home_class_id, false),
            RoleProfile::Teacher(t) => {
                (None, Some(t.teacher_id), None, t.stats.total_students == 0)
            }
            RoleProfile::Admin | RoleProfile::Unknown => (None, None, None, false),
        };
        Self {
            role: snapshot.role(),
            user_id: snapshot.user_id(),
            student_id,
            teacher_id,
            home_class_id,
            empty_roster,
        }
    }
}

impl RetrievalPlanner {
    pub fn new(records: Arc<dyn SchoolRecordsReader>) -> Self {
        Self { records }
    }

    pub async fn plan_and_execute(&self, question: &str, snapshot: &UserSnapshot) -> RetrievalOutcome {
        self.plan_and_execute_at(question, snapshot, Utc::now()).await
    }

    /// Same as [`plan_and_execute`](Self::plan_and_execute) with an explicit clock.
    pub async fn plan_and_execute_at(
        &self,
        question: &str,
        snapshot: &UserSnapshot,
        now: DateTime<Utc>,
    ) -> RetrievalOutcome {
        let intent = classify(question);
        let normalized = normalize(question);
        let subject = Subject::of(snapshot);

        let takes_window = matches!(intent, Intent::Attendance | Intent::Excuse);
        let time_window = takes_window
            .then(|| Period::extract(&normalized).or_else(|| Period::default_for(intent)))
            .flatten()
            .map(|period| period.resolve(now));

        let mut plan = RetrievalPlan {
            intent,
            datasets: Dataset::for_intent(intent),
            time_window,
            status_filter: StatusFilter::extract(intent, &normalized),
            constraints: RoleConstraints {
                role: subject.role,
                user_id: subject.user_id,
                student_id: subject.student_id,
                teacher_id: subject.teacher_id,
                roster_size: None,
                unrestricted: false,
            },
            row_cap: RetrievalPlan::row_cap_for(subject.role),
            skipped_query: false,
        };

        let result = match self.execute(&mut plan, &subject).await {
            Ok(result) => result,
            Err(e) => {
                error!(
                    user_id = %subject.user_id,
                    intent = %intent,
                    error = %e,
                    "Retrieval failed"
                );
                RetrievalResult::error(e.to_string())
            }
        };

        debug!(
            user_id = %subject.user_id,
            intent = %intent,
            rows = result.row_count(),
            skipped = plan.skipped_query,
            "Retrieval complete"
        );

        RetrievalOutcome {
            intent,
            plan,
            result,
        }
    }

    /// Students the subject may see, resolved before any record query.
    async fn student_scope(&self, subject: &Subject) -> Result<StudentScope, RecordsError> {
        match subject.role {
            Role::Student => Ok(StudentScope::only(subject.student_id.into_iter().collect())),
            Role::Teacher if subject.empty_roster => Ok(StudentScope::only(Vec::new())),
            Role::Teacher => {
                let roster = self.records.enrolled_student_ids(subject.user_id).await?;
                Ok(StudentScope::only(roster))
            }
            Role::Admin | Role::Unknown => Ok(StudentScope::All),
        }
    }

    async fn execute(
        &self,
        plan: &mut RetrievalPlan,
        subject: &Subject,
    ) -> Result<RetrievalResult, RecordsError> {
        let cap = plan.row_cap;
        let scope_text = describe_scope(subject.role, plan.intent);

        match plan.intent {
            Intent::Attendance => {
                let scope = self.scoped(plan, subject).await?;
                if scope.is_empty() {
                    plan.skipped_query = true;
                    return Ok(RetrievalResult::Attendance {
                        records: Vec::new(),
                        summary: AttendanceSummary::empty(),
                        scope: scope_text,
                    });
                }

                let query = AttendanceQuery {
                    scope,
                    window: plan.time_window,
                    status: plan.status_filter.and_then(|f| f.attendance()),
                    limit: cap,
                };
                let mut records = self.records.attendance_records(&query).await?;
                records.truncate(cap);
                let counts = self
                    .records
                    .attendance_counts(&query.scope, query.window.as_ref())
                    .await?;

                Ok(RetrievalResult::Attendance {
                    records,
                    summary: AttendanceSummary::from_counts(counts),
                    scope: scope_text,
                })
            }

            Intent::Excuse => {
                let scope = self.scoped(plan, subject).await?;
                if scope.is_empty() {
                    plan.skipped_query = true;
                    return Ok(RetrievalResult::Excuses {
                        records: Vec::new(),
                        summary: ExcuseSummary::default(),
                        scope: scope_text,
                    });
                }

                let query = ExcuseQuery {
                    scope,
                    window: plan.time_window,
                    status: plan.status_filter.and_then(|f| f.excuse()),
                    limit: cap,
                };
                let mut records = self.records.excuse_records(&query).await?;
                records.truncate(cap);
                let summary = self
                    .records
                    .excuse_counts(&query.scope, query.window.as_ref())
                    .await?;

                Ok(RetrievalResult::Excuses {
                    records,
                    summary,
                    scope: scope_text,
                })
            }

            Intent::Schedule | Intent::Classes => {
                let mut classes = match (subject.role, subject.student_id) {
                    (Role::Student, Some(student)) => {
                        let enrolled = self.records.classes_for_student(student, cap).await?;
                        match subject.home_class_id {
                            Some(home) if enrolled.is_empty() => {
                                self.records.class_by_id(home).await?.into_iter().collect()
                            }
                            _ => enrolled,
                        }
                    }
                    (Role::Student, None) => Vec::new(),
                    (Role::Teacher, _) => {
                        self.records.classes_for_teacher(subject.user_id, cap).await?
                    }
                    (Role::Admin | Role::Unknown, _) => {
                        plan.constraints.unrestricted = true;
                        self.records.active_classes(cap).await?
                    }
                };
                classes.truncate(cap);

                Ok(if plan.intent == Intent::Schedule {
                    RetrievalResult::Schedule {
                        classes,
                        scope: scope_text,
                    }
                } else {
                    RetrievalResult::Classes {
                        classes,
                        scope: scope_text,
                    }
                })
            }

            Intent::Teacher => {
                let mut teachers = match subject.role {
                    Role::Student => match subject.student_id {
                        Some(student) => self.records.teachers_for_student(student, cap).await?,
                        None => Vec::new(),
                    },
                    Role::Teacher => match subject.teacher_id {
                        Some(id) => self.records.teacher_by_id(id).await?.into_iter().collect(),
                        None => Vec::new(),
                    },
                    Role::Admin | Role::Unknown => {
                        plan.constraints.unrestricted = true;
                        self.records.all_teachers(cap).await?
                    }
                };
                teachers.truncate(cap);

                Ok(RetrievalResult::Teachers {
                    teachers,
                    scope: scope_text,
                })
            }

            Intent::Help => Ok(RetrievalResult::help()),
            Intent::Unknown => Ok(RetrievalResult::unsupported()),
        }
    }

    /// Resolves the student scope and records it on the plan.
    async fn scoped(
        &self,
        plan: &mut RetrievalPlan,
        subject: &Subject,
    ) -> Result<StudentScope, RecordsError> {
        let scope = self.student_scope(subject).await?;
        match &scope {
            StudentScope::Only(ids) => plan.constraints.roster_size = Some(ids.len()),
            StudentScope::All => plan.constraints.unrestricted = true,
        }
        Ok(scope)
    }
}

#[cfg(test)]
#[path = "retrieval_planner_test.rs"]
mod tests;

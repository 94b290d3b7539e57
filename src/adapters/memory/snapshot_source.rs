//! In-memory SnapshotSource for tests and demos.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::foundation::UserId;
use crate::domain::snapshot::{Account, StudentProfile, TeacherProfile};
use crate::ports::{RecordsError, SnapshotSource};

#[derive(Debug, Default, Clone)]
pub struct InMemorySnapshotSource {
    accounts: HashMap<UserId, Account>,
    teachers: HashMap<UserId, TeacherProfile>,
    students: HashMap<UserId, StudentProfile>,
}

impl InMemorySnapshotSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, account: Account) -> Self {
        self.accounts.insert(account.id, account);
        self
    }

    pub fn with_teacher(mut self, user: UserId, profile: TeacherProfile) -> Self {
        self.teachers.insert(user, profile);
        self
    }

    pub fn with_student(mut self, user: UserId, profile: StudentProfile) -> Self {
        self.students.insert(user, profile);
        self
    }
}

#[async_trait]
impl SnapshotSource for InMemorySnapshotSource {
    async fn account(&self, user: UserId) -> Result<Option<Account>, RecordsError> {
        Ok(self.accounts.get(&user).cloned())
    }

    async fn teacher_profile(&self, user: UserId) -> Result<Option<TeacherProfile>, RecordsError> {
        Ok(self.teachers.get(&user).cloned())
    }

    async fn student_profile(&self, user: UserId) -> Result<Option<StudentProfile>, RecordsError> {
        Ok(self.students.get(&user).cloned())
    }
}

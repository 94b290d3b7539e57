//! Snapshot Source Port - loads the raw material for a user snapshot.

use async_trait::async_trait;

use super::school_records::RecordsError;
use crate::domain::foundation::UserId;
use crate::domain::snapshot::{Account, StudentProfile, TeacherProfile};

/// Read-only port used to (re)build snapshots.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// The account row, or `None` if the user does not exist.
    async fn account(&self, user: UserId) -> Result<Option<Account>, RecordsError>;

    /// Teacher record with its active classes, if the account has one.
    async fn teacher_profile(&self, user: UserId) -> Result<Option<TeacherProfile>, RecordsError>;

    /// Student record with classes, recent attendance and excuse requests.
    async fn student_profile(&self, user: UserId) -> Result<Option<StudentProfile>, RecordsError>;
}

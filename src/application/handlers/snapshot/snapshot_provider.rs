//! Snapshot provider - cached, role-scoped user snapshots.
//!
//! Reads go through the cache; a miss (or any cache failure) rebuilds from
//! the snapshot source and writes back with the configured TTL.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::foundation::UserId;
use crate::domain::snapshot::{SnapshotError, UserSnapshot};
use crate::ports::{SnapshotCache, SnapshotSource};

pub struct SnapshotProvider {
    source: Arc<dyn SnapshotSource>,
    cache: Arc<dyn SnapshotCache>,
    ttl: Duration,
}

impl SnapshotProvider {
    pub fn new(source: Arc<dyn SnapshotSource>, cache: Arc<dyn SnapshotCache>, ttl: Duration) -> Self {
        Self { source, cache, ttl }
    }

    /// Cached snapshot for the user, building it on a miss.
    pub async fn get(&self, user: UserId) -> Result<UserSnapshot, SnapshotError> {
        match self.cache.get(user).await {
            Ok(Some(snapshot)) => {
                debug!(user_id = %user, "Snapshot cache hit");
                return Ok(snapshot);
            }
            Ok(None) => debug!(user_id = %user, "Snapshot cache miss"),
            Err(e) => warn!(user_id = %user, error = %e, "Snapshot cache read failed, rebuilding"),
        }
        self.build_and_store(user).await
    }

    /// Drops the cached snapshot; the next `get` rebuilds it.
    pub async fn invalidate(&self, user: UserId) {
        if let Err(e) = self.cache.remove(user).await {
            warn!(user_id = %user, error = %e, "Snapshot cache eviction failed");
        }
    }

    /// Rebuilds unconditionally and replaces the cached copy.
    pub async fn force_rebuild(&self, user: UserId) -> Result<UserSnapshot, SnapshotError> {
        self.invalidate(user).await;
        self.build_and_store(user).await
    }

    async fn build_and_store(&self, user: UserId) -> Result<UserSnapshot, SnapshotError> {
        let snapshot = self.build(user).await?;
        if let Err(e) = self.cache.put(&snapshot, self.ttl).await {
            warn!(user_id = %user, error = %e, "Snapshot cache write failed");
        }
        info!(user_id = %user, role = %snapshot.role(), "Snapshot built");
        Ok(snapshot)
    }

    async fn build(&self, user: UserId) -> Result<UserSnapshot, SnapshotError> {
        let account = self
            .source
            .account(user)
            .await
            .map_err(|e| SnapshotError::Source(e.to_string()))?
            .ok_or(SnapshotError::UserNotFound(user))?;

        let teacher = self
            .source
            .teacher_profile(user)
            .await
            .map_err(|e| SnapshotError::Source(e.to_string()))?;

        // A teacher record wins, so the student lookup is skipped.
        let student = if teacher.is_some() {
            None
        } else {
            self.source
                .student_profile(user)
                .await
                .map_err(|e| SnapshotError::Source(e.to_string()))?
        };

        UserSnapshot::assemble(account, teacher, student, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::InMemorySnapshotCache;
    use crate::domain::foundation::{Role, StudentId};
    use crate::domain::snapshot::{Account, StudentProfile, StudentStats, TeacherProfile};
    use crate::ports::{CacheError, RecordsError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        builds: AtomicUsize,
        role_column: Option<&'static str>,
        has_student: bool,
        fail: bool,
    }

    #[async_trait]
    impl SnapshotSource for CountingSource {
        async fn account(&self, user: UserId) -> Result<Option<Account>, RecordsError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RecordsError::Timeout(5000));
            }
            if user.get() == 404 {
                return Ok(None);
            }
            Ok(Some(Account {
                id: user,
                name: "Maria Santos".to_string(),
                email: None,
                role_column: self.role_column.map(String::from),
                is_admin: false,
            }))
        }

        async fn teacher_profile(&self, _: UserId) -> Result<Option<TeacherProfile>, RecordsError> {
            Ok(None)
        }

        async fn student_profile(&self, _: UserId) -> Result<Option<StudentProfile>, RecordsError> {
            if !self.has_student {
                return Ok(None);
            }
            Ok(Some(StudentProfile {
                student_id: StudentId::new(77),
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
            }))
        }
    }

    struct BrokenCache;

    #[async_trait]
    impl SnapshotCache for BrokenCache {
        async fn get(&self, _: UserId) -> Result<Option<UserSnapshot>, CacheError> {
            Err(CacheError::Backend("connection refused".into()))
        }
        async fn put(&self, _: &UserSnapshot, _: Duration) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".into()))
        }
        async fn remove(&self, _: UserId) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".into()))
        }
    }

    fn student_source() -> Arc<CountingSource> {
        Arc::new(CountingSource {
            role_column: Some("student"),
            has_student: true,
            ..Default::default()
        })
    }

    fn provider(source: Arc<CountingSource>, cache: Arc<dyn SnapshotCache>) -> SnapshotProvider {
        SnapshotProvider::new(source, cache, Duration::from_secs(900))
    }

    #[tokio::test]
    async fn second_get_is_served_from_cache() {
        let source = student_source();
        let provider = provider(source.clone(), Arc::new(InMemorySnapshotCache::new()));

        let first = provider.get(UserId::new(12)).await.unwrap();
        let second = provider.get(UserId::new(12)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.role(), Role::Student);
        assert_eq!(source.builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_and_force_rebuild_hit_the_source() {
        let source = student_source();
        let provider = provider(source.clone(), Arc::new(InMemorySnapshotCache::new()));

        provider.get(UserId::new(12)).await.unwrap();
        provider.invalidate(UserId::new(12)).await;
        provider.get(UserId::new(12)).await.unwrap();
        provider.force_rebuild(UserId::new(12)).await.unwrap();

        assert_eq!(source.builds.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cache_failures_degrade_to_rebuild() {
        let source = student_source();
        let provider = provider(source.clone(), Arc::new(BrokenCache));

        assert!(provider.get(UserId::new(12)).await.is_ok());
        assert!(provider.get(UserId::new(12)).await.is_ok());
        assert_eq!(source.builds.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let provider = provider(student_source(), Arc::new(InMemorySnapshotCache::new()));
        let err = provider.get(UserId::new(404)).await.unwrap_err();
        assert!(matches!(err, SnapshotError::UserNotFound(id) if id.get() == 404));
    }

    #[tokio::test]
    async fn student_role_without_record_is_denied() {
        let source = Arc::new(CountingSource {
            role_column: Some("student"),
            ..Default::default()
        });
        let provider = provider(source, Arc::new(InMemorySnapshotCache::new()));
        let err = provider.get(UserId::new(12)).await.unwrap_err();
        assert!(matches!(err, SnapshotError::AccessDenied { role: Role::Student, .. }));
    }

    #[tokio::test]
    async fn source_errors_surface() {
        let source = Arc::new(CountingSource {
            fail: true,
            ..Default::default()
        });
        let provider = provider(source, Arc::new(InMemorySnapshotCache::new()));
        assert!(matches!(
            provider.get(UserId::new(1)).await,
            Err(SnapshotError::Source(_))
        ));
    }
}

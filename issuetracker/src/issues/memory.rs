//! In-memory issue storage
//!
//! `MemoryIssueStorage` keeps every issue in an [`IssueCollection`] behind a
//! `tokio::sync::RwLock`. It is the default backend for the server and the
//! workhorse for tests, so it carries knobs for simulating store failures
//! and slow operations.
//!
//! ```ignore
//! use issuetracker::issues::{IssueStorage, MemoryIssueStorage, NewIssue};
//!
//! let storage = MemoryIssueStorage::new();
//! let issue = storage.insert_issue(NewIssue { /* ... */ }).await?;
//! ```

use super::filter::IssueFilter;
use super::model::{Issue, IssueId, IssueUpdate, NewIssue};
use super::storage::{IssueCollection, IssueStorage};
use crate::error::{IssueTrackerError, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Knobs for simulating store behavior in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageConfig {
    /// Fail every `find_issues` call
    pub fail_find: bool,
    /// Fail every `insert_issue` call
    pub fail_insert: bool,
    /// Fail every `update_issue` call
    pub fail_update: bool,
    /// Fail every `delete_issue` call
    pub fail_delete: bool,
    /// Sleep this long before each operation
    pub operation_delay_ms: Option<u64>,
}

/// Issue storage held entirely in process memory
#[derive(Debug, Clone)]
pub struct MemoryIssueStorage {
    collection: Arc<RwLock<IssueCollection>>,
    config: Arc<RwLock<MemoryStorageConfig>>,
}

impl MemoryIssueStorage {
    /// Create an empty store with default behavior
    pub fn new() -> Self {
        Self::new_with_config(MemoryStorageConfig::default())
    }

    /// Create an empty store with the given test behavior
    pub fn new_with_config(config: MemoryStorageConfig) -> Self {
        Self {
            collection: Arc::new(RwLock::new(IssueCollection::new())),
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// Replace the test behavior, e.g. to start failing mid-test
    pub async fn set_config(&self, config: MemoryStorageConfig) {
        *self.config.write().await = config;
    }

    /// Number of stored issues
    pub async fn issue_count(&self) -> usize {
        self.collection.read().await.len()
    }

    /// Drop every stored issue
    pub async fn clear(&self) {
        *self.collection.write().await = IssueCollection::new();
    }

    /// Apply the configured delay, then fail if `should_fail` picks a set flag
    async fn before_operation(
        &self,
        operation: &str,
        should_fail: impl FnOnce(&MemoryStorageConfig) -> bool,
    ) -> Result<()> {
        let config = self.config.read().await.clone();
        if let Some(delay_ms) = config.operation_delay_ms {
            tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
        }
        if should_fail(&config) {
            return Err(IssueTrackerError::Storage(format!(
                "Simulated {} failure",
                operation
            )));
        }
        Ok(())
    }
}

impl Default for MemoryIssueStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IssueStorage for MemoryIssueStorage {
    async fn find_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        self.before_operation("find", |c| c.fail_find).await?;
        Ok(self.collection.read().await.find(filter))
    }

    async fn insert_issue(&self, issue: NewIssue) -> Result<Issue> {
        self.before_operation("insert", |c| c.fail_insert).await?;

        let issue = Issue::create(issue, Utc::now());
        self.collection.write().await.insert(issue.clone());
        Ok(issue)
    }

    async fn update_issue(&self, id: &IssueId, update: IssueUpdate) -> Result<Issue> {
        self.before_operation("update", |c| c.fail_update).await?;

        self.collection
            .write()
            .await
            .update(id, &update)
            .ok_or_else(|| IssueTrackerError::IssueNotFound(id.to_string()))
    }

    async fn delete_issue(&self, id: &IssueId) -> Result<Issue> {
        self.before_operation("delete", |c| c.fail_delete).await?;

        self.collection
            .write()
            .await
            .remove(id)
            .ok_or_else(|| IssueTrackerError::IssueNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_issue(project: &str, title: &str) -> NewIssue {
        NewIssue {
            project: project.to_string(),
            issue_title: title.to_string(),
            issue_text: "text".to_string(),
            created_by: "Memory Test".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_then_find() {
        let storage = MemoryIssueStorage::new();
        let created = storage.insert_issue(new_issue("test", "Title")).await.unwrap();
        storage.insert_issue(new_issue("other", "Title")).await.unwrap();

        let found = storage
            .find_issues(&IssueFilter::for_project("test"))
            .await
            .unwrap();
        assert_eq!(found, vec![created]);
        assert_eq!(storage.issue_count().await, 2);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let storage = MemoryIssueStorage::new();
        let err = storage
            .update_issue(&IssueId::new(), IssueUpdate::default().touch(Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, IssueTrackerError::IssueNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_once() {
        let storage = MemoryIssueStorage::new();
        let created = storage.insert_issue(new_issue("test", "Title")).await.unwrap();

        let deleted = storage.delete_issue(&created.id).await.unwrap();
        assert_eq!(deleted.id, created.id);
        assert!(matches!(
            storage.delete_issue(&created.id).await,
            Err(IssueTrackerError::IssueNotFound(_))
        ));
        assert_eq!(storage.issue_count().await, 0);
    }

    #[tokio::test]
    async fn test_simulated_failures() {
        let storage = MemoryIssueStorage::new_with_config(MemoryStorageConfig {
            fail_find: true,
            ..Default::default()
        });
        assert!(matches!(
            storage.find_issues(&IssueFilter::for_project("test")).await,
            Err(IssueTrackerError::Storage(_))
        ));
        assert!(storage.insert_issue(new_issue("test", "Title")).await.is_ok());

        storage
            .set_config(MemoryStorageConfig {
                fail_insert: true,
                ..Default::default()
            })
            .await;
        assert!(storage.insert_issue(new_issue("test", "Title")).await.is_err());
        assert!(storage
            .find_issues(&IssueFilter::for_project("test"))
            .await
            .is_ok());

        storage.clear().await;
        assert_eq!(storage.issue_count().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_inserts() {
        let storage = MemoryIssueStorage::new();
        let mut handles = Vec::new();
        for i in 0..20 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                storage
                    .insert_issue(new_issue("load", &format!("issue {}", i)))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let found = storage
            .find_issues(&IssueFilter::for_project("load"))
            .await
            .unwrap();
        assert_eq!(found.len(), 20);
    }
}

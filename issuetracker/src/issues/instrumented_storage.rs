use super::filter::IssueFilter;
use super::metrics::{MetricsSnapshot, Operation, PerformanceMetrics};
use super::model::{Issue, IssueId, IssueUpdate, NewIssue};
use super::storage::IssueStorage;
use crate::error::Result;
use async_trait::async_trait;
use std::future::Future;
use tokio::time::Instant;

/// A storage wrapper that collects performance metrics for all operations
pub struct InstrumentedIssueStorage {
    storage: Box<dyn IssueStorage>,
    metrics: PerformanceMetrics,
}

impl InstrumentedIssueStorage {
    /// Wrap `storage`, starting with empty metrics
    pub fn new(storage: Box<dyn IssueStorage>) -> Self {
        Self {
            storage,
            metrics: PerformanceMetrics::new(),
        }
    }

    /// The shared metrics collector
    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    /// Snapshot of the current metrics
    pub fn get_metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.get_stats()
    }

    /// Reset all metrics to zero
    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    async fn timed<T>(
        &self,
        operation: Operation,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let start = Instant::now();
        let result = call.await;
        self.metrics
            .record_operation(operation, start.elapsed(), result.is_ok());
        result
    }
}

#[async_trait]
impl IssueStorage for InstrumentedIssueStorage {
    async fn find_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        self.timed(Operation::Find, self.storage.find_issues(filter))
            .await
    }

    async fn insert_issue(&self, issue: NewIssue) -> Result<Issue> {
        self.timed(Operation::Insert, self.storage.insert_issue(issue))
            .await
    }

    async fn update_issue(&self, id: &IssueId, update: IssueUpdate) -> Result<Issue> {
        self.timed(Operation::Update, self.storage.update_issue(id, update))
            .await
    }

    async fn delete_issue(&self, id: &IssueId) -> Result<Issue> {
        self.timed(Operation::Delete, self.storage.delete_issue(id))
            .await
    }
}

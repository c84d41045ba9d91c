use super::filter::IssueFilter;
use super::model::{Issue, IssueId, IssueUpdate, NewIssue};
use crate::error::Result;
use std::collections::{BTreeSet, HashMap};

/// Document-store operations behind the issue resource
///
/// Each call is atomic for the single document it touches.
#[async_trait::async_trait]
pub trait IssueStorage: Send + Sync {
    /// Every issue matching `filter`
    async fn find_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>>;

    /// Persist a new issue and return it with its assigned id
    async fn insert_issue(&self, issue: NewIssue) -> Result<Issue>;

    /// Apply `update` to the issue with `id` and return the new document
    ///
    /// Fails with `IssueNotFound` when no issue has that id.
    async fn update_issue(&self, id: &IssueId, update: IssueUpdate) -> Result<Issue>;

    /// Remove the issue with `id` and return what was removed
    ///
    /// Fails with `IssueNotFound` when no issue has that id.
    async fn delete_issue(&self, id: &IssueId) -> Result<Issue>;
}

/// In-memory issue documents with a per-project index
///
/// Not synchronized; backends wrap it in a lock.
#[derive(Debug, Default)]
pub struct IssueCollection {
    documents: HashMap<IssueId, Issue>,
    by_project: HashMap<String, BTreeSet<IssueId>>,
}

impl IssueCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored issues
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the collection holds no issues
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Look up an issue by id
    pub fn get(&self, id: &IssueId) -> Option<&Issue> {
        self.documents.get(id)
    }

    /// Insert or replace an issue, keeping the project index in step
    pub fn insert(&mut self, issue: Issue) {
        let id = issue.id;
        let project = issue.project.clone();
        if let Some(previous) = self.documents.insert(id, issue) {
            if previous.project != project {
                self.unindex(&previous.project, &id);
            }
        }
        self.by_project.entry(project).or_default().insert(id);
    }

    /// Issues matching `filter`, in id order
    pub fn find(&self, filter: &IssueFilter) -> Vec<Issue> {
        if filter.matches_nothing() {
            return Vec::new();
        }

        self.by_project
            .get(filter.project())
            .into_iter()
            .flatten()
            .filter_map(|id| self.documents.get(id))
            .filter(|issue| filter.matches(issue))
            .cloned()
            .collect()
    }

    /// Apply an update in place, returning the updated issue
    pub fn update(&mut self, id: &IssueId, update: &IssueUpdate) -> Option<Issue> {
        let issue = self.documents.get_mut(id)?;
        update.apply_to(issue);
        Some(issue.clone())
    }

    /// Remove an issue, returning it if it existed
    pub fn remove(&mut self, id: &IssueId) -> Option<Issue> {
        let issue = self.documents.remove(id)?;
        self.unindex(&issue.project, id);
        Some(issue)
    }

    fn unindex(&mut self, project: &str, id: &IssueId) {
        if let Some(ids) = self.by_project.get_mut(project) {
            ids.remove(id);
            if ids.is_empty() {
                self.by_project.remove(project);
            }
        }
    }
}

use super::filter::IssueFilter;
use super::model::{Issue, IssueId, IssueUpdate, NewIssue};
use super::storage::{IssueCollection, IssueStorage};
use crate::error::{ErrorContext, IssueTrackerError, Result};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

const DOCUMENT_EXTENSION: &str = "json";

/// Issue storage backed by one JSON document per issue
///
/// Documents live at `<data_dir>/<_id>.json`. All documents are loaded into
/// an [`IssueCollection`] when the store opens; reads are served from it and
/// every mutation is written through to disk before it becomes visible.
pub struct FileSystemIssueStorage {
    data_dir: PathBuf,
    collection: RwLock<IssueCollection>,
}

impl FileSystemIssueStorage {
    /// Open (or create) a store rooted at `data_dir`
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&data_dir).with_context(|| {
            format!("Failed to create issue directory {}", data_dir.display())
        })?;

        let collection = Self::load_documents(&data_dir)?;
        debug!(
            "Loaded {} issues from {}",
            collection.len(),
            data_dir.display()
        );

        Ok(Self {
            data_dir,
            collection: RwLock::new(collection),
        })
    }

    /// Directory holding the issue documents
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Read every `*.json` document in `dir`
    ///
    /// Files that fail to parse are logged and skipped so that one corrupt
    /// document does not take the whole store down.
    fn load_documents(dir: &Path) -> Result<IssueCollection> {
        let mut collection = IssueCollection::new();

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file()
                || path.extension() != Some(std::ffi::OsStr::new(DOCUMENT_EXTENSION))
            {
                continue;
            }

            match Self::read_document(&path) {
                Ok(issue) => collection.insert(issue),
                Err(e) => warn!("Skipping unreadable issue document {}: {}", path.display(), e),
            }
        }

        Ok(collection)
    }

    fn read_document(path: &Path) -> Result<Issue> {
        let content = fs::read_to_string(path)?;
        let issue: Issue = serde_json::from_str(&content)?;

        let expected = path.file_stem().and_then(|stem| stem.to_str());
        if expected != Some(issue.id.to_string().as_str()) {
            return Err(IssueTrackerError::Storage(format!(
                "document id {} does not match file name",
                issue.id
            )));
        }
        Ok(issue)
    }

    fn document_path(&self, id: &IssueId) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", id, DOCUMENT_EXTENSION))
    }

    /// Write a document atomically via a temp file and rename
    async fn write_document(&self, issue: &Issue) -> Result<()> {
        let path = self.document_path(&issue.id);
        let temp_path = path.with_extension("json.tmp");
        let content = serde_json::to_vec_pretty(issue)?;

        let written = match tokio::fs::write(&temp_path, &content).await {
            Ok(()) => tokio::fs::rename(&temp_path, &path)
                .await
                .with_context(|| format!("Failed to replace {}", path.display())),
            Err(e) => Err(e).with_context(|| format!("Failed to write {}", temp_path.display())),
        };

        if written.is_err() {
            if let Err(e) = tokio::fs::remove_file(&temp_path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove {}: {}", temp_path.display(), e);
                }
            }
            return written;
        }

        debug!("Wrote issue {} to {}", issue.id, path.display());
        Ok(())
    }
}

#[async_trait::async_trait]
impl IssueStorage for FileSystemIssueStorage {
    async fn find_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        Ok(self.collection.read().await.find(filter))
    }

    async fn insert_issue(&self, issue: NewIssue) -> Result<Issue> {
        let issue = Issue::create(issue, Utc::now());

        let mut collection = self.collection.write().await;
        self.write_document(&issue).await?;
        collection.insert(issue.clone());

        Ok(issue)
    }

    async fn update_issue(&self, id: &IssueId, update: IssueUpdate) -> Result<Issue> {
        let mut collection = self.collection.write().await;

        let mut issue = collection
            .get(id)
            .cloned()
            .ok_or_else(|| IssueTrackerError::IssueNotFound(id.to_string()))?;
        update.apply_to(&mut issue);

        self.write_document(&issue).await?;
        collection.insert(issue.clone());

        Ok(issue)
    }

    async fn delete_issue(&self, id: &IssueId) -> Result<Issue> {
        let mut collection = self.collection.write().await;

        if collection.get(id).is_none() {
            return Err(IssueTrackerError::IssueNotFound(id.to_string()));
        }

        let path = self.document_path(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            // Already gone on disk; finish removing it from the index
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Issue document {} was already missing", path.display());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove {}", path.display()))
            }
        }

        collection
            .remove(id)
            .ok_or_else(|| IssueTrackerError::IssueNotFound(id.to_string()))
    }
}

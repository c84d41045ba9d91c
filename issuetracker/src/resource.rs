//! The project-scoped issue resource
//!
//! [`IssueResource`] turns one request (a verb, a project and a field map)
//! into exactly one storage call and shapes the reply. Validation problems
//! and unknown ids are answered with a soft error; only store failures on the
//! list and create paths escape as `Err`, which the HTTP layer maps to a 500.

use crate::error::Result;
use crate::issues::{
    is_truthy, model::cast_text, Issue, IssueField, IssueFilter, IssueId, IssueStorage,
    IssueUpdate, NewIssue,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Request fields after body parsing
pub type FieldMap = serde_json::Map<String, Value>;

const ID_FIELD: &str = "_id";

/// A handled failure reported to the client with HTTP 200
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SoftError {
    /// A required creation field was absent or falsy
    #[serde(rename = "required field(s) missing")]
    RequiredFieldsMissing,
    /// The body carried no usable `_id`
    #[serde(rename = "missing _id")]
    MissingId,
    /// An update named no fields besides `_id`
    #[serde(rename = "no update field(s) sent")]
    NoUpdateFields,
    /// The update matched nothing or failed in the store
    #[serde(rename = "could not update")]
    CouldNotUpdate,
    /// The delete matched nothing or failed in the store
    #[serde(rename = "could not delete")]
    CouldNotDelete,
}

impl SoftError {
    /// The message sent in the `error` key
    pub fn message(&self) -> &'static str {
        match self {
            SoftError::RequiredFieldsMissing => "required field(s) missing",
            SoftError::MissingId => "missing _id",
            SoftError::NoUpdateFields => "no update field(s) sent",
            SoftError::CouldNotUpdate => "could not update",
            SoftError::CouldNotDelete => "could not delete",
        }
    }
}

impl std::fmt::Display for SoftError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// A successful mutation reported in the `result` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Completion {
    /// PUT applied
    #[serde(rename = "successfully updated")]
    Updated,
    /// DELETE applied
    #[serde(rename = "successfully deleted")]
    Deleted,
}

/// JSON body of a 200 response from a mutating verb
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IssueReply {
    /// The full saved issue (POST)
    Issue(Issue),
    /// `{result, _id}`
    Done {
        /// What was done
        result: Completion,
        /// The caller's `_id`, echoed verbatim
        #[serde(rename = "_id")]
        id: Value,
    },
    /// `{error}` or `{error, _id}`
    Rejected {
        /// Why nothing was done
        error: SoftError,
        /// The caller's `_id`, when one was sent
        #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
        id: Option<Value>,
    },
}

impl IssueReply {
    fn rejected(error: SoftError) -> Self {
        IssueReply::Rejected { error, id: None }
    }

    fn rejected_for(error: SoftError, id: &Value) -> Self {
        IssueReply::Rejected {
            error,
            id: Some(id.clone()),
        }
    }

    /// The soft error carried by this reply, if any
    pub fn soft_error(&self) -> Option<SoftError> {
        match self {
            IssueReply::Rejected { error, .. } => Some(*error),
            _ => None,
        }
    }
}

/// Request handler for `/api/issues/:project`
#[derive(Clone)]
pub struct IssueResource {
    storage: Arc<dyn IssueStorage>,
}

impl IssueResource {
    /// Build a resource over a shared store
    pub fn new(storage: Arc<dyn IssueStorage>) -> Self {
        Self { storage }
    }

    /// GET: issues of `project` matching every query pair
    pub async fn list<I, K, V>(&self, project: &str, query: I) -> Result<Vec<Issue>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let filter = IssueFilter::from_query(project, query)?;
        debug!(
            "Listing issues in '{}' with {} condition(s)",
            project,
            filter.conditions().len()
        );
        self.storage.find_issues(&filter).await
    }

    /// POST: create an issue in `project`
    pub async fn create(&self, project: &str, fields: &FieldMap) -> Result<IssueReply> {
        let required = [
            IssueField::IssueTitle,
            IssueField::IssueText,
            IssueField::CreatedBy,
        ];
        if required
            .iter()
            .any(|field| !is_truthy(fields.get(field.name())))
        {
            debug!("Rejecting issue in '{}': required field(s) missing", project);
            return Ok(IssueReply::rejected(SoftError::RequiredFieldsMissing));
        }

        let text = |field: IssueField| -> Result<String> {
            match fields.get(field.name()) {
                Some(value) if is_truthy(Some(value)) => cast_text(field, value),
                _ => Ok(String::new()),
            }
        };
        let new_issue = NewIssue {
            project: project.to_string(),
            issue_title: text(IssueField::IssueTitle)?,
            issue_text: text(IssueField::IssueText)?,
            created_by: text(IssueField::CreatedBy)?,
            assigned_to: text(IssueField::AssignedTo)?,
            status_text: text(IssueField::StatusText)?,
        };

        let issue = self.storage.insert_issue(new_issue).await?;
        info!("Created issue {} in '{}'", issue.id, issue.project);
        Ok(IssueReply::Issue(issue))
    }

    /// PUT: merge the non-null fields of `fields` into the issue named by `_id`
    pub async fn update(&self, fields: &FieldMap) -> IssueReply {
        let id = match fields.get(ID_FIELD) {
            Some(id) if is_truthy(Some(id)) => id,
            _ => return IssueReply::rejected(SoftError::MissingId),
        };

        let changes: Vec<(&str, &Value)> = fields
            .iter()
            .filter(|(name, value)| name.as_str() != ID_FIELD && !value.is_null())
            .map(|(name, value)| (name.as_str(), value))
            .collect();
        if changes.is_empty() {
            return IssueReply::rejected_for(SoftError::NoUpdateFields, id);
        }

        match self.apply_update(id, changes).await {
            Ok(issue) => {
                info!("Updated issue {} in '{}'", issue.id, issue.project);
                IssueReply::Done {
                    result: Completion::Updated,
                    id: id.clone(),
                }
            }
            Err(e) if e.is_missing_issue() => {
                debug!("No issue to update for _id {}: {}", id, e);
                IssueReply::rejected_for(SoftError::CouldNotUpdate, id)
            }
            Err(e) => {
                warn!("Could not update issue {}: {}", id, e);
                IssueReply::rejected_for(SoftError::CouldNotUpdate, id)
            }
        }
    }

    /// DELETE: remove the issue named by `_id`
    pub async fn delete(&self, fields: &FieldMap) -> IssueReply {
        let id = match fields.get(ID_FIELD) {
            Some(id) if is_truthy(Some(id)) => id,
            _ => return IssueReply::rejected(SoftError::MissingId),
        };

        match self.remove(id).await {
            Ok(issue) => {
                info!("Deleted issue {} from '{}'", issue.id, issue.project);
                IssueReply::Done {
                    result: Completion::Deleted,
                    id: id.clone(),
                }
            }
            Err(e) if e.is_missing_issue() => {
                debug!("No issue to delete for _id {}: {}", id, e);
                IssueReply::rejected_for(SoftError::CouldNotDelete, id)
            }
            Err(e) => {
                warn!("Could not delete issue {}: {}", id, e);
                IssueReply::rejected_for(SoftError::CouldNotDelete, id)
            }
        }
    }

    async fn apply_update(&self, id: &Value, changes: Vec<(&str, &Value)>) -> Result<Issue> {
        let issue_id = IssueId::from_json(id)?;
        let update = IssueUpdate::from_fields(changes)?.touch(Utc::now());
        self.storage.update_issue(&issue_id, update).await
    }

    async fn remove(&self, id: &Value) -> Result<Issue> {
        let issue_id = IssueId::from_json(id)?;
        self.storage.delete_issue(&issue_id).await
    }
}

use crate::error::{IssueTrackerError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

/// Store-assigned identifier of an issue document
///
/// Backed by a ULID so ids sort in creation order. Rendered and parsed as the
/// 26-character Crockford base32 string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(Ulid);

impl IssueId {
    /// Generate a fresh id
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse an id from its string form
    pub fn parse(raw: &str) -> Result<Self> {
        Ulid::from_string(raw)
            .map(Self)
            .map_err(|_| IssueTrackerError::InvalidIssueId(raw.to_string()))
    }

    /// Parse an id sent by a client as an arbitrary JSON value
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::String(raw) => Self::parse(raw),
            other => Err(IssueTrackerError::InvalidIssueId(other.to_string())),
        }
    }
}

impl Default for IssueId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IssueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for IssueId {
    type Err = IssueTrackerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn default_open() -> bool {
    true
}

/// A tracked item within a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Store-assigned id, immutable
    #[serde(rename = "_id")]
    pub id: IssueId,
    /// Owning project, fixed at creation
    pub project: String,
    /// Short summary
    pub issue_title: String,
    /// Full description
    pub issue_text: String,
    /// Reporter
    pub created_by: String,
    /// Assignee, empty when unassigned
    #[serde(default)]
    pub assigned_to: String,
    /// Free-form status note
    #[serde(default)]
    pub status_text: String,
    /// Whether the issue is still open
    #[serde(default = "default_open")]
    pub open: bool,
    /// Creation time, immutable
    pub created_on: DateTime<Utc>,
    /// Time of the last successful update
    pub updated_on: DateTime<Utc>,
}

impl Issue {
    /// Build a freshly created, open issue stamped with `now`
    pub fn create(new: NewIssue, now: DateTime<Utc>) -> Self {
        Self {
            id: IssueId::new(),
            project: new.project,
            issue_title: new.issue_title,
            issue_text: new.issue_text,
            created_by: new.created_by,
            assigned_to: new.assigned_to,
            status_text: new.status_text,
            open: true,
            created_on: now,
            updated_on: now,
        }
    }
}

/// Validated field values for a new issue
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewIssue {
    /// Owning project
    pub project: String,
    /// Short summary (required, non-empty)
    pub issue_title: String,
    /// Full description (required, non-empty)
    pub issue_text: String,
    /// Reporter (required, non-empty)
    pub created_by: String,
    /// Assignee
    pub assigned_to: String,
    /// Status note
    pub status_text: String,
}

/// The fields of an [`Issue`] as named on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IssueField {
    /// `_id`
    Id,
    /// `project`
    Project,
    /// `issue_title`
    IssueTitle,
    /// `issue_text`
    IssueText,
    /// `created_by`
    CreatedBy,
    /// `assigned_to`
    AssignedTo,
    /// `status_text`
    StatusText,
    /// `open`
    Open,
    /// `created_on`
    CreatedOn,
    /// `updated_on`
    UpdatedOn,
}

impl IssueField {
    /// Every field, in document order
    pub const ALL: [IssueField; 10] = [
        IssueField::Id,
        IssueField::Project,
        IssueField::IssueTitle,
        IssueField::IssueText,
        IssueField::CreatedBy,
        IssueField::AssignedTo,
        IssueField::StatusText,
        IssueField::Open,
        IssueField::CreatedOn,
        IssueField::UpdatedOn,
    ];

    /// Wire name of the field
    pub fn name(&self) -> &'static str {
        match self {
            IssueField::Id => "_id",
            IssueField::Project => "project",
            IssueField::IssueTitle => "issue_title",
            IssueField::IssueText => "issue_text",
            IssueField::CreatedBy => "created_by",
            IssueField::AssignedTo => "assigned_to",
            IssueField::StatusText => "status_text",
            IssueField::Open => "open",
            IssueField::CreatedOn => "created_on",
            IssueField::UpdatedOn => "updated_on",
        }
    }

    /// Look a field up by wire name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    /// Whether a client may change this field through an update
    pub fn is_updatable(&self) -> bool {
        matches!(
            self,
            IssueField::IssueTitle
                | IssueField::IssueText
                | IssueField::CreatedBy
                | IssueField::AssignedTo
                | IssueField::StatusText
                | IssueField::Open
        )
    }
}

impl std::fmt::Display for IssueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// JavaScript-style truthiness used for presence checks on request fields
///
/// Absent, `null`, `false`, `0` and `""` are all falsy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Parse the boolean literals accepted for `open`
pub fn parse_bool_literal(raw: &str) -> Option<bool> {
    match raw {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Cast a request value to a string field
///
/// Numbers and booleans are rendered; objects and arrays are rejected.
pub fn cast_text(field: IssueField, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(IssueTrackerError::invalid_field(
            field.name(),
            "expected a string",
        )),
    }
}

/// Cast a request value to a boolean field
pub fn cast_bool(field: IssueField, value: &Value) -> Result<bool> {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => parse_bool_literal(s),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 1.0 => Some(true),
            Some(f) if f == 0.0 => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| {
        IssueTrackerError::invalid_field(field.name(), format!("expected a boolean, got {}", value))
    })
}

/// A partial update to an existing issue
///
/// Only fields set to `Some` are written. `updated_on` is the server-side
/// modification stamp; see [`IssueUpdate::apply_to`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueUpdate {
    /// New title
    pub issue_title: Option<String>,
    /// New description
    pub issue_text: Option<String>,
    /// New reporter
    pub created_by: Option<String>,
    /// New assignee
    pub assigned_to: Option<String>,
    /// New status note
    pub status_text: Option<String>,
    /// New open flag
    pub open: Option<bool>,
    /// Modification time to record
    pub updated_on: Option<DateTime<Utc>>,
}

impl IssueUpdate {
    /// Build an update from named request values
    ///
    /// Fields that are unknown or not client-updatable are skipped. A value
    /// that cannot be cast to its field's type fails the whole update.
    pub fn from_fields<'a, I>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a Value)>,
    {
        let mut update = Self::default();
        for (name, value) in fields {
            match IssueField::from_name(name) {
                Some(field) if field.is_updatable() => update.set(field, value)?,
                _ => tracing::debug!("Ignoring non-updatable field '{}'", name),
            }
        }
        Ok(update)
    }

    /// Set one updatable field from a request value
    pub fn set(&mut self, field: IssueField, value: &Value) -> Result<()> {
        match field {
            IssueField::IssueTitle => self.issue_title = Some(cast_text(field, value)?),
            IssueField::IssueText => self.issue_text = Some(cast_text(field, value)?),
            IssueField::CreatedBy => self.created_by = Some(cast_text(field, value)?),
            IssueField::AssignedTo => self.assigned_to = Some(cast_text(field, value)?),
            IssueField::StatusText => self.status_text = Some(cast_text(field, value)?),
            IssueField::Open => self.open = Some(cast_bool(field, value)?),
            other => {
                return Err(IssueTrackerError::invalid_field(
                    other.name(),
                    "field cannot be updated",
                ))
            }
        }
        Ok(())
    }

    /// Stamp the update with a modification time
    pub fn touch(mut self, now: DateTime<Utc>) -> Self {
        self.updated_on = Some(now);
        self
    }

    /// Write the set fields into `issue`
    ///
    /// `updated_on` always moves strictly forward, even if the wall clock
    /// has not advanced past the stored value.
    pub fn apply_to(&self, issue: &mut Issue) {
        if let Some(ref title) = self.issue_title {
            issue.issue_title = title.clone();
        }
        if let Some(ref text) = self.issue_text {
            issue.issue_text = text.clone();
        }
        if let Some(ref created_by) = self.created_by {
            issue.created_by = created_by.clone();
        }
        if let Some(ref assigned_to) = self.assigned_to {
            issue.assigned_to = assigned_to.clone();
        }
        if let Some(ref status_text) = self.status_text {
            issue.status_text = status_text.clone();
        }
        if let Some(open) = self.open {
            issue.open = open;
        }
        if let Some(now) = self.updated_on {
            issue.updated_on = if now > issue.updated_on {
                now
            } else {
                issue.updated_on + Duration::microseconds(1)
            };
        }
    }
}

use super::model::{parse_bool_literal, Issue, IssueField, IssueId};
use crate::error::{IssueTrackerError, Result};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// A typed equality value for one filtered field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// Matches `_id`
    Id(IssueId),
    /// Matches a string field
    Text(String),
    /// Matches `open`
    Bool(bool),
    /// Matches `created_on` / `updated_on`
    Timestamp(DateTime<Utc>),
}

impl FilterValue {
    /// Cast a raw query-string value to the type of `field`
    pub fn parse(field: IssueField, raw: &str) -> Result<Self> {
        match field {
            IssueField::Id => IssueId::parse(raw).map(FilterValue::Id),
            IssueField::Open => parse_bool_literal(raw).map(FilterValue::Bool).ok_or_else(|| {
                IssueTrackerError::invalid_field(field.name(), format!("'{}' is not a boolean", raw))
            }),
            IssueField::CreatedOn | IssueField::UpdatedOn => DateTime::parse_from_rfc3339(raw)
                .map(|ts| FilterValue::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|e| IssueTrackerError::invalid_field(field.name(), e.to_string())),
            IssueField::Project
            | IssueField::IssueTitle
            | IssueField::IssueText
            | IssueField::CreatedBy
            | IssueField::AssignedTo
            | IssueField::StatusText => Ok(FilterValue::Text(raw.to_string())),
        }
    }

    fn matches(&self, field: IssueField, issue: &Issue) -> bool {
        match (field, self) {
            (IssueField::Id, FilterValue::Id(id)) => issue.id == *id,
            (IssueField::Project, FilterValue::Text(s)) => issue.project == *s,
            (IssueField::IssueTitle, FilterValue::Text(s)) => issue.issue_title == *s,
            (IssueField::IssueText, FilterValue::Text(s)) => issue.issue_text == *s,
            (IssueField::CreatedBy, FilterValue::Text(s)) => issue.created_by == *s,
            (IssueField::AssignedTo, FilterValue::Text(s)) => issue.assigned_to == *s,
            (IssueField::StatusText, FilterValue::Text(s)) => issue.status_text == *s,
            (IssueField::Open, FilterValue::Bool(b)) => issue.open == *b,
            (IssueField::CreatedOn, FilterValue::Timestamp(ts)) => issue.created_on == *ts,
            (IssueField::UpdatedOn, FilterValue::Timestamp(ts)) => issue.updated_on == *ts,
            _ => false,
        }
    }
}

/// Exact-match query over the issues of one project
///
/// Every field condition must hold. A field given more than once holds when
/// any of its values matches. A condition on a field the document does not
/// have can never hold, so it makes the whole filter match nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFilter {
    project: String,
    conditions: BTreeMap<IssueField, Vec<FilterValue>>,
    unknown_fields: BTreeSet<String>,
}

impl IssueFilter {
    /// Match every issue of `project`
    pub fn for_project(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            conditions: BTreeMap::new(),
            unknown_fields: BTreeSet::new(),
        }
    }

    /// Build a filter from query-string pairs
    ///
    /// A `project` pair cannot widen the scope; the given project wins.
    pub fn from_query<I, K, V>(project: impl Into<String>, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filter = Self::for_project(project);
        for (name, raw) in pairs {
            filter = filter.with_condition(name.as_ref(), raw.as_ref())?;
        }
        Ok(filter)
    }

    /// Add an equality condition on the field called `name`
    ///
    /// Repeating a field widens that field's condition to any of its values.
    pub fn with_condition(mut self, name: &str, raw: &str) -> Result<Self> {
        match IssueField::from_name(name) {
            Some(IssueField::Project) => {
                if raw != self.project {
                    tracing::debug!(
                        "Ignoring project filter '{}' in favour of path project '{}'",
                        raw,
                        self.project
                    );
                }
            }
            Some(field) => {
                let value = FilterValue::parse(field, raw)?;
                let values = self.conditions.entry(field).or_default();
                if !values.contains(&value) {
                    values.push(value);
                }
            }
            None => {
                self.unknown_fields.insert(name.to_string());
            }
        }
        Ok(self)
    }

    /// The project this filter is scoped to
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Typed conditions beyond the project scope
    pub fn conditions(&self) -> &BTreeMap<IssueField, Vec<FilterValue>> {
        &self.conditions
    }

    /// Whether the filter names a field no issue has
    pub fn matches_nothing(&self) -> bool {
        !self.unknown_fields.is_empty()
    }

    /// Test a single document
    pub fn matches(&self, issue: &Issue) -> bool {
        issue.project == self.project
            && !self.matches_nothing()
            && self
                .conditions
                .iter()
                .all(|(field, values)| values.iter().any(|value| value.matches(*field, issue)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::model::{IssueUpdate, NewIssue};

    fn issue(project: &str, title: &str, text: &str) -> Issue {
        Issue::create(
            NewIssue {
                project: project.to_string(),
                issue_title: title.to_string(),
                issue_text: text.to_string(),
                created_by: "Filter Test".to_string(),
                ..Default::default()
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_project_scope() {
        let filter = IssueFilter::for_project("test");
        assert!(filter.matches(&issue("test", "Title", "text")));
        assert!(!filter.matches(&issue("other", "Title", "text")));
    }

    #[test]
    fn test_multiple_conditions_all_required() {
        let filter = IssueFilter::from_query(
            "test",
            [("issue_title", "Title"), ("issue_text", "text")],
        )
        .unwrap();

        assert!(filter.matches(&issue("test", "Title", "text")));
        assert!(!filter.matches(&issue("test", "Title", "other text")));
        assert!(!filter.matches(&issue("test", "Other", "text")));
    }

    #[test]
    fn test_repeated_field_matches_any_value() {
        let filter = IssueFilter::from_query(
            "test",
            [
                ("issue_title", "a"),
                ("issue_title", "b"),
                ("issue_title", "a"),
            ],
        )
        .unwrap();
        assert_eq!(filter.conditions()[&IssueField::IssueTitle].len(), 2);

        assert!(filter.matches(&issue("test", "a", "text")));
        assert!(filter.matches(&issue("test", "b", "text")));
        assert!(!filter.matches(&issue("test", "c", "text")));
        assert!(!filter.matches(&issue("other", "a", "text")));
    }

    #[test]
    fn test_repeated_field_still_and_with_other_fields() {
        let filter = IssueFilter::from_query(
            "test",
            [
                ("issue_title", "a"),
                ("issue_text", "keep"),
                ("issue_title", "b"),
            ],
        )
        .unwrap();

        assert!(filter.matches(&issue("test", "b", "keep")));
        assert!(!filter.matches(&issue("test", "b", "drop")));
    }

    #[test]
    fn test_open_filter_is_typed() {
        let mut closed = issue("test", "Title", "text");
        IssueUpdate {
            open: Some(false),
            ..Default::default()
        }
        .apply_to(&mut closed);

        let filter = IssueFilter::from_query("test", [("open", "false")]).unwrap();
        assert!(filter.matches(&closed));
        assert!(!filter.matches(&issue("test", "Title", "text")));

        assert!(matches!(
            IssueFilter::from_query("test", [("open", "perhaps")]),
            Err(IssueTrackerError::InvalidFieldValue { .. })
        ));
    }

    #[test]
    fn test_id_filter() {
        let target = issue("test", "Title", "text");
        let filter = IssueFilter::from_query("test", [("_id", target.id.to_string())]).unwrap();
        assert!(filter.matches(&target));
        assert!(!filter.matches(&issue("test", "Title", "text")));

        assert!(matches!(
            IssueFilter::from_query("test", [("_id", "not-an-id")]),
            Err(IssueTrackerError::InvalidIssueId(_))
        ));
    }

    #[test]
    fn test_timestamp_filter() {
        let target = issue("test", "Title", "text");
        let filter =
            IssueFilter::from_query("test", [("created_on", target.created_on.to_rfc3339())])
                .unwrap();
        assert!(filter.matches(&target));

        assert!(IssueFilter::from_query("test", [("updated_on", "yesterday")]).is_err());
    }

    #[test]
    fn test_unknown_field_matches_nothing() {
        let filter = IssueFilter::from_query("test", [("priority", "high")]).unwrap();
        assert!(filter.matches_nothing());
        assert!(!filter.matches(&issue("test", "Title", "text")));
    }

    #[test]
    fn test_query_project_cannot_escape_path_project() {
        let filter = IssueFilter::from_query("test", [("project", "other")]).unwrap();
        assert_eq!(filter.project(), "test");
        assert!(filter.conditions().is_empty());
        assert!(filter.matches(&issue("test", "Title", "text")));
        assert!(!filter.matches(&issue("other", "Title", "text")));
    }
}

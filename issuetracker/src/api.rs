//! axum handlers for `/api/issues/:project`
//!
//! Each handler extracts the project, query and body, hands them to
//! [`IssueResource`] and turns the outcome into a response. Soft errors are
//! JSON with status 200; store failures on GET and POST are plain-text 500s.

use crate::resource::{FieldMap, IssueReply, IssueResource};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Shared handler state
pub type AppState = Arc<IssueResource>;

const FETCH_FAILED: &str = "Error fetching issues";
const SAVE_FAILED: &str = "Error saving issue";
const INVALID_BODY: &str = "Invalid request body";

/// A request body that could not be turned into a field map
#[derive(Debug)]
pub struct BodyRejection(serde_json::Error);

impl IntoResponse for BodyRejection {
    fn into_response(self) -> Response {
        warn!("Rejecting malformed JSON body: {}", self.0);
        (StatusCode::BAD_REQUEST, INVALID_BODY).into_response()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Json,
    Form,
    Other,
}

fn body_format(headers: &HeaderMap) -> BodyFormat {
    let mime = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if mime == "application/json" {
        BodyFormat::Json
    } else if mime == "application/x-www-form-urlencoded" {
        BodyFormat::Form
    } else {
        BodyFormat::Other
    }
}

/// Parse a request body into named fields
///
/// JSON objects are taken as-is and form values arrive as strings. Empty
/// bodies, non-object JSON and unrecognised content types all give an empty
/// map. For repeated form keys the last value wins.
pub fn parse_fields(headers: &HeaderMap, body: &[u8]) -> Result<FieldMap, BodyRejection> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(FieldMap::new());
    }

    match body_format(headers) {
        BodyFormat::Json => match serde_json::from_slice::<Value>(body).map_err(BodyRejection)? {
            Value::Object(fields) => Ok(fields),
            other => {
                debug!("Ignoring non-object JSON body of type {}", json_type(&other));
                Ok(FieldMap::new())
            }
        },
        BodyFormat::Form => Ok(url::form_urlencoded::parse(body)
            .map(|(name, value)| (name.into_owned(), Value::String(value.into_owned())))
            .collect()),
        BodyFormat::Other => Ok(FieldMap::new()),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn reply(reply: IssueReply) -> Response {
    if let Some(soft) = reply.soft_error() {
        debug!("Soft error: {}", soft);
    }
    Json(reply).into_response()
}

/// `GET /api/issues/:project`
pub async fn list_issues(
    State(resource): State<AppState>,
    Path(project): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    debug!("GET issues for '{}'", project);
    match resource.list(&project, query).await {
        Ok(issues) => Json(issues).into_response(),
        Err(e) => {
            error!("Failed to list issues for '{}': {}", project, e);
            (StatusCode::INTERNAL_SERVER_ERROR, FETCH_FAILED).into_response()
        }
    }
}

/// `POST /api/issues/:project`
pub async fn create_issue(
    State(resource): State<AppState>,
    Path(project): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, BodyRejection> {
    debug!("POST issue for '{}'", project);
    let fields = parse_fields(&headers, &body)?;
    Ok(match resource.create(&project, &fields).await {
        Ok(outcome) => reply(outcome),
        Err(e) => {
            error!("Failed to save issue for '{}': {}", project, e);
            (StatusCode::INTERNAL_SERVER_ERROR, SAVE_FAILED).into_response()
        }
    })
}

/// `PUT /api/issues/:project`
pub async fn update_issue(
    State(resource): State<AppState>,
    Path(project): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, BodyRejection> {
    debug!("PUT issue for '{}'", project);
    let fields = parse_fields(&headers, &body)?;
    Ok(reply(resource.update(&fields).await))
}

/// `DELETE /api/issues/:project`
pub async fn delete_issue(
    State(resource): State<AppState>,
    Path(project): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, BodyRejection> {
    debug!("DELETE issue for '{}'", project);
    let fields = parse_fields(&headers, &body)?;
    Ok(reply(resource.delete(&fields).await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_str(content_type).unwrap(),
        );
        headers
    }

    #[test]
    fn test_parse_json_object() {
        let fields = parse_fields(
            &headers("application/json; charset=utf-8"),
            br#"{"_id": "abc", "open": false}"#,
        )
        .unwrap();
        assert_eq!(fields.get("_id"), Some(&json!("abc")));
        assert_eq!(fields.get("open"), Some(&json!(false)));
    }

    #[test]
    fn test_parse_form_values_are_strings() {
        let fields = parse_fields(
            &headers("application/x-www-form-urlencoded"),
            b"issue_title=Fix+it&open=false&open=true",
        )
        .unwrap();
        assert_eq!(fields.get("issue_title"), Some(&json!("Fix it")));
        assert_eq!(fields.get("open"), Some(&json!("true")));
    }

    #[test]
    fn test_parse_lenient_cases_give_empty_map() {
        assert!(parse_fields(&headers("application/json"), b"").unwrap().is_empty());
        assert!(parse_fields(&headers("application/json"), b"  \n").unwrap().is_empty());
        assert!(parse_fields(&headers("application/json"), b"[1, 2]").unwrap().is_empty());
        assert!(parse_fields(&headers("text/plain"), b"{\"a\": 1}").unwrap().is_empty());
        assert!(parse_fields(&HeaderMap::new(), b"a=1").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let rejection = parse_fields(&headers("application/json"), b"{ nope").unwrap_err();
        assert_eq!(rejection.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_json_suffix_types_are_not_parsed() {
        let fields =
            parse_fields(&headers("application/vnd.api+json"), br#"{"_id": "x"}"#).unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn test_body_format_detection() {
        assert_eq!(body_format(&headers("Application/JSON")), BodyFormat::Json);
        assert_eq!(
            body_format(&headers("application/merge-patch+json")),
            BodyFormat::Other
        );
        assert_eq!(
            body_format(&headers("application/x-www-form-urlencoded; charset=UTF-8")),
            BodyFormat::Form
        );
        assert_eq!(body_format(&HeaderMap::new()), BodyFormat::Other);
    }
}

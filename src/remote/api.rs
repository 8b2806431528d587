//! Wire-format structs for the Jira REST responses we consume.
//!
//! These stay private to the remote module; everything else in the crate
//! works with the flattened types in [`super::types`].

use serde::Deserialize;
use serde_json::Value;

use super::types::{Comment, Issue, Project, Sprint, Transition};

#[derive(Debug, Deserialize)]
pub struct ApiSearchResult {
  #[serde(rename = "startAt")]
  pub start_at: u64,
  pub total: u64,
  #[serde(default)]
  pub issues: Vec<ApiIssue>,
}

#[derive(Debug, Deserialize)]
pub struct ApiIssue {
  pub key: String,
  pub fields: ApiIssueFields,
}

#[derive(Debug, Deserialize)]
pub struct ApiIssueFields {
  #[serde(default)]
  pub summary: String,
  pub status: Option<ApiNamed>,
  pub priority: Option<ApiNamed>,
  #[serde(rename = "issuetype")]
  pub issue_type: Option<ApiNamed>,
  pub project: Option<ApiProject>,
  pub assignee: Option<ApiUser>,
  pub reporter: Option<ApiUser>,
  pub sprint: Option<ApiSprint>,
  #[serde(default)]
  pub updated: String,
  pub created: Option<String>,
  /// Plain string on server, structured document on cloud; keep raw.
  pub description: Option<Value>,
  pub comment: Option<ApiComments>,
}

#[derive(Debug, Deserialize)]
pub struct ApiNamed {
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  #[serde(rename = "displayName", default)]
  pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiProject {
  #[serde(default)]
  pub id: String,
  pub key: String,
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiSprint {
  pub id: u64,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiComments {
  #[serde(default)]
  pub comments: Vec<ApiComment>,
}

#[derive(Debug, Deserialize)]
pub struct ApiComment {
  pub author: ApiUser,
  pub body: Value,
  #[serde(default)]
  pub created: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiTransitionsResponse {
  #[serde(default)]
  pub transitions: Vec<ApiTransition>,
}

#[derive(Debug, Deserialize)]
pub struct ApiTransition {
  pub id: String,
  pub name: String,
  pub to: ApiNamed,
}

#[derive(Debug, Deserialize)]
pub struct ApiSprintsResponse {
  #[serde(default)]
  pub values: Vec<ApiSprint>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCreatedIssue {
  pub key: String,
}

/// Flatten a description/comment body to plain text.
///
/// Cloud returns an Atlassian document tree; server returns a string.
/// We pull the text nodes out of the tree and join them with newlines.
pub fn body_text(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    Value::Object(_) | Value::Array(_) => {
      let mut out = Vec::new();
      collect_text(value, &mut out);
      out.join("\n")
    }
    _ => String::new(),
  }
}

fn collect_text(value: &Value, out: &mut Vec<String>) {
  match value {
    Value::Object(map) => {
      if let Some(Value::String(text)) = map.get("text") {
        out.push(text.clone());
      }
      if let Some(content) = map.get("content") {
        collect_text(content, out);
      }
    }
    Value::Array(items) => {
      for item in items {
        collect_text(item, out);
      }
    }
    _ => {}
  }
}

impl ApiIssue {
  /// Flatten into the cached issue record.
  pub fn into_issue(self) -> Issue {
    let f = self.fields;
    Issue {
      key: self.key,
      summary: f.summary,
      status: f.status.map(|s| s.name).unwrap_or_default(),
      issue_type: f.issue_type.map(|t| t.name).unwrap_or_default(),
      priority: f.priority.map(|p| p.name).unwrap_or_default(),
      project_key: f.project.map(|p| p.key).unwrap_or_default(),
      assignee: f.assignee.map(|u| u.display_name),
      reporter: f.reporter.map(|u| u.display_name),
      sprint_id: f.sprint.map(|s| s.id),
      updated: f.updated,
      created: f.created,
      description: f.description.as_ref().map(body_text).filter(|s| !s.is_empty()),
      comments: f
        .comment
        .map(|c| {
          c.comments
            .into_iter()
            .map(|c| Comment {
              author: c.author.display_name,
              body: body_text(&c.body),
              created: c.created,
            })
            .collect()
        })
        .unwrap_or_default(),
    }
  }
}

impl From<ApiTransition> for Transition {
  fn from(t: ApiTransition) -> Self {
    Transition {
      id: t.id,
      name: t.name,
      to_status: t.to.name,
    }
  }
}

impl From<ApiProject> for Project {
  fn from(p: ApiProject) -> Self {
    Project {
      id: p.id,
      key: p.key,
      name: p.name,
    }
  }
}

impl From<ApiSprint> for Sprint {
  fn from(s: ApiSprint) -> Self {
    Sprint {
      id: s.id,
      name: s.name,
      state: s.state,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn body_text_handles_plain_string() {
    assert_eq!(body_text(&json!("hello")), "hello");
  }

  #[test]
  fn body_text_flattens_document_tree() {
    let doc = json!({
      "type": "doc",
      "content": [
        { "type": "paragraph", "content": [ { "type": "text", "text": "first" } ] },
        { "type": "paragraph", "content": [ { "type": "text", "text": "second" } ] }
      ]
    });
    assert_eq!(body_text(&doc), "first\nsecond");
  }

  #[test]
  fn flattens_issue_with_missing_optional_fields() {
    let api: ApiIssue = serde_json::from_value(json!({
      "key": "PROJ-1",
      "fields": {
        "summary": "Fix the thing",
        "status": { "name": "To Do" },
        "updated": "2026-01-01T00:00:00.000+0000"
      }
    }))
    .unwrap();

    let issue = api.into_issue();
    assert_eq!(issue.key, "PROJ-1");
    assert_eq!(issue.status, "To Do");
    assert_eq!(issue.priority, "");
    assert!(issue.assignee.is_none());
    assert!(issue.comments.is_empty());
  }
}

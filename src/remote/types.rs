use serde::{Deserialize, Serialize};

/// A cached issue, flattened from the remote payload.
///
/// This is the record the store persists wholesale: the denormalized filter
/// columns are derived from these fields, and the full struct round-trips
/// through JSON for the detail view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
  pub key: String,
  pub summary: String,
  pub status: String,
  pub issue_type: String,
  pub priority: String,
  pub project_key: String,
  pub assignee: Option<String>,
  pub reporter: Option<String>,
  pub sprint_id: Option<u64>,
  /// Remote "last updated" timestamp, as the server formats it.
  pub updated: String,
  pub created: Option<String>,
  pub description: Option<String>,
  #[serde(default)]
  pub comments: Vec<Comment>,
}

impl Issue {
  pub fn assignee_name(&self) -> &str {
    self.assignee.as_deref().unwrap_or("Unassigned")
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  pub author: String,
  pub body: String,
  pub created: String,
}

/// An available status change for an issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
  pub id: String,
  pub name: String,
  pub to_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
  pub id: String,
  pub key: String,
  pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sprint {
  pub id: u64,
  pub name: String,
  /// "active", "closed" or "future"
  pub state: String,
}

/// Fields for a new issue, captured from the create form.
#[derive(Debug, Clone)]
pub struct NewIssue {
  pub project: String,
  pub summary: String,
  pub issue_type: String,
  pub priority: String,
  pub description: String,
}

/// One page of a remote search. The sync engine drives pagination.
#[derive(Debug, Clone)]
pub struct SearchPage {
  pub issues: Vec<Issue>,
  pub start_at: u64,
  pub total: u64,
}

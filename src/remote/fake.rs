//! Recording fake of [`IssueService`] for sync-engine and router tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::error::RemoteError;
use super::types::{Issue, NewIssue, Project, SearchPage, Sprint, Transition};
use super::IssueService;

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  Search { jql: String, start_at: u64 },
  GetTransitions(String),
  ApplyTransition { key: String, transition_id: String },
  Assign { key: String, account_id: String },
  AddComment { key: String, body: String },
  LogWork { key: String, time_spent: String },
  CreateIssue { summary: String },
  GetProjects,
  GetSprints(u64),
  MoveToSprint { sprint_id: u64, keys: Vec<String> },
}

/// Scripted fake remote: serves queued search pages in order and records
/// every call it receives.
#[derive(Default)]
pub struct FakeService {
  pub calls: Mutex<Vec<Call>>,
  pub pages: Mutex<VecDeque<Result<SearchPage, RemoteError>>>,
  pub transitions: Mutex<HashMap<String, Vec<Transition>>>,
  /// Keys whose `apply_transition` fails.
  pub failing_moves: Mutex<HashSet<String>>,
  /// Keys whose `get_transitions` fails.
  pub failing_transition_fetches: Mutex<HashSet<String>>,
  pub projects: Mutex<Vec<Project>>,
  pub sprints: Mutex<Vec<Sprint>>,
}

impl FakeService {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push_page(&self, page: Result<SearchPage, RemoteError>) {
    self.pages.lock().unwrap().push_back(page);
  }

  pub fn set_transitions(&self, key: &str, transitions: Vec<Transition>) {
    self.transitions.lock().unwrap().insert(key.to_string(), transitions);
  }

  pub fn fail_move(&self, key: &str) {
    self.failing_moves.lock().unwrap().insert(key.to_string());
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.lock().unwrap().clone()
  }

  pub fn search_calls(&self) -> Vec<String> {
    self
      .calls()
      .into_iter()
      .filter_map(|c| match c {
        Call::Search { jql, .. } => Some(jql),
        _ => None,
      })
      .collect()
  }

  fn record(&self, call: Call) {
    self.calls.lock().unwrap().push(call);
  }
}

/// Build a search page for test scripts.
pub fn page(issues: Vec<Issue>, start_at: u64, total: u64) -> SearchPage {
  SearchPage {
    issues,
    start_at,
    total,
  }
}

/// A minimal issue for test scripts.
pub fn sample_issue(key: &str, status: &str, updated: &str) -> Issue {
  Issue {
    key: key.into(),
    summary: format!("Summary of {key}"),
    status: status.into(),
    issue_type: "Task".into(),
    priority: "Medium".into(),
    project_key: "PROJ".into(),
    assignee: None,
    reporter: None,
    sprint_id: None,
    updated: updated.into(),
    created: None,
    description: None,
    comments: Vec::new(),
  }
}

#[async_trait]
impl IssueService for FakeService {
  async fn search_page(
    &self,
    jql: &str,
    start_at: u64,
    _max_results: u64,
  ) -> Result<SearchPage, RemoteError> {
    self.record(Call::Search {
      jql: jql.to_string(),
      start_at,
    });
    match self.pages.lock().unwrap().pop_front() {
      Some(page) => page,
      None => Ok(SearchPage {
        issues: Vec::new(),
        start_at,
        total: 0,
      }),
    }
  }

  async fn get_transitions(&self, key: &str) -> Result<Vec<Transition>, RemoteError> {
    self.record(Call::GetTransitions(key.to_string()));
    if self.failing_transition_fetches.lock().unwrap().contains(key) {
      return Err(RemoteError::Transient("connection reset".into()));
    }
    Ok(
      self
        .transitions
        .lock()
        .unwrap()
        .get(key)
        .cloned()
        .unwrap_or_default(),
    )
  }

  async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<(), RemoteError> {
    self.record(Call::ApplyTransition {
      key: key.to_string(),
      transition_id: transition_id.to_string(),
    });
    if self.failing_moves.lock().unwrap().contains(key) {
      return Err(RemoteError::Api("transition not allowed".into()));
    }
    Ok(())
  }

  async fn assign(&self, key: &str, account_id: &str) -> Result<(), RemoteError> {
    self.record(Call::Assign {
      key: key.to_string(),
      account_id: account_id.to_string(),
    });
    Ok(())
  }

  async fn add_comment(&self, key: &str, body: &str) -> Result<(), RemoteError> {
    self.record(Call::AddComment {
      key: key.to_string(),
      body: body.to_string(),
    });
    Ok(())
  }

  async fn log_work(&self, key: &str, time_spent: &str) -> Result<(), RemoteError> {
    self.record(Call::LogWork {
      key: key.to_string(),
      time_spent: time_spent.to_string(),
    });
    Ok(())
  }

  async fn create_issue(&self, fields: &NewIssue) -> Result<String, RemoteError> {
    self.record(Call::CreateIssue {
      summary: fields.summary.clone(),
    });
    Ok(format!("{}-999", fields.project))
  }

  async fn get_projects(&self) -> Result<Vec<Project>, RemoteError> {
    self.record(Call::GetProjects);
    Ok(self.projects.lock().unwrap().clone())
  }

  async fn get_sprints(&self, board_id: u64) -> Result<Vec<Sprint>, RemoteError> {
    self.record(Call::GetSprints(board_id));
    Ok(self.sprints.lock().unwrap().clone())
  }

  async fn move_to_sprint(&self, sprint_id: u64, keys: &[String]) -> Result<(), RemoteError> {
    self.record(Call::MoveToSprint {
      sprint_id,
      keys: keys.to_vec(),
    });
    Ok(())
  }
}

use std::time::Duration;

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use super::api::{
  ApiCreatedIssue, ApiSearchResult, ApiSprintsResponse, ApiTransitionsResponse,
};
use super::error::RemoteError;
use super::types::{Issue, NewIssue, Project, SearchPage, Sprint, Transition};
use crate::config::Config;

/// Fixed deadline for every outbound remote call. A timeout surfaces as a
/// `Transient` failure like any other network error; there is no mid-flight
/// cancellation beyond dropping the future.
const CALL_DEADLINE: Duration = Duration::from_secs(30);

/// Fields requested for list/sync fetches.
const SEARCH_FIELDS: &str = "summary,status,assignee,reporter,priority,issuetype,project,created,updated,sprint,description,comment";

/// The remote issue-tracker surface the core depends on.
///
/// The sync engine and the router only see this trait; tests substitute a
/// recording fake, production uses [`JiraService`].
#[async_trait]
pub trait IssueService: Send + Sync {
  /// One page of a JQL search. The caller drives pagination.
  async fn search_page(
    &self,
    jql: &str,
    start_at: u64,
    max_results: u64,
  ) -> Result<SearchPage, RemoteError>;

  async fn get_transitions(&self, key: &str) -> Result<Vec<Transition>, RemoteError>;

  async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<(), RemoteError>;

  async fn assign(&self, key: &str, account_id: &str) -> Result<(), RemoteError>;

  async fn add_comment(&self, key: &str, body: &str) -> Result<(), RemoteError>;

  async fn log_work(&self, key: &str, time_spent: &str) -> Result<(), RemoteError>;

  /// Returns the key of the created issue.
  async fn create_issue(&self, fields: &NewIssue) -> Result<String, RemoteError>;

  async fn get_projects(&self) -> Result<Vec<Project>, RemoteError>;

  async fn get_sprints(&self, board_id: u64) -> Result<Vec<Sprint>, RemoteError>;

  async fn move_to_sprint(&self, sprint_id: u64, keys: &[String]) -> Result<(), RemoteError>;
}

/// Jira REST implementation of [`IssueService`].
#[derive(Clone)]
pub struct JiraService {
  client: gouqi::r#async::Jira,
}

impl JiraService {
  pub fn new(config: &Config) -> Result<Self> {
    let token = Config::api_token()?;
    let credentials = gouqi::Credentials::Basic(config.jira.email.clone(), token);

    let client = gouqi::r#async::Jira::new(&config.jira.url, credentials)
      .map_err(|e| eyre!("Failed to create Jira client: {}", e))?;

    Ok(Self { client })
  }

  /// GET with the fixed deadline and one retry on an auth failure, so a
  /// transparent token refresh on the far side gets a second chance.
  async fn get_json<T: DeserializeOwned>(
    &self,
    api: &'static str,
    endpoint: &str,
  ) -> Result<T, RemoteError> {
    match self.get_once(api, endpoint).await {
      Err(RemoteError::Auth(_)) => self.get_once(api, endpoint).await,
      other => other,
    }
  }

  async fn get_once<T: DeserializeOwned>(
    &self,
    api: &'static str,
    endpoint: &str,
  ) -> Result<T, RemoteError> {
    let fut = self.client.get::<T>(api, endpoint);
    match tokio::time::timeout(CALL_DEADLINE, fut).await {
      Ok(result) => result.map_err(RemoteError::from),
      Err(_) => Err(RemoteError::Transient(format!(
        "call to {endpoint} timed out after {}s",
        CALL_DEADLINE.as_secs()
      ))),
    }
  }

  async fn post_json<S: Serialize + Sync>(
    &self,
    api: &'static str,
    endpoint: &str,
    body: &S,
  ) -> Result<Value, RemoteError> {
    match self.post_once(api, endpoint, body).await {
      Err(RemoteError::Auth(_)) => self.post_once(api, endpoint, body).await,
      other => other,
    }
  }

  async fn post_once<S: Serialize + Sync>(
    &self,
    api: &'static str,
    endpoint: &str,
    body: &S,
  ) -> Result<Value, RemoteError> {
    let fut = self.client.post::<Value, _>(api, endpoint, body);
    match tokio::time::timeout(CALL_DEADLINE, fut).await {
      Ok(result) => result.map_err(RemoteError::from),
      Err(_) => Err(RemoteError::Transient(format!(
        "call to {endpoint} timed out after {}s",
        CALL_DEADLINE.as_secs()
      ))),
    }
  }

  async fn put_json<S: Serialize + Sync>(
    &self,
    api: &'static str,
    endpoint: &str,
    body: &S,
  ) -> Result<Value, RemoteError> {
    let fut = self.client.put::<Value, _>(api, endpoint, body);
    match tokio::time::timeout(CALL_DEADLINE, fut).await {
      Ok(result) => result.map_err(RemoteError::from),
      Err(_) => Err(RemoteError::Transient(format!(
        "call to {endpoint} timed out after {}s",
        CALL_DEADLINE.as_secs()
      ))),
    }
  }
}

#[async_trait]
impl IssueService for JiraService {
  async fn search_page(
    &self,
    jql: &str,
    start_at: u64,
    max_results: u64,
  ) -> Result<SearchPage, RemoteError> {
    let query = url::form_urlencoded::Serializer::new(String::new())
      .append_pair("jql", jql)
      .append_pair("startAt", &start_at.to_string())
      .append_pair("maxResults", &max_results.to_string())
      .append_pair("fields", SEARCH_FIELDS)
      .finish();
    let endpoint = format!("/search?{query}");

    debug!(start_at, "searching issues");
    let result: ApiSearchResult = self.get_json("api", &endpoint).await?;

    Ok(SearchPage {
      issues: result.issues.into_iter().map(|i| i.into_issue()).collect(),
      start_at: result.start_at,
      total: result.total,
    })
  }

  async fn get_transitions(&self, key: &str) -> Result<Vec<Transition>, RemoteError> {
    let endpoint = format!("/issue/{key}/transitions");
    let response: ApiTransitionsResponse = self.get_json("api", &endpoint).await?;
    Ok(response.transitions.into_iter().map(Into::into).collect())
  }

  async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<(), RemoteError> {
    let endpoint = format!("/issue/{key}/transitions");
    let body = json!({ "transition": { "id": transition_id } });
    self.post_json("api", &endpoint, &body).await?;
    Ok(())
  }

  async fn assign(&self, key: &str, account_id: &str) -> Result<(), RemoteError> {
    let endpoint = format!("/issue/{key}/assignee");
    let body = json!({ "accountId": account_id });
    self.put_json("api", &endpoint, &body).await?;
    Ok(())
  }

  async fn add_comment(&self, key: &str, body: &str) -> Result<(), RemoteError> {
    let endpoint = format!("/issue/{key}/comment");
    let payload = json!({ "body": body });
    self.post_json("api", &endpoint, &payload).await?;
    Ok(())
  }

  async fn log_work(&self, key: &str, time_spent: &str) -> Result<(), RemoteError> {
    let endpoint = format!("/issue/{key}/worklog");
    let body = json!({ "timeSpent": time_spent });
    self.post_json("api", &endpoint, &body).await?;
    Ok(())
  }

  async fn create_issue(&self, fields: &NewIssue) -> Result<String, RemoteError> {
    let body = json!({
      "fields": {
        "project": { "key": fields.project },
        "summary": fields.summary,
        "issuetype": { "name": fields.issue_type },
        "priority": { "name": fields.priority },
        "description": fields.description,
      }
    });
    let value = self.post_json("api", "/issue", &body).await?;
    let created: ApiCreatedIssue =
      serde_json::from_value(value).map_err(|e| RemoteError::Api(e.to_string()))?;
    Ok(created.key)
  }

  async fn get_projects(&self) -> Result<Vec<Project>, RemoteError> {
    let projects: Vec<super::api::ApiProject> = self.get_json("api", "/project").await?;
    Ok(projects.into_iter().map(Into::into).collect())
  }

  async fn get_sprints(&self, board_id: u64) -> Result<Vec<Sprint>, RemoteError> {
    let endpoint = format!("/board/{board_id}/sprint?state=active,future");
    let response: ApiSprintsResponse = self.get_json("agile", &endpoint).await?;
    Ok(response.values.into_iter().map(Into::into).collect())
  }

  async fn move_to_sprint(&self, sprint_id: u64, keys: &[String]) -> Result<(), RemoteError> {
    let endpoint = format!("/sprint/{sprint_id}/issue");
    let body = json!({ "issues": keys });
    self.post_json("agile", &endpoint, &body).await?;
    Ok(())
  }
}

//! Background task bodies.
//!
//! Each function is the whole of one deferred task: it performs the remote
//! and store work and returns the completion event the router merges back.
//! The router spawns these; tests call them directly.

use std::sync::Arc;

use tracing::{info, warn};

use crate::event::TaskEvent;
use crate::remote::types::NewIssue;
use crate::remote::IssueService;
use crate::store::Store;
use crate::sync;

pub async fn run_sync(
  service: Arc<dyn IssueService>,
  store: Arc<Store>,
  project: Option<String>,
  resolved_window_days: u32,
) -> TaskEvent {
  let outcome = sync::run(service.as_ref(), &store, project.as_deref(), resolved_window_days)
    .await
    .map_err(|e| e.to_string());
  TaskEvent::SyncDone(outcome)
}

/// Fetch fresh transitions for the picker, refreshing the cache on the way.
/// On failure, fall back to whatever the cache already holds.
pub async fn load_transitions(
  service: Arc<dyn IssueService>,
  store: Arc<Store>,
  key: String,
) -> TaskEvent {
  match service.get_transitions(&key).await {
    Ok(transitions) => {
      let _ = store.upsert_transitions(&key, &transitions);
      TaskEvent::TransitionsLoaded { transitions }
    }
    Err(err) => {
      warn!(key = %key, "transition fetch failed, serving cached set: {err}");
      TaskEvent::TransitionsLoaded {
        transitions: store.get_transitions(&key).unwrap_or_default(),
      }
    }
  }
}

/// Apply one transition to every key independently. A failure on one key
/// never stops the others.
pub async fn apply_transition(
  service: Arc<dyn IssueService>,
  keys: Vec<String>,
  transition_id: String,
) -> TaskEvent {
  let mut moved = 0usize;
  let mut failed = 0usize;
  for key in &keys {
    match service.apply_transition(key, &transition_id).await {
      Ok(()) => moved += 1,
      Err(err) => {
        warn!(key = %key, "transition failed: {err}");
        failed += 1;
      }
    }
  }
  info!(moved, failed, "bulk transition finished");
  TaskEvent::MoveDone { moved, failed }
}

pub async fn assign(service: Arc<dyn IssueService>, key: String, account_id: String) -> TaskEvent {
  match service.assign(&key, &account_id).await {
    Ok(()) => TaskEvent::AssignDone { key },
    Err(err) => TaskEvent::Status(format!("Assign {key} failed: {err}")),
  }
}

pub async fn add_comment(service: Arc<dyn IssueService>, key: String, body: String) -> TaskEvent {
  match service.add_comment(&key, &body).await {
    Ok(()) => TaskEvent::CommentDone { key },
    Err(err) => TaskEvent::Status(format!("Comment on {key} failed: {err}")),
  }
}

pub async fn log_work(
  service: Arc<dyn IssueService>,
  key: String,
  time_spent: String,
) -> TaskEvent {
  match service.log_work(&key, &time_spent).await {
    Ok(()) => TaskEvent::WorkLogged { key },
    Err(err) => TaskEvent::Status(format!("Worklog on {key} failed: {err}")),
  }
}

/// Create an issue and, when a board is configured, drop it into that
/// board's active sprint. A sprint-move failure does not undo the create.
pub async fn create_issue(
  service: Arc<dyn IssueService>,
  fields: NewIssue,
  default_board: Option<u64>,
) -> TaskEvent {
  let key = match service.create_issue(&fields).await {
    Ok(key) => key,
    Err(err) => return TaskEvent::Status(format!("Create failed: {err}")),
  };

  if let Some(board_id) = default_board {
    match service.get_sprints(board_id).await {
      Ok(sprints) => {
        if let Some(active) = sprints.iter().find(|s| s.state == "active") {
          if let Err(err) = service.move_to_sprint(active.id, &[key.clone()]).await {
            warn!(key = %key, "created but not moved to sprint: {err}");
          }
        }
      }
      Err(err) => warn!("could not list sprints for board {board_id}: {err}"),
    }
  }

  TaskEvent::IssueCreated { key }
}

pub async fn load_projects(service: Arc<dyn IssueService>) -> TaskEvent {
  match service.get_projects().await {
    Ok(projects) => TaskEvent::ProjectsLoaded(projects),
    Err(err) => TaskEvent::Status(format!("Project list failed: {err}")),
  }
}

/// Run an ad-hoc JQL filter. Results are written to the store first; the
/// view then renders the matched keys from cache like everything else.
pub async fn apply_filter(
  service: Arc<dyn IssueService>,
  store: Arc<Store>,
  jql: String,
) -> TaskEvent {
  let issues = match sync::search_all(service.as_ref(), &jql).await {
    Ok(issues) => issues,
    Err(err) => return TaskEvent::Status(format!("Filter failed: {err}")),
  };

  let mut keys = Vec::with_capacity(issues.len());
  for issue in &issues {
    if let Err(err) = store.upsert_issue(issue) {
      warn!(key = %issue.key, "skipping filtered issue that failed to cache: {err}");
      continue;
    }
    keys.push(issue.key.clone());
  }
  TaskEvent::FilterApplied { keys }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::remote::fake::{page, sample_issue, Call, FakeService};
  use crate::remote::types::Sprint;

  #[tokio::test]
  async fn bulk_transition_applies_to_each_key_independently() {
    let service = Arc::new(FakeService::new());
    service.fail_move("PROJ-2");
    let keys = vec!["PROJ-1".to_string(), "PROJ-2".to_string(), "PROJ-3".to_string()];

    let event = apply_transition(service.clone(), keys, "21".into()).await;
    match event {
      TaskEvent::MoveDone { moved, failed } => {
        assert_eq!(moved, 2);
        assert_eq!(failed, 1);
      }
      other => panic!("expected MoveDone, got {other:?}"),
    }

    // The failing key did not short-circuit the rest.
    let applied: Vec<_> = service
      .calls()
      .into_iter()
      .filter(|c| matches!(c, Call::ApplyTransition { .. }))
      .collect();
    assert_eq!(applied.len(), 3);
  }

  #[tokio::test]
  async fn transition_load_falls_back_to_cache_on_failure() {
    let service = Arc::new(FakeService::new());
    service.failing_transition_fetches.lock().unwrap().insert("PROJ-1".into());
    let store = Arc::new(Store::open_in_memory().unwrap());
    store
      .upsert_transitions(
        "PROJ-1",
        &[crate::remote::types::Transition {
          id: "11".into(),
          name: "Start".into(),
          to_status: "In Progress".into(),
        }],
      )
      .unwrap();

    let event = load_transitions(service, store, "PROJ-1".into()).await;
    match event {
      TaskEvent::TransitionsLoaded { transitions } => {
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].id, "11");
      }
      other => panic!("expected TransitionsLoaded, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn create_moves_into_active_sprint_when_board_configured() {
    let service = Arc::new(FakeService::new());
    *service.sprints.lock().unwrap() = vec![
      Sprint { id: 7, name: "Sprint 6".into(), state: "closed".into() },
      Sprint { id: 9, name: "Sprint 7".into(), state: "active".into() },
    ];

    let fields = NewIssue {
      project: "PROJ".into(),
      summary: "New thing".into(),
      issue_type: "Task".into(),
      priority: "Medium".into(),
      description: String::new(),
    };
    let event = create_issue(service.clone(), fields, Some(3)).await;
    assert!(matches!(event, TaskEvent::IssueCreated { .. }));

    let calls = service.calls();
    assert!(calls.contains(&Call::GetSprints(3)));
    assert!(calls.iter().any(|c| matches!(
      c,
      Call::MoveToSprint { sprint_id: 9, keys } if keys == &vec!["PROJ-999".to_string()]
    )));
  }

  #[tokio::test]
  async fn create_without_board_skips_sprint_lookup() {
    let service = Arc::new(FakeService::new());
    let fields = NewIssue {
      project: "PROJ".into(),
      summary: "New thing".into(),
      issue_type: "Task".into(),
      priority: "Medium".into(),
      description: String::new(),
    };
    create_issue(service.clone(), fields, None).await;
    assert!(!service.calls().iter().any(|c| matches!(c, Call::GetSprints(_))));
  }

  #[tokio::test]
  async fn filter_results_land_in_store_before_display() {
    let service = Arc::new(FakeService::new());
    let store = Arc::new(Store::open_in_memory().unwrap());
    service.push_page(Ok(page(
      vec![sample_issue("PROJ-5", "To Do", "2026-01-01T10:00:00.000+0000")],
      0,
      1,
    )));

    let event = apply_filter(service, store.clone(), "assignee = me".into()).await;
    match event {
      TaskEvent::FilterApplied { keys } => assert_eq!(keys, vec!["PROJ-5".to_string()]),
      other => panic!("expected FilterApplied, got {other:?}"),
    }
    assert!(store.get_issue("PROJ-5").unwrap().is_some());
  }
}

//! Background synchronization between the cache store and the remote.
//!
//! Builds a scoped, incrementally narrowing JQL query, pages through the
//! results, merges them into the store and records the outcome. The cache
//! only grows or updates along this path; issues that fall out of the query
//! window are deliberately left in place.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::remote::{IssueService, RemoteError};
use crate::store::Store;

/// Page size for remote searches.
pub const PAGE_SIZE: u64 = 50;

/// Outcome of a sync that reached the merge phase. Individual upsert or
/// transition-fetch failures are counted out, not fatal.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
  pub items_synced: usize,
  pub failed: usize,
  pub duration: Duration,
}

/// Build the sync query.
///
/// Base scope: unresolved issues plus issues resolved within the recency
/// window (keeps the Done column populated without unbounded growth),
/// optionally restricted to one project. When a watermark from a prior sync
/// exists, further restrict to issues updated since then.
pub fn build_jql(
  project: Option<&str>,
  resolved_window_days: u32,
  watermark: Option<DateTime<Utc>>,
) -> String {
  let base = format!("(resolution = Unresolved OR resolutiondate >= -{resolved_window_days}d)");
  let scoped = match project {
    Some(p) if !p.is_empty() => format!("project = {p} AND {base}"),
    _ => base,
  };

  match watermark {
    Some(ts) => format!(
      "{scoped} AND updated >= '{}' ORDER BY updated DESC",
      ts.format("%Y-%m-%d %H:%M")
    ),
    None => format!("{scoped} ORDER BY updated DESC"),
  }
}

/// Page through a JQL search until the remote signals exhaustion.
///
/// An empty page while the total still claims more results is retried once,
/// then treated as exhaustion; this loop never runs unbounded.
pub async fn search_all(
  service: &dyn IssueService,
  jql: &str,
) -> Result<Vec<crate::remote::types::Issue>, RemoteError> {
  let mut all = Vec::new();
  let mut start_at = 0u64;
  let mut retried_empty = false;

  loop {
    let page = service.search_page(jql, start_at, PAGE_SIZE).await?;
    let fetched = page.issues.len() as u64;
    let total = page.total;
    all.extend(page.issues);

    if start_at + fetched >= total {
      break;
    }
    if fetched == 0 {
      if retried_empty {
        warn!(start_at, total, "remote kept returning empty pages, stopping pagination");
        break;
      }
      retried_empty = true;
      continue;
    }
    retried_empty = false;
    start_at += fetched;
  }

  Ok(all)
}

/// Reconcile the store with the remote.
///
/// A failure of the search itself is a hard failure: the store is left
/// untouched and nothing is logged. Once issues arrive, each one is merged
/// independently: an upsert failure skips that issue, a transition-fetch
/// failure is ignored for that issue, and the outcome is recorded either way.
pub async fn run(
  service: &dyn IssueService,
  store: &Store,
  project: Option<&str>,
  resolved_window_days: u32,
) -> Result<SyncOutcome, RemoteError> {
  let start = Instant::now();

  let watermark = store.last_sync().ok().flatten();
  let jql = build_jql(project, resolved_window_days, watermark);

  let issues = search_all(service, &jql).await?;

  let mut synced = 0usize;
  let mut failed = 0usize;
  for issue in &issues {
    if let Err(err) = store.upsert_issue(issue) {
      warn!(key = %issue.key, "skipping issue that failed to cache: {err}");
      failed += 1;
      continue;
    }
    synced += 1;

    match service.get_transitions(&issue.key).await {
      Ok(transitions) => {
        let _ = store.upsert_transitions(&issue.key, &transitions);
      }
      Err(_) => {
        // Stale transitions are tolerable; the picker refetches on open.
      }
    }
  }

  let duration = start.elapsed();
  if let Err(err) = store.record_sync(synced, duration) {
    warn!("failed to record sync outcome: {err}");
  }
  info!(synced, failed, ?duration, "sync finished");

  Ok(SyncOutcome {
    items_synced: synced,
    failed,
    duration,
  })
}

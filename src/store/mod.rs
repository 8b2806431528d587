//! Durable local mirror of remote issue state.
//!
//! The store is the single source of truth for rendering: every fetched
//! entity is written here before any view reflects it. Writes are serialized
//! behind one connection; each write is a single transaction, so readers see
//! either the pre- or post-write state of a record, never a mix.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use crate::remote::types::{Issue, Transition};

/// Maximum rows returned by the cache-local substring search.
const SEARCH_LIMIT: u32 = 50;

/// Maximum JQL filters kept in history.
const FILTER_HISTORY_LIMIT: u32 = 20;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS issues (
    key TEXT PRIMARY KEY,
    summary TEXT,
    status TEXT,
    assignee TEXT,
    priority TEXT,
    issue_type TEXT,
    project_key TEXT,
    sprint_id INTEGER,
    updated_at TEXT,
    raw_json TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transitions (
    issue_key TEXT NOT NULL,
    transition_id TEXT NOT NULL,
    name TEXT,
    to_status TEXT,
    PRIMARY KEY (issue_key, transition_id)
);

CREATE TABLE IF NOT EXISTS sync_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    last_sync TEXT NOT NULL,
    items_synced INTEGER NOT NULL,
    duration_ms INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS filter_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    jql TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status);
CREATE INDEX IF NOT EXISTS idx_issues_project ON issues(project_key);
CREATE INDEX IF NOT EXISTS idx_issues_assignee ON issues(assignee);
"#;

/// SQLite-backed cache store shared by the event loop and background tasks.
pub struct Store {
  conn: Mutex<Connection>,
}

impl Store {
  /// Open or create the cache at the default location.
  pub fn open() -> Result<Self> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;
    Self::open_at(&data_dir.join("densha").join("cache.db"))
  }

  pub fn open_at(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    // WAL mode so renders can read while a sync write is in flight.
    conn
      .pragma_update(None, "journal_mode", "WAL")
      .map_err(|e| eyre!("Failed to enable WAL mode: {}", e))?;
    conn
      .pragma_update(None, "synchronous", "NORMAL")
      .map_err(|e| eyre!("Failed to set synchronous pragma: {}", e))?;

    Self::from_connection(conn)
  }

  /// In-memory store for tests.
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  /// Insert or replace an issue keyed by its issue key.
  ///
  /// The denormalized filter columns and the full payload land in one
  /// statement, so a reader never observes them disagreeing.
  pub fn upsert_issue(&self, issue: &Issue) -> Result<()> {
    let raw = serde_json::to_string(issue)
      .map_err(|e| eyre!("Failed to serialize issue {}: {}", issue.key, e))?;

    let conn = self.conn()?;
    conn
      .execute(
        "INSERT INTO issues (key, summary, status, assignee, priority, issue_type, project_key, sprint_id, updated_at, raw_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(key) DO UPDATE SET
           summary=excluded.summary, status=excluded.status, assignee=excluded.assignee,
           priority=excluded.priority, issue_type=excluded.issue_type, project_key=excluded.project_key,
           sprint_id=excluded.sprint_id, updated_at=excluded.updated_at, raw_json=excluded.raw_json",
        params![
          issue.key,
          issue.summary,
          issue.status,
          issue.assignee,
          issue.priority,
          issue.issue_type,
          issue.project_key,
          issue.sprint_id,
          issue.updated,
          raw,
        ],
      )
      .map_err(|e| eyre!("Failed to upsert issue {}: {}", issue.key, e))?;
    Ok(())
  }

  /// All cached issues, optionally restricted to one status, ordered by
  /// priority then recency.
  pub fn get_issues(&self, status: Option<&str>) -> Result<Vec<Issue>> {
    let conn = self.conn()?;
    let issues = match status {
      Some(s) => {
        let mut stmt = conn.prepare(
          "SELECT raw_json FROM issues WHERE status = ?1 ORDER BY priority, updated_at DESC",
        )?;
        let rows = stmt.query_map(params![s], |row| row.get::<_, String>(0))?;
        decode_rows(rows)
      }
      None => {
        let mut stmt =
          conn.prepare("SELECT raw_json FROM issues ORDER BY priority, updated_at DESC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        decode_rows(rows)
      }
    };
    Ok(issues)
  }

  pub fn get_all_issues(&self) -> Result<Vec<Issue>> {
    self.get_issues(None)
  }

  /// A single cached issue by key.
  pub fn get_issue(&self, key: &str) -> Result<Option<Issue>> {
    let conn = self.conn()?;
    let raw: Option<String> = conn
      .query_row("SELECT raw_json FROM issues WHERE key = ?1", params![key], |row| row.get(0))
      .optional()?;

    match raw {
      Some(raw) => Ok(serde_json::from_str(&raw).ok()),
      None => Ok(None),
    }
  }

  /// Cache-local substring search over key and summary, newest first,
  /// capped at 50 rows. This never touches the network.
  pub fn search_issues(&self, query: &str) -> Result<Vec<Issue>> {
    let like = format!("%{query}%");
    let conn = self.conn()?;
    let mut stmt = conn.prepare(
      "SELECT raw_json FROM issues WHERE key LIKE ?1 OR summary LIKE ?1
       ORDER BY updated_at DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![like, SEARCH_LIMIT], |row| row.get::<_, String>(0))?;
    Ok(decode_rows(rows))
  }

  /// Replace the stored transition set for an issue.
  ///
  /// Delete-then-insert in one transaction: no stale transition lingers
  /// after a refresh.
  pub fn upsert_transitions(&self, issue_key: &str, transitions: &[Transition]) -> Result<()> {
    let mut conn = self.conn()?;
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM transitions WHERE issue_key = ?1", params![issue_key])?;
    for t in transitions {
      tx.execute(
        "INSERT OR REPLACE INTO transitions (issue_key, transition_id, name, to_status)
         VALUES (?1, ?2, ?3, ?4)",
        params![issue_key, t.id, t.name, t.to_status],
      )?;
    }
    tx.commit()?;
    Ok(())
  }

  pub fn get_transitions(&self, issue_key: &str) -> Result<Vec<Transition>> {
    let conn = self.conn()?;
    let mut stmt = conn.prepare(
      "SELECT transition_id, name, to_status FROM transitions WHERE issue_key = ?1",
    )?;
    let rows = stmt.query_map(params![issue_key], |row| {
      Ok(Transition {
        id: row.get(0)?,
        name: row.get(1)?,
        to_status: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
      })
    })?;
    Ok(rows.filter_map(|r| r.ok()).collect())
  }

  /// Append a completed sync to the log.
  pub fn record_sync(&self, items_synced: usize, duration: Duration) -> Result<()> {
    let conn = self.conn()?;
    conn.execute(
      "INSERT INTO sync_log (last_sync, items_synced, duration_ms) VALUES (?1, ?2, ?3)",
      params![
        Utc::now().to_rfc3339(),
        items_synced as i64,
        duration.as_millis() as i64
      ],
    )?;
    Ok(())
  }

  /// Timestamp of the most recent sync, or `None` if none was ever recorded.
  pub fn last_sync(&self) -> Result<Option<DateTime<Utc>>> {
    let conn = self.conn()?;
    let ts: Option<String> = conn
      .query_row(
        "SELECT last_sync FROM sync_log ORDER BY id DESC LIMIT 1",
        [],
        |row| row.get(0),
      )
      .optional()?;

    match ts {
      Some(ts) => {
        let parsed = DateTime::parse_from_rfc3339(&ts)
          .map_err(|e| eyre!("Failed to parse sync timestamp '{}': {}", ts, e))?;
        Ok(Some(parsed.with_timezone(&Utc)))
      }
      None => Ok(None),
    }
  }

  /// Remember a JQL filter, most recent first, bounded at 20 entries.
  /// Re-saving an existing filter moves it to the front.
  pub fn save_filter(&self, jql: &str) -> Result<()> {
    let mut conn = self.conn()?;
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM filter_history WHERE jql = ?1", params![jql])?;
    tx.execute("INSERT INTO filter_history (jql) VALUES (?1)", params![jql])?;
    tx.execute(
      "DELETE FROM filter_history WHERE id NOT IN
         (SELECT id FROM filter_history ORDER BY id DESC LIMIT ?1)",
      params![FILTER_HISTORY_LIMIT],
    )?;
    tx.commit()?;
    Ok(())
  }

  pub fn recent_filters(&self) -> Result<Vec<String>> {
    let conn = self.conn()?;
    let mut stmt = conn.prepare("SELECT jql FROM filter_history ORDER BY id DESC")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    Ok(rows.filter_map(|r| r.ok()).collect())
  }
}

/// Decode raw JSON rows, skipping any that fail to parse.
fn decode_rows(
  rows: impl Iterator<Item = rusqlite::Result<String>>,
) -> Vec<Issue> {
  rows
    .filter_map(|r| r.ok())
    .filter_map(|raw| match serde_json::from_str(&raw) {
      Ok(issue) => Some(issue),
      Err(e) => {
        warn!("skipping undecodable cached issue: {e}");
        None
      }
    })
    .collect()
}

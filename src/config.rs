use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub jira: JiraConfig,
  pub default_project: Option<String>,
  /// Account id of the current user, required for assign-to-self.
  pub account_id: Option<String>,
  /// Board used to find the active sprint for newly created issues.
  pub default_board: Option<u64>,
  /// Seconds between periodic background syncs.
  #[serde(default = "default_sync_interval")]
  pub sync_interval_secs: u64,
  /// How many days of resolved issues the sync keeps pulling in, so the
  /// Done column stays populated without unbounded growth.
  #[serde(default = "default_resolved_window")]
  pub resolved_window_days: u32,
}

fn default_sync_interval() -> u64 {
  60
}

fn default_resolved_window() -> u32 {
  14
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraConfig {
  pub url: String,
  pub email: String,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./densha.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/densha/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/densha/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("densha.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("densha").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the Jira API token from environment variables.
  ///
  /// Checks DENSHA_JIRA_TOKEN first, then JIRA_API_TOKEN as fallback.
  pub fn api_token() -> Result<String> {
    std::env::var("DENSHA_JIRA_TOKEN")
      .or_else(|_| std::env::var("JIRA_API_TOKEN"))
      .map_err(|_| {
        eyre!(
          "Jira API token not found. Set DENSHA_JIRA_TOKEN or JIRA_API_TOKEN environment variable."
        )
      })
  }

  /// Web URL for an issue key.
  pub fn browse_url(&self, issue_key: &str) -> String {
    format!("{}/browse/{}", self.jira.url.trim_end_matches('/'), issue_key)
  }
}

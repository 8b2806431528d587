use reqwest::StatusCode;

/// Failure classes for remote calls.
///
/// Background tasks convert these into status messages; nothing here ever
/// escapes as a panic. `Transient` failures are not retried immediately,
/// the next scheduled sync or user action retries them naturally.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
  /// Network unreachable or the fixed call deadline elapsed.
  #[error("network error: {0}")]
  Transient(String),

  /// Credentials rejected after the client's refresh-and-retry.
  #[error("authentication failed: {0}")]
  Auth(String),

  /// The remote rejected the query itself (e.g. malformed JQL).
  #[error("query rejected: {0}")]
  Query(String),

  /// Any other remote fault.
  #[error("remote call failed: {0}")]
  Api(String),
}

impl From<gouqi::Error> for RemoteError {
  fn from(err: gouqi::Error) -> Self {
    match err {
      gouqi::Error::Unauthorized => {
        RemoteError::Auth("jira rejected the stored credentials".into())
      }
      gouqi::Error::Fault { code, ref errors } if code == StatusCode::BAD_REQUEST => {
        RemoteError::Query(format!("{errors:?}"))
      }
      gouqi::Error::Http(ref inner) => RemoteError::Transient(inner.to_string()),
      other => RemoteError::Api(other.to_string()),
    }
  }
}

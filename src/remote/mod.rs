//! Remote issue-tracker surface: domain types, the service trait and its
//! Jira REST implementation.

mod api;
pub mod client;
pub mod error;
#[cfg(test)]
pub mod fake;
pub mod types;

pub use client::{IssueService, JiraService};
pub use error::RemoteError;

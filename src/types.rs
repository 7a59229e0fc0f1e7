//! Core types for build3d-dock

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identifier assigned to a job by the remote service
///
/// The service reports ids as JSON numbers, but nothing in the API contract
/// promises that, so the id is kept as the exact text the service sent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Get the id as it appears in request paths
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret the `job_id` field of a submission response
    ///
    /// Returns `None` for values the service uses to signal "no job": a
    /// missing field, `null`, an empty string, `false` or the number zero.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(Self(s.trim().to_string())),
            serde_json::Value::Number(n) if n.as_f64() != Some(0.0) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl PartialEq<&str> for JobId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Job status as reported by the results endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobStatus {
    /// Accepted by the service, not started yet
    Submitted,
    /// Being processed
    Running,
    /// Finished, outputs can be downloaded
    Completed,
    /// The service rejected the input
    InvalidInput,
    /// Any value this client does not know (empty when the field was missing)
    Unrecognized(String),
}

impl JobStatus {
    /// Parse the `status` field of a status response
    pub fn parse(status: Option<&str>) -> Self {
        match status {
            Some("Submitted") => JobStatus::Submitted,
            Some("Running") => JobStatus::Running,
            Some("Completed") => JobStatus::Completed,
            Some("Invalid input") => JobStatus::InvalidInput,
            Some(other) => JobStatus::Unrecognized(other.to_string()),
            None => JobStatus::Unrecognized(String::new()),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Submitted => f.write_str("Submitted"),
            JobStatus::Running => f.write_str("Running"),
            JobStatus::Completed => f.write_str("Completed"),
            JobStatus::InvalidInput => f.write_str("Invalid input"),
            JobStatus::Unrecognized(s) if s.is_empty() => f.write_str("<missing>"),
            JobStatus::Unrecognized(s) => f.write_str(s),
        }
    }
}

/// Body of the submission response
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct SubmitResponse {
    #[serde(default)]
    pub job_id: serde_json::Value,
}

/// Body of the job status response
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct StatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub output_list: Option<Vec<String>>,
}

/// Archive formats the service delivers results in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveType {
    /// Uncompressed tarball (.tar)
    Tar,
    /// Gzip-compressed tarball (.tar.gz, .tgz)
    TarGz,
}

/// Result of a complete submit, poll and download sequence
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobOutcome {
    /// The job that produced the files
    pub job_id: JobId,
    /// Local paths of the downloaded artifacts, in `output_list` order
    pub files: Vec<PathBuf>,
}

//! Error types for build3d-dock
//!
//! This module provides the error taxonomy for the pipeline:
//! - Job errors raised by the remote job client (submit, poll, download)
//! - Docking errors raised around the external docking executable
//! - Generic I/O, network and serialization failures
//! - Process exit code mapping for the command line binary

use crate::types::JobId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for build3d-dock operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for build3d-dock
///
/// Each variant includes enough context to diagnose the failure from the log
/// line alone.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "API_TOKEN")
        key: Option<String>,
    },

    /// Remote job failed (submission, polling, or artifact download)
    #[error("job error: {0}")]
    Job(#[from] JobError),

    /// Docking step failed
    #[error("docking error: {0}")]
    Docking(#[from] DockingError),

    /// Archive extraction failed
    #[error("extraction failed for {archive}: {reason}")]
    Extraction {
        /// The archive file that failed to extract
        archive: PathBuf,
        /// The reason extraction failed
        reason: String,
    },

    /// The job pipeline finished without downloading any file
    #[error("no files were downloaded for docking")]
    NoArtifacts,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML configuration could not be parsed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The run was stopped by a termination signal
    #[error("interrupted by signal")]
    Interrupted,

    /// Operation not supported on this platform
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Errors reported by the remote job client
#[derive(Debug, Error)]
pub enum JobError {
    /// Submission request was rejected or the response carried no job id
    #[error("job submission failed: {reason}")]
    Submission {
        /// Why the submission is considered failed
        reason: String,
    },

    /// A status request failed while polling
    #[error("polling job {job_id} failed: {reason}")]
    Poll {
        /// The job being polled
        job_id: JobId,
        /// Why the status request failed
        reason: String,
    },

    /// The service rejected the submitted input
    #[error("job {job_id} failed: invalid input")]
    InvalidInput {
        /// The rejected job
        job_id: JobId,
    },

    /// Polling stopped after the configured number of status requests
    #[error("job {job_id} did not finish after {attempts} status checks (last status: {last_status})")]
    PollLimitExceeded {
        /// The job being polled
        job_id: JobId,
        /// Number of status requests issued
        attempts: u32,
        /// Last status reported by the service
        last_status: String,
    },

    /// An artifact could not be downloaded
    #[error("downloading {filename} for job {job_id} failed: {reason}")]
    Download {
        /// The job the artifact belongs to
        job_id: JobId,
        /// Artifact name as listed by the service
        filename: String,
        /// Why the download failed
        reason: String,
    },
}

/// Errors raised around the external docking executable
#[derive(Debug, Error)]
pub enum DockingError {
    /// The docking executable could not be located
    #[error("docking executable not found: {path}")]
    ExecutableNotFound {
        /// The configured executable path
        path: PathBuf,
    },

    /// The docking executable could not be started
    #[error("failed to run {path}: {reason}")]
    ExternalTool {
        /// The executable that failed to start
        path: PathBuf,
        /// The reason the process could not be spawned
        reason: String,
    },

    /// The docking executable exited unsuccessfully
    #[error("docking exited with {}", .code.map_or_else(|| "a signal".to_string(), |c| format!("status {c}")))]
    DockingFailed {
        /// Exit code, `None` when the process was terminated by a signal
        code: Option<i32>,
    },

    /// The docking run produced no output file
    #[error("docking output {path} not found, see OUTDOCK in {}", .path.parent().map(|p| p.display().to_string()).unwrap_or_default())]
    OutputMissing {
        /// The expected output file
        path: PathBuf,
    },
}

/// Convert errors to process exit codes for the command line binary
///
/// Codes:
/// - `1` job failures and runs that downloaded nothing
/// - `2` configuration errors
/// - `3` docking failures
/// - `4` everything else
/// - `130` interrupted by a signal
pub trait ToExitCode {
    /// Get the process exit code for this error
    fn exit_code(&self) -> i32;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToExitCode for Error {
    fn exit_code(&self) -> i32 {
        match self {
            Error::Job(_) | Error::NoArtifacts => 1,
            Error::Config { .. } | Error::Yaml(_) => 2,
            Error::Docking(_) => 3,
            Error::Interrupted => 130,
            Error::Extraction { .. }
            | Error::Io(_)
            | Error::Network(_)
            | Error::Serialization(_)
            | Error::NotSupported(_)
            | Error::Other(_) => 4,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Job(e) => match e {
                JobError::Submission { .. } => "submission_failed",
                JobError::Poll { .. } => "poll_failed",
                JobError::InvalidInput { .. } => "invalid_input",
                JobError::PollLimitExceeded { .. } => "poll_limit_exceeded",
                JobError::Download { .. } => "download_failed",
            },
            Error::Docking(e) => match e {
                DockingError::ExecutableNotFound { .. } => "executable_not_found",
                DockingError::ExternalTool { .. } => "external_tool_error",
                DockingError::DockingFailed { .. } => "docking_failed",
                DockingError::OutputMissing { .. } => "docking_output_missing",
            },
            Error::Extraction { .. } => "extraction_failed",
            Error::NoArtifacts => "no_artifacts",
            Error::Interrupted => "interrupted",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Yaml(_) => "yaml_error",
            Error::NotSupported(_) => "not_supported",
            Error::Other(_) => "internal_error",
        }
    }
}

impl Error {
    /// Build a configuration error for a specific key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

//! Client for the TLDR job API
//!
//! A job goes through three phases, each exposed as one operation:
//! 1. [`JobClient::submit`] uploads the input file and returns the job id
//! 2. [`JobClient::poll_until_complete`] waits for a terminal status
//! 3. [`JobClient::download_artifacts`] streams every listed output file to disk
//!
//! [`JobClient::submit_and_download`] runs all three in sequence.
//!
//! The API token is sent as the `token` query parameter on every request. It
//! never appears in log output or error messages.

use crate::config::{Config, RetryConfig};
use crate::error::{Error, JobError, Result};
use crate::retry::with_retry;
use crate::types::{JobId, JobOutcome, JobStatus, StatusResponse, SubmitResponse};
use reqwest::multipart::{Form, Part};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

/// Endpoint accepting build3d submissions, relative to the API root
const SUBMIT_PATH: [&str; 3] = ["modules", "build3d37", "submit"];

/// Prefix of the status and artifact endpoints, relative to the API root
const RESULTS_PATH: [&str; 2] = ["results", "download"];

/// Multipart field name the service expects the ligand file under
const INPUT_FIELD: &str = "input.smi";

/// Default timeout for a single request, or for a stalled download
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Client for one API root and token
#[derive(Clone, Debug)]
pub struct JobClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    retry: RetryConfig,
    max_polls: Option<u32>,
    request_timeout: Duration,
}

/// How long a GET may take
#[derive(Clone, Copy, Debug)]
enum Transfer {
    /// Headers and body must arrive within the request timeout
    Whole,
    /// Only the headers are bounded; the body is read chunk by chunk
    Streamed,
}

impl JobClient {
    /// Create a client with default timeout and retry settings and no poll limit
    ///
    /// # Errors
    /// Returns a configuration error if `base_url` is not an http(s) base URL.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        Self::build(base_url, token.into(), DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client from the API section of a configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Self::build(
            &config.api.api_base_url,
            config.api_token.clone(),
            config.api.request_timeout,
        )?;
        Ok(client
            .with_retry_config(config.api.retry.clone())
            .with_max_polls(config.api.max_polls))
    }

    fn build(base_url: &str, token: String, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::config("api_base_url", format!("invalid URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::config(
                "api_base_url",
                format!("{base_url} is not an http(s) base URL"),
            ));
        }

        // No client-wide timeout: it would also cap the body of large downloads
        let http = reqwest::Client::builder()
            .user_agent(concat!("build3d-dock/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Other(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            token,
            retry: RetryConfig::default(),
            max_polls: None,
            request_timeout: timeout,
        })
    }

    /// Replace the request timeout
    ///
    /// Submissions and status checks must complete within it. Downloads must
    /// receive their headers within it and may then take any time, as long as
    /// no gap between body chunks exceeds it.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Replace the retry policy used for status checks and downloads
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Limit the number of status checks (None = poll until a terminal status)
    pub fn with_max_polls(mut self, max_polls: Option<u32>) -> Self {
        self.max_polls = max_polls;
        self
    }

    /// Submit an input file as a new build3d job
    ///
    /// The file content is uploaded under the multipart field `input.smi`
    /// whatever the file is called locally, together with a `memo` field.
    /// Submissions are not retried: a resent request could create a second job.
    ///
    /// # Errors
    /// - [`JobError::Submission`] on a non-2xx response, an unreadable body, or
    ///   a response without a usable `job_id`
    /// - [`Error::Io`] if the input file cannot be read
    pub async fn submit(&self, input_file: &Path, memo: &str) -> Result<JobId> {
        let content = tokio::fs::read(input_file).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read input file '{}': {}", input_file.display(), e),
            ))
        })?;

        let file_name = input_file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(INPUT_FIELD)
            .to_string();
        let form = Form::new()
            .part(INPUT_FIELD, Part::bytes(content).file_name(file_name))
            .text("memo", memo.to_string());

        let url = self.endpoint(&SUBMIT_PATH)?;
        info!(input = %input_file.display(), "submitting job");

        let response = self
            .http
            .post(url)
            .query(&[("token", self.token.as_str())])
            .timeout(self.request_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Network(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JobError::Submission {
                reason: format!("HTTP {}", status),
            }
            .into());
        }

        let body: SubmitResponse = response.json().await.map_err(|e| JobError::Submission {
            reason: format!("unreadable response: {}", e.without_url()),
        })?;

        let job_id = JobId::from_json(&body.job_id).ok_or_else(|| JobError::Submission {
            reason: "no job_id returned".to_string(),
        })?;

        info!(job_id = %job_id, "job submitted");
        Ok(job_id)
    }

    /// Poll a job until it reaches a terminal status and return its output list
    ///
    /// `Submitted`, `Running` and unrecognized statuses wait `poll_interval`
    /// and check again. `Completed` returns the `output_list` of that response
    /// (empty when absent) without further requests.
    ///
    /// # Errors
    /// - [`JobError::InvalidInput`] as soon as the service reports `Invalid input`
    /// - [`JobError::Poll`] on a non-2xx response or an unreadable body
    /// - [`JobError::PollLimitExceeded`] once the configured number of checks ran out
    /// - [`Error::Network`] when the service stays unreachable after retries
    pub async fn poll_until_complete(
        &self,
        job_id: &JobId,
        poll_interval: Duration,
    ) -> Result<Vec<String>> {
        let url = self.endpoint(&[RESULTS_PATH[0], RESULTS_PATH[1], job_id.as_str()])?;
        let mut attempts: u32 = 0;
        let mut last_status: Option<JobStatus> = None;

        loop {
            attempts += 1;
            let response = self.get_with_retry(&url, Transfer::Whole).await?;

            let http_status = response.status();
            if !http_status.is_success() {
                return Err(JobError::Poll {
                    job_id: job_id.clone(),
                    reason: format!("HTTP {}", http_status),
                }
                .into());
            }

            let body: StatusResponse = response.json().await.map_err(|e| JobError::Poll {
                job_id: job_id.clone(),
                reason: format!("unreadable status response: {}", e.without_url()),
            })?;
            let status = JobStatus::parse(body.status.as_deref());

            if last_status.as_ref() != Some(&status) {
                info!(job_id = %job_id, status = %status, "job status");
            } else {
                debug!(job_id = %job_id, status = %status, attempt = attempts, "job status unchanged");
            }

            match &status {
                JobStatus::Completed => {
                    let outputs = body.output_list.unwrap_or_default();
                    info!(job_id = %job_id, outputs = outputs.len(), "job completed");
                    return Ok(outputs);
                }
                JobStatus::InvalidInput => {
                    return Err(JobError::InvalidInput {
                        job_id: job_id.clone(),
                    }
                    .into());
                }
                JobStatus::Submitted | JobStatus::Running => {}
                JobStatus::Unrecognized(_) => {
                    warn!(job_id = %job_id, status = %status, "unexpected job status, waiting");
                }
            }

            if let Some(max_polls) = self.max_polls
                && attempts >= max_polls
            {
                return Err(JobError::PollLimitExceeded {
                    job_id: job_id.clone(),
                    attempts,
                    last_status: status.to_string(),
                }
                .into());
            }

            last_status = Some(status);
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Download every file of `output_list` into `download_dir`
    ///
    /// Creates `download_dir` (and its parents) first, even when there is
    /// nothing to download. Files are fetched one at a time and streamed to
    /// `download_dir/<name>`, replacing existing files. Returns the local
    /// paths in `output_list` order.
    ///
    /// # Errors
    /// - [`JobError::Download`] for a name that is not a plain file name, a
    ///   non-2xx response, or an interrupted transfer. Files written before
    ///   the failure stay on disk.
    pub async fn download_artifacts(
        &self,
        job_id: &JobId,
        output_list: &[String],
        download_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(download_dir).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "failed to create download directory '{}': {}",
                    download_dir.display(),
                    e
                ),
            ))
        })?;

        if let Some(bad) = output_list.iter().find(|name| !is_plain_file_name(name)) {
            return Err(JobError::Download {
                job_id: job_id.clone(),
                filename: bad.clone(),
                reason: "not a plain file name".to_string(),
            }
            .into());
        }

        if output_list.is_empty() {
            info!(job_id = %job_id, "no output files to download");
            return Ok(Vec::new());
        }

        let mut downloaded = Vec::with_capacity(output_list.len());
        for filename in output_list {
            let local_path = self
                .download_one(job_id, filename, download_dir)
                .await?;
            downloaded.push(local_path);
        }

        Ok(downloaded)
    }

    async fn download_one(
        &self,
        job_id: &JobId,
        filename: &str,
        download_dir: &Path,
    ) -> Result<PathBuf> {
        let download_error = |reason: String| JobError::Download {
            job_id: job_id.clone(),
            filename: filename.to_string(),
            reason,
        };

        let url = self.endpoint(&[RESULTS_PATH[0], RESULTS_PATH[1], job_id.as_str(), filename])?;
        info!(job_id = %job_id, filename, "downloading artifact");

        let mut response = self.get_with_retry(&url, Transfer::Streamed).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(download_error(format!("HTTP {}", status)).into());
        }

        let local_path = download_dir.join(filename);
        let mut file = tokio::fs::File::create(&local_path).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to create '{}': {}", local_path.display(), e),
            ))
        })?;

        // The body has no overall deadline; a stall longer than the request
        // timeout aborts it
        let mut bytes_written: u64 = 0;
        loop {
            let next = tokio::time::timeout(self.request_timeout, response.chunk())
                .await
                .map_err(|_| {
                    download_error(format!(
                        "no data received for {}s",
                        self.request_timeout.as_secs_f64()
                    ))
                })?
                .map_err(|e| download_error(format!("transfer interrupted: {}", e.without_url())))?;
            let Some(chunk) = next else {
                break;
            };
            file.write_all(&chunk).await?;
            bytes_written += chunk.len() as u64;
        }
        file.flush().await?;

        info!(
            job_id = %job_id,
            path = %local_path.display(),
            bytes = bytes_written,
            "artifact saved"
        );
        Ok(local_path)
    }

    /// Submit, wait for completion and download all outputs
    pub async fn submit_and_download(
        &self,
        input_file: &Path,
        memo: &str,
        download_dir: &Path,
        poll_interval: Duration,
    ) -> Result<JobOutcome> {
        let job_id = self.submit(input_file, memo).await?;
        let output_list = self.poll_until_complete(&job_id, poll_interval).await?;
        let files = self
            .download_artifacts(&job_id, &output_list, download_dir)
            .await?;
        Ok(JobOutcome { job_id, files })
    }

    /// GET with the token attached, retrying connection failures and timeouts
    async fn get_with_retry(&self, url: &Url, transfer: Transfer) -> Result<reqwest::Response> {
        with_retry(&self.retry, move || async move {
            let request = self
                .http
                .get(url.clone())
                .query(&[("token", self.token.as_str())]);
            match transfer {
                Transfer::Whole => request
                    .timeout(self.request_timeout)
                    .send()
                    .await
                    .map_err(|e| Error::Network(e.without_url())),
                Transfer::Streamed => tokio::time::timeout(self.request_timeout, request.send())
                    .await
                    .map_err(|_| {
                        Error::Io(std::io::Error::new(
                            std::io::ErrorKind::TimedOut,
                            "timed out waiting for response headers",
                        ))
                    })?
                    .map_err(|e| Error::Network(e.without_url())),
            }
        })
        .await
    }

    /// Append percent-encoded path segments to the API root
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                Error::config(
                    "api_base_url",
                    format!("{} cannot be used as a base URL", self.base_url),
                )
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Whether `name` is a single normal path component
///
/// Output names come from the service and are joined onto the download
/// directory, so separators, `.` and `..` are refused.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(first)), None) if first == OsStr::new(name)
    )
}

//! # build3d-dock
//!
//! Builds 3D ligand databases for a SMILES string with the TLDR build3d
//! service and docks them against a receptor with DOCK.
//!
//! ## Overview
//!
//! - [`client::JobClient`] submits the build3d job, polls it and downloads
//!   the results
//! - [`extraction`] unpacks the result tarballs and finds the `.db2.gz`
//!   ligand databases
//! - [`workspace`] lays out the dock directory and writes the index
//! - [`docking`] runs the docking program and collects its poses
//! - [`Pipeline`] runs all of the above in order
//!
//! ## Quick Start
//!
//! ```no_run
//! use build3d_dock::{Config, Pipeline};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_yaml_file(Path::new("config.yaml"))?;
//!     let pipeline = Pipeline::from_config(config)?;
//!
//!     let report = pipeline.run(Path::new(".")).await?;
//!     println!("poses written to {}", report.output_file.display());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// build3d job client
pub mod client;
/// Configuration types
pub mod config;
/// Docking step
pub mod docking;
/// Error types
pub mod error;
/// Archive extraction
pub mod extraction;
/// Phase orchestration
pub mod pipeline;
/// Retry logic with exponential backoff
pub mod retry;
/// Core types
pub mod types;
/// Dock directory layout
pub mod workspace;

// Re-export commonly used types
pub use client::JobClient;
pub use config::{ApiConfig, Config, DockingConfig, RetryConfig};
pub use docking::{CliDockingHandler, DockingHandler};
pub use error::{DockingError, Error, JobError, Result, ToExitCode};
pub use pipeline::{Pipeline, PipelineReport};
pub use types::{JobId, JobOutcome, JobStatus};

use std::path::Path;

/// Run the pipeline, stopping early on a termination signal
///
/// Listens for SIGTERM and Ctrl+C (SIGINT) on Unix, Ctrl+C elsewhere. On a
/// signal the run is dropped, which kills a running docking process, and
/// [`Error::Interrupted`] is returned.
///
/// # Example
///
/// ```no_run
/// use build3d_dock::{Config, Pipeline, run_with_shutdown};
/// use std::path::Path;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::from_yaml_file(Path::new("config.yaml"))?;
///     let pipeline = Pipeline::from_config(config)?;
///
///     run_with_shutdown(&pipeline, Path::new(".")).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(pipeline: &Pipeline, working_dir: &Path) -> Result<PipelineReport> {
    tokio::select! {
        result = pipeline.run(working_dir) => result,
        _ = wait_for_signal() => Err(Error::Interrupted),
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // SIGTERM registration can fail in restricted environments; Ctrl+C still works
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("received SIGTERM, stopping"),
                _ = ctrl_c() => tracing::info!("received SIGINT, stopping"),
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not register SIGTERM handler");
            ctrl_c().await;
            tracing::info!("received SIGINT, stopping");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c().await;
    tracing::info!("received Ctrl+C, stopping");
}

/// Resolves on Ctrl+C; never resolves if the handler cannot be installed
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "could not listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

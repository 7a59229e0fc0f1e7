//! End-to-end build3d and docking run
//!
//! [`Pipeline::run`] performs the phases in order, each with explicit
//! directories under the given working directory:
//!
//! 1. write `input.smi`
//! 2. submit the build3d job, wait for it and download its outputs
//! 3. extract the downloaded tarballs and collect the `.db2.gz` ligands
//! 4. link the receptor files and write `split_database_index`
//! 5. run the docking program
//! 6. copy the docked poses to the configured output file

use crate::client::JobClient;
use crate::config::Config;
use crate::docking::{CliDockingHandler, DockingHandler, clear_previous_output, collect_output};
use crate::error::{Error, Result, ToExitCode};
use crate::extraction::{detect_archive_type, extract_archives, find_ligand_files};
use crate::types::JobId;
use crate::workspace::{prepare_dock_dir, write_index, write_input_file};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// What a successful run produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineReport {
    /// The build3d job that built the ligands
    pub job_id: JobId,
    /// Downloaded artifacts, in the order the service listed them
    pub downloaded: Vec<PathBuf>,
    /// Files unpacked from the downloaded archives
    pub extracted: Vec<PathBuf>,
    /// Ligand databases handed to the docking program
    pub ligand_files: Vec<PathBuf>,
    /// The `split_database_index` file
    pub index_file: PathBuf,
    /// Final docked poses
    pub output_file: PathBuf,
}

/// Runs the whole build and dock sequence for one configuration
pub struct Pipeline {
    config: Config,
    client: JobClient,
    handler: Arc<dyn DockingHandler>,
}

impl Pipeline {
    /// Assemble a pipeline from its parts
    pub fn new(config: Config, client: JobClient, handler: Arc<dyn DockingHandler>) -> Self {
        Self {
            config,
            client,
            handler,
        }
    }

    /// Build the job client and locate the docking executable from `config`
    ///
    /// The executable is resolved here so a missing binary is reported before
    /// a job is submitted.
    pub fn from_config(config: Config) -> Result<Self> {
        let client = JobClient::from_config(&config)?;
        let handler = CliDockingHandler::resolve(&config.docking.dock_executable)?;
        Ok(Self::new(config, client, Arc::new(handler)))
    }

    /// Run every phase with paths resolved against `working_dir`
    ///
    /// # Errors
    /// - [`Error::NoArtifacts`] when the job failed or produced no files;
    ///   the job error itself is logged
    /// - [`Error::Extraction`] when a downloaded archive cannot be unpacked
    /// - [`Error::Docking`] when docking fails or leaves no output
    /// - [`Error::Io`] for filesystem failures
    pub async fn run(&self, working_dir: &Path) -> Result<PipelineReport> {
        let docking = &self.config.docking;
        let download_dir = working_dir.join(&docking.download_dir);
        let dock_dir = working_dir.join(&docking.dock_dir);
        let dockfiles_dir = std::path::absolute(working_dir.join(&docking.dockfiles_dir))?;
        let destination = working_dir.join(&docking.output_file);

        let input_file = write_input_file(working_dir, &self.config.input_smi)?;

        let outcome = match self
            .client
            .submit_and_download(
                &input_file,
                &self.config.api.memo,
                &download_dir,
                self.config.api.poll_interval,
            )
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, error_code = e.error_code(), "build3d job failed");
                return Err(Error::NoArtifacts);
            }
        };

        if outcome.files.is_empty() {
            error!(job_id = %outcome.job_id, "no files downloaded");
            return Err(Error::NoArtifacts);
        }
        info!(
            job_id = %outcome.job_id,
            files = outcome.files.len(),
            "build3d results downloaded"
        );

        let archives: Vec<PathBuf> = outcome
            .files
            .iter()
            .filter(|path| detect_archive_type(path).is_some())
            .cloned()
            .collect();
        let extracted = extract_archives(&archives, &download_dir).await?;

        let ligand_files = find_ligand_files(&download_dir)?;
        if ligand_files.is_empty() {
            warn!(dir = %download_dir.display(), "no ligand databases found");
        }

        let output_dir = prepare_dock_dir(&dock_dir, &dockfiles_dir)?;
        let index_file = write_index(&output_dir, &ligand_files)?;
        clear_previous_output(&output_dir)?;

        info!(handler = self.handler.name(), "starting docking");
        self.handler.run(&output_dir).await?;

        let output_file = collect_output(&output_dir, &destination)?;

        Ok(PipelineReport {
            job_id: outcome.job_id,
            downloaded: outcome.files,
            extracted,
            ligand_files,
            index_file,
            output_file,
        })
    }
}

//! Docking handler that runs an external docking executable

use super::traits::DockingHandler;
use crate::error::DockingError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

/// Runs the DOCK executable as a child process
///
/// The program is started without arguments; it reads `INDOCK` and
/// `split_database_index` from its working directory. Its stdout and stderr
/// go to the terminal. Dropping a running [`DockingHandler::run`] future
/// kills the process.
#[derive(Clone, Debug)]
pub struct CliDockingHandler {
    binary_path: PathBuf,
}

impl CliDockingHandler {
    /// Create a handler with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Locate the docking executable
    ///
    /// `configured` is used as-is when it names an existing file, otherwise it
    /// is looked up in PATH.
    ///
    /// # Errors
    ///
    /// Returns [`DockingError::ExecutableNotFound`] when neither lookup finds it.
    pub fn resolve(configured: &Path) -> crate::Result<Self> {
        if configured.is_file() {
            return Ok(Self::new(configured.to_path_buf()));
        }

        which::which(configured)
            .map(Self::new)
            .map_err(|_| {
                DockingError::ExecutableNotFound {
                    path: configured.to_path_buf(),
                }
                .into()
            })
    }

    /// Path of the executable this handler runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

#[async_trait]
impl DockingHandler for CliDockingHandler {
    async fn run(&self, output_dir: &Path) -> crate::Result<()> {
        info!(
            binary = %self.binary_path.display(),
            dir = %output_dir.display(),
            "running docking"
        );

        let status = Command::new(&self.binary_path)
            .current_dir(output_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| DockingError::ExternalTool {
                path: self.binary_path.clone(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            warn!(code = ?status.code(), "docking exited unsuccessfully");
            return Err(DockingError::DockingFailed {
                code: status.code(),
            }
            .into());
        }

        info!("docking finished");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cli-dock"
    }
}

//! Trait for running the docking step

use async_trait::async_trait;
use std::path::Path;

/// Runs a docking calculation in a prepared output directory
///
/// The directory contains `INDOCK` and `split_database_index`; a successful
/// run leaves `test.mol2.gz` next to them.
///
/// # Examples
///
/// ```no_run
/// use build3d_dock::docking::{CliDockingHandler, DockingHandler};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let handler = CliDockingHandler::resolve(Path::new("dock64"))?;
/// handler.run(Path::new("dock/output")).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait DockingHandler: Send + Sync {
    /// Run docking with `output_dir` as the working directory
    ///
    /// # Errors
    ///
    /// Returns an error if the docking program cannot be started or reports
    /// failure.
    async fn run(&self, output_dir: &Path) -> crate::Result<()>;

    /// Name of this handler, for logging
    fn name(&self) -> &'static str;
}

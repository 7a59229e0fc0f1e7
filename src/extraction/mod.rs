//! Archive extraction for downloaded job results
//!
//! build3d delivers its ligands as tarballs of `.db2.gz` files. This module
//! unpacks them and locates the ligand files for the docking index.

mod shared;
mod tarball;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

// Re-exports
pub use shared::{LIGAND_SUFFIX, detect_archive_type, find_ligand_files};
pub use tarball::TarExtractor;

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::info;

/// Extract one archive into `dest_path`
///
/// Detects the format from the file name and unpacks on a blocking thread.
///
/// # Returns
/// * `Ok(Vec<PathBuf>)` - Regular files written by the extraction
/// * `Err(Error::Extraction)` - Unknown format, corrupt archive, or the
///   extraction task panicked
pub async fn extract_archive(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
    let archive_type = detect_archive_type(archive_path).ok_or_else(|| Error::Extraction {
        archive: archive_path.to_path_buf(),
        reason: format!("unknown archive type for file: {}", archive_path.display()),
    })?;

    info!(?archive_path, ?archive_type, "extracting archive");

    let archive_owned = archive_path.to_path_buf();
    let dest_owned = dest_path.to_path_buf();
    spawn_blocking(move || TarExtractor::try_extract(&archive_owned, archive_type, &dest_owned))
        .await
        .map_err(|e| Error::Extraction {
            archive: archive_path.to_path_buf(),
            reason: format!("extraction task panicked: {}", e),
        })?
}

/// Extract every archive, in order, into `dest_path`
///
/// Stops at the first failure.
pub async fn extract_archives(archives: &[PathBuf], dest_path: &Path) -> Result<Vec<PathBuf>> {
    let mut all_files = Vec::new();
    for archive in archives {
        let files = extract_archive(archive, dest_path).await?;
        all_files.extend(files);
    }

    info!(
        archives = archives.len(),
        total_files = all_files.len(),
        dest = %dest_path.display(),
        "extraction finished"
    );
    Ok(all_files)
}

//! Collecting the docked poses after a run

use crate::error::{DockingError, Error, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Compressed poses written by DOCK
pub const DOCKED_POSES_GZ: &str = "test.mol2.gz";

/// Decompressed poses, kept next to the compressed file
pub const DOCKED_POSES: &str = "test.mol2";

/// Remove poses left in `output_dir` by an earlier run
///
/// Called before docking so [`collect_output`] only ever sees poses written
/// by the current run.
pub fn clear_previous_output(output_dir: &Path) -> Result<()> {
    for name in [DOCKED_POSES_GZ, DOCKED_POSES] {
        let path = output_dir.join(name);
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "removed poses from earlier run"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("failed to remove '{}': {}", path.display(), e),
                )));
            }
        }
    }
    Ok(())
}

/// Decompress `test.mol2.gz` from `output_dir` and copy it to `destination`
///
/// `test.mol2` is also left in `output_dir`. Parent directories of
/// `destination` are created if needed.
///
/// # Errors
///
/// - [`DockingError::OutputMissing`] when the run left no `test.mol2.gz`
/// - [`Error::Extraction`] when it is not valid gzip
pub fn collect_output(output_dir: &Path, destination: &Path) -> Result<PathBuf> {
    let compressed = output_dir.join(DOCKED_POSES_GZ);
    if !compressed.is_file() {
        return Err(DockingError::OutputMissing { path: compressed }.into());
    }

    let decompressed = output_dir.join(DOCKED_POSES);
    let mut decoder = GzDecoder::new(BufReader::new(File::open(&compressed)?));
    let mut out = File::create(&decompressed)?;
    std::io::copy(&mut decoder, &mut out).map_err(|e| Error::Extraction {
        archive: compressed.clone(),
        reason: format!("failed to decompress: {}", e),
    })?;

    if let Some(parent) = destination.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(&decompressed, destination).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!(
                "failed to copy '{}' to '{}': {}",
                decompressed.display(),
                destination.display(),
                e
            ),
        ))
    })?;

    info!(path = %destination.display(), "docked poses saved");
    Ok(destination.to_path_buf())
}

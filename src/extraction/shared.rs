use crate::error::{Error, Result};
use crate::types::ArchiveType;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Suffix of the ligand database files produced by build3d
pub const LIGAND_SUFFIX: &str = ".db2.gz";

/// Detect archive type by file name
///
/// Returns `None` for anything that is not `.tar`, `.tar.gz` or `.tgz`
/// (case-insensitive).
pub fn detect_archive_type(path: &Path) -> Option<ArchiveType> {
    let name = path.file_name()?.to_str()?.to_lowercase();

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Some(ArchiveType::TarGz)
    } else if name.ends_with(".tar") {
        Some(ArchiveType::Tar)
    } else {
        None
    }
}

/// Find every `.db2.gz` file below `dir`
///
/// Walks the tree recursively without following directory symlinks and
/// returns the matches sorted by path.
pub fn find_ligand_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "failed to walk '{}': {}",
                dir.display(),
                e
            )))
        })?;

        if entry.file_type().is_dir() {
            continue;
        }

        if entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(LIGAND_SUFFIX))
        {
            found.push(entry.into_path());
        }
    }

    found.sort();
    debug!(dir = %dir.display(), count = found.len(), "ligand files found");
    Ok(found)
}

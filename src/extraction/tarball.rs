use crate::error::{Error, Result};
use crate::types::ArchiveType;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Archive extractor for plain and gzip-compressed tarballs
pub struct TarExtractor;

impl TarExtractor {
    /// Extract a tarball into `dest_path`, returning the regular files written
    ///
    /// Entries whose path would land outside `dest_path` are skipped.
    /// Existing files are overwritten.
    pub fn try_extract(
        archive_path: &Path,
        archive_type: ArchiveType,
        dest_path: &Path,
    ) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?archive_type, ?dest_path, "attempting tar extraction");

        std::fs::create_dir_all(dest_path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to create destination '{}': {}", dest_path.display(), e),
            ))
        })?;

        let file = File::open(archive_path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to open archive '{}': {}", archive_path.display(), e),
            ))
        })?;
        let reader = BufReader::new(file);

        match archive_type {
            ArchiveType::Tar => Self::unpack_entries(reader, archive_path, dest_path),
            ArchiveType::TarGz => {
                Self::unpack_entries(GzDecoder::new(reader), archive_path, dest_path)
            }
        }
    }

    fn unpack_entries<R: Read>(
        reader: R,
        archive_path: &Path,
        dest_path: &Path,
    ) -> Result<Vec<PathBuf>> {
        let failed = |reason: String| Error::Extraction {
            archive: archive_path.to_path_buf(),
            reason,
        };

        let mut archive = tar::Archive::new(reader);
        let entries = archive
            .entries()
            .map_err(|e| failed(format!("failed to read tar archive: {}", e)))?;

        let mut extracted = Vec::new();
        for entry in entries {
            let mut entry = entry.map_err(|e| failed(format!("failed to read tar entry: {}", e)))?;
            let entry_path = entry
                .path()
                .map_err(|e| failed(format!("invalid entry path: {}", e)))?
                .into_owned();
            let is_file = entry.header().entry_type().is_file();

            let unpacked = entry
                .unpack_in(dest_path)
                .map_err(|e| failed(format!("failed to extract {}: {}", entry_path.display(), e)))?;

            if !unpacked {
                warn!(?archive_path, entry = %entry_path.display(), "skipping entry with unsafe path");
                continue;
            }
            if is_file {
                extracted.push(dest_path.join(&entry_path));
            }
        }

        info!(
            ?archive_path,
            extracted_count = extracted.len(),
            "tar extraction successful"
        );
        Ok(extracted)
    }
}

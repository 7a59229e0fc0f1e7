//! Files and directories the docking run needs
//!
//! Layout under the dock directory:
//!
//! ```text
//! dock/
//! ├── dockfiles -> <dockfiles_dir>
//! └── output/
//!     ├── INDOCK -> <dockfiles_dir>/INDOCK
//!     └── split_database_index
//! ```
//!
//! Every function takes the directories it works in explicitly; the process
//! working directory is never changed.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the ligand input file submitted to build3d
pub const INPUT_FILE_NAME: &str = "input.smi";

/// Name of the file listing ligand databases for the docking program
pub const INDEX_FILE_NAME: &str = "split_database_index";

/// Subdirectory of the dock directory the docking program runs in
pub const OUTPUT_DIR_NAME: &str = "output";

/// Write `input.smi` into `dir` with the SMILES string named `ligand`
///
/// The file holds exactly `"{smiles} ligand"`, without a trailing newline.
pub fn write_input_file(dir: &Path, smiles: &str) -> Result<PathBuf> {
    let path = dir.join(INPUT_FILE_NAME);
    std::fs::write(&path, format!("{} ligand", smiles)).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("failed to write '{}': {}", path.display(), e),
        ))
    })?;
    debug!(path = %path.display(), "input file written");
    Ok(path)
}

/// Create the dock directory tree and link the receptor files into it
///
/// Links that already exist are replaced so a run can be repeated in the
/// same working directory. Returns the output directory the docking program
/// runs in.
pub fn prepare_dock_dir(dock_dir: &Path, dockfiles_dir: &Path) -> Result<PathBuf> {
    let output_dir = dock_dir.join(OUTPUT_DIR_NAME);
    std::fs::create_dir_all(&output_dir).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("failed to create '{}': {}", output_dir.display(), e),
        ))
    })?;

    replace_symlink(dockfiles_dir, &dock_dir.join("dockfiles"))?;
    replace_symlink(&dockfiles_dir.join("INDOCK"), &output_dir.join("INDOCK"))?;

    info!(
        dock_dir = %dock_dir.display(),
        dockfiles = %dockfiles_dir.display(),
        "dock directory prepared"
    );
    Ok(output_dir)
}

/// Write `split_database_index` listing each ligand file as an absolute path
pub fn write_index(output_dir: &Path, ligand_files: &[PathBuf]) -> Result<PathBuf> {
    let mut content = String::new();
    for file in ligand_files {
        let absolute = std::path::absolute(file)?;
        content.push_str(&absolute.to_string_lossy());
        content.push('\n');
    }

    let path = output_dir.join(INDEX_FILE_NAME);
    std::fs::write(&path, content).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("failed to write '{}': {}", path.display(), e),
        ))
    })?;

    info!(path = %path.display(), entries = ligand_files.len(), "index written");
    Ok(path)
}

/// Point `link` at `target`, replacing an existing symlink
///
/// Anything other than a symlink already at `link` is left alone and
/// reported as an error.
#[cfg(unix)]
fn replace_symlink(target: &Path, link: &Path) -> Result<()> {
    match std::fs::symlink_metadata(link) {
        Ok(meta) if meta.file_type().is_symlink() => {
            std::fs::remove_file(link)?;
        }
        Ok(_) => {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("'{}' exists and is not a symlink", link.display()),
            )));
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    std::os::unix::fs::symlink(target, link).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!(
                "failed to link '{}' -> '{}': {}",
                link.display(),
                target.display(),
                e
            ),
        ))
    })
}

#[cfg(not(unix))]
fn replace_symlink(_target: &Path, link: &Path) -> Result<()> {
    Err(Error::NotSupported(format!(
        "cannot create symlink {}: symlinks require a Unix platform",
        link.display()
    )))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn input_file_holds_smiles_and_ligand_name() {
        let dir = TempDir::new().unwrap();
        let path = write_input_file(dir.path(), "CC(=O)Oc1ccccc1C(=O)O").unwrap();

        assert_eq!(path, dir.path().join("input.smi"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "CC(=O)Oc1ccccc1C(=O)O ligand"
        );
    }

    #[test]
    fn input_file_is_replaced_on_rerun() {
        let dir = TempDir::new().unwrap();
        write_input_file(dir.path(), "CCCCCCCCCC").unwrap();
        let path = write_input_file(dir.path(), "CCO").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "CCO ligand");
    }

    #[test]
    fn index_lists_absolute_paths_one_per_line() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            dir.path().join("build3d/a.db2.gz"),
            dir.path().join("build3d/sub/b.db2.gz"),
        ];

        let index = write_index(dir.path(), &files).unwrap();

        assert_eq!(index, dir.path().join("split_database_index"));
        let expected = format!(
            "{}\n{}\n",
            files[0].to_string_lossy(),
            files[1].to_string_lossy()
        );
        assert_eq!(std::fs::read_to_string(index).unwrap(), expected);
    }

    #[test]
    fn index_makes_relative_paths_absolute() {
        let dir = TempDir::new().unwrap();
        let index = write_index(dir.path(), &[PathBuf::from("rel/x.db2.gz")]).unwrap();

        let content = std::fs::read_to_string(index).unwrap();
        let line = content.lines().next().unwrap();
        assert!(Path::new(line).is_absolute(), "{line} should be absolute");
        assert!(line.ends_with("rel/x.db2.gz"));
    }

    #[test]
    fn empty_index_is_an_empty_file() {
        let dir = TempDir::new().unwrap();
        let index = write_index(dir.path(), &[]).unwrap();
        assert_eq!(std::fs::read_to_string(index).unwrap(), "");
    }

    #[cfg(unix)]
    #[test]
    fn prepare_dock_dir_links_dockfiles_and_indock() {
        let dir = TempDir::new().unwrap();
        let dockfiles = dir.path().join("receptor");
        std::fs::create_dir_all(&dockfiles).unwrap();
        std::fs::write(dockfiles.join("INDOCK"), "DOCK 3.8 parameter").unwrap();
        let dock_dir = dir.path().join("dock");

        let output_dir = prepare_dock_dir(&dock_dir, &dockfiles).unwrap();

        assert_eq!(output_dir, dock_dir.join("output"));
        assert!(output_dir.is_dir());
        assert_eq!(
            std::fs::read_link(dock_dir.join("dockfiles")).unwrap(),
            dockfiles
        );
        assert_eq!(
            std::fs::read_link(output_dir.join("INDOCK")).unwrap(),
            dockfiles.join("INDOCK")
        );
        assert_eq!(
            std::fs::read_to_string(output_dir.join("INDOCK")).unwrap(),
            "DOCK 3.8 parameter"
        );
    }

    #[cfg(unix)]
    #[test]
    fn prepare_dock_dir_twice_replaces_links() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        std::fs::create_dir_all(&first).unwrap();
        std::fs::create_dir_all(&second).unwrap();
        let dock_dir = dir.path().join("dock");

        prepare_dock_dir(&dock_dir, &first).unwrap();
        prepare_dock_dir(&dock_dir, &second).unwrap();

        assert_eq!(std::fs::read_link(dock_dir.join("dockfiles")).unwrap(), second);
        assert_eq!(
            std::fs::read_link(dock_dir.join("output/INDOCK")).unwrap(),
            second.join("INDOCK")
        );
    }

    #[cfg(unix)]
    #[test]
    fn prepare_dock_dir_refuses_to_replace_real_directory() {
        let dir = TempDir::new().unwrap();
        let dock_dir = dir.path().join("dock");
        std::fs::create_dir_all(dock_dir.join("dockfiles")).unwrap();

        let err = prepare_dock_dir(&dock_dir, &dir.path().join("receptor")).unwrap_err();
        match err {
            Error::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::AlreadyExists),
            other => panic!("expected Io error, got {other:?}"),
        }
        assert!(dock_dir.join("dockfiles").is_dir());
    }
}

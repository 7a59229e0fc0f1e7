use crate::error::Error;
use crate::extraction::*;
use crate::types::ArchiveType;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn tar_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = ::tar::Builder::new(Vec::new());
    for (name, content) in files {
        let mut header = ::tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *content).unwrap();
    }
    builder.into_inner().unwrap()
}

fn create_tar(path: &Path, files: &[(&str, &[u8])]) {
    std::fs::write(path, tar_bytes(files)).unwrap();
}

fn create_tar_gz(path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    std::io::Write::write_all(&mut encoder, &tar_bytes(files)).unwrap();
    encoder.finish().unwrap();
}

// ---------------------------------------------------------------------------
// Archive type detection
// ---------------------------------------------------------------------------

#[test]
fn detects_tarball_types_by_name() {
    assert_eq!(detect_archive_type(Path::new("a.tar")), Some(ArchiveType::Tar));
    assert_eq!(detect_archive_type(Path::new("A.TAR")), Some(ArchiveType::Tar));
    assert_eq!(
        detect_archive_type(Path::new("/x/r.tar.gz")),
        Some(ArchiveType::TarGz)
    );
    assert_eq!(detect_archive_type(Path::new("r.tgz")), Some(ArchiveType::TarGz));
    assert_eq!(detect_archive_type(Path::new("ligand.db2.gz")), None);
    assert_eq!(detect_archive_type(Path::new("results.zip")), None);
    assert_eq!(detect_archive_type(Path::new("tar")), None);
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

#[test]
fn try_extract_plain_tar_returns_written_files() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("r.tar");
    create_tar(
        &archive,
        &[
            ("1/ligand_a.db2.gz", b"aaa"),
            ("1/ligand_b.db2.gz", b"bbb"),
            ("log.txt", b"done"),
        ],
    );
    let dest = dir.path().join("out");

    let files = TarExtractor::try_extract(&archive, ArchiveType::Tar, &dest).unwrap();

    assert_eq!(
        files,
        vec![
            dest.join("1/ligand_a.db2.gz"),
            dest.join("1/ligand_b.db2.gz"),
            dest.join("log.txt"),
        ]
    );
    assert_eq!(std::fs::read(dest.join("1/ligand_b.db2.gz")).unwrap(), b"bbb");
}

#[test]
fn try_extract_gzip_tar() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("r.tar.gz");
    create_tar_gz(&archive, &[("x.db2.gz", b"compressed payload")]);

    let files = TarExtractor::try_extract(&archive, ArchiveType::TarGz, dir.path()).unwrap();

    assert_eq!(files, vec![dir.path().join("x.db2.gz")]);
    assert_eq!(
        std::fs::read(dir.path().join("x.db2.gz")).unwrap(),
        b"compressed payload"
    );
}

#[test]
fn try_extract_overwrites_existing_files() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("x.db2.gz"), "old").unwrap();
    let archive = dir.path().join("r.tar");
    create_tar(&archive, &[("x.db2.gz", b"new")]);

    TarExtractor::try_extract(&archive, ArchiveType::Tar, dir.path()).unwrap();
    assert_eq!(std::fs::read(dir.path().join("x.db2.gz")).unwrap(), b"new");
}

#[test]
fn try_extract_corrupt_gzip_is_extraction_error() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("broken.tar.gz");
    std::fs::write(&archive, b"definitely not gzip data").unwrap();

    let err = TarExtractor::try_extract(&archive, ArchiveType::TarGz, dir.path()).unwrap_err();
    match err {
        Error::Extraction { archive: a, .. } => assert_eq!(a, archive),
        other => panic!("expected Extraction error, got {other:?}"),
    }
}

#[test]
fn try_extract_missing_archive_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = TarExtractor::try_extract(
        &dir.path().join("missing.tar"),
        ArchiveType::Tar,
        dir.path(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Io(_)), "got {err:?}");
}

#[tokio::test]
async fn extract_archive_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("results.zip");
    std::fs::write(&archive, b"PK").unwrap();

    let err = extract_archive(&archive, dir.path()).await.unwrap_err();
    match err {
        Error::Extraction { reason, .. } => assert!(reason.contains("unknown archive type")),
        other => panic!("expected Extraction error, got {other:?}"),
    }
}

#[tokio::test]
async fn extract_archives_unpacks_all_in_order() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("a.tar");
    let second = dir.path().join("b.tar.gz");
    create_tar(&first, &[("a/1.db2.gz", b"1")]);
    create_tar_gz(&second, &[("b/2.db2.gz", b"2")]);

    let files = extract_archives(&[first, second], dir.path()).await.unwrap();

    assert_eq!(
        files,
        vec![dir.path().join("a/1.db2.gz"), dir.path().join("b/2.db2.gz")]
    );
}

#[tokio::test]
async fn extract_archives_stops_at_first_failure() {
    let dir = TempDir::new().unwrap();
    let bad = dir.path().join("bad.tgz");
    std::fs::write(&bad, b"garbage").unwrap();
    let good = dir.path().join("good.tar");
    create_tar(&good, &[("never.db2.gz", b"x")]);

    let result = extract_archives(&[bad, good], dir.path()).await;

    assert!(result.is_err());
    assert!(!dir.path().join("never.db2.gz").exists());
}

#[tokio::test]
async fn extract_archives_with_no_archives_is_empty() {
    let dir = TempDir::new().unwrap();
    let files = extract_archives(&[], dir.path()).await.unwrap();
    assert!(files.is_empty());
}

// ---------------------------------------------------------------------------
// Ligand discovery
// ---------------------------------------------------------------------------

#[test]
fn find_ligand_files_walks_recursively_and_sorts() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("b/deep")).unwrap();
    std::fs::create_dir_all(root.join("a")).unwrap();
    for path in [
        "b/deep/z.db2.gz",
        "a/y.db2.gz",
        "x.db2.gz",
        "a/notes.db2",
        "a/other.gz",
        "r.tar.gz",
    ] {
        std::fs::write(root.join(path), "x").unwrap();
    }
    // a directory with the suffix is not a ligand file
    std::fs::create_dir_all(root.join("dir.db2.gz")).unwrap();

    let found = find_ligand_files(root).unwrap();

    let expected: Vec<PathBuf> = ["a/y.db2.gz", "b/deep/z.db2.gz", "x.db2.gz"]
        .iter()
        .map(|p| root.join(p))
        .collect();
    assert_eq!(found, expected);
}

#[test]
fn find_ligand_files_in_empty_directory() {
    let dir = TempDir::new().unwrap();
    assert!(find_ligand_files(dir.path()).unwrap().is_empty());
}

#[test]
fn find_ligand_files_missing_directory_is_io_error() {
    let err = find_ligand_files(Path::new("/nonexistent/build3d")).unwrap_err();
    assert!(matches!(err, Error::Io(_)), "got {err:?}");
}

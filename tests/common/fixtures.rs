//! Archive and workspace fixtures

use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;

/// Ligand databases packed into [`ligand_tarball`]
pub const LIGAND_ENTRIES: &[&str] = &[
    "H17P050/b.db2.gz",
    "H17P050/a.db2.gz",
    "H17P050/build.log",
];

/// Poses the stand-in docking run leaves behind
pub const POSES: &[u8] = b"@<TRIPOS>MOLECULE\nligand\n";

/// A gzip-compressed tarball shaped like a build3d result
pub fn ligand_tarball() -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for name in LIGAND_ENTRIES {
        let data = format!("content of {name}");
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, data.as_bytes())
            .expect("append tar entry");
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip")
}

/// Create a receptor directory with an `INDOCK` file
pub fn dockfiles(dir: &Path) -> PathBuf {
    let dockfiles = dir.join("dockfiles");
    std::fs::create_dir_all(&dockfiles).expect("create dockfiles");
    std::fs::write(dockfiles.join("INDOCK"), "DOCK 3.8 parameter\n").expect("write INDOCK");
    dockfiles
}

/// Path of a stand-in docking program that writes [`POSES`]
///
/// The script checks that it runs inside a prepared `dock/output` and copies
/// compressed poses into `test.mol2.gz`. It is created once per test binary.
pub fn docking_stand_in() -> String {
    static STAND_IN: OnceLock<TempDir> = OnceLock::new();
    let dir = STAND_IN.get_or_init(|| {
        let dir = TempDir::new().expect("create stand-in dir");
        let file = std::fs::File::create(dir.path().join("poses.mol2.gz")).expect("create poses");
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(POSES).expect("write poses");
        encoder.finish().expect("finish poses");

        let script = dir.path().join("dock64");
        std::fs::write(
            &script,
            "#!/bin/sh\n\
             test -f INDOCK && test -f split_database_index || exit 2\n\
             cp \"$(dirname \"$0\")/poses.mol2.gz\" test.mol2.gz\n",
        )
        .expect("write stand-in");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
            .expect("chmod stand-in");
        dir
    });
    dir.path().join("dock64").display().to_string()
}

/// YAML configuration pointing at a mock server
///
/// Values are quoted so executables such as `true` stay strings.
pub fn config_yaml(api_base_url: &str, dockfiles_dir: &Path, dock_executable: &str) -> String {
    format!(
        "input_smi: \"CC(=O)Oc1ccccc1C(=O)O\"\n\
         API_TOKEN: test-token\n\
         dockfiles_dir: \"{}\"\n\
         dock_executable: \"{}\"\n\
         api_base_url: \"{}\"\n\
         memo: integration test\n\
         poll_interval: 1\n\
         max_polls: 5\n\
         retry:\n  max_attempts: 0\n",
        dockfiles_dir.display(),
        dock_executable,
        api_base_url,
    )
}

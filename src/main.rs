use build3d_dock::{Config, Pipeline, ToExitCode, run_with_shutdown};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Build 3D ligands with TLDR build3d and dock them with DOCK
struct Args {
    /// YAML configuration file
    #[arg(long, value_name = "PATH", default_value = "config.yaml")]
    config: PathBuf,

    /// Directory the run reads and writes its files in
    #[arg(long = "working-dir", value_name = "PATH", default_value = ".")]
    working_dir: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("build3d_dock=info")),
        )
        .init();

    let args = Args::parse();

    match run(&args.config, &args.working_dir).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, error_code = e.error_code(), "run failed");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(config_path: &Path, working_dir: &Path) -> build3d_dock::Result<()> {
    let config = Config::from_yaml_file(config_path)?;
    info!(config = %config_path.display(), "configuration loaded");

    let pipeline = Pipeline::from_config(config)?;
    let report = run_with_shutdown(&pipeline, working_dir).await?;

    info!(
        job_id = %report.job_id,
        ligands = report.ligand_files.len(),
        output = %report.output_file.display(),
        "docking complete"
    );
    Ok(())
}

//! Command-line interface implementation

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use crate::config::{find_config_from, load_config};
use crate::pipeline::{Pipeline, PipelineContext, TaskName};

/// Exit codes
const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_INVALID_ARGS: u8 = 2;

/// Sitepack - asset build pipeline and dev server for single-page apps
#[derive(Parser)]
#[command(name = "sitepack")]
#[command(about = "Sitepack - asset build pipeline and dev server for single-page apps")]
#[command(version)]
pub struct Cli {
    /// Task to run (see the task registry; defaults to 'default')
    pub task: Option<String>,

    /// Deploy mode: minify script and vendor bundles
    #[arg(long)]
    pub deploy: bool,

    /// Project root (defaults to walking up from the current directory
    /// looking for sitepack.toml)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let task = match TaskName::from_str(cli.task.as_deref().unwrap_or("default")) {
        Ok(task) => task,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    // Resolve project root and configuration
    let start_dir = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    let (config, project_root) = match find_config_from(start_dir.clone()) {
        Some(config_path) => {
            if cli.verbose {
                println!("Using config: {}", config_path.display());
            }
            let config = match load_config(Some(&config_path)) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error loading config: {}", e);
                    return ExitCode::from(EXIT_ERROR);
                }
            };
            let root = config_path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or(start_dir);
            (config, root)
        }
        None => {
            if cli.verbose {
                println!("No sitepack.toml found, using defaults");
            }
            (crate::config::default_config(), start_dir)
        }
    };

    let ctx = PipelineContext::new(config, project_root)
        .with_deploy(cli.deploy)
        .with_verbose(cli.verbose);

    let pipeline = match Pipeline::standard(ctx) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let report = pipeline.run(task);
    println!("{}", report.summary());

    // A run that started a server or watcher stays alive until the
    // process is terminated
    pipeline.context().services().join_all();

    if report.is_success() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

//! lomanager - command-line front end
//!
//! Lists installed and available LibreOffice packages, previews a selection
//! and applies it, either from the network or from a local copy.

mod commands;
mod error;
mod progress;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;
use lomanager::app::{AppConfig, CLIENT_VERSION};
use lomanager::config::ConfigFile;
use lomanager::log::init_logging;
use tracing::info;

use crate::commands::{ApplyOptions, SelectionArgs};
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "lomanager")]
#[command(version, about = "LibreOffice package manager", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read configuration from FILE instead of the default locations
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show installed and available packages
    Status {
        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what a selection would change, without changing anything
    Plan {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Select packages and apply the changes
    Apply {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Save downloaded packages for later offline installs
        #[arg(long)]
        keep_packages: bool,

        /// Also save the Java package when it is already installed
        #[arg(long, requires = "keep_packages")]
        force_java_download: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Install packages from a local copy directory
    LocalCopy {
        /// Directory holding Java_rpms/, LibreOffice-core_tgzs/,
        /// LibreOffice-langs_tgzs/ and Clipart_rpms/
        dir: PathBuf,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let file = match &cli.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load().unwrap_or_else(|e| {
            eprintln!("{} {}, using defaults", style("Warning:").yellow(), e);
            ConfigFile::default()
        }),
    };
    let config = AppConfig::from_config_file(&file);

    let _guard = init_logging(&config.log_dir, cli.verbose)?;
    info!(version = CLIENT_VERSION, "lomanager starting");

    match cli.command {
        Commands::Status { json } => commands::status::run(config, json),
        Commands::Plan { selection, json } => commands::plan::run(config, &selection, json),
        Commands::Apply {
            selection,
            keep_packages,
            force_java_download,
            yes,
        } => commands::apply::run(
            config,
            &selection,
            ApplyOptions {
                keep_packages,
                force_java_download,
                assume_yes: yes,
            },
        ),
        Commands::LocalCopy { dir, yes } => commands::local_copy::run(config, &dir, yes),
    }
}

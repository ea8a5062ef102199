//! cudaup - side-by-side CUDA toolkit and cuDNN installer
//!
//! Installs NVIDIA CUDA toolkits and the matching cuDNN release into
//! isolated, version-named directories without touching the driver or any
//! prior installation. Interrupted installs resume: progress is always
//! re-derived from the filesystem, never from a persisted marker.

use clap::Parser;

mod archive;
mod catalog;
mod cli;
mod commands;
mod context;
mod cudnn;
mod driver;
mod error;
mod executor;
mod fsutil;
mod layout;
mod preflight;
mod probe;
mod progress;
mod publisher;
mod runfile;
mod stager;
mod workarea;

use cli::{Cli, Commands};
use error::CudaupError;

fn main() {
    let cli = Cli::parse();
    let layout = cli.layout();

    let result = match cli.command {
        Commands::Install(args) => commands::install::run(layout, args),
        Commands::List(args) => commands::list::run(layout, args),
        Commands::Status(args) => commands::status::run(layout, args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    match result {
        Ok(()) => {}
        // Declining a prompt is an operator choice, not a failure.
        Err(CudaupError::Cancelled) => {
            println!("Cancelled.");
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

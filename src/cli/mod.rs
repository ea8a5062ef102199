//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - install: Install command arguments
//! - list: List command arguments
//! - status: Status command arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod completions;
pub mod install;
pub mod list;
pub mod status;

pub use completions::CompletionsArgs;
pub use install::InstallArgs;
pub use list::ListArgs;
pub use status::StatusArgs;

use crate::layout::Layout;

/// cudaup - side-by-side CUDA toolkit installer
#[derive(Parser, Debug)]
#[command(
    name = "cudaup",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Side-by-side CUDA toolkit and cuDNN installer with resumable installs",
    long_about = "cudaup installs NVIDIA CUDA toolkits and the matching cuDNN release into \
                  isolated /usr/local/cuda-<family> directories, side by side, without touching \
                  the driver or any prior installation. Interrupted installs resume from where \
                  they stopped: progress is re-derived from the filesystem on every run.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  cudaup install 12.6.2                 \x1b[90m# Install CUDA 12.6 + matching cuDNN\x1b[0m\n   \
                  cudaup install                        \x1b[90m# Pick a version from the catalog menu\x1b[0m\n   \
                  cudaup install 13.1.0 --family 13.1 \\\n     --toolkit-source ./cuda_13.1.0_linux.run \\\n     --cudnn-source ./cudnn.tar.xz        \x1b[90m# Install a version the catalog predates\x1b[0m\n   \
                  cudaup status 12.6.2                  \x1b[90m# How far did the last attempt get?\x1b[0m\n   \
                  cudaup list                           \x1b[90m# Catalog versions and their stages\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Parent directory of the cuda-<family> install roots
    #[arg(
        long,
        global = true,
        env = "CUDAUP_PREFIX",
        default_value = "/usr/local"
    )]
    pub prefix: PathBuf,

    /// Where switcher scripts go (defaults to <prefix>/bin)
    #[arg(long, global = true, hide = true, env = "CUDAUP_BIN_DIR")]
    pub bin_dir: Option<PathBuf>,

    /// Parent of ld.so.conf.d/ and profile.d/ (defaults to /etc)
    #[arg(long, global = true, hide = true, env = "CUDAUP_ETC_DIR")]
    pub etc_dir: Option<PathBuf>,

    /// Work root holding per-run scratch directories
    #[arg(long, global = true, hide = true, env = "CUDAUP_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn layout(&self) -> Layout {
        Layout::new(
            self.prefix.clone(),
            self.bin_dir.clone(),
            self.etc_dir.clone(),
            self.work_dir.clone(),
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install a CUDA toolkit and its matching cuDNN release
    Install(InstallArgs),

    /// List catalog versions and their installation stage
    List(ListArgs),

    /// Show the classified stage and evidence for one version
    Status(StatusArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_list() {
        let cli = Cli::try_parse_from(["cudaup", "list"]).unwrap();
        assert!(matches!(cli.command, Commands::List(_)));
    }

    #[test]
    fn test_cli_parsing_install_with_version() {
        let cli = Cli::try_parse_from(["cudaup", "install", "12.6.2"]).unwrap();
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.version, Some("12.6.2".to_string()));
                assert!(!args.allow_unsupported_driver);
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_parsing_install_no_version() {
        let cli = Cli::try_parse_from(["cudaup", "install"]).unwrap();
        match cli.command {
            Commands::Install(args) => assert_eq!(args.version, None),
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_parsing_install_overrides() {
        let cli = Cli::try_parse_from([
            "cudaup",
            "install",
            "13.1.0",
            "--family",
            "13.1",
            "--toolkit-source",
            "./cuda.run",
            "--cudnn-source",
            "./cudnn.tar.xz",
            "--cudnn-version",
            "9.13.0.1",
            "--min-driver",
            "590.00",
            "--allow-unsupported-driver",
        ])
        .unwrap();
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.family.as_deref(), Some("13.1"));
                assert_eq!(args.toolkit_source.as_deref(), Some("./cuda.run"));
                assert_eq!(args.cudnn_source.as_deref(), Some("./cudnn.tar.xz"));
                assert_eq!(args.cudnn_version.as_deref(), Some("9.13.0.1"));
                assert_eq!(args.min_driver.as_deref(), Some("590.00"));
                assert!(args.allow_unsupported_driver);
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_parsing_status() {
        let cli = Cli::try_parse_from(["cudaup", "status", "12.6.2"]).unwrap();
        match cli.command {
            Commands::Status(args) => assert_eq!(args.version, "12.6.2"),
            _ => panic!("Expected Status command"),
        }
    }

    #[test]
    fn test_cli_parsing_version() {
        let cli = Cli::try_parse_from(["cudaup", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_cli_prefix_flag_builds_layout() {
        let cli = Cli::try_parse_from(["cudaup", "--prefix", "/opt/cuda-roots", "list"]).unwrap();
        let layout = cli.layout();
        assert_eq!(layout.prefix, PathBuf::from("/opt/cuda-roots"));
        assert_eq!(layout.bin_dir, PathBuf::from("/opt/cuda-roots/bin"));
    }

    #[test]
    fn test_cli_hidden_dir_overrides() {
        let cli = Cli::try_parse_from([
            "cudaup",
            "--bin-dir",
            "/sandbox/bin",
            "--etc-dir",
            "/sandbox/etc",
            "--work-dir",
            "/sandbox/work",
            "list",
        ])
        .unwrap();
        let layout = cli.layout();
        assert_eq!(layout.bin_dir, PathBuf::from("/sandbox/bin"));
        assert_eq!(layout.etc_dir, PathBuf::from("/sandbox/etc"));
        assert_eq!(layout.work_root, PathBuf::from("/sandbox/work"));
    }

    #[test]
    fn test_cli_parsing_completions() {
        let cli = Cli::try_parse_from(["cudaup", "completions", "bash"]).unwrap();
        match cli.command {
            Commands::Completions(args) => assert_eq!(args.shell, "bash"),
            _ => panic!("Expected Completions command"),
        }
    }
}

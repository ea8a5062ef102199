use clap::Parser;

/// Arguments for install command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Install a catalog version:\n    cudaup install 12.6.2\n\n\
                  Pick interactively:\n    cudaup install\n\n\
                  Install a version the catalog predates:\n    \
                  cudaup install 13.1.0 --family 13.1 --min-driver 590.00 \\\n      \
                  --toolkit-source https://example.com/cuda_13.1.0_linux.run \\\n      \
                  --cudnn-version 9.13.0.1 --cudnn-source ./cudnn.tar.xz")]
pub struct InstallArgs {
    /// Exact toolkit version (e.g. 12.6.2); omit for the catalog menu
    pub version: Option<String>,

    /// Toolkit runfile source: URL or local path (overrides the catalog)
    #[arg(long)]
    pub toolkit_source: Option<String>,

    /// Family identifier (e.g. 13.1); required when VERSION is not in the catalog
    #[arg(long)]
    pub family: Option<String>,

    /// Minimum compatible driver version for a custom registration
    #[arg(long)]
    pub min_driver: Option<String>,

    /// cuDNN archive source: URL or local path (overrides the catalog)
    #[arg(long)]
    pub cudnn_source: Option<String>,

    /// cuDNN version string for a custom registration
    #[arg(long)]
    pub cudnn_version: Option<String>,

    /// Proceed past the driver compatibility warning without prompting
    #[arg(long)]
    pub allow_unsupported_driver: bool,
}

use clap::Parser;

/// Arguments for status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Exact toolkit version to classify (e.g. 12.6.2)
    pub version: String,
}

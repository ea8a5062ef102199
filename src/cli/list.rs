use clap::Parser;

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only show versions already installed (any stage past start)
    #[arg(long)]
    pub installed: bool,
}

use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    cudaup completions bash > ~/.bash_completion.d/cudaup\n\n\
                  Generate zsh completions:\n    cudaup completions zsh > ~/.zfunc/_cudaup\n\n\
                  Generate fish completions:\n    cudaup completions fish > ~/.config/fish/completions/cudaup.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}

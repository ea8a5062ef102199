//! Error types and handling for cudaup
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! Variants map onto the failure taxonomy the tool distinguishes:
//! precondition failures (tooling, disk space, driver query), the
//! compatibility gate (declining is a cancellation, not a failure),
//! transport failures, container-format failures, installer failures,
//! and catalog/source resolution errors. `Cancelled` is the only variant
//! that exits 0.

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for cudaup operations
#[derive(Error, Diagnostic, Debug)]
pub enum CudaupError {
    // Precondition errors
    #[error("Required tool not found: {tool}")]
    #[diagnostic(
        code(cudaup::preflight::tool_missing),
        help("Install '{tool}' and make sure it is on PATH")
    )]
    ToolMissing { tool: String },

    #[error("Insufficient free space under {path}: need {need_gib} GiB, have {have_gib} GiB")]
    #[diagnostic(
        code(cudaup::preflight::insufficient_space),
        help("Free up disk space or point --prefix / CUDAUP_WORK_DIR at a larger filesystem")
    )]
    InsufficientSpace {
        path: String,
        need_gib: u64,
        have_gib: u64,
    },

    #[error("Could not determine the installed driver version: {reason}")]
    #[diagnostic(
        code(cudaup::driver::query_failed),
        help("Check that the NVIDIA driver is loaded and nvidia-smi runs")
    )]
    DriverQuery { reason: String },

    // Compatibility gate: declining the override is an operator choice
    #[error("Cancelled")]
    #[diagnostic(code(cudaup::cancelled))]
    Cancelled,

    // Catalog / source errors
    #[error("Unknown version '{version}'. Known versions: {known}")]
    #[diagnostic(
        code(cudaup::catalog::unknown_version),
        help("Pass one of the known versions, or supply --toolkit-source and --family to install a custom one")
    )]
    UnknownVersion { version: String, known: String },

    #[error("No companion (cuDNN) mapping for family '{family}'")]
    #[diagnostic(
        code(cudaup::catalog::no_companion),
        help("Supply --cudnn-source and --cudnn-version for this family")
    )]
    NoCompanion { family: String },

    #[error("Invalid source '{spec}': {reason}")]
    #[diagnostic(code(cudaup::source::bad_source))]
    BadSource { spec: String, reason: String },

    // Transport errors
    #[error("Download failed: {url}: {reason}")]
    #[diagnostic(
        code(cudaup::stager::download_failed),
        help("Partial data is kept; re-running the same install resumes the transfer")
    )]
    Download { url: String, reason: String },

    // Container-format errors
    #[error("Not a valid archive: {path}: {reason}")]
    #[diagnostic(code(cudaup::archive::invalid))]
    InvalidArchive { path: String, reason: String },

    // Installer errors
    #[error("Toolkit installer failed ({status})")]
    #[diagnostic(
        code(cudaup::installer::failed),
        help("See {log} for the installer output, then re-run to resume")
    )]
    InstallerFailed { status: String, log: String },

    #[error("Companion install left no usable files under {root}")]
    #[diagnostic(
        code(cudaup::installer::companion_incomplete),
        help("The archive did not contain the expected cudnn.h / libcudnn.so layout")
    )]
    CompanionIncomplete { root: String },

    // Final verification
    #[error("Post-install verification failed: expected stage '{expected}', classified '{actual}'")]
    #[diagnostic(code(cudaup::verify::stage_mismatch))]
    Verification { expected: String, actual: String },

    // Carriers
    #[error("Command failed: {command}: {reason}")]
    #[diagnostic(code(cudaup::command_failed))]
    CommandFailed { command: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(cudaup::io_error))]
    Io { message: String },
}

impl From<std::io::Error> for CudaupError {
    fn from(err: std::io::Error) -> Self {
        CudaupError::Io {
            message: err.to_string(),
        }
    }
}

// Prompt failures (non-TTY stdin, Esc, Ctrl-C) all read as "the operator
// did not confirm", which is a cancellation, not a failure.
impl From<inquire::InquireError> for CudaupError {
    fn from(_: inquire::InquireError) -> Self {
        CudaupError::Cancelled
    }
}

/// Convenience result type for cudaup operations
pub type Result<T> = std::result::Result<T, CudaupError>;

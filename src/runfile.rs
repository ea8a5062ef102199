//! Non-interactive invocation of the native toolkit installer.
//!
//! The runfile is a black box invoked with flags. Installation is
//! constrained to toolkit-only components: the driver, kernel modules,
//! GUI/debug tooling, and man pages are explicitly excluded. Success is a
//! zero exit status, never inferred from output text.

use std::path::Path;
use std::process::Command;

use crate::context::InstallContext;
use crate::error::{CudaupError, Result};
use crate::progress;

pub fn install_toolkit(ctx: &InstallContext, runfile: &Path) -> Result<()> {
    let sh = which::which("sh").map_err(|_| CudaupError::ToolMissing {
        tool: "sh".to_string(),
    })?;
    let root = ctx.install_root();

    let spinner = progress::spinner(&format!(
        "Running toolkit installer for CUDA {} (this can take several minutes)",
        ctx.toolkit.version
    ));
    let output = Command::new(&sh)
        .arg(runfile)
        .arg("--silent")
        .arg("--toolkit")
        .arg(format!("--toolkitpath={}", root.display()))
        .arg("--no-opengl-libs")
        .arg("--no-man-page")
        .arg("--no-drm")
        .output();
    spinner.finish_and_clear();

    let output = output.map_err(|e| CudaupError::CommandFailed {
        command: format!("sh {}", runfile.display()),
        reason: e.to_string(),
    })?;

    // Keep the full installer output next to the staged archives for
    // post-mortem when the black box fails.
    let log = ctx.workarea.installer_log();
    let mut captured = output.stdout.clone();
    captured.extend_from_slice(&output.stderr);
    let _ = std::fs::write(&log, &captured);

    if !output.status.success() {
        return Err(CudaupError::InstallerFailed {
            status: output.status.to_string(),
            log: log.display().to_string(),
        });
    }
    Ok(())
}

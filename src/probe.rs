//! Filesystem state probe: classify how far an installation progressed.
//!
//! The stage is always derived from observable filesystem state, never
//! from a persisted marker. Classification is deterministic, read-only,
//! and side-effect-free; it runs fresh at the start of every run and
//! again after every stage completes.

use std::path::Path;
use std::process::Command;

use crate::archive;
use crate::context::InstallContext;
use crate::error::Result;

/// Ordered installation stages. The ordering is the heart of the resume
/// engine: the executor only runs actions whose produced stage is greater
/// than the currently classified one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InstallationStage {
    Start,
    ToolkitDownloaded,
    CompanionDownloaded,
    ToolkitInstalled,
    CompanionInstalled,
    Complete,
}

impl InstallationStage {
    pub const ALL: [InstallationStage; 6] = [
        InstallationStage::Start,
        InstallationStage::ToolkitDownloaded,
        InstallationStage::CompanionDownloaded,
        InstallationStage::ToolkitInstalled,
        InstallationStage::CompanionInstalled,
        InstallationStage::Complete,
    ];
}

impl std::fmt::Display for InstallationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InstallationStage::Start => "not started",
            InstallationStage::ToolkitDownloaded => "toolkit downloaded",
            InstallationStage::CompanionDownloaded => "companion downloaded",
            InstallationStage::ToolkitInstalled => "toolkit installed",
            InstallationStage::CompanionInstalled => "companion installed",
            InstallationStage::Complete => "complete",
        };
        write!(f, "{name}")
    }
}

/// The raw observations behind a classification, for `status` output.
#[derive(Debug, Clone)]
pub struct Evidence {
    pub root_exists: bool,
    pub nvcc_reports_family: bool,
    pub header_present: bool,
    pub shared_lib_present: bool,
    pub switcher_present: bool,
    pub toolkit_archive_staged: bool,
    pub companion_archive_valid: bool,
    pub stage: InstallationStage,
}

/// Classify the installation stage for the context's version.
pub fn classify(ctx: &InstallContext) -> Result<InstallationStage> {
    Ok(inspect(ctx)?.stage)
}

/// Gather every observation and derive the stage. Install evidence is
/// evaluated first, gated front to back; download evidence independently
/// raises a floor, and the result is the maximum of the two. Download
/// evidence alone can never reach `Complete`.
pub fn inspect(ctx: &InstallContext) -> Result<Evidence> {
    let root = ctx.install_root();
    let root_exists = root.is_dir();
    let nvcc_reports_family =
        root_exists && nvcc_reports_family(&root, &ctx.toolkit.family);
    let header_present = root.join("include").join("cudnn.h").is_file();
    let shared_lib_present = has_cudnn_library(&root);
    let switcher_present = ctx.layout.switcher_path(&ctx.toolkit.family).is_file();

    let installed = if !nvcc_reports_family {
        InstallationStage::Start
    } else if header_present && shared_lib_present {
        if switcher_present {
            InstallationStage::Complete
        } else {
            InstallationStage::CompanionInstalled
        }
    } else {
        InstallationStage::ToolkitInstalled
    };

    // Download evidence can exist even when nothing is installed yet,
    // e.g. after a prior run's installer step failed. Partial `.part`
    // files are not archives and never raise the floor.
    let toolkit_archive_staged = ctx
        .workarea
        .find_staged(&ctx.toolkit_archive_name()?)
        .is_some();
    let companion_archive_valid = ctx
        .workarea
        .find_staged(&ctx.companion_archive_name()?)
        .is_some_and(|p| archive::is_valid_container(&p));

    let mut floor = InstallationStage::Start;
    if toolkit_archive_staged {
        floor = InstallationStage::ToolkitDownloaded;
    }
    if companion_archive_valid
        && (floor >= InstallationStage::ToolkitDownloaded
            || installed >= InstallationStage::ToolkitInstalled)
    {
        floor = InstallationStage::CompanionDownloaded;
    }

    Ok(Evidence {
        root_exists,
        nvcc_reports_family,
        header_present,
        shared_lib_present,
        switcher_present,
        toolkit_archive_staged,
        companion_archive_valid,
        stage: installed.max(floor),
    })
}

/// Install evidence rule: the primary executable must exist and report a
/// version string carrying the expected family. Any failure to execute it
/// reads as missing evidence.
fn nvcc_reports_family(root: &Path, family: &str) -> bool {
    let nvcc = root.join("bin").join("nvcc");
    if !nvcc.is_file() {
        return false;
    }
    let Ok(output) = Command::new(&nvcc).arg("--version").output() else {
        return false;
    };
    if !output.status.success() {
        return false;
    }
    String::from_utf8_lossy(&output.stdout).contains(&format!("release {family}"))
}

fn has_cudnn_library(root: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(root.join("lib64")) else {
        return false;
    };
    entries.flatten().any(|e| {
        e.file_name()
            .to_str()
            .is_some_and(|n| n.starts_with("libcudnn.so"))
    })
}

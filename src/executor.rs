//! Stage executor: drive every remaining stage in canonical order.
//!
//! Explicit iteration over the ordered stage enumeration with a per-stage
//! guard, in place of fallthrough: before each step the stage is
//! re-classified, and the step runs only if the current stage is still
//! below the stage the step produces. That makes every action naturally
//! idempotent and safe to re-enter mid-way.
//!
//! Note the ordering consequence for resumed runs: entering at
//! `ToolkitInstalled` skips the download steps outright, so the
//! companion-install action starts with its own ensure-staged call —
//! a leftover companion archive is always re-validated before reuse.

use console::style;

use crate::context::InstallContext;
use crate::cudnn;
use crate::error::{CudaupError, Result};
use crate::probe::{self, InstallationStage};
use crate::publisher::{self, SystemLink};
use crate::runfile;
use crate::stager;

/// The stage each step advances the installation to, in canonical order.
const STEPS: [InstallationStage; 5] = [
    InstallationStage::ToolkitDownloaded,
    InstallationStage::CompanionDownloaded,
    InstallationStage::ToolkitInstalled,
    InstallationStage::CompanionInstalled,
    InstallationStage::Complete,
];

/// Run every stage from the current classification through `Complete`,
/// then verify. `interactive` gates the archive-path fallback prompt.
pub fn run(ctx: &InstallContext, link: &mut dyn SystemLink, interactive: bool) -> Result<()> {
    for target in STEPS {
        let current = probe::classify(ctx)?;
        if current >= target {
            println!(
                "{} {}",
                style("==>").dim(),
                style(format!("{target}: already satisfied")).dim()
            );
            continue;
        }
        println!("{} {}", style("==>").cyan().bold(), describe(target));
        execute(ctx, link, interactive, target).inspect_err(|_| {
            eprintln!(
                "{} stage failed: {}",
                style("==>").red().bold(),
                describe(target)
            );
        })?;
        ctx.workarea.write_hint(&ctx.toolkit.version, &target.to_string());
    }

    let final_stage = probe::classify(ctx)?;
    if final_stage != InstallationStage::Complete {
        return Err(CudaupError::Verification {
            expected: InstallationStage::Complete.to_string(),
            actual: final_stage.to_string(),
        });
    }
    Ok(())
}

fn describe(target: InstallationStage) -> String {
    match target {
        InstallationStage::ToolkitDownloaded => "Downloading toolkit installer".to_string(),
        InstallationStage::CompanionDownloaded => "Downloading cuDNN archive".to_string(),
        InstallationStage::ToolkitInstalled => "Installing toolkit".to_string(),
        InstallationStage::CompanionInstalled => "Installing cuDNN".to_string(),
        InstallationStage::Complete => "Publishing environment".to_string(),
        InstallationStage::Start => String::new(),
    }
}

fn execute(
    ctx: &InstallContext,
    link: &mut dyn SystemLink,
    interactive: bool,
    target: InstallationStage,
) -> Result<()> {
    match target {
        InstallationStage::ToolkitDownloaded => {
            stager::ensure_toolkit(ctx)?;
        }
        InstallationStage::CompanionDownloaded => {
            stager::ensure_companion(ctx, interactive)?;
        }
        InstallationStage::ToolkitInstalled => {
            let runfile_path = stager::ensure_toolkit(ctx)?;
            runfile::install_toolkit(ctx, &runfile_path)?;
        }
        InstallationStage::CompanionInstalled => {
            cudnn::install_companion(ctx, interactive)?;
        }
        InstallationStage::Complete => {
            publisher::publish(ctx, link)?;
        }
        InstallationStage::Start => {}
    }
    Ok(())
}

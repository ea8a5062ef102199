//! Driver compatibility gate.
//!
//! Driver identifiers ("560.35.03", sometimes just "560.35") are not
//! semver, so the gate compares only the leading numeric component.
//! Coarse on purpose: driver compatibility is expressed at major-version
//! granularity in practice.

use std::process::Command;

use console::style;
use inquire::Confirm;

use crate::catalog::{Catalog, VersionDescriptor};
use crate::error::{CudaupError, Result};

/// Query the installed driver version via nvidia-smi. The absence or
/// failure of the reporting tool is a fatal precondition failure, distinct
/// from a compatibility warning.
pub fn query_driver_version() -> Result<String> {
    let smi = which::which("nvidia-smi").map_err(|_| CudaupError::ToolMissing {
        tool: "nvidia-smi".to_string(),
    })?;
    let output = Command::new(&smi)
        .args(["--query-gpu=driver_version", "--format=csv,noheader"])
        .output()
        .map_err(|e| CudaupError::DriverQuery {
            reason: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(CudaupError::DriverQuery {
            reason: format!("nvidia-smi exited with {}", output.status),
        });
    }
    // One line per GPU; the first is as good as any for the gate.
    let version = String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .to_string();
    if version.is_empty() {
        return Err(CudaupError::DriverQuery {
            reason: "nvidia-smi reported no driver version".to_string(),
        });
    }
    Ok(version)
}

/// Leading numeric component of a driver identifier: "560.35.03" -> 560.
pub fn leading_major(identifier: &str) -> Option<u64> {
    let digits: String = identifier
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Gate the requested version on the reported driver. On a too-old driver,
/// warn with the versions this driver does satisfy and require an explicit
/// override; declining is a cancellation, not a failure.
pub fn check_compatibility(
    catalog: &Catalog,
    descriptor: &VersionDescriptor,
    reported: &str,
    allow_unsupported: bool,
) -> Result<()> {
    let Some(installed) = leading_major(reported) else {
        return Err(CudaupError::DriverQuery {
            reason: format!("unparseable driver version '{reported}'"),
        });
    };
    let Some(required) = leading_major(&descriptor.min_driver) else {
        // A custom registration with a junk --min-driver gates nothing.
        return Ok(());
    };
    if installed >= required {
        return Ok(());
    }

    println!(
        "{} CUDA {} wants driver >= {}, but driver {} is installed",
        style("warning:").yellow().bold(),
        descriptor.version,
        descriptor.min_driver,
        reported
    );
    let satisfied = catalog.versions_satisfied_by(installed);
    if satisfied.is_empty() {
        println!("  No catalog version supports this driver.");
    } else {
        println!(
            "  Versions this driver does support: {}",
            satisfied.join(", ")
        );
    }

    if allow_unsupported {
        println!("  Proceeding anyway (--allow-unsupported-driver).");
        return Ok(());
    }
    let proceed = Confirm::new("Install anyway?").with_default(false).prompt()?;
    if proceed { Ok(()) } else { Err(CudaupError::Cancelled) }
}

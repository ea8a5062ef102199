//! Preflight checks: required tools and free space, before any mutation.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{CudaupError, Result};
use crate::layout::Layout;

/// Default free-space floor for the install prefix, in GiB.
const MIN_FREE_PREFIX_GIB: u64 = 15;
/// Default free-space floor for the work root, in GiB.
const MIN_FREE_WORK_GIB: u64 = 10;

const KIB_PER_GIB: u64 = 1024 * 1024;

/// Run every precondition check. Fails before anything is written.
pub fn check(layout: &Layout) -> Result<()> {
    for tool in ["nvidia-smi", "sh"] {
        which::which(tool).map_err(|_| CudaupError::ToolMissing {
            tool: tool.to_string(),
        })?;
    }

    let override_gib = std::env::var("CUDAUP_MIN_FREE_GIB")
        .ok()
        .and_then(|v| v.parse::<u64>().ok());
    let prefix_floor = override_gib.unwrap_or(MIN_FREE_PREFIX_GIB);
    let work_floor = override_gib.unwrap_or(MIN_FREE_WORK_GIB);

    check_free_space(&layout.prefix, prefix_floor)?;
    check_free_space(&layout.work_root, work_floor)?;
    Ok(())
}

fn check_free_space(path: &Path, floor_gib: u64) -> Result<()> {
    if floor_gib == 0 {
        return Ok(());
    }
    let probe_path = nearest_existing(path);
    // No free-space crate in the stack; df -P output is stable enough.
    let Ok(output) = Command::new("df")
        .arg("-Pk")
        .arg(&probe_path)
        .output()
    else {
        return Ok(());
    };
    if !output.status.success() {
        return Ok(());
    }
    let Some(available_kib) = parse_df_available_kib(&String::from_utf8_lossy(&output.stdout))
    else {
        return Ok(());
    };
    let have_gib = available_kib / KIB_PER_GIB;
    if have_gib < floor_gib {
        return Err(CudaupError::InsufficientSpace {
            path: path.display().to_string(),
            need_gib: floor_gib,
            have_gib,
        });
    }
    Ok(())
}

/// The path itself may not exist yet (fresh prefix, fresh work root);
/// probe the closest existing ancestor instead.
fn nearest_existing(path: &Path) -> PathBuf {
    let mut current = path;
    while !current.exists() {
        match current.parent() {
            Some(parent) => current = parent,
            None => return PathBuf::from("/"),
        }
    }
    current.to_path_buf()
}

/// Fourth column of the last data line of `df -Pk` output: available KiB.
fn parse_df_available_kib(output: &str) -> Option<u64> {
    let line = output.lines().filter(|l| !l.trim().is_empty()).next_back()?;
    line.split_whitespace().nth(3)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_df_available() {
        let output = "Filesystem     1024-blocks      Used Available Capacity Mounted on\n\
                      /dev/nvme0n1p2   491068968 203958776 262090640      44% /\n";
        assert_eq!(parse_df_available_kib(output), Some(262_090_640));
    }

    #[test]
    fn test_parse_df_rejects_garbage() {
        assert_eq!(parse_df_available_kib(""), None);
        assert_eq!(parse_df_available_kib("header only\n"), None);
    }

    #[test]
    fn test_nearest_existing_walks_up() {
        let temp = tempfile::TempDir::new().unwrap();
        let deep = temp.path().join("a/b/c");
        assert_eq!(nearest_existing(&deep), temp.path());
        assert_eq!(nearest_existing(temp.path()), temp.path());
    }

    #[test]
    fn test_zero_floor_skips_check() {
        let temp = tempfile::TempDir::new().unwrap();
        check_free_space(temp.path(), 0).unwrap();
    }
}

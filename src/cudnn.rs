//! Companion (cuDNN) installation: extract, locate the payload, copy
//! headers and libraries into the InstallRoot.
//!
//! Archive internal layout is not standardized across releases, so the
//! payload directory is found by a prioritized pattern search: the exact
//! archive stem, then the legacy generic name `cuda`, then the first
//! subdirectory. Libraries may live under `lib` or `lib64`; either may be
//! absent, but the stage fails when neither the expected header nor the
//! expected shared library landed in the InstallRoot.

use std::path::{Path, PathBuf};

use crate::archive;
use crate::context::InstallContext;
use crate::error::{CudaupError, Result};
use crate::fsutil;
use crate::progress;
use crate::stager;

/// Legacy cuDNN tarballs unpack into a bare `cuda/` directory.
const LEGACY_PAYLOAD: &str = "cuda";

pub fn install_companion(ctx: &InstallContext, interactive: bool) -> Result<()> {
    // Mandatory re-validation: the staged copy may come from a prior
    // incomplete run and has to pass container inspection before reuse.
    let archive_path = stager::ensure_companion(ctx, interactive)?;

    let scratch = ctx.workarea.extract_dir();
    if scratch.exists() {
        std::fs::remove_dir_all(&scratch)?;
    }
    let spinner = progress::spinner(&format!(
        "Extracting cuDNN {}",
        ctx.companion.version
    ));
    let extracted = archive::extract(&archive_path, &scratch);
    spinner.finish_and_clear();
    extracted?;

    let stem = archive_stem(&archive_path);
    let payload = find_payload_dir(&scratch, &stem)?;
    let root = ctx.install_root();

    fsutil::copy_matching(&payload.join("include"), &root.join("include"), |n| {
        n.starts_with("cudnn") && n.ends_with(".h")
    })?;
    for lib_dir in ["lib", "lib64"] {
        fsutil::copy_matching(&payload.join(lib_dir), &root.join("lib64"), |n| {
            n.starts_with("libcudnn")
        })?;
    }

    let header = root.join("include").join("cudnn.h");
    let has_library = std::fs::read_dir(root.join("lib64"))
        .map(|entries| {
            entries.flatten().any(|e| {
                e.file_name()
                    .to_str()
                    .is_some_and(|n| n.starts_with("libcudnn.so"))
            })
        })
        .unwrap_or(false);
    if !header.is_file() && !has_library {
        return Err(CudaupError::CompanionIncomplete {
            root: root.display().to_string(),
        });
    }
    Ok(())
}

/// Archive file name with the container suffix removed:
/// `cudnn-linux-x86_64-9.5.1.17_cuda12-archive.tar.xz` -> `..._cuda12-archive`.
pub fn archive_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    for suffix in [".tar.xz", ".tar.gz", ".tgz"] {
        if let Some(stem) = name.strip_suffix(suffix) {
            return stem.to_string();
        }
    }
    name.to_string()
}

/// Prioritized payload search: exact stem, legacy `cuda`, first subdirectory.
pub fn find_payload_dir(scratch: &Path, stem: &str) -> Result<PathBuf> {
    let exact = scratch.join(stem);
    if exact.is_dir() {
        return Ok(exact);
    }
    let legacy = scratch.join(LEGACY_PAYLOAD);
    if legacy.is_dir() {
        return Ok(legacy);
    }
    let mut subdirs: Vec<PathBuf> = std::fs::read_dir(scratch)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    subdirs.sort();
    subdirs
        .into_iter()
        .next()
        .ok_or_else(|| CudaupError::InvalidArchive {
            path: scratch.display().to_string(),
            reason: "extracted archive contains no payload directory".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_stem_strips_container_suffixes() {
        assert_eq!(
            archive_stem(Path::new(
                "/w/cudnn-linux-x86_64-9.5.1.17_cuda12-archive.tar.xz"
            )),
            "cudnn-linux-x86_64-9.5.1.17_cuda12-archive"
        );
        assert_eq!(archive_stem(Path::new("/w/cudnn-8.9.tgz")), "cudnn-8.9");
        assert_eq!(archive_stem(Path::new("/w/cudnn.tar.gz")), "cudnn");
    }

    #[test]
    fn test_payload_search_prefers_exact_stem() {
        let temp = tempfile::TempDir::new().unwrap();
        for dir in ["cudnn-archive", "cuda", "aaa-other"] {
            std::fs::create_dir_all(temp.path().join(dir)).unwrap();
        }
        let found = find_payload_dir(temp.path(), "cudnn-archive").unwrap();
        assert_eq!(found, temp.path().join("cudnn-archive"));
    }

    #[test]
    fn test_payload_search_falls_back_to_legacy_cuda() {
        let temp = tempfile::TempDir::new().unwrap();
        for dir in ["cuda", "aaa-other"] {
            std::fs::create_dir_all(temp.path().join(dir)).unwrap();
        }
        let found = find_payload_dir(temp.path(), "cudnn-archive").unwrap();
        assert_eq!(found, temp.path().join("cuda"));
    }

    #[test]
    fn test_payload_search_falls_back_to_first_subdir() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("zzz")).unwrap();
        std::fs::write(temp.path().join("README"), b"x").unwrap();
        let found = find_payload_dir(temp.path(), "cudnn-archive").unwrap();
        assert_eq!(found, temp.path().join("zzz"));
    }

    #[test]
    fn test_payload_search_empty_scratch_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(find_payload_dir(temp.path(), "cudnn-archive").is_err());
    }
}

//! System path derivations shared by every component.
//!
//! A [`Layout`] is constructed once per process from CLI flags and
//! environment overrides, then threaded through the request context.
//! Nothing else in the tree reads path configuration ambiently.
//!
//! ## Directory structure produced
//!
//! ```text
//! <prefix>/cuda-<family>/           # InstallRoot, one per family
//!   bin/nvcc
//!   include/cudnn.h
//!   lib64/libcudnn.so*
//! <prefix>/cuda                     # alternatives link
//! <bin>/use-<tag>                   # switcher script, e.g. use-126
//! <etc>/ld.so.conf.d/cuda-<tag>.conf
//! <etc>/profile.d/cuda.sh           # regenerated in full on every publish
//! <work>/run-<pid>/                 # per-process WorkArea
//! ```

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{CudaupError, Result};

/// Default parent of the per-family install roots.
pub const DEFAULT_PREFIX: &str = "/usr/local";

/// Directory name prefix shared by every install root.
pub const ROOT_PREFIX: &str = "cuda-";

/// Name of the alternatives link group.
pub const ALTERNATIVES_NAME: &str = "cuda";

/// System paths every component derives from.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Parent of `cuda-<family>` roots and the `cuda` alternatives link.
    pub prefix: PathBuf,
    /// Where switcher scripts go.
    pub bin_dir: PathBuf,
    /// Parent of `ld.so.conf.d/` and `profile.d/`.
    pub etc_dir: PathBuf,
    /// Work root holding `run-<pid>` WorkAreas.
    pub work_root: PathBuf,
}

impl Layout {
    pub fn new(
        prefix: PathBuf,
        bin_dir: Option<PathBuf>,
        etc_dir: Option<PathBuf>,
        work_root: Option<PathBuf>,
    ) -> Self {
        let bin_dir = bin_dir.unwrap_or_else(|| prefix.join("bin"));
        let etc_dir = etc_dir.unwrap_or_else(|| PathBuf::from("/etc"));
        let work_root = work_root.unwrap_or_else(|| temp_dir_base().join("cudaup"));
        Self {
            prefix,
            bin_dir,
            etc_dir,
            work_root,
        }
    }

    /// The per-family install root, e.g. `/usr/local/cuda-12.6`.
    pub fn install_root(&self, family: &str) -> PathBuf {
        self.prefix.join(format!("{ROOT_PREFIX}{family}"))
    }

    /// The switchable symlink maintained by the alternatives mechanism.
    pub fn alternatives_link(&self) -> PathBuf {
        self.prefix.join(ALTERNATIVES_NAME)
    }

    /// The version-tagged switcher script, e.g. `<bin>/use-126`.
    pub fn switcher_path(&self, family: &str) -> PathBuf {
        self.bin_dir.join(format!("use-{}", family_tag(family)))
    }

    /// The dynamic-linker search-path fragment for a family.
    pub fn ld_conf_path(&self, family: &str) -> PathBuf {
        self.etc_dir
            .join("ld.so.conf.d")
            .join(format!("cuda-{}.conf", family_tag(family)))
    }

    /// The single system-wide profile fragment listing all installed families.
    pub fn profile_path(&self) -> PathBuf {
        self.etc_dir.join("profile.d").join("cuda.sh")
    }

    /// Every install root currently present under the prefix, sorted by
    /// family. Used by the profile regeneration and the `list` display.
    pub fn discovered_roots(&self) -> Vec<(String, PathBuf)> {
        let mut roots = Vec::new();
        let Ok(entries) = std::fs::read_dir(&self.prefix) else {
            return roots;
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(family) = name.strip_prefix(ROOT_PREFIX) {
                if entry.path().is_dir() && !family.is_empty() {
                    roots.push((family.to_string(), entry.path()));
                }
            }
        }
        roots.sort_by(|a, b| family_sort_key(&a.0).cmp(&family_sort_key(&b.0)));
        roots
    }
}

/// The family identifier with the dot removed: "12.6" -> "126".
pub fn family_tag(family: &str) -> String {
    family.chars().filter(char::is_ascii_digit).collect()
}

/// Alternatives priority derived monotonically from the family digits:
/// "11.8" -> 118, "12.6" -> 126, "13.0" -> 130.
pub fn alternatives_priority(family: &str) -> Result<u32> {
    let tag = family_tag(family);
    tag.parse().map_err(|_| CudaupError::BadSource {
        spec: family.to_string(),
        reason: "family must look like <major>.<minor>".to_string(),
    })
}

/// Numeric sort key for family identifiers ("9.2" sorts before "12.6").
pub fn family_sort_key(family: &str) -> (u32, u32) {
    let mut parts = family.split('.');
    let major = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    (major, minor)
}

/// Returns an absolute directory suitable for creating the work root under.
/// Never returns a relative path, so scratch dirs are never created under
/// the current working directory (avoids repo/tmp when TMPDIR=tmp).
pub fn temp_dir_base() -> PathBuf {
    let t = env::temp_dir();
    if t.is_absolute() {
        t
    } else {
        PathBuf::from("/tmp")
    }
}

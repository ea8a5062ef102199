//! Process-scoped scratch directory for staged archives and extraction.
//!
//! Each run owns `<work-root>/run-<pid>` exclusively. The directory is
//! left behind after success on purpose, for inspection; nothing in the
//! normal-completion path deletes it.
//!
//! Because the directory is per-process, resuming across invocations works
//! by *adoption*: at preparation time the fresh WorkArea scans sibling
//! `run-*` directories and moves matching archives (and `.part` partials)
//! into itself. Adoption happens once, before the first probe; probing
//! itself never mutates anything.
//!
//! `resume.json` is a hint for operator messaging and adoption ordering
//! only. The filesystem probe is authoritative and never trusts it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::layout::Layout;

const HINT_FILE: &str = "resume.json";
const RUN_PREFIX: &str = "run-";

/// What the previous attempt recorded after its last completed stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeHint {
    /// Toolkit version the attempt was installing.
    pub version: String,
    /// Display name of the last completed stage.
    pub stage: String,
    /// Seconds since the epoch when the hint was written.
    pub updated_at: u64,
}

/// Handle on the per-process scratch directory.
#[derive(Debug, Clone)]
pub struct WorkArea {
    dir: PathBuf,
    work_root: PathBuf,
}

impl WorkArea {
    /// A handle without any filesystem effect, for read-only commands.
    pub fn handle(layout: &Layout) -> Self {
        let work_root = layout.work_root.clone();
        let dir = work_root.join(format!("{RUN_PREFIX}{}", std::process::id()));
        Self { dir, work_root }
    }

    /// Create the directory and adopt archives left by previous runs.
    /// Returns the newest hint found among adopted runs, if any.
    pub fn prepare(layout: &Layout, archive_names: &[String]) -> Result<(Self, Option<ResumeHint>)> {
        let area = Self::handle(layout);
        fs::create_dir_all(&area.dir)?;
        let hint = area.adopt_siblings(archive_names)?;
        Ok((area, hint))
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Where a staged archive with the given file name lives.
    pub fn archive_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Scratch subdirectory for companion extraction.
    pub fn extract_dir(&self) -> PathBuf {
        self.dir.join("extract")
    }

    /// Captured output of the native installer.
    pub fn installer_log(&self) -> PathBuf {
        self.dir.join("installer.log")
    }

    /// Find a staged archive by name, in this WorkArea first, then in
    /// sibling run directories. Read-only; the probe uses this so that
    /// `status` sees download evidence left by earlier runs too.
    pub fn find_staged(&self, file_name: &str) -> Option<PathBuf> {
        let own = self.archive_path(file_name);
        if own.is_file() {
            return Some(own);
        }
        for dir in self.sibling_runs() {
            let candidate = dir.join(file_name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }

    /// Record the last completed stage. Failure to write the hint is not
    /// worth failing a run over.
    pub fn write_hint(&self, version: &str, stage: &str) {
        let hint = ResumeHint {
            version: version.to_string(),
            stage: stage.to_string(),
            updated_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        };
        if let Ok(json) = serde_json::to_string_pretty(&hint) {
            let _ = fs::write(self.dir.join(HINT_FILE), json);
        }
    }

    fn read_hint_in(dir: &Path) -> Option<ResumeHint> {
        let json = fs::read_to_string(dir.join(HINT_FILE)).ok()?;
        serde_json::from_str(&json).ok()
    }

    fn sibling_runs(&self) -> Vec<PathBuf> {
        let mut runs = Vec::new();
        let Ok(entries) = fs::read_dir(&self.work_root) else {
            return runs;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path == self.dir || !path.is_dir() {
                continue;
            }
            if entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(RUN_PREFIX))
            {
                runs.push(path);
            }
        }
        runs
    }

    /// Move matching archives and partials out of sibling run directories
    /// into this one. Newest hints win; existing files are never clobbered.
    fn adopt_siblings(&self, archive_names: &[String]) -> Result<Option<ResumeHint>> {
        let mut best: Option<ResumeHint> = None;
        for sibling in self.sibling_runs() {
            for name in archive_names {
                for candidate in [name.clone(), format!("{name}.part")] {
                    let src = sibling.join(&candidate);
                    let dst = self.dir.join(&candidate);
                    if src.is_file() && !dst.exists() {
                        fs::rename(&src, &dst)?;
                    }
                }
            }
            if let Some(hint) = Self::read_hint_in(&sibling) {
                let newer = best
                    .as_ref()
                    .is_none_or(|b| hint.updated_at > b.updated_at);
                if newer {
                    best = Some(hint);
                }
            }
        }
        Ok(best)
    }
}

//! Request-scoped state for one install run.
//!
//! Everything the probe and executor need travels in one value, threaded
//! explicitly: the resolved descriptors, the path layout, and the
//! WorkArea handle. There is no process-global "current version".

use std::path::PathBuf;

use crate::catalog::{CompanionDescriptor, VersionDescriptor};
use crate::error::Result;
use crate::layout::Layout;
use crate::workarea::WorkArea;

#[derive(Debug, Clone)]
pub struct InstallContext {
    pub layout: Layout,
    pub toolkit: VersionDescriptor,
    pub companion: CompanionDescriptor,
    pub workarea: WorkArea,
}

impl InstallContext {
    pub fn new(
        layout: Layout,
        toolkit: VersionDescriptor,
        companion: CompanionDescriptor,
        workarea: WorkArea,
    ) -> Self {
        Self {
            layout,
            toolkit,
            companion,
            workarea,
        }
    }

    /// The per-version target directory, e.g. `/usr/local/cuda-12.6`.
    pub fn install_root(&self) -> PathBuf {
        self.layout.install_root(&self.toolkit.family)
    }

    /// File name of the toolkit runfile once staged.
    pub fn toolkit_archive_name(&self) -> Result<String> {
        self.toolkit.source.file_name()
    }

    /// File name of the companion archive once staged.
    pub fn companion_archive_name(&self) -> Result<String> {
        self.companion.source.file_name()
    }

    /// Staging destination for the toolkit runfile in this WorkArea.
    pub fn toolkit_archive_path(&self) -> Result<PathBuf> {
        Ok(self.workarea.archive_path(&self.toolkit_archive_name()?))
    }

    /// Staging destination for the companion archive in this WorkArea.
    pub fn companion_archive_path(&self) -> Result<PathBuf> {
        Ok(self.workarea.archive_path(&self.companion_archive_name()?))
    }
}

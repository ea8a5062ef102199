//! Container-format validation and extraction.
//!
//! cuDNN ships `.tar.xz` today and shipped `.tgz` historically, so both
//! formats are accepted. Detection is by magic bytes, never by file
//! extension: a half-downloaded or corrupted file with the right name must
//! still fail validation.

use std::fs::File;
use std::io::Read;
use std::path::{Component, Path};

use flate2::read::GzDecoder;
use tar::Archive;
use xz2::read::XzDecoder;

use crate::error::{CudaupError, Result};

const XZ_MAGIC: [u8; 6] = [0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00];
const GZ_MAGIC: [u8; 2] = [0x1F, 0x8B];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    TarXz,
    TarGz,
}

/// Identify the container format from the file's leading bytes.
pub fn detect_format(path: &Path) -> Result<ContainerFormat> {
    let mut file = File::open(path).map_err(|e| CudaupError::InvalidArchive {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let mut magic = [0u8; 6];
    let n = file.read(&mut magic)?;
    if n >= XZ_MAGIC.len() && magic == XZ_MAGIC {
        return Ok(ContainerFormat::TarXz);
    }
    if n >= GZ_MAGIC.len() && magic[..2] == GZ_MAGIC {
        return Ok(ContainerFormat::TarGz);
    }
    Err(CudaupError::InvalidArchive {
        path: path.display().to_string(),
        reason: "not a tar.xz or tar.gz container".to_string(),
    })
}

/// True when the file passes container validation. Read-only; used by the
/// probe, which must never mutate anything.
pub fn is_valid_container(path: &Path) -> bool {
    path.is_file() && detect_format(path).is_ok()
}

/// Extract a tar.xz or tar.gz archive into `dest_dir`, creating it if
/// needed. Entry paths with absolute or parent-directory components are
/// rejected. Symlinks inside the archive are preserved as links.
pub fn extract(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let format = detect_format(archive_path)?;
    std::fs::create_dir_all(dest_dir)?;

    let file = File::open(archive_path)?;
    let reader: Box<dyn Read> = match format {
        ContainerFormat::TarXz => Box::new(XzDecoder::new(file)),
        ContainerFormat::TarGz => Box::new(GzDecoder::new(file)),
    };
    let mut archive = Archive::new(reader);

    for entry in archive.entries().map_err(|e| CudaupError::InvalidArchive {
        path: archive_path.display().to_string(),
        reason: e.to_string(),
    })? {
        let mut entry = entry.map_err(|e| CudaupError::InvalidArchive {
            path: archive_path.display().to_string(),
            reason: e.to_string(),
        })?;
        let entry_path = entry
            .path()
            .map_err(|e| CudaupError::InvalidArchive {
                path: archive_path.display().to_string(),
                reason: e.to_string(),
            })?
            .into_owned();

        if entry_path.is_absolute()
            || entry_path
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(CudaupError::InvalidArchive {
                path: archive_path.display().to_string(),
                reason: format!(
                    "refusing entry with absolute or parent path: {}",
                    entry_path.display()
                ),
            });
        }

        let output_path = dest_dir.join(&entry_path);
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        entry
            .unpack(&output_path)
            .map_err(|e| CudaupError::InvalidArchive {
                path: archive_path.display().to_string(),
                reason: format!("failed to extract {}: {e}", entry_path.display()),
            })?;
    }
    Ok(())
}

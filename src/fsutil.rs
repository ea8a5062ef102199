//! File system helpers shared by the companion install and publisher.

use std::fs;
use std::path::Path;

use crate::error::Result;

/// Copy every directory entry whose file name satisfies `matches` into
/// `dst_dir`, preserving symlinks as symlinks. Returns the number of
/// entries copied; a missing source directory copies nothing.
pub fn copy_matching(
    src_dir: &Path,
    dst_dir: &Path,
    matches: impl Fn(&str) -> bool,
) -> Result<usize> {
    let Ok(entries) = fs::read_dir(src_dir) else {
        return Ok(0);
    };
    fs::create_dir_all(dst_dir)?;
    let mut copied = 0;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name_str) = name.to_str() else { continue };
        if !matches(name_str) {
            continue;
        }
        let src = entry.path();
        let dst = dst_dir.join(&name);
        copy_entry(&src, &dst)?;
        copied += 1;
    }
    Ok(copied)
}

/// Copy one file or symlink. Existing destinations are replaced, so
/// re-running an install overwrites deterministically.
fn copy_entry(src: &Path, dst: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(src)?;
    if let Ok(existing) = dst.symlink_metadata() {
        if existing.is_dir() {
            fs::remove_dir_all(dst)?;
        } else {
            fs::remove_file(dst)?;
        }
    }
    if meta.file_type().is_symlink() {
        let target = fs::read_link(src)?;
        std::os::unix::fs::symlink(target, dst)?;
    } else if meta.is_dir() {
        copy_dir_recursive(src, dst)?;
    } else {
        fs::copy(src, dst)?;
    }
    Ok(())
}

/// Recursive directory copy preserving symlinks.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        copy_entry(&entry.path(), &dst.join(entry.file_name()))?;
    }
    Ok(())
}

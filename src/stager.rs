//! Archive staging: fetch or locate toolkit/companion archives and
//! validate them before anything downstream trusts them.
//!
//! Downloads go to a `.part` file and resume with an HTTP Range request;
//! the file is renamed into place only when the transfer completes.
//! Transport failures abort the run — re-invocation re-probes and resumes
//! from the kept partial.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use console::style;
use inquire::Text;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_LENGTH, RANGE};
use reqwest::StatusCode;

use crate::archive;
use crate::catalog::SourceLocator;
use crate::context::InstallContext;
use crate::error::{CudaupError, Result};
use crate::progress;

/// Ensure the toolkit runfile is staged in the WorkArea and return its
/// path. An already-staged copy is reused as-is; runfiles carry their own
/// internal verification, so there is no container check here.
pub fn ensure_toolkit(ctx: &InstallContext) -> Result<PathBuf> {
    let dest = ctx.toolkit_archive_path()?;
    if dest.is_file() {
        return Ok(dest);
    }
    acquire(&ctx.toolkit.source, &dest)?;
    Ok(dest)
}

/// Ensure the companion archive is staged *and valid*. A staged copy from
/// a prior run is never silently trusted: if it fails container
/// validation it is deleted and re-acquired once; if the fresh copy still
/// fails and the session is interactive, the operator may supply a local
/// path as the fallback source.
pub fn ensure_companion(ctx: &InstallContext, interactive: bool) -> Result<PathBuf> {
    let dest = ctx.companion_archive_path()?;

    if dest.is_file() {
        if archive::is_valid_container(&dest) {
            return Ok(dest);
        }
        println!(
            "{} staged archive failed validation, re-acquiring: {}",
            style("warning:").yellow().bold(),
            dest.display()
        );
        std::fs::remove_file(&dest)?;
    }

    acquire(&ctx.companion.source, &dest)?;
    if archive::is_valid_container(&dest) {
        return Ok(dest);
    }
    std::fs::remove_file(&dest)?;

    if interactive {
        let input = Text::new("Archive is not a valid tar.xz/tar.gz. Path to a local copy:")
            .prompt()?;
        let fallback = SourceLocator::parse(input.trim());
        acquire(&fallback, &dest)?;
        if archive::is_valid_container(&dest) {
            return Ok(dest);
        }
        std::fs::remove_file(&dest)?;
    }

    Err(CudaupError::InvalidArchive {
        path: dest.display().to_string(),
        reason: "acquired archive failed container validation".to_string(),
    })
}

/// Fetch a URL or copy a local file into the staging destination.
fn acquire(source: &SourceLocator, dest: &Path) -> Result<()> {
    match source {
        SourceLocator::Url(url) => download(url, dest),
        SourceLocator::LocalPath(path) => {
            if !path.is_file() {
                return Err(CudaupError::BadSource {
                    spec: path.display().to_string(),
                    reason: "local source file does not exist".to_string(),
                });
            }
            std::fs::copy(path, dest)?;
            Ok(())
        }
    }
}

/// Blocking download with byte-range resume onto `<dest>.part`.
fn download(url: &str, dest: &Path) -> Result<()> {
    let part = dest.with_extension(part_extension(dest));
    let resume_from = part.metadata().map(|m| m.len()).unwrap_or(0);

    let client = Client::builder()
        .build()
        .map_err(|e| transport(url, e.to_string()))?;
    let mut request = client.get(url);
    if resume_from > 0 {
        request = request.header(RANGE, format!("bytes={resume_from}-"));
    }
    let response = request.send().map_err(|e| transport(url, e.to_string()))?;

    let status = response.status();
    let resuming = status == StatusCode::PARTIAL_CONTENT && resume_from > 0;
    if !(status.is_success() || resuming) {
        return Err(transport(url, format!("server returned {status}")));
    }

    let content_length = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    let total = content_length.map(|len| len + if resuming { resume_from } else { 0 });

    let file_name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("archive");
    let bar = progress::download_bar(total, file_name);

    let mut out = if resuming {
        bar.set_position(resume_from);
        OpenOptions::new().append(true).open(&part)?
    } else {
        // Server ignored the range request; start the file over.
        File::create(&part)?
    };

    let mut reader = bar.wrap_read(response);
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| transport(url, e.to_string()))?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
    }
    out.flush()?;
    drop(out);
    bar.finish_and_clear();

    std::fs::rename(&part, dest)?;
    Ok(())
}

fn transport(url: &str, reason: String) -> CudaupError {
    CudaupError::Download {
        url: url.to_string(),
        reason,
    }
}

/// `cuda.run` -> `run.part`-style extension so `.part` lands after the
/// original extension: `cuda_12.6.2_linux.run.part`.
fn part_extension(dest: &Path) -> String {
    match dest.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{ext}.part"),
        None => "part".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_extension_appends() {
        assert_eq!(
            Path::new("/w/cuda_12.6.2_linux.run").with_extension(part_extension(Path::new(
                "/w/cuda_12.6.2_linux.run"
            ))),
            PathBuf::from("/w/cuda_12.6.2_linux.run.part")
        );
        assert_eq!(
            Path::new("/w/cudnn.tar.xz")
                .with_extension(part_extension(Path::new("/w/cudnn.tar.xz"))),
            PathBuf::from("/w/cudnn.tar.xz.part")
        );
    }

    #[test]
    fn test_acquire_local_copy() {
        let temp = tempfile::TempDir::new().unwrap();
        let src = temp.path().join("cudnn.tar.xz");
        std::fs::write(&src, b"payload").unwrap();
        let dest = temp.path().join("staged.tar.xz");
        acquire(&SourceLocator::LocalPath(src), &dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
    }

    #[test]
    fn test_acquire_missing_local_source() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = acquire(
            &SourceLocator::LocalPath(temp.path().join("absent.run")),
            &temp.path().join("dest"),
        )
        .unwrap_err();
        assert!(matches!(err, CudaupError::BadSource { .. }));
    }
}

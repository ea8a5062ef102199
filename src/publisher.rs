//! Environment publication: alternatives registration, linker search
//! path, switcher script, and the system-wide profile fragment.
//!
//! Every responsibility here is independently idempotent: re-running
//! overwrites deterministically and never appends duplicate state. The
//! profile fragment in particular is regenerated in full from the real
//! filesystem on every publish.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use console::style;

use crate::context::InstallContext;
use crate::error::{CudaupError, Result};
use crate::layout::{self, Layout, ALTERNATIVES_NAME};

/// Seam over the OS alternatives mechanism so the registration sequence
/// is testable without the real tool.
pub trait SystemLink {
    fn available(&self) -> bool;
    /// Remove an existing registration for this path. Absence of a prior
    /// registration is not an error.
    fn deregister(&mut self, name: &str, path: &Path) -> Result<()>;
    fn register(&mut self, link: &Path, name: &str, path: &Path, priority: u32) -> Result<()>;
    /// Explicitly select the path as current.
    fn select(&mut self, name: &str, path: &Path) -> Result<()>;
}

/// Production implementation shelling out to `update-alternatives`.
/// `CUDAUP_ALT_DIR` / `CUDAUP_ALT_ADMIN_DIR` map to `--altdir` /
/// `--admindir` for sandboxed operation.
pub struct UpdateAlternatives {
    program: Option<PathBuf>,
    altdir: Option<String>,
    admindir: Option<String>,
}

impl UpdateAlternatives {
    pub fn from_env() -> Self {
        Self {
            program: which::which("update-alternatives").ok(),
            altdir: std::env::var("CUDAUP_ALT_DIR").ok(),
            admindir: std::env::var("CUDAUP_ALT_ADMIN_DIR").ok(),
        }
    }

    fn run(&self, args: &[String]) -> Result<()> {
        let Some(program) = &self.program else {
            return Err(CudaupError::ToolMissing {
                tool: "update-alternatives".to_string(),
            });
        };
        let mut command = Command::new(program);
        if let Some(altdir) = &self.altdir {
            command.arg("--altdir").arg(altdir);
        }
        if let Some(admindir) = &self.admindir {
            command.arg("--admindir").arg(admindir);
        }
        let output = command.args(args).output().map_err(|e| {
            CudaupError::CommandFailed {
                command: format!("update-alternatives {}", args.join(" ")),
                reason: e.to_string(),
            }
        })?;
        if !output.status.success() {
            return Err(CudaupError::CommandFailed {
                command: format!("update-alternatives {}", args.join(" ")),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl SystemLink for UpdateAlternatives {
    fn available(&self) -> bool {
        self.program.is_some()
    }

    fn deregister(&mut self, name: &str, path: &Path) -> Result<()> {
        self.run(&[
            "--remove".to_string(),
            name.to_string(),
            path.display().to_string(),
        ])
    }

    fn register(&mut self, link: &Path, name: &str, path: &Path, priority: u32) -> Result<()> {
        self.run(&[
            "--install".to_string(),
            link.display().to_string(),
            name.to_string(),
            path.display().to_string(),
            priority.to_string(),
        ])
    }

    fn select(&mut self, name: &str, path: &Path) -> Result<()> {
        self.run(&[
            "--set".to_string(),
            name.to_string(),
            path.display().to_string(),
        ])
    }
}

/// Publish the environment for the context's install root.
pub fn publish(ctx: &InstallContext, link: &mut dyn SystemLink) -> Result<()> {
    let family = &ctx.toolkit.family;
    let root = ctx.install_root();

    register_alternative(&ctx.layout, link, family, &root)?;
    write_ld_conf(&ctx.layout, family, &root)?;
    refresh_linker_cache();
    write_switcher(&ctx.layout, family, &root)?;
    write_profile(&ctx.layout, family)?;
    Ok(())
}

/// Deregister-then-reregister so a re-publish refreshes the priority,
/// then select the root as current. Hosts without the tool get the rest
/// of the environment and a visible warning.
fn register_alternative(
    layout: &Layout,
    link: &mut dyn SystemLink,
    family: &str,
    root: &Path,
) -> Result<()> {
    if !link.available() {
        println!(
            "{} update-alternatives not found, skipping alternatives registration",
            style("warning:").yellow().bold()
        );
        return Ok(());
    }
    let priority = layout::alternatives_priority(family)?;
    let _ = link.deregister(ALTERNATIVES_NAME, root);
    link.register(&layout.alternatives_link(), ALTERNATIVES_NAME, root, priority)?;
    link.select(ALTERNATIVES_NAME, root)?;
    Ok(())
}

fn write_ld_conf(layout: &Layout, family: &str, root: &Path) -> Result<()> {
    let path = layout.ld_conf_path(family);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = format!(
        "{}\n{}\n",
        root.join("lib64").display(),
        root.join("extras/CUPTI/lib64").display()
    );
    fs::write(&path, content)?;
    Ok(())
}

/// Cache refresh needs root; the conf fragment is the durable artifact,
/// so a failing or missing ldconfig is a warning, not a stage failure.
fn refresh_linker_cache() {
    let Ok(ldconfig) = which::which("ldconfig") else {
        println!(
            "{} ldconfig not found, linker cache not refreshed",
            style("warning:").yellow().bold()
        );
        return;
    };
    match Command::new(&ldconfig).output() {
        Ok(output) if output.status.success() => {}
        _ => {
            println!(
                "{} ldconfig failed (run it as root to refresh the linker cache)",
                style("warning:").yellow().bold()
            );
        }
    }
}

fn write_switcher(layout: &Layout, family: &str, root: &Path) -> Result<()> {
    let path = layout.switcher_path(family);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, render_switcher(family, root))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

/// The `use-<tag>` script: export the toolkit root, prepend its bin and
/// lib directories to the search paths, and point compiler/linker flags
/// at this InstallRoot.
pub fn render_switcher(family: &str, root: &Path) -> String {
    let root = root.display();
    format!(
        "#!/bin/sh\n\
         # use-{tag}: select CUDA {family} for the current shell.\n\
         # Generated by cudaup; source this file, do not execute it.\n\
         export CUDA_HOME=\"{root}\"\n\
         export CUDA_PATH=\"{root}\"\n\
         export PATH=\"{root}/bin:$PATH\"\n\
         export LD_LIBRARY_PATH=\"{root}/lib64:${{LD_LIBRARY_PATH:-}}\"\n\
         export CPPFLAGS=\"-I{root}/include ${{CPPFLAGS:-}}\"\n\
         export LDFLAGS=\"-L{root}/lib64 ${{LDFLAGS:-}}\"\n",
        tag = layout::family_tag(family),
    )
}

fn write_profile(layout: &Layout, current_family: &str) -> Result<()> {
    let path = layout.profile_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let roots = layout.discovered_roots();
    fs::write(&path, render_profile(&roots, current_family, layout))?;
    Ok(())
}

/// The system-wide profile fragment: every discovered install root on the
/// machine, with the just-installed family as the default. Always the
/// full regeneration, so the file cannot drift from the filesystem.
pub fn render_profile(
    roots: &[(String, PathBuf)],
    current_family: &str,
    layout: &Layout,
) -> String {
    let mut out = String::from(
        "# Generated by cudaup. Do not edit; regenerated on every install.\n",
    );
    for (family, root) in roots {
        out.push_str(&format!(
            "# CUDA {family} installed at {}\n",
            root.display()
        ));
    }
    let current = layout.install_root(current_family);
    out.push_str(&format!(
        "export CUDA_HOME=\"{root}\"\n\
         export CUDA_PATH=\"{root}\"\n\
         export PATH=\"{root}/bin:$PATH\"\n\
         export LD_LIBRARY_PATH=\"{root}/lib64:${{LD_LIBRARY_PATH:-}}\"\n",
        root = current.display()
    ));
    out
}

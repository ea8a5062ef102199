//! Install command: resolve, gate, probe, then drive the stage executor.

use console::style;

use crate::catalog::{Catalog, CompanionDescriptor, SourceLocator, VersionDescriptor};
use crate::cli::InstallArgs;
use crate::context::InstallContext;
use crate::driver;
use crate::error::Result;
use crate::executor;
use crate::layout::Layout;
use crate::preflight;
use crate::probe;
use crate::publisher::UpdateAlternatives;
use crate::workarea::WorkArea;
use crate::commands::menu;

pub fn run(layout: Layout, args: InstallArgs) -> Result<()> {
    preflight::check(&layout)?;

    let mut catalog = Catalog::builtin();
    let version = match &args.version {
        Some(v) => v.clone(),
        None => menu::select_version(&catalog)?,
    };
    let (toolkit, companion) = resolve_descriptors(&mut catalog, &version, &args)?;

    let reported = driver::query_driver_version()?;
    driver::check_compatibility(&catalog, &toolkit, &reported, args.allow_unsupported_driver)?;

    let archive_names = vec![toolkit.source.file_name()?, companion.source.file_name()?];
    let (workarea, hint) = WorkArea::prepare(&layout, &archive_names)?;
    if let Some(hint) = &hint {
        println!(
            "{} previous attempt for {} reached '{}'",
            style("resume:").cyan().bold(),
            hint.version,
            hint.stage
        );
    }

    let ctx = InstallContext::new(layout, toolkit, companion, workarea);
    let start = probe::classify(&ctx)?;
    println!(
        "{} CUDA {} (family {}) with cuDNN {}, driver {}",
        style("==>").green().bold(),
        ctx.toolkit.version,
        ctx.toolkit.family,
        ctx.companion.version,
        reported
    );
    println!("    install root:  {}", ctx.install_root().display());
    println!("    starting from: {start}");

    let mut link = UpdateAlternatives::from_env();
    let interactive = console::user_attended();
    executor::run(&ctx, &mut link, interactive)?;

    println!(
        "{} CUDA {} is installed. Select it in a shell with: . {}",
        style("success:").green().bold(),
        ctx.toolkit.version,
        ctx.layout.switcher_path(&ctx.toolkit.family).display()
    );
    Ok(())
}

/// Resolve the toolkit and companion descriptors, applying operator
/// overrides. A version absent from the catalog is registered on the fly
/// when `--toolkit-source` and `--family` are given; otherwise the lookup
/// error (with the sorted known-version list) propagates.
fn resolve_descriptors(
    catalog: &mut Catalog,
    version: &str,
    args: &InstallArgs,
) -> Result<(VersionDescriptor, CompanionDescriptor)> {
    if catalog.resolve(version).is_err() {
        if let (Some(source), Some(family)) = (&args.toolkit_source, &args.family) {
            catalog.register(VersionDescriptor {
                version: version.to_string(),
                family: family.clone(),
                source: SourceLocator::parse(source),
                min_driver: args.min_driver.clone().unwrap_or_else(|| "0".to_string()),
            });
        }
    }
    let mut toolkit = catalog.resolve(version)?.clone();
    if let Some(source) = &args.toolkit_source {
        toolkit.source = SourceLocator::parse(source);
    }
    if let Some(family) = &args.family {
        toolkit.family = family.clone();
    }
    if let Some(min_driver) = &args.min_driver {
        toolkit.min_driver = min_driver.clone();
    }

    if let Some(source) = &args.cudnn_source {
        let cudnn_version = args
            .cudnn_version
            .clone()
            .or_else(|| {
                catalog
                    .companion_for(&toolkit.family)
                    .ok()
                    .map(|c| c.version.clone())
            })
            .unwrap_or_else(|| "custom".to_string());
        catalog.register_companion(CompanionDescriptor {
            family: toolkit.family.clone(),
            version: cudnn_version,
            source: SourceLocator::parse(source),
        });
    }
    let mut companion = catalog.companion_for(&toolkit.family)?.clone();
    if let Some(cudnn_version) = &args.cudnn_version {
        companion.version = cudnn_version.clone();
    }
    Ok((toolkit, companion))
}

//! List command: catalog versions with their classified stages.

use console::style;

use crate::catalog::Catalog;
use crate::cli::ListArgs;
use crate::context::InstallContext;
use crate::error::Result;
use crate::layout::Layout;
use crate::probe::{self, InstallationStage};
use crate::workarea::WorkArea;

pub fn run(layout: Layout, args: ListArgs) -> Result<()> {
    let catalog = Catalog::builtin();
    let workarea = WorkArea::handle(&layout);

    println!(
        "{:<9} {:<7} {:<13} {:<11} stage",
        "version", "family", "min driver", "cuDNN"
    );
    for descriptor in catalog.descriptors_sorted() {
        let companion = catalog.companion_for(&descriptor.family)?;
        let ctx = InstallContext::new(
            layout.clone(),
            descriptor.clone(),
            companion.clone(),
            workarea.clone(),
        );
        let stage = probe::classify(&ctx)?;
        if args.installed && stage == InstallationStage::Start {
            continue;
        }
        let stage_display = match stage {
            InstallationStage::Complete => style(stage.to_string()).green(),
            InstallationStage::Start => style(stage.to_string()).dim(),
            _ => style(stage.to_string()).yellow(),
        };
        println!(
            "{:<9} {:<7} {:<13} {:<11} {}",
            descriptor.version,
            descriptor.family,
            descriptor.min_driver,
            companion.version,
            stage_display
        );
    }
    Ok(())
}

//! Status command: the classified stage and the evidence behind it.

use console::style;

use crate::catalog::Catalog;
use crate::cli::StatusArgs;
use crate::context::InstallContext;
use crate::error::Result;
use crate::layout::Layout;
use crate::probe;
use crate::workarea::WorkArea;

pub fn run(layout: Layout, args: StatusArgs) -> Result<()> {
    let catalog = Catalog::builtin();
    let toolkit = catalog.resolve(&args.version)?.clone();
    let companion = catalog.companion_for(&toolkit.family)?.clone();
    let workarea = WorkArea::handle(&layout);
    let ctx = InstallContext::new(layout, toolkit, companion, workarea);

    let evidence = probe::inspect(&ctx)?;
    println!(
        "CUDA {} (family {}): stage {}",
        ctx.toolkit.version,
        ctx.toolkit.family,
        style(evidence.stage.to_string()).bold()
    );
    println!("  install root:      {}", ctx.install_root().display());
    print_check("root exists", evidence.root_exists);
    print_check("nvcc reports family", evidence.nvcc_reports_family);
    print_check("cudnn.h present", evidence.header_present);
    print_check("libcudnn.so present", evidence.shared_lib_present);
    print_check("switcher script", evidence.switcher_present);
    print_check("toolkit archive staged", evidence.toolkit_archive_staged);
    print_check("cuDNN archive staged+valid", evidence.companion_archive_valid);
    Ok(())
}

fn print_check(label: &str, ok: bool) {
    let mark = if ok {
        style("yes").green()
    } else {
        style("no").dim()
    };
    println!("  {label:<26} {mark}");
}

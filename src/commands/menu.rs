//! Interactive catalog menu shown when `install` is given no version.

use inquire::Select;

use crate::catalog::Catalog;
use crate::error::Result;

pub fn select_version(catalog: &Catalog) -> Result<String> {
    let descriptors = catalog.descriptors_sorted();
    let items: Vec<String> = descriptors
        .iter()
        .map(|d| {
            format!(
                "{:<8} family {:<5} driver >= {}",
                d.version, d.family, d.min_driver
            )
        })
        .collect();

    let chosen = Select::new("Select a CUDA version to install", items.clone()).prompt()?;
    let index = items.iter().position(|i| *i == chosen).unwrap_or(0);
    Ok(descriptors[index].version.clone())
}

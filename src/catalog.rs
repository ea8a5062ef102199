//! Version catalog: the immutable map from toolkit versions to descriptors.
//!
//! Built once at startup and injected into whatever needs it; there is no
//! global table. Pure lookups, no I/O. Runtime registration is the escape
//! hatch for versions newer than the built-in catalog.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{CudaupError, Result};

const NVIDIA_CUDA: &str = "https://developer.download.nvidia.com/compute/cuda";
const NVIDIA_CUDNN: &str =
    "https://developer.download.nvidia.com/compute/cudnn/redist/cudnn/linux-x86_64";

/// Where an archive comes from: an HTTP(S) URL or a local file.
/// Anything not starting with a URL scheme is treated as a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
    Url(String),
    LocalPath(PathBuf),
}

impl SourceLocator {
    pub fn parse(input: &str) -> Self {
        if input.starts_with("http://") || input.starts_with("https://") {
            SourceLocator::Url(input.to_string())
        } else {
            SourceLocator::LocalPath(PathBuf::from(input))
        }
    }

    /// The archive file name this source yields when staged.
    pub fn file_name(&self) -> Result<String> {
        let (name, source) = match self {
            SourceLocator::Url(url) => (url.rsplit('/').next(), url.as_str()),
            SourceLocator::LocalPath(path) => (
                path.file_name().and_then(|n| n.to_str()),
                path.to_str().unwrap_or(""),
            ),
        };
        match name {
            Some(n) if !n.is_empty() => Ok(n.to_string()),
            _ => Err(CudaupError::BadSource {
                spec: source.to_string(),
                reason: "source has no file name component".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceLocator::Url(url) => write!(f, "{url}"),
            SourceLocator::LocalPath(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A resolved toolkit version. Immutable once resolved, created once per
/// run from a catalog lookup.
#[derive(Debug, Clone)]
pub struct VersionDescriptor {
    /// Full version string, e.g. "12.6.2".
    pub version: String,
    /// major.minor family the version belongs to, e.g. "12.6".
    pub family: String,
    /// Where the runfile installer comes from.
    pub source: SourceLocator,
    /// Minimum compatible driver, e.g. "560.35.03".
    pub min_driver: String,
}

/// The companion (cuDNN) release paired with a toolkit family.
#[derive(Debug, Clone)]
pub struct CompanionDescriptor {
    /// Family this companion belongs to.
    pub family: String,
    /// cuDNN version string, e.g. "9.5.1.17".
    pub version: String,
    /// Where the cuDNN archive comes from.
    pub source: SourceLocator,
}

/// Version -> descriptor and family -> companion maps.
#[derive(Debug, Default)]
pub struct Catalog {
    versions: BTreeMap<String, VersionDescriptor>,
    companions: BTreeMap<String, CompanionDescriptor>,
}

impl Catalog {
    /// The built-in catalog: one toolkit descriptor and one companion
    /// per family, with real distribution URLs.
    pub fn builtin() -> Self {
        let mut catalog = Catalog::default();
        let toolkits = [
            ("11.8.0", "11.8", "520.61.05", "cuda_11.8.0_520.61.05_linux.run"),
            ("12.1.1", "12.1", "530.30.02", "cuda_12.1.1_530.30.02_linux.run"),
            ("12.4.1", "12.4", "550.54.15", "cuda_12.4.1_550.54.15_linux.run"),
            ("12.6.2", "12.6", "560.35.03", "cuda_12.6.2_560.35.03_linux.run"),
            ("12.8.1", "12.8", "570.124.06", "cuda_12.8.1_570.124.06_linux.run"),
            ("13.0.0", "13.0", "580.65.06", "cuda_13.0.0_580.65.06_linux.run"),
        ];
        for (version, family, min_driver, runfile) in toolkits {
            catalog.register(VersionDescriptor {
                version: version.to_string(),
                family: family.to_string(),
                source: SourceLocator::Url(format!(
                    "{NVIDIA_CUDA}/{version}/local_installers/{runfile}"
                )),
                min_driver: min_driver.to_string(),
            });
        }
        let companions = [
            ("11.8", "8.9.7.29", "cuda11"),
            ("12.1", "9.1.0.70", "cuda12"),
            ("12.4", "9.4.0.58", "cuda12"),
            ("12.6", "9.5.1.17", "cuda12"),
            ("12.8", "9.8.0.87", "cuda12"),
            ("13.0", "9.12.0.46", "cuda13"),
        ];
        for (family, version, cuda_tag) in companions {
            catalog.register_companion(CompanionDescriptor {
                family: family.to_string(),
                version: version.to_string(),
                source: SourceLocator::Url(format!(
                    "{NVIDIA_CUDNN}/cudnn-linux-x86_64-{version}_{cuda_tag}-archive.tar.xz"
                )),
            });
        }
        catalog
    }

    /// Register (or replace) a toolkit descriptor. This is how operator
    /// overrides install versions the built-in catalog has never heard of.
    pub fn register(&mut self, descriptor: VersionDescriptor) {
        self.versions.insert(descriptor.version.clone(), descriptor);
    }

    /// Register (or replace) the companion mapping for a family.
    pub fn register_companion(&mut self, descriptor: CompanionDescriptor) {
        self.companions.insert(descriptor.family.clone(), descriptor);
    }

    /// Look up a toolkit version. `NotFound` carries the full sorted list
    /// of known versions so the caller can pick a valid one.
    pub fn resolve(&self, version: &str) -> Result<&VersionDescriptor> {
        self.versions
            .get(version)
            .ok_or_else(|| CudaupError::UnknownVersion {
                version: version.to_string(),
                known: self.known_versions().join(", "),
            })
    }

    /// Look up the companion release for a family.
    pub fn companion_for(&self, family: &str) -> Result<&CompanionDescriptor> {
        self.companions
            .get(family)
            .ok_or_else(|| CudaupError::NoCompanion {
                family: family.to_string(),
            })
    }

    /// Every family in the version table must have exactly one companion.
    pub fn validate(&self) -> Result<()> {
        for descriptor in self.versions.values() {
            self.companion_for(&descriptor.family)?;
        }
        Ok(())
    }

    /// Known version identifiers, sorted by version ordering.
    pub fn known_versions(&self) -> Vec<String> {
        let mut versions: Vec<String> = self.versions.keys().cloned().collect();
        versions.sort_by_key(|v| version_sort_key(v));
        versions
    }

    /// Descriptors sorted by version ordering, for menus and listings.
    pub fn descriptors_sorted(&self) -> Vec<&VersionDescriptor> {
        let mut descriptors: Vec<&VersionDescriptor> = self.versions.values().collect();
        descriptors.sort_by_key(|d| version_sort_key(&d.version));
        descriptors
    }

    /// Catalog versions whose minimum-driver requirement the given driver
    /// major satisfies, under the same major-only comparison the
    /// compatibility gate uses.
    pub fn versions_satisfied_by(&self, driver_major: u64) -> Vec<String> {
        self.descriptors_sorted()
            .into_iter()
            .filter(|d| {
                crate::driver::leading_major(&d.min_driver)
                    .is_some_and(|required| driver_major >= required)
            })
            .map(|d| d.version.clone())
            .collect()
    }
}

/// Sort key over full version strings. Catalog versions are semver-shaped;
/// anything that is not parses to the zero version and sorts first.
fn version_sort_key(version: &str) -> semver::Version {
    semver::Version::parse(version).unwrap_or_else(|_| semver::Version::new(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_resolves_known_version() {
        let catalog = Catalog::builtin();
        let d = catalog.resolve("12.6.2").unwrap();
        assert_eq!(d.family, "12.6");
        assert_eq!(d.min_driver, "560.35.03");
        assert!(matches!(&d.source, SourceLocator::Url(u) if u.ends_with(".run")));
    }

    #[test]
    fn test_unknown_version_lists_known_sorted() {
        let catalog = Catalog::builtin();
        let err = catalog.resolve("99.0.0").unwrap_err();
        let msg = err.to_string();
        // Sorted by version ordering, so 11.8.0 precedes 12.1.1 precedes 13.0.0
        let i118 = msg.find("11.8.0").unwrap();
        let i121 = msg.find("12.1.1").unwrap();
        let i130 = msg.find("13.0.0").unwrap();
        assert!(i118 < i121 && i121 < i130);
    }

    #[test]
    fn test_every_family_has_companion() {
        let catalog = Catalog::builtin();
        catalog.validate().unwrap();
    }

    #[test]
    fn test_companion_for_family() {
        let catalog = Catalog::builtin();
        let c = catalog.companion_for("12.6").unwrap();
        assert_eq!(c.version, "9.5.1.17");
        let err = catalog.companion_for("10.2").unwrap_err();
        assert!(matches!(err, CudaupError::NoCompanion { .. }));
    }

    #[test]
    fn test_register_custom_version() {
        let mut catalog = Catalog::builtin();
        catalog.register(VersionDescriptor {
            version: "13.2.0".to_string(),
            family: "13.2".to_string(),
            source: SourceLocator::parse("/srv/cuda_13.2.0_linux.run"),
            min_driver: "590.00".to_string(),
        });
        catalog.register_companion(CompanionDescriptor {
            family: "13.2".to_string(),
            version: "9.13.0.1".to_string(),
            source: SourceLocator::parse("/srv/cudnn-13.2.tar.xz"),
        });
        catalog.validate().unwrap();
        assert_eq!(catalog.resolve("13.2.0").unwrap().family, "13.2");
    }

    #[test]
    fn test_register_overrides_builtin_companion() {
        let mut catalog = Catalog::builtin();
        catalog.register_companion(CompanionDescriptor {
            family: "12.6".to_string(),
            version: "9.6.0.0".to_string(),
            source: SourceLocator::parse("./cudnn.tar.xz"),
        });
        assert_eq!(catalog.companion_for("12.6").unwrap().version, "9.6.0.0");
    }

    #[test]
    fn test_source_locator_parse() {
        assert!(matches!(
            SourceLocator::parse("https://example.com/a.run"),
            SourceLocator::Url(_)
        ));
        assert!(matches!(
            SourceLocator::parse("/srv/archives/a.run"),
            SourceLocator::LocalPath(_)
        ));
        assert!(matches!(
            SourceLocator::parse("relative/a.run"),
            SourceLocator::LocalPath(_)
        ));
    }

    #[test]
    fn test_source_locator_file_name() {
        let url = SourceLocator::parse("https://example.com/d/cuda_12.6.2_560.35.03_linux.run");
        assert_eq!(url.file_name().unwrap(), "cuda_12.6.2_560.35.03_linux.run");
        let path = SourceLocator::parse("/srv/cudnn.tar.xz");
        assert_eq!(path.file_name().unwrap(), "cudnn.tar.xz");
        assert!(SourceLocator::parse("https://example.com/").file_name().is_err());
    }

    #[test]
    fn test_versions_satisfied_by_driver_major() {
        let catalog = Catalog::builtin();
        // A 535 driver satisfies 11.8 (520) and 12.1 (530) but not 12.4 (550)
        let ok = catalog.versions_satisfied_by(535);
        assert_eq!(ok, vec!["11.8.0", "12.1.1"]);
        // Nothing below the oldest requirement
        assert!(catalog.versions_satisfied_by(470).is_empty());
    }
}

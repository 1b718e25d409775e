//! Installed Office suite as reported by OS inspection.

use super::core::VirtualPackage;
use super::types::{Family, PackageKind};

/// Language code that always travels with the core package.
pub const BUILTIN_LANGUAGE: &str = "en-US";

/// One detected Office suite install.
///
/// This is the shape the OS inspection collaborator reports: family,
/// version and the language packs present for that version.
///
/// # Example
///
/// ```
/// use lomanager::package::{Family, InstalledOffice};
///
/// let office = InstalledOffice::new(Family::LibreOffice, "7.4", ["fr", "en-US"]);
/// let packages = office.to_virtual_packages();
///
/// // Core package plus `fr`; `en-US` travels with the core.
/// assert_eq!(packages.len(), 2);
/// assert!(packages.iter().all(|p| p.installed));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledOffice {
    /// OpenOffice or LibreOffice.
    pub family: Family,

    /// Installed version.
    pub version: String,

    /// Installed language pack codes.
    pub langs: Vec<String>,
}

impl InstalledOffice {
    /// Create a new detected install.
    pub fn new<I, S>(family: Family, version: impl Into<String>, langs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            family,
            version: version.into(),
            langs: langs.into_iter().map(Into::into).collect(),
        }
    }

    /// Expand into installed virtual packages: the core first, then one
    /// package per language (excluding `en-US`, deduplicated).
    pub fn to_virtual_packages(&self) -> Vec<VirtualPackage> {
        let mut packages =
            vec![VirtualPackage::core(self.family, self.version.clone()).with_installed(true)];

        for lang in &self.langs {
            if lang == BUILTIN_LANGUAGE {
                continue;
            }
            let pkg = VirtualPackage::new(
                PackageKind::Lang(lang.clone()),
                self.family,
                self.version.clone(),
            )
            .with_installed(true);
            if !packages.contains(&pkg) {
                packages.push(pkg);
            }
        }

        packages
    }
}

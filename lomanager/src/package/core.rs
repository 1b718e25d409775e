//! Virtual package type.
//!
//! A [`VirtualPackage`] is the atomic selectable unit: a bundle of one or
//! more real OS packages that are always installed or removed together.

use std::fmt;

use super::flags::PackageFlags;
use super::types::{Family, PackageKind, RealComponent};

/// Removal choice held by a package before a version transition locked it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedRemoval {
    pub marked: bool,
    pub enabled: bool,
}

impl SavedRemoval {
    pub fn of(flags: &PackageFlags) -> Self {
        Self {
            marked: flags.marked_for_removal,
            enabled: flags.remove_enabled,
        }
    }
}

/// A bundle of real packages treated as one unit.
///
/// Identity (and therefore equality) is `(kind, family, version)`; flags,
/// components and the installed state do not take part in comparisons.
/// This is what allows subtracting installed packages from the available
/// list.
///
/// # Example
///
/// ```
/// use lomanager::package::{Family, PackageKind, VirtualPackage};
///
/// let installed = VirtualPackage::new(PackageKind::Core, Family::LibreOffice, "7.5")
///     .with_installed(true);
/// let available = VirtualPackage::new(PackageKind::Core, Family::LibreOffice, "7.5");
///
/// assert_eq!(installed, available);
/// assert_eq!(installed.label(), "LibreOffice 7.5 core-packages");
/// ```
#[derive(Debug, Clone)]
pub struct VirtualPackage {
    /// Core bundle or language pack.
    pub kind: PackageKind,

    /// Software family.
    pub family: Family,

    /// Dot-separated version string.
    pub version: String,

    /// Distributable artifacts this bundle maps to.
    pub real_components: Vec<RealComponent>,

    /// Whether the package is present on the system.
    ///
    /// Set once when the tree is built.
    pub installed: bool,

    /// Selection flags.
    pub flags: PackageFlags,

    /// Set while a newer version holds this package locked for removal.
    pub saved_removal: Option<SavedRemoval>,
}

impl VirtualPackage {
    /// Create a not-installed package with no components and cleared flags.
    pub fn new(kind: PackageKind, family: Family, version: impl Into<String>) -> Self {
        Self {
            kind,
            family,
            version: version.into(),
            real_components: Vec::new(),
            installed: false,
            flags: PackageFlags::default(),
            saved_removal: None,
        }
    }

    /// Shorthand for a core package.
    pub fn core(family: Family, version: impl Into<String>) -> Self {
        Self::new(PackageKind::Core, family, version)
    }

    /// Shorthand for a LibreOffice language pack.
    pub fn lang(code: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(PackageKind::Lang(code.into()), Family::LibreOffice, version)
    }

    /// Set the installed state (builder pattern).
    pub fn with_installed(mut self, installed: bool) -> Self {
        self.installed = installed;
        self
    }

    /// Attach real components (builder pattern).
    pub fn with_components(mut self, components: Vec<RealComponent>) -> Self {
        self.real_components = components;
        self
    }

    /// Whether this is a core bundle.
    pub fn is_core(&self) -> bool {
        self.kind == PackageKind::Core
    }

    /// Whether this is a LibreOffice language pack.
    pub fn is_lang_pack(&self) -> bool {
        self.family == Family::LibreOffice && !self.is_core()
    }

    /// Make the removal option available.
    pub fn allow_removal(&mut self) {
        self.flags.removable = true;
        self.flags.remove_visible = true;
        self.flags.remove_enabled = true;
    }

    /// Make the install option available.
    pub fn allow_install(&mut self) {
        self.flags.installable = true;
        self.flags.install_visible = true;
        self.flags.install_enabled = true;
    }

    /// Forbid every operation on this package.
    pub fn disallow_operations(&mut self) {
        self.flags.reset();
        self.saved_removal = None;
    }

    /// Sum of the declared sizes of all real components.
    pub fn total_size(&self) -> u64 {
        self.real_components.iter().map(|c| c.size).sum()
    }

    /// Human-readable label, e.g. `LibreOffice 7.5.4.2 fr`.
    pub fn label(&self) -> String {
        format!("{} {} {}", self.family, self.version, self.kind)
    }
}

impl PartialEq for VirtualPackage {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.family == other.family && self.version == other.version
    }
}

impl Eq for VirtualPackage {}

impl fmt::Display for VirtualPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_state() {
        let mut a = VirtualPackage::lang("fr", "7.5").with_installed(true);
        a.allow_removal();
        let b = VirtualPackage::lang("fr", "7.5");
        let c = VirtualPackage::lang("de", "7.5");
        let d = VirtualPackage::lang("fr", "7.4");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_lang_pack_detection() {
        assert!(VirtualPackage::lang("fr", "7.5").is_lang_pack());
        assert!(!VirtualPackage::core(Family::LibreOffice, "7.5").is_lang_pack());
        assert!(!VirtualPackage::new(
            PackageKind::Lang("fr".to_string()),
            Family::OpenOffice,
            "3.2"
        )
        .is_lang_pack());
    }

    #[test]
    fn test_allow_and_disallow() {
        let mut pkg = VirtualPackage::core(Family::Clipart, "5.8");
        pkg.allow_install();
        pkg.allow_removal();
        assert!(pkg.flags.install_enabled && pkg.flags.remove_visible);

        pkg.disallow_operations();
        assert_eq!(pkg.flags, PackageFlags::default());
    }

    #[test]
    fn test_total_size() {
        let pkg = VirtualPackage::core(Family::LibreOffice, "7.5").with_components(vec![
            RealComponent::new("a.tar.gz", "http://x/a.tar.gz", 100),
            RealComponent::new("b.tar.gz", "http://x/b.tar.gz", 23),
        ]);
        assert_eq!(pkg.total_size(), 123);
    }

    #[test]
    fn test_display() {
        let pkg = VirtualPackage::lang("ca-valencia", "7.5.4.2");
        assert_eq!(pkg.to_string(), "LibreOffice 7.5.4.2 ca-valencia");
    }
}

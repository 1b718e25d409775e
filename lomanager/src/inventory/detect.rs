//! Installed software detection.

use tracing::debug;

use crate::package::{Family, VirtualPackage};
use crate::system::SystemInspector;

/// Flat list of installed virtual packages, all with `installed = true`.
///
/// Order: Java, Office suites as reported (core before its languages),
/// Clipart.
pub fn detect_installed(inspector: &dyn SystemInspector) -> Vec<VirtualPackage> {
    let mut packages = Vec::new();

    if let Some(version) = inspector.detect_installed_java() {
        debug!(%version, "Java detected");
        packages.push(VirtualPackage::core(Family::Java, version).with_installed(true));
    }

    for office in inspector.detect_installed_office() {
        debug!(family = %office.family, version = %office.version, langs = ?office.langs, "Office detected");
        packages.extend(office.to_virtual_packages());
    }

    if let Some(version) = inspector.detect_installed_clipart() {
        debug!(%version, "Clipart detected");
        packages.push(VirtualPackage::core(Family::Clipart, version).with_installed(true));
    }

    packages
}

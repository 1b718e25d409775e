//! What a procedure run will do.
//!
//! A [`ProcedurePlan`] is a snapshot of the tree flags taken when the run
//! starts, split by pipeline step. The procedure works from the plan only,
//! so the tree is free to be rebuilt once the run ends.

use std::path::{Path, PathBuf};

use crate::changeset::{packages_of, ChangeSet};
use crate::inventory::Catalog;
use crate::package::{Family, VirtualPackage};
use crate::tree::PackageTree;

/// Where the package files come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageSource {
    /// Downloaded during the run.
    Network,
    /// Already on disk in the local-copy layout below this directory.
    LocalCopy(PathBuf),
}

impl PackageSource {
    /// Whether files come from a local copy.
    pub fn is_local_copy(&self) -> bool {
        matches!(self, Self::LocalCopy(_))
    }
}

/// Files available for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedPackage {
    pub package: VirtualPackage,
    pub files: Vec<PathBuf>,
}

/// Package files ready to install, grouped by package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedFiles {
    entries: Vec<StagedPackage>,
}

impl StagedFiles {
    /// Record a file for `package`.
    pub fn add(&mut self, package: &VirtualPackage, path: PathBuf) {
        match self.entries.iter_mut().find(|e| e.package == *package) {
            Some(entry) => entry.files.push(path),
            None => self.entries.push(StagedPackage {
                package: package.clone(),
                files: vec![path],
            }),
        }
    }

    /// Files recorded for `package`.
    pub fn files(&self, package: &VirtualPackage) -> &[PathBuf] {
        self.entries
            .iter()
            .find(|e| e.package == *package)
            .map(|e| e.files.as_slice())
            .unwrap_or(&[])
    }

    /// Every staged package in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &StagedPackage> {
        self.entries.iter()
    }

    /// Number of staged files.
    pub fn file_count(&self) -> usize {
        self.entries.iter().map(|e| e.files.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The work of one procedure run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedurePlan {
    pub source: PackageSource,
    /// Packages to fetch. May include Java when a download was forced.
    pub downloads: Vec<VirtualPackage>,
    pub install_java: Option<VirtualPackage>,
    pub remove_office: Vec<VirtualPackage>,
    /// LibreOffice core first, then language packs.
    pub install_office: Vec<VirtualPackage>,
    pub remove_clipart: Vec<VirtualPackage>,
    pub install_clipart: Option<VirtualPackage>,
    /// Keep the package files in the kept-packages directory afterwards.
    pub keep_packages: bool,
    /// Files ready to install. Filled by the collect step for network
    /// installs and by the scan for local copies.
    pub staged: StagedFiles,
}

impl ProcedurePlan {
    fn empty(source: PackageSource, keep_packages: bool) -> Self {
        Self {
            source,
            downloads: Vec::new(),
            install_java: None,
            remove_office: Vec::new(),
            install_office: Vec::new(),
            remove_clipart: Vec::new(),
            install_clipart: None,
            keep_packages,
            staged: StagedFiles::default(),
        }
    }

    /// Plan a network run from the current tree flags.
    ///
    /// With `force_java_download` the Java package is fetched even when it
    /// is installed, so the kept packages form a complete local copy.
    pub fn from_tree(
        tree: &PackageTree,
        catalog: &Catalog,
        keep_packages: bool,
        force_java_download: bool,
    ) -> Self {
        let changes = ChangeSet::from_tree(tree);
        let mut plan = Self::empty(PackageSource::Network, keep_packages);

        plan.downloads = packages_of(tree, &changes.to_download);
        if force_java_download && !plan.downloads.iter().any(|p| p.family == Family::Java) {
            plan.downloads.insert(0, catalog.java());
        }

        for package in packages_of(tree, &changes.to_install) {
            match package.family {
                Family::Java => plan.install_java = Some(package),
                Family::LibreOffice => plan.install_office.push(package),
                Family::Clipart => plan.install_clipart = Some(package),
                Family::OpenOffice => {}
            }
        }
        plan.install_office.sort_by_key(|p| !p.is_core());

        for package in packages_of(tree, &changes.to_remove) {
            match package.family {
                Family::OpenOffice | Family::LibreOffice => plan.remove_office.push(package),
                Family::Clipart => plan.remove_clipart.push(package),
                Family::Java => {}
            }
        }

        plan
    }

    /// An empty local-copy plan. Kept packages are always on.
    pub fn local_copy(dir: &Path) -> Self {
        Self::empty(PackageSource::LocalCopy(dir.to_path_buf()), true)
    }

    /// Whether anything gets installed.
    pub fn has_installs(&self) -> bool {
        self.install_java.is_some() || !self.install_office.is_empty() || self.install_clipart.is_some()
    }

    /// Whether anything gets removed.
    pub fn has_removals(&self) -> bool {
        !self.remove_office.is_empty() || !self.remove_clipart.is_empty()
    }

    /// Whether the run would change nothing.
    pub fn is_empty(&self) -> bool {
        !self.has_installs() && !self.has_removals() && self.downloads.is_empty()
    }
}

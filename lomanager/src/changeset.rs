//! Change-set calculation.
//!
//! Everything here is a pure function of the tree. The change set is
//! recomputed after every selection call, never patched.

use serde::Serialize;

use crate::package::VirtualPackage;
use crate::tree::{NodeId, PackageTree};

/// Recompute `marked_for_download = marked_for_install && !installed` on
/// every node.
pub fn refresh_download_marks(tree: &mut PackageTree) {
    tree.for_each_mut(|pkg| {
        pkg.flags.marked_for_download = pkg.flags.marked_for_install && !pkg.installed;
    });
}

/// Pending changes derived from the tree flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Nodes marked for install.
    pub to_install: Vec<NodeId>,
    /// Nodes marked for removal.
    pub to_remove: Vec<NodeId>,
    /// Nodes that must be fetched before installing.
    pub to_download: Vec<NodeId>,
    /// Declared size of everything to install.
    pub space_to_be_used: u64,
    /// Declared size of everything to remove.
    pub space_to_be_freed: u64,
    install_labels: Vec<String>,
    remove_labels: Vec<String>,
}

impl ChangeSet {
    /// Partition the tree into installs and removals.
    pub fn from_tree(tree: &PackageTree) -> Self {
        let mut set = Self::default();
        for (id, pkg) in tree.iter() {
            if pkg.flags.marked_for_install {
                set.to_install.push(id);
                set.space_to_be_used += pkg.total_size();
                set.install_labels.push(pkg.label());
            }
            if pkg.flags.marked_for_removal {
                set.to_remove.push(id);
                set.space_to_be_freed += pkg.total_size();
                set.remove_labels.push(pkg.label());
            }
            if pkg.flags.marked_for_download {
                set.to_download.push(id);
            }
        }
        set
    }

    /// Labels of packages to install, in tree order.
    pub fn install_labels(&self) -> &[String] {
        &self.install_labels
    }

    /// Labels of packages to remove, in tree order.
    pub fn remove_labels(&self) -> &[String] {
        &self.remove_labels
    }

    /// Whether nothing would change.
    pub fn is_empty(&self) -> bool {
        self.to_install.is_empty() && self.to_remove.is_empty()
    }

    /// Human-readable summary of the planned changes.
    pub fn summary(&self) -> PlannedChanges {
        PlannedChanges {
            to_install: self.install_labels.clone(),
            to_remove: self.remove_labels.clone(),
            space_to_be_used: self.space_to_be_used,
            space_to_be_freed: self.space_to_be_freed,
        }
    }
}

/// Caller-facing summary of a [`ChangeSet`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlannedChanges {
    pub to_install: Vec<String>,
    pub to_remove: Vec<String>,
    pub space_to_be_used: u64,
    pub space_to_be_freed: u64,
}

/// Packages of `ids`, cloned out of the tree.
pub fn packages_of(tree: &PackageTree, ids: &[NodeId]) -> Vec<VirtualPackage> {
    ids.iter().filter_map(|&id| tree.get(id).cloned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{Family, RealComponent};

    #[test]
    fn test_download_marks_follow_install_marks() {
        let mut tree = PackageTree::new();
        let java = tree.add_child(
            tree.root(),
            VirtualPackage::core(Family::Java, "1").with_installed(true),
        );
        let core = tree.add_child(java, VirtualPackage::core(Family::LibreOffice, "7.5"));
        tree.get_mut(java).unwrap().flags.marked_for_install = true;
        tree.get_mut(core).unwrap().flags.marked_for_install = true;
        tree.get_mut(core).unwrap().flags.marked_for_download = false;

        refresh_download_marks(&mut tree);

        assert!(!tree.get(java).unwrap().flags.marked_for_download);
        assert!(tree.get(core).unwrap().flags.marked_for_download);
    }

    #[test]
    fn test_change_set_sizes_and_labels() {
        let mut tree = PackageTree::new();
        let java = tree.add_child(tree.root(), VirtualPackage::core(Family::Java, "1"));
        let old = tree.add_child(
            java,
            VirtualPackage::core(Family::LibreOffice, "7.4")
                .with_installed(true)
                .with_components(vec![RealComponent::new("old", "", 40)]),
        );
        let new = tree.add_child(
            java,
            VirtualPackage::core(Family::LibreOffice, "7.5")
                .with_components(vec![RealComponent::new("new", "", 100)]),
        );
        tree.get_mut(old).unwrap().flags.marked_for_removal = true;
        tree.get_mut(new).unwrap().flags.marked_for_install = true;
        refresh_download_marks(&mut tree);

        let set = ChangeSet::from_tree(&tree);
        assert_eq!(set.to_install, vec![new]);
        assert_eq!(set.to_remove, vec![old]);
        assert_eq!(set.to_download, vec![new]);
        assert_eq!(set.space_to_be_used, 100);
        assert_eq!(set.space_to_be_freed, 40);
        assert_eq!(set.install_labels(), ["LibreOffice 7.5 core-packages".to_string()]);
        assert_eq!(set.remove_labels(), ["LibreOffice 7.4 core-packages".to_string()]);
        assert!(!set.is_empty());
    }
}

//! Tree construction and baseline permissions.

use std::cmp::Ordering;

use tracing::{debug, error, info};

use super::{Catalog, Inventory, InventoryError};
use crate::changeset::refresh_download_marks;
use crate::package::{Family, VirtualPackage};
use crate::policy::GlobalPolicy;
use crate::tree::{NodeId, PackageTree};
use crate::version::compare_versions;

/// Build the fully flagged package tree.
///
/// `installed` comes from OS inspection, `available` from the catalog.
/// The union holds every installed package plus every available package
/// that is not already installed. Java is never upgraded: an available
/// Java is dropped as soon as any Java is installed.
///
/// Linking:
///
/// ```text
/// root ─┬─ Java ─┬─ OpenOffice core ── OpenOffice languages
///       │        └─ LibreOffice core ── language packs of the same version
///       └─ Clipart core
/// ```
///
/// A package that cannot be linked is a data inconsistency and fails the
/// build instead of being dropped.
pub fn build_tree(
    installed: Vec<VirtualPackage>,
    available: Vec<VirtualPackage>,
    catalog: &Catalog,
    policy: &GlobalPolicy,
) -> Result<Inventory, InventoryError> {
    check_duplicates(&installed)?;
    check_duplicates(&available)?;

    let java_installed = installed.iter().any(|p| p.family == Family::Java);
    let mut union = installed;
    for pkg in available {
        if java_installed && pkg.family == Family::Java {
            continue;
        }
        if !union.contains(&pkg) {
            union.push(pkg);
        }
    }

    let mut tree = link(union)?;
    let mut inventory = Inventory {
        tree: PackageTree::new(),
        policy: policy.clone(),
        fatal: None,
        warnings: Vec::new(),
    };

    apply_baseline(&mut tree, catalog, &mut inventory)?;

    if inventory.fatal.is_none() {
        apply_blocks(&mut tree, policy);
    }
    refresh_download_marks(&mut tree);

    info!(packages = tree.len(), fatal = inventory.fatal.is_some(), "Package tree built");
    inventory.tree = tree;
    Ok(inventory)
}

fn check_duplicates(packages: &[VirtualPackage]) -> Result<(), InventoryError> {
    for family in [Family::Java, Family::Clipart] {
        let versions: Vec<String> = packages
            .iter()
            .filter(|p| p.family == family && p.is_core())
            .map(|p| p.version.clone())
            .collect();
        if versions.len() > 1 {
            return Err(InventoryError::Duplicate { family, versions });
        }
    }
    Ok(())
}

fn link(packages: Vec<VirtualPackage>) -> Result<PackageTree, InventoryError> {
    let mut tree = PackageTree::new();
    let root = tree.root();
    let mut leftovers: Vec<VirtualPackage> = Vec::new();

    let (java, rest): (Vec<_>, Vec<_>) = packages
        .into_iter()
        .partition(|p| p.family == Family::Java && p.is_core());
    let java_id = java.into_iter().map(|p| tree.add_child(root, p)).next();

    let (cores, rest): (Vec<_>, Vec<_>) = rest
        .into_iter()
        .partition(|p| p.family.is_office() && p.is_core());
    let mut core_ids: Vec<NodeId> = Vec::new();
    for core in cores {
        match java_id {
            Some(java_id) => core_ids.push(tree.add_child(java_id, core)),
            None => leftovers.push(core),
        }
    }

    for pkg in rest {
        match pkg.family {
            Family::Clipart if pkg.is_core() => {
                tree.add_child(root, pkg);
            }
            Family::OpenOffice | Family::LibreOffice if !pkg.is_core() => {
                let parent = core_ids.iter().copied().find(|&id| {
                    tree.get(id)
                        .map(|c| c.family == pkg.family && c.version == pkg.version)
                        .unwrap_or(false)
                });
                match parent {
                    Some(parent) => {
                        tree.add_child(parent, pkg);
                    }
                    None => leftovers.push(pkg),
                }
            }
            _ => leftovers.push(pkg),
        }
    }

    if !leftovers.is_empty() {
        let labels: Vec<String> = leftovers.iter().map(|p| p.label()).collect();
        error!(?labels, "Packages could not be placed in the tree");
        return Err(InventoryError::Unlinked(labels));
    }
    Ok(tree)
}

/// Newest installed core version of `family`.
fn newest_installed(tree: &PackageTree, family: Family) -> Result<Option<String>, InventoryError> {
    let mut newest: Option<String> = None;
    for (_, pkg) in tree.iter() {
        if pkg.family != family || !pkg.is_core() || !pkg.installed {
            continue;
        }
        newest = match newest {
            Some(current) if compare_versions(&current, &pkg.version)? != Ordering::Less => {
                Some(current)
            }
            _ => Some(pkg.version.clone()),
        };
    }
    Ok(newest)
}

fn allow_install_where<P>(tree: &mut PackageTree, predicate: P)
where
    P: Fn(&VirtualPackage) -> bool,
{
    for id in tree.filter(|p| !p.installed && predicate(p)) {
        if let Some(pkg) = tree.get_mut(id) {
            pkg.allow_install();
        }
    }
}

fn apply_baseline(
    tree: &mut PackageTree,
    catalog: &Catalog,
    inventory: &mut Inventory,
) -> Result<(), InventoryError> {
    tree.for_each_mut(|pkg| {
        if pkg.installed && pkg.family != Family::Java {
            pkg.allow_removal();
        }
        if pkg.family == Family::OpenOffice {
            pkg.flags.marked_for_removal = true;
            pkg.flags.remove_enabled = false;
        }
    });

    let latest_lo = catalog.latest_libreoffice.as_str();
    match newest_installed(tree, Family::LibreOffice)? {
        None => {
            debug!(latest = latest_lo, "No LibreOffice installed");
            allow_install_where(tree, |p| {
                p.family == Family::LibreOffice && p.version == latest_lo
            });
        }
        Some(installed) => match compare_versions(&installed, latest_lo)? {
            Ordering::Equal => {
                allow_install_where(tree, |p| p.is_lang_pack() && p.version == installed);
            }
            Ordering::Less => {
                debug!(%installed, latest = latest_lo, "LibreOffice upgrade available");
                allow_install_where(tree, |p| {
                    p.family == Family::LibreOffice && p.version == latest_lo
                });
            }
            Ordering::Greater => {
                inventory.fatal = Some(format!(
                    "Installed LibreOffice {} is newer than the latest known version {}. \
                     Update lomanager before making changes.",
                    installed, latest_lo
                ));
            }
        },
    }

    let latest_clipart = catalog.latest_clipart.as_str();
    match newest_installed(tree, Family::Clipart)? {
        None => allow_install_where(tree, |p| {
            p.family == Family::Clipart && p.version == latest_clipart
        }),
        Some(installed) => match compare_versions(&installed, latest_clipart)? {
            Ordering::Equal => {}
            Ordering::Less => allow_install_where(tree, |p| {
                p.family == Family::Clipart && p.version == latest_clipart
            }),
            Ordering::Greater => {
                let message = format!(
                    "Installed Clipart {} is newer than the latest known version {}.",
                    installed, latest_clipart
                );
                inventory.fatal = Some(match inventory.fatal.take() {
                    Some(previous) => format!("{} {}", previous, message),
                    None => message,
                });
            }
        },
    }

    if let Some(fatal) = &inventory.fatal {
        error!(%fatal, "Inconsistent installation, every operation disabled");
        tree.for_each_mut(|pkg| pkg.disallow_operations());
    }
    Ok(())
}

/// Clear `*_enabled` flags forbidden by the policy. Visibility is kept so
/// the options still show up, greyed out.
fn apply_blocks(tree: &mut PackageTree, policy: &GlobalPolicy) {
    tree.for_each_mut(|pkg| {
        if policy.block_removal {
            pkg.flags.remove_enabled = false;
        }
        if policy.block_network_install {
            pkg.flags.install_enabled = false;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::InstalledOffice;

    fn catalog(latest: &str) -> Catalog {
        Catalog {
            latest_libreoffice: latest.to_string(),
            languages: vec!["fr".to_string(), "de".to_string()],
            helppack_languages: vec![],
            ..Default::default()
        }
    }

    fn installed(office: &[InstalledOffice], java: bool) -> Vec<VirtualPackage> {
        let mut packages = Vec::new();
        if java {
            packages.push(VirtualPackage::core(Family::Java, "2019").with_installed(true));
        }
        for o in office {
            packages.extend(o.to_virtual_packages());
        }
        packages
    }

    fn build(office: &[InstalledOffice], latest: &str) -> Inventory {
        let catalog = catalog(latest);
        build_tree(
            installed(office, true),
            catalog.available_packages(),
            &catalog,
            &GlobalPolicy::permissive(),
        )
        .unwrap()
    }

    fn node<'a>(inv: &'a Inventory, label: &str) -> &'a VirtualPackage {
        inv.tree
            .iter()
            .map(|(_, p)| p)
            .find(|p| p.label() == label)
            .unwrap_or_else(|| panic!("no node {}", label))
    }

    #[test]
    fn test_upgrade_scenario() {
        let inv = build(
            &[InstalledOffice::new(Family::LibreOffice, "7.4", ["fr"])],
            "7.5",
        );
        assert!(inv.fatal.is_none());

        let old = node(&inv, "LibreOffice 7.4 core-packages");
        assert!(old.flags.removable && old.flags.remove_enabled && !old.flags.install_visible);

        let new = node(&inv, "LibreOffice 7.5 core-packages");
        assert!(new.flags.installable && new.flags.install_enabled);

        assert!(inv
            .tree
            .iter()
            .filter(|(_, p)| p.version == "7.4")
            .all(|(_, p)| !p.flags.installable));
    }

    #[test]
    fn test_shape_langs_under_matching_core() {
        let inv = build(
            &[InstalledOffice::new(Family::LibreOffice, "7.4", ["fr"])],
            "7.5",
        );
        let tree = &inv.tree;
        for (id, pkg) in tree.iter() {
            if pkg.is_lang_pack() {
                let parent = tree.parent_package(id).unwrap();
                assert!(parent.is_core());
                assert_eq!(parent.version, pkg.version);
            }
        }
        let java = tree.find(|p| p.family == Family::Java).unwrap();
        assert_eq!(tree.parent(java), Some(tree.root()));
        assert_eq!(tree.children(java).len(), 2);
    }

    #[test]
    fn test_nothing_installed_offers_everything() {
        let catalog = catalog("7.5");
        let inv = build_tree(
            Vec::new(),
            catalog.available_packages(),
            &catalog,
            &GlobalPolicy::permissive(),
        )
        .unwrap();
        let java = node(&inv, "Java 2019 core-packages");
        assert!(!java.flags.install_visible && !java.flags.remove_visible);
        assert!(node(&inv, "LibreOffice 7.5 fr").flags.install_enabled);
        assert!(node(&inv, "Clipart 2.0 core-packages").flags.install_enabled);
    }

    #[test]
    fn test_latest_installed_offers_missing_langs_only() {
        let inv = build(
            &[InstalledOffice::new(Family::LibreOffice, "7.5", ["fr"])],
            "7.5",
        );
        let core = node(&inv, "LibreOffice 7.5 core-packages");
        assert!(core.installed && !core.flags.installable);
        assert!(node(&inv, "LibreOffice 7.5 fr").flags.removable);
        assert!(node(&inv, "LibreOffice 7.5 de").flags.installable);
    }

    #[test]
    fn test_openoffice_forced_removal() {
        let inv = build(
            &[InstalledOffice::new(Family::OpenOffice, "3.2.1", ["pl"])],
            "7.5",
        );
        for (_, pkg) in inv.tree.iter().filter(|(_, p)| p.family == Family::OpenOffice) {
            assert!(pkg.flags.marked_for_removal);
            assert!(!pkg.flags.remove_enabled);
            assert!(!pkg.flags.installable);
        }
    }

    #[test]
    fn test_installed_newer_than_catalog_is_fatal() {
        let inv = build(
            &[InstalledOffice::new(Family::LibreOffice, "7.6", Vec::<String>::new())],
            "7.5",
        );
        assert!(inv.fatal.is_some());
        assert!(inv
            .tree
            .iter()
            .all(|(_, p)| p.flags == Default::default()));
    }

    #[test]
    fn test_installed_java_is_kept_and_not_upgraded() {
        let inv = build(&[], "7.5");
        let javas = inv.tree.filter(|p| p.family == Family::Java);
        assert_eq!(javas.len(), 1);
        assert!(inv.tree.get(javas[0]).unwrap().installed);
    }

    #[test]
    fn test_duplicate_java_rejected() {
        let catalog = catalog("7.5");
        let installed = vec![
            VirtualPackage::core(Family::Java, "1").with_installed(true),
            VirtualPackage::core(Family::Java, "2").with_installed(true),
        ];
        let err = build_tree(installed, Vec::new(), &catalog, &GlobalPolicy::permissive())
            .unwrap_err();
        assert!(matches!(err, InventoryError::Duplicate { family: Family::Java, .. }));
    }

    #[test]
    fn test_orphan_lang_rejected() {
        let catalog = catalog("7.5");
        let installed = vec![
            VirtualPackage::core(Family::Java, "1").with_installed(true),
            VirtualPackage::lang("fr", "7.3").with_installed(true),
        ];
        let err = build_tree(installed, Vec::new(), &catalog, &GlobalPolicy::permissive())
            .unwrap_err();
        assert_eq!(
            err,
            InventoryError::Unlinked(vec!["LibreOffice 7.3 fr".to_string()])
        );
    }

    #[test]
    fn test_blocks_clear_enabled_keep_visible() {
        let catalog = catalog("7.5");
        let policy = GlobalPolicy {
            block_removal: true,
            block_network_install: true,
            ..Default::default()
        };
        let inv = build_tree(
            installed(&[InstalledOffice::new(Family::LibreOffice, "7.4", ["fr"])], true),
            catalog.available_packages(),
            &catalog,
            &policy,
        )
        .unwrap();
        for (_, pkg) in inv.tree.iter() {
            assert!(!pkg.flags.remove_enabled && !pkg.flags.install_enabled);
        }
        assert!(node(&inv, "LibreOffice 7.4 core-packages").flags.remove_visible);
        assert!(node(&inv, "LibreOffice 7.5 core-packages").flags.install_visible);
    }
}

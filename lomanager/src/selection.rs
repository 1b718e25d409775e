//! Selection engine.
//!
//! Applies install and removal toggles to the package tree and propagates
//! their consequences. Only flags change here; `installed` and the tree
//! shape are left alone.
//!
//! # Rules
//!
//! LibreOffice install:
//!
//! ```text
//! mark   core/lang ──► Java marked when not installed
//!        latest core ─► other installed LibreOffice locked for removal,
//!                       their languages carried over to the new version
//!        lang ────────► installed parent: removal disabled
//!                       missing parent:   parent marked (same rules)
//! unmark core ────────► languages unmarked
//!        lang ────────► last pending sibling: parent removal re-enabled
//!        latest, none pending ─► transition locks released, Java released
//! ```
//!
//! LibreOffice removal of a core cascades to its languages: installed ones
//! are marked too, missing ones lose their install option.
//!
//! Clipart has no cross-family coupling; marking the latest version locks
//! the other installed versions for removal.
//!
//! Re-enabling an option honours the policy blocks, and OpenOffice nodes
//! (always forced for removal) are never touched by a cascade.

use thiserror::Error;
use tracing::debug;

use crate::changeset::refresh_download_marks;
use crate::package::{Family, PackageFlags, SavedRemoval, VirtualPackage};
use crate::policy::GlobalPolicy;
use crate::tree::{NodeId, PackageTree};

/// Errors returned by the selection engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// The id does not name a package of the tree.
    #[error("unknown package id {0}")]
    UnknownNode(NodeId),

    /// The package family cannot be selected directly.
    #[error("{label} cannot be selected: {family} packages are managed automatically")]
    UnsupportedFamily { family: Family, label: String },
}

/// Repository facts and policy the rules depend on.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    /// Recommended LibreOffice version.
    pub latest_libreoffice: &'a str,
    /// Recommended Clipart version.
    pub latest_clipart: &'a str,
    /// Current policy.
    pub policy: &'a GlobalPolicy,
}

/// Mark or unmark a package for install.
pub fn request_install(
    tree: &mut PackageTree,
    id: NodeId,
    mark: bool,
    ctx: &SelectionContext<'_>,
) -> Result<(), SelectionError> {
    let pkg = package(tree, id)?;
    debug!(package = %pkg, mark, "Install request");
    let (family, label) = (pkg.family, pkg.label());

    match family {
        Family::LibreOffice if mark => mark_office_install(tree, id, ctx),
        Family::LibreOffice => unmark_office_install(tree, id, ctx),
        Family::Clipart => clipart_install(tree, id, mark, ctx),
        family => return Err(SelectionError::UnsupportedFamily { family, label }),
    }

    refresh_download_marks(tree);
    Ok(())
}

/// Mark or unmark a package for removal.
pub fn request_removal(
    tree: &mut PackageTree,
    id: NodeId,
    mark: bool,
    ctx: &SelectionContext<'_>,
) -> Result<(), SelectionError> {
    let pkg = package(tree, id)?;
    debug!(package = %pkg, mark, "Removal request");
    let (family, label) = (pkg.family, pkg.label());

    match family {
        Family::LibreOffice => office_removal(tree, id, mark, ctx),
        Family::Clipart => update(tree, id, |f| f.marked_for_removal = mark),
        family => return Err(SelectionError::UnsupportedFamily { family, label }),
    }

    refresh_download_marks(tree);
    Ok(())
}

fn package(tree: &PackageTree, id: NodeId) -> Result<&VirtualPackage, SelectionError> {
    tree.get(id).ok_or(SelectionError::UnknownNode(id))
}

fn update<F>(tree: &mut PackageTree, id: NodeId, f: F)
where
    F: FnOnce(&mut PackageFlags),
{
    if let Some(pkg) = tree.get_mut(id) {
        f(&mut pkg.flags);
    }
}

fn update_package<F>(tree: &mut PackageTree, id: NodeId, f: F)
where
    F: FnOnce(&mut VirtualPackage),
{
    if let Some(pkg) = tree.get_mut(id) {
        f(pkg);
    }
}

/// Force removal of an old version. The first lock saves the removal
/// choice the package had, so a later release can put it back.
fn lock_for_removal(pkg: &mut VirtualPackage) {
    if pkg.saved_removal.is_none() {
        pkg.saved_removal = Some(SavedRemoval::of(&pkg.flags));
    }
    pkg.flags.marked_for_removal = true;
    pkg.flags.remove_enabled = false;
}

/// Undo [`lock_for_removal`]. Packages that were never locked are left as
/// they are.
fn release_removal_lock(pkg: &mut VirtualPackage) {
    if let Some(saved) = pkg.saved_removal.take() {
        pkg.flags.marked_for_removal = saved.marked;
        pkg.flags.remove_enabled = saved.enabled;
    }
}

fn is_installed_libreoffice(pkg: &VirtualPackage) -> bool {
    pkg.family == Family::LibreOffice && pkg.installed
}

fn any_office_install_pending(tree: &PackageTree) -> bool {
    tree.find(|p| p.family == Family::LibreOffice && p.flags.marked_for_install)
        .is_some()
}

fn mark_java_if_missing(tree: &mut PackageTree) {
    if let Some(java) = tree.find(|p| p.family == Family::Java && !p.installed) {
        update(tree, java, |f| f.marked_for_install = true);
    }
}

fn release_java(tree: &mut PackageTree) {
    if any_office_install_pending(tree) {
        return;
    }
    if let Some(java) = tree.find(|p| p.family == Family::Java && !p.installed) {
        update(tree, java, |f| f.marked_for_install = false);
    }
}

fn mark_office_install(tree: &mut PackageTree, id: NodeId, ctx: &SelectionContext<'_>) {
    let (is_core, is_latest) = match tree.get(id) {
        Some(pkg) => (pkg.is_core(), pkg.version == ctx.latest_libreoffice),
        None => return,
    };

    update(tree, id, |f| f.marked_for_install = true);
    mark_java_if_missing(tree);

    if is_core {
        if is_latest {
            lock_other_versions(tree, id);
            carry_languages(tree, id);
        }
        return;
    }

    let Some(parent) = tree.parent(id) else { return };
    match tree.get(parent).map(|p| p.installed) {
        Some(true) => update(tree, parent, |f| f.remove_enabled = false),
        Some(false) => mark_office_install(tree, parent, ctx),
        None => {}
    }
}

/// Lock every other installed LibreOffice core and its installed languages
/// for removal.
fn lock_other_versions(tree: &mut PackageTree, new_core: NodeId) {
    let old_cores = tree.filter(|p| is_installed_libreoffice(p) && p.is_core());
    for core in old_cores.into_iter().filter(|&c| c != new_core) {
        update_package(tree, core, lock_for_removal);
        let langs: Vec<NodeId> = tree
            .children(core)
            .iter()
            .copied()
            .filter(|&c| tree.get(c).map(|p| p.installed).unwrap_or(false))
            .collect();
        for lang in langs {
            update_package(tree, lang, lock_for_removal);
        }
    }
}

/// Mark the languages of `new_core` that are installed for an older version.
fn carry_languages(tree: &mut PackageTree, new_core: NodeId) {
    let installed_langs: Vec<String> = tree
        .iter()
        .filter(|(_, p)| is_installed_libreoffice(p) && p.is_lang_pack())
        .filter_map(|(_, p)| p.kind.language().map(str::to_string))
        .collect();

    let targets: Vec<NodeId> = tree
        .children(new_core)
        .iter()
        .copied()
        .filter(|&c| {
            tree.get(c)
                .map(|p| {
                    !p.installed
                        && p.kind
                            .language()
                            .map(|l| installed_langs.iter().any(|i| i == l))
                            .unwrap_or(false)
                })
                .unwrap_or(false)
        })
        .collect();

    for lang in targets {
        update(tree, lang, |f| f.marked_for_install = true);
    }
}

fn unmark_office_install(tree: &mut PackageTree, id: NodeId, ctx: &SelectionContext<'_>) {
    let (is_core, is_latest) = match tree.get(id) {
        Some(pkg) => (pkg.is_core(), pkg.version == ctx.latest_libreoffice),
        None => return,
    };

    update(tree, id, |f| f.marked_for_install = false);

    if is_core {
        let children = tree.children(id).to_vec();
        for child in children {
            update(tree, child, |f| f.marked_for_install = false);
        }
    } else if let Some(parent) = tree.parent(id) {
        let sibling_pending = tree
            .siblings(id)
            .iter()
            .any(|&s| tree.get(s).map(|p| p.flags.marked_for_install).unwrap_or(false));
        let parent_installed = tree.get(parent).map(|p| p.installed).unwrap_or(false);
        if parent_installed && !sibling_pending {
            let block = ctx.policy.block_removal;
            update(tree, parent, |f| f.remove_enabled = f.removable && !block);
        }
    }

    if is_latest && !any_office_install_pending(tree) {
        for other in tree.filter(is_installed_libreoffice) {
            update_package(tree, other, release_removal_lock);
        }
    }

    release_java(tree);
}

fn clipart_install(tree: &mut PackageTree, id: NodeId, mark: bool, ctx: &SelectionContext<'_>) {
    let is_latest = tree
        .get(id)
        .map(|p| p.version == ctx.latest_clipart)
        .unwrap_or(false);

    update(tree, id, |f| f.marked_for_install = mark);
    if !is_latest {
        return;
    }

    let others: Vec<NodeId> = tree
        .filter(|p| p.family == Family::Clipart && p.installed)
        .into_iter()
        .filter(|&c| c != id)
        .collect();
    for other in others {
        if mark {
            update_package(tree, other, lock_for_removal);
        } else {
            update_package(tree, other, release_removal_lock);
        }
    }
}

fn office_removal(tree: &mut PackageTree, id: NodeId, mark: bool, ctx: &SelectionContext<'_>) {
    let is_core = tree.get(id).map(|p| p.is_core()).unwrap_or(false);
    update(tree, id, |f| f.marked_for_removal = mark);
    if !is_core {
        return;
    }

    let block_install = ctx.policy.block_network_install;
    for child in tree.children(id).to_vec() {
        let installed = tree.get(child).map(|p| p.installed).unwrap_or(false);
        update(tree, child, |f| match (mark, installed) {
            (true, true) => f.marked_for_removal = true,
            (true, false) => {
                f.install_enabled = false;
                f.marked_for_install = false;
            }
            (false, true) => f.marked_for_removal = false,
            (false, false) => {
                f.marked_for_removal = false;
                f.install_enabled = f.installable && !block_install;
            }
        });
    }
}

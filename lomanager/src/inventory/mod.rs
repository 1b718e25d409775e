//! Software inventory.
//!
//! Merges what is installed (OS inspection) with what is available (the
//! static [`Catalog`]) into one fully flagged [`PackageTree`]. The tree is
//! rebuilt wholesale on every refresh; nothing here patches an existing
//! tree.

mod builder;
mod catalog;
mod detect;

pub use builder::build_tree;
pub use catalog::{
    Catalog, DEFAULT_HELPPACK_LANGUAGES, DEFAULT_LANGUAGES, ESTIMATED_CLIPART_SIZE,
    ESTIMATED_CORE_SIZE, ESTIMATED_HELPPACK_SIZE, ESTIMATED_JAVA_SIZE, ESTIMATED_LANGPACK_SIZE,
};
pub use detect::detect_installed;

use thiserror::Error;

use crate::package::Family;
use crate::policy::GlobalPolicy;
use crate::tree::PackageTree;
use crate::version::VersionError;

/// Errors raised while building the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// More than one Java or Clipart package in one snapshot.
    #[error("more than one {family} package found: {}", .versions.join(", "))]
    Duplicate { family: Family, versions: Vec<String> },

    /// Packages with no place in the tree.
    #[error("inconsistent package data, could not place: {}", .0.join(", "))]
    Unlinked(Vec<String>),

    /// A detected or configured version could not be parsed.
    #[error(transparent)]
    Version(#[from] VersionError),
}

/// The result of an inventory refresh.
#[derive(Debug, Clone)]
pub struct Inventory {
    /// Fully flagged package tree.
    pub tree: PackageTree,
    /// Policy the tree was built with.
    pub policy: GlobalPolicy,
    /// Consistency diagnostic. When set, every flag is cleared and the
    /// session refuses changes until the next refresh.
    pub fatal: Option<String>,
    /// Non-fatal observations.
    pub warnings: Vec<String>,
}

impl Inventory {
    /// Whether the tree allows any change at all.
    pub fn is_blocked(&self) -> bool {
        self.fatal.is_some()
    }
}

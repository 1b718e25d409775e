//! Virtual package types and naming.
//!
//! This module provides the core data structures for the package selection
//! engine.
//!
//! # Overview
//!
//! - **VirtualPackage**: an atomic bundle of real OS packages (kind, family,
//!   version, real components, installed state, selection flags)
//! - **PackageFlags / Flag**: the selection flags and the explicit list of
//!   flags that take part in bulk resets
//! - **InstalledOffice**: an Office install as reported by OS inspection
//! - **naming**: archive names, URLs and local-copy conventions
//!
//! # Type Hierarchy
//!
//! ```text
//! VirtualPackage
//! ├── kind: PackageKind            Core | Lang(code)
//! ├── family: Family               Java | OpenOffice | LibreOffice | Clipart
//! ├── version: String              dot-separated, arbitrary length
//! ├── real_components: Vec<RealComponent>
//! ├── installed: bool              ground truth, fixed at tree build
//! └── flags: PackageFlags          mutated by the selection engine
//! ```

mod core;
mod flags;
mod installed;
mod naming;
mod types;

// Core types
pub use core::{SavedRemoval, VirtualPackage};
pub use flags::{Flag, PackageFlags};
pub use installed::{InstalledOffice, BUILTIN_LANGUAGE};
pub use types::{Family, PackageKind, RealComponent, CORE_KIND};

// Naming utilities
pub use naming::{
    checksum_url, core_archive_filename, is_java_rpm, lang_archive_filename, libreoffice_url,
    local_copy_dir, parse_clipart_rpm, parse_core_archive, parse_lang_archive, repository_url,
    LangArchive, LangArchiveName, CLIPART_DIR, JAVA_DIR, LIBREOFFICE_CORE_DIR,
    LIBREOFFICE_LANGS_DIR,
};

//! lomanager - LibreOffice package manager for RPM-based distributions
//!
//! This library installs, removes and upgrades LibreOffice, its language
//! packs, the Java runtime it needs and the Openclipart gallery, and gets
//! rid of old OpenOffice installations along the way.
//!
//! # Layers
//!
//! ```text
//! app::Session ──► selection ──► tree of VirtualPackage (inventory)
//!      │                              ▲
//!      │                              └── system (installed), Catalog (available)
//!      └── manager::Procedure ──► download, extract, rpm backend, fix-ups
//! ```
//!
//! [`task`] runs a procedure on a worker thread; [`config`] and [`log`]
//! carry the configuration file and logging setup shared by front ends.

pub mod app;
pub mod changeset;
pub mod config;
pub mod inventory;
pub mod log;
pub mod manager;
pub mod package;
pub mod policy;
pub mod selection;
pub mod system;
pub mod task;
pub mod tree;
pub mod version;

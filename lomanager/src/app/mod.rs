//! Caller-facing surface.
//!
//! This module provides the [`Session`] type, the single entry point for
//! front ends. A session owns the inventory and is moved into a worker
//! (see [`crate::task`]) while a procedure runs, so two procedures can
//! never overlap.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            Session                              │
//! │                                                                 │
//! │  AppConfig ──► ManagerConfig, Catalog, log dir                  │
//! │                                                                 │
//! │  refresh_inventory ──► GlobalPolicy::probe                      │
//! │                        detect_installed + Catalog               │
//! │                        build_tree ──► Inventory                 │
//! │                                                                 │
//! │  request_install / request_removal ──► selection engine         │
//! │  planned_changes ──► ChangeSet                                  │
//! │                                                                 │
//! │  apply_changes / install_from_local_copy                        │
//! │        └── ProcedurePlan ──► Procedure ──► refresh_inventory    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use lomanager::app::{AppConfig, Session};
//!
//! let mut session = Session::open(AppConfig::default())?;
//! session.request_install(core_id, true)?;
//! println!("{:?}", session.planned_changes());
//! session.apply_changes(false, false, Arc::new(NullSink), CancellationToken::new())?;
//! ```

mod config;
mod error;
mod session;

pub use config::AppConfig;
pub use error::AppError;
pub use session::{PackageView, Session, StatusReport, CLIENT_VERSION};

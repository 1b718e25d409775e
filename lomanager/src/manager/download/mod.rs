//! HTTP download support for package collection.
//!
//! This module provides:
//! - Single file downloads with resume support (`http`)
//! - SHA-256 checksum calculation and checksum-file verification (`checksum`)
//! - Batch download state tracking (`state`)
//! - Bounded retries with a fixed delay (`retry`)
//!
//! # Architecture
//!
//! ```text
//! collect step (procedure)
//!         │
//!         ├── DownloadState (sizes, progress over the batch)
//!         │
//!         ├── download_with_retry ── PackageDownloader (trait)
//!         │                                └── HttpDownloader
//!         │
//!         └── verify_against_checksum_file
//! ```

mod checksum;
mod http;
mod retry;
mod state;

pub use checksum::{
    calculate_file_checksum, parse_checksum_file, verify_against_checksum_file, verify_checksum,
};
pub use http::HttpDownloader;
pub use retry::download_with_retry;
pub use state::{DownloadItem, DownloadState};

//! Download state for the package collection step.
//!
//! Tracks every file to fetch with its probed size, so progress can be
//! reported over the whole batch rather than per file.

use std::path::PathBuf;

/// One file to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadItem {
    /// Label of the virtual package the file belongs to.
    pub package: String,
    /// Source URL.
    pub url: String,
    /// Checksum file URL, when verification is possible.
    pub checksum_url: Option<String>,
    /// Download destination.
    pub dest: PathBuf,
    /// Size probed from the server (0 until probed).
    pub size: u64,
}

/// Download state for tracking a batch of downloads.
#[derive(Debug, Clone, Default)]
pub struct DownloadState {
    /// Files to fetch, in order.
    pub items: Vec<DownloadItem>,
    /// Number of files downloaded.
    pub downloaded_items: usize,
    /// Bytes of completed files.
    pub bytes_downloaded: u64,
    /// Total expected size of all files (from HEAD requests).
    pub total_size: u64,
    /// Items that failed (by index).
    pub failed: Vec<usize>,
}

impl DownloadState {
    /// Create a new download state.
    pub fn new(items: Vec<DownloadItem>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    /// Number of files in the batch.
    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    /// Record the probed size of an item.
    pub fn set_size(&mut self, index: usize, size: u64) {
        if let Some(item) = self.items.get_mut(index) {
            self.total_size = self.total_size - item.size + size;
            item.size = size;
        }
    }

    /// Check if the download is complete.
    pub fn is_complete(&self) -> bool {
        self.downloaded_items == self.total_items() && self.failed.is_empty()
    }

    /// Check if any items failed.
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Progress in percent, counting `in_flight` bytes of the current file.
    ///
    /// Falls back to item-based progress if the total size is unknown.
    pub fn progress_percent(&self, in_flight: u64) -> u8 {
        let percent = if self.total_size == 0 {
            if self.total_items() == 0 {
                100.0
            } else {
                (self.downloaded_items as f64 / self.total_items() as f64) * 100.0
            }
        } else {
            ((self.bytes_downloaded + in_flight) as f64 / self.total_size as f64) * 100.0
        };
        percent.clamp(0.0, 100.0) as u8
    }

    /// Record a successful download of an item.
    pub fn record_success(&mut self, bytes: u64) {
        self.downloaded_items += 1;
        self.bytes_downloaded += bytes;
    }

    /// Record a failed download of an item.
    pub fn record_failure(&mut self, index: usize) {
        self.failed.push(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str) -> DownloadItem {
        DownloadItem {
            package: "LibreOffice 7.5 core-packages".to_string(),
            url: format!("http://mirror/{}", name),
            checksum_url: None,
            dest: PathBuf::from(format!("/tmp/{}", name)),
            size: 0,
        }
    }

    #[test]
    fn test_download_state_new() {
        let state = DownloadState::new(vec![item("a"), item("b")]);
        assert_eq!(state.total_items(), 2);
        assert!(!state.is_complete());
        assert_eq!(state.progress_percent(0), 0);
    }

    #[test]
    fn test_progress_by_items_when_size_unknown() {
        let mut state = DownloadState::new(vec![item("a"), item("b")]);
        state.record_success(0);
        assert_eq!(state.progress_percent(0), 50);
        state.record_success(0);
        assert_eq!(state.progress_percent(0), 100);
        assert!(state.is_complete());
    }

    #[test]
    fn test_progress_by_bytes() {
        let mut state = DownloadState::new(vec![item("a"), item("b")]);
        state.set_size(0, 600);
        state.set_size(1, 400);
        assert_eq!(state.total_size, 1000);

        state.record_success(600);
        assert_eq!(state.progress_percent(200), 80);
    }

    #[test]
    fn test_set_size_replaces_previous_probe() {
        let mut state = DownloadState::new(vec![item("a")]);
        state.set_size(0, 100);
        state.set_size(0, 150);
        assert_eq!(state.total_size, 150);
    }

    #[test]
    fn test_record_failure() {
        let mut state = DownloadState::new(vec![item("a")]);
        state.record_failure(0);
        assert!(state.has_failures());
        state.record_success(1);
        assert!(!state.is_complete());
    }
}

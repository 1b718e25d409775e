//! Bounded retry around a single download.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::manager::error::{ManagerError, ManagerResult};
use crate::manager::traits::PackageDownloader;

/// How often a retry delay checks for cancellation.
const CANCEL_POLL: Duration = Duration::from_millis(100);

/// Download `url` to `dest`, retrying up to `retries` more times with a
/// fixed `delay` between attempts.
///
/// `on_progress` receives `(bytes_done, bytes_total)` of the current
/// attempt. Cancellation is checked before every attempt and during the
/// delay; a partial file is left in place so the next attempt can resume.
pub fn download_with_retry(
    downloader: &dyn PackageDownloader,
    url: &str,
    dest: &Path,
    retries: u32,
    delay: Duration,
    cancel: &CancellationToken,
    on_progress: Arc<dyn Fn(u64, u64) + Send + Sync>,
) -> ManagerResult<u64> {
    let mut attempt = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(ManagerError::Cancelled);
        }

        let progress = Arc::clone(&on_progress);
        match downloader.download(url, dest, Some(Box::new(move |done, total| progress(done, total)))) {
            Ok(size) => {
                debug!(url, size, attempt, "Download complete");
                return Ok(size);
            }
            Err(e) if attempt < retries => {
                attempt += 1;
                warn!(url, error = %e, attempt, retries, "Download failed, retrying");
                sleep_unless_cancelled(delay, cancel)?;
            }
            Err(e) => return Err(e),
        }
    }
}

fn sleep_unless_cancelled(delay: Duration, cancel: &CancellationToken) -> ManagerResult<()> {
    let deadline = Instant::now() + delay;
    while Instant::now() < deadline {
        if cancel.is_cancelled() {
            return Err(ManagerError::Cancelled);
        }
        thread::sleep(CANCEL_POLL.min(deadline.saturating_duration_since(Instant::now())));
    }
    Ok(())
}

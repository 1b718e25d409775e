//! Blocking HTTP downloader for Office archives and RPMs.
//!
//! A HEAD request gives the remote size and whether byte ranges are
//! served. A partial file left by an interrupted run is continued with a
//! `Range` request when possible and restarted otherwise.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, RANGE};
use tracing::debug;

use crate::manager::error::{ManagerError, ManagerResult};
use crate::manager::traits::{PackageDownloader, ProgressCallback};

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Copy chunk size.
const CHUNK_SIZE: usize = 64 * 1024;

/// What the server says about a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RemoteFile {
    /// 0 when the server sends no length.
    size: u64,
    resumable: bool,
}

/// Where to start writing, given what is already on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResumePoint {
    /// The local file is already complete.
    Complete,
    /// Append from this byte offset.
    Append(u64),
    /// Truncate and download everything.
    Restart,
}

fn resume_point(local_len: u64, remote: RemoteFile) -> ResumePoint {
    match (local_len, remote.size) {
        (0, _) => ResumePoint::Restart,
        (local, size) if size > 0 && local == size => ResumePoint::Complete,
        (local, size) if remote.resumable && local < size => ResumePoint::Append(local),
        _ => ResumePoint::Restart,
    }
}

/// Package downloader over HTTP(S).
#[derive(Debug)]
pub struct HttpDownloader {
    client: Client,
    timeout: Duration,
}

impl HttpDownloader {
    pub fn new() -> ManagerResult<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Downloader whose connections and metadata requests give up after
    /// `timeout`. Bodies of large archives are not bounded.
    pub fn with_timeout(timeout: Duration) -> ManagerResult<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(None)
            .user_agent(concat!("lomanager/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ManagerError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn request_error(&self, url: &str, e: reqwest::Error) -> ManagerError {
        if e.is_timeout() {
            return ManagerError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            };
        }
        ManagerError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }

    fn send_checked(&self, url: &str, request: RequestBuilder) -> ManagerResult<Response> {
        let response = request.send().map_err(|e| self.request_error(url, e))?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(ManagerError::DownloadFailed {
                url: url.to_string(),
                reason: format!("server answered {}", status),
            })
        }
    }

    fn probe(&self, url: &str) -> ManagerResult<RemoteFile> {
        let response = self.send_checked(url, self.client.head(url).timeout(self.timeout))?;
        let headers = response.headers();

        let size = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        let resumable = headers
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("bytes"));

        Ok(RemoteFile { size, resumable })
    }

    fn fetch(
        &self,
        url: &str,
        dest: &Path,
        on_progress: Option<ProgressCallback>,
    ) -> ManagerResult<u64> {
        let local_len = fs::metadata(dest).map(|m| m.len()).unwrap_or(0);
        let remote = self.probe(url)?;

        let offset = match resume_point(local_len, remote) {
            ResumePoint::Complete => {
                debug!(url, "Already downloaded");
                if let Some(cb) = &on_progress {
                    cb(remote.size, remote.size);
                }
                return Ok(remote.size);
            }
            ResumePoint::Append(offset) => {
                debug!(path = %dest.display(), offset, "Resuming download");
                offset
            }
            ResumePoint::Restart => 0,
        };

        let file = open_destination(dest, offset > 0)?;
        let mut request = self.client.get(url);
        if offset > 0 {
            request = request.header(RANGE, format!("bytes={}-", offset));
        }
        let response = self.send_checked(url, request)?;

        let written = copy_body(response, file, offset, remote.size, on_progress.as_deref())
            .map_err(|e| match e {
                CopyError::Read(e) => ManagerError::DownloadFailed {
                    url: url.to_string(),
                    reason: format!("connection lost: {}", e),
                },
                CopyError::Write(source) => ManagerError::WriteFailed {
                    path: dest.to_path_buf(),
                    source,
                },
            })?;

        if remote.size > 0 && written != remote.size {
            return Err(ManagerError::DownloadFailed {
                url: url.to_string(),
                reason: format!("incomplete download: {} of {} bytes", written, remote.size),
            });
        }
        Ok(written)
    }
}

fn open_destination(dest: &Path, append: bool) -> ManagerResult<File> {
    if append {
        return OpenOptions::new()
            .append(true)
            .open(dest)
            .map_err(|source| ManagerError::WriteFailed {
                path: dest.to_path_buf(),
                source,
            });
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|source| ManagerError::CreateDirFailed {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    File::create(dest).map_err(|source| ManagerError::WriteFailed {
        path: dest.to_path_buf(),
        source,
    })
}

#[derive(Debug)]
enum CopyError {
    Read(io::Error),
    Write(io::Error),
}

/// Copy `body` after `offset` bytes already on disk. Returns the total
/// file length.
fn copy_body(
    mut body: impl Read,
    file: File,
    offset: u64,
    total: u64,
    on_progress: Option<&(dyn Fn(u64, u64) + Send + Sync)>,
) -> Result<u64, CopyError> {
    let mut writer = BufWriter::new(file);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut done = offset;

    loop {
        let n = body.read(&mut chunk).map_err(CopyError::Read)?;
        if n == 0 {
            break;
        }
        writer.write_all(&chunk[..n]).map_err(CopyError::Write)?;
        done += n as u64;
        if let Some(cb) = on_progress {
            cb(done, total);
        }
    }

    writer.flush().map_err(CopyError::Write)?;
    Ok(done)
}

impl PackageDownloader for HttpDownloader {
    fn remote_size(&self, url: &str) -> ManagerResult<u64> {
        Ok(self.probe(url)?.size)
    }

    fn download(
        &self,
        url: &str,
        dest: &Path,
        on_progress: Option<ProgressCallback>,
    ) -> ManagerResult<u64> {
        self.fetch(url, dest, on_progress)
    }

    fn fetch_text(&self, url: &str) -> ManagerResult<String> {
        let response = self.send_checked(url, self.client.get(url).timeout(self.timeout))?;
        response.text().map_err(|e| self.request_error(url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn remote(size: u64, resumable: bool) -> RemoteFile {
        RemoteFile { size, resumable }
    }

    #[test]
    fn test_resume_point() {
        assert_eq!(resume_point(0, remote(100, true)), ResumePoint::Restart);
        assert_eq!(resume_point(100, remote(100, false)), ResumePoint::Complete);
        assert_eq!(resume_point(40, remote(100, true)), ResumePoint::Append(40));
        assert_eq!(resume_point(40, remote(100, false)), ResumePoint::Restart);
        // Local file larger than the remote one is stale.
        assert_eq!(resume_point(140, remote(100, true)), ResumePoint::Restart);
        // Unknown remote size never counts as complete.
        assert_eq!(resume_point(40, remote(0, true)), ResumePoint::Restart);
    }

    #[test]
    fn test_copy_body_appends_and_reports_progress() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("LibreOffice_7.6.4.1_Linux_x86-64_rpm.tar.gz");
        fs::write(&dest, b"head-").unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let cb = move |done: u64, total: u64| sink.lock().unwrap().push((done, total));

        let file = open_destination(&dest, true).unwrap();
        let total = copy_body(&b"tail"[..], file, 5, 9, Some(&cb)).unwrap();

        assert_eq!(total, 9);
        assert_eq!(fs::read(&dest).unwrap(), b"head-tail");
        assert_eq!(seen.lock().unwrap().last(), Some(&(9, 9)));
    }

    #[test]
    fn test_open_destination_creates_parent_and_truncates() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("Java_rpms").join("task-java-2019-1pclos2019.noarch.rpm");

        let mut file = open_destination(&dest, false).unwrap();
        file.write_all(b"stale").unwrap();
        drop(file);

        open_destination(&dest, false).unwrap();
        assert_eq!(fs::metadata(&dest).unwrap().len(), 0);
    }

    #[test]
    fn test_with_timeout() {
        let downloader = HttpDownloader::with_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(downloader.timeout(), Duration::from_secs(5));
        assert_eq!(
            HttpDownloader::new().unwrap().timeout(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_unreachable_host_is_an_error() {
        let downloader = HttpDownloader::with_timeout(Duration::from_secs(1)).unwrap();
        assert!(downloader.remote_size("http://127.0.0.1:9/missing").is_err());
    }
}

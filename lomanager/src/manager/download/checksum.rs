//! SHA-256 verification of downloaded packages.
//!
//! Every archive and RPM on the mirror has a `<name>.sha256` companion in
//! `sha256sum` format: `<hex>  <filename>` lines, or a bare digest.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::manager::error::{ManagerError, ManagerResult};

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Lowercase hex SHA-256 digest of the file at `path`.
pub fn calculate_file_checksum(path: &Path) -> ManagerResult<String> {
    let read_failed = |source| ManagerError::ReadFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = BufReader::new(File::open(path).map_err(read_failed)?);
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher).map_err(read_failed)?;

    Ok(format!("{:x}", hasher.finalize()))
}

/// Compare the digest of `path` with `expected`, ignoring hex case.
pub fn verify_checksum(path: &Path, expected: &str) -> ManagerResult<()> {
    let actual = calculate_file_checksum(path)?;
    if actual.eq_ignore_ascii_case(expected.trim()) {
        return Ok(());
    }
    Err(ManagerError::ChecksumMismatch {
        filename: file_name_of(path),
        expected: expected.to_string(),
        actual,
    })
}

/// Find the digest for `filename` in the contents of a checksum file.
///
/// A file holding a single bare digest applies to any filename.
///
/// # Example
///
/// ```
/// use lomanager::manager::parse_checksum_file;
///
/// let text = "4f2a...  other.tar.gz\nabc123  LibreOffice.tar.gz\n";
/// assert_eq!(parse_checksum_file(text, "LibreOffice.tar.gz"), Some("abc123".to_string()));
/// assert_eq!(parse_checksum_file("ABC123\n", "anything"), Some("abc123".to_string()));
/// ```
pub fn parse_checksum_file(contents: &str, filename: &str) -> Option<String> {
    let entries: Vec<&str> = contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if let [single] = entries.as_slice() {
        if !single.contains(char::is_whitespace) {
            return Some(single.to_lowercase());
        }
    }

    entries.iter().find_map(|line| {
        let mut parts = line.split_whitespace();
        let digest = parts.next()?;
        // sha256sum marks binary mode with a leading '*'
        let name = parts.next()?.trim_start_matches('*');
        (name == filename).then(|| digest.to_lowercase())
    })
}

/// Verify a file against the contents of its checksum file.
pub fn verify_against_checksum_file(
    path: &Path,
    checksum_url: &str,
    contents: &str,
) -> ManagerResult<()> {
    let filename = file_name_of(path);
    let expected = parse_checksum_file(contents, &filename).ok_or_else(|| {
        ManagerError::InvalidChecksumFile {
            url: checksum_url.to_string(),
            reason: format!("no entry for {}", filename),
        }
    })?;
    verify_checksum(path, &expected)
}

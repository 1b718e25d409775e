//! Centralized naming conventions for distributable artifacts.
//!
//! This module is the single source of truth for:
//! - LibreOffice archive filenames (e.g. `LibreOffice_7.5.4.2_Linux_x86-64_rpm.tar.gz`)
//! - Download URLs and checksum URLs for those archives
//! - The local-copy directory layout (`Java_rpms/`, `LibreOffice-core_tgzs/`, ...)
//! - Filename patterns used to recognise artifacts in a local copy
//!
//! All other modules should use these functions rather than constructing
//! names directly, so downloads, persisted packages and local-copy scans
//! stay compatible with each other.

use std::sync::OnceLock;

use regex::Regex;

use crate::version::short_version;

use super::types::Family;

/// Local-copy folder holding the Java RPMs.
pub const JAVA_DIR: &str = "Java_rpms";

/// Local-copy folder holding LibreOffice core tarballs.
pub const LIBREOFFICE_CORE_DIR: &str = "LibreOffice-core_tgzs";

/// Local-copy folder holding LibreOffice language and help pack tarballs.
pub const LIBREOFFICE_LANGS_DIR: &str = "LibreOffice-langs_tgzs";

/// Local-copy folder holding Openclipart RPMs.
pub const CLIPART_DIR: &str = "Clipart_rpms";

/// Platform tag embedded in every LibreOffice archive name.
const PLATFORM: &str = "Linux_x86-64_rpm";

/// Kind of LibreOffice language archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LangArchive {
    /// User interface translation.
    Langpack,
    /// Offline help for the language.
    Helppack,
}

impl LangArchive {
    fn tag(&self) -> &'static str {
        match self {
            Self::Langpack => "langpack",
            Self::Helppack => "helppack",
        }
    }
}

/// Filename of the LibreOffice core archive.
///
/// # Examples
///
/// ```
/// use lomanager::package::core_archive_filename;
///
/// assert_eq!(
///     core_archive_filename("7.5.4.2"),
///     "LibreOffice_7.5.4.2_Linux_x86-64_rpm.tar.gz"
/// );
/// ```
pub fn core_archive_filename(version: &str) -> String {
    format!("LibreOffice_{}_{}.tar.gz", version, PLATFORM)
}

/// Filename of a LibreOffice language or help pack archive.
///
/// # Examples
///
/// ```
/// use lomanager::package::{lang_archive_filename, LangArchive};
///
/// assert_eq!(
///     lang_archive_filename("7.5.4.2", "fr", LangArchive::Langpack),
///     "LibreOffice_7.5.4.2_Linux_x86-64_rpm_langpack_fr.tar.gz"
/// );
/// ```
pub fn lang_archive_filename(version: &str, lang: &str, archive: LangArchive) -> String {
    format!(
        "LibreOffice_{}_{}_{}_{}.tar.gz",
        version,
        PLATFORM,
        archive.tag(),
        lang
    )
}

/// Download URL of a LibreOffice archive.
///
/// The release directory uses the first three version segments.
///
/// # Examples
///
/// ```
/// use lomanager::package::libreoffice_url;
///
/// assert_eq!(
///     libreoffice_url("https://dl.example.org/libreoffice/stable", "7.5.4.2", "x.tar.gz"),
///     "https://dl.example.org/libreoffice/stable/7.5.4/rpm/x86_64/x.tar.gz"
/// );
/// ```
pub fn libreoffice_url(base_url: &str, version: &str, filename: &str) -> String {
    format!(
        "{}/{}/rpm/x86_64/{}",
        base_url.trim_end_matches('/'),
        short_version(version, 3),
        filename
    )
}

/// Download URL of an RPM in the distribution repository.
pub fn repository_url(base_url: &str, filename: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), filename)
}

/// Checksum file URL published next to a download.
pub fn checksum_url(url: &str) -> String {
    format!("{}.sha256", url)
}

/// Local-copy folder for artifacts of a family.
///
/// Language archives live in their own folder; use
/// [`LIBREOFFICE_LANGS_DIR`] for those.
pub fn local_copy_dir(family: Family) -> &'static str {
    match family {
        Family::Java => JAVA_DIR,
        Family::LibreOffice | Family::OpenOffice => LIBREOFFICE_CORE_DIR,
        Family::Clipart => CLIPART_DIR,
    }
}

fn core_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^LibreOffice_(\d+(?:\.\d+)*)_Linux_x86-64_rpm\.tar\.gz$").unwrap()
    })
}

fn lang_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^LibreOffice_(\d+(?:\.\d+)*)_Linux_x86-64_rpm_(langpack|helppack)_([A-Za-z]{2,3}(?:-[A-Za-z0-9]+)*)\.tar\.gz$",
        )
        .unwrap()
    })
}

fn clipart_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:libreoffice|clipart)-openclipart-(\d+(?:\.\d+)*)-[^/]+\.rpm$").unwrap()
    })
}

fn java_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?:task-)?java[-_][^/]*\.rpm$").unwrap())
}

/// Extract the version from a core archive filename.
///
/// # Examples
///
/// ```
/// use lomanager::package::parse_core_archive;
///
/// assert_eq!(
///     parse_core_archive("LibreOffice_7.5.4.2_Linux_x86-64_rpm.tar.gz"),
///     Some("7.5.4.2".to_string())
/// );
/// assert_eq!(parse_core_archive("LibreOffice_7.5.4.2_Linux_x86_rpm.tar.gz"), None);
/// ```
pub fn parse_core_archive(filename: &str) -> Option<String> {
    core_pattern()
        .captures(filename)
        .map(|c| c[1].to_string())
}

/// A recognised language archive filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangArchiveName {
    pub version: String,
    pub archive: LangArchive,
    pub lang: String,
}

/// Parse a language or help pack archive filename.
///
/// # Examples
///
/// ```
/// use lomanager::package::{parse_lang_archive, LangArchive};
///
/// let parsed = parse_lang_archive(
///     "LibreOffice_7.5.4.2_Linux_x86-64_rpm_helppack_ca-valencia.tar.gz",
/// )
/// .unwrap();
/// assert_eq!(parsed.version, "7.5.4.2");
/// assert_eq!(parsed.archive, LangArchive::Helppack);
/// assert_eq!(parsed.lang, "ca-valencia");
/// ```
pub fn parse_lang_archive(filename: &str) -> Option<LangArchiveName> {
    let captures = lang_pattern().captures(filename)?;
    let archive = match &captures[2] {
        "langpack" => LangArchive::Langpack,
        _ => LangArchive::Helppack,
    };
    Some(LangArchiveName {
        version: captures[1].to_string(),
        archive,
        lang: captures[3].to_string(),
    })
}

/// Extract the version from an Openclipart RPM filename.
pub fn parse_clipart_rpm(filename: &str) -> Option<String> {
    clipart_pattern()
        .captures(filename)
        .map(|c| c[1].to_string())
}

/// Whether a filename looks like a Java RPM.
pub fn is_java_rpm(filename: &str) -> bool {
    java_pattern().is_match(filename)
}

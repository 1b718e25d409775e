//! Supporting types for virtual packages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Software family a virtual package belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Family {
    /// Java runtime required by the Office suites.
    Java,
    /// Legacy OpenOffice.org installs. Only ever removed.
    OpenOffice,
    /// LibreOffice core packages and language packs.
    LibreOffice,
    /// Openclipart gallery for the Office suites.
    Clipart,
}

impl Family {
    /// Get the display name of the family.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Java => "Java",
            Self::OpenOffice => "OpenOffice",
            Self::LibreOffice => "LibreOffice",
            Self::Clipart => "Clipart",
        }
    }

    /// Whether this family is an Office suite (OpenOffice or LibreOffice).
    pub fn is_office(&self) -> bool {
        matches!(self, Self::OpenOffice | Self::LibreOffice)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "java" => Ok(Self::Java),
            "openoffice" => Ok(Self::OpenOffice),
            "libreoffice" => Ok(Self::LibreOffice),
            "clipart" => Ok(Self::Clipart),
            _ => Err(format!("unknown family: {}", s)),
        }
    }
}

/// Literal kind string used for core packages.
pub const CORE_KIND: &str = "core-packages";

/// Kind of a virtual package: the core bundle or a language pack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageKind {
    /// Base (non-language) bundle, displayed as `core-packages`.
    Core,
    /// Language pack identified by its language code (e.g. `fr`, `ca-valencia`).
    Lang(String),
}

impl PackageKind {
    /// Build a kind from its string form.
    ///
    /// ```
    /// use lomanager::package::PackageKind;
    ///
    /// assert_eq!(PackageKind::parse("core-packages"), PackageKind::Core);
    /// assert_eq!(PackageKind::parse("fr"), PackageKind::Lang("fr".to_string()));
    /// ```
    pub fn parse(s: &str) -> Self {
        if s == CORE_KIND {
            Self::Core
        } else {
            Self::Lang(s.to_string())
        }
    }

    /// The string form of the kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Core => CORE_KIND,
            Self::Lang(code) => code,
        }
    }

    /// Language code for language packs.
    pub fn language(&self) -> Option<&str> {
        match self {
            Self::Core => None,
            Self::Lang(code) => Some(code),
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A real distributable artifact behind a virtual package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealComponent {
    /// File name of the artifact (RPM or tarball).
    pub name: String,
    /// Source URL of the artifact.
    pub url: String,
    /// Declared or estimated size in bytes.
    pub size: u64,
    /// URL of a SHA-256 checksum file, when the source publishes one.
    pub checksum_url: Option<String>,
}

impl RealComponent {
    /// Create a component without a checksum.
    pub fn new(name: impl Into<String>, url: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            size,
            checksum_url: None,
        }
    }

    /// Attach a checksum file URL.
    pub fn with_checksum_url(mut self, url: impl Into<String>) -> Self {
        self.checksum_url = Some(url.into());
        self
    }
}

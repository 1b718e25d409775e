//! Parsers for RPM database queries and apt-get simulation output.
//!
//! Kept free of I/O so detection rules can be tested against captured
//! command output.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::package::{Family, InstalledOffice, BUILTIN_LANGUAGE};

/// One line of `rpm -qa --qf '%{NAME} %{VERSION}\n'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpmEntry {
    pub name: String,
    pub version: String,
}

/// Query format passed to `rpm -qa`.
pub(crate) const RPM_QUERY_FORMAT: &str = "%{NAME} %{VERSION}\\n";

/// Parse the output of an `rpm -qa` query in [`RPM_QUERY_FORMAT`].
pub fn parse_rpm_query(output: &str) -> Vec<RpmEntry> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let name = parts.next()?;
            let version = parts.next()?;
            Some(RpmEntry {
                name: name.to_string(),
                version: version.to_string(),
            })
        })
        .collect()
}

/// Sub-package suffixes of a LibreOffice/OpenOffice install that look like
/// language codes but are not.
/// Matched against the first `-` component, so `kde-integration` is caught.
const NON_LANGUAGE_SUFFIXES: &[&str] = &[
    "ure", "kde", "sdk", "core", "base", "calc", "draw", "math", "gnome",
];

/// Trailing components of desktop-integration sub-packages.
const NON_LANGUAGE_ENDINGS: &[&str] = &["integration", "menus"];

fn language_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z]{2,3}(?:-[A-Za-z0-9]+)*$").unwrap())
}

fn libreoffice_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^libreoffice(\d+(?:\.\d+)?)(?:-(.+))?$").unwrap())
}

fn openoffice_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:openoffice\.org(3)?|ooobasis(3)\.\d+)(?:-(?:l10n-)?(.+))?$").unwrap()
    })
}

fn as_language(suffix: &str) -> Option<&str> {
    if !language_pattern().is_match(suffix) {
        return None;
    }
    let first = suffix.split('-').next().unwrap_or(suffix);
    let last = suffix.rsplit('-').next().unwrap_or(suffix);
    if NON_LANGUAGE_SUFFIXES.contains(&first) || NON_LANGUAGE_ENDINGS.contains(&last) {
        return None;
    }
    Some(suffix)
}

#[derive(Default)]
struct SuiteAccumulator {
    version: Option<String>,
    langs: Vec<String>,
}

impl SuiteAccumulator {
    fn add_lang(&mut self, lang: &str) {
        if lang != BUILTIN_LANGUAGE && !self.langs.iter().any(|l| l == lang) {
            self.langs.push(lang.to_string());
        }
    }
}

/// Detect installed Office suites from RPM database entries.
///
/// Recognised layouts:
/// - LibreOffice: `libreoffice<X.Y>` core, `libreoffice<X.Y>-<lang>` packs
///   (also the 3.x era `libreoffice3`)
/// - OpenOffice.org 3: `openoffice.org3` core, `openoffice.org3-<lang>` and
///   `ooobasis3.x-<lang>` packs
/// - OpenOffice.org 2: `openoffice.org-core`, `openoffice.org-l10n-<lang>`
///
/// Language packs without a detected core are dropped: there is no version
/// to attach them to.
pub fn parse_installed_office(entries: &[RpmEntry]) -> Vec<InstalledOffice> {
    let mut suites: BTreeMap<(Family, String), SuiteAccumulator> = BTreeMap::new();

    for entry in entries {
        if let Some(caps) = libreoffice_pattern().captures(&entry.name) {
            let key = (Family::LibreOffice, caps[1].to_string());
            let suite = suites.entry(key).or_default();
            match caps.get(2) {
                None => suite.version = Some(entry.version.clone()),
                Some(suffix) => {
                    if let Some(lang) = as_language(suffix.as_str()) {
                        suite.add_lang(lang);
                    }
                }
            }
            continue;
        }

        if let Some(caps) = openoffice_pattern().captures(&entry.name) {
            let generation = if caps.get(1).is_some() || caps.get(2).is_some() {
                "3"
            } else {
                "2"
            };
            let key = (Family::OpenOffice, generation.to_string());
            let suite = suites.entry(key).or_default();
            let suffix = caps.get(3).map(|m| m.as_str());
            let is_core = match generation {
                "3" => suffix.is_none() && entry.name.starts_with("openoffice.org3"),
                _ => suffix == Some("core"),
            };
            if is_core {
                suite.version = Some(entry.version.clone());
            } else if let Some(lang) = suffix.and_then(as_language) {
                suite.add_lang(lang);
            }
        }
    }

    suites
        .into_iter()
        .filter_map(|((family, _), suite)| {
            suite
                .version
                .map(|version| InstalledOffice::new(family, version, suite.langs))
        })
        .collect()
}

/// Version of the installed Java runtime.
pub fn detect_java(entries: &[RpmEntry]) -> Option<String> {
    entries
        .iter()
        .find(|e| e.name == "task-java" || e.name.starts_with("java-1.") || e.name == "jre")
        .map(|e| e.version.clone())
}

/// Version of the installed Openclipart gallery.
pub fn detect_clipart(entries: &[RpmEntry]) -> Option<String> {
    entries
        .iter()
        .find(|e| e.name == "libreoffice-openclipart" || e.name == "clipart-openclipart")
        .map(|e| e.version.clone())
}

/// Counts from the summary line of `apt-get --simulate dist-upgrade`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeSummary {
    pub upgraded: u32,
    pub newly_installed: u32,
    pub removed: u32,
    pub not_upgraded: u32,
}

impl UpgradeSummary {
    /// Whether the simulation would change anything.
    pub fn is_noop(&self) -> bool {
        self.upgraded == 0 && self.newly_installed == 0 && self.removed == 0
    }
}

fn summary_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(\d+) upgraded, (\d+) newly installed, (\d+) removed and (\d+) not upgraded",
        )
        .unwrap()
    })
}

/// Find and parse the apt-get summary line.
pub fn parse_dist_upgrade_summary(output: &str) -> Option<UpgradeSummary> {
    let caps = summary_pattern().captures(output)?;
    let num = |i: usize| caps[i].parse::<u32>().ok();
    Some(UpgradeSummary {
        upgraded: num(1)?,
        newly_installed: num(2)?,
        removed: num(3)?,
        not_upgraded: num(4)?,
    })
}

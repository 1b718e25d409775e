//! Post-install fix-ups for a freshly installed LibreOffice.
//!
//! - Turn off the built-in update check for every user and for new users
//!   (`/etc/skel`), since updates come through this tool.
//! - Normalise the `Categories=` entry of the suite's `.desktop` files.
//! - Refresh the desktop database, icon cache and menus.
//!
//! All fix-ups are best effort: failures are collected as warnings and
//! never fail the install.

use std::fs;
use std::os::unix::fs::{chown, MetadataExt};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use glob::glob;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::version::short_version;

/// Registry file below a user home.
const REGISTRY_PATH: &str = ".config/libreoffice/4/user/registrymodifications.xcu";

const UPDATE_CHECK_ITEM: &str = r#"<item oor:path="/org.openoffice.Office.Jobs/Jobs/org.openoffice.Office.Jobs:Job['UpdateCheck']/Arguments"><prop oor:name="AutoCheckEnabled" oor:op="fuse"><value>false</value></prop></item>"#;

const REGISTRY_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<oor:items xmlns:oor="http://openoffice.org/2001/registry" xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#;

const REGISTRY_FOOTER: &str = "</oor:items>";

/// Desktop cache refresh commands, run in order.
const REFRESH_COMMANDS: &[&[&str]] = &[
    &["update-desktop-database", "/usr/share/applications"],
    &["gtk-update-icon-cache", "-f", "-t", "/usr/share/icons/hicolor"],
    &["xdg-desktop-menu", "forceupdate"],
];

fn auto_check_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?s)(<item[^>]*Job\['UpdateCheck'\]/Arguments"[^>]*>\s*<prop oor:name="AutoCheckEnabled"[^>]*>\s*<value>)[^<]*(</value>)"#,
        )
        .unwrap()
    })
}

/// Registry contents with the automatic update check disabled.
///
/// An existing `AutoCheckEnabled` entry is flipped to `false`; otherwise
/// one is appended. Empty input yields a minimal registry.
///
/// # Example
///
/// ```
/// use lomanager::manager::disable_update_check;
///
/// let xcu = disable_update_check("");
/// assert!(xcu.contains(r#"<prop oor:name="AutoCheckEnabled" oor:op="fuse"><value>false</value>"#));
/// assert_eq!(disable_update_check(&xcu), xcu);
/// ```
pub fn disable_update_check(xcu: &str) -> String {
    let pattern = auto_check_pattern();
    if pattern.is_match(xcu) {
        return pattern.replace_all(xcu, "${1}false${2}").into_owned();
    }

    match xcu.rfind(REGISTRY_FOOTER) {
        Some(pos) => format!("{}{}\n{}", &xcu[..pos], UPDATE_CHECK_ITEM, &xcu[pos..]),
        None => format!(
            "{}\n{}\n{}\n",
            REGISTRY_HEADER, UPDATE_CHECK_ITEM, REGISTRY_FOOTER
        ),
    }
}

/// Desktop entry with a clean `Categories=` line: no duplicates, no empty
/// entries, `Office` present, trailing `;`.
///
/// ```
/// use lomanager::manager::normalize_categories;
///
/// assert_eq!(
///     normalize_categories("[Desktop Entry]\nCategories=WordProcessor;;WordProcessor\n"),
///     "[Desktop Entry]\nCategories=WordProcessor;Office;\n"
/// );
/// ```
pub fn normalize_categories(desktop: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for line in desktop.lines() {
        match line.strip_prefix("Categories=") {
            Some(value) => {
                let mut categories: Vec<&str> = Vec::new();
                for category in value.split(';').map(str::trim).filter(|c| !c.is_empty()) {
                    if !categories.contains(&category) {
                        categories.push(category);
                    }
                }
                if !categories.contains(&"Office") {
                    categories.push("Office");
                }
                out.push(format!("Categories={};", categories.join(";")));
            }
            None => out.push(line.to_string()),
        }
    }

    let mut text = out.join("\n");
    if desktop.ends_with('\n') {
        text.push('\n');
    }
    text
}

/// Outcome of one fix-up run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixupReport {
    /// Registry files written.
    pub registries_updated: usize,
    /// Desktop files rewritten.
    pub desktop_files_updated: usize,
    /// Best-effort failures.
    pub warnings: Vec<String>,
}

/// Applies the fix-ups below a filesystem root.
#[derive(Debug, Clone)]
pub struct Fixups {
    root: PathBuf,
    refresh_caches: bool,
}

impl Fixups {
    /// Fix-ups operating below `root` (`/` in production).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            refresh_caches: true,
        }
    }

    /// Enable or disable the desktop cache refresh commands.
    pub fn with_refresh_caches(mut self, refresh: bool) -> Self {
        self.refresh_caches = refresh;
        self
    }

    /// Run every fix-up for LibreOffice `version`.
    pub fn apply(&self, version: &str) -> FixupReport {
        let mut report = FixupReport::default();

        for home in self.homes() {
            match self.fix_registry(&home) {
                Ok(()) => report.registries_updated += 1,
                Err(e) => report.warnings.push(e),
            }
        }

        for desktop in self.desktop_files(version) {
            match fix_desktop_file(&desktop) {
                Ok(true) => report.desktop_files_updated += 1,
                Ok(false) => {}
                Err(e) => report.warnings.push(e),
            }
        }

        if self.refresh_caches {
            report.warnings.extend(refresh_desktop_caches());
        }

        for warning in &report.warnings {
            warn!(warning = %warning, "Post-install fix-up failed");
        }
        info!(
            registries = report.registries_updated,
            desktop_files = report.desktop_files_updated,
            "Post-install fix-ups applied"
        );
        report
    }

    /// Every user home plus the skeleton for new users.
    fn homes(&self) -> Vec<PathBuf> {
        let mut homes: Vec<PathBuf> = fs::read_dir(self.root.join("home"))
            .map(|entries| {
                entries
                    .flatten()
                    .map(|e| e.path())
                    .filter(|p| p.is_dir())
                    .collect()
            })
            .unwrap_or_default();
        homes.sort();
        homes.push(self.root.join("etc/skel"));
        homes
    }

    fn fix_registry(&self, home: &Path) -> Result<(), String> {
        let registry = home.join(REGISTRY_PATH);
        let existing = fs::read_to_string(&registry).unwrap_or_default();

        let created = missing_ancestors(&registry, home);
        if let Some(parent) = registry.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create {}: {}", parent.display(), e))?;
        }
        fs::write(&registry, disable_update_check(&existing))
            .map_err(|e| format!("cannot write {}: {}", registry.display(), e))?;

        // Files created in a user's home must belong to that user.
        if let Ok(meta) = fs::metadata(home) {
            for path in created.iter().chain(std::iter::once(&registry)) {
                if let Err(e) = chown(path, Some(meta.uid()), Some(meta.gid())) {
                    return Err(format!("cannot chown {}: {}", path.display(), e));
                }
            }
        }

        debug!(path = %registry.display(), "Disabled update check");
        Ok(())
    }

    fn desktop_files(&self, version: &str) -> Vec<PathBuf> {
        let short = short_version(version, 2);
        let patterns = [
            self.root
                .join(format!("usr/share/applications/libreoffice{}-*.desktop", short)),
            self.root
                .join(format!("opt/libreoffice{}/share/xdg/*.desktop", short)),
        ];

        let mut files: Vec<PathBuf> = patterns
            .iter()
            .filter_map(|p| glob(&p.to_string_lossy()).ok())
            .flat_map(|paths| paths.flatten())
            .collect();
        files.sort();
        files.dedup();
        files
    }
}

/// Directories between `base` (exclusive) and `path`'s parent that do not
/// exist yet, outermost first.
fn missing_ancestors(path: &Path, base: &Path) -> Vec<PathBuf> {
    let mut missing: Vec<PathBuf> = path
        .ancestors()
        .skip(1)
        .take_while(|p| *p != base)
        .filter(|p| !p.exists())
        .map(Path::to_path_buf)
        .collect();
    missing.reverse();
    missing
}

fn fix_desktop_file(path: &Path) -> Result<bool, String> {
    let contents =
        fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let fixed = normalize_categories(&contents);
    if fixed == contents {
        return Ok(false);
    }
    fs::write(path, fixed).map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
    debug!(path = %path.display(), "Normalised desktop categories");
    Ok(true)
}

fn refresh_desktop_caches() -> Vec<String> {
    let mut warnings = Vec::new();
    for command in REFRESH_COMMANDS {
        let (program, args) = (command[0], &command[1..]);
        match Command::new(program).args(args).output() {
            Ok(output) if output.status.success() => debug!(program, "Refreshed"),
            Ok(output) => warnings.push(format!(
                "{} exited with {}",
                program, output.status
            )),
            Err(e) => warnings.push(format!("{} could not run: {}", program, e)),
        }
    }
    warnings
}

//! Installing from a local copy of the package files.
//!
//! A local copy is a directory with a fixed layout, the same one the
//! kept-packages directory uses:
//!
//! ```text
//! <dir>/
//! ├── Java_rpms/               task-java-*.rpm
//! ├── LibreOffice-core_tgzs/   LibreOffice_<ver>_Linux_x86-64_rpm.tar.gz
//! ├── LibreOffice-langs_tgzs/  LibreOffice_<ver>_Linux_x86-64_rpm_{langpack,helppack}_<lang>.tar.gz
//! └── Clipart_rpms/            libreoffice-openclipart-<ver>-*.rpm
//! ```
//!
//! Files that do not match the naming patterns are ignored.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::package::{
    is_java_rpm, parse_clipart_rpm, parse_core_archive, parse_lang_archive, Family,
    LangArchiveName, VirtualPackage, CLIPART_DIR, JAVA_DIR, LIBREOFFICE_CORE_DIR,
    LIBREOFFICE_LANGS_DIR,
};
use crate::tree::PackageTree;
use crate::version::compare_versions;

use super::error::{ManagerError, ManagerResult, ProcedureError};
use super::plan::ProcedurePlan;

/// Recognised files of a local copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalCopyScan {
    pub dir: PathBuf,
    pub java: Vec<PathBuf>,
    /// Core archives with their versions.
    pub cores: Vec<(String, PathBuf)>,
    pub langs: Vec<(LangArchiveName, PathBuf)>,
    /// Clipart RPMs with their versions.
    pub clipart: Vec<(String, PathBuf)>,
}

/// A local-copy plan plus what was left out and why.
#[derive(Debug, Clone)]
pub struct LocalCopyPlan {
    pub plan: ProcedurePlan,
    pub warnings: Vec<String>,
}

/// Files of one subfolder, sorted. A missing subfolder is empty.
fn list_files(dir: &Path) -> ManagerResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(ManagerError::ReadFailed {
                path: dir.to_path_buf(),
                source: e,
            })
        }
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Scan a local-copy directory.
pub fn scan_local_copy(dir: &Path) -> ManagerResult<LocalCopyScan> {
    if !dir.is_dir() {
        return Err(ManagerError::ReadFailed {
            path: dir.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let mut scan = LocalCopyScan {
        dir: dir.to_path_buf(),
        ..Default::default()
    };

    for path in list_files(&dir.join(JAVA_DIR))? {
        if is_java_rpm(&file_name(&path)) {
            scan.java.push(path);
        } else {
            debug!(path = %path.display(), "Ignoring file");
        }
    }
    for path in list_files(&dir.join(LIBREOFFICE_CORE_DIR))? {
        match parse_core_archive(&file_name(&path)) {
            Some(version) => scan.cores.push((version, path)),
            None => debug!(path = %path.display(), "Ignoring file"),
        }
    }
    for path in list_files(&dir.join(LIBREOFFICE_LANGS_DIR))? {
        match parse_lang_archive(&file_name(&path)) {
            Some(name) => scan.langs.push((name, path)),
            None => debug!(path = %path.display(), "Ignoring file"),
        }
    }
    for path in list_files(&dir.join(CLIPART_DIR))? {
        match parse_clipart_rpm(&file_name(&path)) {
            Some(version) => scan.clipart.push((version, path)),
            None => debug!(path = %path.display(), "Ignoring file"),
        }
    }

    info!(
        dir = %dir.display(),
        java = scan.java.len(),
        cores = scan.cores.len(),
        langs = scan.langs.len(),
        clipart = scan.clipart.len(),
        "Scanned local copy"
    );
    Ok(scan)
}

/// Version of a Java RPM from its filename, `0` when none is embedded.
fn java_version(path: &Path) -> String {
    let name = file_name(path);
    name.trim_start_matches("task-")
        .trim_start_matches("java")
        .trim_start_matches(|c: char| c == '-' || c == '_')
        .split('-')
        .next()
        .filter(|v| !v.is_empty() && v.chars().all(|c| c.is_ascii_digit() || c == '.'))
        .unwrap_or("0")
        .to_string()
}

fn newest(candidates: &[(String, PathBuf)]) -> Option<&(String, PathBuf)> {
    candidates.iter().max_by(|a, b| {
        compare_versions(&a.0, &b.0).unwrap_or(Ordering::Equal)
    })
}

fn same_version(a: &str, b: &str) -> bool {
    compare_versions(a, b) == Ok(Ordering::Equal)
}

/// Decide what a local copy installs and removes.
///
/// A usable core replaces every installed Office suite. Language packs must
/// match the core's version, or an installed LibreOffice version when the
/// copy has no core. Nothing is touched when the copy cannot be used.
pub fn plan_local_copy(
    scan: &LocalCopyScan,
    tree: &PackageTree,
) -> Result<LocalCopyPlan, ProcedureError> {
    let mut plan = ProcedurePlan::local_copy(&scan.dir);
    let mut warnings = Vec::new();

    let java_installed = tree
        .find(|p| p.family == Family::Java && p.installed)
        .is_some();

    match newest(&scan.cores) {
        Some((version, path)) => {
            if scan.cores.len() > 1 {
                warnings.push(format!(
                    "Several LibreOffice core archives found, using {}",
                    version
                ));
            }

            if !java_installed {
                let Some(first) = scan.java.first() else {
                    return Err(ProcedureError::Resource(format!(
                        "LibreOffice needs Java, which is not installed, and no Java package was found in {}",
                        scan.dir.join(JAVA_DIR).display()
                    )));
                };
                let java = VirtualPackage::core(Family::Java, java_version(first));
                for file in &scan.java {
                    plan.staged.add(&java, file.clone());
                }
                plan.install_java = Some(java);
            }

            let core = VirtualPackage::core(Family::LibreOffice, version.clone());
            plan.staged.add(&core, path.clone());
            plan.install_office.push(core);

            for (name, path) in &scan.langs {
                if same_version(&name.version, version) {
                    stage_lang(&mut plan, name, path);
                } else {
                    warnings.push(format!(
                        "Skipping {}: version {} does not match LibreOffice {}",
                        file_name(path),
                        name.version,
                        version
                    ));
                }
            }

            plan.remove_office = tree
                .iter()
                .filter(|(_, p)| p.family.is_office() && p.installed)
                .map(|(_, p)| p.clone())
                .collect();
        }
        None => {
            for (name, path) in &scan.langs {
                let core_installed = tree
                    .find(|p| {
                        p.family == Family::LibreOffice
                            && p.is_core()
                            && p.installed
                            && same_version(&p.version, &name.version)
                    })
                    .is_some();
                let lang_installed = tree
                    .find(|p| {
                        p.installed
                            && p.is_lang_pack()
                            && p.kind.language() == Some(name.lang.as_str())
                            && same_version(&p.version, &name.version)
                    })
                    .is_some();

                if !core_installed {
                    warnings.push(format!(
                        "Skipping {}: LibreOffice {} is neither installed nor in the local copy",
                        file_name(path),
                        name.version
                    ));
                } else if lang_installed {
                    warnings.push(format!(
                        "Skipping {}: already installed",
                        file_name(path)
                    ));
                } else {
                    stage_lang(&mut plan, name, path);
                }
            }
        }
    }

    if let Some((version, path)) = newest(&scan.clipart) {
        let installed = tree
            .find(|p| p.family == Family::Clipart && p.installed)
            .and_then(|id| tree.get(id));
        let newer = match installed {
            None => true,
            Some(old) => {
                compare_versions(version, &old.version).unwrap_or(Ordering::Equal)
                    == Ordering::Greater
            }
        };
        if newer {
            let clipart = VirtualPackage::core(Family::Clipart, version.clone());
            plan.staged.add(&clipart, path.clone());
            plan.install_clipart = Some(clipart);
            if let Some(old) = installed {
                plan.remove_clipart.push(old.clone());
            }
        } else {
            warnings.push(format!(
                "Skipping Clipart {}: not newer than the installed one",
                version
            ));
        }
    }

    if !plan.has_installs() {
        return Err(ProcedureError::Resource(format!(
            "No usable packages found in {}",
            scan.dir.display()
        )));
    }

    for warning in &warnings {
        warn!(warning = %warning, "Local copy");
    }
    Ok(LocalCopyPlan { plan, warnings })
}

fn stage_lang(plan: &mut ProcedurePlan, name: &LangArchiveName, path: &Path) {
    let lang = VirtualPackage::lang(name.lang.clone(), name.version.clone());
    if !plan.install_office.contains(&lang) {
        plan.install_office.push(lang.clone());
    }
    plan.staged.add(&lang, path.to_path_buf());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CORE: &str = "LibreOffice_7.5.4.2_Linux_x86-64_rpm.tar.gz";

    fn touch(dir: &Path, sub: &str, name: &str) {
        fs::create_dir_all(dir.join(sub)).unwrap();
        fs::write(dir.join(sub).join(name), "").unwrap();
    }

    fn tree(installed: Vec<VirtualPackage>) -> PackageTree {
        let mut tree = PackageTree::new();
        let root = tree.root();
        for p in installed {
            tree.add_child(root, p.with_installed(true));
        }
        tree
    }

    #[test]
    fn test_scan_recognises_layout() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), JAVA_DIR, "task-java-2019-1pclos2019.noarch.rpm");
        touch(temp.path(), LIBREOFFICE_CORE_DIR, CORE);
        touch(temp.path(), LIBREOFFICE_CORE_DIR, "notes.txt");
        touch(
            temp.path(),
            LIBREOFFICE_LANGS_DIR,
            "LibreOffice_7.5.4.2_Linux_x86-64_rpm_langpack_fr.tar.gz",
        );
        touch(
            temp.path(),
            CLIPART_DIR,
            "libreoffice-openclipart-2.0-1pclos2019.noarch.rpm",
        );

        let scan = scan_local_copy(temp.path()).unwrap();
        assert_eq!(scan.java.len(), 1);
        assert_eq!(scan.cores.len(), 1);
        assert_eq!(scan.cores[0].0, "7.5.4.2");
        assert_eq!(scan.langs.len(), 1);
        assert_eq!(scan.clipart[0].0, "2.0");
    }

    #[test]
    fn test_scan_missing_directory() {
        assert!(scan_local_copy(Path::new("/nonexistent/local-copy")).is_err());
    }

    #[test]
    fn test_core_without_java_fails() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), LIBREOFFICE_CORE_DIR, CORE);
        let scan = scan_local_copy(temp.path()).unwrap();

        let err = plan_local_copy(&scan, &tree(vec![])).unwrap_err();
        assert!(err.to_string().contains("Java"));
    }

    #[test]
    fn test_mismatched_lang_is_excluded() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), LIBREOFFICE_CORE_DIR, CORE);
        touch(
            temp.path(),
            LIBREOFFICE_LANGS_DIR,
            "LibreOffice_7.4.7.2_Linux_x86-64_rpm_langpack_de.tar.gz",
        );
        touch(
            temp.path(),
            LIBREOFFICE_LANGS_DIR,
            "LibreOffice_7.5.4.2_Linux_x86-64_rpm_langpack_fr.tar.gz",
        );
        touch(
            temp.path(),
            LIBREOFFICE_LANGS_DIR,
            "LibreOffice_7.5.4.2_Linux_x86-64_rpm_helppack_fr.tar.gz",
        );
        let scan = scan_local_copy(temp.path()).unwrap();
        let installed = tree(vec![
            VirtualPackage::core(Family::Java, "2019"),
            VirtualPackage::core(Family::LibreOffice, "7.4.7.2"),
            VirtualPackage::lang("de", "7.4.7.2"),
        ]);

        let result = plan_local_copy(&scan, &installed).unwrap();
        let labels: Vec<String> = result.plan.install_office.iter().map(|p| p.label()).collect();
        assert_eq!(
            labels,
            vec!["LibreOffice 7.5.4.2 core-packages", "LibreOffice 7.5.4.2 fr"]
        );
        assert_eq!(result.plan.staged.files(&VirtualPackage::lang("fr", "7.5.4.2")).len(), 2);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.plan.install_java.is_none());
        // Everything installed from the Office families is replaced.
        assert_eq!(result.plan.remove_office.len(), 2);
        assert!(result.plan.keep_packages);
    }

    #[test]
    fn test_langs_only_attach_to_installed_core() {
        let temp = TempDir::new().unwrap();
        touch(
            temp.path(),
            LIBREOFFICE_LANGS_DIR,
            "LibreOffice_7.5.4.2_Linux_x86-64_rpm_langpack_fr.tar.gz",
        );
        let scan = scan_local_copy(temp.path()).unwrap();
        let installed = tree(vec![
            VirtualPackage::core(Family::Java, "2019"),
            VirtualPackage::core(Family::LibreOffice, "7.5.4.2"),
        ]);

        let result = plan_local_copy(&scan, &installed).unwrap();
        assert_eq!(result.plan.install_office.len(), 1);
        assert!(result.plan.remove_office.is_empty());
    }

    #[test]
    fn test_nothing_usable() {
        let temp = TempDir::new().unwrap();
        touch(
            temp.path(),
            CLIPART_DIR,
            "libreoffice-openclipart-2.0-1pclos2019.noarch.rpm",
        );
        let scan = scan_local_copy(temp.path()).unwrap();
        let installed = tree(vec![VirtualPackage::core(Family::Clipart, "2.0")]);

        let err = plan_local_copy(&scan, &installed).unwrap_err();
        assert!(err.to_string().starts_with("No usable packages found in"));
    }

    #[test]
    fn test_newer_clipart_replaces_old() {
        let temp = TempDir::new().unwrap();
        touch(
            temp.path(),
            CLIPART_DIR,
            "libreoffice-openclipart-2.0-1pclos2019.noarch.rpm",
        );
        let scan = scan_local_copy(temp.path()).unwrap();
        let installed = tree(vec![VirtualPackage::core(Family::Clipart, "1.0")]);

        let plan = plan_local_copy(&scan, &installed).unwrap().plan;
        assert_eq!(plan.remove_clipart.len(), 1);
        assert_eq!(plan.install_clipart.map(|p| p.version), Some("2.0".to_string()));
    }

    #[test]
    fn test_java_version_from_filename() {
        assert_eq!(java_version(Path::new("task-java-2019-1pclos2019.noarch.rpm")), "2019");
        assert_eq!(java_version(Path::new("java-1.8.0-openjdk.rpm")), "1.8.0");
        assert_eq!(java_version(Path::new("java_runtime.rpm")), "0");
    }
}

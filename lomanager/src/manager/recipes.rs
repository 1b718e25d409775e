//! Removal recipes.
//!
//! A recipe turns a virtual package into the set of RPM name patterns it
//! owns. The patterns are matched against the installed package list, so
//! a recipe never names a package that is not there.

use glob::Pattern;

use crate::package::{Family, PackageKind, VirtualPackage};
use crate::version::short_version;

/// RPM name patterns owned by one virtual package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalRecipe {
    /// Label of the package the recipe was built for.
    pub label: String,
    /// Glob patterns over RPM names.
    pub patterns: Vec<String>,
}

impl RemovalRecipe {
    /// Build the recipe for a package.
    ///
    /// # Example
    ///
    /// ```
    /// use lomanager::manager::RemovalRecipe;
    /// use lomanager::package::{Family, VirtualPackage};
    ///
    /// let recipe = RemovalRecipe::for_package(&VirtualPackage::core(Family::LibreOffice, "7.4.7.2"));
    /// assert!(recipe.matches("libreoffice7.4-fr"));
    /// assert!(recipe.matches("libobasis7.4-core"));
    /// assert!(!recipe.matches("libreoffice7.5"));
    /// ```
    pub fn for_package(package: &VirtualPackage) -> Self {
        let patterns = match (&package.family, &package.kind) {
            (Family::LibreOffice, PackageKind::Core) => {
                let v = short_version(&package.version, 2);
                vec![format!("libreoffice{}*", v), format!("libobasis{}*", v)]
            }
            (Family::LibreOffice, PackageKind::Lang(lang)) => {
                let v = short_version(&package.version, 2);
                vec![
                    format!("libreoffice{}-{}", v, lang),
                    format!("libreoffice{}-dict-{}", v, lang),
                    format!("libobasis{}-{}", v, lang),
                    format!("libobasis{}-{}-help", v, lang),
                ]
            }
            (Family::OpenOffice, PackageKind::Core) => {
                if is_generation_two(&package.version) {
                    vec!["openoffice.org-*".to_string()]
                } else {
                    vec!["openoffice.org3*".to_string(), "ooobasis3*".to_string()]
                }
            }
            (Family::OpenOffice, PackageKind::Lang(lang)) => {
                if is_generation_two(&package.version) {
                    vec![format!("openoffice.org-l10n-{}", lang)]
                } else {
                    vec![
                        format!("openoffice.org3-{}", lang),
                        format!("ooobasis3*-{}", lang),
                    ]
                }
            }
            (Family::Clipart, _) => vec![
                "libreoffice-openclipart*".to_string(),
                "clipart-openclipart*".to_string(),
            ],
            (Family::Java, _) => vec!["task-java*".to_string()],
        };

        Self {
            label: package.label(),
            patterns,
        }
    }

    /// Whether an RPM name belongs to this recipe.
    pub fn matches(&self, rpm_name: &str) -> bool {
        self.patterns
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .any(|p| p.matches(rpm_name))
    }

    /// The installed RPM names this recipe removes.
    pub fn select(&self, installed: &[String]) -> Vec<String> {
        installed
            .iter()
            .filter(|name| self.matches(name))
            .cloned()
            .collect()
    }
}

fn is_generation_two(version: &str) -> bool {
    version == "2" || version.starts_with("2.")
}

/// Installed RPM names removed by any of `packages`, in installed order
/// and without duplicates.
pub fn names_to_remove(packages: &[VirtualPackage], installed: &[String]) -> Vec<String> {
    let recipes: Vec<RemovalRecipe> = packages.iter().map(RemovalRecipe::for_package).collect();
    installed
        .iter()
        .filter(|name| recipes.iter().any(|r| r.matches(name)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lang_recipe_does_not_match_regional_variant() {
        let recipe = RemovalRecipe::for_package(&VirtualPackage::lang("pt", "7.4.7.2"));
        assert!(recipe.matches("libreoffice7.4-pt"));
        assert!(recipe.matches("libobasis7.4-pt-help"));
        assert!(!recipe.matches("libreoffice7.4-pt-BR"));
        assert!(!recipe.matches("libreoffice7.4"));
    }

    #[test]
    fn test_openoffice_generations() {
        let oo3 = RemovalRecipe::for_package(&VirtualPackage::core(Family::OpenOffice, "3.2.1"));
        assert!(oo3.matches("openoffice.org3-calc"));
        assert!(oo3.matches("ooobasis3.2-core01"));
        assert!(!oo3.matches("openoffice.org-core"));

        let oo2 = RemovalRecipe::for_package(&VirtualPackage::core(Family::OpenOffice, "2.4.1"));
        assert!(oo2.matches("openoffice.org-core"));
        assert!(!oo2.matches("openoffice.org3"));
    }

    #[test]
    fn test_clipart_recipe() {
        let recipe = RemovalRecipe::for_package(&VirtualPackage::core(Family::Clipart, "1.0"));
        assert_eq!(
            recipe.select(&names(&["libreoffice-openclipart", "libreoffice7.4", "gimp"])),
            names(&["libreoffice-openclipart"])
        );
    }

    #[test]
    fn test_names_to_remove_deduplicates() {
        let packages = vec![
            VirtualPackage::core(Family::LibreOffice, "7.4.7.2"),
            VirtualPackage::lang("fr", "7.4.7.2"),
        ];
        let installed = names(&[
            "bash",
            "libreoffice7.4",
            "libreoffice7.4-fr",
            "libobasis7.4-fr",
            "libreoffice7.5",
        ]);
        assert_eq!(
            names_to_remove(&packages, &installed),
            names(&["libreoffice7.4", "libreoffice7.4-fr", "libobasis7.4-fr"])
        );
    }
}

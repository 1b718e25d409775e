//! Static catalog of available software.

use crate::package::{
    checksum_url, core_archive_filename, lang_archive_filename, libreoffice_url, repository_url,
    Family, LangArchive, RealComponent, VirtualPackage, BUILTIN_LANGUAGE,
};

/// Estimated size of a LibreOffice core archive, until probed.
pub const ESTIMATED_CORE_SIZE: u64 = 230 * 1024 * 1024;
/// Estimated size of a language pack archive.
pub const ESTIMATED_LANGPACK_SIZE: u64 = 16 * 1024 * 1024;
/// Estimated size of a help pack archive.
pub const ESTIMATED_HELPPACK_SIZE: u64 = 9 * 1024 * 1024;
/// Estimated size of the Java RPM.
pub const ESTIMATED_JAVA_SIZE: u64 = 110 * 1024 * 1024;
/// Estimated size of the Openclipart RPM.
pub const ESTIMATED_CLIPART_SIZE: u64 = 130 * 1024 * 1024;

/// Languages offered when the configuration does not list any.
pub const DEFAULT_LANGUAGES: &[&str] = &[
    "af", "ar", "bg", "ca", "ca-valencia", "cs", "da", "de", "el", "en-GB", "es", "et", "fi",
    "fr", "he", "hr", "hu", "it", "ja", "ko", "lt", "lv", "nb", "nl", "nn", "pl", "pt", "pt-BR",
    "ro", "ru", "sk", "sl", "sr", "sv", "tr", "uk", "zh-CN", "zh-TW",
];

/// Languages with an offline help pack when the configuration does not list any.
pub const DEFAULT_HELPPACK_LANGUAGES: &[&str] = &[
    "ca", "cs", "da", "de", "el", "en-GB", "es", "fi", "fr", "hu", "it", "ja", "ko", "nb", "nl",
    "pl", "pt", "pt-BR", "ru", "sk", "sv", "tr", "uk", "zh-CN", "zh-TW",
];

/// What can be installed, and from where.
///
/// The catalog is static: it is assembled from configuration and never
/// queried over the network. Remote sizes are only probed when packages
/// are collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    /// Recommended LibreOffice version (four segments).
    pub latest_libreoffice: String,
    /// Recommended Openclipart version.
    pub latest_clipart: String,
    /// Java version shipped by the repository.
    pub latest_java: String,
    /// Supported language pack codes (never `en-US`).
    pub languages: Vec<String>,
    /// Languages for which a help pack is published.
    pub helppack_languages: Vec<String>,
    /// Base URL of the LibreOffice download mirror.
    pub libreoffice_base_url: String,
    /// Base URL of the distribution RPM repository.
    pub repo_base_url: String,
    /// Java RPM file name in the repository.
    pub java_package: String,
    /// Openclipart RPM file name in the repository.
    pub clipart_package: String,
    /// Newest lomanager release, if advertised.
    pub latest_client_version: Option<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            latest_libreoffice: "7.6.4.1".to_string(),
            latest_clipart: "2.0".to_string(),
            latest_java: "2019".to_string(),
            languages: DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect(),
            helppack_languages: DEFAULT_HELPPACK_LANGUAGES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            libreoffice_base_url: "https://download.documentfoundation.org/libreoffice/stable"
                .to_string(),
            repo_base_url: "https://ftp.nluug.nl/os/Linux/distr/pclinuxos/pclinuxos/apt/pclinuxos/64bit/RPMS.x86_64"
                .to_string(),
            java_package: "task-java-2019-1pclos2019.noarch.rpm".to_string(),
            clipart_package: "libreoffice-openclipart-2.0-1pclos2019.noarch.rpm".to_string(),
            latest_client_version: None,
        }
    }
}

impl Catalog {
    /// Supported languages, `en-US` excluded.
    pub fn supported_languages(&self) -> impl Iterator<Item = &str> {
        self.languages
            .iter()
            .map(String::as_str)
            .filter(|l| *l != BUILTIN_LANGUAGE)
    }

    fn has_helppack(&self, lang: &str) -> bool {
        self.helppack_languages.iter().any(|l| l == lang)
    }

    fn tarball(&self, version: &str, filename: String, size: u64) -> RealComponent {
        let url = libreoffice_url(&self.libreoffice_base_url, version, &filename);
        let checksum = checksum_url(&url);
        RealComponent::new(filename, url, size).with_checksum_url(checksum)
    }

    /// The LibreOffice core package of `version` with its archive.
    pub fn libreoffice_core(&self, version: &str) -> VirtualPackage {
        VirtualPackage::core(Family::LibreOffice, version).with_components(vec![self.tarball(
            version,
            core_archive_filename(version),
            ESTIMATED_CORE_SIZE,
        )])
    }

    /// A LibreOffice language pack with its langpack and, when published,
    /// helppack archives.
    pub fn libreoffice_lang(&self, version: &str, lang: &str) -> VirtualPackage {
        let mut components = vec![self.tarball(
            version,
            lang_archive_filename(version, lang, LangArchive::Langpack),
            ESTIMATED_LANGPACK_SIZE,
        )];
        if self.has_helppack(lang) {
            components.push(self.tarball(
                version,
                lang_archive_filename(version, lang, LangArchive::Helppack),
                ESTIMATED_HELPPACK_SIZE,
            ));
        }
        VirtualPackage::lang(lang, version).with_components(components)
    }

    /// The Java package from the repository.
    pub fn java(&self) -> VirtualPackage {
        VirtualPackage::core(Family::Java, self.latest_java.clone()).with_components(vec![
            RealComponent::new(
                self.java_package.clone(),
                repository_url(&self.repo_base_url, &self.java_package),
                ESTIMATED_JAVA_SIZE,
            ),
        ])
    }

    /// The Openclipart package from the repository.
    pub fn clipart(&self) -> VirtualPackage {
        VirtualPackage::core(Family::Clipart, self.latest_clipart.clone()).with_components(vec![
            RealComponent::new(
                self.clipart_package.clone(),
                repository_url(&self.repo_base_url, &self.clipart_package),
                ESTIMATED_CLIPART_SIZE,
            ),
        ])
    }

    /// Every available package, all not installed: the latest LibreOffice
    /// core, one language pack per supported language, Clipart and Java.
    pub fn available_packages(&self) -> Vec<VirtualPackage> {
        let version = self.latest_libreoffice.as_str();
        let mut packages = vec![self.java(), self.libreoffice_core(version)];
        packages.extend(
            self.supported_languages()
                .map(|lang| self.libreoffice_lang(version, lang)),
        );
        packages.push(self.clipart());
        packages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog {
            latest_libreoffice: "7.5.4.2".to_string(),
            languages: vec!["fr".to_string(), "en-US".to_string(), "de".to_string()],
            helppack_languages: vec!["fr".to_string()],
            libreoffice_base_url: "https://mirror.test/lo".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_available_packages_shape() {
        let packages = catalog().available_packages();
        let labels: Vec<String> = packages.iter().map(|p| p.label()).collect();
        assert_eq!(
            labels,
            vec![
                "Java 2019 core-packages",
                "LibreOffice 7.5.4.2 core-packages",
                "LibreOffice 7.5.4.2 fr",
                "LibreOffice 7.5.4.2 de",
                "Clipart 2.0 core-packages",
            ]
        );
        assert!(packages.iter().all(|p| !p.installed));
    }

    #[test]
    fn test_helppack_only_when_published() {
        let catalog = catalog();
        assert_eq!(catalog.libreoffice_lang("7.5.4.2", "fr").real_components.len(), 2);
        assert_eq!(catalog.libreoffice_lang("7.5.4.2", "de").real_components.len(), 1);
    }

    #[test]
    fn test_core_component_urls() {
        let core = catalog().libreoffice_core("7.5.4.2");
        let component = &core.real_components[0];
        assert_eq!(
            component.url,
            "https://mirror.test/lo/7.5.4/rpm/x86_64/LibreOffice_7.5.4.2_Linux_x86-64_rpm.tar.gz"
        );
        assert_eq!(
            component.checksum_url.as_deref(),
            Some("https://mirror.test/lo/7.5.4/rpm/x86_64/LibreOffice_7.5.4.2_Linux_x86-64_rpm.tar.gz.sha256")
        );
    }

    #[test]
    fn test_default_catalog_never_offers_builtin_language() {
        let catalog = Catalog {
            languages: vec!["en-US".to_string()],
            ..Default::default()
        };
        assert!(catalog.available_packages().iter().all(|p| p.kind.language() != Some("en-US")));
    }
}

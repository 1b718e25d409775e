//! Dot-separated version comparison.
//!
//! Office suite, language pack, Java and Clipart versions do not follow
//! semantic versioning: LibreOffice uses four segments (`7.5.4.2`), package
//! repositories often two or three. Versions are therefore compared as
//! sequences of non-negative integers of arbitrary length, with the shorter
//! sequence right-padded with zeros.
//!
//! ```
//! use std::cmp::Ordering;
//! use lomanager::version::{compare_versions, newer};
//!
//! assert_eq!(compare_versions("7.5", "7.5.0.0").unwrap(), Ordering::Equal);
//! assert_eq!(compare_versions("7.10", "7.9").unwrap(), Ordering::Greater);
//! assert_eq!(newer("7.4.7.2", "7.5").unwrap(), "7.5");
//! ```

use std::cmp::Ordering;

use thiserror::Error;

/// Errors produced while parsing a version string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// A segment of the version is empty or not a non-negative integer.
    #[error("malformed version '{version}': segment '{segment}' is not a number")]
    Malformed { version: String, segment: String },
}

fn parse_segments(version: &str) -> Result<Vec<u64>, VersionError> {
    version
        .split('.')
        .map(|segment| {
            segment.parse::<u64>().map_err(|_| VersionError::Malformed {
                version: version.to_string(),
                segment: segment.to_string(),
            })
        })
        .collect()
}

/// Compare two dot-separated versions.
///
/// An empty string is older than any non-empty version and equal to
/// another empty string. Any non-numeric segment is a hard error.
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering, VersionError> {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ok(Ordering::Equal),
        (true, false) => {
            parse_segments(b)?;
            return Ok(Ordering::Less);
        }
        (false, true) => {
            parse_segments(a)?;
            return Ok(Ordering::Greater);
        }
        (false, false) => {}
    }

    let left = parse_segments(a)?;
    let right = parse_segments(b)?;
    let len = left.len().max(right.len());

    for i in 0..len {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return Ok(other),
        }
    }

    Ok(Ordering::Equal)
}

/// Return the greater of two versions, `a` when they compare equal.
pub fn newer<'a>(a: &'a str, b: &'a str) -> Result<&'a str, VersionError> {
    match compare_versions(a, b)? {
        Ordering::Less => Ok(b),
        Ordering::Equal | Ordering::Greater => Ok(a),
    }
}

/// Keep only the first `segments` segments of a version.
///
/// Used for package-name recipes (`libreoffice7.5`) and download
/// directories (`7.5.4`).
pub fn short_version(version: &str, segments: usize) -> String {
    version
        .split('.')
        .take(segments)
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_equal_with_padding() {
        assert_eq!(compare_versions("7.5", "7.5.0").unwrap(), Ordering::Equal);
        assert_eq!(compare_versions("7.5.0.0", "7.5").unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        assert_eq!(compare_versions("7.10", "7.9").unwrap(), Ordering::Greater);
        assert_eq!(compare_versions("6.4.7.2", "7.0").unwrap(), Ordering::Less);
    }

    #[test]
    fn test_empty_versions() {
        assert_eq!(compare_versions("", "").unwrap(), Ordering::Equal);
        assert_eq!(compare_versions("", "0").unwrap(), Ordering::Less);
        assert_eq!(compare_versions("1.2", "").unwrap(), Ordering::Greater);
        assert_eq!(newer("7.5", "").unwrap(), "7.5");
    }

    #[test]
    fn test_malformed_segment() {
        let err = compare_versions("7.x", "7.5").unwrap_err();
        assert_eq!(
            err,
            VersionError::Malformed {
                version: "7.x".to_string(),
                segment: "x".to_string(),
            }
        );
        assert!(compare_versions("7..5", "7.5").is_err());
        assert!(compare_versions("", "abc").is_err());
        assert!(newer("7.5", "-1").is_err());
    }

    #[test]
    fn test_newer_returns_first_on_equal() {
        assert_eq!(newer("7.5", "7.5.0").unwrap(), "7.5");
        assert_eq!(newer("7.4", "7.5").unwrap(), "7.5");
    }

    #[test]
    fn test_short_version() {
        assert_eq!(short_version("7.5.4.2", 2), "7.5");
        assert_eq!(short_version("7.5.4.2", 3), "7.5.4");
        assert_eq!(short_version("7", 3), "7");
    }

    fn version_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec(0u64..20, 1..5).prop_map(|segments| {
            segments
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(".")
        })
    }

    proptest! {
        #[test]
        fn prop_antisymmetric(a in version_strategy(), b in version_strategy()) {
            let ab = compare_versions(&a, &b).unwrap();
            let ba = compare_versions(&b, &a).unwrap();
            prop_assert_eq!(ab, ba.reverse());
        }

        #[test]
        fn prop_transitive(
            a in version_strategy(),
            b in version_strategy(),
            c in version_strategy(),
        ) {
            let ab = compare_versions(&a, &b).unwrap();
            let bc = compare_versions(&b, &c).unwrap();
            if ab != Ordering::Greater && bc != Ordering::Greater {
                prop_assert_ne!(compare_versions(&a, &c).unwrap(), Ordering::Greater);
            }
        }

        #[test]
        fn prop_newer_consistent(a in version_strategy(), b in version_strategy()) {
            let winner = newer(&a, &b).unwrap();
            prop_assert_ne!(compare_versions(winner, &a).unwrap(), Ordering::Less);
            prop_assert_ne!(compare_versions(winner, &b).unwrap(), Ordering::Less);
            prop_assert_eq!(newer(&a, &a).unwrap(), a.as_str());
            prop_assert_eq!(newer(&a, "").unwrap(), a.as_str());
        }
    }
}

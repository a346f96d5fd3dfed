// src/availability.rs

//! Availability allow-lists
//!
//! Every module that ends up inside a package must list that package (or the
//! any-package marker) in its allow-list. An unset list means the module is
//! meant for the platform only.

use crate::error::{Error, Result};
use serde::Serialize;
use std::sync::LazyLock;

/// Marker allowing every package
pub const ANY_PACKAGE: &str = "//apex_available:anyapex";

/// Marker allowing the platform (non-package) variant
pub const PLATFORM: &str = "//apex_available:platform";

const MARKER_PREFIX: &str = "//apex_available:";

/// Suffix of an entry matching every package under a name prefix
const WILDCARD_SUFFIX: &str = ".*";

static NAME_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.+\-]*$").unwrap());

/// A module's availability allow-list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Availability {
    entries: Vec<String>,
}

impl Availability {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// No entries were declared
    pub fn is_unset(&self) -> bool {
        self.entries.is_empty()
    }

    /// The platform marker is listed explicitly
    pub fn lists_platform(&self) -> bool {
        self.entries.iter().any(|e| e == PLATFORM)
    }

    /// Whether a platform variant may exist for this list
    pub fn available_to_platform(&self) -> bool {
        self.is_unset() || self.lists_platform()
    }

    /// Whether `package` may contain the module
    ///
    /// `com.android.gki.*` matches every package named `com.android.gki.<x>`.
    pub fn available_for(&self, package: &str) -> bool {
        self.entries.iter().any(|e| {
            if e == ANY_PACKAGE || e == package {
                return true;
            }
            match e.strip_suffix('*') {
                Some(prefix) if e.ends_with(WILDCARD_SUFFIX) => package.starts_with(prefix),
                _ => false,
            }
        })
    }

    /// Check that every entry is a known marker or the name of a declared
    /// package
    pub fn check_names(&self, module: &str, is_package: impl Fn(&str) -> bool) -> Result<()> {
        for entry in &self.entries {
            let valid = if entry.starts_with(MARKER_PREFIX) {
                entry == ANY_PACKAGE || entry == PLATFORM
            } else if let Some(prefix) = entry.strip_suffix(WILDCARD_SUFFIX) {
                // Wildcards may cover packages declared elsewhere
                NAME_RE.is_match(prefix)
            } else {
                NAME_RE.is_match(entry) && is_package(entry)
            };
            if !valid {
                return Err(Error::InvalidAvailabilityName {
                    module: module.to_string(),
                    name: entry.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(entries: &[&str]) -> Availability {
        Availability::new(entries.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_unset_is_platform_only() {
        let avail = Availability::default();
        assert!(avail.is_unset());
        assert!(avail.available_to_platform());
        assert!(!avail.available_for("myapex"));
    }

    #[test]
    fn test_markers() {
        let any = list(&[ANY_PACKAGE]);
        assert!(any.available_for("myapex"));
        assert!(any.available_for("otherapex"));
        assert!(!any.available_to_platform());

        let both = list(&[PLATFORM, "myapex"]);
        assert!(both.available_to_platform());
        assert!(both.available_for("myapex"));
        assert!(!both.available_for("otherapex"));
    }

    #[test]
    fn test_prefix_wildcard() {
        let gki = list(&["myapex", "com.android.gki.*"]);
        assert!(gki.available_for("com.android.gki.fake"));
        assert!(gki.available_for("myapex"));
        assert!(!gki.available_for("com.android.gki"));
        assert!(!gki.available_for("com.android.gkix"));
        assert!(!gki.available_for("otherapex"));
        assert!(!gki.available_to_platform());
    }

    #[test]
    fn test_check_names() {
        let is_package = |name: &str| name == "myapex";
        assert!(list(&[PLATFORM, "myapex"]).check_names("libfoo", is_package).is_ok());

        let err = list(&["otherapex"]).check_names("libfoo", is_package).unwrap_err();
        assert!(err.to_string().contains("\"otherapex\" is not a valid module name"));

        assert!(list(&["com.android.gki.*"]).check_names("libfoo", is_package).is_ok());
        let err = list(&["com.android.*gki.*"]).check_names("libfoo", is_package).unwrap_err();
        assert!(matches!(err, Error::InvalidAvailabilityName { .. }));
        assert!(list(&[".*"]).check_names("libfoo", is_package).is_err());

        let err = list(&["//apex_available:everywhere"])
            .check_names("libfoo", is_package)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAvailabilityName { .. }));
    }
}

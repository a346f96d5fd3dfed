// src/stubs.rs

//! Stub interface versions
//!
//! A stub-capable library publishes an ascending list of interface versions.
//! Consumers outside the library's package link against one of them; the
//! choice is made in [`select_stub`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marker for the unreleased, in-development interface
pub const CURRENT: &str = "current";

/// A published stub interface version
///
/// `Current` orders above every numbered version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StubVersion {
    Numbered(u32),
    Current,
}

impl fmt::Display for StubVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numbered(n) => write!(f, "{}", n),
            Self::Current => write!(f, "{}", CURRENT),
        }
    }
}

impl FromStr for StubVersion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == CURRENT {
            return Ok(Self::Current);
        }
        s.parse::<u32>()
            .map(Self::Numbered)
            .map_err(|_| format!("\"{}\" is not a valid stub version", s))
    }
}

/// Parse and check a module's declared stub versions
///
/// Versions must be strictly ascending; duplicates count as unsorted.
pub fn parse_versions(module: &str, versions: &[String]) -> Result<Vec<StubVersion>> {
    let invalid = |message: String| Error::InvalidProperty {
        module: module.to_string(),
        property: "stubs.versions".to_string(),
        message,
    };

    let parsed = versions
        .iter()
        .map(|v| v.parse::<StubVersion>().map_err(invalid))
        .collect::<Result<Vec<_>>>()?;

    if parsed.windows(2).any(|w| w[0] >= w[1]) {
        return Err(invalid(format!("not sorted: {:?}", versions)));
    }

    Ok(parsed)
}

/// Parse an API level property such as `min_sdk_version`
///
/// API levels share the stub version syntax: a number or `current`.
pub fn parse_api_level(module: &str, property: &str, value: &str) -> Result<StubVersion> {
    value.parse::<StubVersion>().map_err(|message| Error::InvalidProperty {
        module: module.to_string(),
        property: property.to_string(),
        message,
    })
}

/// Parse an optional `min_sdk_version`
pub fn parse_min_sdk(module: &str, value: Option<&String>) -> Result<Option<StubVersion>> {
    value
        .map(|v| parse_api_level(module, "min_sdk_version", v))
        .transpose()
}

/// Split a dependency reference into its module name and optional pin
///
/// `"libfoo#10"` yields `("libfoo", Some(10))`; `"libfoo"` yields no pin.
pub fn split_pin(
    consumer: &str,
    property: &str,
    reference: &str,
) -> Result<(String, Option<StubVersion>)> {
    match reference.split_once('#') {
        None => Ok((reference.to_string(), None)),
        Some((name, version)) => {
            let version = version
                .parse::<StubVersion>()
                .map_err(|message| Error::InvalidProperty {
                    module: consumer.to_string(),
                    property: property.to_string(),
                    message,
                })?;
            Ok((name.to_string(), Some(version)))
        }
    }
}

/// Pick the stub version a cross-boundary consumer links against
///
/// An explicit pin must name a published version. Without one, the latest
/// published version wins. Returns `Ok(None)` when `published` is empty.
pub fn select_stub(
    consumer: &str,
    producer: &str,
    published: &[StubVersion],
    pin: Option<StubVersion>,
) -> Result<Option<StubVersion>> {
    if let Some(pinned) = pin {
        if published.contains(&pinned) {
            return Ok(Some(pinned));
        }
        return Err(Error::UnresolvableStub {
            consumer: consumer.to_string(),
            producer: producer.to_string(),
            version: pinned.to_string(),
            available: join_versions(published),
        });
    }
    Ok(published.iter().max().copied())
}

/// Render a version list for diagnostics
pub fn join_versions(versions: &[StubVersion]) -> String {
    if versions.is_empty() {
        return "none".to_string();
    }
    versions
        .iter()
        .map(StubVersion::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_current_orders_last() {
        assert!(StubVersion::Numbered(1000) < StubVersion::Current);
        assert!(StubVersion::Numbered(2) < StubVersion::Numbered(10));
    }

    #[test]
    fn test_parse_versions_sorted() {
        let parsed = parse_versions("libfoo", &versions(&["1", "2", "3", "current"])).unwrap();
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[3], StubVersion::Current);
    }

    #[test]
    fn test_parse_versions_unsorted() {
        let err = parse_versions("libfoo", &versions(&["10", "2"])).unwrap_err();
        assert!(err.to_string().contains("not sorted"));

        let err = parse_versions("libfoo", &versions(&["2", "2"])).unwrap_err();
        assert!(err.to_string().contains("not sorted"));
    }

    #[test]
    fn test_parse_versions_invalid() {
        let err = parse_versions("libfoo", &versions(&["R"])).unwrap_err();
        assert!(err.to_string().contains("not a valid stub version"));
    }

    #[test]
    fn test_parse_api_level() {
        assert_eq!(
            parse_api_level("mylib", "min_sdk_version", "29").unwrap(),
            StubVersion::Numbered(29)
        );
        assert!(parse_api_level("mylib", "min_sdk_version", "current").unwrap() > StubVersion::Numbered(10000));
        let err = parse_api_level("mylib", "min_sdk_version", "Q").unwrap_err();
        assert!(matches!(err, Error::InvalidProperty { ref property, .. } if property == "min_sdk_version"));
        assert_eq!(parse_min_sdk("mylib", None).unwrap(), None);
    }

    #[test]
    fn test_split_pin() {
        assert_eq!(split_pin("c", "shared_libs", "libfoo").unwrap(), ("libfoo".to_string(), None));
        assert_eq!(
            split_pin("c", "shared_libs", "libfoo#10").unwrap(),
            ("libfoo".to_string(), Some(StubVersion::Numbered(10)))
        );
        assert_eq!(
            split_pin("c", "shared_libs", "libfoo#current").unwrap().1,
            Some(StubVersion::Current)
        );
        let err = split_pin("c", "static_libs", "libfoo#x").unwrap_err();
        assert!(matches!(err, Error::InvalidProperty { ref property, .. } if property == "static_libs"));
    }

    #[test]
    fn test_select_latest() {
        let published = [
            StubVersion::Numbered(1),
            StubVersion::Numbered(2),
            StubVersion::Numbered(3),
        ];
        assert_eq!(
            select_stub("c", "p", &published, None).unwrap(),
            Some(StubVersion::Numbered(3))
        );
    }

    #[test]
    fn test_select_pinned() {
        let published = [
            StubVersion::Numbered(10),
            StubVersion::Numbered(20),
            StubVersion::Numbered(30),
        ];
        assert_eq!(
            select_stub("c", "libfoo", &published, Some(StubVersion::Numbered(10))).unwrap(),
            Some(StubVersion::Numbered(10))
        );

        let err = select_stub("c", "libfoo", &published, Some(StubVersion::Numbered(99)))
            .unwrap_err();
        assert!(matches!(err, Error::UnresolvableStub { ref version, .. } if version == "99"));
        assert!(err.to_string().contains("10, 20, 30"));
    }

    #[test]
    fn test_select_none_published() {
        assert_eq!(select_stub("c", "p", &[], None).unwrap(), None);
        assert!(select_stub("c", "p", &[], Some(StubVersion::Numbered(1))).is_err());
    }
}

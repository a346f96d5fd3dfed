// src/keys.rs

//! Package signing keys and container certificates
//!
//! Key values are paths, joined under the configured dev key directory
//! unless absolute, or `:module` references to a filegroup whose first
//! source is used. Certificates resolve through overrides, certificate
//! modules, or the default certificate directory.

use crate::config::BuildConfig;
use crate::decl::{CertificateDecl, Declarations, FilegroupDecl, PackageKeyDecl};
use crate::error::{Error, Result};
use crate::package::Package;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Resolved public/private key paths for one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    /// Key module name
    pub name: String,
    pub public_key: String,
    pub private_key: String,
}

/// Resolved container certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificatePair {
    /// `.x509.pem` path
    pub pem: String,
    /// `.pk8` path
    pub key: String,
}

impl CertificatePair {
    fn from_prefix(prefix: &str) -> Self {
        Self {
            pem: format!("{}.x509.pem", prefix),
            key: format!("{}.pk8", prefix),
        }
    }
}

/// Key, certificate and filegroup declarations indexed by name
#[derive(Debug, Clone, Default)]
pub struct KeyRegistry {
    keys: HashMap<String, PackageKeyDecl>,
    certificates: HashMap<String, CertificateDecl>,
    filegroups: HashMap<String, FilegroupDecl>,
}

impl KeyRegistry {
    pub fn from_decls(decls: &Declarations) -> Self {
        Self {
            keys: decls
                .package_keys
                .iter()
                .map(|k| (k.name.clone(), k.clone()))
                .collect(),
            certificates: decls
                .certificates
                .iter()
                .map(|c| (c.name.clone(), c.clone()))
                .collect(),
            filegroups: decls
                .filegroups
                .iter()
                .map(|f| (f.name.clone(), f.clone()))
                .collect(),
        }
    }

    /// Resolve a key value to a path
    fn key_path(&self, value: &str, config: &BuildConfig) -> Result<String> {
        if let Some(module) = value.strip_prefix(':') {
            return self
                .filegroups
                .get(module)
                .and_then(|fg| fg.srcs.first().cloned())
                .ok_or_else(|| Error::MissingKey {
                    what: "filegroup".to_string(),
                    name: module.to_string(),
                });
        }
        if Path::new(value).is_absolute() {
            return Ok(value.to_string());
        }
        Ok(Path::new(&config.default_dev_key_dir)
            .join(value)
            .to_string_lossy()
            .into_owned())
    }

    /// Resolve the key pair named by `package.key`
    pub fn resolve_key_pair(&self, package: &Package, config: &BuildConfig) -> Result<KeyPair> {
        let key = self.keys.get(&package.key).ok_or_else(|| Error::MissingKey {
            what: "key".to_string(),
            name: package.key.clone(),
        })?;

        let public = key.public_key.as_deref().ok_or_else(|| Error::MissingKey {
            what: "public_key".to_string(),
            name: key.name.clone(),
        })?;
        let private = key.private_key.as_deref().ok_or_else(|| Error::MissingKey {
            what: "private_key".to_string(),
            name: key.name.clone(),
        })?;

        let public_key = self.key_path(public, config)?;
        let private_key = self.key_path(private, config)?;

        if stem(&public_key) != stem(&private_key) {
            return Err(Error::KeyNameMismatch {
                key: key.name.clone(),
                public: public_key,
                private: private_key,
            });
        }

        debug!("Package {} signs with {}", package.name, private_key);
        Ok(KeyPair {
            name: key.name.clone(),
            public_key,
            private_key,
        })
    }

    /// Resolve the container certificate for `package`
    pub fn resolve_certificate(
        &self,
        package: &Package,
        config: &BuildConfig,
    ) -> Result<CertificatePair> {
        let value = match config.certificate_override(&package.name) {
            Some(cert) => Some(format!(":{}", cert)),
            None => package.certificate.clone(),
        };

        match value.as_deref() {
            None | Some("") => {
                let (pem, key) = config.default_certificate_pair();
                Ok(CertificatePair { pem, key })
            }
            Some(reference) => match reference.strip_prefix(':') {
                Some(module) => self
                    .certificates
                    .get(module)
                    .map(|c| CertificatePair::from_prefix(&c.certificate))
                    .ok_or_else(|| Error::MissingKey {
                        what: "certificate".to_string(),
                        name: module.to_string(),
                    }),
                None => Ok(CertificatePair::from_prefix(&format!(
                    "{}/{}",
                    config.default_certificate_dir, reference
                ))),
            },
        }
    }
}

/// File name without its final extension
fn stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECLS: &str = r#"
        [[package_key]]
        name = "myapex.key"
        public_key = "testkey.avbpubkey"
        private_key = "testkey.pem"

        [[package_key]]
        name = "mismatch.key"
        public_key = "testkey.avbpubkey"
        private_key = "other.pem"

        [[package_key]]
        name = "fg.key"
        public_key = ":mykeys_pub"
        private_key = "/abs/keys/mykey.pem"

        [[package_key]]
        name = "noprivate.key"
        public_key = "testkey.avbpubkey"

        [[filegroup]]
        name = "mykeys_pub"
        srcs = ["vendor/keys/mykey.avbpubkey", "vendor/keys/unused"]

        [[certificate]]
        name = "myapex.certificate"
        certificate = "testkey"

        [[certificate]]
        name = "myapex.certificate.override"
        certificate = "testkey.override"
    "#;

    fn package(name: &str, key: &str, certificate: Option<&str>) -> Package {
        let mut doc = format!("[[package]]\nname = \"{}\"\nkey = \"{}\"\n", name, key);
        if let Some(cert) = certificate {
            doc.push_str(&format!("certificate = \"{}\"\n", cert));
        }
        let decls = Declarations::parse(&doc).unwrap();
        Package::from_decl(&decls.packages[0], Vec::new())
    }

    fn registry() -> KeyRegistry {
        KeyRegistry::from_decls(&Declarations::parse(DECLS).unwrap())
    }

    #[test]
    fn test_key_pair_under_dev_key_dir() {
        let config = BuildConfig::default();
        let pair = registry()
            .resolve_key_pair(&package("myapex", "myapex.key", None), &config)
            .unwrap();
        assert_eq!(
            pair.public_key,
            "build/make/target/product/security/testkey.avbpubkey"
        );
        assert_eq!(pair.private_key, "build/make/target/product/security/testkey.pem");
    }

    #[test]
    fn test_key_pair_from_filegroup_and_absolute() {
        let pair = registry()
            .resolve_key_pair(&package("myapex", "fg.key", None), &BuildConfig::default())
            .unwrap();
        assert_eq!(pair.public_key, "vendor/keys/mykey.avbpubkey");
        assert_eq!(pair.private_key, "/abs/keys/mykey.pem");
    }

    #[test]
    fn test_key_basename_mismatch() {
        let err = registry()
            .resolve_key_pair(&package("myapex", "mismatch.key", None), &BuildConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::KeyNameMismatch { ref key, .. } if key == "mismatch.key"));
    }

    #[test]
    fn test_missing_keys() {
        let reg = registry();
        let config = BuildConfig::default();
        let err = reg
            .resolve_key_pair(&package("myapex", "noprivate.key", None), &config)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "private_key for \"noprivate.key\" could not be found"
        );
        let err = reg
            .resolve_key_pair(&package("myapex", "absent.key", None), &config)
            .unwrap_err();
        assert!(matches!(err, Error::MissingKey { ref what, .. } if what == "key"));
    }

    #[test]
    fn test_certificate_resolution() {
        let reg = registry();
        let mut config = BuildConfig::default();

        let cert = reg
            .resolve_certificate(&package("myapex", "k", None), &config)
            .unwrap();
        assert_eq!(cert.pem, "build/make/target/product/security/testkey.x509.pem");
        assert_eq!(cert.key, "build/make/target/product/security/testkey.pk8");

        let cert = reg
            .resolve_certificate(&package("myapex", "k", Some(":myapex.certificate")), &config)
            .unwrap();
        assert_eq!(cert.pem, "testkey.x509.pem");

        let cert = reg
            .resolve_certificate(&package("myapex", "k", Some("releasekey")), &config)
            .unwrap();
        assert_eq!(cert.key, "build/make/target/product/security/releasekey.pk8");

        config
            .certificate_overrides
            .insert("myapex".to_string(), "myapex.certificate.override".to_string());
        let cert = reg
            .resolve_certificate(&package("myapex", "k", Some(":myapex.certificate")), &config)
            .unwrap();
        assert_eq!(cert.pem, "testkey.override.x509.pem");
        assert_eq!(cert.key, "testkey.override.pk8");
    }

    #[test]
    fn test_missing_certificate_module() {
        let err = registry()
            .resolve_certificate(&package("myapex", "k", Some(":nope")), &BuildConfig::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "certificate for \"nope\" could not be found");
    }

    #[test]
    fn test_stem() {
        assert_eq!(stem("a/b/testkey.avbpubkey"), "testkey");
        assert_eq!(stem("testkey"), "testkey");
        assert_eq!(stem(".hidden"), ".hidden");
    }
}

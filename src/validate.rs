// src/validate.rs

//! Cross-package constraint validation
//!
//! Each rule is a [`PackageCheck`]; a [`ConstraintValidator`] runs its checks
//! over every package in declaration order and stops at the first violation.
//! Checks see the fully resolved state: membership, links and classified
//! content.

use crate::classify::PackageContents;
use crate::config::BuildConfig;
use crate::error::{Error, Result};
use crate::graph::{ModuleGraph, VariantKey};
use crate::membership::{Membership, PackageMembership, arches_for, image_for};
use crate::module::{DepKind, ModuleId, ModuleKind};
use crate::package::{ContentKind, Package, PackageId};
use crate::resolve::Resolution;
use crate::stubs;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info};

/// Platform versions claimed by packages during one validation run
///
/// The first claim for a version wins; later claims are rejected.
#[derive(Debug, Default)]
pub struct VersionRegistry {
    claims: Mutex<HashMap<String, String>>,
}

impl VersionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `version` for `package`
    pub fn register(&self, version: &str, package: &str) -> Result<()> {
        let mut claims = self.claims.lock().unwrap_or_else(|e| e.into_inner());
        match claims.get(version) {
            Some(existing) if existing != package => Err(Error::DuplicateVersion {
                package: package.to_string(),
                version: version.to_string(),
                existing: existing.clone(),
            }),
            Some(_) => Ok(()),
            None => {
                claims.insert(version.to_string(), package.to_string());
                Ok(())
            }
        }
    }

    /// Package owning `version`, if claimed
    pub fn owner(&self, version: &str) -> Option<String> {
        self.claims
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(version)
            .cloned()
    }
}

/// Everything a check can look at for one package
pub struct CheckContext<'a> {
    pub graph: &'a ModuleGraph,
    pub config: &'a BuildConfig,
    pub membership: &'a Membership,
    pub resolution: &'a Resolution,
    pub contents: &'a PackageContents,
    pub registry: &'a VersionRegistry,
    pub package_id: PackageId,
}

impl CheckContext<'_> {
    pub fn package(&self) -> &Package {
        self.graph.package(self.package_id)
    }

    pub fn members(&self) -> &PackageMembership {
        self.membership.package(self.package_id)
    }

    fn module_name(&self, id: ModuleId) -> &str {
        &self.graph.module(id).name
    }
}

/// A single validation rule
pub trait PackageCheck: Send + Sync {
    /// Rule name for logging
    fn name(&self) -> &str;

    fn check(&self, ctx: &CheckContext) -> Result<()>;
}

/// Content referencing disabled modules
pub struct DisabledDependencyCheck;

impl PackageCheck for DisabledDependencyCheck {
    fn name(&self) -> &str {
        "disabled-dependency"
    }

    fn check(&self, ctx: &CheckContext) -> Result<()> {
        let package = ctx.package();
        for member in ctx.members().members.values() {
            let module = ctx.graph.module(member.module);
            if !module.enabled {
                let arch = arches_for(ctx.graph, ctx.config, member.module)
                    .first()
                    .copied()
                    .flatten();
                let variant = VariantKey::in_package(arch, image_for(package), &package.name);
                return Err(Error::DisabledDependency {
                    package: package.name.clone(),
                    variant: variant.to_string(),
                    module: module.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Allow-list entries must be markers or declared packages
pub struct AvailabilityNameCheck;

impl PackageCheck for AvailabilityNameCheck {
    fn name(&self) -> &str {
        "availability-names"
    }

    fn check(&self, ctx: &CheckContext) -> Result<()> {
        let is_package = |name: &str| ctx.graph.lookup_package(name).is_some();
        for member in ctx.members().expanded() {
            let module = ctx.graph.module(member.module);
            module.availability.check_names(&module.name, is_package)?;
            if let Some(avail) = &module.static_availability {
                avail.check_names(&module.name, is_package)?;
            }
        }
        Ok(())
    }
}

/// Every module inside a package must allow that package
pub struct AvailabilityCheck;

impl PackageCheck for AvailabilityCheck {
    fn name(&self) -> &str {
        "availability"
    }

    fn check(&self, ctx: &CheckContext) -> Result<()> {
        let package = ctx.package();
        if package.flags.test {
            return Ok(());
        }
        let members = ctx.members();
        for member in members.expanded() {
            let module = ctx.graph.module(member.module);
            let kind = if member.is_bundled() {
                DepKind::Shared
            } else {
                DepKind::Static
            };
            if module.availability_for(kind).available_for(&package.name) {
                continue;
            }
            let from = match member.parent {
                Some(parent) => ctx.module_name(parent).to_string(),
                None => package.name.clone(),
            };
            return Err(Error::NotAvailable {
                package: package.name.clone(),
                from,
                to: module.name.clone(),
                path: members.dependency_path(ctx.graph, member.module),
            });
        }
        Ok(())
    }
}

/// Vendor linkage must be allowed and every native module vendor-eligible
pub struct VendorCheck;

impl PackageCheck for VendorCheck {
    fn name(&self) -> &str {
        "use-vendor"
    }

    fn check(&self, ctx: &CheckContext) -> Result<()> {
        let package = ctx.package();
        if !package.flags.use_vendor {
            return Ok(());
        }
        if !ctx.config.vendor_allowed(&package.name) {
            return Err(Error::VendorNotAllowed(package.name.clone()));
        }
        for member in ctx.members().expanded() {
            let module = ctx.graph.module(member.module);
            if module.is_native() && !module.vendor_available {
                return Err(Error::MissingVariant {
                    consumer: package.name.clone(),
                    producer: module.name.clone(),
                    variant: "image:vendor".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// A used package must provide shared libraries in the same linkage mode
pub struct UsesCheck;

impl PackageCheck for UsesCheck {
    fn name(&self) -> &str {
        "uses-provides"
    }

    fn check(&self, ctx: &CheckContext) -> Result<()> {
        let package = ctx.package();
        for name in &package.uses {
            let Some(id) = ctx.graph.lookup_package(name) else {
                return Err(Error::UndefinedModule {
                    consumer: package.name.clone(),
                    dependency: name.clone(),
                });
            };
            let used = ctx.graph.package(id);
            if !used.flags.provides_shared_libs {
                return Err(Error::UsesNonProvider {
                    user: package.name.clone(),
                    provider: used.name.clone(),
                });
            }
            if used.flags.use_vendor != package.flags.use_vendor {
                return Err(Error::UsesModeMismatch {
                    user: package.name.clone(),
                    provider: used.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// One package per platform version
pub struct VersionUniquenessCheck;

impl PackageCheck for VersionUniquenessCheck {
    fn name(&self) -> &str {
        "version-uniqueness"
    }

    fn check(&self, ctx: &CheckContext) -> Result<()> {
        let package = ctx.package();
        match &package.vndk_version {
            Some(version) => ctx.registry.register(version, &package.name),
            None => Ok(()),
        }
    }
}

/// Tests belong in test packages only
pub struct TestContentCheck;

impl PackageCheck for TestContentCheck {
    fn name(&self) -> &str {
        "test-content"
    }

    fn check(&self, ctx: &CheckContext) -> Result<()> {
        let package = ctx.package();
        let has_tests = package.content.iter().any(|c| c.kind == ContentKind::Test);
        if has_tests && !package.flags.test {
            return Err(Error::constraint(
                &package.name,
                "tests: only allowed in test packages",
            ));
        }
        Ok(())
    }
}

/// Updatable packages need a minimum SDK and classpath configs
pub struct UpdatableCheck;

impl PackageCheck for UpdatableCheck {
    fn name(&self) -> &str {
        "updatable"
    }

    fn check(&self, ctx: &CheckContext) -> Result<()> {
        let package = ctx.package();
        if !package.flags.updatable {
            return Ok(());
        }
        if package.min_sdk_version.is_none() {
            return Err(Error::constraint(
                &package.name,
                "updatable: updatable packages should set min_sdk_version as well",
            ));
        }
        for content in &package.content {
            let module = ctx.graph.module(content.module);
            if let Some(fragment) = module.as_boot_fragment() {
                if !fragment.generates_classpath_config() {
                    return Err(Error::constraint(
                        &package.name,
                        format!(
                            "\"{}\" is included in updatable package, it must not set generate_classpaths_proto to false",
                            module.name
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Bundled content must run on the package's oldest supported platform
pub struct MinSdkVersionCheck;

impl PackageCheck for MinSdkVersionCheck {
    fn name(&self) -> &str {
        "min-sdk-version"
    }

    fn check(&self, ctx: &CheckContext) -> Result<()> {
        let package = ctx.package();
        if package.flags.test {
            return Ok(());
        }
        let Some(value) = package.min_sdk_version.as_deref() else {
            return Ok(());
        };
        let required = stubs::parse_api_level(&package.name, "min_sdk_version", value)?;

        for member in ctx.members().expanded() {
            let module = ctx.graph.module(member.module);
            match module.min_sdk_version {
                Some(version) if version > required => {
                    return Err(Error::MinSdkVersion {
                        module: module.name.clone(),
                        version: version.to_string(),
                        required: required.to_string(),
                        package: package.name.clone(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Stub libraries of other packages must not be linked statically
pub struct StaticStubCheck;

impl PackageCheck for StaticStubCheck {
    fn name(&self) -> &str {
        "static-stub"
    }

    fn check(&self, ctx: &CheckContext) -> Result<()> {
        let package = ctx.package();
        let members = ctx.members();
        for member in members.members.values() {
            let module = ctx.graph.module(member.module);
            if member.static_linked && module.has_stubs() && !package.contains_directly(member.module) {
                let from = member
                    .parent
                    .map(|p| ctx.module_name(p).to_string())
                    .unwrap_or_else(|| package.name.clone());
                return Err(Error::constraint(
                    &package.name,
                    format!(
                        "\"{}\" required by \"{}\" is a native library providing stub. It shouldn't be included in this package via static linking. Dependency path: {}",
                        module.name,
                        from,
                        members.dependency_path(ctx.graph, member.module)
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Bundled Java libraries must be compiled to dex
pub struct JavaDexCheck;

impl PackageCheck for JavaDexCheck {
    fn name(&self) -> &str {
        "java-dex"
    }

    fn check(&self, ctx: &CheckContext) -> Result<()> {
        let package = ctx.package();
        for member in ctx.members().members.values().filter(|m| m.is_bundled()) {
            let module = ctx.graph.module(member.module);
            if let ModuleKind::JavaLibrary(lib) = &module.kind {
                if !lib.compile_dex {
                    return Err(Error::constraint(
                        &package.name,
                        format!(
                            "\"{}\" is not configured to be compiled into dex; set compile_dex: true",
                            module.name
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Binaries placed in packages must link dynamically
pub struct StaticExecutableCheck;

impl PackageCheck for StaticExecutableCheck {
    fn name(&self) -> &str {
        "static-executable"
    }

    fn check(&self, ctx: &CheckContext) -> Result<()> {
        let package = ctx.package();
        for content in package.content.iter().filter(|c| c.kind == ContentKind::Binary) {
            let module = ctx.graph.module(content.module);
            if let ModuleKind::Binary(binary) = &module.kind {
                if binary.static_executable {
                    return Err(Error::constraint(
                        &package.name,
                        format!("executable {} is static", module.name),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Runs checks over packages in declaration order
pub struct ConstraintValidator {
    checks: Vec<Box<dyn PackageCheck>>,
}

impl ConstraintValidator {
    /// Create a validator with no checks
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Validator with every built-in check, in reporting order
    pub fn with_defaults() -> Self {
        Self::new()
            .with_check(DisabledDependencyCheck)
            .with_check(AvailabilityNameCheck)
            .with_check(AvailabilityCheck)
            .with_check(VendorCheck)
            .with_check(UsesCheck)
            .with_check(VersionUniquenessCheck)
            .with_check(TestContentCheck)
            .with_check(UpdatableCheck)
            .with_check(MinSdkVersionCheck)
            .with_check(StaticStubCheck)
            .with_check(JavaDexCheck)
            .with_check(StaticExecutableCheck)
    }

    pub fn with_check(mut self, check: impl PackageCheck + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Validate every package; the first violation aborts
    pub fn validate(
        &self,
        graph: &ModuleGraph,
        config: &BuildConfig,
        membership: &Membership,
        resolution: &Resolution,
        contents: &[PackageContents],
    ) -> Result<()> {
        let registry = VersionRegistry::new();
        for package_contents in contents {
            let ctx = CheckContext {
                graph,
                config,
                membership,
                resolution,
                contents: package_contents,
                registry: &registry,
                package_id: package_contents.package,
            };
            for check in &self.checks {
                debug!("Check {} on {}", check.name(), ctx.package().name);
                check.check(&ctx)?;
            }
        }
        info!(
            "Validated {} packages with {} checks",
            contents.len(),
            self.checks.len()
        );
        Ok(())
    }
}

impl Default for ConstraintValidator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify;
    use crate::decl::Declarations;
    use crate::graph::ProviderMap;
    use crate::{membership, resolve};

    fn validate_with(toml: &str, config: &BuildConfig) -> Result<()> {
        let graph = ModuleGraph::from_declarations(&Declarations::parse(toml)?)?;
        let membership = membership::compute(&graph, config)?;
        let resolution = resolve::resolve(&graph, &membership, config)?;
        let providers = ProviderMap::new();
        let contents = classify::classify(&graph, &membership, &resolution, &providers, config)?;
        ConstraintValidator::with_defaults().validate(&graph, config, &membership, &resolution, &contents)
    }

    fn validate(toml: &str) -> Result<()> {
        validate_with(toml, &BuildConfig::default())
    }

    #[test]
    fn test_registry_first_wins() {
        let registry = VersionRegistry::new();
        registry.register("27", "myapex_v27").unwrap();
        registry.register("27", "myapex_v27").unwrap();
        let err = registry.register("27", "myapex_v27_other").unwrap_err();
        assert_eq!(
            err.to_string(),
            "package \"myapex_v27_other\": vndk_version: 27 is already defined in \"myapex_v27\""
        );
        assert_eq!(registry.owner("27").as_deref(), Some("myapex_v27"));
    }

    #[test]
    fn test_availability_gate() {
        let err = validate(
            r#"
            [[package]]
            name = "myPkg"
            key = "k"
            native_shared_libs = ["libfoo"]

            [[package]]
            name = "otherPkg"
            key = "k"

            [[native_library]]
            name = "libfoo"
            apex_available = ["otherPkg"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotAvailable { ref package, ref to, .. } if package == "myPkg" && to == "libfoo"));

        validate(
            r#"
            [[package]]
            name = "myPkg"
            key = "k"

            [[package]]
            name = "otherPkg"
            key = "k"
            native_shared_libs = ["libfoo"]

            [[native_library]]
            name = "libfoo"
            apex_available = ["otherPkg"]
            "#,
        )
        .unwrap();
    }

    #[test]
    fn test_availability_indirect_path() {
        let err = validate(
            r#"
            [[package]]
            name = "myapex"
            key = "k"
            native_shared_libs = ["libfoo"]

            [[native_library]]
            name = "libfoo"
            shared_libs = ["libbar"]
            apex_available = ["myapex"]

            [[native_library]]
            name = "libbar"
            shared_libs = ["libbaz"]
            apex_available = ["myapex"]

            [[native_library]]
            name = "libbaz"
            "#,
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("\"libbar\" requires \"libbaz\""), "{}", msg);
        assert!(msg.contains("myapex -> libfoo -> libbar -> libbaz"), "{}", msg);
    }

    #[test]
    fn test_test_package_skips_availability() {
        validate(
            r#"
            [[package]]
            name = "myapex"
            key = "k"
            test = true
            native_shared_libs = ["libfoo"]

            [[native_library]]
            name = "libfoo"
            "#,
        )
        .unwrap();
    }

    #[test]
    fn test_invalid_availability_name() {
        let err = validate(
            r#"
            [[package]]
            name = "myapex"
            key = "k"
            native_shared_libs = ["libfoo"]

            [[native_library]]
            name = "libfoo"
            apex_available = ["otherapex"]
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("\"otherapex\" is not a valid module name"));
    }

    #[test]
    fn test_stub_boundary_needs_no_availability() {
        validate(
            r#"
            [[package]]
            name = "myapex"
            key = "k"
            native_shared_libs = ["libfoo"]

            [[native_library]]
            name = "libfoo"
            runtime_libs = ["libbaz"]
            shared_libs = ["libstub"]
            apex_available = ["myapex"]

            [[native_library]]
            name = "libbaz"
            stubs = { versions = ["10", "20", "30"] }

            [[native_library]]
            name = "libstub"
            stubs = { versions = ["1"] }
            "#,
        )
        .unwrap();
    }

    #[test]
    fn test_static_availability_used_for_static_members() {
        validate(
            r#"
            [[package]]
            name = "myapex"
            key = "k"
            native_shared_libs = ["libfoo"]

            [[native_library]]
            name = "libfoo"
            static_libs = ["libstatic"]
            apex_available = ["myapex"]

            [[native_library]]
            name = "libstatic"
            apex_available = ["//apex_available:platform"]
            static = { apex_available = ["myapex"] }
            "#,
        )
        .unwrap();
    }

    const VENDOR: &str = r#"
        [[package]]
        name = "myapex"
        key = "k"
        use_vendor = true
        native_shared_libs = ["mylib"]

        [[native_library]]
        name = "mylib"
        apex_available = ["myapex"]
    "#;

    #[test]
    fn test_vendor_not_allowed() {
        let err = validate(VENDOR).unwrap_err();
        assert_eq!(err.to_string(), "package \"myapex\": use_vendor: not allowed");
    }

    #[test]
    fn test_vendor_missing_variant() {
        let config = BuildConfig {
            use_vendor_allowlist: vec!["myapex".to_string()],
            ..BuildConfig::default()
        };
        let err = validate_with(VENDOR, &config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "dependency \"mylib\" of \"myapex\" missing variant:\n image:vendor"
        );

        let eligible = VENDOR.replace("name = \"mylib\"", "name = \"mylib\"\n        vendor_available = true");
        validate_with(&eligible, &config).unwrap();
    }

    #[test]
    fn test_uses_requires_provider() {
        let err = validate(
            r#"
            [[package]]
            name = "myapex"
            key = "k"
            uses = ["commonapex"]

            [[package]]
            name = "commonapex"
            key = "k"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UsesNonProvider { ref provider, .. } if provider == "commonapex"));
    }

    #[test]
    fn test_uses_mode_mismatch() {
        let config = BuildConfig {
            use_vendor_allowlist: vec!["myapex".to_string()],
            ..BuildConfig::default()
        };
        let err = validate_with(
            r#"
            [[package]]
            name = "myapex"
            key = "k"
            use_vendor = true
            uses = ["commonapex"]

            [[package]]
            name = "commonapex"
            key = "k"
            provide_cpp_shared_libs = true
            "#,
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UsesModeMismatch { .. }));
    }

    #[test]
    fn test_version_uniqueness() {
        let err = validate(
            r#"
            [[package]]
            name = "myapex_v27"
            key = "k"
            vndk_version = "27"

            [[package]]
            name = "myapex_v27_other"
            key = "k"
            vndk_version = "27"
            "#,
        )
        .unwrap_err();
        assert!(
            matches!(err, Error::DuplicateVersion { ref package, ref existing, .. }
                if package == "myapex_v27_other" && existing == "myapex_v27")
        );
    }

    #[test]
    fn test_disabled_dependency() {
        let err = validate(
            r#"
            [[package]]
            name = "myapex"
            key = "k"
            java_libs = ["myjar"]

            [[java_library]]
            name = "myjar"
            enabled = false
            apex_available = ["myapex"]
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("depends on disabled module \"myjar\""));
        assert!(matches!(err, Error::DisabledDependency { ref variant, .. } if variant == "common_core_myapex"));
    }

    #[test]
    fn test_supplementary_checks() {
        let err = validate(
            r#"
            [[package]]
            name = "myapex"
            key = "k"
            tests = ["mytest"]

            [[native_test]]
            name = "mytest"
            apex_available = ["myapex"]
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("tests: only allowed in test packages"));

        let err = validate(
            r#"
            [[package]]
            name = "myapex"
            key = "k"
            updatable = true
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("min_sdk_version"));

        let err = validate(
            r#"
            [[package]]
            name = "myapex"
            key = "k"
            java_libs = ["myjar"]

            [[java_library]]
            name = "myjar"
            compile_dex = false
            apex_available = ["myapex"]
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("compile_dex"));

        let err = validate(
            r#"
            [[package]]
            name = "myapex"
            key = "k"
            binaries = ["mybin"]

            [[binary]]
            name = "mybin"
            static_executable = true
            apex_available = ["myapex"]
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("executable mybin is static"));
    }

    #[test]
    fn test_static_link_to_stub_library() {
        let err = validate(
            r#"
            [[package]]
            name = "myapex"
            key = "k"
            native_shared_libs = ["mylib"]

            [[native_library]]
            name = "mylib"
            static_libs = ["libstub"]
            apex_available = ["myapex"]

            [[native_library]]
            name = "libstub"
            apex_available = ["myapex"]
            stubs = { versions = ["1"] }
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("providing stub"));
    }

    const MIN_SDK: &str = r#"
        [[package]]
        name = "myapex"
        key = "k"
        native_shared_libs = ["mylib"]
        min_sdk_version = "29"

        [[native_library]]
        name = "mylib"
        shared_libs = ["mylib2"]
        apex_available = ["myapex"]
        min_sdk_version = "29"

        [[native_library]]
        name = "mylib2"
        apex_available = ["myapex"]
        min_sdk_version = "MYLIB2_SDK"
    "#;

    #[test]
    fn test_min_sdk_version_covers_indirect_content() {
        let err = validate(&MIN_SDK.replace("MYLIB2_SDK", "30")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "module \"mylib2\": should support min_sdk_version(29) for \"myapex\": its min_sdk_version is 30"
        );

        validate(&MIN_SDK.replace("MYLIB2_SDK", "28")).unwrap();
        validate(&MIN_SDK.replace("min_sdk_version = \"MYLIB2_SDK\"", "")).unwrap();

        let test_package = MIN_SDK
            .replace("MYLIB2_SDK", "current")
            .replacen("min_sdk_version = \"29\"\n", "min_sdk_version = \"29\"\ntest = true\n", 1);
        validate(&test_package).unwrap();
    }

    #[test]
    fn test_min_sdk_version_unparsable() {
        let err = validate(&MIN_SDK.replace("MYLIB2_SDK", "Q")).unwrap_err();
        assert!(matches!(err, Error::InvalidProperty { ref module, .. } if module == "mylib2"));
    }

    #[test]
    fn test_custom_chain() {
        let validator = ConstraintValidator::new().with_check(VersionUniquenessCheck);
        assert_eq!(validator.len(), 1);
        assert_eq!(ConstraintValidator::default().len(), 12);
    }
}

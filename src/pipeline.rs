// src/pipeline.rs

//! Build pipeline
//!
//! Runs the passes in a fixed order, each one finishing before the next
//! starts:
//!
//! 1. graph construction from declarations
//! 2. package membership and variant creation
//! 3. stub/version resolution
//! 4. boot image providers and content classification
//! 5. constraint validation
//! 6. manifest, key and packaging assembly, providers first
//!
//! The first error aborts the build; no partial recipe is produced.

use crate::classify::{self, PackageContents};
use crate::config::BuildConfig;
use crate::decl::Declarations;
use crate::error::{Error, Result};
use crate::graph::{ModuleGraph, ProviderMap};
use crate::keys::{CertificatePair, KeyPair, KeyRegistry};
use crate::manifest::Manifest;
use crate::membership::{self, Membership};
use crate::order::PackageOrder;
use crate::packaging::{self, MakeMetadata, PackagingInvocation};
use crate::resolve::{self, Resolution};
use crate::validate::ConstraintValidator;
use serde::Serialize;
use tracing::info;

/// State after every analysis pass has run
#[derive(Debug)]
pub struct Analysis {
    pub graph: ModuleGraph,
    pub membership: Membership,
    pub resolution: Resolution,
    pub providers: ProviderMap,
    /// Indexed by package id
    pub contents: Vec<PackageContents>,
}

/// Counts reported by `check`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub modules: usize,
    pub packages: usize,
    pub variants: usize,
    pub links: usize,
}

/// Everything produced for one package
#[derive(Debug, Clone, Serialize)]
pub struct PackageRecipe {
    pub name: String,
    pub manifest: Manifest,
    pub keys: KeyPair,
    pub certificate: CertificatePair,
    pub invocation: PackagingInvocation,
    pub make: MakeMetadata,
}

/// Build output, packages in assembly order
#[derive(Debug, Clone, Serialize)]
pub struct BuildRecipe {
    pub packages: Vec<PackageRecipe>,
}

impl BuildRecipe {
    pub fn package(&self, name: &str) -> Option<&PackageRecipe> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::SerializeError(e.to_string()))
    }
}

/// One variant in the listing printed by `variants`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantEntry {
    pub module: String,
    pub variant: String,
}

/// Runs the passes over one set of declarations
pub struct Pipeline<'a> {
    decls: &'a Declarations,
    config: &'a BuildConfig,
    validator: ConstraintValidator,
}

impl<'a> Pipeline<'a> {
    pub fn new(decls: &'a Declarations, config: &'a BuildConfig) -> Self {
        Self {
            decls,
            config,
            validator: ConstraintValidator::with_defaults(),
        }
    }

    /// Replace the default constraint checks
    pub fn with_validator(mut self, validator: ConstraintValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Build the graph and create variants
    fn prepare(&self) -> Result<(ModuleGraph, Membership)> {
        self.config.validate()?;
        let graph = ModuleGraph::from_declarations(self.decls)?;
        let membership = membership::compute(&graph, self.config)?;
        Ok((graph, membership))
    }

    /// Run every pass up to and including validation
    pub fn analyze(&self) -> Result<Analysis> {
        let (graph, membership) = self.prepare()?;
        let resolution = resolve::resolve(&graph, &membership, self.config)?;

        let mut providers = ProviderMap::new();
        classify::compute_boot_images(&graph, &membership, self.config, &mut providers)?;
        let contents = classify::classify(&graph, &membership, &resolution, &providers, self.config)?;

        self.validator
            .validate(&graph, self.config, &membership, &resolution, &contents)?;

        Ok(Analysis {
            graph,
            membership,
            resolution,
            providers,
            contents,
        })
    }

    /// Validate without assembling
    pub fn check(&self) -> Result<CheckSummary> {
        let analysis = self.analyze()?;
        Ok(CheckSummary {
            modules: analysis.graph.module_count(),
            packages: analysis.graph.package_count(),
            variants: analysis.membership.variants.len(),
            links: analysis.resolution.len(),
        })
    }

    /// Every created variant, grouped by module in declaration order
    pub fn variants(&self) -> Result<Vec<VariantEntry>> {
        let (graph, membership) = self.prepare()?;
        let mut entries: Vec<(usize, VariantEntry)> = membership
            .variants
            .iter()
            .map(|(_, v)| {
                (
                    v.module.0,
                    VariantEntry {
                        module: graph.module(v.module).name.clone(),
                        variant: v.key.to_string(),
                    },
                )
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.variant.cmp(&b.1.variant)));
        Ok(entries.into_iter().map(|(_, e)| e).collect())
    }

    /// Run the full build
    pub fn plan(&self) -> Result<BuildRecipe> {
        let analysis = self.analyze()?;
        let graph = &analysis.graph;
        let keys = KeyRegistry::from_decls(self.decls);
        let order = PackageOrder::from_graph(graph).sorted(graph)?;

        let mut packages = Vec::with_capacity(order.len());
        for id in order {
            let package = graph.package(id);
            let contents = &analysis.contents[id.0];

            let manifest = Manifest::for_package(package, contents, self.config);
            let key_pair = keys.resolve_key_pair(package, self.config)?;
            let certificate = keys.resolve_certificate(package, self.config)?;
            let invocation = PackagingInvocation::build(
                package,
                contents,
                &manifest,
                &key_pair,
                &certificate,
                self.config,
            )?;
            let make = MakeMetadata::for_package(
                package,
                contents,
                packaging::should_compress(package, self.config),
            );

            packages.push(PackageRecipe {
                name: package.name.clone(),
                manifest,
                keys: key_pair,
                certificate,
                invocation,
                make,
            });
        }

        info!("Planned {} packages", packages.len());
        Ok(BuildRecipe { packages })
    }
}

// src/resolve.rs

//! Per-edge variant selection
//!
//! For every non-stub variant and every link edge of its module, pick the
//! producer variant the consumer links against. Same-package and
//! platform-to-platform edges get the implementation; edges crossing a
//! package boundary into a stub library get a stub version (pinned or
//! latest).
//!
//! The pass is a pure function of the graph and the membership result.

use crate::config::{Arch, BuildConfig};
use crate::error::{Error, Result};
use crate::graph::{ImageClass, ModuleGraph, StubSelection, VariantId, VariantKey};
use crate::membership::{Membership, image_for};
use crate::module::{DepEdge, DepKind, Module};
use crate::package::PackageId;
use crate::stubs::{self, StubVersion};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// A resolved link between two variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Link {
    pub consumer: VariantId,
    pub producer: VariantId,
    pub kind: DepKind,
}

/// Output of the resolution pass
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    links: BTreeMap<VariantId, Vec<Link>>,
}

impl Resolution {
    /// Links leaving `consumer`
    pub fn links_from(&self, consumer: VariantId) -> &[Link] {
        self.links.get(&consumer).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.links.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.links.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Arch axis of the producer for a consumer on `consumer_arch`
fn producer_arch(producer: &Module, consumer_arch: Option<Arch>, config: &BuildConfig) -> Option<Arch> {
    if producer.is_native() {
        consumer_arch.or(Some(config.primary_arch()))
    } else {
        None
    }
}

struct Resolver<'a> {
    graph: &'a ModuleGraph,
    membership: &'a Membership,
    config: &'a BuildConfig,
}

impl Resolver<'_> {
    fn missing(&self, consumer: &Module, producer: &Module, key: &VariantKey) -> Error {
        Error::MissingVariant {
            consumer: consumer.name.clone(),
            producer: producer.name.clone(),
            variant: key.to_string(),
        }
    }

    fn lookup(&self, consumer: &Module, edge: &DepEdge, key: VariantKey) -> Result<VariantId> {
        let producer = self.graph.module(edge.target);
        self.membership
            .variants
            .get(edge.target, &key)
            .ok_or_else(|| self.missing(consumer, producer, &key))
    }

    /// Stub variant chosen for a cross-boundary edge
    fn stub_variant(
        &self,
        consumer: &Module,
        edge: &DepEdge,
        arch: Option<Arch>,
    ) -> Result<VariantId> {
        let producer = self.graph.module(edge.target);
        let published = producer
            .as_stubs()
            .map(|s| s.stub_versions())
            .unwrap_or(&[]);
        match stubs::select_stub(&consumer.name, &producer.name, published, edge.pin)? {
            Some(version) => self.lookup(consumer, edge, VariantKey::stub(arch, version)),
            None => Err(self.missing(consumer, producer, &VariantKey::stub(arch, StubVersion::Current))),
        }
    }

    /// Check a pin without using it
    fn check_pin(&self, consumer: &Module, edge: &DepEdge) -> Result<()> {
        if edge.pin.is_none() {
            return Ok(());
        }
        let producer = self.graph.module(edge.target);
        let published = producer
            .as_stubs()
            .map(|s| s.stub_versions())
            .unwrap_or(&[]);
        stubs::select_stub(&consumer.name, &producer.name, published, edge.pin).map(|_| ())
    }

    fn resolve_in_package(
        &self,
        package: PackageId,
        consumer: &Module,
        key: &VariantKey,
        edge: &DepEdge,
    ) -> Result<VariantId> {
        let pkg = self.graph.package(package);
        let producer = self.graph.module(edge.target);
        let arch = producer_arch(producer, key.arch, self.config);
        let own = VariantKey::in_package(arch, key.image, &pkg.name);

        if edge.kind == DepKind::Static {
            return self.lookup(consumer, edge, own);
        }

        if producer.has_stubs() {
            if pkg.contains_directly(edge.target) {
                self.check_pin(consumer, edge)?;
                return self.lookup(consumer, edge, own);
            }
            return self.stub_variant(consumer, edge, arch);
        }

        self.check_pin(consumer, edge)?;
        let member = self.membership.package(package).member(edge.target);
        if let Some(provider) = member.filter(|m| !m.is_expanded()).and_then(|m| m.provider) {
            let used = self.graph.package(provider);
            let key = VariantKey::in_package(arch, image_for(used), &used.name);
            return self.lookup(consumer, edge, key);
        }
        self.lookup(consumer, edge, own)
    }

    fn resolve_on_platform(
        &self,
        consumer: &Module,
        key: &VariantKey,
        edge: &DepEdge,
    ) -> Result<VariantId> {
        let producer = self.graph.module(edge.target);
        let arch = producer_arch(producer, key.arch, self.config);
        let platform = &self.membership.platform;

        match edge.kind {
            DepKind::Static if platform.static_(edge.target) => {
                self.lookup(consumer, edge, VariantKey::platform(arch))
            }
            DepKind::Shared if platform.shared(edge.target) => {
                self.check_pin(consumer, edge)?;
                self.lookup(consumer, edge, VariantKey::platform(arch))
            }
            DepKind::Shared if producer.has_stubs() => self.stub_variant(consumer, edge, arch),
            _ => Err(self.missing(consumer, producer, &VariantKey::platform(arch))),
        }
    }
}

/// Run the resolution pass over every non-stub variant
pub fn resolve(
    graph: &ModuleGraph,
    membership: &Membership,
    config: &BuildConfig,
) -> Result<Resolution> {
    let resolver = Resolver {
        graph,
        membership,
        config,
    };
    let mut links: BTreeMap<VariantId, Vec<Link>> = BTreeMap::new();

    for (id, variant) in membership.variants.iter() {
        if variant.key.stub != StubSelection::Implementation {
            continue;
        }
        let consumer = graph.module(variant.module);
        let package = match &variant.key.package {
            Some(name) => graph.lookup_package(name),
            None => None,
        };

        for edge in consumer.deps.iter().filter(|e| e.kind.is_link()) {
            let producer = match package {
                Some(pkg) => resolver.resolve_in_package(pkg, consumer, &variant.key, edge)?,
                None => resolver.resolve_on_platform(consumer, &variant.key, edge)?,
            };
            debug!(
                "{} ({}) -> {} ({})",
                consumer.name,
                variant.key,
                graph.module(edge.target).name,
                membership.variants.variant(producer).key
            );
            links.entry(id).or_default().push(Link {
                consumer: id,
                producer,
                kind: edge.kind,
            });
        }
    }

    let resolution = Resolution { links };
    info!("Resolved {} links", resolution.len());
    Ok(resolution)
}

/// Stub version a consumer variant links for `producer`, if it links a stub
pub fn selected_stub(
    membership: &Membership,
    resolution: &Resolution,
    consumer: VariantId,
    producer: crate::module::ModuleId,
) -> Option<StubSelection> {
    resolution
        .links_from(consumer)
        .iter()
        .map(|l| membership.variants.variant(l.producer))
        .find(|v| v.module == producer)
        .map(|v| v.key.stub)
}

/// Image class used for a package name, `Core` on the platform
pub fn image_of(graph: &ModuleGraph, package: Option<&str>) -> ImageClass {
    package
        .and_then(|name| graph.lookup_package(name))
        .map(|id| image_for(graph.package(id)))
        .unwrap_or(ImageClass::Core)
}

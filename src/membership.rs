// src/membership.rs

//! Package membership pass
//!
//! Walks each package's closure from its direct content and records how every
//! reached module got there. The walk stops at stub boundaries, at libraries
//! provided by a used package, and after runtime-only edges. Once every
//! package has been walked, variants are created: platform variants, stub
//! variants, and one independent package-scoped variant per member.
//!
//! Packages are walked in parallel; variant creation happens afterwards, in
//! declaration order, so the resulting [`VariantSet`] does not depend on
//! scheduling.

use crate::config::{Arch, BuildConfig};
use crate::error::Result;
use crate::graph::{ImageClass, ModuleGraph, VariantKey, VariantSet};
use crate::module::{DepKind, ModuleId};
use crate::package::{Package, PackageId};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

/// How a module was reached from a package's direct content
#[derive(Debug, Clone, Serialize)]
pub struct Member {
    pub module: ModuleId,
    /// Listed in the package's own content
    pub direct: bool,
    /// Reached through a shared link inside the package
    pub linked: bool,
    /// Reached through a static link
    pub static_linked: bool,
    /// Reached through a shared link that crosses to another package's
    /// implementation (stub or provider)
    pub external: bool,
    /// Reached through a runtime-only edge
    pub runtime: bool,
    /// Used package whose content satisfies the edge
    pub provider: Option<PackageId>,
    /// Module the first edge came from; `None` for direct content
    pub parent: Option<ModuleId>,
}

impl Member {
    fn new(module: ModuleId, parent: Option<ModuleId>) -> Self {
        Self {
            module,
            direct: false,
            linked: false,
            static_linked: false,
            external: false,
            runtime: false,
            provider: None,
            parent,
        }
    }

    /// Copied into the package as a file
    pub fn is_bundled(&self) -> bool {
        self.direct || self.linked
    }

    /// Has a package-scoped variant whose dependencies were walked
    pub fn is_expanded(&self) -> bool {
        self.direct || self.linked || self.static_linked
    }

    /// Needed at runtime but satisfied outside the package
    pub fn is_required_only(&self) -> bool {
        !self.is_bundled() && (self.external || self.runtime)
    }
}

/// Members of one package
#[derive(Debug, Clone, Serialize)]
pub struct PackageMembership {
    pub package: PackageId,
    pub members: BTreeMap<ModuleId, Member>,
}

impl PackageMembership {
    pub fn member(&self, module: ModuleId) -> Option<&Member> {
        self.members.get(&module)
    }

    /// Members with a package-scoped variant
    pub fn expanded(&self) -> impl Iterator<Item = &Member> {
        self.members.values().filter(|m| m.is_expanded())
    }

    /// First path from the package to `module`, e.g. `myapex -> mylib -> mylib2`
    pub fn dependency_path(&self, graph: &ModuleGraph, module: ModuleId) -> String {
        let mut chain = Vec::new();
        let mut cursor = Some(module);
        while let Some(id) = cursor {
            chain.push(graph.module(id).name.clone());
            cursor = self.members.get(&id).and_then(|m| m.parent);
            if chain.len() > graph.module_count() {
                break;
            }
        }
        chain.push(graph.package(self.package).name.clone());
        chain.reverse();
        chain.join(" -> ")
    }
}

/// Which modules may have platform variants
#[derive(Debug, Clone, Default)]
pub struct PlatformAvailability {
    shared: HashSet<ModuleId>,
    static_: HashSet<ModuleId>,
}

impl PlatformAvailability {
    /// Compute platform availability to a fixpoint
    ///
    /// A module stays platform-available only while every stubless link
    /// dependency is platform-available too. Edges into stub libraries cross
    /// a package boundary and do not count.
    pub fn compute(graph: &ModuleGraph) -> Self {
        let mut shared: HashSet<ModuleId> = HashSet::new();
        let mut static_: HashSet<ModuleId> = HashSet::new();
        for (id, module) in graph.modules() {
            if module.availability_for(DepKind::Shared).available_to_platform() {
                shared.insert(id);
            }
            if module.availability_for(DepKind::Static).available_to_platform() {
                static_.insert(id);
            }
        }

        loop {
            let mut changed = false;
            for (id, module) in graph.modules() {
                if !shared.contains(&id) && !static_.contains(&id) {
                    continue;
                }
                let deps_ok = module.deps.iter().all(|edge| match edge.kind {
                    DepKind::Shared => {
                        graph.module(edge.target).has_stubs() || shared.contains(&edge.target)
                    }
                    DepKind::Static => static_.contains(&edge.target),
                    DepKind::Runtime | DepKind::Header => true,
                });
                if !deps_ok {
                    changed |= shared.remove(&id);
                    changed |= static_.remove(&id);
                }
            }
            if !changed {
                break;
            }
        }

        Self { shared, static_ }
    }

    pub fn shared(&self, module: ModuleId) -> bool {
        self.shared.contains(&module)
    }

    pub fn static_(&self, module: ModuleId) -> bool {
        self.static_.contains(&module)
    }

    /// Whether any platform variant exists
    pub fn any(&self, module: ModuleId) -> bool {
        self.shared(module) || self.static_(module)
    }
}

/// Output of the membership pass
#[derive(Debug, Clone)]
pub struct Membership {
    /// Indexed by package id
    pub packages: Vec<PackageMembership>,
    pub variants: VariantSet,
    pub platform: PlatformAvailability,
    /// Packages listing each module directly
    pub direct_owners: HashMap<ModuleId, Vec<PackageId>>,
}

impl Membership {
    pub fn package(&self, id: PackageId) -> &PackageMembership {
        &self.packages[id.0]
    }

    /// Whether any package lists `module` in its own content
    pub fn directly_in_any_package(&self, module: ModuleId) -> bool {
        self.direct_owners.contains_key(&module)
    }
}

/// Image class of a package's variants
pub fn image_for(package: &Package) -> ImageClass {
    if package.flags.use_vendor {
        ImageClass::Vendor
    } else {
        ImageClass::Core
    }
}

/// Arch axis values for `module`
pub fn arches_for(graph: &ModuleGraph, config: &BuildConfig, module: ModuleId) -> Vec<Option<Arch>> {
    if graph.module(module).is_native() {
        config.arches.iter().copied().map(Some).collect()
    } else {
        vec![None]
    }
}

/// Find a used package that provides `module` as shared-library content
fn provider_for(
    graph: &ModuleGraph,
    package: &Package,
    module: ModuleId,
) -> Option<PackageId> {
    package.uses.iter().find_map(|name| {
        let id = graph.lookup_package(name)?;
        let used = graph.package(id);
        (used.flags.provides_shared_libs && used.contains_directly(module)).then_some(id)
    })
}

fn walk_package(graph: &ModuleGraph, id: PackageId) -> PackageMembership {
    let package = graph.package(id);
    let mut members: BTreeMap<ModuleId, Member> = BTreeMap::new();

    let roots: Vec<ModuleId> = package.content.iter().map(|c| c.module).collect();
    for root in &roots {
        members
            .entry(*root)
            .or_insert_with(|| Member::new(*root, None))
            .direct = true;
    }

    graph.walk_deps(&roots, |parent, edge| {
        if edge.kind == DepKind::Header {
            return false;
        }
        let target = edge.target;
        let member = members
            .entry(target)
            .or_insert_with(|| Member::new(target, Some(parent)));

        match edge.kind {
            DepKind::Runtime => {
                member.runtime = true;
                false
            }
            DepKind::Static => {
                member.static_linked = true;
                true
            }
            DepKind::Shared => {
                if member.direct {
                    return true;
                }
                if graph.module(target).has_stubs() {
                    member.external = true;
                    return false;
                }
                if let Some(provider) = provider_for(graph, package, target) {
                    member.external = true;
                    member.provider = Some(provider);
                    return false;
                }
                member.linked = true;
                true
            }
            DepKind::Header => false,
        }
    });

    debug!(
        "Package {}: {} members ({} bundled)",
        package.name,
        members.len(),
        members.values().filter(|m| m.is_bundled()).count()
    );

    PackageMembership {
        package: id,
        members,
    }
}

/// Run the membership pass
pub fn compute(graph: &ModuleGraph, config: &BuildConfig) -> Result<Membership> {
    let platform = PlatformAvailability::compute(graph);

    let ids: Vec<PackageId> = graph.packages().map(|(id, _)| id).collect();
    let packages: Vec<PackageMembership> = ids
        .par_iter()
        .map(|id| walk_package(graph, *id))
        .collect();

    let mut direct_owners: HashMap<ModuleId, Vec<PackageId>> = HashMap::new();
    for (id, package) in graph.packages() {
        for content in &package.content {
            let owners = direct_owners.entry(content.module).or_default();
            if !owners.contains(&id) {
                owners.push(id);
            }
        }
    }

    let mut variants = VariantSet::new();
    for (id, module) in graph.modules() {
        let arches = arches_for(graph, config, id);
        if platform.any(id) {
            variants.create_variants(id, arches.iter().map(|a| VariantKey::platform(*a)));
        }
        if let Some(stubs) = module.as_stubs() {
            for version in stubs.stub_versions() {
                variants.create_variants(id, arches.iter().map(|a| VariantKey::stub(*a, *version)));
            }
        }
    }

    for membership in &packages {
        let package = graph.package(membership.package);
        let image = image_for(package);
        for member in membership.expanded() {
            let arches = arches_for(graph, config, member.module);
            variants.create_variants(
                member.module,
                arches
                    .iter()
                    .map(|a| VariantKey::in_package(*a, image, &package.name)),
            );
        }
    }

    info!(
        "Membership: {} packages, {} variants",
        packages.len(),
        variants.len()
    );

    Ok(Membership {
        packages,
        variants,
        platform,
        direct_owners,
    })
}

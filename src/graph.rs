// src/graph.rs

//! Module graph and variant primitives
//!
//! The graph is an arena of module records addressed by [`ModuleId`], with
//! dependency edges stored as ids. It is built once from declarations and is
//! read-only afterwards; every pass produces new state ([`VariantSet`],
//! [`ProviderMap`], pass outputs) instead of mutating it.
//!
//! # Example
//!
//! ```ignore
//! use modpack::decl::Declarations;
//! use modpack::graph::ModuleGraph;
//!
//! let decls = Declarations::load(Path::new("modules.toml"))?;
//! let graph = ModuleGraph::from_declarations(&decls)?;
//! let mylib = graph.lookup("mylib").unwrap();
//! graph.visit_direct_deps(mylib, |edge, dep| println!("{} ({})", dep.name, edge.kind));
//! ```

use crate::availability::Availability;
use crate::config::Arch;
use crate::decl::Declarations;
use crate::error::{Error, Result};
use crate::module::{
    App, Binary, BootFragment, DepEdge, DepKind, JavaLibrary, Module, ModuleId, ModuleKind,
    NativeLibrary, Prebuilt,
};
use crate::package::{ContentKind, ContentRef, Package, PackageId};
use crate::stubs::{self, StubVersion};
use serde::Serialize;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use strum_macros::Display;
use tracing::debug;

/// Image class axis of a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ImageClass {
    Core,
    Vendor,
}

/// Stub axis of a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum StubSelection {
    Implementation,
    Version(StubVersion),
}

/// Axis assignment identifying one variant of a module
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct VariantKey {
    /// Target arch; `None` for arch-independent modules
    pub arch: Option<Arch>,
    pub image: ImageClass,
    /// Owning package; `None` for platform and stub variants
    pub package: Option<String>,
    pub stub: StubSelection,
}

impl VariantKey {
    /// Platform implementation variant
    pub fn platform(arch: Option<Arch>) -> Self {
        Self {
            arch,
            image: ImageClass::Core,
            package: None,
            stub: StubSelection::Implementation,
        }
    }

    /// Implementation variant owned by `package`
    pub fn in_package(arch: Option<Arch>, image: ImageClass, package: &str) -> Self {
        Self {
            arch,
            image,
            package: Some(package.to_string()),
            stub: StubSelection::Implementation,
        }
    }

    /// Stub variant for a published version
    pub fn stub(arch: Option<Arch>, version: StubVersion) -> Self {
        Self {
            arch,
            image: ImageClass::Core,
            package: None,
            stub: StubSelection::Version(version),
        }
    }

    pub fn is_stub(&self) -> bool {
        matches!(self.stub, StubSelection::Version(_))
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.arch {
            Some(arch) => write!(f, "{}_{}", arch, self.image)?,
            None => write!(f, "common_{}", self.image)?,
        }
        if let Some(package) = &self.package {
            write!(f, "_{}", package)?;
        }
        if let StubSelection::Version(version) = self.stub {
            write!(f, "_{}", version)?;
        }
        Ok(())
    }
}

/// Index of a variant in a [`VariantSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct VariantId(pub usize);

/// A module specialized along every axis
#[derive(Debug, Clone, Serialize)]
pub struct Variant {
    pub module: ModuleId,
    pub key: VariantKey,
}

/// All variants created so far, one per (module, key)
#[derive(Debug, Clone, Default)]
pub struct VariantSet {
    variants: Vec<Variant>,
    index: HashMap<(ModuleId, VariantKey), VariantId>,
}

impl VariantSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create variants of `module` for each key
    ///
    /// Keys that already exist return the existing id.
    pub fn create_variants(
        &mut self,
        module: ModuleId,
        keys: impl IntoIterator<Item = VariantKey>,
    ) -> Vec<VariantId> {
        keys.into_iter()
            .map(|key| {
                if let Some(id) = self.index.get(&(module, key.clone())) {
                    return *id;
                }
                let id = VariantId(self.variants.len());
                self.index.insert((module, key.clone()), id);
                self.variants.push(Variant { module, key });
                id
            })
            .collect()
    }

    pub fn get(&self, module: ModuleId, key: &VariantKey) -> Option<VariantId> {
        self.index.get(&(module, key.clone())).copied()
    }

    pub fn variant(&self, id: VariantId) -> &Variant {
        &self.variants[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariantId, &Variant)> {
        self.variants
            .iter()
            .enumerate()
            .map(|(i, v)| (VariantId(i), v))
    }

    /// Variants of one module, in creation order
    pub fn of_module(&self, module: ModuleId) -> impl Iterator<Item = (VariantId, &Variant)> {
        self.iter().filter(move |(_, v)| v.module == module)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// Typed per-module side channel between passes
///
/// Each (module, type) slot is written at most once.
#[derive(Default)]
pub struct ProviderMap {
    values: HashMap<(ModuleId, TypeId), Box<dyn Any + Send + Sync>>,
}

impl ProviderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `value` for `module`
    pub fn set<T: Any + Send + Sync>(
        &mut self,
        graph: &ModuleGraph,
        module: ModuleId,
        value: T,
    ) -> Result<()> {
        let slot = (module, TypeId::of::<T>());
        if self.values.contains_key(&slot) {
            return Err(Error::ProviderConflict {
                module: graph.module(module).name.clone(),
                provider: std::any::type_name::<T>().to_string(),
            });
        }
        self.values.insert(slot, Box::new(value));
        Ok(())
    }

    pub fn get<T: Any + Send + Sync>(&self, module: ModuleId) -> Option<&T> {
        self.values
            .get(&(module, TypeId::of::<T>()))
            .and_then(|v| v.downcast_ref::<T>())
    }
}

impl fmt::Debug for ProviderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderMap")
            .field("entries", &self.values.len())
            .finish()
    }
}

/// Module dependencies as declared, before names are resolved
struct RawDep {
    reference: String,
    kind: DepKind,
    /// Declaration property the reference came from
    property: &'static str,
}

fn raw<'a>(
    kind: DepKind,
    property: &'static str,
    refs: &'a [String],
) -> impl Iterator<Item = RawDep> + 'a {
    refs.iter().map(move |r| RawDep {
        reference: r.clone(),
        kind,
        property,
    })
}

fn availability(entries: &[String]) -> Availability {
    Availability::new(entries.to_vec())
}

/// The module graph
#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    index: HashMap<String, ModuleId>,
    packages: Vec<Package>,
    package_index: HashMap<String, PackageId>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from declarations
    ///
    /// Fails on duplicate names, unresolvable references, malformed stub
    /// versions or pins, and link cycles.
    pub fn from_declarations(decls: &Declarations) -> Result<Self> {
        let mut graph = Self::new();
        let mut pending: Vec<(ModuleId, Vec<RawDep>)> = Vec::new();

        for lib in &decls.native_libraries {
            let stubs = stubs::parse_versions(&lib.name, &lib.stubs.versions)?;
            let mut module = Module::new(
                &lib.name,
                ModuleKind::NativeLibrary(NativeLibrary {
                    stubs,
                    stem: lib.stem.clone(),
                }),
            );
            module.availability = availability(&lib.apex_available);
            module.static_availability = lib.static_props.apex_available.as_deref().map(availability);
            module.vendor_available = lib.vendor_available;
            module.enabled = lib.enabled;
            module.min_sdk_version = stubs::parse_min_sdk(&lib.name, lib.min_sdk_version.as_ref())?;
            let deps = raw(DepKind::Shared, "shared_libs", &lib.shared_libs)
                .chain(raw(DepKind::Static, "static_libs", &lib.static_libs))
                .chain(raw(DepKind::Runtime, "runtime_libs", &lib.runtime_libs))
                .chain(raw(DepKind::Header, "header_libs", &lib.header_libs))
                .collect();
            pending.push((graph.add_module(module)?, deps));
        }

        let binaries = decls.binaries.iter().map(|b| (b, false));
        let tests = decls.native_tests.iter().map(|b| (b, true));
        for (bin, is_test) in binaries.chain(tests) {
            let binary = Binary {
                stem: bin.stem.clone(),
                static_executable: bin.static_executable,
            };
            let kind = if is_test {
                ModuleKind::NativeTest(binary)
            } else {
                ModuleKind::Binary(binary)
            };
            let mut module = Module::new(&bin.name, kind);
            module.availability = availability(&bin.apex_available);
            module.vendor_available = bin.vendor_available;
            module.enabled = bin.enabled;
            module.min_sdk_version = stubs::parse_min_sdk(&bin.name, bin.min_sdk_version.as_ref())?;
            let deps = raw(DepKind::Shared, "shared_libs", &bin.shared_libs)
                .chain(raw(DepKind::Static, "static_libs", &bin.static_libs))
                .chain(raw(DepKind::Runtime, "runtime_libs", &bin.runtime_libs))
                .chain(raw(DepKind::Header, "header_libs", &bin.header_libs))
                .collect();
            pending.push((graph.add_module(module)?, deps));
        }

        for lib in &decls.java_libraries {
            let mut module = Module::new(
                &lib.name,
                ModuleKind::JavaLibrary(JavaLibrary {
                    compile_dex: lib.compile_dex,
                    installable: lib.installable,
                }),
            );
            module.availability = availability(&lib.apex_available);
            module.enabled = lib.enabled;
            module.min_sdk_version = stubs::parse_min_sdk(&lib.name, lib.min_sdk_version.as_ref())?;
            let deps = raw(DepKind::Static, "static_libs", &lib.static_libs)
                .chain(raw(DepKind::Header, "libs", &lib.libs))
                .collect();
            pending.push((graph.add_module(module)?, deps));
        }

        for fragment in &decls.boot_fragments {
            let mut module = Module::new(
                &fragment.name,
                ModuleKind::BootFragment(BootFragment {
                    contents: fragment.contents.clone(),
                    generate_classpaths_proto: fragment.generate_classpaths_proto,
                }),
            );
            module.availability = availability(&fragment.apex_available);
            module.enabled = fragment.enabled;
            let deps = raw(DepKind::Shared, "contents", &fragment.contents).collect();
            pending.push((graph.add_module(module)?, deps));
        }

        for prebuilt in &decls.prebuilts {
            let mut module = Module::new(
                &prebuilt.name,
                ModuleKind::Prebuilt(Prebuilt {
                    src: prebuilt.src.clone(),
                    sub_dir: prebuilt.sub_dir.clone(),
                    filename: prebuilt.filename.clone(),
                    installable: prebuilt.installable,
                }),
            );
            module.availability = availability(&prebuilt.apex_available);
            module.enabled = prebuilt.enabled;
            pending.push((graph.add_module(module)?, Vec::new()));
        }

        for app in &decls.apps {
            let mut module = Module::new(
                &app.name,
                ModuleKind::App(App {
                    privileged: app.privileged,
                }),
            );
            module.availability = availability(&app.apex_available);
            module.enabled = app.enabled;
            module.min_sdk_version = stubs::parse_min_sdk(&app.name, app.min_sdk_version.as_ref())?;
            let deps = raw(DepKind::Shared, "jni_libs", &app.jni_libs).collect();
            pending.push((graph.add_module(module)?, deps));
        }

        for (id, deps) in pending {
            let consumer = graph.modules[id.0].name.clone();
            let mut edges = Vec::with_capacity(deps.len());
            for dep in deps {
                let (name, pin) = stubs::split_pin(&consumer, dep.property, &dep.reference)?;
                if pin.is_some() && !dep.kind.is_link() {
                    return Err(Error::InvalidProperty {
                        module: consumer,
                        property: dep.property.to_string(),
                        message: format!(
                            "\"{}\": stub version pins are only allowed on linked libraries",
                            dep.reference
                        ),
                    });
                }
                let target = graph.require(&consumer, &name)?;
                edges.push(DepEdge {
                    target,
                    kind: dep.kind,
                    pin,
                });
            }
            graph.modules[id.0].deps = edges;
        }

        for decl in &decls.packages {
            let lists = [
                (ContentKind::NativeSharedLib, &decl.native_shared_libs),
                (ContentKind::Binary, &decl.binaries),
                (ContentKind::Test, &decl.tests),
                (ContentKind::JavaLib, &decl.java_libs),
                (ContentKind::BootFragment, &decl.bootclasspath_fragments),
                (ContentKind::Prebuilt, &decl.prebuilts),
                (ContentKind::App, &decl.apps),
            ];
            let mut content = Vec::new();
            for (kind, names) in lists {
                for name in names {
                    content.push(ContentRef {
                        module: graph.require(&decl.name, name)?,
                        kind,
                    });
                }
            }
            graph.add_package(Package::from_decl(decl, content))?;
        }

        graph.check_acyclic()?;

        debug!(
            "Built module graph: {} modules, {} packages",
            graph.modules.len(),
            graph.packages.len()
        );
        Ok(graph)
    }

    /// Add a module, rejecting duplicate names
    pub fn add_module(&mut self, module: Module) -> Result<ModuleId> {
        if self.index.contains_key(&module.name) || self.package_index.contains_key(&module.name) {
            return Err(Error::DuplicateModule(module.name));
        }
        let id = ModuleId(self.modules.len());
        self.index.insert(module.name.clone(), id);
        self.modules.push(module);
        Ok(id)
    }

    /// Add a package, rejecting duplicate names
    pub fn add_package(&mut self, package: Package) -> Result<PackageId> {
        if self.package_index.contains_key(&package.name) || self.index.contains_key(&package.name)
        {
            return Err(Error::DuplicateModule(package.name));
        }
        let id = PackageId(self.packages.len());
        self.package_index.insert(package.name.clone(), id);
        self.packages.push(package);
        Ok(id)
    }

    fn require(&self, consumer: &str, name: &str) -> Result<ModuleId> {
        self.lookup(name).ok_or_else(|| Error::UndefinedModule {
            consumer: consumer.to_string(),
            dependency: name.to_string(),
        })
    }

    pub fn lookup(&self, name: &str) -> Option<ModuleId> {
        self.index.get(name).copied()
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (ModuleId(i), m))
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn lookup_package(&self, name: &str) -> Option<PackageId> {
        self.package_index.get(name).copied()
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.0]
    }

    /// Packages in declaration order
    pub fn packages(&self) -> impl Iterator<Item = (PackageId, &Package)> {
        self.packages
            .iter()
            .enumerate()
            .map(|(i, p)| (PackageId(i), p))
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    /// Call `visit` for each direct dependency of `id`
    pub fn visit_direct_deps(&self, id: ModuleId, mut visit: impl FnMut(&DepEdge, &Module)) {
        for edge in &self.module(id).deps {
            visit(edge, self.module(edge.target));
        }
    }

    /// Breadth-first walk from `roots`
    ///
    /// `visit(parent, edge)` is called for every edge leaving an expanded
    /// module; when it returns `true` the target is expanded (once).
    pub fn walk_deps(
        &self,
        roots: &[ModuleId],
        mut visit: impl FnMut(ModuleId, &DepEdge) -> bool,
    ) {
        let mut expanded: HashSet<ModuleId> = roots.iter().copied().collect();
        let mut queue: VecDeque<ModuleId> = roots.iter().copied().collect();

        while let Some(parent) = queue.pop_front() {
            for edge in &self.module(parent).deps {
                if visit(parent, edge) && expanded.insert(edge.target) {
                    queue.push_back(edge.target);
                }
            }
        }
    }

    /// Find cycles over link edges
    ///
    /// Returns each cycle as a list of module names.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles = Vec::new();
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for (id, _) in self.modules() {
            if !visited.contains(&id) {
                self.find_cycles_dfs(id, &mut visited, &mut rec_stack, &mut path, &mut cycles);
            }
        }

        cycles
    }

    fn find_cycles_dfs(
        &self,
        node: ModuleId,
        visited: &mut HashSet<ModuleId>,
        rec_stack: &mut HashSet<ModuleId>,
        path: &mut Vec<ModuleId>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        visited.insert(node);
        rec_stack.insert(node);
        path.push(node);

        for edge in self.module(node).deps.iter().filter(|e| e.kind.is_link()) {
            let dep = edge.target;
            if !visited.contains(&dep) {
                self.find_cycles_dfs(dep, visited, rec_stack, path, cycles);
            } else if rec_stack.contains(&dep) {
                if let Some(start) = path.iter().position(|x| *x == dep) {
                    cycles.push(
                        path[start..]
                            .iter()
                            .map(|id| self.module(*id).name.clone())
                            .collect(),
                    );
                }
            }
        }

        path.pop();
        rec_stack.remove(&node);
    }

    /// Fail if link edges form a cycle
    pub fn check_acyclic(&self) -> Result<()> {
        match self.find_cycles().into_iter().next() {
            Some(cycle) => {
                let mut names = cycle.clone();
                names.push(cycle[0].clone());
                Err(Error::DependencyCycle(names.join(" -> ")))
            }
            None => Ok(()),
        }
    }
}

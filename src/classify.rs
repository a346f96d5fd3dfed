// src/classify.rs

//! Content classification
//!
//! Turns each package's membership and resolved links into the concrete
//! file list that goes into the package, plus the `provides` and `requires`
//! native-library lists and the platform modules the package needs at
//! install time.

use crate::config::{Arch, BuildConfig};
use crate::error::Result;
use crate::graph::{ImageClass, ModuleGraph, ProviderMap, StubSelection, VariantKey};
use crate::membership::{Member, Membership, arches_for, image_for};
use crate::module::{DepKind, FileClass};
use crate::package::PackageId;
use crate::resolve::Resolution;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Classpath config installed by boot fragments
pub const CLASSPATH_CONFIG: &str = "etc/classpaths/bootclasspath.pb";

/// Boot image profile path
pub const BOOT_IMAGE_PROFILE: &str = "etc/boot-image.prof";

const BOOT_IMAGE_EXTENSIONS: [&str; 3] = ["art", "oat", "vdex"];

/// One boot image artifact of a fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootImageFile {
    pub arch: Arch,
    /// File name, e.g. `boot-bar.art`
    pub file: String,
    pub source: String,
}

/// Boot image artifacts of a fragment, published through the provider map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootImageFiles {
    pub files: Vec<BootImageFile>,
    pub install_in_package: bool,
}

/// A file copied into a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageFile {
    pub module: String,
    /// Build artifact path
    pub source: String,
    /// Path inside the package
    pub dest: String,
    pub class: FileClass,
}

/// Classified content of one package
#[derive(Debug, Clone, Serialize)]
pub struct PackageContents {
    pub package: PackageId,
    /// Sorted by destination
    pub files: Vec<PackageFile>,
    pub provides: BTreeSet<String>,
    pub requires: BTreeSet<String>,
    /// Platform modules that must be installed alongside the package
    pub required_modules: BTreeSet<String>,
}

/// Compute boot image artifacts for every fragment that is package content
pub fn compute_boot_images(
    graph: &ModuleGraph,
    membership: &Membership,
    config: &BuildConfig,
    providers: &mut ProviderMap,
) -> Result<()> {
    let image = &config.boot_image;
    for (id, module) in graph.modules() {
        let Some(fragment) = module.as_boot_fragment() else {
            continue;
        };
        if !membership.directly_in_any_package(id) {
            continue;
        }

        let mut files = Vec::new();
        if !image.name.is_empty() {
            let contents = fragment.image_contents();
            let in_image: Vec<(usize, &String)> = image
                .modules
                .iter()
                .enumerate()
                .filter(|(_, m)| contents.contains(m))
                .collect();
            for arch in &config.arches {
                for (position, java_module) in &in_image {
                    let stem = if *position == 0 {
                        "boot".to_string()
                    } else {
                        format!("boot-{}", java_module)
                    };
                    for ext in BOOT_IMAGE_EXTENSIONS {
                        let file = format!("{}.{}", stem, ext);
                        files.push(BootImageFile {
                            arch: *arch,
                            source: format!("out/{}/dexpreopt/{}/{}", module.name, arch, file),
                            file,
                        });
                    }
                }
            }
        }

        debug!("Boot fragment {}: {} image files", module.name, files.len());
        providers.set(
            graph,
            id,
            BootImageFiles {
                files,
                install_in_package: image.install_in_package,
            },
        )?;
    }
    Ok(())
}

struct FileList {
    files: BTreeMap<String, (PackageFile, bool)>,
}

impl FileList {
    fn new() -> Self {
        Self {
            files: BTreeMap::new(),
        }
    }

    /// Add a file; a direct member's file replaces an indirect one at the
    /// same destination
    fn add(&mut self, file: PackageFile, direct: bool) {
        match self.files.get(&file.dest) {
            Some((_, existing_direct)) if *existing_direct || !direct => {}
            _ => {
                self.files.insert(file.dest.clone(), (file, direct));
            }
        }
    }

    fn into_sorted(self) -> Vec<PackageFile> {
        self.files.into_values().map(|(f, _)| f).collect()
    }
}

fn add_member_files(
    graph: &ModuleGraph,
    config: &BuildConfig,
    package: &str,
    image: ImageClass,
    member: &Member,
    files: &mut FileList,
) {
    let module = graph.module(member.module);
    let Some(installable) = module.as_installable() else {
        return;
    };

    let arches = if installable.per_arch() {
        arches_for(graph, config, member.module)
    } else if module.is_native() {
        vec![Some(config.primary_arch())]
    } else {
        vec![None]
    };

    for arch in arches {
        let key = VariantKey::in_package(arch, image, package);
        let file_name = installable.file_name(&module.name);
        let dir = installable.install_dir(&module.name, arch.unwrap_or(config.primary_arch()));
        let source = match installable.source_override() {
            Some(src) => src.to_string(),
            None => format!("out/{}/{}/{}", module.name, key, file_name),
        };
        files.add(
            PackageFile {
                module: module.name.clone(),
                source,
                dest: format!("{}/{}", dir, file_name),
                class: installable.file_class(),
            },
            member.direct,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn add_fragment_files(
    graph: &ModuleGraph,
    providers: &ProviderMap,
    config: &BuildConfig,
    package: &str,
    image: ImageClass,
    member: &Member,
    files: &mut FileList,
    required_modules: &mut BTreeSet<String>,
) {
    let module = graph.module(member.module);
    let Some(fragment) = module.as_boot_fragment() else {
        return;
    };
    let key = VariantKey::in_package(None, image, package);

    if fragment.generates_classpath_config() {
        files.add(
            PackageFile {
                module: module.name.clone(),
                source: format!("out/{}/{}/bootclasspath.pb", module.name, key),
                dest: CLASSPATH_CONFIG.to_string(),
                class: FileClass::Etc,
            },
            true,
        );
    }

    let Some(boot_image) = providers.get::<BootImageFiles>(member.module) else {
        return;
    };
    if boot_image.files.is_empty() {
        return;
    }
    if config.boot_image.generate_profile {
        files.add(
            PackageFile {
                module: module.name.clone(),
                source: format!("out/{}/{}/boot-image.prof", module.name, key),
                dest: BOOT_IMAGE_PROFILE.to_string(),
                class: FileClass::Etc,
            },
            true,
        );
    }
    for artifact in &boot_image.files {
        if boot_image.install_in_package {
            files.add(
                PackageFile {
                    module: module.name.clone(),
                    source: artifact.source.clone(),
                    dest: format!("javalib/{}/{}", artifact.arch, artifact.file),
                    class: FileClass::BootImage,
                },
                true,
            );
        } else {
            required_modules.insert(format!(
                "{}-dexpreopt-{}-{}",
                module.name, artifact.arch, artifact.file
            ));
        }
    }
}

/// Classify one package
fn classify_package(
    graph: &ModuleGraph,
    membership: &Membership,
    resolution: &Resolution,
    providers: &ProviderMap,
    config: &BuildConfig,
    id: PackageId,
) -> PackageContents {
    let package = graph.package(id);
    let image = image_for(package);
    let members = membership.package(id);

    let mut files = FileList::new();
    let mut provides = BTreeSet::new();
    let mut requires = BTreeSet::new();
    let mut required_modules = BTreeSet::new();

    // Direct content first so its files win destination conflicts
    let ordered = package
        .content
        .iter()
        .filter_map(|c| members.member(c.module))
        .chain(members.members.values().filter(|m| !m.direct));

    for member in ordered {
        let module = graph.module(member.module);
        if member.is_bundled() {
            add_member_files(graph, config, &package.name, image, member, &mut files);
            if member.direct {
                add_fragment_files(
                    graph,
                    providers,
                    config,
                    &package.name,
                    image,
                    member,
                    &mut files,
                    &mut required_modules,
                );
            }
            if let Some(lib) = module.library_file_name() {
                let direct_stubs = member.direct && module.has_stubs();
                if direct_stubs || package.flags.provides_shared_libs {
                    provides.insert(lib);
                }
            }
        } else if member.runtime {
            if let Some(lib) = module.library_file_name() {
                requires.insert(lib);
                if !membership.directly_in_any_package(member.module) {
                    required_modules.insert(module.name.clone());
                }
            }
        }
    }

    // Shared links leaving the package through a stub or a provider
    for member in members.expanded() {
        for arch in arches_for(graph, config, member.module) {
            let key = VariantKey::in_package(arch, image, &package.name);
            let Some(variant) = membership.variants.get(member.module, &key) else {
                continue;
            };
            for link in resolution.links_from(variant) {
                if link.kind != DepKind::Shared {
                    continue;
                }
                let producer = membership.variants.variant(link.producer);
                let crosses = matches!(producer.key.stub, StubSelection::Version(_))
                    || producer.key.package.as_deref() != Some(package.name.as_str());
                if !crosses {
                    continue;
                }
                let dep = graph.module(producer.module);
                if let Some(lib) = dep.library_file_name() {
                    requires.insert(lib);
                }
                if dep.has_stubs() && !membership.directly_in_any_package(producer.module) {
                    required_modules.insert(dep.name.clone());
                }
            }
        }
    }

    let files = files.into_sorted();
    debug!(
        "Package {}: {} files, {} provides, {} requires",
        package.name,
        files.len(),
        provides.len(),
        requires.len()
    );

    PackageContents {
        package: id,
        files,
        provides,
        requires,
        required_modules,
    }
}

/// Run the classification pass
pub fn classify(
    graph: &ModuleGraph,
    membership: &Membership,
    resolution: &Resolution,
    providers: &ProviderMap,
    config: &BuildConfig,
) -> Result<Vec<PackageContents>> {
    let contents: Vec<PackageContents> = graph
        .packages()
        .map(|(id, _)| classify_package(graph, membership, resolution, providers, config, id))
        .collect();
    info!(
        "Classified {} packages, {} files",
        contents.len(),
        contents.iter().map(|c| c.files.len()).sum::<usize>()
    );
    Ok(contents)
}

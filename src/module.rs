// src/module.rs

//! Module records and their capabilities
//!
//! A module is one declared compilation unit. Its kind is a closed sum type;
//! passes that need a specific behavior ask for it through a capability
//! accessor ([`Module::as_stubs`], [`Module::as_installable`],
//! [`Module::as_boot_fragment`]) instead of matching on every kind.

use crate::availability::Availability;
use crate::config::Arch;
use crate::stubs::StubVersion;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Index of a module in the graph arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub usize);

/// Relationship kind of a dependency edge
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DepKind {
    /// Direct link against a shared library or bundled content
    Shared,
    /// Code merged into the consumer
    Static,
    /// Needed at runtime only, never bundled
    Runtime,
    /// Compile-time only, no runtime artifact
    Header,
}

impl DepKind {
    /// Edges whose producer must resolve to a concrete variant
    pub fn is_link(&self) -> bool {
        matches!(self, Self::Shared | Self::Static)
    }
}

/// A dependency edge after names are resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepEdge {
    pub target: ModuleId,
    pub kind: DepKind,
    /// Explicit stub version pin (`name#version`)
    pub pin: Option<StubVersion>,
}

/// Class of a file placed in a package
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FileClass {
    NativeSharedLib,
    Executable,
    NativeTest,
    JavaSharedLib,
    App,
    Etc,
    BootImage,
}

/// Native shared library
#[derive(Debug, Clone, Default)]
pub struct NativeLibrary {
    pub stubs: Vec<StubVersion>,
    pub stem: Option<String>,
}

/// Native executable, also used for native tests
#[derive(Debug, Clone, Default)]
pub struct Binary {
    pub stem: Option<String>,
    pub static_executable: bool,
}

#[derive(Debug, Clone)]
pub struct JavaLibrary {
    pub compile_dex: bool,
    pub installable: bool,
}

#[derive(Debug, Clone)]
pub struct BootFragment {
    pub contents: Vec<String>,
    pub generate_classpaths_proto: bool,
}

#[derive(Debug, Clone)]
pub struct Prebuilt {
    pub src: String,
    pub sub_dir: Option<String>,
    pub filename: Option<String>,
    pub installable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct App {
    pub privileged: bool,
}

/// Module kind with kind-specific properties
#[derive(Debug, Clone)]
pub enum ModuleKind {
    NativeLibrary(NativeLibrary),
    Binary(Binary),
    NativeTest(Binary),
    JavaLibrary(JavaLibrary),
    BootFragment(BootFragment),
    Prebuilt(Prebuilt),
    App(App),
}

impl ModuleKind {
    /// Human-readable kind name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::NativeLibrary(_) => "native_library",
            Self::Binary(_) => "binary",
            Self::NativeTest(_) => "native_test",
            Self::JavaLibrary(_) => "java_library",
            Self::BootFragment(_) => "boot_fragment",
            Self::Prebuilt(_) => "prebuilt",
            Self::App(_) => "app",
        }
    }
}

/// Libraries that publish stable stub interfaces
pub trait HasStubs {
    /// Published versions, ascending
    fn stub_versions(&self) -> &[StubVersion];

    fn publishes(&self, version: StubVersion) -> bool {
        self.stub_versions().contains(&version)
    }
}

/// Modules that produce a file inside a package
pub trait Installable {
    fn file_class(&self) -> FileClass;

    /// Directory relative to the package root
    fn install_dir(&self, module: &str, arch: Arch) -> String;

    /// File name inside `install_dir`
    fn file_name(&self, module: &str) -> String;

    /// Source path when the file is not a build output
    fn source_override(&self) -> Option<&str> {
        None
    }

    /// Whether one copy is installed per architecture
    fn per_arch(&self) -> bool {
        false
    }
}

/// Modules contributing to the boot image
pub trait ProvidesBootImage {
    /// Java modules in the fragment
    fn image_contents(&self) -> &[String];

    fn generates_classpath_config(&self) -> bool;
}

impl HasStubs for NativeLibrary {
    fn stub_versions(&self) -> &[StubVersion] {
        &self.stubs
    }
}

impl Installable for NativeLibrary {
    fn file_class(&self) -> FileClass {
        FileClass::NativeSharedLib
    }

    fn install_dir(&self, _module: &str, arch: Arch) -> String {
        arch.lib_dir().to_string()
    }

    fn file_name(&self, module: &str) -> String {
        format!("{}.so", self.stem.as_deref().unwrap_or(module))
    }

    fn per_arch(&self) -> bool {
        true
    }
}

/// Binaries and tests differ only by class
struct Executable<'a> {
    binary: &'a Binary,
    class: FileClass,
}

impl Installable for Executable<'_> {
    fn file_class(&self) -> FileClass {
        self.class
    }

    fn install_dir(&self, _module: &str, _arch: Arch) -> String {
        "bin".to_string()
    }

    fn file_name(&self, module: &str) -> String {
        self.binary.stem.as_deref().unwrap_or(module).to_string()
    }
}

impl Installable for JavaLibrary {
    fn file_class(&self) -> FileClass {
        FileClass::JavaSharedLib
    }

    fn install_dir(&self, _module: &str, _arch: Arch) -> String {
        "javalib".to_string()
    }

    fn file_name(&self, module: &str) -> String {
        format!("{}.jar", module)
    }
}

impl Installable for Prebuilt {
    fn file_class(&self) -> FileClass {
        FileClass::Etc
    }

    fn install_dir(&self, _module: &str, _arch: Arch) -> String {
        match &self.sub_dir {
            Some(sub) => format!("etc/{}", sub),
            None => "etc".to_string(),
        }
    }

    fn file_name(&self, module: &str) -> String {
        self.filename.as_deref().unwrap_or(module).to_string()
    }

    fn source_override(&self) -> Option<&str> {
        Some(&self.src)
    }
}

impl Installable for App {
    fn file_class(&self) -> FileClass {
        FileClass::App
    }

    fn install_dir(&self, module: &str, _arch: Arch) -> String {
        let root = if self.privileged { "priv-app" } else { "app" };
        format!("{}/{}", root, module)
    }

    fn file_name(&self, module: &str) -> String {
        format!("{}.apk", module)
    }
}

impl ProvidesBootImage for BootFragment {
    fn image_contents(&self) -> &[String] {
        &self.contents
    }

    fn generates_classpath_config(&self) -> bool {
        self.generate_classpaths_proto
    }
}

/// A declared module
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub kind: ModuleKind,
    pub deps: Vec<DepEdge>,
    /// Allow-list for the shared (or only) variant
    pub availability: Availability,
    /// Allow-list for the static variant when it differs
    pub static_availability: Option<Availability>,
    pub vendor_available: bool,
    pub enabled: bool,
    /// Oldest API level the module supports; unset means any
    pub min_sdk_version: Option<StubVersion>,
}

impl Module {
    pub fn new(name: impl Into<String>, kind: ModuleKind) -> Self {
        Self {
            name: name.into(),
            kind,
            deps: Vec::new(),
            availability: Availability::default(),
            static_availability: None,
            vendor_available: false,
            enabled: true,
            min_sdk_version: None,
        }
    }

    /// Stub capability, present only when versions are published
    pub fn as_stubs(&self) -> Option<&dyn HasStubs> {
        match &self.kind {
            ModuleKind::NativeLibrary(lib) if !lib.stubs.is_empty() => Some(lib),
            _ => None,
        }
    }

    pub fn has_stubs(&self) -> bool {
        self.as_stubs().is_some()
    }

    /// Install capability for kinds that place a file in a package
    pub fn as_installable(&self) -> Option<Box<dyn Installable + '_>> {
        match &self.kind {
            ModuleKind::NativeLibrary(lib) => Some(Box::new(lib.clone())),
            ModuleKind::Binary(binary) => Some(Box::new(Executable {
                binary,
                class: FileClass::Executable,
            })),
            ModuleKind::NativeTest(binary) => Some(Box::new(Executable {
                binary,
                class: FileClass::NativeTest,
            })),
            ModuleKind::JavaLibrary(lib) if lib.installable => Some(Box::new(lib.clone())),
            ModuleKind::Prebuilt(prebuilt) if prebuilt.installable => {
                Some(Box::new(prebuilt.clone()))
            }
            ModuleKind::App(app) => Some(Box::new(app.clone())),
            _ => None,
        }
    }

    pub fn as_boot_fragment(&self) -> Option<&dyn ProvidesBootImage> {
        match &self.kind {
            ModuleKind::BootFragment(fragment) => Some(fragment),
            _ => None,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(
            self.kind,
            ModuleKind::NativeLibrary(_) | ModuleKind::Binary(_) | ModuleKind::NativeTest(_)
        )
    }

    pub fn is_native_library(&self) -> bool {
        matches!(self.kind, ModuleKind::NativeLibrary(_))
    }

    /// Allow-list governing a variant reached through `kind`
    pub fn availability_for(&self, kind: DepKind) -> &Availability {
        match (kind, &self.static_availability) {
            (DepKind::Static, Some(avail)) => avail,
            _ => &self.availability,
        }
    }

    /// File name the library is known by at runtime
    pub fn library_file_name(&self) -> Option<String> {
        match &self.kind {
            ModuleKind::NativeLibrary(lib) => Some(lib.file_name(&self.name)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(stubs: Vec<StubVersion>) -> Module {
        Module::new(
            "libfoo",
            ModuleKind::NativeLibrary(NativeLibrary { stubs, stem: None }),
        )
    }

    #[test]
    fn test_stub_capability() {
        assert!(!library(vec![]).has_stubs());

        let lib = library(vec![StubVersion::Numbered(1), StubVersion::Numbered(2)]);
        let stubs = lib.as_stubs().unwrap();
        assert!(stubs.publishes(StubVersion::Numbered(2)));
        assert!(!stubs.publishes(StubVersion::Numbered(3)));
    }

    #[test]
    fn test_native_library_install() {
        let lib = library(vec![]);
        let inst = lib.as_installable().unwrap();
        assert_eq!(inst.file_class(), FileClass::NativeSharedLib);
        assert_eq!(inst.install_dir("libfoo", Arch::Arm64), "lib64");
        assert_eq!(inst.install_dir("libfoo", Arch::Arm), "lib");
        assert_eq!(inst.file_name("libfoo"), "libfoo.so");
        assert!(inst.per_arch());
        assert_eq!(lib.library_file_name().as_deref(), Some("libfoo.so"));
    }

    #[test]
    fn test_stem_override() {
        let lib = Module::new(
            "libfoo",
            ModuleKind::NativeLibrary(NativeLibrary {
                stubs: vec![],
                stem: Some("libbar".to_string()),
            }),
        );
        assert_eq!(lib.library_file_name().as_deref(), Some("libbar.so"));
    }

    #[test]
    fn test_prebuilt_and_app_paths() {
        let prebuilt = Module::new(
            "myetc",
            ModuleKind::Prebuilt(Prebuilt {
                src: "myprebuilt".to_string(),
                sub_dir: Some("foo/bar".to_string()),
                filename: None,
                installable: true,
            }),
        );
        let inst = prebuilt.as_installable().unwrap();
        assert_eq!(inst.install_dir("myetc", Arch::Arm64), "etc/foo/bar");
        assert_eq!(inst.source_override(), Some("myprebuilt"));

        let app = Module::new("AppFoo", ModuleKind::App(App { privileged: true }));
        let inst = app.as_installable().unwrap();
        assert_eq!(inst.install_dir("AppFoo", Arch::Arm64), "priv-app/AppFoo");
        assert_eq!(inst.file_name("AppFoo"), "AppFoo.apk");
    }

    #[test]
    fn test_fragment_not_installable() {
        let fragment = Module::new(
            "art-bootclasspath-fragment",
            ModuleKind::BootFragment(BootFragment {
                contents: vec!["foo".to_string()],
                generate_classpaths_proto: true,
            }),
        );
        assert!(fragment.as_installable().is_none());
        assert_eq!(fragment.as_boot_fragment().unwrap().image_contents(), ["foo"]);
    }

    #[test]
    fn test_static_availability() {
        let mut lib = library(vec![]);
        lib.availability = Availability::new(vec!["myapex".to_string()]);
        lib.static_availability = Some(Availability::new(vec![
            crate::availability::PLATFORM.to_string(),
        ]));
        assert!(!lib.availability_for(DepKind::Shared).available_to_platform());
        assert!(lib.availability_for(DepKind::Static).available_to_platform());
    }
}

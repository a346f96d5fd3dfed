// src/lib.rs

//! Module-package build engine
//!
//! Groups independently built modules (native libraries, binaries, Java
//! libraries, boot fragments, prebuilts, apps) into installable packages.
//!
//! # Architecture
//!
//! - Variant graph: modules in an arena, one variant per axis combination
//!   (arch, image class, owning package, stub version)
//! - Membership: each package walks its closure and gets private copies of
//!   the modules it bundles
//! - Resolution: every link picks exactly one producer variant, either the
//!   implementation or a published stub
//! - Classification and validation: file lists, provided and required
//!   libraries, cross-package constraints
//! - Assembly: manifests, signing keys, certificates and packaging-tool
//!   invocations

pub mod availability;
pub mod classify;
pub mod config;
pub mod decl;
mod error;
pub mod graph;
pub mod keys;
pub mod manifest;
pub mod membership;
pub mod module;
pub mod order;
pub mod package;
pub mod packaging;
pub mod pipeline;
pub mod resolve;
pub mod stubs;
pub mod validate;

pub use config::{Arch, BuildConfig};
pub use decl::Declarations;
pub use error::{Error, Result};
pub use graph::{ModuleGraph, VariantKey};
pub use pipeline::{BuildRecipe, Pipeline};

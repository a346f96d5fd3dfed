// src/error.rs

//! Error types for the packaging engine
//!
//! Every pass returns `Result<T>`; the first error aborts the whole build and
//! no partial recipe is produced.

use thiserror::Error;

/// Result type used throughout modpack
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building the graph, resolving variants, validating
/// packages and assembling their manifests
#[derive(Error, Debug)]
pub enum Error {
    /// I/O failure while reading declarations or configuration
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Declarations or configuration could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Malformed declaration property
    #[error("module \"{module}\": {property}: {message}")]
    InvalidProperty {
        module: String,
        property: String,
        message: String,
    },

    /// Two declarations share a name
    #[error("module \"{0}\" is already defined")]
    DuplicateModule(String),

    /// A dependency names a module that was never declared
    #[error("\"{consumer}\" depends on undefined module \"{dependency}\"")]
    UndefinedModule { consumer: String, dependency: String },

    /// Link edges form a cycle
    #[error("dependency cycle detected: {0}")]
    DependencyCycle(String),

    /// A version pin names a stub version the producer does not publish
    #[error(
        "\"{consumer}\" depends on \"{producer}#{version}\", but \"{producer}\" publishes no such stub version (available: {available})"
    )]
    UnresolvableStub {
        consumer: String,
        producer: String,
        version: String,
        available: String,
    },

    /// No variant of the producer exists for the consumer's axes
    #[error("dependency \"{producer}\" of \"{consumer}\" missing variant:\n {variant}")]
    MissingVariant {
        consumer: String,
        producer: String,
        variant: String,
    },

    /// Direct or transitive content is disabled
    #[error("module \"{package}\" variant \"{variant}\": depends on disabled module \"{module}\"")]
    DisabledDependency {
        package: String,
        variant: String,
        module: String,
    },

    /// Allow-list entry is neither a marker nor a declared package
    #[error("module \"{module}\": apex_available: \"{name}\" is not a valid module name")]
    InvalidAvailabilityName { module: String, name: String },

    /// A module reachable into a package does not allow that package
    #[error(
        "\"{from}\" requires \"{to}\" that doesn't list the package \"{package}\" under 'apex_available'. Dependency path: {path}"
    )]
    NotAvailable {
        package: String,
        from: String,
        to: String,
        path: String,
    },

    /// Vendor linkage requested by a package outside the allow-list
    #[error("package \"{0}\": use_vendor: not allowed")]
    VendorNotAllowed(String),

    /// `uses` names a package that does not provide shared libraries
    #[error("package \"{user}\" uses \"{provider}\" which does not provide shared libs")]
    UsesNonProvider { user: String, provider: String },

    /// `uses` crosses a vendor-linkage mode boundary
    #[error("package \"{user}\" and \"{provider}\" have mismatched use_vendor settings")]
    UsesModeMismatch { user: String, provider: String },

    /// Two packages claim the same platform version
    #[error("package \"{package}\": vndk_version: {version} is already defined in \"{existing}\"")]
    DuplicateVersion {
        package: String,
        version: String,
        existing: String,
    },

    /// Bundled content needs a newer platform than the package supports
    #[error(
        "module \"{module}\": should support min_sdk_version({required}) for \"{package}\": its min_sdk_version is {version}"
    )]
    MinSdkVersion {
        module: String,
        version: String,
        required: String,
        package: String,
    },

    /// Generic constraint violation with a package-identifying message
    #[error("package \"{package}\": {message}")]
    Constraint { package: String, message: String },

    /// Public and private key basenames differ
    #[error(
        "package key \"{key}\": public_key \"{public}\" and private_key \"{private}\" must have the same basename"
    )]
    KeyNameMismatch {
        key: String,
        public: String,
        private: String,
    },

    /// A key or certificate could not be located
    #[error("{what} for \"{name}\" could not be found")]
    MissingKey { what: String, name: String },

    /// A provider value was published twice for the same module
    #[error("provider {provider} already set for module \"{module}\"")]
    ProviderConflict { module: String, provider: String },

    /// Serialization of an output document failed
    #[error("Serialization error: {0}")]
    SerializeError(String),
}

impl Error {
    /// Build a constraint error for `package`
    pub fn constraint(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Constraint {
            package: package.into(),
            message: message.into(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::ParseError(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::SerializeError(e.to_string())
    }
}

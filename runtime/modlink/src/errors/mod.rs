//! Loader errors.
//!
//! Every failure is fatal to the load in progress and is returned to the
//! caller synchronously. Factory functions are the preferred way to build
//! errors; they are marked `#[cold]` since errors are off the hot path.

use std::fmt;

/// Result of a loader operation.
pub type LoadResult<T> = Result<T, LoadError>;

/// Broad classification of a [`LoadError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A registration or declaration is malformed.
    Configuration,
    /// The dependency graph cannot be linearized.
    Graph,
    /// A requested module could not be resolved.
    Resolution,
    /// A module body reported failure.
    Execution,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Graph => "graph",
            ErrorCategory::Resolution => "resolution",
            ErrorCategory::Execution => "execution",
        };
        f.write_str(name)
    }
}

/// Error raised by registration, linking, evaluation or loading.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// Registration without a usable module name.
    #[error("module registration requires a non-empty name")]
    InvalidName,

    /// A declarative setup that takes no exporter was given dependencies.
    #[error(
        "declarative module `{module}` declares {dependencies} dependencies \
         but its setup does not accept an exporter"
    )]
    SetupArity { module: String, dependencies: usize },

    /// The setup of a declarative module did not provide setters and a body.
    #[error("invalid declarative form for `{module}`: setup must provide setters and an execute body")]
    InvalidDeclaration { module: String },

    /// A dependency cycle crosses the declarative/dynamic boundary an odd
    /// number of times.
    #[error("mixed dependency cycle detected at `{module}`")]
    MixedCycle { module: String },

    /// The module is neither resolved nor declared.
    #[error("module `{module}` not present")]
    ModuleNotFound { module: String },

    /// Attempt to seed a module that is already resolved.
    #[error("module `{module}` is already resolved")]
    AlreadyResolved { module: String },

    /// A module body reported failure.
    #[error("module `{module}` failed: {message}")]
    Raised { module: String, message: String },
}

impl LoadError {
    #[cold]
    pub fn setup_arity(module: &str, dependencies: usize) -> Self {
        LoadError::SetupArity {
            module: module.to_owned(),
            dependencies,
        }
    }

    #[cold]
    pub fn invalid_declaration(module: &str) -> Self {
        LoadError::InvalidDeclaration {
            module: module.to_owned(),
        }
    }

    #[cold]
    pub fn mixed_cycle(module: &str) -> Self {
        LoadError::MixedCycle {
            module: module.to_owned(),
        }
    }

    #[cold]
    pub fn not_found(module: &str) -> Self {
        LoadError::ModuleNotFound {
            module: module.to_owned(),
        }
    }

    #[cold]
    pub fn already_resolved(module: &str) -> Self {
        LoadError::AlreadyResolved {
            module: module.to_owned(),
        }
    }

    /// Failure reported by the body of `module`.
    ///
    /// Module bodies return this to abort the load that runs them.
    #[cold]
    pub fn raised(module: &str, message: impl Into<String>) -> Self {
        LoadError::Raised {
            module: module.to_owned(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            LoadError::InvalidName
            | LoadError::SetupArity { .. }
            | LoadError::InvalidDeclaration { .. } => ErrorCategory::Configuration,
            LoadError::MixedCycle { .. } => ErrorCategory::Graph,
            LoadError::ModuleNotFound { .. } | LoadError::AlreadyResolved { .. } => {
                ErrorCategory::Resolution
            }
            LoadError::Raised { .. } => ErrorCategory::Execution,
        }
    }

    /// Name of the module the error is about, if any.
    pub fn module(&self) -> Option<&str> {
        match self {
            LoadError::InvalidName => None,
            LoadError::SetupArity { module, .. }
            | LoadError::InvalidDeclaration { module }
            | LoadError::MixedCycle { module }
            | LoadError::ModuleNotFound { module }
            | LoadError::AlreadyResolved { module }
            | LoadError::Raised { module, .. } => Some(module),
        }
    }
}

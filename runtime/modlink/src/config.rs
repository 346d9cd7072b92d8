//! Loader configuration.

/// Name pre-seeded with an empty namespace by default.
pub const EMPTY_MODULE: &str = "@empty";

/// Configuration for a [`Loader`](crate::Loader).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LoaderConfig {
    /// Module resolved to an empty namespace at construction.
    ///
    /// Bundles map stubbed-out dependencies to this name.
    pub empty_module: Option<String>,
    /// Expose a dynamic module's exports as-is when they are a namespace
    /// flagged `ES_MODULE`, instead of wrapping them in a default envelope.
    pub honor_es_module_flag: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            empty_module: Some(EMPTY_MODULE.to_owned()),
            honor_es_module_flag: true,
        }
    }
}

impl LoaderConfig {
    /// No pre-seeded modules; dynamic exports are always wrapped.
    pub fn bare() -> Self {
        LoaderConfig {
            empty_module: None,
            honor_es_module_flag: false,
        }
    }

    /// Default config with a different (or no) empty-module name.
    pub fn with_empty_module(name: Option<&str>) -> Self {
        LoaderConfig {
            empty_module: name.map(str::to_owned),
            ..Default::default()
        }
    }
}

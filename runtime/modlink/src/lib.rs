//! Modlink - a self-contained dynamic module system.
//!
//! Modules are registered under a name with their dependency names and a
//! body in one of two styles, then loaded by name:
//!
//! - **Declarative** modules export live bindings. Importers receive the
//!   exporter's namespace through positional setters and are notified
//!   whenever a binding changes, so circular imports observe each other.
//! - **Dynamic** modules run a body that looks its dependencies up at run
//!   time and produces a single exports value.
//!
//! # Architecture
//!
//! ```text
//! Loader::load(name)
//!   ├── grouping   partition dependencies by style distance,
//!   │              reject mixed cycles
//!   ├── linker     link groups farthest-first (declarative / dynamic)
//!   ├── evaluator  run declarative bodies depth-first, once each
//!   └── cache      memoize the exposed value
//! ```
//!
//! Everything is synchronous and single-threaded; cycles are handled by
//! "already started" guards and an explicit `seen` set, not by locking.
//!
//! # Example
//!
//! ```
//! use modlink::{Declaration, Definition, Loader, Value};
//!
//! let loader = Loader::new();
//! loader
//!     .register(
//!         "a",
//!         &[],
//!         Definition::declarative(|export| {
//!             Declaration::new().no_setters().execute(move || {
//!                 export.export("x", Value::int(1));
//!                 Ok(())
//!             })
//!         }),
//!     )
//!     .ok();
//!
//! let a = loader.load("a").ok();
//! assert_eq!(a.and_then(|ns| ns.member("x")), Some(Value::int(1)));
//! ```

mod config;
mod errors;
mod evaluator;
mod exporter;
mod grouping;
mod linker;
mod loader;
mod records;
mod registry;
mod require;
mod stack;

use std::sync::Once;

pub use config::{LoaderConfig, EMPTY_MODULE};
pub use errors::{ErrorCategory, LoadError, LoadResult};
pub use exporter::Exporter;
pub use loader::Loader;
pub use registry::{Declaration, Definition, DynamicBody, ExecuteFn, ModuleStyle, Setter, Setup};
pub use require::{ModuleHandle, Require};

// Re-export value types for convenience
pub use modlink_value::{Namespace, NamespaceFlags, NativeFn, Value, DEFAULT_EXPORT};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=modlink=debug` or `RUST_LOG=modlink=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

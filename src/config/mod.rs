//! Vivliostyle config discovery, loading and validation
//!
//! Provides types and loading for `vivliostyle.config.*` files.

pub mod deprecation;
pub mod loader;
pub mod locate;
pub mod module;
pub mod schema;

pub use deprecation::warn_deprecated_config;
pub use loader::{load_vivliostyle_config, locate_vivliostyle_config, ConfigLoader, LoadFailure, LoadOptions, LoadedSource};
pub use locate::{locate_config, ConfigSource, SourceKind};
pub use module::{MemoryModuleCache, ModuleCache, ModuleError, ModuleEvaluator, NodeModuleEvaluator};
pub use schema::{compiled_config_schema, vivliostyle_config_schema, BuildTask, InlineOptions, ParsedConfig};

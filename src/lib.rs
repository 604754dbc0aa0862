//! vivliostyle-config - Loading and validation of Vivliostyle config files
//!
//! This library provides functionality to:
//! - Locate `vivliostyle.config.{js,mjs,cjs,json}` and load it as JSONC text
//!   or as an evaluated module, re-reading modules on every load
//! - Validate the config against a composable schema into typed build tasks
//! - Explain validation failures with the most specific issue, highlighted in
//!   the config's source text

pub mod cli;
pub mod code_frame;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod issue;
pub mod jsonc;
pub mod logging;
pub mod schema;

pub use config::{load_vivliostyle_config, ConfigLoader, LoadOptions, ParsedConfig};
pub use error::{format_error, ConfigError};

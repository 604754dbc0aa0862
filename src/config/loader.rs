//! Configuration loading for `vivliostyle.config.*`
//!
//! Locates the config file, reads it as JSONC text or evaluates it as a
//! module, validates the result and explains validation failures against the
//! source text.

use super::deprecation::warn_deprecated_config;
use super::locate::{locate_config, resolve_path, ConfigSource, SourceKind};
use super::module::{cache_bust_query, MemoryModuleCache, ModuleCache, ModuleError, ModuleEvaluator, NodeModuleEvaluator};
use super::schema::{compiled_config_schema, InlineOptions, ParsedConfig, VivliostyleConfig};
use crate::diagnostic::DiagnosticRenderer;
use crate::error::ConfigError;
use crate::issue::{validate, ValidationIssue};
use crate::jsonc::{self, ParseError, SyntaxNode};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// A config source read into memory
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSource {
    /// The config value
    pub value: Value,
    /// Text diagnostics are rendered against. For modules this is the
    /// pretty-printed default export.
    pub raw_text: String,
    /// Syntax tree of the file; only present for text sources
    pub syntax: Option<SyntaxNode>,
}

/// Failure to read, parse or evaluate a config source
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadFailure {
    /// File I/O error
    #[error("Failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    /// JSONC syntax error
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Module evaluation error
    #[error(transparent)]
    Module(#[from] ModuleError),
    /// The evaluated module could not be printed for diagnostics
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl LoadFailure {
    /// Longest available explanation, e.g. a module's stack trace.
    pub fn detail(&self) -> String {
        match self {
            LoadFailure::Module(ModuleError { detail: Some(detail), .. }) => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// Where to find the config
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config path, relative to `cwd`
    pub config: Option<PathBuf>,
    /// In-memory config; skips discovery and parsing
    pub config_data: Option<Value>,
    /// Working directory; defaults to the process working directory
    pub cwd: Option<PathBuf>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: impl Into<PathBuf>) -> Self {
        self.config = Some(config.into());
        self
    }

    pub fn with_config_data(mut self, data: Value) -> Self {
        self.config_data = Some(data);
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

/// Loads and validates Vivliostyle configs.
pub struct ConfigLoader<E = NodeModuleEvaluator> {
    evaluator: E,
    cache: Arc<dyn ModuleCache>,
    renderer: DiagnosticRenderer,
}

impl Default for ConfigLoader<NodeModuleEvaluator> {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader<NodeModuleEvaluator> {
    /// Loader using `node` and the process-wide module cache.
    pub fn new() -> Self {
        Self::with_evaluator(NodeModuleEvaluator::new())
    }
}

impl<E: ModuleEvaluator> ConfigLoader<E> {
    /// Loader using a custom module evaluator.
    pub fn with_evaluator(evaluator: E) -> Self {
        let cache: Arc<dyn ModuleCache> = MemoryModuleCache::global();
        Self { evaluator, cache, renderer: DiagnosticRenderer::new() }
    }

    /// Use a specific module cache instead of the process-wide one.
    pub fn with_cache(mut self, cache: Arc<dyn ModuleCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Color validation diagnostics with ANSI escapes.
    pub fn with_color(mut self, color: bool) -> Self {
        self.renderer = self.renderer.with_color(color);
        self
    }

    /// Read a config source.
    ///
    /// Module sources are always evaluated fresh: the cache entry for the
    /// path is dropped first and the evaluation carries a new
    /// cache-busting query.
    pub async fn load_source(&self, source: &ConfigSource) -> Result<LoadedSource, LoadFailure> {
        match source.kind {
            SourceKind::Text => load_text_source(&source.path),
            SourceKind::Module => {
                if self.cache.invalidate(&source.path) {
                    tracing::debug!(path = %source.path.display(), "invalidated cached config module");
                }
                let query = cache_bust_query();
                let value = self.evaluator.evaluate(&source.path, &query).await?;
                self.cache.store(&source.path, value.clone());
                debug_assert!(self.cache.get(&source.path).is_some(), "module cache dropped a fresh entry");
                let raw_text = serde_json::to_string_pretty(&value)?;
                Ok(LoadedSource { value, raw_text, syntax: None })
            }
        }
    }

    /// Locate, load and validate a config.
    ///
    /// # Returns
    /// - `Ok(Some(config))` on success; deprecation warnings have been logged
    /// - `Ok(None)` if no config path was given and no default file exists
    /// - `Err(ConfigError)` if the config cannot be loaded or is invalid
    pub async fn load_vivliostyle_config(&self, options: &LoadOptions) -> Result<Option<ParsedConfig>, ConfigError> {
        let cwd = match &options.cwd {
            Some(cwd) => cwd.clone(),
            None => std::env::current_dir().map_err(|e| ConfigError::Load {
                summary: "Failed to determine the working directory".to_string(),
                detail: e.to_string(),
            })?,
        };

        if let Some(data) = &options.config_data {
            let inline_options = InlineOptions { cwd, config: None };
            let parsed = self.validate_config(data, inline_options).map_err(|issues| {
                let raw_text = serde_json::to_string_pretty(data).unwrap_or_default();
                ConfigError::Validation {
                    summary: "Validation of vivliostyle config failed. Please check the schema.".to_string(),
                    detail: self.renderer.render(&raw_text, &issues).to_string(),
                }
            })?;
            warn_deprecated_config(&parsed);
            return Ok(Some(parsed));
        }

        let Some(path) = locate_config(options.config.as_deref(), &cwd) else {
            tracing::debug!(cwd = %cwd.display(), "no config file found");
            return Ok(None);
        };
        let source = ConfigSource::resolve(path);
        tracing::debug!(path = %source.path.display(), kind = %source.kind, "loading config");

        let loaded = self.load_source(&source).await.map_err(|e| ConfigError::Load {
            summary: format!("An error occurred on loading a config file: {}", source.path.display()),
            detail: e.detail(),
        })?;

        let inline_options = InlineOptions { cwd, config: Some(source.path.clone()) };
        let parsed = self.validate_config(&loaded.value, inline_options).map_err(|issues| ConfigError::Validation {
            summary: format!("Validation of vivliostyle config failed. Please check the schema: {}", source.path.display()),
            detail: self.renderer.render(&loaded.raw_text, &issues).to_string(),
        })?;

        warn_deprecated_config(&parsed);
        Ok(Some(parsed))
    }

    fn validate_config(&self, value: &Value, inline_options: InlineOptions) -> Result<ParsedConfig, Vec<ValidationIssue>> {
        let schema = compiled_config_schema().map_err(|e| vec![ValidationIssue::new(e.to_string())])?;
        let config: VivliostyleConfig = validate(value, schema)?;
        Ok(ParsedConfig { tasks: config.into_tasks(), inline_options })
    }
}

/// Read and parse a JSONC config file.
pub fn load_text_source(path: &Path) -> Result<LoadedSource, LoadFailure> {
    let raw_text =
        fs::read_to_string(path).map_err(|source| LoadFailure::Io { path: path.to_path_buf(), source })?;
    let syntax = jsonc::parse(&raw_text)?;
    let value = jsonc::evaluate(&syntax);
    Ok(LoadedSource { value, raw_text, syntax: Some(syntax) })
}

/// Locate, load and validate a config with the default loader.
///
/// # Example
/// ```no_run
/// use vivliostyle_config::config::{load_vivliostyle_config, LoadOptions};
///
/// # async fn run() -> Result<(), vivliostyle_config::error::ConfigError> {
/// if let Some(config) = load_vivliostyle_config(&LoadOptions::new().with_cwd("/work/book")).await? {
///     println!("{} task(s)", config.tasks.len());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn load_vivliostyle_config(options: &LoadOptions) -> Result<Option<ParsedConfig>, ConfigError> {
    ConfigLoader::new().load_vivliostyle_config(options).await
}

/// Resolve the absolute path `options` would load from, without loading it.
pub fn locate_vivliostyle_config(options: &LoadOptions) -> Option<PathBuf> {
    let cwd = match &options.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir().ok()?,
    };
    match &options.config {
        Some(config) => Some(resolve_path(&cwd, config)),
        None => locate_config(None, &cwd),
    }
}

//! Executable config modules
//!
//! A module config (`.js`, `.mjs`, `.cjs`) is evaluated and its default export
//! becomes the config value. Every load must observe the file as it is on disk
//! right now, so the evaluation cache entry for the path is dropped before
//! each load and the import URL carries a cache-busting query.

use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::process::Command;

/// Environment variable overriding the node binary.
pub const NODE_ENV_VAR: &str = "VIVLIOSTYLE_NODE";

/// Error evaluating a config module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ModuleError {
    pub message: String,
    /// Stack trace or stderr output, if available
    pub detail: Option<String>,
}

impl ModuleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), detail: None }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Evaluates a module file and returns its default export.
pub trait ModuleEvaluator: Send + Sync {
    /// Evaluate `path`. `query` (e.g. `version=1700000000000`) must be attached
    /// to the module URL so URL-keyed import caches see a new module.
    fn evaluate(&self, path: &Path, query: &str) -> impl Future<Output = Result<Value, ModuleError>> + Send;
}

/// Cache of evaluated modules keyed by resolved path.
pub trait ModuleCache: Send + Sync {
    /// Drop the entry for `path`. Returns whether one existed.
    fn invalidate(&self, path: &Path) -> bool;
    /// Record a fresh evaluation.
    fn store(&self, path: &Path, value: Value);
    /// Look up a cached evaluation. The loader only reads it back to check
    /// that `store` took effect; it is mainly for inspecting the cache.
    fn get(&self, path: &Path) -> Option<Value>;
}

/// In-memory module cache.
#[derive(Debug, Default)]
pub struct MemoryModuleCache {
    entries: Mutex<HashMap<PathBuf, Value>>,
}

static GLOBAL_CACHE: OnceLock<Arc<MemoryModuleCache>> = OnceLock::new();

impl MemoryModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache shared by default loaders.
    pub fn global() -> Arc<MemoryModuleCache> {
        GLOBAL_CACHE.get_or_init(|| Arc::new(MemoryModuleCache::new())).clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Value>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ModuleCache for MemoryModuleCache {
    fn invalidate(&self, path: &Path) -> bool {
        self.lock().remove(path).is_some()
    }

    fn store(&self, path: &Path, value: Value) {
        self.lock().insert(path.to_path_buf(), value);
    }

    fn get(&self, path: &Path) -> Option<Value> {
        self.lock().get(path).cloned()
    }
}

static LAST_VERSION: AtomicU64 = AtomicU64::new(0);

/// Build a cache-busting query from the current time in milliseconds.
///
/// Strictly increasing within the process, even for loads in the same
/// millisecond.
pub fn cache_bust_query() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    let previous = LAST_VERSION
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
        .unwrap_or(now);
    format!("version={}", now.max(previous + 1))
}

/// Script run by node: import the module with the query attached and print
/// its default export as JSON.
const NODE_BOOTSTRAP: &str = r#"
import { pathToFileURL } from 'node:url';
const url = pathToFileURL(process.argv[1]);
url.search = process.argv[2];
const mod = await import(url.href);
process.stdout.write(JSON.stringify(mod.default ?? null));
"#;

/// Evaluates modules with a `node` subprocess.
#[derive(Debug, Clone)]
pub struct NodeModuleEvaluator {
    program: PathBuf,
}

impl Default for NodeModuleEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeModuleEvaluator {
    /// Use `$VIVLIOSTYLE_NODE`, or `node` from `PATH`.
    pub fn new() -> Self {
        let program = std::env::var_os(NODE_ENV_VAR).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("node"));
        Self { program }
    }

    /// Use a specific node binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl ModuleEvaluator for NodeModuleEvaluator {
    async fn evaluate(&self, path: &Path, query: &str) -> Result<Value, ModuleError> {
        let output = Command::new(&self.program)
            .arg("--input-type=module")
            .arg("--eval")
            .arg(NODE_BOOTSTRAP)
            .arg(path)
            .arg(query)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ModuleError::new(format!("Failed to run {}: {}", self.program.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = stderr
                .lines()
                .find(|line| line.contains("Error"))
                .unwrap_or("Module evaluation failed")
                .trim()
                .to_string();
            return Err(ModuleError::new(message).with_detail(stderr));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| ModuleError::new(format!("Default export is not serializable: {}", e)))
    }
}

//! Config file discovery
//!
//! An explicitly requested path always wins. Otherwise the working directory
//! is searched for `vivliostyle.config` with each supported extension in
//! priority order.

use std::path::{Component, Path, PathBuf};

/// File stem searched for when no explicit config path is given.
pub const DEFAULT_CONFIG_STEM: &str = "vivliostyle.config";

/// Extensions tried, in priority order.
pub const CONFIG_EXTENSIONS: [&str; 4] = [".js", ".mjs", ".cjs", ".json"];

/// How a config source is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// JSON-with-comments text
    Text,
    /// Executable module; its default export is the config
    Module,
}

impl SourceKind {
    /// `.json` files are text; everything else is evaluated as a module.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => SourceKind::Text,
            _ => SourceKind::Module,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Text => write!(f, "text"),
            SourceKind::Module => write!(f, "module"),
        }
    }
}

/// A located config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub path: PathBuf,
    pub kind: SourceKind,
}

impl ConfigSource {
    /// Pair a path with the kind implied by its extension.
    pub fn resolve(path: PathBuf) -> Self {
        let kind = SourceKind::from_path(&path);
        Self { path, kind }
    }
}

/// Find the config file to use.
///
/// # Returns
/// - `Some(path)` for an explicit path (resolved against `cwd`, not checked
///   for existence) or for the first default file that exists
/// - `None` if no explicit path was given and no default file exists
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use vivliostyle_config::config::locate_config;
///
/// if let Some(path) = locate_config(None, Path::new("/work/book")) {
///     println!("Using config: {}", path.display());
/// }
/// ```
pub fn locate_config(explicit: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(resolve_path(cwd, path));
    }

    let cwd = absolute_base(cwd);
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| cwd.join(format!("{}{}", DEFAULT_CONFIG_STEM, ext)))
        .find(|path| path.exists())
}

/// Resolve a path against a base directory, normalizing `.` and `..`.
///
/// If the path is absolute, the base is ignored. A relative base is taken
/// relative to the process working directory.
pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() { path.to_path_buf() } else { absolute_base(base).join(path) };
    normalize_path(&joined)
}

fn absolute_base(base: &Path) -> PathBuf {
    if base.is_absolute() {
        return normalize_path(base);
    }
    match std::env::current_dir() {
        Ok(cwd) => normalize_path(&cwd.join(base)),
        Err(e) => {
            tracing::debug!(error = %e, base = %base.display(), "working directory unavailable, keeping relative base");
            base.to_path_buf()
        }
    }
}

/// Lexically remove `.` and `..` components.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            // `..` at the root stays at the root
            Component::ParentDir => {
                let at_root = out.parent().is_none() && out.has_root();
                if !at_root && !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_path_is_resolved_without_existence_check() {
        let cwd = Path::new("/work/book");
        assert_eq!(
            locate_config(Some(Path::new("conf/my.config.json")), cwd),
            Some(PathBuf::from("/work/book/conf/my.config.json"))
        );
        assert_eq!(
            locate_config(Some(Path::new("../shared/vivliostyle.config.js")), cwd),
            Some(PathBuf::from("/work/shared/vivliostyle.config.js"))
        );
        assert_eq!(
            locate_config(Some(Path::new("/abs/./cfg.json")), cwd),
            Some(PathBuf::from("/abs/cfg.json"))
        );
    }

    #[test]
    fn test_no_config_found() {
        let temp = TempDir::new().expect("should create temp dir");
        assert_eq!(locate_config(None, temp.path()), None);
    }

    #[test]
    fn test_js_wins_over_json() {
        let temp = TempDir::new().expect("should create temp dir");
        fs::write(temp.path().join("vivliostyle.config.json"), "{}").expect("should write json");
        fs::write(temp.path().join("vivliostyle.config.js"), "export default {}").expect("should write js");

        let found = locate_config(None, temp.path());
        assert_eq!(found, Some(temp.path().join("vivliostyle.config.js")));
    }

    #[test]
    fn test_priority_order() {
        let temp = TempDir::new().expect("should create temp dir");
        fs::write(temp.path().join("vivliostyle.config.json"), "{}").expect("should write json");
        assert_eq!(locate_config(None, temp.path()), Some(temp.path().join("vivliostyle.config.json")));

        fs::write(temp.path().join("vivliostyle.config.cjs"), "").expect("should write cjs");
        assert_eq!(locate_config(None, temp.path()), Some(temp.path().join("vivliostyle.config.cjs")));

        fs::write(temp.path().join("vivliostyle.config.mjs"), "").expect("should write mjs");
        assert_eq!(locate_config(None, temp.path()), Some(temp.path().join("vivliostyle.config.mjs")));
    }

    #[test]
    fn test_source_kind() {
        assert_eq!(SourceKind::from_path(Path::new("a/vivliostyle.config.json")), SourceKind::Text);
        assert_eq!(SourceKind::from_path(Path::new("vivliostyle.config.js")), SourceKind::Module);
        assert_eq!(SourceKind::from_path(Path::new("vivliostyle.config.mjs")), SourceKind::Module);
        assert_eq!(SourceKind::from_path(Path::new("vivliostyle.config.cjs")), SourceKind::Module);
        assert_eq!(ConfigSource::resolve(PathBuf::from("x.json")).kind, SourceKind::Text);
    }

    #[test]
    #[serial]
    fn test_relative_cwd_is_anchored_on_process_cwd() {
        let process_cwd = std::env::current_dir().expect("should read cwd");
        let found = locate_config(Some(Path::new("a.json")), Path::new("book")).expect("explicit path");
        assert!(found.is_absolute(), "{}", found.display());
        assert_eq!(found, process_cwd.join("book").join("a.json"));

        let resolved = resolve_path(Path::new("./book/../other"), Path::new("cfg.json"));
        assert_eq!(resolved, process_cwd.join("other").join("cfg.json"));
    }

    #[test]
    #[serial]
    fn test_relative_cwd_finds_default_config() {
        let temp = TempDir::new().expect("should create temp dir");
        fs::create_dir_all(temp.path().join("book")).expect("should create dir");
        fs::write(temp.path().join("book/vivliostyle.config.json"), "{}").expect("should write json");
        let original = std::env::current_dir().expect("should read cwd");
        std::env::set_current_dir(temp.path()).expect("should change cwd");

        let found = locate_config(None, Path::new("book"));

        std::env::set_current_dir(original).expect("should restore cwd");
        let found = found.expect("config should be found");
        assert!(found.is_absolute(), "{}", found.display());
        assert!(found.ends_with("book/vivliostyle.config.json"));
    }

    #[test]
    fn test_parent_of_root_is_root() {
        assert_eq!(resolve_path(Path::new("/"), Path::new("..")), PathBuf::from("/"));
        assert_eq!(resolve_path(Path::new("/work"), Path::new("../../../cfg.json")), PathBuf::from("/cfg.json"));
        assert_eq!(normalize_path(Path::new("/../a/./b")), PathBuf::from("/a/b"));
        assert_eq!(normalize_path(Path::new("../a")), PathBuf::from("../a"));
    }
}

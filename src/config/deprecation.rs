//! Advisory warnings for obsolete config fields
//!
//! Deprecated fields are still accepted and deserialized; using one only
//! produces a warning. Each registered deprecation is reported at most once
//! per load, however many tasks use the field.

use super::schema::{BuildTask, OneOrMany, ParsedConfig};

/// A deprecated config field
pub struct Deprecation {
    /// Field name as written in the config file
    pub field: &'static str,
    /// Whether a task uses the field
    pub applies: fn(&BuildTask) -> bool,
    pub message: &'static str,
}

/// Registered deprecations, in reporting order.
pub const DEPRECATIONS: &[Deprecation] = &[
    Deprecation {
        field: "includeAssets",
        applies: uses_include_assets,
        message: "'includeAssets' property of Vivliostyle config was deprecated and will be removed in a future release. Please use 'copyAsset.includes' property instead.",
    },
    Deprecation {
        field: "tocTitle",
        applies: uses_toc_title,
        message: "'tocTitle' property of Vivliostyle config was deprecated and will be removed in a future release. Please use 'toc.title' property instead.",
    },
    Deprecation {
        field: "http",
        applies: uses_http,
        message: "'http' property of Vivliostyle config was deprecated and will be removed in a future release. This option is enabled by default, and the file protocol is no longer supported.",
    },
];

// A list counts as set even when empty; a lone string must be non-empty.
fn uses_include_assets(task: &BuildTask) -> bool {
    match &task.include_assets {
        Some(OneOrMany::One(pattern)) => !pattern.is_empty(),
        Some(OneOrMany::Many(_)) => true,
        None => false,
    }
}

fn uses_toc_title(task: &BuildTask) -> bool {
    task.toc_title.as_deref().is_some_and(|title| !title.is_empty())
}

fn uses_http(task: &BuildTask) -> bool {
    task.http == Some(true)
}

/// Warn about deprecated fields used by any task of `config`.
///
/// Each warning is emitted through `tracing` and also returned so callers
/// can present it their own way.
pub fn warn_deprecated_config(config: &ParsedConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    for deprecation in DEPRECATIONS {
        if config.tasks.iter().any(deprecation.applies) {
            tracing::warn!(field = deprecation.field, "{}", deprecation.message);
            warnings.push(deprecation.message);
        }
    }
    warnings
}

//! Errors surfaced by config loading
//!
//! Every failure carries a short human summary and a longer detail blob
//! (the underlying error, a module's stack trace, or a rendered diagnostic).

use crate::code_frame::{ANSI_RED_BOLD, ANSI_RESET};
use thiserror::Error;

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The config could not be read, parsed, or evaluated
    #[error("{summary}")]
    Load { summary: String, detail: String },
    /// The config was read but does not match the schema
    #[error("{summary}")]
    Validation { summary: String, detail: String },
}

impl ConfigError {
    /// Short human-readable summary.
    pub fn summary(&self) -> &str {
        match self {
            ConfigError::Load { summary, .. } | ConfigError::Validation { summary, .. } => summary,
        }
    }

    /// Longer explanation: underlying error text or a rendered diagnostic.
    pub fn detail(&self) -> &str {
        match self {
            ConfigError::Load { detail, .. } | ConfigError::Validation { detail, .. } => detail,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Load { .. } => "config.load_failure",
            ConfigError::Validation { .. } => "config.validation_failure",
        }
    }
}

/// Format an error for the terminal: `Error: <summary>` followed by the detail.
pub fn format_error(err: &ConfigError, color: bool) -> String {
    let label = if color { format!("{}Error:{}", ANSI_RED_BOLD, ANSI_RESET) } else { "Error:".to_string() };
    if err.detail().is_empty() {
        format!("{} {}", label, err.summary())
    } else {
        format!("{} {}\n{}", label, err.summary(), err.detail())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let err = ConfigError::Load { summary: "could not load".into(), detail: "No such file".into() };
        assert_eq!(err.summary(), "could not load");
        assert_eq!(err.detail(), "No such file");
        assert_eq!(err.to_string(), "could not load");
        assert_eq!(err.code(), "config.load_failure");
    }

    #[test]
    fn test_format_error() {
        let err = ConfigError::Validation { summary: "invalid".into(), detail: "line 1".into() };
        assert_eq!(format_error(&err, false), "Error: invalid\nline 1");
        assert!(format_error(&err, true).starts_with(ANSI_RED_BOLD));

        let err = ConfigError::Load { summary: "bad".into(), detail: String::new() };
        assert_eq!(format_error(&err, false), "Error: bad");
    }
}

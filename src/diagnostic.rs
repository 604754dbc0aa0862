//! Turning an issue tree into one actionable diagnostic
//!
//! Schema engines report a failure for every alternative a union tried, and
//! most of those alternatives were never meant to match. The renderer
//! flattens the issue tree into root-to-leaf chains, picks the chain whose
//! path reaches deepest into the document, and points at that location in the
//! original source text.
//!
//! 1. **Flatten**: depth-first, left to right, every root-to-leaf chain with a
//!    weight equal to the total number of path segments along the chain.
//! 2. **Select**: the heaviest chain; on ties the first one encountered.
//! 3. **Locate**: walk the chain's concatenated path through the syntax tree,
//!    stopping at the first segment that cannot be resolved.
//! 4. **Render**: the leaf message, plus a code frame around the located node.

use crate::code_frame::{code_frame, CodeFrameOptions, ANSI_RED, ANSI_RESET};
use crate::issue::{dotted_path, PathSegment, ValidationIssue};
use crate::jsonc::{self, SyntaxNode};
use std::fmt;

/// Message used when there is no issue to explain.
pub const UNKNOWN_ERROR: &str = "Unknown validation error";

/// A root-to-leaf path through the issue tree.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueChain<'a> {
    /// Issues from the root to the leaf
    pub issues: Vec<&'a ValidationIssue>,
    /// Total number of path segments contributed by the chain
    pub weight: usize,
}

impl<'a> IssueChain<'a> {
    /// The leaf issue, whose message is shown to the user.
    pub fn leaf(&self) -> Option<&'a ValidationIssue> {
        self.issues.last().copied()
    }

    /// Concatenation of every issue's path, root to leaf.
    pub fn path(&self) -> Vec<PathSegment> {
        self.issues.iter().flat_map(|issue| issue.path.iter().cloned()).collect()
    }
}

/// Flatten an issue forest into every root-to-leaf chain, in traversal order.
pub fn flatten(issues: &[ValidationIssue]) -> Vec<IssueChain<'_>> {
    let mut chains = Vec::new();
    for issue in issues {
        let own = issue.path.len();
        if issue.is_leaf() {
            chains.push(IssueChain { issues: vec![issue], weight: own });
            continue;
        }
        for mut chain in flatten(&issue.children) {
            chain.issues.insert(0, issue);
            chain.weight += own;
            chains.push(chain);
        }
    }
    chains
}

/// Pick the chain with the greatest weight. Ties keep the earliest chain.
pub fn select<'a>(chains: impl IntoIterator<Item = IssueChain<'a>>) -> Option<IssueChain<'a>> {
    let mut best: Option<IssueChain<'a>> = None;
    for chain in chains {
        match &best {
            Some(current) if chain.weight <= current.weight => {}
            _ => best = Some(chain),
        }
    }
    best
}

/// Walk `path` from `root`, returning the deepest node that could be reached.
///
/// An empty path resolves to the root. If not even the first segment
/// resolves, there is nothing to point at and `None` is returned.
pub fn locate<'a>(root: &'a SyntaxNode, path: &[PathSegment]) -> Option<&'a SyntaxNode> {
    let mut current = root;
    let mut resolved = 0;
    for segment in path {
        let next = match segment {
            PathSegment::Key(key) => current.member(key),
            PathSegment::Index(index) => current.element(*index),
        };
        match next {
            Some(node) => {
                current = node;
                resolved += 1;
            }
            None => break,
        }
    }

    if path.is_empty() || resolved > 0 {
        Some(current)
    } else {
        None
    }
}

/// The rendered explanation of a validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Message of the selected leaf issue
    pub message: String,
    /// Full path of the selected chain
    pub path: Vec<PathSegment>,
    /// Source excerpt around the located node, if any
    pub excerpt: Option<String>,
    color: bool,
}

impl Diagnostic {
    /// The selected path joined with dots, e.g. `tasks.0.output`.
    pub fn dotted_path(&self) -> String {
        dotted_path(&self.path)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.color {
            write!(f, "{}{}{}", ANSI_RED, self.message, ANSI_RESET)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(excerpt) = &self.excerpt {
            write!(f, "\n{}", excerpt)?;
        }
        Ok(())
    }
}

/// Renders issue trees against source text.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticRenderer {
    options: CodeFrameOptions,
}

impl DiagnosticRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom code frame options.
    pub fn with_options(options: CodeFrameOptions) -> Self {
        Self { options }
    }

    /// Enable or disable ANSI colors.
    pub fn with_color(mut self, color: bool) -> Self {
        self.options.color = color;
        self
    }

    /// Explain `issues` against `raw_text`.
    ///
    /// Never fails: an unparseable text or an unresolvable path simply
    /// produces a diagnostic without an excerpt.
    pub fn render(&self, raw_text: &str, issues: &[ValidationIssue]) -> Diagnostic {
        let Some(chain) = select(flatten(issues)) else {
            return Diagnostic {
                message: UNKNOWN_ERROR.to_string(),
                path: Vec::new(),
                excerpt: None,
                color: self.options.color,
            };
        };

        let path = chain.path();
        let message = chain.leaf().map(|leaf| leaf.message.clone()).unwrap_or_default();

        let excerpt = match jsonc::parse(raw_text) {
            Ok(root) => locate(&root, &path).map(|node| code_frame(raw_text, node.span, &self.options)),
            Err(e) => {
                tracing::debug!(error = %e, "source text for diagnostics did not parse");
                None
            }
        };

        Diagnostic { message, path, excerpt, color: self.options.color }
    }
}

/// Render the most relevant issue of `issues` as a string.
pub fn prettify_schema_error(raw_text: &str, issues: &[ValidationIssue], color: bool) -> String {
    DiagnosticRenderer::new().with_color(color).render(raw_text, issues).to_string()
}

//! Parse issue types for dropped dialogue lines
//!
//! The cue parser never fails on a single bad line; it skips the line and
//! records why here so hosts and the CLI can surface diagnostics.

use core::fmt;

/// Why a `Dialogue:` line did not produce a cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IssueKind {
    /// Fewer than ten comma-separated fields
    TooFewFields,
    /// Start or end field is not `H:MM:SS.CC`
    InvalidTime,
    /// Text is empty after trimming
    EmptyText,
    /// End precedes start
    NegativeDuration,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewFields => write!(f, "too few fields"),
            Self::InvalidTime => write!(f, "invalid time"),
            Self::EmptyText => write!(f, "empty text"),
            Self::NegativeDuration => write!(f, "negative duration"),
        }
    }
}

/// A `Dialogue:` line skipped while scanning the `[Events]` section
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseIssue {
    /// What went wrong
    pub kind: IssueKind,

    /// Line number where issue occurred (1-based)
    pub line: usize,

    /// Human-readable message
    pub message: String,
}

impl ParseIssue {
    /// Describe a skipped line
    #[must_use]
    pub const fn skipped(kind: IssueKind, line: usize, message: String) -> Self {
        Self {
            kind,
            line,
            message,
        }
    }
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "skipped line {} ({}): {}",
            self.line, self.kind, self.message
        )
    }
}

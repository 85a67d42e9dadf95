//! Core error type for danmaku engine operations
//!
//! Provides the `CoreError` enum shared by the parser, the engine and the
//! host seams. Designed for easy propagation with `?` and for telling the
//! two "no subtitles" situations apart.
//!
//! # Error Philosophy
//!
//! - Use `thiserror` for structured error handling (no `anyhow` in the library)
//! - Source-unavailable and empty-content are distinct variants with the
//!   same recovery path (the engine disables itself)
//! - Host failures on a single visual element are recoverable and never
//!   abort a tick
//!
//! # Examples
//!
//! ```rust
//! use danmaku_core::utils::errors::CoreError;
//!
//! let err = CoreError::source_unavailable("abc123", "HTTP 404");
//! assert!(!err.is_content_error());
//!
//! let empty = CoreError::empty_content("abc123");
//! assert!(empty.is_content_error());
//! ```

use core::fmt;
use thiserror::Error;

/// Main error type for danmaku core operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Subtitle file could not be fetched or read
    #[error("Subtitle source unavailable for '{video_id}': {reason}")]
    SourceUnavailable {
        /// Video whose subtitles were requested
        video_id: String,
        /// Why the fetch failed
        reason: String,
    },

    /// Subtitle file was read but produced zero cues
    #[error("Subtitle file for '{video_id}' is empty or malformed")]
    EmptyContent {
        /// Video whose subtitles were requested
        video_id: String,
    },

    /// Time format parsing errors
    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    /// Color format parsing errors
    #[error("Invalid color format: {0}")]
    InvalidColor(String),

    /// Host overlay failed to create or remove a visual element
    #[error("Overlay error: {0}")]
    Host(String),

    /// Time source could not report the playback position
    #[error("Time source error: {0}")]
    Clock(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoreError {
    /// Create source-unavailable error for a video
    pub fn source_unavailable<T: fmt::Display>(video_id: &str, reason: T) -> Self {
        Self::SourceUnavailable {
            video_id: video_id.to_string(),
            reason: format!("{reason}"),
        }
    }

    /// Create empty-content error for a video
    #[must_use]
    pub fn empty_content(video_id: &str) -> Self {
        Self::EmptyContent {
            video_id: video_id.to_string(),
        }
    }

    /// Create time error from invalid format
    pub fn invalid_time<T: fmt::Display>(time: T, reason: &str) -> Self {
        Self::InvalidTime(format!("'{time}': {reason}"))
    }

    /// Create color error from invalid format
    pub fn invalid_color<T: fmt::Display>(color: T) -> Self {
        Self::InvalidColor(format!("{color}"))
    }

    /// Create host overlay error
    pub fn host<T: fmt::Display>(message: T) -> Self {
        Self::Host(format!("{message}"))
    }

    /// Create configuration error
    pub fn config<T: fmt::Display>(message: T) -> Self {
        Self::Config(format!("{message}"))
    }

    /// Check if the subtitle file was present but yielded nothing usable
    #[must_use]
    pub const fn is_content_error(&self) -> bool {
        matches!(self, Self::EmptyContent { .. })
    }
}

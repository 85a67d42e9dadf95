//! Seams between the engine and its host environment
//!
//! The engine never renders anything itself. It asks an [`Overlay`] to
//! create a visual element from a [`VisualSpec`] (a committed linear tween
//! plus presentation attributes) and later removes it again through the
//! opaque [`VisualHandle`] the overlay returned. Subtitle text arrives
//! through a [`SubtitleSource`].

use std::path::{Path, PathBuf};

use crate::{tags::TextFormatting, tracker::CueLineId, utils::CoreError};

/// Overlay surface size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverlaySize {
    /// Width in pixels
    pub width: f32,
    /// Height in pixels
    pub height: f32,
}

impl OverlaySize {
    /// Create a new size
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether there is no drawable area yet
    #[must_use]
    pub fn is_unmeasured(&self) -> bool {
        self.height <= 0.0
    }
}

/// Opaque id of an element created by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisualHandle(u64);

impl VisualHandle {
    /// Wrap a host-issued id
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Host-issued id
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Presentation attributes of a visual element
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisualStyle {
    /// Bold, italic, underline and strike-out
    pub formatting: TextFormatting,
    /// Text color as RGB, host default when `None`
    pub color: Option<[u8; 3]>,
    /// Font size in pixels
    pub font_size: f32,
}

/// Everything the host needs to show one cue-line
///
/// The element starts at `from` and moves linearly to `to` over `duration`
/// seconds. The engine commits this once and never updates it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisualSpec {
    /// Cue-line this element shows
    pub line: CueLineId,
    /// Visible text without override blocks
    pub text: String,
    /// Initial top-left position
    pub from: (f32, f32),
    /// Final top-left position
    pub to: (f32, f32),
    /// Tween length in seconds
    pub duration: f64,
    /// Fixed opacity in `0.0..=1.0`
    pub opacity: f32,
    /// Presentation attributes
    pub style: VisualStyle,
    /// Lane for scrolled lines, `None` for authored movement
    pub lane: Option<usize>,
}

/// Rectangular drawing surface owned by the host
pub trait Overlay {
    /// Current overlay size; zero height means "not laid out yet"
    fn dimensions(&self) -> OverlaySize;

    /// Width of the surrounding viewport, used to pick desktop or narrow
    /// metrics
    fn viewport_width(&self) -> f32 {
        self.dimensions().width
    }

    /// Rendered width of `text` at `font_size`
    fn measure_text(&self, text: &str, font_size: f32) -> f32;

    /// Create an element and start its tween
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Host`] if the element could not be created.
    fn create(&mut self, spec: &VisualSpec) -> Result<VisualHandle, CoreError>;

    /// Remove an element
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Host`] if the element is already gone.
    fn remove(&mut self, handle: VisualHandle) -> Result<(), CoreError>;
}

/// Provider of raw ASS text for a video
pub trait SubtitleSource {
    /// Fetch the subtitle document for `video_id`
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SourceUnavailable`] if there is no document.
    fn load(&self, video_id: &str) -> Result<String, CoreError>;
}

/// Reads `<root>/<video_id>.ass` from disk
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Serve subtitle files from `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the files are read from
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file for `video_id`
    #[must_use]
    pub fn path_for(&self, video_id: &str) -> PathBuf {
        self.root.join(format!("{video_id}.ass"))
    }
}

impl SubtitleSource for DirectorySource {
    fn load(&self, video_id: &str) -> Result<String, CoreError> {
        let path = self.path_for(video_id);
        std::fs::read_to_string(&path).map_err(|err| {
            CoreError::source_unavailable(video_id, format!("{}: {err}", path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_source_reports_missing_files() {
        let source = DirectorySource::new(std::env::temp_dir().join("danmaku-missing-dir"));
        let err = source.load("nope").unwrap_err();
        assert!(matches!(err, CoreError::SourceUnavailable { .. }));
        assert!(!err.is_content_error());
        assert!(source.path_for("abc").ends_with("abc.ass"));
    }

    #[test]
    fn directory_source_reads_files() {
        let dir = std::env::temp_dir().join(format!("danmaku-source-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("vid.ass"), "[Events]\n").unwrap();

        let source = DirectorySource::new(&dir);
        assert_eq!(source.load("vid").unwrap(), "[Events]\n");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn zero_height_is_unmeasured() {
        assert!(OverlaySize::new(1280.0, 0.0).is_unmeasured());
        assert!(!OverlaySize::new(1280.0, 720.0).is_unmeasured());
        assert_eq!(VisualHandle::new(7).raw(), 7);
    }
}

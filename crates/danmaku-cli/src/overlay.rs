//! Console overlay host
//!
//! Stands in for a browser overlay: elements are not drawn but reported as
//! create/remove events, either buffered for the simulator or echoed as
//! they happen while playing.

use danmaku_core::{
    host::{Overlay, OverlaySize, VisualHandle, VisualSpec},
    CoreError,
};
use serde::Serialize;

/// Share of the font size taken by a proportional glyph
const NARROW_GLYPH_EM: f32 = 0.55;

/// One host call made by the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OverlayEvent {
    /// An element was created
    Create {
        /// Host id
        handle: u64,
        /// What the engine asked for
        #[serde(flatten)]
        spec: VisualSpec,
    },
    /// An element was removed
    Remove {
        /// Host id
        handle: u64,
    },
}

/// How events are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Overlay that reports instead of drawing
#[derive(Debug)]
pub struct ConsoleOverlay {
    size: OverlaySize,
    viewport: f32,
    next: u64,
    live: Vec<u64>,
    pending: Vec<OverlayEvent>,
    echo: Option<Format>,
}

impl ConsoleOverlay {
    /// Overlay of `width` x `height` inside a viewport `viewport` wide
    pub fn new(width: f32, height: f32, viewport: f32) -> Self {
        Self {
            size: OverlaySize::new(width, height),
            viewport,
            next: 0,
            live: Vec::new(),
            pending: Vec::new(),
            echo: None,
        }
    }

    /// Print events immediately instead of buffering them
    #[must_use]
    pub fn echoing(mut self, format: Format) -> Self {
        self.echo = Some(format);
        self
    }

    /// Take the buffered events
    pub fn drain(&mut self) -> Vec<OverlayEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Elements currently alive
    pub fn live(&self) -> usize {
        self.live.len()
    }

    fn emit(&mut self, event: OverlayEvent) {
        match self.echo {
            Some(format) => println!("{}", render(None, &event, format)),
            None => self.pending.push(event),
        }
    }
}

impl Overlay for ConsoleOverlay {
    fn dimensions(&self) -> OverlaySize {
        self.size
    }

    fn viewport_width(&self) -> f32 {
        self.viewport
    }

    fn measure_text(&self, text: &str, font_size: f32) -> f32 {
        estimate_width(text, font_size)
    }

    fn create(&mut self, spec: &VisualSpec) -> Result<VisualHandle, CoreError> {
        self.next += 1;
        let handle = self.next;
        self.live.push(handle);
        self.emit(OverlayEvent::Create {
            handle,
            spec: spec.clone(),
        });
        Ok(VisualHandle::new(handle))
    }

    fn remove(&mut self, handle: VisualHandle) -> Result<(), CoreError> {
        let raw = handle.raw();
        let Some(pos) = self.live.iter().position(|id| *id == raw) else {
            return Err(CoreError::host(format!("element #{raw} is not on the overlay")));
        };
        self.live.swap_remove(pos);
        self.emit(OverlayEvent::Remove { handle: raw });
        Ok(())
    }
}

/// Approximate rendered width of `text`
///
/// Full-width glyphs (CJK, kana, hangul, full-width forms) take one em,
/// everything else a little over half of one.
pub fn estimate_width(text: &str, font_size: f32) -> f32 {
    text.chars()
        .map(|c| if is_full_width(c) { 1.0 } else { NARROW_GLYPH_EM })
        .sum::<f32>()
        * font_size
}

fn is_full_width(c: char) -> bool {
    matches!(
        u32::from(c),
        0x1100..=0x115F
            | 0x2E80..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x2_0000..=0x3_FFFD
    )
}

/// Format one event, prefixed with the playback time when known
pub fn render(time: Option<f64>, event: &OverlayEvent, format: Format) -> String {
    match format {
        Format::Json => {
            let mut value = serde_json::to_value(event).unwrap_or_default();
            if let (Some(time), Some(object)) = (time, value.as_object_mut()) {
                object.insert(String::from("time"), serde_json::json!(time));
            }
            value.to_string()
        }
        Format::Text => {
            let prefix = time.map_or_else(String::new, |t| format!("[{t:8.2}] "));
            match event {
                OverlayEvent::Create { handle, spec } => {
                    let lane = spec
                        .lane
                        .map_or_else(|| String::from("move"), |lane| format!("lane {lane:2}"));
                    format!(
                        "{prefix}+ #{handle:<4} {lane}  ({:.0},{:.0}) -> ({:.0},{:.0}) over {:.2}s  {:?}",
                        spec.from.0, spec.from.1, spec.to.0, spec.to.1, spec.duration, spec.text
                    )
                }
                OverlayEvent::Remove { handle } => format!("{prefix}- #{handle}"),
            }
        }
    }
}

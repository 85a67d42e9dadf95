//! Tick orchestration and engine lifecycle
//!
//! [`SubtitleEngine`] owns every piece of playback state for one video: the
//! cue store, the render-state tracker, the lane allocator and the host
//! overlay. Each [`SubtitleEngine::tick`] runs one full pass:
//!
//! 1. skip entirely while the overlay has no height
//! 2. clear everything while hidden or without cues
//! 3. detect seeks and collect stale buckets
//! 4. materialize newly active cue-lines (lane placement, motion, host create)
//! 5. retire lines past `end + retire_grace`
//!
//! Host failures on single elements are logged and counted, never
//! propagated, so one broken element cannot stall the rest of the tick.
//!
//! # Example
//!
//! ```rust
//! use danmaku_core::{
//!     host::{Overlay, OverlaySize, VisualHandle, VisualSpec},
//!     CoreError, EngineConfig, SubtitleEngine,
//! };
//!
//! struct Null(u64);
//!
//! impl Overlay for Null {
//!     fn dimensions(&self) -> OverlaySize {
//!         OverlaySize::new(1280.0, 720.0)
//!     }
//!     fn measure_text(&self, text: &str, font_size: f32) -> f32 {
//!         text.chars().count() as f32 * font_size * 0.55
//!     }
//!     fn create(&mut self, _spec: &VisualSpec) -> Result<VisualHandle, CoreError> {
//!         self.0 += 1;
//!         Ok(VisualHandle::new(self.0))
//!     }
//!     fn remove(&mut self, _handle: VisualHandle) -> Result<(), CoreError> {
//!         Ok(())
//!     }
//! }
//!
//! let mut engine = SubtitleEngine::new(Null(0), EngineConfig::default())?;
//! engine.load_text(
//!     "demo",
//!     "[Events]\nDialogue: 0,0:00:01.00,0:00:03.00,Default,,0,0,0,,Hello\n",
//! )?;
//!
//! let report = engine.tick(1.5);
//! assert_eq!(report.materialized, 1);
//! assert_eq!(engine.status().to_string(), "Subtitles: 1 lines");
//! # Ok::<(), CoreError>(())
//! ```

use core::fmt;

use tracing::{debug, info, warn};

use crate::{
    animation::{move_tween, scroll_timing, scroll_tween},
    config::{EngineConfig, ViewportProfile},
    host::{Overlay, OverlaySize, SubtitleSource, VisualSpec, VisualStyle},
    layout::{LaneAllocator, LaneRequest},
    parser::Cue,
    store::CueStore,
    tags::interpret_line,
    tracker::{ActiveLine, CueLineId, RenderTracker},
    utils::CoreError,
};

/// Summary shown next to the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleStatus {
    /// Nothing loaded yet
    Idle,
    /// Subtitles parsed successfully
    Loaded {
        /// Number of cues
        lines: usize,
    },
    /// Source missing or content unusable
    Unavailable {
        /// What went wrong
        reason: String,
    },
}

impl SubtitleStatus {
    /// Number of loaded cues
    #[must_use]
    pub const fn lines(&self) -> Option<usize> {
        match self {
            Self::Loaded { lines } => Some(*lines),
            Self::Idle | Self::Unavailable { .. } => None,
        }
    }
}

impl fmt::Display for SubtitleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded { lines } => write!(f, "Subtitles: {lines} lines"),
            Self::Idle | Self::Unavailable { .. } => write!(f, "Subtitles: none"),
        }
    }
}

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The overlay had no height and nothing was done
    pub skipped: bool,
    /// The step from the previous tick was a seek
    pub seek: bool,
    /// Lines created this tick
    pub materialized: usize,
    /// Lines that could not get a free lane
    pub forced: usize,
    /// Lines torn down this tick
    pub retired: usize,
    /// Host create/remove calls that failed
    pub host_failures: usize,
}

/// Subtitle engine for one overlay
#[derive(Debug)]
pub struct SubtitleEngine<O: Overlay> {
    config: EngineConfig,
    overlay: O,
    store: Option<CueStore>,
    status: SubtitleStatus,
    visible: bool,
    tracker: RenderTracker,
    lanes: LaneAllocator,
}

impl<O: Overlay> SubtitleEngine<O> {
    /// Create an engine drawing into `overlay`
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the configuration is unusable.
    pub fn new(overlay: O, config: EngineConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            tracker: RenderTracker::new(config.tracker),
            lanes: LaneAllocator::new(config.lanes),
            config,
            overlay,
            store: None,
            status: SubtitleStatus::Idle,
            visible: false,
        })
    }

    /// Fetch and parse subtitles for `video_id`
    ///
    /// On failure the engine disables itself: nothing is shown, visibility
    /// is forced off and the status reads "none".
    ///
    /// # Errors
    ///
    /// Returns the source error or [`CoreError::EmptyContent`].
    pub fn load<S>(&mut self, source: &S, video_id: &str) -> Result<usize, CoreError>
    where
        S: SubtitleSource + ?Sized,
    {
        match source.load(video_id) {
            Ok(text) => self.load_text(video_id, &text),
            Err(err) => {
                self.disable(&err);
                Err(err)
            }
        }
    }

    /// Parse already-fetched subtitle text for `video_id`
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyContent`] if no cue could be parsed.
    pub fn load_text(&mut self, video_id: &str, text: &str) -> Result<usize, CoreError> {
        let removed = self.tracker.reset();
        self.remove_elements(removed);
        self.lanes.clear();

        match CueStore::parse(video_id, text) {
            Ok(store) => {
                let lines = store.len();
                info!(
                    video_id,
                    lines,
                    skipped = store.issues().len(),
                    "subtitles loaded"
                );
                for issue in store.issues() {
                    debug!(%issue, "dialogue line skipped");
                }
                self.store = Some(store);
                self.status = SubtitleStatus::Loaded { lines };
                self.visible = true;
                Ok(lines)
            }
            Err(err) => {
                self.disable(&err);
                Err(err)
            }
        }
    }

    /// Run one polling step at playback time `time`
    pub fn tick(&mut self, time: f64) -> TickReport {
        let mut report = TickReport::default();

        let size = self.overlay.dimensions();
        if size.is_unmeasured() {
            report.skipped = true;
            return report;
        }

        if !self.visible || !self.has_cues() {
            report.host_failures = self.clear_visuals();
            return report;
        }

        report.seek = self.tracker.observe(time);
        if report.seek {
            self.lanes.clear();
        }
        self.lanes.prune(time, self.config.tracker.retire_grace);

        let profile = *self.config.profile_for(self.overlay.viewport_width());

        if let Some(store) = &self.store {
            for (cue_index, cue) in store.active_cues(time) {
                for (line_index, line) in cue.lines() {
                    let id = CueLineId {
                        cue: cue_index,
                        line: line_index,
                    };
                    if !self.tracker.should_materialize(id, cue.start) {
                        continue;
                    }

                    let (spec, forced) = plan_visual(
                        &self.config,
                        &profile,
                        &mut self.lanes,
                        &self.overlay,
                        size,
                        time,
                        id,
                        cue,
                        line,
                    );

                    let handle = match self.overlay.create(&spec) {
                        Ok(handle) => Some(handle),
                        Err(err) => {
                            warn!(line = %id, error = %err, "failed to create subtitle element");
                            report.host_failures += 1;
                            None
                        }
                    };

                    self.tracker.mark_materialized(id, cue.start, cue.end, handle);
                    report.materialized += 1;
                    report.forced += usize::from(forced);
                }
            }
        }

        let retired = self.tracker.retire_due(time);
        report.retired = retired.len();
        for line in &retired {
            self.lanes.release(line.id);
            debug!(line = %line.id, time, "cue-line retired");
        }
        report.host_failures += self.remove_elements(retired);

        report
    }

    /// Flip visibility, returning the new state
    ///
    /// Without loaded cues the engine stays hidden. Hiding removes every
    /// element and lane record immediately.
    pub fn toggle_visibility(&mut self) -> bool {
        if !self.has_cues() {
            return false;
        }

        self.visible = !self.visible;
        if !self.visible {
            self.clear_visuals();
        }
        info!(visible = self.visible, "subtitles toggled");
        self.visible
    }

    /// The overlay or viewport changed size
    ///
    /// Lane occupancy and reference speeds are dropped; elements already in
    /// flight keep animating under the old geometry.
    pub fn resize(&mut self) {
        debug!(size = ?self.overlay.dimensions(), "overlay resized, lanes cleared");
        self.lanes.clear();
    }

    /// Tear down every element and all render state
    pub fn shutdown(&mut self) {
        let removed = self.tracker.reset();
        self.remove_elements(removed);
        self.lanes.clear();
        info!("subtitle engine stopped");
    }

    /// Status summary
    #[must_use]
    pub const fn status(&self) -> &SubtitleStatus {
        &self.status
    }

    /// Whether subtitles are currently shown
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Loaded cues, if any
    #[must_use]
    pub const fn store(&self) -> Option<&CueStore> {
        self.store.as_ref()
    }

    /// Materialized lines
    #[must_use]
    pub fn active_lines(&self) -> &[ActiveLine] {
        self.tracker.active()
    }

    /// Render-state tracker
    #[must_use]
    pub const fn tracker(&self) -> &RenderTracker {
        &self.tracker
    }

    /// Lane allocator
    #[must_use]
    pub const fn lanes(&self) -> &LaneAllocator {
        &self.lanes
    }

    /// Engine configuration
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Host overlay
    #[must_use]
    pub const fn overlay(&self) -> &O {
        &self.overlay
    }

    /// Host overlay, mutably
    pub fn overlay_mut(&mut self) -> &mut O {
        &mut self.overlay
    }

    /// Consume the engine, returning the overlay
    pub fn into_overlay(self) -> O {
        self.overlay
    }

    fn has_cues(&self) -> bool {
        self.store.as_ref().is_some_and(|store| !store.is_empty())
    }

    fn disable(&mut self, err: &CoreError) {
        let removed = self.tracker.reset();
        self.remove_elements(removed);
        self.lanes.clear();
        self.store = None;
        self.visible = false;
        self.status = SubtitleStatus::Unavailable {
            reason: err.to_string(),
        };
        warn!(error = %err, "subtitles disabled");
    }

    /// Remove all elements, active lines and lane records
    fn clear_visuals(&mut self) -> usize {
        let removed = self.tracker.clear_active();
        self.lanes.clear();
        self.remove_elements(removed)
    }

    fn remove_elements(&mut self, lines: Vec<ActiveLine>) -> usize {
        let mut failures = 0;
        for handle in lines.into_iter().filter_map(|line| line.handle) {
            if let Err(err) = self.overlay.remove(handle) {
                warn!(handle = handle.raw(), error = %err, "failed to remove subtitle element");
                failures += 1;
            }
        }
        failures
    }
}

/// Decide placement and motion for one new cue-line
///
/// Returns the visual spec and whether the lane placement was forced.
#[allow(clippy::too_many_arguments)]
fn plan_visual<O: Overlay>(
    config: &EngineConfig,
    profile: &ViewportProfile,
    lanes: &mut LaneAllocator,
    overlay: &O,
    size: OverlaySize,
    time: f64,
    id: CueLineId,
    cue: &Cue,
    line: &str,
) -> (VisualSpec, bool) {
    let markup = interpret_line(line);
    let style = VisualStyle {
        formatting: markup.formatting,
        color: markup.color,
        font_size: profile.font_size,
    };
    let opacity = markup.opacity.unwrap_or(1.0);

    if let Some(movement) = &markup.movement {
        let tween = move_tween(time, movement, size, profile, cue.duration());
        debug!(line = %id, from = ?tween.from, to = ?tween.to, "authored movement");
        let spec = VisualSpec {
            line: id,
            text: markup.text,
            from: tween.from,
            to: tween.to,
            duration: tween.duration,
            opacity,
            style,
            lane: None,
        };
        return (spec, false);
    }

    let text_width = overlay.measure_text(&markup.text, profile.font_size);
    let timing = scroll_timing(size.width, text_width, cue.duration(), profile, &config.motion);
    let request = LaneRequest {
        overlay: size,
        text_width,
        text_height: profile.text_height,
        lane_height: profile.lane_height,
        speed: timing.speed,
    };

    let placement = lanes.place(time, &request);
    if placement.forced {
        warn!(line = %id, lane = placement.lane, "no free lane, forcing placement");
    }

    let tween = scroll_tween(time, size.width, placement.y, text_width, &timing, &config.motion);
    lanes.occupy(id, &placement, &request, tween, time + timing.duration);
    debug!(
        line = %id,
        lane = placement.lane,
        width = text_width,
        duration = timing.duration,
        "cue-line placed"
    );

    let spec = VisualSpec {
        line: id,
        text: markup.text,
        from: tween.from,
        to: tween.to,
        duration: tween.duration,
        opacity,
        style,
        lane: Some(placement.lane),
    };
    (spec, placement.forced)
}

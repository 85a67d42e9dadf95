//! Motion planning for cue-lines
//!
//! Lines either scroll right-to-left at a constant rate or follow an
//! authored `\move`. Both end up as a [`Tween`]: a start point, an end point
//! and a duration, committed once and interpolated linearly. The engine
//! evaluates the same tween to learn where an in-flight line currently is.

use crate::{
    config::{MotionConfig, ViewportProfile},
    host::OverlaySize,
    tags::Movement,
};

/// Linear motion between two points
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tween {
    /// Position at `started_at`
    pub from: (f32, f32),
    /// Position once `duration` has elapsed
    pub to: (f32, f32),
    /// Playback time the tween was committed
    pub started_at: f64,
    /// Length in seconds
    pub duration: f64,
}

impl Tween {
    /// Fraction of the tween completed at `time`, clamped to `0.0..=1.0`
    #[must_use]
    pub fn progress(&self, time: f64) -> f64 {
        if time <= self.started_at {
            return 0.0;
        }
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((time - self.started_at) / self.duration).clamp(0.0, 1.0)
    }

    /// Interpolated position at `time`
    #[must_use]
    pub fn position_at(&self, time: f64) -> (f32, f32) {
        let t = self.progress(time) as f32;
        (
            self.from.0 + (self.to.0 - self.from.0) * t,
            self.from.1 + (self.to.1 - self.from.1) * t,
        )
    }

    /// Playback time the tween reaches `to`
    #[must_use]
    pub fn finishes_at(&self) -> f64 {
        self.started_at + self.duration
    }
}

/// Timing of a right-to-left scroll
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTiming {
    /// Pixels travelled from the right edge until fully off the left edge
    pub distance: f32,
    /// Clamped transit time in seconds
    pub duration: f64,
    /// Effective speed in pixels per second
    pub speed: f32,
}

/// Compute how long a scroll takes and how fast it moves
///
/// The raw time is `distance / scroll_speed`, clamped into
/// `[max(min_duration, ratio_min * cue), ratio_max * cue]`. The lower bound
/// wins when the two cross.
#[must_use]
pub fn scroll_timing(
    overlay_width: f32,
    text_width: f32,
    cue_duration: f64,
    profile: &ViewportProfile,
    motion: &MotionConfig,
) -> ScrollTiming {
    let distance = overlay_width + text_width + motion.exit_padding;
    let raw = f64::from(distance) / f64::from(profile.scroll_speed);

    let min = motion.min_duration.max(cue_duration * motion.min_duration_ratio);
    let max = cue_duration * motion.max_duration_ratio;
    let duration = min.max(max.min(raw));

    ScrollTiming {
        distance,
        duration,
        speed: (f64::from(distance) / duration) as f32,
    }
}

/// Tween that scrolls a line at height `y` across the overlay
#[must_use]
pub fn scroll_tween(
    now: f64,
    overlay_width: f32,
    y: f32,
    text_width: f32,
    timing: &ScrollTiming,
    motion: &MotionConfig,
) -> Tween {
    Tween {
        from: (overlay_width, y),
        to: (-(text_width + motion.exit_padding), y),
        started_at: now,
        duration: timing.duration,
    }
}

/// Tween for an authored `\move`
///
/// Endpoints are scaled from the profile's script resolution to the overlay
/// and clamped so the line starts on screen and ends at most 200 px past the
/// left edge. The tween spans the unclamped cue duration.
#[must_use]
pub fn move_tween(
    now: f64,
    movement: &Movement,
    overlay: OverlaySize,
    profile: &ViewportProfile,
    cue_duration: f64,
) -> Tween {
    let scale_x = overlay.width / profile.move_base_width;
    let scale_y = overlay.height / profile.move_base_height;
    let max_y = overlay.height - 30.0;

    let start_x = clamp_lenient(movement.x1 * scale_x, 0.0, overlay.width - 100.0);
    let start_y = clamp_lenient(movement.y1 * scale_y, 0.0, max_y);
    let end_x = clamp_lenient(movement.x2 * scale_x, -200.0, overlay.width);
    let end_y = clamp_lenient(movement.y2 * scale_y, 0.0, max_y);

    Tween {
        from: (start_x, start_y),
        to: (end_x, end_y),
        started_at: now,
        duration: cue_duration,
    }
}

/// `max(lo, min(value, hi))`, which unlike `f32::clamp` tolerates `hi < lo`
fn clamp_lenient(value: f32, lo: f32, hi: f32) -> f32 {
    lo.max(value.min(hi))
}

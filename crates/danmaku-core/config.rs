//! Tuning constants for the tracker, lane allocator and motion planner
//!
//! Every empirical value the engine relies on lives here as a named field
//! with a `Default` matching the stock player. Hosts can override them, e.g.
//! from a TOML file when the `serde` feature is enabled.
//!
//! # Example
//!
//! ```rust
//! use danmaku_core::config::EngineConfig;
//!
//! let config = EngineConfig::default();
//! assert_eq!(config.lanes.min_clearance, 120.0);
//! assert_eq!(config.profile_for(375.0).scroll_speed, 150.0);
//! assert!(config.validate().is_ok());
//! ```

use crate::utils::CoreError;

/// Render-state tracker settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrackerConfig {
    /// Tick-to-tick jump in seconds treated as a seek
    pub seek_threshold: f64,
    /// Seconds a line lingers past its cue end before retirement
    pub retire_grace: f64,
    /// Buckets more than this many seconds behind playback are dropped
    pub bucket_ttl: f64,
    /// Bucket keys are `round(start * bucket_precision)`
    pub bucket_precision: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            seek_threshold: 1.0,
            retire_grace: 0.5,
            bucket_ttl: 10.0,
            bucket_precision: 10.0,
        }
    }
}

/// Lane allocator settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LaneConfig {
    /// Lanes guaranteed regardless of overlay height
    pub min_lanes: usize,
    /// Top of lane 0 in pixels
    pub top_margin: f32,
    /// Height subtracted from the overlay before dividing into lanes
    pub vertical_reserve: f32,
    /// Padding added to a candidate line's width and height
    pub band_padding: f32,
    /// Padding added to a stored record's height
    pub record_padding: f32,
    /// Space required below a lane's text
    pub bottom_clearance: f32,
    /// Fraction a new line may exceed a lane's reference speed
    pub speed_tolerance: f32,
    /// Pixels an occupant's left edge must have travelled from the right edge
    pub min_clearance: f32,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            min_lanes: 8,
            top_margin: 20.0,
            vertical_reserve: 40.0,
            band_padding: 15.0,
            record_padding: 10.0,
            bottom_clearance: 10.0,
            speed_tolerance: 0.03,
            min_clearance: 120.0,
        }
    }
}

/// Scroll duration settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MotionConfig {
    /// Extra distance past the left edge so text leaves completely
    pub exit_padding: f32,
    /// Absolute lower bound of a scroll in seconds
    pub min_duration: f64,
    /// Lower bound as a fraction of the cue duration
    pub min_duration_ratio: f64,
    /// Upper bound as a multiple of the cue duration
    pub max_duration_ratio: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            exit_padding: 50.0,
            min_duration: 3.0,
            min_duration_ratio: 0.8,
            max_duration_ratio: 2.5,
        }
    }
}

/// Metrics that differ between desktop and narrow viewports
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ViewportProfile {
    /// Font size in pixels passed to text measurement
    pub font_size: f32,
    /// Height of one line of text
    pub text_height: f32,
    /// Nominal lane pitch
    pub lane_height: f32,
    /// Scroll rate in pixels per second
    pub scroll_speed: f32,
    /// Horizontal script resolution `\move` coordinates are authored in
    pub move_base_width: f32,
    /// Vertical script resolution `\move` coordinates are authored in
    pub move_base_height: f32,
}

impl ViewportProfile {
    /// Desktop metrics
    #[must_use]
    pub const fn desktop() -> Self {
        Self {
            font_size: 16.0,
            text_height: 20.0,
            lane_height: 20.0,
            scroll_speed: 180.0,
            move_base_width: 640.0,
            move_base_height: 360.0,
        }
    }

    /// Narrow (mobile) metrics
    #[must_use]
    pub const fn narrow() -> Self {
        Self {
            font_size: 14.0,
            text_height: 16.0,
            lane_height: 10.0,
            scroll_speed: 150.0,
            move_base_width: 360.0,
            move_base_height: 200.0,
        }
    }
}

impl Default for ViewportProfile {
    fn default() -> Self {
        Self::desktop()
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Render-state tracker settings
    pub tracker: TrackerConfig,
    /// Lane allocator settings
    pub lanes: LaneConfig,
    /// Scroll duration settings
    pub motion: MotionConfig,
    /// Metrics above the breakpoint
    pub desktop: ViewportProfile,
    /// Metrics at or below the breakpoint
    pub narrow: ViewportProfile,
    /// Viewport widths up to and including this value use `narrow`
    pub narrow_breakpoint: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            lanes: LaneConfig::default(),
            motion: MotionConfig::default(),
            desktop: ViewportProfile::desktop(),
            narrow: ViewportProfile::narrow(),
            narrow_breakpoint: 768.0,
        }
    }
}

impl EngineConfig {
    /// Pick the profile for a viewport width
    #[must_use]
    pub fn profile_for(&self, viewport_width: f32) -> &ViewportProfile {
        if viewport_width <= self.narrow_breakpoint {
            &self.narrow
        } else {
            &self.desktop
        }
    }

    /// Check that the values describe a usable engine
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.lanes.min_lanes == 0 {
            return Err(CoreError::config("lanes.min_lanes must be at least 1"));
        }
        if self.lanes.speed_tolerance < 0.0 {
            return Err(CoreError::config("lanes.speed_tolerance must not be negative"));
        }
        if self.lanes.min_clearance < 0.0 {
            return Err(CoreError::config("lanes.min_clearance must not be negative"));
        }
        if self.tracker.seek_threshold <= 0.0 {
            return Err(CoreError::config("tracker.seek_threshold must be positive"));
        }
        if self.tracker.retire_grace < 0.0 {
            return Err(CoreError::config("tracker.retire_grace must not be negative"));
        }
        if self.tracker.bucket_precision <= 0.0 {
            return Err(CoreError::config("tracker.bucket_precision must be positive"));
        }
        if self.motion.min_duration <= 0.0 {
            return Err(CoreError::config("motion.min_duration must be positive"));
        }

        for (name, profile) in [("desktop", &self.desktop), ("narrow", &self.narrow)] {
            if profile.scroll_speed <= 0.0 {
                return Err(CoreError::config(format!("{name}.scroll_speed must be positive")));
            }
            if profile.lane_height <= 0.0 || profile.text_height <= 0.0 {
                return Err(CoreError::config(format!(
                    "{name}.lane_height and {name}.text_height must be positive"
                )));
            }
            if profile.move_base_width <= 0.0 || profile.move_base_height <= 0.0 {
                return Err(CoreError::config(format!(
                    "{name} move base resolution must be positive"
                )));
            }
        }

        Ok(())
    }
}

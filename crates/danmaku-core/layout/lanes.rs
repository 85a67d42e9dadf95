//! First-fit lane allocation for scrolling cue-lines

use core::fmt;

use tracing::trace;

use super::collision::BoundingBox;
use crate::{
    animation::Tween,
    config::LaneConfig,
    host::OverlaySize,
    tracker::CueLineId,
    utils::hashers::{create_hash_map, FastMap},
};

/// Lane count and pitch for one overlay height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneGeometry {
    /// Number of lanes scanned
    pub count: usize,
    /// Vertical distance between lane tops
    pub pitch: f32,
    /// Top of lane 0
    pub top_margin: f32,
}

impl LaneGeometry {
    /// Y of a lane's top edge
    #[must_use]
    pub fn top(&self, lane: usize) -> f32 {
        self.top_margin + lane as f32 * self.pitch
    }
}

/// A line asking for a lane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneRequest {
    /// Overlay size at decision time
    pub overlay: OverlaySize,
    /// Measured text width
    pub text_width: f32,
    /// Text height of the active profile
    pub text_height: f32,
    /// Nominal lane pitch of the active profile
    pub lane_height: f32,
    /// Scroll speed in pixels per second
    pub speed: f32,
}

/// Where a line was put
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Chosen lane
    pub lane: usize,
    /// Top edge in pixels
    pub y: f32,
    /// No lane passed and the line was pushed into the last one
    pub forced: bool,
}

/// Why a lane was skipped
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    /// The new line is faster than the lane's latest occupant
    SpeedMismatch {
        /// Speed of the latest occupant
        reference: f32,
        /// Speed of the new line
        speed: f32,
    },
    /// An occupant in the same band has not moved far enough from the right edge
    TooClose {
        /// Distance of the occupant's left edge from the right edge
        gap: f32,
    },
    /// Rectangles touch
    Overlap,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpeedMismatch { reference, speed } => {
                write!(f, "speed {speed:.1} exceeds lane speed {reference:.1}")
            }
            Self::TooClose { gap } => write!(f, "previous line only {gap:.1}px in"),
            Self::Overlap => write!(f, "overlaps an active line"),
        }
    }
}

/// Area held by a scrolling line
#[derive(Debug, Clone, PartialEq)]
pub struct LaneRecord {
    /// Line holding the area
    pub line: CueLineId,
    /// Lane index
    pub lane: usize,
    /// Rectangle at spawn time
    pub rect: BoundingBox,
    /// Motion of the line, read to find its current x
    pub tween: Tween,
    /// Speed in pixels per second
    pub speed: f32,
    /// Playback time the scroll completes
    pub occupied_until: f64,
}

/// Lane occupancy and per-lane reference speeds
#[derive(Debug, Clone)]
pub struct LaneAllocator {
    config: LaneConfig,
    records: Vec<LaneRecord>,
    lane_speeds: FastMap<usize, f32>,
}

impl LaneAllocator {
    /// Create an empty allocator
    #[must_use]
    pub fn new(config: LaneConfig) -> Self {
        Self {
            config,
            records: Vec::new(),
            lane_speeds: create_hash_map(),
        }
    }

    /// Lane layout for an overlay height
    ///
    /// At least `min_lanes` lanes always exist; if they would not fit at the
    /// nominal pitch the pitch shrinks instead.
    #[must_use]
    pub fn geometry(&self, overlay_height: f32, lane_height: f32) -> LaneGeometry {
        let usable = overlay_height - self.config.vertical_reserve;
        let ideal = (usable / lane_height).floor();
        let min_lanes = self.config.min_lanes.max(1);

        if ideal < min_lanes as f32 {
            LaneGeometry {
                count: min_lanes,
                pitch: (usable / min_lanes as f32).floor(),
                top_margin: self.config.top_margin,
            }
        } else {
            LaneGeometry {
                count: ideal as usize,
                pitch: lane_height,
                top_margin: self.config.top_margin,
            }
        }
    }

    /// Choose a lane for a new line using first-fit from the top
    ///
    /// Never fails: when every lane is rejected the line goes into the last
    /// lane near the bottom edge and the placement is marked `forced`.
    #[must_use]
    pub fn place(&self, now: f64, request: &LaneRequest) -> Placement {
        let height = request.overlay.height;
        let geometry = self.geometry(height, request.lane_height);

        for lane in 0..geometry.count {
            let y = geometry.top(lane);
            if y + request.text_height + self.config.bottom_clearance > height {
                continue;
            }

            match self.check_lane(now, lane, y, request) {
                Ok(()) => {
                    return Placement {
                        lane,
                        y,
                        forced: false,
                    }
                }
                Err(reason) => trace!(lane, %reason, "lane rejected"),
            }
        }

        let margin = self.config.top_margin;
        Placement {
            lane: geometry.count - 1,
            y: (height - request.text_height - margin).max(margin),
            forced: true,
        }
    }

    /// Test one lane against every active record
    ///
    /// # Errors
    ///
    /// Returns the first rule the lane violates.
    pub fn check_lane(
        &self,
        now: f64,
        lane: usize,
        y: f32,
        request: &LaneRequest,
    ) -> Result<(), Rejection> {
        let width = request.overlay.width;
        let candidate = BoundingBox::new(
            width,
            y,
            request.text_width + self.config.band_padding,
            request.text_height + self.config.band_padding,
        );

        if let Some(&reference) = self.lane_speeds.get(&lane) {
            if request.speed > reference * (1.0 + self.config.speed_tolerance) {
                return Err(Rejection::SpeedMismatch {
                    reference,
                    speed: request.speed,
                });
            }
        }

        for record in &self.records {
            if record.rect.overlaps_vertically(&candidate) {
                let (current_x, _) = record.tween.position_at(now);
                let gap = width - current_x;
                if gap < self.config.min_clearance {
                    return Err(Rejection::TooClose { gap });
                }
                if candidate.touches(&record.rect.with_x(current_x)) {
                    return Err(Rejection::Overlap);
                }
            } else if candidate.touches(&record.rect) {
                return Err(Rejection::Overlap);
            }
        }

        Ok(())
    }

    /// Record the area a placed line holds until `occupied_until`
    ///
    /// The line's speed becomes the lane's reference speed.
    pub fn occupy(
        &mut self,
        line: CueLineId,
        placement: &Placement,
        request: &LaneRequest,
        tween: Tween,
        occupied_until: f64,
    ) {
        let rect = BoundingBox::new(
            request.overlay.width,
            placement.y,
            request.text_width + self.config.band_padding,
            request.text_height + self.config.record_padding,
        );

        self.lane_speeds.insert(placement.lane, request.speed);
        self.records.push(LaneRecord {
            line,
            lane: placement.lane,
            rect,
            tween,
            speed: request.speed,
            occupied_until,
        });
    }

    /// Drop a retired line's area
    pub fn release(&mut self, line: CueLineId) {
        let mut freed = Vec::new();
        self.records.retain(|record| {
            let keep = record.line != line;
            if !keep {
                freed.push(record.lane);
            }
            keep
        });
        self.forget_empty_lanes(&freed);
    }

    /// Drop areas whose scroll finished more than `grace` seconds ago
    pub fn prune(&mut self, now: f64, grace: f64) {
        let mut freed = Vec::new();
        self.records.retain(|record| {
            let keep = now <= record.occupied_until + grace;
            if !keep {
                freed.push(record.lane);
            }
            keep
        });
        self.forget_empty_lanes(&freed);
    }

    /// Forget all occupancy and reference speeds
    pub fn clear(&mut self) {
        self.records.clear();
        self.lane_speeds.clear();
    }

    /// Active areas in placement order
    #[must_use]
    pub fn records(&self) -> &[LaneRecord] {
        &self.records
    }

    /// Reference speed of a lane, if occupied
    #[must_use]
    pub fn reference_speed(&self, lane: usize) -> Option<f32> {
        self.lane_speeds.get(&lane).copied()
    }

    /// Number of active areas
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no area is held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn forget_empty_lanes(&mut self, lanes: &[usize]) {
        for lane in lanes {
            if !self.records.iter().any(|record| record.lane == *lane) {
                self.lane_speeds.remove(lane);
            }
        }
    }
}

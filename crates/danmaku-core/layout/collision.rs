//! Rectangle tests used by the lane allocator

/// Axis-aligned rectangle in overlay pixels
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    /// X coordinate of the box
    pub x: f32,
    /// Y coordinate of the box
    pub y: f32,
    /// Width of the box
    pub width: f32,
    /// Height of the box
    pub height: f32,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Same box moved to a new x
    #[must_use]
    pub const fn with_x(self, x: f32) -> Self {
        Self { x, ..self }
    }

    /// Check if the vertical spans overlap; shared edges count
    #[must_use]
    pub fn overlaps_vertically(&self, other: &Self) -> bool {
        !(self.y + self.height < other.y || other.y + other.height < self.y)
    }

    /// Check if this box touches or intersects another
    ///
    /// Boxes sharing only an edge are considered overlapping, so lines are
    /// never placed flush against each other.
    #[must_use]
    pub fn touches(&self, other: &Self) -> bool {
        !(self.x + self.width < other.x
            || other.x + other.width < self.x
            || self.y + self.height < other.y
            || other.y + other.height < self.y)
    }
}

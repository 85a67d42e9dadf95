//! Lane allocation and collision resolution
//!
//! Scrolling lines are stacked into horizontal lanes, scanned first-fit from
//! the top. A lane is rejected when the new line would outrun the lane's
//! latest occupant, when an occupant in the same band has not yet moved far
//! enough in from the right edge, or when rectangles touch. If nothing
//! passes, the line is forced into the last lane rather than dropped.

mod collision;
mod lanes;

pub use collision::BoundingBox;
pub use lanes::{LaneAllocator, LaneGeometry, LaneRecord, LaneRequest, Placement, Rejection};

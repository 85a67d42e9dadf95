//! Movement tag handler (`\move`)
//!
//! Only the two endpoints are used. The optional `t1,t2` timing pair is
//! accepted for compatibility but ignored: authored movement always spans
//! the whole cue.

/// Authored movement between two points in script coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Movement {
    /// Start x
    pub x1: f32,
    /// Start y
    pub y1: f32,
    /// End x
    pub x2: f32,
    /// End y
    pub y2: f32,
}

/// Parse `(x1,y1,x2,y2[,t1,t2])`
pub(super) fn parse_move(args: &str) -> Option<Movement> {
    let inner = args.strip_prefix('(')?.strip_suffix(')')?;
    let parts: Vec<f32> = inner
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .ok()?;

    match parts.as_slice() {
        [x1, y1, x2, y2] | [x1, y1, x2, y2, _, _] => Some(Movement {
            x1: *x1,
            y1: *y1,
            x2: *x2,
            y2: *y2,
        }),
        _ => None,
    }
}

//! Color and alpha tag handlers
//!
//! Colors use the reversed `&HBBGGRR&` byte order; alpha values are
//! inverted (`00` opaque, `FF` transparent) and become a fixed opacity.

use crate::utils::{parse_alpha_opacity, parse_bgr_color};

/// Parse the argument of `\c` / `\1c` into RGB
pub(super) fn parse_primary(args: &str) -> Option<[u8; 3]> {
    if !(args.starts_with("&H") || args.starts_with("&h")) || !args.ends_with('&') {
        return None;
    }
    parse_bgr_color(args).ok()
}

/// Parse the argument of `\alpha` into an opacity
pub(super) fn parse_alpha(args: &str) -> Option<f32> {
    parse_alpha_opacity(args).ok()
}

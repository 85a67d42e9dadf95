//! Utility functions and shared types for the danmaku core
//!
//! Contains the value parsers used by the cue parser and the override-tag
//! interpreter (timestamps, BGR colors, alpha bytes) plus the hashing helpers
//! backing the tracker and lane tables.
//!
//! # Example
//!
//! ```rust
//! use danmaku_core::utils::{parse_ass_time, parse_bgr_color};
//!
//! assert_eq!(parse_ass_time("0:00:01.50")?, 1.5);
//! assert_eq!(parse_bgr_color("&H0000FF&")?, [255, 0, 0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod errors;
pub mod hashers;

pub use errors::CoreError;
pub use hashers::{create_hash_map, create_hash_set};

/// Parse ASS time format (`H:MM:SS.CC`) to seconds
///
/// Hours may have any number of digits, minutes and seconds one or two,
/// and the fractional part must be exactly two digits of centiseconds.
/// Surrounding whitespace is ignored.
///
/// # Example
///
/// ```rust
/// # use danmaku_core::utils::parse_ass_time;
/// assert!((parse_ass_time("1:02:03.45")? - 3723.45).abs() < 1e-9);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// # Errors
///
/// Returns [`CoreError::InvalidTime`] if the field does not match the pattern.
pub fn parse_ass_time(time_str: &str) -> Result<f64, CoreError> {
    let trimmed = time_str.trim();
    let mut parts = trimmed.splitn(3, ':');

    let (Some(hours), Some(minutes), Some(rest)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(CoreError::invalid_time(time_str, "expected H:MM:SS.CC"));
    };

    let Some((seconds, centiseconds)) = rest.split_once('.') else {
        return Err(CoreError::invalid_time(time_str, "missing centiseconds"));
    };

    let hours = parse_digits(hours, 1..=usize::MAX)
        .ok_or_else(|| CoreError::invalid_time(time_str, "invalid hours"))?;
    let minutes = parse_digits(minutes, 1..=2)
        .ok_or_else(|| CoreError::invalid_time(time_str, "invalid minutes"))?;
    let seconds = parse_digits(seconds, 1..=2)
        .ok_or_else(|| CoreError::invalid_time(time_str, "invalid seconds"))?;
    let centiseconds = parse_digits(centiseconds, 2..=2)
        .ok_or_else(|| CoreError::invalid_time(time_str, "centiseconds must be two digits"))?;

    Ok(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds as f64 + centiseconds as f64 / 100.0)
}

/// Parse an all-digit field whose length lies in `len`
fn parse_digits(field: &str, len: core::ops::RangeInclusive<usize>) -> Option<u64> {
    if !len.contains(&field.len()) || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Format seconds back to ASS time format
///
/// Rounds to the nearest centisecond. Used for diagnostics output.
#[must_use]
pub fn format_ass_time(seconds: f64) -> String {
    let total_cs = (seconds.max(0.0) * 100.0).round() as u64;
    let hours = total_cs / 360_000;
    let remainder = total_cs % 360_000;
    let minutes = remainder / 6000;
    let remainder = remainder % 6000;
    let secs = remainder / 100;
    let cs = remainder % 100;

    format!("{hours}:{minutes:02}:{secs:02}.{cs:02}")
}

/// Parse ASS BGR color format to RGB bytes
///
/// Accepts exactly six hex digits, optionally wrapped as `&HBBGGRR&`. The
/// digits are read as blue, green, red pairs: characters 0..2 are blue,
/// 2..4 green and 4..6 red, so `0000FF` decodes to pure red.
///
/// # Example
///
/// ```rust
/// # use danmaku_core::utils::parse_bgr_color;
/// assert_eq!(parse_bgr_color("&HFF0000&")?, [0, 0, 255]);
/// assert_eq!(parse_bgr_color("00FF00")?, [0, 255, 0]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// # Errors
///
/// Returns an error if the value is not six hex digits.
pub fn parse_bgr_color(color_str: &str) -> Result<[u8; 3], CoreError> {
    let trimmed = color_str.trim();
    let hex_part = trimmed
        .strip_prefix("&H")
        .or_else(|| trimmed.strip_prefix("&h"))
        .map_or(trimmed, |rest| rest.strip_suffix('&').unwrap_or(rest));

    if hex_part.len() != 6 || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CoreError::invalid_color(color_str));
    }

    let byte_at = |offset: usize| {
        u8::from_str_radix(&hex_part[offset..offset + 2], 16)
            .map_err(|_| CoreError::invalid_color(color_str))
    };

    let blue = byte_at(0)?;
    let green = byte_at(2)?;
    let red = byte_at(4)?;

    Ok([red, green, blue])
}

/// Parse an ASS alpha value (`&Hxx&`) into an opacity in `0.0..=1.0`
///
/// ASS alpha is inverted: `00` is opaque and `FF` fully transparent. Any
/// number of hex digits is accepted; values above `FF` clamp to transparent.
///
/// # Errors
///
/// Returns an error if no hex digits are present.
pub fn parse_alpha_opacity(alpha_str: &str) -> Result<f32, CoreError> {
    let trimmed = alpha_str.trim();
    let hex = trimmed
        .strip_prefix("&H")
        .or_else(|| trimmed.strip_prefix("&h"))
        .ok_or_else(|| CoreError::invalid_color(alpha_str))?;
    let hex = hex.strip_suffix('&').unwrap_or(hex);

    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CoreError::invalid_color(alpha_str));
    }

    let alpha = u32::from_str_radix(hex, 16).unwrap_or(u32::MAX);
    let opacity = (255.0 - alpha as f32) / 255.0;
    Ok(opacity.clamp(0.0, 1.0))
}

//! Formatting tag handlers (`\b`, `\i`, `\u`, `\s`)
//!
//! Italic, underline and strike-out take `0` or `1`. Bold additionally
//! accepts a font weight, where 700 and above count as bold.

use super::OverrideTag;

bitflags::bitflags! {
    /// Text formatting applied to a whole cue-line
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct TextFormatting: u8 {
        /// Bold text formatting
        const BOLD = 1 << 0;
        /// Italic text formatting
        const ITALIC = 1 << 1;
        /// Underline text formatting
        const UNDERLINE = 1 << 2;
        /// Strike-through text formatting
        const STRIKE_OUT = 1 << 3;
    }
}

/// Fold one formatting directive into `flags`
pub(super) fn apply(tag: OverrideTag<'_>, flags: &mut TextFormatting) {
    let flag = match tag.name {
        "b" => TextFormatting::BOLD,
        "i" => TextFormatting::ITALIC,
        "u" => TextFormatting::UNDERLINE,
        "s" => TextFormatting::STRIKE_OUT,
        _ => return,
    };

    if let Some(enabled) = toggle_value(tag.name, tag.args) {
        flags.set(flag, enabled);
    }
}

fn toggle_value(name: &str, args: &str) -> Option<bool> {
    match args {
        "0" => Some(false),
        "1" => Some(true),
        weight if name == "b" => weight.parse::<u32>().ok().map(|w| w >= 700),
        _ => None,
    }
}

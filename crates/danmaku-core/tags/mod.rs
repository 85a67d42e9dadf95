//! Override-tag interpretation for cue-lines
//!
//! Every `{...}` block is removed from the visible text. The directives
//! inside are tokenized into `\name args` pairs and folded into a
//! [`LineMarkup`]: formatting flags, a primary color, a fixed opacity and an
//! optional authored movement. Unrecognized directives are dropped silently.
//!
//! # Supported Tags
//!
//! - `b`, `i`, `u`, `s`: bold, italic, underline, strike-out
//! - `c` / `1c`: primary color (`&HBBGGRR&`)
//! - `alpha`: whole-line transparency (`&Hxx&`)
//! - `move`: authored movement (`x1,y1,x2,y2[,t1,t2]`)
//!
//! # Example
//!
//! ```rust
//! use danmaku_core::tags::{interpret_line, TextFormatting};
//!
//! let markup = interpret_line(r"{\b1}Hi{\c&H0000FF&}There");
//! assert_eq!(markup.text, "HiThere");
//! assert!(markup.formatting.contains(TextFormatting::BOLD));
//! assert_eq!(markup.color, Some([255, 0, 0]));
//! ```

mod color;
mod formatting;
mod position;

pub use formatting::TextFormatting;
pub use position::Movement;

use smallvec::SmallVec;

/// Presentation attributes extracted from one cue-line
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineMarkup {
    /// Visible text with every override block stripped, trimmed
    pub text: String,
    /// Formatting flags
    pub formatting: TextFormatting,
    /// Primary color override as RGB
    pub color: Option<[u8; 3]>,
    /// Fixed opacity for the line's whole lifetime
    pub opacity: Option<f32>,
    /// Authored movement in script coordinates
    pub movement: Option<Movement>,
}

impl LineMarkup {
    /// Markup for plain text without overrides
    #[must_use]
    pub fn plain(text: &str) -> Self {
        Self {
            text: text.trim().to_string(),
            formatting: TextFormatting::empty(),
            color: None,
            opacity: None,
            movement: None,
        }
    }
}

/// A single `\name args` directive inside an override block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideTag<'a> {
    /// Tag name such as `b`, `1c` or `move`
    pub name: &'a str,
    /// Raw argument text following the name
    pub args: &'a str,
}

/// Strip override blocks from a cue-line and collect their directives
///
/// An unterminated `{` is kept as literal text. Later directives win over
/// earlier ones for the same attribute.
#[must_use]
pub fn interpret_line(line: &str) -> LineMarkup {
    let mut markup = LineMarkup::plain("");
    let mut visible = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        visible.push_str(&rest[..open]);
        for tag in override_tags(&rest[open + 1..open + close]) {
            apply_tag(tag, &mut markup);
        }
        rest = &rest[open + close + 1..];
    }
    visible.push_str(rest);

    markup.text = visible.trim().to_string();
    markup
}

/// Tokenize the inside of one override block
#[must_use]
pub fn override_tags(block: &str) -> SmallVec<[OverrideTag<'_>; 4]> {
    block
        .split('\\')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(|piece| {
            let name_len = tag_name_len(piece);
            OverrideTag {
                name: &piece[..name_len],
                args: piece[name_len..].trim(),
            }
        })
        .collect()
}

/// Length of the tag name at the start of a directive
///
/// Names are a run of ASCII letters, optionally preceded by a single digit
/// for the indexed color and alpha tags (`1c`, `3a`).
fn tag_name_len(piece: &str) -> usize {
    let bytes = piece.as_bytes();
    let digit_prefix = usize::from(
        bytes.len() > 1 && bytes[0].is_ascii_digit() && bytes[1].is_ascii_alphabetic(),
    );
    digit_prefix
        + bytes[digit_prefix..]
            .iter()
            .take_while(|b| b.is_ascii_alphabetic())
            .count()
}

fn apply_tag(tag: OverrideTag<'_>, markup: &mut LineMarkup) {
    match tag.name {
        "b" | "i" | "u" | "s" => formatting::apply(tag, &mut markup.formatting),
        "c" | "1c" => {
            if let Some(rgb) = color::parse_primary(tag.args) {
                markup.color = Some(rgb);
            }
        }
        "alpha" => {
            if let Some(opacity) = color::parse_alpha(tag.args) {
                markup.opacity = Some(opacity);
            }
        }
        "move" => {
            if let Some(movement) = position::parse_move(tag.args) {
                markup.movement = Some(movement);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_blocks_and_applies_style() {
        let markup = interpret_line(r"{\b1}Hi{\c&H0000FF&}There");
        assert_eq!(markup.text, "HiThere");
        assert_eq!(markup.formatting, TextFormatting::BOLD);
        assert_eq!(markup.color, Some([255, 0, 0]));
        assert_eq!(markup.opacity, None);
        assert_eq!(markup.movement, None);
    }

    #[test]
    fn unknown_directives_are_removed_without_effect() {
        let markup = interpret_line(r"{\fnArial\fs20\bord2\shad1\an8}  Plain text ");
        assert_eq!(markup, LineMarkup::plain("Plain text"));
    }

    #[test]
    fn unterminated_block_stays_visible() {
        let markup = interpret_line(r"{\i1}open {brace");
        assert_eq!(markup.text, "open {brace");
        assert!(markup.formatting.contains(TextFormatting::ITALIC));
    }

    #[test]
    fn collects_all_formatting_flags() {
        let markup = interpret_line(r"{\b1\i1}{\u1\s1}x");
        assert_eq!(markup.formatting, TextFormatting::all());

        let markup = interpret_line(r"{\b1}x{\b0}");
        assert!(markup.formatting.is_empty());
    }

    #[test]
    fn reads_alpha_and_movement() {
        let markup = interpret_line(r"{\move(10,20,300,40)\alpha&H80&}Flying");
        assert_eq!(markup.text, "Flying");
        assert_eq!(
            markup.movement,
            Some(Movement {
                x1: 10.0,
                y1: 20.0,
                x2: 300.0,
                y2: 40.0,
            })
        );
        let opacity = markup.opacity.unwrap();
        assert!((opacity - 127.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn tokenizes_indexed_tags() {
        let tags = override_tags(r"\1c&HFFFFFF&\3a&H00&\pos(1,2)");
        let names: Vec<_> = tags.iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["1c", "3a", "pos"]);
        assert_eq!(tags[2].args, "(1,2)");
    }

    #[test]
    fn eight_digit_color_is_ignored() {
        let markup = interpret_line(r"{\c&H00FF00FF&}x");
        assert_eq!(markup.color, None);
    }
}

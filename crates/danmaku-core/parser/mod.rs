//! ASS cue parser
//!
//! Turns raw ASS text into the ordered cue sequence the engine plays. Only
//! the `[Events]` section is read; `Dialogue:` lines are split on commas with
//! fields 1, 2 and 3 holding start, end and style, and everything from field
//! 9 onwards rejoined as the text (dialogue text may itself contain commas).
//!
//! Bad lines are skipped, never fatal. Each skip is recorded as a
//! [`ParseIssue`] on the [`ParseOutcome`].
//!
//! # Example
//!
//! ```rust
//! use danmaku_core::parser::parse_script;
//!
//! let outcome = parse_script(
//!     "[Events]\nDialogue: 0,0:00:01.50,0:00:03.00,Default,,0,0,0,,Hello,World\n",
//! );
//! assert_eq!(outcome.cues.len(), 1);
//! assert_eq!(outcome.cues[0].text, "Hello,World");
//! assert_eq!(outcome.cues[0].start, 1.5);
//! ```

mod issues;

pub use issues::{IssueKind, ParseIssue};

use crate::utils::parse_ass_time;

/// Minimum number of comma-separated fields in a usable `Dialogue:` line
pub const MIN_DIALOGUE_FIELDS: usize = 10;

/// Index of the first text field; later fields are rejoined with commas
const TEXT_FIELD: usize = 9;

/// One parsed dialogue entry
///
/// Immutable once parsed. `text` may contain real newlines (converted from
/// `\N`) and `{...}` override blocks.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cue {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds, never before `start`
    pub end: f64,
    /// Dialogue text with `\N` converted to `\n`
    pub text: String,
    /// Style name
    pub style: String,
}

impl Cue {
    /// Length of the activation window in seconds
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `time` falls inside the inclusive window `[start, end]`
    #[must_use]
    pub fn is_active_at(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }

    /// Displayable lines of the cue with their index inside the text
    ///
    /// Blank lines are skipped but still counted, so indices stay stable
    /// with respect to the original line breaks.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.text
            .split('\n')
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
    }
}

/// Result of scanning an ASS document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    /// Cues sorted ascending by start, ties in file order
    pub cues: Vec<Cue>,
    /// Dialogue lines that were skipped, in file order
    pub issues: Vec<ParseIssue>,
}

/// Scan ASS text and collect every well-formed `Dialogue:` line
///
/// Never fails; an empty `cues` list is for the caller to treat as a
/// content error (see [`crate::store::CueStore::parse`]).
#[must_use]
pub fn parse_script(source: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    let mut in_events = false;

    for (idx, raw_line) in source.split('\n').enumerate() {
        let line = raw_line.trim();
        let line_number = idx + 1;

        if line == "[Events]" {
            in_events = true;
            continue;
        }
        if line.starts_with('[') {
            in_events = false;
            continue;
        }

        if in_events && line.starts_with("Dialogue:") {
            match parse_dialogue(line, line_number) {
                Ok(cue) => outcome.cues.push(cue),
                Err(issue) => outcome.issues.push(issue),
            }
        }
    }

    // `sort_by` is stable, so equal starts keep declaration order
    outcome.cues.sort_by(|a, b| a.start.total_cmp(&b.start));
    outcome
}

/// Parse a single `Dialogue:` line into a cue
fn parse_dialogue(line: &str, line_number: usize) -> Result<Cue, ParseIssue> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < MIN_DIALOGUE_FIELDS {
        return Err(ParseIssue::skipped(
            IssueKind::TooFewFields,
            line_number,
            format!(
                "expected at least {MIN_DIALOGUE_FIELDS} fields, found {}",
                fields.len()
            ),
        ));
    }

    let start = parse_ass_time(fields[1]);
    let end = parse_ass_time(fields[2]);
    let style = fields[3].trim();
    let text = fields[TEXT_FIELD..].join(",").replace("\\N", "\n");
    let text = text.trim();

    let (start, end) = match (start, end) {
        (Ok(start), Ok(end)) => (start, end),
        (Err(err), _) | (_, Err(err)) => {
            return Err(ParseIssue::skipped(
                IssueKind::InvalidTime,
                line_number,
                err.to_string(),
            ));
        }
    };

    if text.is_empty() {
        return Err(ParseIssue::skipped(
            IssueKind::EmptyText,
            line_number,
            String::from("dialogue text is empty"),
        ));
    }

    if end < start {
        return Err(ParseIssue::skipped(
            IssueKind::NegativeDuration,
            line_number,
            format!("end {end:.2}s precedes start {start:.2}s"),
        ));
    }

    Ok(Cue {
        start,
        end,
        text: text.to_string(),
        style: style.to_string(),
    })
}

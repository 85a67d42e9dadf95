//! Immutable cue store with time-window lookup
//!
//! Holds the sorted cue list produced by the parser and answers "which cues
//! are active at `t`". Lookup is a binary search over start times bounded
//! below by the longest cue duration, followed by an exact inclusive filter,
//! so results match a linear `start <= t <= end` scan in the same order.

use crate::{
    parser::{parse_script, Cue, ParseIssue},
    utils::CoreError,
};

/// Tolerance applied to the lower search bound
const SEARCH_EPSILON: f64 = 1e-6;

/// Parsed cues for one video
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CueStore {
    cues: Vec<Cue>,
    issues: Vec<ParseIssue>,
    max_duration: f64,
}

impl CueStore {
    /// Parse ASS text into a store
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyContent`] if the text yields no cues.
    pub fn parse(video_id: &str, source: &str) -> Result<Self, CoreError> {
        let outcome = parse_script(source);
        if outcome.cues.is_empty() {
            return Err(CoreError::empty_content(video_id));
        }

        let mut store = Self::from_cues(outcome.cues);
        store.issues = outcome.issues;
        Ok(store)
    }

    /// Build a store from already-parsed cues
    ///
    /// Cues are stable-sorted by start, so ties keep the given order.
    #[must_use]
    pub fn from_cues(mut cues: Vec<Cue>) -> Self {
        cues.sort_by(|a, b| a.start.total_cmp(&b.start));
        let max_duration = cues.iter().map(Cue::duration).fold(0.0, f64::max);
        Self {
            cues,
            issues: Vec::new(),
            max_duration,
        }
    }

    /// All cues in start order
    #[must_use]
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Cue at an index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Cue> {
        self.cues.get(index)
    }

    /// Lines skipped while parsing
    #[must_use]
    pub fn issues(&self) -> &[ParseIssue] {
        &self.issues
    }

    /// Number of cues
    #[must_use]
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Whether the store holds no cues
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Longest cue duration, the look-behind of the interval search
    #[must_use]
    pub const fn max_duration(&self) -> f64 {
        self.max_duration
    }

    /// Cues with `start <= time <= end`, with their store index, in order
    pub fn active_cues(&self, time: f64) -> impl Iterator<Item = (usize, &Cue)> + '_ {
        let upper = self.cues.partition_point(|cue| cue.start <= time);
        let earliest = time - self.max_duration - SEARCH_EPSILON;
        let lower = self.cues[..upper].partition_point(|cue| cue.start < earliest);

        self.cues[lower..upper]
            .iter()
            .enumerate()
            .map(move |(offset, cue)| (lower + offset, cue))
            .filter(move |(_, cue)| cue.is_active_at(time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cue(start: f64, end: f64, text: &str) -> Cue {
        Cue {
            start,
            end,
            text: text.to_string(),
            style: String::from("Default"),
        }
    }

    fn active_texts(store: &CueStore, time: f64) -> Vec<&str> {
        store
            .active_cues(time)
            .map(|(_, cue)| cue.text.as_str())
            .collect()
    }

    #[test]
    fn endpoints_are_inclusive() {
        let store = CueStore::from_cues(vec![cue(1.0, 2.0, "a")]);
        assert_eq!(active_texts(&store, 0.99), Vec::<&str>::new());
        assert_eq!(active_texts(&store, 1.0), vec!["a"]);
        assert_eq!(active_texts(&store, 2.0), vec!["a"]);
        assert_eq!(active_texts(&store, 2.01), Vec::<&str>::new());
    }

    #[test]
    fn long_cue_is_found_behind_short_ones() {
        let store = CueStore::from_cues(vec![
            cue(0.0, 100.0, "long"),
            cue(10.0, 11.0, "short"),
            cue(50.0, 51.0, "later"),
        ]);
        assert_eq!(active_texts(&store, 50.5), vec!["long", "later"]);
        assert_eq!(store.max_duration(), 100.0);
    }

    #[test]
    fn indices_refer_to_sorted_order() {
        let store = CueStore::from_cues(vec![cue(5.0, 6.0, "b"), cue(1.0, 6.0, "a")]);
        let indices: Vec<_> = store.active_cues(5.5).map(|(idx, _)| idx).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(store.get(0).map(|c| c.text.as_str()), Some("a"));
    }

    #[test]
    fn empty_document_is_a_content_error() {
        let err = CueStore::parse("vid", "[Events]\n").unwrap_err();
        assert!(err.is_content_error());
    }

    #[test]
    fn keeps_parse_issues() {
        let store = CueStore::parse(
            "vid",
            "[Events]\nDialogue: 0,0:00:01.00,0:00:02.00,Default,,0,0,0,,ok\nDialogue: broken\n",
        )
        .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.issues().len(), 1);
    }
}

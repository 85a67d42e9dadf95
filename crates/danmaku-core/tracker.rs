//! Render-state bookkeeping
//!
//! Guarantees a cue-line is materialized at most once per activation episode
//! and torn down exactly once. Two structures cooperate:
//!
//! - the **active set** of materialized lines, each retired once playback
//!   passes `end + retire_grace`
//! - the **bucket table**, keyed by start time rounded to a tenth of a
//!   second, remembering which lines were already shown in the current pass
//!
//! A jump of more than `seek_threshold` seconds between ticks clears the
//! bucket table (not the active set) so lines can replay after a seek.

use core::fmt;

use tracing::info;

use crate::{
    config::TrackerConfig,
    host::VisualHandle,
    utils::hashers::{create_hash_map, create_hash_set, FastMap, FastSet},
};

/// Identity of one displayable line within a loaded cue store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CueLineId {
    /// Index of the cue in the store
    pub cue: usize,
    /// Line index within the cue text, counting blank lines
    pub line: usize,
}

impl fmt::Display for CueLineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.cue, self.line)
    }
}

/// A materialized line awaiting retirement
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveLine {
    /// Line identity
    pub id: CueLineId,
    /// Cue end time
    pub end: f64,
    /// Bucket the line was recorded in
    pub bucket: i64,
    /// Host element, `None` if creation failed
    pub handle: Option<VisualHandle>,
}

/// Active set plus bucket table
#[derive(Debug, Clone)]
pub struct RenderTracker {
    config: TrackerConfig,
    active: Vec<ActiveLine>,
    buckets: FastMap<i64, FastSet<CueLineId>>,
    last_tick: Option<f64>,
}

impl RenderTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            active: Vec::new(),
            buckets: create_hash_map(),
            last_tick: None,
        }
    }

    /// Bucket key for a cue start time
    #[must_use]
    pub fn bucket_key(&self, start: f64) -> i64 {
        (start * self.config.bucket_precision).round() as i64
    }

    /// Advance to `time`, returning whether the step counts as a seek
    ///
    /// Drops buckets more than `bucket_ttl` seconds behind `time`. The very
    /// first observation never counts as a seek.
    pub fn observe(&mut self, time: f64) -> bool {
        let precision = self.config.bucket_precision;
        let ttl = self.config.bucket_ttl;
        self.buckets.retain(|key, _| time - *key as f64 / precision <= ttl);

        let seek = self
            .last_tick
            .is_some_and(|last| (time - last).abs() > self.config.seek_threshold);
        if seek {
            info!(
                from = self.last_tick.unwrap_or_default(),
                to = time,
                "time jump detected, clearing displayed buckets"
            );
            self.buckets.clear();
        }

        self.last_tick = Some(time);
        seek
    }

    /// Whether a line may be materialized now
    #[must_use]
    pub fn should_materialize(&self, id: CueLineId, start: f64) -> bool {
        if self.is_active(id) {
            return false;
        }
        !self
            .buckets
            .get(&self.bucket_key(start))
            .is_some_and(|shown| shown.contains(&id))
    }

    /// Record a materialized line
    pub fn mark_materialized(
        &mut self,
        id: CueLineId,
        start: f64,
        end: f64,
        handle: Option<VisualHandle>,
    ) {
        let bucket = self.bucket_key(start);
        self.buckets
            .entry(bucket)
            .or_insert_with(create_hash_set)
            .insert(id);
        self.active.push(ActiveLine {
            id,
            end,
            bucket,
            handle,
        });
    }

    /// Remove and return every line with `time > end + retire_grace`
    ///
    /// Retired lines also leave their bucket, so a later pass can show them
    /// again.
    pub fn retire_due(&mut self, time: f64) -> Vec<ActiveLine> {
        let grace = self.config.retire_grace;
        let (retired, kept): (Vec<_>, Vec<_>) = core::mem::take(&mut self.active)
            .into_iter()
            .partition(|line| time > line.end + grace);
        self.active = kept;
        self.forget(&retired);
        retired
    }

    /// Remove and return every active line
    ///
    /// The lines also leave their buckets, so they materialize again on the
    /// next tick that finds them active.
    pub fn clear_active(&mut self) -> Vec<ActiveLine> {
        let cleared = core::mem::take(&mut self.active);
        self.forget(&cleared);
        cleared
    }

    fn forget(&mut self, lines: &[ActiveLine]) {
        for line in lines {
            if let Some(shown) = self.buckets.get_mut(&line.bucket) {
                shown.remove(&line.id);
                if shown.is_empty() {
                    self.buckets.remove(&line.bucket);
                }
            }
        }
    }

    /// Forget everything, including the last observed time
    pub fn reset(&mut self) -> Vec<ActiveLine> {
        self.buckets.clear();
        self.last_tick = None;
        self.clear_active()
    }

    /// Whether a line is currently materialized
    #[must_use]
    pub fn is_active(&self, id: CueLineId) -> bool {
        self.active.iter().any(|line| line.id == id)
    }

    /// Materialized lines in creation order
    #[must_use]
    pub fn active(&self) -> &[ActiveLine] {
        &self.active
    }

    /// Number of live buckets
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Last observed playback time
    #[must_use]
    pub const fn last_tick(&self) -> Option<f64> {
        self.last_tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tracker() -> RenderTracker {
        RenderTracker::new(TrackerConfig::default())
    }

    const LINE: CueLineId = CueLineId { cue: 0, line: 0 };

    #[test]
    fn buckets_round_to_a_tenth() {
        let tracker = tracker();
        assert_eq!(tracker.bucket_key(5.04), 50);
        assert_eq!(tracker.bucket_key(5.06), 51);
    }

    #[test]
    fn seek_only_on_large_jumps() {
        let mut tracker = tracker();
        tracker.mark_materialized(LINE, 5.0, 6.0, None);

        let seeks: Vec<bool> = [5.0, 5.1, 5.2].iter().map(|t| tracker.observe(*t)).collect();
        assert_eq!(seeks, vec![false, false, false]);
        assert_eq!(tracker.bucket_count(), 1);

        assert!(tracker.observe(40.0));
        assert_eq!(tracker.bucket_count(), 0);
        assert!(tracker.is_active(LINE));
    }

    #[test]
    fn backward_jump_is_a_seek() {
        let mut tracker = tracker();
        tracker.observe(30.0);
        assert!(tracker.observe(10.0));
        assert_eq!(tracker.last_tick(), Some(10.0));
    }

    #[test]
    fn materializes_once_per_bucket() {
        let mut tracker = tracker();
        assert!(tracker.should_materialize(LINE, 5.0));
        tracker.mark_materialized(LINE, 5.0, 6.0, None);
        assert!(!tracker.should_materialize(LINE, 5.0));

    }

    #[test]
    fn clearing_releases_buckets() {
        let mut tracker = tracker();
        tracker.mark_materialized(LINE, 5.0, 6.0, None);
        tracker.mark_materialized(CueLineId { cue: 1, line: 0 }, 5.0, 9.0, None);

        let cleared = tracker.clear_active();
        assert_eq!(cleared.len(), 2);
        assert_eq!(tracker.bucket_count(), 0);
        assert!(tracker.should_materialize(LINE, 5.0));
    }

    #[test]
    fn retires_strictly_after_grace() {
        let mut tracker = tracker();
        tracker.mark_materialized(LINE, 5.0, 6.0, Some(VisualHandle::new(1)));

        assert!(tracker.retire_due(6.5).is_empty());
        let retired = tracker.retire_due(6.51);
        assert_eq!(retired.len(), 1);
        assert_eq!(retired[0].handle, Some(VisualHandle::new(1)));
        assert!(tracker.active().is_empty());
        assert!(tracker.should_materialize(LINE, 5.0));
    }

    #[test]
    fn stale_buckets_are_collected() {
        let mut tracker = tracker();
        tracker.mark_materialized(LINE, 1.0, 2.0, None);
        tracker.observe(11.0);
        assert_eq!(tracker.bucket_count(), 1);
        tracker.observe(11.5);
        assert_eq!(tracker.bucket_count(), 0);
    }
}

//! Playback time sources
//!
//! The engine is driven by whatever can report "where is playback now".
//! [`PlayerClock`] asks the embedding player and is polled every 100 ms;
//! [`WallClock`] approximates playback with elapsed wall time and is polled
//! every 500 ms when no player is available.

use core::fmt;
use std::time::{Duration, Instant};

use crate::utils::CoreError;

/// Precision class of a time source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClockMode {
    /// Real player position
    Precise,
    /// Elapsed wall-clock approximation
    Fallback,
}

impl ClockMode {
    /// Polling cadence for this mode
    #[must_use]
    pub const fn poll_interval(self) -> Duration {
        match self {
            Self::Precise => Duration::from_millis(100),
            Self::Fallback => Duration::from_millis(500),
        }
    }
}

impl fmt::Display for ClockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Precise => write!(f, "precise"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Anything that can report the current playback time
pub trait TimeSource: Send {
    /// Current playback position in seconds
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Clock`] if the position is unknown right now;
    /// the tick is skipped and the source asked again next time.
    fn current_time(&mut self) -> Result<f64, CoreError>;

    /// Precision class of this source
    fn mode(&self) -> ClockMode;

    /// How often to poll this source
    fn poll_interval(&self) -> Duration {
        self.mode().poll_interval()
    }
}

/// Player-backed time source
///
/// Wraps a probe returning the player's position, or `None` while the
/// player cannot answer (not ready, buffering an ad).
pub struct PlayerClock<F> {
    probe: F,
}

impl<F> PlayerClock<F>
where
    F: FnMut() -> Option<f64> + Send,
{
    /// Poll `probe` for the playback position
    pub const fn new(probe: F) -> Self {
        Self { probe }
    }
}

impl<F> fmt::Debug for PlayerClock<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerClock").finish_non_exhaustive()
    }
}

impl<F> TimeSource for PlayerClock<F>
where
    F: FnMut() -> Option<f64> + Send,
{
    fn current_time(&mut self) -> Result<f64, CoreError> {
        match (self.probe)() {
            Some(time) if time.is_finite() => Ok(time),
            Some(time) => Err(CoreError::Clock(format!("player reported {time}"))),
            None => Err(CoreError::Clock(String::from(
                "player did not report a position",
            ))),
        }
    }

    fn mode(&self) -> ClockMode {
        ClockMode::Precise
    }
}

/// Wall-clock time source for when no player is available
#[derive(Debug, Clone)]
pub struct WallClock {
    started: Instant,
    offset: f64,
}

impl WallClock {
    /// Start counting from zero now
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    /// Start counting from `offset` seconds now
    #[must_use]
    pub fn starting_at(offset: f64) -> Self {
        Self {
            started: Instant::now(),
            offset,
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for WallClock {
    fn current_time(&mut self) -> Result<f64, CoreError> {
        Ok(self.offset + self.started.elapsed().as_secs_f64())
    }

    fn mode(&self) -> ClockMode {
        ClockMode::Fallback
    }
}

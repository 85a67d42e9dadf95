//! Async polling driver
//!
//! Runs a [`SubtitleEngine`] as a single task: one `tokio::select!` loop
//! serves both the polling interval and host commands, so ticks never
//! overlap and a command is always handled between two ticks. Switching
//! the time source replaces the interval in place; the old cadence is gone
//! before the new one fires.
//!
//! ```rust,no_run
//! # async fn demo<O: danmaku_core::host::Overlay>(engine: danmaku_core::SubtitleEngine<O>) {
//! use danmaku_core::{clock::WallClock, driver::Driver};
//!
//! let (driver, handle) = Driver::new(engine, Box::new(WallClock::new()));
//! let task = driver.run();
//! handle.toggle_visibility().await.ok();
//! handle.stop().await.ok();
//! let _engine = task.await;
//! # }
//! ```

use core::fmt;

use tokio::{
    sync::mpsc,
    time::{interval, Interval, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::{clock::TimeSource, engine::SubtitleEngine, host::Overlay, utils::CoreError};

/// Queue depth of the command channel
const COMMAND_CAPACITY: usize = 16;

/// Commands accepted by a running driver
pub enum DriverCommand {
    /// Show or hide subtitles
    ToggleVisibility,
    /// The overlay changed size
    Resize,
    /// Poll a different time source from now on
    SwitchClock(Box<dyn TimeSource>),
    /// Tear everything down and return the engine
    Stop,
}

impl fmt::Debug for DriverCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToggleVisibility => write!(f, "ToggleVisibility"),
            Self::Resize => write!(f, "Resize"),
            Self::SwitchClock(clock) => write!(f, "SwitchClock({})", clock.mode()),
            Self::Stop => write!(f, "Stop"),
        }
    }
}

/// Sending side of a driver
#[derive(Debug, Clone)]
pub struct DriverHandle {
    commands: mpsc::Sender<DriverCommand>,
}

impl DriverHandle {
    /// Queue a command
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Clock`] if the driver has already stopped.
    pub async fn send(&self, command: DriverCommand) -> Result<(), CoreError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CoreError::Clock(String::from("polling driver has stopped")))
    }

    /// Show or hide subtitles
    ///
    /// # Errors
    ///
    /// Returns an error if the driver has stopped.
    pub async fn toggle_visibility(&self) -> Result<(), CoreError> {
        self.send(DriverCommand::ToggleVisibility).await
    }

    /// Report an overlay resize
    ///
    /// # Errors
    ///
    /// Returns an error if the driver has stopped.
    pub async fn resize(&self) -> Result<(), CoreError> {
        self.send(DriverCommand::Resize).await
    }

    /// Replace the time source
    ///
    /// # Errors
    ///
    /// Returns an error if the driver has stopped.
    pub async fn switch_clock(&self, clock: Box<dyn TimeSource>) -> Result<(), CoreError> {
        self.send(DriverCommand::SwitchClock(clock)).await
    }

    /// Stop polling and tear down all elements
    ///
    /// # Errors
    ///
    /// Returns an error if the driver has already stopped.
    pub async fn stop(&self) -> Result<(), CoreError> {
        self.send(DriverCommand::Stop).await
    }

    /// Whether the driver is still running
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}

/// Single-task polling loop around an engine
pub struct Driver<O: Overlay> {
    engine: SubtitleEngine<O>,
    clock: Box<dyn TimeSource>,
    commands: mpsc::Receiver<DriverCommand>,
}

impl<O: Overlay> Driver<O> {
    /// Wrap an engine and its initial time source
    pub fn new(engine: SubtitleEngine<O>, clock: Box<dyn TimeSource>) -> (Self, DriverHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let driver = Self {
            engine,
            clock,
            commands: rx,
        };
        (driver, DriverHandle { commands: tx })
    }

    /// Poll until stopped or every handle is dropped
    ///
    /// Returns the engine after [`SubtitleEngine::shutdown`] has removed
    /// every element.
    pub async fn run(mut self) -> SubtitleEngine<O> {
        let mut ticker = ticker_for(self.clock.as_ref());
        info!(mode = %self.clock.mode(), "subtitle polling started");

        loop {
            tokio::select! {
                _ = ticker.tick() => self.poll_once(),
                command = self.commands.recv() => match command {
                    Some(DriverCommand::ToggleVisibility) => {
                        self.engine.toggle_visibility();
                    }
                    Some(DriverCommand::Resize) => self.engine.resize(),
                    Some(DriverCommand::SwitchClock(clock)) => {
                        info!(
                            from = %self.clock.mode(),
                            to = %clock.mode(),
                            "switching time source"
                        );
                        self.clock = clock;
                        ticker = ticker_for(self.clock.as_ref());
                    }
                    Some(DriverCommand::Stop) | None => break,
                },
            }
        }

        self.engine.shutdown();
        self.engine
    }

    fn poll_once(&mut self) {
        match self.clock.current_time() {
            Ok(time) => {
                self.engine.tick(time);
            }
            Err(err) => debug!(error = %err, "time unavailable, tick skipped"),
        }
    }
}

impl<O: Overlay> fmt::Debug for Driver<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("mode", &self.clock.mode())
            .finish_non_exhaustive()
    }
}

fn ticker_for(clock: &dyn TimeSource) -> Interval {
    let mut ticker = interval(clock.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

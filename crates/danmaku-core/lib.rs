//! # Danmaku Core
//!
//! ASS subtitle engine that shows dialogue as scrolling "danmaku" comments
//! over a video. Parses the `[Events]` section of an ASS file, tracks which
//! cue-lines are on screen at any playback time (including seeks), assigns
//! each new line a collision-free lane and hands the host a linear tween to
//! animate.
//!
//! ## Features
//!
//! - **Lenient parsing**: bad dialogue lines are skipped and reported, never fatal
//! - **Interval lookup**: binary search over start times for active cues
//! - **Seek aware**: replays lines after time jumps without duplicating them
//! - **First-fit lanes**: speed-consistent lanes with clearance and overlap checks
//! - **Host agnostic**: the engine only emits create/remove calls with opaque handles
//! - **Async driver**: optional tokio polling loop (feature `runtime`)
//!
//! ## Quick Start
//!
//! ```rust
//! use danmaku_core::{parser::parse_script, store::CueStore};
//!
//! let text = "[Events]\n\
//!     Dialogue: 0,0:00:01.50,0:00:03.00,Default,,0,0,0,,Hello,World\n";
//!
//! let outcome = parse_script(text);
//! assert_eq!(outcome.cues[0].text, "Hello,World");
//!
//! let store = CueStore::parse("demo", text)?;
//! assert_eq!(store.active_cues(3.0).count(), 1);
//! # Ok::<(), danmaku_core::CoreError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(clippy::all)]
#![deny(unsafe_code)]

pub mod animation;
pub mod clock;
pub mod config;
pub mod engine;
pub mod host;
pub mod layout;
pub mod parser;
pub mod store;
pub mod tags;
pub mod tracker;
pub mod utils;

#[cfg(feature = "runtime")]
#[cfg_attr(docsrs, doc(cfg(feature = "runtime")))]
pub mod driver;

pub use clock::{ClockMode, PlayerClock, TimeSource, WallClock};
pub use config::EngineConfig;
pub use engine::{SubtitleEngine, SubtitleStatus, TickReport};
pub use host::{DirectorySource, Overlay, SubtitleSource};
pub use parser::{Cue, ParseOutcome};
pub use store::CueStore;
pub use utils::CoreError;

#[cfg(feature = "runtime")]
pub use driver::{Driver, DriverCommand, DriverHandle};

/// Crate version for runtime compatibility checks
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type for core operations, using the crate's unified `CoreError`.
pub type Result<T> = core::result::Result<T, CoreError>;

//! Command-line front end for the danmaku subtitle engine
//!
//! - `inspect` parses a script and lists its cues and skipped lines
//! - `simulate` drives the engine over a synthetic timeline
//! - `play` runs the async polling driver against the wall clock

mod overlay;

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use danmaku_core::{
    parser::parse_script, utils::format_ass_time, CoreError, DirectorySource, Driver,
    EngineConfig, PlayerClock, SubtitleEngine, TimeSource, WallClock,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::overlay::{render, ConsoleOverlay, Format};

#[derive(Debug, Parser)]
#[command(name = "danmaku", version, about = "Scrolling ASS subtitles without a browser")]
struct Cli {
    /// Engine configuration (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More logging; repeat for trace output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a script and list its cues
    Inspect {
        /// Path to an .ass file
        file: PathBuf,
    },
    /// Step the engine through a timeline and print every host call
    Simulate(SimulateArgs),
    /// Poll the engine in real time until Ctrl-C
    Play(PlayArgs),
}

#[derive(Debug, Args)]
struct OverlayArgs {
    /// Directory holding `<video-id>.ass` files
    #[arg(long, value_name = "DIR")]
    dir: PathBuf,

    /// Video whose subtitles to load
    video_id: String,

    /// Overlay width in pixels
    #[arg(long, default_value_t = 1280.0)]
    width: f32,

    /// Overlay height in pixels
    #[arg(long, default_value_t = 720.0)]
    height: f32,

    /// Viewport width used to pick the metric profile, defaults to the overlay width
    #[arg(long)]
    viewport: Option<f32>,

    /// Emit JSON lines instead of text
    #[arg(long)]
    json: bool,
}

impl OverlayArgs {
    fn overlay(&self) -> ConsoleOverlay {
        ConsoleOverlay::new(self.width, self.height, self.viewport.unwrap_or(self.width))
    }

    const fn format(&self) -> Format {
        if self.json {
            Format::Json
        } else {
            Format::Text
        }
    }
}

#[derive(Debug, Args)]
struct SimulateArgs {
    #[command(flatten)]
    overlay: OverlayArgs,

    /// Stop once playback passes this time (seconds)
    #[arg(long, value_name = "S", value_parser = parse_seconds)]
    until: Option<f64>,

    /// Seconds between ticks
    #[arg(long, default_value_t = 0.1, value_name = "S")]
    step: f64,

    /// Jump from one time to another, e.g. `12:3.5`
    #[arg(long, value_name = "FROM:TO")]
    seek: Vec<Seek>,
}

#[derive(Debug, Args)]
struct PlayArgs {
    #[command(flatten)]
    overlay: OverlayArgs,

    /// Poll the coarse wall clock instead of the simulated player
    #[arg(long)]
    fallback: bool,

    /// Start playback at this time (seconds)
    #[arg(long, default_value_t = 0.0, value_name = "S", value_parser = parse_seconds)]
    start: f64,

    /// Drop to the wall clock after this many seconds
    #[arg(long, value_name = "S", value_parser = parse_duration)]
    switch_after: Option<Duration>,

    /// Stop on its own after this many seconds
    #[arg(long, value_name = "S", value_parser = parse_duration)]
    duration: Option<Duration>,
}

/// A scripted jump in the simulated timeline
#[derive(Debug, Clone, Copy, PartialEq)]
struct Seek {
    from: f64,
    to: f64,
}

impl FromStr for Seek {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (from, to) = s
            .split_once(':')
            .ok_or_else(|| format!("expected FROM:TO, got '{s}'"))?;
        Ok(Self {
            from: parse_seconds(from)?,
            to: parse_seconds(to)?,
        })
    }
}

/// A finite, non-negative number of seconds
fn parse_seconds(s: &str) -> Result<f64, String> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
        .ok_or_else(|| format!("'{s}' is not a non-negative number of seconds"))
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    let seconds = parse_seconds(s)?;
    Duration::try_from_secs_f64(seconds).map_err(|err| format!("'{s}': {err}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Inspect { file } => inspect(&file),
        Command::Simulate(args) => simulate(config, &args),
        Command::Play(args) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            runtime.block_on(play(config, args))
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: EngineConfig = toml::from_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    config.validate()?;
    debug!(path = %path.display(), "loaded engine config");
    Ok(config)
}

fn inspect(file: &Path) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let outcome = parse_script(&text);

    if outcome.cues.is_empty() {
        println!("Subtitles: none");
    } else {
        println!("Subtitles: {} lines", outcome.cues.len());
    }
    for (index, cue) in outcome.cues.iter().enumerate() {
        println!(
            "{index:>5}  {} -> {}  {:<12} {:?}",
            format_ass_time(cue.start),
            format_ass_time(cue.end),
            cue.style,
            cue.text
        );
    }
    for issue in &outcome.issues {
        println!("{issue}");
    }

    if outcome.cues.is_empty() {
        let id = file.file_stem().map_or_else(
            || file.display().to_string(),
            |stem| stem.to_string_lossy().into_owned(),
        );
        return Err(CoreError::empty_content(&id).into());
    }
    Ok(())
}

fn simulate(config: EngineConfig, args: &SimulateArgs) -> Result<()> {
    if !(args.step.is_finite() && args.step > 0.0) {
        bail!("--step must be a positive number of seconds");
    }
    let format = args.overlay.format();
    let mut engine = SubtitleEngine::new(args.overlay.overlay(), config)?;
    let source = DirectorySource::new(&args.overlay.dir);
    engine
        .load(&source, &args.overlay.video_id)
        .with_context(|| format!("no subtitles for '{}'", args.overlay.video_id))?;
    if format == Format::Text {
        println!("{}", engine.status());
    }

    let until = match args.until {
        Some(until) => until,
        None => engine
            .store()
            .and_then(|store| store.cues().iter().map(|cue| cue.end).reduce(f64::max))
            .unwrap_or_default()
            + 1.0,
    };

    let mut seeks = args.seek.clone();
    seeks.sort_by(|a, b| a.from.total_cmp(&b.from));
    let mut seeks = seeks.into_iter().peekable();

    // Ticks are counted from an origin so long runs do not accumulate error
    let mut origin = 0.0;
    let mut index: u32 = 0;
    let mut time = origin;
    let mut totals = (0, 0);
    while time <= until {
        let report = engine.tick(time);
        if report.seek {
            debug!(time, "seek observed");
        }
        for event in engine.overlay_mut().drain() {
            println!("{}", render(Some(time), &event, format));
        }
        totals.0 += report.materialized;
        totals.1 += report.retired;

        index += 1;
        let next = f64::from(index).mul_add(args.step, origin);
        match seeks.next_if(|seek| next > seek.from) {
            Some(seek) => {
                info!(from = time, to = seek.to, "seeking");
                origin = seek.to;
                index = 0;
                time = origin;
            }
            None => time = next,
        }
    }

    engine.shutdown();
    for event in engine.overlay_mut().drain() {
        println!("{}", render(None, &event, format));
    }
    info!(
        created = totals.0,
        retired = totals.1,
        "simulation finished"
    );
    Ok(())
}

async fn play(config: EngineConfig, args: PlayArgs) -> Result<()> {
    let overlay = args.overlay.overlay().echoing(args.overlay.format());
    let mut engine = SubtitleEngine::new(overlay, config)?;
    let source = DirectorySource::new(&args.overlay.dir);
    if let Err(err) = engine.load(&source, &args.overlay.video_id) {
        warn!(error = %err, "continuing without subtitles");
    }
    info!(status = %engine.status(), "starting playback");

    let start = args.start;
    let clock: Box<dyn TimeSource> = if args.fallback {
        Box::new(WallClock::starting_at(start))
    } else {
        let origin = Instant::now();
        Box::new(PlayerClock::new(move || {
            Some(start + origin.elapsed().as_secs_f64())
        }))
    };

    let (driver, handle) = Driver::new(engine, clock);
    let task = tokio::spawn(driver.run());

    if let Some(after) = args.switch_after {
        let handle = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let after = after.as_secs_f64();
            info!(after, "player clock lost, switching to wall clock");
            if let Err(err) = handle
                .switch_clock(Box::new(WallClock::starting_at(start + after)))
                .await
            {
                warn!(error = %err, "could not switch clocks");
            }
        });
    }

    let stop_after = async {
        match args.duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.context("failed to listen for Ctrl-C")?,
        () = stop_after => {}
    }

    if let Err(err) = handle.stop().await {
        debug!(error = %err, "driver already stopped");
    }
    let engine = task.await.context("polling task failed")?;
    info!(
        status = %engine.status(),
        live = engine.overlay().live(),
        "stopped"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_seek_pairs() {
        assert_eq!(
            "12:3.5".parse::<Seek>().unwrap(),
            Seek { from: 12.0, to: 3.5 }
        );
        assert_eq!(
            " 1 : 40 ".parse::<Seek>().unwrap(),
            Seek { from: 1.0, to: 40.0 }
        );
    }

    #[test]
    fn rejects_malformed_seeks() {
        assert!("12".parse::<Seek>().is_err());
        assert!("a:1".parse::<Seek>().is_err());
        assert!("-1:2".parse::<Seek>().is_err());
        assert!("1:inf".parse::<Seek>().is_err());
    }

    #[test]
    fn play_rejects_unusable_durations() {
        for bad in ["-1", "NaN", "inf", "1e300"] {
            let parsed = Cli::try_parse_from([
                "danmaku", "play", "--dir", "subs", "abc", "--duration", bad,
            ]);
            assert!(parsed.is_err(), "accepted --duration {bad}");
        }
        assert!(Cli::try_parse_from([
            "danmaku", "play", "--dir", "subs", "abc", "--switch-after", "-0.5",
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "danmaku", "play", "--dir", "subs", "abc", "--switch-after", "2.5",
        ])
        .unwrap();
        let Command::Play(args) = cli.command else {
            panic!("expected play");
        };
        assert_eq!(args.switch_after, Some(Duration::from_millis(2500)));
        assert_eq!(args.duration, None);
    }

    #[test]
    fn cli_accepts_repeated_seeks() {
        let cli = Cli::try_parse_from([
            "danmaku", "simulate", "--dir", "subs", "abc", "--seek", "5:40", "--seek", "41:1",
        ])
        .unwrap();
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.seek.len(), 2);
        assert_eq!(args.overlay.video_id, "abc");
        assert_eq!(args.step, 0.1);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/danmaku.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    fn no_config_means_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.narrow_breakpoint, EngineConfig::default().narrow_breakpoint);
    }
}

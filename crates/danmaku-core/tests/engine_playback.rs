//! End-to-end playback scenarios driven tick by tick

use danmaku_core::{
    host::{Overlay, OverlaySize, VisualHandle, VisualSpec},
    tags::TextFormatting,
    CoreError, DirectorySource, EngineConfig, SubtitleEngine,
};
use pretty_assertions::assert_eq;

#[derive(Debug, Default)]
struct RecordingOverlay {
    size: OverlaySize,
    viewport: Option<f32>,
    fail_creates: bool,
    next: u64,
    created: Vec<(VisualHandle, VisualSpec)>,
    removed: Vec<VisualHandle>,
}

impl RecordingOverlay {
    fn new(width: f32, height: f32) -> Self {
        Self {
            size: OverlaySize::new(width, height),
            ..Self::default()
        }
    }

    fn live(&self) -> usize {
        self.created.len() - self.removed.len()
    }
}

impl Overlay for RecordingOverlay {
    fn dimensions(&self) -> OverlaySize {
        self.size
    }

    fn viewport_width(&self) -> f32 {
        self.viewport.unwrap_or(self.size.width)
    }

    fn measure_text(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * 0.5
    }

    fn create(&mut self, spec: &VisualSpec) -> Result<VisualHandle, CoreError> {
        if self.fail_creates {
            return Err(CoreError::host("detached overlay"));
        }
        self.next += 1;
        let handle = VisualHandle::new(self.next);
        self.created.push((handle, spec.clone()));
        Ok(handle)
    }

    fn remove(&mut self, handle: VisualHandle) -> Result<(), CoreError> {
        self.removed.push(handle);
        Ok(())
    }
}

const HEADER: &str = "[Script Info]\nScriptType: v4.00+\n\n[Events]\nFormat: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n";

fn dialogue(start: &str, end: &str, text: &str) -> String {
    format!("Dialogue: 0,{start},{end},Default,,0,0,0,,{text}\n")
}

fn engine_with(overlay: RecordingOverlay, events: &str) -> SubtitleEngine<RecordingOverlay> {
    let mut engine = SubtitleEngine::new(overlay, EngineConfig::default()).unwrap();
    engine.load_text("test", &format!("{HEADER}{events}")).unwrap();
    engine
}

fn desktop_engine(events: &str) -> SubtitleEngine<RecordingOverlay> {
    engine_with(RecordingOverlay::new(1280.0, 720.0), events)
}

#[test]
fn polling_jitter_never_duplicates_a_line() {
    let mut engine = desktop_engine(&dialogue("0:00:01.00", "0:00:03.00", "Hello"));

    let mut created = 0;
    for step in 0..=40 {
        let report = engine.tick(0.8 + f64::from(step) * 0.05);
        created += report.materialized;
        assert!(!report.seek);
    }

    assert_eq!(created, 1);
    assert_eq!(engine.overlay().created.len(), 1);
}

#[test]
fn retires_exactly_after_grace_period() {
    let mut engine = desktop_engine(&dialogue("0:00:01.00", "0:00:03.00", "Hello"));
    engine.tick(1.0);

    for time in [2.0, 3.0, 3.2, 3.4, 3.5] {
        assert_eq!(engine.tick(time).retired, 0, "retired early at {time}");
    }
    assert_eq!(engine.overlay().live(), 1);

    let report = engine.tick(3.51);
    assert_eq!(report.retired, 1);
    assert_eq!(engine.overlay().removed, vec![VisualHandle::new(1)]);
    assert!(engine.active_lines().is_empty());
    assert!(engine.lanes().is_empty());
}

#[test]
fn only_the_large_jump_counts_as_a_seek() {
    let mut engine = desktop_engine(&dialogue("0:00:04.00", "0:00:50.00", "Long"));
    let seeks: Vec<bool> = [5.0, 5.1, 5.2, 40.0]
        .into_iter()
        .map(|t| engine.tick(t).seek)
        .collect();
    assert_eq!(seeks, vec![false, false, false, true]);

    // The active line is not duplicated by the cleared bucket table
    assert_eq!(engine.overlay().created.len(), 1);
}

#[test]
fn seeking_back_replays_retired_lines() {
    let mut engine = desktop_engine(&dialogue("0:00:01.00", "0:00:03.00", "Again"));
    engine.tick(1.5);
    let report = engine.tick(10.0);
    assert!(report.seek);
    assert_eq!(report.retired, 1);

    let report = engine.tick(1.5);
    assert!(report.seek);
    assert_eq!(report.materialized, 1);
    assert_eq!(engine.overlay().created.len(), 2);
}

#[test]
fn overloaded_overlay_forces_last_lane() {
    let events: String = (0..40)
        .map(|_| dialogue("0:00:01.00", "0:00:05.00", "Busy"))
        .collect();
    let mut engine = engine_with(RecordingOverlay::new(1280.0, 360.0), &events);

    let report = engine.tick(1.0);
    assert_eq!(report.materialized, 40);
    assert_eq!(report.forced, 32);

    let lanes: Vec<Option<usize>> = engine
        .overlay()
        .created
        .iter()
        .map(|(_, spec)| spec.lane)
        .collect();
    let expected_free: Vec<Option<usize>> = (0..8).map(|k| Some(k * 2)).collect();
    assert_eq!(lanes[..8], expected_free[..]);
    assert!(lanes[8..].iter().all(|lane| *lane == Some(15)));

    let (_, forced) = &engine.overlay().created[39];
    assert_eq!(forced.from.1, 320.0);
}

#[test]
fn override_tags_become_presentation() {
    let mut engine = desktop_engine(&dialogue(
        "0:00:01.00",
        "0:00:03.00",
        r"{\b1}Hi{\c&H0000FF&}There",
    ));
    engine.tick(1.0);

    let (_, spec) = &engine.overlay().created[0];
    assert_eq!(spec.text, "HiThere");
    assert!(spec.style.formatting.contains(TextFormatting::BOLD));
    assert_eq!(spec.style.color, Some([255, 0, 0]));
    assert_eq!(spec.opacity, 1.0);
}

#[test]
fn scroll_spans_the_overlay() {
    let mut engine = desktop_engine(&dialogue("0:00:01.00", "0:00:05.00", "abcd"));
    engine.tick(1.0);

    // Width 4 * 16 * 0.5 = 32 px, distance 1280 + 32 + 50 = 1362 px at 180 px/s
    let (_, spec) = &engine.overlay().created[0];
    assert_eq!(spec.from, (1280.0, 20.0));
    assert_eq!(spec.to, (-82.0, 20.0));
    assert!((spec.duration - 1362.0 / 180.0).abs() < 1e-6);
    assert_eq!(spec.lane, Some(0));
}

#[test]
fn authored_movement_bypasses_lanes() {
    let mut engine = desktop_engine(&dialogue(
        "0:00:02.00",
        "0:00:06.00",
        r"{\move(320,180,0,180)\alpha&H80&}Flying",
    ));
    engine.tick(2.0);

    let (_, spec) = &engine.overlay().created[0];
    assert_eq!(spec.lane, None);
    assert_eq!(spec.from, (640.0, 360.0));
    assert_eq!(spec.to, (0.0, 360.0));
    assert_eq!(spec.duration, 4.0);
    assert!((spec.opacity - 127.0 / 255.0).abs() < 1e-6);
    assert!(engine.lanes().is_empty());
}

#[test]
fn narrow_viewport_uses_mobile_metrics() {
    let overlay = RecordingOverlay {
        viewport: Some(375.0),
        ..RecordingOverlay::new(375.0, 211.0)
    };
    let mut engine = engine_with(overlay, &dialogue("0:00:01.00", "0:00:09.00", "Small"));
    engine.tick(1.0);

    let (_, spec) = &engine.overlay().created[0];
    assert_eq!(spec.style.font_size, 14.0);
    // 211 - 40 = 171 over a 10 px pitch gives 17 lanes, so no shrinking
    assert_eq!(engine.lanes().geometry(211.0, 10.0).count, 17);
}

#[test]
fn host_failures_do_not_abort_the_tick() {
    let overlay = RecordingOverlay {
        fail_creates: true,
        ..RecordingOverlay::new(1280.0, 720.0)
    };
    let events = format!(
        "{}{}",
        dialogue("0:00:01.00", "0:00:02.00", "One"),
        dialogue("0:00:01.00", "0:00:02.00", "Two"),
    );
    let mut engine = engine_with(overlay, &events);

    let report = engine.tick(1.0);
    assert_eq!(report.materialized, 2);
    assert_eq!(report.host_failures, 2);
    assert_eq!(engine.active_lines().len(), 2);
    assert!(engine.active_lines().iter().all(|line| line.handle.is_none()));

    // Retirement has nothing to remove but still clears the lines
    let report = engine.tick(2.6);
    assert_eq!(report.retired, 2);
    assert!(engine.overlay().removed.is_empty());
}

#[test]
fn resize_keeps_elements_in_flight() {
    let mut engine = desktop_engine(&dialogue("0:00:01.00", "0:00:09.00", "Stay"));
    engine.tick(1.0);
    assert_eq!(engine.lanes().len(), 1);

    engine.resize();
    assert!(engine.lanes().is_empty());
    assert_eq!(engine.overlay().live(), 1);
    assert_eq!(engine.active_lines().len(), 1);
}

#[test]
fn missing_source_disables_subtitles() {
    let mut engine =
        SubtitleEngine::new(RecordingOverlay::new(1280.0, 720.0), EngineConfig::default())
            .unwrap();
    let source = DirectorySource::new(std::env::temp_dir().join("danmaku-no-such-dir"));

    let err = engine.load(&source, "abc").unwrap_err();
    assert!(matches!(err, CoreError::SourceUnavailable { .. }));
    assert!(!engine.is_visible());
    assert_eq!(engine.status().to_string(), "Subtitles: none");
    assert_eq!(engine.tick(1.0).materialized, 0);
}

#[test]
fn hidden_engine_draws_nothing() {
    let mut engine = desktop_engine(&dialogue("0:00:01.00", "0:00:09.00", "Shy"));
    engine.toggle_visibility();
    assert_eq!(engine.tick(1.0).materialized, 0);
    assert!(engine.overlay().created.is_empty());

    engine.toggle_visibility();
    assert_eq!(engine.tick(1.1).materialized, 1);
}

//! Polling driver behavior under paused tokio time

#![cfg(feature = "runtime")]

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use danmaku_core::{
    clock::{ClockMode, PlayerClock, TimeSource},
    host::{Overlay, OverlaySize, VisualHandle, VisualSpec},
    CoreError, Driver, EngineConfig, SubtitleEngine,
};

const SCRIPT: &str = "[Events]\nDialogue: 0,0:00:00.00,0:01:00.00,Default,,0,0,0,,Hello\n";

#[derive(Debug, Default)]
struct Elements {
    next: u64,
    live: Vec<u64>,
}

#[derive(Debug, Clone, Default)]
struct SharedOverlay(Arc<Mutex<Elements>>);

impl SharedOverlay {
    fn live(&self) -> usize {
        self.0.lock().unwrap().live.len()
    }
}

impl Overlay for SharedOverlay {
    fn dimensions(&self) -> OverlaySize {
        OverlaySize::new(1280.0, 720.0)
    }

    fn measure_text(&self, text: &str, font_size: f32) -> f32 {
        text.len() as f32 * font_size * 0.5
    }

    fn create(&mut self, _spec: &VisualSpec) -> Result<VisualHandle, CoreError> {
        let mut elements = self.0.lock().unwrap();
        elements.next += 1;
        let id = elements.next;
        elements.live.push(id);
        Ok(VisualHandle::new(id))
    }

    fn remove(&mut self, handle: VisualHandle) -> Result<(), CoreError> {
        self.0.lock().unwrap().live.retain(|id| *id != handle.raw());
        Ok(())
    }
}

/// Fixed-position clock counting how often it is polled
struct CountingClock {
    mode: ClockMode,
    polls: Arc<AtomicUsize>,
}

impl TimeSource for CountingClock {
    fn current_time(&mut self) -> Result<f64, CoreError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(1.0)
    }

    fn mode(&self) -> ClockMode {
        self.mode
    }
}

fn engine(overlay: SharedOverlay) -> SubtitleEngine<SharedOverlay> {
    let mut engine = SubtitleEngine::new(overlay, EngineConfig::default()).unwrap();
    engine.load_text("vid", SCRIPT).unwrap();
    engine
}

#[tokio::test(start_paused = true)]
async fn precise_clock_polls_every_100ms() {
    let overlay = SharedOverlay::default();
    let polls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&polls);
    let clock = PlayerClock::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Some(1.0)
    });

    let (driver, handle) = Driver::new(engine(overlay.clone()), Box::new(clock));
    let task = tokio::spawn(driver.run());

    tokio::time::sleep(Duration::from_millis(1050)).await;
    let count = polls.load(Ordering::SeqCst);
    assert!((10..=12).contains(&count), "polled {count} times");
    assert_eq!(overlay.live(), 1);

    handle.stop().await.unwrap();
    let engine = task.await.unwrap();
    assert_eq!(overlay.live(), 0);
    assert!(engine.active_lines().is_empty());
    assert!(!handle.is_running());
}

#[tokio::test(start_paused = true)]
async fn switching_clocks_replaces_the_loop() {
    let overlay = SharedOverlay::default();
    let precise = Arc::new(AtomicUsize::new(0));
    let fallback = Arc::new(AtomicUsize::new(0));

    let (driver, handle) = Driver::new(
        engine(overlay),
        Box::new(CountingClock {
            mode: ClockMode::Precise,
            polls: Arc::clone(&precise),
        }),
    );
    let task = tokio::spawn(driver.run());

    tokio::time::sleep(Duration::from_millis(350)).await;
    handle
        .switch_clock(Box::new(CountingClock {
            mode: ClockMode::Fallback,
            polls: Arc::clone(&fallback),
        }))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    let precise_after_switch = precise.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(precise.load(Ordering::SeqCst), precise_after_switch);
    let slow = fallback.load(Ordering::SeqCst);
    assert!((2..=3).contains(&slow), "fallback polled {slow} times");

    handle.stop().await.unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn toggling_hides_elements_between_ticks() {
    let overlay = SharedOverlay::default();
    let clock = PlayerClock::new(|| Some(1.0));
    let (driver, handle) = Driver::new(engine(overlay.clone()), Box::new(clock));
    let task = tokio::spawn(driver.run());

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(overlay.live(), 1);

    handle.toggle_visibility().await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(overlay.live(), 0);

    handle.stop().await.unwrap();
    let engine = task.await.unwrap();
    assert!(!engine.is_visible());
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_stops_the_driver() {
    let overlay = SharedOverlay::default();
    let clock = PlayerClock::new(|| Some(1.0));
    let (driver, handle) = Driver::new(engine(overlay.clone()), Box::new(clock));
    let task = tokio::spawn(driver.run());

    tokio::time::sleep(Duration::from_millis(150)).await;
    drop(handle);

    let engine = task.await.unwrap();
    assert_eq!(overlay.live(), 0);
    assert!(engine.store().is_some());
}

#[tokio::test(start_paused = true)]
async fn unavailable_player_time_skips_ticks() {
    let overlay = SharedOverlay::default();
    let clock = PlayerClock::new(|| None);
    let (driver, handle) = Driver::new(engine(overlay.clone()), Box::new(clock));
    let task = tokio::spawn(driver.run());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(overlay.live(), 0);

    handle.stop().await.unwrap();
    let engine = task.await.unwrap();
    assert_eq!(engine.tracker().last_tick(), None);
}

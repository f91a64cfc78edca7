//! Application entry point — Story Time.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the generation backend ([`ApiBackend`]) from config.
//! 5. Create runner channels (`command`, `event`) and the end-of-clip
//!    channel.
//! 6. Start the `audio-playout` thread — falls back to a silent sink when
//!    no output device exists, so the app still launches.
//! 7. Spawn the story runner on the tokio runtime.
//! 8. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use tokio::sync::mpsc;

use story_time::{
    app::StoryTimeApp,
    audio::{AudioOutput, SPEECH_SAMPLE_RATE},
    config::AppConfig,
    gen::{ApiBackend, StoryBackend},
    story::{CommandSink, PlaybackSink, SilentSink, StoryCommand, StoryEvent, StoryRunner},
};

use eframe::egui;

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (width, height) = config.ui.window_size;
    let mut vp = egui::ViewportBuilder::default()
        .with_inner_size([width, height])
        .with_min_inner_size([420.0, 480.0])
        .with_title("Story Time");

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Story Time starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    if config.audio.sample_rate != SPEECH_SAMPLE_RATE {
        log::warn!(
            "Configured narration sample rate {} is unsupported; clips decode at {} Hz",
            config.audio.sample_rate,
            SPEECH_SAMPLE_RATE
        );
    }

    // 3. Tokio runtime (2 worker threads — generation calls are I/O-bound)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. Generation backend
    let backend: Arc<dyn StoryBackend> = Arc::new(ApiBackend::from_config(&config));

    // 5. Channel setup
    let (command_tx, command_rx) = mpsc::channel::<StoryCommand>(16);
    let (event_tx, event_rx) = mpsc::channel::<StoryEvent>(32);
    let (clip_ended_tx, clip_ended_rx) = mpsc::unbounded_channel::<u64>();

    // 6. Audio playout — degrade gracefully when no output device exists so
    //    the app still launches (read-aloud stays disabled-at-runtime).
    let sink: Box<dyn PlaybackSink> = match AudioOutput::start(clip_ended_tx) {
        Ok(output) => Box::new(CommandSink::new(output.command_sender())),
        Err(e) => {
            log::warn!("Audio playout unavailable ({e}); read-aloud is disabled");
            Box::new(SilentSink)
        }
    };

    // 7. Spawn the story runner onto the tokio runtime
    let runner = StoryRunner::new(backend, sink, event_tx);
    rt.spawn(runner.run(command_rx, clip_ended_rx));

    // 8. Build the egui app and run it (blocks until the window is closed)
    let app = StoryTimeApp::new(command_tx, event_rx, config.clone());
    let options = native_options(&config);

    eframe::run_native("Story Time", options, Box::new(move |_cc| Ok(Box::new(app))))
}

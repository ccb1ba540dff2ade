//! Headless driver for the call stage.
//!
//! Replays a scripted call (participants joining, speaking, sharing their
//! screen, the window going fullscreen) against a `MainVideoContainer` and
//! logs the resulting layer frames. Useful for checking layout numbers for a
//! given theme without opening a window.

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use iced::Size;
use thiserror::Error;

use call_stage::arguments::{CallContext, MediaRegistry};
use call_stage::graphics::fonts::{load_font_files, FontError};
use call_stage::localization::{LocalizationError, StringTable};
use call_stage::theme::{CallTheme, ThemeError};
use call_stage::utils::clock::ManualClock;
use call_stage::video::buffer::PlaneRefs;
use call_stage::{
    ContentFit, ControlsLayout, ControlsMode, DominantVideo, LayoutTransition,
    MainVideoContainer, ParticipantId, ParticipantSnapshot, VideoSourceMode,
};

const FRAME_INTERVAL_MS: u64 = 50;

#[derive(Error, Debug)]
enum DriverError {
    #[error("Theme error: {0}")]
    Theme(#[from] ThemeError),
    #[error("Strings error: {0}")]
    Strings(#[from] LocalizationError),
    #[error("Font error: {0}")]
    Fonts(#[from] FontError),
}

#[derive(Clone, Copy, ValueEnum, Debug)]
enum Fit {
    /// Letterbox the video
    Aspect,
    /// Crop the video to cover the stage
    Fill,
}

impl From<Fit> for ContentFit {
    fn from(fit: Fit) -> Self {
        match fit {
            Fit::Aspect => ContentFit::AspectFit,
            Fit::Fill => ContentFit::Fill,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Stage width in logical pixels
    #[arg(long, default_value_t = 640.0)]
    width: f32,
    /// Stage height in logical pixels
    #[arg(long, default_value_t = 360.0)]
    height: f32,
    /// JSON theme overriding the default palette and metrics
    #[arg(long)]
    theme: Option<String>,
    /// JSON string table for the overlay labels
    #[arg(long)]
    strings: Option<String>,
    /// Font file to register before layout (repeatable)
    #[arg(long = "font")]
    fonts: Vec<String>,
    /// Initial content fit of the video
    #[arg(long, value_enum, default_value_t = Fit::Aspect)]
    fit: Fit,
    /// Frames to run after every scripted event
    #[arg(long, default_value_t = 5)]
    steps: u32,
}

fn publish_test_frame(registry: &MediaRegistry, participant: ParticipantId, mode: VideoSourceMode) {
    let (width, height) = match mode {
        VideoSourceMode::Video => (64, 48),
        VideoSourceMode::Screencast => (160, 90),
    };
    let y = vec![180u8; (width * height) as usize];
    let chroma = vec![128u8; (width / 2 * height / 2) as usize];
    let buffers = registry.video_buffers(participant, mode);
    buffers.write_buffer().lock().copy_from_planes(
        PlaneRefs {
            y: (width, &y),
            u: (width / 2, &chroma),
            v: (width / 2, &chroma),
        },
        width,
        height,
    );
    buffers.advance_write();
}

fn log_stage(stage: &MainVideoContainer, event: &str) {
    log::info!(
        "{event}: dominant={:?} video={} fit={:?} name={:?} status={:?}",
        stage.current_dominant().map(|d| d.participant_id()),
        stage.has_video(),
        stage.fit_mode(),
        stage.name_label().displayed_text(),
        stage.status_label().displayed_text(),
    );
    log::info!(
        "{event}: name={:?} status={:?} button={:?} shadow={:?} speaking_opacity={:.2}",
        stage.name_layer().frame(),
        stage.status_layer().frame(),
        stage.zoom_button_layer().frame(),
        stage.shadow_layer().frame(),
        stage.speaking_layer().opacity(),
    );
}

fn run_frames(stage: &mut MainVideoContainer, clock: &ManualClock, steps: u32) {
    for _ in 0..steps {
        clock.advance_millis(FRAME_INTERVAL_MS);
        stage.pump_audio_levels();
        if !stage.tick() {
            break;
        }
    }
}

fn main() -> Result<(), DriverError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    log::debug!("call_stage: {args:?}");

    if !args.fonts.is_empty() {
        load_font_files(&args.fonts)?;
    }

    let theme = match &args.theme {
        Some(path) => CallTheme::load(path)?,
        None => CallTheme::default(),
    };
    let clock = Arc::new(ManualClock::new());
    let me = ParticipantId(1);
    let mut context = CallContext::new(me)
        .with_theme(theme)
        .with_clock(clock.clone());
    if let Some(path) = &args.strings {
        context = context.with_strings(Arc::new(StringTable::load(path)?));
    }

    let registry = MediaRegistry::new();
    let alice = ParticipantId(2);
    for participant in [me, alice] {
        publish_test_frame(&registry, participant, VideoSourceMode::Video);
        registry.enable_audio_levels(participant);
    }
    publish_test_frame(&registry, alice, VideoSourceMode::Screencast);

    let mut stage = MainVideoContainer::new(context, args.fit.into());
    stage.set_frame_size(Size::new(args.width, args.height));
    log_stage(&stage, "empty");

    let animated = LayoutTransition::animated();
    let alice_snapshot = ParticipantSnapshot::new(alice, "Alice Liddell");

    stage.update_dominant(
        Some(DominantVideo::new(alice, "alice-cam", VideoSourceMode::Video, false)),
        Some(alice_snapshot.clone()),
        animated,
        true,
        ControlsMode::Normal,
        Some(&registry),
    );
    run_frames(&mut stage, &clock, args.steps);
    log_stage(&stage, "alice camera");

    for level in [Some(1.5), Some(4.0), Some(9.0), None] {
        registry.publish_audio_level(alice, level);
        run_frames(&mut stage, &clock, 1);
        log::info!(
            "audio level {level:?}: speaking_opacity={:.2}",
            stage.speaking_layer().opacity()
        );
    }

    stage.update_dominant(
        Some(DominantVideo::new(alice, "alice-cam", VideoSourceMode::Video, false)),
        Some(alice_snapshot.clone().with_speaking(true)),
        animated,
        true,
        ControlsMode::Normal,
        Some(&registry),
    );
    run_frames(&mut stage, &clock, args.steps);
    log_stage(&stage, "alice speaking");

    stage.update_dominant(
        Some(DominantVideo::new(
            alice,
            "alice-screen",
            VideoSourceMode::Screencast,
            false,
        )),
        Some(alice_snapshot),
        animated,
        true,
        ControlsMode::Normal,
        Some(&registry),
    );
    run_frames(&mut stage, &clock, args.steps);
    log_stage(&stage, "alice screen");

    stage.set_chrome_mode(ControlsMode::Hidden, ControlsLayout::Fullscreen, true);
    stage.set_frame_size(Size::new(args.width * 2.0, args.height * 2.0));
    stage.set_fit_mode(ContentFit::Fill);
    run_frames(&mut stage, &clock, args.steps);
    log_stage(&stage, "fullscreen");

    stage.set_chrome_mode(ControlsMode::Normal, ControlsLayout::Normal, false);
    stage.set_frame_size(Size::new(args.width, args.height));
    stage.update_dominant(
        Some(DominantVideo::new(me, "me-cam", VideoSourceMode::Video, true)),
        Some(ParticipantSnapshot::new(me, "Local User").with_muted(true)),
        LayoutTransition::Immediate,
        false,
        ControlsMode::Normal,
        Some(&registry),
    );
    log_stage(&stage, "self preview");

    stage.update_dominant(
        None,
        None,
        LayoutTransition::Immediate,
        false,
        ControlsMode::Normal,
        Some(&registry),
    );
    log_stage(&stage, "nobody");
    log::info!("stats: {:?}", stage.stats());

    Ok(())
}

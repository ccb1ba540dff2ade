use std::cell::Cell;
use std::sync::Arc;

use iced::{Point, Rectangle, Size};

use call_stage::audio::level::AudioLevelStream;
use call_stage::graphics::text::{GlyphMetrics, ShapedText, TextMeasurer};
use call_stage::main_video::ZoomIcon;
use call_stage::utils::clock::ManualClock;
use call_stage::video::surface::VideoSurface;
use call_stage::{
    CallArguments, CallContext, ContentFit, ControlsLayout, ControlsMode, DominantVideo,
    LayoutTransition, MainVideoContainer, MediaRegistry, ParticipantId, ParticipantSnapshot,
    StageEvent, VideoSourceMode,
};

const ME: ParticipantId = ParticipantId(1);
const ALICE: ParticipantId = ParticipantId(2);
const BOB: ParticipantId = ParticipantId(3);
const STAGE: Size = Size {
    width: 640.0,
    height: 360.0,
};

/// Registry wrapper that counts how often the stage asks for media.
#[derive(Default)]
struct CountingArguments {
    registry: MediaRegistry,
    video_requests: Cell<u32>,
    audio_requests: Cell<u32>,
}

impl CountingArguments {
    fn with_participants(participants: &[ParticipantId]) -> Self {
        let args = Self::default();
        for participant in participants {
            args.registry
                .video_buffers(*participant, VideoSourceMode::Video);
            args.registry.enable_audio_levels(*participant);
        }
        args
    }
}

impl CallArguments for CountingArguments {
    fn take_video(
        &self,
        participant_id: ParticipantId,
        mode: VideoSourceMode,
    ) -> Option<Box<dyn VideoSurface>> {
        self.video_requests.set(self.video_requests.get() + 1);
        self.registry.take_video(participant_id, mode)
    }

    fn audio_level(&self, participant_id: ParticipantId) -> Option<AudioLevelStream> {
        self.audio_requests.set(self.audio_requests.get() + 1);
        self.registry.audio_level(participant_id)
    }
}

fn stage() -> (MainVideoContainer, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let context = CallContext::new(ME)
        .with_clock(clock.clone())
        .with_measurer(Arc::new(GlyphMetrics));
    let mut stage = MainVideoContainer::new(context, ContentFit::AspectFit);
    stage.set_frame_size(STAGE);
    (stage, clock)
}

fn camera(participant: ParticipantId) -> DominantVideo {
    DominantVideo::new(
        participant,
        format!("cam-{participant}"),
        VideoSourceMode::Video,
        false,
    )
}

fn show(
    stage: &mut MainVideoContainer,
    dominant: Option<DominantVideo>,
    participant: Option<ParticipantSnapshot>,
    animated: bool,
    args: &dyn CallArguments,
) {
    stage.update_dominant(
        dominant,
        participant,
        LayoutTransition::Immediate,
        animated,
        ControlsMode::Normal,
        Some(args),
    );
}

fn video_nodes(stage: &MainVideoContainer) -> usize {
    // Five chrome nodes are always present.
    stage.display_list().len() - 5 - stage.retiring_status_count()
}

#[test]
fn new_stage_is_empty_with_chrome_in_place() {
    let (stage, _) = stage();

    assert!(!stage.has_video());
    assert!(stage.current_dominant().is_none());
    assert_eq!(stage.display_list().len(), 5);
    assert_eq!(stage.speaking_layer().opacity(), 0.0);
    assert_eq!(stage.zoom_icon(), ZoomIcon::ZoomIn);
    assert_eq!(stage.fit_mode(), ContentFit::AspectFit);
}

#[test]
fn layout_pins_chrome_to_the_edges() {
    let (mut stage, _) = stage();
    let args = CountingArguments::with_participants(&[ALICE]);
    show(
        &mut stage,
        Some(camera(ALICE)),
        Some(ParticipantSnapshot::new(ALICE, "Alice")),
        false,
        &args,
    );

    let bounds = Rectangle::new(Point::ORIGIN, STAGE);
    assert_eq!(stage.video_layer().map(|l| l.frame()), Some(bounds));
    assert_eq!(stage.speaking_layer().frame(), bounds);
    assert_eq!(
        stage.shadow_layer().frame(),
        Rectangle::new(Point::new(0.0, 310.0), Size::new(640.0, 50.0))
    );
    assert_eq!(
        stage.zoom_button_layer().frame(),
        Rectangle::new(Point::new(606.0, 326.0), Size::new(24.0, 24.0))
    );

    let name = stage.name_layer().frame();
    assert_eq!(name.x, 10.0);
    assert_eq!(name.y + name.height, 350.0);
    assert_eq!(name.size(), stage.name_label().size());

    let status = stage.status_layer().frame();
    assert_eq!(status.x, name.x + name.width + 10.0);
    assert_eq!(status.y, name.y);
    assert_eq!(stage.status_label().text(), "listening");
}

#[test]
fn status_follows_shaped_name_width() {
    let mut stage = MainVideoContainer::new(CallContext::new(ME), ContentFit::AspectFit);
    stage.set_frame_size(STAGE);
    let args = CountingArguments::with_participants(&[ALICE]);
    show(
        &mut stage,
        Some(camera(ALICE)),
        Some(ParticipantSnapshot::new(ALICE, "Alice Liddell")),
        false,
        &args,
    );

    let shaped = ShapedText.width("Alice Liddell", stage.name_label().style());
    assert_eq!(stage.name_layer().frame().width, shaped.ceil());
    assert_eq!(stage.status_layer().frame().x, 10.0 + shaped.ceil() + 10.0);
}

#[test]
fn layout_is_idempotent_for_a_fixed_size() {
    let (mut stage, _) = stage();
    let args = CountingArguments::with_participants(&[ALICE]);
    show(
        &mut stage,
        Some(camera(ALICE)),
        Some(ParticipantSnapshot::new(ALICE, "Alice")),
        false,
        &args,
    );

    let snapshot = |stage: &MainVideoContainer| {
        vec![
            stage.video_layer().map(|l| l.frame()).unwrap_or_default(),
            stage.shadow_layer().frame(),
            stage.zoom_button_layer().frame(),
            stage.name_layer().frame(),
            stage.status_layer().frame(),
            stage.speaking_layer().frame(),
        ]
    };

    stage.layout(Size::new(300.0, 200.0), LayoutTransition::Immediate);
    let first = snapshot(&stage);
    stage.layout(Size::new(300.0, 200.0), LayoutTransition::Immediate);
    assert_eq!(snapshot(&stage), first);
}

#[test]
fn unchanged_dominant_does_not_reattach() {
    let (mut stage, _) = stage();
    let args = CountingArguments::with_participants(&[ALICE]);
    let snapshot = ParticipantSnapshot::new(ALICE, "Alice");

    show(&mut stage, Some(camera(ALICE)), Some(snapshot.clone()), false, &args);
    show(&mut stage, Some(camera(ALICE)), Some(snapshot), false, &args);

    assert_eq!(args.video_requests.get(), 1);
    assert_eq!(args.audio_requests.get(), 1);
    assert_eq!(stage.stats().video_attaches, 1);
    assert_eq!(stage.stats().video_detaches, 0);
    assert_eq!(video_nodes(&stage), 1);
}

#[test]
fn replacing_dominant_keeps_exactly_one_surface() {
    let (mut stage, _) = stage();
    let args = CountingArguments::with_participants(&[ALICE, BOB]);

    show(
        &mut stage,
        Some(camera(ALICE)),
        Some(ParticipantSnapshot::new(ALICE, "Alice")),
        false,
        &args,
    );
    show(
        &mut stage,
        Some(camera(BOB)),
        Some(ParticipantSnapshot::new(BOB, "Bob")),
        false,
        &args,
    );

    assert_eq!(video_nodes(&stage), 1);
    assert_eq!(stage.video_surface().map(|s| s.participant_id()), Some(BOB));
    assert_eq!(stage.stats().video_attaches, 2);
    assert_eq!(stage.stats().video_detaches, 1);

    assert_eq!(stage.display_list().len(), 6);

    // A temporary focus on the same endpoint is still a different dominant.
    let temporary = DominantVideo::new(BOB, "cam-3", VideoSourceMode::Video, true);
    show(&mut stage, Some(temporary), None, false, &args);
    assert_eq!(stage.stats().video_attaches, 3);
    assert_eq!(video_nodes(&stage), 1);
}

#[test]
fn clearing_dominant_detaches_video() {
    let (mut stage, _) = stage();
    let args = CountingArguments::with_participants(&[ALICE]);

    show(
        &mut stage,
        Some(camera(ALICE)),
        Some(ParticipantSnapshot::new(ALICE, "Alice")),
        false,
        &args,
    );
    show(&mut stage, None, None, false, &args);

    assert!(!stage.has_video());
    assert_eq!(video_nodes(&stage), 0);
    assert!(stage.current_dominant().is_none());
    assert!(!stage.audio_level_active());
}

#[test]
fn missing_surface_leaves_stage_empty_but_records_dominant() {
    let (mut stage, _) = stage();
    let args = CountingArguments::default();

    show(
        &mut stage,
        Some(camera(ALICE)),
        Some(ParticipantSnapshot::new(ALICE, "Alice")),
        false,
        &args,
    );
    assert!(!stage.has_video());
    assert_eq!(stage.current_dominant(), Some(&camera(ALICE)));
    assert!(!stage.audio_level_active());

    show(&mut stage, Some(camera(ALICE)), None, false, &args);
    assert_eq!(args.video_requests.get(), 1);
}

#[test]
fn audio_levels_drive_speaking_border() {
    let (mut stage, _) = stage();
    let args = CountingArguments::with_participants(&[ALICE]);
    show(
        &mut stage,
        Some(camera(ALICE)),
        Some(ParticipantSnapshot::new(ALICE, "Alice")),
        false,
        &args,
    );
    assert!(stage.audio_level_active());
    assert!(!stage.pump_audio_levels());

    args.registry.publish_audio_level(ALICE, Some(12.0));
    assert!(stage.pump_audio_levels());
    assert_eq!(stage.speaking_layer().opacity(), 1.0);

    args.registry.publish_audio_level(ALICE, Some(3.0));
    stage.pump_audio_levels();
    assert_eq!(stage.speaking_layer().opacity(), 0.5);

    args.registry.publish_audio_level(ALICE, None);
    stage.pump_audio_levels();
    assert_eq!(stage.speaking_layer().opacity(), 0.0);
}

#[test]
fn switching_dominant_cancels_previous_audio_subscription() {
    let (mut stage, _) = stage();
    let args = CountingArguments::with_participants(&[ALICE, BOB]);

    show(&mut stage, Some(camera(ALICE)), None, false, &args);
    assert_eq!(args.registry.audio_subscribers(ALICE), 1);

    show(&mut stage, Some(camera(BOB)), None, false, &args);
    assert_eq!(args.registry.audio_subscribers(ALICE), 0);
    assert_eq!(args.registry.audio_subscribers(BOB), 1);

    drop(stage);
    assert_eq!(args.registry.audio_subscribers(BOB), 0);
}

#[test]
fn speaking_flag_sets_border_without_audio_stream() {
    let (mut stage, _) = stage();
    let args = CountingArguments::default();

    show(
        &mut stage,
        Some(camera(ALICE)),
        Some(ParticipantSnapshot::new(ALICE, "Alice").with_speaking(true)),
        false,
        &args,
    );
    assert_eq!(stage.speaking_layer().opacity(), 1.0);

    show(
        &mut stage,
        Some(camera(ALICE)),
        Some(ParticipantSnapshot::new(ALICE, "Alice")),
        false,
        &args,
    );
    assert_eq!(stage.speaking_layer().opacity(), 0.0);
}

#[test]
fn status_label_swaps_only_on_text_change() {
    let (mut stage, _) = stage();
    let args = CountingArguments::with_participants(&[ALICE]);
    let alice = ParticipantSnapshot::new(ALICE, "Alice");

    show(&mut stage, Some(camera(ALICE)), Some(alice.clone()), false, &args);
    assert_eq!(stage.stats().status_swaps, 1);

    show(&mut stage, Some(camera(ALICE)), Some(alice), false, &args);
    assert_eq!(stage.stats().status_swaps, 1);

    let renamed = ParticipantSnapshot::new(ALICE, "Alice L.");
    show(&mut stage, Some(camera(ALICE)), Some(renamed.clone()), false, &args);
    assert_eq!(stage.name_label().text(), "Alice L.");
    assert_eq!(stage.stats().status_swaps, 1);

    show(
        &mut stage,
        Some(camera(ALICE)),
        Some(renamed.with_muted(true)),
        false,
        &args,
    );
    assert_eq!(stage.status_label().text(), "muted");
    assert_eq!(stage.stats().status_swaps, 2);
    assert_eq!(stage.retiring_status_count(), 0);
}

#[test]
fn animated_status_swap_retires_old_label_after_fade() {
    let (mut stage, clock) = stage();
    let args = CountingArguments::with_participants(&[ALICE]);
    let alice = ParticipantSnapshot::new(ALICE, "Alice");

    show(&mut stage, Some(camera(ALICE)), Some(alice.clone()), false, &args);
    let settled = stage.display_list().len();

    show(
        &mut stage,
        Some(camera(ALICE)),
        Some(alice.with_muted(true)),
        true,
        &args,
    );
    assert_eq!(stage.retiring_status_count(), 1);
    assert_eq!(stage.display_list().len(), settled + 1);
    assert!(stage.tick());

    clock.advance_millis(100);
    assert!(stage.tick());
    assert_eq!(stage.retiring_status_count(), 1);

    clock.advance_millis(100);
    stage.tick();
    assert_eq!(stage.retiring_status_count(), 0);
    assert_eq!(stage.display_list().len(), settled);
    assert_eq!(stage.status_label().text(), "muted");
}

#[test]
fn hidden_chrome_swaps_status_without_animation() {
    let (mut stage, _) = stage();
    let args = CountingArguments::with_participants(&[ALICE]);

    stage.update_dominant(
        Some(camera(ALICE)),
        Some(ParticipantSnapshot::new(ALICE, "Alice")),
        LayoutTransition::Immediate,
        true,
        ControlsMode::Hidden,
        Some(&args),
    );

    assert_eq!(stage.retiring_status_count(), 0);
    assert_eq!(stage.status_layer().opacity(), 0.0);
    assert_eq!(stage.name_layer().opacity(), 0.0);
}

#[test]
fn local_account_is_named_you() {
    let (mut stage, _) = stage();
    let args = CountingArguments::with_participants(&[ME]);

    show(
        &mut stage,
        Some(camera(ME)),
        Some(ParticipantSnapshot::new(ME, "Local Name")),
        false,
        &args,
    );
    assert_eq!(stage.name_label().text(), "You");
}

#[test]
fn chrome_mode_only_touches_chrome() {
    let (mut stage, _) = stage();
    let args = CountingArguments::with_participants(&[ALICE]);
    show(
        &mut stage,
        Some(camera(ALICE)),
        Some(ParticipantSnapshot::new(ALICE, "Alice")),
        false,
        &args,
    );

    stage.set_chrome_mode(ControlsMode::Hidden, ControlsLayout::Fullscreen, false);
    assert_eq!(stage.shadow_layer().opacity(), 0.0);
    assert_eq!(stage.zoom_button_layer().opacity(), 0.0);
    assert_eq!(stage.name_layer().opacity(), 0.0);
    assert_eq!(stage.status_layer().opacity(), 0.0);
    assert_eq!(stage.zoom_icon(), ZoomIcon::ZoomOut);
    assert!(stage.has_video());
    assert_eq!(
        stage.video_surface().map(|s| s.content_fit()),
        Some(ContentFit::AspectFit)
    );

    stage.set_chrome_mode(ControlsMode::Hidden, ControlsLayout::Fullscreen, false);
    assert_eq!(stage.zoom_icon(), ZoomIcon::ZoomOut);

    stage.set_chrome_mode(ControlsMode::Normal, ControlsLayout::Normal, true);
    assert_eq!(stage.shadow_layer().opacity(), 1.0);
    assert_eq!(stage.zoom_icon(), ZoomIcon::ZoomIn);
    assert_eq!(stage.stats().video_attaches, 1);
    assert_eq!(stage.stats().video_detaches, 0);
}

#[test]
fn fit_mode_propagates_to_attached_surface() {
    let (mut stage, _) = stage();
    stage.set_fit_mode(ContentFit::Fill);
    assert_eq!(stage.fit_mode(), ContentFit::Fill);

    let args = CountingArguments::with_participants(&[ALICE]);
    show(&mut stage, Some(camera(ALICE)), None, false, &args);
    assert_eq!(
        stage.video_surface().map(|s| s.content_fit()),
        Some(ContentFit::Fill)
    );

    stage.set_fit_mode(ContentFit::AspectFit);
    assert_eq!(
        stage.video_surface().map(|s| s.content_fit()),
        Some(ContentFit::AspectFit)
    );
}

#[test]
fn frame_changes_trigger_layout() {
    let (mut stage, _) = stage();
    stage.set_frame_size(Size::new(200.0, 100.0));

    assert_eq!(stage.size(), Size::new(200.0, 100.0));
    assert_eq!(
        stage.speaking_layer().frame(),
        Rectangle::new(Point::ORIGIN, Size::new(200.0, 100.0))
    );
    assert_eq!(stage.shadow_layer().frame().y, 50.0);
}

#[test]
fn hit_testing() {
    let (mut stage, _) = stage();

    assert_eq!(
        stage.hit_test(Point::new(610.0, 330.0)),
        Some(StageEvent::ToggleZoom)
    );
    assert_eq!(
        stage.hit_test(Point::new(100.0, 100.0)),
        Some(StageEvent::DragWindow)
    );
    assert_eq!(stage.hit_test(Point::new(700.0, 10.0)), None);

    stage.set_chrome_mode(ControlsMode::Hidden, ControlsLayout::Normal, false);
    assert_eq!(
        stage.hit_test(Point::new(610.0, 330.0)),
        Some(StageEvent::DragWindow)
    );
}

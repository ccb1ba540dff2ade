//! The main stage of a group call: one participant's video with the name,
//! status, speaking border, zoom button and bottom shadow drawn over it.
//!
//! The container owns its nodes through a [`DisplayList`]. The owning call
//! screen drives it with [`MainVideoContainer::update_dominant`] whenever call
//! state changes and with [`MainVideoContainer::set_frame_size`] when the
//! window is resized; everything runs on the UI thread.

use std::time::Instant;

use iced::{Point, Rectangle, Size, Vector};

use crate::arguments::{CallArguments, CallContext};
use crate::audio::level::{normalized_level, SubscriptionSlot};
use crate::dominant::DominantVideo;
use crate::graphics::display_list::{DisplayList, NodeId};
use crate::graphics::layer::Layer;
use crate::graphics::text::{LabelStyle, TextLabel, NAME_FONT, STATUS_FONT};
use crate::graphics::transition::{animate_alpha, animate_position, LayoutTransition};
use crate::participant::ParticipantSnapshot;
use crate::theme::CallTheme;
use crate::video::surface::{ContentFit, VideoSurface};

/// Visibility of the call controls around the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlsMode {
    #[default]
    Normal,
    Hidden,
}

impl ControlsMode {
    fn chrome_alpha(self) -> f32 {
        match self {
            ControlsMode::Normal => 1.0,
            ControlsMode::Hidden => 0.0,
        }
    }
}

/// Window state of the call screen; decides which zoom icon is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlsLayout {
    #[default]
    Normal,
    Fullscreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomIcon {
    ZoomIn,
    ZoomOut,
}

/// Result of a pointer hit on the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEvent {
    ToggleZoom,
    /// Press on the stage background; hosts use it to move the window.
    DragWindow,
}

/// Counters of hierarchy changes, handy for hosts that log redraw causes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageStats {
    pub video_attaches: u64,
    pub video_detaches: u64,
    pub status_swaps: u64,
}

#[derive(Debug)]
pub(crate) struct StageNode<T> {
    pub(crate) id: NodeId,
    pub(crate) layer: Layer,
    pub(crate) content: T,
}

/// A replaced status label that is still fading out.
#[derive(Debug)]
struct RetiringLabel {
    node: StageNode<TextLabel>,
    remove_at: Instant,
}

/// Borrowed view of one display-list entry, used by the renderer.
pub(crate) enum NodeRef<'a> {
    Video(&'a Layer, &'a dyn VideoSurface),
    Shadow(&'a Layer),
    ZoomButton(&'a Layer, ZoomIcon),
    Label(&'a Layer, &'a TextLabel),
    SpeakingBorder(&'a Layer),
}

#[derive(Debug)]
pub struct MainVideoContainer {
    context: CallContext,
    display_list: DisplayList,
    size: Size,
    valid_layout: Option<Size>,
    fit: ContentFit,
    controls_mode: ControlsMode,
    current_dominant: Option<DominantVideo>,
    participant: Option<ParticipantSnapshot>,
    video: Option<StageNode<Box<dyn VideoSurface>>>,
    shadow: StageNode<()>,
    zoom_button: StageNode<ZoomIcon>,
    name: StageNode<TextLabel>,
    status: StageNode<TextLabel>,
    retiring: Vec<RetiringLabel>,
    speaking: StageNode<()>,
    audio_level: SubscriptionSlot,
    stats: StageStats,
}

impl MainVideoContainer {
    pub fn new(context: CallContext, fit: ContentFit) -> Self {
        let mut display_list = DisplayList::new();
        let theme = context.theme();

        let shadow = StageNode {
            id: display_list.allocate(),
            layer: Layer::default(),
            content: (),
        };
        let zoom_button = StageNode {
            id: display_list.allocate(),
            layer: Layer::new(
                Rectangle::new(Point::ORIGIN, icon_size(theme, ZoomIcon::ZoomIn)),
                1.0,
            ),
            content: ZoomIcon::ZoomIn,
        };
        let name = StageNode {
            id: display_list.allocate(),
            layer: Layer::default(),
            content: TextLabel::empty(name_style(theme)),
        };
        let status = StageNode {
            id: display_list.allocate(),
            layer: Layer::default(),
            content: TextLabel::empty(status_style(theme)),
        };
        let speaking = StageNode {
            id: display_list.allocate(),
            layer: Layer::new(Rectangle::default(), 0.0),
            content: (),
        };

        for id in [shadow.id, zoom_button.id, name.id, status.id, speaking.id] {
            if let Err(e) = display_list.push(id) {
                log::error!("MainVideoContainer::new: {e}");
            }
        }

        log::info!("MainVideoContainer::new: fit={:?}", fit);

        Self {
            context,
            display_list,
            size: Size::ZERO,
            valid_layout: None,
            fit,
            controls_mode: ControlsMode::Normal,
            current_dominant: None,
            participant: None,
            video: None,
            shadow,
            zoom_button,
            name,
            status,
            retiring: Vec::new(),
            speaking,
            audio_level: SubscriptionSlot::new(),
            stats: StageStats::default(),
        }
    }

    fn now(&self) -> Instant {
        self.context.clock().now()
    }

    pub fn theme(&self) -> &CallTheme {
        self.context.theme()
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn fit_mode(&self) -> ContentFit {
        self.fit
    }

    pub fn controls_mode(&self) -> ControlsMode {
        self.controls_mode
    }

    pub fn current_dominant(&self) -> Option<&DominantVideo> {
        self.current_dominant.as_ref()
    }

    pub fn participant(&self) -> Option<&ParticipantSnapshot> {
        self.participant.as_ref()
    }

    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    pub fn video_surface(&self) -> Option<&dyn VideoSurface> {
        self.video.as_ref().map(|node| node.content.as_ref())
    }

    pub fn video_layer(&self) -> Option<&Layer> {
        self.video.as_ref().map(|node| &node.layer)
    }

    pub fn shadow_layer(&self) -> &Layer {
        &self.shadow.layer
    }

    pub fn zoom_button_layer(&self) -> &Layer {
        &self.zoom_button.layer
    }

    pub fn zoom_icon(&self) -> ZoomIcon {
        self.zoom_button.content
    }

    pub fn name_layer(&self) -> &Layer {
        &self.name.layer
    }

    pub fn name_label(&self) -> &TextLabel {
        &self.name.content
    }

    pub fn status_layer(&self) -> &Layer {
        &self.status.layer
    }

    pub fn status_label(&self) -> &TextLabel {
        &self.status.content
    }

    pub fn speaking_layer(&self) -> &Layer {
        &self.speaking.layer
    }

    pub fn retiring_status_count(&self) -> usize {
        self.retiring.len()
    }

    pub fn display_list(&self) -> &DisplayList {
        &self.display_list
    }

    pub fn stats(&self) -> StageStats {
        self.stats
    }

    pub fn audio_level_active(&self) -> bool {
        self.audio_level.is_active()
    }

    /// Shows or hides the chrome and picks the zoom icon for the window state.
    pub fn set_chrome_mode(
        &mut self,
        controls_mode: ControlsMode,
        controls_layout: ControlsLayout,
        animated: bool,
    ) {
        let transition = if animated {
            LayoutTransition::animated()
        } else {
            LayoutTransition::Immediate
        };
        self.apply_chrome_alpha(controls_mode, transition);

        let icon = match controls_layout {
            ControlsLayout::Fullscreen => ZoomIcon::ZoomOut,
            ControlsLayout::Normal => ZoomIcon::ZoomIn,
        };
        if icon != self.zoom_button.content {
            log::debug!("MainVideoContainer::set_chrome_mode: zoom icon {:?}", icon);
            self.zoom_button.content = icon;
            let size = icon_size(self.context.theme(), icon);
            let frame = self.zoom_button_frame(self.size, size);
            self.zoom_button.layer.set_frame(frame);
        }
    }

    fn apply_chrome_alpha(&mut self, controls_mode: ControlsMode, transition: LayoutTransition) {
        let now = self.now();
        let alpha = controls_mode.chrome_alpha();
        self.controls_mode = controls_mode;
        transition.update_alpha(&mut self.shadow.layer, alpha, now);
        transition.update_alpha(&mut self.zoom_button.layer, alpha, now);
        transition.update_alpha(&mut self.name.layer, alpha, now);
        transition.update_alpha(&mut self.status.layer, alpha, now);
        if controls_mode == ControlsMode::Hidden {
            for retiring in &mut self.retiring {
                retiring.node.layer.set_opacity(0.0);
            }
        }
    }

    pub fn set_fit_mode(&mut self, fit: ContentFit) {
        self.fit = fit;
        let now = self.now();
        if let Some(video) = self.video.as_mut() {
            video.content.set_content_fit(fit, true, now);
        }
    }

    /// Brings the stage in line with the call state.
    ///
    /// Label text is refreshed whenever the snapshot changed; the video
    /// surface and audio subscription are only replaced when `dominant`
    /// differs from the stored value.
    pub fn update_dominant(
        &mut self,
        dominant: Option<DominantVideo>,
        participant: Option<ParticipantSnapshot>,
        transition: LayoutTransition,
        animated: bool,
        controls_mode: ControlsMode,
        arguments: Option<&dyn CallArguments>,
    ) {
        let now = self.now();
        let speaking_alpha = if participant.as_ref().is_some_and(|p| p.is_speaking()) {
            1.0
        } else {
            0.0
        };
        transition.update_alpha(&mut self.speaking.layer, speaking_alpha, now);
        self.apply_chrome_alpha(controls_mode, transition);

        if participant != self.participant {
            if let (Some(dominant), Some(participant)) = (dominant.as_ref(), participant) {
                self.update_labels(dominant, participant, transition, animated, controls_mode);
            }
        }

        if dominant == self.current_dominant {
            return;
        }

        log::info!(
            "MainVideoContainer::update_dominant: {:?} -> {:?}",
            self.current_dominant,
            dominant
        );

        self.audio_level.set(None);
        if let (Some(dominant), Some(arguments)) = (dominant.as_ref(), arguments) {
            match arguments.audio_level(dominant.participant_id()) {
                Some(stream) => self.audio_level.set(Some(stream.subscribe())),
                None => log::debug!(
                    "MainVideoContainer::update_dominant: no audio level for participant {}",
                    dominant.participant_id()
                ),
            }
        }

        self.detach_video();
        self.current_dominant = dominant.clone();

        let Some(dominant) = dominant else {
            return;
        };
        let Some(mut surface) =
            arguments.and_then(|a| a.take_video(dominant.participant_id(), dominant.mode()))
        else {
            log::warn!(
                "MainVideoContainer::update_dominant: no video surface for participant {} mode={:?}",
                dominant.participant_id(),
                dominant.mode()
            );
            return;
        };

        surface.set_content_fit(self.fit, false, now);
        let id = self.display_list.allocate();
        if let Err(e) = self.display_list.insert_below(id, self.shadow.id) {
            log::error!("MainVideoContainer::update_dominant: failed to insert video: {e}");
            return;
        }
        self.video = Some(StageNode {
            id,
            layer: Layer::new(Rectangle::new(Point::ORIGIN, self.size), 1.0),
            content: surface,
        });
        self.stats.video_attaches += 1;
        self.layout(self.size, transition);
    }

    fn update_labels(
        &mut self,
        dominant: &DominantVideo,
        participant: ParticipantSnapshot,
        transition: LayoutTransition,
        animated: bool,
        controls_mode: ControlsMode,
    ) {
        let now = self.now();
        let theme = self.context.theme().clone();
        let measurer = self.context.measurer();
        let strings = self.context.strings();

        let name = if participant.id() == self.context.account_participant_id() {
            strings.you()
        } else {
            participant.display_title().to_string()
        };
        self.name.content = TextLabel::new(
            name,
            name_style(&theme),
            self.size.width - theme.margin * 2.0,
            measurer,
        );
        let name_frame = self.name.layer.frame();
        self.name.layer.set_frame(Rectangle::new(
            name_frame.position(),
            self.name.content.size(),
        ));

        let status = participant.video_status(dominant.mode(), strings);
        self.participant = Some(participant);

        if self.status.content.text() != status {
            let name_width = self.name.layer.frame().width;
            let label = TextLabel::new(
                status,
                status_style(&theme),
                self.size.width - name_width - theme.margin * 2.0 - theme.label_spacing,
                measurer,
            );
            let previous_frame = self.status.layer.frame();
            let frame = Rectangle::new(
                Point::new(
                    name_width + theme.margin + theme.label_spacing,
                    self.size.height - label.size().height - theme.margin,
                ),
                previous_frame.size(),
            );
            let id = self.display_list.allocate();
            if let Err(e) = self.display_list.insert_above(id, self.status.id) {
                log::error!("MainVideoContainer::update_labels: failed to insert status: {e}");
                return;
            }

            log::debug!(
                "MainVideoContainer::update_labels: status {:?} -> {:?}",
                self.status.content.text(),
                label.text()
            );

            let replacement = StageNode {
                id,
                layer: Layer::new(frame, controls_mode.chrome_alpha()),
                content: label,
            };
            let mut previous = std::mem::replace(&mut self.status, replacement);
            self.stats.status_swaps += 1;

            if animated && controls_mode == ControlsMode::Normal {
                let fade = theme.status_fade();
                let slide = Vector::new(theme.status_slide, 0.0);
                animate_alpha(&mut previous.layer, 1.0, 0.0, fade, now);
                animate_position(&mut previous.layer, Vector::new(0.0, 0.0), slide, fade, now);
                animate_alpha(&mut self.status.layer, 0.0, 1.0, fade, now);
                animate_position(
                    &mut self.status.layer,
                    Vector::new(-slide.x, 0.0),
                    Vector::new(0.0, 0.0),
                    fade,
                    now,
                );
                self.retiring.push(RetiringLabel {
                    node: previous,
                    remove_at: now + fade,
                });
            } else if let Err(e) = self.display_list.remove(previous.id) {
                log::error!("MainVideoContainer::update_labels: failed to remove status: {e}");
            }
        }

        self.layout(self.size, transition);
    }

    fn detach_video(&mut self) {
        let Some(video) = self.video.take() else {
            return;
        };
        log::debug!(
            "MainVideoContainer::detach_video: participant={}",
            video.content.participant_id()
        );
        if let Err(e) = self.display_list.remove(video.id) {
            log::error!("MainVideoContainer::detach_video: {e}");
        }
        self.stats.video_detaches += 1;
    }

    /// Host-driven frame change; lays out immediately when the size changed.
    pub fn set_frame_size(&mut self, size: Size) {
        if self.valid_layout != Some(size) {
            self.layout(size, LayoutTransition::Immediate);
        }
    }

    fn zoom_button_frame(&self, size: Size, button: Size) -> Rectangle {
        let margin = self.context.theme().margin;
        Rectangle::new(
            Point::new(
                size.width - margin - button.width,
                size.height - margin - button.height,
            ),
            button,
        )
    }

    pub fn layout(&mut self, size: Size, transition: LayoutTransition) {
        self.size = size;
        self.valid_layout = Some(size);
        let now = self.now();
        let theme = self.context.theme().clone();
        let measurer = self.context.measurer();
        let bounds = Rectangle::new(Point::ORIGIN, size);

        if let Some(video) = self.video.as_mut() {
            transition.update_frame(&mut video.layer, bounds, now);
            video.content.update_layout(size, transition, now);
        }

        transition.update_frame(
            &mut self.shadow.layer,
            Rectangle::new(
                Point::new(0.0, size.height - theme.shadow_height),
                Size::new(size.width, theme.shadow_height),
            ),
            now,
        );

        let button_frame = self.zoom_button_frame(size, self.zoom_button.layer.frame().size());
        transition.update_frame(&mut self.zoom_button.layer, button_frame, now);

        self.name
            .content
            .resize(size.width - theme.margin * 2.0, measurer);
        let name_size = self.name.content.size();
        self.status.content.resize(
            size.width - theme.margin * 2.0 - theme.label_spacing - name_size.width,
            measurer,
        );

        let name_frame = Rectangle::new(
            Point::new(theme.margin, size.height - theme.margin - name_size.height),
            name_size,
        );
        transition.update_frame(&mut self.name.layer, name_frame, now);
        transition.update_frame(
            &mut self.status.layer,
            Rectangle::new(
                Point::new(name_frame.x + name_frame.width + theme.label_spacing, name_frame.y),
                self.status.content.size(),
            ),
            now,
        );

        transition.update_frame(&mut self.speaking.layer, bounds, now);
    }

    /// Applies the newest pending audio level to the speaking border.
    /// Returns whether its opacity changed.
    pub fn pump_audio_levels(&mut self) -> bool {
        let Some(subscription) = self.audio_level.get_mut() else {
            return false;
        };
        let latest = subscription.drain();
        if subscription.producer_gone() {
            log::debug!("MainVideoContainer::pump_audio_levels: audio level producer gone");
            self.audio_level.dispose();
        }

        let Some(level) = latest else {
            return false;
        };
        let opacity = normalized_level(level, self.context.theme().audio_level_max);
        let changed = self.speaking.layer.opacity() != opacity;
        self.speaking.layer.set_opacity(opacity);
        changed
    }

    /// Settles finished animations and drops status labels that faded out.
    /// Returns whether anything is still animating.
    pub fn tick(&mut self) -> bool {
        let now = self.now();
        let display_list = &mut self.display_list;
        self.retiring.retain(|retiring| {
            if now < retiring.remove_at {
                return true;
            }
            if let Err(e) = display_list.remove(retiring.node.id) {
                log::error!("MainVideoContainer::tick: {e}");
            }
            false
        });

        let mut animating = false;
        for layer in self.layers_mut() {
            layer.finish_animations(now);
            animating |= layer.is_animating(now);
        }
        animating || !self.retiring.is_empty()
    }

    fn layers_mut(&mut self) -> impl Iterator<Item = &mut Layer> {
        [
            &mut self.shadow.layer,
            &mut self.zoom_button.layer,
            &mut self.name.layer,
            &mut self.status.layer,
            &mut self.speaking.layer,
        ]
        .into_iter()
        .chain(self.video.as_mut().map(|v| &mut v.layer))
        .chain(self.retiring.iter_mut().map(|r| &mut r.node.layer))
    }

    pub fn hit_test(&self, point: Point) -> Option<StageEvent> {
        if !Rectangle::new(Point::ORIGIN, self.size).contains(point) {
            return None;
        }
        let button = &self.zoom_button.layer;
        if button.opacity() > 0.0 && button.frame().contains(point) {
            return Some(StageEvent::ToggleZoom);
        }
        Some(StageEvent::DragWindow)
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        if let Some(video) = self.video.as_ref().filter(|v| v.id == id) {
            return Some(NodeRef::Video(&video.layer, video.content.as_ref()));
        }
        if id == self.shadow.id {
            return Some(NodeRef::Shadow(&self.shadow.layer));
        }
        if id == self.zoom_button.id {
            return Some(NodeRef::ZoomButton(
                &self.zoom_button.layer,
                self.zoom_button.content,
            ));
        }
        if id == self.speaking.id {
            return Some(NodeRef::SpeakingBorder(&self.speaking.layer));
        }
        [&self.name, &self.status]
            .into_iter()
            .chain(self.retiring.iter().map(|r| &r.node))
            .find(|node| node.id == id)
            .map(|node| NodeRef::Label(&node.layer, &node.content))
    }

    pub(crate) fn clock_now(&self) -> Instant {
        self.now()
    }
}

impl Drop for MainVideoContainer {
    fn drop(&mut self) {
        self.audio_level.dispose();
    }
}

fn name_style(theme: &CallTheme) -> LabelStyle {
    LabelStyle {
        font: NAME_FONT,
        size: theme.name_font_size,
        color: theme.label_color,
    }
}

fn status_style(theme: &CallTheme) -> LabelStyle {
    LabelStyle {
        font: STATUS_FONT,
        size: theme.status_font_size,
        color: theme.label_color,
    }
}

fn icon_size(theme: &CallTheme, _icon: ZoomIcon) -> Size {
    Size::new(theme.zoom_icon_size, theme.zoom_icon_size)
}

//! Draws a [`MainVideoContainer`] on an iced canvas.

use std::time::Instant;

use iced::widget::canvas;
use iced::widget::canvas::{fill, gradient, Fill, Frame, Gradient, Path, Stroke, Style};
use iced::widget::text::{LineHeight, Shaping};
use iced::{mouse, Color, Length, Pixels, Point, Rectangle, Size, Theme};

use crate::graphics::layer::Layer;
use crate::graphics::text::LINE_HEIGHT;
use crate::main_video::{MainVideoContainer, NodeRef, ZoomIcon};
use crate::theme::CallTheme;

const ICON_ZOOM_IN: &str = r##"<svg width="24" height="24" viewBox="0 0 24 24" fill="none" xmlns="http://www.w3.org/2000/svg">
<path d="M4 9V4H9M15 4H20V9M20 15V20H15M9 20H4V15" stroke="white" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"/>
</svg>"##;

const ICON_ZOOM_OUT: &str = r##"<svg width="24" height="24" viewBox="0 0 24 24" fill="none" xmlns="http://www.w3.org/2000/svg">
<path d="M9 4V9H4M20 9H15V4M15 20V15H20M4 15H9V20" stroke="white" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"/>
</svg>"##;

fn with_alpha(color: Color, opacity: f32) -> Color {
    Color {
        a: color.a * opacity,
        ..color
    }
}

pub struct StageCanvas<'a> {
    stage: &'a MainVideoContainer,
    zoom_in: iced_core::svg::Handle,
    zoom_out: iced_core::svg::Handle,
}

impl<'a> std::fmt::Debug for StageCanvas<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StageCanvas")
    }
}

impl<'a> StageCanvas<'a> {
    pub fn new(stage: &'a MainVideoContainer) -> Self {
        Self {
            stage,
            zoom_in: iced_core::svg::Handle::from_memory(ICON_ZOOM_IN.as_bytes()),
            zoom_out: iced_core::svg::Handle::from_memory(ICON_ZOOM_OUT.as_bytes()),
        }
    }

    fn draw_stage(&self, frame: &mut Frame, now: Instant) {
        let theme = self.stage.theme();
        let size = frame.size();

        let background = Path::rounded_rectangle(Point::ORIGIN, size, theme.corner_radius.into());
        frame.fill(&background, theme.members_color);

        for id in self.stage.display_list().iter() {
            let Some(node) = self.stage.node(id) else {
                continue;
            };
            match node {
                NodeRef::Video(layer, surface) => {
                    let rect = layer.presentation_frame(now);
                    surface.draw(frame, rect.position(), layer.presentation_opacity(now), now);
                }
                NodeRef::Shadow(layer) => draw_shadow(frame, theme, layer, now),
                NodeRef::ZoomButton(layer, icon) => {
                    let handle = match icon {
                        ZoomIcon::ZoomIn => &self.zoom_in,
                        ZoomIcon::ZoomOut => &self.zoom_out,
                    };
                    let svg = iced_core::svg::Svg::new(handle.clone())
                        .color(theme.button_color)
                        .opacity(layer.presentation_opacity(now));
                    frame.draw_svg(layer.presentation_frame(now), svg);
                }
                NodeRef::Label(layer, label) => {
                    let opacity = layer.presentation_opacity(now);
                    if opacity <= 0.0 || label.displayed_text().is_empty() {
                        continue;
                    }
                    let style = label.style();
                    frame.fill_text(canvas::Text {
                        content: label.displayed_text().to_string(),
                        position: layer.presentation_frame(now).position(),
                        color: with_alpha(style.color, opacity),
                        size: Pixels(style.size),
                        font: style.font,
                        line_height: LineHeight::Relative(LINE_HEIGHT),
                        shaping: Shaping::Advanced,
                        ..Default::default()
                    });
                }
                NodeRef::SpeakingBorder(layer) => {
                    let opacity = layer.presentation_opacity(now);
                    if opacity <= 0.0 {
                        continue;
                    }
                    let rect = layer.presentation_frame(now);
                    let inset = theme.border_width / 2.0;
                    let border = Path::rounded_rectangle(
                        Point::new(rect.x + inset, rect.y + inset),
                        Size::new(
                            (rect.width - theme.border_width).max(0.0),
                            (rect.height - theme.border_width).max(0.0),
                        ),
                        theme.corner_radius.into(),
                    );
                    frame.stroke(
                        &border,
                        Stroke::default()
                            .with_color(with_alpha(theme.speak_active_color, opacity))
                            .with_width(theme.border_width),
                    );
                }
            }
        }
    }
}

fn draw_shadow(frame: &mut Frame, theme: &CallTheme, layer: &Layer, now: Instant) {
    let opacity = layer.presentation_opacity(now);
    if opacity <= 0.0 {
        return;
    }
    let rect = layer.presentation_frame(now);
    let linear = gradient::Linear::new(
        Point::new(rect.x, rect.y),
        Point::new(rect.x, rect.y + rect.height),
    )
    .add_stop(0.0, Color::TRANSPARENT)
    .add_stop(1.0, with_alpha(theme.shadow_color, opacity));
    frame.fill_rectangle(
        rect.position(),
        rect.size(),
        Fill {
            style: Style::Gradient(Gradient::Linear(linear)),
            rule: fill::Rule::NonZero,
        },
    );
}

impl<'a, Message> canvas::Program<Message> for StageCanvas<'a> {
    type State = ();

    fn draw(
        &self,
        _state: &(),
        renderer: &iced::Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        self.draw_stage(&mut frame, self.stage.clock_now());
        vec![frame.into_geometry()]
    }
}

impl MainVideoContainer {
    /// Canvas element drawing the stage at its current presentation state.
    pub fn view<'a, Message: 'a>(&'a self) -> iced::Element<'a, Message, Theme, iced::Renderer> {
        canvas(StageCanvas::new(self))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

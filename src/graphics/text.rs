//! Single-line labels for the stage overlay.
//!
//! Widths come from a [`TextMeasurer`]. [`ShapedText`] shapes through the
//! same font system the canvas renders with; [`GlyphMetrics`] is a fixed-ratio
//! stand-in with deterministic numbers for tests.

use iced::{Color, Font, Pixels, Size};
use iced_core::text::{Alignment, LineHeight, Paragraph as _, Shaping, Text, Wrapping};
use iced_wgpu::graphics::text::Paragraph;

/// Geist Medium, used for the participant name.
pub const NAME_FONT: Font = Font {
    family: iced::font::Family::Name("Geist"),
    weight: iced::font::Weight::Medium,
    stretch: iced::font::Stretch::Normal,
    style: iced::font::Style::Normal,
};

/// Geist Regular, used for the status line.
pub const STATUS_FONT: Font = Font::with_name("Geist");

/// Line height of overlay labels, relative to the font size.
pub const LINE_HEIGHT: f32 = 1.25;

const ELLIPSIS: char = '\u{2026}';

pub trait TextMeasurer: Send + Sync + std::fmt::Debug {
    /// Advance width of `text` laid out on a single line.
    fn width(&self, text: &str, style: &LabelStyle) -> f32;

    fn line_height(&self, style: &LabelStyle) -> f32 {
        (style.size * LINE_HEIGHT).ceil()
    }
}

/// Measures with iced's text engine, using whatever fonts were registered
/// through [`crate::graphics::fonts::load_fonts`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapedText;

impl TextMeasurer for ShapedText {
    fn width(&self, text: &str, style: &LabelStyle) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        let paragraph = Paragraph::with_text(Text {
            content: text,
            bounds: Size::INFINITE,
            size: Pixels(style.size),
            line_height: LineHeight::Relative(LINE_HEIGHT),
            font: style.font,
            align_x: Alignment::Default,
            align_y: iced_core::alignment::Vertical::Top,
            shaping: Shaping::Advanced,
            wrapping: Wrapping::None,
        });
        paragraph.min_bounds().width
    }
}

/// Fixed-ratio advances: wide scripts take a full em, spaces a third.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlyphMetrics;

fn is_wide(ch: char) -> bool {
    matches!(ch as u32,
        0x1100..=0x115F
        | 0x2E80..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x1F300..=0x1FAFF)
}

impl GlyphMetrics {
    pub fn advance(&self, ch: char, style: &LabelStyle) -> f32 {
        let ratio = if ch == ' ' {
            0.3
        } else if is_wide(ch) {
            1.0
        } else if style.font.weight == iced::font::Weight::Medium {
            0.58
        } else {
            0.55
        };
        style.size * ratio
    }
}

impl TextMeasurer for GlyphMetrics {
    fn width(&self, text: &str, style: &LabelStyle) -> f32 {
        text.chars().map(|ch| self.advance(ch, style)).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelStyle {
    pub font: Font,
    pub size: f32,
    pub color: Color,
}

/// A one-line label measured against a maximum width. Text that does not fit
/// is cut and ends with an ellipsis.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    text: String,
    displayed: String,
    style: LabelStyle,
    size: Size,
}

impl TextLabel {
    /// Builds and measures a label in one step.
    pub fn new(
        text: impl Into<String>,
        style: LabelStyle,
        max_width: f32,
        measurer: &dyn TextMeasurer,
    ) -> Self {
        let mut label = Self {
            text: text.into(),
            displayed: String::new(),
            style,
            size: Size::ZERO,
        };
        label.resize(max_width, measurer);
        label
    }

    pub fn empty(style: LabelStyle) -> Self {
        Self {
            text: String::new(),
            displayed: String::new(),
            style,
            size: Size::ZERO,
        }
    }

    /// Full text, before truncation.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// What actually gets drawn.
    pub fn displayed_text(&self) -> &str {
        &self.displayed
    }

    pub fn style(&self) -> &LabelStyle {
        &self.style
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn is_truncated(&self) -> bool {
        self.displayed != self.text
    }

    /// Re-measures against `max_width`.
    pub fn resize(&mut self, max_width: f32, measurer: &dyn TextMeasurer) {
        if self.text.is_empty() {
            self.displayed.clear();
            self.size = Size::ZERO;
            return;
        }

        let max_width = max_width.max(0.0);
        let height = measurer.line_height(&self.style);
        let natural = measurer.width(&self.text, &self.style);
        if natural <= max_width {
            self.displayed = self.text.clone();
            self.size = Size::new(natural.ceil(), height);
            return;
        }

        let ellipsis = ELLIPSIS.to_string();
        let ellipsis_width = measurer.width(&ellipsis, &self.style);
        if ellipsis_width > max_width {
            self.displayed.clear();
            self.size = Size::new(0.0, height);
            return;
        }

        // Longest prefix that still fits together with the ellipsis.
        let mut fitted = (ellipsis, ellipsis_width);
        for (end, _) in self.text.char_indices().skip(1) {
            let candidate = format!("{}{ELLIPSIS}", self.text[..end].trim_end());
            let width = measurer.width(&candidate, &self.style);
            if width > max_width {
                break;
            }
            fitted = (candidate, width);
        }

        let (displayed, width) = fitted;
        self.displayed = displayed;
        self.size = Size::new(width.ceil().min(max_width), height);
    }
}

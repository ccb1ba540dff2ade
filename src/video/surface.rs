//! Video surfaces the call hands to the stage.

use std::sync::Arc;
use std::time::Instant;

use iced::widget::canvas::Frame;
use iced::{Color, Point, Rectangle, Size};
use parking_lot::Mutex;

use crate::dominant::{ParticipantId, VideoSourceMode};
use crate::graphics::layer::{Animation, Lerp};
use crate::graphics::transition::{Curve, LayoutTransition, DEFAULT_TRANSITION};
use crate::video::buffer::VideoBufferManager;

/// How the video image is scaled into the surface bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentFit {
    /// Whole image visible, letterboxed.
    #[default]
    AspectFit,
    /// Bounds fully covered, image cropped.
    Fill,
}

impl ContentFit {
    /// Rectangle the content occupies inside `bounds`; may exceed `bounds` for `Fill`.
    pub fn fitted_rect(self, bounds: Rectangle, content: Size) -> Rectangle {
        if content.width <= 0.0 || content.height <= 0.0 {
            return bounds;
        }
        let sx = bounds.width / content.width;
        let sy = bounds.height / content.height;
        let scale = match self {
            ContentFit::AspectFit => sx.min(sy),
            ContentFit::Fill => sx.max(sy),
        };
        let size = Size::new(content.width * scale, content.height * scale);
        Rectangle::new(
            Point::new(
                bounds.x + (bounds.width - size.width) / 2.0,
                bounds.y + (bounds.height - size.height) / 2.0,
            ),
            size,
        )
    }
}

pub trait VideoSurface: std::fmt::Debug {
    fn participant_id(&self) -> ParticipantId;
    fn mode(&self) -> VideoSourceMode;

    fn content_fit(&self) -> ContentFit;
    fn set_content_fit(&mut self, fit: ContentFit, animated: bool, now: Instant);

    /// Called by the stage after it moved the surface to fill `size`.
    fn update_layout(&mut self, size: Size, transition: LayoutTransition, now: Instant);

    /// Pixel size of the current content, `None` while nothing was received.
    fn content_size(&self) -> Option<Size>;

    /// Where the image lands in surface-local coordinates at `now`.
    fn video_rect(&self, now: Instant) -> Rectangle;

    fn is_placeholder(&self) -> bool {
        self.content_size().is_none()
    }

    /// Draws the content into `frame`; `origin` is the surface's top-left
    /// corner in frame coordinates.
    fn draw(&self, frame: &mut Frame, origin: Point, opacity: f32, now: Instant);
}

/// Surface backed by the frames a [`VideoBufferManager`] publishes.
#[derive(Debug)]
pub struct BufferedVideoSurface {
    participant_id: ParticipantId,
    mode: VideoSourceMode,
    buffers: Arc<VideoBufferManager>,
    fit: ContentFit,
    fit_animation: Option<(ContentFit, Animation<f32>)>,
    size: Size,
    uploaded: Mutex<Option<(u64, iced_core::image::Handle)>>,
}

impl BufferedVideoSurface {
    pub fn new(
        participant_id: ParticipantId,
        mode: VideoSourceMode,
        buffers: Arc<VideoBufferManager>,
    ) -> Self {
        Self {
            participant_id,
            mode,
            buffers,
            fit: ContentFit::default(),
            fit_animation: None,
            size: Size::ZERO,
            uploaded: Mutex::new(None),
        }
    }

    pub fn buffers(&self) -> &Arc<VideoBufferManager> {
        &self.buffers
    }

    fn bounds(&self) -> Rectangle {
        Rectangle::new(Point::ORIGIN, self.size)
    }

    /// Image handle for the latest frame, re-uploaded only when a new frame arrived.
    fn image_handle(&self) -> Option<iced_core::image::Handle> {
        let sequence = self.buffers.sequence();
        let mut uploaded = self.uploaded.lock();
        if let Some((seen, handle)) = uploaded.as_ref() {
            if *seen == sequence {
                return Some(handle.clone());
            }
        }
        let frame = self.buffers.latest_frame().lock();
        if frame.is_empty() {
            return None;
        }
        let handle =
            iced_core::image::Handle::from_rgba(frame.width, frame.height, frame.to_rgba());
        *uploaded = Some((sequence, handle.clone()));
        Some(handle)
    }
}

impl VideoSurface for BufferedVideoSurface {
    fn participant_id(&self) -> ParticipantId {
        self.participant_id
    }

    fn mode(&self) -> VideoSourceMode {
        self.mode
    }

    fn content_fit(&self) -> ContentFit {
        self.fit
    }

    fn set_content_fit(&mut self, fit: ContentFit, animated: bool, now: Instant) {
        if fit == self.fit {
            return;
        }
        log::debug!(
            "BufferedVideoSurface::set_content_fit: participant={} {:?} -> {:?} animated={}",
            self.participant_id,
            self.fit,
            fit,
            animated
        );
        self.fit_animation = if animated {
            Some((
                self.fit,
                Animation::new(0.0, 1.0, now, DEFAULT_TRANSITION, Curve::EaseOut),
            ))
        } else {
            None
        };
        self.fit = fit;
    }

    fn update_layout(&mut self, size: Size, _transition: LayoutTransition, _now: Instant) {
        self.size = size;
    }

    fn content_size(&self) -> Option<Size> {
        self.buffers
            .latest_dimensions()
            .map(|(w, h)| Size::new(w as f32, h as f32))
    }

    fn video_rect(&self, now: Instant) -> Rectangle {
        let bounds = self.bounds();
        let Some(content) = self.content_size() else {
            return bounds;
        };
        let target = self.fit.fitted_rect(bounds, content);
        match &self.fit_animation {
            Some((from, animation)) if !animation.is_finished(now) => Rectangle::lerp(
                from.fitted_rect(bounds, content),
                target,
                animation.value_at(now),
            ),
            _ => target,
        }
    }

    fn draw(&self, frame: &mut Frame, origin: Point, opacity: f32, now: Instant) {
        let Some(handle) = self.image_handle() else {
            return;
        };
        let local = self.video_rect(now);
        let rect = Rectangle {
            x: origin.x + local.x,
            y: origin.y + local.y,
            ..local
        };
        let clip = Rectangle::new(origin, self.size);
        frame.with_clip(clip, |frame| {
            // with_clip translates to the clip origin.
            let rect = Rectangle {
                x: rect.x - clip.x,
                y: rect.y - clip.y,
                ..rect
            };
            frame.fill_rectangle(
                Point::ORIGIN,
                clip.size(),
                Color::from_rgba(0.0, 0.0, 0.0, opacity),
            );
            frame.draw_image(
                rect,
                iced_core::image::Image::new(handle).opacity(opacity),
            );
        });
    }
}

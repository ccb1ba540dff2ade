//! Model and presentation state of one stage node.
//!
//! A layer stores the *model* values the container asked for and, while an
//! animation runs, derives *presentation* values from the clock. Rendering
//! reads presentation values; layout logic and tests read model values.

use std::time::{Duration, Instant};

use iced::{Rectangle, Vector};

use crate::graphics::transition::Curve;

pub trait Lerp: Copy {
    fn lerp(from: Self, to: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(from: Self, to: Self, t: f32) -> Self {
        from + (to - from) * t
    }
}

impl Lerp for Vector {
    fn lerp(from: Self, to: Self, t: f32) -> Self {
        Vector::new(f32::lerp(from.x, to.x, t), f32::lerp(from.y, to.y, t))
    }
}

impl Lerp for Rectangle {
    fn lerp(from: Self, to: Self, t: f32) -> Self {
        Rectangle {
            x: f32::lerp(from.x, to.x, t),
            y: f32::lerp(from.y, to.y, t),
            width: f32::lerp(from.width, to.width, t),
            height: f32::lerp(from.height, to.height, t),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Animation<T: Lerp> {
    from: T,
    to: T,
    start: Instant,
    duration: Duration,
    curve: Curve,
}

impl<T: Lerp> Animation<T> {
    pub fn new(from: T, to: T, start: Instant, duration: Duration, curve: Curve) -> Self {
        Self {
            from,
            to,
            start,
            duration,
            curve,
        }
    }

    fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn value_at(&self, now: Instant) -> T {
        T::lerp(self.from, self.to, self.curve.apply(self.progress(now)))
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    pub fn end_time(&self) -> Instant {
        self.start + self.duration
    }
}

#[derive(Debug, Clone)]
pub struct Layer {
    frame: Rectangle,
    opacity: f32,
    frame_animation: Option<Animation<Rectangle>>,
    opacity_animation: Option<Animation<f32>>,
    offset_animation: Option<Animation<Vector>>,
}

impl Default for Layer {
    fn default() -> Self {
        Self::new(Rectangle::default(), 1.0)
    }
}

impl Layer {
    pub fn new(frame: Rectangle, opacity: f32) -> Self {
        Self {
            frame,
            opacity,
            frame_animation: None,
            opacity_animation: None,
            offset_animation: None,
        }
    }

    pub fn frame(&self) -> Rectangle {
        self.frame
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Sets the model frame and drops any running frame animation.
    pub fn set_frame(&mut self, frame: Rectangle) {
        self.frame = frame;
        self.frame_animation = None;
    }

    /// Sets the model opacity and drops any running opacity animation.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
        self.opacity_animation = None;
    }

    pub fn animate_frame(&mut self, to: Rectangle, animation: Animation<Rectangle>) {
        self.frame = to;
        self.frame_animation = Some(animation);
    }

    pub fn animate_opacity(&mut self, to: f32, animation: Animation<f32>) {
        self.opacity = to.clamp(0.0, 1.0);
        self.opacity_animation = Some(animation);
    }

    /// Additive slide on top of the frame; the model frame is untouched.
    pub fn animate_offset(&mut self, animation: Animation<Vector>) {
        self.offset_animation = Some(animation);
    }

    /// Frame at `now` without the slide offset.
    pub fn animated_frame(&self, now: Instant) -> Rectangle {
        match &self.frame_animation {
            Some(animation) if !animation.is_finished(now) => animation.value_at(now),
            _ => self.frame,
        }
    }

    pub fn presentation_frame(&self, now: Instant) -> Rectangle {
        let base = self.animated_frame(now);
        match &self.offset_animation {
            Some(animation) => {
                let offset = animation.value_at(now);
                Rectangle {
                    x: base.x + offset.x,
                    y: base.y + offset.y,
                    ..base
                }
            }
            None => base,
        }
    }

    pub fn presentation_opacity(&self, now: Instant) -> f32 {
        match &self.opacity_animation {
            Some(animation) if !animation.is_finished(now) => {
                animation.value_at(now).clamp(0.0, 1.0)
            }
            _ => self.opacity,
        }
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.frame_animation
            .as_ref()
            .is_some_and(|a| !a.is_finished(now))
            || self
                .opacity_animation
                .as_ref()
                .is_some_and(|a| !a.is_finished(now))
            || self
                .offset_animation
                .as_ref()
                .is_some_and(|a| !a.is_finished(now))
    }

    /// Instant at which the opacity animation completes, if one is running.
    pub fn opacity_animation_end(&self) -> Option<Instant> {
        self.opacity_animation.as_ref().map(|a| a.end_time())
    }

    /// Drops animations that reached their end. Offset slides return to zero.
    pub fn finish_animations(&mut self, now: Instant) {
        if self.frame_animation.is_some_and(|a| a.is_finished(now)) {
            self.frame_animation = None;
        }
        if self.opacity_animation.is_some_and(|a| a.is_finished(now)) {
            self.opacity_animation = None;
        }
        if self.offset_animation.is_some_and(|a| a.is_finished(now)) {
            self.offset_animation = None;
        }
    }
}

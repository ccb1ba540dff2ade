use std::time::{Duration, Instant};

use iced::{Rectangle, Vector};

use crate::graphics::layer::{Animation, Layer};

/// Default duration for animated layout and chrome changes.
pub const DEFAULT_TRANSITION: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    Linear,
    EaseOut,
    /// Slight overshoot before settling.
    Spring,
}

impl Curve {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Curve::Linear => t,
            Curve::EaseOut => simple_easing::cubic_out(t),
            Curve::Spring => simple_easing::back_out(t),
        }
    }
}

/// How a layout pass applies frame and opacity changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutTransition {
    #[default]
    Immediate,
    Animated { duration: Duration, curve: Curve },
}

impl LayoutTransition {
    pub fn animated() -> Self {
        LayoutTransition::Animated {
            duration: DEFAULT_TRANSITION,
            curve: Curve::EaseOut,
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, LayoutTransition::Animated { .. })
    }

    /// Moves `layer` to `frame`. Animated transitions start from the frame the
    /// layer is currently animating through; a running slide is kept on top.
    pub fn update_frame(&self, layer: &mut Layer, frame: Rectangle, now: Instant) {
        match *self {
            LayoutTransition::Immediate => layer.set_frame(frame),
            LayoutTransition::Animated { duration, curve } => {
                if layer.frame() == frame {
                    return;
                }
                let from = layer.animated_frame(now);
                layer.animate_frame(frame, Animation::new(from, frame, now, duration, curve));
            }
        }
    }

    pub fn update_alpha(&self, layer: &mut Layer, alpha: f32, now: Instant) {
        match *self {
            LayoutTransition::Immediate => layer.set_opacity(alpha),
            LayoutTransition::Animated { duration, curve } => {
                if layer.opacity() == alpha {
                    return;
                }
                let from = layer.presentation_opacity(now);
                layer.animate_opacity(alpha, Animation::new(from, alpha, now, duration, curve));
            }
        }
    }
}

/// Explicit fade regardless of the layer's current value, used for label swaps.
pub fn animate_alpha(layer: &mut Layer, from: f32, to: f32, duration: Duration, now: Instant) {
    layer.animate_opacity(to, Animation::new(from, to, now, duration, Curve::EaseOut));
}

/// Explicit slide from `from` to `to`, relative to the layer's frame.
pub fn animate_position(
    layer: &mut Layer,
    from: Vector,
    to: Vector,
    duration: Duration,
    now: Instant,
) {
    layer.animate_offset(Animation::new(from, to, now, duration, Curve::EaseOut));
}

#[cfg(test)]
mod tests {
    use super::*;
    use iced::{Point, Size};

    #[test]
    fn immediate_sets_model_directly() {
        let now = Instant::now();
        let mut layer = Layer::default();
        let frame = Rectangle::new(Point::new(1.0, 2.0), Size::new(3.0, 4.0));

        LayoutTransition::Immediate.update_frame(&mut layer, frame, now);
        LayoutTransition::Immediate.update_alpha(&mut layer, 0.25, now);

        assert_eq!(layer.frame(), frame);
        assert_eq!(layer.presentation_frame(now), frame);
        assert_eq!(layer.presentation_opacity(now), 0.25);
    }

    #[test]
    fn animated_starts_from_presented_value() {
        let now = Instant::now();
        let mut layer = Layer::default();
        let transition = LayoutTransition::animated();

        transition.update_alpha(&mut layer, 0.0, now);
        assert_eq!(layer.opacity(), 0.0);
        assert_eq!(layer.presentation_opacity(now), 1.0);
        assert!(layer.is_animating(now));

        let later = now + DEFAULT_TRANSITION;
        assert_eq!(layer.presentation_opacity(later), 0.0);
    }

    #[test]
    fn animated_noop_when_value_unchanged() {
        let now = Instant::now();
        let mut layer = Layer::default();
        LayoutTransition::animated().update_alpha(&mut layer, 1.0, now);
        assert!(!layer.is_animating(now));
    }

    #[test]
    fn curves_hit_endpoints() {
        for curve in [Curve::Linear, Curve::EaseOut, Curve::Spring] {
            assert!(curve.apply(0.0).abs() < 1e-5);
            assert!((curve.apply(1.0) - 1.0).abs() < 1e-5);
        }
    }
}

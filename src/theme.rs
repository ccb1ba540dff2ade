//! Theming for the stage, passed explicitly to the container.
//!
//! Defaults follow the dark group-call palette. A theme can be loaded from a
//! JSON file where every field is optional, e.g.
//! `{"speak_active_color": "#4DB8FF", "corner_radius": 12}`.

use std::path::Path;
use std::time::Duration;

use iced::Color;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("Failed to read theme file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse theme: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid hex color: {0}")]
    InvalidColor(String),
}

/// Parses `#RRGGBB` or `#RRGGBBAA`.
pub fn parse_hex_color(hex: &str) -> Result<Color, ThemeError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if !digits.is_ascii() || (digits.len() != 6 && digits.len() != 8) {
        return Err(ThemeError::InvalidColor(hex.to_string()));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|_| ThemeError::InvalidColor(hex.to_string()))
    };
    let r = channel(0)?;
    let g = channel(2)?;
    let b = channel(4)?;
    let a = if digits.len() == 8 { channel(6)? } else { 255 };
    Ok(Color::from_rgba8(r, g, b, a as f32 / 255.0))
}

fn hex_color<'de, D>(deserializer: D) -> Result<Color, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_hex_color(&value).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CallTheme {
    /// Stage background shown behind (or instead of) the video.
    #[serde(deserialize_with = "hex_color")]
    pub members_color: Color,
    /// Speaking border color.
    #[serde(deserialize_with = "hex_color")]
    pub speak_active_color: Color,
    /// Darkest stop of the bottom shadow gradient.
    #[serde(deserialize_with = "hex_color")]
    pub shadow_color: Color,
    #[serde(deserialize_with = "hex_color")]
    pub label_color: Color,
    #[serde(deserialize_with = "hex_color")]
    pub button_color: Color,
    pub corner_radius: f32,
    pub border_width: f32,
    pub shadow_height: f32,
    /// Inset of the name label and zoom button from the stage edges.
    pub margin: f32,
    /// Gap between the name and status labels.
    pub label_spacing: f32,
    pub name_font_size: f32,
    pub status_font_size: f32,
    /// Audio level mapped to a fully opaque speaking border.
    pub audio_level_max: f32,
    pub zoom_icon_size: f32,
    pub status_fade_millis: u64,
    pub status_slide: f32,
}

impl Default for CallTheme {
    fn default() -> Self {
        Self {
            members_color: Color::from_rgb8(33, 33, 33),
            speak_active_color: Color::from_rgb8(77, 184, 255),
            shadow_color: Color::from_rgba(0.0, 0.0, 0.0, 0.3),
            label_color: Color::from_rgba(1.0, 1.0, 1.0, 0.8),
            button_color: Color::WHITE,
            corner_radius: 10.0,
            border_width: 2.0,
            shadow_height: 50.0,
            margin: 10.0,
            label_spacing: 10.0,
            name_font_size: 13.0,
            status_font_size: 13.0,
            audio_level_max: 6.0,
            zoom_icon_size: 24.0,
            status_fade_millis: 200,
            status_slide: 10.0,
        }
    }
}

impl CallTheme {
    pub fn from_json_str(json: &str) -> Result<Self, ThemeError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ThemeError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let theme = Self::from_json_str(&contents)?;
        log::info!("CallTheme::load: loaded {}", path.as_ref().display());
        Ok(theme)
    }

    pub fn status_fade(&self) -> Duration {
        Duration::from_millis(self.status_fade_millis)
    }
}

//! Strings shown on the stage overlay.
//!
//! The container never reaches for global locale state; whoever builds the
//! [`crate::arguments::CallContext`] picks a [`Localization`] provider.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocalizationError {
    #[error("Failed to read strings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse strings: {0}")]
    Parse(#[from] serde_json::Error),
}

pub trait Localization: Send + Sync + std::fmt::Debug {
    /// Name shown instead of the local account's own title.
    fn you(&self) -> String;
    fn status_speaking(&self) -> String;
    fn status_listening(&self) -> String;
    fn status_muted(&self) -> String;
    fn status_video_paused(&self) -> String;
    fn status_sharing_screen(&self) -> String;
    fn status_raised_hand(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishStrings;

impl Localization for EnglishStrings {
    fn you(&self) -> String {
        "You".to_string()
    }

    fn status_speaking(&self) -> String {
        "speaking".to_string()
    }

    fn status_listening(&self) -> String {
        "listening".to_string()
    }

    fn status_muted(&self) -> String {
        "muted".to_string()
    }

    fn status_video_paused(&self) -> String {
        "video paused".to_string()
    }

    fn status_sharing_screen(&self) -> String {
        "sharing screen".to_string()
    }

    fn status_raised_hand(&self) -> String {
        "wants to speak".to_string()
    }
}

/// Key/value table loaded from JSON, e.g. `{"you": "Du", "status_muted": "stumm"}`.
///
/// Missing keys fall back to English.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct StringTable {
    entries: HashMap<String, String>,
}

impl StringTable {
    pub fn from_json_str(json: &str) -> Result<Self, LocalizationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LocalizationError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let table = Self::from_json_str(&contents)?;
        log::info!(
            "StringTable::load: {} entries from {}",
            table.entries.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    fn lookup(&self, key: &str, fallback: impl FnOnce() -> String) -> String {
        match self.entries.get(key) {
            Some(value) => value.clone(),
            None => fallback(),
        }
    }
}

impl Localization for StringTable {
    fn you(&self) -> String {
        self.lookup("you", || EnglishStrings.you())
    }

    fn status_speaking(&self) -> String {
        self.lookup("status_speaking", || EnglishStrings.status_speaking())
    }

    fn status_listening(&self) -> String {
        self.lookup("status_listening", || EnglishStrings.status_listening())
    }

    fn status_muted(&self) -> String {
        self.lookup("status_muted", || EnglishStrings.status_muted())
    }

    fn status_video_paused(&self) -> String {
        self.lookup("status_video_paused", || {
            EnglishStrings.status_video_paused()
        })
    }

    fn status_sharing_screen(&self) -> String {
        self.lookup("status_sharing_screen", || {
            EnglishStrings.status_sharing_screen()
        })
    }

    fn status_raised_hand(&self) -> String {
        self.lookup("status_raised_hand", || EnglishStrings.status_raised_hand())
    }
}

//! Per-participant audio level stream and the single live subscription the
//! stage keeps on it.
//!
//! Producers (the call's audio pipeline) push `Option<f32>` levels from any
//! thread; `None` means "no level available right now". The UI thread drains
//! the subscription once per frame.

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AudioLevelError {
    #[error("Audio level subscription is closed")]
    Closed,
}

/// Maps a raw level onto speaking-border opacity in `0.0..=1.0`.
///
/// Values are clamped to `max` before normalizing; a missing value is silence.
pub fn normalized_level(value: Option<f32>, max: f32) -> f32 {
    match value {
        Some(level) if max > 0.0 && level.is_finite() => level.clamp(0.0, max) / max,
        _ => 0.0,
    }
}

pub fn audio_level_channel() -> (AudioLevelSender, AudioLevelStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (AudioLevelSender { tx }, AudioLevelStream { rx })
}

#[derive(Debug, Clone)]
pub struct AudioLevelSender {
    tx: mpsc::UnboundedSender<Option<f32>>,
}

impl AudioLevelSender {
    pub fn send(&self, level: Option<f32>) -> Result<(), AudioLevelError> {
        self.tx.send(level).map_err(|_| AudioLevelError::Closed)
    }

    /// True once the subscriber cancelled or went away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Not-yet-subscribed side of an audio level channel.
#[derive(Debug)]
pub struct AudioLevelStream {
    rx: mpsc::UnboundedReceiver<Option<f32>>,
}

impl AudioLevelStream {
    pub fn subscribe(self) -> AudioLevelSubscription {
        AudioLevelSubscription {
            rx: Some(self.rx),
            producer_gone: false,
        }
    }
}

/// Handle to a live subscription. Cancelling (or dropping) it closes the
/// channel, so the producer observes `AudioLevelError::Closed`.
#[derive(Debug)]
pub struct AudioLevelSubscription {
    rx: Option<mpsc::UnboundedReceiver<Option<f32>>>,
    producer_gone: bool,
}

impl AudioLevelSubscription {
    pub fn cancel(&mut self) {
        if let Some(mut rx) = self.rx.take() {
            rx.close();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.is_none()
    }

    /// True once every sender has been dropped and the queue is empty.
    pub fn producer_gone(&self) -> bool {
        self.producer_gone
    }

    /// Takes every pending value and returns the newest one, or `None` if
    /// nothing arrived since the last drain.
    pub fn drain(&mut self) -> Option<Option<f32>> {
        let rx = self.rx.as_mut()?;
        let mut latest = None;
        loop {
            match rx.try_recv() {
                Ok(level) => latest = Some(level),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.producer_gone = true;
                    break;
                }
            }
        }
        latest
    }
}

impl Drop for AudioLevelSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Holds at most one subscription; storing a new one cancels the old one first.
#[derive(Debug, Default)]
pub struct SubscriptionSlot {
    current: Option<AudioLevelSubscription>,
}

impl SubscriptionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, subscription: Option<AudioLevelSubscription>) {
        if let Some(mut previous) = self.current.take() {
            previous.cancel();
        }
        self.current = subscription;
    }

    pub fn is_active(&self) -> bool {
        self.current.as_ref().is_some_and(|s| !s.is_cancelled())
    }

    pub fn get_mut(&mut self) -> Option<&mut AudioLevelSubscription> {
        self.current.as_mut()
    }

    pub fn dispose(&mut self) {
        self.set(None);
    }
}

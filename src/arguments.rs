//! What the stage needs from the call around it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::audio::level::{audio_level_channel, AudioLevelSender, AudioLevelStream};
use crate::dominant::{ParticipantId, VideoSourceMode};
use crate::graphics::text::{ShapedText, TextMeasurer};
use crate::localization::{EnglishStrings, Localization};
use crate::theme::CallTheme;
use crate::utils::clock::{system_clock, Clock};
use crate::video::buffer::VideoBufferManager;
use crate::video::surface::{BufferedVideoSurface, VideoSurface};

/// Callbacks supplied with every dominant update.
///
/// Both lookups may come back empty; the stage then simply goes without
/// video or without a live speaking border.
pub trait CallArguments {
    fn take_video(
        &self,
        participant_id: ParticipantId,
        mode: VideoSourceMode,
    ) -> Option<Box<dyn VideoSurface>>;

    fn audio_level(&self, participant_id: ParticipantId) -> Option<AudioLevelStream>;
}

/// Long-lived dependencies of the stage, fixed at construction.
#[derive(Debug, Clone)]
pub struct CallContext {
    account_participant_id: ParticipantId,
    theme: Arc<CallTheme>,
    strings: Arc<dyn Localization>,
    measurer: Arc<dyn TextMeasurer>,
    clock: Arc<dyn Clock>,
}

impl CallContext {
    pub fn new(account_participant_id: ParticipantId) -> Self {
        Self {
            account_participant_id,
            theme: Arc::new(CallTheme::default()),
            strings: Arc::new(EnglishStrings),
            measurer: Arc::new(ShapedText),
            clock: system_clock(),
        }
    }

    pub fn with_theme(mut self, theme: CallTheme) -> Self {
        self.theme = Arc::new(theme);
        self
    }

    pub fn with_strings(mut self, strings: Arc<dyn Localization>) -> Self {
        self.strings = strings;
        self
    }

    pub fn with_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = measurer;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The participant that represents the local account.
    pub fn account_participant_id(&self) -> ParticipantId {
        self.account_participant_id
    }

    pub fn theme(&self) -> &CallTheme {
        &self.theme
    }

    pub fn strings(&self) -> &dyn Localization {
        self.strings.as_ref()
    }

    pub fn measurer(&self) -> &dyn TextMeasurer {
        self.measurer.as_ref()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

/// In-process media registry: per-source frame buffers and audio level fan-out.
///
/// Implements [`CallArguments`] for hosts that receive media themselves and
/// only need to hand it to the stage.
#[derive(Debug, Default)]
pub struct MediaRegistry {
    video: Mutex<HashMap<(ParticipantId, VideoSourceMode), Arc<VideoBufferManager>>>,
    audio: Mutex<HashMap<ParticipantId, Vec<AudioLevelSender>>>,
}

impl MediaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the frame buffers for a source, creating them on first use.
    pub fn video_buffers(
        &self,
        participant_id: ParticipantId,
        mode: VideoSourceMode,
    ) -> Arc<VideoBufferManager> {
        self.video
            .lock()
            .entry((participant_id, mode))
            .or_insert_with(|| {
                log::info!(
                    "MediaRegistry::video_buffers: new source participant={} mode={:?}",
                    participant_id,
                    mode
                );
                Arc::new(VideoBufferManager::new())
            })
            .clone()
    }

    pub fn remove_video(&self, participant_id: ParticipantId, mode: VideoSourceMode) {
        log::info!(
            "MediaRegistry::remove_video: participant={} mode={:?}",
            participant_id,
            mode
        );
        self.video.lock().remove(&(participant_id, mode));
    }

    /// Marks a participant as able to report audio levels.
    pub fn enable_audio_levels(&self, participant_id: ParticipantId) {
        self.audio.lock().entry(participant_id).or_default();
    }

    /// Pushes a level to every live subscriber of `participant_id`, dropping
    /// subscribers that went away. Returns how many received it.
    pub fn publish_audio_level(&self, participant_id: ParticipantId, level: Option<f32>) -> usize {
        let mut audio = self.audio.lock();
        let Some(senders) = audio.get_mut(&participant_id) else {
            return 0;
        };
        senders.retain(|sender| sender.send(level).is_ok());
        senders.len()
    }

    pub fn audio_subscribers(&self, participant_id: ParticipantId) -> usize {
        self.audio
            .lock()
            .get(&participant_id)
            .map_or(0, |senders| senders.iter().filter(|s| !s.is_closed()).count())
    }
}

impl CallArguments for MediaRegistry {
    fn take_video(
        &self,
        participant_id: ParticipantId,
        mode: VideoSourceMode,
    ) -> Option<Box<dyn VideoSurface>> {
        let buffers = self.video.lock().get(&(participant_id, mode)).cloned()?;
        Some(Box::new(BufferedVideoSurface::new(
            participant_id,
            mode,
            buffers,
        )))
    }

    fn audio_level(&self, participant_id: ParticipantId) -> Option<AudioLevelStream> {
        let mut audio = self.audio.lock();
        let senders = audio.get_mut(&participant_id)?;
        senders.retain(|sender| !sender.is_closed());
        let (sender, stream) = audio_level_channel();
        senders.push(sender);
        Some(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_video_requires_registered_source() {
        let registry = MediaRegistry::new();
        let alice = ParticipantId(1);

        assert!(registry.take_video(alice, VideoSourceMode::Video).is_none());

        registry.video_buffers(alice, VideoSourceMode::Video);
        let surface = registry
            .take_video(alice, VideoSourceMode::Video)
            .expect("registered source");
        assert_eq!(surface.participant_id(), alice);
        assert!(registry
            .take_video(alice, VideoSourceMode::Screencast)
            .is_none());

        registry.remove_video(alice, VideoSourceMode::Video);
        assert!(registry.take_video(alice, VideoSourceMode::Video).is_none());
    }

    #[test]
    fn audio_levels_fan_out_and_prune() {
        let registry = MediaRegistry::new();
        let bob = ParticipantId(2);

        assert!(registry.audio_level(bob).is_none());
        registry.enable_audio_levels(bob);

        let mut first = registry.audio_level(bob).unwrap().subscribe();
        let second = registry.audio_level(bob).unwrap().subscribe();
        assert_eq!(registry.publish_audio_level(bob, Some(2.0)), 2);

        drop(second);
        assert_eq!(registry.publish_audio_level(bob, Some(3.0)), 1);
        assert_eq!(first.drain(), Some(Some(3.0)));
        assert_eq!(registry.audio_subscribers(bob), 1);
    }

    #[test]
    fn resubscribing_drops_closed_senders() {
        let registry = MediaRegistry::new();
        let carol = ParticipantId(3);
        registry.enable_audio_levels(carol);

        for _ in 0..5 {
            let mut subscription = registry.audio_level(carol).unwrap().subscribe();
            subscription.cancel();
        }
        let _live = registry.audio_level(carol).unwrap().subscribe();

        assert_eq!(registry.audio.lock()[&carol].len(), 1);
        assert_eq!(registry.audio_subscribers(carol), 1);
    }
}

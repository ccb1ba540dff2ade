use crate::dominant::{ParticipantId, VideoSourceMode};
use crate::localization::Localization;

/// Display data of the participant on the main stage, as last seen by the call controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantSnapshot {
    id: ParticipantId,
    display_title: String,
    is_speaking: bool,
    muted: bool,
    video_paused: bool,
    raised_hand: bool,
}

impl ParticipantSnapshot {
    pub fn new(id: ParticipantId, display_title: impl Into<String>) -> Self {
        Self {
            id,
            display_title: display_title.into(),
            is_speaking: false,
            muted: false,
            video_paused: false,
            raised_hand: false,
        }
    }

    pub fn with_speaking(mut self, is_speaking: bool) -> Self {
        self.is_speaking = is_speaking;
        self
    }

    pub fn with_muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    pub fn with_video_paused(mut self, video_paused: bool) -> Self {
        self.video_paused = video_paused;
        self
    }

    pub fn with_raised_hand(mut self, raised_hand: bool) -> Self {
        self.raised_hand = raised_hand;
        self
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn display_title(&self) -> &str {
        &self.display_title
    }

    pub fn is_speaking(&self) -> bool {
        self.is_speaking
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn video_paused(&self) -> bool {
        self.video_paused
    }

    pub fn raised_hand(&self) -> bool {
        self.raised_hand
    }

    /// Status line shown next to the name for the given source.
    ///
    /// A screen share always reads as "sharing screen"; for the camera the
    /// audio state wins over the video state.
    pub fn video_status(&self, mode: VideoSourceMode, strings: &dyn Localization) -> String {
        if mode == VideoSourceMode::Screencast {
            return strings.status_sharing_screen();
        }
        if self.muted && self.raised_hand {
            strings.status_raised_hand()
        } else if self.muted {
            strings.status_muted()
        } else if self.is_speaking {
            strings.status_speaking()
        } else if self.video_paused {
            strings.status_video_paused()
        } else {
            strings.status_listening()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localization::EnglishStrings;

    fn alice() -> ParticipantSnapshot {
        ParticipantSnapshot::new(ParticipantId(7), "Alice")
    }

    #[test]
    fn screencast_status_ignores_audio_state() {
        let p = alice().with_muted(true).with_speaking(true);
        assert_eq!(
            p.video_status(VideoSourceMode::Screencast, &EnglishStrings),
            "sharing screen"
        );
    }

    #[test]
    fn camera_status_priority() {
        let strings = EnglishStrings;
        let mode = VideoSourceMode::Video;

        assert_eq!(alice().video_status(mode, &strings), "listening");
        assert_eq!(
            alice().with_video_paused(true).video_status(mode, &strings),
            "video paused"
        );
        assert_eq!(
            alice()
                .with_speaking(true)
                .with_video_paused(true)
                .video_status(mode, &strings),
            "speaking"
        );
        assert_eq!(
            alice().with_muted(true).video_status(mode, &strings),
            "muted"
        );
        assert_eq!(
            alice()
                .with_muted(true)
                .with_raised_hand(true)
                .video_status(mode, &strings),
            "wants to speak"
        );
    }
}

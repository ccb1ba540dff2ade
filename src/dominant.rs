//! Identity of the video currently shown on the main stage.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Call-wide identifier of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub i64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which of a participant's sources feeds the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoSourceMode {
    /// Camera feed.
    Video,
    /// Screen share.
    Screencast,
}

/// Snapshot of which participant's video should be displayed.
///
/// Built by the call controller whenever dominance changes. Two values are
/// equal only when all four fields match, which is what the container uses
/// to decide whether the attached surface has to be replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DominantVideo {
    participant_id: ParticipantId,
    endpoint_id: String,
    mode: VideoSourceMode,
    temporary: bool,
}

impl DominantVideo {
    pub fn new(
        participant_id: ParticipantId,
        endpoint_id: impl Into<String>,
        mode: VideoSourceMode,
        temporary: bool,
    ) -> Self {
        Self {
            participant_id,
            endpoint_id: endpoint_id.into(),
            mode,
            temporary,
        }
    }

    pub fn participant_id(&self) -> ParticipantId {
        self.participant_id
    }

    pub fn endpoint_id(&self) -> &str {
        &self.endpoint_id
    }

    pub fn mode(&self) -> VideoSourceMode {
        self.mode
    }

    /// True while the selection is a transient focus, e.g. during a tap-to-pin gesture.
    pub fn temporary(&self) -> bool {
        self.temporary
    }
}

//! Main stage of a group video call.
//!
//! [`main_video::MainVideoContainer`] shows the dominant participant's video
//! with its overlay chrome. Everything the stage needs from the call comes in
//! through [`arguments::CallContext`] at construction and
//! [`arguments::CallArguments`] on each update.

pub mod audio {
    pub mod level;
}

pub mod video {
    pub mod buffer;
    pub mod surface;
}

pub mod graphics {
    pub mod display_list;
    pub mod fonts;
    pub mod layer;
    pub mod stage_canvas;
    pub mod text;
    pub mod transition;
}

pub mod utils {
    pub mod clock;
}

pub mod arguments;
pub mod dominant;
pub mod localization;
pub mod main_video;
pub mod participant;
pub mod theme;

pub use arguments::{CallArguments, CallContext, MediaRegistry};
pub use dominant::{DominantVideo, ParticipantId, VideoSourceMode};
pub use graphics::transition::LayoutTransition;
pub use main_video::{ControlsLayout, ControlsMode, MainVideoContainer, StageEvent};
pub use participant::ParticipantSnapshot;
pub use video::surface::ContentFit;

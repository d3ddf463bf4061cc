//! Compactor core: pure upload/progress state machine and view-model helpers.
mod effect;
mod msg;
mod options;
mod progress;
mod state;
mod update;
mod view_model;

pub use effect::{CancelPurpose, Effect, Timings};
pub use msg::{CallToAction, JobStatus, Msg, ProgressReport};
pub use options::{Codec, CompressOptions, Quality, Resolution};
pub use progress::{
    clamp_percent, format_time_left, is_tinted, percent_label, time_left_seconds, ProgressRing,
    TIME_LEFT_PLACEHOLDER,
};
pub use state::{AppState, JobId, Outcome, SelectedFile, SessionState, StartSeq};
pub use update::update;
pub use view_model::{AppViewModel, PreviewView, ProgressView, NAV_SHADOW_THRESHOLD};

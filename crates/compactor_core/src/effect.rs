use std::time::Duration;

use crate::{CompressOptions, JobId, SelectedFile, StartSeq};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Decode an image file into a data URL off the control loop.
    DecodePreview { file: SelectedFile },
    /// Deliver `Msg::DragHighlightExpired` after the delay.
    ScheduleHighlightClear { after: Duration },
    FocusSubmit,
    /// Send the multipart `/start` request; its reply must carry `seq` back.
    StartJob {
        seq: StartSeq,
        file: SelectedFile,
        options: CompressOptions,
    },
    /// Begin delivering `Msg::PollTick` at a fixed cadence.
    StartPolling { job_id: JobId, every: Duration },
    StopPolling,
    PollProgress { job_id: JobId },
    /// Fetch the finished file.
    Download { url: String },
    /// Deliver `Msg::ResetElapsed` after the delay.
    ScheduleReset { after: Duration },
    SendCancel {
        job_id: JobId,
        purpose: CancelPurpose,
    },
    /// Blocking user-facing alert.
    Alert { message: String },
    ScrollToForm { margin: u32 },
    DisconnectRevealObserver,
}

/// Whether the cancel outcome is reported back as `Msg::DeleteFinished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelPurpose {
    /// Fire and forget.
    Cancel,
    DeleteUpload,
}

/// Fixed delays driving the controller's timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub poll_interval: Duration,
    pub reset_delay: Duration,
    pub highlight: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(900),
            reset_delay: Duration::from_millis(800),
            highlight: Duration::from_millis(1200),
        }
    }
}

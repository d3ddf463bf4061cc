use crate::{CompressOptions, JobId, SelectedFile, StartSeq};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Files dropped on the drop target; only the first one is used.
    FilesDropped(Vec<SelectedFile>),
    /// File chosen through the native picker.
    FilePicked(SelectedFile),
    /// Drag entered the drop target.
    DragEntered,
    /// Drag left the drop target without dropping.
    DragLeft,
    /// Image preview finished decoding.
    PreviewDecoded { name: String, data_url: String },
    /// Image preview could not be decoded.
    PreviewFailed { name: String },
    /// User changed quality, codec or resolution.
    OptionsChanged(CompressOptions),
    /// User submitted the compress form.
    SubmitClicked,
    /// The transient validation highlight on the drop target ran out.
    DragHighlightExpired,
    /// `/start` for submit `seq` answered with a job id.
    StartAccepted { seq: StartSeq, job_id: JobId },
    /// `/start` for submit `seq` answered with an error field.
    StartRejected { seq: StartSeq, error: String },
    /// `/start` for submit `seq` failed at the network level.
    StartFailed { seq: StartSeq, message: String },
    /// Poll timer fired.
    PollTick,
    /// `/progress` answered for a job.
    ProgressReceived {
        job_id: JobId,
        report: ProgressReport,
    },
    /// `/progress` failed at the network level.
    PollFailed { job_id: JobId, message: String },
    /// Post-completion delay elapsed; progress UI may reset.
    ResetElapsed,
    /// Downloaded result written to disk.
    DownloadSaved {
        url: String,
        path: std::path::PathBuf,
    },
    /// Downloading the result failed.
    DownloadFailed { url: String, message: String },
    /// User clicked Cancel.
    CancelClicked,
    /// User clicked Delete upload.
    DeleteUploadClicked,
    /// The cancel request issued by Delete upload returned, successfully or not.
    DeleteFinished { ok: bool },
    /// Page scrolled to a new vertical offset.
    Scrolled { offset_y: f64 },
    /// Form panel entered the viewport.
    PanelIntersected,
    /// One of the call-to-action controls was clicked.
    CallToActionClicked(CallToAction),
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallToAction {
    Hero,
    NavTry,
}

/// Job status as reported by `/progress`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Running,
    Done,
    Error,
    Other(String),
}

impl JobStatus {
    pub fn from_wire(status: Option<&str>) -> Self {
        match status {
            None | Some("running") => JobStatus::Running,
            Some("done") => JobStatus::Done,
            Some("error") => JobStatus::Error,
            Some(other) => JobStatus::Other(other.to_string()),
        }
    }
}

/// One `/progress` response; every field may be absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressReport {
    pub percent: Option<f64>,
    pub time_left: Option<f64>,
    pub status: JobStatus,
    pub download_url: Option<String>,
    pub error: Option<String>,
}

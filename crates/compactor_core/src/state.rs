use std::path::PathBuf;

use crate::progress::{clamp_percent, time_left_seconds};
use crate::view_model::{AppViewModel, PreviewView, ProgressView, NAV_SHADOW_THRESHOLD};
use crate::{CompressOptions, Timings};

/// Opaque server-assigned job identifier.
pub type JobId = String;

/// Number of the submit a `/start` reply answers; increases with every submit.
pub type StartSeq = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    /// Declared MIME type, if the source provided one.
    pub mime_type: Option<String>,
    pub path: PathBuf,
}

impl SelectedFile {
    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|mime| mime.starts_with("image/"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    /// `/start` sent, no job id yet.
    Starting,
    /// Job id known, poll session live.
    Running,
    /// Delete upload sent its cancel request and waits for the reply.
    Cancelling,
    /// Job finished; progress UI resets after the delay.
    Done,
}

/// How the most recent job left the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed { download_url: Option<String> },
    Cancelled,
    Deleted,
    StartFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    timings: Timings,
    options: CompressOptions,
    selected: Option<SelectedFile>,
    preview_data_url: Option<String>,
    session: SessionState,
    job_id: Option<crate::JobId>,
    start_seq: StartSeq,
    abandoned_starts: usize,
    polling: bool,
    poll_ticks: u64,
    percent: u8,
    time_left: Option<u64>,
    form_error_visible: bool,
    drop_highlighted: bool,
    overlay_visible: bool,
    delete_visible: bool,
    nav_scrolled: bool,
    panel_revealed: bool,
    downloads_pending: usize,
    last_download: Option<PathBuf>,
    last_outcome: Option<Outcome>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timings(timings: Timings) -> Self {
        Self {
            timings,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let idle = self.session == SessionState::Idle;
        AppViewModel {
            session: self.session,
            file_name: self.selected.as_ref().map(|f| f.name.clone()),
            preview: self.preview_view(),
            options: self.options,
            submit_enabled: idle && self.selected.is_some(),
            submit_busy: matches!(
                self.session,
                SessionState::Running | SessionState::Cancelling | SessionState::Done
            ),
            form_error_visible: self.form_error_visible,
            drop_highlighted: self.drop_highlighted,
            overlay_visible: self.overlay_visible,
            progress: ProgressView::from_percent(self.percent),
            time_left: crate::format_time_left(self.time_left),
            cancel_visible: matches!(
                self.session,
                SessionState::Starting | SessionState::Running
            ),
            delete_visible: self.delete_visible,
            nav_scrolled: self.nav_scrolled,
            panel_revealed: self.panel_revealed,
            job_id: self.job_id.clone(),
            downloads_pending: self.downloads_pending,
            last_download: self.last_download.clone(),
            last_outcome: self.last_outcome.clone(),
            dirty: self.dirty,
        }
    }

    fn preview_view(&self) -> PreviewView {
        match (&self.selected, &self.preview_data_url) {
            (Some(file), _) if !file.is_image() => PreviewView::Hidden,
            (Some(_), Some(data_url)) => PreviewView::Image {
                data_url: data_url.clone(),
            },
            (Some(_), None) => PreviewView::Decoding,
            (None, _) => PreviewView::Hidden,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    /// Sequence number of the most recent submit.
    pub fn start_seq(&self) -> StartSeq {
        self.start_seq
    }

    /// True when `seq` answers the submit that is still waiting in `Starting`.
    pub fn is_live_start(&self, seq: StartSeq) -> bool {
        self.session == SessionState::Starting && self.start_seq == seq
    }

    /// Starts abandoned while in flight whose reply has not arrived yet.
    pub fn abandoned_starts(&self) -> usize {
        self.abandoned_starts
    }

    pub fn is_polling(&self) -> bool {
        self.polling
    }

    pub fn poll_ticks(&self) -> u64 {
        self.poll_ticks
    }

    pub fn timings(&self) -> Timings {
        self.timings
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn options(&self) -> CompressOptions {
        self.options
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_options(&mut self, options: CompressOptions) {
        if self.options != options {
            self.options = options;
            self.mark_dirty();
        }
    }

    pub(crate) fn select_file(&mut self, file: SelectedFile) {
        self.selected = Some(file);
        self.preview_data_url = None;
        self.delete_visible = true;
        self.mark_dirty();
    }

    /// Stores a decoded preview if it still belongs to the current selection.
    pub(crate) fn apply_preview(&mut self, name: &str, data_url: String) -> bool {
        match &self.selected {
            Some(file) if file.name == name && file.is_image() => {
                self.preview_data_url = Some(data_url);
                self.mark_dirty();
                true
            }
            _ => false,
        }
    }

    pub(crate) fn set_drop_highlight(&mut self, on: bool) {
        if self.drop_highlighted != on {
            self.drop_highlighted = on;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_form_error(&mut self, visible: bool) {
        if self.form_error_visible != visible {
            self.form_error_visible = visible;
            self.mark_dirty();
        }
    }

    pub(crate) fn begin_start(&mut self) -> StartSeq {
        self.start_seq += 1;
        self.session = SessionState::Starting;
        self.overlay_visible = true;
        self.percent = 0;
        self.time_left = None;
        self.last_outcome = None;
        self.mark_dirty();
        self.start_seq
    }

    pub(crate) fn abandon_start(&mut self) {
        self.abandoned_starts += 1;
    }

    pub(crate) fn settle_abandoned_start(&mut self) {
        self.abandoned_starts = self.abandoned_starts.saturating_sub(1);
    }

    pub(crate) fn begin_running(&mut self, job_id: crate::JobId) {
        self.session = SessionState::Running;
        self.job_id = Some(job_id);
        self.mark_dirty();
    }

    /// Claims the single poll session; false if one is already live.
    pub(crate) fn claim_polling(&mut self) -> bool {
        if self.polling {
            false
        } else {
            self.polling = true;
            true
        }
    }

    /// Releases the poll session; true if one was live.
    pub(crate) fn release_polling(&mut self) -> bool {
        std::mem::take(&mut self.polling)
    }

    pub(crate) fn record_poll_tick(&mut self) -> u64 {
        self.poll_ticks += 1;
        self.poll_ticks
    }

    pub(crate) fn apply_progress(&mut self, percent: Option<f64>, time_left: Option<f64>) {
        let percent = clamp_percent(percent.unwrap_or(0.0));
        let time_left = time_left.map(time_left_seconds).or(self.time_left);
        if self.percent != percent || self.time_left != time_left {
            self.percent = percent;
            self.time_left = time_left;
            self.mark_dirty();
        }
    }

    pub(crate) fn complete(&mut self, download_url: Option<String>) {
        self.session = SessionState::Done;
        self.job_id = None;
        if download_url.is_some() {
            self.downloads_pending += 1;
        }
        self.last_outcome = Some(Outcome::Completed { download_url });
        self.mark_dirty();
    }

    /// Clears the tracked job id and returns it, if any.
    pub(crate) fn take_job_id(&mut self) -> Option<crate::JobId> {
        let taken = self.job_id.take();
        if taken.is_some() {
            self.mark_dirty();
        }
        taken
    }

    pub(crate) fn begin_cancelling(&mut self) {
        self.session = SessionState::Cancelling;
        self.mark_dirty();
    }

    /// Returns progress UI to its initial state and the controller to `Idle`.
    pub(crate) fn reset_progress(&mut self) {
        self.session = SessionState::Idle;
        self.job_id = None;
        self.overlay_visible = false;
        self.percent = 0;
        self.time_left = None;
        self.mark_dirty();
    }

    pub(crate) fn hide_delete(&mut self) {
        if self.delete_visible {
            self.delete_visible = false;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_outcome(&mut self, outcome: Outcome) {
        self.last_outcome = Some(outcome);
        self.mark_dirty();
    }

    pub(crate) fn finish_download(&mut self, saved: Option<PathBuf>) {
        self.downloads_pending = self.downloads_pending.saturating_sub(1);
        if saved.is_some() {
            self.last_download = saved;
        }
        self.mark_dirty();
    }

    pub(crate) fn set_scroll_offset(&mut self, offset_y: f64) {
        let scrolled = offset_y > NAV_SHADOW_THRESHOLD;
        if self.nav_scrolled != scrolled {
            self.nav_scrolled = scrolled;
            self.mark_dirty();
        }
    }

    /// Reveals the panel; true only the first time.
    pub(crate) fn reveal_panel(&mut self) -> bool {
        if self.panel_revealed {
            false
        } else {
            self.panel_revealed = true;
            self.mark_dirty();
            true
        }
    }
}

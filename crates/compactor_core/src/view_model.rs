use std::path::PathBuf;

use crate::progress::{is_tinted, percent_label};
use crate::{CompressOptions, JobId, Outcome, SessionState};

/// Scroll offset past which the navigation bar casts its shadow.
pub const NAV_SHADOW_THRESHOLD: f64 = 40.0;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub session: SessionState,
    pub file_name: Option<String>,
    pub preview: PreviewView,
    pub options: CompressOptions,
    pub submit_enabled: bool,
    pub submit_busy: bool,
    pub form_error_visible: bool,
    pub drop_highlighted: bool,
    pub overlay_visible: bool,
    pub progress: ProgressView,
    pub time_left: String,
    pub cancel_visible: bool,
    pub delete_visible: bool,
    pub nav_scrolled: bool,
    pub panel_revealed: bool,
    pub job_id: Option<JobId>,
    pub downloads_pending: usize,
    pub last_download: Option<PathBuf>,
    pub last_outcome: Option<Outcome>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewView {
    #[default]
    Hidden,
    Decoding,
    Image { data_url: String },
}

/// Shared by the ring and the linear bar.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressView {
    pub percent: u8,
    pub label: String,
    pub tinted: bool,
}

impl ProgressView {
    pub fn from_percent(percent: u8) -> Self {
        Self {
            percent,
            label: percent_label(percent),
            tinted: is_tinted(percent),
        }
    }
}

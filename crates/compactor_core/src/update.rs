use compactor_logging::{compactor_debug, compactor_info, compactor_trace, compactor_warn};

use crate::{
    AppState, CancelPurpose, Effect, JobStatus, Msg, Outcome, ProgressReport, SessionState,
};

const SCROLL_MARGIN: u32 = 20;

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FilesDropped(files) => {
            state.set_drop_highlight(false);
            match files.into_iter().next() {
                Some(file) => select_file(&mut state, file),
                None => Vec::new(),
            }
        }
        Msg::FilePicked(file) => select_file(&mut state, file),
        Msg::DragEntered => {
            state.set_drop_highlight(true);
            Vec::new()
        }
        Msg::DragLeft | Msg::DragHighlightExpired => {
            state.set_drop_highlight(false);
            Vec::new()
        }
        Msg::PreviewDecoded { name, data_url } => {
            if !state.apply_preview(&name, data_url) {
                compactor_debug!("Discarding stale preview for {}", name);
            }
            Vec::new()
        }
        Msg::PreviewFailed { name } => {
            compactor_warn!("Preview decoding failed for {}", name);
            Vec::new()
        }
        Msg::OptionsChanged(options) => {
            state.set_options(options);
            Vec::new()
        }
        Msg::SubmitClicked => submit(&mut state),
        Msg::StartAccepted { seq, job_id } => {
            if state.is_live_start(seq) {
                compactor_info!("Job {} started", job_id);
                state.begin_running(job_id.clone());
                let mut effects = Vec::with_capacity(1);
                if state.claim_polling() {
                    effects.push(Effect::StartPolling {
                        job_id,
                        every: state.timings().poll_interval,
                    });
                }
                effects
            } else {
                // Reply to an abandoned submit; release the server-side job.
                state.settle_abandoned_start();
                compactor_info!(
                    "Job {} from submit #{} started after being abandoned; cancelling",
                    job_id,
                    seq
                );
                vec![Effect::SendCancel {
                    job_id,
                    purpose: CancelPurpose::Cancel,
                }]
            }
        }
        Msg::StartRejected { seq, error } => {
            if state.is_live_start(seq) {
                compactor_warn!("Start rejected by server: {}", error);
                state.reset_progress();
                state.set_outcome(Outcome::StartFailed(error.clone()));
                vec![Effect::Alert {
                    message: format!("Failed to start job: {error}"),
                }]
            } else {
                state.settle_abandoned_start();
                compactor_debug!("Ignoring rejection of abandoned submit #{}", seq);
                Vec::new()
            }
        }
        Msg::StartFailed { seq, message } => {
            if state.is_live_start(seq) {
                compactor_warn!("Start request failed: {}", message);
                state.reset_progress();
                state.set_outcome(Outcome::StartFailed(message));
                vec![Effect::Alert {
                    message: "Network error starting job".to_string(),
                }]
            } else {
                state.settle_abandoned_start();
                compactor_debug!("Ignoring failure of abandoned submit #{}", seq);
                Vec::new()
            }
        }
        Msg::PollTick => {
            let job_id = state.job_id().map(ToOwned::to_owned);
            match job_id {
                Some(job_id) if state.session() == SessionState::Running => {
                    let tick = state.record_poll_tick();
                    compactor_trace!("Poll tick {} for job {}", tick, job_id);
                    vec![Effect::PollProgress { job_id }]
                }
                _ => Vec::new(),
            }
        }
        Msg::ProgressReceived { job_id, report } => {
            if state.session() != SessionState::Running || state.job_id() != Some(job_id.as_str())
            {
                compactor_debug!("Ignoring progress for inactive job {}", job_id);
                Vec::new()
            } else {
                apply_report(&mut state, report)
            }
        }
        Msg::PollFailed { job_id, message } => {
            compactor_debug!("Poll for job {} failed: {}", job_id, message);
            Vec::new()
        }
        Msg::ResetElapsed => {
            if state.session() == SessionState::Done {
                state.reset_progress();
            }
            Vec::new()
        }
        Msg::DownloadSaved { url, path } => {
            compactor_info!("Saved {} to {:?}", url, path);
            state.finish_download(Some(path));
            Vec::new()
        }
        Msg::DownloadFailed { url, message } => {
            compactor_warn!("Download of {} failed: {}", url, message);
            state.finish_download(None);
            Vec::new()
        }
        Msg::CancelClicked => cancel(&mut state),
        Msg::DeleteUploadClicked => delete_upload(&mut state),
        Msg::DeleteFinished { ok } => {
            if !ok {
                compactor_warn!("Cancel request for deleted upload failed; resetting anyway");
            }
            if state.session() == SessionState::Cancelling {
                state.reset_progress();
                state.set_outcome(Outcome::Deleted);
            }
            state.hide_delete();
            Vec::new()
        }
        Msg::Scrolled { offset_y } => {
            state.set_scroll_offset(offset_y);
            Vec::new()
        }
        Msg::PanelIntersected => {
            if state.reveal_panel() {
                vec![Effect::DisconnectRevealObserver]
            } else {
                Vec::new()
            }
        }
        Msg::CallToActionClicked(_) => vec![Effect::ScrollToForm {
            margin: SCROLL_MARGIN,
        }],
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn select_file(state: &mut AppState, file: crate::SelectedFile) -> Vec<Effect> {
    compactor_info!("Selected {} ({:?})", file.name, file.mime_type);
    let decode = file.is_image().then(|| Effect::DecodePreview { file: file.clone() });
    state.select_file(file);
    decode.into_iter().collect()
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    if state.session() != SessionState::Idle {
        return Vec::new();
    }
    let Some(file) = state.selected().cloned() else {
        state.set_form_error(true);
        state.set_drop_highlight(true);
        return vec![
            Effect::ScheduleHighlightClear {
                after: state.timings().highlight,
            },
            Effect::FocusSubmit,
        ];
    };

    state.set_form_error(false);
    let seq = state.begin_start();
    vec![Effect::StartJob {
        seq,
        file,
        options: state.options(),
    }]
}

fn apply_report(state: &mut AppState, report: ProgressReport) -> Vec<Effect> {
    if let Some(error) = report.error {
        compactor_debug!("Server reported poll error: {}", error);
        return Vec::new();
    }
    state.apply_progress(report.percent, report.time_left);

    if report.status != JobStatus::Done {
        return Vec::new();
    }

    let mut effects = Vec::with_capacity(3);
    if state.release_polling() {
        effects.push(Effect::StopPolling);
    }
    if let Some(url) = &report.download_url {
        effects.push(Effect::Download { url: url.clone() });
    } else {
        compactor_warn!("Job finished without a download url");
    }
    state.complete(report.download_url);
    effects.push(Effect::ScheduleReset {
        after: state.timings().reset_delay,
    });
    effects
}

fn cancel(state: &mut AppState) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(2);
    let was = state.session();
    if let Some(job_id) = state.take_job_id() {
        effects.push(Effect::SendCancel {
            job_id,
            purpose: CancelPurpose::Cancel,
        });
    }
    if state.release_polling() {
        effects.push(Effect::StopPolling);
    }
    if was == SessionState::Starting {
        state.abandon_start();
    }
    state.reset_progress();
    if matches!(was, SessionState::Starting | SessionState::Running) {
        state.set_outcome(Outcome::Cancelled);
    }
    effects
}

fn delete_upload(state: &mut AppState) -> Vec<Effect> {
    let Some(job_id) = state.take_job_id() else {
        // Nothing server-side yet.
        if state.session() == SessionState::Starting {
            state.abandon_start();
            state.reset_progress();
            state.set_outcome(Outcome::Cancelled);
        }
        state.hide_delete();
        return Vec::new();
    };

    let mut effects = Vec::with_capacity(2);
    if state.release_polling() {
        effects.push(Effect::StopPolling);
    }
    state.begin_cancelling();
    effects.push(Effect::SendCancel {
        job_id,
        purpose: CancelPurpose::DeleteUpload,
    });
    effects
}

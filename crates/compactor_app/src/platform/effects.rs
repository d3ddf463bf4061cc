use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use compactor_core::{CancelPurpose, Effect, JobStatus, Msg, ProgressReport, SelectedFile};
use compactor_engine::{EngineEvent, EngineHandle, ProgressReply, StartOutcome, Upload};
use compactor_logging::{compactor_debug, compactor_info, compactor_warn};

use super::scheduler::{Scheduler, TimerId};
use super::ui::surface::Surface;

pub struct EffectRunner<S: Scheduler> {
    engine: EngineHandle,
    scheduler: S,
    poll_timer: Option<TimerId>,
    reset_timer: Option<TimerId>,
    highlight_timer: Option<TimerId>,
    cancels_sent: usize,
}

impl<S: Scheduler> EffectRunner<S> {
    pub fn new(engine: EngineHandle, scheduler: S) -> Self {
        Self {
            engine,
            scheduler,
            poll_timer: None,
            reset_timer: None,
            highlight_timer: None,
            cancels_sent: 0,
        }
    }

    /// Cancel requests handed to the engine so far.
    pub fn cancels_sent(&self) -> usize {
        self.cancels_sent
    }

    /// Schedules `msg` once, replacing whatever `slot` still had pending.
    fn replace_one_shot(&mut self, slot: OneShot, after: Duration, msg: Msg) {
        self.cancel_one_shot(slot);
        let id = self.scheduler.after(after, msg);
        *self.one_shot(slot) = Some(id);
    }

    fn cancel_one_shot(&mut self, slot: OneShot) {
        if let Some(id) = self.one_shot(slot).take() {
            self.scheduler.cancel(id);
        }
    }

    fn one_shot(&mut self, slot: OneShot) -> &mut Option<TimerId> {
        match slot {
            OneShot::Reset => &mut self.reset_timer,
            OneShot::Highlight => &mut self.highlight_timer,
        }
    }

    #[cfg(test)]
    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn run(&mut self, effects: Vec<Effect>, surface: &mut dyn Surface) {
        for effect in effects {
            match effect {
                Effect::DecodePreview { file } => {
                    let mime = file.mime_type.clone().unwrap_or_default();
                    self.engine.decode_preview(file.name, file.path, mime);
                }
                Effect::ScheduleHighlightClear { after } => {
                    self.replace_one_shot(OneShot::Highlight, after, Msg::DragHighlightExpired);
                }
                Effect::FocusSubmit => surface.focus_submit(),
                Effect::StartJob { seq, file, options } => {
                    // A reset left over from the previous job must not hit this one.
                    self.cancel_one_shot(OneShot::Reset);
                    compactor_info!(
                        "Submit #{}: uploading {} with {:?}",
                        seq,
                        file.path.display(),
                        options.form_fields()
                    );
                    let fields = options
                        .form_fields()
                        .iter()
                        .map(|(name, value)| (name.to_string(), value.to_string()))
                        .collect();
                    self.engine.start(seq, upload_for(file, fields));
                }
                Effect::StartPolling { job_id, every } => {
                    if let Some(stale) = self.poll_timer.take() {
                        compactor_warn!("Replacing a live poll timer");
                        self.scheduler.cancel(stale);
                    }
                    compactor_debug!("Polling job {} every {:?}", job_id, every);
                    self.poll_timer = Some(self.scheduler.every(every, Msg::PollTick));
                }
                Effect::StopPolling => {
                    if let Some(timer) = self.poll_timer.take() {
                        self.scheduler.cancel(timer);
                    }
                }
                Effect::PollProgress { job_id } => self.engine.poll(job_id),
                Effect::Download { url } => {
                    compactor_info!("Downloading {}", url);
                    self.engine.download(url);
                }
                Effect::ScheduleReset { after } => {
                    self.replace_one_shot(OneShot::Reset, after, Msg::ResetElapsed);
                }
                Effect::SendCancel { job_id, purpose } => {
                    compactor_info!("Cancelling job {} ({:?})", job_id, purpose);
                    self.cancels_sent += 1;
                    self.engine
                        .cancel(job_id, purpose == CancelPurpose::DeleteUpload);
                }
                Effect::Alert { message } => surface.alert(&message),
                Effect::ScrollToForm { margin } => surface.scroll_to_form(margin),
                Effect::DisconnectRevealObserver => {
                    compactor_debug!("Reveal observer disconnected");
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum OneShot {
    Reset,
    Highlight,
}

fn upload_for(file: SelectedFile, fields: Vec<(String, String)>) -> Upload {
    Upload {
        path: file.path,
        file_name: file.name,
        mime_type: file.mime_type,
        fields,
    }
}

/// Forward engine results into the control loop as messages.
pub fn spawn_event_forwarder(events: mpsc::Receiver<EngineEvent>, msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        while let Ok(event) = events.recv() {
            if let Some(msg) = map_event(event) {
                if msg_tx.send(msg).is_err() {
                    break;
                }
            }
        }
    });
}

fn map_event(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::StartCompleted {
            seq,
            result: Ok(StartOutcome::Accepted { job_id }),
        } => Some(Msg::StartAccepted { seq, job_id }),
        EngineEvent::StartCompleted {
            seq,
            result: Ok(StartOutcome::Rejected { error }),
        } => Some(Msg::StartRejected { seq, error }),
        EngineEvent::StartCompleted {
            seq,
            result: Err(err),
        } => Some(Msg::StartFailed {
            seq,
            message: err.to_string(),
        }),
        EngineEvent::ProgressPolled {
            job_id,
            result: Ok(reply),
        } => Some(Msg::ProgressReceived {
            job_id,
            report: map_report(reply),
        }),
        EngineEvent::ProgressPolled {
            job_id,
            result: Err(err),
        } => Some(Msg::PollFailed {
            job_id,
            message: err.to_string(),
        }),
        EngineEvent::CancelCompleted {
            job_id,
            report_back,
            result,
        } => {
            if let Err(err) = &result {
                compactor_warn!("Cancel for job {} failed: {}", job_id, err);
            }
            report_back.then(|| Msg::DeleteFinished {
                ok: result.is_ok(),
            })
        }
        EngineEvent::DownloadCompleted {
            url,
            result: Ok(path),
        } => Some(Msg::DownloadSaved { url, path }),
        EngineEvent::DownloadCompleted {
            url,
            result: Err(err),
        } => Some(Msg::DownloadFailed {
            url,
            message: err.to_string(),
        }),
        EngineEvent::PreviewCompleted {
            name,
            result: Ok(data_url),
        } => Some(Msg::PreviewDecoded { name, data_url }),
        EngineEvent::PreviewCompleted {
            name,
            result: Err(err),
        } => {
            compactor_debug!("Preview for {} failed: {}", name, err);
            Some(Msg::PreviewFailed { name })
        }
    }
}

fn map_report(reply: ProgressReply) -> ProgressReport {
    ProgressReport {
        percent: reply.percent,
        time_left: reply.time_left,
        status: JobStatus::from_wire(reply.status.as_deref()),
        download_url: reply.download_url,
        error: reply.error,
    }
}

#[cfg(test)]
mod tests {
    use compactor_engine::{ClientError, FailureKind};

    use super::*;

    #[test]
    fn done_reply_maps_to_done_report() {
        let msg = map_event(EngineEvent::ProgressPolled {
            job_id: "j".to_string(),
            result: Ok(ProgressReply {
                percent: Some(100.0),
                status: Some("done".to_string()),
                download_url: Some("/f/abc".to_string()),
                ..ProgressReply::default()
            }),
        });

        assert_eq!(
            msg,
            Some(Msg::ProgressReceived {
                job_id: "j".to_string(),
                report: ProgressReport {
                    percent: Some(100.0),
                    time_left: None,
                    status: JobStatus::Done,
                    download_url: Some("/f/abc".to_string()),
                    error: None,
                },
            })
        );
    }

    #[test]
    fn fire_and_forget_cancel_produces_no_message() {
        let msg = map_event(EngineEvent::CancelCompleted {
            job_id: "j".to_string(),
            report_back: false,
            result: Err(ClientError {
                kind: FailureKind::Network,
                message: "refused".to_string(),
            }),
        });
        assert_eq!(msg, None);
    }

    #[test]
    fn delete_cancel_failure_still_reports_back() {
        let msg = map_event(EngineEvent::CancelCompleted {
            job_id: "j".to_string(),
            report_back: true,
            result: Err(ClientError {
                kind: FailureKind::HttpStatus(500),
                message: "boom".to_string(),
            }),
        });
        assert_eq!(msg, Some(Msg::DeleteFinished { ok: false }));
    }

    #[test]
    fn malformed_start_reply_is_a_start_failure() {
        let msg = map_event(EngineEvent::StartCompleted {
            seq: 3,
            result: Err(ClientError {
                kind: FailureKind::Decode,
                message: "missing job_id".to_string(),
            }),
        });
        assert!(matches!(msg, Some(Msg::StartFailed { seq: 3, .. })));
    }
}

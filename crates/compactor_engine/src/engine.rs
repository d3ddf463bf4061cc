use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;

use compactor_logging::{compactor_debug, compactor_error};

use crate::preview::decode_preview;
use crate::{EngineEvent, JobApi, Upload};

enum EngineCommand {
    Start {
        seq: u64,
        upload: Upload,
    },
    Poll {
        job_id: String,
    },
    Cancel {
        job_id: String,
        report_back: bool,
    },
    Download {
        url: String,
    },
    DecodePreview {
        name: String,
        path: PathBuf,
        mime: String,
    },
}

/// Runs job API calls on a background tokio runtime and reports results as
/// `EngineEvent`s. Every command is spawned independently, so a slow poll
/// never delays the next one.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(api: Arc<dyn JobApi>, output_dir: PathBuf) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let output_dir = Arc::new(output_dir);

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    compactor_error!("Failed to start engine runtime: {}", err);
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                let api = api.clone();
                let output_dir = output_dir.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(api.as_ref(), &output_dir, command, event_tx).await;
                });
            }
            compactor_debug!("Engine command channel closed");
        });

        (Self { cmd_tx }, event_rx)
    }

    /// `seq` is echoed back in `EngineEvent::StartCompleted`.
    pub fn start(&self, seq: u64, upload: Upload) {
        self.send(EngineCommand::Start { seq, upload });
    }

    pub fn poll(&self, job_id: impl Into<String>) {
        self.send(EngineCommand::Poll {
            job_id: job_id.into(),
        });
    }

    /// `report_back` asks for an `EngineEvent::CancelCompleted` the caller acts on.
    pub fn cancel(&self, job_id: impl Into<String>, report_back: bool) {
        self.send(EngineCommand::Cancel {
            job_id: job_id.into(),
            report_back,
        });
    }

    pub fn download(&self, url: impl Into<String>) {
        self.send(EngineCommand::Download { url: url.into() });
    }

    pub fn decode_preview(&self, name: impl Into<String>, path: PathBuf, mime: impl Into<String>) {
        self.send(EngineCommand::DecodePreview {
            name: name.into(),
            path,
            mime: mime.into(),
        });
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            compactor_error!("Engine is not running; command dropped");
        }
    }
}

async fn handle_command(
    api: &dyn JobApi,
    output_dir: &std::path::Path,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let event = match command {
        EngineCommand::Start { seq, upload } => {
            let result = api.start(&upload).await;
            EngineEvent::StartCompleted { seq, result }
        }
        EngineCommand::Poll { job_id } => {
            let result = api.progress(&job_id).await;
            EngineEvent::ProgressPolled { job_id, result }
        }
        EngineCommand::Cancel {
            job_id,
            report_back,
        } => {
            let result = api.cancel(&job_id).await;
            EngineEvent::CancelCompleted {
                job_id,
                report_back,
                result,
            }
        }
        EngineCommand::Download { url } => {
            let result = api.download(&url, output_dir).await;
            EngineEvent::DownloadCompleted { url, result }
        }
        EngineCommand::DecodePreview { name, path, mime } => {
            let result = decode_preview(&path, &mime).await;
            EngineEvent::PreviewCompleted { name, result }
        }
    };
    let _ = event_tx.send(event);
}

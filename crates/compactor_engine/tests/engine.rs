use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use compactor_engine::{
    ClientError, EngineEvent, EngineHandle, JobApi, ProgressReply, StartOutcome, Upload,
};
use tempfile::TempDir;

#[derive(Default)]
struct RecordingApi {
    cancels: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl JobApi for RecordingApi {
    async fn start(&self, upload: &Upload) -> Result<StartOutcome, ClientError> {
        Ok(StartOutcome::Accepted {
            job_id: format!("job-for-{}", upload.file_name),
        })
    }

    async fn progress(&self, job_id: &str) -> Result<ProgressReply, ClientError> {
        if job_id == "slow" {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        Ok(ProgressReply {
            percent: Some(50.0),
            ..ProgressReply::default()
        })
    }

    async fn cancel(&self, job_id: &str) -> Result<(), ClientError> {
        self.cancels.lock().unwrap().push(job_id.to_string());
        Ok(())
    }

    async fn download(&self, url: &str, output_dir: &Path) -> Result<PathBuf, ClientError> {
        Ok(output_dir.join(url.trim_start_matches('/').replace('/', "_")))
    }
}

fn recv(rx: &std::sync::mpsc::Receiver<EngineEvent>) -> EngineEvent {
    rx.recv_timeout(Duration::from_secs(5)).expect("engine event")
}

#[test]
fn commands_produce_matching_events() {
    let api = Arc::new(RecordingApi::default());
    let (engine, events) = EngineHandle::new(api.clone(), PathBuf::from("out"));

    engine.start(
        7,
        Upload {
            path: PathBuf::from("clip.mp4"),
            file_name: "clip.mp4".to_string(),
            mime_type: None,
            fields: Vec::new(),
        },
    );
    assert_eq!(
        recv(&events),
        EngineEvent::StartCompleted {
            seq: 7,
            result: Ok(StartOutcome::Accepted {
                job_id: "job-for-clip.mp4".to_string()
            }),
        }
    );

    engine.cancel("job-for-clip.mp4", true);
    assert_eq!(
        recv(&events),
        EngineEvent::CancelCompleted {
            job_id: "job-for-clip.mp4".to_string(),
            report_back: true,
            result: Ok(()),
        }
    );
    assert_eq!(*api.cancels.lock().unwrap(), vec!["job-for-clip.mp4"]);

    engine.download("/f/abc");
    assert_eq!(
        recv(&events),
        EngineEvent::DownloadCompleted {
            url: "/f/abc".to_string(),
            result: Ok(PathBuf::from("out").join("f_abc")),
        }
    );
}

#[test]
fn slow_poll_does_not_block_later_commands() {
    let (engine, events) = EngineHandle::new(Arc::new(RecordingApi::default()), PathBuf::from("out"));

    engine.poll("slow");
    engine.poll("fast");

    let first = recv(&events);
    assert!(
        matches!(&first, EngineEvent::ProgressPolled { job_id, .. } if job_id == "fast"),
        "unexpected first event: {first:?}"
    );
    let second = recv(&events);
    assert!(matches!(&second, EngineEvent::ProgressPolled { job_id, .. } if job_id == "slow"));
}

#[test]
fn preview_is_decoded_to_data_url() {
    let temp = TempDir::new().unwrap();
    let image = temp.path().join("dot.png");
    std::fs::write(&image, b"\x89PNG").unwrap();

    let (engine, events) = EngineHandle::new(Arc::new(RecordingApi::default()), PathBuf::from("out"));
    engine.decode_preview("dot.png", image, "image/png");

    assert_eq!(
        recv(&events),
        EngineEvent::PreviewCompleted {
            name: "dot.png".to_string(),
            result: Ok("data:image/png;base64,iVBORw==".to_string()),
        }
    );
}

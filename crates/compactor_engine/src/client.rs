use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::filename::download_filename;
use crate::persist::{AtomicFileWriter, PersistError};
use crate::types::CancelRequest;
use crate::{ClientError, FailureKind, ProgressReply, StartOutcome, StartReply, Upload};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applies to the upload only; polls and cancels have no overall timeout.
    pub start_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            connect_timeout: Duration::from_secs(10),
            start_timeout: Duration::from_secs(300),
        }
    }
}

/// The server's job API.
#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    async fn start(&self, upload: &Upload) -> Result<StartOutcome, ClientError>;

    async fn progress(&self, job_id: &str) -> Result<ProgressReply, ClientError>;

    async fn cancel(&self, job_id: &str) -> Result<(), ClientError>;

    /// Fetch `url` (absolute, or relative to the server) into `output_dir`.
    async fn download(&self, url: &str, output_dir: &Path) -> Result<PathBuf, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestJobClient {
    settings: ClientSettings,
    base: Url,
    http: reqwest::Client,
}

impl ReqwestJobClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ClientError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as a base url", settings.base_url),
            ));
        }
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ClientError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            http,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::new(FailureKind::InvalidUrl, "base url cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl JobApi for ReqwestJobClient {
    async fn start(&self, upload: &Upload) -> Result<StartOutcome, ClientError> {
        let url = self.endpoint(&["start"])?;
        let bytes = tokio::fs::read(&upload.path)
            .await
            .map_err(|err| ClientError::new(FailureKind::Io, err.to_string()))?;

        let mut part = Part::bytes(bytes).file_name(upload.file_name.clone());
        if let Some(mime) = &upload.mime_type {
            part = part
                .mime_str(mime)
                .map_err(|err| ClientError::new(FailureKind::Decode, err.to_string()))?;
        }
        let form = upload
            .fields
            .iter()
            .fold(Form::new().part("file", part), |form, (name, value)| {
                form.text(name.clone(), value.clone())
            });

        let response = self
            .http
            .post(url)
            .multipart(form)
            .timeout(self.settings.start_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let reply: StartReply = read_json(response).await?;

        match reply {
            StartReply {
                error: Some(error), ..
            } => Ok(StartOutcome::Rejected { error }),
            StartReply {
                job_id: Some(job_id),
                ..
            } => Ok(StartOutcome::Accepted { job_id }),
            StartReply { .. } => Err(ClientError::new(
                FailureKind::Decode,
                "start reply carried neither job_id nor error",
            )),
        }
    }

    async fn progress(&self, job_id: &str) -> Result<ProgressReply, ClientError> {
        let url = self.endpoint(&["progress", job_id])?;
        let response = self.http.get(url).send().await.map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn cancel(&self, job_id: &str) -> Result<(), ClientError> {
        let url = self.endpoint(&["cancel"])?;
        let response = self
            .http
            .post(url)
            .json(&CancelRequest { job_id })
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ClientError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ))
        }
    }

    async fn download(&self, url: &str, output_dir: &Path) -> Result<PathBuf, ClientError> {
        let resolved = self
            .base
            .join(url)
            .map_err(|err| ClientError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let response = self
            .http
            .get(resolved)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let filename = download_filename(url, disposition.as_deref());

        let writer = AtomicFileWriter::new(output_dir.to_path_buf());
        let mut pending = writer.begin(&filename).map_err(map_persist_error)?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            pending.write_chunk(&chunk).map_err(map_persist_error)?;
        }
        pending.commit().map_err(map_persist_error)
    }
}

/// Decode a JSON body regardless of status, so `{error}` replies on 4xx/5xx
/// still reach the caller. Non-JSON error pages become `HttpStatus`.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    match serde_json::from_slice(&body) {
        Ok(value) => Ok(value),
        Err(_) if !status.is_success() => Err(ClientError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        )),
        Err(err) => Err(ClientError::new(FailureKind::Decode, err.to_string())),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::new(FailureKind::Timeout, err.to_string());
    }
    ClientError::new(FailureKind::Network, err.to_string())
}

fn map_persist_error(err: PersistError) -> ClientError {
    ClientError::new(FailureKind::Io, err.to_string())
}

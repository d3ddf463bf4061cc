use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// File plus form fields for `POST /start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub fields: Vec<(String, String)>,
}

/// Raw `/start` body: `{job_id}` or `{error}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct StartReply {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Accepted { job_id: String },
    Rejected { error: String },
}

/// Raw `/progress/{job_id}` body. Every field is optional on the wire.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ProgressReply {
    #[serde(default)]
    pub percent: Option<f64>,
    #[serde(default)]
    pub time_left: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct CancelRequest<'a> {
    pub job_id: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    StartCompleted {
        seq: u64,
        result: Result<StartOutcome, ClientError>,
    },
    ProgressPolled {
        job_id: String,
        result: Result<ProgressReply, ClientError>,
    },
    CancelCompleted {
        job_id: String,
        report_back: bool,
        result: Result<(), ClientError>,
    },
    DownloadCompleted {
        url: String,
        result: Result<PathBuf, ClientError>,
    },
    PreviewCompleted {
        name: String,
        result: Result<String, crate::PreviewError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
    pub kind: FailureKind,
    pub message: String,
}

impl ClientError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Decode,
    Io,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

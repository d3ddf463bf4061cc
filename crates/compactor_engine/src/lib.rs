//! Compactor engine: job API client, downloads and effect execution.
mod client;
mod engine;
mod filename;
mod persist;
mod preview;
mod types;

pub use client::{ClientSettings, JobApi, ReqwestJobClient};
pub use engine::EngineHandle;
pub use filename::download_filename;
pub use persist::{
    ensure_output_dir, remove_stale_files, AtomicFileWriter, PendingFile, PersistError,
    STALE_DOWNLOAD_AGE,
};
pub use preview::{decode_preview, encode_data_url, guess_mime, PreviewError, MAX_PREVIEW_BYTES};
pub use types::{
    ClientError, EngineEvent, FailureKind, ProgressReply, StartOutcome, StartReply, Upload,
};

//! Error types for the convert-client library.
//!
//! Every failure in this crate is local to one job. The controller and the
//! poller never hand a [`ClientError`] back to the caller as a crash: they
//! log it and render it into the job's [`crate::slot::Slot`] as a terminal
//! outcome. The error type still carries full detail so logs and tests can
//! tell the failure kinds apart.
//!
//! The one place errors do propagate is setup: building a
//! [`crate::config::ClientConfig`], constructing the HTTP service, reading a
//! file from disk, and downloading a finished result.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the convert-client library.
#[derive(Debug, Error)]
pub enum ClientError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The selected file could not be read.
    #[error("Failed to read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Upload errors ─────────────────────────────────────────────────────
    /// The upload request never got a response (connect, DNS, timeout …).
    #[error("Upload to '{url}' failed: {reason}")]
    UploadFailed { url: String, reason: String },

    /// The service answered the upload with a non-2xx status.
    #[error("Upload to '{url}' was rejected with HTTP {status}")]
    UploadRejected { url: String, status: u16 },

    // ── Status errors ─────────────────────────────────────────────────────
    /// A status query never got a response.
    #[error("Status query '{url}' failed: {reason}")]
    StatusFailed { url: String, reason: String },

    /// The service answered a status query with a non-2xx status.
    #[error("Status query '{url}' was rejected with HTTP {status}")]
    StatusRejected { url: String, status: u16 },

    /// A response body was not the JSON shape the client expects.
    #[error("Unexpected response from '{url}': {detail}")]
    InvalidResponse { url: String, detail: String },

    /// The readiness ping did not get a 2xx answer.
    #[error("Wake-up ping to '{url}' failed: {reason}")]
    WakeFailed { url: String, reason: String },

    // ── Result errors ─────────────────────────────────────────────────────
    /// Fetching the converted result failed.
    #[error("Download of '{url}' failed: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Could not write the downloaded result to disk.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// True when the request itself failed rather than returning an
    /// unexpected status.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::UploadFailed { .. } | ClientError::StatusFailed { .. }
        )
    }
}

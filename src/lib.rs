//! # convert-client
//!
//! Submit files to a remote conversion service and follow each job until it
//! resolves.
//!
//! ## Why this crate?
//!
//! The conversion service is asynchronous: an upload returns only a document
//! id, and the result appears some time later behind a status endpoint. Every
//! caller ends up writing the same loop of "upload, poll, give up eventually,
//! show what happened". This crate is that loop, written once, with each job
//! isolated so one stuck or failing conversion never disturbs the others.
//!
//! ## Job Lifecycle
//!
//! ```text
//! submit(form)
//!  │
//!  ├─ 1. Slot     appended to the board synchronously (spinner, action disabled)
//!  ├─ 2. Upload   multipart POST, options taken from the form at submit time
//!  ├─ 3. Poll     status query now, then every `poll_interval`
//!  └─ 4. Resolve  exactly one of: converted · conversion error · timed out ·
//!                 upload failed · polling failed
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use convert_client::{
//!     ClientConfig, HttpConversionService, SelectedFile, SubmissionController, UploadForm,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .base_url("http://localhost:8080/converter")
//!         .build()?;
//!     let service = Arc::new(HttpConversionService::new(config.clone())?);
//!     let controller = SubmissionController::new(service, config);
//!
//!     let form = UploadForm {
//!         file: Some(SelectedFile::read("report.docx").await?),
//!         produce_target: true,
//!         ..Default::default()
//!     };
//!     if let Some(ticket) = controller.submit(&form) {
//!         let outcome = ticket.outcome().await;
//!         println!("{}", outcome.summary());
//!     }
//!     for line in controller.board().snapshot()[0].lines() {
//!         println!("{line}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `convert-client` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod controller;
pub mod error;
pub mod options;
pub mod poller;
pub mod progress;
pub mod service;
pub mod slot;
pub mod status;
pub mod wake;

#[cfg(test)]
mod testing;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, ClientConfigBuilder, StatusRoute};
pub use controller::{JobTicket, SubmissionController};
pub use error::ClientError;
pub use options::{PreviewRequest, SelectedFile, SubmitOptions, UploadForm};
pub use poller::{PollEvent, PollState, Poller};
pub use progress::{JobProgressCallback, NoopProgressCallback, ProgressCallback};
pub use service::{ConversionService, HttpConversionService};
pub use slot::{ActionControl, JobBoard, Notice, Outcome, Severity, Slot, SlotHandle, SlotId};
pub use status::{ConversionReport, DocumentId, JobStatus, StatusResponse};
pub use wake::spawn_wake;

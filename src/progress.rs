//! Progress-callback trait for per-job lifecycle events.
//!
//! Inject an [`Arc<dyn JobProgressCallback>`] via
//! [`crate::config::ClientConfigBuilder::progress_callback`] to hear about
//! each job as it is submitted, accepted, polled, and resolved.
//!
//! The slot already records the terminal outcome; callbacks exist so a front
//! end can animate while jobs are still in flight without polling the slots.
//!
//! # Example
//!
//! ```rust
//! use convert_client::{ClientConfig, JobProgressCallback, Outcome, SlotId};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     resolved: AtomicUsize,
//! }
//!
//! impl JobProgressCallback for CountingCallback {
//!     fn on_job_resolved(&self, slot: SlotId, outcome: &Outcome) {
//!         self.resolved.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("slot {slot}: {}", outcome.summary());
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { resolved: AtomicUsize::new(0) });
//! let config = ClientConfig::builder()
//!     .progress_callback(counter as Arc<dyn JobProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::slot::{Outcome, SlotId};
use crate::status::{DocumentId, JobStatus};
use std::sync::Arc;

/// Called by the controller and poller as each job advances.
///
/// All methods default to no-ops. Jobs run as independent tasks, so calls
/// for different slots may interleave in any order.
pub trait JobProgressCallback: Send + Sync {
    /// A slot was opened for a new submission, before the upload is sent.
    fn on_job_submitted(&self, slot: SlotId, label: &str) {
        let _ = (slot, label);
    }

    /// The service accepted the upload and issued an id.
    fn on_job_accepted(&self, slot: SlotId, document_id: &DocumentId) {
        let _ = (slot, document_id);
    }

    /// A status query returned.
    ///
    /// # Arguments
    /// * `attempt`: 1-based count of status queries for this job
    fn on_status_checked(&self, slot: SlotId, attempt: u32, status: JobStatus) {
        let _ = (slot, attempt, status);
    }

    /// The job reached a terminal outcome. Called exactly once per slot.
    fn on_job_resolved(&self, slot: SlotId, outcome: &Outcome) {
        let _ = (slot, outcome);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl JobProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type ProgressCallback = Arc<dyn JobProgressCallback>;

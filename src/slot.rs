//! Slots: the client-side record of one submitted job.
//!
//! A [`Slot`] is opened synchronously when a file is submitted, before any
//! network traffic, so there is something to show immediately. It starts
//! with a disabled action control and an active progress indicator, and is
//! mutated exactly once more, when its job reaches a terminal [`Outcome`].
//!
//! Slots live on a [`JobBoard`], an append-only list shared by every job.
//! The board is the only state jobs share; each slot is written only by the
//! task that owns it.

use crate::status::{ConversionReport, DocumentId};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Position of a slot on its board. Stable for the board's lifetime.
pub type SlotId = usize;

pub const UPLOAD_FAILED: &str = "Upload failed.";
pub const POLLING_FAILED: &str = "Polling failed.";
pub const TIMED_OUT: &str = "Timed out waiting for conversion.";

/// How a terminal message should be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Hard failure.
    Error,
    /// The job may still finish server-side; the client stopped waiting.
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub text: String,
}

/// The "download result" control. Disabled until the job converts cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionControl {
    pub enabled: bool,
    pub target: Option<String>,
}

impl ActionControl {
    /// URL to navigate to, if the control is enabled.
    pub fn activate(&self) -> Option<&str> {
        if self.enabled {
            self.target.as_deref()
        } else {
            None
        }
    }
}

/// Terminal result of one job.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Conversion finished with no error.
    Converted {
        report: ConversionReport,
        download_url: String,
    },
    /// The service completed the job but reported an error.
    ConversionError(String),
    /// No completion was seen within the polling budget.
    TimedOut,
    /// The upload request itself failed.
    UploadFailed,
    /// A status query itself failed.
    PollingFailed,
}

impl Outcome {
    /// The message rendered into the slot, for anything but success.
    pub fn notice(&self) -> Option<Notice> {
        let (severity, text) = match self {
            Outcome::Converted { .. } => return None,
            Outcome::ConversionError(e) => (Severity::Error, format!("Error: {e}")),
            Outcome::TimedOut => (Severity::Warning, TIMED_OUT.to_string()),
            Outcome::UploadFailed => (Severity::Error, UPLOAD_FAILED.to_string()),
            Outcome::PollingFailed => (Severity::Error, POLLING_FAILED.to_string()),
        };
        Some(Notice { severity, text })
    }

    /// One-line description for logs and progress output.
    pub fn summary(&self) -> String {
        match self {
            Outcome::Converted { report, .. } => format!("converted ({})", report.document_id),
            other => other
                .notice()
                .map(|n| n.text)
                .unwrap_or_default(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Converted { .. })
    }
}

/// Visible state of one job.
#[derive(Debug, Clone, Serialize)]
pub struct Slot {
    pub id: SlotId,
    /// Original file name.
    pub label: String,
    pub document_id: Option<DocumentId>,
    pub action: ActionControl,
    /// Spinner. Removed exactly once, at the terminal outcome.
    pub in_progress: bool,
    pub report: Option<ConversionReport>,
    pub notice: Option<Notice>,
}

impl Slot {
    fn new(id: SlotId, label: String) -> Self {
        Self {
            id,
            label,
            document_id: None,
            action: ActionControl::default(),
            in_progress: true,
            report: None,
            notice: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.in_progress
    }

    /// Apply a terminal outcome. Returns `false`, leaving the slot as it
    /// was, if an outcome was already applied.
    pub fn resolve(&mut self, outcome: &Outcome) -> bool {
        if self.is_resolved() {
            warn!(
                "Slot {} ({}) already resolved; ignoring {:?}",
                self.id, self.label, outcome
            );
            return false;
        }
        self.in_progress = false;
        match outcome {
            Outcome::Converted {
                report,
                download_url,
            } => {
                self.action = ActionControl {
                    enabled: true,
                    target: Some(download_url.clone()),
                };
                self.report = Some(report.clone());
            }
            other => self.notice = other.notice(),
        }
        true
    }

    /// Display lines: the label, then either metadata or the notice.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.label.clone()];
        if self.in_progress {
            lines.push("Working…".to_string());
        }
        if let Some(ref report) = self.report {
            lines.extend(report.lines());
        }
        if let Some(ref notice) = self.notice {
            lines.push(notice.text.clone());
        }
        lines
    }
}

/// Shared handle to one slot on a board.
#[derive(Debug, Clone)]
pub struct SlotHandle {
    id: SlotId,
    inner: Arc<Mutex<Slot>>,
}

impl SlotHandle {
    pub fn id(&self) -> SlotId {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state of the slot.
    pub fn snapshot(&self) -> Slot {
        self.lock().clone()
    }

    pub fn set_document_id(&self, id: DocumentId) {
        self.lock().document_id = Some(id);
    }

    pub fn resolve(&self, outcome: &Outcome) -> bool {
        let applied = self.lock().resolve(outcome);
        if applied {
            debug!("Slot {} resolved: {}", self.id, outcome.summary());
        }
        applied
    }
}

/// Append-only list of slots, one per submitted job.
#[derive(Debug, Clone, Default)]
pub struct JobBoard {
    slots: Arc<Mutex<Vec<SlotHandle>>>,
}

impl JobBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SlotHandle>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a fresh in-progress slot labelled with `label`.
    pub fn open_slot(&self, label: impl Into<String>) -> SlotHandle {
        let mut slots = self.lock();
        let id = slots.len();
        let handle = SlotHandle {
            id,
            inner: Arc::new(Mutex::new(Slot::new(id, label.into()))),
        };
        slots.push(handle.clone());
        handle
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: SlotId) -> Option<SlotHandle> {
        self.lock().get(id).cloned()
    }

    /// Current state of every slot, in submission order.
    pub fn snapshot(&self) -> Vec<Slot> {
        let handles: Vec<SlotHandle> = self.lock().clone();
        handles.iter().map(SlotHandle::snapshot).collect()
    }
}

//! Submission: one upload per form submit, one slot per upload.
//!
//! [`SubmissionController::submit`] is synchronous up to the network call.
//! It reads the options off the form, appends the slot to the board, and
//! only then spawns the task that uploads and hands off to the
//! [`crate::poller::Poller`]. A caller therefore sees the new slot before the
//! upload has even been sent.
//!
//! Each job runs as its own task with its own slot. Jobs never look at each
//! other; the board is the only thing they share.

use crate::config::ClientConfig;
use crate::options::{SelectedFile, SubmitOptions, UploadForm};
use crate::poller::Poller;
use crate::service::ConversionService;
use crate::slot::{JobBoard, Outcome, SlotHandle, SlotId};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Accepts form submissions and starts one job per valid submit.
///
/// Must be used from inside a Tokio runtime: `submit` spawns the job task.
pub struct SubmissionController {
    service: Arc<dyn ConversionService>,
    config: Arc<ClientConfig>,
    board: JobBoard,
}

impl SubmissionController {
    pub fn new(service: Arc<dyn ConversionService>, config: ClientConfig) -> Self {
        Self {
            service,
            config: Arc::new(config),
            board: JobBoard::new(),
        }
    }

    pub fn board(&self) -> &JobBoard {
        &self.board
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn service(&self) -> Arc<dyn ConversionService> {
        Arc::clone(&self.service)
    }

    /// Submit the form as it is right now.
    ///
    /// Returns `None`, with no slot and no network call, when no file is
    /// selected. Otherwise the slot is on the board when this returns.
    pub fn submit(&self, form: &UploadForm) -> Option<JobTicket> {
        let Some(file) = form.file.clone() else {
            debug!("Submit with no file selected; nothing to do");
            return None;
        };

        let options = SubmitOptions::from_form(form, &self.config);
        let slot = self.board.open_slot(file.name.clone());
        info!("Submitting {} as slot {}", file.name, slot.id());
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_job_submitted(slot.id(), &file.name);
        }

        let task = tokio::spawn(run_job(
            Arc::clone(&self.service),
            Arc::clone(&self.config),
            file,
            options,
            slot.clone(),
        ));

        Some(JobTicket { slot, task })
    }
}

/// Handle to one in-flight job.
pub struct JobTicket {
    slot: SlotHandle,
    task: JoinHandle<Outcome>,
}

impl JobTicket {
    pub fn slot_id(&self) -> SlotId {
        self.slot.id()
    }

    pub fn slot(&self) -> &SlotHandle {
        &self.slot
    }

    /// Wait for the job's terminal outcome.
    ///
    /// If the job task died without resolving its slot, the slot is marked
    /// as a polling failure so it never stays in progress.
    pub async fn outcome(self) -> Outcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Job task for slot {} ended abnormally: {}", self.slot.id(), e);
                let outcome = Outcome::PollingFailed;
                self.slot.resolve(&outcome);
                outcome
            }
        }
    }
}

async fn run_job(
    service: Arc<dyn ConversionService>,
    config: Arc<ClientConfig>,
    file: SelectedFile,
    options: SubmitOptions,
    slot: SlotHandle,
) -> Outcome {
    match service.upload(&file, &options).await {
        Ok(id) => {
            info!("{} accepted as document {}", file.name, id);
            slot.set_document_id(id.clone());
            if let Some(ref cb) = config.progress_callback {
                cb.on_job_accepted(slot.id(), &id);
            }
            Poller::new(service, &config, id, slot).run().await
        }
        Err(e) => {
            if e.is_transport() {
                warn!("Upload of {} got no response: {}", file.name, e);
            } else {
                warn!("Upload of {} failed: {}", file.name, e);
            }
            let outcome = Outcome::UploadFailed;
            slot.resolve(&outcome);
            if let Some(ref cb) = config.progress_callback {
                cb.on_job_resolved(slot.id(), &outcome);
            }
            outcome
        }
    }
}

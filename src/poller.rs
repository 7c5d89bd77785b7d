//! Status polling for one job.
//!
//! ## State machine
//!
//! ```text
//!            ┌── pending / other ──┐
//!            ▼                     │
//!        Polling ──────────────────┘
//!          │  │  │  │
//!          │  │  │  └─ deadline reached ─────────▶ TimedOut
//!          │  │  └──── query failed ─────────────▶ Failed
//!          │  └─────── complete + error ─────────▶ CompletedError
//!          └────────── complete, no error ───────▶ CompletedSuccess
//! ```
//!
//! Every state but `Polling` is absorbing. [`PollState::on_event`] is the
//! whole transition table; [`Poller::run`] only feeds it events and sleeps.
//!
//! The deadline is wall-clock time since hand-off, checked before each
//! query, so slow responses count against the budget just like pending
//! ones. Queries for one job never overlap: the next one is issued only
//! after the previous one has resolved and the interval has elapsed.

use crate::config::ClientConfig;
use crate::progress::ProgressCallback;
use crate::service::ConversionService;
use crate::slot::{Outcome, SlotHandle};
use crate::status::{ConversionReport, DocumentId, StatusResponse};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Where a job is in its polling lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Polling,
    CompletedSuccess(ConversionReport),
    CompletedError(String),
    TimedOut,
    Failed,
}

/// Input to the state machine.
#[derive(Debug)]
pub enum PollEvent {
    /// The polling budget ran out before the next query.
    DeadlineReached,
    /// A status query returned a parseable body.
    Response(StatusResponse),
    /// A status query itself failed.
    QueryFailed,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Polling)
    }

    /// Apply one event. Terminal states ignore every event.
    pub fn on_event(self, event: PollEvent, id: &DocumentId) -> PollState {
        if self.is_terminal() {
            return self;
        }
        match event {
            PollEvent::DeadlineReached => PollState::TimedOut,
            PollEvent::QueryFailed => PollState::Failed,
            PollEvent::Response(resp) if resp.is_complete() => match resp.conversion_error() {
                // Error presence suppresses the success path entirely.
                Some(error) => PollState::CompletedError(error.to_string()),
                None => PollState::CompletedSuccess(ConversionReport::from_data(
                    resp.data.as_ref(),
                    id,
                )),
            },
            PollEvent::Response(_) => PollState::Polling,
        }
    }

    /// The outcome a terminal state renders, or `None` while still polling.
    pub fn into_outcome(self, download_url: &str) -> Option<Outcome> {
        match self {
            PollState::Polling => None,
            PollState::CompletedSuccess(report) => Some(Outcome::Converted {
                report,
                download_url: download_url.to_string(),
            }),
            PollState::CompletedError(e) => Some(Outcome::ConversionError(e)),
            PollState::TimedOut => Some(Outcome::TimedOut),
            PollState::Failed => Some(Outcome::PollingFailed),
        }
    }
}

/// Drives one job from hand-off to its terminal outcome.
///
/// Owns everything the job needs: its id, its slot, its timer. Nothing here
/// is shared with other jobs.
pub struct Poller {
    service: Arc<dyn ConversionService>,
    document_id: DocumentId,
    slot: SlotHandle,
    download_url: String,
    interval: Duration,
    budget: Duration,
    callback: Option<ProgressCallback>,
    started: Instant,
}

impl Poller {
    /// Create a poller. The timeout clock starts now.
    pub fn new(
        service: Arc<dyn ConversionService>,
        config: &ClientConfig,
        document_id: DocumentId,
        slot: SlotHandle,
    ) -> Self {
        Self {
            service,
            download_url: config.download_url(&document_id),
            document_id,
            slot,
            interval: config.poll_interval,
            budget: config.timeout_budget,
            callback: config.progress_callback.clone(),
            started: Instant::now(),
        }
    }

    /// Poll until a terminal state, render it into the slot, and return it.
    ///
    /// The first query is issued immediately.
    pub async fn run(self) -> Outcome {
        let id = &self.document_id;
        let mut attempt: u32 = 0;

        loop {
            let event = if self.started.elapsed() >= self.budget {
                info!(
                    "Job {}: no completion after {:?}, giving up",
                    id,
                    self.started.elapsed()
                );
                PollEvent::DeadlineReached
            } else {
                attempt += 1;
                match self.service.status(id).await {
                    Ok(resp) => {
                        debug!("Job {}: query {} → {:?}", id, attempt, resp.status);
                        if let Some(ref cb) = self.callback {
                            cb.on_status_checked(self.slot.id(), attempt, resp.status);
                        }
                        PollEvent::Response(resp)
                    }
                    Err(e) => {
                        if e.is_transport() {
                            warn!("Job {}: query {} got no response: {}", id, attempt, e);
                        } else {
                            warn!("Job {}: query {} failed: {}", id, attempt, e);
                        }
                        PollEvent::QueryFailed
                    }
                }
            };

            // Every terminal state returns, so each pass starts in `Polling`.
            match PollState::Polling
                .on_event(event, id)
                .into_outcome(&self.download_url)
            {
                None => sleep(self.interval).await,
                Some(outcome) => return self.finish(outcome),
            }
        }
    }

    fn finish(&self, outcome: Outcome) -> Outcome {
        self.slot.resolve(&outcome);
        if let Some(ref cb) = self.callback {
            cb.on_job_resolved(self.slot.id(), &outcome);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::{JobBoard, Severity};
    use crate::testing::{complete, complete_with_error, pending, FakeService};
    use serde_json::json;

    fn config(interval_secs: u64, budget_secs: u64) -> ClientConfig {
        ClientConfig::builder()
            .base_url("http://svc/converter")
            .poll_interval(Duration::from_secs(interval_secs))
            .timeout_budget(Duration::from_secs(budget_secs))
            .build()
            .unwrap()
    }

    fn id() -> DocumentId {
        DocumentId::from(42u64)
    }

    #[test]
    fn pending_stays_polling() {
        let s = PollState::Polling.on_event(PollEvent::Response(pending()), &id());
        assert_eq!(s, PollState::Polling);
    }

    #[test]
    fn error_beats_metadata() {
        let resp = complete_with_error(json!({"pdf": {"pages": 3}}), "corrupt file");
        let s = PollState::Polling.on_event(PollEvent::Response(resp), &id());
        assert_eq!(s, PollState::CompletedError("corrupt file".into()));
    }

    #[test]
    fn terminal_states_absorb() {
        for terminal in [PollState::TimedOut, PollState::Failed] {
            let next = terminal
                .clone()
                .on_event(PollEvent::Response(complete(json!({}))), &id());
            assert_eq!(next, terminal);
        }
    }

    #[test]
    fn polling_has_no_outcome() {
        assert!(PollState::Polling.into_outcome("x").is_none());
        assert_eq!(
            PollState::Failed.into_outcome("x"),
            Some(Outcome::PollingFailed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pending_then_complete_renders_metadata() {
        let service = FakeService::new();
        service.push_status(Ok(pending()));
        service.push_status(Ok(complete(json!({
            "document_id": 42,
            "pdf": {"pages": 5, "size": 20480},
            "conversion_time": {"t": {"elapsed_time": 1.3}}
        }))));
        let board = JobBoard::new();
        let slot = board.open_slot("report.pdf");

        let start = Instant::now();
        let outcome = Poller::new(service.clone(), &config(2, 15), id(), slot.clone())
            .run()
            .await;

        assert!(outcome.is_success());
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(2) && waited < Duration::from_secs(3));
        assert_eq!(service.status_calls(), 2);

        let snap = slot.snapshot();
        assert_eq!(snap.action.activate(), Some("http://svc/converter/42"));
        assert_eq!(
            snap.report.unwrap().lines(),
            vec![
                "Document ID: 42",
                "Elapsed Time: 1.3 s",
                "Pages: 5",
                "Size: 20480 bytes",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn endless_pending_times_out_and_stops() {
        let service = FakeService::new();
        let board = JobBoard::new();
        let slot = board.open_slot("report.pdf");

        let outcome = Poller::new(service.clone(), &config(2, 15), id(), slot.clone())
            .run()
            .await;
        assert_eq!(outcome, Outcome::TimedOut);

        // Queries at t = 0, 2, …, 14; the check at t = 16 trips the budget.
        assert_eq!(service.status_calls(), 8);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(service.status_calls(), 8);

        let snap = slot.snapshot();
        assert!(!snap.in_progress);
        assert!(!snap.action.enabled);
        assert!(snap.report.is_none());
        assert_eq!(snap.notice.unwrap().severity, Severity::Warning);
    }

    #[tokio::test(start_paused = true)]
    async fn budget_and_interval_are_independent() {
        let service = FakeService::new();
        let slot = JobBoard::new().open_slot("a.docx");

        let outcome = Poller::new(service.clone(), &config(2, 20), id(), slot)
            .run()
            .await;
        assert_eq!(outcome, Outcome::TimedOut);
        assert_eq!(service.status_calls(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_responses_count_against_budget() {
        let service = FakeService::new();
        service.set_status_delay(Duration::from_secs(10));
        let slot = JobBoard::new().open_slot("slow.docx");

        let outcome = Poller::new(service.clone(), &config(2, 15), id(), slot)
            .run()
            .await;

        // t=0 → 10 pending, sleep to 12, t=12 → 22 pending, sleep to 24: over.
        assert_eq!(outcome, Outcome::TimedOut);
        assert_eq!(service.status_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn conversion_error_is_rendered_verbatim() {
        let service = FakeService::new();
        service.push_status(Ok(complete_with_error(json!({}), "corrupt file")));
        let slot = JobBoard::new().open_slot("bad.pdf");

        let outcome = Poller::new(service.clone(), &config(2, 15), id(), slot.clone())
            .run()
            .await;
        assert_eq!(outcome, Outcome::ConversionError("corrupt file".into()));

        let snap = slot.snapshot();
        assert!(!snap.action.enabled);
        assert!(snap.report.is_none());
        assert_eq!(snap.notice.unwrap().text, "Error: corrupt file");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_query_stops_polling() {
        let service = FakeService::new();
        service.push_status(Ok(pending()));
        service.push_status(Err(crate::error::ClientError::StatusFailed {
            url: "http://svc/converter/status/42".into(),
            reason: "connection reset".into(),
        }));
        let slot = JobBoard::new().open_slot("a.pdf");

        let outcome = Poller::new(service.clone(), &config(2, 15), id(), slot.clone())
            .run()
            .await;
        assert_eq!(outcome, Outcome::PollingFailed);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(service.status_calls(), 2);
        assert_eq!(slot.snapshot().notice.unwrap().text, "Polling failed.");
    }
}

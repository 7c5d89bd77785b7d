//! In-memory [`ConversionService`] for unit tests.

use crate::error::ClientError;
use crate::options::{SelectedFile, SubmitOptions};
use crate::service::ConversionService;
use crate::status::{DocumentId, StatusResponse};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub fn pending() -> StatusResponse {
    serde_json::from_value(json!({"status": "pending"})).unwrap()
}

pub fn complete(data: Value) -> StatusResponse {
    serde_json::from_value(json!({"status": "complete", "data": data})).unwrap()
}

pub fn complete_with_error(mut data: Value, error: &str) -> StatusResponse {
    data["error"] = Value::String(error.to_string());
    complete(data)
}

/// Scripted service. Status answers are served in order; once the script
/// runs out every query answers `pending`.
pub struct FakeService {
    statuses: Mutex<VecDeque<Result<StatusResponse, ClientError>>>,
    status_delay: Mutex<Duration>,
    upload_result: Mutex<Option<ClientError>>,
    upload_gate: Mutex<Option<Arc<Notify>>>,
    uploads: Mutex<Vec<(String, SubmitOptions)>>,
    status_calls: AtomicUsize,
    wake_calls: AtomicUsize,
}

impl FakeService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(VecDeque::new()),
            status_delay: Mutex::new(Duration::ZERO),
            upload_result: Mutex::new(None),
            upload_gate: Mutex::new(None),
            uploads: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
            wake_calls: AtomicUsize::new(0),
        })
    }

    pub fn push_status(&self, resp: Result<StatusResponse, ClientError>) {
        self.statuses.lock().unwrap().push_back(resp);
    }

    pub fn set_status_delay(&self, delay: Duration) {
        *self.status_delay.lock().unwrap() = delay;
    }

    /// Make the next upload fail with `err`.
    pub fn fail_upload(&self, err: ClientError) {
        *self.upload_result.lock().unwrap() = Some(err);
    }

    /// Hold every upload until the returned `Notify` is signalled.
    pub fn gate_uploads(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.upload_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn uploads(&self) -> Vec<(String, SubmitOptions)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn wake_calls(&self) -> usize {
        self.wake_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ConversionService for FakeService {
    async fn upload(
        &self,
        file: &SelectedFile,
        options: &SubmitOptions,
    ) -> Result<DocumentId, ClientError> {
        self.uploads
            .lock()
            .unwrap()
            .push((file.name.clone(), options.clone()));
        let gate = self.upload_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.upload_result.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(DocumentId::from(42u64)),
        }
    }

    async fn status(&self, _id: &DocumentId) -> Result<StatusResponse, ClientError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.status_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(pending()))
    }

    async fn wake(&self) -> Result<(), ClientError> {
        self.wake_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

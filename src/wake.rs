//! Readiness ping sent once at startup.
//!
//! Conversion backends may scale to zero; a cheap GET at startup gives them
//! a head start. Nothing waits on it and nothing reads its result.

use crate::service::ConversionService;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Fire the ping on a detached task.
pub fn spawn_wake(service: Arc<dyn ConversionService>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match service.wake().await {
            Ok(()) => info!("Converter woken up."),
            Err(e) => warn!("Wake-up ping failed: {}", e),
        }
    })
}

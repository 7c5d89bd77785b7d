//! Configuration types for the conversion client.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. Every deployment of the conversion service differs
//! in small ways (status URL shape, how long a job may take), so those are
//! configuration values rather than constants.

use crate::error::ClientError;
use crate::progress::ProgressCallback;
use crate::status::DocumentId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Configuration for talking to a conversion service.
///
/// # Example
/// ```rust
/// use convert_client::{ClientConfig, StatusRoute};
/// use std::time::Duration;
///
/// let config = ClientConfig::builder()
///     .base_url("https://docs.example.com/converter")
///     .status_route(StatusRoute::Suffixed)
///     .timeout_budget(Duration::from_secs(20))
///     .build()
///     .unwrap();
/// assert_eq!(
///     config.status_url(&"7".into()),
///     "https://docs.example.com/converter/7/status"
/// );
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Root of the conversion endpoint. Default: `http://localhost:8080/converter`.
    ///
    /// Uploads are posted here; every other URL is derived from it.
    pub base_url: String,

    /// Where per-job status lives relative to `base_url`. Default: [`StatusRoute::Prefixed`].
    pub status_route: StatusRoute,

    /// Delay between a `pending` answer and the next status query. Default: 2 s.
    pub poll_interval: Duration,

    /// Wall-clock budget for one job, measured from hand-off to the poller.
    /// Default: 15 s.
    ///
    /// Independent of `poll_interval`: a 15 s budget with a 2 s interval does
    /// not mean "seven attempts", because slow responses eat into the budget.
    pub timeout_budget: Duration,

    /// Per-request HTTP timeout in seconds. Default: 30.
    pub request_timeout_secs: u64,

    /// Token sent as `action` when the "produce target format" toggle is on.
    /// Default: `pdf`.
    pub target_format: String,

    /// Preview height used when the height field is left blank. Default: 100.
    pub default_preview_height: u32,

    /// Optional observer for job lifecycle events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/converter".to_string(),
            status_route: StatusRoute::default(),
            poll_interval: Duration::from_secs(2),
            timeout_budget: Duration::from_secs(15),
            request_timeout_secs: 30,
            target_format: "pdf".to_string(),
            default_preview_height: 100,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("status_route", &self.status_route)
            .field("poll_interval", &self.poll_interval)
            .field("timeout_budget", &self.timeout_budget)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("target_format", &self.target_format)
            .field("default_preview_height", &self.default_preview_height)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn JobProgressCallback>"),
            )
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// URL the multipart upload is posted to.
    pub fn upload_url(&self) -> String {
        self.base_url.clone()
    }

    /// Status resource for one job.
    pub fn status_url(&self, id: &DocumentId) -> String {
        match self.status_route {
            StatusRoute::Prefixed => self.job_url(&["status", id.as_str()]),
            StatusRoute::Suffixed => self.job_url(&[id.as_str(), "status"]),
        }
    }

    /// Result resource the enabled action control points at.
    pub fn download_url(&self, id: &DocumentId) -> String {
        self.job_url(&[id.as_str()])
    }

    /// Append path segments to the base URL, percent-encoding each one so an
    /// id containing `/`, `?` or `#` stays a single segment.
    fn job_url(&self, segments: &[&str]) -> String {
        match reqwest::Url::parse(&self.base_url) {
            Ok(mut url) => {
                if let Ok(mut path) = url.path_segments_mut() {
                    path.pop_if_empty().extend(segments);
                }
                url.to_string()
            }
            // `build()` rejects such a base; keep the plain join for a
            // hand-assembled config.
            Err(_) => format!("{}/{}", self.base_url, segments.join("/")),
        }
    }

    /// Readiness ping endpoint.
    pub fn wake_url(&self) -> String {
        format!("{}/wake-up", self.base_url)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.config.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn status_route(mut self, route: StatusRoute) -> Self {
        self.config.status_route = route;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn timeout_budget(mut self, budget: Duration) -> Self {
        self.config.timeout_budget = budget;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn target_format(mut self, token: impl Into<String>) -> Self {
        self.config.target_format = token.into();
        self
    }

    pub fn default_preview_height(mut self, height: u32) -> Self {
        self.config.default_preview_height = height;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, ClientError> {
        let c = &self.config;
        let parsed = reqwest::Url::parse(&c.base_url).map_err(|e| {
            ClientError::InvalidConfig(format!("base URL '{}' is not valid: {}", c.base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig(format!(
                "base URL must be http or https, got '{}'",
                parsed.scheme()
            )));
        }
        if c.poll_interval.is_zero() {
            return Err(ClientError::InvalidConfig(
                "Poll interval must be greater than zero".into(),
            ));
        }
        if c.timeout_budget.is_zero() {
            return Err(ClientError::InvalidConfig(
                "Timeout budget must be greater than zero".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Shape of the per-job status URL.
///
/// Deployments disagree on this for no functional reason, so both are
/// supported and neither is assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusRoute {
    /// `{base}/status/{id}` (default)
    #[default]
    Prefixed,
    /// `{base}/{id}/status`
    Suffixed,
}

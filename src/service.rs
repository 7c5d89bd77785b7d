//! The conversion service as the client sees it.
//!
//! [`ConversionService`] is the only seam between job tracking and the
//! network. The controller and poller are written against the trait so they
//! can be driven by an in-memory fake; [`HttpConversionService`] is the real
//! implementation on top of `reqwest`.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::options::{SelectedFile, SubmitOptions};
use crate::status::{DocumentId, StatusResponse, UploadResponse};
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Remote conversion service interface.
#[async_trait::async_trait]
pub trait ConversionService: Send + Sync {
    /// Submit one file. Returns the id the job will be tracked under.
    async fn upload(
        &self,
        file: &SelectedFile,
        options: &SubmitOptions,
    ) -> Result<DocumentId, ClientError>;

    /// Query the status of one job.
    async fn status(&self, id: &DocumentId) -> Result<StatusResponse, ClientError>;

    /// Readiness ping. The response body is ignored.
    async fn wake(&self) -> Result<(), ClientError>;
}

/// [`ConversionService`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpConversionService {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpConversionService {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ClientError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch the converted result for `id` and write it into `dest_dir`.
    ///
    /// This is what activating an enabled action control means outside a
    /// browser. The file is named after the job id with a `.pdf` extension
    /// and written through a temp file and a rename, so a failed download
    /// never leaves a partial file behind.
    pub async fn download(&self, id: &DocumentId, dest_dir: &Path) -> Result<PathBuf, ClientError> {
        let url = self.config.download_url(id);
        info!("Downloading result from: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::DownloadFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ClientError::DownloadFailed {
                url,
                reason: format!("HTTP {}", response.status()),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::DownloadFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let path = dest_dir.join(format!("{}.pdf", file_stem(id)));
        let write_err = |e| ClientError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        };
        tokio::fs::create_dir_all(dest_dir).await.map_err(write_err)?;

        // Atomic write: write to temp, then rename
        let tmp_path = path.with_extension("pdf.tmp");
        let written = match tokio::fs::write(&tmp_path, &bytes).await {
            Ok(()) => tokio::fs::rename(&tmp_path, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
                debug!("Could not remove {}: {}", tmp_path.display(), cleanup);
            }
            return Err(write_err(e));
        }

        info!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

/// Ids are opaque, so anything that is not safe in a file name is replaced.
fn file_stem(id: &DocumentId) -> String {
    id.as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[async_trait::async_trait]
impl ConversionService for HttpConversionService {
    async fn upload(
        &self,
        file: &SelectedFile,
        options: &SubmitOptions,
    ) -> Result<DocumentId, ClientError> {
        let url = self.config.upload_url();
        let pairs = options.query_pairs();
        debug!("POST {} ({} bytes) query={:?}", url, file.bytes.len(), pairs);

        let part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        let form = Form::new().part("upload", part);

        let response = self
            .client
            .post(&url)
            .query(&pairs)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::UploadFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ClientError::UploadRejected {
                url,
                status: response.status().as_u16(),
            });
        }

        let body: UploadResponse =
            response
                .json()
                .await
                .map_err(|e| ClientError::InvalidResponse {
                    url: url.clone(),
                    detail: e.to_string(),
                })?;
        Ok(body.document_id)
    }

    async fn status(&self, id: &DocumentId) -> Result<StatusResponse, ClientError> {
        let url = self.config.status_url(id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::StatusFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ClientError::StatusRejected {
                url,
                status: response.status().as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse {
                url,
                detail: e.to_string(),
            })
    }

    async fn wake(&self) -> Result<(), ClientError> {
        let url = self.config.wake_url();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::WakeFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(ClientError::WakeFailed {
                url,
                reason: format!("HTTP {}", response.status()),
            });
        }
        Ok(())
    }
}

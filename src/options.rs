//! Form state and the request options derived from it.
//!
//! Options are captured once, when the form is submitted. A job keeps the
//! options it was submitted with even if the form changes while it polls.

use crate::config::ClientConfig;
use crate::error::ClientError;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// A file picked for upload: its display name and raw bytes.
#[derive(Clone)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk, labelling it with its file name.
    pub async fn read(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ClientError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("Read {} ({} bytes)", name, bytes.len());
        Ok(Self { name, bytes })
    }
}

/// Raw preview size fields, exactly as typed. Blank means "use the default".
#[derive(Debug, Clone, Default)]
pub struct PreviewRequest {
    pub height: String,
    pub width: String,
}

/// Current state of the upload form.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    /// The picked file, if any. Submitting with no file is a no-op.
    pub file: Option<SelectedFile>,
    /// "Produce target format" toggle.
    pub produce_target: bool,
    /// Set when preview generation is requested.
    pub preview: Option<PreviewRequest>,
    /// Free-text tag list, comma separated.
    pub tags: String,
    /// "Generate thumbnails" toggle. `None` leaves the flag off the request.
    pub thumbnails: Option<bool>,
}

/// Request options captured from the form at submit time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmitOptions {
    pub action: Option<String>,
    pub thumb: Option<String>,
    pub tags: Vec<String>,
    pub thumbnails: Option<bool>,
}

impl SubmitOptions {
    pub fn from_form(form: &UploadForm, config: &ClientConfig) -> Self {
        let token = if form.produce_target {
            config.target_format.clone()
        } else {
            String::new()
        };

        // The service expects `action` alongside every preview request, even
        // when the token is empty.
        let action = if form.produce_target || form.preview.is_some() {
            Some(token)
        } else {
            None
        };

        let thumb = form.preview.as_ref().map(|p| {
            let height = match p.height.trim() {
                "" => config.default_preview_height.to_string(),
                h => h.to_string(),
            };
            format!("{}x{}", height, p.width.trim())
        });

        let tags = form
            .tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            action,
            thumb,
            tags,
            thumbnails: form.thumbnails,
        }
    }

    /// Query pairs in their fixed order. Values are not yet URL-encoded.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(ref action) = self.action {
            pairs.push(("action", action.clone()));
        }
        if let Some(ref thumb) = self.thumb {
            pairs.push(("thumb", thumb.clone()));
        }
        if !self.tags.is_empty() {
            pairs.push(("tags", self.tags.join(",")));
        }
        if let Some(flag) = self.thumbnails {
            pairs.push(("thumbnails", if flag { "1" } else { "0" }.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::default()
    }

    #[test]
    fn bare_form_has_no_query() {
        let opts = SubmitOptions::from_form(&UploadForm::default(), &config());
        assert!(opts.query_pairs().is_empty());
    }

    #[test]
    fn target_toggle_alone() {
        let form = UploadForm {
            produce_target: true,
            ..Default::default()
        };
        let opts = SubmitOptions::from_form(&form, &config());
        assert_eq!(opts.query_pairs(), vec![("action", "pdf".to_string())]);
    }

    #[test]
    fn preview_defaults_height_and_blank_width() {
        let form = UploadForm {
            preview: Some(PreviewRequest::default()),
            ..Default::default()
        };
        let opts = SubmitOptions::from_form(&form, &config());
        assert_eq!(
            opts.query_pairs(),
            vec![("action", String::new()), ("thumb", "100x".to_string())]
        );
    }

    #[test]
    fn preview_uses_typed_sizes() {
        let form = UploadForm {
            produce_target: true,
            preview: Some(PreviewRequest {
                height: " 240 ".into(),
                width: "320".into(),
            }),
            ..Default::default()
        };
        let opts = SubmitOptions::from_form(&form, &config());
        assert_eq!(opts.thumb.as_deref(), Some("240x320"));
        assert_eq!(opts.action.as_deref(), Some("pdf"));
    }

    #[test]
    fn tags_are_trimmed_and_joined() {
        let form = UploadForm {
            tags: " invoices, 2024 ,, q3 ".into(),
            thumbnails: Some(false),
            ..Default::default()
        };
        let opts = SubmitOptions::from_form(&form, &config());
        assert_eq!(
            opts.query_pairs(),
            vec![
                ("tags", "invoices,2024,q3".to_string()),
                ("thumbnails", "0".to_string()),
            ]
        );
    }

    #[test]
    fn custom_default_height() {
        let cfg = ClientConfig::builder()
            .default_preview_height(64)
            .build()
            .unwrap();
        let form = UploadForm {
            preview: Some(PreviewRequest {
                height: String::new(),
                width: "48".into(),
            }),
            ..Default::default()
        };
        assert_eq!(
            SubmitOptions::from_form(&form, &cfg).thumb.as_deref(),
            Some("64x48")
        );
    }

    #[tokio::test]
    async fn read_labels_with_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        tokio::fs::write(&path, b"%PDF-1.7").await.unwrap();

        let file = SelectedFile::read(&path).await.unwrap();
        assert_eq!(file.name, "report.pdf");
        assert_eq!(file.bytes, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn read_missing_file_errors() {
        let err = SelectedFile::read("/definitely/not/here.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::FileRead { .. }));
    }
}

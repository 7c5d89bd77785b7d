//! Wire types for the conversion service and the report derived from them.
//!
//! The service is loose about its payloads: ids come back as strings or
//! numbers, and every field under `data` may be missing. Everything here is
//! therefore optional and numeric values stay as [`serde_json::Number`] so
//! they render exactly as the server sent them (`1.3`, `20480`).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;
use std::fmt;

/// Placeholder rendered for any missing metadata value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Server-issued job identifier. Opaque: a JSON string or number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for DocumentId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(Number),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Ok(Self(s)),
            Raw::Number(n) => Ok(Self(n.to_string())),
        }
    }
}

/// Body of a successful upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub document_id: DocumentId,
}

/// Coarse job status reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Complete,
    /// Anything else the service may say, including nothing at all.
    /// Treated as non-terminal.
    #[default]
    #[serde(other)]
    Other,
}

/// Missing, `null` and non-string statuses all read as [`JobStatus::Other`].
fn lenient_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<JobStatus, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => match s.as_str() {
            "pending" => JobStatus::Pending,
            "complete" => JobStatus::Complete,
            _ => JobStatus::Other,
        },
        _ => JobStatus::Other,
    })
}

/// Body of a status query.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: JobStatus,
    #[serde(default)]
    pub data: Option<StatusData>,
}

impl StatusResponse {
    pub fn is_complete(&self) -> bool {
        self.status == JobStatus::Complete
    }

    /// Business-level error reported inside a completed payload.
    ///
    /// An empty string counts as no error.
    pub fn conversion_error(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.error.as_deref())
            .filter(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusData {
    #[serde(default)]
    pub document_id: Option<DocumentId>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub pdf: Option<PdfInfo>,
    #[serde(default)]
    pub conversion_time: Option<ConversionTime>,
    #[serde(default)]
    pub thumbs: Option<Thumbs>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PdfInfo {
    #[serde(default)]
    pub pages: Option<Number>,
    #[serde(default)]
    pub size: Option<Number>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversionTime {
    #[serde(default)]
    pub t: Option<Timing>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Timing {
    #[serde(default)]
    pub elapsed_time: Option<Number>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Thumbs {
    #[serde(default)]
    pub thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Thumbnail {
    #[serde(default)]
    pub tag: Option<String>,
}

/// Metadata shown for a job that completed without error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReport {
    pub document_id: DocumentId,
    pub elapsed_time: Option<Number>,
    pub pages: Option<Number>,
    pub size: Option<Number>,
    pub thumbnail_tag: Option<String>,
}

impl ConversionReport {
    /// Build a report from a completed payload.
    ///
    /// `fallback_id` is the id the job was tracked under; it is used when
    /// the payload does not echo `document_id` back.
    pub fn from_data(data: Option<&StatusData>, fallback_id: &DocumentId) -> Self {
        let data = data.cloned().unwrap_or_default();
        let pdf = data.pdf.unwrap_or_default();
        let elapsed_time = data
            .conversion_time
            .and_then(|c| c.t)
            .and_then(|t| t.elapsed_time);
        let thumbnail_tag = data
            .thumbs
            .and_then(|t| t.thumbnail)
            .and_then(|t| t.tag)
            .filter(|t| !t.is_empty());

        Self {
            document_id: data.document_id.unwrap_or_else(|| fallback_id.clone()),
            elapsed_time,
            pages: pdf.pages,
            size: pdf.size,
            thumbnail_tag,
        }
    }

    /// Render the report as display lines, with `N/A` for missing values.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Document ID: {}", self.document_id),
            format!("Elapsed Time: {} s", or_na(self.elapsed_time.as_ref())),
            format!("Pages: {}", or_na(self.pages.as_ref())),
            format!("Size: {} bytes", or_na(self.size.as_ref())),
        ];
        if let Some(ref tag) = self.thumbnail_tag {
            lines.push(format!("Thumbnail: {tag}"));
        }
        lines
    }
}

fn or_na(n: Option<&Number>) -> String {
    n.map(Number::to_string)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> StatusResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn document_id_accepts_string_or_number() {
        let a: UploadResponse = serde_json::from_str(r#"{"document_id": 42}"#).unwrap();
        let b: UploadResponse = serde_json::from_str(r#"{"document_id": "42"}"#).unwrap();
        assert_eq!(a.document_id, b.document_id);
        assert_eq!(a.document_id.to_string(), "42");
    }

    #[test]
    fn pending_without_data() {
        let r = parse(r#"{"status": "pending"}"#);
        assert!(!r.is_complete());
        assert!(r.data.is_none());
        assert_eq!(r.conversion_error(), None);
    }

    #[test]
    fn unknown_status_is_not_complete() {
        let r = parse(r#"{"status": "queued", "data": {}}"#);
        assert_eq!(r.status, JobStatus::Other);
        assert!(!r.is_complete());
    }

    #[test]
    fn missing_or_null_status_is_not_complete() {
        for body in [r#"{}"#, r#"{"status": null}"#, r#"{"data": {}}"#, r#"{"status": 3}"#] {
            let r = parse(body);
            assert_eq!(r.status, JobStatus::Other, "body: {body}");
            assert!(!r.is_complete());
        }
        assert!(parse(r#"{"status": "complete"}"#).is_complete());
    }

    #[test]
    fn empty_error_counts_as_none() {
        let r = parse(r#"{"status": "complete", "data": {"error": ""}}"#);
        assert_eq!(r.conversion_error(), None);

        let r = parse(r#"{"status": "complete", "data": {"error": "corrupt file"}}"#);
        assert_eq!(r.conversion_error(), Some("corrupt file"));
    }

    #[test]
    fn report_renders_full_payload() {
        let r = parse(
            r#"{"status": "complete", "data": {
                "document_id": 42,
                "pdf": {"pages": 5, "size": 20480},
                "conversion_time": {"t": {"elapsed_time": 1.3}},
                "thumbs": {"thumbnail": {"tag": "<img src=\"t.png\">"}}
            }}"#,
        );
        let report = ConversionReport::from_data(r.data.as_ref(), &DocumentId::from("x"));
        assert_eq!(
            report.lines(),
            vec![
                "Document ID: 42",
                "Elapsed Time: 1.3 s",
                "Pages: 5",
                "Size: 20480 bytes",
                "Thumbnail: <img src=\"t.png\">",
            ]
        );
    }

    #[test]
    fn report_falls_back_for_missing_fields() {
        let r = parse(r#"{"status": "complete", "data": {"pdf": {}}}"#);
        let report = ConversionReport::from_data(r.data.as_ref(), &DocumentId::from(7u64));
        let lines = report.lines();
        assert_eq!(lines[0], "Document ID: 7");
        assert_eq!(lines[1], "Elapsed Time: N/A s");
        assert_eq!(lines[2], "Pages: N/A");
        assert_eq!(lines[3], "Size: N/A bytes");
        assert_eq!(lines.len(), 4, "absent thumbnail is not an error");
    }

    #[test]
    fn report_without_data_at_all() {
        let report = ConversionReport::from_data(None, &DocumentId::from("9"));
        assert_eq!(report.document_id.as_str(), "9");
        assert!(report.pages.is_none());
    }
}

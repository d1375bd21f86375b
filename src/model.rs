//! Records exchanged between the stores, the validator and the export pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::kind::FileKind;

/// A file accepted into an upload session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Opaque unique id, referenced by export requests.
    pub id: String,

    /// File name as supplied by the uploader.
    #[serde(rename = "name")]
    pub original_name: String,

    /// Kind recorded at upload time.
    #[serde(rename = "type")]
    pub kind: FileKind,

    /// Where the uploaded bytes live.
    pub path: PathBuf,

    /// Size in bytes.
    pub size: u64,
}

/// Lifecycle of an upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Files uploaded, no export attempted yet.
    #[default]
    Pending,
    /// An export is being prepared.
    Processing,
    /// The last export completed.
    Completed,
    /// The last export failed.
    Failed,
}

/// A batch of uploaded files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSession {
    /// Opaque unique id.
    pub session_id: String,

    /// Uploaded files. Their order carries no meaning.
    pub files: Vec<UploadedFile>,

    /// Current lifecycle state.
    #[serde(default)]
    pub state: SessionState,

    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl UploadSession {
    /// Index files by id.
    pub fn files_by_id(&self) -> HashMap<&str, &UploadedFile> {
        self.files.iter().map(|f| (f.id.as_str(), f)).collect()
    }
}

/// Bibliographic metadata attached to an export.
///
/// `year` keeps the caller's raw text so that an unparseable year becomes a
/// validation error rather than a decoding failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Work title.
    #[serde(default)]
    pub title: String,

    /// Author's full name.
    #[serde(default)]
    pub author: String,

    /// Scientific supervisor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor: Option<String>,

    /// Year of defence.
    #[serde(default, deserialize_with = "year_from_string_or_number")]
    pub year: String,

    /// Faculty or department.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,

    /// Form of study.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
}

fn year_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawYear {
        Number(i64),
        Text(String),
    }

    Ok(match RawYear::deserialize(deserializer)? {
        RawYear::Number(n) => n.to_string(),
        RawYear::Text(s) => s,
    })
}

/// A request to prepare one export from a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Session whose files are exported.
    pub session_id: String,

    /// File ids in merge order. Duplicates and omissions are allowed.
    pub order: Vec<String>,

    /// Metadata for the export.
    pub metadata: ExportMetadata,
}

/// Outcome of a successful export; also the content of the JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportResult {
    /// Opaque unique id.
    pub export_id: String,

    /// Session the export was built from.
    pub session_id: String,

    /// Location of the merged PDF.
    pub pdf_path: PathBuf,

    /// Advisory findings, in the order they were raised.
    pub warnings: Vec<String>,

    /// Metadata snapshot.
    pub metadata: ExportMetadata,

    /// Original names of the exported files, in merge order.
    pub files: Vec<String>,

    /// When the export was created.
    pub created_at: DateTime<Utc>,
}

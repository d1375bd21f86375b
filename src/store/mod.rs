//! Persistence of upload sessions and export results.
//!
//! The pipeline only talks to the [`SessionStore`] and [`ExportStore`]
//! traits. Two families of implementations are provided: file-system backed
//! stores rooted in the configured data directory, and in-memory stores for
//! embedding and tests. Nothing is ever evicted.

mod fs;
mod memory;

pub use self::fs::{FsExportStore, FsSessionStore};
pub use self::memory::{MemoryExportStore, MemorySessionStore};

use async_trait::async_trait;

use crate::Result;
use crate::model::{ExportResult, SessionState, UploadSession};

/// Source of upload sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session, or `None` if it does not exist.
    async fn load(&self, session_id: &str) -> Result<Option<UploadSession>>;

    /// Record a new lifecycle state for a session.
    ///
    /// Concurrent exports of one session race here; the last write wins.
    async fn set_state(&self, session_id: &str, state: SessionState) -> Result<()>;
}

/// Sink for completed exports.
#[async_trait]
pub trait ExportStore: Send + Sync {
    /// Persist an export result, replacing any with the same id.
    async fn put(&self, result: &ExportResult) -> Result<()>;

    /// Fetch an export result, or `None` if it does not exist.
    async fn get(&self, export_id: &str) -> Result<Option<ExportResult>>;
}

/// Ids become path components; only accept the characters ids are made of.
pub(crate) fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

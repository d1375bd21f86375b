use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{ExportStore, SessionStore};
use crate::model::{ExportResult, SessionState, UploadSession};
use crate::{Error, Result};

/// Sessions kept in a map.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, UploadSession>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a session.
    pub async fn insert(&self, session: UploadSession) {
        self.sessions
            .write()
            .await
            .insert(session.session_id.clone(), session);
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<UploadSession>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn set_state(&self, session_id: &str, state: SessionState) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::session_not_found(session_id))?;
        session.state = state;
        Ok(())
    }
}

/// Export results kept in a map.
#[derive(Debug, Default)]
pub struct MemoryExportStore {
    exports: RwLock<HashMap<String, ExportResult>>,
}

impl MemoryExportStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored exports.
    pub async fn len(&self) -> usize {
        self.exports.read().await.len()
    }

    /// Whether nothing was stored yet.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ExportStore for MemoryExportStore {
    async fn put(&self, result: &ExportResult) -> Result<()> {
        self.exports
            .write()
            .await
            .insert(result.export_id.clone(), result.clone());
        Ok(())
    }

    async fn get(&self, export_id: &str) -> Result<Option<ExportResult>> {
        Ok(self.exports.read().await.get(export_id).cloned())
    }
}

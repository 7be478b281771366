//! Durable storage for completed test results

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::session::SessionResult;
use crate::VoltcheckError;

/// Persistence contract for session results
#[async_trait]
pub trait ResultStore: Send + Sync + std::fmt::Debug {
    /// Persist a result and return its assigned id
    async fn save(&self, result: SessionResult) -> crate::Result<u64>;

    /// All results, most recent first
    async fn list(&self) -> crate::Result<Vec<SessionResult>>;

    async fn get(&self, id: u64) -> crate::Result<SessionResult>;

    async fn rename(&self, id: u64, name: &str) -> crate::Result<()>;

    async fn delete(&self, id: u64) -> crate::Result<()>;

    async fn delete_all(&self) -> crate::Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    next_id: u64,
    sessions: Vec<SessionResult>,
}

/// A [`ResultStore`] kept in a single JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> crate::Result<StoreFile> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                VoltcheckError::Store(format!("Failed to parse {:?}: {}", self.path, e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No result store at {:?}, starting empty", self.path);
                Ok(StoreFile::default())
            }
            Err(e) => Err(VoltcheckError::Store(format!(
                "Failed to read {:?}: {}",
                self.path, e
            ))),
        }
    }

    async fn persist(&self, file: &StoreFile) -> crate::Result<()> {
        let bytes = serde_json::to_vec_pretty(file)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| VoltcheckError::Store(format!("Failed to write {:?}: {}", tmp, e)))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            VoltcheckError::Store(format!("Failed to replace {:?}: {}", self.path, e))
        })
    }
}

#[async_trait]
impl ResultStore for JsonFileStore {
    async fn save(&self, mut result: SessionResult) -> crate::Result<u64> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        file.next_id += 1;
        result.id = file.next_id;
        let id = result.id;
        tracing::debug!("Saving session {} '{}'", id, result.name);
        file.sessions.push(result);
        self.persist(&file).await?;
        Ok(id)
    }

    async fn list(&self) -> crate::Result<Vec<SessionResult>> {
        let _guard = self.lock.lock().await;
        let mut sessions = self.load().await?.sessions;
        sessions.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(sessions)
    }

    async fn get(&self, id: u64) -> crate::Result<SessionResult> {
        let _guard = self.lock.lock().await;
        self.load()
            .await?
            .sessions
            .into_iter()
            .find(|s| s.id == id)
            .ok_or(VoltcheckError::NotFound(id))
    }

    async fn rename(&self, id: u64, name: &str) -> crate::Result<()> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        let session = file
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(VoltcheckError::NotFound(id))?;
        session.name = name.to_string();
        self.persist(&file).await
    }

    async fn delete(&self, id: u64) -> crate::Result<()> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        let before = file.sessions.len();
        file.sessions.retain(|s| s.id != id);
        if file.sessions.len() == before {
            return Err(VoltcheckError::NotFound(id));
        }
        self.persist(&file).await
    }

    async fn delete_all(&self) -> crate::Result<()> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        tracing::info!("Deleting {} stored sessions", file.sessions.len());
        file.sessions.clear();
        self.persist(&file).await
    }
}

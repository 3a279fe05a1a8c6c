//! Session persistence.

use async_trait::async_trait;
use brand_core::{BrandError, RefinementSession, Result, SessionStore, SessionSummary};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::warn;

/// One pretty-printed JSON file per session, `<dir>/<id>.json`.
///
/// Writes go to a sibling temporary file that is renamed into place, so a
/// reader never sees a half-written session.
#[derive(Debug, Clone)]
pub struct JsonFileSessionStore {
    dir: PathBuf,
}

impl JsonFileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(BrandError::session(format!("invalid session id '{}'", id)));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }
}

#[async_trait]
impl SessionStore for JsonFileSessionStore {
    async fn save(&self, session: &RefinementSession) -> Result<()> {
        let path = self.path_for(session.id())?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_string_pretty(session)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<RefinementSession> {
        let path = self.path_for(id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BrandError::SessionNotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<SessionSummary>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = tokio::fs::read_to_string(&path)
                .await
                .map_err(BrandError::from)
                .and_then(|json| {
                    serde_json::from_str::<RefinementSession>(&json).map_err(BrandError::from)
                });
            match parsed {
                Ok(session) => summaries.push(SessionSummary::from(&session)),
                Err(error) => {
                    let path = path.display();
                    warn!(path = %path, error = %error, "skipping unreadable session file")
                }
            }
        }
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = self.path_for(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BrandError::SessionNotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps sessions in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, RefinementSession>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, session: &RefinementSession) -> Result<()> {
        self.sessions
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(session.id().to_string(), session.clone());
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<RefinementSession> {
        self.sessions
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| BrandError::SessionNotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<SessionSummary>> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .values()
            .map(SessionSummary::from)
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| BrandError::SessionNotFound(id.to_string()))
    }
}

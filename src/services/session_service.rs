//! Persisted login session
//!
//! Read once at start-up, written on login, removed on logout. When a key is
//! configured the file holds an AES-256-GCM sealed blob instead of plain JSON.

use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Session;
use crate::utils::encryption::{self, CryptoError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session data is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    key: Option<[u8; 32]>,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>, key: Option<[u8; 32]>) -> Self {
        Self {
            path: path.into(),
            key,
        }
    }

    /// Restore the saved session. A missing file is not an error.
    pub async fn load(&self) -> Result<Option<Session>, SessionError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let json = match &self.key {
            Some(key) => encryption::open(&raw, key)?,
            None => raw,
        };

        let session = serde_json::from_str::<Session>(&json)?;
        debug!("Restored session for {}", session.user.email);
        Ok(Some(session))
    }

    /// Like `load`, but an unreadable file is discarded instead of failing
    pub async fn load_or_discard(&self) -> Option<Session> {
        match self.load().await {
            Ok(session) => session,
            Err(e) => {
                warn!("Discarding unreadable session file {}: {}", self.path.display(), e);
                self.clear().await.ok();
                None
            }
        }
    }

    pub async fn save(&self, session: &Session) -> Result<(), SessionError> {
        let json = serde_json::to_string(session)?;
        let contents = match &self.key {
            Some(key) => encryption::seal(&json, key)?,
            None => json,
        };
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }

    /// Remove the saved session; removing an absent file is fine
    pub async fn clear(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::config::config_directory;
use crate::domain::session::Session;
use crate::error::{AppError, AppResult};

const SESSION_FILE_NAME: &str = "session.json";

/// Persists the logged-in session across runs. Populated on login, removed on
/// logout; callers pass the loaded [`Session`] on explicitly.
pub struct SessionStore {
    file_path: PathBuf,
}

impl SessionStore {
    pub fn open_default() -> AppResult<Self> {
        Ok(Self::at(config_directory()?.join(SESSION_FILE_NAME)))
    }

    pub fn at(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    /// A corrupt file is discarded and treated as logged out.
    pub fn load(&self) -> AppResult<Option<Session>> {
        let contents = match fs::read_to_string(&self.file_path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AppError::Io(err)),
        };

        match serde_json::from_str::<Session>(&contents) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                warn!(
                    path = %self.file_path.display(),
                    error = %err,
                    "discarding unreadable session file"
                );
                self.clear()?;
                Ok(None)
            }
        }
    }

    pub fn save(&self, session: &Session) -> AppResult<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(session)
            .map_err(|err| AppError::Session(format!("failed to encode session: {err}")))?;
        fs::write(&self.file_path, data)?;
        debug!(user = %session.identity.id, "session saved");
        Ok(())
    }

    pub fn clear(&self) -> AppResult<()> {
        match fs::remove_file(&self.file_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AppError::Io(err)),
        }
    }
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use recipes_client::AuthSession;

/// Файл с сохранённой сессией между запусками CLI.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> io::Result<Option<AuthSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path)?;
        parse_session_content(&raw)
    }

    pub fn save(&self, session: &AuthSession) -> io::Result<()> {
        let raw = serde_json::to_string_pretty(session).map_err(io::Error::other)?;
        fs::write(&self.path, raw)
    }

    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            result => result,
        }
    }
}

fn parse_session_content(raw: &str) -> io::Result<Option<AuthSession>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(raw)
        .map(Some)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

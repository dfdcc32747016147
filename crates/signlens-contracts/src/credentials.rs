//! Remembered credential, stored as one entry of a small JSON key/value file.
//!
//! Default location is `$XDG_CONFIG_HOME/signlens/credentials.json`
//! (`~/.config/signlens/` when unset). `SIGNLENS_CONFIG_DIR` replaces the
//! directory outright.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};

pub const REMEMBERED_CREDENTIAL_KEY: &str = "signlens_api_key";
const STORE_FILE_NAME: &str = "credentials.json";

pub fn config_dir() -> PathBuf {
    if let Some(dir) = non_empty_env("SIGNLENS_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    non_empty_env("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("signlens")
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Self {
        Self::new(config_dir().join(STORE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The remembered credential, if any. A missing file is not an error.
    pub fn load(&self) -> Result<Option<String>> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(REMEMBERED_CREDENTIAL_KEY)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string))
    }

    pub fn remember(&self, credential: &str) -> Result<()> {
        let mut entries = self.read_entries()?;
        entries.insert(
            REMEMBERED_CREDENTIAL_KEY.to_string(),
            Value::String(credential.trim().to_string()),
        );
        self.write_entries(&entries)
    }

    /// Drops the remembered credential; other keys in the file are kept.
    pub fn forget(&self) -> Result<bool> {
        let mut entries = self.read_entries()?;
        let removed = entries.remove(REMEMBERED_CREDENTIAL_KEY).is_some();
        if removed {
            self.write_entries(&entries)?;
        }
        Ok(removed)
    }

    fn read_entries(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed reading {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        let parsed: Value = serde_json::from_str(&raw)
            .with_context(|| format!("{} is not valid JSON", self.path.display()))?;
        Ok(parsed.as_object().cloned().unwrap_or_default())
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(
            &self.path,
            serde_json::to_string_pretty(&Value::Object(entries.clone()))?,
        )
        .with_context(|| format!("failed writing {}", self.path.display()))?;
        Ok(())
    }
}

/// Masks all but the last four characters for display.
pub fn mask_credential(credential: &str) -> String {
    let chars: Vec<char> = credential.trim().chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{visible}", "*".repeat(chars.len() - 4))
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
